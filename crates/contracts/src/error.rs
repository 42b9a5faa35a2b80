use crate::gen::entry_point_api::EntryPointAPIErrors;
use ethers::{
    abi::AbiDecode,
    contract::ContractError,
    providers::{JsonRpcError, Middleware, MiddlewareError, ProviderError},
    types::{Address, Bytes, U256},
};
use lazy_static::lazy_static;
use regex::Regex;
use std::str::FromStr;
use thiserror::Error;

lazy_static! {
    static ref HEX_DATA: Regex = Regex::new(r"0x[0-9a-fA-F]+").expect("Regex rules valid");
}

/// Errors of entry point calls
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EntryPointError {
    /// The entry point rejected the user operation
    #[error("FailedOp({op_index}, {reason})")]
    FailedOp { op_index: U256, reason: String },

    /// Plain `revert("...")`
    #[error("execution reverted: {0}")]
    ExecutionReverted(String),

    /// The call returned although it always reverts
    #[error("{function} should revert")]
    NoRevert { function: String },

    /// The sender address the factory would deploy
    #[error("sender address result: {0:?}")]
    SenderAddress(Address),

    #[error("provider error: {inner}")]
    Provider { inner: String },

    #[error("decode error: {inner}")]
    Decode { inner: String },
}

impl EntryPointError {
    /// Maps a failed contract call to the revert it carries
    pub fn from_contract_error<M: Middleware>(err: ContractError<M>) -> Self {
        match err {
            ContractError::Revert(data) => decode_revert(data),
            ContractError::MiddlewareError { e } => match e.as_error_response() {
                Some(err) => Self::from_json_rpc_error(err),
                None => match e.as_provider_error() {
                    Some(err) => Self::from_provider_error(err),
                    None => Self::Provider { inner: format!("middleware error: {e:?}") },
                },
            },
            ContractError::ProviderError { e } => Self::from_provider_error(&e),
            ContractError::DecodingError(e) => Self::Decode { inner: e.to_string() },
            ContractError::AbiError(e) => Self::Decode { inner: e.to_string() },
            other => Self::Provider { inner: other.to_string() },
        }
    }

    pub fn from_provider_error(err: &ProviderError) -> Self {
        match err {
            ProviderError::JsonRpcClientError(inner) => match inner.as_error_response() {
                Some(err) => Self::from_json_rpc_error(err),
                None => Self::Provider { inner: format!("json-rpc client error: {inner:?}") },
            },
            other => Self::Provider { inner: format!("{other:?}") },
        }
    }

    /// Nodes put the revert data as a hex string in the `data` field of the error
    pub fn from_json_rpc_error(err: &JsonRpcError) -> Self {
        let Some(data) = err.data.as_ref() else {
            return Self::Provider { inner: format!("json-rpc error without data: {err:?}") };
        };
        let Some(data) = data.as_str() else {
            return Self::Decode { inner: format!("json-rpc error data is not a string: {data:?}") };
        };
        let Some(hex) = HEX_DATA.find(data) else {
            return Self::Decode { inner: format!("hex string not found in {data:?}") };
        };
        match Bytes::from_str(hex.as_str()) {
            Ok(bytes) => decode_revert(bytes),
            Err(e) => Self::Decode { inner: format!("{data:?} is not hex: {e:?}") },
        }
    }
}

/// `Error(string)` payload produced by `require`/`revert` with a reason
pub fn decode_revert_string(data: &[u8]) -> Option<String> {
    if data.len() < 4 {
        return None;
    }
    let (selector, reason) = data.split_at(4);
    if selector == [0x08, 0xc3, 0x79, 0xa0] {
        <String as AbiDecode>::decode(reason).ok()
    } else {
        None
    }
}

/// Decodes revert data into the entry point errors
pub fn decode_revert(data: Bytes) -> EntryPointError {
    match EntryPointAPIErrors::decode(data.as_ref()) {
        Ok(EntryPointAPIErrors::FailedOp(op)) => {
            EntryPointError::FailedOp { op_index: op.op_index, reason: op.reason }
        }
        Ok(EntryPointAPIErrors::SenderAddressResult(res)) => {
            EntryPointError::SenderAddress(res.sender)
        }
        Ok(EntryPointAPIErrors::RevertString(reason)) => EntryPointError::ExecutionReverted(reason),
        Err(e) => match decode_revert_string(&data) {
            Some(reason) => EntryPointError::ExecutionReverted(reason),
            None => EntryPointError::Decode { inner: format!("unknown revert {data}: {e:?}") },
        },
    }
}
