use halyard_contracts::{EntryPointError, UnknownContracts};
use halyard_primitives::SmartAccountVersion;
use std::fmt;
use thiserror::Error;

/// Step of the pipeline that needed a gas or fee figure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EstimationStage {
    Deployment,
    RequiredTxGas,
    HandlePaymentGas,
    FeeOptions,
    CallGas,
    VerificationGas,
    FeeData,
    Nonce,
    Paymaster,
}

impl fmt::Display for EstimationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stage = match self {
            Self::Deployment => "deployment gas",
            Self::RequiredTxGas => "required tx gas",
            Self::HandlePaymentGas => "handle payment gas",
            Self::FeeOptions => "fee options",
            Self::CallGas => "call gas",
            Self::VerificationGas => "verification gas",
            Self::FeeData => "fee data",
            Self::Nonce => "nonce",
            Self::Paymaster => "paymaster and data",
        };
        write!(f, "{stage}")
    }
}

/// Errors surfaced by the smart account pipeline
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AccountError {
    /// An identity input needed for the counterfactual address is missing
    #[error("cannot derive wallet address: missing {field}")]
    AddressDerivation { field: &'static str },

    #[error("batch has no transactions")]
    EmptyBatch,

    #[error("estimating {stage} failed: {inner}")]
    Estimation { stage: EstimationStage, inner: String },

    /// The bundler or relayer declined the operation
    #[error("the bundler has failed to include UserOperation in a batch: {reason} {paymaster_info}")]
    RelayRejected { reason: String, paymaster_info: String },

    #[error("transport error (status {status:?}): {inner}")]
    Transport { status: Option<u16>, inner: String },

    #[error("missing {field}")]
    MissingField { field: &'static str },

    #[error("signing failed: {inner}")]
    Signing { inner: String },

    #[error("contract error: {inner}")]
    Contract { inner: String },

    #[error("chain error: {inner}")]
    Chain { inner: String },

    #[error("chain {chain_id} is not supported by smart account version {version}")]
    UnsupportedChain { chain_id: u64, version: SmartAccountVersion },
}

impl AccountError {
    pub fn estimation(stage: EstimationStage, err: impl fmt::Display) -> Self {
        Self::Estimation { stage, inner: err.to_string() }
    }
}

impl From<UnknownContracts> for AccountError {
    fn from(err: UnknownContracts) -> Self {
        Self::UnsupportedChain { chain_id: err.chain_id, version: err.version }
    }
}

impl From<EntryPointError> for AccountError {
    fn from(err: EntryPointError) -> Self {
        Self::Contract { inner: err.to_string() }
    }
}
