//! Caller request a user operation is assembled from

use crate::transaction::MetaTransaction;
use ethers::types::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};

/// Call the smart account should perform, with optional gas and fee overrides
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserOperationRequest {
    /// Call target
    #[serde(default)]
    pub target: Option<Address>,
    /// Native value forwarded with the call
    #[serde(default)]
    pub value: Option<U256>,
    /// Call data
    #[serde(default)]
    pub data: Option<Bytes>,
    /// Call gas limit (estimated against the wallet when absent)
    #[serde(default)]
    pub gas_limit: Option<U256>,
    #[serde(default)]
    pub max_fee_per_gas: Option<U256>,
    #[serde(default)]
    pub max_priority_fee_per_gas: Option<U256>,
}

impl UserOperationRequest {
    pub fn new(target: Address) -> Self {
        Self { target: Some(target), ..Default::default() }
    }

    /// First required field the request lacks (`to`, then data-or-value)
    pub fn missing_field(&self) -> Option<&'static str> {
        if self.target.is_none() {
            return Some("to");
        }
        if self.data.is_none() && self.value.is_none() {
            return Some("data or value");
        }
        None
    }

    /// The call as a meta-transaction (absent value and data default to zero and empty)
    pub fn meta_transaction(&self) -> MetaTransaction {
        MetaTransaction::call(
            self.target.unwrap_or_default(),
            self.value.unwrap_or_default(),
            self.data.clone().unwrap_or_default(),
        )
    }

    // Builder pattern helpers

    pub fn value(mut self, value: U256) -> Self {
        self.value = Some(value);
        self
    }

    pub fn data(mut self, data: Bytes) -> Self {
        self.data = Some(data);
        self
    }

    pub fn gas_limit(mut self, gas_limit: U256) -> Self {
        self.gas_limit = Some(gas_limit);
        self
    }

    pub fn max_fee_per_gas(mut self, max_fee_per_gas: U256) -> Self {
        self.max_fee_per_gas = Some(max_fee_per_gas);
        self
    }

    pub fn max_priority_fee_per_gas(mut self, max_priority_fee_per_gas: U256) -> Self {
        self.max_priority_fee_per_gas = Some(max_priority_fee_per_gas);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_fields() {
        assert_eq!(UserOperationRequest::default().missing_field(), Some("to"));

        let req = UserOperationRequest::new(Address::random());
        assert_eq!(req.missing_field(), Some("data or value"));
        assert_eq!(req.clone().value(U256::zero()).missing_field(), None);
        assert_eq!(req.data(Bytes::default()).missing_field(), None);
    }

    #[test]
    fn deserializes_partial_request() {
        let req: UserOperationRequest = serde_json::from_str(
            r#"{"target":"0x5ff137d4b0fdcd49dca30c7cf57e578a026d2789","value":"0x10","gasLimit":"0x5208"}"#,
        )
        .unwrap();
        assert_eq!(req.value, Some(16.into()));
        assert_eq!(req.gas_limit, Some(21_000.into()));
        assert!(req.data.is_none());
        assert!(req.meta_transaction().data.is_empty());
    }
}
