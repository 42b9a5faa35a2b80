//! Smart account snapshots and relay payloads

use crate::transaction::WalletTransaction;
use ethers::types::{Address, Bytes, H256, U256};
use serde::{Deserialize, Serialize};

/// Snapshot of the smart account on one chain, sent along with relayed transactions
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SmartAccountState {
    pub address: Address,
    pub owner: Address,
    pub is_deployed: bool,
    pub entry_point_address: Address,
    pub fallback_handler_address: Address,
}

/// Contracts the relayer needs when it has to deploy the wallet first
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SmartAccountContext {
    pub base_wallet: Address,
    pub wallet_factory: Address,
    pub multi_send: Address,
    pub multi_send_call: Address,
}

/// Outer transaction calling `execTransaction` on the wallet
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTransaction {
    pub to: Address,
    pub data: Bytes,
    pub value: U256,
    pub chain_id: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedTransaction {
    pub raw_tx: RawTransaction,
    pub tx: WalletTransaction,
}

/// Everything the relayer needs to execute a signed wallet transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayTransaction {
    pub signed_tx: SignedTransaction,
    pub config: SmartAccountState,
    pub context: SmartAccountContext,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_limit: Option<U256>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayResponse {
    pub hash: H256,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gas_limit_omitted_when_absent() {
        let relay = RelayTransaction {
            signed_tx: SignedTransaction {
                raw_tx: RawTransaction { chain_id: 5, ..Default::default() },
                tx: WalletTransaction::default(),
            },
            config: SmartAccountState::default(),
            context: SmartAccountContext::default(),
            gas_limit: None,
        };
        let value = serde_json::to_value(&relay).unwrap();
        assert!(value.get("gasLimit").is_none());
        assert_eq!(value["signedTx"]["rawTx"]["chainId"], 5);
        assert_eq!(value["config"]["isDeployed"], false);

        let value =
            serde_json::to_value(RelayTransaction { gas_limit: Some(2_000_000.into()), ..relay })
                .unwrap();
        assert_eq!(value["gasLimit"], "0x1e8480");
    }
}
