//! Smart account configuration
//!
//! Every default is resolved once here; the rest of the crate reads plain fields.

use crate::{
    constants::{
        entry_point,
        gas::{
            BASE_VERIFICATION_GAS, DEPLOYED_REQUIRED_TX_GAS_OFFSET, DEPLOYMENT_FEE_TRANSFER_GAS,
            DEPLOY_ONLY_CALL_GAS, EXEC_FROM_ENTRY_POINT_GAS, GAS_USAGE_OFFSET,
            OVERRIDE_REQUIRED_TX_GAS_OFFSET, TARGET_TX_GAS_PLACEHOLDER, UNDEPLOYED_RELAY_GAS_LIMIT,
        },
        services::{BACKEND_URL, RELAYER_URL},
        smart_account::DEFAULT_BATCH_ID,
        supported_chains::CHAINS,
    },
    gas::Overhead,
};
use alloy_chains::{Chain, NamedChain};
use ethers::types::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Smart wallet contract version
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SmartAccountVersion {
    #[serde(rename = "1.0.0")]
    V1_0_0,
    #[default]
    #[serde(rename = "1.0.1")]
    V1_0_1,
}

impl fmt::Display for SmartAccountVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::V1_0_0 => write!(f, "1.0.0"),
            Self::V1_0_1 => write!(f, "1.0.1"),
        }
    }
}

impl FromStr for SmartAccountVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1.0.0" => Ok(Self::V1_0_0),
            "1.0.1" => Ok(Self::V1_0_1),
            other => Err(format!("unknown smart account version {other}")),
        }
    }
}

/// Gas constants tied to a wallet contract version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GasOffsets {
    /// Added to the required tx gas of a deployed wallet
    pub deployed_required_tx_gas_offset: U256,
    /// Added to the required tx gas estimated against override bytecode
    pub override_required_tx_gas_offset: U256,
    /// Charged on top of `handlePayment`
    pub gas_usage_offset: U256,
    /// `targetTxGas` used while estimating
    pub target_tx_gas_placeholder: U256,
    pub base_verification_gas: U256,
    pub deployment_fee_transfer_gas: U256,
    /// Gas limit forced on relayed transactions of an undeployed wallet
    pub undeployed_relay_gas_limit: U256,
    pub deploy_only_call_gas: U256,
    /// Gas limit of the inner call in `execFromEntryPoint`
    pub exec_from_entry_point_gas: U256,
}

impl Default for GasOffsets {
    fn default() -> Self {
        Self {
            deployed_required_tx_gas_offset: DEPLOYED_REQUIRED_TX_GAS_OFFSET.into(),
            override_required_tx_gas_offset: OVERRIDE_REQUIRED_TX_GAS_OFFSET.into(),
            gas_usage_offset: GAS_USAGE_OFFSET.into(),
            target_tx_gas_placeholder: TARGET_TX_GAS_PLACEHOLDER.into(),
            base_verification_gas: BASE_VERIFICATION_GAS.into(),
            deployment_fee_transfer_gas: DEPLOYMENT_FEE_TRANSFER_GAS.into(),
            undeployed_relay_gas_limit: UNDEPLOYED_RELAY_GAS_LIMIT.into(),
            deploy_only_call_gas: DEPLOY_ONLY_CALL_GAS.into(),
            exec_from_entry_point_gas: EXEC_FROM_ENTRY_POINT_GAS.into(),
        }
    }
}

/// Deployed contracts of one wallet version on one chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContractAddresses {
    pub version: SmartAccountVersion,
    /// Wallet implementation the proxies point to
    pub wallet: Address,
    pub wallet_factory: Address,
    /// Multisend helper for delegate call batches
    pub multi_send: Address,
    /// Multisend helper for plain call batches
    pub multi_send_call_only: Address,
    pub entry_point: Address,
    pub fallback_handler: Address,
    /// Creation code of the wallet proxy deployed by the factory
    pub proxy_creation_code: Bytes,
    pub gas: GasOffsets,
}

impl Default for ContractAddresses {
    fn default() -> Self {
        Self {
            version: SmartAccountVersion::default(),
            wallet: Address::zero(),
            wallet_factory: Address::zero(),
            multi_send: Address::zero(),
            multi_send_call_only: Address::zero(),
            entry_point: Address::from_str(entry_point::ADDRESS).unwrap_or_default(),
            fallback_handler: Address::zero(),
            proxy_creation_code: Bytes::default(),
            gas: GasOffsets::default(),
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChainConfig {
    pub chain_id: u64,
    pub contracts: Vec<ContractAddresses>,
}

impl ChainConfig {
    pub fn contracts_for(&self, version: SmartAccountVersion) -> Option<&ContractAddresses> {
        self.contracts.iter().find(|c| c.version == version)
    }
}

/// Configuration of a smart account session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SmartAccountConfig {
    /// Owner (EOA) of the smart account
    pub owner: Option<Address>,
    /// Known wallet address, skips counterfactual derivation
    pub wallet_address: Option<Address>,
    /// Factory salt index of the wallet
    pub index: U256,
    pub version: SmartAccountVersion,
    pub active_chain_id: u64,
    pub supported_chain_ids: Vec<u64>,
    /// Nonce space used for wallet transactions
    pub batch_id: U256,
    /// Gas estimation and fee options service
    pub backend_url: String,
    pub relayer_url: String,
    pub bundler_url: Option<String>,
    /// Receiver of deployment fees when the quote names none
    pub default_fee_receiver: Option<Address>,
    pub overhead: Overhead,
    pub chains: Vec<ChainConfig>,
}

impl Default for SmartAccountConfig {
    fn default() -> Self {
        Self {
            owner: None,
            wallet_address: None,
            index: U256::zero(),
            version: SmartAccountVersion::default(),
            active_chain_id: NamedChain::Goerli as u64,
            supported_chain_ids: CHAINS.iter().map(|c| *c as u64).collect(),
            batch_id: DEFAULT_BATCH_ID.into(),
            backend_url: BACKEND_URL.into(),
            relayer_url: RELAYER_URL.into(),
            bundler_url: None,
            default_fee_receiver: None,
            overhead: Overhead::default(),
            chains: Vec::new(),
        }
    }
}

impl SmartAccountConfig {
    pub fn is_supported(&self, chain_id: u64) -> bool {
        self.supported_chain_ids.contains(&chain_id)
    }

    pub fn chain(&self, chain_id: u64) -> Option<&ChainConfig> {
        self.chains.iter().find(|c| c.chain_id == chain_id)
    }

    /// Contracts of the configured version on a supported chain
    pub fn contracts(&self, chain_id: u64) -> Option<&ContractAddresses> {
        if !self.is_supported(chain_id) {
            return None;
        }
        self.chain(chain_id)?.contracts_for(self.version)
    }

    // Builder pattern helpers

    pub fn owner(mut self, owner: Address) -> Self {
        self.owner = Some(owner);
        self
    }

    pub fn active_chain_id(mut self, chain_id: u64) -> Self {
        self.active_chain_id = chain_id;
        self
    }

    pub fn with_chain(mut self, chain: ChainConfig) -> Self {
        if !self.supported_chain_ids.contains(&chain.chain_id) {
            self.supported_chain_ids.push(chain.chain_id);
        }
        self.chains.retain(|c| c.chain_id != chain.chain_id);
        self.chains.push(chain);
        self
    }
}

/// Human readable chain name for logs
pub fn chain_name(chain_id: u64) -> String {
    Chain::from(chain_id).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = SmartAccountConfig::default();
        assert_eq!(config.version.to_string(), "1.0.1");
        assert_eq!(config.active_chain_id, 5);
        assert_eq!(config.supported_chain_ids, vec![5, 80_001]);
        assert_eq!(config.backend_url, "https://sdk-backend.staging.biconomy.io/v1");
        assert!(config.contracts(5).is_none());
    }

    #[test]
    fn contracts_by_chain_and_version() {
        let contracts = ContractAddresses {
            wallet_factory: Address::repeat_byte(0xbb),
            ..Default::default()
        };
        let config = SmartAccountConfig::default()
            .with_chain(ChainConfig { chain_id: 137, contracts: vec![contracts.clone()] });

        assert_eq!(config.contracts(137), Some(&contracts));
        assert!(config.is_supported(137));

        let config = SmartAccountConfig { version: SmartAccountVersion::V1_0_0, ..config };
        assert!(config.contracts(137).is_none());
    }

    #[test]
    fn deserializes_with_defaults() {
        let config: SmartAccountConfig = serde_json::from_str(
            r#"{"version":"1.0.0","activeChainId":80001,"chains":[{"chainId":80001,"contracts":[{"version":"1.0.0","gas":{"overrideRequiredTxGasOffset":"0x1"}}]}]}"#,
        )
        .unwrap();
        assert_eq!(config.version, SmartAccountVersion::V1_0_0);
        let contracts = config.contracts(80_001).unwrap();
        assert_eq!(contracts.gas.override_required_tx_gas_offset, U256::one());
        assert_eq!(contracts.gas.deployed_required_tx_gas_offset, 30_000.into());
        assert_eq!(contracts.entry_point, entry_point::ADDRESS.parse::<Address>().unwrap());
        assert_eq!(config.supported_chain_ids, vec![5, 80_001]);
    }

    #[test]
    fn version_parse() {
        assert_eq!("1.0.0".parse::<SmartAccountVersion>().unwrap(), SmartAccountVersion::V1_0_0);
        assert!("2.0.0".parse::<SmartAccountVersion>().is_err());
    }
}
