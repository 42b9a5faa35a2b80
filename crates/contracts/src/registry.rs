//! Contract handles keyed by chain and wallet version

use crate::handles::{
    EntryPoint, EntryPointHandle, FactoryHandle, MultiSend, MultiSendHandle, SmartWallet,
    SmartWalletHandle, WalletFactory,
};
use ethers::{providers::Middleware, types::Address};
use halyard_primitives::{ChainConfig, ContractAddresses, SmartAccountVersion};
use std::{collections::HashMap, sync::Arc};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("no contracts for version {version} on chain {chain_id}")]
pub struct UnknownContracts {
    pub chain_id: u64,
    pub version: SmartAccountVersion,
}

/// Builds contract handles for a chain and wallet version
pub trait ContractFactory: Send + Sync {
    fn addresses(
        &self,
        chain_id: u64,
        version: SmartAccountVersion,
    ) -> Result<&ContractAddresses, UnknownContracts>;

    /// Wallet proxy at `wallet`
    fn smart_wallet(
        &self,
        chain_id: u64,
        version: SmartAccountVersion,
        wallet: Address,
    ) -> Result<Arc<dyn SmartWalletHandle>, UnknownContracts>;

    fn wallet_factory(
        &self,
        chain_id: u64,
        version: SmartAccountVersion,
    ) -> Result<Arc<dyn FactoryHandle>, UnknownContracts> {
        let addresses = self.addresses(chain_id, version)?;
        Ok(Arc::new(WalletFactory::new(addresses.wallet_factory)))
    }

    fn multi_send(
        &self,
        chain_id: u64,
        version: SmartAccountVersion,
    ) -> Result<Arc<dyn MultiSendHandle>, UnknownContracts> {
        let addresses = self.addresses(chain_id, version)?;
        Ok(Arc::new(MultiSend::new(addresses.multi_send)))
    }

    fn entry_point(
        &self,
        chain_id: u64,
        version: SmartAccountVersion,
    ) -> Result<Arc<dyn EntryPointHandle>, UnknownContracts>;
}

/// Contract handles backed by one ethers client per chain
pub struct ContractRegistry<M: Middleware + 'static> {
    eth_clients: HashMap<u64, Arc<M>>,
    contracts: HashMap<(u64, SmartAccountVersion), ContractAddresses>,
}

impl<M: Middleware + 'static> Default for ContractRegistry<M> {
    fn default() -> Self {
        Self { eth_clients: HashMap::new(), contracts: HashMap::new() }
    }
}

impl<M: Middleware + 'static> ContractRegistry<M> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers every contract version deployed on the chain
    pub fn with_chain(mut self, eth_client: Arc<M>, chain: &ChainConfig) -> Self {
        self.eth_clients.insert(chain.chain_id, eth_client);
        for contracts in &chain.contracts {
            self.contracts.insert((chain.chain_id, contracts.version), contracts.clone());
        }
        self
    }

    fn eth_client(
        &self,
        chain_id: u64,
        version: SmartAccountVersion,
    ) -> Result<Arc<M>, UnknownContracts> {
        self.eth_clients.get(&chain_id).cloned().ok_or(UnknownContracts { chain_id, version })
    }
}

impl<M: Middleware + 'static> ContractFactory for ContractRegistry<M> {
    fn addresses(
        &self,
        chain_id: u64,
        version: SmartAccountVersion,
    ) -> Result<&ContractAddresses, UnknownContracts> {
        self.contracts.get(&(chain_id, version)).ok_or(UnknownContracts { chain_id, version })
    }

    fn smart_wallet(
        &self,
        chain_id: u64,
        version: SmartAccountVersion,
        wallet: Address,
    ) -> Result<Arc<dyn SmartWalletHandle>, UnknownContracts> {
        self.addresses(chain_id, version)?;
        Ok(Arc::new(SmartWallet::new(self.eth_client(chain_id, version)?, wallet)))
    }

    fn entry_point(
        &self,
        chain_id: u64,
        version: SmartAccountVersion,
    ) -> Result<Arc<dyn EntryPointHandle>, UnknownContracts> {
        let address = self.addresses(chain_id, version)?.entry_point;
        Ok(Arc::new(EntryPoint::new(self.eth_client(chain_id, version)?, address)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::providers::{Http, Provider};

    fn registry() -> ContractRegistry<Provider<Http>> {
        let eth_client = Arc::new(Provider::<Http>::try_from("http://127.0.0.1:8545").unwrap());
        ContractRegistry::new().with_chain(
            eth_client,
            &ChainConfig {
                chain_id: 5,
                contracts: vec![ContractAddresses {
                    version: SmartAccountVersion::V1_0_1,
                    wallet_factory: Address::repeat_byte(0xbb),
                    multi_send: Address::repeat_byte(0xcc),
                    entry_point: Address::repeat_byte(0xee),
                    ..Default::default()
                }],
            },
        )
    }

    #[test]
    fn handles_by_chain_and_version() {
        let registry = registry();
        let version = SmartAccountVersion::V1_0_1;

        assert_eq!(
            registry.wallet_factory(5, version).unwrap().address(),
            Address::repeat_byte(0xbb)
        );
        assert_eq!(registry.multi_send(5, version).unwrap().address(), Address::repeat_byte(0xcc));
        assert_eq!(registry.entry_point(5, version).unwrap().address(), Address::repeat_byte(0xee));
        assert_eq!(
            registry.smart_wallet(5, version, Address::repeat_byte(1)).unwrap().address(),
            Address::repeat_byte(1)
        );
    }

    #[test]
    fn unknown_chain_or_version() {
        let registry = registry();
        assert_eq!(
            registry.multi_send(80_001, SmartAccountVersion::V1_0_1).err(),
            Some(UnknownContracts { chain_id: 80_001, version: SmartAccountVersion::V1_0_1 })
        );
        assert!(registry.wallet_factory(5, SmartAccountVersion::V1_0_0).is_err());
    }
}
