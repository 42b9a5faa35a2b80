//! Counterfactual address of a smart wallet
//!
//! The factory deploys proxies with CREATE2, so the wallet address is known before deployment:
//! `salt = keccak256(owner ‖ address(uint160(index)))` and the init code hash covers the proxy
//! creation code followed by the base wallet (padded to a word).

use crate::error::AccountError;
use ethers::{
    types::{Address, Bytes, U256},
    utils::{get_create2_address_from_hash, keccak256},
};
use halyard_contracts::{EntryPointHandle, FactoryHandle, WalletFactory};
use halyard_primitives::{ContractAddresses, SmartAccountConfig};
use tracing::trace;

/// Inputs the wallet address is a function of
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct WalletIdentity {
    pub owner: Option<Address>,
    pub factory: Option<Address>,
    /// Implementation the proxy delegates to
    pub base_wallet: Option<Address>,
    pub entry_point: Option<Address>,
    pub fallback_handler: Option<Address>,
    pub proxy_creation_code: Option<Bytes>,
    pub index: U256,
}

fn non_zero(address: Address) -> Option<Address> {
    (!address.is_zero()).then_some(address)
}

impl WalletIdentity {
    /// Identity of the configured owner against one chain's contracts (zero addresses and empty
    /// creation code count as absent)
    pub fn from_config(config: &SmartAccountConfig, contracts: &ContractAddresses) -> Self {
        Self {
            owner: config.owner,
            factory: non_zero(contracts.wallet_factory),
            base_wallet: non_zero(contracts.wallet),
            entry_point: non_zero(contracts.entry_point),
            fallback_handler: non_zero(contracts.fallback_handler),
            proxy_creation_code: (!contracts.proxy_creation_code.is_empty())
                .then(|| contracts.proxy_creation_code.clone()),
            index: config.index,
        }
    }

    fn owner(&self) -> Result<Address, AccountError> {
        self.owner.ok_or(AccountError::AddressDerivation { field: "owner" })
    }

    fn factory(&self) -> Result<Address, AccountError> {
        self.factory.ok_or(AccountError::AddressDerivation { field: "factory" })
    }

    fn entry_point(&self) -> Result<Address, AccountError> {
        self.entry_point.ok_or(AccountError::AddressDerivation { field: "entry point" })
    }

    fn fallback_handler(&self) -> Result<Address, AccountError> {
        self.fallback_handler.ok_or(AccountError::AddressDerivation { field: "fallback handler" })
    }

    /// CREATE2 salt of the factory
    pub fn salt(&self) -> Result<[u8; 32], AccountError> {
        let mut index = [0u8; 32];
        self.index.to_big_endian(&mut index);
        Ok(keccak256([self.owner()?.as_bytes(), &index[12..]].concat()))
    }

    /// Factory address followed by the `deployCounterFactualWallet` calldata
    pub fn init_code(&self) -> Result<Bytes, AccountError> {
        Ok(WalletFactory::new(self.factory()?).init_code(
            self.owner()?,
            self.entry_point()?,
            self.fallback_handler()?,
            self.index,
        ))
    }
}

/// Wallet address with the init code that deploys it
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CounterfactualWallet {
    pub address: Address,
    pub init_code: Bytes,
}

/// Computes counterfactual wallet addresses
#[derive(Debug, Default, Clone, Copy)]
pub struct AddressDeriver;

impl AddressDeriver {
    /// Derives the address locally, replicating the factory's CREATE2
    ///
    /// # Arguments
    /// * `identity` - Owner, factory and wallet contracts
    ///
    /// # Returns
    /// * `CounterfactualWallet` - Address and init code, or `AddressDerivation` naming the first
    ///   missing input
    pub fn derive_address(
        &self,
        identity: &WalletIdentity,
    ) -> Result<CounterfactualWallet, AccountError> {
        let init_code = identity.init_code()?;
        let base_wallet =
            identity.base_wallet.ok_or(AccountError::AddressDerivation { field: "base wallet" })?;
        let creation_code = identity
            .proxy_creation_code
            .as_ref()
            .ok_or(AccountError::AddressDerivation { field: "proxy creation code" })?;

        let mut deployment_data = creation_code.to_vec();
        deployment_data.extend_from_slice(&[0u8; 12]);
        deployment_data.extend_from_slice(base_wallet.as_bytes());

        let address = get_create2_address_from_hash(
            identity.factory()?,
            identity.salt()?,
            keccak256(&deployment_data),
        );
        trace!("Derived counterfactual wallet {address:?} for {identity:?}");

        Ok(CounterfactualWallet { address, init_code })
    }

    /// Asks the entry point which sender the init code creates
    ///
    /// # Arguments
    /// * `identity` - Owner, factory and wallet contracts
    /// * `entry_point` - Entry point answering `getSenderAddress`
    ///
    /// # Returns
    /// * `CounterfactualWallet` - Address and init code
    pub async fn resolve_remote(
        &self,
        identity: &WalletIdentity,
        entry_point: &dyn EntryPointHandle,
    ) -> Result<CounterfactualWallet, AccountError> {
        let init_code = identity.init_code()?;
        let address = entry_point.get_sender_address(init_code.clone()).await?;
        trace!("Entry point {:?} resolved wallet {address:?}", entry_point.address());
        Ok(CounterfactualWallet { address, init_code })
    }
}
