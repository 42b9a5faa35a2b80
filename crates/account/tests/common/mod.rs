#![allow(dead_code)]

use async_trait::async_trait;
use ethers::{
    signers::LocalWallet,
    types::{transaction::eip2718::TypedTransaction, Address, Bytes, H256, U256},
};
use halyard_account::{
    ChainReader, FeeData, GasEstimationService, PaymasterApi, RelayPayload, RelayTransport,
    SmartAccount, TransportError,
};
use halyard_contracts::{
    ContractFactory, EntryPointError, EntryPointHandle, SmartWalletHandle, UnknownContracts,
};
use halyard_primitives::{
    ContractAddresses, HandlePaymentRefund, KeyGenerator, SmartAccountConfig, SmartAccountVersion,
    TokenData, UserOperation, WalletTransaction,
};
use parking_lot::RwLock;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};
use tracing_subscriber::EnvFilter;

pub const CHAIN_ID: u64 = 5;
pub const CALL_GAS: u64 = 35_000;
pub const CREATION_GAS: u64 = 250_000;
pub const DEPLOYMENT_GAS: u64 = 180_000;
pub const REQUIRED_TX_GAS: u64 = 42_000;
pub const HANDLE_PAYMENT_GAS: u64 = 15_000;
pub const WALLET_NONCE: u64 = 9;

/// Pipeline logs in test output, filtered by `RUST_LOG`
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn contracts() -> ContractAddresses {
    ContractAddresses {
        version: SmartAccountVersion::V1_0_1,
        wallet: Address::repeat_byte(0x11),
        wallet_factory: Address::repeat_byte(0xbb),
        multi_send: Address::repeat_byte(0x33),
        multi_send_call_only: Address::repeat_byte(0x34),
        entry_point: Address::repeat_byte(0xee),
        fallback_handler: Address::repeat_byte(0xff),
        proxy_creation_code: "0x608060405234801561001057600080fd5b50".parse().unwrap(),
        ..Default::default()
    }
}

/// Execution client with settable code at every address
#[derive(Default)]
pub struct FakeChain {
    pub code: RwLock<Bytes>,
    pub estimates: RwLock<Vec<TypedTransaction>>,
    pub code_queries: AtomicUsize,
}

impl FakeChain {
    pub fn deploy(&self) {
        *self.code.write() = "0x6080604052".parse().unwrap();
    }
}

#[async_trait]
impl ChainReader for FakeChain {
    async fn get_code(&self, _address: Address) -> eyre::Result<Bytes> {
        self.code_queries.fetch_add(1, Ordering::SeqCst);
        Ok(self.code.read().clone())
    }

    async fn estimate_gas(&self, tx: &TypedTransaction) -> eyre::Result<U256> {
        self.estimates.write().push(tx.clone());
        // calls from the entry point are wallet executions, the rest is wallet creation
        if tx.from().is_some() {
            Ok(CALL_GAS.into())
        } else {
            Ok(CREATION_GAS.into())
        }
    }

    async fn fee_data(&self) -> eyre::Result<FeeData> {
        Ok(FeeData { max_fee_per_gas: 3_000.into(), max_priority_fee_per_gas: 100.into() })
    }

    async fn chain_id(&self) -> eyre::Result<u64> {
        Ok(CHAIN_ID)
    }
}

/// Estimation service returning fixed figures
///
/// The required tx gas is `REQUIRED_TX_GAS` plus `gas_per_data_byte` for every calldata byte.
#[derive(Default)]
pub struct FakeEstimator {
    pub required_tx_gas_calls: RwLock<Vec<(WalletTransaction, bool)>>,
    pub handle_payment_calls: RwLock<Vec<(HandlePaymentRefund, bool)>>,
    pub fail_required_tx_gas: bool,
    pub gas_per_data_byte: u64,
}

#[async_trait]
impl GasEstimationService for FakeEstimator {
    async fn estimate_external_gas(
        &self,
        _chain_id: u64,
        _encoded_data: Bytes,
    ) -> eyre::Result<U256> {
        Ok(DEPLOYMENT_GAS.into())
    }

    async fn estimate_required_tx_gas(
        &self,
        _chain_id: u64,
        _wallet: Address,
        tx: &WalletTransaction,
        override_mode: bool,
    ) -> eyre::Result<U256> {
        if self.fail_required_tx_gas {
            eyre::bail!("execution reverted");
        }
        self.required_tx_gas_calls.write().push((tx.clone(), override_mode));
        Ok(U256::from(REQUIRED_TX_GAS) + U256::from(self.gas_per_data_byte) * tx.data.len())
    }

    async fn estimate_handle_payment_gas(
        &self,
        _chain_id: u64,
        _wallet: Address,
        _version: SmartAccountVersion,
        refund: &HandlePaymentRefund,
        override_mode: bool,
    ) -> eyre::Result<U256> {
        self.handle_payment_calls.write().push((refund.clone(), override_mode));
        Ok(HANDLE_PAYMENT_GAS.into())
    }

    async fn get_fee_options(&self, _chain_id: u64) -> eyre::Result<Vec<TokenData>> {
        Ok(vec![
            TokenData {
                symbol: "USDC".into(),
                address: Address::repeat_byte(0xaa),
                decimal: 6,
                fee_token_transfer_gas: 22_975.into(),
                token_gas_price: Some(1_500.into()),
                offset: Some(1_000_000.into()),
                refund_receiver: Some(Address::repeat_byte(0xcc)),
                ..Default::default()
            },
            TokenData {
                symbol: "ETH".into(),
                decimal: 18,
                fee_token_transfer_gas: 7_300.into(),
                token_gas_price: Some(2_000_000_000u64.into()),
                ..Default::default()
            },
        ])
    }
}

/// Relay transport recording payloads
#[derive(Default)]
pub struct FakeRelay {
    pub payloads: RwLock<Vec<RelayPayload>>,
    pub error: Option<TransportError>,
}

impl FakeRelay {
    pub fn rejecting(error: TransportError) -> Self {
        Self { error: Some(error), ..Default::default() }
    }
}

#[async_trait]
impl RelayTransport for FakeRelay {
    async fn submit(&self, payload: &RelayPayload) -> Result<H256, TransportError> {
        self.payloads.write().push(payload.clone());
        match &self.error {
            Some(err) => Err(err.clone()),
            None => Ok(H256::repeat_byte(0x42)),
        }
    }
}

pub struct FakePaymaster;

#[async_trait]
impl PaymasterApi for FakePaymaster {
    async fn get_paymaster_and_data(&self, user_operation: &UserOperation) -> eyre::Result<Bytes> {
        assert!(user_operation.signature.is_empty());
        Ok([Address::repeat_byte(0x99).as_bytes(), &[1u8, 2, 3][..]].concat().into())
    }
}

pub struct FakeSmartWallet {
    address: Address,
}

#[async_trait]
impl SmartWalletHandle for FakeSmartWallet {
    fn address(&self) -> Address {
        self.address
    }

    async fn get_nonce(&self, _batch_id: U256) -> eyre::Result<U256> {
        Ok(WALLET_NONCE.into())
    }
}

pub struct FakeEntryPoint {
    address: Address,
}

#[async_trait]
impl EntryPointHandle for FakeEntryPoint {
    fn address(&self) -> Address {
        self.address
    }

    async fn get_sender_address(&self, _init_code: Bytes) -> Result<Address, EntryPointError> {
        Ok(Address::repeat_byte(0x5e))
    }
}

/// Contract handles of a single chain
pub struct FakeContracts {
    pub addresses: ContractAddresses,
}

impl ContractFactory for FakeContracts {
    fn addresses(
        &self,
        chain_id: u64,
        version: SmartAccountVersion,
    ) -> Result<&ContractAddresses, UnknownContracts> {
        if chain_id == CHAIN_ID && version == self.addresses.version {
            Ok(&self.addresses)
        } else {
            Err(UnknownContracts { chain_id, version })
        }
    }

    fn smart_wallet(
        &self,
        chain_id: u64,
        version: SmartAccountVersion,
        wallet: Address,
    ) -> Result<Arc<dyn SmartWalletHandle>, UnknownContracts> {
        self.addresses(chain_id, version)?;
        Ok(Arc::new(FakeSmartWallet { address: wallet }))
    }

    fn entry_point(
        &self,
        chain_id: u64,
        version: SmartAccountVersion,
    ) -> Result<Arc<dyn EntryPointHandle>, UnknownContracts> {
        let address = self.addresses(chain_id, version)?.entry_point;
        Ok(Arc::new(FakeEntryPoint { address }))
    }
}

/// Smart account wired to fakes
pub struct Harness {
    pub account: SmartAccount<LocalWallet>,
    pub chain: Arc<FakeChain>,
    pub estimator: Arc<FakeEstimator>,
    pub relayer: Arc<FakeRelay>,
    pub bundler: Arc<FakeRelay>,
}

pub struct HarnessBuilder {
    pub config: SmartAccountConfig,
    pub addresses: ContractAddresses,
    pub estimator: FakeEstimator,
    pub relayer: FakeRelay,
    pub bundler: FakeRelay,
    pub paymaster: bool,
}

impl Default for HarnessBuilder {
    fn default() -> Self {
        Self {
            config: SmartAccountConfig::default(),
            addresses: contracts(),
            estimator: FakeEstimator::default(),
            relayer: FakeRelay::default(),
            bundler: FakeRelay::default(),
            paymaster: false,
        }
    }
}

impl HarnessBuilder {
    pub fn build(self) -> Harness {
        init_tracing();
        let signer = KeyGenerator::new().next_wallet().unwrap();
        let chain = Arc::new(FakeChain::default());
        let estimator = Arc::new(self.estimator);
        let relayer = Arc::new(self.relayer);
        let bundler = Arc::new(self.bundler);

        let mut account = SmartAccount::new(
            self.config,
            signer,
            Arc::new(FakeContracts { addresses: self.addresses }),
            estimator.clone(),
            relayer.clone(),
        )
        .with_chain_reader(CHAIN_ID, chain.clone())
        .bundler(bundler.clone());
        if self.paymaster {
            account = account.paymaster(Arc::new(FakePaymaster));
        }

        Harness { account, chain, estimator, relayer, bundler }
    }
}

pub fn harness() -> Harness {
    HarnessBuilder::default().build()
}
