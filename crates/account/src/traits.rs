//! Collaborators the smart account pipeline depends on
//!
//! Every network round-trip goes through one of these traits so the pipeline can run against
//! in-memory fakes.

use async_trait::async_trait;
use ethers::{
    providers::Middleware,
    types::{transaction::eip2718::TypedTransaction, Address, Bytes, H256, U256},
};
use halyard_primitives::{
    HandlePaymentRefund, RelayTransaction, SmartAccountVersion, TokenData, UserOperation,
    WalletTransaction,
};
use serde::{Deserialize, Serialize};
use std::{fmt, sync::Arc};

/// Current EIP-1559 fee estimate of the network
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeData {
    pub max_fee_per_gas: U256,
    pub max_priority_fee_per_gas: U256,
}

/// Read access to an execution client
#[async_trait]
pub trait ChainReader: Send + Sync {
    /// Deployed bytecode at the address (empty for accounts without code)
    async fn get_code(&self, address: Address) -> eyre::Result<Bytes>;

    async fn estimate_gas(&self, tx: &TypedTransaction) -> eyre::Result<U256>;

    async fn fee_data(&self) -> eyre::Result<FeeData>;

    async fn chain_id(&self) -> eyre::Result<u64>;
}

/// [ChainReader] over an ethers middleware
#[derive(Debug, Clone)]
pub struct EthersChainReader<M: Middleware + 'static> {
    eth_client: Arc<M>,
}

impl<M: Middleware + 'static> EthersChainReader<M> {
    pub fn new(eth_client: Arc<M>) -> Self {
        Self { eth_client }
    }
}

#[async_trait]
impl<M: Middleware + 'static> ChainReader for EthersChainReader<M> {
    async fn get_code(&self, address: Address) -> eyre::Result<Bytes> {
        Ok(self.eth_client.get_code(address, None).await?)
    }

    async fn estimate_gas(&self, tx: &TypedTransaction) -> eyre::Result<U256> {
        Ok(self.eth_client.estimate_gas(tx, None).await?)
    }

    async fn fee_data(&self) -> eyre::Result<FeeData> {
        let (max_fee_per_gas, max_priority_fee_per_gas) =
            self.eth_client.estimate_eip1559_fees(None).await?;
        Ok(FeeData { max_fee_per_gas, max_priority_fee_per_gas })
    }

    async fn chain_id(&self) -> eyre::Result<u64> {
        Ok(self.eth_client.get_chainid().await?.as_u64())
    }
}

/// Gas and fee estimation service of the relayer backend
#[async_trait]
pub trait GasEstimationService: Send + Sync {
    /// Gas of a call to the gas estimator helper (`estimate(to, data)` calldata)
    ///
    /// # Arguments
    /// * `chain_id` - Chain the call is simulated on
    /// * `encoded_data` - Calldata of the gas estimator
    ///
    /// # Returns
    /// * `U256` - Gas used by the inner call
    async fn estimate_external_gas(&self, chain_id: u64, encoded_data: Bytes)
        -> eyre::Result<U256>;

    /// Gas the wallet needs to execute `tx`
    ///
    /// # Arguments
    /// * `chain_id` - Chain the wallet lives on
    /// * `wallet` - Wallet address
    /// * `tx` - Transaction envelope
    /// * `override_mode` - Simulate against the no-auth wallet bytecode (undeployed wallets)
    ///
    /// # Returns
    /// * `U256` - Required tx gas
    async fn estimate_required_tx_gas(
        &self,
        chain_id: u64,
        wallet: Address,
        tx: &WalletTransaction,
        override_mode: bool,
    ) -> eyre::Result<U256>;

    /// Gas of the wallet's `handlePayment` for the refund
    ///
    /// # Arguments
    /// * `chain_id` - Chain the wallet lives on
    /// * `wallet` - Wallet address
    /// * `version` - Wallet contract version
    /// * `refund` - Refund parameters
    /// * `override_mode` - Simulate against the no-auth wallet bytecode (undeployed wallets)
    ///
    /// # Returns
    /// * `U256` - Handle payment gas
    async fn estimate_handle_payment_gas(
        &self,
        chain_id: u64,
        wallet: Address,
        version: SmartAccountVersion,
        refund: &HandlePaymentRefund,
        override_mode: bool,
    ) -> eyre::Result<U256>;

    /// Fee tokens the relayer accepts on the chain
    async fn get_fee_options(&self, chain_id: u64) -> eyre::Result<Vec<TokenData>>;
}

/// Paymaster sponsoring user operations
#[async_trait]
pub trait PaymasterApi: Send + Sync {
    /// `paymasterAndData` for the partially built user operation
    async fn get_paymaster_and_data(&self, user_operation: &UserOperation) -> eyre::Result<Bytes>;
}

/// What gets handed to a relay transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayPayload {
    /// Signed wallet transaction for the relayer
    Transaction(RelayTransaction),
    /// Signed user operation for the bundler
    UserOperation { user_operation: UserOperation, entry_point: Address },
}

/// Failed submission, with the remote error body when there is one
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransportError {
    pub status: Option<u16>,
    pub body: Option<String>,
    pub message: String,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into(), ..Default::default() }
    }

    pub fn status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for TransportError {}

/// Relayer or bundler endpoint
#[async_trait]
pub trait RelayTransport: Send + Sync {
    /// Submits the payload, returning the transaction (or user operation) hash
    async fn submit(&self, payload: &RelayPayload) -> Result<H256, TransportError>;
}
