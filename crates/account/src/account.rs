//! Smart account of one owner across the configured chains

use crate::{
    address::{AddressDeriver, CounterfactualWallet, WalletIdentity},
    deployment::{DeploymentStateTracker, DeploymentStatus},
    envelope::EnvelopeBuilder,
    error::{AccountError, EstimationStage},
    estimate::{DeploymentCall, FeeEstimationEngine, GasEstimate},
    relay::RelayDispatcher,
    signing::SigningCoordinator,
    traits::{ChainReader, GasEstimationService, PaymasterApi, RelayPayload, RelayTransport},
    user_operation::{AssemblyContext, UserOperationAssembler},
};
use ethers::{
    signers::Signer,
    types::{Address, Bytes, H256, U256},
};
use halyard_contracts::{encode_transfer, ContractFactory};
use halyard_primitives::{
    chain_name, ContractAddresses, FeeQuote, FeeRefund, MetaTransaction, RawTransaction,
    RelayTransaction, SignedTransaction, SmartAccountConfig, SmartAccountContext, SmartAccountState,
    TokenData, UserOperation, UserOperationRequest, WalletTransaction,
};
use parking_lot::RwLock;
use std::{collections::HashMap, sync::Arc};
use tracing::{debug, info};

/// Chain access of the account on one chain
struct ChainClients {
    reader: Arc<dyn ChainReader>,
    tracker: DeploymentStateTracker,
}

/// Smart account of the signer
///
/// Owns the pipeline components and wires them per chain. The counterfactual wallet of every
/// chain is computed once and cached for the lifetime of the account.
pub struct SmartAccount<S: Signer> {
    config: SmartAccountConfig,
    contracts: Arc<dyn ContractFactory>,
    chains: HashMap<u64, ChainClients>,
    estimation: Arc<dyn GasEstimationService>,
    relayer: RelayDispatcher,
    bundler: Option<RelayDispatcher>,
    paymaster: Option<Arc<dyn PaymasterApi>>,
    signer: SigningCoordinator<S>,
    wallets: RwLock<HashMap<u64, CounterfactualWallet>>,
}

impl<S: Signer> SmartAccount<S> {
    /// Creates a new smart account, owned by the signer unless the config names an owner
    ///
    /// # Arguments
    /// * `config` - Smart account configuration
    /// * `signer` - Owner key
    /// * `contracts` - Contract handles by chain and version
    /// * `estimation` - Gas and fee estimation service
    /// * `relayer` - Transport of signed wallet transactions
    ///
    /// # Returns
    /// * `Self` - A new `SmartAccount` instance without chain readers
    pub fn new(
        mut config: SmartAccountConfig,
        signer: S,
        contracts: Arc<dyn ContractFactory>,
        estimation: Arc<dyn GasEstimationService>,
        relayer: Arc<dyn RelayTransport>,
    ) -> Self {
        if config.owner.is_none() {
            config.owner = Some(signer.address());
        }
        Self {
            config,
            contracts,
            chains: HashMap::new(),
            estimation,
            relayer: RelayDispatcher::new(relayer),
            bundler: None,
            paymaster: None,
            signer: SigningCoordinator::new(signer),
            wallets: RwLock::new(HashMap::new()),
        }
    }

    // Builder pattern helpers

    pub fn with_chain_reader(mut self, chain_id: u64, reader: Arc<dyn ChainReader>) -> Self {
        let tracker = DeploymentStateTracker::new(reader.clone());
        self.chains.insert(chain_id, ChainClients { reader, tracker });
        self
    }

    pub fn bundler(mut self, bundler: Arc<dyn RelayTransport>) -> Self {
        self.bundler = Some(RelayDispatcher::new(bundler));
        self
    }

    pub fn paymaster(mut self, paymaster: Arc<dyn PaymasterApi>) -> Self {
        self.paymaster = Some(paymaster);
        self
    }

    pub fn config(&self) -> &SmartAccountConfig {
        &self.config
    }

    pub fn active_chain_id(&self) -> u64 {
        self.config.active_chain_id
    }

    pub fn owner(&self) -> Address {
        self.signer.address()
    }

    fn unsupported(&self, chain_id: u64) -> AccountError {
        AccountError::UnsupportedChain { chain_id, version: self.config.version }
    }

    fn chain(&self, chain_id: u64) -> Result<&ChainClients, AccountError> {
        if !self.config.is_supported(chain_id) {
            return Err(self.unsupported(chain_id));
        }
        self.chains.get(&chain_id).ok_or_else(|| self.unsupported(chain_id))
    }

    fn addresses(&self, chain_id: u64) -> Result<&ContractAddresses, AccountError> {
        if !self.config.is_supported(chain_id) {
            return Err(self.unsupported(chain_id));
        }
        Ok(self.contracts.addresses(chain_id, self.config.version)?)
    }

    fn identity(&self, chain_id: u64) -> Result<WalletIdentity, AccountError> {
        Ok(WalletIdentity::from_config(&self.config, self.addresses(chain_id)?))
    }

    /// Counterfactual wallet of the owner on the chain
    ///
    /// A configured wallet address is taken as is. Otherwise the address is derived locally when
    /// the proxy creation code is known, and asked from the entry point when it is not.
    pub async fn counterfactual_wallet(
        &self,
        chain_id: u64,
    ) -> Result<CounterfactualWallet, AccountError> {
        let cached = self.wallets.read().get(&chain_id).cloned();
        if let Some(wallet) = cached {
            return Ok(wallet);
        }

        let identity = self.identity(chain_id)?;
        let wallet = match self.config.wallet_address {
            Some(address) => CounterfactualWallet { address, init_code: identity.init_code()? },
            None if identity.proxy_creation_code.is_some() => {
                AddressDeriver.derive_address(&identity)?
            }
            None => {
                let entry_point = self.contracts.entry_point(chain_id, self.config.version)?;
                AddressDeriver.resolve_remote(&identity, entry_point.as_ref()).await?
            }
        };
        debug!("Smart account on {}: {:?}", chain_name(chain_id), wallet.address);

        self.wallets.write().insert(chain_id, wallet.clone());
        Ok(wallet)
    }

    /// Address of the smart account on the chain (valid before deployment)
    pub async fn get_address(&self, chain_id: u64) -> Result<Address, AccountError> {
        Ok(self.counterfactual_wallet(chain_id).await?.address)
    }

    pub async fn is_deployed(&self, chain_id: u64) -> Result<bool, AccountError> {
        let wallet = self.get_address(chain_id).await?;
        self.chain(chain_id)?.tracker.is_deployed(wallet).await
    }

    async fn deployment_status(&self, chain_id: u64) -> Result<DeploymentStatus, AccountError> {
        Ok(if self.is_deployed(chain_id).await? {
            DeploymentStatus::Deployed
        } else {
            DeploymentStatus::Phantom
        })
    }

    pub async fn get_smart_account_state(
        &self,
        chain_id: u64,
    ) -> Result<SmartAccountState, AccountError> {
        let address = self.get_address(chain_id).await?;
        let is_deployed = self.is_deployed(chain_id).await?;
        let contracts = self.addresses(chain_id)?;
        Ok(SmartAccountState {
            address,
            owner: self.config.owner.unwrap_or_default(),
            is_deployed,
            entry_point_address: contracts.entry_point,
            fallback_handler_address: contracts.fallback_handler,
        })
    }

    pub fn get_smart_account_context(
        &self,
        chain_id: u64,
    ) -> Result<SmartAccountContext, AccountError> {
        let contracts = self.addresses(chain_id)?;
        Ok(SmartAccountContext {
            base_wallet: contracts.wallet,
            wallet_factory: contracts.wallet_factory,
            multi_send: contracts.multi_send,
            multi_send_call: contracts.multi_send_call_only,
        })
    }

    /// Wallet nonce of the configured batch id, zero while the wallet is not deployed
    async fn nonce(&self, chain_id: u64) -> Result<U256, AccountError> {
        if !self.is_deployed(chain_id).await? {
            return Ok(U256::zero());
        }
        let wallet = self.get_address(chain_id).await?;
        self.contracts
            .smart_wallet(chain_id, self.config.version, wallet)?
            .get_nonce(self.config.batch_id)
            .await
            .map_err(|err| AccountError::estimation(EstimationStage::Nonce, err))
    }

    fn envelope_builder(&self, chain_id: u64) -> Result<EnvelopeBuilder, AccountError> {
        self.addresses(chain_id)?;
        Ok(EnvelopeBuilder::new(self.contracts.multi_send(chain_id, self.config.version)?))
    }

    fn estimation_engine(&self, chain_id: u64) -> Result<FeeEstimationEngine, AccountError> {
        Ok(FeeEstimationEngine::new(
            self.estimation.clone(),
            chain_id,
            self.config.version,
            self.addresses(chain_id)?.gas.clone(),
        ))
    }

    fn deployment_call(&self, chain_id: u64) -> Result<DeploymentCall, AccountError> {
        let identity = self.identity(chain_id)?;
        let factory = self.contracts.wallet_factory(chain_id, self.config.version)?;
        let missing = |field| AccountError::AddressDerivation { field };
        Ok(DeploymentCall {
            factory: factory.address(),
            data: factory.encode_deploy(
                identity.owner.ok_or_else(|| missing("owner"))?,
                identity.entry_point.ok_or_else(|| missing("entry point"))?,
                identity.fallback_handler.ok_or_else(|| missing("fallback handler"))?,
                identity.index,
            ),
        })
    }

    /// Gasless wallet transaction calling the target directly
    pub async fn create_transaction(
        &self,
        chain_id: u64,
        tx: &MetaTransaction,
    ) -> Result<WalletTransaction, AccountError> {
        let builder = self.envelope_builder(chain_id)?;
        let nonce = self.nonce(chain_id).await?;
        Ok(builder.single(tx, nonce))
    }

    /// Gasless wallet transaction executing the batch through the multisend helper
    pub async fn create_transaction_batch(
        &self,
        chain_id: u64,
        txs: &[MetaTransaction],
    ) -> Result<WalletTransaction, AccountError> {
        if txs.is_empty() {
            return Err(AccountError::EmptyBatch);
        }
        let builder = self.envelope_builder(chain_id)?;
        let nonce = self.nonce(chain_id).await?;
        builder.batch(txs, nonce)
    }

    /// Gas of deploying the smart account through its factory
    pub async fn estimate_smart_account_deployment(
        &self,
        chain_id: u64,
    ) -> Result<U256, AccountError> {
        let deployment = self.deployment_call(chain_id)?;
        self.estimation_engine(chain_id)?.deployment_gas(&deployment).await
    }

    async fn quote_envelope(
        &self,
        chain_id: u64,
        envelope: &WalletTransaction,
    ) -> Result<Vec<FeeQuote>, AccountError> {
        let wallet = self.get_address(chain_id).await?;
        let status = self.deployment_status(chain_id).await?;
        let deployment = self.deployment_call(chain_id)?;
        let engine = self.estimation_engine(chain_id)?;
        let estimation = engine.estimate(wallet, envelope, status, &deployment).await?;
        debug!(
            "Estimated {} gas for {wallet:?} ({status:?}), {} fee quotes",
            estimation.gas.estimated_gas_used,
            estimation.fee_quotes.len()
        );
        Ok(estimation.fee_quotes)
    }

    /// Fee quotes of sending the transaction with a token refund
    pub async fn prepare_refund_transaction(
        &self,
        chain_id: u64,
        tx: &MetaTransaction,
    ) -> Result<Vec<FeeQuote>, AccountError> {
        let envelope = self.create_transaction(chain_id, tx).await?;
        self.quote_envelope(chain_id, &envelope).await
    }

    /// Fee quotes of sending the batch with a token refund
    pub async fn prepare_refund_transaction_batch(
        &self,
        chain_id: u64,
        txs: &[MetaTransaction],
    ) -> Result<Vec<FeeQuote>, AccountError> {
        let envelope = self.create_transaction_batch(chain_id, txs).await?;
        self.quote_envelope(chain_id, &envelope).await
    }

    async fn refund_gas(
        &self,
        chain_id: u64,
        envelope: &WalletTransaction,
        quote: &FeeQuote,
    ) -> Result<GasEstimate, AccountError> {
        let wallet = self.get_address(chain_id).await?;
        let status = self.deployment_status(chain_id).await?;
        let engine = self.estimation_engine(chain_id)?;
        let deployment_gas = if status == DeploymentStatus::Deployed {
            U256::zero()
        } else {
            engine.deployment_gas(&self.deployment_call(chain_id)?).await?
        };
        engine.gas(wallet, envelope, &FeeRefund::from(quote), status, deployment_gas).await
    }

    /// Wallet transaction paying the relayer in the quoted token
    pub async fn create_refund_transaction(
        &self,
        chain_id: u64,
        tx: &MetaTransaction,
        quote: &FeeQuote,
    ) -> Result<WalletTransaction, AccountError> {
        let builder = self.envelope_builder(chain_id)?;
        let envelope = builder.single(tx, self.nonce(chain_id).await?);
        let gas = self.refund_gas(chain_id, &envelope, quote).await?;
        Ok(builder.with_refund(envelope, quote, gas.target_tx_gas, gas.base_gas))
    }

    /// Batch wallet transaction paying the relayer in the quoted token
    pub async fn create_refund_transaction_batch(
        &self,
        chain_id: u64,
        txs: &[MetaTransaction],
        quote: &FeeQuote,
    ) -> Result<WalletTransaction, AccountError> {
        if txs.is_empty() {
            return Err(AccountError::EmptyBatch);
        }
        let builder = self.envelope_builder(chain_id)?;
        let envelope = builder.batch(txs, self.nonce(chain_id).await?)?;
        let gas = self.refund_gas(chain_id, &envelope, quote).await?;
        Ok(builder.with_refund(envelope, quote, gas.target_tx_gas, gas.base_gas))
    }

    /// Quotes of a phantom wallet paying for its own deployment
    pub async fn prepare_deploy_and_pay_fees(
        &self,
        chain_id: u64,
    ) -> Result<Vec<FeeQuote>, AccountError> {
        let deployment_gas = self.estimate_smart_account_deployment(chain_id).await?;
        self.estimation_engine(chain_id)?.deployment_quotes(deployment_gas).await
    }

    /// Deploys the wallet through the relayer, paying the fee receiver in the quoted token
    pub async fn deploy_and_pay_fees(
        &self,
        chain_id: u64,
        quote: &FeeQuote,
    ) -> Result<H256, AccountError> {
        let fee_receiver = quote
            .refund_receiver
            .or(self.config.default_fee_receiver)
            .ok_or(AccountError::MissingField { field: "feeReceiver" })?;

        let deployment_gas = self.estimate_smart_account_deployment(chain_id).await?;
        let option = TokenData {
            token_gas_price: Some(quote.token_gas_price),
            offset: Some(quote.offset),
            ..Default::default()
        };
        let transfer_gas = self.addresses(chain_id)?.gas.deployment_fee_transfer_gas;
        let fees = option.quote(deployment_gas.saturating_add(transfer_gas)).payment;
        info!(
            "Paying {fees} of token {:?} to {fee_receiver:?} for wallet deployment",
            quote.address
        );

        let transfer =
            MetaTransaction::call(quote.address, U256::zero(), encode_transfer(fee_receiver, fees));
        let tx = self.create_transaction(chain_id, &transfer).await?;
        self.send_transaction(chain_id, &tx, None).await
    }

    /// Owner signature of the wallet transaction
    pub async fn sign_transaction(
        &self,
        chain_id: u64,
        tx: &WalletTransaction,
    ) -> Result<Bytes, AccountError> {
        let wallet = self.get_address(chain_id).await?;
        self.signer.sign_transaction(tx, &wallet, chain_id).await
    }

    /// Signs the wallet transaction and hands it to the relayer
    ///
    /// # Arguments
    /// * `chain_id` - Chain of the wallet
    /// * `tx` - Wallet transaction
    /// * `gas_limit` - Gas limit for the relayer (replaced by the undeployed limit while the
    ///   wallet has no code)
    ///
    /// # Returns
    /// * `H256` - Hash of the relayed transaction
    pub async fn send_transaction(
        &self,
        chain_id: u64,
        tx: &WalletTransaction,
        gas_limit: Option<U256>,
    ) -> Result<H256, AccountError> {
        let wallet = self.get_address(chain_id).await?;
        let state = self.get_smart_account_state(chain_id).await?;
        let context = self.get_smart_account_context(chain_id)?;
        let signature = self.sign_transaction(chain_id, tx).await?;

        let data = self
            .contracts
            .smart_wallet(chain_id, self.config.version, wallet)?
            .encode_exec_transaction(tx, self.config.batch_id, signature);
        let gas_limit = if state.is_deployed {
            gas_limit
        } else {
            Some(self.addresses(chain_id)?.gas.undeployed_relay_gas_limit)
        };

        let relay = RelayTransaction {
            signed_tx: SignedTransaction {
                raw_tx: RawTransaction { to: wallet, data, value: U256::zero(), chain_id },
                tx: tx.clone(),
            },
            config: state,
            context,
            gas_limit,
        };
        info!(
            "Relaying transaction of {wallet:?} on {} (nonce {}, deployed: {})",
            chain_name(chain_id),
            tx.nonce,
            relay.config.is_deployed
        );

        self.relayer.dispatch(&RelayPayload::Transaction(relay)).await
    }

    /// User operation for the request, everything but the signature
    pub async fn create_unsigned_user_op(
        &self,
        chain_id: u64,
        request: &UserOperationRequest,
    ) -> Result<UserOperation, AccountError> {
        if let Some(field) = request.missing_field() {
            return Err(AccountError::MissingField { field });
        }

        let chain = self.chain(chain_id)?;
        let contracts = self.addresses(chain_id)?;
        let wallet = self.counterfactual_wallet(chain_id).await?;
        let smart_wallet =
            self.contracts.smart_wallet(chain_id, self.config.version, wallet.address)?;
        let entry_point = self.contracts.entry_point(chain_id, self.config.version)?;

        let mut assembler = UserOperationAssembler::new(
            chain.reader.clone(),
            self.config.overhead.clone(),
            contracts.gas.clone(),
        );
        if let Some(paymaster) = &self.paymaster {
            assembler = assembler.paymaster(paymaster.clone());
        }

        let ctx = AssemblyContext {
            wallet: &wallet,
            smart_wallet: smart_wallet.as_ref(),
            entry_point: entry_point.as_ref(),
            tracker: &chain.tracker,
        };
        assembler.assemble(&ctx, request).await
    }

    /// User operation for the request signed by the owner
    pub async fn create_signed_user_op(
        &self,
        chain_id: u64,
        request: &UserOperationRequest,
    ) -> Result<UserOperation, AccountError> {
        let user_operation = self.create_unsigned_user_op(chain_id, request).await?;
        let entry_point = self.addresses(chain_id)?.entry_point;
        self.signer.sign_user_operation(user_operation, &entry_point, chain_id).await
    }

    async fn submit_user_operation(
        &self,
        chain_id: u64,
        request: &UserOperationRequest,
    ) -> Result<H256, AccountError> {
        let bundler =
            self.bundler.as_ref().ok_or(AccountError::MissingField { field: "bundler" })?;
        let user_operation = self.create_signed_user_op(chain_id, request).await?;
        let entry_point = self.addresses(chain_id)?.entry_point;
        info!(
            "Sending user operation of {:?} on {} to the bundler",
            user_operation.sender,
            chain_name(chain_id)
        );
        bundler.dispatch(&RelayPayload::UserOperation { user_operation, entry_point }).await
    }

    /// Signs the user operation for the request and sends it to the bundler
    pub async fn send_user_operation(
        &self,
        chain_id: u64,
        request: &UserOperationRequest,
    ) -> Result<H256, AccountError> {
        if let Some(field) = request.missing_field() {
            return Err(AccountError::MissingField { field });
        }
        self.submit_user_operation(chain_id, request).await
    }

    /// Sends a no-op user operation whose only effect is deploying the wallet
    pub async fn deploy_wallet_only(&self, chain_id: u64) -> Result<H256, AccountError> {
        let request = UserOperationRequest::new(Address::zero())
            .value(U256::zero())
            .data(Bytes::default())
            .gas_limit(self.addresses(chain_id)?.gas.deploy_only_call_gas);
        self.submit_user_operation(chain_id, &request).await
    }
}
