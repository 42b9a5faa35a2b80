//! Assembly of unsigned user operations

use crate::{
    address::CounterfactualWallet,
    deployment::DeploymentStateTracker,
    error::{AccountError, EstimationStage},
    traits::{ChainReader, PaymasterApi},
};
use ethers::types::{Address, Bytes, TransactionRequest, U256};
use halyard_contracts::{EntryPointHandle, SmartWalletHandle};
use halyard_primitives::{gas::Overhead, GasOffsets, UserOperation, UserOperationRequest};
use std::sync::Arc;
use tracing::{debug, trace};

/// Contracts of the wallet the operation is assembled for
pub struct AssemblyContext<'a> {
    pub wallet: &'a CounterfactualWallet,
    pub smart_wallet: &'a dyn SmartWalletHandle,
    pub entry_point: &'a dyn EntryPointHandle,
    pub tracker: &'a DeploymentStateTracker,
}

pub struct UserOperationAssembler {
    chain: Arc<dyn ChainReader>,
    paymaster: Option<Arc<dyn PaymasterApi>>,
    overhead: Overhead,
    gas: GasOffsets,
}

impl UserOperationAssembler {
    pub fn new(chain: Arc<dyn ChainReader>, overhead: Overhead, gas: GasOffsets) -> Self {
        Self { chain, paymaster: None, overhead, gas }
    }

    pub fn paymaster(mut self, paymaster: Arc<dyn PaymasterApi>) -> Self {
        self.paymaster = Some(paymaster);
        self
    }

    async fn estimate_gas(
        &self,
        from: Option<Address>,
        to: Address,
        data: Bytes,
        stage: EstimationStage,
    ) -> Result<U256, AccountError> {
        let mut tx = TransactionRequest::new().to(to).data(data);
        if let Some(from) = from {
            tx = tx.from(from);
        }
        self.chain
            .estimate_gas(&tx.into())
            .await
            .map_err(|err| AccountError::estimation(stage, err))
    }

    /// Builds the user operation for the request, everything but the signature
    ///
    /// # Arguments
    /// * `ctx` - Wallet, its contracts and deployment tracker
    /// * `request` - Call to perform with optional gas and fee overrides
    ///
    /// # Returns
    /// * `UserOperation` - Operation with an empty signature
    pub async fn assemble(
        &self,
        ctx: &AssemblyContext<'_>,
        request: &UserOperationRequest,
    ) -> Result<UserOperation, AccountError> {
        if let Some(field) = request.missing_field() {
            return Err(AccountError::MissingField { field });
        }

        let sender = ctx.wallet.address;
        let entry_point = ctx.entry_point.address();
        let call_data = ctx.smart_wallet.encode_exec_from_entry_point(
            &request.meta_transaction(),
            self.gas.exec_from_entry_point_gas,
        );

        let call_gas_limit = match request.gas_limit {
            Some(gas_limit) => gas_limit,
            None => {
                self.estimate_gas(
                    Some(entry_point),
                    sender,
                    call_data.clone(),
                    EstimationStage::CallGas,
                )
                .await?
            }
        };

        let init_code = ctx.tracker.init_code(ctx.wallet).await?;
        let phantom = !init_code.is_empty();

        let nonce = if phantom {
            U256::zero()
        } else {
            ctx.smart_wallet
                .get_nonce(U256::zero())
                .await
                .map_err(|err| AccountError::estimation(EstimationStage::Nonce, err))?
        };

        let mut verification_gas_limit = self.gas.base_verification_gas;
        if phantom {
            let creation_gas = self
                .estimate_gas(
                    None,
                    entry_point,
                    ctx.entry_point.encode_get_sender_address(init_code.clone()),
                    EstimationStage::VerificationGas,
                )
                .await?;
            verification_gas_limit = verification_gas_limit.saturating_add(creation_gas);
        }

        let (max_fee_per_gas, max_priority_fee_per_gas) =
            match (request.max_fee_per_gas, request.max_priority_fee_per_gas) {
                (Some(max_fee), Some(max_priority_fee)) => (max_fee, max_priority_fee),
                (max_fee, max_priority_fee) => {
                    let fee_data = self
                        .chain
                        .fee_data()
                        .await
                        .map_err(|err| AccountError::estimation(EstimationStage::FeeData, err))?;
                    (
                        max_fee.unwrap_or(fee_data.max_fee_per_gas),
                        max_priority_fee.unwrap_or(fee_data.max_priority_fee_per_gas),
                    )
                }
            };

        let mut user_operation = UserOperation {
            sender,
            nonce,
            init_code,
            call_data,
            call_gas_limit,
            verification_gas_limit,
            max_fee_per_gas,
            max_priority_fee_per_gas,
            ..Default::default()
        };

        if let Some(paymaster) = &self.paymaster {
            user_operation.paymaster_and_data = paymaster
                .get_paymaster_and_data(&user_operation)
                .await
                .map_err(|err| AccountError::estimation(EstimationStage::Paymaster, err))?;
        }

        user_operation.pre_verification_gas =
            self.overhead.calculate_pre_verification_gas(&user_operation);

        debug!(
            "Assembled user operation for {sender:?}: nonce {nonce}, call gas {call_gas_limit}, verification gas {verification_gas_limit}, pre-verification gas {}",
            user_operation.pre_verification_gas
        );
        trace!("User operation: {user_operation:?}");

        Ok(user_operation)
    }
}
