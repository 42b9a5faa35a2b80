//! Gas estimation and fee quotes of wallet transactions
//!
//! Undeployed wallets cannot be simulated directly, so their figures come from the
//! override bytecode path of the estimation service, padded with a larger offset. Deployment gas is
//! charged through `baseGas` since the relayer deploys the wallet in the same transaction.

use crate::{
    deployment::DeploymentStatus,
    error::{AccountError, EstimationStage},
    traits::GasEstimationService,
};
use ethers::types::{Address, Bytes, U256};
use halyard_contracts::encode_estimate;
use halyard_primitives::{
    FeeQuote, FeeRefund, GasOffsets, HandlePaymentRefund, SmartAccountVersion, TokenData,
    WalletTransaction,
};
use std::sync::Arc;
use tracing::debug;

/// Factory call deploying the wallet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentCall {
    pub factory: Address,
    pub data: Bytes,
}

/// Gas figures of a refund transaction
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct GasEstimate {
    pub target_tx_gas: U256,
    /// Includes `deployment_gas`
    pub base_gas: U256,
    /// Zero for deployed wallets
    pub deployment_gas: U256,
    pub estimated_gas_used: U256,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeeEstimation {
    pub gas: GasEstimate,
    /// One quote per fee token option
    pub fee_quotes: Vec<FeeQuote>,
}

pub struct FeeEstimationEngine {
    service: Arc<dyn GasEstimationService>,
    chain_id: u64,
    version: SmartAccountVersion,
    gas: GasOffsets,
}

impl FeeEstimationEngine {
    pub fn new(
        service: Arc<dyn GasEstimationService>,
        chain_id: u64,
        version: SmartAccountVersion,
        gas: GasOffsets,
    ) -> Self {
        Self { service, chain_id, version, gas }
    }

    /// Gas of deploying the wallet, simulated through the gas estimator helper
    pub async fn deployment_gas(&self, deployment: &DeploymentCall) -> Result<U256, AccountError> {
        let encoded = encode_estimate(deployment.factory, deployment.data.clone());
        let gas = self
            .service
            .estimate_external_gas(self.chain_id, encoded)
            .await
            .map_err(|err| AccountError::estimation(EstimationStage::Deployment, err))?;
        debug!("Wallet deployment gas on chain {}: {gas}", self.chain_id);
        Ok(gas)
    }

    /// `targetTxGas` and `baseGas` of the envelope paying `refund`
    ///
    /// # Arguments
    /// * `wallet` - Wallet address
    /// * `envelope` - Transaction to execute (its `targetTxGas` is replaced by the placeholder)
    /// * `refund` - Refund the wallet pays
    /// * `status` - Deployment status of the wallet
    /// * `deployment_gas` - Gas of deploying the wallet (ignored once deployed)
    ///
    /// # Returns
    /// * `GasEstimate` - Gas figures of the transaction
    pub async fn gas(
        &self,
        wallet: Address,
        envelope: &WalletTransaction,
        refund: &FeeRefund,
        status: DeploymentStatus,
        deployment_gas: U256,
    ) -> Result<GasEstimate, AccountError> {
        let deployed = status == DeploymentStatus::Deployed;
        let deployment_gas = if deployed { U256::zero() } else { deployment_gas };
        let (offset, override_mode) = if deployed {
            (self.gas.deployed_required_tx_gas_offset, false)
        } else {
            (self.gas.override_required_tx_gas_offset, true)
        };

        let probe = envelope.clone().target_tx_gas(self.gas.target_tx_gas_placeholder);
        let required = self
            .service
            .estimate_required_tx_gas(self.chain_id, wallet, &probe, override_mode)
            .await
            .map_err(|err| AccountError::estimation(EstimationStage::RequiredTxGas, err))?;
        let target_tx_gas = required.saturating_add(offset);

        let payment = HandlePaymentRefund {
            base_gas: target_tx_gas,
            ..HandlePaymentRefund::new(target_tx_gas, refund)
        };
        let handle_payment = self
            .service
            .estimate_handle_payment_gas(
                self.chain_id,
                wallet,
                self.version,
                &payment,
                override_mode,
            )
            .await
            .map_err(|err| AccountError::estimation(EstimationStage::HandlePaymentGas, err))?;

        let base_gas = handle_payment
            .saturating_add(self.gas.gas_usage_offset)
            .saturating_add(deployment_gas);
        let estimate = GasEstimate {
            target_tx_gas,
            base_gas,
            deployment_gas,
            estimated_gas_used: target_tx_gas.saturating_add(base_gas),
        };
        debug!(
            "Gas estimate for wallet {wallet:?} (override: {override_mode}): required tx gas {required}, handle payment {handle_payment}, {estimate:?}"
        );

        Ok(estimate)
    }

    /// Fee tokens accepted on the chain
    pub async fn fee_options(&self) -> Result<Vec<TokenData>, AccountError> {
        self.service
            .get_fee_options(self.chain_id)
            .await
            .map_err(|err| AccountError::estimation(EstimationStage::FeeOptions, err))
    }

    /// One quote per fee token for `estimated_gas_used`
    pub async fn quotes(&self, estimated_gas_used: U256) -> Result<Vec<FeeQuote>, AccountError> {
        let options = self.fee_options().await?;
        Ok(options.iter().map(|option| option.quote(estimated_gas_used)).collect())
    }

    /// Quotes of a wallet paying for its own deployment with a token transfer
    pub async fn deployment_quotes(
        &self,
        deployment_gas: U256,
    ) -> Result<Vec<FeeQuote>, AccountError> {
        let estimated = deployment_gas.saturating_add(self.gas.deployment_fee_transfer_gas);
        Ok(self
            .fee_options()
            .await?
            .into_iter()
            .map(|option| TokenData { fee_token_transfer_gas: U256::zero(), ..option })
            .map(|option| option.quote(estimated))
            .collect())
    }

    /// Gas figures and fee quotes of the gasless envelope
    ///
    /// # Arguments
    /// * `wallet` - Wallet address
    /// * `envelope` - Gasless transaction to quote
    /// * `status` - Deployment status of the wallet
    /// * `deployment` - Factory call deploying the wallet (only simulated while undeployed)
    ///
    /// # Returns
    /// * `FeeEstimation` - Estimated gas and one quote per fee token
    pub async fn estimate(
        &self,
        wallet: Address,
        envelope: &WalletTransaction,
        status: DeploymentStatus,
        deployment: &DeploymentCall,
    ) -> Result<FeeEstimation, AccountError> {
        let deployment_gas = if status == DeploymentStatus::Deployed {
            U256::zero()
        } else {
            self.deployment_gas(deployment).await?
        };
        let gas = self.gas(wallet, envelope, &envelope.fee_refund(), status, deployment_gas).await?;
        let fee_quotes = self.quotes(gas.estimated_gas_used).await?;

        Ok(FeeEstimation { gas, fee_quotes })
    }
}
