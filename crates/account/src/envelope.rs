//! Wallet transaction envelopes built from meta-transactions

use crate::error::AccountError;
use ethers::types::U256;
use halyard_contracts::MultiSendHandle;
use halyard_primitives::{FeeQuote, FeeRefund, MetaTransaction, Operation, WalletTransaction};
use std::sync::Arc;
use tracing::trace;

pub struct EnvelopeBuilder {
    multi_send: Arc<dyn MultiSendHandle>,
}

impl EnvelopeBuilder {
    pub fn new(multi_send: Arc<dyn MultiSendHandle>) -> Self {
        Self { multi_send }
    }

    /// Gasless envelope calling the transaction's target directly
    pub fn single(&self, tx: &MetaTransaction, nonce: U256) -> WalletTransaction {
        WalletTransaction::from(tx).operation(Operation::Call).nonce(nonce)
    }

    /// Gasless envelope delegate calling the multisend helper with the packed batch (in input
    /// order)
    pub fn batch(
        &self,
        txs: &[MetaTransaction],
        nonce: U256,
    ) -> Result<WalletTransaction, AccountError> {
        if txs.is_empty() {
            return Err(AccountError::EmptyBatch);
        }
        trace!("Packing {} transactions for multisend {:?}", txs.len(), self.multi_send.address());
        Ok(self.multi_send.batch_transaction(txs, nonce))
    }

    /// Fills every refund field from the quote
    pub fn with_refund(
        &self,
        tx: WalletTransaction,
        quote: &FeeQuote,
        target_tx_gas: U256,
        base_gas: U256,
    ) -> WalletTransaction {
        let refund = FeeRefund { base_gas, ..FeeRefund::from(quote) };
        WalletTransaction {
            target_tx_gas,
            base_gas: refund.base_gas,
            gas_price: refund.gas_price,
            token_gas_price_factor: refund.token_gas_price_factor,
            gas_token: refund.gas_token,
            refund_receiver: refund.refund_receiver,
            ..tx
        }
    }
}
