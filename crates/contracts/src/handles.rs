//! Typed handles of the contracts a smart account talks to
//!
//! Each handle exposes only what the account pipeline calls. Calldata encoding lives in the
//! provided methods; implementors supply the address and the chain reads.

use crate::{
    error::EntryPointError,
    gen::{
        entry_point_api::{EntryPointAPI, GetSenderAddressCall},
        gas_estimator_api::EstimateCall,
        multi_send_api::MultiSendCall,
        smart_wallet_api::{
            ExecFromEntryPointCall, ExecTransactionCall, FeeRefund, SmartWalletAPI, Transaction,
        },
        token_api::TransferCall,
        wallet_factory_api::DeployCounterFactualWalletCall,
    },
};
use async_trait::async_trait;
use ethers::{
    abi::AbiEncode,
    providers::Middleware,
    types::{Address, Bytes, U256},
};
use halyard_primitives::{
    multisend::encode_multi_send, pack_init_code, MetaTransaction, Operation, WalletTransaction,
};
use std::sync::Arc;

/// Smart wallet proxy of one account
#[async_trait]
pub trait SmartWalletHandle: Send + Sync {
    fn address(&self) -> Address;

    /// Nonce of the batch id space
    async fn get_nonce(&self, batch_id: U256) -> eyre::Result<U256>;

    /// `execTransaction(tx, batchId, refundInfo, signatures)` calldata
    fn encode_exec_transaction(
        &self,
        tx: &WalletTransaction,
        batch_id: U256,
        signature: Bytes,
    ) -> Bytes {
        let exec = tx.exec_transaction();
        let refund = tx.fee_refund();
        ExecTransactionCall {
            transaction: Transaction {
                to: exec.to,
                value: exec.value,
                data: exec.data,
                operation: exec.operation.into(),
                target_tx_gas: exec.target_tx_gas,
            },
            batch_id,
            refund_info: FeeRefund {
                base_gas: refund.base_gas,
                gas_price: refund.gas_price,
                token_gas_price_factor: refund.token_gas_price_factor,
                gas_token: refund.gas_token,
                refund_receiver: refund.refund_receiver,
            },
            signatures: signature,
        }
        .encode()
        .into()
    }

    /// `execFromEntryPoint(dest, value, func, operation, gasLimit)` calldata of a user operation
    fn encode_exec_from_entry_point(&self, tx: &MetaTransaction, gas_limit: U256) -> Bytes {
        ExecFromEntryPointCall {
            dest: tx.to,
            value: tx.value,
            func: tx.data.clone(),
            operation: tx.operation.into(),
            gas_limit,
        }
        .encode()
        .into()
    }
}

/// Factory deploying wallet proxies
pub trait FactoryHandle: Send + Sync {
    fn address(&self) -> Address;

    /// `deployCounterFactualWallet(owner, entryPoint, handler, index)` calldata
    fn encode_deploy(
        &self,
        owner: Address,
        entry_point: Address,
        handler: Address,
        index: U256,
    ) -> Bytes {
        DeployCounterFactualWalletCall { owner, entry_point, handler, index }.encode().into()
    }

    /// Factory address followed by the deployment calldata
    fn init_code(
        &self,
        owner: Address,
        entry_point: Address,
        handler: Address,
        index: U256,
    ) -> Bytes {
        pack_init_code(self.address(), &self.encode_deploy(owner, entry_point, handler, index))
    }
}

/// Multisend helper executing packed transactions in order
pub trait MultiSendHandle: Send + Sync {
    fn address(&self) -> Address;

    /// `multiSend(bytes)` calldata
    fn encode_multi_send(&self, txs: &[MetaTransaction]) -> Bytes {
        MultiSendCall { transactions: encode_multi_send(txs) }.encode().into()
    }

    /// Wallet transaction delegate calling the helper with the packed batch
    fn batch_transaction(&self, txs: &[MetaTransaction], nonce: U256) -> WalletTransaction {
        WalletTransaction::default()
            .to(self.address())
            .data(self.encode_multi_send(txs))
            .operation(Operation::DelegateCall)
            .nonce(nonce)
    }
}

#[async_trait]
pub trait EntryPointHandle: Send + Sync {
    fn address(&self) -> Address;

    /// `getSenderAddress(initCode)` calldata
    fn encode_get_sender_address(&self, init_code: Bytes) -> Bytes {
        GetSenderAddressCall { init_code }.encode().into()
    }

    /// Address the entry point would create for `init_code` (never deploys)
    async fn get_sender_address(&self, init_code: Bytes) -> Result<Address, EntryPointError>;
}

/// `estimate(to, data)` calldata of the gas estimator helper
pub fn encode_estimate(to: Address, data: Bytes) -> Bytes {
    EstimateCall { to, data }.encode().into()
}

/// ERC-20 `transfer(to, amount)` calldata
pub fn encode_transfer(to: Address, amount: U256) -> Bytes {
    TransferCall { to, amount }.encode().into()
}

/// Wallet proxy read through an ethers middleware
#[derive(Clone)]
pub struct SmartWallet<M: Middleware + 'static> {
    smart_wallet_api: SmartWalletAPI<M>,
}

impl<M: Middleware + 'static> SmartWallet<M> {
    pub fn new(eth_client: Arc<M>, address: Address) -> Self {
        Self { smart_wallet_api: SmartWalletAPI::new(address, eth_client) }
    }
}

#[async_trait]
impl<M: Middleware + 'static> SmartWalletHandle for SmartWallet<M> {
    fn address(&self) -> Address {
        self.smart_wallet_api.address()
    }

    async fn get_nonce(&self, batch_id: U256) -> eyre::Result<U256> {
        Ok(self.smart_wallet_api.get_nonce(batch_id).call().await?)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct WalletFactory {
    address: Address,
}

impl WalletFactory {
    pub fn new(address: Address) -> Self {
        Self { address }
    }
}

impl FactoryHandle for WalletFactory {
    fn address(&self) -> Address {
        self.address
    }
}

#[derive(Debug, Clone, Copy)]
pub struct MultiSend {
    address: Address,
}

impl MultiSend {
    pub fn new(address: Address) -> Self {
        Self { address }
    }
}

impl MultiSendHandle for MultiSend {
    fn address(&self) -> Address {
        self.address
    }
}

#[derive(Clone)]
pub struct EntryPoint<M: Middleware + 'static> {
    entry_point_api: EntryPointAPI<M>,
}

impl<M: Middleware + 'static> EntryPoint<M> {
    pub fn new(eth_client: Arc<M>, address: Address) -> Self {
        Self { entry_point_api: EntryPointAPI::new(address, eth_client) }
    }
}

#[async_trait]
impl<M: Middleware + 'static> EntryPointHandle for EntryPoint<M> {
    fn address(&self) -> Address {
        self.entry_point_api.address()
    }

    async fn get_sender_address(&self, init_code: Bytes) -> Result<Address, EntryPointError> {
        let res = self.entry_point_api.get_sender_address(init_code).call().await;

        match res {
            Ok(_) => Err(EntryPointError::NoRevert { function: "get_sender_address".into() }),
            Err(e) => match EntryPointError::from_contract_error(e) {
                EntryPointError::SenderAddress(sender) => Ok(sender),
                other => Err(other),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::{abi::AbiDecode, utils::id};
    use halyard_primitives::multisend::decode_multi_send;

    #[test]
    fn init_code_starts_with_factory() {
        let factory = WalletFactory::new(Address::repeat_byte(0xbb));
        let init_code = factory.init_code(
            Address::repeat_byte(0xaa),
            Address::repeat_byte(0x01),
            Address::repeat_byte(0x02),
            U256::zero(),
        );
        assert_eq!(&init_code[..20], Address::repeat_byte(0xbb).as_bytes());
        assert_eq!(
            &init_code[20..24],
            &id("deployCounterFactualWallet(address,address,address,uint256)")
        );
        assert_eq!(init_code.len(), 20 + 4 + 4 * 32);
    }

    #[test]
    fn batch_is_delegate_call_to_multisend() {
        let multi_send = MultiSend::new(Address::repeat_byte(0x33));
        let txs = vec![
            MetaTransaction::call(Address::repeat_byte(1), U256::zero(), "0x01".parse().unwrap()),
            MetaTransaction::call(Address::repeat_byte(2), 7.into(), Bytes::default()),
        ];
        let tx = multi_send.batch_transaction(&txs, 3.into());
        assert_eq!(tx.to, Address::repeat_byte(0x33));
        assert_eq!(tx.operation, Operation::DelegateCall);
        assert_eq!(tx.nonce, 3.into());
        assert!(tx.is_gasless());

        let call = MultiSendCall::decode(&tx.data).unwrap();
        assert_eq!(decode_multi_send(&call.transactions).unwrap(), txs);
    }

    #[test]
    fn transfer_calldata() {
        let data = encode_transfer(Address::repeat_byte(9), 184.into());
        assert_eq!(&data[..4], &id("transfer(address,uint256)"));
        assert_eq!(data.len(), 4 + 2 * 32);
    }
}
