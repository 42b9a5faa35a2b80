//! Wallet transaction types (meta-transactions and the signed envelope executed by the wallet)

use crate::fee::FeeRefund;
use ethers::{
    abi::{encode, Token},
    types::{Address, Bytes, H256, U256},
    utils::keccak256,
};
use serde::{Deserialize, Serialize};
use std::{fmt, ops::Deref};

/// EIP-712 type of the wallet transaction
pub const ACCOUNT_TX_TYPE: &str = "AccountTx(address to,uint256 value,bytes data,uint8 operation,uint256 targetTxGas,uint256 baseGas,uint256 gasPrice,uint256 tokenGasPriceFactor,address gasToken,address refundReceiver,uint256 nonce)";

/// EIP-712 domain of the wallet
pub const DOMAIN_SEPARATOR_TYPE: &str = "EIP712Domain(uint256 chainId,address verifyingContract)";

/// How the wallet executes a call
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Operation {
    #[default]
    Call = 0,
    DelegateCall = 1,
}

impl From<Operation> for u8 {
    fn from(value: Operation) -> Self {
        value as u8
    }
}

impl TryFrom<u8> for Operation {
    type Error = InvalidOperation;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Call),
            1 => Ok(Self::DelegateCall),
            other => Err(InvalidOperation(other)),
        }
    }
}

/// Operation byte outside of `{0, 1}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid operation type {0}")]
pub struct InvalidOperation(pub u8);

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Call => write!(f, "call"),
            Self::DelegateCall => write!(f, "delegatecall"),
        }
    }
}

/// Single unit of work executed by the wallet
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaTransaction {
    /// Call target
    pub to: Address,
    /// Native value forwarded with the call
    #[serde(default)]
    pub value: U256,
    /// Call data
    #[serde(default)]
    pub data: Bytes,
    /// Call or delegate call
    #[serde(default)]
    pub operation: Operation,
}

impl MetaTransaction {
    /// Regular call from the wallet
    pub fn call(to: Address, value: U256, data: Bytes) -> Self {
        Self { to, value, data, operation: Operation::Call }
    }

    /// Delegate call from the wallet
    pub fn delegate_call(to: Address, value: U256, data: Bytes) -> Self {
        Self { to, value, data, operation: Operation::DelegateCall }
    }
}

/// The execution part of a wallet transaction (argument `_tx` of `execTransaction`)
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecTransaction {
    pub to: Address,
    pub value: U256,
    pub data: Bytes,
    pub operation: Operation,
    pub target_tx_gas: U256,
}

/// Transaction envelope signed by the owner and executed by the smart wallet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletTransaction {
    /// Call target (the multisend helper for batches)
    pub to: Address,
    /// Native value forwarded with the call
    pub value: U256,
    /// Call data
    pub data: Bytes,
    /// Call or delegate call
    pub operation: Operation,
    /// Gas reserved for the inner call
    pub target_tx_gas: U256,
    /// Gas charged on top of the inner call (refund bookkeeping and deployment)
    pub base_gas: U256,
    /// Token gas price paid to the refund receiver
    pub gas_price: U256,
    /// Divisor applied to `gas_price` when paying in tokens
    pub token_gas_price_factor: U256,
    /// Token used for the refund (zero address for native)
    pub gas_token: Address,
    /// Receiver of the refund (zero address for `tx.origin`)
    pub refund_receiver: Address,
    /// Nonce in the batch id space the transaction is sent with
    pub nonce: U256,
}

impl Default for WalletTransaction {
    fn default() -> Self {
        Self {
            to: Address::zero(),
            value: U256::zero(),
            data: Bytes::default(),
            operation: Operation::Call,
            target_tx_gas: U256::zero(),
            base_gas: U256::zero(),
            gas_price: U256::zero(),
            token_gas_price_factor: U256::one(),
            gas_token: Address::zero(),
            refund_receiver: Address::zero(),
            nonce: U256::zero(),
        }
    }
}

impl From<&MetaTransaction> for WalletTransaction {
    fn from(tx: &MetaTransaction) -> Self {
        Self {
            to: tx.to,
            value: tx.value,
            data: tx.data.clone(),
            operation: tx.operation,
            ..Default::default()
        }
    }
}

impl WalletTransaction {
    /// Whether all refund fields are at their neutral defaults
    pub fn is_gasless(&self) -> bool {
        self.base_gas.is_zero() &&
            self.gas_price.is_zero() &&
            self.gas_token.is_zero() &&
            self.refund_receiver.is_zero()
    }

    /// Execution part passed to `execTransaction`
    pub fn exec_transaction(&self) -> ExecTransaction {
        ExecTransaction {
            to: self.to,
            value: self.value,
            data: self.data.clone(),
            operation: self.operation,
            target_tx_gas: self.target_tx_gas,
        }
    }

    /// Refund part passed to `execTransaction`
    pub fn fee_refund(&self) -> FeeRefund {
        FeeRefund {
            base_gas: self.base_gas,
            gas_price: self.gas_price,
            token_gas_price_factor: self.token_gas_price_factor,
            gas_token: self.gas_token,
            refund_receiver: self.refund_receiver,
        }
    }

    /// Operation as a meta-transaction (refund fields dropped)
    pub fn meta_transaction(&self) -> MetaTransaction {
        MetaTransaction {
            to: self.to,
            value: self.value,
            data: self.data.clone(),
            operation: self.operation,
        }
    }

    /// EIP-712 struct hash of the transaction
    pub fn struct_hash(&self) -> H256 {
        let encoded = encode(&[
            Token::FixedBytes(keccak256(ACCOUNT_TX_TYPE).to_vec()),
            Token::Address(self.to),
            Token::Uint(self.value),
            Token::FixedBytes(keccak256(self.data.deref()).to_vec()),
            Token::Uint(U256::from(u8::from(self.operation))),
            Token::Uint(self.target_tx_gas),
            Token::Uint(self.base_gas),
            Token::Uint(self.gas_price),
            Token::Uint(self.token_gas_price_factor),
            Token::Address(self.gas_token),
            Token::Address(self.refund_receiver),
            Token::Uint(self.nonce),
        ]);
        H256::from(keccak256(encoded))
    }

    /// Pre-image of the transaction hash (`0x19 ‖ 0x01 ‖ domainSeparator ‖ structHash`)
    pub fn encode_transaction_data(&self, wallet: &Address, chain_id: u64) -> Bytes {
        [
            vec![0x19, 0x01],
            domain_separator(wallet, chain_id).as_bytes().to_vec(),
            self.struct_hash().as_bytes().to_vec(),
        ]
        .concat()
        .into()
    }

    /// Hash the owner signs, identical to the wallet's `getTransactionHash`
    pub fn hash(&self, wallet: &Address, chain_id: u64) -> H256 {
        H256::from(keccak256(self.encode_transaction_data(wallet, chain_id)))
    }

    // Builder pattern helpers

    /// Sets the target
    pub fn to(mut self, to: Address) -> Self {
        self.to = to;
        self
    }

    /// Sets the value
    pub fn value(mut self, value: U256) -> Self {
        self.value = value;
        self
    }

    /// Sets the call data
    pub fn data(mut self, data: Bytes) -> Self {
        self.data = data;
        self
    }

    /// Sets the operation
    pub fn operation(mut self, operation: Operation) -> Self {
        self.operation = operation;
        self
    }

    /// Sets the target tx gas
    pub fn target_tx_gas(mut self, target_tx_gas: U256) -> Self {
        self.target_tx_gas = target_tx_gas;
        self
    }

    /// Sets the base gas
    pub fn base_gas(mut self, base_gas: U256) -> Self {
        self.base_gas = base_gas;
        self
    }

    /// Sets the nonce
    pub fn nonce(mut self, nonce: U256) -> Self {
        self.nonce = nonce;
        self
    }
}

/// EIP-712 domain separator of the wallet at `wallet` on `chain_id`
pub fn domain_separator(wallet: &Address, chain_id: u64) -> H256 {
    let encoded = encode(&[
        Token::FixedBytes(keccak256(DOMAIN_SEPARATOR_TYPE).to_vec()),
        Token::Uint(U256::from(chain_id)),
        Token::Address(*wallet),
    ]);
    H256::from(keccak256(encoded))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operation_serde_as_number() {
        assert_eq!(serde_json::to_string(&Operation::DelegateCall).unwrap(), "1");
        assert_eq!(serde_json::from_str::<Operation>("0").unwrap(), Operation::Call);
        assert!(serde_json::from_str::<Operation>("2").is_err());
    }

    #[test]
    fn default_envelope_is_gasless() {
        let tx = WalletTransaction::default();
        assert!(tx.is_gasless());
        assert_eq!(tx.token_gas_price_factor, U256::one());

        let tx = tx.base_gas(1.into());
        assert!(!tx.is_gasless());
    }

    #[test]
    fn type_hashes() {
        assert_eq!(
            H256::from(keccak256(DOMAIN_SEPARATOR_TYPE)),
            "0x47e79534a245952e8b16893a336b85a3d9ea9fa8c573f3d803afb92a79469218"
                .parse::<H256>()
                .unwrap()
        );
    }

    #[test]
    fn transaction_hash_binds_wallet_chain_and_nonce() {
        let wallet: Address = "0x9c5754De1443984659E1b3a8d1931D83475ba29C".parse().unwrap();
        let tx = WalletTransaction::default()
            .to("0x5FF137D4b0FDCD49DcA30c7CF57E578a026d2789".parse().unwrap())
            .data("0xa9059cbb".parse().unwrap());

        let hash = tx.hash(&wallet, 5);
        assert_eq!(hash, tx.hash(&wallet, 5));
        assert_ne!(hash, tx.hash(&wallet, 80_001));
        assert_ne!(hash, tx.hash(&Address::zero(), 5));
        assert_ne!(hash, tx.clone().nonce(1.into()).hash(&wallet, 5));

        let pre_image = tx.encode_transaction_data(&wallet, 5);
        assert_eq!(pre_image.len(), 66);
        assert_eq!(&pre_image[..2], &[0x19, 0x01]);
    }
}
