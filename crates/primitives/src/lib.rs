//! Smart account primitive types
//!
//! This crate contains the wallet transaction, multisend, fee quote and user operation types shared
//! by the smart account SDK, together with their hashing and encoding rules.

pub mod config;
pub mod constants;
pub mod fee;
pub mod gas;
pub mod multisend;
pub mod state;
pub mod transaction;
mod user_operation;
mod utils;
#[cfg(any(test, feature = "test-utils"))]
mod wallet;

pub use config::{
    chain_name, ChainConfig, ContractAddresses, GasOffsets, SmartAccountConfig,
    SmartAccountVersion,
};
pub use fee::{FeeQuote, FeeRefund, HandlePaymentRefund, TokenData};
pub use state::{
    RawTransaction, RelayResponse, RelayTransaction, SignedTransaction, SmartAccountContext,
    SmartAccountState,
};
pub use transaction::{ExecTransaction, MetaTransaction, Operation, WalletTransaction};
pub use user_operation::{
    UserOperation, UserOperationGasEstimation, UserOperationHash, UserOperationRequest,
};
pub use utils::{get_address, pack_init_code, unpack_init_code};
#[cfg(any(test, feature = "test-utils"))]
pub use wallet::KeyGenerator;
