//! Smart account contract interfaces
//!
//! Bindings and typed handles of the entry point, smart wallet, wallet factory, multisend and gas
//! estimator contracts.

mod error;
mod gen;
pub mod handles;
pub mod registry;

pub use error::{decode_revert, decode_revert_string, EntryPointError};
pub use handles::{
    encode_estimate, encode_transfer, EntryPoint, EntryPointHandle, FactoryHandle, MultiSend,
    MultiSendHandle, SmartWallet, SmartWalletHandle, WalletFactory,
};
pub use registry::{ContractFactory, ContractRegistry, UnknownContracts};
