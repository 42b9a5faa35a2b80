//! Smart account pipeline: counterfactual addresses, wallet transactions with fee refunds, user
//! operations, signing and relaying

mod account;
mod address;
mod deployment;
mod envelope;
mod error;
mod estimate;
mod relay;
mod signing;
mod traits;
mod user_operation;

pub use account::SmartAccount;
pub use address::{AddressDeriver, CounterfactualWallet, WalletIdentity};
pub use deployment::{DeploymentStateTracker, DeploymentStatus};
pub use envelope::EnvelopeBuilder;
pub use error::{AccountError, EstimationStage};
pub use estimate::{DeploymentCall, FeeEstimation, FeeEstimationEngine, GasEstimate};
pub use relay::{unwrap_relay_error, RelayDispatcher};
pub use signing::SigningCoordinator;
pub use traits::{
    ChainReader, EthersChainReader, FeeData, GasEstimationService, PaymasterApi, RelayPayload,
    RelayTransport, TransportError,
};
pub use user_operation::{AssemblyContext, UserOperationAssembler};
