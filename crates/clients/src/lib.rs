//! HTTP clients of the services behind a smart account: the SDK backend (gas estimates and fee
//! options), the relayer of wallet transactions and the ERC-4337 bundler

mod bundler;
mod http;
mod node;
mod relayer;

pub use bundler::BundlerClient;
pub use node::NodeClient;
pub use relayer::RestRelayer;
