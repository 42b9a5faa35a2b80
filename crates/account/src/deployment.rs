use crate::{address::CounterfactualWallet, error::AccountError, traits::ChainReader};
use ethers::types::{Address, Bytes};
use parking_lot::RwLock;
use std::{collections::HashMap, sync::Arc};
use tracing::debug;

/// Deployment state of a wallet as last observed
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum DeploymentStatus {
    #[default]
    Unknown,
    /// Address known, no code yet
    Phantom,
    /// Terminal
    Deployed,
}

/// Tracks which wallets have code on one chain
///
/// `Deployed` is sticky: once observed the chain is never asked again. `Unknown` and `Phantom`
/// wallets are re-checked on every query since the relayer may deploy them at any time.
pub struct DeploymentStateTracker {
    chain: Arc<dyn ChainReader>,
    states: RwLock<HashMap<Address, DeploymentStatus>>,
}

impl DeploymentStateTracker {
    pub fn new(chain: Arc<dyn ChainReader>) -> Self {
        Self { chain, states: RwLock::new(HashMap::new()) }
    }

    /// Last observed status, without a chain query
    pub fn status(&self, wallet: &Address) -> DeploymentStatus {
        self.states.read().get(wallet).copied().unwrap_or_default()
    }

    /// Whether the wallet has code
    ///
    /// # Arguments
    /// * `wallet` - Wallet address
    ///
    /// # Returns
    /// * `bool` - True once code was observed at the address
    pub async fn is_deployed(&self, wallet: Address) -> Result<bool, AccountError> {
        if self.status(&wallet) == DeploymentStatus::Deployed {
            return Ok(true);
        }

        let code = self
            .chain
            .get_code(wallet)
            .await
            .map_err(|err| AccountError::Chain { inner: err.to_string() })?;
        let observed =
            if code.is_empty() { DeploymentStatus::Phantom } else { DeploymentStatus::Deployed };

        let mut states = self.states.write();
        let status = states.entry(wallet).or_default();
        // a concurrent check may have seen the code already
        if *status != DeploymentStatus::Deployed {
            *status = observed;
        }
        debug!("Wallet {wallet:?} deployment status: {:?}", *status);

        Ok(*status == DeploymentStatus::Deployed)
    }

    /// Init code for the next operation of the wallet, empty once it is deployed
    pub async fn init_code(&self, wallet: &CounterfactualWallet) -> Result<Bytes, AccountError> {
        if self.is_deployed(wallet.address).await? {
            Ok(Bytes::default())
        } else {
            Ok(wallet.init_code.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::FeeData;
    use async_trait::async_trait;
    use ethers::types::{transaction::eip2718::TypedTransaction, U256};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CodeReader {
        code: RwLock<Bytes>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ChainReader for CodeReader {
        async fn get_code(&self, _address: Address) -> eyre::Result<Bytes> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.code.read().clone())
        }

        async fn estimate_gas(&self, _tx: &TypedTransaction) -> eyre::Result<U256> {
            Ok(U256::zero())
        }

        async fn fee_data(&self) -> eyre::Result<FeeData> {
            Ok(FeeData::default())
        }

        async fn chain_id(&self) -> eyre::Result<u64> {
            Ok(5)
        }
    }

    #[tokio::test]
    async fn phantom_is_rechecked_until_deployed() {
        let reader = Arc::new(CodeReader::default());
        let tracker = DeploymentStateTracker::new(reader.clone());
        let wallet = Address::repeat_byte(1);

        assert_eq!(tracker.status(&wallet), DeploymentStatus::Unknown);
        assert!(!tracker.is_deployed(wallet).await.unwrap());
        assert!(!tracker.is_deployed(wallet).await.unwrap());
        assert_eq!(tracker.status(&wallet), DeploymentStatus::Phantom);
        assert_eq!(reader.calls.load(Ordering::SeqCst), 2);

        *reader.code.write() = "0x6080".parse().unwrap();
        assert!(tracker.is_deployed(wallet).await.unwrap());
        assert_eq!(tracker.status(&wallet), DeploymentStatus::Deployed);
    }

    #[tokio::test]
    async fn deployed_is_sticky() {
        let reader = Arc::new(CodeReader::default());
        *reader.code.write() = "0x6080".parse().unwrap();
        let tracker = DeploymentStateTracker::new(reader.clone());
        let wallet = Address::repeat_byte(1);

        assert!(tracker.is_deployed(wallet).await.unwrap());
        *reader.code.write() = Bytes::default();
        assert!(tracker.is_deployed(wallet).await.unwrap());
        assert_eq!(reader.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn init_code_empty_iff_deployed() {
        let reader = Arc::new(CodeReader::default());
        let tracker = DeploymentStateTracker::new(reader.clone());
        let wallet = CounterfactualWallet {
            address: Address::repeat_byte(1),
            init_code: "0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb01".parse().unwrap(),
        };

        assert_eq!(tracker.init_code(&wallet).await.unwrap(), wallet.init_code);
        *reader.code.write() = "0x6080".parse().unwrap();
        assert!(tracker.init_code(&wallet).await.unwrap().is_empty());
    }
}
