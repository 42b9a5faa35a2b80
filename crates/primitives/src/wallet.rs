//! Deterministic owner keys for tests

use ethers::signers::LocalWallet;

/// Owner keys derived as `keccak256(big-endian counter)`, the counter starting at one
#[derive(Debug, Default)]
pub struct KeyGenerator {
    counter: u64,
}

impl KeyGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next owner key
    pub fn next_wallet(&mut self) -> Result<LocalWallet, ethers::signers::WalletError> {
        self.counter += 1;
        let bytes = self.counter.to_be_bytes();
        let start = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len() - 1);
        let key = ethers::utils::keccak256(&bytes[start..]);
        LocalWallet::from_bytes(&key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::signers::Signer;

    #[test]
    fn key_generator_is_deterministic() {
        let mut a = KeyGenerator::new();
        let mut b = KeyGenerator::new();
        let first = a.next_wallet().unwrap();
        assert_eq!(first.address(), b.next_wallet().unwrap().address());
        assert_ne!(first.address(), a.next_wallet().unwrap().address());
    }
}
