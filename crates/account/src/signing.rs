//! Owner signatures of user operations and wallet transactions

use crate::error::AccountError;
use ethers::{
    signers::Signer,
    types::{Address, Bytes, Signature, H256},
};
use halyard_primitives::{UserOperation, UserOperationHash, WalletTransaction};

/// Added to `v` so the wallet recovers the signer from the `eth_sign` prefixed hash
const ETH_SIGN_V_OFFSET: u64 = 4;

/// Signs request ids and transaction hashes with the owner key
#[derive(Debug, Clone)]
pub struct SigningCoordinator<S: Signer> {
    signer: S,
}

impl<S: Signer> SigningCoordinator<S> {
    pub fn new(signer: S) -> Self {
        Self { signer }
    }

    /// Owner address
    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// Request id the entry point verifies the signature against (signature field ignored)
    pub fn user_operation_request_id(
        &self,
        user_operation: &UserOperation,
        entry_point: &Address,
        chain_id: u64,
    ) -> UserOperationHash {
        user_operation.hash(entry_point, chain_id)
    }

    async fn sign_hash(&self, hash: H256) -> Result<Signature, AccountError> {
        self.signer
            .sign_message(hash.as_bytes())
            .await
            .map_err(|err| AccountError::Signing { inner: err.to_string() })
    }

    /// Signs the request id of the operation
    ///
    /// # Arguments
    /// * `user_operation` - Operation to sign
    /// * `entry_point` - Entry point the operation is sent to
    /// * `chain_id` - Chain the operation is valid on
    ///
    /// # Returns
    /// * `UserOperation` - The operation carrying the owner's signature
    pub async fn sign_user_operation(
        &self,
        user_operation: UserOperation,
        entry_point: &Address,
        chain_id: u64,
    ) -> Result<UserOperation, AccountError> {
        let request_id = self.user_operation_request_id(&user_operation, entry_point, chain_id);
        let signature = self.sign_hash(*request_id).await?;
        Ok(UserOperation { signature: Bytes::from(signature.to_vec()), ..user_operation })
    }

    /// EIP-712 hash of the wallet transaction
    pub fn transaction_hash(
        &self,
        tx: &WalletTransaction,
        wallet: &Address,
        chain_id: u64,
    ) -> H256 {
        tx.hash(wallet, chain_id)
    }

    /// Signs the wallet transaction hash as a personal message, marking the signature as
    /// `eth_sign` for the wallet's signature check
    pub async fn sign_transaction(
        &self,
        tx: &WalletTransaction,
        wallet: &Address,
        chain_id: u64,
    ) -> Result<Bytes, AccountError> {
        let mut signature = self.sign_hash(self.transaction_hash(tx, wallet, chain_id)).await?;
        signature.v += ETH_SIGN_V_OFFSET;
        Ok(Bytes::from(signature.to_vec()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::{signers::LocalWallet, types::U256, utils::hash_message};
    use halyard_primitives::KeyGenerator;

    fn coordinator() -> SigningCoordinator<LocalWallet> {
        SigningCoordinator::new(KeyGenerator::new().next_wallet().unwrap())
    }

    #[tokio::test]
    async fn user_operation_signature_recovers_owner() {
        let coordinator = coordinator();
        let entry_point = Address::repeat_byte(0xee);
        let user_operation = UserOperation {
            sender: Address::repeat_byte(1),
            nonce: U256::from(3),
            ..Default::default()
        };

        let signed = coordinator
            .sign_user_operation(user_operation.clone(), &entry_point, 80_001)
            .await
            .unwrap();
        assert_eq!(signed.signature.len(), 65);

        let request_id = coordinator.user_operation_request_id(&signed, &entry_point, 80_001);
        assert_eq!(request_id, user_operation.hash(&entry_point, 80_001));

        let signature = Signature::try_from(signed.signature.as_ref()).unwrap();
        assert_eq!(signature.recover(request_id.as_bytes()).unwrap(), coordinator.address());
    }

    #[tokio::test]
    async fn transaction_signature_is_eth_sign() {
        let coordinator = coordinator();
        let wallet = Address::repeat_byte(0x77);
        let tx = WalletTransaction::default().to(Address::repeat_byte(1)).nonce(U256::one());

        let signature = coordinator.sign_transaction(&tx, &wallet, 5).await.unwrap();
        assert_eq!(signature.len(), 65);
        assert!(signature[64] == 31 || signature[64] == 32);

        let mut recovered = Signature::try_from(signature.as_ref()).unwrap();
        recovered.v -= ETH_SIGN_V_OFFSET;
        let hash = coordinator.transaction_hash(&tx, &wallet, 5);
        assert_eq!(
            recovered.recover(hash_message(hash.as_bytes())).unwrap(),
            coordinator.address()
        );
    }
}
