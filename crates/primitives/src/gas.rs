//! Calldata cost model for `preVerificationGas`

use crate::{constants::signature::DUMMY_SIGNATURE, UserOperation};
use ethers::types::{Bytes, U256};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Gas charged by the bundler outside of the user operation's own execution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Overhead {
    /// Transaction base cost shared by the bundle
    pub fixed: U256,
    pub per_user_op: U256,
    pub per_user_op_word: U256,
    pub zero_byte: U256,
    pub non_zero_byte: U256,
    /// Number of user operations assumed to share `fixed`
    pub bundle_size: U256,
}

impl Default for Overhead {
    fn default() -> Self {
        Self {
            fixed: U256::from(21_000),
            per_user_op: U256::from(18_300),
            per_user_op_word: U256::from(4),
            zero_byte: U256::from(4),
            non_zero_byte: U256::from(16),
            bundle_size: U256::one(),
        }
    }
}

impl Overhead {
    /// Calldata cost of the bytes
    pub fn calldata_cost(&self, data: &[u8]) -> U256 {
        let (zeros, non_zeros) = data.iter().fold((0u64, 0u64), |(z, nz), &b| {
            if b == 0 {
                (z + 1, nz)
            } else {
                (z, nz + 1)
            }
        });
        self.zero_byte
            .saturating_mul(zeros.into())
            .saturating_add(self.non_zero_byte.saturating_mul(non_zeros.into()))
    }

    /// `fixed / bundle_size + per_user_op + per_user_op_word * len + calldata cost` of the packed
    /// user operation (integer floor). An unsigned operation is priced with a dummy 65-byte
    /// signature.
    pub fn calculate_pre_verification_gas(&self, user_operation: &UserOperation) -> U256 {
        let packed = if user_operation.signature.is_empty() {
            let signature = Bytes::from_str(DUMMY_SIGNATURE).unwrap_or_default();
            user_operation.clone().signature(signature).pack()
        } else {
            user_operation.pack()
        };

        let bundle_size = if self.bundle_size.is_zero() { U256::one() } else { self.bundle_size };

        (self.fixed / bundle_size)
            .saturating_add(self.per_user_op)
            .saturating_add(self.per_user_op_word.saturating_mul(packed.len().into()))
            .saturating_add(self.calldata_cost(&packed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::signature::SIGNATURE_LENGTH;

    fn user_operation() -> UserOperation {
        UserOperation {
            sender: "0xAB7e2cbFcFb6A5F33A75aD745C3E5fB48d689B54".parse().unwrap(),
            nonce: U256::zero(),
            init_code: Bytes::from_str("0xe19e9755942bb0bd0cccce25b1742596b8a8250b3bf2c3e70000000000000000000000001d9a2cb3638c2fc8bf9c01d088b79e75cd188b17000000000000000000000000789d9058feecf1948af429793e7f1eb4a75db2220000000000000000000000000000000000000000000000000000000000000000").unwrap(),
            call_data: Bytes::from_str("0x80c5c7d0000000000000000000000000ab7e2cbfcfb6a5f33a75ad745c3e5fb48d689b5400000000000000000000000000000000000000000000000002c68af0bb14000000000000000000000000000000000000000000000000000000000000000000600000000000000000000000000000000000000000000000000000000000000000").unwrap(),
            call_gas_limit: U256::from(21_900),
            verification_gas_limit: U256::from(1_218_343),
            pre_verification_gas: U256::from(50_780),
            max_fee_per_gas: U256::from(10_064_120_791_u64),
            max_priority_fee_per_gas: U256::from(1_620_899_097),
            paymaster_and_data: Bytes::default(),
            signature: Bytes::from_str("0x4e69eb5e02d47ba28878655d61c59c20c3e9a2e6905381305626f6a5a2892ec12bd8dd59179f0642731e0e853af54a71ce422a1a234548c9dd1c559bd07df4461c").unwrap(),
        }
    }

    #[test]
    fn pre_verification_gas_calculation() {
        assert_eq!(
            Overhead::default().calculate_pre_verification_gas(&user_operation()),
            U256::from(48_684)
        );
    }

    #[test]
    fn unsigned_operation_priced_like_signed() {
        assert_eq!(Bytes::from_str(DUMMY_SIGNATURE).unwrap().len(), SIGNATURE_LENGTH);

        let overhead = Overhead::default();
        let unsigned = user_operation().signature(Bytes::default());
        let signed = unsigned.clone().signature(Bytes::from_str(DUMMY_SIGNATURE).unwrap());
        assert_eq!(
            overhead.calculate_pre_verification_gas(&unsigned),
            overhead.calculate_pre_verification_gas(&signed)
        );
    }

    #[test]
    fn grows_with_calldata() {
        let overhead = Overhead::default();
        let small = user_operation();
        let large = small.clone().call_data(vec![1u8; 256].into());
        assert!(
            overhead.calculate_pre_verification_gas(&large) >
                overhead.calculate_pre_verification_gas(&small)
        );
        assert!(overhead.calculate_pre_verification_gas(&small) > overhead.fixed);
    }

    #[test]
    fn oversized_overhead_saturates() {
        let overhead = Overhead { per_user_op_word: U256::MAX, ..Default::default() };
        assert_eq!(overhead.calculate_pre_verification_gas(&UserOperation::default()), U256::MAX);

        let overhead =
            Overhead { zero_byte: U256::MAX, non_zero_byte: U256::MAX, ..Default::default() };
        assert_eq!(overhead.calculate_pre_verification_gas(&user_operation()), U256::MAX);
        assert_eq!(overhead.calldata_cost(&[0, 1]), U256::MAX);
    }
}
