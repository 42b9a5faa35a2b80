//! Multisend wire encoding
//!
//! Each transaction is packed as
//! `operation (1) ‖ to (20) ‖ value (32) ‖ data length (32) ‖ data`
//! and the packed transactions are concatenated in execution order, as decoded by the on-chain
//! `MultiSend` helper.

use crate::transaction::{InvalidOperation, MetaTransaction, Operation};
use ethers::types::{Address, Bytes, U256};

/// Size of the fixed-width header preceding the data of each packed transaction
pub const HEADER_LENGTH: usize = 1 + 20 + 32 + 32;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MultiSendDecodeError {
    #[error("truncated header at offset {offset}")]
    TruncatedHeader { offset: usize },
    #[error("data of length {length} at offset {offset} exceeds the payload")]
    TruncatedData { offset: usize, length: U256 },
    #[error(transparent)]
    Operation(#[from] InvalidOperation),
}

/// Packs a single transaction
pub fn encode_meta_transaction(tx: &MetaTransaction, out: &mut Vec<u8>) {
    let mut word = [0u8; 32];

    out.push(u8::from(tx.operation));
    out.extend_from_slice(tx.to.as_bytes());
    tx.value.to_big_endian(&mut word);
    out.extend_from_slice(&word);
    U256::from(tx.data.len()).to_big_endian(&mut word);
    out.extend_from_slice(&word);
    out.extend_from_slice(&tx.data);
}

/// Packs the transactions in order (argument of `multiSend(bytes)`)
pub fn encode_multi_send(txs: &[MetaTransaction]) -> Bytes {
    let capacity = txs.iter().map(|tx| HEADER_LENGTH + tx.data.len()).sum();
    let mut out = Vec::with_capacity(capacity);
    for tx in txs {
        encode_meta_transaction(tx, &mut out);
    }
    out.into()
}

/// Splits a packed payload back into its transactions
pub fn decode_multi_send(buf: &[u8]) -> Result<Vec<MetaTransaction>, MultiSendDecodeError> {
    let mut txs = Vec::new();
    let mut offset = 0;

    while offset < buf.len() {
        if buf.len() - offset < HEADER_LENGTH {
            return Err(MultiSendDecodeError::TruncatedHeader { offset });
        }
        let header = &buf[offset..offset + HEADER_LENGTH];
        let operation = Operation::try_from(header[0])?;
        let to = Address::from_slice(&header[1..21]);
        let value = U256::from_big_endian(&header[21..53]);
        let length = U256::from_big_endian(&header[53..85]);

        let start = offset + HEADER_LENGTH;
        let remaining = buf.len() - start;
        if length > U256::from(remaining) {
            return Err(MultiSendDecodeError::TruncatedData { offset, length });
        }
        let end = start + length.as_usize();

        txs.push(MetaTransaction { to, value, data: buf[start..end].to_vec().into(), operation });
        offset = end;
    }

    Ok(txs)
}
