//! Hashing utilities
//!
//! Every digest in the chain is plain SHA-256. Block and transaction hashes
//! are computed over the canonical encodings produced by
//! [`BlockHeader::encode_for_hash`](crate::BlockHeader::encode_for_hash) and
//! [`Transaction::encode`](crate::Transaction::encode).

use crate::Hash;
use sha2::{Digest, Sha256};

/// Compute SHA-256 hash of data
#[inline]
pub fn sha256(data: &[u8]) -> Hash {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    output
}

/// Hash two child nodes into their merkle parent: `SHA-256(left ‖ right)`
#[inline]
pub fn sha256_pair(left: &Hash, right: &Hash) -> Hash {
    let mut hasher = Sha256::new();
    hasher.update(left);
    hasher.update(right);
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    output
}
