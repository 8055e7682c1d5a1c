//! Merkle root over a block's transactions
//!
//! Bottom-up binary tree. An odd level duplicates its last hash before
//! pairing; each parent is `SHA-256(left ‖ right)`.

use crate::{sha256_pair, Hash, Transaction};

/// Merkle root of the transactions' recomputed content hashes.
///
/// Returns `None` for an empty list. A single transaction's root is its own
/// hash. The stored `hash` field is not trusted, so edits to a transaction
/// always move the root.
pub fn merkle_root(transactions: &[Transaction]) -> Option<Hash> {
    let leaves: Vec<Hash> = transactions.iter().map(Transaction::calculate_hash).collect();
    merkle_root_from_hashes(leaves)
}

/// Merkle root over precomputed leaf hashes.
pub fn merkle_root_from_hashes(mut level: Vec<Hash>) -> Option<Hash> {
    if level.is_empty() {
        return None;
    }

    while level.len() > 1 {
        if level.len() % 2 != 0 {
            if let Some(last) = level.last().copied() {
                level.push(last);
            }
        }
        level = level
            .chunks_exact(2)
            .map(|pair| sha256_pair(&pair[0], &pair[1]))
            .collect();
    }

    level.pop()
}
