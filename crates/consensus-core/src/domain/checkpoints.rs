//! # Checkpoints and Finality
//!
//! Defense against alternate histories using operator-pinned anchors.
//!
//! ## Threat: Deep Reorganization
//!
//! An attacker with enough hash power (or old keys) builds a competing chain
//! from far back. Without anchors a syncing node may accept it.
//!
//! ## Solution: Height Pinning
//!
//! 1. An operator registers `(height, hash)` pairs from a trusted source
//! 2. A block at a pinned height must carry exactly the pinned hash
//! 3. Heights without a pin are not constrained
//!
//! Pins are compared byte for byte. Their provenance is an operational trust
//! assumption, not something this registry verifies.

use std::collections::HashMap;

/// Height → expected block hash.
///
/// Upserts are last-writer-wins; entries are never removed.
#[derive(Clone, Debug, Default)]
pub struct CheckpointRegistry {
    checkpoints: HashMap<u64, Vec<u8>>,
}

impl CheckpointRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or overwrite the checkpoint at `height`.
    pub fn add(&mut self, height: u64, hash: Vec<u8>) {
        self.checkpoints.insert(height, hash);
    }

    pub fn contains(&self, height: u64) -> bool {
        self.checkpoints.contains_key(&height)
    }

    pub fn get(&self, height: u64) -> Option<&[u8]> {
        self.checkpoints.get(&height).map(Vec::as_slice)
    }

    /// True only when a checkpoint exists at `height` and equals `hash`.
    pub fn validate(&self, height: u64, hash: &[u8]) -> bool {
        match self.checkpoints.get(&height) {
            Some(expected) => expected.as_slice() == hash,
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.checkpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checkpoints.is_empty()
    }
}

/// Depth-based finality rule.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FinalityPolicy {
    depth: u64,
}

impl FinalityPolicy {
    pub fn new(depth: u64) -> Self {
        Self { depth }
    }

    pub fn depth(&self) -> u64 {
        self.depth
    }

    /// `tip >= height + depth`
    pub fn is_final(&self, height: u64, tip: u64) -> bool {
        match height.checked_add(self.depth) {
            Some(required) => tip >= required,
            None => false,
        }
    }
}
