//! Introspection snapshots

use super::ConsensusType;
use serde::Serialize;
use serde_with::{serde_as, DurationSeconds};
use std::fmt;
use std::time::Duration;

/// Snapshot of the base consensus instance, taken under one read guard.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ConsensusStats {
    pub difficulty: u64,
    pub next_difficulty: u64,
    /// Hex-encoded 32-byte target.
    pub target: String,
    pub block_times_count: usize,
    /// Unix seconds of the last live adjustment (or construction).
    pub last_adjustment: u64,
    #[serde_as(as = "DurationSeconds<u64>")]
    pub target_block_time: Duration,
    pub adjustment_interval: u64,
}

impl fmt::Display for ConsensusStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Consensus{{difficulty: {}, target: {}, block_times: {}}}",
            self.difficulty, self.target, self.block_times_count
        )
    }
}

/// Snapshot of the hybrid extension.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HybridStats {
    pub consensus_type: ConsensusType,
    pub current_height: u64,
    pub difficulty: u64,
    pub active_validators: usize,
    /// Stake held by active validators only.
    pub total_stake: u64,
    /// Stake of every registered validator.
    pub stake_pool: u64,
    pub epoch_start: u64,
    pub last_adjustment: u64,
    pub block_times_count: usize,
}
