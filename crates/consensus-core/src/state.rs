use crate::domain::{BlockTimeHistory, CheckpointRegistry, ConsensusType, DifficultyParams};
use crate::ports::ChainReader;
use std::time::Duration;

/// A completed live adjustment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Adjustment {
    pub previous: u64,
    pub next: u64,
    pub actual: Duration,
    pub expected: Duration,
}

/// Live difficulty plus the block-time samples that drive it.
#[derive(Clone, Debug)]
pub struct DifficultyState {
    pub difficulty: u64,
    /// Unix seconds of the last adjustment (construction time until then)
    pub last_adjustment: u64,
    pub block_times: BlockTimeHistory,
}

impl DifficultyState {
    pub fn new(initial_difficulty: u64, now: u64) -> Self {
        Self {
            difficulty: initial_difficulty,
            last_adjustment: now,
            block_times: BlockTimeHistory::new(),
        }
    }

    /// Append a sample; once the history is full, re-derive difficulty from
    /// the tip and the block one interval below it.
    ///
    /// Returns `None` when no adjustment ran (history not full, chain too
    /// short, or a block missing from the reader).
    pub fn record_block_time<C: ChainReader + ?Sized>(
        &mut self,
        block_time: Duration,
        params: &DifficultyParams,
        chain: &C,
        now: u64,
    ) -> Option<Adjustment> {
        if !self.block_times.push(block_time, params.adjustment_interval) {
            return None;
        }

        let tip = chain.height();
        if tip < params.adjustment_interval {
            tracing::debug!(
                tip,
                interval = params.adjustment_interval,
                "Chain shorter than one interval, skipping adjustment"
            );
            return None;
        }

        let current = chain.block_by_height(tip)?;
        let old = chain.block_by_height(tip - params.adjustment_interval)?;
        let actual = Duration::from_secs(
            current
                .header
                .timestamp
                .saturating_sub(old.header.timestamp),
        );

        let previous = self.difficulty;
        self.difficulty = params.adjust(previous, actual);
        self.last_adjustment = now;

        Some(Adjustment {
            previous,
            next: self.difficulty,
            actual,
            expected: params.expected_span(),
        })
    }

    /// What the next adjustment would produce from the current samples.
    pub fn preview(&self, params: &DifficultyParams) -> u64 {
        if self.block_times.is_full(params.adjustment_interval) {
            params.adjust(self.difficulty, self.block_times.total())
        } else {
            self.difficulty
        }
    }
}

/// Mutable state of the base consensus instance, guarded by one lock.
#[derive(Clone, Debug)]
pub struct ConsensusState {
    pub difficulty: DifficultyState,
    pub checkpoints: CheckpointRegistry,
}

impl ConsensusState {
    pub fn new(initial_difficulty: u64, now: u64) -> Self {
        Self {
            difficulty: DifficultyState::new(initial_difficulty, now),
            checkpoints: CheckpointRegistry::new(),
        }
    }
}

/// Mutable state of the hybrid extension, excluding the validator registry.
#[derive(Clone, Debug)]
pub struct HybridState {
    pub consensus_type: ConsensusType,
    pub current_height: u64,
    pub epoch_start: u64,
    pub difficulty: DifficultyState,
}

impl HybridState {
    pub fn new(initial_difficulty: u64, now: u64) -> Self {
        Self {
            consensus_type: ConsensusType::ProofOfWork,
            current_height: 0,
            epoch_start: 0,
            difficulty: DifficultyState::new(initial_difficulty, now),
        }
    }
}
