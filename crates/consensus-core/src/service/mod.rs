//! Consensus Service - block acceptance and difficulty tracking
//!
//! # Pipeline
//!
//! `validate_block` runs the gates below in order and stops at the first
//! failure:
//!
//! 1. block present
//! 2. header shape (non-zero version and timestamp)
//! 3. proof of work against the current difficulty
//! 4. timestamps against the parent, when there is one
//! 5. difficulty equals `expected_difficulty(height)`
//! 6. merkle root
//! 7. transaction structure
//! 8. checkpoint, when one is pinned at the block's height
//!
//! Validation only reads state. `update_difficulty` and `add_checkpoint` are
//! the only writers.

use crate::config::ConsensusConfig;
use crate::domain::{
    target_for, ConfigError, ConsensusError, ConsensusResult, ConsensusStats, DifficultyParams,
    FinalityPolicy, Target,
};
use crate::ports::{ChainReader, ConsensusApi, SystemTimeSource, TimeSource};
use crate::state::ConsensusState;
use crate::validation::BlockValidator;
use parking_lot::RwLock;
use shared_types::{Block, U256};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Proof-of-work consensus instance
///
/// Owns the live difficulty, the block-time history and the checkpoint
/// registry behind one lock. Share it by reference (or `Arc`) between the
/// miner, the block importer and the RPC layer.
pub struct Consensus<C: ChainReader> {
    chain: Arc<C>,
    state: RwLock<ConsensusState>,
    config: ConsensusConfig,
    params: DifficultyParams,
    finality: FinalityPolicy,
    time_source: Box<dyn TimeSource>,
}

impl<C: ChainReader> Consensus<C> {
    /// Create a consensus instance starting at `min_difficulty`.
    ///
    /// The config is trusted; use [`Consensus::try_new`] for untrusted input.
    pub fn new(config: ConsensusConfig, chain: Arc<C>) -> Self {
        let time_source: Box<dyn TimeSource> = Box::new(SystemTimeSource);
        let state = ConsensusState::new(config.min_difficulty, time_source.now());

        tracing::debug!(
            min_difficulty = config.min_difficulty,
            max_difficulty = config.max_difficulty,
            interval = config.difficulty_adjustment_interval,
            "Consensus initialized"
        );

        Self {
            chain,
            state: RwLock::new(state),
            params: config.difficulty_params(),
            finality: FinalityPolicy::new(config.finality_depth),
            config,
            time_source,
        }
    }

    /// Validate the config, then create the instance.
    pub fn try_new(config: ConsensusConfig, chain: Arc<C>) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::new(config, chain))
    }

    /// Set custom time source (for testing)
    pub fn with_time_source(mut self, time_source: Box<dyn TimeSource>) -> Self {
        self.time_source = time_source;
        self
    }

    pub fn config(&self) -> &ConsensusConfig {
        &self.config
    }

    pub fn chain(&self) -> &Arc<C> {
        &self.chain
    }

    pub(crate) fn now(&self) -> u64 {
        self.time_source.now()
    }

    // === VALIDATION ===

    /// Validate a candidate block against its parent (`None` for genesis or
    /// when the parent is unknown to the caller).
    pub fn validate_block(
        &self,
        block: Option<&Block>,
        prev_block: Option<&Block>,
    ) -> ConsensusResult<()> {
        let started = Instant::now();
        let Some(block) = block else {
            crate::metrics::record_block_rejected(ConsensusError::NilBlock.kind());
            return Err(ConsensusError::NilBlock);
        };

        match self.run_pipeline(block, prev_block) {
            Ok(()) => {
                crate::metrics::record_block_validated();
                crate::metrics::record_validation_latency(started.elapsed().as_secs_f64());
                tracing::debug!(height = block.header.height, "Block passed validation");
                Ok(())
            }
            Err(err) => {
                crate::metrics::record_block_rejected(err.kind());
                tracing::warn!(
                    height = block.header.height,
                    hash = %block.hex_hash(),
                    error = %err,
                    "Block rejected"
                );
                Err(err)
            }
        }
    }

    fn run_pipeline(&self, block: &Block, prev_block: Option<&Block>) -> ConsensusResult<()> {
        let state = self.state.read();
        let height = block.header.height;

        BlockValidator::validate_header(&block.header)?;

        if !BlockValidator::validate_pow(block, state.difficulty.difficulty) {
            return Err(ConsensusError::InvalidProofOfWork);
        }

        if let Some(prev) = prev_block {
            BlockValidator::validate_timestamps(block, prev, self.time_source.now())?;
        }

        let expected = BlockValidator::expected_difficulty(&*self.chain, &self.params, height)?;
        if block.header.difficulty != expected {
            return Err(ConsensusError::DifficultyMismatch {
                expected,
                actual: block.header.difficulty,
            });
        }

        BlockValidator::validate_merkle_root(block)?;
        BlockValidator::validate_transactions(block)?;

        if state.checkpoints.contains(height)
            && !state.checkpoints.validate(height, &block.content_hash())
        {
            return Err(ConsensusError::CheckpointMismatch { height });
        }

        Ok(())
    }

    /// Proof-of-work check against the current difficulty.
    pub fn validate_proof_of_work(&self, block: &Block) -> bool {
        BlockValidator::validate_pow(block, self.get_difficulty())
    }

    /// Difficulty a block at `height` must carry.
    pub fn expected_difficulty(&self, height: u64) -> ConsensusResult<u64> {
        BlockValidator::expected_difficulty(&*self.chain, &self.params, height)
    }

    // === DIFFICULTY ===

    /// Record an observed block inter-arrival time.
    ///
    /// Once `difficulty_adjustment_interval` samples are held, every call
    /// re-derives the live difficulty from the chain tip.
    pub fn update_difficulty(&self, block_time: Duration) {
        let now = self.time_source.now();
        let mut state = self.state.write();

        if let Some(adjustment) =
            state
                .difficulty
                .record_block_time(block_time, &self.params, &*self.chain, now)
        {
            tracing::info!(
                previous = adjustment.previous,
                next = adjustment.next,
                actual_secs = adjustment.actual.as_secs(),
                expected_secs = adjustment.expected.as_secs(),
                "Difficulty adjusted"
            );
        }
    }

    pub fn get_difficulty(&self) -> u64 {
        self.state.read().difficulty.difficulty
    }

    /// What the next live adjustment would produce, without applying it.
    pub fn get_next_difficulty(&self) -> u64 {
        self.state.read().difficulty.preview(&self.params)
    }

    pub fn get_target(&self) -> Target {
        target_for(self.get_difficulty())
    }

    /// Sum of difficulties over heights `1..=height`.
    pub fn accumulated_difficulty(&self, height: u64) -> ConsensusResult<U256> {
        self.chain.accumulated_difficulty(height)
    }

    // === CHECKPOINTS & FINALITY ===

    /// Pin `hash` at `height`, replacing any earlier pin.
    pub fn add_checkpoint(&self, height: u64, hash: Vec<u8>) {
        let mut state = self.state.write();
        let replaced = state.checkpoints.contains(height);
        state.checkpoints.add(height, hash);

        tracing::info!(height, replaced, "Checkpoint registered");
    }

    /// True only when a checkpoint exists at `height` and equals `hash`.
    pub fn validate_checkpoint(&self, height: u64, hash: &[u8]) -> bool {
        self.state.read().checkpoints.validate(height, hash)
    }

    pub fn is_block_final(&self, height: u64) -> bool {
        self.finality.is_final(height, self.chain.height())
    }

    pub fn get_finality_depth(&self) -> u64 {
        self.finality.depth()
    }

    // === INTROSPECTION ===

    pub fn get_stats(&self) -> ConsensusStats {
        let state = self.state.read();
        let difficulty = &state.difficulty;

        ConsensusStats {
            difficulty: difficulty.difficulty,
            next_difficulty: difficulty.preview(&self.params),
            target: hex::encode(target_for(difficulty.difficulty)),
            block_times_count: difficulty.block_times.len(),
            last_adjustment: difficulty.last_adjustment,
            target_block_time: self.params.target_block_time,
            adjustment_interval: self.params.adjustment_interval,
        }
    }
}

impl<C: ChainReader> fmt::Display for Consensus<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.get_stats().fmt(f)
    }
}

impl<C: ChainReader> ConsensusApi for Consensus<C> {
    fn validate_block(
        &self,
        block: Option<&Block>,
        prev_block: Option<&Block>,
    ) -> ConsensusResult<()> {
        Consensus::validate_block(self, block, prev_block)
    }

    fn validate_proof_of_work(&self, block: &Block) -> bool {
        Consensus::validate_proof_of_work(self, block)
    }

    fn get_difficulty(&self) -> u64 {
        Consensus::get_difficulty(self)
    }

    fn get_target(&self) -> Target {
        Consensus::get_target(self)
    }

    fn is_block_final(&self, height: u64) -> bool {
        Consensus::is_block_final(self, height)
    }
}
