//! # Hybrid PoW/PoS Consensus
//!
//! Switches validation rules by chain height:
//!
//! ```text
//! height:  0 ........ transition/2 ........ transition ........
//! rule:    PoW        PoS                   Hybrid
//! ```
//!
//! - **PoW**: structural shape, proof of work at the hybrid difficulty and the
//!   expected difficulty for the height.
//! - **PoS**: structural shape, a validator signature and an active,
//!   sufficiently staked validator.
//! - **Hybrid**: structural shape, then `pow_weight·[pow ok] + pos_weight·[signed]`
//!   must reach `hybrid_threshold`.
//!
//! ## Validator Signature Gap
//!
//! A block counts as validator-signed when its nonce is non-zero, and the
//! producing validator is looked up by the first 8 bytes of the content hash.
//! Neither is bound to a key. Both stand in for signature verification over
//! the header against the validator's registered public key.
//!
//! ## Locking
//!
//! Height-derived state and the validator registry sit behind separate locks
//! that are never held at the same time.

use crate::config::HybridConfig;
use crate::domain::{
    gather_approvals, target_for, ApprovalOutcome, ApprovalPath, ConfigError, ConsensusError,
    ConsensusResult, ConsensusType, DifficultyParams, FinalityPolicy, HybridStats, Participant,
    SlashOutcome, StakingRules, Target, Validator, ValidatorRegistry,
};
use crate::ports::{ChainReader, ConsensusApi, SystemTimeSource, TimeSource};
use crate::state::HybridState;
use crate::validation::BlockValidator;
use parking_lot::RwLock;
use rand::Rng;
use shared_types::Block;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Bytes of the content hash that identify the producing validator.
pub const VALIDATOR_KEY_LEN: usize = 8;

/// Hybrid PoW/PoS consensus instance
pub struct HybridConsensus<C: ChainReader> {
    chain: Arc<C>,
    config: HybridConfig,
    params: DifficultyParams,
    finality: FinalityPolicy,
    state: RwLock<HybridState>,
    registry: RwLock<ValidatorRegistry>,
    time_source: Box<dyn TimeSource>,
}

impl<C: ChainReader> HybridConsensus<C> {
    /// Create a hybrid instance in the PoW phase at `min_difficulty`.
    pub fn new(config: HybridConfig, chain: Arc<C>) -> Self {
        let time_source: Box<dyn TimeSource> = Box::new(SystemTimeSource);
        let rules = StakingRules {
            stake_requirement: config.stake_requirement,
            validator_reward: config.validator_reward,
            slashing_penalty: config.slashing_penalty,
        };

        Self {
            chain,
            params: config.difficulty_params(),
            finality: FinalityPolicy::new(config.finality_depth),
            state: RwLock::new(HybridState::new(config.min_difficulty, time_source.now())),
            registry: RwLock::new(ValidatorRegistry::new(rules)),
            config,
            time_source,
        }
    }

    /// Validate the config, then create the instance.
    pub fn try_new(config: HybridConfig, chain: Arc<C>) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::new(config, chain))
    }

    /// Set custom time source (for testing)
    pub fn with_time_source(mut self, time_source: Box<dyn TimeSource>) -> Self {
        self.time_source = time_source;
        self
    }

    pub fn config(&self) -> &HybridConfig {
        &self.config
    }

    // === CONSENSUS TYPE ===

    pub fn get_consensus_type(&self) -> ConsensusType {
        self.state.read().consensus_type
    }

    /// Recompute the consensus type and epoch start for `height`.
    pub fn update_consensus_type(&self, height: u64) -> ConsensusType {
        let next = ConsensusType::for_height(height, self.config.transition_height);
        let mut state = self.state.write();
        let previous = state.consensus_type;

        state.consensus_type = next;
        state.current_height = height;
        if self.config.epoch_length > 0 {
            state.epoch_start = height - height % self.config.epoch_length;
        }

        if previous != next {
            tracing::info!(height, from = %previous, to = %next, "Consensus type changed");
        }
        next
    }

    // === VALIDATION ===

    /// Validate `block` with the rule of the current consensus type.
    ///
    /// The parent is accepted for API symmetry with the base instance; none of
    /// the hybrid rules look at it.
    pub fn validate_block(
        &self,
        block: Option<&Block>,
        _prev_block: Option<&Block>,
    ) -> ConsensusResult<()> {
        let block = block.ok_or(ConsensusError::NilBlock)?;
        let consensus_type = self.get_consensus_type();

        let result = match consensus_type {
            ConsensusType::ProofOfWork => self.validate_pow_block(block),
            ConsensusType::ProofOfStake => self.validate_pos_block(block),
            ConsensusType::Hybrid => self.validate_hybrid_block(block),
        };

        if let Err(err) = &result {
            tracing::warn!(
                height = block.header.height,
                consensus_type = %consensus_type,
                error = %err,
                "Block rejected"
            );
        }
        result
    }

    fn validate_pow_block(&self, block: &Block) -> ConsensusResult<()> {
        BlockValidator::validate_shape(block)?;

        if !self.validate_proof_of_work(block) {
            return Err(ConsensusError::InvalidProofOfWork);
        }

        let expected = self.expected_difficulty(block.header.height)?;
        if block.header.difficulty != expected {
            return Err(ConsensusError::DifficultyMismatch {
                expected,
                actual: block.header.difficulty,
            });
        }
        Ok(())
    }

    fn validate_pos_block(&self, block: &Block) -> ConsensusResult<()> {
        BlockValidator::validate_shape(block)?;
        Self::validate_validator_signature(block)?;
        self.validate_stake_requirements(block)
    }

    fn validate_hybrid_block(&self, block: &Block) -> ConsensusResult<()> {
        BlockValidator::validate_shape(block)?;

        let pow_score = if self.validate_proof_of_work(block) {
            self.config.pow_weight
        } else {
            0.0
        };
        let pos_score = if Self::validate_validator_signature(block).is_ok() {
            self.config.pos_weight
        } else {
            0.0
        };

        tracing::debug!(pow_score, pos_score, "Hybrid score computed");

        if pow_score + pos_score < self.config.hybrid_threshold {
            return Err(ConsensusError::HybridThresholdNotMet {
                pow_score,
                pos_score,
                threshold: self.config.hybrid_threshold,
            });
        }
        Ok(())
    }

    fn validate_validator_signature(block: &Block) -> ConsensusResult<()> {
        if block.header.nonce == 0 {
            return Err(ConsensusError::MissingValidatorSignature);
        }
        Ok(())
    }

    fn validate_stake_requirements(&self, block: &Block) -> ConsensusResult<()> {
        let hash = block.content_hash();
        let key = &hash[..VALIDATOR_KEY_LEN];

        let registry = self.registry.read();
        let validator = registry
            .get(key)
            .ok_or_else(|| ConsensusError::ValidatorNotFound(hex::encode(key)))?;

        if !validator.is_active {
            return Err(ConsensusError::ValidatorInactive(validator.hex_address()));
        }

        let required = registry.rules().stake_requirement;
        if validator.stake < required {
            return Err(ConsensusError::InsufficientStake {
                stake: validator.stake,
                required,
            });
        }
        Ok(())
    }

    /// Proof-of-work check against the hybrid difficulty.
    pub fn validate_proof_of_work(&self, block: &Block) -> bool {
        BlockValidator::validate_pow(block, self.get_difficulty())
    }

    // === DIFFICULTY ===

    pub fn expected_difficulty(&self, height: u64) -> ConsensusResult<u64> {
        BlockValidator::expected_difficulty(&*self.chain, &self.params, height)
    }

    /// Record an observed block time; adjusts like the base instance.
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
                "Hybrid difficulty adjusted"
            );
        }
    }

    pub fn get_difficulty(&self) -> u64 {
        self.state.read().difficulty.difficulty
    }

    pub fn get_target(&self) -> Target {
        target_for(self.get_difficulty())
    }

    pub fn is_block_final(&self, height: u64) -> bool {
        self.finality.is_final(height, self.chain.height())
    }

    // === VALIDATORS ===

    /// Register a validator with at least `stake_requirement` stake.
    pub fn add_validator(
        &self,
        address: Vec<u8>,
        stake: u64,
        public_key: Vec<u8>,
    ) -> ConsensusResult<()> {
        let now = self.time_source.now();
        let hex_address = hex::encode(&address);
        self.registry.write().add(address, stake, public_key, now)?;

        tracing::info!(address = %hex_address, stake, "Validator added");
        Ok(())
    }

    pub fn remove_validator(&self, address: &[u8]) -> ConsensusResult<Validator> {
        let removed = self.registry.write().remove(address)?;
        tracing::info!(address = %removed.hex_address(), stake = removed.stake, "Validator removed");
        Ok(removed)
    }

    pub fn update_stake(&self, address: &[u8], new_stake: u64) -> ConsensusResult<()> {
        let now = self.time_source.now();
        self.registry.write().update_stake(address, new_stake, now)?;
        tracing::debug!(address = %hex::encode(address), new_stake, "Validator stake updated");
        Ok(())
    }

    /// Stake-weighted random pick among active validators.
    pub fn select_validator(&self) -> ConsensusResult<Validator> {
        self.select_validator_with(&mut rand::thread_rng())
    }

    /// [`Self::select_validator`] with a caller-supplied RNG.
    pub fn select_validator_with<R: Rng>(&self, rng: &mut R) -> ConsensusResult<Validator> {
        self.registry.read().select(rng).cloned()
    }

    /// Credit the block reward; returns the validator's reward total.
    pub fn reward_validator(&self, address: &[u8]) -> ConsensusResult<u64> {
        self.registry.write().reward(address)
    }

    pub fn slash_validator(&self, address: &[u8]) -> ConsensusResult<SlashOutcome> {
        let outcome = self.registry.write().slash(address)?;
        tracing::warn!(
            address = %hex::encode(address),
            penalty = outcome.penalty,
            remaining_stake = outcome.remaining_stake,
            deactivated = outcome.deactivated,
            "Validator slashed"
        );
        Ok(outcome)
    }

    /// Active validators in address order.
    pub fn get_validators(&self) -> Vec<Validator> {
        self.registry.read().active().cloned().collect()
    }

    pub fn get_validator(&self, address: &[u8]) -> Option<Validator> {
        self.registry.read().get(address).cloned()
    }

    pub fn get_stake_pool(&self) -> u64 {
        self.registry.read().stake_pool()
    }

    // === APPROVAL ===

    /// Pick the approval path for `block` and collect committee votes.
    pub async fn approve_block(
        &self,
        block: &Block,
        participants: &[Participant],
    ) -> ApprovalOutcome {
        let started = Instant::now();
        let path = ApprovalPath::select(block, participants, &self.config.approval);
        let outcome = gather_approvals(block, participants, path, &self.config.approval).await;
        crate::metrics::record_approval_round(path.label(), outcome.tally.approved);
        crate::metrics::record_approval_latency(started.elapsed().as_secs_f64());
        outcome
    }

    // === INTROSPECTION ===

    pub fn get_consensus_stats(&self) -> HybridStats {
        let mut stats = {
            let state = self.state.read();
            HybridStats {
                consensus_type: state.consensus_type,
                current_height: state.current_height,
                difficulty: state.difficulty.difficulty,
                active_validators: 0,
                total_stake: 0,
                stake_pool: 0,
                epoch_start: state.epoch_start,
                last_adjustment: state.difficulty.last_adjustment,
                block_times_count: state.difficulty.block_times.len(),
            }
        };

        let registry = self.registry.read();
        (stats.active_validators, stats.total_stake) = registry.active_summary();
        stats.stake_pool = registry.stake_pool();
        stats
    }
}

impl<C: ChainReader> ConsensusApi for HybridConsensus<C> {
    fn validate_block(
        &self,
        block: Option<&Block>,
        prev_block: Option<&Block>,
    ) -> ConsensusResult<()> {
        HybridConsensus::validate_block(self, block, prev_block)
    }

    fn validate_proof_of_work(&self, block: &Block) -> bool {
        HybridConsensus::validate_proof_of_work(self, block)
    }

    fn get_difficulty(&self) -> u64 {
        HybridConsensus::get_difficulty(self)
    }

    fn get_target(&self) -> Target {
        HybridConsensus::get_target(self)
    }

    fn is_block_final(&self, height: u64) -> bool {
        HybridConsensus::is_block_final(self, height)
    }
}
