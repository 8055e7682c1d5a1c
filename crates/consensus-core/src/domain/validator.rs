//! # Validator Registry and Stake Pool
//!
//! Proof-of-stake bookkeeping for the hybrid extension.
//!
//! ## Invariants
//!
//! - The stake pool equals the sum of stakes of every registered validator,
//!   active or not. Every add, remove, stake update and slash moves the pool
//!   by the same delta it applies to the validator.
//! - A validator whose stake drops below the requirement after slashing is
//!   deactivated, not deleted. Only `remove` deletes.
//!
//! ## Selection: Roulette Wheel
//!
//! 1. Draw `r` uniformly in `[0, stake_pool)`
//! 2. Walk active validators in address order, summing stake
//! 3. Pick the first whose cumulative sum exceeds `r`
//! 4. Fall back to the first active validator if the walk ends without a pick
//!    (inactive stake still counts toward the pool)

use super::{ConsensusError, ConsensusResult};
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};
use std::collections::BTreeMap;

/// Validator address bytes.
pub type ValidatorAddress = Vec<u8>;

/// Registered proof-of-stake validator
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validator {
    #[serde_as(as = "Bytes")]
    pub address: ValidatorAddress,
    pub stake: u64,
    #[serde_as(as = "Bytes")]
    pub public_key: Vec<u8>,
    pub is_active: bool,
    pub rewards: u64,
    pub penalties: u64,
    pub votes: u64,
    /// Unix seconds of the last stake change.
    pub last_stake_time: u64,
}

impl Validator {
    pub fn new(address: ValidatorAddress, stake: u64, public_key: Vec<u8>, now: u64) -> Self {
        Self {
            address,
            stake,
            public_key,
            is_active: true,
            rewards: 0,
            penalties: 0,
            votes: 0,
            last_stake_time: now,
        }
    }

    pub fn hex_address(&self) -> String {
        hex::encode(&self.address)
    }
}

/// Stake thresholds and amounts applied by the registry
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StakingRules {
    pub stake_requirement: u64,
    pub validator_reward: u64,
    pub slashing_penalty: u64,
}

/// Result of one slash.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SlashOutcome {
    /// Amount actually removed (capped at the validator's stake)
    pub penalty: u64,
    pub remaining_stake: u64,
    /// True if this slash deactivated the validator
    pub deactivated: bool,
}

/// Validators keyed by address plus the aggregate stake pool
#[derive(Clone, Debug)]
pub struct ValidatorRegistry {
    rules: StakingRules,
    validators: BTreeMap<ValidatorAddress, Validator>,
    stake_pool: u64,
}

impl ValidatorRegistry {
    pub fn new(rules: StakingRules) -> Self {
        Self {
            rules,
            validators: BTreeMap::new(),
            stake_pool: 0,
        }
    }

    pub fn rules(&self) -> &StakingRules {
        &self.rules
    }

    /// Register a validator. Re-registering an address replaces the record.
    pub fn add(
        &mut self,
        address: ValidatorAddress,
        stake: u64,
        public_key: Vec<u8>,
        now: u64,
    ) -> ConsensusResult<()> {
        if stake < self.rules.stake_requirement {
            return Err(ConsensusError::InsufficientStake {
                stake,
                required: self.rules.stake_requirement,
            });
        }

        let validator = Validator::new(address.clone(), stake, public_key, now);
        if let Some(previous) = self.validators.insert(address, validator) {
            self.stake_pool = self.stake_pool.saturating_sub(previous.stake);
        }
        self.stake_pool = self.stake_pool.saturating_add(stake);
        Ok(())
    }

    /// Delete a validator and withdraw its stake from the pool.
    pub fn remove(&mut self, address: &[u8]) -> ConsensusResult<Validator> {
        let validator = self
            .validators
            .remove(address)
            .ok_or_else(|| ConsensusError::ValidatorNotFound(hex::encode(address)))?;
        self.stake_pool = self.stake_pool.saturating_sub(validator.stake);
        Ok(validator)
    }

    /// Replace a validator's stake; the pool moves by the delta.
    pub fn update_stake(&mut self, address: &[u8], new_stake: u64, now: u64) -> ConsensusResult<()> {
        let validator = self.get_mut(address)?;
        let old_stake = validator.stake;
        validator.stake = new_stake;
        validator.last_stake_time = now;

        self.stake_pool = self
            .stake_pool
            .saturating_sub(old_stake)
            .saturating_add(new_stake);
        Ok(())
    }

    /// Stake-weighted random pick among active validators.
    ///
    /// `NoActiveValidators` takes precedence over an empty pool.
    pub fn select<R: Rng>(&self, rng: &mut R) -> ConsensusResult<&Validator> {
        if self.active().next().is_none() {
            return Err(ConsensusError::NoActiveValidators);
        }
        if self.stake_pool == 0 {
            return Err(ConsensusError::NoStake);
        }

        let draw = rng.gen_range(0..self.stake_pool);
        let mut cumulative = 0u64;
        for validator in self.active() {
            cumulative = cumulative.saturating_add(validator.stake);
            if cumulative > draw {
                return Ok(validator);
            }
        }

        self.active().next().ok_or(ConsensusError::NoActiveValidators)
    }

    /// Credit the block reward and count a vote.
    pub fn reward(&mut self, address: &[u8]) -> ConsensusResult<u64> {
        let reward = self.rules.validator_reward;
        let validator = self.get_mut(address)?;
        validator.rewards = validator.rewards.saturating_add(reward);
        validator.votes = validator.votes.saturating_add(1);
        Ok(validator.rewards)
    }

    /// Remove `min(penalty, stake)` from the validator and the pool.
    pub fn slash(&mut self, address: &[u8]) -> ConsensusResult<SlashOutcome> {
        let requirement = self.rules.stake_requirement;
        let configured = self.rules.slashing_penalty;

        let validator = self.get_mut(address)?;
        let penalty = configured.min(validator.stake);
        validator.penalties = validator.penalties.saturating_add(penalty);
        validator.stake -= penalty;

        let was_active = validator.is_active;
        if validator.stake < requirement {
            validator.is_active = false;
        }
        let outcome = SlashOutcome {
            penalty,
            remaining_stake: validator.stake,
            deactivated: was_active && !validator.is_active,
        };

        self.stake_pool = self.stake_pool.saturating_sub(penalty);
        Ok(outcome)
    }

    pub fn get(&self, address: &[u8]) -> Option<&Validator> {
        self.validators.get(address)
    }

    fn get_mut(&mut self, address: &[u8]) -> ConsensusResult<&mut Validator> {
        self.validators
            .get_mut(address)
            .ok_or_else(|| ConsensusError::ValidatorNotFound(hex::encode(address)))
    }

    /// Active validators in address order.
    pub fn active(&self) -> impl Iterator<Item = &Validator> {
        self.validators.values().filter(|v| v.is_active)
    }

    /// Number of active validators and their summed stake.
    pub fn active_summary(&self) -> (usize, u64) {
        self.active().fold((0, 0u64), |(count, stake), v| {
            (count + 1, stake.saturating_add(v.stake))
        })
    }

    pub fn stake_pool(&self) -> u64 {
        self.stake_pool
    }

    pub fn len(&self) -> usize {
        self.validators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }
}
