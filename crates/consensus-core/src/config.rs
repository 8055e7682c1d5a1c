//! Configuration types for the consensus core
//!
//! Every struct deserializes from a partial document (`#[serde(default)]`);
//! durations are plain integers (seconds, or milliseconds for the approval
//! deadline).

use crate::domain::{ConfigError, DifficultyParams};
use serde::Deserialize;
use serde_with::{serde_as, Bytes, DurationMilliSeconds, DurationSeconds};
use std::time::Duration;

/// Highest difficulty the 256-bit target space can express.
pub const MAX_SUPPORTED_DIFFICULTY: u64 = 256;

/// Base consensus configuration
#[serde_as]
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ConsensusConfig {
    /// Desired average time between blocks (default: 10s)
    #[serde_as(as = "DurationSeconds<u64>")]
    pub target_block_time: Duration,

    /// Blocks between difficulty adjustments (default: 2016)
    pub difficulty_adjustment_interval: u64,

    /// Upper difficulty bound (default: 256)
    pub max_difficulty: u64,

    /// Lower difficulty bound (default: 1)
    pub min_difficulty: u64,

    /// Damping factor; one adjustment moves difficulty by at most ×F or ÷F
    /// (default: 4.0)
    pub difficulty_adjustment_factor: f64,

    /// Confirmations after which a height is final (default: 100)
    pub finality_depth: u64,

    /// Advisory checkpoint spacing, not enforced (default: 10000)
    pub checkpoint_interval: u64,
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            target_block_time: Duration::from_secs(10),
            difficulty_adjustment_interval: 2016,
            max_difficulty: 256,
            min_difficulty: 1,
            difficulty_adjustment_factor: 4.0,
            finality_depth: 100,
            checkpoint_interval: 10_000,
        }
    }
}

impl ConsensusConfig {
    /// Parameters for the difficulty engine.
    pub fn difficulty_params(&self) -> DifficultyParams {
        DifficultyParams {
            target_block_time: self.target_block_time,
            adjustment_interval: self.difficulty_adjustment_interval,
            min_difficulty: self.min_difficulty,
            max_difficulty: self.max_difficulty,
            adjustment_factor: self.difficulty_adjustment_factor,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.difficulty_params().validate()
    }
}

/// Hybrid PoW/PoS configuration
#[serde_as]
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct HybridConfig {
    // PoW
    #[serde_as(as = "DurationSeconds<u64>")]
    pub target_block_time: Duration,
    pub difficulty_adjustment_interval: u64,
    pub max_difficulty: u64,
    pub min_difficulty: u64,
    pub difficulty_adjustment_factor: f64,

    // PoS
    /// Minimum stake to register and to stay active (default: 1000)
    pub stake_requirement: u64,
    /// Credited per produced block (default: 50)
    pub validator_reward: u64,
    /// Removed from stake per slash (default: 100)
    pub slashing_penalty: u64,
    /// Staking epoch length in blocks (default: 10080)
    pub epoch_length: u64,

    // Hybrid scoring
    pub pow_weight: f64,
    pub pos_weight: f64,
    pub hybrid_threshold: f64,
    /// PoS from half this height, Hybrid from this height (default: 100000)
    pub transition_height: u64,

    /// Confirmations after which a height is final (default: 100)
    pub finality_depth: u64,

    /// Committee approval fan-out
    pub approval: ApprovalConfig,
}

impl Default for HybridConfig {
    fn default() -> Self {
        Self {
            target_block_time: Duration::from_secs(10),
            difficulty_adjustment_interval: 2016,
            max_difficulty: 256,
            min_difficulty: 1,
            difficulty_adjustment_factor: 4.0,
            stake_requirement: 1000,
            validator_reward: 50,
            slashing_penalty: 100,
            epoch_length: 10_080, // ~1 week at 1 minute blocks
            pow_weight: 0.6,
            pos_weight: 0.4,
            hybrid_threshold: 0.7,
            transition_height: 100_000,
            finality_depth: 100,
            approval: ApprovalConfig::default(),
        }
    }
}

impl HybridConfig {
    pub fn difficulty_params(&self) -> DifficultyParams {
        DifficultyParams {
            target_block_time: self.target_block_time,
            adjustment_interval: self.difficulty_adjustment_interval,
            min_difficulty: self.min_difficulty,
            max_difficulty: self.max_difficulty,
            adjustment_factor: self.difficulty_adjustment_factor,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.difficulty_params().validate()?;

        for (name, value) in [
            ("pow_weight", self.pow_weight),
            ("pos_weight", self.pos_weight),
            ("hybrid_threshold", self.hybrid_threshold),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidConfig(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }

        self.approval.validate()
    }
}

/// Committee approval fan-out configuration
#[serde_as]
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ApprovalConfig {
    /// Approval ratio needed on the fast path (default: 0.67)
    pub fast_threshold: f64,
    /// Approval ratio needed on the slow path (default: 0.75)
    pub slow_threshold: f64,
    /// Blocks with fewer transactions take the fast path (default: 100)
    pub fast_path_tx_limit: usize,
    /// Blocks moving less total value take the fast path (default: 1_000_000)
    pub low_value_limit: u64,
    /// Participants above this trust score count as trusted (default: 0.8)
    pub trusted_score: f64,
    /// Deadline for collecting votes (default: 500ms)
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub timeout: Duration,
}

impl Default for ApprovalConfig {
    fn default() -> Self {
        Self {
            fast_threshold: 0.67,
            slow_threshold: 0.75,
            fast_path_tx_limit: 100,
            low_value_limit: 1_000_000,
            trusted_score: 0.8,
            timeout: Duration::from_millis(500),
        }
    }
}

impl ApprovalConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("fast_threshold", self.fast_threshold),
            ("slow_threshold", self.slow_threshold),
        ] {
            if value.is_nan() || value <= 0.0 || value > 1.0 {
                return Err(ConfigError::InvalidConfig(format!(
                    "{name} must be in (0, 1], got {value}"
                )));
            }
        }
        if self.timeout.is_zero() {
            return Err(ConfigError::InvalidConfig(
                "approval timeout must be non-zero".into(),
            ));
        }
        Ok(())
    }
}

/// Block assembly configuration
#[serde_as]
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct MinerConfig {
    /// Byte budget for the whole transaction list (default: 1_000_000)
    pub max_block_size: usize,
    /// Subsidy paid by the coinbase before fees (default: 1_000_000_000)
    pub coinbase_reward: u64,
    /// Locking script of the coinbase output
    #[serde_as(as = "Bytes")]
    pub coinbase_address: Vec<u8>,
}

impl Default for MinerConfig {
    fn default() -> Self {
        Self {
            max_block_size: 1_000_000,
            coinbase_reward: 1_000_000_000,
            coinbase_address: b"miner".to_vec(),
        }
    }
}

impl MinerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.coinbase_address.is_empty() {
            return Err(ConfigError::InvalidConfig(
                "coinbase_address must not be empty".into(),
            ));
        }
        if self.max_block_size == 0 {
            return Err(ConfigError::InvalidConfig(
                "max_block_size must be non-zero".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_consensus_config_default() {
        let config = ConsensusConfig::default();
        assert_eq!(config.target_block_time, Duration::from_secs(10));
        assert_eq!(config.difficulty_adjustment_interval, 2016);
        assert_eq!(config.max_difficulty, 256);
        assert_eq!(config.min_difficulty, 1);
        assert_eq!(config.difficulty_adjustment_factor, 4.0);
        assert_eq!(config.finality_depth, 100);
        assert_eq!(config.checkpoint_interval, 10_000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_hybrid_config_default() {
        let config = HybridConfig::default();
        assert_eq!(config.stake_requirement, 1000);
        assert_eq!(config.validator_reward, 50);
        assert_eq!(config.slashing_penalty, 100);
        assert_eq!(config.epoch_length, 10_080);
        assert_eq!(config.pow_weight, 0.6);
        assert_eq!(config.pos_weight, 0.4);
        assert_eq!(config.hybrid_threshold, 0.7);
        assert_eq!(config.transition_height, 100_000);
        assert_eq!(config.finality_depth, 100);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_difficulty_bounds_rejected() {
        let config = ConsensusConfig {
            min_difficulty: 10,
            max_difficulty: 5,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = ConsensusConfig {
            max_difficulty: 300,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_min_difficulty_rejected() {
        let config = ConsensusConfig {
            min_difficulty: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = HybridConfig {
            min_difficulty: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_interval_rejected() {
        let config = ConsensusConfig {
            difficulty_adjustment_interval: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_damping_factor_below_one_rejected() {
        let config = ConsensusConfig {
            difficulty_adjustment_factor: 0.5,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_negative_weight_rejected() {
        let config = HybridConfig {
            pos_weight: -0.1,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_approval_threshold_out_of_range_rejected() {
        let mut config = HybridConfig::default();
        config.approval.slow_threshold = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_document_uses_defaults() {
        let config: ConsensusConfig =
            serde_json::from_str(r#"{"target_block_time": 30, "finality_depth": 6}"#).unwrap();
        assert_eq!(config.target_block_time, Duration::from_secs(30));
        assert_eq!(config.finality_depth, 6);
        assert_eq!(config.difficulty_adjustment_interval, 2016);
    }

    #[test]
    fn test_approval_timeout_in_millis() {
        let config: ApprovalConfig = serde_json::from_str(r#"{"timeout": 250}"#).unwrap();
        assert_eq!(config.timeout, Duration::from_millis(250));
        assert_eq!(config.fast_path_tx_limit, 100);
    }

    #[test]
    fn test_miner_config_validation() {
        assert!(MinerConfig::default().validate().is_ok());
        let config = MinerConfig {
            coinbase_address: Vec::new(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
