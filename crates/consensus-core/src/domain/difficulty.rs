//! Difficulty adjustment
//!
//! One damped rule shared by every path that moves difficulty:
//!
//! ```text
//! factor = clamp(actual_time / (interval × target_block_time), 1/F, F)
//! next   = clamp(round(base × factor), min_difficulty, max_difficulty)
//! ```
//!
//! The validation path (`expected_difficulty`) uses the difficulty stored in
//! the block `interval` heights back as `base`. The live path
//! (`update_difficulty`) uses the node's current difficulty. Identical
//! clamping and rounding keep the two converging.

use super::ConfigError;
use crate::config::MAX_SUPPORTED_DIFFICULTY;
use std::collections::VecDeque;
use std::time::Duration;

/// Parameters of the adjustment rule
#[derive(Clone, Debug, PartialEq)]
pub struct DifficultyParams {
    pub target_block_time: Duration,
    pub adjustment_interval: u64,
    pub min_difficulty: u64,
    pub max_difficulty: u64,
    pub adjustment_factor: f64,
}

impl DifficultyParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.adjustment_interval == 0 {
            return Err(ConfigError::InvalidConfig(
                "difficulty_adjustment_interval must be non-zero".into(),
            ));
        }
        if self.target_block_time.is_zero() {
            return Err(ConfigError::InvalidConfig(
                "target_block_time must be non-zero".into(),
            ));
        }
        if self.min_difficulty == 0 {
            return Err(ConfigError::InvalidConfig(
                "min_difficulty must be at least 1".into(),
            ));
        }
        if self.min_difficulty > self.max_difficulty {
            return Err(ConfigError::InvalidConfig(format!(
                "min_difficulty {} exceeds max_difficulty {}",
                self.min_difficulty, self.max_difficulty
            )));
        }
        if self.max_difficulty > MAX_SUPPORTED_DIFFICULTY {
            return Err(ConfigError::InvalidConfig(format!(
                "max_difficulty {} exceeds {}",
                self.max_difficulty, MAX_SUPPORTED_DIFFICULTY
            )));
        }
        if !self.adjustment_factor.is_finite() || self.adjustment_factor < 1.0 {
            return Err(ConfigError::InvalidConfig(format!(
                "difficulty_adjustment_factor must be >= 1.0, got {}",
                self.adjustment_factor
            )));
        }
        Ok(())
    }

    /// Clamp to `[min_difficulty, max_difficulty]`.
    pub fn clamp_difficulty(&self, difficulty: u64) -> u64 {
        difficulty.clamp(self.min_difficulty, self.max_difficulty)
    }

    /// Clamp an adjustment factor to `[1/F, F]`.
    pub fn clamp_factor(&self, factor: f64) -> f64 {
        let max = self.adjustment_factor;
        factor.clamp(1.0 / max, max)
    }

    /// Time one full interval should take.
    pub fn expected_span(&self) -> Duration {
        let interval = u32::try_from(self.adjustment_interval).unwrap_or(u32::MAX);
        self.target_block_time.saturating_mul(interval)
    }

    pub fn is_adjustment_height(&self, height: u64) -> bool {
        height % self.adjustment_interval == 0
    }

    /// Apply the damped rule to `base` given the observed span.
    pub fn adjust(&self, base: u64, actual: Duration) -> u64 {
        let expected = self.expected_span().as_secs_f64();
        if expected <= 0.0 {
            return self.clamp_difficulty(base);
        }

        let factor = self.clamp_factor(actual.as_secs_f64() / expected);
        let scaled = (base as f64 * factor).round();
        let bounded = scaled.clamp(self.min_difficulty as f64, self.max_difficulty as f64);
        // Float-to-int casts saturate; bounds were clamped above.
        self.clamp_difficulty(bounded as u64)
    }
}

/// Bounded history of observed block inter-arrival times
///
/// Holds at most `capacity` samples; pushing beyond that evicts the oldest.
#[derive(Clone, Debug, Default)]
pub struct BlockTimeHistory {
    samples: VecDeque<Duration>,
}

impl BlockTimeHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a sample. Returns true when the history holds exactly
    /// `capacity` samples afterwards.
    pub fn push(&mut self, sample: Duration, capacity: u64) -> bool {
        self.samples.push_back(sample);
        while self.samples.len() as u64 > capacity {
            self.samples.pop_front();
        }
        self.samples.len() as u64 == capacity
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn is_full(&self, capacity: u64) -> bool {
        self.samples.len() as u64 == capacity
    }

    /// Sum of all samples.
    pub fn total(&self) -> Duration {
        self.samples
            .iter()
            .fold(Duration::ZERO, |acc, s| acc.saturating_add(*s))
    }
}
