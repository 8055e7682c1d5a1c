//! Error types for the consensus core

/// Consensus error types
///
/// Every validation gate fails with its own variant carrying the values that
/// caused the rejection.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConsensusError {
    #[error("Block is missing")]
    NilBlock,

    #[error("Invalid header: {reason}")]
    InvalidHeader { reason: &'static str },

    #[error("Invalid proof of work")]
    InvalidProofOfWork,

    #[error("Timestamp regression: block {block} < parent {parent}")]
    TimestampRegression { block: u64, parent: u64 },

    #[error("Timestamp too far in future: {timestamp} > limit {limit}")]
    TimestampTooFarFuture { timestamp: u64, limit: u64 },

    #[error("Difficulty mismatch: expected {expected}, got {actual}")]
    DifficultyMismatch { expected: u64, actual: u64 },

    #[error("Block has no transactions")]
    EmptyBlock,

    #[error("Merkle root mismatch: header {expected}, computed {actual}")]
    MerkleMismatch { expected: String, actual: String },

    #[error("First transaction is not a coinbase")]
    NotCoinbase,

    #[error("Transaction {index} has no inputs")]
    NoInputs { index: usize },

    #[error("Transaction {index} has no outputs")]
    NoOutputs { index: usize },

    #[error("Transaction {index} is invalid: {reason}")]
    InvalidTransaction { index: usize, reason: &'static str },

    #[error("Checkpoint mismatch at height {height}")]
    CheckpointMismatch { height: u64 },

    #[error("Block not found at height {height}")]
    BlockNotFound { height: u64 },

    #[error("Validator not found: {0}")]
    ValidatorNotFound(String),

    #[error("Validator is not active: {0}")]
    ValidatorInactive(String),

    #[error("Validator stake {stake} below requirement {required}")]
    InsufficientStake { stake: u64, required: u64 },

    #[error("Unknown consensus type: {0}")]
    UnknownConsensusType(u8),

    #[error("No stake in pool")]
    NoStake,

    #[error("No active validators")]
    NoActiveValidators,

    #[error("Block has no validator signature (zero nonce)")]
    MissingValidatorSignature,

    #[error(
        "Hybrid threshold not met: PoW={pow_score:.2}, PoS={pos_score:.2}, threshold={threshold:.2}"
    )]
    HybridThresholdNotMet {
        pow_score: f64,
        pos_score: f64,
        threshold: f64,
    },
}

impl ConsensusError {
    /// Consensus-rule violations: the block must be discarded, never retried
    /// as-is.
    pub fn is_rule_violation(&self) -> bool {
        matches!(
            self,
            Self::NilBlock
                | Self::InvalidHeader { .. }
                | Self::InvalidProofOfWork
                | Self::TimestampRegression { .. }
                | Self::TimestampTooFarFuture { .. }
                | Self::DifficultyMismatch { .. }
                | Self::EmptyBlock
                | Self::MerkleMismatch { .. }
                | Self::NotCoinbase
                | Self::NoInputs { .. }
                | Self::NoOutputs { .. }
                | Self::InvalidTransaction { .. }
                | Self::CheckpointMismatch { .. }
                | Self::MissingValidatorSignature
                | Self::HybridThresholdNotMet { .. }
        )
    }

    /// The chain reader was missing history; validation can be retried once
    /// the chain is complete up to the block's height.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::BlockNotFound { .. })
    }

    /// Stable snake_case label, used as the `reason` metric dimension.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NilBlock => "nil_block",
            Self::InvalidHeader { .. } => "invalid_header",
            Self::InvalidProofOfWork => "invalid_proof_of_work",
            Self::TimestampRegression { .. } => "timestamp_regression",
            Self::TimestampTooFarFuture { .. } => "timestamp_too_far_future",
            Self::DifficultyMismatch { .. } => "difficulty_mismatch",
            Self::EmptyBlock => "empty_block",
            Self::MerkleMismatch { .. } => "merkle_mismatch",
            Self::NotCoinbase => "not_coinbase",
            Self::NoInputs { .. } => "no_inputs",
            Self::NoOutputs { .. } => "no_outputs",
            Self::InvalidTransaction { .. } => "invalid_transaction",
            Self::CheckpointMismatch { .. } => "checkpoint_mismatch",
            Self::BlockNotFound { .. } => "block_not_found",
            Self::ValidatorNotFound(_) => "validator_not_found",
            Self::ValidatorInactive(_) => "validator_inactive",
            Self::InsufficientStake { .. } => "insufficient_stake",
            Self::UnknownConsensusType(_) => "unknown_consensus_type",
            Self::NoStake => "no_stake",
            Self::NoActiveValidators => "no_active_validators",
            Self::MissingValidatorSignature => "missing_validator_signature",
            Self::HybridThresholdNotMet { .. } => "hybrid_threshold_not_met",
        }
    }
}

/// Result type for consensus operations
pub type ConsensusResult<T> = Result<T, ConsensusError>;

/// Mining loop errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MiningError {
    /// Stop signal observed; the header keeps the last nonce tried.
    #[error("Mining stopped")]
    MiningStopped,

    /// Every nonce below `u64::MAX` failed at this difficulty.
    #[error("Nonce space exhausted at difficulty {difficulty}")]
    NonceExhausted { difficulty: u64 },

    /// Template could not be assembled.
    #[error("Block assembly failed: {0}")]
    Assembly(#[from] ConsensusError),
}

impl MiningError {
    /// Cooperative cancellation, not a failure of the attempt.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::MiningStopped)
    }
}

/// Rejected configuration
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
