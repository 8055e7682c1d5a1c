use crate::domain::{meets_difficulty, ConsensusError, ConsensusResult, DifficultyParams};
use crate::ports::ChainReader;
use shared_types::{Block, BlockHeader};
use std::time::Duration;

/// Largest allowed gap between a block timestamp and local time (2 hours).
pub const MAX_FUTURE_DRIFT_SECS: u64 = 2 * 60 * 60;

/// Stateless validation logic for blocks.
pub struct BlockValidator;

impl BlockValidator {
    /// Basic header shape: non-zero version and timestamp.
    pub fn validate_header(header: &BlockHeader) -> ConsensusResult<()> {
        if header.version == 0 {
            return Err(ConsensusError::InvalidHeader {
                reason: "version is zero",
            });
        }
        if header.timestamp == 0 {
            return Err(ConsensusError::InvalidHeader {
                reason: "timestamp is zero",
            });
        }
        Ok(())
    }

    /// Whether the content hash falls under the target for `difficulty`.
    pub fn validate_pow(block: &Block, difficulty: u64) -> bool {
        meets_difficulty(&block.content_hash(), difficulty)
    }

    /// Difficulty a block at `height` must carry, derived from chain history.
    ///
    /// Genesis gets `min_difficulty`. Between adjustment heights the parent's
    /// difficulty carries over. At an adjustment height the difficulty stored
    /// one interval back is rescaled by the observed span.
    pub fn expected_difficulty<C: ChainReader + ?Sized>(
        chain: &C,
        params: &DifficultyParams,
        height: u64,
    ) -> ConsensusResult<u64> {
        if height == 0 {
            return Ok(params.min_difficulty);
        }

        let block_at = |h: u64| {
            chain
                .block_by_height(h)
                .ok_or(ConsensusError::BlockNotFound { height: h })
        };

        let current = block_at(height - 1)?;
        if !params.is_adjustment_height(height) {
            return Ok(current.header.difficulty);
        }

        let old = block_at(height - params.adjustment_interval)?;
        let actual = Duration::from_secs(
            current
                .header
                .timestamp
                .saturating_sub(old.header.timestamp),
        );
        Ok(params.adjust(old.header.difficulty, actual))
    }

    /// Validate timestamp ordering against the parent and local time
    pub fn validate_timestamps(block: &Block, prev: &Block, now: u64) -> ConsensusResult<()> {
        let timestamp = block.header.timestamp;
        if timestamp < prev.header.timestamp {
            return Err(ConsensusError::TimestampRegression {
                block: timestamp,
                parent: prev.header.timestamp,
            });
        }

        let limit = now.saturating_add(MAX_FUTURE_DRIFT_SECS);
        if timestamp > limit {
            return Err(ConsensusError::TimestampTooFarFuture { timestamp, limit });
        }
        Ok(())
    }

    /// Recompute the merkle root and compare it with the header.
    pub fn validate_merkle_root(block: &Block) -> ConsensusResult<()> {
        let computed = block
            .calculate_merkle_root()
            .ok_or(ConsensusError::EmptyBlock)?;

        if computed != block.header.merkle_root {
            return Err(ConsensusError::MerkleMismatch {
                expected: hex::encode(block.header.merkle_root),
                actual: hex::encode(computed),
            });
        }
        Ok(())
    }

    /// Coinbase first, inputs on every other transaction, outputs everywhere.
    pub fn validate_transactions(block: &Block) -> ConsensusResult<()> {
        let first = block.transactions.first().ok_or(ConsensusError::EmptyBlock)?;
        if !first.is_coinbase() {
            return Err(ConsensusError::NotCoinbase);
        }

        for (index, tx) in block.transactions.iter().enumerate() {
            if index > 0 && tx.inputs.is_empty() {
                return Err(ConsensusError::NoInputs { index });
            }
            if tx.outputs.is_empty() {
                return Err(ConsensusError::NoOutputs { index });
            }
        }
        Ok(())
    }

    /// Per-transaction field checks (version, output values and scripts).
    pub fn validate_transaction_fields(block: &Block) -> ConsensusResult<()> {
        for (index, tx) in block.transactions.iter().enumerate() {
            tx.check_fields()
                .map_err(|reason| ConsensusError::InvalidTransaction { index, reason })?;
        }
        Ok(())
    }

    /// Everything checkable from the block alone: header, merkle root,
    /// transaction structure and transaction fields.
    pub fn validate_shape(block: &Block) -> ConsensusResult<()> {
        Self::validate_header(&block.header)?;
        Self::validate_merkle_root(block)?;
        Self::validate_transactions(block)?;
        Self::validate_transaction_fields(block)
    }
}
