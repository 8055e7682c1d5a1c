//! Driven ports (Outbound dependencies)

use crate::domain::{ConsensusError, ConsensusResult};
use shared_types::{Block, Hash, Transaction, U256};

/// Read-only view of the local chain
///
/// Consensus never writes through this port.
pub trait ChainReader: Send + Sync {
    /// Height of the current tip
    fn height(&self) -> u64;

    /// Block at `height` on the main chain
    fn block_by_height(&self, height: u64) -> Option<Block>;

    /// Block by content hash
    fn block_by_hash(&self, hash: &Hash) -> Option<Block>;

    /// Sum of difficulties over heights `1..=height`.
    ///
    /// Genesis contributes nothing; a gap fails with `BlockNotFound`.
    fn accumulated_difficulty(&self, height: u64) -> ConsensusResult<U256> {
        let mut total = U256::zero();
        for h in 1..=height {
            let block = self
                .block_by_height(h)
                .ok_or(ConsensusError::BlockNotFound { height: h })?;
            total = total.saturating_add(U256::from(block.header.difficulty));
        }
        Ok(total)
    }
}

/// Transaction source for block assembly
pub trait Mempool: Send + Sync {
    /// Transactions whose combined encoded size fits in `max_bytes`.
    fn transactions_for_block(&self, max_bytes: usize) -> Vec<Transaction>;
}

/// Time source for timestamp validation
pub trait TimeSource: Send + Sync {
    /// Get current unix timestamp in seconds
    fn now(&self) -> u64;
}

/// Default time source using system time
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
    }
}
