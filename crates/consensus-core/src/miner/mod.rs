//! Proof-of-work mining loop
//!
//! Single-threaded nonce search over the full 64-bit space. The stop signal is
//! polled before every attempt, so cancellation latency is one hash.

mod assembly;

pub use assembly::*;

use crate::domain::{hash_less_than, target_for, MiningError};
use crate::ports::{ChainReader, Mempool};
use crate::service::Consensus;
use shared_types::Block;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cooperative cancellation flag shared between a miner and its controller.
#[derive(Clone, Debug, Default)]
pub struct StopSignal {
    stopped: Arc<AtomicBool>,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask every clone's holder to stop.
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::Relaxed);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Relaxed)
    }
}

impl<C: ChainReader> Consensus<C> {
    /// Search for a nonce whose content hash is below the current target.
    ///
    /// On `MiningStopped` the header keeps the last nonce tried.
    #[tracing::instrument(skip(self, block, stop), fields(height = block.header.height))]
    pub fn mine_block(&self, block: &mut Block, stop: &StopSignal) -> Result<(), MiningError> {
        let difficulty = self.get_difficulty();
        let target = target_for(difficulty);

        tracing::debug!(difficulty, "Starting PoW mining");

        for nonce in 0..u64::MAX {
            if stop.is_stopped() {
                tracing::debug!(nonce = block.header.nonce, "Mining stopped");
                return Err(MiningError::MiningStopped);
            }

            block.header.nonce = nonce;
            if hash_less_than(&block.content_hash(), &target) {
                tracing::info!(nonce, hash = %block.hex_hash(), "PoW mining successful");
                return Ok(());
            }
        }

        tracing::warn!(difficulty, "PoW mining failed: nonce space exhausted");
        Err(MiningError::NonceExhausted { difficulty })
    }

    /// Assemble the block that extends `prev`, stamped with the current time,
    /// and mine it.
    pub fn mine_next(
        &self,
        assembler: &BlockAssembler,
        prev: &Block,
        mempool: &dyn Mempool,
        stop: &StopSignal,
    ) -> Result<Block, MiningError> {
        let mut block = assembler.assemble(self, prev, mempool, self.now())?;
        self.mine_block(&mut block, stop)?;
        Ok(block)
    }
}
