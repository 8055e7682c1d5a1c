//! In-memory mempool adapter
//!
//! Implements the Mempool port over a FIFO queue.

use crate::ports::Mempool;
use parking_lot::RwLock;
use shared_types::Transaction;

/// FIFO transaction pool
pub struct InMemoryMempool {
    pending: RwLock<Vec<Transaction>>,
}

impl InMemoryMempool {
    pub fn new() -> Self {
        Self {
            pending: RwLock::new(Vec::new()),
        }
    }

    pub fn add(&self, tx: Transaction) {
        self.pending.write().push(tx);
    }

    pub fn len(&self) -> usize {
        self.pending.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.read().is_empty()
    }
}

impl Default for InMemoryMempool {
    fn default() -> Self {
        Self::new()
    }
}

impl Mempool for InMemoryMempool {
    /// Arrival order; a transaction that does not fit is skipped so smaller
    /// ones behind it can still be included.
    fn transactions_for_block(&self, max_bytes: usize) -> Vec<Transaction> {
        let pending = self.pending.read();
        let mut used = 0usize;
        let mut selected = Vec::new();
        for tx in pending.iter() {
            let size = tx.size();
            if used + size <= max_bytes {
                used += size;
                selected.push(tx.clone());
            }
        }
        selected
    }
}
