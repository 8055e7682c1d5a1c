//! In-memory chain adapter
//!
//! Implements the ChainReader port over a height-indexed block map. Used by
//! tests and by tools that replay a chain without storage.

use crate::ports::ChainReader;
use parking_lot::RwLock;
use shared_types::{Block, Hash};
use std::collections::{BTreeMap, HashMap};

#[derive(Default)]
struct ChainIndex {
    /// Main-chain blocks by height
    blocks: BTreeMap<u64, Block>,
    /// Content hash to height mapping for quick lookups
    hash_index: HashMap<Hash, u64>,
}

/// In-memory chain view
pub struct InMemoryChain {
    inner: RwLock<ChainIndex>,
}

impl InMemoryChain {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(ChainIndex::default()),
        }
    }

    /// Create chain state with genesis block
    pub fn with_genesis(genesis: Block) -> Self {
        let chain = Self::new();
        chain.insert(genesis);
        chain
    }

    /// Place a block at its height, replacing any block already there.
    pub fn insert(&self, block: Block) {
        let mut guard = self.inner.write();
        let inner = &mut *guard;
        let height = block.header.height;
        if let Some(previous) = inner.blocks.get(&height) {
            inner.hash_index.remove(&previous.content_hash());
        }
        inner.hash_index.insert(block.content_hash(), height);
        inner.blocks.insert(height, block);
    }

    /// Get the current tip block
    pub fn tip(&self) -> Option<Block> {
        self.inner.read().blocks.values().next_back().cloned()
    }

    /// Get count of known blocks
    pub fn block_count(&self) -> usize {
        self.inner.read().blocks.len()
    }
}

impl Default for InMemoryChain {
    fn default() -> Self {
        Self::new()
    }
}

impl ChainReader for InMemoryChain {
    fn height(&self) -> u64 {
        self.inner
            .read()
            .blocks
            .keys()
            .next_back()
            .copied()
            .unwrap_or(0)
    }

    fn block_by_height(&self, height: u64) -> Option<Block> {
        self.inner.read().blocks.get(&height).cloned()
    }

    fn block_by_hash(&self, hash: &Hash) -> Option<Block> {
        let inner = self.inner.read();
        let height = inner.hash_index.get(hash)?;
        inner.blocks.get(height).cloned()
    }
}
