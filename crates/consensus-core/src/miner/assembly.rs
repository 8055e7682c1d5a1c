//! Block template assembly
//!
//! Layout of an assembled block:
//!
//! ```text
//! [coinbase: reward + Σ fees → coinbase_address] [mempool txs in mempool order]
//! ```
//!
//! Mempool transactions share the byte budget left after the coinbase.

use crate::config::MinerConfig;
use crate::domain::ConsensusResult;
use crate::ports::{ChainReader, Mempool};
use crate::service::Consensus;
use shared_types::{Block, BlockHeader, Transaction};

/// Header version written into assembled blocks.
pub const BLOCK_VERSION: u32 = 1;

/// Builds the next block on top of a parent.
pub struct BlockAssembler {
    config: MinerConfig,
}

impl BlockAssembler {
    pub fn new(config: MinerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MinerConfig {
        &self.config
    }

    /// Assemble an unmined block extending `prev`.
    ///
    /// The header carries `expected_difficulty(prev.height + 1)`, so the
    /// result validates once mined at that difficulty.
    #[tracing::instrument(
        skip(self, consensus, prev, mempool),
        fields(height = prev.header.height.saturating_add(1))
    )]
    pub fn assemble<C: ChainReader>(
        &self,
        consensus: &Consensus<C>,
        prev: &Block,
        mempool: &dyn Mempool,
        timestamp: u64,
    ) -> ConsensusResult<Block> {
        let height = prev.header.height.saturating_add(1);
        let difficulty = consensus.expected_difficulty(height)?;

        // Output value does not change the encoded size.
        let placeholder = self.coinbase(0, height);
        let budget = self
            .config
            .max_block_size
            .saturating_sub(placeholder.size());
        let selected = mempool.transactions_for_block(budget);

        let fees = selected
            .iter()
            .map(|tx| tx.fee)
            .fold(0u64, u64::saturating_add);
        let coinbase = self.coinbase(self.config.coinbase_reward.saturating_add(fees), height);

        let mut transactions = Vec::with_capacity(selected.len() + 1);
        transactions.push(coinbase);
        transactions.extend(selected);

        let header = BlockHeader {
            version: BLOCK_VERSION,
            prev_block_hash: prev.content_hash(),
            merkle_root: [0u8; 32],
            timestamp,
            difficulty,
            nonce: 0,
            height,
            signature: None,
        };

        let mut block = Block::new(header, transactions);
        block.refresh_merkle_root();

        tracing::debug!(
            difficulty,
            transactions = block.transactions.len(),
            fees,
            "Block template assembled"
        );

        Ok(block)
    }

    fn coinbase(&self, value: u64, height: u64) -> Transaction {
        Transaction::coinbase(value, self.config.coinbase_address.clone(), height)
    }
}
