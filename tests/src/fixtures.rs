//! Shared fixtures for the scenario tests.

use consensus_core::TimeSource;
use shared_types::{Block, BlockHeader, Transaction, TxInput, TxOutput};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Genesis timestamp used by every scenario.
pub const GENESIS_TIME: u64 = 1_700_000_000;

/// Route `tracing` output through the test harness (`RUST_LOG=debug`).
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Clock the test advances by hand.
#[derive(Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new(now: u64) -> Self {
        Self {
            now: Arc::new(AtomicU64::new(now)),
        }
    }

    pub fn set(&self, now: u64) {
        self.now.store(now, Ordering::SeqCst);
    }

    pub fn advance(&self, secs: u64) {
        self.now.fetch_add(secs, Ordering::SeqCst);
    }
}

impl TimeSource for ManualClock {
    fn now(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

pub fn create_genesis(difficulty: u64) -> Block {
    let mut genesis = Block::new(
        BlockHeader {
            version: 1,
            timestamp: GENESIS_TIME,
            difficulty,
            height: 0,
            ..Default::default()
        },
        vec![Transaction::coinbase(50, b"genesis".to_vec(), 0)],
    );
    genesis.refresh_merkle_root();
    genesis
}

/// A non-coinbase transaction spending a made-up outpoint.
pub fn create_spend(seed: u8, fee: u64) -> Transaction {
    Transaction::new(
        1,
        vec![TxInput {
            prev_tx_hash: [seed; 32],
            prev_tx_index: 0,
            script_sig: vec![seed; 4],
            sequence: 0,
        }],
        vec![TxOutput {
            value: 1_000,
            script_pubkey: vec![0x51],
        }],
        0,
        fee,
    )
}

/// Unmined child of `prev` with a coinbase and one spend.
pub fn create_child(prev: &Block, timestamp: u64, difficulty: u64) -> Block {
    let height = prev.header.height + 1;
    let mut block = Block::new(
        BlockHeader {
            version: 1,
            prev_block_hash: prev.content_hash(),
            timestamp,
            difficulty,
            height,
            ..Default::default()
        },
        vec![
            Transaction::coinbase(50, b"miner".to_vec(), height),
            create_spend(height as u8, 1),
        ],
    );
    block.refresh_merkle_root();
    block
}
