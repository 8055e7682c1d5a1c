//! # consensus-core
//!
//! Proof-of-work consensus with checkpoints, depth-based finality and a
//! hybrid PoW/PoS extension.
//!
//! ## Architecture
//!
//! ```text
//!                 ┌──────────────── ConsensusApi ────────────────┐
//!                 ↓                                              ↓
//!        [Consensus<C>]                                [HybridConsensus<C>]
//!   pipeline · difficulty · checkpoints        PoW / PoS / Hybrid · validators
//!                 │                                              │
//!                 └──────── ChainReader (read-only) ─────────────┘
//! ```
//!
//! Consensus never writes chain state. Everything it needs from the chain
//! comes through [`ports::ChainReader`]; the miner pulls transactions through
//! [`ports::Mempool`].
//!
//! ## Usage
//!
//! ```rust,ignore
//! use consensus_core::{Consensus, ConsensusConfig, StopSignal};
//!
//! let consensus = Consensus::try_new(ConsensusConfig::default(), chain)?;
//!
//! // Mine on one thread, stop it from another
//! let stop = StopSignal::new();
//! consensus.mine_block(&mut block, &stop)?;
//!
//! consensus.validate_block(Some(&block), Some(&parent))?;
//! ```

pub mod adapters;
pub mod config;
pub mod domain;
pub mod hybrid;
pub mod metrics;
pub mod miner;
pub mod ports;
pub mod service;
pub mod state;
pub mod validation;

// Re-export main types
pub use adapters::{InMemoryChain, InMemoryMempool};
pub use config::{ApprovalConfig, ConsensusConfig, HybridConfig, MinerConfig};
pub use domain::{
    target_for, ApprovalOutcome, ApprovalPath, ConfigError, ConsensusError, ConsensusResult,
    ConsensusStats, ConsensusType, HybridStats, MiningError, Participant, SlashOutcome, Target,
    Validator,
};
pub use hybrid::HybridConsensus;
pub use miner::{BlockAssembler, StopSignal};
pub use ports::{ChainReader, ConsensusApi, Mempool, SystemTimeSource, TimeSource};
pub use service::Consensus;
pub use validation::BlockValidator;
