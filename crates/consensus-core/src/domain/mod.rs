//! Domain layer for the consensus core
//!
//! Pure rules with no I/O:
//! - target: difficulty → 256-bit target, hash comparison
//! - difficulty: damped adjustment rule and block-time history
//! - checkpoints: height pinning and depth-based finality
//! - validator: validator registry, stake pool, reward and slashing
//! - consensus_type: PoW / PoS / Hybrid schedule
//! - approval: concurrent committee approval with a deadline

mod approval;
mod checkpoints;
mod consensus_type;
mod difficulty;
mod error;
mod stats;
mod target;
mod validator;

pub use approval::*;
pub use checkpoints::*;
pub use consensus_type::*;
pub use difficulty::*;
pub use error::*;
pub use stats::*;
pub use target::*;
pub use validator::*;
