//! Adapters layer (Hexagonal Architecture)

mod in_memory_chain;
mod in_memory_mempool;

pub use in_memory_chain::*;
pub use in_memory_mempool::*;
