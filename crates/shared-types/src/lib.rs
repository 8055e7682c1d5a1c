//! # Shared Types Crate
//!
//! Chain entities shared by the consensus core, the miner and any storage or
//! networking layer built on top of them.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: `Block`, `BlockHeader` and `Transaction` are
//!   defined once, here.
//! - **Canonical Hashing**: content hashes are SHA-256 over a fixed big-endian
//!   field encoding. The header signature is never part of the block hash.
//! - **Recomputed Transaction Digest**: a transaction carries its own `hash`
//!   for indexing, but merkle roots are always built from the digest
//!   recomputed over its current fields.

pub mod entities;
pub mod hashing;
pub mod merkle;

pub use entities::*;
pub use hashing::{sha256, sha256_pair};
pub use merkle::merkle_root;
