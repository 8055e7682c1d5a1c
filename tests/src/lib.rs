//! # Consensus Test Suite
//!
//! Scenario tests that drive the consensus core end to end through its
//! public API only.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── fixtures.rs       # Chain builders, fixed clocks, tracing setup
//! └── integration/      # Mine → validate → checkpoint → finality flows
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p consensus-tests
//! cargo test -p consensus-tests integration::hybrid_flow::
//! ```

pub mod fixtures;
pub mod integration;
