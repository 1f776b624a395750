//! # Swarm Test Utilities
//!
//! Shared testing utilities for all crates:
//! - An in-memory [`grid_oracle::GridOracle`] implementing the host boundary
//! - Fixture scenarios (worker camps, skirmish lines)
//! - Determinism test harness
//! - Property-based testing strategies

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod determinism;
pub mod fixtures;
pub mod grid_oracle;

/// Re-export proptest for convenience.
pub use proptest;
