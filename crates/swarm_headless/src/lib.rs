//! # Swarm Headless
//!
//! Headless scenario runner for the coordination engine:
//! - RON scenario files (or builtin presets) describing a world and a
//!   script of objectives
//! - A tick loop driving the engine against the in-memory grid world
//! - JSON run summaries for CI assertions

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod runner;
pub mod scenario;
