//! # Swarm Core
//!
//! Deterministic single-team coordination engine for a tick-driven grid
//! world.
//!
//! This crate contains **only** deterministic decision logic:
//! - No rendering
//! - No IO
//! - No system randomness (one seeded stream)
//! - No pathfinding or physics (the host [`oracle::Oracle`] owns those)
//!
//! Given the same seed, config, and oracle answers, every run is
//! tick-for-tick identical, which enables replay debugging and golden-state
//! testing.
//!
//! ## Crate Structure
//!
//! - [`engine`] - The tick orchestrator and public API
//! - [`oracle`] - The host simulation boundary
//! - [`roster`] - Unit bookkeeping: role maps, staging, death purges
//! - [`broker`] - FIFO matching of idle units to shared objectives
//! - [`sites`] - Structure-site selection and reservation
//! - [`controller`] - The role-generic decision loop
//! - [`targeting`] - Focus-fire registry and the rally stack

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod broker;
pub mod config;
pub mod controller;
pub mod engine;
pub mod error;
pub mod grid;
pub mod oracle;
pub mod rng;
pub mod roster;
pub mod sites;
pub mod targeting;
pub mod task;

#[doc(hidden)]
pub mod attacker;
#[doc(hidden)]
pub mod worker;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::broker::{BrokerPolicy, EmptiedTaskPolicy, TaskBroker};
    pub use crate::config::EngineConfig;
    pub use crate::engine::{Engine, TickReport};
    pub use crate::error::{EngineError, Result};
    pub use crate::grid::{Direction, GridPos};
    pub use crate::oracle::{Oracle, PathProgress, StructureKind, UnitId};
    pub use crate::roster::{Roster, Unit, UnitRole};
    pub use crate::sites::SitePlanner;
    pub use crate::targeting::TargetingState;
    pub use crate::task::{GlobalCommand, GlobalTask, RobotTask, TaskCommand, TaskId};
}
