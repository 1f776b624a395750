//! Error types for the coordination engine.

use thiserror::Error;

use crate::oracle::UnitId;
use crate::task::TaskId;

/// Result type alias using [`EngineError`].
pub type Result<T> = std::result::Result<T, EngineError>;

/// Top-level error type for all coordination-engine errors.
///
/// Nothing here is fatal to the process: a caller that receives an error
/// simply does not get the objective or unit it asked about this tick.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The site selector found no admissible cell for a new structure.
    ///
    /// Objective creation must fail loudly instead of enqueuing a task with
    /// no target location.
    #[error("No admissible structure site found")]
    NoSiteFound,

    /// A unit id is not tracked in any role map.
    #[error("Unit not found: {0}")]
    UnitNotFound(UnitId),

    /// A shared objective id no longer exists.
    ///
    /// Lookups of consumed or revoked objectives are usually tolerated as
    /// no-ops; this variant is for callers that asked explicitly.
    #[error("Objective not found: {0}")]
    TaskNotFound(TaskId),

    /// The engine was asked to do something its state does not allow.
    #[error("Invalid engine state: {0}")]
    InvalidState(String),
}
