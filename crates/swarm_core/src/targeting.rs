//! Shared targeting state for combat units.
//!
//! Two structures, both process-wide and lock-free (the engine is
//! single-threaded):
//!
//! - the **focused-target registry**: enemy ids some friendly unit has
//!   claimed as its attack priority. At most one friendly unit newly claims
//!   a given enemy; the rest converge on already-claimed targets. Claims are
//!   best-effort and never globally synchronized; two units may transiently
//!   claim different targets, which is tolerated.
//! - the **rally stack**: successive "main attack" convergence points. Pushed
//!   when an enemy is sighted outside the current rally radius, popped when a
//!   unit's own vision confirms the top location is reached or cleared.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::grid::GridPos;
use crate::oracle::UnitId;

/// The focused-target registry plus the rally stack.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetingState {
    focused: BTreeSet<UnitId>,
    rally: Vec<GridPos>,
}

impl TargetingState {
    /// Create empty targeting state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether an enemy id is already someone's focus target.
    #[must_use]
    pub fn is_claimed(&self, enemy: UnitId) -> bool {
        self.focused.contains(&enemy)
    }

    /// Claim an enemy as a focus target.
    ///
    /// Returns `false` if it was already claimed.
    pub fn claim(&mut self, enemy: UnitId) -> bool {
        let fresh = self.focused.insert(enemy);
        if fresh {
            tracing::debug!(enemy, "claimed new focus target");
        }
        fresh
    }

    /// Drop a claim (e.g. the enemy died).
    pub fn release(&mut self, enemy: UnitId) -> bool {
        self.focused.remove(&enemy)
    }

    /// The claimed enemy ids.
    #[must_use]
    pub fn claimed(&self) -> &BTreeSet<UnitId> {
        &self.focused
    }

    /// The current main-attack convergence point, if any.
    #[must_use]
    pub fn rally_top(&self) -> Option<GridPos> {
        self.rally.last().copied()
    }

    /// Push a new convergence point for a fresh sighting.
    ///
    /// The push is skipped when the sighting is within one vision radius of
    /// the current top, which keeps the stack free of near-duplicate entries.
    /// Returns whether a push happened.
    pub fn push_rally(&mut self, sighting: GridPos, vision_radius_sq: u32) -> bool {
        if let Some(top) = self.rally.last() {
            if top.distance_squared(sighting) <= vision_radius_sq {
                return false;
            }
        }
        tracing::debug!(x = sighting.x, y = sighting.y, "pushed rally point");
        self.rally.push(sighting);
        true
    }

    /// Pop the top convergence point (reached or confirmed clear).
    pub fn pop_rally(&mut self) -> Option<GridPos> {
        let popped = self.rally.pop();
        if let Some(loc) = popped {
            tracing::debug!(x = loc.x, y = loc.y, "popped rally point");
        }
        popped
    }

    /// Number of convergence points on the stack.
    #[must_use]
    pub fn rally_len(&self) -> usize {
        self.rally.len()
    }

    /// The full rally stack, bottom first.
    #[must_use]
    pub fn rally_stack(&self) -> &[GridPos] {
        &self.rally
    }
}
