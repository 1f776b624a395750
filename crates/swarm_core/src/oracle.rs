//! The external simulation boundary.
//!
//! The engine never resolves movement legality, combat, visibility, or
//! terrain itself. All of that lives behind [`Oracle`], which the host
//! process implements on top of its physics/combat engine. The contract has
//! two halves:
//!
//! - **Queries** are cheap, side-effect free, and may be called any number of
//!   times per tick.
//! - **Actions** mutate the world and are *always* gated by their paired
//!   `can_*` legality predicate. Invoking an action whose predicate would
//!   return `false` is a programmer error, not a recoverable condition.
//!
//! Path execution is also a host capability: [`Oracle::step_toward`] moves a
//! unit one step along whatever path representation the host maintains and
//! reports progress, so the engine never needs a pathfinder of its own.

use crate::grid::{Direction, GridPos};
use crate::roster::UnitRole;

/// Unique identifier for units, assigned by the oracle.
///
/// Ids are stable and unique while a unit is alive; the oracle may recycle
/// them after death.
pub type UnitId = u32;

/// Outcome of one tick of path execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathProgress {
    /// The unit is at, or diagonally adjacent to, the target cell.
    Arrived,
    /// The unit moved (or waited legally) and can keep going next tick.
    Advanced,
    /// No progress toward the target is possible.
    Blocked,
}

/// The two structure kinds a worker can place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StructureKind {
    /// Unit-producing factory.
    Factory,
    /// Transport rocket.
    Rocket,
}

/// Interface to the host simulation.
///
/// One implementation drives the real game; `swarm_test_utils` ships an
/// in-memory grid implementation for tests and headless runs.
pub trait Oracle {
    // --- queries ---------------------------------------------------------

    /// Ids of every unit on our team that is currently alive.
    fn my_units(&self) -> Vec<UnitId>;

    /// The role the oracle reports for a unit, if it is alive.
    fn unit_role(&self, id: UnitId) -> Option<UnitRole>;

    /// Current cell of any alive unit (ours or the enemy's).
    fn location(&self, id: UnitId) -> Option<GridPos>;

    /// Current health of any alive unit.
    fn health(&self, id: UnitId) -> Option<u32>;

    /// Squared vision radius of one of our units.
    fn vision_radius_sq(&self, id: UnitId) -> u32;

    /// Squared attack radius of one of our combat units.
    fn attack_radius_sq(&self, id: UnitId) -> u32;

    /// Enemy units currently inside a unit's vision radius.
    fn enemies_in_vision(&self, id: UnitId) -> Vec<UnitId>;

    /// Our own combat units within a squared radius of a cell.
    fn friendly_combat_units_within(&self, center: GridPos, radius_sq: u32) -> Vec<UnitId>;

    /// Map width in cells.
    fn map_width(&self) -> u32;

    /// Map height in cells.
    fn map_height(&self) -> u32;

    /// Whether the terrain at a cell is passable. Static per map.
    fn is_passable(&self, pos: GridPos) -> bool;

    /// Whether any unit or structure currently occupies a cell.
    fn is_occupied(&self, pos: GridPos) -> bool;

    /// The structure (finished or in progress) at a cell, if any.
    fn structure_at(&self, pos: GridPos) -> Option<UnitId>;

    /// Whether a structure's build progress has crossed to finished.
    fn structure_is_built(&self, id: UnitId) -> bool;

    /// Harvestable resource remaining at a cell.
    fn deposit_at(&self, pos: GridPos) -> u32;

    // --- path capability --------------------------------------------------

    /// Advance a unit one step along a path toward `target`.
    fn step_toward(&mut self, id: UnitId, target: GridPos) -> PathProgress;

    // --- gated actions -----------------------------------------------------

    /// Whether `id` can attack `target` this tick (range, cooldown).
    fn can_attack(&self, id: UnitId, target: UnitId) -> bool;
    /// Attack a target. Gate with [`Oracle::can_attack`].
    fn attack(&mut self, id: UnitId, target: UnitId);

    /// Whether `id` can harvest the deposit one step in `direction`.
    fn can_harvest(&self, id: UnitId, direction: Direction) -> bool;
    /// Harvest a deposit. Gate with [`Oracle::can_harvest`].
    fn harvest(&mut self, id: UnitId, direction: Direction);

    /// Whether `id` can replicate a new worker one step in `direction`.
    fn can_replicate(&self, id: UnitId, direction: Direction) -> bool;
    /// Replicate a worker, returning the new unit's id.
    /// Gate with [`Oracle::can_replicate`].
    fn replicate(&mut self, id: UnitId, direction: Direction) -> Option<UnitId>;

    /// Whether `id` can place a structure blueprint one step in `direction`.
    fn can_blueprint(&self, id: UnitId, kind: StructureKind, direction: Direction) -> bool;
    /// Place a blueprint, returning the new structure's id.
    /// Gate with [`Oracle::can_blueprint`].
    fn blueprint(&mut self, id: UnitId, kind: StructureKind, direction: Direction)
        -> Option<UnitId>;

    /// Whether `id` can put build work into `structure` this tick.
    fn can_build(&self, id: UnitId, structure: UnitId) -> bool;
    /// Advance a structure's build progress. Gate with [`Oracle::can_build`].
    fn build(&mut self, id: UnitId, structure: UnitId);
}
