//! Personal directives and shared objectives.
//!
//! A [`RobotTask`] is one unit's own queued directive; a [`GlobalTask`] is a
//! shared objective that needs a minimum headcount of cooperating units
//! before it counts as staffed. Personal tasks that belong to an objective
//! carry its id in their `group` field.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::grid::GridPos;
use crate::oracle::UnitId;

/// Unique identifier for shared objectives, assigned monotonically.
pub type TaskId = u32;

/// The command tag of a personal task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskCommand {
    /// Walk to the target location.
    Move,
    /// Walk to the target location; retargetable to the current rally point.
    Wander,
    /// Walk toward a broadcast enemy sighting.
    Alerted,
    /// Engage visible enemies until none remain (combat units only).
    InCombat,
    /// Park in place; never completes on its own.
    Stall,
    /// Replicate a new worker adjacent to the target location.
    Clone,
    /// Put build work into the structure at the target location.
    Build,
    /// Place a factory blueprint at the target location.
    BlueprintFactory,
    /// Place a rocket blueprint at the target location.
    BlueprintRocket,
}

/// A single unit's directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RobotTask {
    /// The shared objective this task works toward, if any.
    pub group: Option<TaskId>,
    /// What to do.
    pub command: TaskCommand,
    /// Where to do it. `None` for tags that need no location.
    pub target: Option<GridPos>,
}

impl RobotTask {
    /// A free-standing task not owned by any objective.
    #[must_use]
    pub const fn new(command: TaskCommand, target: GridPos) -> Self {
        Self {
            group: None,
            command,
            target: Some(target),
        }
    }

    /// A task belonging to a shared objective.
    #[must_use]
    pub const fn grouped(group: TaskId, command: TaskCommand, target: GridPos) -> Self {
        Self {
            group: Some(group),
            command,
            target: Some(target),
        }
    }
}

/// The kind of a shared objective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GlobalCommand {
    /// Blueprint and build a factory.
    ConstructFactory,
    /// Blueprint and build a rocket.
    ConstructRocket,
    /// Move units onto a transport and park them for loading.
    LoadTransport,
}

/// A shared objective with a member headcount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalTask {
    /// Unique objective id.
    pub id: TaskId,
    /// What kind of objective this is.
    pub command: GlobalCommand,
    /// Target location, assigned once at creation and never changed.
    pub target: GridPos,
    /// Members required before the objective counts as staffed.
    pub min_members: usize,
    /// Hard headcount cap; the objective closes when it is reached.
    /// `None` means it closes at `min_members`.
    pub max_members: Option<usize>,
    /// Current member unit ids.
    pub members: BTreeSet<UnitId>,
    /// Whether any member has placed the blueprint yet.
    pub blueprinted: bool,
    /// Whether the structure's build progress has crossed to finished.
    pub built: bool,
}

impl GlobalTask {
    /// Create a new objective with no members.
    #[must_use]
    pub fn new(id: TaskId, command: GlobalCommand, target: GridPos, min_members: usize) -> Self {
        Self {
            id,
            command,
            target,
            min_members,
            max_members: None,
            members: BTreeSet::new(),
            blueprinted: false,
            built: false,
        }
    }

    /// Builder method to set the hard headcount cap.
    #[must_use]
    pub fn with_max_members(mut self, max_members: usize) -> Self {
        self.max_members = Some(max_members);
        self
    }

    /// Whether the minimum headcount has been reached.
    #[must_use]
    pub fn is_staffed(&self) -> bool {
        self.members.len() >= self.min_members
    }

    /// Whether this objective accepts no further members of any kind.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        match self.max_members {
            Some(max) => self.members.len() >= max,
            None => self.is_staffed(),
        }
    }

    /// Add a member. Membership is a set; re-adding is a no-op.
    pub fn add_member(&mut self, unit: UnitId) {
        self.members.insert(unit);
    }

    /// Remove a member, returning whether it was present.
    pub fn remove_member(&mut self, unit: UnitId) -> bool {
        self.members.remove(&unit)
    }

    /// Whether the phase a personal command works toward is already done.
    ///
    /// Members queue the whole objective program up front, so a member
    /// arriving late must be able to skip phases another member finished.
    #[must_use]
    pub fn phase_complete(&self, command: TaskCommand) -> bool {
        match command {
            TaskCommand::BlueprintFactory | TaskCommand::BlueprintRocket => self.blueprinted,
            TaskCommand::Build => self.built,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn staffed_at_minimum_members() {
        let mut task = GlobalTask::new(1, GlobalCommand::ConstructFactory, GridPos::new(3, 3), 2);
        assert!(!task.is_staffed());
        task.add_member(10);
        task.add_member(10); // duplicate insert is a no-op
        assert!(!task.is_staffed());
        task.add_member(11);
        assert!(task.is_staffed());
        assert!(task.is_closed());
    }

    #[test]
    fn capped_task_stays_open_past_minimum() {
        let mut task = GlobalTask::new(2, GlobalCommand::LoadTransport, GridPos::new(5, 5), 1)
            .with_max_members(3);
        task.add_member(1);
        assert!(task.is_staffed());
        assert!(!task.is_closed());
        task.add_member(2);
        task.add_member(3);
        assert!(task.is_closed());
    }

    #[test]
    fn phase_skipping_tracks_progress_flags() {
        let mut task = GlobalTask::new(3, GlobalCommand::ConstructRocket, GridPos::new(1, 1), 6);
        assert!(!task.phase_complete(TaskCommand::BlueprintRocket));
        task.blueprinted = true;
        assert!(task.phase_complete(TaskCommand::BlueprintRocket));
        assert!(!task.phase_complete(TaskCommand::Build));
        task.built = true;
        assert!(task.phase_complete(TaskCommand::Build));
        assert!(!task.phase_complete(TaskCommand::Move));
    }
}
