//! Per-tick unit bookkeeping.
//!
//! The roster tracks which of our unit ids are alive in which role, stages
//! units created mid-tick so they never run in the tick that created them,
//! and purges dead units from every map and objective when the oracle's
//! alive-set changes.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::broker::TaskBroker;
use crate::oracle::UnitId;
use crate::task::RobotTask;

/// The role a unit plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitRole {
    /// Builds, harvests, replicates.
    Worker,
    /// Fights and responds to alerts.
    Attacker,
    /// A factory or rocket, finished or still in progress.
    Structure,
}

/// One of our units and its decision state.
///
/// The oracle owns the unit's physical state (location, health); the engine
/// owns only what the unit has decided to do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    /// Oracle-assigned id.
    pub id: UnitId,
    /// Role, fixed for the unit's lifetime.
    pub role: UnitRole,
    /// Personal task queue; the front task is the only one ever executed.
    pub queue: std::collections::VecDeque<RobotTask>,
    /// Preemptive task slot. While set, it runs instead of the queue head
    /// and is cleared only when it reports completion.
    pub emergency: Option<RobotTask>,
    /// The enemy this unit is currently focusing fire on (attackers only).
    pub focused_target: Option<UnitId>,
    /// Whether a structure has finished building (structures only).
    pub built: bool,
}

impl Unit {
    /// Create a worker.
    #[must_use]
    pub fn worker(id: UnitId) -> Self {
        Self::new(id, UnitRole::Worker)
    }

    /// Create an attacker.
    #[must_use]
    pub fn attacker(id: UnitId) -> Self {
        Self::new(id, UnitRole::Attacker)
    }

    /// Create a structure, finished or in progress.
    #[must_use]
    pub fn structure(id: UnitId, built: bool) -> Self {
        Self {
            built,
            ..Self::new(id, UnitRole::Structure)
        }
    }

    fn new(id: UnitId, role: UnitRole) -> Self {
        Self {
            id,
            role,
            queue: std::collections::VecDeque::new(),
            emergency: None,
            focused_target: None,
            built: false,
        }
    }

    /// Idle means nothing preempting and nothing queued.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.emergency.is_none() && self.queue.is_empty()
    }

    /// The task currently at the head of the personal queue.
    #[must_use]
    pub fn current_task(&self) -> Option<&RobotTask> {
        self.queue.front()
    }

    /// Append a task to the back of the personal queue.
    pub fn push_task(&mut self, task: RobotTask) {
        self.queue.push_back(task);
    }

    /// Remove and return the head task (when completed or discarded).
    pub fn pop_current(&mut self) -> Option<RobotTask> {
        self.queue.pop_front()
    }
}

/// Role maps plus staging buffers for units created mid-tick.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Roster {
    workers: HashMap<UnitId, Unit>,
    attackers: HashMap<UnitId, Unit>,
    structures: HashMap<UnitId, Unit>,
    staged: HashMap<UnitId, Unit>,
}

impl Roster {
    /// Create an empty roster.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn role_map(&self, role: UnitRole) -> &HashMap<UnitId, Unit> {
        match role {
            UnitRole::Worker => &self.workers,
            UnitRole::Attacker => &self.attackers,
            UnitRole::Structure => &self.structures,
        }
    }

    fn role_map_mut(&mut self, role: UnitRole) -> &mut HashMap<UnitId, Unit> {
        match role {
            UnitRole::Worker => &mut self.workers,
            UnitRole::Attacker => &mut self.attackers,
            UnitRole::Structure => &mut self.structures,
        }
    }

    /// Insert a unit directly into its live role map.
    pub fn insert_live(&mut self, unit: Unit) {
        self.role_map_mut(unit.role).insert(unit.id, unit);
    }

    /// Buffer a unit created during this tick's action phase.
    ///
    /// Staged units are invisible to idle-worker scans and do not run until
    /// [`Roster::admit`] promotes them at tick end.
    pub fn stage(&mut self, unit: Unit) {
        tracing::debug!(unit = unit.id, role = ?unit.role, "staging new unit");
        self.staged.insert(unit.id, unit);
    }

    /// Promote every staged unit into its live role map.
    ///
    /// Must run strictly after all units have executed this tick.
    /// Returns the promoted ids.
    pub fn admit(&mut self) -> Vec<UnitId> {
        let mut admitted: Vec<UnitId> = self.staged.keys().copied().collect();
        admitted.sort_unstable();
        for (_, unit) in self.staged.drain() {
            match unit.role {
                UnitRole::Worker => self.workers.insert(unit.id, unit),
                UnitRole::Attacker => self.attackers.insert(unit.id, unit),
                UnitRole::Structure => self.structures.insert(unit.id, unit),
            };
        }
        admitted
    }

    /// Purge every tracked unit whose id is absent from `alive`.
    ///
    /// A dead unit that was working a shared objective has its membership
    /// revoked so the broker's headcounts stay accurate. Returns the dead
    /// ids. Must run before any unit executes this tick.
    pub fn reconcile(&mut self, alive: &HashSet<UnitId>, broker: &mut TaskBroker) -> Vec<UnitId> {
        let mut dead = Vec::new();
        for role in [UnitRole::Worker, UnitRole::Attacker, UnitRole::Structure] {
            let map = self.role_map_mut(role);
            let gone: Vec<UnitId> = map.keys().copied().filter(|id| !alive.contains(id)).collect();
            for id in gone {
                if let Some(unit) = map.remove(&id) {
                    tracing::debug!(unit = id, role = ?role, "unit died, purging");
                    if let Some(group) = unit.current_task().and_then(|t| t.group) {
                        broker.revoke_member(group, id);
                    }
                    dead.push(id);
                }
            }
        }
        // Staged units can die before ever being admitted (e.g. a blueprint
        // destroyed in the tick it was placed).
        self.staged.retain(|id, _| alive.contains(id));
        dead.sort_unstable();
        dead
    }

    /// Whether a unit id is tracked anywhere, staging included.
    #[must_use]
    pub fn contains(&self, id: UnitId) -> bool {
        self.workers.contains_key(&id)
            || self.attackers.contains_key(&id)
            || self.structures.contains_key(&id)
            || self.staged.contains_key(&id)
    }

    /// Get a live unit by id, any role.
    #[must_use]
    pub fn get(&self, id: UnitId) -> Option<&Unit> {
        self.workers
            .get(&id)
            .or_else(|| self.attackers.get(&id))
            .or_else(|| self.structures.get(&id))
    }

    /// Get a live unit mutably by id, any role.
    pub fn get_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        if self.workers.contains_key(&id) {
            return self.workers.get_mut(&id);
        }
        if self.attackers.contains_key(&id) {
            return self.attackers.get_mut(&id);
        }
        self.structures.get_mut(&id)
    }

    /// Take a live unit out of its role map for its decision step.
    pub fn take(&mut self, role: UnitRole, id: UnitId) -> Option<Unit> {
        self.role_map_mut(role).remove(&id)
    }

    /// Sorted live ids for one role (deterministic iteration order).
    #[must_use]
    pub fn sorted_ids(&self, role: UnitRole) -> Vec<UnitId> {
        let mut ids: Vec<UnitId> = self.role_map(role).keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Sorted ids of workers with no emergency task and an empty queue.
    #[must_use]
    pub fn idle_worker_ids(&self) -> Vec<UnitId> {
        let mut ids: Vec<UnitId> = self
            .workers
            .values()
            .filter(|u| u.is_idle())
            .map(|u| u.id)
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Sorted ids of attackers with no emergency task and an empty queue.
    #[must_use]
    pub fn idle_attacker_ids(&self) -> Vec<UnitId> {
        let mut ids: Vec<UnitId> = self
            .attackers
            .values()
            .filter(|u| u.is_idle())
            .map(|u| u.id)
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Number of live units across all role maps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.workers.len() + self.attackers.len() + self.structures.len()
    }

    /// Whether no live units are tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broker::BrokerPolicy;
    use crate::grid::GridPos;
    use crate::task::{GlobalCommand, TaskCommand};

    fn alive(ids: &[UnitId]) -> HashSet<UnitId> {
        ids.iter().copied().collect()
    }

    #[test]
    fn reconcile_purges_exactly_the_dead() {
        let mut roster = Roster::new();
        roster.insert_live(Unit::worker(1));
        roster.insert_live(Unit::worker(2));
        roster.insert_live(Unit::attacker(3));
        let mut broker = TaskBroker::new(BrokerPolicy::default());

        let dead = roster.reconcile(&alive(&[2, 3]), &mut broker);

        assert_eq!(dead, vec![1]);
        assert!(roster.get(1).is_none());
        assert!(roster.get(2).is_some());
        assert!(roster.get(3).is_some());
    }

    #[test]
    fn reconcile_revokes_objective_membership() {
        let mut roster = Roster::new();
        let mut broker = TaskBroker::new(BrokerPolicy::default());
        let task = broker.enqueue_at(GlobalCommand::ConstructFactory, GridPos::new(4, 4), 2);

        let mut worker = Unit::worker(7);
        worker.push_task(crate::task::RobotTask::grouped(
            task,
            TaskCommand::Move,
            GridPos::new(4, 4),
        ));
        broker.get_mut(task).unwrap().add_member(7);
        roster.insert_live(worker);

        roster.reconcile(&alive(&[]), &mut broker);
        assert!(broker.get(task).unwrap().members.is_empty());
    }

    #[test]
    fn staged_units_do_not_count_until_admitted() {
        let mut roster = Roster::new();
        roster.stage(Unit::worker(9));
        assert!(roster.idle_worker_ids().is_empty());
        assert!(roster.contains(9));

        let admitted = roster.admit();
        assert_eq!(admitted, vec![9]);
        assert_eq!(roster.idle_worker_ids(), vec![9]);
    }

    #[test]
    fn idle_requires_empty_queue_and_no_emergency() {
        let mut unit = Unit::worker(1);
        assert!(unit.is_idle());
        unit.push_task(crate::task::RobotTask::new(
            TaskCommand::Move,
            GridPos::new(1, 1),
        ));
        assert!(!unit.is_idle());
        unit.pop_current();
        unit.emergency = Some(crate::task::RobotTask::new(
            TaskCommand::Stall,
            GridPos::new(1, 1),
        ));
        assert!(!unit.is_idle());
    }
}
