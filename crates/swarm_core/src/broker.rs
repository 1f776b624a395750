//! The global task broker.
//!
//! Shared objectives wait in a FIFO pending queue until enough members have
//! been assigned. Assignment is greedy first-fit: each tick, every idle
//! worker joins the earliest objective that still wants workers. Once an
//! objective's headcount closes it leaves the pending queue; its members keep
//! progressing toward it through their personal queues, so leaving the queue
//! is distinct from the objective actually completing.
//!
//! Load-transport objectives are the one special case: after their worker
//! minimum is satisfied they stay pending and accept idle combat units, and
//! they close at a hard maximum headcount instead of the minimum.

use std::collections::{BTreeSet, HashMap, VecDeque};

use serde::{Deserialize, Serialize};

use crate::grid::GridPos;
use crate::oracle::UnitId;
use crate::roster::Roster;
use crate::task::{GlobalCommand, GlobalTask, RobotTask, TaskCommand, TaskId};

/// What to do with an objective whose member set is emptied by unit death.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EmptiedTaskPolicy {
    /// Put the objective back in the pending queue so fresh workers restaff
    /// it. The site reservation is kept.
    #[default]
    Requeue,
    /// Abandon the objective; it is removed at tick end and its site
    /// reservation released.
    Abandon,
}

/// Membership policies for the broker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BrokerPolicy {
    /// Policy for objectives emptied by member death.
    pub emptied: EmptiedTaskPolicy,
    /// Whether a staffed (already popped) objective that falls below its
    /// minimum again goes back in the pending queue. Off by default: the
    /// surviving members finish the job alone.
    pub requeue_understaffed: bool,
}

/// FIFO broker matching idle units to pending shared objectives.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskBroker {
    policy: BrokerPolicy,
    next_id: TaskId,
    pending: VecDeque<TaskId>,
    table: HashMap<TaskId, GlobalTask>,
    finished: BTreeSet<TaskId>,
}

impl TaskBroker {
    /// Create an empty broker with the given policies.
    #[must_use]
    pub fn new(policy: BrokerPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    /// Create a construction objective at an already-chosen target location.
    ///
    /// The caller is responsible for having reserved the location (see
    /// `SitePlanner`); the broker never second-guesses the target.
    pub fn enqueue_at(
        &mut self,
        command: GlobalCommand,
        target: GridPos,
        min_members: usize,
    ) -> TaskId {
        let id = self.fresh_id();
        let task = GlobalTask::new(id, command, target, min_members);
        tracing::info!(task = id, ?command, x = target.x, y = target.y, "objective enqueued");
        self.table.insert(id, task);
        self.pending.push_back(id);
        id
    }

    /// Create a load-transport objective at the transport's location.
    ///
    /// Closes at `max_members` total, with combat units admitted once
    /// `min_workers` workers have joined.
    pub fn enqueue_load(&mut self, target: GridPos, min_workers: usize, max_members: usize) -> TaskId {
        let id = self.fresh_id();
        let task = GlobalTask::new(id, GlobalCommand::LoadTransport, target, min_workers)
            .with_max_members(max_members);
        tracing::info!(task = id, x = target.x, y = target.y, "load objective enqueued");
        self.table.insert(id, task);
        self.pending.push_back(id);
        id
    }

    fn fresh_id(&mut self) -> TaskId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Run one round of first-fit assignment. Called once per tick.
    ///
    /// With no idle units this is a strict no-op: no queue, membership, or
    /// personal-queue state changes.
    pub fn advance(&mut self, roster: &mut Roster) {
        if self.pending.is_empty() {
            return;
        }
        self.prune_closed();

        for worker in roster.idle_worker_ids() {
            let Some(task_id) = self.first_wanting_workers() else {
                break;
            };
            self.assign(task_id, worker, roster);
        }

        for attacker in roster.idle_attacker_ids() {
            let Some(task_id) = self.first_wanting_loaders() else {
                break;
            };
            self.assign(task_id, attacker, roster);
        }

        self.prune_closed();
    }

    /// Earliest pending objective still below its worker minimum.
    fn first_wanting_workers(&self) -> Option<TaskId> {
        self.pending
            .iter()
            .copied()
            .find(|id| self.table.get(id).is_some_and(|t| !t.is_staffed()))
    }

    /// Earliest pending load objective whose workers are satisfied but whose
    /// headcount cap is not yet reached.
    fn first_wanting_loaders(&self) -> Option<TaskId> {
        self.pending.iter().copied().find(|id| {
            self.table.get(id).is_some_and(|t| {
                t.command == GlobalCommand::LoadTransport && t.is_staffed() && !t.is_closed()
            })
        })
    }

    /// Add a member and push the objective's personal program onto its queue.
    fn assign(&mut self, task_id: TaskId, unit: UnitId, roster: &mut Roster) {
        let Some(task) = self.table.get_mut(&task_id) else {
            return;
        };
        let Some(member) = roster.get_mut(unit) else {
            return;
        };
        task.add_member(unit);
        for step in program_for(task) {
            member.push_task(step);
        }
        tracing::debug!(
            task = task_id,
            unit,
            members = task.members.len(),
            needed = task.min_members,
            "assigned unit to objective"
        );
        if task.is_staffed() {
            tracing::info!(task = task_id, "objective staffed");
        }
    }

    /// Drop closed objectives from the pending queue (they keep existing in
    /// the task table until finished).
    fn prune_closed(&mut self) {
        let table = &self.table;
        self.pending
            .retain(|id| table.get(id).is_some_and(|t| !t.is_closed()));
    }

    /// Revoke a dead or withdrawn unit's membership.
    ///
    /// A stale `task` id is tolerated as "objective no longer relevant".
    /// Emptied and understaffed objectives are handled per [`BrokerPolicy`].
    pub fn revoke_member(&mut self, task: TaskId, unit: UnitId) {
        let Some(t) = self.table.get_mut(&task) else {
            return;
        };
        if !t.remove_member(unit) {
            return;
        }
        tracing::debug!(task, unit, members = t.members.len(), "membership revoked");
        if self.finished.contains(&task) {
            return;
        }
        let in_pending = self.pending.contains(&task);
        if t.members.is_empty() {
            match self.policy.emptied {
                EmptiedTaskPolicy::Requeue => {
                    if !in_pending {
                        tracing::info!(task, "objective emptied, requeueing");
                        self.pending.push_back(task);
                    }
                }
                EmptiedTaskPolicy::Abandon => {
                    tracing::info!(task, "objective emptied, abandoning");
                    self.pending.retain(|id| *id != task);
                    self.finished.insert(task);
                }
            }
        } else if self.policy.requeue_understaffed && !t.is_staffed() && !in_pending {
            tracing::info!(task, "objective understaffed, requeueing");
            self.pending.push_back(task);
        }
    }

    /// Record that a member placed the objective's blueprint.
    pub fn note_blueprinted(&mut self, task: TaskId) {
        if let Some(t) = self.table.get_mut(&task) {
            t.blueprinted = true;
        }
    }

    /// Record that the objective's structure finished building.
    ///
    /// A built construction objective is complete; it is marked finished and
    /// swept at tick end.
    pub fn note_built(&mut self, task: TaskId) {
        if let Some(t) = self.table.get_mut(&task) {
            t.built = true;
            tracing::info!(task, "objective construction complete");
            self.finished.insert(task);
        }
    }

    /// Explicitly mark an objective finished (e.g. a transport departed).
    pub fn mark_finished(&mut self, task: TaskId) {
        if self.table.contains_key(&task) {
            self.finished.insert(task);
        }
    }

    /// Sweep finished objectives out of the queue and table.
    ///
    /// Runs at tick end; returns the removed objectives so the caller can
    /// release their site reservations.
    pub fn remove_finished(&mut self) -> Vec<GlobalTask> {
        let ids: Vec<TaskId> = std::mem::take(&mut self.finished).into_iter().collect();
        let mut removed = Vec::with_capacity(ids.len());
        for id in ids {
            self.pending.retain(|p| *p != id);
            if let Some(task) = self.table.remove(&id) {
                tracing::debug!(task = id, "objective removed");
                removed.push(task);
            }
        }
        removed
    }

    /// Look up an objective by id.
    #[must_use]
    pub fn get(&self, task: TaskId) -> Option<&GlobalTask> {
        self.table.get(&task)
    }

    /// Look up an objective mutably by id.
    pub fn get_mut(&mut self, task: TaskId) -> Option<&mut GlobalTask> {
        self.table.get_mut(&task)
    }

    /// Pending objective ids in service order.
    #[must_use]
    pub fn pending_ids(&self) -> Vec<TaskId> {
        self.pending.iter().copied().collect()
    }

    /// Number of objectives still tracked (pending or staffed).
    #[must_use]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Whether no objectives are tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

/// The personal program a new member queues for an objective.
fn program_for(task: &GlobalTask) -> Vec<RobotTask> {
    let steps: &[TaskCommand] = match task.command {
        GlobalCommand::ConstructFactory => &[
            TaskCommand::Move,
            TaskCommand::BlueprintFactory,
            TaskCommand::Build,
        ],
        GlobalCommand::ConstructRocket => &[
            TaskCommand::Move,
            TaskCommand::BlueprintRocket,
            TaskCommand::Build,
        ],
        GlobalCommand::LoadTransport => &[TaskCommand::Move, TaskCommand::Stall],
    };
    steps
        .iter()
        .map(|&command| RobotTask::grouped(task.id, command, task.target))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roster::Unit;

    fn roster_with_workers(ids: &[UnitId]) -> Roster {
        let mut roster = Roster::new();
        for &id in ids {
            roster.insert_live(Unit::worker(id));
        }
        roster
    }

    #[test]
    fn staffs_head_objective_and_pops_it() {
        let mut broker = TaskBroker::new(BrokerPolicy::default());
        let mut roster = roster_with_workers(&[1, 2, 3, 4, 5, 6]);
        let task = broker.enqueue_at(GlobalCommand::ConstructFactory, GridPos::new(10, 10), 4);

        broker.advance(&mut roster);

        let t = broker.get(task).unwrap();
        assert_eq!(t.members.len(), 4);
        assert!(t.is_staffed());
        assert!(broker.pending_ids().is_empty());
        // the two leftover workers stayed idle
        assert_eq!(roster.idle_worker_ids(), vec![5, 6]);
    }

    #[test]
    fn members_receive_the_construction_program() {
        let mut broker = TaskBroker::new(BrokerPolicy::default());
        let mut roster = roster_with_workers(&[1]);
        let task = broker.enqueue_at(GlobalCommand::ConstructRocket, GridPos::new(3, 7), 1);

        broker.advance(&mut roster);

        let worker = roster.get(1).unwrap();
        let commands: Vec<TaskCommand> = worker.queue.iter().map(|t| t.command).collect();
        assert_eq!(
            commands,
            vec![
                TaskCommand::Move,
                TaskCommand::BlueprintRocket,
                TaskCommand::Build
            ]
        );
        assert!(worker.queue.iter().all(|t| t.group == Some(task)));
        assert!(worker.queue.iter().all(|t| t.target == Some(GridPos::new(3, 7))));
    }

    #[test]
    fn services_objectives_in_fifo_order() {
        let mut broker = TaskBroker::new(BrokerPolicy::default());
        let mut roster = roster_with_workers(&[1, 2, 3]);
        let first = broker.enqueue_at(GlobalCommand::ConstructFactory, GridPos::new(1, 1), 2);
        let second = broker.enqueue_at(GlobalCommand::ConstructFactory, GridPos::new(5, 5), 2);

        broker.advance(&mut roster);

        // the earlier objective staffed fully before the later saw anyone
        assert!(broker.get(first).unwrap().is_staffed());
        let late = broker.get(second).unwrap();
        assert_eq!(late.members.len(), 1);
        assert!(!late.is_staffed());
        assert_eq!(broker.pending_ids(), vec![second]);
    }

    #[test]
    fn advance_without_idle_workers_is_a_noop() {
        let mut broker = TaskBroker::new(BrokerPolicy::default());
        let mut roster = roster_with_workers(&[1]);
        broker.enqueue_at(GlobalCommand::ConstructFactory, GridPos::new(1, 1), 3);
        broker.advance(&mut roster);
        let before = broker.clone();

        // every worker is now busy; a second advance must change nothing
        broker.advance(&mut roster);

        assert_eq!(broker.pending_ids(), before.pending_ids());
        assert_eq!(
            broker.get(0).unwrap().members,
            before.get(0).unwrap().members
        );
    }

    #[test]
    fn load_objective_admits_attackers_after_worker_minimum() {
        let mut broker = TaskBroker::new(BrokerPolicy::default());
        let mut roster = roster_with_workers(&[1, 2]);
        roster.insert_live(Unit::attacker(10));
        roster.insert_live(Unit::attacker(11));
        roster.insert_live(Unit::attacker(12));
        let task = broker.enqueue_load(GridPos::new(8, 8), 2, 4);

        broker.advance(&mut roster);

        let t = broker.get(task).unwrap();
        assert_eq!(t.members.len(), 4);
        assert!(t.members.contains(&1) && t.members.contains(&2));
        // closed at the cap: only two of the three attackers joined
        let joined: Vec<UnitId> = [10, 11, 12]
            .into_iter()
            .filter(|id| t.members.contains(id))
            .collect();
        assert_eq!(joined.len(), 2);
        assert!(broker.pending_ids().is_empty());
        // loaders park: Move then Stall
        let loader = roster.get(joined[0]).unwrap();
        let commands: Vec<TaskCommand> = loader.queue.iter().map(|t| t.command).collect();
        assert_eq!(commands, vec![TaskCommand::Move, TaskCommand::Stall]);
    }

    #[test]
    fn attackers_never_join_construction_objectives() {
        let mut broker = TaskBroker::new(BrokerPolicy::default());
        let mut roster = Roster::new();
        roster.insert_live(Unit::attacker(10));
        let task = broker.enqueue_at(GlobalCommand::ConstructFactory, GridPos::new(1, 1), 1);

        broker.advance(&mut roster);

        assert!(broker.get(task).unwrap().members.is_empty());
        assert!(roster.get(10).unwrap().is_idle());
    }

    #[test]
    fn emptied_objective_requeues_by_default() {
        let mut broker = TaskBroker::new(BrokerPolicy::default());
        let mut roster = roster_with_workers(&[1]);
        let task = broker.enqueue_at(GlobalCommand::ConstructFactory, GridPos::new(1, 1), 1);
        broker.advance(&mut roster);
        assert!(broker.pending_ids().is_empty());

        broker.revoke_member(task, 1);

        let t = broker.get(task).unwrap();
        assert!(t.members.is_empty());
        assert_eq!(broker.pending_ids(), vec![task]);
    }

    #[test]
    fn emptied_objective_abandons_under_that_policy() {
        let policy = BrokerPolicy {
            emptied: EmptiedTaskPolicy::Abandon,
            requeue_understaffed: false,
        };
        let mut broker = TaskBroker::new(policy);
        let mut roster = roster_with_workers(&[1]);
        let task = broker.enqueue_at(GlobalCommand::ConstructFactory, GridPos::new(1, 1), 1);
        broker.advance(&mut roster);

        broker.revoke_member(task, 1);
        let removed = broker.remove_finished();

        assert_eq!(removed.len(), 1);
        assert!(broker.get(task).is_none());
        assert!(broker.pending_ids().is_empty());
    }

    #[test]
    fn understaffed_requeue_is_opt_in() {
        let policy = BrokerPolicy {
            emptied: EmptiedTaskPolicy::Requeue,
            requeue_understaffed: true,
        };
        let mut broker = TaskBroker::new(policy);
        let mut roster = roster_with_workers(&[1, 2]);
        let task = broker.enqueue_at(GlobalCommand::ConstructFactory, GridPos::new(1, 1), 2);
        broker.advance(&mut roster);
        assert!(broker.pending_ids().is_empty());

        broker.revoke_member(task, 1);

        assert_eq!(broker.pending_ids(), vec![task]);
        assert!(!broker.get(task).unwrap().is_staffed());
    }

    #[test]
    fn revoking_a_stale_objective_is_tolerated() {
        let mut broker = TaskBroker::new(BrokerPolicy::default());
        broker.revoke_member(99, 1);
        assert!(broker.is_empty());
    }

    #[test]
    fn built_objectives_are_swept_at_tick_end() {
        let mut broker = TaskBroker::new(BrokerPolicy::default());
        let mut roster = roster_with_workers(&[1]);
        let task = broker.enqueue_at(GlobalCommand::ConstructFactory, GridPos::new(4, 4), 1);
        broker.advance(&mut roster);

        broker.note_blueprinted(task);
        assert!(broker.get(task).unwrap().blueprinted);
        broker.note_built(task);

        let removed = broker.remove_finished();
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].id, task);
        assert!(broker.get(task).is_none());
    }
}
