//! The role-generic unit decision loop.
//!
//! Every unit runs the same skeleton each tick: an emergency task preempts
//! everything; otherwise the head of the personal queue executes; otherwise
//! the role's idle behavior runs. Roles plug their specifics in through
//! [`RoleOps`].
//!
//! Completion cascades: when a task completes with tick budget to spare, the
//! next queued task executes in the same tick, so a unit that arrives at a
//! site can blueprint immediately instead of losing a tick. The cascade is
//! capped at the queue length observed at entry, which makes a task that
//! completes instantly and re-queues itself unable to spin forever.

use crate::engine::Engine;
use crate::grid::GridPos;
use crate::oracle::{Oracle, PathProgress, UnitId};
use crate::roster::{Unit, UnitRole};
use crate::task::RobotTask;
use crate::{attacker, worker};

/// What a single execution of a task reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    /// The task is done; pop it and consider the next.
    Complete,
    /// The task consumed the tick; run it again next tick.
    InProgress,
}

/// Role-specific hooks for the shared decision loop.
pub trait RoleOps {
    /// Whether completed tasks cascade into the next queued task this tick.
    const CASCADES: bool;

    /// Discard queued phases that other members of the unit's shared
    /// objective already finished. Runs before the head task executes.
    fn skip_completed_phases(_unit: &mut Unit, _engine: &mut Engine) {}

    /// Execute one task for one tick.
    fn execute(
        unit: &mut Unit,
        engine: &mut Engine,
        oracle: &mut dyn Oracle,
        task: RobotTask,
    ) -> TaskStatus;

    /// Called after a queued task completes and pops. Return `false` to stop
    /// cascading this tick even if budget remains.
    fn on_task_complete(
        _unit: &mut Unit,
        _engine: &mut Engine,
        _oracle: &mut dyn Oracle,
        _finished: RobotTask,
    ) -> bool {
        true
    }

    /// What to do with an empty queue and no emergency.
    fn idle(_unit: &mut Unit, _engine: &mut Engine, _oracle: &mut dyn Oracle) {}
}

/// Run one unit's decision step for this tick.
pub fn run_unit(unit: &mut Unit, engine: &mut Engine, oracle: &mut dyn Oracle) {
    match unit.role {
        UnitRole::Worker => worker::run(unit, engine, oracle),
        UnitRole::Attacker => attacker::run(unit, engine, oracle),
        UnitRole::Structure => {
            // Structures make no decisions; they only mirror the oracle's
            // build progress so the roster can answer "is it built yet".
            unit.built = oracle.structure_is_built(unit.id);
        }
    }
}

/// The shared decision skeleton, parameterized by role hooks.
pub fn drive<R: RoleOps>(unit: &mut Unit, engine: &mut Engine, oracle: &mut dyn Oracle) {
    if let Some(task) = unit.emergency {
        if R::execute(unit, engine, oracle, task) == TaskStatus::Complete {
            tracing::debug!(unit = unit.id, "emergency task complete");
            unit.emergency = None;
        }
        return;
    }

    R::skip_completed_phases(unit, engine);

    let mut budget = unit.queue.len();
    while budget > 0 {
        let Some(task) = unit.current_task().copied() else {
            break;
        };
        match R::execute(unit, engine, oracle, task) {
            TaskStatus::InProgress => return,
            TaskStatus::Complete => {
                unit.pop_current();
                if !R::CASCADES || !R::on_task_complete(unit, engine, oracle, task) {
                    return;
                }
            }
        }
        budget -= 1;
    }

    if unit.is_idle() {
        R::idle(unit, engine, oracle);
    }
}

/// Advance one step toward a target.
///
/// Arrival and a dead-end both complete the task: a permanently blocked
/// traveler that never completed would wedge its whole queue, and the
/// follow-up task's own legality checks handle "arrived but not really".
pub(crate) fn travel(oracle: &mut dyn Oracle, id: UnitId, target: GridPos) -> TaskStatus {
    match oracle.step_toward(id, target) {
        PathProgress::Arrived | PathProgress::Blocked => TaskStatus::Complete,
        PathProgress::Advanced => TaskStatus::InProgress,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::grid::{Direction, GridPos};
    use crate::oracle::StructureKind;
    use crate::task::TaskCommand;

    /// Minimal oracle: empty 8x8 map, every step arrives instantly.
    struct InstantOracle;

    impl Oracle for InstantOracle {
        fn my_units(&self) -> Vec<UnitId> {
            Vec::new()
        }
        fn unit_role(&self, _id: UnitId) -> Option<UnitRole> {
            None
        }
        fn location(&self, _id: UnitId) -> Option<GridPos> {
            Some(GridPos::new(0, 0))
        }
        fn health(&self, _id: UnitId) -> Option<u32> {
            Some(1)
        }
        fn vision_radius_sq(&self, _id: UnitId) -> u32 {
            50
        }
        fn attack_radius_sq(&self, _id: UnitId) -> u32 {
            10
        }
        fn enemies_in_vision(&self, _id: UnitId) -> Vec<UnitId> {
            Vec::new()
        }
        fn friendly_combat_units_within(&self, _center: GridPos, _radius_sq: u32) -> Vec<UnitId> {
            Vec::new()
        }
        fn map_width(&self) -> u32 {
            8
        }
        fn map_height(&self) -> u32 {
            8
        }
        fn is_passable(&self, _pos: GridPos) -> bool {
            true
        }
        fn is_occupied(&self, _pos: GridPos) -> bool {
            false
        }
        fn structure_at(&self, _pos: GridPos) -> Option<UnitId> {
            None
        }
        fn structure_is_built(&self, _id: UnitId) -> bool {
            false
        }
        fn deposit_at(&self, _pos: GridPos) -> u32 {
            0
        }
        fn step_toward(&mut self, _id: UnitId, _target: GridPos) -> PathProgress {
            PathProgress::Arrived
        }
        fn can_attack(&self, _id: UnitId, _target: UnitId) -> bool {
            false
        }
        fn attack(&mut self, _id: UnitId, _target: UnitId) {}
        fn can_harvest(&self, _id: UnitId, _direction: Direction) -> bool {
            false
        }
        fn harvest(&mut self, _id: UnitId, _direction: Direction) {}
        fn can_replicate(&self, _id: UnitId, _direction: Direction) -> bool {
            false
        }
        fn replicate(&mut self, _id: UnitId, _direction: Direction) -> Option<UnitId> {
            None
        }
        fn can_blueprint(
            &self,
            _id: UnitId,
            _kind: StructureKind,
            _direction: Direction,
        ) -> bool {
            false
        }
        fn blueprint(
            &mut self,
            _id: UnitId,
            _kind: StructureKind,
            _direction: Direction,
        ) -> Option<UnitId> {
            None
        }
        fn can_build(&self, _id: UnitId, _structure: UnitId) -> bool {
            false
        }
        fn build(&mut self, _id: UnitId, _structure: UnitId) {}
    }

    /// Completes every task instantly and re-queues a copy each time, which
    /// would loop forever without the cascade cap.
    struct Requeuer;

    impl RoleOps for Requeuer {
        const CASCADES: bool = true;

        fn execute(
            unit: &mut Unit,
            _engine: &mut Engine,
            _oracle: &mut dyn Oracle,
            task: RobotTask,
        ) -> TaskStatus {
            unit.push_task(task);
            TaskStatus::Complete
        }
    }

    /// Completes everything instantly without side effects.
    struct Finisher;

    impl RoleOps for Finisher {
        const CASCADES: bool = true;

        fn execute(
            _unit: &mut Unit,
            _engine: &mut Engine,
            _oracle: &mut dyn Oracle,
            _task: RobotTask,
        ) -> TaskStatus {
            TaskStatus::Complete
        }
    }

    /// Never completes anything.
    struct Sitter;

    impl RoleOps for Sitter {
        const CASCADES: bool = false;

        fn execute(
            _unit: &mut Unit,
            _engine: &mut Engine,
            _oracle: &mut dyn Oracle,
            _task: RobotTask,
        ) -> TaskStatus {
            TaskStatus::InProgress
        }
    }

    fn task(command: TaskCommand) -> RobotTask {
        RobotTask::new(command, GridPos::new(3, 3))
    }

    #[test]
    fn cascade_is_capped_at_entry_queue_length() {
        let mut engine = Engine::new(EngineConfig::default());
        let mut oracle = InstantOracle;
        let mut unit = Unit::worker(1);
        unit.push_task(task(TaskCommand::Move));
        unit.push_task(task(TaskCommand::Move));

        drive::<Requeuer>(&mut unit, &mut engine, &mut oracle);

        // two executed (each re-queueing itself), then the budget ran out
        assert_eq!(unit.queue.len(), 2);
    }

    #[test]
    fn cascade_drains_a_finite_queue_in_one_tick() {
        let mut engine = Engine::new(EngineConfig::default());
        let mut oracle = InstantOracle;
        let mut unit = Unit::worker(1);
        for _ in 0..3 {
            unit.push_task(task(TaskCommand::Move));
        }

        drive::<Finisher>(&mut unit, &mut engine, &mut oracle);

        assert!(unit.queue.is_empty());
    }

    #[test]
    fn emergency_preempts_the_queue() {
        let mut engine = Engine::new(EngineConfig::default());
        let mut oracle = InstantOracle;
        let mut unit = Unit::attacker(1);
        unit.push_task(task(TaskCommand::Move));
        unit.emergency = Some(task(TaskCommand::InCombat));

        drive::<Sitter>(&mut unit, &mut engine, &mut oracle);

        // the queued task never ran and the emergency survives until complete
        assert_eq!(unit.queue.len(), 1);
        assert!(unit.emergency.is_some());
    }

    #[test]
    fn completed_emergency_clears_and_yields_the_tick() {
        let mut engine = Engine::new(EngineConfig::default());
        let mut oracle = InstantOracle;
        let mut unit = Unit::attacker(1);
        unit.push_task(task(TaskCommand::Move));
        unit.emergency = Some(task(TaskCommand::InCombat));

        drive::<Finisher>(&mut unit, &mut engine, &mut oracle);

        assert!(unit.emergency.is_none());
        // queue resumes next tick, not this one
        assert_eq!(unit.queue.len(), 1);
    }
}
