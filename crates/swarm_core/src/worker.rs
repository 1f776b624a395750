//! Worker behavior.
//!
//! Workers harvest opportunistically every tick, then run their personal
//! queue: travel, replicate, place blueprints, and put build work into
//! structures. Workers never initiate objectives themselves; the broker
//! queues the full objective program on them at assignment time, and the
//! shared progress flags on the objective let a late-arriving member skip
//! phases a teammate already finished.

use crate::controller::{self, RoleOps, TaskStatus};
use crate::engine::Engine;
use crate::grid::{Direction, GridPos};
use crate::oracle::{Oracle, StructureKind, UnitId};
use crate::roster::Unit;
use crate::task::{RobotTask, TaskCommand};

/// Run one worker for one tick.
pub(crate) fn run(unit: &mut Unit, engine: &mut Engine, oracle: &mut dyn Oracle) {
    try_harvest(unit, oracle);
    controller::drive::<WorkerOps>(unit, engine, oracle);
}

/// Harvest the richest adjacent deposit, if any is reachable this tick.
fn try_harvest(unit: &mut Unit, oracle: &mut dyn Oracle) {
    let Some(here) = oracle.location(unit.id) else {
        return;
    };
    let best = Direction::ALL
        .into_iter()
        .filter(|d| oracle.can_harvest(unit.id, *d))
        .map(|d| (d, oracle.deposit_at(here.step(d))))
        .filter(|(_, amount)| *amount > 0)
        .max_by_key(|(_, amount)| *amount);
    if let Some((direction, amount)) = best {
        tracing::debug!(unit = unit.id, ?direction, amount, "harvesting");
        oracle.harvest(unit.id, direction);
    }
}

struct WorkerOps;

impl RoleOps for WorkerOps {
    const CASCADES: bool = true;

    /// Pop grouped phases whose objective is gone or already past them.
    fn skip_completed_phases(unit: &mut Unit, engine: &mut Engine) {
        while let Some(task) = unit.current_task() {
            let Some(group) = task.group else {
                return;
            };
            let skip = match engine.broker.get(group) {
                None => true, // objective consumed or abandoned
                Some(objective) => objective.phase_complete(task.command),
            };
            if !skip {
                return;
            }
            tracing::debug!(unit = unit.id, group, command = ?task.command, "skipping finished phase");
            unit.pop_current();
        }
    }

    fn execute(
        unit: &mut Unit,
        engine: &mut Engine,
        oracle: &mut dyn Oracle,
        task: RobotTask,
    ) -> TaskStatus {
        match task.command {
            TaskCommand::Move => {
                let Some(target) = task.target else {
                    return TaskStatus::Complete;
                };
                controller::travel(oracle, unit.id, target)
            }
            TaskCommand::Stall => TaskStatus::InProgress,
            TaskCommand::Clone => clone_worker(unit, engine, oracle, task),
            TaskCommand::Build => build_structure(unit, engine, oracle, task),
            TaskCommand::BlueprintFactory => {
                place_blueprint(unit, engine, oracle, task, StructureKind::Factory)
            }
            TaskCommand::BlueprintRocket => {
                place_blueprint(unit, engine, oracle, task, StructureKind::Rocket)
            }
            other => {
                tracing::warn!(unit = unit.id, command = ?other, "worker cannot run this command");
                TaskStatus::Complete
            }
        }
    }
}

/// Replicate a new worker next to the target location.
///
/// The replica is staged, not admitted: it takes no decisions until the tick
/// after its creation.
pub fn clone_worker(
    unit: &mut Unit,
    engine: &mut Engine,
    oracle: &mut dyn Oracle,
    task: RobotTask,
) -> TaskStatus {
    let Some(target) = task.target else {
        return TaskStatus::Complete;
    };
    let Some(here) = oracle.location(unit.id) else {
        return TaskStatus::Complete;
    };
    if !here.is_adjacent(target) && here != target {
        return match controller::travel(oracle, unit.id, target) {
            // arrived (or wedged): fall through to replicating next tick
            TaskStatus::Complete => TaskStatus::InProgress,
            status => status,
        };
    }
    // the replica itself must end up adjacent to the target location
    let legal = Direction::ALL
        .into_iter()
        .filter(|d| target.is_adjacent(here.step(*d)))
        .find(|d| oracle.can_replicate(unit.id, *d));
    let Some(direction) = legal else {
        // resources or cooldown not ready; retry next tick
        return TaskStatus::InProgress;
    };
    if let Some(replica) = oracle.replicate(unit.id, direction) {
        tracing::info!(unit = unit.id, replica, "replicated new worker");
        engine.roster.stage(Unit::worker(replica));
        return TaskStatus::Complete;
    }
    TaskStatus::InProgress
}

/// Place a structure blueprint at the target cell.
fn place_blueprint(
    unit: &mut Unit,
    engine: &mut Engine,
    oracle: &mut dyn Oracle,
    task: RobotTask,
    kind: StructureKind,
) -> TaskStatus {
    let Some(target) = task.target else {
        return TaskStatus::Complete;
    };
    let Some(here) = oracle.location(unit.id) else {
        return TaskStatus::Complete;
    };
    if here == target {
        // the blueprint goes on the cell we are standing on; vacate first
        vacate(unit.id, here, oracle);
        return TaskStatus::InProgress;
    }
    if !here.is_adjacent(target) {
        return match controller::travel(oracle, unit.id, target) {
            TaskStatus::Complete => TaskStatus::InProgress,
            status => status,
        };
    }
    let Some(direction) = here.direction_to(target) else {
        return TaskStatus::InProgress;
    };
    if !oracle.can_blueprint(unit.id, kind, direction) {
        return TaskStatus::InProgress;
    }
    if let Some(structure) = oracle.blueprint(unit.id, kind, direction) {
        tracing::info!(unit = unit.id, structure, ?kind, "placed blueprint");
        engine.roster.stage(Unit::structure(structure, false));
        if let Some(group) = task.group {
            engine.broker.note_blueprinted(group);
        }
        return TaskStatus::Complete;
    }
    TaskStatus::InProgress
}

/// Step off a cell to any free neighbor.
fn vacate(id: UnitId, here: GridPos, oracle: &mut dyn Oracle) {
    let free = here
        .neighbors()
        .into_iter()
        .find(|n| oracle.is_passable(*n) && !oracle.is_occupied(*n));
    if let Some(cell) = free {
        oracle.step_toward(id, cell);
    }
}

/// Put build work into the structure at the target cell until it finishes.
fn build_structure(
    unit: &mut Unit,
    engine: &mut Engine,
    oracle: &mut dyn Oracle,
    task: RobotTask,
) -> TaskStatus {
    let Some(target) = task.target else {
        return TaskStatus::Complete;
    };
    let Some(here) = oracle.location(unit.id) else {
        return TaskStatus::Complete;
    };
    if !here.is_adjacent(target) && here != target {
        return match controller::travel(oracle, unit.id, target) {
            TaskStatus::Complete => TaskStatus::InProgress,
            status => status,
        };
    }
    let Some(structure) = oracle.structure_at(target) else {
        // blueprint destroyed before it finished; nothing left to build
        tracing::warn!(unit = unit.id, x = target.x, y = target.y, "build target vanished");
        return TaskStatus::Complete;
    };
    if oracle.structure_is_built(structure) {
        if let Some(group) = task.group {
            engine.broker.note_built(group);
        }
        return TaskStatus::Complete;
    }
    if oracle.can_build(unit.id, structure) {
        oracle.build(unit.id, structure);
        if oracle.structure_is_built(structure) {
            tracing::info!(unit = unit.id, structure, "structure finished");
            if let Some(group) = task.group {
                engine.broker.note_built(group);
            }
            return TaskStatus::Complete;
        }
    }
    TaskStatus::InProgress
}
