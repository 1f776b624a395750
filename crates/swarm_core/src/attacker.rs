//! Combat-unit behavior.
//!
//! Attackers run a sense-decide-act loop every tick. Sensing updates the
//! shared targeting state: fresh sightings broadcast alerts to nearby
//! friendlies, claim a focus target, and push a rally point; an empty
//! horizon releases claims and, once the unit stands on the rally point,
//! pops it. Acting is the normal queue drive, with an `InCombat` emergency
//! taking over while any enemy is visible.

use crate::controller::{self, RoleOps, TaskStatus};
use crate::engine::Engine;
use crate::grid::{isqrt, GridPos};
use crate::oracle::{Oracle, UnitId};
use crate::roster::Unit;
use crate::task::{RobotTask, TaskCommand};

/// Run one combat unit for one tick.
pub(crate) fn run(unit: &mut Unit, engine: &mut Engine, oracle: &mut dyn Oracle) {
    update_targets(unit, engine, oracle);
    retarget_wander(unit, engine);
    controller::drive::<AttackerOps>(unit, engine, oracle);
}

pub fn in_combat(unit: &Unit) -> bool {
    matches!(unit.emergency, Some(t) if t.command == TaskCommand::InCombat)
}

/// Reconcile this unit's view of the battlefield with the shared state.
fn update_targets(unit: &mut Unit, engine: &mut Engine, oracle: &mut dyn Oracle) {
    let visible = oracle.enemies_in_vision(unit.id);
    let Some(here) = oracle.location(unit.id) else {
        return;
    };

    if visible.is_empty() {
        if in_combat(unit) {
            tracing::debug!(unit = unit.id, "battlefield clear, standing down");
            unit.emergency = None;
        }
        if let Some(enemy) = unit.focused_target.take() {
            engine.targeting.release(enemy);
        }
        // standing on (or in weapons range of) the rally point with nothing
        // in sight confirms it cleared
        if let Some(top) = engine.targeting.rally_top() {
            if here.distance_squared(top) <= oracle.attack_radius_sq(unit.id) {
                engine.targeting.pop_rally();
            }
        }
        return;
    }

    if !in_combat(unit) {
        // fresh engagement
        let already_alerted =
            unit.current_task().map(|t| t.command) == Some(TaskCommand::Alerted);
        if !already_alerted {
            broadcast_alert(unit, engine, oracle, here);
        }
        if unit.current_task().is_some_and(|t| t.group.is_none()) {
            // whatever we were walking toward is moot now
            unit.pop_current();
        }
        unit.emergency = Some(RobotTask::new(TaskCommand::InCombat, here));
    }

    unit.focused_target = find_focus_target(unit, engine, oracle, &visible);
    if let Some(loc) = unit.focused_target.and_then(|e| oracle.location(e)) {
        engine
            .targeting
            .push_rally(loc, oracle.vision_radius_sq(unit.id));
    }
}

/// Alert nearby friendlies to an engagement at `sighting`.
///
/// Friends already responding to an alert, or working a shared objective,
/// are left alone; everyone else drops their ungrouped current task and
/// walks to the fight.
fn broadcast_alert(unit: &Unit, engine: &mut Engine, oracle: &dyn Oracle, sighting: GridPos) {
    let friends = oracle.friendly_combat_units_within(sighting, engine.config.broadcast_radius_sq);
    let mut alerted = 0usize;
    for friend in friends {
        if friend == unit.id {
            continue;
        }
        let Some(ally) = engine.roster.get_mut(friend) else {
            continue;
        };
        let busy = ally
            .current_task()
            .is_some_and(|t| t.command == TaskCommand::Alerted || t.group.is_some());
        if busy {
            continue;
        }
        ally.pop_current();
        ally.queue
            .push_front(RobotTask::new(TaskCommand::Alerted, sighting));
        alerted += 1;
    }
    if alerted > 0 {
        tracing::debug!(unit = unit.id, alerted, x = sighting.x, y = sighting.y, "broadcast alert");
    }
}

/// Pick which visible enemy this unit should focus.
///
/// Keep the current focus while it stays visible; otherwise converge on an
/// already-claimed enemy; otherwise claim the nearest one ourselves.
fn find_focus_target(
    unit: &mut Unit,
    engine: &mut Engine,
    oracle: &dyn Oracle,
    visible: &[UnitId],
) -> Option<UnitId> {
    if let Some(current) = unit.focused_target {
        if visible.contains(&current) {
            return Some(current);
        }
        engine.targeting.release(current);
    }

    let here = oracle.location(unit.id)?;
    let distance_to = |enemy: &UnitId| {
        oracle
            .location(*enemy)
            .map_or(u32::MAX, |loc| here.distance_squared(loc))
    };

    let claimed = visible
        .iter()
        .filter(|e| engine.targeting.is_claimed(**e))
        .min_by_key(|e| (distance_to(e), **e))
        .copied();
    if claimed.is_some() {
        return claimed;
    }

    let nearest = visible.iter().min_by_key(|e| (distance_to(e), **e)).copied();
    if let Some(enemy) = nearest {
        engine.targeting.claim(enemy);
    }
    nearest
}

/// Swap a stale wander destination for the current rally point.
fn retarget_wander(unit: &mut Unit, engine: &Engine) {
    let Some(top) = engine.targeting.rally_top() else {
        return;
    };
    let stale = unit
        .current_task()
        .is_some_and(|t| t.command == TaskCommand::Wander && t.target != Some(top));
    if stale {
        unit.pop_current();
        unit.queue.push_front(RobotTask::new(TaskCommand::Wander, top));
    }
}

pub struct AttackerOps;

impl RoleOps for AttackerOps {
    const CASCADES: bool = true;

    fn execute(
        unit: &mut Unit,
        engine: &mut Engine,
        oracle: &mut dyn Oracle,
        task: RobotTask,
    ) -> TaskStatus {
        match task.command {
            TaskCommand::Move | TaskCommand::Wander | TaskCommand::Alerted => {
                let Some(target) = task.target else {
                    return TaskStatus::Complete;
                };
                controller::travel(oracle, unit.id, target)
            }
            TaskCommand::InCombat => battle_action(unit, engine, oracle),
            TaskCommand::Stall => TaskStatus::InProgress,
            other => {
                tracing::warn!(unit = unit.id, command = ?other, "attacker cannot run this command");
                TaskStatus::Complete
            }
        }
    }

    /// Movement tasks do not cascade into each other: a unit that just
    /// arrived somewhere reassesses the battlefield instead of immediately
    /// sprinting to its next waypoint. The reassessment happens now, not
    /// next tick: the completed move may have carried the unit into vision
    /// of an enemy the start-of-tick scan could not see.
    fn on_task_complete(
        unit: &mut Unit,
        engine: &mut Engine,
        oracle: &mut dyn Oracle,
        finished: RobotTask,
    ) -> bool {
        if finished.command == TaskCommand::Wander
            && engine.targeting.rally_top() == finished.target
        {
            engine.targeting.pop_rally();
        }
        update_targets(unit, engine, oracle);
        if in_combat(unit) && battle_action(unit, engine, oracle) == TaskStatus::Complete {
            unit.emergency = None;
        }
        false
    }

    /// Idle attackers head for the rally point; with no rally they patrol a
    /// random reachable cell within weapons range.
    fn idle(unit: &mut Unit, engine: &mut Engine, oracle: &mut dyn Oracle) {
        if let Some(top) = engine.targeting.rally_top() {
            unit.push_task(RobotTask::new(TaskCommand::Wander, top));
            return;
        }
        let Some(here) = oracle.location(unit.id) else {
            return;
        };
        let radius = isqrt(oracle.attack_radius_sq(unit.id)).max(1) as i32;
        let width = oracle.map_width() as i32;
        let height = oracle.map_height() as i32;
        for _ in 0..engine.config.wander_retry_limit {
            let dx = engine.rng.range_i32(-radius, radius);
            let dy = engine.rng.range_i32(-radius, radius);
            let cell = GridPos::new(here.x + dx, here.y + dy);
            let in_bounds = cell.x >= 0 && cell.x < width && cell.y >= 0 && cell.y < height;
            if cell == here || !in_bounds {
                continue;
            }
            if oracle.is_passable(cell) && !oracle.is_occupied(cell) {
                unit.push_task(RobotTask::new(TaskCommand::Wander, cell));
                return;
            }
        }
        // every attempt landed on a wall or a unit; stand still this tick
    }
}

/// Fight whatever is visible.
///
/// Completes only when the horizon is empty. Prefers the unit's focus
/// target when it is in range, otherwise finishes off the weakest enemy in
/// range, otherwise closes distance toward the focus target.
fn battle_action(unit: &mut Unit, engine: &mut Engine, oracle: &mut dyn Oracle) -> TaskStatus {
    let visible = oracle.enemies_in_vision(unit.id);
    if visible.is_empty() {
        return TaskStatus::Complete;
    }

    let target = unit
        .focused_target
        .filter(|e| oracle.can_attack(unit.id, *e))
        .or_else(|| {
            visible
                .iter()
                .filter(|e| oracle.can_attack(unit.id, **e))
                .min_by_key(|e| (oracle.health(**e).unwrap_or(u32::MAX), **e))
                .copied()
        });

    if let Some(enemy) = target {
        oracle.attack(unit.id, enemy);
        if oracle.health(enemy).is_none() {
            tracing::debug!(unit = unit.id, enemy, "enemy destroyed");
            engine.targeting.release(enemy);
            if unit.focused_target == Some(enemy) {
                unit.focused_target = None;
            }
        }
        return TaskStatus::InProgress;
    }

    // nothing in range yet; close on the focus target (or nearest enemy)
    let Some(here) = oracle.location(unit.id) else {
        return TaskStatus::InProgress;
    };
    let chase = unit
        .focused_target
        .filter(|e| visible.contains(e))
        .or_else(|| {
            visible
                .iter()
                .min_by_key(|e| {
                    oracle
                        .location(**e)
                        .map_or(u32::MAX, |loc| here.distance_squared(loc))
                })
                .copied()
        });
    if let Some(loc) = chase.and_then(|e| oracle.location(e)) {
        oracle.step_toward(unit.id, loc);
    }
    TaskStatus::InProgress
}
