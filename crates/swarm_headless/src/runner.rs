//! The scenario runner.
//!
//! Builds a world and an engine from a [`Scenario`], ticks the engine
//! against it while issuing the scripted objectives, and reports a
//! [`RunSummary`] that CI can assert on or dump as JSON.

use serde::{Deserialize, Serialize};

use swarm_core::engine::Engine;
use swarm_core::grid::GridPos;
use swarm_core::oracle::{Oracle, StructureKind};
use swarm_core::roster::UnitRole;
use swarm_test_utils::grid_oracle::GridOracle;

use crate::scenario::{Scenario, ScriptAction};

/// What a headless run ended with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Scenario name.
    pub scenario: String,
    /// Ticks simulated.
    pub ticks_run: u64,
    /// Live friendly workers at the end.
    pub workers: usize,
    /// Live friendly attackers at the end.
    pub attackers: usize,
    /// Live friendly structures at the end.
    pub structures: usize,
    /// Enemy units still alive.
    pub enemies_remaining: usize,
    /// Objectives the script created.
    pub objectives_created: usize,
    /// Objectives that completed during the run.
    pub objectives_finished: usize,
    /// Scripted directives that could not be issued (e.g. no site).
    pub directives_failed: usize,
    /// Total resource harvested.
    pub harvested: u32,
    /// Rally points left on the stack.
    pub rally_depth: usize,
}

/// Run a scenario to completion.
#[must_use]
pub fn run_scenario(scenario: &Scenario) -> RunSummary {
    let mut world = GridOracle::from_ascii(&scenario.map);
    for deposit in &scenario.deposits {
        world.set_deposit(GridPos::new(deposit.x, deposit.y), deposit.amount);
    }
    let mut engine = Engine::new(scenario.engine.clone());

    let mut objectives_created = 0usize;
    let mut objectives_finished = 0usize;
    let mut directives_failed = 0usize;

    for tick in 0..scenario.max_ticks {
        let report = engine.tick(&mut world);
        objectives_finished += report.finished_objectives.len();
        // directives run after the tick so that tick-zero scripts already
        // see the registered units
        for directive in scenario.directives.iter().filter(|d| d.tick == tick) {
            match issue(directive.action, &mut engine, &world) {
                Ok(()) => objectives_created += 1,
                Err(error) => {
                    tracing::warn!(tick, action = ?directive.action, %error, "directive failed");
                    directives_failed += 1;
                }
            }
        }
    }

    RunSummary {
        scenario: scenario.name.clone(),
        ticks_run: scenario.max_ticks,
        workers: engine.roster().sorted_ids(UnitRole::Worker).len(),
        attackers: engine.roster().sorted_ids(UnitRole::Attacker).len(),
        structures: engine.roster().sorted_ids(UnitRole::Structure).len(),
        enemies_remaining: world.enemy_ids().len(),
        objectives_created,
        objectives_finished,
        directives_failed,
        harvested: world.harvested,
        rally_depth: engine.targeting().rally_len(),
    }
}

fn issue(
    action: ScriptAction,
    engine: &mut Engine,
    world: &GridOracle,
) -> swarm_core::error::Result<()> {
    match action {
        ScriptAction::ConstructFactory => {
            engine.enqueue_construction(StructureKind::Factory, world)?;
        }
        ScriptAction::ConstructRocket => {
            engine.enqueue_construction(StructureKind::Rocket, world)?;
        }
        ScriptAction::LoadFirstRocket => {
            let rocket = world
                .structure_ids(StructureKind::Rocket)
                .into_iter()
                .find(|id| world.structure_is_built(*id))
                .ok_or_else(|| {
                    swarm_core::error::EngineError::InvalidState(
                        "no built rocket to load".to_string(),
                    )
                })?;
            engine.enqueue_load(rocket, world)?;
        }
    }
    Ok(())
}

/// Run the same scenario several times and compare summaries.
///
/// The summary captures every externally visible outcome, so identical
/// summaries across runs is the determinism bar a scenario must clear.
#[must_use]
pub fn verify_determinism(scenario: &Scenario, runs: u32) -> bool {
    let mut summaries = Vec::with_capacity(runs as usize);
    for _ in 0..runs {
        summaries.push(run_scenario(scenario));
    }
    summaries.windows(2).all(|w| w[0] == w[1])
}
