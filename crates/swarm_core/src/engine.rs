//! The tick orchestrator.
//!
//! [`Engine`] owns all coordination state and advances it one tick at a
//! time against a host-provided [`Oracle`]. Each tick runs a fixed phase
//! order, and every collection is iterated in sorted-id order, so a run is
//! fully determined by the seed, the config, and the oracle's answers:
//!
//! 1. register units the oracle reports that we have never seen
//! 2. purge units the oracle no longer reports (revoking memberships)
//! 3. broker assignment of idle units to pending objectives
//! 4. unit decisions: structures, then workers, then attackers
//! 5. sweep finished objectives and release their sites
//! 6. admit units staged during the tick

use std::collections::HashSet;

use crate::broker::TaskBroker;
use crate::config::EngineConfig;
use crate::controller;
use crate::error::{EngineError, Result};
use crate::grid::GridPos;
use crate::oracle::{Oracle, StructureKind, UnitId};
use crate::rng::SplitMix64;
use crate::roster::{Roster, Unit, UnitRole};
use crate::sites::SitePlanner;
use crate::targeting::TargetingState;
use crate::task::{GlobalCommand, RobotTask, TaskId};

/// What one tick did, for hosts that want to log or assert on it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// The tick that just ran.
    pub tick: u64,
    /// Units purged as dead this tick, sorted.
    pub deaths: Vec<UnitId>,
    /// Units admitted from staging this tick, sorted.
    pub admitted: Vec<UnitId>,
    /// Objectives that finished and were swept this tick.
    pub finished_objectives: Vec<TaskId>,
}

/// The coordination engine for one team.
#[derive(Debug, Clone)]
pub struct Engine {
    tick: u64,
    pub(crate) config: EngineConfig,
    pub(crate) roster: Roster,
    pub(crate) broker: TaskBroker,
    pub(crate) targeting: TargetingState,
    pub(crate) sites: SitePlanner,
    pub(crate) rng: SplitMix64,
}

impl Engine {
    /// Create an engine from a configuration.
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        let rng = SplitMix64::new(config.rng_seed);
        let broker = TaskBroker::new(config.broker_policy());
        Self {
            tick: 0,
            config,
            roster: Roster::new(),
            broker,
            targeting: TargetingState::new(),
            sites: SitePlanner::new(),
            rng,
        }
    }

    /// Advance the engine one tick.
    pub fn tick(&mut self, oracle: &mut dyn Oracle) -> TickReport {
        let tick = self.tick;
        tracing::debug!(tick, units = self.roster.len(), "tick start");

        let mut ours = oracle.my_units();
        ours.sort_unstable();
        self.register_new_units(&ours, oracle);

        let alive: HashSet<UnitId> = ours.iter().copied().collect();
        let deaths = self.roster.reconcile(&alive, &mut self.broker);

        self.broker.advance(&mut self.roster);

        // Structures first so freshly-finished builds are visible to the
        // units that depend on them, then the economy, then the military.
        for role in [UnitRole::Structure, UnitRole::Worker, UnitRole::Attacker] {
            self.run_role(role, oracle);
        }

        let swept = self.broker.remove_finished();
        let mut finished_objectives = Vec::with_capacity(swept.len());
        for objective in swept {
            if objective.command != GlobalCommand::LoadTransport {
                self.sites.release(objective.target);
            }
            finished_objectives.push(objective.id);
        }

        let admitted = self.roster.admit();
        self.tick += 1;

        TickReport {
            tick,
            deaths,
            admitted,
            finished_objectives,
        }
    }

    /// Insert units the oracle reports but the roster has never seen.
    fn register_new_units(&mut self, ours: &[UnitId], oracle: &dyn Oracle) {
        for &id in ours {
            if self.roster.contains(id) {
                continue;
            }
            let Some(role) = oracle.unit_role(id) else {
                continue;
            };
            tracing::debug!(unit = id, ?role, "registering unit");
            let unit = match role {
                UnitRole::Worker => Unit::worker(id),
                UnitRole::Attacker => Unit::attacker(id),
                UnitRole::Structure => Unit::structure(id, oracle.structure_is_built(id)),
            };
            self.roster.insert_live(unit);
        }
    }

    /// Run every live unit of one role, in sorted-id order.
    ///
    /// Each unit is taken out of its role map for the duration of its
    /// decision step, so its behavior can mutate shared state (alert other
    /// units, stage replicas) without aliasing itself.
    fn run_role(&mut self, role: UnitRole, oracle: &mut dyn Oracle) {
        for id in self.roster.sorted_ids(role) {
            let Some(mut unit) = self.roster.take(role, id) else {
                continue;
            };
            controller::run_unit(&mut unit, self, oracle);
            self.roster.insert_live(unit);
        }
    }

    /// Create a construction objective, picking and reserving its site.
    ///
    /// Fails with [`EngineError::NoSiteFound`] when no admissible site
    /// exists or there are no workers to measure site distance against.
    pub fn enqueue_construction(
        &mut self,
        kind: StructureKind,
        oracle: &dyn Oracle,
    ) -> Result<TaskId> {
        let command = match kind {
            StructureKind::Factory => GlobalCommand::ConstructFactory,
            StructureKind::Rocket => GlobalCommand::ConstructRocket,
        };
        let workforce: Vec<GridPos> = self
            .roster
            .sorted_ids(UnitRole::Worker)
            .into_iter()
            .filter_map(|id| oracle.location(id))
            .collect();
        let site = self
            .sites
            .pick_site(oracle, &workforce)
            .ok_or(EngineError::NoSiteFound)?;
        let min = self.config.min_members_for(command);
        Ok(self.broker.enqueue_at(command, site, min))
    }

    /// Create a load objective targeting a transport's current location.
    pub fn enqueue_load(&mut self, transport: UnitId, oracle: &dyn Oracle) -> Result<TaskId> {
        let target = oracle
            .location(transport)
            .ok_or(EngineError::UnitNotFound(transport))?;
        Ok(self.broker.enqueue_load(
            target,
            self.config.transport_min_workers,
            self.config.transport_max_members,
        ))
    }

    /// Explicitly finish an objective (e.g. the host launched the rocket).
    pub fn mark_finished(&mut self, task: TaskId) -> Result<()> {
        if self.broker.get(task).is_none() {
            return Err(EngineError::TaskNotFound(task));
        }
        self.broker.mark_finished(task);
        Ok(())
    }

    /// Append a task to a unit's personal queue.
    pub fn assign_task(&mut self, unit: UnitId, task: RobotTask) -> Result<()> {
        let u = self
            .roster
            .get_mut(unit)
            .ok_or(EngineError::UnitNotFound(unit))?;
        u.push_task(task);
        Ok(())
    }

    /// Set a unit's emergency task, replacing any existing one.
    pub fn assign_emergency(&mut self, unit: UnitId, task: RobotTask) -> Result<()> {
        let u = self
            .roster
            .get_mut(unit)
            .ok_or(EngineError::UnitNotFound(unit))?;
        u.emergency = Some(task);
        Ok(())
    }

    /// The unit roster.
    #[must_use]
    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    /// The task broker.
    #[must_use]
    pub fn broker(&self) -> &TaskBroker {
        &self.broker
    }

    /// The shared targeting state.
    #[must_use]
    pub fn targeting(&self) -> &TargetingState {
        &self.targeting
    }

    /// The site planner.
    #[must_use]
    pub fn sites(&self) -> &SitePlanner {
        &self.sites
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The next tick number to run.
    #[must_use]
    pub fn current_tick(&self) -> u64 {
        self.tick
    }
}
