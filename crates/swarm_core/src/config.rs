//! Engine configuration.
//!
//! Every tunable the engine consults lives here with a sensible default, so
//! `EngineConfig::default()` produces a playable setup and hosts override
//! only what they care about. Configs serialize as RON for headless runs.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::broker::{BrokerPolicy, EmptiedTaskPolicy};
use crate::task::GlobalCommand;

/// Errors loading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file does not exist.
    #[error("Config file not found: {0}")]
    FileNotFound(String),

    /// The config file could not be read.
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// The config file is not valid RON.
    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] ron::error::SpannedError),
}

/// All engine tunables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Workers required to staff a factory construction objective.
    pub factory_min_workers: usize,
    /// Workers required to staff a rocket construction objective.
    pub rocket_min_workers: usize,
    /// Workers required before a load objective accepts combat units.
    pub transport_min_workers: usize,
    /// Hard headcount cap on a load objective.
    pub transport_max_members: usize,
    /// Squared radius of the enemy-sighting alert broadcast.
    pub broadcast_radius_sq: u32,
    /// Attempts an idle combat unit makes to find a random wander cell.
    pub wander_retry_limit: u32,
    /// Seed for the engine's deterministic RNG.
    pub rng_seed: u64,
    /// Policy for objectives emptied by member death.
    pub emptied_task_policy: EmptiedTaskPolicy,
    /// Whether understaffed objectives rejoin the pending queue.
    pub requeue_understaffed: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            factory_min_workers: 4,
            rocket_min_workers: 6,
            transport_min_workers: 4,
            transport_max_members: 8,
            broadcast_radius_sq: 20,
            wander_retry_limit: 10,
            rng_seed: 0,
            emptied_task_policy: EmptiedTaskPolicy::Requeue,
            requeue_understaffed: false,
        }
    }
}

impl EngineConfig {
    /// Load a configuration from a RON file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        let config = ron::from_str(&contents)?;
        Ok(config)
    }

    /// The broker policies this config implies.
    #[must_use]
    pub fn broker_policy(&self) -> BrokerPolicy {
        BrokerPolicy {
            emptied: self.emptied_task_policy,
            requeue_understaffed: self.requeue_understaffed,
        }
    }

    /// Worker minimum for a given objective kind.
    #[must_use]
    pub fn min_members_for(&self, command: GlobalCommand) -> usize {
        match command {
            GlobalCommand::ConstructFactory => self.factory_min_workers,
            GlobalCommand::ConstructRocket => self.rocket_min_workers,
            GlobalCommand::LoadTransport => self.transport_min_workers,
        }
    }
}
