//! Scenario loading and configuration.
//!
//! Scenarios define the initial world and a script of objectives for a
//! headless run: an ASCII map, resource deposits, and tick-scheduled
//! directives such as "construct a factory at tick 0".

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use swarm_core::config::EngineConfig;

/// Error type for scenario operations.
#[derive(Error, Debug)]
pub enum ScenarioError {
    /// File not found.
    #[error("Scenario file not found: {0}")]
    FileNotFound(String),
    /// Failed to read file.
    #[error("Failed to read scenario file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse scenario: {0}")]
    ParseError(#[from] ron::error::SpannedError),
}

/// An objective the script can issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScriptAction {
    /// Create a factory construction objective.
    ConstructFactory,
    /// Create a rocket construction objective.
    ConstructRocket,
    /// Create a load objective on the first built rocket.
    LoadFirstRocket,
}

/// One scheduled objective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Directive {
    /// Tick at which to issue the action.
    pub tick: u64,
    /// What to issue.
    pub action: ScriptAction,
}

/// A resource deposit placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositPlacement {
    /// Cell x.
    pub x: i32,
    /// Cell y.
    pub y: i32,
    /// Resource amount.
    pub amount: u32,
}

/// A complete scenario configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// ASCII map. Legend: `.` floor, `#` wall, `k` deposit, `w` worker,
    /// `a` attacker, `e` enemy.
    pub map: String,
    /// Resource deposits.
    pub deposits: Vec<DepositPlacement>,
    /// Tick-scheduled objectives.
    pub directives: Vec<Directive>,
    /// Ticks to simulate.
    pub max_ticks: u64,
    /// Engine configuration for the run.
    pub engine: EngineConfig,
}

impl Scenario {
    /// Load a scenario from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ScenarioError::FileNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron_str(&contents)
    }

    /// Load from a RON string (useful for embedded scenarios).
    pub fn from_ron_str(ron: &str) -> Result<Self, ScenarioError> {
        let scenario: Self = ron::from_str(ron)?;
        Ok(scenario)
    }

    /// A workforce that builds a factory, then a rocket.
    #[must_use]
    pub fn factory_rush() -> Self {
        Self {
            name: "factory_rush".to_string(),
            description: "Six workers construct a factory and then a rocket".to_string(),
            map: "....................\n\
                  .wwwwww.............\n\
                  ....................\n\
                  ....................\n\
                  ....................\n\
                  ....................\n\
                  ....................\n\
                  ....................\n\
                  ....................\n\
                  ...................."
                .to_string(),
            deposits: vec![DepositPlacement {
                x: 7,
                y: 1,
                amount: 50,
            }],
            directives: vec![
                Directive {
                    tick: 0,
                    action: ScriptAction::ConstructFactory,
                },
                Directive {
                    tick: 40,
                    action: ScriptAction::ConstructRocket,
                },
            ],
            max_ticks: 200,
            engine: EngineConfig {
                factory_min_workers: 3,
                rocket_min_workers: 4,
                ..EngineConfig::default()
            },
        }
    }

    /// Attackers sweep an enemy patrol off the map.
    #[must_use]
    pub fn ambush() -> Self {
        Self {
            name: "ambush".to_string(),
            description: "Four attackers engage a patrol of three".to_string(),
            map: "....................\n\
                  .aa.................\n\
                  .aa.................\n\
                  ....................\n\
                  ........ee..........\n\
                  ........e...........\n\
                  ....................\n\
                  ....................\n\
                  ....................\n\
                  ...................."
                .to_string(),
            deposits: Vec::new(),
            directives: Vec::new(),
            max_ticks: 300,
            engine: EngineConfig::default(),
        }
    }

    /// Look up a builtin scenario by name.
    #[must_use]
    pub fn builtin(name: &str) -> Option<Self> {
        match name {
            "factory_rush" => Some(Self::factory_rush()),
            "ambush" => Some(Self::ambush()),
            _ => None,
        }
    }
}
