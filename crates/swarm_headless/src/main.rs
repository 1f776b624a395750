//! Headless engine runner.
//!
//! Runs coordination-engine scenarios without a host game, for CI and
//! determinism verification.
//!
//! # Usage
//!
//! ```bash
//! # Run a builtin scenario and print the JSON summary
//! cargo run -p swarm_headless -- run --scenario factory_rush
//!
//! # Run a scenario file
//! cargo run -p swarm_headless -- run --file scenarios/rush.ron
//!
//! # Verify a scenario is deterministic across runs
//! cargo run -p swarm_headless -- verify --scenario ambush --runs 5
//! ```
//!
//! Summaries go to stdout; logs go to stderr.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use swarm_headless::runner::{run_scenario, verify_determinism};
use swarm_headless::scenario::Scenario;

#[derive(Parser)]
#[command(name = "swarm_headless")]
#[command(about = "Headless coordination-engine runner for scenario testing and CI")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single scenario and print its summary as JSON
    Run {
        /// Builtin scenario name
        #[arg(short, long, default_value = "factory_rush")]
        scenario: String,

        /// Scenario RON file (overrides --scenario)
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Pretty-print the JSON summary
        #[arg(long)]
        pretty: bool,
    },

    /// Verify a scenario produces identical results across runs
    Verify {
        /// Builtin scenario name
        #[arg(short, long, default_value = "factory_rush")]
        scenario: String,

        /// Scenario RON file (overrides --scenario)
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Number of verification runs
        #[arg(short, long, default_value = "5")]
        runs: u32,
    },
}

fn main() {
    let cli = Cli::parse();

    // Logging to stderr; stdout carries the JSON summary
    let log_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(tracing_subscriber::filter::LevelFilter::from_level(
            log_level,
        ))
        .init();

    match cli.command {
        Some(Commands::Run {
            scenario,
            file,
            pretty,
        }) => cmd_run(&scenario, file, pretty),
        Some(Commands::Verify {
            scenario,
            file,
            runs,
        }) => cmd_verify(&scenario, file, runs),
        None => cmd_run("factory_rush", None, false),
    }
}

fn load(name: &str, file: Option<PathBuf>) -> Scenario {
    let loaded = match file {
        Some(path) => Scenario::load(&path).map_err(|e| e.to_string()),
        None => Scenario::builtin(name).ok_or_else(|| format!("unknown builtin scenario: {name}")),
    };
    match loaded {
        Ok(scenario) => scenario,
        Err(message) => {
            eprintln!("Failed to load scenario: {message}");
            std::process::exit(1);
        }
    }
}

fn cmd_run(name: &str, file: Option<PathBuf>, pretty: bool) {
    let scenario = load(name, file);
    tracing::info!(scenario = %scenario.name, ticks = scenario.max_ticks, "running scenario");

    let summary = run_scenario(&scenario);

    let json = if pretty {
        serde_json::to_string_pretty(&summary)
    } else {
        serde_json::to_string(&summary)
    };
    match json {
        Ok(text) => println!("{text}"),
        Err(error) => {
            eprintln!("Failed to serialize summary: {error}");
            std::process::exit(1);
        }
    }
}

fn cmd_verify(name: &str, file: Option<PathBuf>, runs: u32) {
    let scenario = load(name, file);
    tracing::info!(scenario = %scenario.name, runs, "verifying determinism");

    if verify_determinism(&scenario, runs) {
        eprintln!("PASS: all {runs} runs produced identical summaries");
    } else {
        eprintln!("FAIL: non-determinism detected!");
        std::process::exit(1);
    }
}
