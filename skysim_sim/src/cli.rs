// skysim_sim/src/cli.rs

use clap::Parser;
use std::path::PathBuf;

/// SKYSIM: an autonomous drone flight simulator.
///
/// Runs a scenario TOML file through the fixed-step simulation core with
/// the algorithm the scenario selects.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// The path to the scenario TOML file to run.
    #[arg(short, long, default_value = "skysim_sim/scenarios/default.toml")]
    pub scenario: PathBuf,

    /// Tick budget for the run.
    #[arg(long, default_value_t = 20_000)]
    pub max_steps: u64,

    /// Overrides the scenario's RNG seed.
    #[arg(long)]
    pub seed: Option<u64>,

    /// List the scenario files next to the selected one and exit.
    #[arg(long, default_value_t = false)]
    pub list: bool,

    /// Root directory for session logs.
    #[arg(long, default_value = "logs")]
    pub log_dir: PathBuf,

    /// Skip writing a session log.
    #[arg(long, default_value_t = false)]
    pub no_log: bool,
}
