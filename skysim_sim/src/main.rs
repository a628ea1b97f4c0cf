// skysim_sim/src/main.rs

mod catalog;
mod cli;
mod logger;
mod scenario;

use std::cell::RefCell;
use std::rc::Rc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

use skysim_core::simulator::Simulator;

use crate::cli::Cli;
use crate::logger::SessionLogger;
use crate::scenario::Scenario;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    if cli.list {
        return list_scenarios(&cli);
    }

    let scenario_name = cli
        .scenario
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "scenario".to_string());
    let scenario = Scenario::load(&cli.scenario)
        .with_context(|| format!("loading scenario {}", cli.scenario.display()))?;

    let mut config = scenario.simulator_config();
    if let Some(seed) = cli.seed {
        config.simulation.seed = Some(seed);
    }

    let mut simulator = Simulator::new(config).context("constructing simulator")?;
    let mut algorithm = catalog::build_algorithm(&scenario.algorithm, &simulator)
        .context("constructing algorithm")?;

    if scenario.visualization.enabled {
        warn!("scenario requests visualization; this build has no renderer, connect a front end via the relay");
    }

    info!(
        scenario = %scenario_name,
        algorithm = scenario.algorithm.kind(),
        model = %simulator.spec().name,
        obstacles = simulator.environment().obstacles().len(),
        "starting run"
    );

    // --- Observer wiring ---

    let logger = if scenario.logging.enabled && !cli.no_log {
        let logger = SessionLogger::new(&cli.log_dir, &scenario_name, scenario.algorithm.kind())
            .context("creating session log")?;
        info!(directory = %logger.directory().display(), "session log open");
        Some(Rc::new(RefCell::new(logger)))
    } else {
        None
    };

    if let Some(logger) = &logger {
        let sink = logger.clone();
        simulator.add_step_observer(Box::new(move |t, state, sensors| {
            if let Err(error) = sink.borrow_mut().log_step(t, state, sensors) {
                warn!(%error, "dropping step record");
            }
        }));
        let sink = logger.clone();
        simulator.add_collision_observer(Box::new(move |state| {
            let message = format!("collision at {:?}", state.position);
            let _ = sink.borrow_mut().log_event("collision", &message);
        }));
    }

    simulator.add_collision_observer(Box::new(|state| {
        warn!(position = ?state.position, "collision");
    }));

    // Stop the loop once the mission goal is reached; completion flags are
    // read back from the algorithm afterwards.
    if let Some((goal, threshold)) = catalog::goal_of(&scenario.algorithm) {
        let handle = simulator.stop_handle();
        simulator.add_step_observer(Box::new(move |_, state, _| {
            if (state.position - goal).norm() < threshold {
                handle.stop();
            }
        }));
    }

    // --- Run ---

    let outcome = simulator.run_autonomous(algorithm.as_mut(), cli.max_steps);

    info!(
        outcome = ?outcome,
        success = outcome.is_success(),
        final_position = ?simulator.state().position,
        "run finished"
    );
    println!("{}", serde_json::to_string_pretty(&algorithm.status())?);

    if let Some(logger) = &logger {
        let mut logger = logger.borrow_mut();
        logger.log_event("run_finished", &format!("{outcome:?}"))?;
        logger.finish(&outcome, algorithm.as_ref())?;
        info!(directory = %logger.directory().display(), "session log written");
    }

    Ok(())
}

fn list_scenarios(cli: &Cli) -> Result<()> {
    let root = cli
        .scenario
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| std::path::Path::new("."));
    for entry in WalkDir::new(root).max_depth(2) {
        let entry = entry?;
        if entry.path().extension().is_some_and(|ext| ext == "toml") {
            println!("{}", entry.path().display());
        }
    }
    Ok(())
}
