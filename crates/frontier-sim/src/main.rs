//! Headless verification runner for the Frontier simulation.
//!
//! Performs the documented verification run: create one run from the
//! configured world, advance it to the configured tick target, and print
//! the final snapshot as JSON on stdout. Logs go to stderr.
//!
//! # Startup Sequence
//!
//! 1. Initialize structured logging (tracing)
//! 2. Load configuration from `frontier-config.yaml`
//! 3. Register the run with a [`Registry`]
//! 4. Run to `simulation.max_ticks` within the walltime budget
//! 5. Log the result and print the snapshot

mod error;

use std::path::Path;
use std::time::Duration;

use frontier_core::config::SimulationConfig;
use frontier_core::{Registry, SimulationRun};
use frontier_types::{RunState, SnapshotDocument};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::SimError;

/// Application entry point for the verification runner.
///
/// # Errors
///
/// Returns an error if configuration cannot be loaded or the run fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    info!("frontier-sim starting");

    // 2. Load configuration.
    let config = load_config()?;
    let world = config.world.clone();
    let bounds = config.simulation.clone();
    info!(
        world_build_id = %world.world_build_id,
        starting_system = %world.starting_system,
        seed = world.seed,
        max_ticks = bounds.max_ticks,
        max_walltime_seconds = bounds.max_walltime_seconds,
        "Configuration loaded"
    );

    // 3. Register the run.
    let registry = Registry::new(config);
    let run_id =
        SimulationRun::derived_run_id(&world.world_build_id, &world.starting_system, world.seed);
    let handle = registry
        .get_or_create(&run_id, &world.world_build_id, &world.starting_system, world.seed)
        .await
        .map_err(SimError::from)?;

    // 4. Run.
    let walltime =
        (bounds.max_walltime_seconds > 0).then(|| Duration::from_secs(bounds.max_walltime_seconds));
    let reached = registry
        .run(handle.run_id(), bounds.max_ticks, walltime)
        .await
        .map_err(SimError::from)?;

    // 5. Report.
    let document = registry
        .snapshot(handle.run_id())
        .await
        .map_err(SimError::from)?;
    log_run_end(&document, reached);
    println!("{}", serde_json::to_string_pretty(&document).map_err(SimError::from)?);

    info!("frontier-sim shutdown complete");
    Ok(())
}

/// Load the simulation configuration from `frontier-config.yaml`.
///
/// Looks for the config file relative to the current working directory.
fn load_config() -> Result<SimulationConfig, SimError> {
    let config_path = Path::new("frontier-config.yaml");
    if config_path.exists() {
        let config = SimulationConfig::from_file(config_path)?;
        Ok(config)
    } else {
        info!("Config file not found, using defaults");
        Ok(SimulationConfig::default())
    }
}

/// Log the outcome of the verification run.
fn log_run_end(document: &SnapshotDocument, reached: bool) {
    let snapshot = &document.snapshot;
    if reached && snapshot.state == RunState::Completed {
        info!(
            run_id = %snapshot.run_id,
            tick = snapshot.tick,
            simulated_year = snapshot.simulated_year,
            systems_populated = snapshot.systems_populated,
            total_population = snapshot.total_population,
            events = snapshot.events.len(),
            "Verification run completed"
        );
    } else {
        warn!(
            run_id = %snapshot.run_id,
            tick = snapshot.tick,
            state = %snapshot.state,
            "Verification run stopped before its tick target"
        );
    }
}
