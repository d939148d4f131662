pub mod analyze;
pub mod config;
pub mod execute;
pub mod plan;

use std::path::{Path, PathBuf};

use sprintplan_core::{Config, Ingestor, PlanOutcome, PlanningSnapshot, SprintEngine};

pub type CommandResult = Result<(), Box<dyn std::error::Error>>;

/// Explicit `--config` path, or the default location.
pub fn config_path(explicit: Option<PathBuf>) -> Result<PathBuf, Box<dyn std::error::Error>> {
    match explicit {
        Some(path) => Ok(path),
        None => Ok(Config::default_path()?),
    }
}

/// Load config and snapshot, then run the engine.
pub fn plan_snapshot(
    config_path: &Path,
    input: &Path,
) -> Result<(Config, PlanningSnapshot, PlanOutcome), Box<dyn std::error::Error>> {
    let config = Config::load_from(config_path)?;
    let snapshot = PlanningSnapshot::load(input)?;
    let inputs = Ingestor::new(config.ingest, config.capacity.clone()).ingest(&snapshot);
    let outcome = SprintEngine::from_config(&config).run(&inputs);
    Ok((config, snapshot, outcome))
}
