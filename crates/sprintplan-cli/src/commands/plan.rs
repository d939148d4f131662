use std::path::{Path, PathBuf};

use clap::Args;
use sprintplan_core::report;
use tracing::info;

use super::{plan_snapshot, CommandResult};

#[derive(Args)]
pub struct PlanArgs {
    /// Planning snapshot (JSON)
    #[arg(long)]
    input: PathBuf,
    /// Also write the markdown plan to this file
    #[arg(long)]
    output: Option<PathBuf>,
    /// Print the full planning outcome as JSON instead of markdown
    #[arg(long)]
    json: bool,
}

pub fn run(args: PlanArgs, config_path: &Path) -> CommandResult {
    let (config, _, outcome) = plan_snapshot(config_path, &args.input)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    let today = chrono::Local::now().date_naive();
    let markdown = report::render_plan(&outcome, &config.report, today);
    if let Some(path) = &args.output {
        std::fs::write(path, &markdown)?;
        info!(path = %path.display(), "sprint plan saved");
    }
    print!("{markdown}");
    Ok(())
}
