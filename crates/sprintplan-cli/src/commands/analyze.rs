use std::path::{Path, PathBuf};

use clap::Args;
use serde_json::json;

use super::{plan_snapshot, CommandResult};

#[derive(Args)]
pub struct AnalyzeArgs {
    /// Planning snapshot (JSON)
    #[arg(long)]
    input: PathBuf,
}

pub fn run(args: AnalyzeArgs, config_path: &Path) -> CommandResult {
    let (_, _, outcome) = plan_snapshot(config_path, &args.input)?;
    let analysis = json!({
        "velocity": outcome.velocity,
        "capacity": outcome.capacity,
        "summary": outcome.summary,
        "recommendation": outcome.summary.recommendation.to_string(),
    });
    println!("{}", serde_json::to_string_pretty(&analysis)?);
    Ok(())
}
