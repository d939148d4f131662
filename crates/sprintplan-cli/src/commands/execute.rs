use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use clap::Args;
use sprintplan_core::{report, ExecuteOptions, SnapshotTracker, SprintExecutor};
use tracing::info;

use super::{plan_snapshot, CommandResult};

#[derive(Args)]
pub struct ExecuteArgs {
    /// Planning snapshot (JSON); updated in place unless --dry-run
    #[arg(long)]
    input: PathBuf,
    /// Show what would happen without changing anything
    #[arg(long)]
    dry_run: bool,
    /// Create entries for new unassigned items
    #[arg(long)]
    create: bool,
    /// Move planned backlog items to "To Do"
    #[arg(long)]
    transition: bool,
    /// Skip the confirmation prompt
    #[arg(long, short)]
    yes: bool,
    /// Also write the execution report to this file
    #[arg(long)]
    report: Option<PathBuf>,
}

fn confirm(prompt: &str) -> std::io::Result<bool> {
    eprint!("{prompt}");
    std::io::stderr().flush()?;
    let mut answer = String::new();
    std::io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

pub fn run(args: ExecuteArgs, config_path: &Path) -> CommandResult {
    let (config, mut snapshot, outcome) = plan_snapshot(config_path, &args.input)?;
    let plan = &outcome.plan;

    eprintln!(
        "Assign {} items to {} members",
        plan.assigned_count(),
        plan.assignments.len()
    );
    if args.transition {
        let backlog = plan
            .sections
            .categorized()
            .filter(|i| i.item.status_stage() == Some(sprintplan_core::Status::Backlog))
            .count();
        eprintln!("Transition {backlog} items from Backlog to To Do");
    }
    if args.create {
        let to_create = plan.unassigned.iter().filter(|i| i.key().is_none()).count();
        eprintln!("Create {to_create} new items");
    }

    if !(args.dry_run || args.yes) && !confirm("Proceed with execution? (y/N): ")? {
        eprintln!("Execution cancelled.");
        return Ok(());
    }

    let options = ExecuteOptions {
        assign: true,
        create_new: args.create,
        transition: args.transition,
        dry_run: args.dry_run,
    };
    let executor =
        SprintExecutor::new(options).with_default_project(config.execution.default_project.clone());
    let execution = {
        let mut tracker = SnapshotTracker::new(&mut snapshot);
        executor.execute(plan, &mut tracker)?
    };

    if !args.dry_run {
        snapshot.save(&args.input)?;
        info!(path = %args.input.display(), "snapshot updated");
    }

    let markdown = report::render_execution(&execution);
    if let Some(path) = &args.report {
        std::fs::write(path, &markdown)?;
        info!(path = %path.display(), "execution report saved");
    }
    print!("{markdown}");
    Ok(())
}
