use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;
mod logging;

#[derive(Parser)]
#[command(name = "sprintplan", version, about = "Capacity-aware sprint planning")]
struct Cli {
    /// Config file (defaults to ~/.config/sprintplan/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a sprint plan from a planning snapshot
    Plan(commands::plan::PlanArgs),
    /// Show velocity and capacity analysis
    Analyze(commands::analyze::AnalyzeArgs),
    /// Plan, then apply the plan to the snapshot
    Execute(commands::execute::ExecuteArgs),
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let result = commands::config_path(cli.config).and_then(|config_path| match cli.command {
        Commands::Plan(args) => commands::plan::run(args, &config_path),
        Commands::Analyze(args) => commands::analyze::run(args, &config_path),
        Commands::Execute(args) => commands::execute::run(args, &config_path),
        Commands::Config { action } => commands::config::run(action, &config_path),
    });

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
