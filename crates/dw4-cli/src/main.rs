mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::config::ConfigSubcommand;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "dw4",
    about = "Five-stage delivery workflow: gate each stage on its deliverable and advance",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: auto-detect from .dw4/, docs/WORKFLOW_MASTER.md or .git/)
    #[arg(long, global = true, env = "DW4_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the workflow master file, requirement documents and config if missing
    Init,

    /// Show the current stage and what it takes to approve it
    Status,

    /// Validate the current stage's deliverable and advance to the next stage
    Approve,

    /// Advance to the named stage (must be the next one in sequence)
    Advance {
        /// Engineer, Researcher, Coder, Validator or Deployer
        stage: String,
    },

    /// Inspect the workflow configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    let result = match cli.command {
        Commands::Init => cmd::init::run(&root, cli.json),
        Commands::Status => cmd::status::run(&root, cli.json),
        Commands::Approve => cmd::approve::run(&root, None, cli.json),
        Commands::Advance { stage } => cmd::approve::run(&root, Some(&stage), cli.json),
        Commands::Config { subcommand } => cmd::config::run(&root, subcommand, cli.json),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
