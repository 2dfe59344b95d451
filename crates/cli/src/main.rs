//! pokedata - CVAT exports to a versioned canonical dataset
//!
//! Usage:
//!   pokedata download-task <id>              - Download a CVAT task into cvat_raw/
//!   pokedata dataset build                   - Build canonical/ from cvat_raw/
//!   pokedata dataset rebuild [--yes]         - Delete and build canonical/ again
//!   pokedata dataset summary                 - Show task and split counts
//!   pokedata release init --version <V>      - Set up DVC and tag the first version
//!   pokedata release update --version <V>    - Publish a new dataset version
//!   pokedata release notes --version <V>     - Draft release notes
//!   pokedata release lint                    - Check commits and tags

use clap::{Parser, Subcommand};
use cli::commands::{DatasetCommand, DownloadTaskCommand, ReleaseCommand};
use cli::{CliContext, GlobalArgs};
use console::style;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pokedata")]
#[command(about = "Download CVAT tasks, build and release the canonical dataset")]
#[command(version)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download a task's dataset from CVAT
    DownloadTask(DownloadTaskCommand),
    /// Dataset operations
    Dataset(DatasetCommand),
    /// DVC/git release workflow
    Release(ReleaseCommand),
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let ctx = CliContext::load(&cli.global)?;

    match cli.command {
        Commands::DownloadTask(cmd) => cmd.run(&ctx),
        Commands::Dataset(cmd) => cmd.run(&ctx),
        Commands::Release(cmd) => cmd.run(&ctx),
    }
}

fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {:#}", style("✗").red(), e);
            ExitCode::FAILURE
        }
    }
}
