//! imgsort CLI - sort image collections by size, quality and shape.
//!
//! Every image under the input directory is classified from its header
//! metadata (dimensions, DPI, modification time) and moved or copied into a
//! matching folder of the destination tree.
//!
//! # Usage
//!
//! ```bash
//! # Sort the configured input directory
//! imgsort sort
//!
//! # Sort a specific directory, copying instead of moving
//! imgsort sort ./photos -d ./sorted --transfer copy --report run.json
//!
//! # View configuration
//! imgsort config show
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

mod cli;
mod logging;

/// imgsort - sort image collections by size, quality and shape.
#[derive(Parser, Debug)]
#[command(name = "imgsort")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    /// Config file to use instead of the default location (.toml or .json)
    #[arg(short, long, global = true, env = "IMGSORT_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Classify images and move them into the sorted tree
    Sort(cli::sort::SortArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // Logging isn't initialized yet, so use eprintln for config warnings.
    let loaded = match &cli.config {
        Some(path) => imgsort_core::Config::load_from(path),
        None => imgsort_core::Config::load(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default logging settings. Check your config file with `imgsort config path`."
            );
            imgsort_core::Config::default()
        }
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("imgsort v{}", imgsort_core::VERSION);

    match cli.command {
        Commands::Sort(args) => cli::sort::execute(args, cli.config).await,
        Commands::Config(args) => {
            cli::config::execute(args, cli.config).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
