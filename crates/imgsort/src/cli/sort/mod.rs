//! The `imgsort sort` command.

mod batch;
mod setup;
pub mod types;

pub use types::{SizeRuleArg, Transfer};

use clap::Args;
use std::path::PathBuf;
use std::process::ExitCode;

use batch::{exit_status, run_sort};
use setup::build_config;

/// Arguments for the `sort` command.
#[derive(Args, Debug, Default)]
pub struct SortArgs {
    /// Directory to sort (defaults to `paths.input_dir` from the config)
    pub input: Option<PathBuf>,

    /// Root of the sorted tree (defaults to `paths.destination_dir`)
    #[arg(short, long)]
    pub destination: Option<PathBuf>,

    /// Number of parallel workers
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Files per dispatch batch
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Move or copy files into the destination
    #[arg(short, long, value_enum)]
    pub transfer: Option<Transfer>,

    /// Mirror the source sub-directories under each category folder
    #[arg(long)]
    pub keep_structure: bool,

    /// Do not split categories into Landscape/Portrait/Square
    #[arg(long)]
    pub no_shape: bool,

    /// Disable the Best Quality override
    #[arg(long)]
    pub no_quality: bool,

    /// Which dimension the size thresholds apply to
    #[arg(long, value_enum)]
    pub size_rule: Option<SizeRuleArg>,

    /// Write the run report to this file (.json or .jsonl)
    #[arg(short, long)]
    pub report: Option<PathBuf>,

    /// Append one JSON line per processed file to this file
    #[arg(long)]
    pub manifest: Option<PathBuf>,

    /// Print the run report as JSON on stdout
    #[arg(long)]
    pub json: bool,

    /// Hide the progress bar
    #[arg(long)]
    pub no_progress: bool,
}

/// Execute the sort command.
pub async fn execute(args: SortArgs, config_path: Option<PathBuf>) -> anyhow::Result<ExitCode> {
    let config = build_config(&args, config_path.as_deref())?;
    let report = run_sort(config, &args).await?;
    Ok(ExitCode::from(exit_status(&report)))
}
