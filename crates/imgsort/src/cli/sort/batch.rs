//! Batch run: progress bar, Ctrl-C handling, manifest, report and summary.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use imgsort_core::output::write_report_file;
use imgsort_core::{CancelSignal, Category, Config, ImageSorter, OutputWriter, RunReport, RunState};

use super::SortArgs;

type ManifestWriter = Arc<Mutex<OutputWriter<BufWriter<File>>>>;

/// What a Ctrl-C should do at this point of the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Interrupt {
    /// Stop dispatching and let in-flight files finish
    Drain,
    /// Cancellation was already requested: exit now
    Abort,
}

fn on_interrupt(cancel: &CancelSignal) -> Interrupt {
    if cancel.is_cancelled() {
        Interrupt::Abort
    } else {
        cancel.cancel();
        Interrupt::Drain
    }
}

/// Sort the configured input tree and report the outcome.
pub async fn run_sort(config: Config, args: &SortArgs) -> anyhow::Result<RunReport> {
    let sorter = ImageSorter::new(config)?;
    let prepared = sorter.prepare()?;

    if prepared.files.is_empty() {
        tracing::warn!("No supported image files found in {:?}", prepared.input_root);
    }

    let manifest = match &args.manifest {
        Some(path) => Some(open_manifest(path)?),
        None => None,
    };

    let cancel = CancelSignal::new();
    let ctrl_c = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            while tokio::signal::ctrl_c().await.is_ok() {
                if on_interrupt(&cancel) == Interrupt::Abort {
                    eprintln!("Interrupted again, aborting.");
                    std::process::exit(130);
                }
                tracing::warn!("Finishing in-flight files; press Ctrl-C again to quit");
            }
        })
    };

    let progress = create_progress_bar(prepared.files.len() as u64, args.no_progress);
    let on_item = {
        let progress = progress.clone();
        let manifest = manifest.clone();
        let start = Instant::now();
        move |item: &imgsort_core::WorkItem| {
            progress.inc(1);
            let elapsed = start.elapsed().as_secs_f64();
            if elapsed > 0.0 {
                progress.set_message(format!("{:.1} img/sec", progress.position() as f64 / elapsed));
            }
            if let Some(manifest) = &manifest {
                if let Ok(mut writer) = manifest.lock() {
                    if let Err(e) = writer.write_item(item) {
                        tracing::warn!("Failed to write manifest entry: {e}");
                    }
                }
            }
        }
    };

    let report = sorter.execute(prepared, cancel, on_item).await;
    ctrl_c.abort();
    progress.finish_and_clear();

    if let Some(manifest) = &manifest {
        if let Ok(mut writer) = manifest.lock() {
            writer.flush()?;
        }
    }
    if let Some(path) = &args.report {
        write_report_file(path, &report)?;
        tracing::info!("Report written to {:?}", path);
    }
    if args.json {
        println!("{}", imgsort_core::output::to_json(&report, true)?);
    }

    print_summary(&report);
    Ok(report)
}

fn open_manifest(path: &Path) -> anyhow::Result<ManifestWriter> {
    let writer = OutputWriter::create(path, false)?;
    Ok(Arc::new(Mutex::new(writer)))
}

/// 0 for a clean run, 1 when any file failed or the run was cancelled.
pub fn exit_status(report: &RunReport) -> u8 {
    if report.is_clean() {
        0
    } else {
        1
    }
}

/// Create a progress bar for the run.
fn create_progress_bar(total: u64, hidden: bool) -> indicatif::ProgressBar {
    use indicatif::{ProgressBar, ProgressStyle};

    if hidden {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(total);
    let style = ProgressStyle::default_bar()
        .template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("##-");
    pb.set_style(style);
    pb.set_message("starting...");
    pb
}

/// Print a formatted summary table after the run.
fn print_summary(report: &RunReport) {
    eprintln!();
    eprintln!("  ====================================");
    eprintln!("               Summary");
    eprintln!("  ====================================");
    for category in Category::ALL {
        if let Some(count) = report.per_category.get(&category) {
            eprintln!("    {:<14}{:>8}", format!("{}:", category_label(category)), count);
        }
    }
    eprintln!("  ------------------------------------");
    eprintln!("    Succeeded:    {:>8}", report.succeeded);
    if report.failed > 0 {
        eprintln!("    Failed:       {:>8}", report.failed);
    }
    if report.not_processed > 0 {
        eprintln!("    Not processed:{:>8}", report.not_processed);
    }
    eprintln!("    Total:        {:>8}", report.total);
    eprintln!("    Duration:     {:>7.1}s", report.elapsed.as_secs_f64());
    eprintln!("    Rate:         {:>7.1} img/sec", report.files_per_second());
    if report.state == RunState::Cancelled {
        eprintln!("    Run was cancelled before all files were sorted");
    }
    eprintln!("  ====================================");

    if !report.errors.is_empty() {
        eprintln!();
        eprintln!("  Failures:");
        for failure in report.errors.iter().take(20) {
            eprintln!("    {} - {}", failure.path.display(), failure.reason);
        }
        if report.errors.len() > 20 {
            eprintln!("    ... and {} more", report.errors.len() - 20);
        }
    }
}

fn category_label(category: Category) -> &'static str {
    match category {
        Category::Small => "Small",
        Category::Standard => "Standard",
        Category::Large => "Large",
        Category::XLarge => "XLarge",
        Category::BestQuality => "Best Quality",
        Category::Error => "Errors",
    }
}
