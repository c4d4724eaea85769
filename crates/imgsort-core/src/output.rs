//! Report and manifest writers.
//!
//! A run produces one `RunReport` (written as a JSON document) and, when
//! requested, a manifest of every processed `WorkItem` (one JSON object per
//! line, appended as files finish).

use serde::Serialize;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::types::{RunReport, WorkItem};

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Single JSON document
    Json,
    /// One JSON object per line (newline-delimited JSON)
    JsonLines,
}

impl OutputFormat {
    /// Parse format from string (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(Self::Json),
            "jsonl" | "jsonlines" | "ndjson" => Some(Self::JsonLines),
            _ => None,
        }
    }

    /// Pick a format from a file extension, defaulting to JSON.
    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::parse)
            .unwrap_or(Self::Json)
    }
}

/// Serializes reports and work items to JSON or JSONL.
pub struct OutputWriter<W: Write> {
    writer: W,
    format: OutputFormat,
    pretty: bool,
    items_written: usize,
}

impl<W: Write> OutputWriter<W> {
    /// `pretty` only affects JSON; JSONL is always one object per line.
    pub fn new(writer: W, format: OutputFormat, pretty: bool) -> Self {
        Self {
            writer,
            format,
            pretty,
            items_written: 0,
        }
    }

    fn write_value<T: Serialize>(&mut self, value: &T) -> io::Result<()> {
        if self.pretty && self.format == OutputFormat::Json {
            serde_json::to_writer_pretty(&mut self.writer, value).map_err(io::Error::other)?;
        } else {
            serde_json::to_writer(&mut self.writer, value).map_err(io::Error::other)?;
        }
        writeln!(self.writer)
    }

    /// Write the run report.
    ///
    /// In JSONL form the report is flattened to one line per failure followed
    /// by a summary line, which is easier to grep in large runs.
    pub fn write_report(&mut self, report: &RunReport) -> io::Result<()> {
        match self.format {
            OutputFormat::Json => self.write_value(report)?,
            OutputFormat::JsonLines => {
                for failure in &report.errors {
                    self.write_value(failure)?;
                }
                let summary = ReportSummary::from(report);
                self.write_value(&summary)?;
            }
        }
        self.items_written += 1;
        Ok(())
    }

    /// Append one finished work item.
    pub fn write_item(&mut self, item: &WorkItem) -> io::Result<()> {
        self.write_value(item)?;
        self.items_written += 1;
        Ok(())
    }

    /// Get the number of items written.
    pub fn items_written(&self) -> usize {
        self.items_written
    }

    /// Flush the underlying writer.
    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

impl OutputWriter<BufWriter<File>> {
    /// Create (or truncate) `path` and write to it in the format its extension
    /// suggests.
    pub fn create(path: &Path, pretty: bool) -> io::Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = File::create(path)?;
        Ok(Self::new(
            BufWriter::new(file),
            OutputFormat::from_path(path),
            pretty,
        ))
    }
}

#[derive(Serialize)]
struct ReportSummary<'a> {
    total: usize,
    succeeded: usize,
    failed: usize,
    not_processed: usize,
    per_category: &'a std::collections::BTreeMap<crate::types::Category, usize>,
    state: crate::types::RunState,
    elapsed: f64,
}

impl<'a> From<&'a RunReport> for ReportSummary<'a> {
    fn from(report: &'a RunReport) -> Self {
        Self {
            total: report.total,
            succeeded: report.succeeded,
            failed: report.failed,
            not_processed: report.not_processed,
            per_category: &report.per_category,
            state: report.state,
            elapsed: report.elapsed.as_secs_f64(),
        }
    }
}

/// Write `report` to `path` as a single document.
pub fn write_report_file(path: &Path, report: &RunReport) -> io::Result<()> {
    let mut writer = OutputWriter::create(path, true)?;
    writer.write_report(report)?;
    writer.flush()
}

/// Convenience function to serialize an item to a JSON string.
pub fn to_json<T: Serialize>(item: &T, pretty: bool) -> Result<String, serde_json::Error> {
    if pretty {
        serde_json::to_string_pretty(item)
    } else {
        serde_json::to_string(item)
    }
}
