//! Batch processing of many workbooks with file metadata attached

use crate::Aggregator;
use crate::aggregate::{Outcome, Stats};
use crate::tally::LabelCounts;
use crate::config::TallyConfig;
use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use rayon::prelude::*;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Timestamp layout used for `last_loaded` / `last_updated`
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const SPREADSHEET_EXTENSIONS: [&str; 4] = ["xlsx", "xlsm", "xls", "ods"];

/// Browser-style duplicate download suffix: `report (2).xlsx`
static DUPLICATE_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r" \(\d+\)(\.[^.]+)$").expect("valid regex"));

/// Aggregate outcome of one file plus identifying metadata.
///
/// The metadata is attached here and never interpreted by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileReport {
    #[serde(flatten)]
    pub outcome: Outcome,
    pub file: String,
    pub filepath: String,
    pub selector_label: String,
    pub last_loaded: String,
    pub last_updated: String,
    pub source: String,
}

impl FileReport {
    /// Wrap an outcome with metadata for the file at `path`; `index` is 1-based
    pub fn new(outcome: Outcome, path: &Path, index: usize) -> Result<Self> {
        let file = display_file_name(path);
        let modified = fs::metadata(path)
            .and_then(|m| m.modified())
            .with_context(|| format!("Failed to read modification time of {}", path.display()))?;

        Ok(Self {
            outcome,
            selector_label: format!("{}: {}", index, file),
            file,
            filepath: path.display().to_string(),
            last_loaded: Local::now().format(TIMESTAMP_FORMAT).to_string(),
            last_updated: DateTime::<Local>::from(modified)
                .format(TIMESTAMP_FORMAT)
                .to_string(),
            source: "local".to_string(),
        })
    }

    pub fn start_date(&self) -> Option<&str> {
        self.outcome.as_result()?.run.start_date.as_deref()
    }

    pub fn last_update(&self) -> Option<&str> {
        self.outcome.as_result()?.run.last_update.as_deref()
    }
}

/// A file that could not be read at all
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileFailure {
    pub filepath: String,
    pub message: String,
}

/// Ordering for report listings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    File,
    StartDate,
    LastUpdate,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub reports: Vec<FileReport>,
    pub failures: Vec<FileFailure>,
}

/// Batch-wide counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub files: usize,
    pub errors: usize,
    pub warnings: usize,
    pub failures: usize,
    /// Summed over files without structural errors
    pub stats: Stats,
    /// Result breakdown summed over the same files
    pub total: LabelCounts,
}

impl BatchReport {
    pub fn summary(&self) -> BatchSummary {
        let mut summary = BatchSummary {
            files: self.reports.len(),
            failures: self.failures.len(),
            ..BatchSummary::default()
        };

        for report in &self.reports {
            match report.outcome.as_result() {
                Some(result) => {
                    if result.warning.is_some() {
                        summary.warnings += 1;
                    }
                    summary.stats.accumulate(&result.stats);
                    for (label, count) in &result.total {
                        *summary.total.entry(label.clone()).or_insert(0) += count;
                    }
                }
                None => summary.errors += 1,
            }
        }

        summary
    }

    /// Sort reports; files without the date sort first
    pub fn sort_by(&mut self, key: SortKey) {
        match key {
            SortKey::File => self.reports.sort_by(|a, b| a.file.cmp(&b.file)),
            SortKey::StartDate => self.reports.sort_by(|a, b| a.start_date().cmp(&b.start_date())),
            SortKey::LastUpdate => self
                .reports
                .sort_by(|a, b| a.last_update().cmp(&b.last_update())),
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.failures.is_empty() || self.reports.iter().any(|r| r.outcome.error().is_some())
    }
}

/// File name shown to users, without a trailing ` (N)` duplicate marker
pub fn display_file_name(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    DUPLICATE_SUFFIX.replace(&name, "$1").into_owned()
}

fn is_spreadsheet(path: &Path) -> bool {
    let is_lock_file = path
        .file_name()
        .is_some_and(|n| n.to_string_lossy().starts_with("~$"));
    let known_extension = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| SPREADSHEET_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()));
    known_extension && !is_lock_file
}

/// Expand input paths into spreadsheet files.
///
/// Directories are searched recursively; other non-spreadsheet paths are ignored.
pub fn collect_input_files(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for input in inputs {
        if input.is_dir() {
            collect_from_dir(input, &mut files)?;
        } else if is_spreadsheet(input) {
            files.push(input.clone());
        } else {
            tracing::debug!("Ignoring {}", input.display());
        }
    }
    files.sort();
    files.dedup();
    Ok(files)
}

fn collect_from_dir(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    let entries =
        fs::read_dir(dir).with_context(|| format!("Failed to read directory {}", dir.display()))?;
    for entry in entries {
        let path = entry?.path();
        if path.is_dir() {
            collect_from_dir(&path, files)?;
        } else if is_spreadsheet(&path) {
            files.push(path);
        }
    }
    Ok(())
}

/// Aggregate every file in parallel, keeping input order in the report
pub fn process_files(paths: &[PathBuf], config: &TallyConfig) -> BatchReport {
    let aggregator = Aggregator::with_config(config.clone());

    let results: Vec<Result<FileReport>> = paths
        .par_iter()
        .enumerate()
        .map(|(idx, path)| {
            let outcome = aggregator
                .aggregate_file(path)
                .with_context(|| format!("Failed to aggregate file: {}", path.display()))?;
            FileReport::new(outcome, path, idx + 1)
        })
        .collect();

    let mut batch = BatchReport::default();
    for (path, result) in paths.iter().zip(results) {
        match result {
            Ok(report) => batch.reports.push(report),
            Err(err) => {
                tracing::warn!("{:#}", err);
                batch.failures.push(FileFailure {
                    filepath: path.display().to_string(),
                    message: format!("{:#}", err),
                });
            }
        }
    }

    tracing::info!(
        "Processed {} file(s), {} unreadable",
        batch.reports.len(),
        batch.failures.len()
    );
    batch
}
