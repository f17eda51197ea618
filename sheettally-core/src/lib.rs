//! sheettally-core: test progress aggregation for Excel/ODS tracking sheets
//!
//! Finds the header row and the repeating result/assignee/date column sets of
//! each worksheet, then folds every row into daily, per-assignee,
//! per-environment and total counts with run statistics.

pub mod aggregate;
pub mod batch;
pub mod config;
pub mod error;
pub mod extract;
pub mod locate;
pub mod manifest;
pub mod reader;
pub mod sheet;
pub mod tally;

use anyhow::Result;
use std::path::Path;

pub use aggregate::{AggregateResult, Outcome, RunInfo, RunStatus, Stats};
pub use batch::{BatchReport, FileReport};
pub use config::TallyConfig;
pub use error::{Issue, StructuralError, WarningKind};
pub use manifest::Manifest;

/// Main aggregation interface
pub struct Aggregator {
    config: TallyConfig,
}

impl Aggregator {
    /// Create a new aggregator with default configuration
    pub fn new() -> Self {
        Self::with_config(TallyConfig::default())
    }

    /// Create a new aggregator with custom configuration
    pub fn with_config(config: TallyConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TallyConfig {
        &self.config
    }

    /// Aggregate a spreadsheet file.
    ///
    /// Only an unreadable file is an `Err`; layout problems come back as
    /// `Outcome::Failed`.
    pub fn aggregate_file<P: AsRef<Path>>(&self, path: P) -> Result<Outcome> {
        let path = path.as_ref();
        let workbook = reader::read_workbook(path)?;
        let outcome = Outcome::from(aggregate::aggregate_sheets(&workbook.sheets, &self.config));

        match &outcome {
            Outcome::Aggregated(result) => tracing::info!(
                "{}: {} sheet(s), {}/{} filled",
                path.display(),
                result.count_by_sheet.len(),
                result.stats.filled,
                result.stats.available
            ),
            Outcome::Failed { error } => {
                tracing::warn!("{}: {} ({})", path.display(), error.message, error.kind)
            }
        }

        Ok(outcome)
    }
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new()
    }
}
