//! Workbook-level aggregation: rollups, statistics and run status

use crate::config::{StatusLabels, TallyConfig};
use crate::error::{Issue, StructuralError, WarningKind};
use crate::reader::TabularSheet;
use crate::sheet::{EnvironmentCounts, SheetCounts, merge_daily, process_sheet};
use crate::tally::{self, DailyCounts, LabelCounts, NameCounts};
use serde::{Deserialize, Serialize};

/// Case counts derived from one workbook
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    /// Σ environments × cases over all sheets
    pub all: i64,
    /// Rows whose result is an excluded result
    pub excluded: i64,
    /// `all - excluded`
    pub available: i64,
    /// Rows with a counted result
    pub filled: i64,
    /// Rows with a completed result
    pub completed: i64,
    /// `max(0, available - filled)`
    pub incompleted: i64,
}

impl Stats {
    pub fn new(all: i64, excluded: i64, filled: i64, completed: i64) -> Self {
        let available = all - excluded;
        Self {
            all,
            excluded,
            available,
            filled,
            completed,
            incompleted: (available - filled).max(0),
        }
    }

    /// completed / available, `None` when nothing is available
    pub fn completion_rate(&self) -> Option<f64> {
        ratio(self.completed, self.available)
    }

    /// filled / available, `None` when nothing is available
    pub fn execution_rate(&self) -> Option<f64> {
        ratio(self.filled, self.available)
    }

    /// Add another file's figures field by field.
    ///
    /// `incompleted` is summed, never re-derived from the sums.
    pub fn accumulate(&mut self, other: &Stats) {
        self.all += other.all;
        self.excluded += other.excluded;
        self.available += other.available;
        self.filled += other.filled;
        self.completed += other.completed;
        self.incompleted += other.incompleted;
    }
}

fn ratio(part: i64, whole: i64) -> Option<f64> {
    (whole > 0).then(|| part as f64 / whole as f64)
}

/// Percentage with one decimal, or "-" when there is no rate
pub fn rate_text(rate: Option<f64>) -> String {
    match rate {
        Some(rate) => format!("{:.1}%", rate * 100.0),
        None => "-".to_string(),
    }
}

/// Coarse progress of one file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    NotStarted,
    InProgress,
    Completed,
    Unknown,
}

impl RunStatus {
    pub fn from_stats(stats: &Stats) -> Self {
        if stats.filled == 0 {
            RunStatus::NotStarted
        } else if stats.completed == stats.available && stats.incompleted == 0 {
            RunStatus::Completed
        } else if stats.filled > 0 {
            RunStatus::InProgress
        } else {
            RunStatus::Unknown
        }
    }

    pub fn display_name<'a>(&self, labels: &'a StatusLabels) -> &'a str {
        match self {
            RunStatus::NotStarted => &labels.not_started,
            RunStatus::InProgress => &labels.in_progress,
            RunStatus::Completed => &labels.completed,
            RunStatus::Unknown => &labels.unknown,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunInfo {
    pub status: RunStatus,
    pub start_date: Option<String>,
    /// Only set while running or once completed
    pub last_update: Option<String>,
}

/// Summary of one workbook
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateResult {
    pub stats: Stats,
    pub run: RunInfo,
    pub daily: DailyCounts,
    pub total: LabelCounts,
    pub by_name: NameCounts,
    pub by_env: EnvironmentCounts,
    pub count_by_sheet: Vec<SheetCounts>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<Issue>,
}

/// Result of aggregating one file: a summary or the structural error that stopped it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Outcome {
    Aggregated(Box<AggregateResult>),
    Failed { error: Issue },
}

impl Outcome {
    pub fn as_result(&self) -> Option<&AggregateResult> {
        match self {
            Outcome::Aggregated(result) => Some(result.as_ref()),
            Outcome::Failed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&Issue> {
        match self {
            Outcome::Aggregated(_) => None,
            Outcome::Failed { error } => Some(error),
        }
    }

    pub fn warning(&self) -> Option<&Issue> {
        self.as_result().and_then(|r| r.warning.as_ref())
    }
}

impl From<Result<AggregateResult, StructuralError>> for Outcome {
    fn from(result: Result<AggregateResult, StructuralError>) -> Self {
        match result {
            Ok(result) => Outcome::Aggregated(Box::new(result)),
            Err(err) => Outcome::Failed {
                error: err.to_issue(),
            },
        }
    }
}

/// Aggregate every worksheet accepted by the sheet filter.
///
/// The first structural error stops the whole file; no partial result is built.
pub fn aggregate_sheets<'a, S, I>(sheets: I, config: &TallyConfig) -> Result<AggregateResult, StructuralError>
where
    S: TabularSheet + ?Sized + 'a,
    I: IntoIterator<Item = &'a S>,
{
    let mut rows = Vec::new();
    let mut by_env = EnvironmentCounts::new();
    let mut count_by_sheet = Vec::new();

    for sheet in sheets {
        if !config.sheets.matches(sheet.name()) {
            tracing::debug!("Skipping sheet '{}'", sheet.name());
            continue;
        }
        let summary = process_sheet(sheet, config)?;
        rows.extend(summary.rows);
        for (name, daily) in summary.by_env {
            merge_daily(by_env.entry(name).or_default(), daily);
        }
        count_by_sheet.push(summary.counts);
    }

    if count_by_sheet.is_empty() {
        return Err(StructuralError::SheetNotFound);
    }

    let vocabulary = &config.results;
    let tally = tally::count_daily(&rows, vocabulary);
    let by_name = tally::count_by_name(&rows);
    let total = tally::total_across_dates(&tally, vocabulary);

    let all: u64 = count_by_sheet
        .iter()
        .map(|c| c.env_count * c.case_count)
        .sum();
    let excluded = tally::count_matching(&rows, &vocabulary.excluded);
    let filled: u64 = total.values().sum();
    let completed = tally::sum_labels(&total, &vocabulary.completed);
    let stats = Stats::new(all as i64, excluded as i64, filled as i64, completed as i64);

    let status = RunStatus::from_stats(&stats);
    let start_date = tally.daily.keys().next().cloned();
    let last_update = match status {
        RunStatus::Completed | RunStatus::InProgress => tally.daily.keys().next_back().cloned(),
        RunStatus::NotStarted | RunStatus::Unknown => None,
    };

    let warning = check_counts(&stats);
    if let Some(warning) = &warning {
        tracing::warn!("{}", warning.message);
    }

    Ok(AggregateResult {
        stats,
        run: RunInfo {
            status,
            start_date,
            last_update,
        },
        daily: tally.daily,
        total,
        by_name,
        by_env,
        count_by_sheet,
        warning,
    })
}

fn check_counts(stats: &Stats) -> Option<Issue> {
    if stats.all == 0 {
        Some(Issue::warning(
            WarningKind::NoData,
            "no test cases found in the expected-result columns",
        ))
    } else if stats.filled > stats.available {
        Some(Issue::warning(
            WarningKind::InconsistentCount,
            format!(
                "{} results filled in but only {} cases available",
                stats.filled, stats.available
            ),
        ))
    } else {
        None
    }
}

/// One-line result breakdown, e.g. `Pass:3, Fail:1, Not Run:2`.
///
/// Labels follow the configured order; zero counts are left out.
pub fn results_summary_text(total: &LabelCounts, incompleted: i64, config: &TallyConfig) -> String {
    let mut items: Vec<String> = config
        .results
        .labels
        .iter()
        .filter_map(|label| {
            let count = total.get(label).copied().unwrap_or(0);
            (count > 0).then(|| format!("{}:{}", label, count))
        })
        .collect();
    if incompleted > 0 {
        items.push(format!("{}:{}", config.results.not_run_label, incompleted));
    }
    items.join(", ")
}
