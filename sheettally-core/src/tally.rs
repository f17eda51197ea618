//! Counting folds over extracted result rows

use crate::config::ResultVocabulary;
use crate::extract::ResultRow;
use std::collections::BTreeMap;

/// Reserved bucket key for rows without a date
pub const NO_DATE_KEY: &str = "no_date";

/// label -> count
pub type LabelCounts = BTreeMap<String, u64>;

/// date -> label -> count, every label present for every date
pub type DailyCounts = BTreeMap<String, LabelCounts>;

/// date -> assignee -> count
pub type NameCounts = BTreeMap<String, BTreeMap<String, u64>>;

/// Per-date result counts plus the bucket for undated rows
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DailyTally {
    pub daily: DailyCounts,
    pub no_date: Option<LabelCounts>,
}

/// Counter map with every configured label and both synthetic counters at 0
fn seeded(vocabulary: &ResultVocabulary) -> LabelCounts {
    vocabulary
        .seeded_labels()
        .map(|label| (label.to_string(), 0))
        .collect()
}

/// Count results per date.
///
/// The literal label, the completed counter and the executed counter are
/// incremented independently, so one row may count in all three. Rows without
/// a date are folded into the `no_date` bucket instead of being dropped.
pub fn count_daily(rows: &[ResultRow], vocabulary: &ResultVocabulary) -> DailyTally {
    let completed = vocabulary.completed_set();
    let executed = vocabulary.executed_set();
    let mut tally = DailyTally::default();

    for row in rows {
        let counts = match row.date() {
            Some(date) => tally
                .daily
                .entry(date.to_string())
                .or_insert_with(|| seeded(vocabulary)),
            None => tally.no_date.get_or_insert_with(|| seeded(vocabulary)),
        };

        let Some(result) = row.result() else {
            continue;
        };
        if vocabulary.labels.iter().any(|label| label == result) {
            *counts.entry(result.to_string()).or_insert(0) += 1;
        }
        if completed.contains(result) {
            *counts.entry(vocabulary.completed_label.clone()).or_insert(0) += 1;
        }
        if executed.contains(result) {
            *counts.entry(vocabulary.executed_label.clone()).or_insert(0) += 1;
        }
    }

    tally
}

/// Count filled-in results per date and assignee, ignoring undated rows
pub fn count_by_name(rows: &[ResultRow]) -> NameCounts {
    let mut counts = NameCounts::new();

    for row in rows {
        let (Some(date), Some(_)) = (row.date(), row.result()) else {
            continue;
        };
        let name = row.assignee().unwrap_or_default();
        *counts
            .entry(date.to_string())
            .or_default()
            .entry(name.to_string())
            .or_insert(0) += 1;
    }

    counts
}

/// Sum every date and the undated bucket into one map without the synthetic counters
pub fn total_across_dates(tally: &DailyTally, vocabulary: &ResultVocabulary) -> LabelCounts {
    let mut total = LabelCounts::new();

    for counts in tally.daily.values().chain(tally.no_date.iter()) {
        for (label, count) in counts {
            *total.entry(label.clone()).or_insert(0) += count;
        }
    }

    total.remove(&vocabulary.completed_label);
    total.remove(&vocabulary.executed_label);
    total
}

/// Number of rows whose result is one of `targets`
pub fn count_matching(rows: &[ResultRow], targets: &[String]) -> u64 {
    rows.iter()
        .filter(|row| row.result().is_some_and(|r| targets.iter().any(|t| t == r)))
        .count() as u64
}

/// Sum of the given labels in a count map, missing labels count as 0
pub fn sum_labels(counts: &LabelCounts, labels: &[String]) -> u64 {
    labels.iter().filter_map(|label| counts.get(label)).sum()
}
