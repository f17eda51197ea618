//! Configuration system for sheet layout and result vocabulary

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Main aggregation configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TallyConfig {
    #[serde(default)]
    pub sheets: SheetFilter,
    #[serde(default)]
    pub header: HeaderLocator,
    #[serde(default)]
    pub columns: ColumnLocators,
    #[serde(default)]
    pub environment: EnvironmentConfig,
    #[serde(default)]
    pub results: ResultVocabulary,
    #[serde(default)]
    pub status: StatusLabels,
}

impl TallyConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: TallyConfig = toml::from_str(content)?;
        Ok(config)
    }

    /// Validate values that would otherwise make every file fail or miscount
    pub fn validate(&self) -> Result<()> {
        if column_number(&self.header.search_col).is_none() {
            anyhow::bail!(
                "Configuration error: '{}' is not a valid header column",
                self.header.search_col
            );
        }
        if self.header.search_text.is_empty() {
            anyhow::bail!("Configuration error: header search_text must not be empty");
        }
        if self.environment.name_row == 0 {
            anyhow::bail!("Configuration error: environment name_row starts at 1");
        }

        for (role, locator) in [
            ("result", &self.columns.result),
            ("assignee", &self.columns.assignee),
            ("date", &self.columns.date),
            ("expected", &self.columns.expected),
        ] {
            if locator.keys.iter().all(|k| k.is_empty()) {
                anyhow::bail!("Configuration error: no keys configured for the {} column", role);
            }
        }

        let results = &self.results;
        if results.labels.is_empty() {
            anyhow::bail!("Configuration error: results.labels must not be empty");
        }
        for (list_name, list) in [
            ("labels", &results.labels),
            ("completed", &results.completed),
            ("executed", &results.executed),
            ("excluded", &results.excluded),
        ] {
            if list.iter().any(|label| label.is_empty()) {
                anyhow::bail!("Configuration error: empty label in results.{}", list_name);
            }
        }

        if results.completed_label == results.executed_label {
            anyhow::bail!(
                "Configuration error: completed_label and executed_label are both '{}'",
                results.completed_label
            );
        }
        for synthetic in [&results.completed_label, &results.executed_label] {
            if synthetic.is_empty() {
                anyhow::bail!("Configuration error: synthetic labels must not be empty");
            }
            if results.labels.contains(synthetic) {
                anyhow::bail!(
                    "Configuration error: '{}' is both a result label and a synthetic label",
                    synthetic
                );
            }
        }

        Ok(())
    }

    /// 1-based column searched for the header marker
    pub fn header_column(&self) -> Option<u32> {
        column_number(&self.header.search_col)
    }
}

/// Which worksheets take part in aggregation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SheetFilter {
    /// Sheet name must contain one of these (empty means every sheet)
    #[serde(default)]
    pub include: Vec<String>,
    /// Sheet name must contain none of these
    #[serde(default)]
    pub exclude: Vec<String>,
}

impl SheetFilter {
    pub fn matches(&self, sheet_name: &str) -> bool {
        let included = self.include.is_empty()
            || self.include.iter().any(|k| sheet_name.contains(k.as_str()));
        included && !self.exclude.iter().any(|k| sheet_name.contains(k.as_str()))
    }
}

/// Where the header row is searched for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeaderLocator {
    /// Column letter, e.g. "A"
    pub search_col: String,
    /// Exact cell text marking the header row
    pub search_text: String,
}

impl Default for HeaderLocator {
    fn default() -> Self {
        Self {
            search_col: "A".to_string(),
            search_text: "No.".to_string(),
        }
    }
}

/// Keyword matcher for one column role
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColumnLocator {
    /// Header text must contain one of these
    #[serde(default)]
    pub keys: Vec<String>,
    /// Header texts equal to one of these are skipped
    #[serde(default)]
    pub excludes: Vec<String>,
}

impl ColumnLocator {
    pub fn new(keys: &[&str]) -> Self {
        Self {
            keys: keys.iter().map(|k| k.to_string()).collect(),
            excludes: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnLocators {
    #[serde(default = "default_result_locator")]
    pub result: ColumnLocator,
    #[serde(default = "default_assignee_locator")]
    pub assignee: ColumnLocator,
    #[serde(default = "default_date_locator")]
    pub date: ColumnLocator,
    #[serde(default = "default_expected_locator")]
    pub expected: ColumnLocator,
}

fn default_result_locator() -> ColumnLocator {
    ColumnLocator {
        excludes: vec!["Expected Result".to_string()],
        ..ColumnLocator::new(&["Result"])
    }
}

fn default_assignee_locator() -> ColumnLocator {
    ColumnLocator::new(&["Tester"])
}

fn default_date_locator() -> ColumnLocator {
    ColumnLocator::new(&["Date"])
}

fn default_expected_locator() -> ColumnLocator {
    ColumnLocator::new(&["Expected"])
}

impl Default for ColumnLocators {
    fn default() -> Self {
        Self {
            result: default_result_locator(),
            assignee: default_assignee_locator(),
            date: default_date_locator(),
            expected: default_expected_locator(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentConfig {
    /// 1-based row holding the environment name above each result column
    pub name_row: u32,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self { name_row: 1 }
    }
}

/// Result labels and the synthetic counters derived from them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResultVocabulary {
    /// Literal results counted verbatim
    pub labels: Vec<String>,
    /// Results rolled into the completed counter
    pub completed: Vec<String>,
    /// Results rolled into the executed counter
    pub executed: Vec<String>,
    /// Results removed from the available case count
    pub excluded: Vec<String>,
    pub completed_label: String,
    pub executed_label: String,
    /// Label shown for text summaries of cases without a result
    pub not_run_label: String,
    /// Assignee substituted when a row has a result and a date but no name
    pub unassigned_name: String,
}

impl Default for ResultVocabulary {
    fn default() -> Self {
        let owned = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        Self {
            labels: owned(&["Pass", "Fail", "Blocked", "N/A"]),
            completed: owned(&["Pass"]),
            executed: owned(&["Pass", "Fail", "Blocked"]),
            excluded: owned(&["N/A"]),
            completed_label: "completed".to_string(),
            executed_label: "executed".to_string(),
            not_run_label: "Not Run".to_string(),
            unassigned_name: "(unassigned)".to_string(),
        }
    }
}

impl ResultVocabulary {
    /// Labels seeded into every date bucket, synthetic counters last
    pub fn seeded_labels(&self) -> impl Iterator<Item = &str> {
        self.labels
            .iter()
            .map(String::as_str)
            .chain([self.completed_label.as_str(), self.executed_label.as_str()])
    }

    pub fn completed_set(&self) -> HashSet<&str> {
        self.completed.iter().map(String::as_str).collect()
    }

    pub fn executed_set(&self) -> HashSet<&str> {
        self.executed.iter().map(String::as_str).collect()
    }
}

/// Display names for each run status
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusLabels {
    pub not_started: String,
    pub in_progress: String,
    pub completed: String,
    pub unknown: String,
}

impl Default for StatusLabels {
    fn default() -> Self {
        Self {
            not_started: "Not started".to_string(),
            in_progress: "In progress".to_string(),
            completed: "Completed".to_string(),
            unknown: "Unknown".to_string(),
        }
    }
}

/// Convert a column letter ("A", "AB") to its 1-based number
pub fn column_number(letters: &str) -> Option<u32> {
    if letters.is_empty() {
        return None;
    }
    letters.chars().try_fold(0u32, |acc, c| {
        let c = c.to_ascii_uppercase();
        if !c.is_ascii_uppercase() {
            return None;
        }
        acc.checked_mul(26)?.checked_add(c as u32 - 'A' as u32 + 1)
    })
}
