//! Structural errors and soft warnings raised while aggregating a workbook

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Layout problem that makes a whole file unusable.
///
/// Returned in place of an aggregate; never partially applied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StructuralError {
    #[error("no worksheet matches the configured sheet keywords")]
    SheetNotFound,
    #[error("header row not found in sheet '{sheet}'")]
    HeaderNotFound { sheet: String },
    #[error(
        "result/assignee/date columns do not form complete sets in sheet '{sheet}' \
         ({results} result, {assignees} assignee, {dates} date)"
    )]
    InconsistentResultSet {
        sheet: String,
        results: usize,
        assignees: usize,
        dates: usize,
    },
}

impl StructuralError {
    /// Stable code used in serialized output
    pub fn kind(&self) -> &'static str {
        match self {
            StructuralError::SheetNotFound => "sheet_not_found",
            StructuralError::HeaderNotFound { .. } => "header_not_found",
            StructuralError::InconsistentResultSet { .. } => "inconsistent_result_set",
        }
    }

    pub fn to_issue(&self) -> Issue {
        Issue::new(self.kind(), self.to_string())
    }
}

/// Non-fatal signal attached to an otherwise valid aggregate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
    /// No test cases were counted at all
    NoData,
    /// More results were filled in than there are available cases
    InconsistentCount,
}

impl WarningKind {
    pub fn code(&self) -> &'static str {
        match self {
            WarningKind::NoData => "no_data",
            WarningKind::InconsistentCount => "inconsistent_count",
        }
    }
}

/// Serialized `{type, message}` pair for errors and warnings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
}

impl Issue {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
        }
    }

    pub fn warning(kind: WarningKind, message: impl Into<String>) -> Self {
        Self::new(kind.code(), message)
    }

    pub fn is(&self, kind: WarningKind) -> bool {
        self.kind == kind.code()
    }
}
