//! Row extraction for one environment's column triple

use crate::locate::ColumnTriple;
use crate::reader::TabularSheet;

/// One test case outcome as read from the sheet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultRow {
    pub result: Option<String>,
    pub assignee: Option<String>,
    /// `YYYY-MM-DD` for date cells, raw text otherwise
    pub date: Option<String>,
}

impl ResultRow {
    pub fn new(result: Option<&str>, assignee: Option<&str>, date: Option<&str>) -> Self {
        let owned = |v: Option<&str>| v.filter(|s| !s.is_empty()).map(str::to_string);
        Self {
            result: owned(result),
            assignee: owned(assignee),
            date: owned(date),
        }
    }

    pub fn result(&self) -> Option<&str> {
        self.result.as_deref()
    }

    pub fn assignee(&self) -> Option<&str> {
        self.assignee.as_deref()
    }

    pub fn date(&self) -> Option<&str> {
        self.date.as_deref()
    }
}

/// Read every row below `header_row` for the given triple.
///
/// A row with a result and a date but nobody assigned is credited to
/// `unassigned_name`.
pub fn extract_rows<S: TabularSheet + ?Sized>(
    sheet: &S,
    triple: &ColumnTriple,
    header_row: u32,
    unassigned_name: &str,
) -> Vec<ResultRow> {
    sheet
        .column_block(&triple.columns(), header_row)
        .into_iter()
        .map(|cells| {
            let mut values = cells.into_iter().map(|c| c.as_text());
            let result = values.next().flatten();
            let mut assignee = values.next().flatten();
            let date = values.next().flatten();

            if assignee.is_none() && result.is_some() && date.is_some() {
                assignee = Some(unassigned_name.to_string());
            }

            ResultRow {
                result,
                assignee,
                date,
            }
        })
        .collect()
}
