//! Per-worksheet processing: header, environments, rows and case count

use crate::config::{ColumnLocator, TallyConfig};
use crate::error::StructuralError;
use crate::extract::{ResultRow, extract_rows};
use crate::locate::{ColumnTriple, find_columns, resolve_triples};
use crate::reader::{CellValue, TabularSheet};
use crate::tally::{self, DailyCounts};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// environment name -> per-date counts
pub type EnvironmentCounts = BTreeMap<String, DailyCounts>;

/// Size figures for one worksheet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetCounts {
    pub sheet_name: String,
    /// Number of result/assignee/date sets found
    pub env_count: u64,
    /// Rows with something in an expected-result column
    pub case_count: u64,
}

/// Everything one worksheet contributes to the workbook aggregate
#[derive(Debug, Clone, PartialEq)]
pub struct SheetSummary {
    pub rows: Vec<ResultRow>,
    pub by_env: EnvironmentCounts,
    pub counts: SheetCounts,
}

/// First row whose cell in `col` equals `search_text` exactly
pub fn find_header_row<S: TabularSheet + ?Sized>(sheet: &S, col: u32, search_text: &str) -> Option<u32> {
    (1..=sheet.max_row()).find(|&row| {
        sheet
            .cell(col, row)
            .as_text()
            .is_some_and(|text| text == search_text)
    })
}

/// Display name of an environment: `[sheet]name` with line breaks replaced by `_`
pub fn environment_name<S: TabularSheet + ?Sized>(
    sheet: &S,
    triple: &ColumnTriple,
    name_row: u32,
) -> Option<String> {
    let name = sheet.cell(triple.result_col, name_row).as_text()?;
    let name = name.replace("\r\n", "_").replace(['\n', '\r'], "_");
    if name.is_empty() {
        return None;
    }
    Some(format!("[{}]{}", sheet.name(), name))
}

/// Count rows below the header with any value in the expected-result columns
pub fn count_cases<S: TabularSheet + ?Sized>(
    sheet: &S,
    header: &[CellValue],
    header_row: u32,
    locator: &ColumnLocator,
) -> u64 {
    let cols = find_columns(header, locator);
    if cols.is_empty() {
        return 0;
    }
    sheet
        .column_block(&cols, header_row)
        .iter()
        .filter(|cells| cells.iter().any(|c| !c.is_empty()))
        .count() as u64
}

/// Process one worksheet.
///
/// Any structural error aborts the sheet (and with it the file).
pub fn process_sheet<S: TabularSheet + ?Sized>(
    sheet: &S,
    config: &TallyConfig,
) -> Result<SheetSummary, StructuralError> {
    let sheet_name = sheet.name().to_string();

    let header_row = config
        .header_column()
        .and_then(|col| find_header_row(sheet, col, &config.header.search_text))
        .ok_or_else(|| StructuralError::HeaderNotFound {
            sheet: sheet_name.clone(),
        })?;
    let header = sheet.row(header_row);

    let result_cols = find_columns(&header, &config.columns.result);
    let assignee_cols = find_columns(&header, &config.columns.assignee);
    let date_cols = find_columns(&header, &config.columns.date);

    let triples = resolve_triples(&result_cols, &assignee_cols, &date_cols).ok_or_else(|| {
        StructuralError::InconsistentResultSet {
            sheet: sheet_name.clone(),
            results: result_cols.len(),
            assignees: assignee_cols.len(),
            dates: date_cols.len(),
        }
    })?;

    tracing::debug!(
        "Sheet '{}': header at row {}, {} environment(s)",
        sheet_name,
        header_row,
        triples.len()
    );

    let mut rows = Vec::new();
    let mut by_env = EnvironmentCounts::new();

    for triple in &triples {
        let env_rows = extract_rows(
            sheet,
            triple,
            header_row,
            &config.results.unassigned_name,
        );

        match environment_name(sheet, triple, config.environment.name_row) {
            Some(name) => {
                let daily = tally::count_daily(&env_rows, &config.results).daily;
                merge_daily(by_env.entry(name).or_default(), daily);
            }
            None => tracing::warn!(
                "Sheet '{}': result column {} has no environment name, counted in totals only",
                sheet_name,
                triple.result_col
            ),
        }

        rows.extend(env_rows);
    }

    let case_count = count_cases(sheet, &header, header_row, &config.columns.expected);

    Ok(SheetSummary {
        rows,
        by_env,
        counts: SheetCounts {
            sheet_name,
            env_count: triples.len() as u64,
            case_count,
        },
    })
}

/// Add `from` into `into`, date by date and label by label
pub(crate) fn merge_daily(into: &mut DailyCounts, from: DailyCounts) {
    for (date, counts) in from {
        let target = into.entry(date).or_default();
        for (label, count) in counts {
            *target.entry(label).or_insert(0) += count;
        }
    }
}
