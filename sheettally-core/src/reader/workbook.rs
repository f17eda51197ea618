//! Workbook data structures

use chrono::NaiveDateTime;
use std::collections::HashMap;
use std::path::PathBuf;

/// Represents a complete workbook
#[derive(Debug, Clone)]
pub struct Workbook {
    pub path: PathBuf,
    pub sheets: Vec<Sheet>,
}

/// Read access to a single worksheet.
///
/// Rows and columns are 1-based, the way spreadsheet users count them.
pub trait TabularSheet {
    /// Worksheet name
    fn name(&self) -> &str;

    /// Last row holding data (0 for an empty sheet)
    fn max_row(&self) -> u32;

    /// Last column holding data (0 for an empty sheet)
    fn max_col(&self) -> u32;

    /// Raw value at the given position, `CellValue::Empty` when absent
    fn cell(&self, col: u32, row: u32) -> CellValue;

    /// All values of one row, from column 1 to `max_col`
    fn row(&self, row: u32) -> Vec<CellValue> {
        (1..=self.max_col()).map(|col| self.cell(col, row)).collect()
    }

    /// Values of the given columns for every row below `header_row`.
    ///
    /// Date cells come back as ISO `YYYY-MM-DD` text.
    fn column_block(&self, cols: &[u32], header_row: u32) -> Vec<Vec<CellValue>> {
        (header_row + 1..=self.max_row())
            .map(|row| {
                cols.iter()
                    .map(|&col| self.cell(col, row).with_iso_date())
                    .collect()
            })
            .collect()
    }
}

/// Represents a worksheet
#[derive(Debug, Clone)]
pub struct Sheet {
    pub name: String,
    /// Cells keyed by 0-based (row, col)
    pub cells: HashMap<(u32, u32), Cell>,
    pub used_range: Option<(u32, u32)>, // (rows, cols)
}

impl Sheet {
    /// Build a sheet from an in-memory grid whose first row is sheet row 1
    pub fn from_rows(name: impl Into<String>, rows: Vec<Vec<CellValue>>) -> Self {
        let mut cells = HashMap::new();
        for (r, values) in rows.into_iter().enumerate() {
            for (c, value) in values.into_iter().enumerate() {
                if value.is_empty() {
                    continue;
                }
                let (row, col) = (r as u32, c as u32);
                cells.insert((row, col), Cell { row, col, value });
            }
        }

        let used_range = used_range_of(&cells);
        Self {
            name: name.into(),
            cells,
            used_range,
        }
    }

    /// Get a cell at the given 0-based position
    pub fn get_cell(&self, row: u32, col: u32) -> Option<&Cell> {
        self.cells.get(&(row, col))
    }
}

pub(crate) fn used_range_of(cells: &HashMap<(u32, u32), Cell>) -> Option<(u32, u32)> {
    let max_row = cells.values().map(|c| c.row).max()?;
    let max_col = cells.values().map(|c| c.col).max()?;
    Some((max_row + 1, max_col + 1))
}

impl TabularSheet for Sheet {
    fn name(&self) -> &str {
        &self.name
    }

    fn max_row(&self) -> u32 {
        self.used_range.map_or(0, |(rows, _)| rows)
    }

    fn max_col(&self) -> u32 {
        self.used_range.map_or(0, |(_, cols)| cols)
    }

    fn cell(&self, col: u32, row: u32) -> CellValue {
        if col == 0 || row == 0 {
            return CellValue::Empty;
        }
        self.get_cell(row - 1, col - 1)
            .map(|c| c.value.clone())
            .unwrap_or(CellValue::Empty)
    }
}

/// Represents a single cell
#[derive(Debug, Clone)]
pub struct Cell {
    pub row: u32,
    pub col: u32,
    pub value: CellValue,
}

/// Cell value types
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Number(f64),
    Text(String),
    Boolean(bool),
    Error(String),
    DateTime(NaiveDateTime),
}

impl CellValue {
    /// Check if the cell is empty (no value or a zero-length string)
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    /// Text shown for this value, `None` for empty cells.
    ///
    /// Whole numbers drop their fractional part so that `3.0` reads as `3`.
    pub fn as_text(&self) -> Option<String> {
        match self {
            CellValue::Empty => None,
            CellValue::Text(s) if s.is_empty() => None,
            CellValue::Text(s) => Some(s.clone()),
            CellValue::Number(n) if n.fract() == 0.0 && n.is_finite() => {
                Some(format!("{}", *n as i64))
            }
            CellValue::Number(n) => Some(n.to_string()),
            CellValue::Boolean(b) => Some(if *b { "TRUE" } else { "FALSE" }.to_string()),
            CellValue::Error(e) => Some(e.clone()),
            CellValue::DateTime(dt) => Some(dt.format("%Y-%m-%d %H:%M:%S").to_string()),
        }
    }

    /// Replace a date value with its `YYYY-MM-DD` text, leaving anything else untouched
    pub fn with_iso_date(self) -> CellValue {
        match self {
            CellValue::DateTime(dt) => CellValue::Text(dt.format("%Y-%m-%d").to_string()),
            other => other,
        }
    }
}
