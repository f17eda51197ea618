//! Excel/ODS file reader using calamine

use anyhow::{Context, Result};
use calamine::{Data, Range, Reader, Sheets, open_workbook_auto};
use chrono::{NaiveDate, NaiveDateTime};
use std::collections::HashMap;
use std::path::Path;

pub mod workbook;

pub use workbook::{Cell, CellValue, Sheet, TabularSheet, Workbook};

/// Read a workbook from a file path
pub fn read_workbook<P: AsRef<Path>>(path: P) -> Result<Workbook> {
    let path = path.as_ref();
    // Open workbook with calamine
    let mut excel: Sheets<_> = open_workbook_auto(path)
        .with_context(|| format!("Failed to open workbook: {}", path.display()))?;

    let sheet_names = excel.sheet_names();
    let mut sheets = Vec::with_capacity(sheet_names.len());

    for sheet_name in &sheet_names {
        let range = excel
            .worksheet_range(sheet_name)
            .with_context(|| format!("Failed to read sheet '{}'", sheet_name))?;
        sheets.push(parse_sheet(sheet_name, &range));
    }

    tracing::debug!("Read {} sheets from {}", sheets.len(), path.display());

    Ok(Workbook {
        path: path.to_path_buf(),
        sheets,
    })
}

fn parse_sheet(name: &str, range: &Range<Data>) -> Sheet {
    let mut cells = HashMap::new();

    // used_cells() is relative to the range start, which is not always A1
    let (start_row, start_col) = range.start().unwrap_or((0, 0));

    for (rel_row, rel_col, data) in range.used_cells() {
        let value = parse_cell_value(data);
        if value.is_empty() {
            continue;
        }
        let row = start_row + rel_row as u32;
        let col = start_col + rel_col as u32;
        cells.insert((row, col), Cell { row, col, value });
    }

    let used_range = workbook::used_range_of(&cells);
    Sheet {
        name: name.to_string(),
        cells,
        used_range,
    }
}

fn parse_cell_value(data: &Data) -> CellValue {
    match data {
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) => CellValue::Number(*f),
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Bool(b) => CellValue::Boolean(*b),
        Data::Error(e) => CellValue::Error(format!("{:?}", e)),
        Data::Empty => CellValue::Empty,
        Data::DateTime(dt) => {
            if dt.is_duration() {
                return CellValue::Number(dt.as_f64());
            }
            match dt.as_datetime() {
                Some(value) => CellValue::DateTime(value),
                None => CellValue::Number(dt.as_f64()),
            }
        }
        Data::DateTimeIso(s) => parse_iso_datetime(s)
            .map(CellValue::DateTime)
            .unwrap_or_else(|| CellValue::Text(s.clone())),
        Data::DurationIso(s) => CellValue::Text(s.clone()),
    }
}

/// ODS stores dates as ISO strings, with or without a time part
fn parse_iso_datetime(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}
