//! Header column lookup and result/assignee/date set pairing

use crate::config::ColumnLocator;
use crate::reader::CellValue;

/// Columns of one environment, all 1-based
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnTriple {
    pub result_col: u32,
    pub assignee_col: u32,
    pub date_col: u32,
}

impl ColumnTriple {
    pub fn columns(&self) -> [u32; 3] {
        [self.result_col, self.assignee_col, self.date_col]
    }
}

/// Return the 1-based positions of header cells matching the locator.
///
/// A cell matches when its text contains any key and is not exactly one of the
/// excludes. Empty cells never match.
pub fn find_columns(header: &[CellValue], locator: &ColumnLocator) -> Vec<u32> {
    header
        .iter()
        .enumerate()
        .filter_map(|(idx, cell)| {
            let text = cell.as_text()?;
            let wanted = locator
                .keys
                .iter()
                .any(|key| !key.is_empty() && text.contains(key.as_str()));
            let excluded = locator.excludes.iter().any(|ex| *ex == text);
            (wanted && !excluded).then_some(idx as u32 + 1)
        })
        .collect()
}

/// Pair role columns position by position.
///
/// Returns `None` when the three lists are empty or differ in length.
pub fn resolve_triples(results: &[u32], assignees: &[u32], dates: &[u32]) -> Option<Vec<ColumnTriple>> {
    if results.is_empty() || results.len() != assignees.len() || results.len() != dates.len() {
        return None;
    }

    Some(
        results
            .iter()
            .zip(assignees)
            .zip(dates)
            .map(|((&result_col, &assignee_col), &date_col)| ColumnTriple {
                result_col,
                assignee_col,
                date_col,
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(texts: &[&str]) -> Vec<CellValue> {
        texts
            .iter()
            .map(|t| {
                if t.is_empty() {
                    CellValue::Empty
                } else {
                    CellValue::Text(t.to_string())
                }
            })
            .collect()
    }

    #[test]
    fn test_find_columns_by_containment() {
        let row = header(&["No.", "Result (Win)", "Tester", "", "Result (Mac)", "Result note"]);
        let locator = ColumnLocator {
            keys: vec!["Result".to_string()],
            excludes: vec!["Result note".to_string()],
        };

        assert_eq!(find_columns(&row, &locator), vec![2, 5]);
    }

    #[test]
    fn test_find_columns_any_keyword() {
        let row = header(&["Date run", "Executed on", "Tester"]);
        let locator = ColumnLocator::new(&["Date", "Executed"]);
        assert_eq!(find_columns(&row, &locator), vec![1, 2]);
    }

    #[test]
    fn test_find_columns_no_match_is_empty() {
        let row = header(&["No.", "Title"]);
        assert!(find_columns(&row, &ColumnLocator::new(&["Result"])).is_empty());
        assert!(find_columns(&[], &ColumnLocator::new(&["Result"])).is_empty());
    }

    #[test]
    fn test_find_columns_numeric_header() {
        let row = vec![CellValue::Number(2024.0), CellValue::Text("Result".to_string())];
        assert_eq!(find_columns(&row, &ColumnLocator::new(&["2024"])), vec![1]);
    }

    #[test]
    fn test_resolve_triples_positional() {
        let triples = resolve_triples(&[3, 7], &[4, 8], &[5, 9]).unwrap();
        assert_eq!(
            triples,
            vec![
                ColumnTriple {
                    result_col: 3,
                    assignee_col: 4,
                    date_col: 5
                },
                ColumnTriple {
                    result_col: 7,
                    assignee_col: 8,
                    date_col: 9
                },
            ]
        );
        assert_eq!(triples[1].columns(), [7, 8, 9]);
    }

    #[test]
    fn test_resolve_triples_rejects_mismatch() {
        assert!(resolve_triples(&[3, 7], &[4, 8], &[5]).is_none());
        assert!(resolve_triples(&[], &[], &[]).is_none());
    }
}
