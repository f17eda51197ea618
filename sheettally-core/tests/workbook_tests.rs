use sheettally_core::batch::process_files;
use sheettally_core::{Aggregator, Manifest, Outcome, RunStatus, TallyConfig};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

/// Cell content for the mock sheets
enum Value<'a> {
    Text(&'a str),
    /// Excel serial date shown with the built-in date format
    Date(u32),
}

use Value::{Date, Text};

fn column_letter(mut col: usize) -> String {
    let mut result = String::new();
    loop {
        result.insert(0, (b'A' + (col % 26) as u8) as char);
        if col < 26 {
            break;
        }
        col = col / 26 - 1;
    }
    result
}

fn sheet_xml(rows: &[Vec<Option<Value>>]) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>"#,
    );
    for (r, row) in rows.iter().enumerate() {
        xml.push_str(&format!(r#"<row r="{}">"#, r + 1));
        for (c, value) in row.iter().enumerate() {
            let reference = format!("{}{}", column_letter(c), r + 1);
            match value {
                Some(Text(text)) => xml.push_str(&format!(
                    r#"<c r="{}" t="inlineStr"><is><t>{}</t></is></c>"#,
                    reference, text
                )),
                Some(Date(serial)) => {
                    xml.push_str(&format!(r#"<c r="{}" s="1"><v>{}</v></c>"#, reference, serial))
                }
                None => {}
            }
        }
        xml.push_str("</row>");
    }
    xml.push_str("</sheetData></worksheet>");
    xml
}

// Helper to create a minimal valid XLSX file for testing
fn create_mock_xlsx(path: &Path, sheets: &[(&str, Vec<Vec<Option<Value>>>)]) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);

    // 1. [Content_Types].xml
    zip.start_file("[Content_Types].xml", options)?;
    let mut content_types = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>
<Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>
"#,
    );
    for (i, _) in sheets.iter().enumerate() {
        content_types.push_str(&format!(
            r#"<Override PartName="/xl/worksheets/sheet{}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#,
            i + 1
        ));
    }
    content_types.push_str("</Types>");
    zip.write_all(content_types.as_bytes())?;

    // 2. _rels/.rels
    zip.start_file("_rels/.rels", options)?;
    zip.write_all(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>
</Relationships>"#.as_bytes())?;

    // 3. xl/workbook.xml
    zip.start_file("xl/workbook.xml", options)?;
    let mut workbook_xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
<sheets>
"#,
    );
    for (i, (name, _)) in sheets.iter().enumerate() {
        workbook_xml.push_str(&format!(
            r#"<sheet name="{}" sheetId="{}" r:id="rId{}"/>"#,
            name,
            i + 1,
            i + 1
        ));
    }
    workbook_xml.push_str("</sheets></workbook>");
    zip.write_all(workbook_xml.as_bytes())?;

    // 4. xl/_rels/workbook.xml.rels
    zip.start_file("xl/_rels/workbook.xml.rels", options)?;
    let mut rels_xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
"#,
    );
    for (i, _) in sheets.iter().enumerate() {
        rels_xml.push_str(&format!(
            r#"<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{}.xml"/>"#,
            i + 1, i + 1
        ));
    }
    rels_xml.push_str(&format!(
        r#"<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>"#,
        sheets.len() + 1
    ));
    rels_xml.push_str("</Relationships>");
    zip.write_all(rels_xml.as_bytes())?;

    // 5. xl/styles.xml: style 1 is the built-in short date format
    zip.start_file("xl/styles.xml", options)?;
    zip.write_all(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
<cellXfs count="2"><xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/><xf numFmtId="14" fontId="0" fillId="0" borderId="0" xfId="0" applyNumberFormat="1"/></cellXfs>
</styleSheet>"#.as_bytes())?;

    // 6. sheets
    for (i, (_, rows)) in sheets.iter().enumerate() {
        zip.start_file(format!("xl/worksheets/sheet{}.xml", i + 1), options)?;
        zip.write_all(sheet_xml(rows).as_bytes())?;
    }

    zip.finish()?;
    Ok(())
}

fn texts(cells: &[&'static str]) -> Vec<Option<Value<'static>>> {
    cells
        .iter()
        .map(|c| if c.is_empty() { None } else { Some(Text(c)) })
        .collect()
}

fn progress_sheet() -> Vec<Vec<Option<Value<'static>>>> {
    vec![
        texts(&["", "", "", "Chrome", "", "", "Firefox", "", ""]),
        texts(&["No.", "Title", "Expected", "Result", "Tester", "Date", "Result", "Tester", "Date"]),
        vec![
            Some(Text("1")),
            Some(Text("Login")),
            Some(Text("Form shown")),
            Some(Text("Pass")),
            Some(Text("Alice")),
            Some(Date(45292)),
            Some(Text("Fail")),
            Some(Text("Bob")),
            Some(Date(45293)),
        ],
        vec![
            Some(Text("2")),
            Some(Text("Logout")),
            Some(Text("Session closed")),
            Some(Text("Pass")),
            None,
            Some(Date(45293)),
            Some(Text("N/A")),
            Some(Text("Bob")),
            None,
        ],
        texts(&["3", "Reset", "Mail sent", "", "", "", "", "", ""]),
    ]
}

#[test]
fn test_aggregate_file_end_to_end() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("progress.xlsx");
    create_mock_xlsx(&path, &[("Login tests", progress_sheet()), ("Memo", vec![texts(&["notes"])])])?;

    let mut config = TallyConfig::default();
    config.sheets.include = vec!["tests".to_string()];

    let outcome = Aggregator::with_config(config).aggregate_file(&path)?;
    let result = outcome.as_result().expect("aggregate");

    assert_eq!(result.count_by_sheet.len(), 1);
    assert_eq!(result.count_by_sheet[0].env_count, 2);
    assert_eq!(result.count_by_sheet[0].case_count, 3);

    // 2 environments x 3 cases, one N/A excluded
    assert_eq!(result.stats.all, 6);
    assert_eq!(result.stats.excluded, 1);
    assert_eq!(result.stats.available, 5);
    assert_eq!(result.stats.filled, 4);
    assert_eq!(result.stats.completed, 2);
    assert_eq!(result.stats.incompleted, 1);
    assert_eq!(result.run.status, RunStatus::InProgress);
    assert_eq!(result.run.start_date.as_deref(), Some("2024-01-01"));
    assert_eq!(result.run.last_update.as_deref(), Some("2024-01-02"));
    assert!(result.warning.is_none());

    assert_eq!(result.daily["2024-01-01"]["Pass"], 1);
    assert_eq!(result.daily["2024-01-02"]["Pass"], 1);
    assert_eq!(result.daily["2024-01-02"]["Fail"], 1);
    assert_eq!(result.daily["2024-01-02"]["completed"], 1);
    assert_eq!(result.daily["2024-01-02"]["executed"], 2);

    assert_eq!(result.by_name["2024-01-02"]["(unassigned)"], 1);
    assert_eq!(result.by_name["2024-01-02"]["Bob"], 1);
    assert_eq!(result.total["N/A"], 1);

    assert!(result.by_env.contains_key("[Login tests]Chrome"));
    assert!(result.by_env.contains_key("[Login tests]Firefox"));
    Ok(())
}

#[test]
fn test_missing_header_fails_file() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("no_header.xlsx");
    create_mock_xlsx(
        &path,
        &[("Tests", vec![texts(&["ID", "Result", "Tester", "Date"]), texts(&["1", "Pass", "Alice", "2024-01-01"])])],
    )?;

    let outcome = Aggregator::new().aggregate_file(&path)?;

    match outcome {
        Outcome::Failed { error } => assert_eq!(error.kind, "header_not_found"),
        Outcome::Aggregated(_) => panic!("expected a structural error"),
    }
    Ok(())
}

#[test]
fn test_batch_and_manifest() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let good = dir.path().join("good (1).xlsx");
    let bad = dir.path().join("bad.xlsx");
    create_mock_xlsx(&good, &[("Login tests", progress_sheet())])?;
    create_mock_xlsx(&bad, &[("Tests", vec![texts(&["No.", "Result", "Result", "Tester", "Date"])])])?;

    let batch = process_files(&[good.clone(), bad.clone()], &TallyConfig::default());

    assert!(batch.failures.is_empty());
    assert_eq!(batch.reports.len(), 2);
    assert_eq!(batch.reports[0].file, "good.xlsx");
    assert_eq!(batch.reports[0].selector_label, "1: good.xlsx");
    assert_eq!(batch.reports[0].source, "local");
    assert_eq!(
        batch.reports[1].outcome.error().map(|e| e.kind.as_str()),
        Some("inconsistent_result_set")
    );
    assert!(batch.has_errors());

    let summary = batch.summary();
    assert_eq!(summary.errors, 1);
    assert_eq!(summary.stats.all, 6);

    let manifest_path = dir.path().join("project.json");
    let manifest = Manifest::new("Regression", batch.reports.clone());
    manifest.save(&manifest_path)?;
    let loaded = Manifest::load(&manifest_path)?;
    assert_eq!(loaded, manifest);
    Ok(())
}
