//! Workbook → rules → JSON, through real .xlsx files.
//!
//! Workbooks are written with rust_xlsxwriter into a temp directory, then
//! read back through calamine by the processor.

use rust_xlsxwriter::{ExcelDateTime, Format, Workbook};
use serde_json::{json, Value};
use sheetmap_core::grid::{load_sheet, SheetSelector};
use sheetmap_core::{
    ExtractError, Grid, MappingConfig, ProcessOptions, SheetProcessor, TraceConfig,
};
use std::path::{Path, PathBuf};

fn write_workbook(dir: &Path) -> PathBuf {
    let path = dir.join("orders.xlsx");
    let mut workbook = Workbook::new();

    let cover = workbook.add_worksheet();
    cover.set_name("Cover").unwrap();
    cover.write_string(0, 0, "Nothing to see").unwrap();

    let orders = workbook.add_worksheet();
    orders.set_name("Orders").unwrap();
    orders.write_string(1, 1, "Order").unwrap();
    orders.write_string(1, 2, "A-100").unwrap();
    orders.write_string(2, 1, "Sku").unwrap();
    orders.write_string(2, 2, "Qty").unwrap();
    orders.write_string(3, 1, "X1").unwrap();
    orders.write_number(3, 2, 12).unwrap();
    orders.write_string(4, 1, "X2").unwrap();
    orders.write_number(4, 2, 3).unwrap();
    orders.write_string(6, 1, "Order").unwrap();
    orders.write_string(6, 2, "A-101").unwrap();
    orders.write_string(7, 1, "Sku").unwrap();
    orders.write_string(7, 2, "Qty").unwrap();
    orders.write_string(8, 1, "Y9").unwrap();
    orders.write_number(8, 2, 1).unwrap();
    orders.write_string(10, 0, "Remarks").unwrap();
    orders.write_string(11, 0, "Ship together").unwrap();
    orders.write_string(13, 0, "Handle with care").unwrap();
    orders.write_string(14, 0, "End of remarks").unwrap();

    workbook.save(&path).unwrap();
    path
}

fn mapping() -> MappingConfig {
    MappingConfig::from_json_str(
        r#"{
            "sheet": "Orders",
            "rules": [
                {"from": "Order", "skip": {"rows": 2, "cols": 0},
                 "extract": {"start": {"rows": 0, "cols": 0}, "stop_col": 1},
                 "loop": true, "as": "orders"},
                {"keyword": "Remarks", "rule_type": "extract_until",
                 "skip_rows": 0, "stop_before": "End of", "section": "remarks"},
                {"from": "Invoice", "as": "invoices"}
            ]
        }"#,
    )
    .unwrap()
}

#[test]
fn loader_keeps_absolute_coordinates() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_workbook(dir.path());

    let grid = load_sheet(&path, &SheetSelector::Named("Orders".to_string())).unwrap();
    assert_eq!(grid.cell_at(1, 1).as_text(), "Order");
    assert!(grid.cell_at(0, 0).is_empty());
    assert_eq!(grid.cell_at(3, 2).as_text(), "12");

    let first = load_sheet(&path, &SheetSelector::First).unwrap();
    assert_eq!(first.cell_at(0, 0).as_text(), "Nothing to see");
}

#[test]
fn dates_and_booleans_are_rendered_as_text() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("typed.xlsx");

    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    let date = ExcelDateTime::from_ymd(2024, 1, 15).unwrap();
    let date_format = Format::new().set_num_format("yyyy-mm-dd");
    sheet.write_string(0, 0, "Issued").unwrap();
    sheet.write_datetime_with_format(0, 1, &date, &date_format).unwrap();
    sheet.write_string(1, 0, "Paid").unwrap();
    sheet.write_boolean(1, 1, true).unwrap();
    workbook.save(&path).unwrap();

    let grid = load_sheet(&path, &SheetSelector::First).unwrap();
    assert_eq!(grid.cell_at(0, 1).as_text(), "2024-01-15 00:00:00");
    assert_eq!(grid.cell_at(1, 1).as_text(), "True");
}

#[test]
fn unknown_sheet_is_grid_access_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_workbook(dir.path());

    let err = load_sheet(&path, &SheetSelector::Named("Missing".to_string())).unwrap_err();
    match err {
        ExtractError::GridAccess { reason, .. } => assert!(reason.contains("Missing")),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn processor_extracts_all_sections() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_workbook(dir.path());

    let outcome = SheetProcessor::new()
        .process(&path, &mapping(), &ProcessOptions::default())
        .unwrap();
    assert!(!outcome.cache_hit);
    assert_eq!(outcome.reports.len(), 3);

    let value: Value = serde_json::to_value(&outcome.output).unwrap();
    assert_eq!(
        value,
        json!({
            "orders": [
                [
                    { "col_1": "X1", "col_2": "12" },
                    { "col_1": "X2", "col_2": "3" }
                ],
                [
                    { "col_1": "Y9", "col_2": "1" }
                ]
            ],
            "remarks": [
                { "col_1": "Ship together", "col_2": "", "col_3": "" },
                { "col_1": "Handle with care", "col_2": "", "col_3": "" }
            ],
            "invoices": []
        })
    );
}

#[test]
fn sheet_option_overrides_rule_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_workbook(dir.path());

    let options = ProcessOptions {
        sheet: Some("Cover".to_string()),
        ..ProcessOptions::default()
    };
    let outcome = SheetProcessor::new().process(&path, &mapping(), &options).unwrap();
    assert_eq!(outcome.output.total_rows(), 0);
}

#[test]
fn second_run_is_served_from_cache() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_workbook(dir.path());
    let processor = SheetProcessor::new_with_cache(dir.path().join("cache")).unwrap();

    let first = processor
        .process(&path, &mapping(), &ProcessOptions::default())
        .unwrap();
    let second = processor
        .process(&path, &mapping(), &ProcessOptions::default())
        .unwrap();

    assert!(!first.cache_hit);
    assert!(second.cache_hit);
    assert_eq!(
        serde_json::to_string(&first.output).unwrap(),
        serde_json::to_string(&second.output).unwrap()
    );

    let skipped = processor
        .process(
            &path,
            &mapping(),
            &ProcessOptions {
                skip_cache: true,
                ..ProcessOptions::default()
            },
        )
        .unwrap();
    assert!(!skipped.cache_hit);
}

#[test]
fn traced_runs_bypass_the_cache() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_workbook(dir.path());
    let mut processor = SheetProcessor::new_with_cache(dir.path().join("cache")).unwrap();

    let warm = processor
        .process(&path, &mapping(), &ProcessOptions::default())
        .unwrap();
    assert!(!warm.cache_hit);

    processor.set_trace_config(TraceConfig::new(true, vec!["orders".to_string()]));
    let traced = processor
        .process(&path, &mapping(), &ProcessOptions::default())
        .unwrap();
    assert!(!traced.cache_hit);
    assert_eq!(traced.reports.len(), 3);
}
