//! Engine behavior tests against in-memory grids.
//!
//! Each test builds a small sheet, applies rules through the public API and
//! asserts on the JSON the caller would persist.

use serde_json::{json, Value};
use sheetmap_core::{
    ExtractionOutput, MappingConfig, OutputFormat, Rule, RuleBuilder, RuleEngine, SectionOutput,
    SheetGrid, SheetProcessor,
};

// ============================================================================
// Fixture helpers
// ============================================================================

fn run(rules: &[Rule], grid: &SheetGrid) -> Value {
    serde_json::to_value(RuleEngine::new().run(rules, grid)).unwrap()
}

fn block_rule(keyword: &str, section: &str) -> RuleBuilder {
    RuleBuilder::new().keyword(keyword).section(section)
}

/// Two invoice tables stacked vertically, separated by a blank row
fn invoices() -> SheetGrid {
    SheetGrid::from_optional_rows(vec![
        vec![Some("Monthly report"), None, None, None],
        vec![Some("Invoice"), Some("INV-1"), None, None],
        vec![Some("Qty"), Some("Item"), Some("Price"), None],
        vec![Some("2"), Some("Bolt"), Some("0.50"), Some("note")],
        vec![Some("1"), Some("Nut"), Some("0.20"), None],
        vec![None, None, None, None],
        vec![Some("Invoice"), Some("INV-2"), None, None],
        vec![Some("Qty"), Some("Item"), Some("Price"), None],
        vec![Some("5"), Some("Washer"), Some("0.05"), None],
    ])
}

// ============================================================================
// Block mode
// ============================================================================

mod block_mode {
    use super::*;

    #[test]
    fn header_scenario_yields_single_unwrapped_block() {
        let grid = SheetGrid::new(vec![
            vec!["".into(), "".into(), "".into(), "".into()],
            vec!["".into(), "".into(), "".into(), "".into()],
            vec!["HEADER".into(), "".into(), "".into(), "".into()],
            vec!["a".into(), "b".into(), "c".into(), "outside".into()],
            vec![Default::default(), "x".into(), Default::default(), Default::default()],
            vec![Default::default(), Default::default(), Default::default(), "tail".into()],
            vec!["never".into(), "read".into(), Default::default(), Default::default()],
        ]);
        let rule = block_rule("HEADER", "table")
            .skip(0, 0)
            .extract_start(1, 0)
            .stop_col(2)
            .repeat(false)
            .finalize()
            .unwrap();

        assert_eq!(
            run(&[rule], &grid),
            json!({
                "table": [
                    { "col_1": "a", "col_2": "b", "col_3": "c" },
                    { "col_1": "", "col_2": "x", "col_3": "" }
                ]
            })
        );
    }

    #[test]
    fn non_looping_rule_uses_first_anchor_only() {
        let rule = block_rule("Invoice", "first")
            .skip(2, 0)
            .stop_col(2)
            .finalize()
            .unwrap();

        let output = run(&[rule], &invoices());
        let rows = output["first"].as_array().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["col_2"], "Bolt");
        assert_eq!(rows[1]["col_2"], "Nut");
    }

    #[test]
    fn looping_rule_emits_one_block_per_anchor() {
        let rule = block_rule("Invoice", "all")
            .skip(2, 0)
            .stop_col(2)
            .repeat(true)
            .finalize()
            .unwrap();

        let output = run(&[rule], &invoices());
        let blocks = output["all"].as_array().unwrap();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].as_array().unwrap().len(), 2);
        assert_eq!(blocks[1], json!([{ "col_1": "5", "col_2": "Washer", "col_3": "0.05" }]));
    }

    #[test]
    fn looping_rule_block_count_matches_anchor_count_even_when_blocks_are_empty() {
        // Skipping past the sheet leaves every block empty but still counted
        let rule = block_rule("Invoice", "all")
            .skip(100, 0)
            .repeat(true)
            .finalize()
            .unwrap();

        let (output, reports) = RuleEngine::new().run_with_report(&[rule], &invoices());
        assert_eq!(reports[0].anchors_found, 2);
        assert_eq!(
            output.section("all"),
            Some(&SectionOutput::PerAnchor(vec![Vec::new(), Vec::new()]))
        );
    }

    #[test]
    fn extraction_offsets_are_relative_to_the_skipped_base() {
        // Anchor at (1, 0); base (1, 1); start (2, 1); columns 1..=2
        let rule = block_rule("Invoice", "items")
            .skip(0, 1)
            .extract_start(2, 0)
            .stop_col(1)
            .finalize()
            .unwrap();

        assert_eq!(
            run(&[rule], &invoices())["items"],
            json!([
                { "col_1": "Bolt", "col_2": "0.50" },
                { "col_1": "Nut", "col_2": "0.20" }
            ])
        );
    }

    #[test]
    fn block_never_includes_the_terminating_row() {
        let rule = block_rule("Monthly", "report")
            .stop_col(3)
            .finalize()
            .unwrap();

        let output = run(&[rule], &invoices());
        let rows = output["report"].as_array().unwrap();
        // Rows 0..=4, stopping before the blank row 5
        assert_eq!(rows.len(), 5);
        assert!(rows.iter().all(|row| row["col_1"] != "Invoice" || row["col_2"] == "INV-1"));
    }
}

// ============================================================================
// Until-keyword mode
// ============================================================================

mod until_mode {
    use super::*;

    fn statement() -> SheetGrid {
        SheetGrid::from_optional_rows(vec![
            vec![Some("Statement"), None, None],
            vec![Some("Date"), Some("Description"), Some("Amount")],
            vec![Some("01/02"), Some("Coffee"), Some("3.50")],
            vec![Some(" "), None, None],
            vec![Some("02/02"), Some("Books"), Some("20")],
            vec![None, Some("Closing balance"), Some("23.50")],
            vec![Some("03/02"), Some("Ignored"), Some("1")],
        ])
    }

    #[test]
    fn rows_until_stop_keyword_skip_blank_rows() {
        let rule = RuleBuilder::new()
            .keyword("Statement")
            .section("entries")
            .until()
            .skip_rows(1)
            .stop_before("Closing")
            .finalize()
            .unwrap();

        assert_eq!(
            run(&[rule], &statement()),
            json!({
                "entries": [
                    { "col_1": "01/02", "col_2": "Coffee", "col_3": "3.50" },
                    { "col_1": "02/02", "col_2": "Books", "col_3": "20" }
                ]
            })
        );
    }

    #[test]
    fn without_stop_keyword_reads_to_the_end() {
        let rule = RuleBuilder::new()
            .keyword("Closing")
            .section("after")
            .until()
            .finalize()
            .unwrap();

        assert_eq!(
            run(&[rule], &statement())["after"],
            json!([{ "col_1": "03/02", "col_2": "Ignored", "col_3": "1" }])
        );
    }

    #[test]
    fn anchor_matches_across_the_joined_row() {
        let rule = RuleBuilder::new()
            .keyword("Description Amount")
            .section("body")
            .until()
            .stop_before("Books")
            .finalize()
            .unwrap();

        assert_eq!(run(&[rule], &statement())["body"].as_array().unwrap().len(), 1);
    }
}

// ============================================================================
// Degradation and ordering
// ============================================================================

mod run_semantics {
    use super::*;

    #[test]
    fn unmatched_and_disabled_rules_give_empty_sections() {
        let rules = vec![
            block_rule("Nope", "missing_block").finalize().unwrap(),
            block_rule("Nope", "missing_loop").repeat(true).finalize().unwrap(),
            RuleBuilder::new()
                .keyword("Nope")
                .section("missing_rows")
                .until()
                .finalize()
                .unwrap(),
            RuleBuilder::new().section("disabled").finalize().unwrap(),
            block_rule("Invoice", "found").stop_col(1).finalize().unwrap(),
        ];

        let output = run(&rules, &invoices());
        assert_eq!(output["missing_block"], json!([]));
        assert_eq!(output["missing_loop"], json!([]));
        assert_eq!(output["missing_rows"], json!([]));
        assert_eq!(output["disabled"], json!([]));
        // Rows 1..=4 in columns 0..=1, stopping before the blank row
        assert_eq!(output["found"].as_array().unwrap().len(), 4);
    }

    #[test]
    fn sections_follow_rule_order_and_later_duplicates_win() {
        let rules = vec![
            block_rule("Invoice", "b").stop_col(1).finalize().unwrap(),
            block_rule("Monthly", "a").finalize().unwrap(),
            block_rule("Nope", "b").finalize().unwrap(),
        ];

        let output = RuleEngine::new().run(&rules, &invoices());
        let keys: Vec<&str> = output.sections.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["b", "a"]);
        assert_eq!(output.section("b"), Some(&SectionOutput::Single(Vec::new())));
    }

    #[test]
    fn repeated_runs_are_byte_identical() {
        let rules = MappingConfig::from_json_str(
            r#"[
                {"from": "Invoice", "skip": {"rows": 2, "cols": 0},
                 "extract": {"start": {"rows": 0, "cols": 0}, "stop_col": 2},
                 "loop": true, "as": "invoices"},
                {"keyword": "Monthly", "rule_type": "extract_until",
                 "stop_before": "INV-2", "section": "head"}
            ]"#,
        )
        .unwrap()
        .compile()
        .unwrap();

        let grid = invoices();
        let engine = RuleEngine::new();
        let first: ExtractionOutput = engine.run(&rules, &grid);
        let second = engine.run(&rules, &grid);
        assert_eq!(
            first.to_json_string(OutputFormat::Pretty).unwrap(),
            second.to_json_string(OutputFormat::Pretty).unwrap()
        );
    }

    #[test]
    fn processor_applies_rule_file_to_loaded_grid() {
        let config = MappingConfig::from_json_str(
            r#"[
                {"from": "Invoice", "skip": {"rows": 2, "cols": 0},
                 "extract": {"start": {"rows": 0, "cols": 0}, "stop_col": 2},
                 "as": "first"},
                {"from": "Nope", "as": "missing"}
            ]"#,
        )
        .unwrap();

        let outcome = SheetProcessor::new().process_grid(&invoices(), &config).unwrap();
        assert!(!outcome.cache_hit);
        assert_eq!(outcome.reports.len(), 2);
        assert_eq!(outcome.reports[0].anchors_found, 2);
        assert_eq!(
            serde_json::to_value(&outcome.output).unwrap(),
            json!({
                "first": [
                    { "col_1": "2", "col_2": "Bolt", "col_3": "0.50" },
                    { "col_1": "1", "col_2": "Nut", "col_3": "0.20" }
                ],
                "missing": []
            })
        );
    }

    #[test]
    fn processor_rejects_malformed_rules_for_loaded_grid() {
        let config =
            MappingConfig::from_json_str(r#"[{"from": "Invoice", "rule_type": "pivot", "as": "x"}]"#)
                .unwrap();
        assert!(SheetProcessor::new().process_grid(&invoices(), &config).is_err());
    }

    #[test]
    fn reports_describe_each_rule() {
        let rules = vec![
            block_rule("Invoice", "loop").skip(2, 0).stop_col(2).repeat(true).finalize().unwrap(),
            block_rule("Nope", "miss").finalize().unwrap(),
        ];

        let (_, reports) = RuleEngine::new().run_with_report(&rules, &invoices());
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].section, "loop");
        assert_eq!(reports[0].anchors_found, 2);
        assert_eq!(reports[0].blocks, 2);
        assert_eq!(reports[0].rows, 3);
        assert_eq!(reports[1].anchors_found, 0);
        assert_eq!(reports[1].rows, 0);
    }
}
