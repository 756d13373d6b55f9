use super::anchor::{find_all_cells, find_keyword_row};
use super::block::{extract_block, extract_until, to_records};
use super::rule::{BlockSpec, ExtractionMode, Rule, UntilSpec};
use crate::grid::Grid;
use crate::types::*;
use regex::Regex;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

// Trace configuration for following individual sections through a run
#[derive(Debug, Clone, Default)]
pub struct TraceConfig {
    pub enabled: bool,
    pub section_patterns: Vec<String>,
}

impl TraceConfig {
    pub fn new(enabled: bool, section_patterns: Vec<String>) -> Self {
        Self {
            enabled,
            section_patterns,
        }
    }

    pub fn disabled() -> Self {
        Self::default()
    }

    /// Enabled with at least one pattern
    pub fn is_active(&self) -> bool {
        self.enabled && !self.section_patterns.is_empty()
    }

    /// True when `section` matches any pattern (regex, or plain substring if
    /// the pattern does not compile)
    pub fn matches(&self, section: &str) -> bool {
        if !self.is_active() {
            return false;
        }
        self.section_patterns.iter().any(|pattern| {
            if let Ok(regex) = Regex::new(pattern) {
                regex.is_match(section)
            } else {
                section.contains(pattern)
            }
        })
    }
}

/// Log every row of a traced section
pub fn trace_section(section: &str, output: &SectionOutput, trace: &TraceConfig) {
    if !trace.matches(section) {
        return;
    }

    let blocks: Vec<&Block> = match output {
        SectionOutput::Single(block) => vec![block],
        SectionOutput::PerAnchor(blocks) => blocks.iter().collect(),
    };
    debug!(section, blocks = blocks.len(), "trace");
    for (block_index, block) in blocks.into_iter().enumerate() {
        for (row_index, record) in block.iter().enumerate() {
            let preview = record.values().cloned().collect::<Vec<_>>().join(" | ");
            debug!(section, block = block_index, row = row_index, "{preview}");
        }
    }
}

/// Per-rule statistics from one run
#[derive(Debug, Clone, PartialEq)]
pub struct RuleReport {
    pub section: String,
    pub anchors_found: usize,
    pub blocks: usize,
    pub rows: usize,
    pub duration: Duration,
}

/// Applies rules to a grid.
///
/// Stateless across runs: the output depends only on the rules and the grid.
#[derive(Debug, Clone, Default)]
pub struct RuleEngine {
    trace: TraceConfig,
}

impl RuleEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_trace(trace: TraceConfig) -> Self {
        Self { trace }
    }

    pub fn trace(&self) -> &TraceConfig {
        &self.trace
    }

    pub fn run<G: Grid + ?Sized>(&self, rules: &[Rule], grid: &G) -> ExtractionOutput {
        self.run_with_report(rules, grid).0
    }

    /// Apply every rule in list order and collect per-rule statistics
    pub fn run_with_report<G: Grid + ?Sized>(
        &self,
        rules: &[Rule],
        grid: &G,
    ) -> (ExtractionOutput, Vec<RuleReport>) {
        let (row_count, col_count) = grid.dimensions();
        info!(
            rules = rules.len(),
            rows = row_count,
            cols = col_count,
            "applying extraction rules"
        );

        let mut output = ExtractionOutput::new();
        let mut reports = Vec::with_capacity(rules.len());

        for rule in rules {
            let (section_output, report) = self.apply_rule(rule, grid);
            trace_section(&rule.section, &section_output, &self.trace);
            if output.insert(&rule.section, section_output).is_some() {
                warn!(section = %rule.section, "section overwritten by a later rule");
            }
            reports.push(report);
        }

        info!(
            sections = output.len(),
            rows = output.total_rows(),
            "extraction finished"
        );
        (output, reports)
    }

    /// Apply a single rule. A keyword that matches nothing gives an empty
    /// section, never an error.
    pub fn apply_rule<G: Grid + ?Sized>(&self, rule: &Rule, grid: &G) -> (SectionOutput, RuleReport) {
        let rule_start = Instant::now();

        let (section_output, anchors_found) = match (&rule.anchor, &rule.mode) {
            (None, _) => {
                debug!(section = %rule.section, "rule has no keyword, emitting empty section");
                (Self::empty_output(rule), 0)
            }
            (Some(keyword), ExtractionMode::Block(spec)) => {
                Self::apply_block_rule(&rule.section, keyword, spec, grid)
            }
            (Some(keyword), ExtractionMode::UntilKeyword(spec)) => {
                Self::apply_until_rule(&rule.section, keyword, spec, grid)
            }
        };

        let report = RuleReport {
            section: rule.section.clone(),
            anchors_found,
            blocks: section_output.block_count(),
            rows: section_output.row_count(),
            duration: rule_start.elapsed(),
        };
        debug!(
            section = %report.section,
            anchors = report.anchors_found,
            rows = report.rows,
            "rule applied"
        );
        (section_output, report)
    }

    fn empty_output(rule: &Rule) -> SectionOutput {
        if rule.repeats() {
            SectionOutput::PerAnchor(Vec::new())
        } else {
            SectionOutput::Single(Vec::new())
        }
    }

    fn apply_block_rule<G: Grid + ?Sized>(
        section: &str,
        keyword: &str,
        spec: &BlockSpec,
        grid: &G,
    ) -> (SectionOutput, usize) {
        let mut anchors = find_all_cells(grid, keyword);
        let anchors_found = anchors.len();
        if anchors.is_empty() {
            debug!(section, keyword, "anchor not found");
        }
        if !spec.repeat {
            anchors.truncate(1);
        }

        let mut blocks: Vec<Block> = anchors
            .into_iter()
            .map(|anchor| Self::block_at(section, anchor, spec, grid))
            .collect();

        let section_output = if spec.repeat {
            SectionOutput::PerAnchor(blocks)
        } else {
            SectionOutput::Single(blocks.pop().unwrap_or_default())
        };
        (section_output, anchors_found)
    }

    /// Read one block for one anchor
    fn block_at<G: Grid + ?Sized>(section: &str, anchor: Coord, spec: &BlockSpec, grid: &G) -> Block {
        let Some(origin) = block_origin(anchor, spec) else {
            warn!(section, %anchor, "block origin falls outside the sheet, skipping");
            return Vec::new();
        };
        debug!(
            section,
            %anchor,
            start_row = origin.start.row,
            start_col = origin.start.col,
            stop_col = origin.stop_col,
            "extracting block"
        );
        to_records(extract_block(
            grid,
            origin.start.row,
            origin.start.col,
            origin.stop_col,
        ))
    }

    fn apply_until_rule<G: Grid + ?Sized>(
        section: &str,
        keyword: &str,
        spec: &UntilSpec,
        grid: &G,
    ) -> (SectionOutput, usize) {
        let Some(anchor_row) = find_keyword_row(grid, keyword) else {
            debug!(section, keyword, "anchor row not found");
            return (SectionOutput::Single(Vec::new()), 0);
        };

        let start_row = anchor_row + spec.skip_rows + 1;
        debug!(section, anchor_row, start_row, "extracting rows");
        let rows = extract_until(grid, start_row, spec.stop_before.as_deref());
        (SectionOutput::Single(to_records(rows)), 1)
    }
}

/// Absolute extraction origin computed from an anchor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockOrigin {
    /// anchor + skip
    pub base: Coord,
    /// base + extract start
    pub start: Coord,
    /// base column + stop column delta, inclusive
    pub stop_col: usize,
}

/// `None` when any coordinate would land before row/column 0
pub fn block_origin(anchor: Coord, spec: &BlockSpec) -> Option<BlockOrigin> {
    let base = anchor.offset(spec.skip.rows, spec.skip.cols)?;
    let start = base.offset(spec.start.rows, spec.start.cols)?;
    let stop_col = base.col.checked_add_signed(spec.stop_col)?;
    Some(BlockOrigin {
        base,
        start,
        stop_col,
    })
}
