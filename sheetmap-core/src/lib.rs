// Sheetmap Core Library
//
// Rule-driven extraction of tabular blocks from semi-structured spreadsheets.
// Rules locate keyword anchors, offsets turn anchors into block origins, and
// the extracted blocks come out as section-keyed JSON.

pub mod cache;
pub mod config;
pub mod error;
pub mod grid;
pub mod output;
pub mod processor;
pub mod rules;
pub mod storage;
pub mod types;

// Re-export main types and functions for easy use
pub use config::{MappingConfig, RuleDef};
pub use error::{ExtractError, ExtractResult};
pub use grid::{Grid, SheetGrid, SheetSelector};
pub use output::OutputFormat;
pub use processor::{ProcessOptions, ProcessOutcome, SheetProcessor};
pub use rules::{
    BlockSpec, ExtractionMode, Offset, Rule, RuleBuilder, RuleEngine, RuleReport, TraceConfig,
    UntilSpec, ValidationReport,
};
pub use types::*;
