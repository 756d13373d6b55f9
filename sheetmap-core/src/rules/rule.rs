use serde::{Deserialize, Serialize};
use std::fmt;

/// Widest sheet a workbook can hold (xlsx, column XFD)
pub const MAX_COLUMNS: usize = 16_384;

/// Signed (rows, cols) displacement
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offset {
    #[serde(default)]
    pub rows: isize,
    #[serde(default)]
    pub cols: isize,
}

impl Offset {
    pub fn new(rows: isize, cols: isize) -> Self {
        Self { rows, cols }
    }
}

/// 2-D block extraction: anchor → skip → extract start, bounded by a column delta
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockSpec {
    /// Applied to the anchor to get the base coordinate
    pub skip: Offset,
    /// Applied to the base to get the first cell read
    pub start: Offset,
    /// Rightmost column read, relative to the base column (inclusive)
    pub stop_col: isize,
    /// Extract at every anchor match instead of only the first
    pub repeat: bool,
}

/// Whole-row harvesting from below the anchor row until a stop keyword
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UntilSpec {
    /// Rows skipped after the anchor row before reading
    pub skip_rows: usize,
    /// Reading stops before the first row whose text contains this
    pub stop_before: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionMode {
    Block(BlockSpec),
    UntilKeyword(UntilSpec),
}

/// A validated extraction rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    /// Keyword locating the anchor; `None` disables the rule
    pub anchor: Option<String>,
    /// Output key
    pub section: String,
    pub mode: ExtractionMode,
}

impl Rule {
    pub fn is_disabled(&self) -> bool {
        self.anchor.is_none()
    }

    pub fn repeats(&self) -> bool {
        matches!(&self.mode, ExtractionMode::Block(spec) if spec.repeat)
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let anchor = self.anchor.as_deref().unwrap_or("<disabled>");
        match &self.mode {
            ExtractionMode::Block(spec) => write!(
                f,
                "{} <- block at '{}' skip ({}, {}) start ({}, {}) stop_col {}{}",
                self.section,
                anchor,
                spec.skip.rows,
                spec.skip.cols,
                spec.start.rows,
                spec.start.cols,
                spec.stop_col,
                if spec.repeat { " [loop]" } else { "" }
            ),
            ExtractionMode::UntilKeyword(spec) => write!(
                f,
                "{} <- rows after '{}' skip {} until {}",
                self.section,
                anchor,
                spec.skip_rows,
                spec.stop_before
                    .as_deref()
                    .map(|kw| format!("'{kw}'"))
                    .unwrap_or_else(|| "end of sheet".to_string())
            ),
        }
    }
}
