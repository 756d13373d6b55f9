use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single cell read from the grid.
///
/// `Empty` is distinct from text that happens to be blank or "0": a cell
/// holding `""` is still `Text`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
}

impl CellValue {
    pub fn text(value: impl Into<String>) -> Self {
        CellValue::Text(value.into())
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// True for empty cells and for text that trims to nothing
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(text) => text.trim().is_empty(),
        }
    }

    /// Textual form; empty cells render as ""
    pub fn as_text(&self) -> &str {
        match self {
            CellValue::Empty => "",
            CellValue::Text(text) => text,
        }
    }

    pub fn contains(&self, keyword: &str) -> bool {
        match self {
            CellValue::Empty => false,
            CellValue::Text(text) => text.contains(keyword),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_text())
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(CellValue::Empty)
    }
}

/// 0-based grid coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coord {
    pub row: usize,
    pub col: usize,
}

impl Coord {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Shift by signed deltas; `None` when the result would fall before row/column 0
    pub fn offset(self, rows: isize, cols: isize) -> Option<Coord> {
        Some(Coord {
            row: self.row.checked_add_signed(rows)?,
            col: self.col.checked_add_signed(cols)?,
        })
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// One extracted row: `col_1`, `col_2`, ... in positional order
pub type Record = IndexMap<String, String>;

/// Ordered rows of one extracted rectangle
pub type Block = Vec<Record>;

/// What a single rule contributes to the output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SectionOutput {
    /// Non-looping rules: rows of the first anchor's block
    Single(Block),
    /// Looping rules: one block per anchor match, in scan order
    PerAnchor(Vec<Block>),
}

impl SectionOutput {
    pub fn block_count(&self) -> usize {
        match self {
            SectionOutput::Single(_) => 1,
            SectionOutput::PerAnchor(blocks) => blocks.len(),
        }
    }

    pub fn row_count(&self) -> usize {
        match self {
            SectionOutput::Single(block) => block.len(),
            SectionOutput::PerAnchor(blocks) => blocks.iter().map(Vec::len).sum(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            SectionOutput::Single(block) => block.is_empty(),
            SectionOutput::PerAnchor(blocks) => blocks.is_empty(),
        }
    }
}

/// Section name → extracted data, in rule order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExtractionOutput {
    pub sections: IndexMap<String, SectionOutput>,
}

impl ExtractionOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Later inserts for the same section replace the value but keep its position
    pub fn insert(&mut self, section: &str, output: SectionOutput) -> Option<SectionOutput> {
        self.sections.insert(section.to_string(), output)
    }

    pub fn section(&self, name: &str) -> Option<&SectionOutput> {
        self.sections.get(name)
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn total_rows(&self) -> usize {
        self.sections.values().map(SectionOutput::row_count).sum()
    }
}
