//! Grid access
//!
//! The engine reads spreadsheets only through the [`Grid`] trait, so any
//! source that can answer "what is at (row, col)" can be extracted from.
//!
//! ```text
//! Workbook (.xlsx, .ods, ...)
//!     ↓
//! [workbook::load_sheet]
//!     ↓
//! SheetGrid (owned snapshot)
//!     ↓
//! [RuleEngine]
//! ```

pub mod workbook;

pub use workbook::{load_sheet, load_sheet_from_bytes, SheetSelector};

use crate::types::CellValue;

/// Read-only 2-D view over one sheet, addressed by 0-based row/column.
///
/// Everything beyond `dimensions()` reads as [`CellValue::Empty`]; lookups
/// never fail.
pub trait Grid {
    /// (row count, column count)
    fn dimensions(&self) -> (usize, usize);

    /// Cell at (row, col), or `Empty` when out of range
    fn cell_at(&self, row: usize, col: usize) -> CellValue;

    fn row_count(&self) -> usize {
        self.dimensions().0
    }

    fn col_count(&self) -> usize {
        self.dimensions().1
    }

    /// The full-width row, padded with `Empty` past the populated cells
    fn row_values(&self, row: usize) -> Vec<CellValue> {
        (0..self.col_count()).map(|col| self.cell_at(row, col)).collect()
    }

    /// All cells of the row joined by a single space, empty cells as ""
    fn row_text(&self, row: usize) -> String {
        (0..self.col_count())
            .map(|col| self.cell_at(row, col).as_text().to_string())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Owned, immutable row-major snapshot of a sheet. Rows may be ragged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SheetGrid {
    rows: Vec<Vec<CellValue>>,
    col_count: usize,
}

impl SheetGrid {
    pub fn new(rows: Vec<Vec<CellValue>>) -> Self {
        let col_count = rows.iter().map(Vec::len).max().unwrap_or(0);
        Self { rows, col_count }
    }

    /// Build from plain strings; every cell becomes `Text`, including ""
    pub fn from_rows<R, S>(rows: R) -> Self
    where
        R: IntoIterator,
        R::Item: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            rows.into_iter()
                .map(|row| row.into_iter().map(|s| CellValue::Text(s.into())).collect())
                .collect(),
        )
    }

    /// Build from optional strings; `None` becomes `Empty`
    pub fn from_optional_rows<R, S>(rows: R) -> Self
    where
        R: IntoIterator,
        R::Item: IntoIterator<Item = Option<S>>,
        S: Into<String>,
    {
        Self::new(
            rows.into_iter()
                .map(|row| {
                    row.into_iter()
                        .map(|cell| cell.map_or(CellValue::Empty, |s| CellValue::Text(s.into())))
                        .collect()
                })
                .collect(),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl Grid for SheetGrid {
    fn dimensions(&self) -> (usize, usize) {
        (self.rows.len(), self.col_count)
    }

    fn cell_at(&self, row: usize, col: usize) -> CellValue {
        self.rows
            .get(row)
            .and_then(|cells| cells.get(col))
            .cloned()
            .unwrap_or_default()
    }
}
