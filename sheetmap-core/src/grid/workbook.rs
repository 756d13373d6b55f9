// Workbook loading
//
// Reads one sheet of a workbook into a SheetGrid snapshot. The whole sheet is
// copied before the engine sees it, so a corrupt file fails here rather than
// halfway through a rule set.

use super::{Grid, SheetGrid};
use crate::error::{ExtractError, ExtractResult};
use crate::types::CellValue;
use calamine::{open_workbook_auto, open_workbook_auto_from_rs, Data, DataType, Range, Reader};
use chrono::{NaiveDateTime, Timelike};
use std::io::{Cursor, Read, Seek};
use std::path::Path;
use tracing::debug;

/// Which sheet of a workbook to read
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SheetSelector {
    /// The first sheet in workbook order
    #[default]
    First,
    Named(String),
}

impl SheetSelector {
    pub fn from_option(name: Option<&str>) -> Self {
        match name {
            Some(name) if !name.trim().is_empty() => SheetSelector::Named(name.to_string()),
            _ => SheetSelector::First,
        }
    }
}

/// Load a sheet from a workbook file (format chosen by extension)
pub fn load_sheet(path: &Path, selector: &SheetSelector) -> ExtractResult<SheetGrid> {
    let mut workbook =
        open_workbook_auto(path).map_err(|e| ExtractError::grid_access(path, e))?;
    read_selected(&mut workbook, selector).map_err(|reason| ExtractError::grid_access(path, reason))
}

/// Load a sheet from in-memory workbook bytes (format sniffed from content).
///
/// `origin` only labels errors.
pub fn load_sheet_from_bytes(
    bytes: Vec<u8>,
    selector: &SheetSelector,
    origin: &Path,
) -> ExtractResult<SheetGrid> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| ExtractError::grid_access(origin, e))?;
    read_selected(&mut workbook, selector)
        .map_err(|reason| ExtractError::grid_access(origin, reason))
}

fn read_selected<RS, R>(workbook: &mut R, selector: &SheetSelector) -> Result<SheetGrid, String>
where
    RS: Read + Seek,
    R: Reader<RS>,
    R::Error: std::fmt::Display,
{
    let names = workbook.sheet_names().to_vec();
    let name = match selector {
        SheetSelector::First => names
            .first()
            .cloned()
            .ok_or_else(|| "workbook has no sheets".to_string())?,
        SheetSelector::Named(wanted) => {
            if !names.iter().any(|n| n == wanted) {
                return Err(format!(
                    "sheet '{}' not found (available: {})",
                    wanted,
                    names.join(", ")
                ));
            }
            wanted.clone()
        }
    };

    let range = workbook
        .worksheet_range(&name)
        .map_err(|e| format!("failed to read sheet '{name}': {e}"))?;
    let grid = grid_from_range(&range);
    debug!(sheet = %name, rows = grid.row_count(), "loaded sheet");
    Ok(grid)
}

/// Copy a calamine range into a grid addressed from A1.
///
/// Used ranges that start below or right of A1 keep their absolute
/// coordinates; the cells before the range read as empty.
pub fn grid_from_range(range: &Range<Data>) -> SheetGrid {
    let Some((end_row, end_col)) = range.end() else {
        return SheetGrid::default();
    };

    let rows = (0..=end_row)
        .map(|row| {
            (0..=end_col)
                .map(|col| range.get_value((row, col)).map_or(CellValue::Empty, cell_from_data))
                .collect()
        })
        .collect();
    SheetGrid::new(rows)
}

fn cell_from_data(data: &Data) -> CellValue {
    match data {
        Data::Empty => CellValue::Empty,
        Data::String(text) => CellValue::Text(text.clone()),
        Data::Bool(true) => CellValue::text("True"),
        Data::Bool(false) => CellValue::text("False"),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(datetime) => CellValue::Text(format_datetime(&datetime)),
            None => CellValue::Text(dt.as_f64().to_string()),
        },
        Data::DateTimeIso(raw) => match data.as_datetime() {
            Some(datetime) => CellValue::Text(format_datetime(&datetime)),
            None => CellValue::Text(raw.clone()),
        },
        other => CellValue::Text(other.to_string()),
    }
}

/// `2024-01-15 00:00:00`, with microseconds only when present
fn format_datetime(datetime: &NaiveDateTime) -> String {
    if datetime.nanosecond() == 0 {
        datetime.format("%Y-%m-%d %H:%M:%S").to_string()
    } else {
        datetime.format("%Y-%m-%d %H:%M:%S%.6f").to_string()
    }
}
