// Block extraction
//
// Two stop policies, both reading downward from an absolute origin:
// - extract_until: whole rows until a row containing the stop keyword; blank
//   rows are skipped, not terminators
// - extract_block: the column range [start_col, stop_col] until the first row
//   whose cells in that range are all empty

use crate::grid::Grid;
use crate::types::{Block, CellValue, Record};

/// Full-width rows from `start_row` until the stop keyword or the last row.
///
/// The row containing the stop keyword is not included. Rows where every
/// cell trims to nothing are dropped.
pub fn extract_until<G: Grid + ?Sized>(
    grid: &G,
    start_row: usize,
    stop_keyword: Option<&str>,
) -> Vec<Vec<CellValue>> {
    let stop_keyword = stop_keyword.filter(|kw| !kw.is_empty());
    let mut rows = Vec::new();

    for row in start_row..grid.row_count() {
        if let Some(keyword) = stop_keyword {
            if grid.row_text(row).contains(keyword) {
                break;
            }
        }
        let values = grid.row_values(row);
        if values.iter().any(|cell| !cell.is_blank()) {
            rows.push(values);
        }
    }

    rows
}

/// Rows of `[start_col, stop_col]` from `start_row` until an all-empty row.
///
/// The terminating row is not included. Only truly empty cells count as
/// empty here; a cell holding whitespace keeps the block going.
pub fn extract_block<G: Grid + ?Sized>(
    grid: &G,
    start_row: usize,
    start_col: usize,
    stop_col: usize,
) -> Vec<Vec<CellValue>> {
    let mut rows = Vec::new();

    for row in start_row..grid.row_count() {
        let values: Vec<CellValue> = (start_col..=stop_col)
            .map(|col| grid.cell_at(row, col))
            .collect();
        if values.iter().all(CellValue::is_empty) {
            break;
        }
        rows.push(values);
    }

    rows
}

/// Label cells `col_1..col_N` in positional order
pub fn to_records(rows: Vec<Vec<CellValue>>) -> Block {
    rows.into_iter()
        .map(|row| {
            row.into_iter()
                .enumerate()
                .map(|(i, cell)| {
                    let text = match cell {
                        CellValue::Empty => String::new(),
                        CellValue::Text(text) => text,
                    };
                    (format!("col_{}", i + 1), text)
                })
                .collect::<Record>()
        })
        .collect()
}
