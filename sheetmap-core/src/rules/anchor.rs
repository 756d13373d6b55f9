// Anchor lookup
//
// Matching is case-sensitive substring containment. An empty keyword never
// matches anything. Scans run row-major: top to bottom, left to right.

use crate::grid::Grid;
use crate::types::Coord;

/// First row whose space-joined text contains `keyword`
pub fn find_keyword_row<G: Grid + ?Sized>(grid: &G, keyword: &str) -> Option<usize> {
    if keyword.is_empty() {
        return None;
    }
    (0..grid.row_count()).find(|&row| grid.row_text(row).contains(keyword))
}

/// Every cell whose text contains `keyword`, in scan order
pub fn find_all_cells<G: Grid + ?Sized>(grid: &G, keyword: &str) -> Vec<Coord> {
    cell_matches(grid, keyword).collect()
}

/// First matching cell in scan order
pub fn find_first_cell<G: Grid + ?Sized>(grid: &G, keyword: &str) -> Option<Coord> {
    cell_matches(grid, keyword).next()
}

fn cell_matches<'a, G: Grid + ?Sized>(
    grid: &'a G,
    keyword: &'a str,
) -> impl Iterator<Item = Coord> + 'a {
    let (rows, cols) = if keyword.is_empty() {
        (0, 0)
    } else {
        grid.dimensions()
    };
    (0..rows)
        .flat_map(move |row| (0..cols).map(move |col| Coord::new(row, col)))
        .filter(move |coord| grid.cell_at(coord.row, coord.col).contains(keyword))
}
