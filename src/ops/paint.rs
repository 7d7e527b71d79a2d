// ============================================================================
// PAINT OPERATIONS — single cell, batched edits, flood fill, tools
// ============================================================================

use std::collections::VecDeque;

use crate::error::EditorError;
use crate::grid::{CellColor, Grid};

/// One cell write for [`set_cells`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellEdit {
    pub row: i64,
    pub col: i64,
    pub color: CellColor,
}

impl CellEdit {
    pub fn new(row: i64, col: i64, color: CellColor) -> Self {
        Self { row, col, color }
    }
}

/// Copy of `grid` with `(row, col)` set to `color`.
pub fn set_cell(grid: &Grid, row: i64, col: i64, color: CellColor) -> Result<Grid, EditorError> {
    let idx = grid.index_of(row, col)?;
    let mut cells = grid.cells().to_vec();
    cells[idx] = color;
    Ok(Grid::from_parts(grid.width(), grid.height(), cells))
}

/// Apply many writes as one update. Every coordinate is checked before
/// anything is written, so a bad entry leaves no partial result behind.
/// Later entries win when two target the same cell.
pub fn set_cells(grid: &Grid, edits: &[CellEdit]) -> Result<Grid, EditorError> {
    let indices = edits
        .iter()
        .map(|e| grid.index_of(e.row, e.col))
        .collect::<Result<Vec<_>, _>>()?;

    let mut cells = grid.cells().to_vec();
    for (idx, edit) in indices.into_iter().zip(edits) {
        cells[idx] = edit.color;
    }
    Ok(Grid::from_parts(grid.width(), grid.height(), cells))
}

/// 4-connected fill from `(row, col)` over every cell that shares the start
/// cell's color.
///
/// Breadth-first with an explicit queue, so region size never touches the
/// call stack. Returns `NoOpFill` when the start cell already has `color`.
pub fn flood_fill(grid: &Grid, row: i64, col: i64, color: CellColor) -> Result<Grid, EditorError> {
    let start = grid.index_of(row, col)?;
    let target = grid.cells()[start];
    if target == color {
        return Err(EditorError::NoOpFill);
    }

    let w = grid.width() as usize;
    let h = grid.height() as usize;
    let mut cells = grid.cells().to_vec();
    let mut visited = vec![false; w * h];
    let mut queue = VecDeque::new();

    visited[start] = true;
    queue.push_back(start);

    while let Some(idx) = queue.pop_front() {
        cells[idx] = color;
        let x = idx % w;
        let y = idx / w;

        let mut visit = |ni: usize| {
            if !visited[ni] && grid.cells()[ni] == target {
                visited[ni] = true;
                queue.push_back(ni);
            }
        };
        // Up, down, left, right
        if y > 0 {
            visit(idx - w);
        }
        if y + 1 < h {
            visit(idx + w);
        }
        if x > 0 {
            visit(idx - 1);
        }
        if x + 1 < w {
            visit(idx + 1);
        }
    }

    Ok(Grid::from_parts(grid.width(), grid.height(), cells))
}

/// Click behavior of the editor: an empty cell takes `paint`, any painted
/// cell is cleared.
pub fn toggle_cell(grid: &Grid, row: i64, col: i64, paint: CellColor) -> Result<Grid, EditorError> {
    let current = grid.cell(row, col)?;
    let next = if current.is_painted() {
        CellColor::None
    } else {
        paint
    };
    set_cell(grid, row, col, next)
}

/// Editing tool selected in the toolbar.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Tool {
    #[default]
    Draw,
    Erase,
    Fill,
}

impl Tool {
    pub fn label(&self) -> &'static str {
        match self {
            Tool::Draw => "draw",
            Tool::Erase => "erase",
            Tool::Fill => "fill",
        }
    }
}

/// Apply `tool` at one cell using `color` as the active palette entry.
pub fn apply_tool(
    grid: &Grid,
    tool: Tool,
    row: i64,
    col: i64,
    color: CellColor,
) -> Result<Grid, EditorError> {
    match tool {
        Tool::Draw => set_cell(grid, row, col, color),
        Tool::Erase => set_cell(grid, row, col, CellColor::None),
        Tool::Fill => flood_fill(grid, row, col, color),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const B: CellColor = CellColor::Black;
    const R: CellColor = CellColor::Red;
    const N: CellColor = CellColor::None;

    fn grid(rows: Vec<Vec<CellColor>>) -> Grid {
        Grid::try_from(rows).unwrap()
    }

    #[test]
    fn set_cell_changes_only_target() {
        let g = Grid::new(3, 2).unwrap();
        let out = set_cell(&g, 1, 2, R).unwrap();
        assert_eq!(out.get(1, 2), Some(R));
        assert_eq!(out.painted_count(), 1);
        assert!(g.is_blank(), "original must be untouched");
    }

    #[test]
    fn set_cell_out_of_bounds_fails() {
        let g = Grid::new(3, 2).unwrap();
        assert!(matches!(set_cell(&g, 2, 0, B), Err(EditorError::OutOfBounds { .. })));
        assert!(matches!(set_cell(&g, 0, -1, B), Err(EditorError::OutOfBounds { .. })));
    }

    #[test]
    fn set_cells_is_all_or_nothing() {
        let g = Grid::new(3, 3).unwrap();
        let edits = [CellEdit::new(0, 0, B), CellEdit::new(5, 5, B)];
        assert!(set_cells(&g, &edits).is_err());

        let edits = [CellEdit::new(0, 0, B), CellEdit::new(2, 2, R), CellEdit::new(0, 0, R)];
        let out = set_cells(&g, &edits).unwrap();
        assert_eq!(out.get(0, 0), Some(R));
        assert_eq!(out.get(2, 2), Some(R));
        assert_eq!(out.painted_count(), 2);
    }

    #[test]
    fn flood_fill_stays_inside_region() {
        let g = grid(vec![
            vec![N, N, B, N],
            vec![N, B, B, N],
            vec![B, N, N, N],
        ]);
        let out = flood_fill(&g, 0, 0, R).unwrap();
        assert_eq!(
            out.to_rows(),
            vec![vec![R, R, B, N], vec![R, B, B, N], vec![B, N, N, N]]
        );
    }

    #[test]
    fn flood_fill_is_four_connected() {
        // Diagonal neighbors do not join the region.
        let g = grid(vec![vec![B, N], vec![N, B]]);
        let out = flood_fill(&g, 0, 0, R).unwrap();
        assert_eq!(out.to_rows(), vec![vec![R, N], vec![N, B]]);
    }

    #[test]
    fn flood_fill_same_color_is_noop() {
        let g = grid(vec![vec![B, B]]);
        assert_eq!(flood_fill(&g, 0, 1, B), Err(EditorError::NoOpFill));
    }

    #[test]
    fn flood_fill_handles_large_open_grid() {
        let g = Grid::new(200, 200).unwrap();
        let out = flood_fill(&g, 100, 100, B).unwrap();
        assert_eq!(out.painted_count(), 40_000);
    }

    #[test]
    fn toggle_flips_between_paint_and_empty() {
        let g = Grid::new(2, 2).unwrap();
        let on = toggle_cell(&g, 0, 1, R).unwrap();
        assert_eq!(on.get(0, 1), Some(R));
        let off = toggle_cell(&on, 0, 1, B).unwrap();
        assert_eq!(off.get(0, 1), Some(N));
    }

    #[test]
    fn tools_dispatch() {
        let g = grid(vec![vec![B, B, N]]);
        let erased = apply_tool(&g, Tool::Erase, 0, 0, R).unwrap();
        assert_eq!(erased.to_rows(), vec![vec![N, B, N]]);
        let drawn = apply_tool(&g, Tool::Draw, 0, 2, R).unwrap();
        assert_eq!(drawn.to_rows(), vec![vec![B, B, R]]);
        let filled = apply_tool(&g, Tool::Fill, 0, 0, R).unwrap();
        assert_eq!(filled.to_rows(), vec![vec![R, R, N]]);
        assert_eq!(Tool::default().label(), "draw");
    }
}
