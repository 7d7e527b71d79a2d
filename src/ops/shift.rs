// ============================================================================
// CONTENT SHIFT — move painted cells, parking off-canvas ones in a buffer
// ============================================================================

use std::collections::BTreeMap;

use crate::grid::{CellColor, Grid};

/// Painted cells that currently sit outside the grid, keyed by their signed
/// `(row, col)`. A later shift that brings a key back in range moves the
/// cell into the grid again.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OffGridBuffer {
    cells: BTreeMap<(i64, i64), CellColor>,
}

impl OffGridBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn get(&self, row: i64, col: i64) -> Option<CellColor> {
        self.cells.get(&(row, col)).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = ((i64, i64), CellColor)> + '_ {
        self.cells.iter().map(|(k, v)| (*k, *v))
    }

    pub fn insert(&mut self, row: i64, col: i64, color: CellColor) {
        if color.is_painted() {
            self.cells.insert((row, col), color);
        }
    }

    pub fn clear(&mut self) {
        self.cells.clear();
    }
}

/// Translate every painted cell of `grid` and `buffer` by `(dx, dy)`.
///
/// Cells landing inside the grid are written into a fresh grid of the same
/// size (last writer wins: buffered cells are placed after grid cells);
/// everything else goes into a fresh buffer. Nothing is discarded.
pub fn shift(grid: &Grid, buffer: &OffGridBuffer, dx: i64, dy: i64) -> (Grid, OffGridBuffer) {
    if dx == 0 && dy == 0 {
        return (grid.clone(), buffer.clone());
    }

    let w = grid.width() as usize;
    let mut cells = vec![CellColor::None; grid.cells().len()];
    let mut parked = OffGridBuffer::new();

    let moved = grid
        .painted_cells()
        .map(|(r, c, color)| (r as i64, c as i64, color))
        .chain(buffer.iter().map(|((r, c), color)| (r, c, color)));

    for (row, col, color) in moved {
        let (nr, nc) = (row + dy, col + dx);
        if grid.contains(nr, nc) {
            cells[nr as usize * w + nc as usize] = color;
        } else {
            parked.insert(nr, nc, color);
        }
    }

    (Grid::from_parts(grid.width(), grid.height(), cells), parked)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::paint::set_cell;

    const B: CellColor = CellColor::Black;

    #[test]
    fn cell_leaves_and_returns() {
        let g = set_cell(&Grid::new(5, 5).unwrap(), 0, 0, B).unwrap();
        let (g1, buf1) = shift(&g, &OffGridBuffer::new(), -1, 0);
        assert!(g1.is_blank());
        assert_eq!(buf1.get(0, -1), Some(B));
        assert_eq!(buf1.len(), 1);

        let (g2, buf2) = shift(&g1, &buf1, 1, 0);
        assert_eq!(g2, g);
        assert!(buf2.is_empty());
    }

    #[test]
    fn zero_shift_is_identity() {
        let g = set_cell(&Grid::new(3, 3).unwrap(), 1, 1, B).unwrap();
        let mut buf = OffGridBuffer::new();
        buf.insert(-4, 2, CellColor::Red);
        let (g2, buf2) = shift(&g, &buf, 0, 0);
        assert_eq!(g2, g);
        assert_eq!(buf2, buf);
    }

    #[test]
    fn diagonal_shift_moves_whole_picture() {
        let g = set_cell(&Grid::new(4, 4).unwrap(), 1, 1, B).unwrap();
        let g = set_cell(&g, 1, 2, CellColor::Red).unwrap();
        let (out, buf) = shift(&g, &OffGridBuffer::new(), 1, 2);
        assert!(buf.is_empty());
        assert_eq!(out.get(3, 2), Some(B));
        assert_eq!(out.get(3, 3), Some(CellColor::Red));
        assert_eq!(out.painted_count(), 2);
    }

    #[test]
    fn buffer_survives_repeated_shifts() {
        let g = set_cell(&Grid::new(2, 2).unwrap(), 0, 1, B).unwrap();
        let (g, buf) = shift(&g, &OffGridBuffer::new(), 3, 0);
        let (g, buf) = shift(&g, &buf, 3, 0);
        assert!(g.is_blank());
        assert_eq!(buf.get(0, 7), Some(B));
        let (g, buf) = shift(&g, &buf, -6, 0);
        assert_eq!(g.get(0, 1), Some(B));
        assert!(buf.is_empty());
    }

    #[test]
    fn background_is_never_buffered() {
        let mut buf = OffGridBuffer::new();
        buf.insert(9, 9, CellColor::None);
        assert!(buf.is_empty());
    }
}
