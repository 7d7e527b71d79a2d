//! Property-based invariant tests for grids, hints, painting and shifting.
//!
//! 1. Row and column hint counts add up to the painted cells of the line.
//! 2. Hint sequences are never empty.
//! 3. Hint runs never hold `None` and adjacent runs of one color never touch.
//! 4. `set_cell` changes exactly one cell.
//! 5. Flood fill is idempotent.
//! 6. Flood fill only recolors cells that had the start cell's color.
//! 7. Shifting forward and back restores the grid and empties the buffer.
//! 8. Shifting never loses painted cells.
//! 9. Grids survive a JSON round trip.

use nonomaker::grid::{CellColor, Grid};
use nonomaker::hints::{column_hints, row_hints};
use nonomaker::ops::paint::{flood_fill, set_cell};
use nonomaker::ops::shift::{OffGridBuffer, shift};
use nonomaker::EditorError;
use proptest::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────────

fn color_strategy() -> impl Strategy<Value = CellColor> {
    (0usize..CellColor::ALL.len()).prop_map(|i| CellColor::ALL[i])
}

/// Mostly-empty palette so runs and gaps both show up.
fn sparse_color_strategy() -> impl Strategy<Value = CellColor> {
    prop_oneof![
        3 => Just(CellColor::None),
        2 => Just(CellColor::Black),
        1 => Just(CellColor::Red),
        1 => Just(CellColor::Blue),
    ]
}

fn grid_strategy() -> impl Strategy<Value = Grid> {
    (1usize..=12, 1usize..=12).prop_flat_map(|(w, h)| {
        proptest::collection::vec(proptest::collection::vec(sparse_color_strategy(), w), h)
            .prop_map(|rows| Grid::try_from(rows).expect("rectangular rows"))
    })
}

fn grid_and_cell() -> impl Strategy<Value = (Grid, i64, i64)> {
    grid_strategy().prop_flat_map(|g| {
        let (w, h) = (g.width() as i64, g.height() as i64);
        (Just(g), 0..h, 0..w)
    })
}

fn line_painted(line: &[CellColor]) -> u32 {
    line.iter().filter(|c| c.is_painted()).count() as u32
}

// ═════════════════════════════════════════════════════════════════════════
// 1–3. Hints
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn hint_counts_match_painted_cells(g in grid_strategy()) {
        for r in 0..g.height() {
            let hints = row_hints(&g, r).unwrap();
            let sum: u32 = hints.iter().map(|h| h.count).sum();
            prop_assert_eq!(sum, line_painted(g.row(r).unwrap()), "row {} of {:?}", r, g);
        }
        for c in 0..g.width() {
            let hints = column_hints(&g, c).unwrap();
            let sum: u32 = hints.iter().map(|h| h.count).sum();
            prop_assert_eq!(sum, line_painted(&g.column(c).unwrap()), "column {}", c);
        }
    }

    #[test]
    fn hints_never_empty(g in grid_strategy()) {
        for r in 0..g.height() {
            prop_assert!(!row_hints(&g, r).unwrap().is_empty());
        }
        for c in 0..g.width() {
            prop_assert!(!column_hints(&g, c).unwrap().is_empty());
        }
    }

    #[test]
    fn hint_runs_are_painted_and_nonzero(g in grid_strategy()) {
        for r in 0..g.height() {
            let hints = row_hints(&g, r).unwrap();
            if line_painted(g.row(r).unwrap()) == 0 {
                prop_assert_eq!(hints.len(), 1);
                prop_assert_eq!(hints[0].count, 0);
            } else {
                for h in &hints {
                    prop_assert!(h.count > 0);
                    prop_assert!(h.color.is_painted());
                }
            }
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 4. set_cell is pointwise
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn set_cell_changes_one_cell((g, r, c) in grid_and_cell(), color in color_strategy()) {
        let out = set_cell(&g, r, c, color).unwrap();
        prop_assert_eq!(out.cell(r, c).unwrap(), color);
        for row in 0..g.height() {
            for col in 0..g.width() {
                if (row as i64, col as i64) != (r, c) {
                    prop_assert_eq!(out.get(row, col), g.get(row, col));
                }
            }
        }
    }

    #[test]
    fn set_cell_rejects_outside(g in grid_strategy(), dr in 0i64..4, dc in 0i64..4) {
        let r = g.height() as i64 + dr;
        let c = -1 - dc;
        let rejected = matches!(set_cell(&g, r, 0, CellColor::Black), Err(EditorError::OutOfBounds { .. }));
        prop_assert!(rejected);
        let rejected = matches!(set_cell(&g, 0, c, CellColor::Black), Err(EditorError::OutOfBounds { .. }));
        prop_assert!(rejected);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 5–6. Flood fill
// ═════════════════════════════════════════════════════════════════════════

fn fill_or_same(g: &Grid, r: i64, c: i64, color: CellColor) -> Grid {
    match flood_fill(g, r, c, color) {
        Ok(out) => out,
        Err(EditorError::NoOpFill) => g.clone(),
        Err(e) => panic!("unexpected fill error: {}", e),
    }
}

proptest! {
    #[test]
    fn flood_fill_idempotent((g, r, c) in grid_and_cell(), color in color_strategy()) {
        let once = fill_or_same(&g, r, c, color);
        let twice = fill_or_same(&once, r, c, color);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn flood_fill_only_touches_target_color((g, r, c) in grid_and_cell(), color in color_strategy()) {
        let target = g.cell(r, c).unwrap();
        let out = fill_or_same(&g, r, c, color);
        for (before, after) in g.cells().iter().zip(out.cells()) {
            if before != after {
                prop_assert_eq!(*before, target);
                prop_assert_eq!(*after, color);
            }
        }
        prop_assert_eq!(out.cell(r, c).unwrap(), color);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 7–8. Shift
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn shift_round_trip(g in grid_strategy(), dx in -15i64..=15, dy in -15i64..=15) {
        let (moved, buf) = shift(&g, &OffGridBuffer::new(), dx, dy);
        let (back, rest) = shift(&moved, &buf, -dx, -dy);
        prop_assert_eq!(back, g);
        prop_assert!(rest.is_empty());
    }

    #[test]
    fn shift_conserves_painted_cells(g in grid_strategy(), dx in -15i64..=15, dy in -15i64..=15) {
        let (moved, buf) = shift(&g, &OffGridBuffer::new(), dx, dy);
        prop_assert_eq!(moved.painted_count() + buf.len(), g.painted_count());
        prop_assert_eq!((moved.width(), moved.height()), (g.width(), g.height()));
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 9. Serialization
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn grid_json_round_trip(g in grid_strategy()) {
        let json = serde_json::to_string(&g).unwrap();
        let back: Grid = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(back, g);
    }
}
