// ============================================================================
// HINT ENGINE — run-length clues for rows and columns
// ============================================================================

use serde::Serialize;

use crate::error::EditorError;
use crate::grid::{CellColor, Grid};

/// One clue: a run of `count` contiguous cells of `color`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Hint {
    pub count: u32,
    pub color: CellColor,
}

/// Clues for one line, in scan order. Never empty.
pub type HintSequence = Vec<Hint>;

/// Color carried by the `count == 0` entry of an empty line. It is never
/// drawn, so the choice only matters for equality checks.
pub const EMPTY_LINE_COLOR: CellColor = CellColor::Black;

fn empty_line() -> HintSequence {
    vec![Hint {
        count: 0,
        color: EMPTY_LINE_COLOR,
    }]
}

/// Hints for any sequence of cells.
///
/// A `None` cell ends the pending run; so does a change of color, even with
/// no gap in between.
pub fn line_hints<I>(line: I) -> HintSequence
where
    I: IntoIterator<Item = CellColor>,
{
    let mut hints = Vec::new();
    let mut run = 0u32;
    let mut run_color = CellColor::None;

    for cell in line {
        if !cell.is_painted() {
            if run > 0 {
                hints.push(Hint {
                    count: run,
                    color: run_color,
                });
                run = 0;
            }
            continue;
        }
        if run > 0 && cell != run_color {
            hints.push(Hint {
                count: run,
                color: run_color,
            });
            run = 0;
        }
        run += 1;
        run_color = cell;
    }
    if run > 0 {
        hints.push(Hint {
            count: run,
            color: run_color,
        });
    }

    if hints.is_empty() { empty_line() } else { hints }
}

pub fn row_hints(grid: &Grid, row: u32) -> Result<HintSequence, EditorError> {
    let cells = grid.row(row).ok_or(EditorError::OutOfBounds {
        row: row as i64,
        col: 0,
        width: grid.width(),
        height: grid.height(),
    })?;
    Ok(line_hints(cells.iter().copied()))
}

pub fn column_hints(grid: &Grid, col: u32) -> Result<HintSequence, EditorError> {
    let cells = grid.column(col).ok_or(EditorError::OutOfBounds {
        row: 0,
        col: col as i64,
        width: grid.width(),
        height: grid.height(),
    })?;
    Ok(line_hints(cells))
}

/// Longest row hint sequence (at least 1).
pub fn max_row_hints(grid: &Grid) -> usize {
    grid.rows()
        .map(|r| line_hints(r.iter().copied()).len())
        .max()
        .unwrap_or(1)
}

/// Longest column hint sequence (at least 1).
pub fn max_column_hints(grid: &Grid) -> usize {
    (0..grid.width())
        .filter_map(|c| grid.column(c))
        .map(|c| line_hints(c).len())
        .max()
        .unwrap_or(1)
}

// ============================================================================
// LAYOUT
// ============================================================================

/// All clues for a grid plus the sizes a renderer needs.
///
/// Recompute with [`HintLayout::compute`] whenever the grid changes; it holds
/// no reference to the grid it came from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HintLayout {
    pub rows: Vec<HintSequence>,
    pub columns: Vec<HintSequence>,
    pub max_row_hints: usize,
    pub max_column_hints: usize,
}

impl HintLayout {
    pub fn compute(grid: &Grid) -> Self {
        let rows: Vec<HintSequence> = grid.rows().map(|r| line_hints(r.iter().copied())).collect();
        let columns: Vec<HintSequence> = (0..grid.width())
            .filter_map(|c| grid.column(c))
            .map(line_hints)
            .collect();
        let max_row_hints = rows.iter().map(Vec::len).max().unwrap_or(1);
        let max_column_hints = columns.iter().map(Vec::len).max().unwrap_or(1);
        Self {
            rows,
            columns,
            max_row_hints,
            max_column_hints,
        }
    }

    /// Render columns: hint slots on the left plus the grid width.
    pub fn total_columns(&self) -> usize {
        self.columns.len() + self.max_row_hints
    }

    /// Render rows: hint slots on top plus the grid height.
    pub fn total_rows(&self) -> usize {
        self.rows.len() + self.max_column_hints
    }

    fn slot_width(&self) -> usize {
        self.rows
            .iter()
            .chain(self.columns.iter())
            .flatten()
            .map(|h| h.count.to_string().len())
            .max()
            .unwrap_or(1)
    }

    /// Plain-text puzzle: column clues bottom-aligned on top, row clues
    /// right-aligned on the left, one glyph per cell. Empty-line entries
    /// render blank.
    pub fn render_text(&self, grid: &Grid) -> String {
        let slot = self.slot_width();
        let blank = " ".repeat(slot);
        let mut out = String::new();

        for line in 0..self.max_column_hints {
            let mut text = String::new();
            for _ in 0..self.max_row_hints {
                text.push_str(&blank);
                text.push(' ');
            }
            for seq in &self.columns {
                let offset = self.max_column_hints - seq.len();
                if line >= offset {
                    text.push_str(&hint_slot(&seq[line - offset], slot));
                } else {
                    text.push_str(&blank);
                }
                text.push(' ');
            }
            out.push_str(text.trim_end());
            out.push('\n');
        }

        for (seq, cells) in self.rows.iter().zip(grid.rows()) {
            let mut text = String::new();
            let offset = self.max_row_hints - seq.len();
            for i in 0..self.max_row_hints {
                if i >= offset {
                    text.push_str(&hint_slot(&seq[i - offset], slot));
                } else {
                    text.push_str(&blank);
                }
                text.push(' ');
            }
            for cell in cells {
                text.push_str(&format!("{:>slot$} ", cell.glyph()));
            }
            out.push_str(text.trim_end());
            out.push('\n');
        }
        out
    }
}

fn hint_slot(hint: &Hint, slot: usize) -> String {
    if hint.count == 0 {
        " ".repeat(slot)
    } else {
        format!("{:>slot$}", hint.count)
    }
}
