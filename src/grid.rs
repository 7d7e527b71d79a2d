// ============================================================================
// GRID MODEL — cell palette, immutable grid value, size presets
// ============================================================================

use serde::{Deserialize, Serialize};

use crate::error::EditorError;

/// Cell color tag. `None` is the background and the only "unpainted" value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellColor {
    #[default]
    None,
    Black,
    Red,
    Blue,
    Green,
    Yellow,
    Purple,
    Orange,
    Pink,
    Brown,
    Gray,
    Cyan,
    Magenta,
}

impl CellColor {
    /// Palette order as shown by the editor (background first).
    pub const ALL: [CellColor; 13] = [
        CellColor::None,
        CellColor::Black,
        CellColor::Red,
        CellColor::Blue,
        CellColor::Green,
        CellColor::Yellow,
        CellColor::Purple,
        CellColor::Orange,
        CellColor::Pink,
        CellColor::Brown,
        CellColor::Gray,
        CellColor::Cyan,
        CellColor::Magenta,
    ];

    pub fn is_painted(self) -> bool {
        self != CellColor::None
    }

    /// Lowercase tag used in save files and on the command line.
    pub fn tag(self) -> &'static str {
        match self {
            CellColor::None => "none",
            CellColor::Black => "black",
            CellColor::Red => "red",
            CellColor::Blue => "blue",
            CellColor::Green => "green",
            CellColor::Yellow => "yellow",
            CellColor::Purple => "purple",
            CellColor::Orange => "orange",
            CellColor::Pink => "pink",
            CellColor::Brown => "brown",
            CellColor::Gray => "gray",
            CellColor::Cyan => "cyan",
            CellColor::Magenta => "magenta",
        }
    }

    /// CSS named-color value. The background renders white.
    pub fn rgb(self) -> [u8; 3] {
        match self {
            CellColor::None => [255, 255, 255],
            CellColor::Black => [0, 0, 0],
            CellColor::Red => [255, 0, 0],
            CellColor::Blue => [0, 0, 255],
            CellColor::Green => [0, 128, 0],
            CellColor::Yellow => [255, 255, 0],
            CellColor::Purple => [128, 0, 128],
            CellColor::Orange => [255, 165, 0],
            CellColor::Pink => [255, 192, 203],
            CellColor::Brown => [165, 42, 42],
            CellColor::Gray => [128, 128, 128],
            CellColor::Cyan => [0, 255, 255],
            CellColor::Magenta => [255, 0, 255],
        }
    }

    /// Single glyph for text previews.
    pub fn glyph(self) -> char {
        match self {
            CellColor::None => '.',
            CellColor::Black => '#',
            CellColor::Red => 'r',
            CellColor::Blue => 'b',
            CellColor::Green => 'g',
            CellColor::Yellow => 'y',
            CellColor::Purple => 'p',
            CellColor::Orange => 'o',
            CellColor::Pink => 'i',
            CellColor::Brown => 'w',
            CellColor::Gray => 'a',
            CellColor::Cyan => 'c',
            CellColor::Magenta => 'm',
        }
    }
}

impl std::fmt::Display for CellColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

impl std::str::FromStr for CellColor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        // The palette labels the background swatch "white".
        if s == "white" {
            return Ok(CellColor::None);
        }
        if s == "grey" {
            return Ok(CellColor::Gray);
        }
        CellColor::ALL
            .iter()
            .copied()
            .find(|c| c.tag() == s)
            .ok_or_else(|| format!("unknown color '{}'", s))
    }
}

// ============================================================================
// GRID
// ============================================================================

/// Row-major, rectangular grid of cell colors.
///
/// A `Grid` is a value: operations that "change" it hand back a new grid
/// and leave the original untouched, so callers can keep old grids around
/// as undo snapshots.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<CellColor>>", into = "Vec<Vec<CellColor>>")]
pub struct Grid {
    width: u32,
    height: u32,
    cells: Vec<CellColor>,
}

impl Grid {
    /// Empty (`None` everywhere) grid. Both sides must be at least 1.
    pub fn new(width: u32, height: u32) -> Result<Self, EditorError> {
        Self::filled(width, height, CellColor::None)
    }

    pub fn filled(width: u32, height: u32, color: CellColor) -> Result<Self, EditorError> {
        if width == 0 || height == 0 {
            return Err(EditorError::InvalidDimensions { width, height });
        }
        Ok(Self {
            width,
            height,
            cells: vec![color; width as usize * height as usize],
        })
    }

    /// Caller guarantees `cells.len() == width * height` with both sides > 0.
    pub(crate) fn from_parts(width: u32, height: u32, cells: Vec<CellColor>) -> Self {
        debug_assert_eq!(cells.len(), width as usize * height as usize);
        Self {
            width,
            height,
            cells,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn cells(&self) -> &[CellColor] {
        &self.cells
    }

    pub fn contains(&self, row: i64, col: i64) -> bool {
        row >= 0 && col >= 0 && row < self.height as i64 && col < self.width as i64
    }

    /// Flat index of `(row, col)`, or `OutOfBounds`.
    pub fn index_of(&self, row: i64, col: i64) -> Result<usize, EditorError> {
        if !self.contains(row, col) {
            return Err(EditorError::OutOfBounds {
                row,
                col,
                width: self.width,
                height: self.height,
            });
        }
        Ok(row as usize * self.width as usize + col as usize)
    }

    pub fn get(&self, row: u32, col: u32) -> Option<CellColor> {
        if row < self.height && col < self.width {
            Some(self.cells[row as usize * self.width as usize + col as usize])
        } else {
            None
        }
    }

    pub fn cell(&self, row: i64, col: i64) -> Result<CellColor, EditorError> {
        self.index_of(row, col).map(|i| self.cells[i])
    }

    pub fn row(&self, row: u32) -> Option<&[CellColor]> {
        if row >= self.height {
            return None;
        }
        let w = self.width as usize;
        let start = row as usize * w;
        Some(&self.cells[start..start + w])
    }

    pub fn column(&self, col: u32) -> Option<Vec<CellColor>> {
        if col >= self.width {
            return None;
        }
        Some(
            self.cells
                .iter()
                .skip(col as usize)
                .step_by(self.width as usize)
                .copied()
                .collect(),
        )
    }

    pub fn rows(&self) -> impl Iterator<Item = &[CellColor]> {
        self.cells.chunks(self.width as usize)
    }

    /// Every non-`None` cell as `(row, col, color)`, row-major.
    pub fn painted_cells(&self) -> impl Iterator<Item = (u32, u32, CellColor)> + '_ {
        let w = self.width as usize;
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, c)| c.is_painted())
            .map(move |(i, c)| ((i / w) as u32, (i % w) as u32, *c))
    }

    pub fn painted_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_painted()).count()
    }

    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(|c| !c.is_painted())
    }

    pub fn to_rows(&self) -> Vec<Vec<CellColor>> {
        self.rows().map(|r| r.to_vec()).collect()
    }
}

impl TryFrom<Vec<Vec<CellColor>>> for Grid {
    type Error = EditorError;

    fn try_from(rows: Vec<Vec<CellColor>>) -> Result<Self, Self::Error> {
        let height = rows.len() as u32;
        let width = rows.first().map(|r| r.len()).unwrap_or(0) as u32;
        if width == 0 || height == 0 {
            return Err(EditorError::InvalidDimensions { width, height });
        }
        if let Some(bad) = rows.iter().find(|r| r.len() as u32 != width) {
            return Err(EditorError::InvalidDimensions {
                width: bad.len() as u32,
                height,
            });
        }
        let cells = rows.into_iter().flatten().collect();
        Ok(Self::from_parts(width, height, cells))
    }
}

impl From<Grid> for Vec<Vec<CellColor>> {
    fn from(grid: Grid) -> Self {
        grid.to_rows()
    }
}

// ============================================================================
// PRESETS
// ============================================================================

/// Named grid size template.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridPreset {
    pub label: &'static str,
    pub width: u32,
    pub height: u32,
}

const fn preset(label: &'static str, width: u32, height: u32) -> GridPreset {
    GridPreset {
        label,
        width,
        height,
    }
}

/// Read-only preset table. Index 0 is the custom slot; its size here is
/// only the starting value, sessions keep their own.
pub const GRID_PRESETS: [GridPreset; 21] = [
    preset("Custom", 40, 40),
    preset("15×15", 15, 15),
    preset("15×20", 15, 20),
    preset("20×15", 20, 15),
    preset("20×20", 20, 20),
    preset("20×30", 20, 30),
    preset("30×20", 30, 20),
    preset("25×25", 25, 25),
    preset("25×35", 25, 35),
    preset("30×30", 30, 30),
    preset("30×40", 30, 40),
    preset("35×35", 35, 35),
    preset("35×45", 35, 45),
    preset("40×50", 40, 50),
    preset("45×45", 45, 45),
    preset("50×50", 50, 50),
    preset("50×55", 50, 55),
    preset("50×60", 50, 60),
    preset("55×55", 55, 55),
    preset("70×35", 70, 35),
    preset("80×50", 80, 50),
];

pub const CUSTOM_PRESET: usize = 0;
pub const DEFAULT_PRESET: usize = 3;

/// Per-session view of the preset table with a private custom size.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PresetSizes {
    custom: (u32, u32),
}

impl Default for PresetSizes {
    fn default() -> Self {
        let c = GRID_PRESETS[CUSTOM_PRESET];
        Self {
            custom: (c.width, c.height),
        }
    }
}

impl PresetSizes {
    pub fn len(&self) -> usize {
        GRID_PRESETS.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// `(width, height)` for a preset index.
    pub fn size(&self, index: usize) -> Option<(u32, u32)> {
        if index == CUSTOM_PRESET {
            return Some(self.custom);
        }
        GRID_PRESETS.get(index).map(|p| (p.width, p.height))
    }

    pub fn label(&self, index: usize) -> Option<String> {
        if index == CUSTOM_PRESET {
            return Some(format!("Custom ({}×{})", self.custom.0, self.custom.1));
        }
        GRID_PRESETS.get(index).map(|p| p.label.to_string())
    }

    pub fn custom(&self) -> (u32, u32) {
        self.custom
    }

    pub fn set_custom(&mut self, width: u32, height: u32) -> Result<(), EditorError> {
        if width == 0 || height == 0 {
            return Err(EditorError::InvalidDimensions { width, height });
        }
        self.custom = (width, height);
        Ok(())
    }

    /// Index of the first fixed preset with exactly this size.
    pub fn find(&self, width: u32, height: u32) -> Option<usize> {
        GRID_PRESETS
            .iter()
            .enumerate()
            .skip(1)
            .find(|(_, p)| p.width == width && p.height == height)
            .map(|(i, _)| i)
    }
}
