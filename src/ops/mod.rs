pub mod paint;
pub mod sampler;
pub mod shift;

pub use paint::{CellEdit, Tool, apply_tool, flood_fill, set_cell, set_cells, toggle_cell};
pub use sampler::{ClassifierParams, ImageParams, Interpolation, ViewTransform, sample};
pub use shift::{OffGridBuffer, shift};
