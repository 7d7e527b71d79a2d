//! Nonomaker: nonogram editing core.
//!
//! Grids of palette colors, image sampling into grids, run-length hints,
//! paint operations, content shifting, `.nono` files and a batch CLI.

pub mod cli;
pub mod error;
pub mod grid;
pub mod hints;
pub mod io;
pub mod logger;
pub mod ops;
pub mod session;
pub mod settings;

pub use error::EditorError;
pub use grid::{CellColor, Grid};
pub use session::EditorSession;
