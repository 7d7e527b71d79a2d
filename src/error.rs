// ============================================================================
// EDITOR ERRORS — failures returned by grid, hint, paint and sampler calls
// ============================================================================

/// Error type for the editor core.
///
/// Nothing in the core catches these; they go straight back to the caller,
/// which decides whether to report, log or retry (e.g. through a proxy URL).
#[derive(Debug, Clone, PartialEq)]
pub enum EditorError {
    /// Source image could not be read or decoded.
    ImageLoad(String),
    /// A grid or destination size with a zero side.
    InvalidDimensions { width: u32, height: u32 },
    /// Coordinate outside the grid. Never clamped.
    OutOfBounds {
        row: i64,
        col: i64,
        width: u32,
        height: u32,
    },
    /// Flood fill where the start cell already has the fill color.
    NoOpFill,
    /// Sampler parameters outside their valid ranges.
    InvalidParams(String),
}

impl std::fmt::Display for EditorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EditorError::ImageLoad(e) => write!(f, "Image load error: {}", e),
            EditorError::InvalidDimensions { width, height } => {
                write!(f, "Invalid dimensions: {}x{}", width, height)
            }
            EditorError::OutOfBounds {
                row,
                col,
                width,
                height,
            } => write!(
                f,
                "Cell ({}, {}) is outside the {}x{} grid",
                row, col, width, height
            ),
            EditorError::NoOpFill => write!(f, "Fill color matches target color"),
            EditorError::InvalidParams(e) => write!(f, "Invalid parameters: {}", e),
        }
    }
}

impl std::error::Error for EditorError {}

impl From<image::ImageError> for EditorError {
    fn from(e: image::ImageError) -> Self {
        EditorError::ImageLoad(e.to_string())
    }
}

impl EditorError {
    /// `true` for outcomes that mean "nothing to do" rather than failure.
    pub fn is_benign(&self) -> bool {
        matches!(self, EditorError::NoOpFill)
    }
}
