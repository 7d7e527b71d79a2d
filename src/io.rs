use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use image::codecs::bmp::BmpEncoder;
use image::codecs::png::PngEncoder;
use image::{ImageFormat, RgbImage, RgbaImage};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::EditorError;
use crate::grid::Grid;

// ============================================================================
// NONO SAVE FILE FORMAT
// ============================================================================

/// Only save format version this build reads or writes.
pub const NONO_VERSION: u32 = 1;
pub const NONO_EXTENSION: &str = "nono";

/// `.nono` file body: pretty-printed JSON.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SaveFile {
    pub version: u32,
    /// RFC 3339 save time.
    pub timestamp: String,
    /// Preset index the grid belongs to.
    pub preset: usize,
    pub grid: Grid,
    /// Source image as a `data:` URL; `null` when the grid was hand-drawn.
    #[serde(default)]
    pub image_data: Option<String>,
}

/// Error type for save/load/export operations
#[derive(Debug)]
pub enum NonoError {
    Io(std::io::Error),
    Serialize(String),
    InvalidFormat(String),
    Encode(String),
    Editor(EditorError),
}

impl std::fmt::Display for NonoError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NonoError::Io(e) => write!(f, "I/O error: {}", e),
            NonoError::Serialize(e) => write!(f, "Serialization error: {}", e),
            NonoError::InvalidFormat(e) => write!(f, "Invalid format: {}", e),
            NonoError::Encode(e) => write!(f, "Encoding error: {}", e),
            NonoError::Editor(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for NonoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            NonoError::Io(e) => Some(e),
            NonoError::Editor(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for NonoError {
    fn from(e: std::io::Error) -> Self {
        NonoError::Io(e)
    }
}

impl From<serde_json::Error> for NonoError {
    fn from(e: serde_json::Error) -> Self {
        NonoError::Serialize(e.to_string())
    }
}

impl From<image::ImageError> for NonoError {
    fn from(e: image::ImageError) -> Self {
        NonoError::Encode(e.to_string())
    }
}

impl From<EditorError> for NonoError {
    fn from(e: EditorError) -> Self {
        NonoError::Editor(e)
    }
}

impl SaveFile {
    pub fn new(preset: usize, grid: Grid, image_data: Option<String>) -> Self {
        Self {
            version: NONO_VERSION,
            timestamp: now_timestamp(),
            preset,
            grid,
            image_data,
        }
    }

    pub fn to_json(&self) -> Result<String, NonoError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse and check a `.nono` body. Grid shape is validated while
    /// deserializing; the version must match [`NONO_VERSION`].
    pub fn from_json(text: &str) -> Result<Self, NonoError> {
        let file: SaveFile = serde_json::from_str(text)?;
        if file.version != NONO_VERSION {
            return Err(NonoError::InvalidFormat(format!(
                "unsupported version {}",
                file.version
            )));
        }
        Ok(file)
    }
}

/// Write a `.nono` file.
pub fn save_nono(file: &SaveFile, path: &Path) -> Result<(), NonoError> {
    let json = file.to_json()?;
    let mut writer = BufWriter::new(File::create(path)?);
    writer.write_all(json.as_bytes())?;
    writer.flush()?;
    Ok(())
}

/// Read a `.nono` file.
pub fn load_nono(path: &Path) -> Result<SaveFile, NonoError> {
    let text = std::fs::read_to_string(path)?;
    SaveFile::from_json(&text)
}

/// `nonogram_{W}x{H}.nono`
pub fn default_save_name(width: u32, height: u32) -> String {
    format!("nonogram_{}x{}.{}", width, height, NONO_EXTENSION)
}

fn now_timestamp() -> String {
    time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
}

// ============================================================================
// IMAGE SOURCES
// ============================================================================

/// Where a sample image comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ImageSource {
    DataUrl(String),
    /// `http(s)://` URL. Never fetched here; see [`ImageSource::with_proxy`].
    Remote(String),
    Path(PathBuf),
}

impl ImageSource {
    pub fn parse(s: &str) -> Self {
        let trimmed = s.trim();
        let lower = trimmed.to_lowercase();
        if lower.starts_with("data:") {
            ImageSource::DataUrl(trimmed.to_string())
        } else if lower.starts_with("http://") || lower.starts_with("https://") {
            ImageSource::Remote(trimmed.to_string())
        } else {
            ImageSource::Path(PathBuf::from(trimmed))
        }
    }

    /// Rewrite a remote URL through a CORS proxy prefix. Other sources have
    /// nothing to rewrite and return `None`.
    pub fn with_proxy(&self, proxy_prefix: &str) -> Option<ImageSource> {
        match self {
            ImageSource::Remote(url) => Some(ImageSource::Remote(format!("{}{}", proxy_prefix, url))),
            _ => None,
        }
    }
}

/// A decoded source image plus the `data:` URL that reproduces it in a save
/// file.
#[derive(Clone, Debug)]
pub struct SourceImage {
    pub pixels: RgbaImage,
    pub data_url: String,
}

impl SourceImage {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, EditorError> {
        let format = image::guess_format(bytes)?;
        let pixels = image::load_from_memory_with_format(bytes, format)?.to_rgba8();
        if pixels.width() == 0 || pixels.height() == 0 {
            return Err(EditorError::ImageLoad("image has no pixels".into()));
        }
        Ok(Self {
            pixels,
            data_url: encode_data_url(mime_for(format), bytes),
        })
    }
}

/// Decode any [`ImageSource`].
pub fn decode_source(source: &ImageSource) -> Result<SourceImage, EditorError> {
    match source {
        ImageSource::Path(path) => {
            let bytes = std::fs::read(path)
                .map_err(|e| EditorError::ImageLoad(format!("{}: {}", path.display(), e)))?;
            SourceImage::from_bytes(&bytes)
        }
        ImageSource::DataUrl(url) => {
            let (_, bytes) = parse_data_url(url)?;
            SourceImage::from_bytes(&bytes)
        }
        ImageSource::Remote(url) => Err(EditorError::ImageLoad(format!(
            "remote image '{}' must be downloaded by the caller (retry through a CORS proxy if the host blocks it)",
            url
        ))),
    }
}

/// Split a base64 `data:` URL into `(mime, bytes)`.
pub fn parse_data_url(url: &str) -> Result<(String, Vec<u8>), EditorError> {
    let rest = url
        .strip_prefix("data:")
        .ok_or_else(|| EditorError::ImageLoad("not a data: URL".into()))?;
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| EditorError::ImageLoad("data: URL has no payload".into()))?;
    let Some(mime) = meta.strip_suffix(";base64") else {
        return Err(EditorError::ImageLoad("only base64 data: URLs are supported".into()));
    };
    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|e| EditorError::ImageLoad(format!("bad base64 payload: {}", e)))?;
    Ok((mime.to_string(), bytes))
}

pub fn encode_data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}

fn mime_for(format: ImageFormat) -> &'static str {
    match format {
        ImageFormat::Png => "image/png",
        ImageFormat::Jpeg => "image/jpeg",
        ImageFormat::Gif => "image/gif",
        ImageFormat::WebP => "image/webp",
        ImageFormat::Bmp => "image/bmp",
        _ => "application/octet-stream",
    }
}

// ============================================================================
// EXPORT — one pixel per cell
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Bmp,
    Png,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Bmp => "bmp",
            ExportFormat::Png => "png",
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.trim().to_lowercase().as_str() {
            "bmp" => Some(ExportFormat::Bmp),
            "png" => Some(ExportFormat::Png),
            _ => None,
        }
    }
}

/// Lossless 1:1 raster of the grid. Background cells are white.
pub fn grid_to_image(grid: &Grid) -> RgbImage {
    RgbImage::from_fn(grid.width(), grid.height(), |x, y| {
        let cell = grid.get(y, x).unwrap_or_default();
        image::Rgb(cell.rgb())
    })
}

/// Encode [`grid_to_image`] to `path`.
pub fn export_grid(grid: &Grid, path: &Path, format: ExportFormat) -> Result<(), NonoError> {
    let image = grid_to_image(grid);
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    match format {
        ExportFormat::Bmp => {
            let mut encoder = BmpEncoder::new(&mut writer);
            encoder.encode(
                image.as_raw(),
                image.width(),
                image.height(),
                image::ColorType::Rgb8,
            )?;
        }
        ExportFormat::Png => {
            let encoder = PngEncoder::new(&mut writer);
            #[allow(deprecated)]
            encoder.encode(
                image.as_raw(),
                image.width(),
                image.height(),
                image::ColorType::Rgb8,
            )?;
        }
    }
    writer.flush()?;
    Ok(())
}

/// `nonogram-{W}-{XXXX}.{ext}` with four random capital letters.
pub fn default_export_name(width: u32, format: ExportFormat) -> String {
    let id = uuid::Uuid::new_v4();
    let letters: String = id.as_bytes()[..4]
        .iter()
        .map(|b| (b'A' + b % 26) as char)
        .collect();
    format!("nonogram-{}-{}.{}", width, letters, format.extension())
}
