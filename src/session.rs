use std::collections::HashMap;
use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::error::EditorError;
use crate::grid::{CUSTOM_PRESET, CellColor, Grid, PresetSizes};
use crate::hints::HintLayout;
use crate::io::{self, ExportFormat, ImageSource, NonoError, SaveFile, SourceImage};
use crate::ops::paint::{self, CellEdit, Tool};
use crate::ops::sampler::{self, ImageParams};
use crate::ops::shift::{self, OffGridBuffer};
use crate::settings::Settings;

/// Single open puzzle: one grid per preset, the source image they were
/// sampled from, and the cells pushed off-canvas by shifting.
pub struct EditorSession {
    pub id: Uuid,
    /// `None` until the session is saved or opened from a file.
    pub path: Option<PathBuf>,
    pub is_dirty: bool,
    /// Display name (derived from path or "Untitled")
    pub name: String,

    presets: PresetSizes,
    selected: usize,
    /// Grid of the selected preset.
    current: Grid,
    /// Grids of presets visited earlier, with the cells each one had
    /// parked off-grid. Restored on re-selection.
    stored: HashMap<usize, (Grid, OffGridBuffer)>,
    params: ImageParams,
    image: Option<SourceImage>,
    buffer: OffGridBuffer,
    tool: Tool,
}

impl EditorSession {
    pub fn new(settings: &Settings) -> Result<Self, EditorError> {
        let mut presets = PresetSizes::default();
        if let Err(e) = presets.set_custom(settings.custom_width, settings.custom_height) {
            log::warn!("session: ignoring custom size from settings: {}", e);
        }
        let selected = if settings.default_preset < presets.len() {
            settings.default_preset
        } else {
            crate::grid::DEFAULT_PRESET
        };
        let (w, h) = presets.size(selected).unwrap_or(presets.custom());

        let mut params = settings.image_params;
        params.classify.paint_color = settings.paint_color;

        Ok(Self {
            id: Uuid::new_v4(),
            path: None,
            is_dirty: false,
            name: "Untitled".to_string(),
            presets,
            selected,
            current: Grid::new(w, h)?,
            stored: HashMap::new(),
            params,
            image: None,
            buffer: OffGridBuffer::new(),
            tool: Tool::default(),
        })
    }

    /// Open a `.nono` file into a fresh session.
    pub fn open(path: &Path, settings: &Settings) -> Result<Self, NonoError> {
        let file = io::load_nono(path)?;
        let mut session = Self::new(settings)?;
        session.apply_save_file(file)?;
        session.path = Some(path.to_path_buf());
        session.update_name_from_path();
        log::info!(
            "Opened {} ({}x{})",
            path.display(),
            session.current.width(),
            session.current.height()
        );
        Ok(session)
    }

    // ---------------------------------------------------------------------
    //  Accessors
    // ---------------------------------------------------------------------

    pub fn grid(&self) -> &Grid {
        &self.current
    }

    pub fn buffer(&self) -> &OffGridBuffer {
        &self.buffer
    }

    pub fn image(&self) -> Option<&SourceImage> {
        self.image.as_ref()
    }

    pub fn image_params(&self) -> &ImageParams {
        &self.params
    }

    pub fn presets(&self) -> &PresetSizes {
        &self.presets
    }

    pub fn selected_preset(&self) -> usize {
        self.selected
    }

    pub fn paint_color(&self) -> CellColor {
        self.params.classify.paint_color
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    pub fn hint_layout(&self) -> HintLayout {
        HintLayout::compute(&self.current)
    }

    // ---------------------------------------------------------------------
    //  Presets
    // ---------------------------------------------------------------------

    /// Switch to another preset. Its grid is restored if it was visited
    /// before, otherwise sampled from the loaded image (or left blank).
    pub fn select_preset(&mut self, index: usize) -> Result<(), EditorError> {
        let (w, h) = self
            .presets
            .size(index)
            .ok_or_else(|| EditorError::InvalidParams(format!("no grid preset #{}", index)))?;
        if index == self.selected {
            return Ok(());
        }

        let (grid, buffer) = match self.stored.remove(&index) {
            Some(entry) => entry,
            None => (self.sampled_or_blank(w, h)?, OffGridBuffer::new()),
        };
        let prev = (
            std::mem::replace(&mut self.current, grid),
            std::mem::replace(&mut self.buffer, buffer),
        );
        self.stored.insert(self.selected, prev);
        self.selected = index;
        log::debug!(
            "session: preset {}, {} cells off-grid",
            self.presets.label(index).unwrap_or_default(),
            self.buffer.len()
        );
        Ok(())
    }

    /// Resize the custom preset. A grid kept for it is rebuilt at the new
    /// size; its off-grid cells stay parked.
    pub fn set_custom_size(&mut self, width: u32, height: u32) -> Result<(), EditorError> {
        self.presets.set_custom(width, height)?;
        if self.selected == CUSTOM_PRESET {
            self.current = self.sampled_or_blank(width, height)?;
            self.mark_dirty();
        } else if let Some((_, buffer)) = self.stored.remove(&CUSTOM_PRESET) {
            let grid = self.sampled_or_blank(width, height)?;
            self.stored.insert(CUSTOM_PRESET, (grid, buffer));
        }
        Ok(())
    }

    // ---------------------------------------------------------------------
    //  Image sampling
    // ---------------------------------------------------------------------

    pub fn load_image(&mut self, source: &ImageSource) -> Result<(), EditorError> {
        let image = io::decode_source(source)?;
        log::info!(
            "Loaded source image {}x{}",
            image.pixels.width(),
            image.pixels.height()
        );
        self.set_image(image)
    }

    /// Replace the source image and re-sample the current grid from it.
    pub fn set_image(&mut self, image: SourceImage) -> Result<(), EditorError> {
        self.image = Some(image);
        self.resample()
    }

    /// Validate and store new slider values, re-sampling if an image is loaded.
    pub fn set_image_params(&mut self, params: ImageParams) -> Result<(), EditorError> {
        params.validate()?;
        self.params = params;
        self.resample()
    }

    /// Active palette entry for drawing, fill and sampling. Does not
    /// re-sample.
    pub fn set_paint_color(&mut self, color: CellColor) -> Result<(), EditorError> {
        if !color.is_painted() {
            return Err(EditorError::InvalidParams(
                "paint color must not be the background".into(),
            ));
        }
        self.params.classify.paint_color = color;
        Ok(())
    }

    /// Rebuild the current grid from the source image. Does nothing without
    /// an image.
    pub fn resample(&mut self) -> Result<(), EditorError> {
        let Some(image) = &self.image else {
            return Ok(());
        };
        let grid = sampler::sample(
            &image.pixels,
            self.current.width(),
            self.current.height(),
            &self.params.view,
            &self.params.classify,
        )?;
        self.current = grid;
        self.buffer.clear();
        self.mark_dirty();
        Ok(())
    }

    fn sampled_or_blank(&self, width: u32, height: u32) -> Result<Grid, EditorError> {
        match &self.image {
            Some(image) => sampler::sample(
                &image.pixels,
                width,
                height,
                &self.params.view,
                &self.params.classify,
            ),
            None => Grid::new(width, height),
        }
    }

    // ---------------------------------------------------------------------
    //  Editing
    // ---------------------------------------------------------------------

    pub fn set_tool(&mut self, tool: Tool) {
        log::debug!("session: tool {}", tool.label());
        self.tool = tool;
    }

    /// Apply the selected tool at one cell with the active color.
    pub fn apply_tool(&mut self, row: i64, col: i64) -> Result<(), EditorError> {
        let result = paint::apply_tool(&self.current, self.tool, row, col, self.paint_color());
        self.commit(result)
    }

    /// Click behavior: empty cells take the active color, painted cells clear.
    pub fn toggle(&mut self, row: i64, col: i64) -> Result<(), EditorError> {
        let result = paint::toggle_cell(&self.current, row, col, self.paint_color());
        self.commit(result)
    }

    pub fn set_cell(&mut self, row: i64, col: i64, color: CellColor) -> Result<(), EditorError> {
        let result = paint::set_cell(&self.current, row, col, color);
        self.commit(result)
    }

    pub fn set_cells(&mut self, edits: &[CellEdit]) -> Result<(), EditorError> {
        let result = paint::set_cells(&self.current, edits);
        self.commit(result)
    }

    /// Flood fill from `(row, col)`. Filling a region with the color it
    /// already has leaves the grid untouched and is not an error here.
    pub fn fill(&mut self, row: i64, col: i64, color: CellColor) -> Result<(), EditorError> {
        let result = paint::flood_fill(&self.current, row, col, color);
        self.commit(result)
    }

    /// Move the picture by `(dx, dy)` cells, parking cells that leave the
    /// grid until a later shift brings them back.
    pub fn shift(&mut self, dx: i64, dy: i64) {
        if dx == 0 && dy == 0 {
            return;
        }
        let (grid, buffer) = shift::shift(&self.current, &self.buffer, dx, dy);
        self.current = grid;
        self.buffer = buffer;
        self.mark_dirty();
        log::debug!("session: shifted by ({}, {}), {} cells off-grid", dx, dy, self.buffer.len());
    }

    /// Blank the grid, drop the source image and the off-grid buffer.
    pub fn clear(&mut self) -> Result<(), EditorError> {
        self.current = Grid::new(self.current.width(), self.current.height())?;
        self.image = None;
        self.buffer.clear();
        self.mark_dirty();
        Ok(())
    }

    fn commit(&mut self, result: Result<Grid, EditorError>) -> Result<(), EditorError> {
        match result {
            Ok(grid) => {
                self.current = grid;
                self.mark_dirty();
                Ok(())
            }
            Err(e) if e.is_benign() => {
                log::debug!("session: {}", e);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    // ---------------------------------------------------------------------
    //  Files
    // ---------------------------------------------------------------------

    pub fn to_save_file(&self) -> SaveFile {
        SaveFile::new(
            self.selected,
            self.current.clone(),
            self.image.as_ref().map(|i| i.data_url.clone()),
        )
    }

    /// Load a save into this session. The grid must match its preset's size
    /// (the custom preset adopts the grid's size). A save without image
    /// data keeps the current image.
    pub fn apply_save_file(&mut self, file: SaveFile) -> Result<(), EditorError> {
        let (gw, gh) = (file.grid.width(), file.grid.height());
        let image = match &file.image_data {
            Some(data_url) => Some(io::decode_source(&ImageSource::DataUrl(data_url.clone()))?),
            None => None,
        };

        if file.preset == CUSTOM_PRESET {
            self.presets.set_custom(gw, gh)?;
        } else {
            let (pw, ph) = self.presets.size(file.preset).ok_or_else(|| {
                EditorError::InvalidParams(format!("no grid preset #{}", file.preset))
            })?;
            if (pw, ph) != (gw, gh) {
                return Err(EditorError::InvalidDimensions {
                    width: gw,
                    height: gh,
                });
            }
        }

        if image.is_some() {
            self.image = image;
        }

        self.stored.remove(&file.preset);
        let buffer = OffGridBuffer::new();
        if file.preset != self.selected {
            let prev = (
                std::mem::replace(&mut self.current, file.grid),
                std::mem::replace(&mut self.buffer, buffer),
            );
            self.stored.insert(self.selected, prev);
            self.selected = file.preset;
        } else {
            self.current = file.grid;
            self.buffer = buffer;
        }
        self.mark_clean();
        Ok(())
    }

    /// Write the session to `path` and adopt it as the session's file.
    pub fn save(&mut self, path: &Path) -> Result<(), NonoError> {
        io::save_nono(&self.to_save_file(), path)?;
        self.path = Some(path.to_path_buf());
        self.update_name_from_path();
        self.mark_clean();
        log::info!("Saved {}", path.display());
        Ok(())
    }

    pub fn export(&self, path: &Path, format: ExportFormat) -> Result<(), NonoError> {
        io::export_grid(&self.current, path, format)?;
        log::info!("Exported {} as {}", path.display(), format.extension());
        Ok(())
    }

    pub fn default_save_name(&self) -> String {
        io::default_save_name(self.current.width(), self.current.height())
    }

    pub fn default_export_name(&self, format: ExportFormat) -> String {
        io::default_export_name(self.current.width(), format)
    }

    pub fn mark_dirty(&mut self) {
        self.is_dirty = true;
    }

    pub fn mark_clean(&mut self) {
        self.is_dirty = false;
    }

    pub fn update_name_from_path(&mut self) {
        if let Some(ref path) = self.path {
            self.name = path
                .file_name()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_else(|| "Unknown".to_string());
        }
    }

    /// Get the display title (name with dirty indicator)
    pub fn display_title(&self) -> String {
        if self.is_dirty {
            format!("{}*", self.name)
        } else {
            self.name.clone()
        }
    }
}
