use std::path::{Path, PathBuf};

use log::LevelFilter;

use crate::grid::{CUSTOM_PRESET, CellColor, DEFAULT_PRESET, GRID_PRESETS};
use crate::io::ExportFormat;
use crate::logger::parse_level;
use crate::ops::sampler::{ImageParams, Interpolation};

/// Editor settings that persist across sessions
#[derive(Clone, Debug, PartialEq)]
pub struct Settings {
    /// Preset selected when a session starts
    pub default_preset: usize,
    /// Size of the custom preset slot
    pub custom_width: u32,
    pub custom_height: u32,
    /// Palette entry used for drawing and for sampled cells
    pub paint_color: CellColor,
    /// Starting slider values for image sampling
    pub image_params: ImageParams,
    pub export_format: ExportFormat,
    pub log_level: LevelFilter,
}

impl Default for Settings {
    fn default() -> Self {
        let custom = GRID_PRESETS[CUSTOM_PRESET];
        Self {
            default_preset: DEFAULT_PRESET,
            custom_width: custom.width,
            custom_height: custom.height,
            paint_color: CellColor::Black,
            image_params: ImageParams::default(),
            export_format: ExportFormat::Bmp,
            log_level: LevelFilter::Info,
        }
    }
}

impl Settings {
    /// Path to the settings file.
    /// On Linux:   ~/.config/nonomaker/nonomaker_settings.cfg  (XDG_CONFIG_HOME respected)
    /// On Windows: %APPDATA%\Nonomaker\nonomaker_settings.cfg
    /// On macOS:   ~/Library/Application Support/Nonomaker/nonomaker_settings.cfg
    /// Fallback:   same directory as the executable.
    pub fn settings_path() -> Option<PathBuf> {
        #[cfg(target_os = "linux")]
        {
            let config_dir = std::env::var("XDG_CONFIG_HOME")
                .map(PathBuf::from)
                .unwrap_or_else(|_| {
                    let home = std::env::var("HOME").unwrap_or_else(|_| "~".to_string());
                    PathBuf::from(home).join(".config")
                })
                .join("nonomaker");
            return Some(config_dir.join("nonomaker_settings.cfg"));
        }
        #[cfg(target_os = "windows")]
        {
            let appdata = std::env::var("APPDATA")
                .or_else(|_| std::env::var("USERPROFILE"))
                .ok()?;
            return Some(PathBuf::from(appdata).join("Nonomaker").join("nonomaker_settings.cfg"));
        }
        #[cfg(target_os = "macos")]
        {
            let home = std::env::var("HOME").unwrap_or_else(|_| "~".to_string());
            return Some(
                PathBuf::from(home)
                    .join("Library")
                    .join("Application Support")
                    .join("Nonomaker")
                    .join("nonomaker_settings.cfg"),
            );
        }
        #[cfg(not(any(target_os = "linux", target_os = "windows", target_os = "macos")))]
        {
            std::env::current_exe()
                .ok()
                .and_then(|p| p.parent().map(|d| d.join("nonomaker_settings.cfg")))
        }
    }

    /// Render as `key=value` lines.
    pub fn to_config_string(&self) -> String {
        let v = &self.image_params.view;
        let c = &self.image_params.classify;
        format!(
            "default_preset={}\n\
             custom_width={}\n\
             custom_height={}\n\
             paint_color={}\n\
             zoom={}\n\
             pan_x={}\n\
             pan_y={}\n\
             stretch_x={}\n\
             stretch_y={}\n\
             interpolation={}\n\
             red_weight={}\n\
             green_weight={}\n\
             blue_weight={}\n\
             brightness_threshold={}\n\
             contrast={}\n\
             inverted={}\n\
             flipped={}\n\
             export_format={}\n\
             log_level={}\n",
            self.default_preset,
            self.custom_width,
            self.custom_height,
            self.paint_color,
            v.zoom,
            v.pan_x,
            v.pan_y,
            v.stretch_x,
            v.stretch_y,
            v.interpolation.label(),
            c.red_weight,
            c.green_weight,
            c.blue_weight,
            c.brightness_threshold,
            c.contrast,
            c.inverted,
            c.flipped,
            self.export_format.extension(),
            self.log_level.as_str().to_lowercase(),
        )
    }

    /// Parse `key=value` lines on top of the defaults. Unknown keys and
    /// unparsable values are skipped; out-of-range sampler values reset the
    /// sampler section to its defaults.
    pub fn from_config_str(content: &str) -> Self {
        let mut s = Self::default();
        for line in content.lines() {
            let Some((key, val)) = line.split_once('=') else { continue };
            let key = key.trim();
            let val = val.trim();
            let view = &mut s.image_params.view;
            let classify = &mut s.image_params.classify;
            match key {
                "default_preset" => {
                    if let Ok(v) = val.parse::<usize>()
                        && v < GRID_PRESETS.len()
                    {
                        s.default_preset = v;
                    }
                }
                "custom_width" => set_positive(&mut s.custom_width, val),
                "custom_height" => set_positive(&mut s.custom_height, val),
                "paint_color" => {
                    if let Ok(c) = val.parse::<CellColor>()
                        && c.is_painted()
                    {
                        s.paint_color = c;
                    }
                }
                "zoom" => set_parsed(&mut view.zoom, val),
                "pan_x" => set_parsed(&mut view.pan_x, val),
                "pan_y" => set_parsed(&mut view.pan_y, val),
                "stretch_x" => set_parsed(&mut view.stretch_x, val),
                "stretch_y" => set_parsed(&mut view.stretch_y, val),
                "interpolation" => {
                    if let Some(i) = Interpolation::from_label(val) {
                        view.interpolation = i;
                    }
                }
                "red_weight" => set_parsed(&mut classify.red_weight, val),
                "green_weight" => set_parsed(&mut classify.green_weight, val),
                "blue_weight" => set_parsed(&mut classify.blue_weight, val),
                "brightness_threshold" => set_parsed(&mut classify.brightness_threshold, val),
                "contrast" => set_parsed(&mut classify.contrast, val),
                "inverted" => set_parsed(&mut classify.inverted, val),
                "flipped" => set_parsed(&mut classify.flipped, val),
                "export_format" => {
                    if let Some(f) = ExportFormat::from_extension(val) {
                        s.export_format = f;
                    }
                }
                "log_level" => {
                    if let Some(l) = parse_level(val) {
                        s.log_level = l;
                    }
                }
                _ => {}
            }
        }

        s.image_params.classify.paint_color = s.paint_color;
        if let Err(e) = s.image_params.validate() {
            log::warn!("settings: {}; using default image parameters", e);
            s.image_params = ImageParams::default();
            s.image_params.classify.paint_color = s.paint_color;
        }
        s
    }

    pub fn save_to(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_config_string())
    }

    /// Save settings to disk
    pub fn save(&self) -> std::io::Result<()> {
        match Self::settings_path() {
            Some(path) => self.save_to(&path),
            None => Ok(()),
        }
    }

    /// Load from `path` (returns default if file missing or corrupt)
    pub fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::from_config_str(&content),
            Err(_) => Self::default(),
        }
    }

    pub fn load() -> Self {
        match Self::settings_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }
}

fn set_parsed<T: std::str::FromStr>(slot: &mut T, val: &str) {
    if let Ok(v) = val.parse::<T>() {
        *slot = v;
    }
}

fn set_positive(slot: &mut u32, val: &str) {
    if let Ok(v) = val.parse::<u32>()
        && v > 0
    {
        *slot = v;
    }
}
