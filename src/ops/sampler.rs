// ============================================================================
// IMAGE SAMPLER — view transform + brightness threshold into a grid
// ============================================================================

use image::{Pixel, Rgba, RgbaImage, imageops};
use rayon::prelude::*;

use crate::error::EditorError;
use crate::grid::{CellColor, Grid};

/// Interpolation method used when the sampled region is scaled onto the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Interpolation {
    Nearest,
    #[default]
    Bilinear,
    Bicubic,
    Lanczos3,
}

impl Interpolation {
    pub fn label(&self) -> &'static str {
        match self {
            Interpolation::Nearest => "nearest",
            Interpolation::Bilinear => "bilinear",
            Interpolation::Bicubic => "bicubic",
            Interpolation::Lanczos3 => "lanczos3",
        }
    }

    pub fn all() -> &'static [Interpolation] {
        &[
            Interpolation::Nearest,
            Interpolation::Bilinear,
            Interpolation::Bicubic,
            Interpolation::Lanczos3,
        ]
    }

    pub fn from_label(s: &str) -> Option<Self> {
        let s = s.trim().to_lowercase();
        Self::all().iter().copied().find(|i| i.label() == s)
    }

    pub fn to_filter(&self) -> imageops::FilterType {
        match self {
            Interpolation::Nearest => imageops::FilterType::Nearest,
            Interpolation::Bilinear => imageops::FilterType::Triangle,
            Interpolation::Bicubic => imageops::FilterType::CatmullRom,
            Interpolation::Lanczos3 => imageops::FilterType::Lanczos3,
        }
    }
}

/// Axis-aligned rectangle in fractional pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RectF {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

// ---------------------------------------------------------------------------
//  View transform
// ---------------------------------------------------------------------------

/// Which part of the source image is sampled and where it lands on the grid.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTransform {
    /// 1.0 samples the whole image; larger values crop in.
    pub zoom: f32,
    /// 0.0 = left edge, 1.0 = right edge of the travel range.
    pub pan_x: f32,
    pub pan_y: f32,
    pub stretch_x: f32,
    pub stretch_y: f32,
    pub interpolation: Interpolation,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            pan_x: 0.5,
            pan_y: 0.5,
            stretch_x: 1.0,
            stretch_y: 1.0,
            interpolation: Interpolation::Bilinear,
        }
    }
}

impl ViewTransform {
    pub fn validate(&self) -> Result<(), EditorError> {
        let finite = [self.zoom, self.pan_x, self.pan_y, self.stretch_x, self.stretch_y]
            .iter()
            .all(|v| v.is_finite());
        if !finite {
            return Err(EditorError::InvalidParams("view values must be finite".into()));
        }
        if self.zoom < 1.0 {
            return Err(EditorError::InvalidParams(format!(
                "zoom {} is below 1",
                self.zoom
            )));
        }
        for (name, v) in [("pan_x", self.pan_x), ("pan_y", self.pan_y)] {
            if !(0.0..=1.0).contains(&v) {
                return Err(EditorError::InvalidParams(format!(
                    "{} {} is outside 0..=1",
                    name, v
                )));
            }
        }
        for (name, v) in [("stretch_x", self.stretch_x), ("stretch_y", self.stretch_y)] {
            if v <= 0.0 {
                return Err(EditorError::InvalidParams(format!(
                    "{} {} must be positive",
                    name, v
                )));
            }
        }
        Ok(())
    }

    /// Region of a `width`×`height` source that gets sampled.
    ///
    /// Pan slides the window across whatever travel is left at the current
    /// zoom; at zoom 1 with equal stretch there is none and pan is ignored.
    pub fn source_rect(&self, width: u32, height: u32) -> RectF {
        let w = width as f32;
        let h = height as f32;
        let source_width = w / self.zoom / self.stretch_x;
        let source_height = h / self.zoom / self.stretch_y;
        RectF {
            x: (w - source_width) * self.pan_x,
            y: (h - source_height) * self.pan_y,
            width: source_width,
            height: source_height,
        }
    }

    /// Region of the `width`×`height` destination the sample is drawn into.
    /// The axis with the weaker stretch is shrunk and centered.
    pub fn dest_rect(&self, width: u32, height: u32) -> RectF {
        let w = width as f32;
        let h = height as f32;
        if self.stretch_x > self.stretch_y {
            let dest_height = h / self.stretch_x * self.stretch_y;
            RectF {
                x: 0.0,
                y: (h - dest_height) / 2.0,
                width: w,
                height: dest_height,
            }
        } else {
            let dest_width = w / self.stretch_y * self.stretch_x;
            RectF {
                x: (w - dest_width) / 2.0,
                y: 0.0,
                width: dest_width,
                height: h,
            }
        }
    }
}

// ---------------------------------------------------------------------------
//  Classifier
// ---------------------------------------------------------------------------

/// Per-pixel painted / empty decision.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClassifierParams {
    pub red_weight: f32,
    pub green_weight: f32,
    pub blue_weight: f32,
    /// Pixels darker than this (after weighting and contrast) are painted.
    pub brightness_threshold: f32,
    pub contrast: f32,
    pub inverted: bool,
    /// Mirror the source left↔right before sampling.
    pub flipped: bool,
    pub paint_color: CellColor,
}

impl Default for ClassifierParams {
    fn default() -> Self {
        Self {
            red_weight: 0.299,
            green_weight: 0.587,
            blue_weight: 0.114,
            brightness_threshold: 150.0,
            contrast: 1.0,
            inverted: false,
            flipped: false,
            paint_color: CellColor::Black,
        }
    }
}

impl ClassifierParams {
    pub fn validate(&self) -> Result<(), EditorError> {
        let values = [
            self.red_weight,
            self.green_weight,
            self.blue_weight,
            self.brightness_threshold,
            self.contrast,
        ];
        if !values.iter().all(|v| v.is_finite()) {
            return Err(EditorError::InvalidParams(
                "classifier values must be finite".into(),
            ));
        }
        if self.red_weight < 0.0 || self.green_weight < 0.0 || self.blue_weight < 0.0 {
            return Err(EditorError::InvalidParams(
                "channel weights must not be negative".into(),
            ));
        }
        if !(0.0..=255.0).contains(&self.brightness_threshold) {
            return Err(EditorError::InvalidParams(format!(
                "brightness threshold {} is outside 0..=255",
                self.brightness_threshold
            )));
        }
        if self.contrast <= 0.0 {
            return Err(EditorError::InvalidParams(format!(
                "contrast {} must be positive",
                self.contrast
            )));
        }
        if !self.paint_color.is_painted() {
            return Err(EditorError::InvalidParams(
                "paint color cannot be the background".into(),
            ));
        }
        Ok(())
    }

    #[inline]
    pub fn brightness(&self, rgb: [u8; 3]) -> f32 {
        (rgb[0] as f32 * self.red_weight
            + rgb[1] as f32 * self.green_weight
            + rgb[2] as f32 * self.blue_weight)
            * self.contrast
    }

    #[inline]
    pub fn classify(&self, rgb: [u8; 3]) -> CellColor {
        let dark = self.brightness(rgb) < self.brightness_threshold;
        if dark != self.inverted {
            self.paint_color
        } else {
            CellColor::None
        }
    }
}

/// Everything the editor exposes as image-processing sliders.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ImageParams {
    pub view: ViewTransform,
    pub classify: ClassifierParams,
}

impl ImageParams {
    pub fn validate(&self) -> Result<(), EditorError> {
        self.view.validate()?;
        self.classify.validate()
    }
}

// ---------------------------------------------------------------------------
//  Sampling
// ---------------------------------------------------------------------------

/// Sample `source` into a `dest_width`×`dest_height` grid.
///
/// Every cell of the result is either `None` or `classify.paint_color`.
pub fn sample(
    source: &RgbaImage,
    dest_width: u32,
    dest_height: u32,
    view: &ViewTransform,
    classify: &ClassifierParams,
) -> Result<Grid, EditorError> {
    if dest_width == 0 || dest_height == 0 {
        return Err(EditorError::InvalidDimensions {
            width: dest_width,
            height: dest_height,
        });
    }
    if source.width() == 0 || source.height() == 0 {
        return Err(EditorError::ImageLoad("source image has no pixels".into()));
    }
    view.validate()?;
    classify.validate()?;

    let canvas = render_view(source, dest_width, dest_height, view, classify.flipped);
    let cells = classify_pixels(&canvas, classify);
    Ok(Grid::from_parts(dest_width, dest_height, cells))
}

/// Draw the transformed view of `source` onto a white `dest_width`×`dest_height`
/// canvas, one pixel per future cell.
///
/// The whole source rect is mapped onto the destination rect, so any part of
/// it that lies outside the image stays white, as do areas outside the
/// destination rect. Transparent source pixels blend toward white.
pub fn render_view(
    source: &RgbaImage,
    dest_width: u32,
    dest_height: u32,
    view: &ViewTransform,
    flipped: bool,
) -> RgbaImage {
    let mirrored;
    let src: &RgbaImage = if flipped {
        mirrored = imageops::flip_horizontal(source);
        &mirrored
    } else {
        source
    };

    let mut canvas = RgbaImage::from_pixel(dest_width, dest_height, Rgba([255, 255, 255, 255]));

    let s = view.source_rect(src.width(), src.height());
    let d = view.dest_rect(dest_width, dest_height);

    let Some(mx) = AxisMap::new(s.x, s.width, d.x, d.width, src.width(), dest_width) else {
        return canvas;
    };
    let Some(my) = AxisMap::new(s.y, s.height, d.y, d.height, src.height(), dest_height) else {
        return canvas;
    };

    let window =
        imageops::crop_imm(src, mx.win_start, my.win_start, mx.win_len, my.win_len).to_image();
    let filter = view.interpolation.to_filter();
    let scaled = imageops::resize(&window, mx.scaled_len, my.scaled_len, filter);

    for y in my.dst_start..my.dst_end {
        let sy = clamp_index(y as i64 - my.offset, my.scaled_len);
        for x in mx.dst_start..mx.dst_end {
            let sx = clamp_index(x as i64 - mx.offset, mx.scaled_len);
            canvas.get_pixel_mut(x, y).blend(scaled.get_pixel(sx, sy));
        }
    }
    canvas
}

/// How one axis of the source rect lands on the destination.
///
/// The whole-pixel window covering the visible span is scaled by the exact
/// rect ratio and shifted by `offset`, so window pixels outside the
/// fractional rect fall outside `dst_start..dst_end` and are never drawn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct AxisMap {
    win_start: u32,
    win_len: u32,
    scaled_len: u32,
    /// Destination coordinate of the scaled window's first pixel.
    offset: i64,
    dst_start: u32,
    dst_end: u32,
}

impl AxisMap {
    /// `None` when nothing of the image reaches a whole destination pixel.
    fn new(s0: f32, s_len: f32, d0: f32, d_len: f32, src_len: u32, dest_len: u32) -> Option<Self> {
        let scale = d_len / s_len;
        let vis_start = s0.max(0.0);
        let vis_end = (s0 + s_len).min(src_len as f32);
        if vis_end <= vis_start {
            return None;
        }

        let to_dest = |v: f32| (d0 + (v - s0) * scale).round().clamp(0.0, dest_len as f32) as u32;
        let dst_start = to_dest(vis_start);
        let dst_end = to_dest(vis_end);
        if dst_end <= dst_start {
            return None;
        }

        let win_start = (vis_start.floor() as u32).min(src_len - 1);
        let win_end = (vis_end.ceil() as u32).clamp(win_start + 1, src_len);
        let win_len = win_end - win_start;
        let scaled_len = ((win_len as f32 * scale).round() as u32).max(1);
        let offset = (d0 + (win_start as f32 - s0) * scale).round() as i64;

        Some(Self {
            win_start,
            win_len,
            scaled_len,
            offset,
            dst_start,
            dst_end,
        })
    }
}

fn clamp_index(v: i64, len: u32) -> u32 {
    v.clamp(0, len as i64 - 1) as u32
}

/// Row-parallel threshold pass over a rendered canvas.
fn classify_pixels(canvas: &RgbaImage, params: &ClassifierParams) -> Vec<CellColor> {
    let w = canvas.width() as usize;
    let mut cells = vec![CellColor::None; w * canvas.height() as usize];
    cells
        .par_chunks_mut(w)
        .zip(canvas.as_raw().par_chunks(w * 4))
        .for_each(|(row, px)| {
            for (cell, p) in row.iter_mut().zip(px.chunks_exact(4)) {
                *cell = params.classify([p[0], p[1], p[2]]);
            }
        });
    cells
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(w: u32, h: u32, rgb: [u8; 3]) -> RgbaImage {
        RgbaImage::from_pixel(w, h, Rgba([rgb[0], rgb[1], rgb[2], 255]))
    }

    /// Left half black, right half white.
    fn half_black(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_fn(w, h, |x, _| {
            if x < w / 2 {
                Rgba([0, 0, 0, 255])
            } else {
                Rgba([255, 255, 255, 255])
            }
        })
    }

    fn sample_default(img: &RgbaImage, w: u32, h: u32) -> Grid {
        sample(img, w, h, &ViewTransform::default(), &ClassifierParams::default()).unwrap()
    }

    #[test]
    fn white_source_gives_blank_grid() {
        let g = sample_default(&solid(10, 10, [255, 255, 255]), 5, 5);
        assert_eq!(g.width(), 5);
        assert_eq!(g.height(), 5);
        assert!(g.is_blank());
    }

    #[test]
    fn black_source_paints_every_cell() {
        let g = sample_default(&solid(8, 8, [0, 0, 0]), 4, 3);
        assert_eq!(g.painted_count(), 12);
        assert!(g.cells().iter().all(|c| *c == CellColor::Black));
    }

    #[test]
    fn paint_color_is_used_for_dark_cells() {
        let classify = ClassifierParams {
            paint_color: CellColor::Red,
            ..Default::default()
        };
        let g = sample(&solid(4, 4, [0, 0, 0]), 2, 2, &ViewTransform::default(), &classify).unwrap();
        assert!(g.cells().iter().all(|c| *c == CellColor::Red));
    }

    #[test]
    fn invert_swaps_painted_and_empty() {
        let classify = ClassifierParams {
            inverted: true,
            ..Default::default()
        };
        let g = sample(&solid(4, 4, [255, 255, 255]), 3, 3, &ViewTransform::default(), &classify).unwrap();
        assert_eq!(g.painted_count(), 9);
    }

    #[test]
    fn flip_mirrors_source() {
        let img = half_black(20, 10);
        let plain = sample_default(&img, 4, 2);
        assert_eq!(plain.get(0, 0), Some(CellColor::Black));
        assert_eq!(plain.get(0, 3), Some(CellColor::None));

        let classify = ClassifierParams {
            flipped: true,
            ..Default::default()
        };
        let flipped = sample(&img, 4, 2, &ViewTransform::default(), &classify).unwrap();
        assert_eq!(flipped.get(0, 0), Some(CellColor::None));
        assert_eq!(flipped.get(0, 3), Some(CellColor::Black));
    }

    #[test]
    fn channel_weights_change_the_verdict() {
        let red = solid(4, 4, [255, 0, 0]);
        assert_eq!(sample_default(&red, 2, 2).painted_count(), 4);

        let classify = ClassifierParams {
            red_weight: 1.0,
            green_weight: 0.0,
            blue_weight: 0.0,
            ..Default::default()
        };
        let g = sample(&red, 2, 2, &ViewTransform::default(), &classify).unwrap();
        assert!(g.is_blank());
    }

    #[test]
    fn contrast_scales_brightness() {
        let grey = solid(4, 4, [100, 100, 100]);
        assert_eq!(sample_default(&grey, 2, 2).painted_count(), 4);
        let classify = ClassifierParams {
            contrast: 2.0,
            ..Default::default()
        };
        let g = sample(&grey, 2, 2, &ViewTransform::default(), &classify).unwrap();
        assert!(g.is_blank());
    }

    #[test]
    fn source_rect_follows_zoom_and_pan() {
        let view = ViewTransform {
            zoom: 2.0,
            pan_x: 0.0,
            pan_y: 1.0,
            ..Default::default()
        };
        let r = view.source_rect(100, 60);
        assert_eq!(r, RectF { x: 0.0, y: 30.0, width: 50.0, height: 30.0 });
    }

    #[test]
    fn pan_is_inert_at_unit_zoom() {
        let a = ViewTransform { pan_x: 0.0, pan_y: 0.0, ..Default::default() };
        let b = ViewTransform { pan_x: 1.0, pan_y: 1.0, ..Default::default() };
        assert_eq!(a.source_rect(40, 30), b.source_rect(40, 30));
        assert_eq!(a.source_rect(40, 30).x, 0.0);
    }

    #[test]
    fn equal_stretch_uses_full_destination() {
        let r = ViewTransform::default().dest_rect(20, 15);
        assert_eq!(r, RectF { x: 0.0, y: 0.0, width: 20.0, height: 15.0 });
    }

    #[test]
    fn wider_stretch_letterboxes_vertically() {
        let view = ViewTransform {
            stretch_x: 2.0,
            ..Default::default()
        };
        let r = view.dest_rect(10, 10);
        assert_eq!(r, RectF { x: 0.0, y: 2.5, width: 10.0, height: 5.0 });

        let g = sample(&solid(10, 10, [0, 0, 0]), 10, 10, &view, &ClassifierParams::default()).unwrap();
        assert!(g.row(0).unwrap().iter().all(|c| !c.is_painted()));
        assert!(g.row(5).unwrap().iter().all(|c| c.is_painted()));
        assert!(g.row(9).unwrap().iter().all(|c| !c.is_painted()));
    }

    #[test]
    fn taller_stretch_pillarboxes_horizontally() {
        let view = ViewTransform {
            stretch_y: 2.0,
            ..Default::default()
        };
        let r = view.dest_rect(10, 10);
        assert_eq!(r, RectF { x: 2.5, y: 0.0, width: 5.0, height: 10.0 });
    }

    #[test]
    fn zero_destination_is_rejected() {
        let img = solid(4, 4, [0, 0, 0]);
        let err = sample(&img, 0, 5, &ViewTransform::default(), &ClassifierParams::default());
        assert_eq!(err, Err(EditorError::InvalidDimensions { width: 0, height: 5 }));
    }

    #[test]
    fn empty_source_is_a_load_error() {
        let img = RgbaImage::new(0, 0);
        let err = sample(&img, 3, 3, &ViewTransform::default(), &ClassifierParams::default());
        assert!(matches!(err, Err(EditorError::ImageLoad(_))));
    }

    #[test]
    fn out_of_range_params_are_rejected() {
        let img = solid(4, 4, [0, 0, 0]);
        let zoomed_out = ViewTransform { zoom: 0.5, ..Default::default() };
        assert!(matches!(
            sample(&img, 2, 2, &zoomed_out, &ClassifierParams::default()),
            Err(EditorError::InvalidParams(_))
        ));
        let no_paint = ClassifierParams { paint_color: CellColor::None, ..Default::default() };
        assert!(no_paint.validate().is_err());
        let bad_threshold = ClassifierParams { brightness_threshold: 300.0, ..Default::default() };
        assert!(bad_threshold.validate().is_err());
        let bad_pan = ViewTransform { pan_x: 1.5, ..Default::default() };
        assert!(bad_pan.validate().is_err());
    }

    fn painted_columns(g: &Grid, row: u32) -> Vec<u32> {
        (0..g.width()).filter(|&c| g.get(row, c).is_some_and(|x| x.is_painted())).collect()
    }

    #[test]
    fn narrow_stretch_pads_outside_the_image() {
        // Source rect is [-8, 24) wide, drawn into dest [4, 12): the image
        // itself covers [6, 10).
        let view = ViewTransform { stretch_x: 0.5, ..Default::default() };
        let s = view.source_rect(16, 16);
        assert_eq!((s.x, s.width), (-8.0, 32.0));

        let g = sample(&solid(16, 16, [0, 0, 0]), 16, 16, &view, &ClassifierParams::default()).unwrap();
        for row in [0, 8, 15] {
            assert_eq!(painted_columns(&g, row), vec![6, 7, 8, 9]);
        }
    }

    #[test]
    fn narrow_vertical_stretch_pads_rows() {
        let view = ViewTransform { stretch_y: 0.5, ..Default::default() };
        let g = sample(&solid(16, 16, [0, 0, 0]), 16, 16, &view, &ClassifierParams::default()).unwrap();
        let painted_rows: Vec<u32> = (0..16).filter(|&r| g.get(r, 0) == Some(CellColor::Black)).collect();
        assert_eq!(painted_rows, vec![6, 7, 8, 9]);
    }

    #[test]
    fn fractional_source_rect_is_not_widened() {
        // Column 0 black. At zoom 8 the rect is one pixel wide starting at
        // x = 0.25, so three quarters of it is black.
        let img = RgbaImage::from_fn(8, 8, |x, _| {
            if x == 0 { Rgba([0, 0, 0, 255]) } else { Rgba([255, 255, 255, 255]) }
        });
        let view = ViewTransform {
            zoom: 8.0,
            pan_x: 0.25 / 7.0,
            interpolation: Interpolation::Nearest,
            ..Default::default()
        };
        let g = sample(&img, 8, 8, &view, &ClassifierParams::default()).unwrap();
        assert_eq!(painted_columns(&g, 4), vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn axis_map_drops_window_overhang() {
        let m = AxisMap::new(0.25, 1.0, 0.0, 8.0, 8, 8).unwrap();
        assert_eq!((m.win_start, m.win_len, m.scaled_len), (0, 2, 16));
        assert_eq!(m.offset, -2);
        assert_eq!((m.dst_start, m.dst_end), (0, 8));

        let wide = AxisMap::new(-8.0, 32.0, 4.0, 8.0, 16, 16).unwrap();
        assert_eq!((wide.dst_start, wide.dst_end), (6, 10));
        assert_eq!((wide.scaled_len, wide.offset), (4, 6));
    }

    #[test]
    fn zoom_crops_into_the_panned_corner() {
        // Black top-left quadrant only.
        let img = RgbaImage::from_fn(20, 20, |x, y| {
            if x < 10 && y < 10 {
                Rgba([0, 0, 0, 255])
            } else {
                Rgba([255, 255, 255, 255])
            }
        });
        let top_left = ViewTransform { zoom: 2.0, pan_x: 0.0, pan_y: 0.0, ..Default::default() };
        let g = sample(&img, 4, 4, &top_left, &ClassifierParams::default()).unwrap();
        assert_eq!(g.painted_count(), 16);

        let bottom_right = ViewTransform { zoom: 2.0, pan_x: 1.0, pan_y: 1.0, ..Default::default() };
        let g = sample(&img, 4, 4, &bottom_right, &ClassifierParams::default()).unwrap();
        assert!(g.is_blank());
    }
}
