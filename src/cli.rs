// ============================================================================
// Nonomaker CLI — headless batch conversion via command-line arguments
// ============================================================================
//
// Usage examples:
//   nonomaker --input cat.png --preset 9 --output cat.nono
//   nonomaker -i cat.png --size 24x18 --threshold 120 --invert --hints
//   nonomaker -i *.jpg --output-dir puzzles/ --format bmp --color red
//   nonomaker -i saved.nono --shift 2,-1 --fill 0,0 -o moved.nono
//
// Inputs are either `.nono` saves or images; images are sampled into the
// selected preset's grid.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;

use crate::grid::{CUSTOM_PRESET, CellColor};
use crate::io::{ExportFormat, ImageSource, NONO_EXTENSION};
use crate::ops::sampler::{ImageParams, Interpolation};
use crate::session::EditorSession;
use crate::settings::Settings;

// ============================================================================
// CLI argument definition (clap Derive)
// ============================================================================

/// Nonomaker headless puzzle builder.
///
/// Turn images into nonogram grids, edit saved puzzles and export them.
#[derive(Parser, Debug)]
#[command(
    name = "nonomaker",
    version,
    about = "Nonomaker headless nonogram builder",
    long_about = "Sample images into nonogram grids, shift or fill saved .nono puzzles,\n\
                  and write .nono saves or 1-pixel-per-cell BMP/PNG exports.\n\n\
                  Example:\n  \
                  nonomaker --input cat.png --preset 9 --output cat.nono --hints\n  \
                  nonomaker -i *.jpg --output-dir out/ --format bmp"
)]
pub struct CliArgs {
    /// Input file(s). Glob patterns accepted (e.g. "*.png", "saves/*.nono").
    /// `.nono` files are opened as saves; everything else is sampled as an image.
    #[arg(short, long, required = true, num_args = 1..)]
    pub input: Vec<String>,

    /// Output file path. Only valid for single-file input.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output directory for batch processing.
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Output format: nono, bmp, png, or image (the export format from
    /// settings). Inferred from --output when omitted, defaulting to nono.
    #[arg(short, long, value_name = "FORMAT")]
    pub format: Option<String>,

    /// Grid preset index (0 = custom size).
    #[arg(short, long, value_name = "INDEX")]
    pub preset: Option<usize>,

    /// Custom grid size; selects the custom preset.
    #[arg(long, value_name = "WxH", value_parser = parse_size)]
    pub size: Option<(u32, u32)>,

    /// Zoom factor (>= 1).
    #[arg(long)]
    pub zoom: Option<f32>,

    /// Horizontal pan (0–1).
    #[arg(long)]
    pub pan_x: Option<f32>,

    /// Vertical pan (0–1).
    #[arg(long)]
    pub pan_y: Option<f32>,

    #[arg(long)]
    pub stretch_x: Option<f32>,

    #[arg(long)]
    pub stretch_y: Option<f32>,

    /// Brightness threshold (0–255); darker pixels are painted.
    #[arg(short, long)]
    pub threshold: Option<f32>,

    #[arg(long)]
    pub contrast: Option<f32>,

    /// Channel weights for brightness.
    #[arg(long, value_name = "R,G,B", value_parser = parse_weights)]
    pub weights: Option<[f32; 3]>,

    /// Paint light pixels instead of dark ones.
    #[arg(long)]
    pub invert: bool,

    /// Mirror the image horizontally before sampling.
    #[arg(long)]
    pub flip: bool,

    /// Resampling filter: nearest, bilinear, bicubic, lanczos3.
    #[arg(long, value_name = "FILTER")]
    pub interpolation: Option<String>,

    /// Paint color (black, red, blue, ...).
    #[arg(short, long, value_name = "COLOR")]
    pub color: Option<String>,

    /// Move the picture by DX columns and DY rows.
    #[arg(long, value_name = "DX,DY", value_parser = parse_pair, allow_hyphen_values = true)]
    pub shift: Option<(i64, i64)>,

    /// Flood fill from ROW,COL with the paint color.
    #[arg(long, value_name = "ROW,COL", value_parser = parse_pair)]
    pub fill: Option<(i64, i64)>,

    /// Print the puzzle with its row and column hints.
    #[arg(long)]
    pub hints: bool,

    /// Settings file to use instead of the per-user one.
    #[arg(long, value_name = "FILE")]
    pub settings: Option<PathBuf>,

    /// Store the effective sampler options, color and format as the new
    /// defaults (in --settings or the per-user file).
    #[arg(long)]
    pub save_settings: bool,

    /// Log level: off, error, warn, info, debug, trace.
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Echo the log to stderr and print per-file timing.
    #[arg(short, long)]
    pub verbose: bool,
}

impl CliArgs {
    /// Settings from `--settings` or the per-user file.
    pub fn load_settings(&self) -> Settings {
        match &self.settings {
            Some(path) => Settings::load_from(path),
            None => Settings::load(),
        }
    }
}

/// What gets written for each input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Nono,
    Image(ExportFormat),
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Nono => NONO_EXTENSION,
            OutputFormat::Image(f) => f.extension(),
        }
    }
}

/// Per-file options resolved once from the arguments and settings.
struct Job {
    preset: Option<usize>,
    size: Option<(u32, u32)>,
    params: ImageParams,
    /// Sampler flags were given, so saved puzzles with an image re-sample.
    params_overridden: bool,
    shift: Option<(i64, i64)>,
    fill: Option<(i64, i64)>,
    format: OutputFormat,
    hints: bool,
}

impl Job {
    fn to_settings(&self, base: &Settings) -> Settings {
        let mut s = base.clone();
        s.image_params = self.params;
        s.paint_color = self.params.classify.paint_color;
        if let Some((w, h)) = self.size {
            s.custom_width = w;
            s.custom_height = h;
        }
        if let Some(p) = self.preset {
            s.default_preset = p;
        }
        if let OutputFormat::Image(f) = self.format {
            s.export_format = f;
        }
        s
    }
}

// ============================================================================
// Public entry point
// ============================================================================

/// Run all CLI processing and return an OS exit code.
/// `0` = all files succeeded, `1` = one or more files failed.
pub fn run(args: CliArgs, settings: &Settings) -> ExitCode {
    let inputs = resolve_inputs(&args.input);
    if inputs.is_empty() {
        eprintln!("error: no input files matched the given pattern(s).");
        return ExitCode::FAILURE;
    }

    if inputs.len() > 1 && args.output.is_some() && args.output_dir.is_none() {
        eprintln!(
            "error: {} input files given but --output only accepts a single file path.\n\
             Use --output-dir to specify a destination directory for batch processing.",
            inputs.len()
        );
        return ExitCode::FAILURE;
    }

    let job = match build_job(&args, settings) {
        Ok(job) => job,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if args.save_settings {
        let updated = job.to_settings(settings);
        let result = match &args.settings {
            Some(path) => updated.save_to(path),
            None => updated.save(),
        };
        match result {
            Ok(()) => log::info!("Saved settings"),
            Err(e) => eprintln!("warning: could not save settings: {}", e),
        }
    }

    if let Some(dir) = &args.output_dir
        && let Err(e) = std::fs::create_dir_all(dir)
    {
        eprintln!(
            "error: could not create output directory '{}': {}",
            dir.display(),
            e
        );
        return ExitCode::FAILURE;
    }

    let total = inputs.len();
    let multi = total > 1;
    let mut any_failure = false;

    for (idx, input_path) in inputs.iter().enumerate() {
        if multi || args.verbose {
            println!("[{}/{}] {}", idx + 1, total, input_path.display());
        }

        let file_start = Instant::now();

        let Some(output_path) = build_output_path(
            input_path,
            args.output.as_deref(),
            args.output_dir.as_deref(),
            job.format,
        ) else {
            eprintln!(
                "  error: cannot determine output path for '{}'.",
                input_path.display()
            );
            any_failure = true;
            continue;
        };

        match run_one(input_path, &output_path, &job, settings) {
            Ok(()) => {
                if args.verbose || multi {
                    println!(
                        "  → {} ({:.0}ms)",
                        output_path.display(),
                        file_start.elapsed().as_secs_f64() * 1000.0
                    );
                }
            }
            Err(e) => {
                log::error!("{}: {}", input_path.display(), e);
                eprintln!("  error: {}", e);
                any_failure = true;
            }
        }
    }

    if any_failure { ExitCode::FAILURE } else { ExitCode::SUCCESS }
}

// ============================================================================
// Per-file processing pipeline
// ============================================================================

fn run_one(input: &Path, output: &Path, job: &Job, settings: &Settings) -> Result<(), String> {
    // -- Step 1: Load ----------------------------------------------------
    let mut session = if is_nono(input) {
        let mut session =
            EditorSession::open(input, settings).map_err(|e| format!("load failed: {}", e))?;
        if job.preset.is_some() || job.size.is_some() {
            log::warn!(
                "{}: --preset/--size ignored for saved puzzles",
                input.display()
            );
        }
        session
            .set_paint_color(job.params.classify.paint_color)
            .map_err(|e| e.to_string())?;
        if job.params_overridden && session.image().is_some() {
            session
                .set_image_params(job.params)
                .map_err(|e| format!("sampling failed: {}", e))?;
        }
        session
    } else {
        let mut session = EditorSession::new(settings).map_err(|e| e.to_string())?;
        if let Some((w, h)) = job.size {
            session.select_preset(CUSTOM_PRESET).map_err(|e| e.to_string())?;
            session.set_custom_size(w, h).map_err(|e| e.to_string())?;
        } else if let Some(p) = job.preset {
            session.select_preset(p).map_err(|e| e.to_string())?;
        }
        session.set_image_params(job.params).map_err(|e| e.to_string())?;
        session
            .load_image(&ImageSource::Path(input.to_path_buf()))
            .map_err(|e| format!("load failed: {}", e))?;
        session
    };

    // -- Step 2: Edit (optional) -----------------------------------------
    if let Some((dx, dy)) = job.shift {
        session.shift(dx, dy);
    }
    if let Some((row, col)) = job.fill {
        let color = session.paint_color();
        session
            .fill(row, col, color)
            .map_err(|e| format!("fill failed: {}", e))?;
    }

    if job.hints {
        print!("{}", session.hint_layout().render_text(session.grid()));
    }

    // -- Step 3: Save ----------------------------------------------------
    match job.format {
        OutputFormat::Nono => session
            .save(output)
            .map_err(|e| format!("save failed: {}", e))?,
        OutputFormat::Image(format) => session
            .export(output, format)
            .map_err(|e| format!("export failed: {}", e))?,
    }

    Ok(())
}

// ============================================================================
// Helpers
// ============================================================================

fn build_job(args: &CliArgs, settings: &Settings) -> Result<Job, String> {
    let mut params = settings.image_params;
    params.classify.paint_color = settings.paint_color;

    let view = &mut params.view;
    let classify = &mut params.classify;
    let mut overridden = false;
    let mut set = |slot: &mut f32, value: Option<f32>| {
        if let Some(v) = value {
            *slot = v;
            overridden = true;
        }
    };
    set(&mut view.zoom, args.zoom);
    set(&mut view.pan_x, args.pan_x);
    set(&mut view.pan_y, args.pan_y);
    set(&mut view.stretch_x, args.stretch_x);
    set(&mut view.stretch_y, args.stretch_y);
    set(&mut classify.brightness_threshold, args.threshold);
    set(&mut classify.contrast, args.contrast);
    if let Some([r, g, b]) = args.weights {
        set(&mut classify.red_weight, Some(r));
        set(&mut classify.green_weight, Some(g));
        set(&mut classify.blue_weight, Some(b));
    }
    if let Some(name) = &args.interpolation {
        view.interpolation = Interpolation::from_label(name)
            .ok_or_else(|| format!("unknown interpolation '{}'", name))?;
        overridden = true;
    }
    if args.invert {
        classify.inverted = true;
        overridden = true;
    }
    if args.flip {
        classify.flipped = true;
        overridden = true;
    }
    if let Some(name) = &args.color {
        let color: CellColor = name.parse()?;
        if !color.is_painted() {
            return Err("--color must name a paint color, not the background".into());
        }
        classify.paint_color = color;
    }
    params.validate().map_err(|e| e.to_string())?;

    if let Some(p) = args.preset
        && p >= crate::grid::GRID_PRESETS.len()
    {
        return Err(format!("no grid preset #{}", p));
    }

    Ok(Job {
        preset: args.preset,
        size: args.size,
        params,
        params_overridden: overridden,
        shift: args.shift,
        fill: args.fill,
        format: parse_format(
            args.format.as_deref(),
            args.output.as_deref(),
            settings.export_format,
        )?,
        hints: args.hints,
    })
}

fn is_nono(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(NONO_EXTENSION))
}

/// Expand glob patterns and literal paths into a deduplicated, ordered list.
fn resolve_inputs(patterns: &[String]) -> Vec<PathBuf> {
    let mut result: Vec<PathBuf> = Vec::new();

    for pattern in patterns {
        let as_path = Path::new(pattern);

        if as_path.exists() {
            if !result.iter().any(|p| p.as_path() == as_path) {
                result.push(as_path.to_path_buf());
            }
            continue;
        }

        match glob::glob(pattern) {
            Ok(entries) => {
                let mut matched = false;
                for entry in entries.flatten() {
                    if !result.contains(&entry) {
                        result.push(entry);
                    }
                    matched = true;
                }
                if !matched {
                    eprintln!("warning: pattern '{}' matched no files.", pattern);
                }
            }
            Err(e) => {
                eprintln!("warning: invalid glob '{}': {}", pattern, e);
            }
        }
    }

    result
}

/// Choose the [`OutputFormat`] from the `--format` string or infer it from
/// the output file extension. Defaults to `.nono` when neither is known.
fn parse_format(
    format_arg: Option<&str>,
    output: Option<&Path>,
    export_default: ExportFormat,
) -> Result<OutputFormat, String> {
    let from_name = |name: &str| -> Option<OutputFormat> {
        if name.eq_ignore_ascii_case(NONO_EXTENSION) {
            return Some(OutputFormat::Nono);
        }
        if name.eq_ignore_ascii_case("image") {
            return Some(OutputFormat::Image(export_default));
        }
        ExportFormat::from_extension(name).map(OutputFormat::Image)
    };

    if let Some(f) = format_arg {
        return from_name(f).ok_or_else(|| format!("unknown output format '{}'", f));
    }

    let inferred = output
        .and_then(|out| out.extension())
        .and_then(|e| e.to_str())
        .and_then(from_name);
    Ok(inferred.unwrap_or(OutputFormat::Nono))
}

/// Compute the output path for a single input file.
///
/// Priority:
/// 1. `--output` (explicit path, used for single-file input)
/// 2. `--output-dir` (batch directory, derives filename from input stem)
/// 3. Fallback: same directory as input, same stem, new extension
///    (appends `_out` to stem if it would collide with the input path)
fn build_output_path(
    input: &Path,
    output: Option<&Path>,
    output_dir: Option<&Path>,
    format: OutputFormat,
) -> Option<PathBuf> {
    if let Some(out) = output {
        return Some(out.to_path_buf());
    }

    let ext = format.extension();
    let stem = input.file_stem()?.to_string_lossy().into_owned();

    if let Some(dir) = output_dir {
        return Some(dir.join(format!("{}.{}", stem, ext)));
    }

    let parent = input.parent().unwrap_or(Path::new("."));
    let candidate = parent.join(format!("{}.{}", stem, ext));

    if candidate == input {
        Some(parent.join(format!("{}_out.{}", stem, ext)))
    } else {
        Some(candidate)
    }
}

fn parse_size(s: &str) -> Result<(u32, u32), String> {
    let (w, h) = s
        .split_once(['x', 'X', '×'])
        .ok_or_else(|| format!("expected WxH, got '{}'", s))?;
    let w: u32 = w.trim().parse().map_err(|_| format!("bad width in '{}'", s))?;
    let h: u32 = h.trim().parse().map_err(|_| format!("bad height in '{}'", s))?;
    if w == 0 || h == 0 {
        return Err(format!("grid size '{}' must be at least 1x1", s));
    }
    Ok((w, h))
}

fn parse_pair(s: &str) -> Result<(i64, i64), String> {
    let (a, b) = s
        .split_once(',')
        .ok_or_else(|| format!("expected two comma-separated numbers, got '{}'", s))?;
    let a = a.trim().parse().map_err(|_| format!("bad number in '{}'", s))?;
    let b = b.trim().parse().map_err(|_| format!("bad number in '{}'", s))?;
    Ok((a, b))
}

fn parse_weights(s: &str) -> Result<[f32; 3], String> {
    let parts: Vec<f32> = s
        .split(',')
        .map(|p| p.trim().parse::<f32>())
        .collect::<Result<_, _>>()
        .map_err(|_| format!("bad weights '{}'", s))?;
    match parts.as_slice() {
        [r, g, b] => Ok([*r, *g, *b]),
        _ => Err(format!("expected three weights R,G,B, got '{}'", s)),
    }
}
