// ============================================================================
// rasterpad CLI — headless batch editing via command-line arguments
// ============================================================================
//
// Usage examples:
//   rasterpad -i photo.png --crop 10,10,200x150 -o out.png
//   rasterpad -i photo.jpg --resize 1024x1024 --anchor center --fill "#ffffffff" -o padded.png
//   rasterpad -i "shots/*.jpg" --output-dir processed/
//   rasterpad --blank 800x600 --text "hello" --text-at 40,120 -o hello.png
//
// All processing runs synchronously on the current thread; each input file
// gets its own engine, is edited in a fixed operation order (crop → resize →
// stroke → dab → text) and written out. A failing file is reported and the
// batch continues.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use image::Rgba;

use crate::engine::{Anchor, EditEngine};
use crate::error::EditError;
use crate::io;
use crate::log_info;
use crate::surface::Rect;

/// A brush polyline parsed from `x1,y1;x2,y2;…`.
#[derive(Clone, Debug)]
pub struct StrokePath(pub Vec<(f32, f32)>);

/// rasterpad headless image editor.
///
/// Edit raster images and convert between formats without a GUI.
#[derive(Parser, Debug)]
#[command(
    name = "rasterpad",
    about = "rasterpad headless batch image editor",
    long_about = "Apply crop / canvas-resize / brush / text operations to image files and\n\
                  write the result, PNG by default. Any raster format the image crate\n\
                  decodes is accepted on input.\n\n\
                  Operations always run in the order: crop, resize, stroke, dab, text."
)]
pub struct CliArgs {
    /// Input file(s). Glob patterns accepted (e.g. "shots/*.jpg").
    #[arg(short, long, num_args = 1.., required_unless_present = "blank")]
    pub input: Vec<String>,

    /// Start from a blank white document of this size instead of an input
    /// file. Requires --output.
    #[arg(long, value_name = "WxH", value_parser = parse_size_arg, conflicts_with = "input")]
    pub blank: Option<(u32, u32)>,

    /// Output file path. Only valid for a single document; use --output-dir
    /// for batches.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output directory for batch processing. Files keep their stem and get
    /// a .png extension.
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Crop to this region first.
    #[arg(long, value_name = "X,Y,WxH", value_parser = parse_rect_arg)]
    pub crop: Option<Rect>,

    /// Resize the canvas (not the content) to this size.
    #[arg(long, value_name = "WxH", value_parser = parse_size_arg)]
    pub resize: Option<(u32, u32)>,

    /// Edge or corner that stays fixed during --resize.
    #[arg(long, default_value = "top-left", value_parser = parse_anchor_arg)]
    pub anchor: Anchor,

    /// Fill color for canvas space exposed by --resize.
    #[arg(long, default_value = "#00000000", value_parser = parse_color_arg)]
    pub fill: Rgba<u8>,

    /// Stroke a brush polyline, e.g. "10,10;40,40;70,10".
    #[arg(long, value_name = "X,Y;X,Y;...", value_parser = parse_stroke_arg)]
    pub stroke: Option<StrokePath>,

    /// Dab the brush once at this point.
    #[arg(long, value_name = "X,Y", value_parser = parse_point_arg)]
    pub dab: Option<(f32, f32)>,

    /// Brush diameter in pixels for --stroke / --dab.
    #[arg(long, value_name = "PX")]
    pub brush_size: Option<f32>,

    /// Brush and text color.
    #[arg(long, value_name = "#RRGGBB[AA]", value_parser = parse_color_arg)]
    pub color: Option<Rgba<u8>>,

    /// Text to stamp; the baseline starts at --text-at.
    #[arg(long, requires = "text_at")]
    pub text: Option<String>,

    /// Baseline position for --text.
    #[arg(long, value_name = "X,Y", value_parser = parse_point_arg)]
    pub text_at: Option<(f32, f32)>,

    /// Font size for --text.
    #[arg(long, value_name = "PX")]
    pub text_size: Option<f32>,

    /// Font family for --text; falls back to the system sans-serif face.
    #[arg(long, value_name = "FAMILY")]
    pub font: Option<String>,

    /// Print per-file progress.
    #[arg(short, long)]
    pub verbose: bool,
}

// ============================================================================
// Entry point
// ============================================================================

/// Run all CLI processing. Exit code 0 = every document succeeded, 1 = one
/// or more failed.
pub fn run(args: CliArgs) -> ExitCode {
    if execute(args) {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// `true` when every document succeeded.
fn execute(args: CliArgs) -> bool {
    // Synthetic blank document: exactly one output file.
    if args.blank.is_some() {
        let Some(output) = args.output.clone() else {
            eprintln!("error: --blank requires --output.");
            return false;
        };
        return match process_one(None, &output, &args) {
            Ok(()) => true,
            Err(e) => {
                eprintln!("error: {}: {}", output.display(), e);
                false
            }
        };
    }

    let inputs = resolve_inputs(&args.input);
    if inputs.is_empty() {
        eprintln!("error: no input files matched the given pattern(s).");
        return false;
    }
    if inputs.len() > 1 && args.output.is_some() && args.output_dir.is_none() {
        eprintln!(
            "error: {} input files given but --output only accepts a single file path.\n\
             Use --output-dir to specify a destination directory for batch processing.",
            inputs.len()
        );
        return false;
    }
    if args.output.is_none() && args.output_dir.is_none() {
        eprintln!("error: no destination; pass --output or --output-dir.");
        return false;
    }

    let mut failures = 0usize;
    for input in &inputs {
        let output = match output_path_for(input, &args) {
            Some(p) => p,
            None => {
                eprintln!("error: {}: cannot derive an output name.", input.display());
                failures += 1;
                continue;
            }
        };
        match process_one(Some(input), &output, &args) {
            Ok(()) => {
                if args.verbose {
                    println!("{} -> {}", input.display(), output.display());
                }
            }
            Err(e) => {
                eprintln!("error: {}: {}", input.display(), e);
                failures += 1;
            }
        }
    }

    failures == 0
}

/// Expand glob patterns into concrete paths; a pattern with no matches is
/// kept verbatim so the per-file load error names it.
fn resolve_inputs(patterns: &[String]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for pattern in patterns {
        match glob::glob(pattern) {
            Ok(paths) => {
                let before = files.len();
                files.extend(paths.flatten());
                if files.len() == before {
                    files.push(PathBuf::from(pattern));
                }
            }
            Err(_) => files.push(PathBuf::from(pattern)),
        }
    }
    files
}

fn output_path_for(input: &Path, args: &CliArgs) -> Option<PathBuf> {
    if let Some(output) = &args.output {
        return Some(output.clone());
    }
    let dir = args.output_dir.as_ref()?;
    let stem = input.file_stem()?;
    let mut name = stem.to_os_string();
    name.push(".png");
    Some(dir.join(name))
}

/// Build one engine, run the pipeline, write the result.
fn process_one(input: Option<&Path>, output: &Path, args: &CliArgs) -> Result<(), EditError> {
    let mut engine = EditEngine::new();
    match input {
        Some(path) => engine.load(path)?,
        None => {
            let (w, h) = args.blank.unwrap_or((800, 600));
            engine.create_blank(w, h, Rgba([255, 255, 255, 255]))?;
        }
    }

    if let Some(size) = args.brush_size {
        engine.set_brush_size(size);
    }
    if let Some(color) = args.color {
        engine.set_brush_color(color);
    }
    if let Some(size) = args.text_size {
        engine.set_text_size(size);
    }
    engine.set_font_family(args.font.clone());

    if let Some(rect) = args.crop {
        engine.mark_rect(rect);
        engine.start_crop();
        engine.apply_crop();
    }
    if let Some((w, h)) = args.resize {
        engine.resize_canvas(w, h, args.anchor, args.fill);
    }
    if let Some(stroke) = &args.stroke {
        engine.begin_stroke();
        engine.draw_stroke(&stroke.0);
    }
    if let Some(point) = args.dab {
        engine.draw_dab(point);
    }
    if let (Some(text), Some((x, y))) = (&args.text, args.text_at) {
        engine.stamp_text(text, x, y, None);
    }

    let is_png = output
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("png"))
        .unwrap_or(true);
    if is_png {
        engine.save(output)?;
    } else {
        engine.paste();
        io::save_auto(&engine.read(), output)?;
        log_info!("saved {}", output.display());
    }
    Ok(())
}

// ============================================================================
// Argument parsers
// ============================================================================

fn parse_size_arg(s: &str) -> Result<(u32, u32), String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WxH, got '{s}'"))?;
    let w: u32 = w.trim().parse().map_err(|_| format!("bad width '{w}'"))?;
    let h: u32 = h.trim().parse().map_err(|_| format!("bad height '{h}'"))?;
    if w == 0 || h == 0 {
        return Err("width and height must be at least 1".to_string());
    }
    Ok((w, h))
}

fn parse_point_arg(s: &str) -> Result<(f32, f32), String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y, got '{s}'"))?;
    let x: f32 = x.trim().parse().map_err(|_| format!("bad x '{x}'"))?;
    let y: f32 = y.trim().parse().map_err(|_| format!("bad y '{y}'"))?;
    Ok((x, y))
}

fn parse_rect_arg(s: &str) -> Result<Rect, String> {
    // X,Y,WxH
    let mut parts = s.splitn(3, ',');
    let (x, y, size) = match (parts.next(), parts.next(), parts.next()) {
        (Some(x), Some(y), Some(size)) => (x, y, size),
        _ => return Err(format!("expected X,Y,WxH, got '{s}'")),
    };
    let x: i32 = x.trim().parse().map_err(|_| format!("bad x '{x}'"))?;
    let y: i32 = y.trim().parse().map_err(|_| format!("bad y '{y}'"))?;
    let (w, h) = parse_size_arg(size)?;
    Ok(Rect::new(x, y, w, h))
}

fn parse_anchor_arg(s: &str) -> Result<Anchor, String> {
    Anchor::all()
        .iter()
        .copied()
        .find(|a| a.label() == s)
        .ok_or_else(|| {
            let names: Vec<_> = Anchor::all().iter().map(|a| a.label()).collect();
            format!("unknown anchor '{}'; expected one of: {}", s, names.join(", "))
        })
}

fn parse_color_arg(s: &str) -> Result<Rgba<u8>, String> {
    let hex = s.strip_prefix('#').unwrap_or(s);
    let channels = match hex.len() {
        6 => 3,
        8 => 4,
        _ => return Err(format!("expected #RRGGBB or #RRGGBBAA, got '{s}'")),
    };
    let mut out = [0u8, 0, 0, 255];
    for i in 0..channels {
        out[i] = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16)
            .map_err(|_| format!("bad hex digits in '{s}'"))?;
    }
    Ok(Rgba(out))
}

fn parse_stroke_arg(s: &str) -> Result<StrokePath, String> {
    let points: Result<Vec<_>, _> = s
        .split(';')
        .filter(|part| !part.trim().is_empty())
        .map(parse_point_arg)
        .collect();
    let points = points?;
    if points.len() < 2 {
        return Err("a stroke needs at least two points".to_string());
    }
    Ok(StrokePath(points))
}
