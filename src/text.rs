// ============================================================================
// TEXT STAMPING — single-line glyph layout and rasterization
// ============================================================================
//
// Deliberately simple text: one line, kerned, baseline-positioned. No
// shaping, wrapping, or style variants — this mirrors a "toy text" path,
// not a layout engine.

use ab_glyph::{point, Font, FontArc, GlyphId, ScaleFont};
use font_kit::family_name::FamilyName;
use font_kit::properties::Properties;
use font_kit::source::SystemSource;
use image::Rgba;

use crate::surface::{Surface, TRANSPARENT};

/// Resolve a font family through the system font database. An unknown or
/// unspecified family falls back to the platform's default sans-serif face.
/// `None` only in a fontless environment.
pub fn resolve_font(family: Option<&str>) -> Option<FontArc> {
    let mut candidates = Vec::new();
    if let Some(name) = family {
        candidates.push(FamilyName::Title(name.to_string()));
    }
    candidates.push(FamilyName::SansSerif);

    let handle = SystemSource::new()
        .select_best_match(&candidates, &Properties::new())
        .ok()?;
    let font = handle.load().ok()?;
    let data = font.copy_font_data()?;
    FontArc::try_from_vec((*data).clone()).ok()
}

/// Kerned horizontal offsets for each glyph of `text`, relative to the line
/// start.
fn layout_line(font: &FontArc, text: &str, size: f32) -> Vec<(GlyphId, f32)> {
    let scaled = font.as_scaled(size);
    let mut glyphs = Vec::new();
    let mut cursor_x = 0.0f32;
    let mut last: Option<GlyphId> = None;

    for ch in text.chars() {
        let id = font.glyph_id(ch);
        if let Some(prev) = last {
            cursor_x += scaled.kern(prev, id);
        }
        glyphs.push((id, cursor_x));
        cursor_x += scaled.h_advance(id);
        last = Some(id);
    }
    glyphs
}

/// Rasterize `text` with its baseline starting at `origin` and alpha-over it
/// onto the surface in `color`. Whitespace-only or unoutlinable text leaves
/// the surface untouched.
pub fn stamp_text(
    surface: &mut Surface,
    font: &FontArc,
    text: &str,
    size: f32,
    origin: (f32, f32),
    color: Rgba<u8>,
) {
    let glyphs = layout_line(font, text, size);
    if glyphs.is_empty() {
        return;
    }

    // Outline every glyph at its absolute position and take the union of the
    // pixel bounds.
    let mut outlined = Vec::new();
    let mut min_x = f32::MAX;
    let mut min_y = f32::MAX;
    let mut max_x = f32::MIN;
    let mut max_y = f32::MIN;
    for &(id, gx) in &glyphs {
        let glyph = id.with_scale_and_position(size, point(origin.0 + gx, origin.1));
        if let Some(og) = font.outline_glyph(glyph) {
            let b = og.px_bounds();
            min_x = min_x.min(b.min.x);
            min_y = min_y.min(b.min.y);
            max_x = max_x.max(b.max.x);
            max_y = max_y.max(b.max.y);
            outlined.push(og);
        }
    }
    if outlined.is_empty() || min_x >= max_x || min_y >= max_y {
        return;
    }

    let x0 = min_x.floor() as i32;
    let y0 = min_y.floor() as i32;
    let buf_w = (max_x.ceil() as i32 - x0).max(1) as u32;
    let buf_h = (max_y.ceil() as i32 - y0).max(1) as u32;

    // Accumulate max coverage per pixel so overlapping glyph edges don't
    // double-darken, then convert the coverage pass to one RGBA patch.
    let mut coverage = vec![0.0f32; buf_w as usize * buf_h as usize];
    for og in &outlined {
        let b = og.px_bounds();
        let gx0 = b.min.x as i32 - x0;
        let gy0 = b.min.y as i32 - y0;
        og.draw(|px, py, cov| {
            let ix = gx0 + px as i32;
            let iy = gy0 + py as i32;
            if ix >= 0 && iy >= 0 && (ix as u32) < buf_w && (iy as u32) < buf_h {
                let idx = iy as usize * buf_w as usize + ix as usize;
                coverage[idx] = coverage[idx].max(cov);
            }
        });
    }

    let mut patch = Surface::filled(buf_w, buf_h, TRANSPARENT);
    for iy in 0..buf_h {
        for ix in 0..buf_w {
            let cov = coverage[iy as usize * buf_w as usize + ix as usize];
            if cov > 0.001 {
                let a = (color[3] as f32 * cov).round().min(255.0) as u8;
                patch.put_pixel(ix, iy, Rgba([color[0], color[1], color[2], a]));
            }
        }
    }
    surface.blit_over(&patch, x0, y0);
}
