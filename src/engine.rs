// ============================================================================
// EDIT ENGINE — sole owner of the document's pixel state
// ============================================================================
//
// Every pixel mutation goes through this type. Operations are synchronous
// and atomic from the caller's perspective: each runs to completion before
// returning, and a failed operation leaves the authoritative surface
// untouched. The engine is a plain owned value — one per open document, no
// globals.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use image::Rgba;

use crate::brush;
use crate::error::EditError;
use crate::history::HistoryStack;
use crate::io;
use crate::selection::SelectionState;
use crate::surface::{Rect, Surface};
use crate::text;
use crate::{log_info, log_warn};

const DEFAULT_WIDTH: u32 = 800;
const DEFAULT_HEIGHT: u32 = 600;
const DEFAULT_BRUSH_SIZE: f32 = 10.0;
const DEFAULT_TEXT_SIZE: f32 = 20.0;
const DEFAULT_BRUSH_COLOR: Rgba<u8> = Rgba([255, 0, 0, 255]);
const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Which edge or corner of the old content stays visually fixed when the
/// canvas is resized. Offsets are computed independently per axis: a
/// start edge pins at 0, an end edge at `new - old`, anything else centers
/// (floor division).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Anchor {
    TopLeft,
    Top,
    TopRight,
    Left,
    #[default]
    Center,
    Right,
    BottomLeft,
    Bottom,
    BottomRight,
}

impl Anchor {
    pub fn label(&self) -> &'static str {
        match self {
            Anchor::TopLeft => "top-left",
            Anchor::Top => "top",
            Anchor::TopRight => "top-right",
            Anchor::Left => "left",
            Anchor::Center => "center",
            Anchor::Right => "right",
            Anchor::BottomLeft => "bottom-left",
            Anchor::Bottom => "bottom",
            Anchor::BottomRight => "bottom-right",
        }
    }

    pub fn all() -> &'static [Anchor] {
        &[
            Anchor::TopLeft,
            Anchor::Top,
            Anchor::TopRight,
            Anchor::Left,
            Anchor::Center,
            Anchor::Right,
            Anchor::BottomLeft,
            Anchor::Bottom,
            Anchor::BottomRight,
        ]
    }

    /// Pixel offset of the old content within the resized canvas.
    pub fn offsets(self, old: (u32, u32), new: (u32, u32)) -> (i32, i32) {
        // Per-axis placement: 0 = start edge, 1 = centered, 2 = end edge.
        let (ax, ay) = match self {
            Anchor::TopLeft => (0, 0),
            Anchor::Top => (1, 0),
            Anchor::TopRight => (2, 0),
            Anchor::Left => (0, 1),
            Anchor::Center => (1, 1),
            Anchor::Right => (2, 1),
            Anchor::BottomLeft => (0, 2),
            Anchor::Bottom => (1, 2),
            Anchor::BottomRight => (2, 2),
        };
        (
            axis_offset(ax, old.0, new.0),
            axis_offset(ay, old.1, new.1),
        )
    }
}

fn axis_offset(placement: u8, old: u32, new: u32) -> i32 {
    let delta = new as i64 - old as i64;
    let off = match placement {
        0 => 0,
        1 => delta.div_euclid(2),
        _ => delta,
    };
    off as i32
}

/// The image editing core: authoritative surface, selection state, crop
/// staging and the bounded undo/redo stack.
pub struct EditEngine {
    surface: Surface,
    selection: SelectionState,
    history: HistoryStack,
    is_cropping: bool,
    pan_offset: (f32, f32),
    image_path: Option<PathBuf>,
    brush_size: f32,
    brush_color: Rgba<u8>,
    text_size: f32,
    font_family: Option<String>,
}

impl Default for EditEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl EditEngine {
    /// A fresh engine starts on the default blank document, so the
    /// authoritative surface always exists and no operation needs an
    /// is-loaded guard.
    pub fn new() -> Self {
        Self {
            surface: Surface::filled(DEFAULT_WIDTH, DEFAULT_HEIGHT, WHITE),
            selection: SelectionState::default(),
            history: HistoryStack::new(),
            is_cropping: false,
            pan_offset: (0.0, 0.0),
            image_path: None,
            brush_size: DEFAULT_BRUSH_SIZE,
            brush_color: DEFAULT_BRUSH_COLOR,
            text_size: DEFAULT_TEXT_SIZE,
            font_family: None,
        }
    }

    // ------------------------------------------------------------------
    //  Document lifecycle
    // ------------------------------------------------------------------

    /// Start a fresh document filled with `fill`. Discards any floating
    /// selection and all history; the document loses its file identity.
    pub fn create_blank(&mut self, width: u32, height: u32, fill: Rgba<u8>) -> Result<(), EditError> {
        if width == 0 || height == 0 {
            return Err(EditError::InvalidGeometry { width, height });
        }
        self.selection.clear();
        self.reset_crop();
        self.surface = Surface::filled(width, height, fill);
        self.history.clear();
        self.image_path = None;
        Ok(())
    }

    /// Replace the document with a decoded image file. On failure the prior
    /// document, selection and history are preserved unchanged.
    pub fn load(&mut self, path: &Path) -> Result<(), EditError> {
        // Decode fully before touching any state.
        let loaded = io::load_surface(path)?;
        self.selection.clear();
        self.reset_crop();
        self.surface = loaded;
        self.history.clear();
        self.image_path = Some(path.to_path_buf());
        log_info!(
            "loaded {} ({}x{})",
            path.display(),
            self.surface.width(),
            self.surface.height()
        );
        Ok(())
    }

    /// Commit any pending floating selection, then write the authoritative
    /// surface as a PNG.
    pub fn save(&mut self, path: &Path) -> Result<(), EditError> {
        self.commit_floating();
        io::save_png(&self.surface, path)?;
        self.image_path = Some(path.to_path_buf());
        log_info!("saved {}", path.display());
        Ok(())
    }

    /// The surface to display. With no floating selection this borrows the
    /// authoritative surface (treat it as read-only); with one, it is a
    /// fresh composite the caller owns, so engine state can never be
    /// mutated through it.
    pub fn read(&self) -> Cow<'_, Surface> {
        match self.selection.floating() {
            Some(float) => {
                let mut composite = self.surface.clone();
                composite.blit_over(&float.surface, float.x, float.y);
                Cow::Owned(composite)
            }
            None => Cow::Borrowed(&self.surface),
        }
    }

    // ------------------------------------------------------------------
    //  Undo / redo
    // ------------------------------------------------------------------

    /// Restore the previous snapshot. A restored snapshot never carries a
    /// live selection or crop staging forward.
    pub fn undo(&mut self) -> bool {
        match self.history.pop_undo(&self.surface) {
            Some(prev) => {
                self.surface = prev;
                self.selection.clear();
                self.reset_crop();
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        match self.history.pop_redo(&self.surface) {
            Some(next) => {
                self.surface = next;
                self.selection.clear();
                self.reset_crop();
                true
            }
            None => false,
        }
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    // ------------------------------------------------------------------
    //  Crop staging:  Idle → start_crop → Cropping → apply/cancel → Idle
    // ------------------------------------------------------------------

    /// Enter crop framing. Any floating selection is committed first and the
    /// pan offset resets; marking the crop rect is a separate step.
    pub fn start_crop(&mut self) {
        self.commit_floating();
        self.is_cropping = true;
        self.pan_offset = (0.0, 0.0);
    }

    /// Leave crop framing without touching pixels.
    pub fn cancel_crop(&mut self) {
        self.is_cropping = false;
        self.selection.clear_marked();
        self.pan_offset = (0.0, 0.0);
    }

    /// Replace the document with the marked window, offset by the pan. Quietly
    /// does nothing unless crop framing is active with a usable rect.
    pub fn apply_crop(&mut self) {
        if !self.is_cropping {
            return;
        }
        let Some(rect) = self.selection.marked_rect() else {
            return;
        };
        if rect.is_empty() {
            return;
        }

        self.history.push(self.surface.clone());
        let pan_x = self.pan_offset.0.round() as i32;
        let pan_y = self.pan_offset.1.round() as i32;
        self.surface = self
            .surface
            .copy_region(rect.w, rect.h, rect.x - pan_x, rect.y - pan_y);
        self.cancel_crop();
    }

    pub fn is_cropping(&self) -> bool {
        self.is_cropping
    }

    pub fn pan_offset(&self) -> (f32, f32) {
        self.pan_offset
    }

    /// Shift the crop window relative to the image during framing; ignored
    /// outside crop mode.
    pub fn set_pan_offset(&mut self, dx: f32, dy: f32) {
        if self.is_cropping {
            self.pan_offset = (dx, dy);
        }
    }

    fn reset_crop(&mut self) {
        self.is_cropping = false;
        self.pan_offset = (0.0, 0.0);
    }

    // ------------------------------------------------------------------
    //  Selection: marked rects and floating pixels
    // ------------------------------------------------------------------

    /// Mark a rectangular region of interest. A pending floating selection
    /// is committed first so the two states never coexist.
    pub fn mark_rect(&mut self, rect: Rect) {
        self.commit_floating();
        self.selection.set_marked(rect);
    }

    /// Lift `rect`'s pixels off the surface into a floating selection at the
    /// same position, leaving the source area fully transparent. A pending
    /// float is committed first; the pre-cut state is pushed for undo.
    pub fn cut(&mut self, rect: Rect) {
        self.commit_floating();
        self.history.push(self.surface.clone());
        let float = self.surface.copy_region(rect.w, rect.h, rect.x, rect.y);
        self.surface.clear_region(rect);
        self.selection.set_floating(float, rect.x, rect.y);
    }

    /// Non-destructive extraction of `rect`'s pixels from the merged state.
    /// Commits a pending float (observable) but pushes no undo entry and
    /// leaves the surface content unchanged otherwise.
    pub fn copy(&mut self, rect: Rect) -> Surface {
        self.commit_floating();
        self.surface.copy_region(rect.w, rect.h, rect.x, rect.y)
    }

    /// Adopt externally supplied pixels (e.g. a clipboard image) as the
    /// floating selection at `(x, y)`. Commits any prior float and pushes
    /// one undo snapshot for the paste-in.
    pub fn set_floating(&mut self, surface: Surface, x: i32, y: i32) {
        self.commit_floating();
        self.history.push(self.surface.clone());
        self.selection.set_floating(surface, x, y);
    }

    /// Composite the floating selection onto the surface at its current
    /// position and drop it. No-op without a float; pushes no undo entry of
    /// its own.
    pub fn paste(&mut self) {
        self.commit_floating();
    }

    /// Discard the floating selection and any marked rect without
    /// compositing — "delete selection".
    pub fn clear_floating(&mut self) {
        self.selection.clear();
    }

    /// Reposition the floating selection; no-op without one. Never touches
    /// history.
    pub fn move_floating(&mut self, x: i32, y: i32) {
        self.selection.move_floating(x, y);
    }

    pub fn has_floating(&self) -> bool {
        self.selection.is_floating()
    }

    pub fn floating_rect(&self) -> Option<Rect> {
        self.selection.floating().map(|f| f.rect())
    }

    pub fn marked_rect(&self) -> Option<Rect> {
        self.selection.marked_rect()
    }

    /// Every operation whose contract reads "pastes any pending floating
    /// selection first" funnels through this one helper.
    fn commit_floating(&mut self) {
        if let Some(float) = self.selection.take_floating() {
            self.surface.blit_over(&float.surface, float.x, float.y);
        }
    }

    // ------------------------------------------------------------------
    //  Painting
    // ------------------------------------------------------------------

    /// Snapshot the surface once at the start of a drag. The stroke's
    /// segment calls then extend pixels without creating further undo
    /// entries, so releasing the drag undoes as one step.
    pub fn begin_stroke(&mut self) {
        self.history.push(self.surface.clone());
    }

    /// Extend the current stroke along `points` (round caps and joins) in
    /// the engine's brush size and color. Needs at least two points.
    pub fn draw_stroke(&mut self, points: &[(f32, f32)]) {
        if points.len() < 2 {
            return;
        }
        brush::stroke_polyline(&mut self.surface, points, self.brush_size, self.brush_color);
    }

    /// Single-click brush placement: one undo snapshot, then one filled
    /// circle of the brush diameter at `point`.
    pub fn draw_dab(&mut self, point: (f32, f32)) {
        self.history.push(self.surface.clone());
        brush::dab(&mut self.surface, point, self.brush_size, self.brush_color);
    }

    /// Stamp one line of text with its baseline at `(x, y)` in the engine's
    /// text size and brush color. `font` overrides the engine's family for
    /// this call; unknown families fall back to sans-serif. Empty text is a
    /// no-op. When no face resolves at all (fontless environment), pixels
    /// stay untouched.
    pub fn stamp_text(&mut self, text_str: &str, x: f32, y: f32, font: Option<&str>) {
        if text_str.is_empty() {
            return;
        }
        self.commit_floating();
        self.history.push(self.surface.clone());
        let family = font.or(self.font_family.as_deref());
        match text::resolve_font(family) {
            Some(font) => text::stamp_text(
                &mut self.surface,
                &font,
                text_str,
                self.text_size,
                (x, y),
                self.brush_color,
            ),
            None => log_warn!("no usable font face found; text left unrendered"),
        }
    }

    // ------------------------------------------------------------------
    //  Canvas geometry
    // ------------------------------------------------------------------

    /// Grow or shrink the canvas, keeping the `anchor` edge/corner visually
    /// fixed and filling new space with `fill`. Dimensions are clamped to a
    /// minimum of 1 pixel — a documented clamp, not an error.
    pub fn resize_canvas(&mut self, new_width: u32, new_height: u32, anchor: Anchor, fill: Rgba<u8>) {
        let new_w = new_width.max(1);
        let new_h = new_height.max(1);
        self.commit_floating();
        self.history.push(self.surface.clone());

        let (off_x, off_y) =
            anchor.offsets((self.surface.width(), self.surface.height()), (new_w, new_h));
        let mut resized = Surface::filled(new_w, new_h, fill);
        resized.blit_over(&self.surface, off_x, off_y);
        self.surface = resized;
    }

    pub fn surface_size(&self) -> (u32, u32) {
        (self.surface.width(), self.surface.height())
    }

    pub fn image_path(&self) -> Option<&Path> {
        self.image_path.as_deref()
    }

    // ------------------------------------------------------------------
    //  Tool defaults
    // ------------------------------------------------------------------

    pub fn brush_size(&self) -> f32 {
        self.brush_size
    }

    /// Retargeting the brush commits a pending float so no stale selection
    /// is left hovering once painting starts.
    pub fn set_brush_size(&mut self, size: f32) {
        self.commit_floating();
        self.brush_size = size;
    }

    pub fn brush_color(&self) -> Rgba<u8> {
        self.brush_color
    }

    pub fn set_brush_color(&mut self, color: Rgba<u8>) {
        self.commit_floating();
        self.brush_color = color;
    }

    pub fn text_size(&self) -> f32 {
        self.text_size
    }

    pub fn set_text_size(&mut self, size: f32) {
        self.text_size = size;
    }

    pub fn font_family(&self) -> Option<&str> {
        self.font_family.as_deref()
    }

    pub fn set_font_family(&mut self, family: Option<String>) {
        self.font_family = family;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::TRANSPARENT;

    const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);

    /// A small surface where every pixel value encodes its coordinates.
    fn coded(w: u32, h: u32) -> Surface {
        let mut s = Surface::filled(w, h, TRANSPARENT);
        for y in 0..h {
            for x in 0..w {
                s.put_pixel(x, y, Rgba([x as u8 * 10, y as u8 * 10, 7, 255]));
            }
        }
        s
    }

    fn engine_with(surface: Surface) -> EditEngine {
        let mut engine = EditEngine::new();
        let (w, h) = (surface.width(), surface.height());
        engine.create_blank(w, h, TRANSPARENT).unwrap();
        for y in 0..h {
            for x in 0..w {
                engine.surface.put_pixel(x, y, surface.pixel(x, y));
            }
        }
        engine
    }

    fn raw(engine: &EditEngine) -> Vec<u8> {
        engine.read().as_image().as_raw().clone()
    }

    #[test]
    fn blank_document_defaults() {
        let engine = EditEngine::new();
        assert_eq!(engine.surface_size(), (800, 600));
        assert_eq!(engine.read().pixel(0, 0), WHITE);
        assert_eq!(engine.brush_size(), 10.0);
        assert_eq!(engine.text_size(), 20.0);
        assert_eq!(engine.brush_color(), Rgba([255, 0, 0, 255]));
        assert!(engine.image_path().is_none());
    }

    #[test]
    fn create_blank_rejects_zero_dimensions() {
        let mut engine = EditEngine::new();
        let err = engine.create_blank(0, 10, WHITE).unwrap_err();
        assert!(matches!(err, EditError::InvalidGeometry { width: 0, height: 10 }));
        // Document untouched by the failed call.
        assert_eq!(engine.surface_size(), (800, 600));
    }

    #[test]
    fn concrete_cut_paste_scenario() {
        // 4×4 fully white opaque; cut the center 2×2.
        let mut engine = EditEngine::new();
        engine.create_blank(4, 4, WHITE).unwrap();
        let before = raw(&engine);

        engine.cut(Rect::new(1, 1, 2, 2));

        for y in 0..4 {
            for x in 0..4 {
                let expected = if (1..=2).contains(&x) && (1..=2).contains(&y) {
                    TRANSPARENT
                } else {
                    WHITE
                };
                assert_eq!(engine.surface.pixel(x, y), expected, "at ({x},{y})");
            }
        }
        let float = engine.floating_rect().unwrap();
        assert_eq!(float, Rect::new(1, 1, 2, 2));
        let float_px = engine.selection.floating().unwrap();
        for y in 0..2 {
            for x in 0..2 {
                assert_eq!(float_px.surface.pixel(x, y), WHITE);
            }
        }

        engine.paste();
        assert!(!engine.has_floating());
        assert_eq!(raw(&engine), before);
    }

    #[test]
    fn undo_redo_inverse_law() {
        let mut engine = EditEngine::new();
        engine.create_blank(16, 16, WHITE).unwrap();
        let before = raw(&engine);

        let n = 5;
        for i in 0..n {
            engine.draw_dab((2.0 + i as f32 * 3.0, 8.0));
        }
        let after = raw(&engine);
        assert_ne!(before, after);

        for _ in 0..n {
            assert!(engine.undo());
        }
        assert_eq!(raw(&engine), before);

        for _ in 0..n {
            assert!(engine.redo());
        }
        assert_eq!(raw(&engine), after);
    }

    #[test]
    fn history_caps_at_twenty_undos() {
        let mut engine = EditEngine::new();
        engine.create_blank(8, 8, WHITE).unwrap();
        for i in 0..25 {
            engine.draw_dab(((i % 8) as f32, (i / 8) as f32));
        }
        for i in 0..20 {
            assert!(engine.undo(), "undo {} should succeed", i + 1);
        }
        assert!(!engine.undo(), "21st undo must report no state");
    }

    #[test]
    fn copy_is_non_destructive() {
        let mut engine = engine_with(coded(5, 5));
        let before = raw(&engine);
        let copied = engine.copy(Rect::new(1, 2, 3, 2));
        assert_eq!(raw(&engine), before);
        assert!(!engine.can_undo(), "copy must not push history");
        assert_eq!(copied.pixel(0, 0), Rgba([10, 20, 7, 255]));
        assert_eq!(copied.pixel(2, 1), Rgba([30, 30, 7, 255]));
    }

    #[test]
    fn copy_commits_a_pending_float_first() {
        let mut engine = EditEngine::new();
        engine.create_blank(4, 4, WHITE).unwrap();
        engine.set_floating(Surface::filled(1, 1, BLUE), 0, 0);

        let copied = engine.copy(Rect::new(0, 0, 1, 1));
        assert!(!engine.has_floating());
        assert_eq!(engine.surface.pixel(0, 0), BLUE);
        assert_eq!(copied.pixel(0, 0), BLUE);
    }

    #[test]
    fn crop_correctness_at_zero_pan() {
        let mut engine = engine_with(coded(6, 5));
        engine.mark_rect(Rect::new(2, 1, 3, 2));
        engine.start_crop();
        engine.apply_crop();

        assert_eq!(engine.surface_size(), (3, 2));
        for j in 0..2u32 {
            for i in 0..3u32 {
                assert_eq!(
                    engine.surface.pixel(i, j),
                    Rgba([(2 + i) as u8 * 10, (1 + j) as u8 * 10, 7, 255]),
                    "at ({i},{j})"
                );
            }
        }
        assert!(!engine.is_cropping());
        assert!(engine.marked_rect().is_none());
    }

    #[test]
    fn crop_honors_pan_offset() {
        let mut engine = engine_with(coded(6, 6));
        engine.mark_rect(Rect::new(2, 2, 2, 2));
        engine.start_crop();
        engine.set_pan_offset(1.0, 1.0);
        engine.apply_crop();

        // Window reads from (rect - pan) = (1, 1).
        assert_eq!(engine.surface.pixel(0, 0), Rgba([10, 10, 7, 255]));
    }

    #[test]
    fn crop_preconditions_are_silent_no_ops() {
        let mut engine = engine_with(coded(4, 4));
        let before = raw(&engine);

        // Not in crop mode.
        engine.mark_rect(Rect::new(0, 0, 2, 2));
        engine.apply_crop();
        assert_eq!(raw(&engine), before);
        assert_eq!(engine.surface_size(), (4, 4));

        // Crop mode without a usable rect.
        engine.cancel_crop();
        engine.start_crop();
        engine.apply_crop();
        assert_eq!(engine.surface_size(), (4, 4));
        assert!(!engine.can_undo(), "failed crops must not push history");
    }

    #[test]
    fn cancel_crop_clears_rect_and_pan() {
        let mut engine = engine_with(coded(4, 4));
        engine.mark_rect(Rect::new(1, 1, 2, 2));
        engine.start_crop();
        engine.set_pan_offset(3.0, -2.0);
        engine.cancel_crop();

        assert!(!engine.is_cropping());
        assert!(engine.marked_rect().is_none());
        assert_eq!(engine.pan_offset(), (0.0, 0.0));
    }

    #[test]
    fn resize_top_left_preserves_origin_block() {
        let mut engine = engine_with(coded(2, 2));
        engine.resize_canvas(4, 3, Anchor::TopLeft, BLUE);

        assert_eq!(engine.surface_size(), (4, 3));
        for y in 0..2u32 {
            for x in 0..2u32 {
                assert_eq!(engine.surface.pixel(x, y), Rgba([x as u8 * 10, y as u8 * 10, 7, 255]));
            }
        }
        assert_eq!(engine.surface.pixel(3, 0), BLUE);
        assert_eq!(engine.surface.pixel(0, 2), BLUE);
    }

    #[test]
    fn resize_bottom_right_pins_opposite_corner() {
        let mut engine = engine_with(coded(2, 2));
        engine.resize_canvas(4, 4, Anchor::BottomRight, BLUE);
        // Old (1,1) must now sit at (3,3).
        assert_eq!(engine.surface.pixel(3, 3), Rgba([10, 10, 7, 255]));
        assert_eq!(engine.surface.pixel(0, 0), BLUE);
    }

    #[test]
    fn resize_clamps_dimensions_to_one() {
        let mut engine = engine_with(coded(3, 3));
        engine.resize_canvas(0, 0, Anchor::TopLeft, BLUE);
        assert_eq!(engine.surface_size(), (1, 1));
        assert_eq!(engine.surface.pixel(0, 0), Rgba([0, 0, 7, 255]));
    }

    #[test]
    fn anchor_offset_table() {
        // Growing 2×2 → 5×5.
        assert_eq!(Anchor::TopLeft.offsets((2, 2), (5, 5)), (0, 0));
        assert_eq!(Anchor::Center.offsets((2, 2), (5, 5)), (1, 1));
        assert_eq!(Anchor::BottomRight.offsets((2, 2), (5, 5)), (3, 3));
        assert_eq!(Anchor::Top.offsets((2, 2), (5, 5)), (1, 0));
        assert_eq!(Anchor::Left.offsets((2, 2), (5, 5)), (0, 1));
        // Shrinking 5×5 → 2×2 centers with floor division.
        assert_eq!(Anchor::Center.offsets((5, 5), (2, 2)), (-2, -2));
    }

    #[test]
    fn selection_states_are_mutually_exclusive() {
        let mut engine = EditEngine::new();
        engine.create_blank(6, 6, WHITE).unwrap();

        engine.mark_rect(Rect::new(0, 0, 2, 2));
        assert!(engine.marked_rect().is_some() && !engine.has_floating());

        engine.cut(Rect::new(0, 0, 2, 2));
        assert!(engine.marked_rect().is_none() && engine.has_floating());

        engine.mark_rect(Rect::new(1, 1, 2, 2));
        assert!(engine.marked_rect().is_some() && !engine.has_floating());
    }

    #[test]
    fn stroke_drag_undoes_in_one_step() {
        let mut engine = EditEngine::new();
        engine.create_blank(32, 16, WHITE).unwrap();
        let before = raw(&engine);

        engine.begin_stroke();
        engine.draw_stroke(&[(2.0, 8.0), (10.0, 8.0)]);
        engine.draw_stroke(&[(10.0, 8.0), (18.0, 8.0)]);
        engine.draw_stroke(&[(18.0, 8.0), (26.0, 8.0)]);
        assert_ne!(raw(&engine), before);

        assert!(engine.undo());
        assert_eq!(raw(&engine), before);
        assert!(!engine.undo(), "segments must not stack undo entries");
    }

    #[test]
    fn single_point_stroke_is_a_no_op() {
        let mut engine = EditEngine::new();
        engine.create_blank(8, 8, WHITE).unwrap();
        let before = raw(&engine);
        engine.draw_stroke(&[(4.0, 4.0)]);
        assert_eq!(raw(&engine), before);
    }

    #[test]
    fn move_floating_repositions_without_history() {
        let mut engine = engine_with(coded(6, 6));
        engine.cut(Rect::new(0, 0, 2, 2));
        let undo_depth = engine.history.undo_count();

        engine.move_floating(4, 4);
        assert_eq!(engine.history.undo_count(), undo_depth);
        assert_eq!(engine.floating_rect().unwrap(), Rect::new(4, 4, 2, 2));

        engine.paste();
        assert_eq!(engine.surface.pixel(4, 4), Rgba([0, 0, 7, 255]));
        assert_eq!(engine.surface.pixel(0, 0), TRANSPARENT);
    }

    #[test]
    fn paste_and_move_without_float_are_no_ops() {
        let mut engine = engine_with(coded(3, 3));
        let before = raw(&engine);
        engine.paste();
        engine.move_floating(1, 1);
        assert_eq!(raw(&engine), before);
        assert!(!engine.can_undo());
    }

    #[test]
    fn set_floating_commits_prior_float() {
        let mut engine = EditEngine::new();
        engine.create_blank(4, 4, WHITE).unwrap();

        engine.set_floating(Surface::filled(1, 1, BLUE), 0, 0);
        engine.set_floating(Surface::filled(1, 1, Rgba([0, 255, 0, 255])), 2, 2);

        // First float committed when the second arrived.
        assert_eq!(engine.surface.pixel(0, 0), BLUE);
        // Second still floating.
        assert_eq!(engine.surface.pixel(2, 2), WHITE);
        assert_eq!(engine.read().pixel(2, 2), Rgba([0, 255, 0, 255]));
    }

    #[test]
    fn clear_floating_discards_without_compositing() {
        let mut engine = EditEngine::new();
        engine.create_blank(4, 4, WHITE).unwrap();
        engine.set_floating(Surface::filled(2, 2, BLUE), 1, 1);
        engine.clear_floating();
        assert!(!engine.has_floating());
        assert_eq!(engine.surface.pixel(1, 1), WHITE);
    }

    #[test]
    fn read_composites_float_over_surface() {
        let mut engine = EditEngine::new();
        engine.create_blank(4, 4, WHITE).unwrap();
        engine.set_floating(Surface::filled(2, 2, BLUE), 1, 1);

        let view = engine.read();
        assert_eq!(view.pixel(1, 1), BLUE);
        assert_eq!(view.pixel(0, 0), WHITE);
        // Authoritative surface itself is untouched.
        assert_eq!(engine.surface.pixel(1, 1), WHITE);
    }

    #[test]
    fn undo_clears_selection_and_crop_state() {
        let mut engine = engine_with(coded(5, 5));
        engine.cut(Rect::new(0, 0, 2, 2));
        engine.mark_rect(Rect::new(1, 1, 2, 2));
        engine.start_crop();
        engine.set_pan_offset(2.0, 2.0);

        assert!(engine.undo());
        assert!(engine.marked_rect().is_none());
        assert!(!engine.has_floating());
        assert!(!engine.is_cropping());
        assert_eq!(engine.pan_offset(), (0.0, 0.0));
    }

    #[test]
    fn load_failure_preserves_state() {
        let mut engine = EditEngine::new();
        engine.create_blank(3, 3, BLUE).unwrap();
        engine.draw_dab((1.0, 1.0));
        let before = raw(&engine);
        let undo_depth = engine.history.undo_count();

        let err = engine.load(Path::new("/nonexistent/rasterpad-missing.png"));
        assert!(err.is_err());
        assert_eq!(raw(&engine), before);
        assert_eq!(engine.history.undo_count(), undo_depth);
    }

    #[test]
    fn load_and_create_clear_history() {
        let mut engine = EditEngine::new();
        engine.create_blank(4, 4, WHITE).unwrap();
        engine.draw_dab((2.0, 2.0));
        assert!(engine.can_undo());

        engine.create_blank(4, 4, WHITE).unwrap();
        assert!(!engine.can_undo());
        assert!(!engine.can_redo());
    }

    #[test]
    fn degenerate_cut_yields_empty_float() {
        let mut engine = engine_with(coded(3, 3));
        let before = raw(&engine);
        engine.cut(Rect::new(1, 1, 0, 0));
        let float = engine.floating_rect().unwrap();
        assert_eq!((float.w, float.h), (0, 0));

        engine.paste();
        assert_eq!(raw(&engine), before);
    }

    #[test]
    fn empty_text_is_a_no_op() {
        let mut engine = EditEngine::new();
        engine.create_blank(8, 8, WHITE).unwrap();
        engine.stamp_text("", 2.0, 6.0, None);
        assert!(!engine.can_undo());
    }

    #[test]
    fn brush_retarget_commits_float_but_text_size_does_not() {
        let mut engine = EditEngine::new();
        engine.create_blank(4, 4, WHITE).unwrap();

        engine.set_floating(Surface::filled(1, 1, BLUE), 0, 0);
        engine.set_text_size(32.0);
        assert!(engine.has_floating(), "text size must not commit the float");

        engine.set_brush_size(4.0);
        assert!(!engine.has_floating());
        assert_eq!(engine.surface.pixel(0, 0), BLUE);
    }

    #[test]
    fn save_commits_float_and_round_trips() {
        let mut path = std::env::temp_dir();
        path.push(format!("rasterpad-engine-{}-save.png", std::process::id()));

        let mut engine = EditEngine::new();
        engine.create_blank(4, 4, WHITE).unwrap();
        engine.set_floating(Surface::filled(2, 2, BLUE), 1, 1);
        engine.save(&path).unwrap();
        assert!(!engine.has_floating());
        assert_eq!(engine.image_path(), Some(path.as_path()));

        let mut verify = EditEngine::new();
        verify.load(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(verify.surface_size(), (4, 4));
        assert_eq!(verify.read().pixel(1, 1), BLUE);
        assert_eq!(verify.read().pixel(0, 0), WHITE);
    }
}
