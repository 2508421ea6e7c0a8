// ============================================================================
// SELECTION STATE — marked rect vs. floating pixels, never both
// ============================================================================

use crate::surface::{Rect, Surface};

/// A detached block of pixels plus its top-left placement in image space,
/// not yet merged into the authoritative surface.
#[derive(Clone)]
pub struct FloatingSelection {
    pub surface: Surface,
    pub x: i32,
    pub y: i32,
}

impl FloatingSelection {
    /// The image-space rectangle the floating pixels currently cover.
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.surface.width(), self.surface.height())
    }
}

/// Either a marked region of interest on the authoritative surface, or a
/// floating detached region with its own position. The two are mutually
/// exclusive; every transition below clears the other variant.
#[derive(Clone, Default)]
pub enum SelectionState {
    #[default]
    None,
    Marked(Rect),
    Floating(FloatingSelection),
}

impl SelectionState {
    pub fn clear(&mut self) {
        *self = SelectionState::None;
    }

    /// Mark a rectangle; any floating pixels are dropped (the engine commits
    /// them before calling this).
    pub fn set_marked(&mut self, rect: Rect) {
        *self = SelectionState::Marked(rect);
    }

    /// Detach `surface` as the floating selection at `(x, y)`; any marked
    /// rect is dropped.
    pub fn set_floating(&mut self, surface: Surface, x: i32, y: i32) {
        *self = SelectionState::Floating(FloatingSelection { surface, x, y });
    }

    /// Drop a marked rect, leaving a floating selection untouched.
    pub fn clear_marked(&mut self) {
        if matches!(self, SelectionState::Marked(_)) {
            *self = SelectionState::None;
        }
    }

    pub fn marked_rect(&self) -> Option<Rect> {
        match self {
            SelectionState::Marked(rect) => Some(*rect),
            _ => None,
        }
    }

    pub fn floating(&self) -> Option<&FloatingSelection> {
        match self {
            SelectionState::Floating(float) => Some(float),
            _ => None,
        }
    }

    pub fn is_floating(&self) -> bool {
        matches!(self, SelectionState::Floating(_))
    }

    /// Remove and return the floating selection, leaving `None`.
    pub fn take_floating(&mut self) -> Option<FloatingSelection> {
        if self.is_floating() {
            match std::mem::take(self) {
                SelectionState::Floating(float) => Some(float),
                _ => unreachable!(),
            }
        } else {
            None
        }
    }

    /// Reposition the floating selection; `false` if none exists.
    pub fn move_floating(&mut self, x: i32, y: i32) -> bool {
        match self {
            SelectionState::Floating(float) => {
                float.x = x;
                float.y = y;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn float_2x2() -> Surface {
        Surface::filled(2, 2, Rgba([9, 9, 9, 255]))
    }

    #[test]
    fn marked_then_floating_are_exclusive() {
        let mut sel = SelectionState::default();
        sel.set_marked(Rect::new(1, 1, 4, 4));
        assert!(sel.marked_rect().is_some());

        sel.set_floating(float_2x2(), 0, 0);
        assert!(sel.marked_rect().is_none());
        assert!(sel.is_floating());

        sel.set_marked(Rect::new(0, 0, 1, 1));
        assert!(!sel.is_floating());
        assert!(sel.marked_rect().is_some());
    }

    #[test]
    fn take_floating_leaves_none() {
        let mut sel = SelectionState::default();
        sel.set_floating(float_2x2(), 3, 4);
        let float = sel.take_floating().unwrap();
        assert_eq!((float.x, float.y), (3, 4));
        assert!(matches!(sel, SelectionState::None));
        assert!(sel.take_floating().is_none());
    }

    #[test]
    fn move_floating_requires_a_float() {
        let mut sel = SelectionState::default();
        assert!(!sel.move_floating(5, 5));
        sel.set_floating(float_2x2(), 0, 0);
        assert!(sel.move_floating(5, 6));
        let float = sel.floating().unwrap();
        assert_eq!((float.x, float.y), (5, 6));
    }

    #[test]
    fn clear_marked_spares_floating() {
        let mut sel = SelectionState::default();
        sel.set_floating(float_2x2(), 0, 0);
        sel.clear_marked();
        assert!(sel.is_floating());

        sel.set_marked(Rect::new(0, 0, 2, 2));
        sel.clear_marked();
        assert!(matches!(sel, SelectionState::None));
    }
}
