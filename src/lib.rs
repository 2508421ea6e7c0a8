//! rasterpad — a small raster-image editing core with a headless batch CLI.
//!
//! The heart of the crate is [`engine::EditEngine`]: the sole owner of a
//! document's pixel state. It manages the authoritative surface, a floating
//! selection overlay, crop staging and a bounded undo/redo snapshot stack.
//! Everything else — decoding, brush and text rasterization, the CLI — hangs
//! off that core.

pub mod brush;
pub mod cli;
pub mod engine;
pub mod error;
pub mod history;
pub mod io;
pub mod logger;
pub mod selection;
pub mod surface;
pub mod text;
pub mod tools;

pub use engine::{Anchor, EditEngine};
pub use error::EditError;
pub use selection::{FloatingSelection, SelectionState};
pub use surface::{Rect, Surface};
pub use tools::ToolSelection;
