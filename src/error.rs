// ============================================================================
// ERROR TAXONOMY
// ============================================================================

use thiserror::Error;

/// Failures surfaced by the editing core. Every variant is local to the
/// operation that raised it — the authoritative surface is never left
/// partially mutated, and nothing here is fatal to the process.
#[derive(Debug, Error)]
pub enum EditError {
    /// The file was absent, unreadable, or not a supported image format.
    #[error("failed to decode image: {0}")]
    Decode(image::ImageError),

    /// The decoded image could not be normalized to an RGBA surface.
    #[error("failed to convert image to RGBA: {0}")]
    Conversion(String),

    /// A zero width or height was requested where the core refuses to clamp.
    #[error("invalid image geometry {width}x{height}")]
    InvalidGeometry { width: u32, height: u32 },

    /// The output file could not be created or written.
    #[error("failed to write image file: {0}")]
    Io(#[from] std::io::Error),

    /// Encoding the surface to the output format failed.
    #[error("failed to encode image: {0}")]
    Encode(image::ImageError),
}
