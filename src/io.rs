// ============================================================================
// IMAGE I/O — multi-format decode in, PNG encode out
// ============================================================================

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use image::codecs::png::PngEncoder;
use image::DynamicImage;

use crate::error::EditError;
use crate::surface::Surface;

/// Decode any raster format the `image` crate understands and normalize it
/// to an RGBA surface. Absent, unreadable, or unrecognized files surface as
/// [`EditError::Decode`]; a decode that yields a zero-dimension buffer (and
/// therefore cannot become a document surface) as [`EditError::Conversion`].
pub fn load_surface(path: &Path) -> Result<Surface, EditError> {
    let img = image::open(path).map_err(EditError::Decode)?;
    let rgba = img.to_rgba8();
    if rgba.width() == 0 || rgba.height() == 0 {
        return Err(EditError::Conversion(format!(
            "decoded image {} has a zero dimension ({}x{})",
            path.display(),
            rgba.width(),
            rgba.height()
        )));
    }
    Ok(Surface::from_image(rgba))
}

/// Encode the surface as RGBA PNG at `path`.
pub fn save_png(surface: &Surface, path: &Path) -> Result<(), EditError> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    let image = surface.as_image();
    let encoder = PngEncoder::new(&mut writer);
    #[allow(deprecated)]
    encoder
        .encode(
            image.as_raw(),
            image.width(),
            image.height(),
            image::ColorType::Rgba8,
        )
        .map_err(EditError::Encode)?;
    Ok(())
}

/// Encode by output extension — a CLI convenience on top of the core's PNG
/// contract. JPEG output drops alpha; unknown extensions fall through to the
/// `image` crate's own extension dispatch.
pub fn save_auto(surface: &Surface, path: &Path) -> Result<(), EditError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    match ext.as_str() {
        "" | "png" => save_png(surface, path),
        "jpg" | "jpeg" => {
            let rgb = DynamicImage::ImageRgba8(surface.as_image().clone()).to_rgb8();
            rgb.save(path).map_err(EditError::Encode)
        }
        _ => DynamicImage::ImageRgba8(surface.as_image().clone())
            .save(path)
            .map_err(EditError::Encode),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use std::path::PathBuf;

    fn temp_path(name: &str) -> PathBuf {
        let mut p = std::env::temp_dir();
        p.push(format!("rasterpad-io-{}-{}", std::process::id(), name));
        p
    }

    #[test]
    fn png_round_trip_preserves_pixels() {
        let mut s = Surface::filled(3, 2, Rgba([10, 20, 30, 255]));
        s.put_pixel(1, 1, Rgba([200, 100, 50, 128]));

        let path = temp_path("roundtrip.png");
        save_png(&s, &path).unwrap();
        let loaded = load_surface(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(loaded.as_image().as_raw(), s.as_image().as_raw());
    }

    #[test]
    fn load_missing_file_is_decode_error() {
        let err = load_surface(Path::new("/nonexistent/rasterpad-missing.png")).unwrap_err();
        assert!(matches!(err, EditError::Decode(_)));
    }

    #[test]
    fn load_non_image_is_decode_error() {
        let path = temp_path("not-an-image.png");
        std::fs::write(&path, b"definitely not a png").unwrap();
        let err = load_surface(&path).unwrap_err();
        let _ = std::fs::remove_file(&path);
        assert!(matches!(err, EditError::Decode(_)));
    }
}
