use std::path::Path;

use anyhow::Context;

use crate::foundation::error::{LyricReelError, LyricReelResult};

/// Decode the cover image at `path` to straight RGBA8.
///
/// A missing file is [`LyricReelError::InputMissing`]; an undecodable one is a render failure.
pub fn load_cover(path: &Path) -> LyricReelResult<image::DynamicImage> {
    if !path.is_file() {
        return Err(LyricReelError::input_missing(format!(
            "cover image '{}' not found",
            path.display()
        )));
    }
    let bytes = std::fs::read(path).with_context(|| format!("read cover '{}'", path.display()))?;
    decode_cover(&bytes).map_err(|e| {
        LyricReelError::render(format!("cover image '{}': {e}", path.display()))
    })
}

/// Decode in-memory image bytes, normalized to RGBA8.
pub fn decode_cover(bytes: &[u8]) -> LyricReelResult<image::DynamicImage> {
    let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    let (w, h) = (dyn_img.width(), dyn_img.height());
    if w == 0 || h == 0 {
        return Err(LyricReelError::render("cover image has zero size"));
    }
    Ok(image::DynamicImage::ImageRgba8(dyn_img.to_rgba8()))
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn decode_png_keeps_dimensions_and_pixels() {
        let img = image::RgbaImage::from_raw(2, 1, vec![100, 50, 200, 128, 1, 2, 3, 255]).unwrap();
        let mut buf = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();

        let decoded = decode_cover(&buf).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (2, 1));
        assert_eq!(decoded.get_pixel(0, 0).0, [100, 50, 200, 128]);
    }

    #[test]
    fn missing_cover_is_input_missing() {
        let err = load_cover(Path::new("target/no/such/cover.png")).unwrap_err();
        assert!(matches!(err, LyricReelError::InputMissing(_)));
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        assert!(decode_cover(b"not an image").is_err());
    }
}
