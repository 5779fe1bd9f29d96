//! PNG encoding.

use image::{ImageBuffer, ImageOutputFormat, Rgba};
use std::io::Cursor;
use wind_common::{WindError, WindResult};

/// Encode RGBA pixel data as PNG.
pub fn encode_png(pixels: &[u8], width: usize, height: usize) -> WindResult<Vec<u8>> {
    let expected = width * height * 4;
    if pixels.len() != expected {
        return Err(WindError::RenderError(format!(
            "Pixel buffer is {} bytes, expected {} for {}x{}",
            pixels.len(),
            expected,
            width,
            height
        )));
    }

    let img: ImageBuffer<Rgba<u8>, Vec<u8>> =
        ImageBuffer::from_raw(width as u32, height as u32, pixels.to_vec()).ok_or_else(|| {
            WindError::RenderError("Failed to create image buffer".to_string())
        })?;

    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageOutputFormat::Png)
        .map_err(|e| WindError::RenderError(format!("PNG encoding failed: {}", e)))?;
    Ok(out.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_png_signature() {
        let pixels = vec![255u8; 4 * 4 * 4];
        let png = encode_png(&pixels, 4, 4).unwrap();
        assert_eq!(&png[..8], &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]);
    }

    #[test]
    fn test_size_mismatch() {
        assert!(encode_png(&[0u8; 10], 4, 4).is_err());
    }
}
