//! PNG and base64 helpers for attached screenshots
//!
//! The dialog downsizes and encodes images with these helpers; the server
//! decodes them again before materializing files.

use crate::error::Result;
use base64::{engine::general_purpose, Engine as _};
use image::codecs::png::PngEncoder;
use image::imageops::FilterType;
use image::{ExtendedColorType, ImageEncoder, RgbaImage};
use std::io::Cursor;

/// Maximum width or height of an attached image
pub const MAX_IMAGE_DIM: u32 = 1600;

const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// Target size for an image that must fit inside a `max_dim` square, keeping aspect ratio.
///
/// Returns `None` when the image already fits.
pub fn fit_within(width: u32, height: u32, max_dim: u32) -> Option<(u32, u32)> {
    if width <= max_dim && height <= max_dim {
        return None;
    }
    let scale = max_dim as f64 / width.max(height) as f64;
    let new_width = ((width as f64 * scale).round() as u32).clamp(1, max_dim);
    let new_height = ((height as f64 * scale).round() as u32).clamp(1, max_dim);
    Some((new_width, new_height))
}

/// Downscale `image` so neither dimension exceeds [`MAX_IMAGE_DIM`]
pub fn downscale_to_fit(image: RgbaImage) -> RgbaImage {
    match fit_within(image.width(), image.height(), MAX_IMAGE_DIM) {
        Some((w, h)) => {
            tracing::debug!(
                "[image] Downscaling {}x{} to {}x{}",
                image.width(),
                image.height(),
                w,
                h
            );
            image::imageops::resize(&image, w, h, FilterType::Lanczos3)
        }
        None => image,
    }
}

/// Encode an RGBA image to PNG bytes
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>> {
    let mut png_data = Vec::new();
    let encoder = PngEncoder::new(Cursor::new(&mut png_data));
    encoder.write_image(
        image.as_raw(),
        image.width(),
        image.height(),
        ExtendedColorType::Rgba8,
    )?;
    Ok(png_data)
}

/// Encode an RGBA image to PNG and then to standard base64
pub fn encode_png_base64(image: &RgbaImage) -> Result<String> {
    let png = encode_png(image)?;
    Ok(general_purpose::STANDARD.encode(png))
}

/// Decode a standard base64 string to raw bytes
pub fn decode_base64(data: &str) -> Result<Vec<u8>> {
    Ok(general_purpose::STANDARD.decode(data.trim())?)
}

/// Encode raw bytes to standard base64
pub fn encode_base64(bytes: &[u8]) -> String {
    general_purpose::STANDARD.encode(bytes)
}

pub fn is_png(bytes: &[u8]) -> bool {
    bytes.starts_with(&PNG_SIGNATURE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_fit_within_leaves_small_images() {
        assert_eq!(fit_within(1600, 1600, MAX_IMAGE_DIM), None);
        assert_eq!(fit_within(10, 900, MAX_IMAGE_DIM), None);
    }

    #[test]
    fn test_fit_within_keeps_aspect_ratio() {
        assert_eq!(fit_within(3200, 1800, MAX_IMAGE_DIM), Some((1600, 900)));
        assert_eq!(fit_within(1000, 4000, MAX_IMAGE_DIM), Some((400, 1600)));
    }

    #[test]
    fn test_fit_within_never_collapses_to_zero() {
        assert_eq!(fit_within(100_000, 1, MAX_IMAGE_DIM), Some((1600, 1)));
    }

    #[test]
    fn test_downscale_oversized_image() {
        let img = RgbaImage::from_pixel(2000, 500, Rgba([10, 20, 30, 255]));
        let out = downscale_to_fit(img);
        assert_eq!((out.width(), out.height()), (1600, 400));
    }

    #[test]
    fn test_png_base64_roundtrip_is_byte_identical() {
        let mut img = RgbaImage::new(3, 2);
        img.put_pixel(1, 1, Rgba([255, 0, 0, 255]));
        let png = encode_png(&img).unwrap();
        assert!(is_png(&png));

        let b64 = encode_png_base64(&img).unwrap();
        assert_eq!(decode_base64(&b64).unwrap(), png);

        let decoded = image::load_from_memory(&png).unwrap().to_rgba8();
        assert_eq!(decoded, img);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(decode_base64("not base64 !!!").is_err());
    }
}
