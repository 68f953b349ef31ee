//! Image decoding and grayscale conversion.
//!
//! Accepts raw image bytes (PNG, JPEG, BMP, WebP) and produces the
//! RGBA pixel grid the detector consumes, plus the single-channel
//! luminance grid every scoring strategy starts from.

use image::{DynamicImage, GrayImage, Luma};

use crate::types::{DetectorError, RgbaImage};

/// Decode raw image bytes into a [`DynamicImage`].
///
/// Supports whatever the `image` crate can decode with the enabled
/// features (PNG, JPEG, BMP, WebP).
///
/// # Errors
///
/// Returns [`DetectorError::EmptyInput`] if `bytes` is empty.
/// Returns [`DetectorError::ImageDecode`] if the image format is
/// unrecognized or the data is corrupt.
pub fn decode(bytes: &[u8]) -> Result<DynamicImage, DetectorError> {
    if bytes.is_empty() {
        return Err(DetectorError::EmptyInput);
    }

    Ok(image::load_from_memory(bytes)?)
}

/// Convert a decoded image to 8-bit RGBA.
#[must_use = "returns the converted RGBA image"]
pub fn to_rgba(image: &DynamicImage) -> RgbaImage {
    image.to_rgba8()
}

/// Luminance of one RGB sample, truncated to 8 bits.
///
/// Computes `0.299*R + 0.587*G + 0.114*B/256`. Only the blue term is
/// divided by 256, so blue contributes almost nothing and pure white
/// maps to 226 rather than 255. The default detector thresholds assume
/// this scale.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn luminance(r: u8, g: u8, b: u8) -> u8 {
    let value = 0.299 * f64::from(r) + 0.587 * f64::from(g) + 0.114 * f64::from(b) / 256.0;
    // Max is 0.886 * 255 + 0.114, always inside u8 range.
    value as u8
}

/// Convert an RGBA grid to a luminance grid of identical extent.
///
/// Alpha is ignored.
#[must_use = "returns the grayscale image"]
pub fn to_grayscale(image: &RgbaImage) -> GrayImage {
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        let [r, g, b, _] = image.get_pixel(x, y).0;
        Luma([luminance(r, g, b)])
    })
}
