//! PNG export of the annotated raster.

use image::ImageEncoder;
use image::codecs::png::PngEncoder;
use kaku_pipeline::RgbaImage;

use crate::ExportError;

/// Encode an RGBA image as PNG bytes.
///
/// # Errors
///
/// Returns [`ExportError::Png`] if the encoder rejects the buffer.
pub fn to_png(image: &RgbaImage) -> Result<Vec<u8>, ExportError> {
    let mut buf = Vec::new();
    PngEncoder::new(&mut buf).write_image(
        image.as_raw(),
        image.width(),
        image.height(),
        image::ExtendedColorType::Rgba8,
    )?;
    Ok(buf)
}
