//! kaku-pipeline: Pure corner detection pipeline (sans-IO).
//!
//! Finds corners in a raster image and burns markers into a copy of it:
//! grayscale -> median denoise -> strategy scoring (Harris,
//! Shi-Tomashi or FAST) -> spatial suppression -> overlay.
//!
//! This crate has **no I/O dependencies**. It operates on in-memory
//! byte slices and decoded pixel grids and returns structured data.
//! File handling lives in the `kaku` binary and format encoding in
//! `kaku-export`.

pub mod convolution;
pub mod denoise;
pub mod diagnostics;
pub mod fast;
pub mod grayscale;
pub mod harris;
pub mod pipeline;
pub mod render;
pub mod scoring;
pub mod shi_tomashi;
pub mod suppress;
pub mod tensor;
pub mod types;

#[cfg(test)]
mod test_util;

pub use diagnostics::{Clock, DetectionDiagnostics, detect_with_diagnostics};
pub use pipeline::{Pipeline, PipelineStage, ProcessedStage};
pub use scoring::{CornerScorer, ScoringStrategy, UnknownStrategy};
pub use types::{
    Corner, Detection, DetectionRegion, DetectorConfig, DetectorError, Dimensions, GrayImage,
    Marker, MarkerStyle, RgbaImage,
};

/// Run every stage on an already decoded image.
///
/// # Pipeline steps
///
/// 1. Validate the config and compute the detection region
/// 2. Grayscale conversion
/// 3. In-place median filter over the region
/// 4. Corner scoring (pluggable strategy), sorted by descending score
/// 5. Greedy spatial suppression
/// 6. Marker overlay on a copy of `original`
///
/// Finding no corners is not an error: the result has an empty
/// corner list and an unmodified copy of the image.
///
/// # Errors
///
/// Returns [`DetectorError::InvalidConfig`] for out-of-range tunables,
/// [`DetectorError::ImageTooSmall`] if either side is below
/// [`types::MIN_DIMENSION`], and [`DetectorError::EmptyRegion`] if the
/// detection region has no pixels.
pub fn detect(original: &RgbaImage, config: &DetectorConfig) -> Result<Detection, DetectorError> {
    Ok(Pipeline::new(original.clone(), config.clone())
        .prepare()?
        .denoise()
        .score()
        .suppress()
        .render()
        .into_result())
}

/// Decode raw image bytes and run [`detect`].
///
/// A decode failure aborts before any stage runs.
///
/// # Errors
///
/// Returns [`DetectorError::EmptyInput`] if `image_bytes` is empty,
/// [`DetectorError::ImageDecode`] if the format is unrecognized, and
/// anything [`detect`] returns.
pub fn process(image_bytes: &[u8], config: &DetectorConfig) -> Result<Detection, DetectorError> {
    let decoded = grayscale::decode(image_bytes)?;
    detect(&grayscale::to_rgba(&decoded), config)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_util::white_square;

    fn png_bytes(img: &RgbaImage) -> Vec<u8> {
        let mut buf = Vec::new();
        let encoder = image::codecs::png::PngEncoder::new(&mut buf);
        image::ImageEncoder::write_image(
            encoder,
            img.as_raw(),
            img.width(),
            img.height(),
            image::ExtendedColorType::Rgba8,
        )
        .unwrap();
        buf
    }

    #[test]
    fn process_empty_input() {
        let result = process(&[], &DetectorConfig::default());
        assert!(matches!(result, Err(DetectorError::EmptyInput)));
    }

    #[test]
    fn process_corrupt_input() {
        let result = process(&[0xFF, 0x00], &DetectorConfig::default());
        assert!(matches!(result, Err(DetectorError::ImageDecode(_))));
    }

    #[test]
    fn process_matches_detect_on_decoded_png() {
        let image = white_square(16, 6, 10);
        let config = DetectorConfig::with_strategy(ScoringStrategy::ShiTomashi);
        let from_bytes = process(&png_bytes(&image), &config).unwrap();
        let direct = detect(&image, &config).unwrap();
        assert_eq!(from_bytes, direct);
    }

    #[test]
    fn detect_reports_dimensions_and_strategy() {
        let image = white_square(16, 6, 10);
        let detection = detect(&image, &DetectorConfig::with_strategy(ScoringStrategy::Fast)).unwrap();
        assert_eq!(
            detection.dimensions,
            Dimensions {
                width: 16,
                height: 16
            }
        );
        assert_eq!(detection.strategy, ScoringStrategy::Fast);
        assert_eq!(detection.annotated.dimensions(), (16, 16));
    }

    #[test]
    fn detect_does_not_modify_input() {
        let image = white_square(16, 6, 10);
        let copy = image.clone();
        let _ = detect(&image, &DetectorConfig::default()).unwrap();
        assert_eq!(image, copy);
    }
}
