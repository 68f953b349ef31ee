//! Shared types for the kaku corner detection pipeline.

use serde::{Deserialize, Serialize};

use crate::scoring::ScoringStrategy;

/// Re-export `GrayImage` so downstream crates can reference
/// intermediate raster data without depending on `image` directly.
pub use image::GrayImage;

/// Re-export `RgbaImage` so downstream crates can reference the
/// original decoded image without depending on `image` directly.
pub use image::RgbaImage;

/// Smallest accepted width or height in pixels.
///
/// Below this the quarter-margin detection region no longer leaves a
/// one-pixel border for the 3×3 median neighborhood.
pub const MIN_DIMENSION: u32 = 4;

/// A detected corner: pixel position plus the strategy's response.
///
/// Score semantics depend on the strategy that produced it:
/// Harris `det - k*trace`, Shi-Tomashi minimum eigenvalue, FAST sum of
/// absolute ring differences.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Corner {
    /// Column (pixels from left edge).
    pub x: u32,
    /// Row (pixels from top edge).
    pub y: u32,
    /// Strategy-specific response value.
    pub score: f64,
}

impl Corner {
    /// Create a new corner.
    #[must_use]
    pub const fn new(x: u32, y: u32, score: f64) -> Self {
        Self { x, y, score }
    }

    /// Euclidean distance between the two pixel positions.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        let dx = f64::from(self.x) - f64::from(other.x);
        let dy = f64::from(self.y) - f64::from(other.y);
        dx.hypot(dy)
    }
}

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Dimensions {
    /// Dimensions of an image buffer.
    #[must_use]
    pub fn of<P: image::Pixel>(image: &image::ImageBuffer<P, Vec<P::Subpixel>>) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
        }
    }

    /// Whether `(x, y)` lies inside `[0, width) × [0, height)`.
    #[must_use]
    pub const fn contains(self, x: u32, y: u32) -> bool {
        x < self.width && y < self.height
    }
}

/// The centred sub-rectangle in which corners are scored.
///
/// Bounds are half-open: `min_x <= x < max_x`, `min_y <= y < max_y`.
/// With the default fraction of `0.5` this is
/// `[w/4, 3w/4) × [h/4, 3h/4)` using integer division.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionRegion {
    /// First column inside the region.
    pub min_x: u32,
    /// First row inside the region.
    pub min_y: u32,
    /// One past the last column inside the region.
    pub max_x: u32,
    /// One past the last row inside the region.
    pub max_y: u32,
}

impl DetectionRegion {
    /// Compute the centred region covering `fraction` of each axis.
    ///
    /// # Errors
    ///
    /// Returns [`DetectorError::ImageTooSmall`] if either dimension is
    /// below [`MIN_DIMENSION`], [`DetectorError::InvalidConfig`] if
    /// `fraction` is outside `(0, 1]`, and
    /// [`DetectorError::EmptyRegion`] if the region collapses to zero
    /// width or height.
    pub fn centered(dimensions: Dimensions, fraction: f64) -> Result<Self, DetectorError> {
        if dimensions.width < MIN_DIMENSION || dimensions.height < MIN_DIMENSION {
            return Err(DetectorError::ImageTooSmall {
                width: dimensions.width,
                height: dimensions.height,
                min: MIN_DIMENSION,
            });
        }
        if !(fraction > 0.0 && fraction <= 1.0) {
            return Err(DetectorError::InvalidConfig(format!(
                "region_fraction must be in (0, 1], got {fraction}"
            )));
        }

        let lo = (1.0 - fraction) / 2.0;
        let hi = (1.0 + fraction) / 2.0;
        let (min_x, max_x) = span(dimensions.width, lo, hi);
        let (min_y, max_y) = span(dimensions.height, lo, hi);

        if min_x >= max_x || min_y >= max_y {
            return Err(DetectorError::EmptyRegion {
                width: dimensions.width,
                height: dimensions.height,
                fraction,
            });
        }

        Ok(Self {
            min_x,
            min_y,
            max_x,
            max_y,
        })
    }

    /// Whether `(x, y)` lies inside the region.
    #[must_use]
    pub const fn contains(self, x: u32, y: u32) -> bool {
        x >= self.min_x && x < self.max_x && y >= self.min_y && y < self.max_y
    }

    /// Region width in pixels.
    #[must_use]
    pub const fn width(self) -> u32 {
        self.max_x - self.min_x
    }

    /// Region height in pixels.
    #[must_use]
    pub const fn height(self) -> u32 {
        self.max_y - self.min_y
    }

    /// Iterate region pixels in row-major order (rows outer).
    pub fn pixels(self) -> impl Iterator<Item = (u32, u32)> {
        (self.min_y..self.max_y).flat_map(move |y| (self.min_x..self.max_x).map(move |x| (x, y)))
    }
}

/// Floor `extent * lo` and `extent * hi`, clamped to `[0, extent]`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn span(extent: u32, lo: f64, hi: f64) -> (u32, u32) {
    let e = f64::from(extent);
    let start = (e * lo).floor().clamp(0.0, e) as u32;
    let end = (e * hi).floor().clamp(0.0, e) as u32;
    (start, end)
}

/// How a corner marker is drawn onto the output image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MarkerStyle {
    /// Overwrite exactly the corner pixel.
    #[default]
    Pixel,
    /// A small cross centred on the corner, for visibility on large images.
    Cross,
}

/// Marker colour and shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Marker {
    /// RGBA marker colour.
    pub color: [u8; 4],
    /// Marker shape.
    pub style: MarkerStyle,
}

impl Marker {
    /// Opaque pure red.
    pub const RED: [u8; 4] = [255, 0, 0, 255];
}

impl Default for Marker {
    fn default() -> Self {
        Self {
            color: Self::RED,
            style: MarkerStyle::Pixel,
        }
    }
}

/// Configuration for one detection run.
///
/// Every tunable has a `DEFAULT_*` constant so front ends can reuse
/// the library defaults for their own flags. Call
/// [`validate`](Self::validate) (done automatically by the pipeline)
/// to reject out-of-range values before any stage runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Which corner scoring algorithm to run.
    pub strategy: ScoringStrategy,

    /// Fraction of each axis covered by the centred detection region.
    pub region_fraction: f64,

    /// Structure tensor window size in pixels (Harris / Shi-Tomashi).
    pub window: u32,

    /// Candidate threshold for Harris (`r < threshold`) and
    /// Shi-Tomashi (`response > threshold`).
    pub score_threshold: f64,

    /// Harris `k` constant.
    pub harris_k: f64,

    /// FAST ring intensity difference threshold.
    pub fast_threshold: u8,

    /// Minimum Euclidean distance between two kept corners.
    pub min_distance: f64,

    /// Marker drawn at each corner in the output image.
    pub marker: Marker,
}

impl DetectorConfig {
    /// Default scoring strategy.
    pub const DEFAULT_STRATEGY: ScoringStrategy = ScoringStrategy::Harris;
    /// Default detection region fraction (central 50% × 50%).
    pub const DEFAULT_REGION_FRACTION: f64 = 0.5;
    /// Default structure tensor window.
    pub const DEFAULT_WINDOW: u32 = 3;
    /// Default Harris / Shi-Tomashi threshold.
    pub const DEFAULT_SCORE_THRESHOLD: f64 = 10.0;
    /// Default Harris `k`.
    pub const DEFAULT_HARRIS_K: f64 = 0.04;
    /// Default FAST intensity threshold.
    pub const DEFAULT_FAST_THRESHOLD: u8 = 125;
    /// Default suppression distance.
    pub const DEFAULT_MIN_DISTANCE: f64 = 10.0;

    /// Default configuration with a different strategy.
    #[must_use]
    pub fn with_strategy(strategy: ScoringStrategy) -> Self {
        Self {
            strategy,
            ..Self::default()
        }
    }

    /// Check every tunable is in range.
    ///
    /// # Errors
    ///
    /// Returns [`DetectorError::InvalidConfig`] naming the first
    /// offending field.
    pub fn validate(&self) -> Result<(), DetectorError> {
        if !(self.region_fraction > 0.0 && self.region_fraction <= 1.0) {
            return Err(DetectorError::InvalidConfig(format!(
                "region_fraction must be in (0, 1], got {}",
                self.region_fraction
            )));
        }
        if self.window == 0 {
            return Err(DetectorError::InvalidConfig(
                "window must be at least 1".to_string(),
            ));
        }
        if !self.score_threshold.is_finite() {
            return Err(DetectorError::InvalidConfig(format!(
                "score_threshold must be finite, got {}",
                self.score_threshold
            )));
        }
        if !self.harris_k.is_finite() {
            return Err(DetectorError::InvalidConfig(format!(
                "harris_k must be finite, got {}",
                self.harris_k
            )));
        }
        if !(self.min_distance.is_finite() && self.min_distance >= 0.0) {
            return Err(DetectorError::InvalidConfig(format!(
                "min_distance must be finite and non-negative, got {}",
                self.min_distance
            )));
        }
        Ok(())
    }
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            strategy: Self::DEFAULT_STRATEGY,
            region_fraction: Self::DEFAULT_REGION_FRACTION,
            window: Self::DEFAULT_WINDOW,
            score_threshold: Self::DEFAULT_SCORE_THRESHOLD,
            harris_k: Self::DEFAULT_HARRIS_K,
            fast_threshold: Self::DEFAULT_FAST_THRESHOLD,
            min_distance: Self::DEFAULT_MIN_DISTANCE,
            marker: Marker::default(),
        }
    }
}

/// Result of a complete detection run.
///
/// Uses custom `Serialize`/`Deserialize` because `RgbaImage` does not
/// implement serde traits; the annotated raster is serialized as a
/// `(width, height, raw_pixels)` tuple.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    /// Original image with corner markers burned in.
    pub annotated: RgbaImage,
    /// Suppression survivors, highest score first.
    pub corners: Vec<Corner>,
    /// Number of raw candidates before suppression.
    pub candidate_count: usize,
    /// Region the strategy scored.
    pub region: DetectionRegion,
    /// Strategy that produced the corners.
    pub strategy: ScoringStrategy,
    /// Source image dimensions.
    pub dimensions: Dimensions,
}

impl Detection {
    /// Whether the run found no corners at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.corners.is_empty()
    }
}

#[derive(Serialize, Deserialize)]
struct DetectionProxy {
    annotated: (u32, u32, Vec<u8>),
    corners: Vec<Corner>,
    candidate_count: usize,
    region: DetectionRegion,
    strategy: ScoringStrategy,
    dimensions: Dimensions,
}

impl Serialize for Detection {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let proxy = DetectionProxy {
            annotated: (
                self.annotated.width(),
                self.annotated.height(),
                self.annotated.as_raw().clone(),
            ),
            corners: self.corners.clone(),
            candidate_count: self.candidate_count,
            region: self.region,
            strategy: self.strategy,
            dimensions: self.dimensions,
        };
        proxy.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Detection {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let proxy = DetectionProxy::deserialize(deserializer)?;
        let annotated =
            RgbaImage::from_raw(proxy.annotated.0, proxy.annotated.1, proxy.annotated.2)
                .ok_or_else(|| serde::de::Error::custom("invalid RGBA image dimensions"))?;
        Ok(Self {
            annotated,
            corners: proxy.corners,
            candidate_count: proxy.candidate_count,
            region: proxy.region,
            strategy: proxy.strategy,
            dimensions: proxy.dimensions,
        })
    }
}

/// Errors that can occur during a detection run.
///
/// Every failure is terminal for the run it occurred in. Finding no
/// corners is not an error; it yields an empty [`Detection::corners`].
#[derive(Debug, thiserror::Error)]
pub enum DetectorError {
    /// Failed to decode the input image.
    #[error("failed to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),

    /// The input image bytes were empty.
    #[error("input image data is empty")]
    EmptyInput,

    /// The image is too small to hold a detection region.
    #[error("image {width}x{height} is too small: both dimensions must be at least {min}")]
    ImageTooSmall {
        /// Image width.
        width: u32,
        /// Image height.
        height: u32,
        /// Minimum accepted dimension.
        min: u32,
    },

    /// The detection region has no pixels for this image and fraction.
    #[error("detection region is empty for {width}x{height} image at fraction {fraction}")]
    EmptyRegion {
        /// Image width.
        width: u32,
        /// Image height.
        height: u32,
        /// Requested region fraction.
        fraction: f64,
    },

    /// Detector configuration is invalid.
    #[error("invalid detector configuration: {0}")]
    InvalidConfig(String),
}

/// Serde-compatible proxy for `DetectorError`.
///
/// `image::ImageError` does not implement serde, so the `ImageDecode`
/// variant stores its `Display` string instead.
#[derive(Serialize, Deserialize)]
enum DetectorErrorProxy {
    ImageDecode(String),
    EmptyInput,
    ImageTooSmall { width: u32, height: u32, min: u32 },
    EmptyRegion { width: u32, height: u32, fraction: f64 },
    InvalidConfig(String),
}

impl Serialize for DetectorError {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let proxy = match self {
            Self::ImageDecode(e) => DetectorErrorProxy::ImageDecode(e.to_string()),
            Self::EmptyInput => DetectorErrorProxy::EmptyInput,
            Self::ImageTooSmall { width, height, min } => DetectorErrorProxy::ImageTooSmall {
                width: *width,
                height: *height,
                min: *min,
            },
            Self::EmptyRegion {
                width,
                height,
                fraction,
            } => DetectorErrorProxy::EmptyRegion {
                width: *width,
                height: *height,
                fraction: *fraction,
            },
            Self::InvalidConfig(s) => DetectorErrorProxy::InvalidConfig(s.clone()),
        };
        proxy.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for DetectorError {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let proxy = DetectorErrorProxy::deserialize(deserializer)?;
        Ok(match proxy {
            // The typed image::ImageError cannot be rebuilt; keep the message.
            DetectorErrorProxy::ImageDecode(msg) => {
                Self::InvalidConfig(format!("image decode error: {msg}"))
            }
            DetectorErrorProxy::EmptyInput => Self::EmptyInput,
            DetectorErrorProxy::ImageTooSmall { width, height, min } => {
                Self::ImageTooSmall { width, height, min }
            }
            DetectorErrorProxy::EmptyRegion {
                width,
                height,
                fraction,
            } => Self::EmptyRegion {
                width,
                height,
                fraction,
            },
            DetectorErrorProxy::InvalidConfig(s) => Self::InvalidConfig(s),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn dims(width: u32, height: u32) -> Dimensions {
        Dimensions { width, height }
    }

    // --- Corner tests ---

    #[test]
    fn corner_distance() {
        let a = Corner::new(0, 0, 1.0);
        let b = Corner::new(3, 4, 2.0);
        assert!((a.distance(b) - 5.0).abs() < f64::EPSILON);
        assert!((b.distance(a) - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn corner_distance_to_self_is_zero() {
        let c = Corner::new(7, 11, 0.0);
        assert!(c.distance(c).abs() < f64::EPSILON);
    }

    // --- DetectionRegion tests ---

    #[test]
    fn default_region_is_central_half() {
        let region = DetectionRegion::centered(dims(16, 16), 0.5).unwrap();
        assert_eq!(
            region,
            DetectionRegion {
                min_x: 4,
                min_y: 4,
                max_x: 12,
                max_y: 12,
            }
        );
    }

    #[test]
    fn default_region_matches_integer_quarters() {
        for (w, h) in [(4, 4), (5, 9), (17, 31), (640, 480), (1001, 333)] {
            let region = DetectionRegion::centered(dims(w, h), 0.5).unwrap();
            assert_eq!(region.min_x, w / 4, "min_x for {w}x{h}");
            assert_eq!(region.max_x, 3 * w / 4, "max_x for {w}x{h}");
            assert_eq!(region.min_y, h / 4, "min_y for {w}x{h}");
            assert_eq!(region.max_y, 3 * h / 4, "max_y for {w}x{h}");
        }
    }

    #[test]
    fn region_bounds_are_ordered_and_inside_image() {
        for w in MIN_DIMENSION..40 {
            for h in [MIN_DIMENSION, 7, 23] {
                for fraction in [0.5, 0.8, 1.0] {
                    let region = DetectionRegion::centered(dims(w, h), fraction).unwrap();
                    assert!(region.min_x < region.max_x && region.max_x <= w);
                    assert!(region.min_y < region.max_y && region.max_y <= h);
                }
            }
        }
    }

    #[test]
    fn full_fraction_covers_image() {
        let region = DetectionRegion::centered(dims(10, 6), 1.0).unwrap();
        assert_eq!((region.min_x, region.min_y), (0, 0));
        assert_eq!((region.max_x, region.max_y), (10, 6));
    }

    #[test]
    fn tiny_image_is_rejected() {
        let result = DetectionRegion::centered(dims(3, 20), 0.5);
        assert!(matches!(
            result,
            Err(DetectorError::ImageTooSmall {
                width: 3,
                height: 20,
                min: MIN_DIMENSION
            })
        ));
    }

    #[test]
    fn collapsed_region_is_rejected() {
        let result = DetectionRegion::centered(dims(5, 5), 0.01);
        assert!(matches!(result, Err(DetectorError::EmptyRegion { .. })));
    }

    #[test]
    fn out_of_range_fraction_is_rejected() {
        for fraction in [0.0, -0.5, 1.5, f64::NAN] {
            let result = DetectionRegion::centered(dims(20, 20), fraction);
            assert!(
                matches!(result, Err(DetectorError::InvalidConfig(_))),
                "fraction {fraction} should be rejected"
            );
        }
    }

    #[test]
    fn region_pixels_are_row_major() {
        let region = DetectionRegion {
            min_x: 1,
            min_y: 2,
            max_x: 3,
            max_y: 4,
        };
        let pixels: Vec<_> = region.pixels().collect();
        assert_eq!(pixels, vec![(1, 2), (2, 2), (1, 3), (2, 3)]);
        assert!(region.contains(2, 3));
        assert!(!region.contains(3, 3));
        assert_eq!((region.width(), region.height()), (2, 2));
    }

    // --- DetectorConfig tests ---

    #[test]
    fn config_defaults_match_documented_values() {
        let config = DetectorConfig::default();
        assert_eq!(config.strategy, ScoringStrategy::Harris);
        assert!((config.region_fraction - 0.5).abs() < f64::EPSILON);
        assert_eq!(config.window, 3);
        assert!((config.score_threshold - 10.0).abs() < f64::EPSILON);
        assert!((config.harris_k - 0.04).abs() < f64::EPSILON);
        assert_eq!(config.fast_threshold, 125);
        assert!((config.min_distance - 10.0).abs() < f64::EPSILON);
        assert_eq!(config.marker.color, [255, 0, 0, 255]);
        assert_eq!(config.marker.style, MarkerStyle::Pixel);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_zero_window() {
        let config = DetectorConfig {
            window: 0,
            ..DetectorConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("window"));
    }

    #[test]
    fn validate_rejects_negative_min_distance() {
        let config = DetectorConfig {
            min_distance: -1.0,
            ..DetectorConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("min_distance"));
    }

    #[test]
    fn validate_rejects_non_finite_threshold() {
        let config = DetectorConfig {
            score_threshold: f64::INFINITY,
            ..DetectorConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(DetectorError::InvalidConfig(_))
        ));
    }

    #[test]
    fn config_serde_round_trip() {
        let config = DetectorConfig {
            strategy: ScoringStrategy::Fast,
            region_fraction: 0.75,
            window: 5,
            score_threshold: 42.0,
            harris_k: 0.06,
            fast_threshold: 30,
            min_distance: 4.5,
            marker: Marker {
                color: [0, 255, 0, 255],
                style: MarkerStyle::Cross,
            },
        };
        let json = serde_json::to_string(&config).unwrap();
        let deserialized: DetectorConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, deserialized);
    }

    #[test]
    fn partial_config_json_fills_defaults() {
        let config: DetectorConfig = serde_json::from_str(r#"{"window": 5}"#).unwrap();
        assert_eq!(config.window, 5);
        assert_eq!(config.strategy, DetectorConfig::DEFAULT_STRATEGY);
        assert_eq!(config.fast_threshold, DetectorConfig::DEFAULT_FAST_THRESHOLD);
    }

    // --- DetectorError tests ---

    #[test]
    fn error_display_carries_context() {
        let err = DetectorError::ImageTooSmall {
            width: 2,
            height: 9,
            min: 4,
        };
        assert_eq!(
            err.to_string(),
            "image 2x9 is too small: both dimensions must be at least 4"
        );
        assert_eq!(
            DetectorError::EmptyInput.to_string(),
            "input image data is empty"
        );
    }

    #[test]
    fn error_serde_round_trip() {
        let err = DetectorError::ImageTooSmall {
            width: 2,
            height: 3,
            min: 4,
        };
        let json = serde_json::to_string(&err).unwrap();
        let deserialized: DetectorError = serde_json::from_str(&json).unwrap();
        assert!(matches!(
            deserialized,
            DetectorError::ImageTooSmall {
                width: 2,
                height: 3,
                min: 4
            }
        ));
    }

    #[test]
    fn detection_serde_round_trip() {
        let detection = Detection {
            annotated: RgbaImage::from_pixel(2, 2, image::Rgba([10, 20, 30, 255])),
            corners: vec![Corner::new(1, 1, 3.5)],
            candidate_count: 4,
            region: DetectionRegion {
                min_x: 0,
                min_y: 0,
                max_x: 2,
                max_y: 2,
            },
            strategy: ScoringStrategy::ShiTomashi,
            dimensions: dims(2, 2),
        };
        let json = serde_json::to_string(&detection).unwrap();
        let deserialized: Detection = serde_json::from_str(&json).unwrap();
        assert_eq!(detection, deserialized);
    }
}
