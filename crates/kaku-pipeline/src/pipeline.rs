//! Incremental pipeline: advance stage-by-stage, inspecting each
//! intermediate result before continuing.
//!
//! Unlike [`crate::detect`] which runs every stage in one call,
//! [`Pipeline`] lets the caller drive execution one step at a time:
//!
//! ```rust
//! # use kaku_pipeline::{DetectorConfig, DetectorError, Pipeline, RgbaImage};
//! # fn run(image: RgbaImage) -> Result<(), DetectorError> {
//! let detection = Pipeline::new(image, DetectorConfig::default())
//!     .prepare()?
//!     .denoise()
//!     .score()
//!     .suppress()
//!     .render()
//!     .into_result();
//! # Ok(())
//! # }
//! ```
//!
//! Each stage method consumes `self` and returns the next state. Only
//! [`Pending::prepare`] can fail; it validates the configuration and
//! the image size before any pixel work happens. Every later stage is
//! infallible, and finding no corners is an ordinary, empty outcome.

use tracing::debug;

use crate::denoise::median_filter_in_place;
use crate::diagnostics::StageMetrics;
use crate::grayscale::to_grayscale;
use crate::render::{count_drawable, render_overlay};
use crate::scoring::{CornerScorer, RenderSource};
use crate::suppress::{sort_by_score, suppress};
use crate::types::{
    Corner, Detection, DetectionRegion, DetectorConfig, DetectorError, Dimensions, GrayImage,
    RgbaImage,
};

// ───────────────────────── Stage 0: Pending ──────────────────────────

/// Pipeline state before any processing has occurred.
#[must_use = "pipeline stages are consumed by advancing, call .prepare() to continue"]
pub struct Pending {
    config: DetectorConfig,
    original: RgbaImage,
}

impl Pending {
    /// The untouched source image.
    #[must_use]
    pub const fn original(&self) -> &RgbaImage {
        &self.original
    }

    /// Validate, compute the detection region, and convert to grayscale.
    ///
    /// # Errors
    ///
    /// Returns [`DetectorError::InvalidConfig`] if the configuration is
    /// out of range, [`DetectorError::ImageTooSmall`] if either side is
    /// below [`MIN_DIMENSION`](crate::types::MIN_DIMENSION), and
    /// [`DetectorError::EmptyRegion`] if the region has no pixels.
    pub fn prepare(self) -> Result<Prepared, DetectorError> {
        self.config.validate()?;
        let dimensions = Dimensions::of(&self.original);
        let region = DetectionRegion::centered(dimensions, self.config.region_fraction)?;
        let gray = to_grayscale(&self.original);
        debug!(
            width = dimensions.width,
            height = dimensions.height,
            ?region,
            strategy = %self.config.strategy,
            "prepared"
        );
        Ok(Prepared {
            config: self.config,
            original: self.original,
            gray,
            region,
            dimensions,
        })
    }
}

// ───────────────────────── Stage 1: Prepared ─────────────────────────

/// Grayscale grid and detection region are known.
#[must_use = "pipeline stages are consumed by advancing, call .denoise() to continue"]
pub struct Prepared {
    config: DetectorConfig,
    original: RgbaImage,
    gray: GrayImage,
    region: DetectionRegion,
    dimensions: Dimensions,
}

impl Prepared {
    /// Luminance grid before denoising.
    #[must_use]
    pub const fn gray(&self) -> &GrayImage {
        &self.gray
    }

    /// The centred region every later stage works in.
    #[must_use]
    pub const fn region(&self) -> DetectionRegion {
        self.region
    }

    /// Apply the in-place median filter to the region.
    pub fn denoise(self) -> Denoised {
        let mut gray = self.gray;
        median_filter_in_place(&mut gray, self.region);
        debug!(
            width = self.region.width(),
            height = self.region.height(),
            "denoised"
        );
        Denoised {
            config: self.config,
            original: self.original,
            denoised: gray,
            region: self.region,
            dimensions: self.dimensions,
        }
    }
}

// ───────────────────────── Stage 2: Denoised ─────────────────────────

/// Region has been median filtered.
#[must_use = "pipeline stages are consumed by advancing, call .score() to continue"]
pub struct Denoised {
    config: DetectorConfig,
    original: RgbaImage,
    denoised: GrayImage,
    region: DetectionRegion,
    dimensions: Dimensions,
}

impl Denoised {
    /// Grayscale grid after the median filter.
    #[must_use]
    pub const fn denoised(&self) -> &GrayImage {
        &self.denoised
    }

    /// Run the configured strategy and sort candidates by descending score.
    pub fn score(self) -> Scored {
        let mut candidates =
            self.config
                .strategy
                .candidates(&self.denoised, self.region, &self.config);
        sort_by_score(&mut candidates);
        Scored {
            config: self.config,
            original: self.original,
            denoised: self.denoised,
            region: self.region,
            dimensions: self.dimensions,
            candidates,
        }
    }
}

// ───────────────────────── Stage 3: Scored ───────────────────────────

/// Raw candidates, sorted by descending score.
#[must_use = "pipeline stages are consumed by advancing, call .suppress() to continue"]
pub struct Scored {
    config: DetectorConfig,
    original: RgbaImage,
    denoised: GrayImage,
    region: DetectionRegion,
    dimensions: Dimensions,
    candidates: Vec<Corner>,
}

impl Scored {
    /// Candidates before suppression, highest score first.
    #[must_use]
    pub fn candidates(&self) -> &[Corner] {
        &self.candidates
    }

    /// Greedy distance-based suppression.
    pub fn suppress(self) -> Suppressed {
        let survivors = suppress(&self.candidates, self.config.min_distance);
        Suppressed {
            config: self.config,
            original: self.original,
            denoised: self.denoised,
            region: self.region,
            dimensions: self.dimensions,
            candidates: self.candidates,
            survivors,
        }
    }
}

// ───────────────────────── Stage 4: Suppressed ───────────────────────

/// Survivors of spatial suppression.
#[must_use = "pipeline stages are consumed by advancing, call .render() to continue"]
pub struct Suppressed {
    config: DetectorConfig,
    original: RgbaImage,
    denoised: GrayImage,
    region: DetectionRegion,
    dimensions: Dimensions,
    candidates: Vec<Corner>,
    survivors: Vec<Corner>,
}

impl Suppressed {
    /// Corners that survived suppression, highest score first.
    #[must_use]
    pub fn survivors(&self) -> &[Corner] {
        &self.survivors
    }

    /// Corners the renderer will draw for this strategy.
    #[must_use]
    pub fn to_draw(&self) -> &[Corner] {
        match self.config.strategy.render_source() {
            RenderSource::Candidates => &self.candidates,
            RenderSource::Survivors => &self.survivors,
        }
    }

    /// Draw markers onto a copy of the original image.
    pub fn render(self) -> Rendered {
        let bounds = self.config.strategy.render_bounds();
        let drawn = self.to_draw();
        let markers = count_drawable(drawn, bounds, self.region, self.dimensions);
        let annotated = render_overlay(
            &self.original,
            drawn,
            bounds,
            self.region,
            self.config.marker,
        );
        debug!(markers, ?bounds, "rendered");
        Rendered {
            config: self.config,
            denoised: self.denoised,
            region: self.region,
            dimensions: self.dimensions,
            candidate_count: self.candidates.len(),
            survivors: self.survivors,
            annotated,
            markers,
        }
    }
}

// ───────────────────────── Stage 5: Rendered ─────────────────────────

/// Final stage. Call [`into_result`](Self::into_result) to extract the
/// [`Detection`].
#[must_use = "call .into_result() to extract the Detection"]
pub struct Rendered {
    config: DetectorConfig,
    denoised: GrayImage,
    region: DetectionRegion,
    dimensions: Dimensions,
    candidate_count: usize,
    survivors: Vec<Corner>,
    annotated: RgbaImage,
    markers: usize,
}

impl Rendered {
    /// Original image with markers burned in.
    #[must_use]
    pub const fn annotated(&self) -> &RgbaImage {
        &self.annotated
    }

    /// Grayscale grid the strategy scored.
    #[must_use]
    pub const fn denoised(&self) -> &GrayImage {
        &self.denoised
    }

    /// Number of markers actually drawn.
    #[must_use]
    pub const fn markers(&self) -> usize {
        self.markers
    }

    /// Consume the pipeline and return the [`Detection`].
    #[must_use]
    pub fn into_result(self) -> Detection {
        Detection {
            annotated: self.annotated,
            corners: self.survivors,
            candidate_count: self.candidate_count,
            region: self.region,
            strategy: self.config.strategy,
            dimensions: self.dimensions,
        }
    }
}

// ──────────────────────── PipelineStage trait ─────────────────────────

/// Total number of stages, including [`Pending`].
pub const STAGE_COUNT: usize = 6;

/// Implemented by every pipeline state so diagnostics can treat stages
/// uniformly.
pub trait PipelineStage {
    /// Short stage name (e.g. `"denoise"`).
    const NAME: &str;

    /// Zero-based stage index (`0` for Pending through `5` for
    /// Rendered).
    const INDEX: usize;

    /// Metrics describing the work done to reach this state, or `None`
    /// for [`Pending`].
    fn metrics(&self) -> Option<StageMetrics>;
}

/// A state reached by running a stage, which therefore always has
/// metrics to report.
pub trait ProcessedStage: PipelineStage {
    /// Metrics describing the work done to reach this state.
    fn stage_metrics(&self) -> StageMetrics;
}

impl PipelineStage for Pending {
    const NAME: &str = "source";
    const INDEX: usize = 0;

    fn metrics(&self) -> Option<StageMetrics> {
        None
    }
}

impl PipelineStage for Prepared {
    const NAME: &str = "grayscale";
    const INDEX: usize = 1;

    fn metrics(&self) -> Option<StageMetrics> {
        Some(self.stage_metrics())
    }
}

impl ProcessedStage for Prepared {
    fn stage_metrics(&self) -> StageMetrics {
        StageMetrics::Grayscale {
            width: self.dimensions.width,
            height: self.dimensions.height,
            region: self.region,
        }
    }
}

impl PipelineStage for Denoised {
    const NAME: &str = "denoise";
    const INDEX: usize = 2;

    fn metrics(&self) -> Option<StageMetrics> {
        Some(self.stage_metrics())
    }
}

impl ProcessedStage for Denoised {
    fn stage_metrics(&self) -> StageMetrics {
        StageMetrics::Denoise {
            filtered_pixels: u64::from(self.region.width()) * u64::from(self.region.height()),
        }
    }
}

impl PipelineStage for Scored {
    const NAME: &str = "score";
    const INDEX: usize = 3;

    fn metrics(&self) -> Option<StageMetrics> {
        Some(self.stage_metrics())
    }
}

impl ProcessedStage for Scored {
    fn stage_metrics(&self) -> StageMetrics {
        StageMetrics::Score {
            strategy: self.config.strategy,
            candidate_count: self.candidates.len(),
            best_score: self.candidates.first().map(|c| c.score),
        }
    }
}

impl PipelineStage for Suppressed {
    const NAME: &str = "suppress";
    const INDEX: usize = 4;

    fn metrics(&self) -> Option<StageMetrics> {
        Some(self.stage_metrics())
    }
}

impl ProcessedStage for Suppressed {
    fn stage_metrics(&self) -> StageMetrics {
        StageMetrics::Suppress {
            min_distance: self.config.min_distance,
            candidates_before: self.candidates.len(),
            survivors: self.survivors.len(),
        }
    }
}

impl PipelineStage for Rendered {
    const NAME: &str = "render";
    const INDEX: usize = 5;

    fn metrics(&self) -> Option<StageMetrics> {
        Some(self.stage_metrics())
    }
}

impl ProcessedStage for Rendered {
    fn stage_metrics(&self) -> StageMetrics {
        StageMetrics::Render {
            source: self.config.strategy.render_source(),
            markers: self.markers,
        }
    }
}

// ───────────────────── Pipeline entry point ──────────────────────────

/// Incremental corner detection pipeline.
///
/// Created via [`Pipeline::new`], which stores the image and config
/// without doing any processing. Each stage method consumes the
/// current state and returns the next, making it a compile-time error
/// to skip stages or call them out of order.
pub struct Pipeline;

impl Pipeline {
    /// Create a new pipeline from a decoded image and config.
    #[allow(clippy::new_ret_no_self)]
    pub const fn new(original: RgbaImage, config: DetectorConfig) -> Pending {
        Pending { config, original }
    }
}
