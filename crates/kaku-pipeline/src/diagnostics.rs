//! Detection diagnostics: timing and counts for each stage.
//!
//! These diagnostics are permanent instrumentation intended for
//! threshold tuning and strategy comparison. Call
//! [`detect_with_diagnostics`] to collect them alongside the
//! [`Detection`].
//!
//! This crate performs no I/O, so timestamps come from a caller-supplied
//! [`Clock`]. Durations are serialized as fractional seconds (`f64`)
//! because `std::time::Duration` does not implement serde traits.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::pipeline::{Pipeline, ProcessedStage};
use crate::scoring::{RenderSource, ScoringStrategy};
use crate::types::{Detection, DetectionRegion, DetectorConfig, DetectorError, RgbaImage};

/// Serde support for `std::time::Duration` as fractional seconds.
mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a `Duration` as fractional seconds (`f64`).
    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    /// Deserialize a `Duration` from fractional seconds (`f64`).
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(|_| {
            serde::de::Error::custom(
                "duration seconds must be finite, non-negative, and representable as a Duration",
            )
        })
    }
}

/// Source of monotonic timestamps.
///
/// Native callers wrap `std::time::Instant`; tests use a fake clock.
pub trait Clock {
    /// Opaque timestamp type.
    type Instant;

    /// Current timestamp.
    fn now(&self) -> Self::Instant;

    /// Time elapsed since `since`.
    fn elapsed(&self, since: &Self::Instant) -> Duration;
}

/// Diagnostics collected from a single detection run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionDiagnostics {
    /// Stage 1: grayscale conversion and region computation.
    pub grayscale: StageDiagnostics,
    /// Stage 2: in-place median filter.
    pub denoise: StageDiagnostics,
    /// Stage 3: strategy scoring plus sort.
    pub score: StageDiagnostics,
    /// Stage 4: spatial suppression.
    pub suppress: StageDiagnostics,
    /// Stage 5: overlay rendering.
    pub render: StageDiagnostics,
    /// Total wall-clock duration of the run (seconds).
    #[serde(with = "duration_serde")]
    pub total_duration: Duration,
    /// Summary counts across all stages.
    pub summary: DetectionSummary,
}

/// Diagnostics for a single stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageDiagnostics {
    /// Wall-clock duration of this stage (seconds).
    #[serde(with = "duration_serde")]
    pub duration: Duration,
    /// Stage-specific metrics.
    pub metrics: StageMetrics,
}

/// Stage-specific metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StageMetrics {
    /// Grayscale conversion.
    Grayscale {
        /// Image width in pixels.
        width: u32,
        /// Image height in pixels.
        height: u32,
        /// Detection region used by later stages.
        region: DetectionRegion,
    },
    /// Median filter.
    Denoise {
        /// Pixels rewritten by the filter.
        filtered_pixels: u64,
    },
    /// Corner scoring.
    Score {
        /// Strategy that ran.
        strategy: ScoringStrategy,
        /// Raw candidates found.
        candidate_count: usize,
        /// Highest candidate score, if any.
        best_score: Option<f64>,
    },
    /// Spatial suppression.
    Suppress {
        /// Minimum separation between survivors.
        min_distance: f64,
        /// Candidates going in.
        candidates_before: usize,
        /// Survivors coming out.
        survivors: usize,
    },
    /// Overlay rendering.
    Render {
        /// Which list was drawn.
        source: RenderSource,
        /// Markers actually drawn after bounds checks.
        markers: usize,
    },
}

/// High-level summary for the whole run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionSummary {
    /// Source image width in pixels.
    pub image_width: u32,
    /// Source image height in pixels.
    pub image_height: u32,
    /// Strategy that ran.
    pub strategy: ScoringStrategy,
    /// Detection region.
    pub region: DetectionRegion,
    /// Raw candidates before suppression.
    pub candidate_count: usize,
    /// Corners after suppression.
    pub corner_count: usize,
}

impl DetectionDiagnostics {
    /// Format diagnostics as a human-readable report.
    #[must_use]
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Detection Diagnostics Report\n{}", "=".repeat(60)));
        lines.push(format!(
            "Image: {}x{}  Strategy: {}",
            self.summary.image_width, self.summary.image_height, self.summary.strategy,
        ));
        let r = self.summary.region;
        lines.push(format!(
            "Region: [{}, {}) x [{}, {})",
            r.min_x, r.max_x, r.min_y, r.max_y,
        ));
        lines.push(format!(
            "Total duration: {:.3}ms",
            duration_ms(self.total_duration),
        ));
        lines.push(String::new());

        lines.push(format!(
            "{:<16} {:>10} {:>10}  {}",
            "Stage", "Duration", "% Total", "Details"
        ));
        lines.push("-".repeat(72));

        let total_ms = duration_ms(self.total_duration);
        for (name, diag) in self.stages() {
            let ms = duration_ms(diag.duration);
            let pct = if total_ms > 0.0 {
                ms / total_ms * 100.0
            } else {
                0.0
            };
            let details = format_metrics(&diag.metrics);
            lines.push(format!("{name:<16} {ms:>8.3}ms {pct:>9.1}%  {details}"));
        }

        lines.push(String::new());
        lines.push(format!(
            "Candidates: {}  |  Corners: {}",
            self.summary.candidate_count, self.summary.corner_count,
        ));

        lines.join("\n")
    }

    /// Stages in execution order, with display names.
    #[must_use]
    pub fn stages(&self) -> [(&'static str, &StageDiagnostics); 5] {
        [
            ("Grayscale", &self.grayscale),
            ("Denoise", &self.denoise),
            ("Score", &self.score),
            ("Suppress", &self.suppress),
            ("Render", &self.render),
        ]
    }
}

/// Convert a `Duration` to milliseconds as `f64`.
fn duration_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

/// Format stage metrics into a compact detail string.
fn format_metrics(metrics: &StageMetrics) -> String {
    match metrics {
        StageMetrics::Grayscale {
            width,
            height,
            region,
        } => format!("{width}x{height}, region {}x{}", region.width(), region.height()),
        StageMetrics::Denoise { filtered_pixels } => format!("{filtered_pixels} px"),
        StageMetrics::Score {
            strategy,
            candidate_count,
            best_score,
        } => match best_score {
            Some(best) => format!("{strategy}: {candidate_count} candidates (best {best:.1})"),
            None => format!("{strategy}: no candidates"),
        },
        StageMetrics::Suppress {
            min_distance,
            candidates_before,
            survivors,
        } => format!("d>{min_distance:.1} {candidates_before}->{survivors}"),
        StageMetrics::Render { source, markers } => {
            let what = match source {
                RenderSource::Candidates => "candidates",
                RenderSource::Survivors => "survivors",
            };
            format!("{markers} markers ({what})")
        }
    }
}

/// Time one stage transition and capture its metrics.
fn timed<C, S, F>(clock: &C, advance: F) -> Result<(S, StageDiagnostics), DetectorError>
where
    C: Clock,
    S: ProcessedStage,
    F: FnOnce() -> Result<S, DetectorError>,
{
    let start = clock.now();
    let stage = advance()?;
    let duration = clock.elapsed(&start);
    let metrics = stage.stage_metrics();
    Ok((stage, StageDiagnostics { duration, metrics }))
}

/// Run the full pipeline, collecting per-stage diagnostics.
///
/// # Errors
///
/// Same as [`crate::detect`].
pub fn detect_with_diagnostics<C: Clock>(
    original: &RgbaImage,
    config: &DetectorConfig,
    clock: &C,
) -> Result<(Detection, DetectionDiagnostics), DetectorError> {
    let total_start = clock.now();

    let pending = Pipeline::new(original.clone(), config.clone());
    let (prepared, grayscale) = timed(clock, || pending.prepare())?;
    let (denoised, denoise) = timed(clock, || Ok(prepared.denoise()))?;
    let (scored, score) = timed(clock, || Ok(denoised.score()))?;
    let (suppressed, suppress) = timed(clock, || Ok(scored.suppress()))?;
    let (rendered, render) = timed(clock, || Ok(suppressed.render()))?;
    let detection = rendered.into_result();

    let total_duration = clock.elapsed(&total_start);
    let summary = DetectionSummary {
        image_width: detection.dimensions.width,
        image_height: detection.dimensions.height,
        strategy: detection.strategy,
        region: detection.region,
        candidate_count: detection.candidate_count,
        corner_count: detection.corners.len(),
    };

    Ok((
        detection,
        DetectionDiagnostics {
            grayscale,
            denoise,
            score,
            suppress,
            render,
            total_duration,
            summary,
        },
    ))
}
