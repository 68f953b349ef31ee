//! Corner scoring strategies.
//!
//! This module defines the [`CornerScorer`] trait and the
//! [`ScoringStrategy`] enum that selects an algorithm at runtime.
//!
//! # Strategy pattern
//!
//! The three algorithms are kept as distinct variants rather than
//! unified behind one parameterised tensor scorer. Each has its own
//! window convention, comparison direction, and rendering policy:
//!
//! | Strategy     | Window   | Candidate when      | Drawn                | Bounds  |
//! |--------------|----------|---------------------|----------------------|---------|
//! | Harris       | top-left | `r < threshold`     | every raw candidate  | region  |
//! | Shi-Tomashi  | centred  | `λmin > threshold`  | suppression survivors| image   |
//! | FAST         | n/a      | ≥ 3 ring hits       | suppression survivors| image   |

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::types::{Corner, DetectionRegion, DetectorConfig, GrayImage};
use crate::{fast, harris, shi_tomashi};

/// Selects which corner scoring algorithm to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScoringStrategy {
    /// `det − k·trace` over a top-left anchored window, kept when
    /// below the threshold.
    #[default]
    Harris,
    /// Minimum structure tensor eigenvalue over a centred window, kept
    /// when above the threshold.
    ShiTomashi,
    /// 8-point ring intensity test on the denoised grayscale grid.
    Fast,
}

/// Which corner list the overlay renderer draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RenderSource {
    /// Every raw candidate, before suppression.
    Candidates,
    /// Only the suppression survivors.
    Survivors,
}

/// Which rectangle a marker must fall inside to be drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RenderBounds {
    /// The detection region.
    Region,
    /// The whole image.
    Image,
}

impl ScoringStrategy {
    /// All strategies, in CLI listing order.
    pub const ALL: [Self; 3] = [Self::Harris, Self::ShiTomashi, Self::Fast];

    /// Stable lowercase name, also used for output file names.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Harris => "harris",
            Self::ShiTomashi => "shi-tomashi",
            Self::Fast => "fast",
        }
    }

    /// Default annotated output file name, e.g. `modified-harris.png`.
    #[must_use]
    pub fn default_output_name(self) -> String {
        format!("modified-{}.png", self.name())
    }

    /// Whether this strategy needs the Sobel derivatives and structure
    /// tensor.
    #[must_use]
    pub const fn uses_structure_tensor(self) -> bool {
        matches!(self, Self::Harris | Self::ShiTomashi)
    }

    /// Which list the renderer draws for this strategy.
    #[must_use]
    pub const fn render_source(self) -> RenderSource {
        match self {
            Self::Harris => RenderSource::Candidates,
            Self::ShiTomashi | Self::Fast => RenderSource::Survivors,
        }
    }

    /// Which bounds the renderer checks for this strategy.
    #[must_use]
    pub const fn render_bounds(self) -> RenderBounds {
        match self {
            Self::Harris => RenderBounds::Region,
            Self::ShiTomashi | Self::Fast => RenderBounds::Image,
        }
    }
}

impl fmt::Display for ScoringStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Returned when parsing an unknown strategy name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown scoring strategy {0:?} (expected harris, shi-tomashi or fast)")]
pub struct UnknownStrategy(pub String);

impl FromStr for ScoringStrategy {
    type Err = UnknownStrategy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|strategy| strategy.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownStrategy(s.to_string()))
    }
}

/// Trait for corner scoring strategies.
///
/// Input: the denoised grayscale grid and the detection region.
/// Output: raw candidates in scan order, unsorted and unsuppressed.
pub trait CornerScorer {
    /// Score every eligible pixel and return the candidates.
    fn candidates(
        &self,
        gray: &GrayImage,
        region: DetectionRegion,
        config: &DetectorConfig,
    ) -> Vec<Corner>;
}

impl CornerScorer for ScoringStrategy {
    fn candidates(
        &self,
        gray: &GrayImage,
        region: DetectionRegion,
        config: &DetectorConfig,
    ) -> Vec<Corner> {
        match *self {
            Self::Harris => harris::candidates(
                gray,
                region,
                config.window,
                config.harris_k,
                config.score_threshold,
            ),
            Self::ShiTomashi => {
                shi_tomashi::candidates(gray, region, config.window, config.score_threshold)
            }
            Self::Fast => fast::candidates(gray, region, config.fast_threshold),
        }
    }
}
