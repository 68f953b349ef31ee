//! JSON export of the corner list.
//!
//! The report carries everything needed to reproduce or post-process a
//! run without the raster: strategy, image size, detection region, raw
//! candidate count, and the surviving corners in descending score order.

use kaku_pipeline::{Corner, Detection, DetectionRegion, DetectorConfig, Dimensions, ScoringStrategy};
use serde::Serialize;

use crate::ExportError;

/// Optional context embedded in the JSON report.
#[derive(Debug, Clone, Default)]
pub struct JsonMetadata<'a> {
    /// Source image name, emitted as `"source"`.
    pub source: Option<&'a str>,

    /// Full detector configuration, emitted as `"config"` so the run
    /// can be repeated exactly.
    pub config: Option<&'a DetectorConfig>,
}

#[derive(Serialize)]
struct CornerReport<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    source: Option<&'a str>,
    strategy: ScoringStrategy,
    dimensions: Dimensions,
    region: DetectionRegion,
    candidate_count: usize,
    corner_count: usize,
    corners: &'a [Corner],
    #[serde(skip_serializing_if = "Option::is_none")]
    config: Option<&'a DetectorConfig>,
}

/// Serialize a detection's corners and context as pretty-printed JSON.
///
/// The annotated raster is not included; use [`crate::to_png`] for it.
///
/// # Errors
///
/// Returns [`ExportError::Json`] if serialization fails.
pub fn to_json(detection: &Detection, metadata: &JsonMetadata<'_>) -> Result<String, ExportError> {
    let report = CornerReport {
        source: metadata.source,
        strategy: detection.strategy,
        dimensions: detection.dimensions,
        region: detection.region,
        candidate_count: detection.candidate_count,
        corner_count: detection.corners.len(),
        corners: &detection.corners,
        config: metadata.config,
    };
    Ok(serde_json::to_string_pretty(&report)?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use kaku_pipeline::RgbaImage;
    use serde_json::Value;

    use super::*;

    fn detection(corners: Vec<Corner>) -> Detection {
        Detection {
            annotated: RgbaImage::new(40, 30),
            candidate_count: corners.len() + 3,
            corners,
            region: DetectionRegion {
                min_x: 10,
                min_y: 7,
                max_x: 30,
                max_y: 22,
            },
            strategy: ScoringStrategy::ShiTomashi,
            dimensions: Dimensions {
                width: 40,
                height: 30,
            },
        }
    }

    #[test]
    fn report_lists_corners_in_order() {
        let d = detection(vec![Corner::new(12, 9, 50.5), Corner::new(25, 20, 11.0)]);
        let json: Value = serde_json::from_str(&to_json(&d, &JsonMetadata::default()).unwrap()).unwrap();

        assert_eq!(json["strategy"], "shi-tomashi");
        assert_eq!(json["dimensions"]["width"], 40);
        assert_eq!(json["region"]["max_y"], 22);
        assert_eq!(json["candidate_count"], 5);
        assert_eq!(json["corner_count"], 2);
        assert_eq!(json["corners"][0]["x"], 12);
        assert_eq!(json["corners"][0]["score"], 50.5);
        assert_eq!(json["corners"][1]["y"], 20);
    }

    #[test]
    fn metadata_is_omitted_when_absent() {
        let text = to_json(&detection(vec![]), &JsonMetadata::default()).unwrap();
        let json: Value = serde_json::from_str(&text).unwrap();
        assert!(json.get("source").is_none());
        assert!(json.get("config").is_none());
        assert_eq!(json["corners"], Value::Array(vec![]));
    }

    #[test]
    fn config_round_trips_through_report() {
        let config = DetectorConfig {
            min_distance: 4.0,
            ..DetectorConfig::with_strategy(ScoringStrategy::Fast)
        };
        let metadata = JsonMetadata {
            source: Some("checkerboard.png"),
            config: Some(&config),
        };
        let text = to_json(&detection(vec![]), &metadata).unwrap();
        let json: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(json["source"], "checkerboard.png");
        let back: DetectorConfig = serde_json::from_value(json["config"].clone()).unwrap();
        assert_eq!(back, config);
    }
}
