//! kaku-export: Pure format serializers (sans-IO)
//!
//! Converts detection output into files a caller can write: the
//! annotated raster as PNG bytes, the corner list as JSON, and a
//! vector overlay of the corners as SVG.

pub mod json;
pub mod png;
pub mod svg;

pub use json::{JsonMetadata, to_json};
pub use png::to_png;
pub use svg::{SvgMetadata, to_svg};

/// Errors raised while serializing detection output.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// PNG encoding of the annotated image failed.
    #[error("failed to encode PNG: {0}")]
    Png(#[from] image::ImageError),

    /// JSON serialization of the corner report failed.
    #[error("failed to serialize JSON: {0}")]
    Json(#[from] serde_json::Error),
}
