//! Shi-Tomashi minimum-eigenvalue response.
//!
//! Sums the gradient products over a window centred on the scored
//! pixel and keeps pixels whose smaller tensor eigenvalue exceeds the
//! threshold.

use tracing::debug;

use crate::tensor::{GradientProducts, StructureTensor, WindowAnchor};
use crate::types::{Corner, DetectionRegion, GrayImage};

/// Smaller eigenvalue of the structure tensor.
#[must_use]
pub fn response(tensor: StructureTensor) -> f64 {
    let (hi, lo) = tensor.eigenvalues();
    hi.min(lo)
}

/// Candidates in scan order (rows outer), unsorted.
#[must_use = "returns the candidate list"]
pub fn candidates(
    gray: &GrayImage,
    region: DetectionRegion,
    window: u32,
    threshold: f64,
) -> Vec<Corner> {
    let products = GradientProducts::from_gray(gray, region);
    let found: Vec<Corner> = products
        .positions(window)
        .filter_map(|(x, y)| {
            let r = response(products.tensor_at(x, y, window, WindowAnchor::Centered));
            (r > threshold).then_some(Corner::new(x, y, r))
        })
        .collect();
    debug!(candidates = found.len(), window, threshold, "shi-tomashi scored");
    found
}
