//! Harris corner response.
//!
//! Scores `r = det(M) − k·trace(M)` over a window whose top-left cell
//! is the scored pixel. Note the trace is *not* squared, and a pixel
//! becomes a candidate when its response falls **below** the
//! threshold, so flat and edge-like areas qualify while strong corners
//! (large determinant) do not. Both conventions are kept as they are;
//! Shi-Tomashi uses the opposite comparison.

use tracing::debug;

use crate::tensor::{GradientProducts, StructureTensor, WindowAnchor};
use crate::types::{Corner, DetectionRegion, GrayImage};

/// Harris response for one tensor.
#[must_use]
pub fn response(tensor: StructureTensor, k: f64) -> f64 {
    k.mul_add(-tensor.trace(), tensor.determinant())
}

/// Candidates in scan order (rows outer), unsorted.
#[must_use = "returns the candidate list"]
pub fn candidates(
    gray: &GrayImage,
    region: DetectionRegion,
    window: u32,
    k: f64,
    threshold: f64,
) -> Vec<Corner> {
    let products = GradientProducts::from_gray(gray, region);
    let found: Vec<Corner> = products
        .positions(window)
        .filter_map(|(x, y)| {
            let r = response(products.tensor_at(x, y, window, WindowAnchor::TopLeft), k);
            (r < threshold).then_some(Corner::new(x, y, r))
        })
        .collect();
    debug!(candidates = found.len(), window, k, threshold, "harris scored");
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{prepare, white_square};

    #[test]
    fn response_uses_unsquared_trace() {
        let t = StructureTensor { sxx: 100, syy: 50, sxy: 10 };
        // det = 4900, trace = 150
        assert!((response(t, 0.04) - (4900.0 - 6.0)).abs() < 1e-9);
    }

    #[test]
    fn flat_tensor_scores_zero() {
        assert!(response(StructureTensor::default(), 0.04).abs() < f64::EPSILON);
    }

    #[test]
    fn flat_image_everywhere_below_threshold() {
        // A flat image yields r = 0 < 10 at every scanned position.
        let image = white_square(20, 0, 0);
        let (gray, region) = prepare(&image);
        let found = candidates(&gray, region, 3, 0.04, 10.0);
        // Grid is 15x15; positions 3..12 on both axes.
        assert_eq!(found.len(), 9 * 9);
        assert!(found.iter().all(|c| c.score.abs() < f64::EPSILON));
    }

    #[test]
    fn small_square_candidates() {
        let (gray, region) = prepare(&white_square(16, 6, 10));
        let found = candidates(&gray, region, 3, 0.04, 10.0);
        assert_eq!(found.len(), 15);

        // Scan order, rows outer.
        let positions: Vec<_> = found.iter().map(|c| (c.x, c.y)).collect();
        assert_eq!(
            positions,
            vec![
                (3, 3),
                (4, 3),
                (8, 3),
                (3, 4),
                (4, 4),
                (8, 4),
                (8, 5),
                (8, 6),
                (8, 7),
                (3, 8),
                (4, 8),
                (5, 8),
                (6, 8),
                (7, 8),
                (8, 8),
            ]
        );
        assert!((found[6].score - -16804.0).abs() < 1e-6);
        assert!(found.iter().all(|c| c.score < 10.0));
    }

    #[test]
    fn larger_threshold_admits_more() {
        let (gray, region) = prepare(&white_square(16, 6, 10));
        let strict = candidates(&gray, region, 3, 0.04, 10.0).len();
        let loose = candidates(&gray, region, 3, 0.04, f64::MAX).len();
        assert!(loose > strict);
        // Grid is 12x12, so positions 3..9 on both axes.
        assert_eq!(loose, 36);
    }

    #[test]
    fn oversized_window_yields_nothing() {
        let (gray, region) = prepare(&white_square(16, 6, 10));
        assert!(candidates(&gray, region, 6, 0.04, 10.0).is_empty());
    }
}
