//! FAST-style ring test on the denoised grayscale grid.
//!
//! Unlike the 16-point segment test, this variant samples a fixed
//! 8-point ring approximating a radius-3 circle and only counts how
//! many samples differ strongly from the centre. No contiguity is
//! required. The structure tensor is not involved.

use tracing::debug;

use crate::denoise::sample_or_zero;
use crate::types::{Corner, DetectionRegion, Dimensions, GrayImage};

/// Ring offsets `(dx, dy)` relative to the tested pixel.
pub const RING: [(i64, i64); 8] = [
    (3, 0),
    (3, -1),
    (1, 3),
    (-1, 3),
    (-3, 0),
    (-3, -1),
    (1, -3),
    (-1, -3),
];

/// Ring samples that must exceed the threshold for a corner.
pub const MIN_RING_HITS: usize = 3;

/// Whether at least [`MIN_RING_HITS`] ring samples differ from the
/// centre by more than `threshold`.
///
/// Ring samples outside the image read as zero. Stops as soon as the
/// hit count is reached.
#[must_use]
pub fn is_corner(gray: &GrayImage, x: u32, y: u32, threshold: u8) -> bool {
    let center = sample_or_zero(gray, i64::from(x), i64::from(y));
    RING.iter()
        .filter(|(dx, dy)| {
            let v = sample_or_zero(gray, i64::from(x) + dx, i64::from(y) + dy);
            v.abs_diff(center) > threshold
        })
        .nth(MIN_RING_HITS - 1)
        .is_some()
}

/// Sum of absolute centre-to-ring differences, skipping ring points
/// outside the image.
#[must_use]
pub fn ring_score(gray: &GrayImage, x: u32, y: u32) -> u32 {
    let bounds = Dimensions::of(gray);
    let center = gray.get_pixel_checked(x, y).map_or(0, |p| p.0[0]);
    RING.iter()
        .filter_map(|&(dx, dy)| {
            let rx = u32::try_from(i64::from(x) + dx).ok()?;
            let ry = u32::try_from(i64::from(y) + dy).ok()?;
            bounds
                .contains(rx, ry)
                .then(|| u32::from(gray.get_pixel(rx, ry).0[0].abs_diff(center)))
        })
        .sum()
}

/// Ring-test candidates over the region, in scan order, scored with
/// [`ring_score`].
#[must_use = "returns the candidate list"]
pub fn candidates(gray: &GrayImage, region: DetectionRegion, threshold: u8) -> Vec<Corner> {
    let found: Vec<Corner> = region
        .pixels()
        .filter(|&(x, y)| is_corner(gray, x, y, threshold))
        .map(|(x, y)| Corner::new(x, y, f64::from(ring_score(gray, x, y))))
        .collect();
    debug!(candidates = found.len(), threshold, "fast scored");
    found
}
