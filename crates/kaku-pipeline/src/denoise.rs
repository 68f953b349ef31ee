//! Salt-and-pepper noise removal with a 3×3 median.
//!
//! The filter runs over the detection region in a single buffer,
//! row by row, left to right. Each pixel's median is written back
//! immediately, so later pixels in the scan see already-filtered
//! neighbors above and to their left. Results therefore depend on
//! scan order; this is not equivalent to a two-buffer median filter.

use image::{GrayImage, Luma};

use crate::types::DetectionRegion;

/// Replace every region pixel with the median of its 3×3 neighborhood,
/// in place and in scan order.
///
/// Neighbors just outside the region are read but never written.
/// Neighbors outside the image read as zero.
pub fn median_filter_in_place(gray: &mut GrayImage, region: DetectionRegion) {
    for (x, y) in region.pixels() {
        let mut window = [0u8; 9];
        let mut n = 0;
        for dx in -1..=1 {
            for dy in -1..=1 {
                window[n] = sample_or_zero(gray, i64::from(x) + dx, i64::from(y) + dy);
                n += 1;
            }
        }
        gray.put_pixel(x, y, Luma([median9(&mut window)]));
    }
}

/// Pixel value at a signed coordinate, or zero outside the image.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(crate) fn sample_or_zero(gray: &GrayImage, x: i64, y: i64) -> u8 {
    if x < 0 || y < 0 || x >= i64::from(gray.width()) || y >= i64::from(gray.height()) {
        return 0;
    }
    gray.get_pixel(x as u32, y as u32).0[0]
}

/// Median of nine samples.
fn median9(window: &mut [u8; 9]) -> u8 {
    window.sort_unstable();
    window[4]
}
