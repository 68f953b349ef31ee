//! Synthetic images shared by the unit tests.

use image::Rgba;

use crate::denoise::median_filter_in_place;
use crate::grayscale::to_grayscale;
use crate::types::{DetectionRegion, Dimensions, GrayImage, RgbaImage};

/// `size × size` black image with a white square covering `[lo, hi)` on both axes.
pub fn white_square(size: u32, lo: u32, hi: u32) -> RgbaImage {
    RgbaImage::from_fn(size, size, |x, y| {
        if (lo..hi).contains(&x) && (lo..hi).contains(&y) {
            Rgba([255, 255, 255, 255])
        } else {
            Rgba([0, 0, 0, 255])
        }
    })
}

/// Grayscale plus in-place median over the default central region.
#[allow(clippy::unwrap_used)]
pub fn prepare(image: &RgbaImage) -> (GrayImage, DetectionRegion) {
    let region = DetectionRegion::centered(Dimensions::of(image), 0.5).unwrap();
    let mut gray = to_grayscale(image);
    median_filter_in_place(&mut gray, region);
    (gray, region)
}
