//! 3×3 integer convolution restricted to the detection region.
//!
//! Produces directional derivative grids for the structure tensor.
//! Taps that fall outside the region are dropped from the sum rather
//! than padded, which biases the response along the region border.

use image::{GrayImage, ImageBuffer, Luma};

use crate::grayscale::luminance;
use crate::types::DetectionRegion;

/// A fixed 3×3 integer kernel, indexed `kernel[row][column]`.
pub type Kernel = [[i32; 3]; 3];

/// Sobel kernel for the horizontal derivative.
pub const SOBEL_X: Kernel = [[-1, 0, 1], [-2, 0, 2], [-1, 0, 1]];

/// Sobel kernel for the vertical derivative.
pub const SOBEL_Y: Kernel = [[-1, -2, -1], [0, 0, 0], [1, 2, 1]];

/// Integer derivative grid.
///
/// Sized `max_x × max_y` of the region it was computed over. Cells
/// left of `min_x` or above `min_y` exist but stay zero.
pub type DerivativeGrid = ImageBuffer<Luma<i32>, Vec<i32>>;

/// Convolve `gray` with `kernel` over `region`.
///
/// Each tap re-applies the luminance weighting to the grayscale sample
/// (treating it as an R=G=B pixel) before multiplying, so the effective
/// input is slightly darker than `gray` itself. The sum is clamped to
/// `[0, 255]`, which discards negative gradients.
#[must_use = "returns the derivative grid"]
pub fn convolve(gray: &GrayImage, kernel: &Kernel, region: DetectionRegion) -> DerivativeGrid {
    let mut out = DerivativeGrid::new(region.max_x, region.max_y);

    for (x, y) in region.pixels() {
        let mut sum = 0i32;
        for i in -1i64..=1 {
            for j in -1i64..=1 {
                let Some((sx, sy)) = offset_in_region(region, x, y, i, j) else {
                    continue;
                };
                let v = gray.get_pixel(sx, sy).0[0];
                sum += i32::from(luminance(v, v, v)) * kernel_tap(kernel, i, j);
            }
        }
        out.put_pixel(x, y, Luma([sum.clamp(0, 255)]));
    }

    out
}

/// Horizontal and vertical Sobel derivatives over `region`.
#[must_use = "returns the (dx, dy) derivative grids"]
pub fn sobel_xy(gray: &GrayImage, region: DetectionRegion) -> (DerivativeGrid, DerivativeGrid) {
    (
        convolve(gray, &SOBEL_X, region),
        convolve(gray, &SOBEL_Y, region),
    )
}

/// `(x + i, y + j)` if it lies inside the region.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn offset_in_region(region: DetectionRegion, x: u32, y: u32, i: i64, j: i64) -> Option<(u32, u32)> {
    let sx = i64::from(x) + i;
    let sy = i64::from(y) + j;
    if sx < i64::from(region.min_x)
        || sx >= i64::from(region.max_x)
        || sy < i64::from(region.min_y)
        || sy >= i64::from(region.max_y)
    {
        return None;
    }
    Some((sx as u32, sy as u32))
}

/// Kernel weight for column offset `i` and row offset `j`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
const fn kernel_tap(kernel: &Kernel, i: i64, j: i64) -> i32 {
    kernel[(j + 1) as usize][(i + 1) as usize]
}
