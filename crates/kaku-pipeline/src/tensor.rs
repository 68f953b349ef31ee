//! Gradient products and windowed structure tensor sums.
//!
//! Harris and Shi-Tomashi both start from the same per-pixel products
//! `Ixx = dx²`, `Iyy = dy²`, `Ixy = dx·dy` and differ only in how the
//! summation window sits relative to the scored pixel (see
//! [`WindowAnchor`]) and in how the resulting tensor is reduced to a
//! scalar response.

use image::{ImageBuffer, Luma};

use crate::convolution::{DerivativeGrid, sobel_xy};
use crate::types::{DetectionRegion, GrayImage};

/// Per-pixel gradient product grid.
pub type ProductGrid = ImageBuffer<Luma<i64>, Vec<i64>>;

/// Where the summation window sits relative to the scored pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowAnchor {
    /// Offsets `0..window` on both axes: the pixel is the window's
    /// top-left cell.
    TopLeft,
    /// Offsets `-window/2..=window/2` on both axes. For even windows
    /// this covers `window + 1` cells per axis.
    Centered,
}

impl WindowAnchor {
    /// Inclusive offset range along one axis.
    #[must_use]
    pub fn offsets(self, window: u32) -> std::ops::RangeInclusive<i64> {
        let w = i64::from(window);
        match self {
            Self::TopLeft => 0..=w - 1,
            Self::Centered => -(w / 2)..=w / 2,
        }
    }
}

/// Windowed sums of the gradient products at one pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StructureTensor {
    /// Σ dx².
    pub sxx: i64,
    /// Σ dy².
    pub syy: i64,
    /// Σ dx·dy.
    pub sxy: i64,
}

impl StructureTensor {
    /// `Sxx·Syy − Sxy²`.
    ///
    /// The products are formed in `i128`; large windows over strong
    /// gradients exceed `i64`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn determinant(self) -> f64 {
        let (xx, yy, xy) = (i128::from(self.sxx), i128::from(self.syy), i128::from(self.sxy));
        (xx * yy - xy * xy) as f64
    }

    /// `Sxx + Syy`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn trace(self) -> f64 {
        (i128::from(self.sxx) + i128::from(self.syy)) as f64
    }

    /// Both eigenvalues, larger first.
    #[must_use]
    pub fn eigenvalues(self) -> (f64, f64) {
        eigenvalues_from(self.trace(), self.determinant())
    }
}

/// Eigenvalues of a symmetric 2×2 matrix from its trace and
/// determinant, larger first.
///
/// The discriminant `trace² − 4·det` is clamped at zero before the
/// square root, so rounding can never produce a NaN.
#[must_use]
pub fn eigenvalues_from(trace: f64, determinant: f64) -> (f64, f64) {
    let disc = trace.mul_add(trace, -4.0 * determinant).max(0.0).sqrt();
    ((trace + disc) / 2.0, (trace - disc) / 2.0)
}

/// `Ixx`, `Iyy` and `Ixy` over the full derivative grid extent.
#[derive(Debug, Clone)]
pub struct GradientProducts {
    xx: ProductGrid,
    yy: ProductGrid,
    xy: ProductGrid,
}

impl GradientProducts {
    /// Multiply the derivative grids cell by cell.
    ///
    /// Both grids must share the same extent; `dx` defines it.
    #[must_use]
    pub fn new(dx: &DerivativeGrid, dy: &DerivativeGrid) -> Self {
        let (width, height) = dx.dimensions();
        let product = |f: fn(i64, i64) -> i64| {
            ProductGrid::from_fn(width, height, |x, y| {
                let a = i64::from(dx.get_pixel(x, y).0[0]);
                let b = dy.get_pixel_checked(x, y).map_or(0, |p| i64::from(p.0[0]));
                Luma([f(a, b)])
            })
        };
        Self {
            xx: product(|a, _| a * a),
            yy: product(|_, b| b * b),
            xy: product(|a, b| a * b),
        }
    }

    /// Sobel derivatives of `gray` over `region`, multiplied out.
    #[must_use]
    pub fn from_gray(gray: &GrayImage, region: DetectionRegion) -> Self {
        let (dx, dy) = sobel_xy(gray, region);
        Self::new(&dx, &dy)
    }

    /// Grid extent `(width, height)`.
    #[must_use]
    pub fn dimensions(&self) -> (u32, u32) {
        self.xx.dimensions()
    }

    /// Pixels with a full window available:
    /// `window <= x < width - window`, `window <= y < height - window`,
    /// rows outer.
    pub fn positions(&self, window: u32) -> impl Iterator<Item = (u32, u32)> + use<> {
        let (width, height) = self.dimensions();
        let x_end = width.saturating_sub(window);
        let y_end = height.saturating_sub(window);
        (window..y_end).flat_map(move |y| (window..x_end).map(move |x| (x, y)))
    }

    /// Sum the products over the window anchored at `(x, y)`.
    ///
    /// Cells that fall outside the grid contribute nothing.
    #[must_use]
    pub fn tensor_at(&self, x: u32, y: u32, window: u32, anchor: WindowAnchor) -> StructureTensor {
        let mut tensor = StructureTensor::default();
        for i in anchor.offsets(window) {
            for j in anchor.offsets(window) {
                let Some((cx, cy)) = shift(x, y, j, i) else {
                    continue;
                };
                let Some(xx) = self.xx.get_pixel_checked(cx, cy) else {
                    continue;
                };
                tensor.sxx += xx.0[0];
                tensor.syy += self.yy.get_pixel(cx, cy).0[0];
                tensor.sxy += self.xy.get_pixel(cx, cy).0[0];
            }
        }
        tensor
    }
}

/// `(x + dx, y + dy)` if both stay non-negative.
fn shift(x: u32, y: u32, dx: i64, dy: i64) -> Option<(u32, u32)> {
    let cx = u32::try_from(i64::from(x) + dx).ok()?;
    let cy = u32::try_from(i64::from(y) + dy).ok()?;
    Some((cx, cy))
}
