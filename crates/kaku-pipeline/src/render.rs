//! Burn corner markers into a copy of the original image.

use image::Rgba;
use imageproc::drawing::draw_cross_mut;

use crate::scoring::RenderBounds;
use crate::types::{Corner, DetectionRegion, Dimensions, Marker, MarkerStyle, RgbaImage};

/// Whether a marker at `corner` passes the strategy's bounds check.
///
/// Always false for pixels outside the image, even when a caller-built
/// region claims otherwise.
#[must_use]
pub const fn is_drawable(
    corner: &Corner,
    bounds: RenderBounds,
    region: DetectionRegion,
    dimensions: Dimensions,
) -> bool {
    let inside = match bounds {
        RenderBounds::Region => region.contains(corner.x, corner.y),
        RenderBounds::Image => true,
    };
    inside && dimensions.contains(corner.x, corner.y)
}

/// Number of markers [`render_overlay`] would draw.
#[must_use]
pub fn count_drawable(
    corners: &[Corner],
    bounds: RenderBounds,
    region: DetectionRegion,
    dimensions: Dimensions,
) -> usize {
    corners
        .iter()
        .filter(|c| is_drawable(c, bounds, region, dimensions))
        .count()
}

/// Copy `original` and draw a marker at each corner inside `bounds`.
///
/// Corners outside the chosen bounds are skipped silently. For
/// [`MarkerStyle::Cross`] only the centre is bounds-checked; the arms
/// are clipped to the image by `imageproc`.
#[must_use = "returns the annotated image"]
pub fn render_overlay(
    original: &RgbaImage,
    corners: &[Corner],
    bounds: RenderBounds,
    region: DetectionRegion,
    marker: Marker,
) -> RgbaImage {
    let mut out = original.clone();
    let dimensions = Dimensions::of(original);
    let color = Rgba(marker.color);

    for corner in corners
        .iter()
        .filter(|c| is_drawable(c, bounds, region, dimensions))
    {
        match marker.style {
            MarkerStyle::Pixel => out.put_pixel(corner.x, corner.y, color),
            MarkerStyle::Cross => {
                let (Ok(x), Ok(y)) = (i32::try_from(corner.x), i32::try_from(corner.y)) else {
                    continue;
                };
                draw_cross_mut(&mut out, color, x, y);
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgba<u8> = Rgba(Marker::RED);

    fn checkerboard() -> RgbaImage {
        RgbaImage::from_fn(12, 10, |x, y| {
            if (x + y) % 2 == 0 {
                Rgba([20, 40, 60, 255])
            } else {
                Rgba([200, 180, 160, 128])
            }
        })
    }

    fn region() -> DetectionRegion {
        DetectionRegion {
            min_x: 3,
            min_y: 2,
            max_x: 9,
            max_y: 7,
        }
    }

    fn red_pixels(image: &RgbaImage) -> Vec<(u32, u32)> {
        image
            .enumerate_pixels()
            .filter(|(_, _, p)| **p == RED)
            .map(|(x, y, _)| (x, y))
            .collect()
    }

    #[test]
    fn empty_corner_list_is_identity() {
        let original = checkerboard();
        for bounds in [RenderBounds::Region, RenderBounds::Image] {
            let out = render_overlay(&original, &[], bounds, region(), Marker::default());
            assert_eq!(out, original);
        }
    }

    #[test]
    fn pixel_marker_overwrites_exactly_one_pixel() {
        let original = checkerboard();
        let out = render_overlay(
            &original,
            &[Corner::new(4, 3, 1.0)],
            RenderBounds::Image,
            region(),
            Marker::default(),
        );
        assert_eq!(red_pixels(&out), vec![(4, 3)]);
        for (x, y, p) in out.enumerate_pixels() {
            if (x, y) != (4, 3) {
                assert_eq!(p, original.get_pixel(x, y));
            }
        }
    }

    #[test]
    fn region_bounds_skip_corners_outside_region() {
        let corners = [Corner::new(1, 1, 0.0), Corner::new(5, 5, 0.0), Corner::new(9, 2, 0.0)];
        let out = render_overlay(
            &checkerboard(),
            &corners,
            RenderBounds::Region,
            region(),
            Marker::default(),
        );
        assert_eq!(red_pixels(&out), vec![(5, 5)]);
    }

    #[test]
    fn image_bounds_draw_outside_region() {
        let corners = [Corner::new(1, 1, 0.0), Corner::new(5, 5, 0.0), Corner::new(50, 2, 0.0)];
        let out = render_overlay(
            &checkerboard(),
            &corners,
            RenderBounds::Image,
            region(),
            Marker::default(),
        );
        assert_eq!(red_pixels(&out), vec![(1, 1), (5, 5)]);
    }

    #[test]
    fn drawable_count_matches_rendered_markers() {
        let corners = [Corner::new(1, 1, 0.0), Corner::new(5, 5, 0.0), Corner::new(50, 2, 0.0)];
        let dims = Dimensions::of(&checkerboard());
        assert_eq!(count_drawable(&corners, RenderBounds::Image, region(), dims), 2);
        assert_eq!(count_drawable(&corners, RenderBounds::Region, region(), dims), 1);
    }

    #[test]
    fn oversized_region_never_writes_out_of_range() {
        let wide = DetectionRegion {
            min_x: 0,
            min_y: 0,
            max_x: 100,
            max_y: 100,
        };
        let out = render_overlay(
            &checkerboard(),
            &[Corner::new(60, 60, 0.0)],
            RenderBounds::Region,
            wide,
            Marker::default(),
        );
        assert!(red_pixels(&out).is_empty());
    }

    #[test]
    fn cross_marker_draws_arms() {
        let original = RgbaImage::from_pixel(9, 9, Rgba([0, 0, 0, 255]));
        let marker = Marker {
            color: Marker::RED,
            style: MarkerStyle::Cross,
        };
        let out = render_overlay(
            &original,
            &[Corner::new(4, 4, 0.0)],
            RenderBounds::Image,
            region(),
            marker,
        );
        for (x, y) in [(4, 4), (3, 4), (5, 4), (4, 3), (4, 5)] {
            assert_eq!(*out.get_pixel(x, y), RED, "({x},{y})");
        }
        assert_eq!(*out.get_pixel(3, 3), Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn custom_color_is_used() {
        let marker = Marker {
            color: [0, 255, 0, 255],
            style: MarkerStyle::Pixel,
        };
        let out = render_overlay(
            &checkerboard(),
            &[Corner::new(6, 4, 0.0)],
            RenderBounds::Region,
            region(),
            marker,
        );
        assert_eq!(*out.get_pixel(6, 4), Rgba([0, 255, 0, 255]));
    }
}
