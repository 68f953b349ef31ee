//! SVG export serializer.
//!
//! Renders detected corners as a vector overlay built with the [`svg`]
//! crate. The `viewBox` matches the source image in pixels, so the
//! overlay can be stacked directly on top of the original raster.
//!
//! Each corner becomes a `<circle>` centred on the pixel centre, with
//! its score kept in a `data-score` attribute.
//!
//! This is a pure function with no I/O -- it returns a `String`.

use svg::Document;
use svg::node::element::{Circle, Description, Element, Group, Title};
use svg::node::{Node, Text};

use kaku_pipeline::{Corner, Dimensions};

/// Circle radius in pixels.
const MARKER_RADIUS: f64 = 3.0;

/// Stroke colour for corner circles.
const MARKER_STROKE: &str = "red";

/// Metadata to embed in the SVG document.
///
/// All fields are optional. Text values are XML-escaped automatically
/// by the `svg` crate.
#[derive(Debug, Clone, Default)]
pub struct SvgMetadata<'a> {
    /// Document title, emitted as `<title>`.
    ///
    /// Typically the source image filename.
    pub title: Option<&'a str>,

    /// Document description, emitted as `<desc>`.
    pub description: Option<&'a str>,

    /// Serialized detector configuration, emitted inside
    /// `<metadata><kaku:detector>` for reproducibility.
    pub config_json: Option<&'a str>,
}

/// Serialize corners into an SVG overlay string.
///
/// The document is `dimensions.width × dimensions.height` pixels. An
/// empty corner list yields a valid document with no circles.
#[must_use]
pub fn to_svg(corners: &[Corner], dimensions: Dimensions, metadata: &SvgMetadata<'_>) -> String {
    let w = dimensions.width;
    let h = dimensions.height;
    let mut doc = Document::new()
        .set("width", w)
        .set("height", h)
        .set("viewBox", (0, 0, w, h));

    if let Some(title) = metadata.title {
        doc = doc.add(Title::new(title));
    }

    if let Some(description) = metadata.description {
        doc = doc.add(Description::new().add(Text::new(description)));
    }

    if let Some(config_json) = metadata.config_json {
        let mut detector_el = Element::new("kaku:detector");
        detector_el.assign("xmlns:kaku", "https://github.com/kaku-rs/kaku/ns/1");
        detector_el.append(Text::new(config_json));
        let mut metadata_el = Element::new("metadata");
        metadata_el.append(detector_el);
        doc = doc.add(metadata_el);
    }

    if !corners.is_empty() {
        let mut group = Group::new()
            .set("id", "corners")
            .set("fill", "none")
            .set("stroke", MARKER_STROKE)
            .set("stroke-width", 1);
        for corner in corners {
            group = group.add(corner_circle(corner));
        }
        doc = doc.add(group);
    }

    // The svg crate omits the XML declaration, so we prepend it.
    format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{doc}\n")
}

/// One circle centred on the middle of the corner's pixel.
fn corner_circle(corner: &Corner) -> Circle {
    Circle::new()
        .set("cx", f64::from(corner.x) + 0.5)
        .set("cy", f64::from(corner.y) + 0.5)
        .set("r", MARKER_RADIUS)
        .set("data-score", corner.score)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dims(width: u32, height: u32) -> Dimensions {
        Dimensions { width, height }
    }

    fn no_meta() -> SvgMetadata<'static> {
        SvgMetadata::default()
    }

    #[test]
    fn empty_corners_produce_valid_svg_without_circles() {
        let svg = to_svg(&[], dims(100, 50), &no_meta());
        assert!(svg.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
        assert!(svg.contains(r#"width="100""#));
        assert!(svg.contains(r#"height="50""#));
        assert!(svg.contains(r#"viewBox="0 0 100 50""#));
        assert!(!svg.contains("<circle"));
        assert!(svg.trim_end().ends_with("/>"));
    }

    #[test]
    fn one_circle_per_corner() {
        let corners = [
            Corner::new(4, 7, 12.0),
            Corner::new(20, 9, 8.0),
            Corner::new(31, 2, 1.0),
        ];
        let svg = to_svg(&corners, dims(40, 20), &no_meta());
        assert_eq!(svg.matches("<circle").count(), 3);
        assert_eq!(svg.matches("<g ").count(), 1);
        assert!(svg.contains(r#"id="corners""#));
        assert!(svg.contains(r#"stroke="red""#));
    }

    #[test]
    fn circle_is_centred_on_pixel() {
        let svg = to_svg(&[Corner::new(4, 7, 12.5)], dims(40, 20), &no_meta());
        assert!(svg.contains(r#"cx="4.5""#));
        assert!(svg.contains(r#"cy="7.5""#));
        assert!(svg.contains(r#"r="3""#));
        assert!(svg.contains(r#"data-score="12.5""#));
    }

    #[test]
    fn metadata_elements_are_emitted_and_escaped() {
        let meta = SvgMetadata {
            title: Some("a<b>.png"),
            description: Some("harris & friends"),
            config_json: Some(r#"{"window":3}"#),
        };
        let svg = to_svg(&[], dims(10, 10), &meta);
        assert!(svg.contains("<title>a&lt;b&gt;.png</title>"));
        assert!(svg.contains("<desc>harris &amp; friends</desc>"));
        assert!(svg.contains("<metadata>"));
        assert!(svg.contains("kaku:detector"));
        assert!(svg.contains("window"));
    }

    #[test]
    fn metadata_is_omitted_by_default() {
        let svg = to_svg(&[Corner::new(1, 1, 0.0)], dims(10, 10), &no_meta());
        assert!(!svg.contains("<title>"));
        assert!(!svg.contains("<desc>"));
        assert!(!svg.contains("<metadata>"));
    }
}
