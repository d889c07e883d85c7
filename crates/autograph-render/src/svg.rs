//! SVG export of stroke data.
//!
//! The exporter walks stroke geometry, never raster pixels, so an export is
//! resolution independent and leaves the live surface untouched.

use autograph_core::{CssColor, CurveSegment, Point, StrokeSink, StyleSnapshot};
use std::fmt::Write;

/// Stroke width multiplier applied to the segment end width.
const PATH_WIDTH_SCALE: f64 = 2.25;

/// Builds an SVG document element by element.
#[derive(Debug, Clone)]
pub struct SvgExporter {
    width: f64,
    height: f64,
    body: String,
}

impl SvgExporter {
    /// An exporter for a drawing area of `width` x `height` CSS pixels.
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height, body: String::new() }
    }

    /// Add a full-size background rectangle. Call before drawing strokes.
    pub fn background(&mut self, color: &CssColor) {
        let _ = write!(
            self.body,
            r#"<rect width="100%" height="100%" fill="{}"></rect>"#,
            escape_attr(color.as_str())
        );
    }

    /// Close the document and return the markup.
    pub fn finish(self) -> String {
        format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" viewBox="0 0 {w} {h}" width="{w}" height="{h}">{body}</svg>"#,
            w = self.width,
            h = self.height,
            body = self.body
        )
    }
}

impl StrokeSink for SvgExporter {
    fn draw_curve(&mut self, curve: &CurveSegment, style: &StyleSnapshot) {
        if !curve.has_finite_controls() {
            log::trace!("skipping segment with non-finite control points");
            return;
        }
        let _ = write!(
            self.body,
            r#"<path d="M {:.3},{:.3} C {:.3},{:.3} {:.3},{:.3} {:.3},{:.3}" stroke-width="{:.3}" stroke="{}" fill="none" stroke-linecap="round"></path>"#,
            curve.start.x,
            curve.start.y,
            curve.control1.x,
            curve.control1.y,
            curve.control2.x,
            curve.control2.y,
            curve.end.x,
            curve.end.y,
            curve.end_width * PATH_WIDTH_SCALE,
            escape_attr(style.pen_color.as_str())
        );
    }

    fn draw_dot(&mut self, point: &Point, style: &StyleSnapshot) {
        let _ = write!(
            self.body,
            r#"<circle r="{}" cx="{}" cy="{}" fill="{}"></circle>"#,
            style.dot_radius(),
            point.x,
            point.y,
            escape_attr(style.pen_color.as_str())
        );
    }
}

fn escape_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
