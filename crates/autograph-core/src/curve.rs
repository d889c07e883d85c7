//! Cubic Bezier segments fitted through consecutive samples.

use crate::point::Point;
use kurbo::{CubicBez, ParamCurve};

/// Number of chords used to approximate a segment's length.
const LENGTH_STEPS: usize = 10;

/// Start and end widths of a segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentWidths {
    pub start: f64,
    pub end: f64,
}

/// A variable-width cubic Bezier spanning two accepted samples.
///
/// Control points are plain kurbo points: degenerate input (repeated samples)
/// can make them non-finite, which renderers must tolerate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurveSegment {
    pub start: Point,
    pub control1: kurbo::Point,
    pub control2: kurbo::Point,
    pub end: Point,
    pub start_width: f64,
    pub end_width: f64,
}

impl CurveSegment {
    /// Fit the segment `points[1] -> points[2]` of a four-point window.
    pub fn from_points(points: &[Point; 4], widths: SegmentWidths) -> Self {
        let (_, c2) = Self::control_points(&points[0], &points[1], &points[2]);
        let (c3, _) = Self::control_points(&points[1], &points[2], &points[3]);
        Self {
            start: points[1],
            control1: c2,
            control2: c3,
            end: points[2],
            start_width: widths.start,
            end_width: widths.end,
        }
    }

    /// Control points around `s2` for the triad `(s1, s2, s3)`.
    ///
    /// The midpoints of both chords are blended by chord length, and the
    /// offset from that blend to `s2` is applied to both midpoints.
    pub fn control_points(s1: &Point, s2: &Point, s3: &Point) -> (kurbo::Point, kurbo::Point) {
        let (p1, p2, p3) = (s1.position(), s2.position(), s3.position());
        let m1 = p1.midpoint(p2);
        let m2 = p2.midpoint(p3);
        let l1 = p1.distance(p2);
        let l2 = p2.distance(p3);

        let k = l2 / (l1 + l2);
        let cm = m2 + (m1 - m2) * k;
        let t = p2 - cm;

        (m1 + t, m2 + t)
    }

    /// The segment as a kurbo cubic.
    pub fn to_cubic(&self) -> CubicBez {
        CubicBez::new(self.start.position(), self.control1, self.control2, self.end.position())
    }

    /// Position at parameter `t` in `[0, 1]`.
    pub fn position(&self, t: f64) -> kurbo::Point {
        self.to_cubic().eval(t)
    }

    /// Approximate arc length from a fixed polyline subdivision.
    pub fn length(&self) -> f64 {
        let cubic = self.to_cubic();
        let mut length = 0.0;
        let mut previous = cubic.eval(0.0);
        for i in 1..=LENGTH_STEPS {
            let current = cubic.eval(i as f64 / LENGTH_STEPS as f64);
            length += previous.distance(current);
            previous = current;
        }
        length
    }

    pub fn has_finite_controls(&self) -> bool {
        self.control1.is_finite() && self.control2.is_finite()
    }
}
