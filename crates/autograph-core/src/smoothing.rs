//! Velocity-weighted smoothing of raw samples into Bezier segments.
//!
//! The smoother keeps a sliding window of the last accepted samples. Once the
//! window holds four points it emits the segment between the middle two,
//! with a width derived from the filtered pen velocity: fast movement draws
//! thin lines, slow movement thick ones.

use crate::curve::{CurveSegment, SegmentWidths};
use crate::point::Point;
use crate::style::StyleSnapshot;

/// Number of samples needed to fit a segment.
const WINDOW: usize = 4;

/// Per-stroke smoothing state. Not persisted.
#[derive(Debug, Clone, Default)]
pub struct Smoother {
    window: Vec<Point>,
    last_velocity: f64,
    last_width: f64,
}

impl Smoother {
    pub fn new(style: &StyleSnapshot) -> Self {
        let mut smoother = Self::default();
        smoother.reset(style);
        smoother
    }

    /// Forget the previous stroke.
    pub fn reset(&mut self, style: &StyleSnapshot) {
        self.window.clear();
        self.last_velocity = 0.0;
        self.last_width = style.mid_width();
    }

    /// Feed an accepted sample; returns a segment once enough history exists.
    ///
    /// The third sample of a stroke duplicates the first one so the curve
    /// starts at the first sample instead of lagging one point behind.
    pub fn add_point(&mut self, point: Point, style: &StyleSnapshot) -> Option<CurveSegment> {
        self.window.push(point);
        if self.window.len() < 3 {
            return None;
        }
        if self.window.len() == 3 {
            self.window.insert(0, self.window[0]);
        }

        let points: [Point; WINDOW] = [self.window[0], self.window[1], self.window[2], self.window[3]];
        let widths = self.curve_widths(&points[1], &points[2], style);
        let curve = CurveSegment::from_points(&points, widths);
        self.window.remove(0);
        Some(curve)
    }

    fn curve_widths(&mut self, start: &Point, end: &Point, style: &StyleSnapshot) -> SegmentWidths {
        let weight = style.velocity_filter_weight;
        let velocity = weight * end.velocity_from(start) + (1.0 - weight) * self.last_velocity;
        let width = stroke_width(velocity, style);

        let widths = SegmentWidths { start: self.last_width, end: width };
        self.last_velocity = velocity;
        self.last_width = width;
        widths
    }

    pub fn last_velocity(&self) -> f64 {
        self.last_velocity
    }

    pub fn last_width(&self) -> f64 {
        self.last_width
    }

    /// Number of samples currently held.
    pub fn window_len(&self) -> usize {
        self.window.len()
    }
}

/// Line width for a filtered velocity, floored at `min_width`.
pub fn stroke_width(velocity: f64, style: &StyleSnapshot) -> f64 {
    (style.max_width / (velocity + 1.0)).max(style.min_width)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64, time: u64) -> Point {
        Point::new(x, y, 0.0, time).unwrap()
    }

    #[test]
    fn test_no_segment_before_third_point() {
        let style = StyleSnapshot::default();
        let mut smoother = Smoother::new(&style);

        assert!(smoother.add_point(p(0.0, 0.0, 0), &style).is_none());
        assert!(smoother.add_point(p(10.0, 0.0, 16), &style).is_none());
        let curve = smoother.add_point(p(20.0, 0.0, 32), &style);
        assert!(curve.is_some());

        // The first segment starts at the first sample thanks to the duplicate.
        let curve = curve.unwrap();
        assert_eq!(curve.start, p(0.0, 0.0, 0));
        assert_eq!(curve.end, p(10.0, 0.0, 16));
        assert_eq!(smoother.window_len(), 3);
    }

    #[test]
    fn test_window_slides() {
        let style = StyleSnapshot::default();
        let mut smoother = Smoother::new(&style);
        for i in 0..10 {
            smoother.add_point(p(i as f64 * 10.0, 0.0, i * 16), &style);
            assert!(smoother.window_len() <= WINDOW);
        }
    }

    #[test]
    fn test_filtered_velocity_with_full_weight() {
        let style = StyleSnapshot { velocity_filter_weight: 1.0, ..Default::default() };
        let mut smoother = Smoother::new(&style);

        smoother.add_point(p(0.0, 0.0, 0), &style);
        smoother.add_point(p(50.0, 0.0, 100), &style);
        smoother.add_point(p(100.0, 0.0, 200), &style);

        assert!((smoother.last_velocity() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_width_continuity() {
        let style = StyleSnapshot::default();
        let mut smoother = Smoother::new(&style);
        let mut previous_end = style.mid_width();
        for i in 0..8u64 {
            if let Some(curve) = smoother.add_point(p(i as f64 * 12.0, (i % 3) as f64, i * 10), &style) {
                assert!((curve.start_width - previous_end).abs() < f64::EPSILON);
                previous_end = curve.end_width;
            }
        }
    }

    #[test]
    fn test_width_bounds() {
        let style = StyleSnapshot::default();
        for velocity in [0.0, 0.01, 0.5, 1.0, 3.0, 100.0, 1e9] {
            let width = stroke_width(velocity, &style);
            assert!(width >= style.min_width);
            assert!(width <= style.max_width);
        }
    }

    #[test]
    fn test_backwards_timestamps_stay_within_max_width() {
        let style = StyleSnapshot::default();
        let mut smoother = Smoother::new(&style);
        let mut widths = Vec::new();
        for (i, time) in [100u64, 80, 60, 40].into_iter().enumerate() {
            if let Some(curve) = smoother.add_point(p(i as f64 * 20.0, 0.0, time), &style) {
                widths.push(curve.start_width);
                widths.push(curve.end_width);
            }
        }
        assert!(!widths.is_empty());
        assert!(widths.iter().all(|w| *w <= style.max_width));
    }

    #[test]
    fn test_reset_restores_mid_width() {
        let style = StyleSnapshot::default();
        let mut smoother = Smoother::new(&style);
        smoother.add_point(p(0.0, 0.0, 0), &style);
        smoother.add_point(p(100.0, 0.0, 1), &style);
        smoother.add_point(p(200.0, 0.0, 2), &style);
        assert!(smoother.last_velocity() > 0.0);

        smoother.reset(&style);
        assert_eq!(smoother.window_len(), 0);
        assert_eq!(smoother.last_velocity(), 0.0);
        assert!((smoother.last_width() - style.mid_width()).abs() < f64::EPSILON);
    }
}
