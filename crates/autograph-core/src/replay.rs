//! Re-walking stored strokes through the smoother.

use crate::curve::CurveSegment;
use crate::document::Stroke;
use crate::point::Point;
use crate::smoothing::Smoother;
use crate::style::StyleSnapshot;

/// Something that can realize curve segments and dots.
pub trait StrokeSink {
    fn draw_curve(&mut self, curve: &CurveSegment, style: &StyleSnapshot);

    fn draw_dot(&mut self, point: &Point, style: &StyleSnapshot);
}

/// Feed every stroke through a fresh smoother and draw the result.
///
/// Strokes with several points produce their curves; single-point strokes
/// produce a dot. Empty strokes draw nothing.
pub fn replay<'a, S: StrokeSink + ?Sized>(strokes: impl IntoIterator<Item = &'a Stroke>, sink: &mut S) {
    let mut smoother = Smoother::default();
    for stroke in strokes {
        smoother.reset(&stroke.style);
        match stroke.points.as_slice() {
            [] => {}
            [point] => sink.draw_dot(point, &stroke.style),
            points => {
                for point in points {
                    if let Some(curve) = smoother.add_point(*point, &stroke.style) {
                        sink.draw_curve(&curve, &stroke.style);
                    }
                }
            }
        }
    }
}
