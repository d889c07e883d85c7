//! Software raster surface for strokes, drawn with `vello_cpu`.
//!
//! Strokes are painted as stamped discs. All discs of one curve (or one dot)
//! form a single path that is filled inside one blend layer, so overlapping
//! discs never darken each other and the stroke's composite operation applies
//! to the curve as a whole.

use autograph_core::{CompositeOperation, CssColor, CurveSegment, Point, StrokeSink, StyleSnapshot};
use image::RgbaImage;
use kurbo::ParamCurveExtrema;
use std::sync::Arc;
use vello_cpu::kurbo::{Affine, BezPath, Circle, Rect, Shape};
use vello_cpu::peniko::color::PremulRgba8;
use vello_cpu::peniko::{BlendMode, Color, Compose, ImageQuality, ImageSampler, Mix};
use vello_cpu::{Image, ImageSource, Pixmap, RenderContext};

/// Upper bound on discs stamped for one curve.
const MAX_CURVE_STEPS: usize = 1 << 16;

/// Flattening tolerance for disc outlines, in CSS pixels.
const DISC_TOLERANCE: f64 = 0.1;

/// Pixels backing a drawing area of a given CSS size and device pixel ratio.
///
/// Drawing calls take CSS pixel coordinates and are scaled by the ratio.
/// Pixels are stored premultiplied, as `vello_cpu` renders them.
pub struct RasterSurface {
    pixmap: Pixmap,
    ctx: Option<RenderContext>,
    ratio: f64,
    is_empty: bool,
}

impl std::fmt::Debug for RasterSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RasterSurface")
            .field("backing_size", &self.backing_size())
            .field("ratio", &self.ratio)
            .field("is_empty", &self.is_empty)
            .finish()
    }
}

impl RasterSurface {
    /// Create a transparent surface of `width` x `height` CSS pixels.
    pub fn new(width: f64, height: f64, ratio: f64) -> Self {
        let ratio = normalize_ratio(ratio);
        Self::with_backing(backing_len(width, ratio), backing_len(height, ratio), ratio)
    }

    fn with_backing(width: u16, height: u16, ratio: f64) -> Self {
        Self {
            pixmap: Pixmap::new(width, height),
            ctx: None,
            ratio,
            is_empty: true,
        }
    }

    /// A transparent surface with the same backing size and ratio.
    pub fn blank_like(&self) -> Self {
        Self::with_backing(self.pixmap.width(), self.pixmap.height(), self.ratio)
    }

    /// Change the displayed size. Content is always discarded.
    pub fn resize(&mut self, width: f64, height: f64, ratio: f64, background: &CssColor) {
        *self = Self::new(width, height, ratio);
        self.clear(background);
    }

    /// Fill everything with the background color and mark the surface empty.
    pub fn clear(&mut self, background: &CssColor) {
        let fill = premultiply(background.to_rgba8());
        for px in self.pixmap.data_as_u8_slice_mut().chunks_exact_mut(4) {
            px.copy_from_slice(&fill);
        }
        self.is_empty = true;
    }

    pub fn is_empty(&self) -> bool {
        self.is_empty
    }

    /// Flag pending content that is not drawn yet.
    pub fn mark_not_empty(&mut self) {
        self.is_empty = false;
    }

    pub(crate) fn set_empty(&mut self) {
        self.is_empty = true;
    }

    pub fn ratio(&self) -> f64 {
        self.ratio
    }

    /// Backing size in device pixels.
    pub fn backing_size(&self) -> (u32, u32) {
        (u32::from(self.pixmap.width()), u32::from(self.pixmap.height()))
    }

    /// Size in CSS pixels.
    pub fn css_size(&self) -> (f64, f64) {
        let (w, h) = self.backing_size();
        (w as f64 / self.ratio, h as f64 / self.ratio)
    }

    /// Straight-alpha copy of the pixels, ready for encoding.
    pub fn to_image(&self) -> RgbaImage {
        let (w, h) = self.backing_size();
        let mut bytes = self.pixmap.data_as_u8_slice().to_vec();
        for px in bytes.chunks_exact_mut(4) {
            let straight = unpremultiply([px[0], px[1], px[2], px[3]]);
            px.copy_from_slice(&straight);
        }
        RgbaImage::from_raw(w, h, bytes).unwrap_or_else(|| RgbaImage::new(w, h))
    }

    /// Device pixel at `(x, y)` in straight alpha, if inside the surface.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        let (w, h) = self.backing_size();
        if x >= w || y >= h {
            return None;
        }
        let i = (y as usize * w as usize + x as usize) * 4;
        let px = self.pixmap.data_as_u8_slice().get(i..i + 4)?;
        Some(unpremultiply([px[0], px[1], px[2], px[3]]))
    }

    /// Paint a curve as a ribbon of discs whose radius follows the widths.
    ///
    /// Discs that cannot reach the surface are skipped, and the number of
    /// discs per curve is capped.
    pub fn draw_curve(&mut self, curve: &CurveSegment, style: &StyleSnapshot) {
        let length = curve.length();
        // NaN lengths from degenerate curves saturate to zero steps.
        let steps = ((length.ceil() * 2.0) as usize).min(MAX_CURVE_STEPS);
        if steps == 0 {
            return;
        }
        self.is_empty = false;

        let margin = style.max_width + 1.0;
        let reach = self.css_bounds().inflate(margin, margin);
        if !overlaps(reach, ParamCurveExtrema::bounding_box(&curve.to_cubic())) {
            log::trace!("curve outside the surface skipped");
            return;
        }

        let width_delta = curve.end_width - curve.start_width;
        let mut path = BezPath::new();
        for i in 0..steps {
            let t = i as f64 / steps as f64;
            let width = (curve.start_width + t * t * t * width_delta).min(style.max_width);
            let center = curve.position(t);
            if reach.contains((center.x, center.y)) {
                push_disc(&mut path, center.x, center.y, width);
            }
        }
        self.fill_path(&path, style);
    }

    /// Paint a single dot.
    pub fn draw_dot(&mut self, point: &Point, style: &StyleSnapshot) {
        self.is_empty = false;
        let mut path = BezPath::new();
        push_disc(&mut path, point.x, point.y, style.dot_radius());
        self.fill_path(&path, style);
    }

    /// Draw an image scaled into a CSS pixel rectangle.
    pub fn blit(&mut self, image: &RgbaImage, x: f64, y: f64, width: f64, height: f64) {
        let (iw, ih) = image.dimensions();
        if !(width > 0.0 && height > 0.0) || iw == 0 || ih == 0 {
            return;
        }
        let Some(source) = pixmap_from_image(image) else {
            log::warn!("image of {}x{} is too large to draw", iw, ih);
            return;
        };
        let paint = Image {
            image: ImageSource::Pixmap(Arc::new(source)),
            sampler: ImageSampler::default(),
        };
        let placement = Affine::scale(self.ratio)
            * Affine::translate((x, y))
            * Affine::scale_non_uniform(width / iw as f64, height / ih as f64);

        self.paint_over(|ctx| {
            ctx.set_transform(placement);
            ctx.set_paint(paint);
            ctx.fill_rect(&Rect::new(0.0, 0.0, iw as f64, ih as f64));
        });
    }

    fn fill_path(&mut self, path: &BezPath, style: &StyleSnapshot) {
        if path.elements().is_empty() {
            return;
        }
        let [r, g, b, a] = style.pen_color.to_rgba8();
        let mode = blend_mode(style.composite_operation);
        self.paint_over(|ctx| {
            ctx.push_blend_layer(mode);
            ctx.set_paint(Color::from_rgba8(r, g, b, a));
            ctx.fill_path(path);
            ctx.pop_layer();
        });
    }

    /// Re-render the current pixels as the backdrop, then run `draw` on top
    /// in CSS pixel coordinates.
    fn paint_over(&mut self, draw: impl FnOnce(&mut RenderContext)) {
        let (width, height) = (self.pixmap.width(), self.pixmap.height());
        if width == 0 || height == 0 {
            return;
        }
        let mut ctx = match self.ctx.take() {
            Some(ctx) if ctx.width() == width && ctx.height() == height => ctx,
            _ => RenderContext::new(width, height),
        };
        ctx.reset();

        let backdrop = std::mem::replace(&mut self.pixmap, Pixmap::new(width, height));
        ctx.set_transform(Affine::IDENTITY);
        ctx.set_paint_transform(Affine::IDENTITY);
        ctx.set_paint(Image {
            image: ImageSource::Pixmap(Arc::new(backdrop)),
            sampler: ImageSampler {
                quality: ImageQuality::Low,
                ..ImageSampler::default()
            },
        });
        ctx.fill_rect(&Rect::new(0.0, 0.0, f64::from(width), f64::from(height)));

        ctx.set_transform(Affine::scale(self.ratio));
        draw(&mut ctx);

        ctx.flush();
        ctx.render_to_pixmap(&mut self.pixmap);
        self.ctx = Some(ctx);
    }

    fn css_bounds(&self) -> Rect {
        let (w, h) = self.css_size();
        Rect::new(0.0, 0.0, w, h)
    }
}

impl StrokeSink for RasterSurface {
    fn draw_curve(&mut self, curve: &CurveSegment, style: &StyleSnapshot) {
        RasterSurface::draw_curve(self, curve, style);
    }

    fn draw_dot(&mut self, point: &Point, style: &StyleSnapshot) {
        RasterSurface::draw_dot(self, point, style);
    }
}

/// Canvas composite operation as a peniko blend mode.
fn blend_mode(op: CompositeOperation) -> BlendMode {
    let (mix, compose) = match op {
        CompositeOperation::SourceOver => (Mix::Normal, Compose::SrcOver),
        CompositeOperation::SourceAtop => (Mix::Normal, Compose::SrcAtop),
        CompositeOperation::DestinationOver => (Mix::Normal, Compose::DestOver),
        CompositeOperation::DestinationOut => (Mix::Normal, Compose::DestOut),
        CompositeOperation::Lighter => (Mix::Normal, Compose::Plus),
        CompositeOperation::Xor => (Mix::Normal, Compose::Xor),
        CompositeOperation::Multiply => (Mix::Multiply, Compose::SrcOver),
        CompositeOperation::Screen => (Mix::Screen, Compose::SrcOver),
    };
    BlendMode::new(mix, compose)
}

fn push_disc(path: &mut BezPath, x: f64, y: f64, radius: f64) {
    if !x.is_finite() || !y.is_finite() || !radius.is_finite() || radius <= 0.0 {
        return;
    }
    path.extend(Circle::new((x, y), radius).path_elements(DISC_TOLERANCE));
}

/// Whether a curve's bounding box touches `reach`. Non-finite boxes never do.
fn overlaps(reach: Rect, bounds: kurbo::Rect) -> bool {
    bounds.x1 >= reach.x0 && bounds.x0 <= reach.x1 && bounds.y1 >= reach.y0 && bounds.y0 <= reach.y1
}

fn normalize_ratio(ratio: f64) -> f64 {
    if ratio.is_finite() { ratio.max(1.0) } else { 1.0 }
}

fn backing_len(css: f64, ratio: f64) -> u16 {
    let len = css * ratio;
    if len.is_finite() && len > 0.0 {
        len.min(f64::from(u16::MAX)) as u16
    } else {
        0
    }
}

fn premultiply(rgba: [u8; 4]) -> [u8; 4] {
    let [r, g, b, a] = rgba;
    let a16 = u16::from(a);
    let premul = |c: u8| -> u8 { ((u16::from(c) * a16 + 127) / 255) as u8 };
    [premul(r), premul(g), premul(b), a]
}

fn unpremultiply(rgba: [u8; 4]) -> [u8; 4] {
    let [r, g, b, a] = rgba;
    if a == 0 {
        return [0, 0, 0, 0];
    }
    let a16 = u16::from(a);
    let straight = |c: u8| -> u8 { ((u16::from(c) * 255 + a16 / 2) / a16).min(255) as u8 };
    [straight(r), straight(g), straight(b), a]
}

fn pixmap_from_image(image: &RgbaImage) -> Option<Pixmap> {
    let w = u16::try_from(image.width()).ok()?;
    let h = u16::try_from(image.height()).ok()?;
    let pixels = image
        .pixels()
        .map(|p| PremulRgba8::from_u8_array(premultiply(p.0)))
        .collect();
    Some(Pixmap::from_parts(pixels, w, h))
}

#[cfg(test)]
mod tests {
    use super::*;
    use autograph_core::SegmentWidths;
    use image::Rgba;

    fn white() -> CssColor {
        CssColor::parse("#ffffff").unwrap()
    }

    fn p(x: f64, y: f64, time: u64) -> Point {
        Point::new(x, y, 0.0, time).unwrap()
    }

    fn curve(xs: [f64; 4], y: f64) -> CurveSegment {
        let points = [p(xs[0], y, 0), p(xs[1], y, 0), p(xs[2], y, 16), p(xs[3], y, 32)];
        CurveSegment::from_points(&points, SegmentWidths { start: 2.0, end: 2.0 })
    }

    #[test]
    fn test_backing_size_follows_ratio() {
        let surface = RasterSurface::new(100.0, 50.0, 2.0);
        assert_eq!(surface.backing_size(), (200, 100));
        assert_eq!(surface.css_size(), (100.0, 50.0));

        let surface = RasterSurface::new(100.0, 50.0, 0.5);
        assert_eq!(surface.backing_size(), (100, 50));
    }

    #[test]
    fn test_resize_clears() {
        let mut surface = RasterSurface::new(20.0, 20.0, 1.0);
        surface.draw_dot(&p(10.0, 10.0, 0), &StyleSnapshot::default());
        assert!(!surface.is_empty());

        surface.resize(40.0, 30.0, 2.0, &white());
        assert!(surface.is_empty());
        assert_eq!(surface.backing_size(), (80, 60));
        assert_eq!(surface.pixel(40, 30), Some([255, 255, 255, 255]));
    }

    #[test]
    fn test_dot_is_painted() {
        let mut surface = RasterSurface::new(20.0, 20.0, 1.0);
        surface.clear(&white());
        surface.draw_dot(&p(10.0, 10.0, 0), &StyleSnapshot::default());

        assert_eq!(surface.pixel(10, 10), Some([0, 0, 0, 255]));
        assert_eq!(surface.pixel(0, 0), Some([255, 255, 255, 255]));
    }

    #[test]
    fn test_dot_on_hidpi_surface() {
        let mut surface = RasterSurface::new(20.0, 20.0, 2.0);
        surface.draw_dot(&p(10.0, 10.0, 0), &StyleSnapshot::default());
        assert_eq!(surface.pixel(20, 20), Some([0, 0, 0, 255]));
    }

    #[test]
    fn test_curve_is_painted() {
        let mut surface = RasterSurface::new(40.0, 20.0, 1.0);
        surface.draw_curve(&curve([0.0, 5.0, 20.0, 35.0], 10.0), &StyleSnapshot::default());

        assert!(!surface.is_empty());
        assert_eq!(surface.pixel(12, 10).map(|p| p[3]), Some(255));
        assert_eq!(surface.pixel(12, 2).map(|p| p[3]), Some(0));
    }

    #[test]
    fn test_non_finite_curve_is_skipped() {
        let mut surface = RasterSurface::new(20.0, 20.0, 1.0);
        let a = p(5.0, 5.0, 0);
        let curve = CurveSegment::from_points(&[a, a, a, p(9.0, 9.0, 0)], SegmentWidths { start: 1.0, end: 1.0 });
        surface.draw_curve(&curve, &StyleSnapshot::default());
        assert!(surface.to_image().pixels().all(|p| p.0[3] == 0));
    }

    #[test]
    fn test_far_away_curve_is_bounded() {
        let mut surface = RasterSurface::new(100.0, 50.0, 1.0);
        surface.draw_curve(&curve([-1e10, 0.0, 2e10, 3e10], 10.0), &StyleSnapshot::default());
        assert!(!surface.is_empty());
        assert_eq!(surface.pixel(0, 10).map(|p| p[3]), Some(255));

        let mut surface = RasterSurface::new(100.0, 50.0, 1.0);
        surface.draw_curve(&curve([9e9, 1e10, 2e10, 3e10], 10.0), &StyleSnapshot::default());
        assert!(surface.to_image().pixels().all(|p| p.0[3] == 0));
    }

    #[test]
    fn test_destination_out_erases() {
        let mut surface = RasterSurface::new(20.0, 20.0, 1.0);
        surface.clear(&white());
        let eraser = StyleSnapshot {
            composite_operation: CompositeOperation::DestinationOut,
            ..Default::default()
        };
        surface.draw_dot(&p(10.0, 10.0, 0), &eraser);
        assert_eq!(surface.pixel(10, 10).map(|p| p[3]), Some(0));
        assert_eq!(surface.pixel(0, 0).map(|p| p[3]), Some(255));
    }

    #[test]
    fn test_destination_over_keeps_backdrop() {
        let mut surface = RasterSurface::new(20.0, 20.0, 1.0);
        surface.clear(&CssColor::parse("#0000ff").unwrap());
        let under = StyleSnapshot {
            pen_color: CssColor::parse("#ff0000").unwrap(),
            composite_operation: CompositeOperation::DestinationOver,
            ..Default::default()
        };
        surface.draw_dot(&p(10.0, 10.0, 0), &under);
        assert_eq!(surface.pixel(10, 10), Some([0, 0, 255, 255]));
    }

    #[test]
    fn test_blend_modes() {
        assert_eq!(blend_mode(CompositeOperation::SourceOver), BlendMode::default());
        assert_eq!(
            blend_mode(CompositeOperation::Lighter),
            BlendMode::new(Mix::Normal, Compose::Plus)
        );
        assert_eq!(
            blend_mode(CompositeOperation::Multiply),
            BlendMode::new(Mix::Multiply, Compose::SrcOver)
        );
    }

    #[test]
    fn test_premultiply_roundtrip_opaque() {
        assert_eq!(premultiply([12, 34, 56, 255]), [12, 34, 56, 255]);
        assert_eq!(unpremultiply([12, 34, 56, 255]), [12, 34, 56, 255]);
        assert_eq!(premultiply([255, 255, 255, 0]), [0, 0, 0, 0]);
        assert_eq!(unpremultiply([128, 0, 0, 128]), [255, 0, 0, 128]);
    }

    #[test]
    fn test_blit_scales_image() {
        let mut surface = RasterSurface::new(10.0, 10.0, 2.0);
        let red = RgbaImage::from_pixel(2, 2, Rgba([255, 0, 0, 255]));
        surface.blit(&red, 0.0, 0.0, 5.0, 5.0);

        assert_eq!(surface.pixel(0, 0), Some([255, 0, 0, 255]));
        assert_eq!(surface.pixel(9, 9), Some([255, 0, 0, 255]));
        assert_eq!(surface.pixel(10, 10), Some([0, 0, 0, 0]));
    }
}
