//! The signature pad session: input in, strokes and pixels out.
//!
//! [`SignaturePad`] owns the stroke document, the live raster surface and the
//! per-stroke smoothing state. Input arrives either as already-normalized
//! samples ([`SignaturePad::begin_stroke`] and friends) or as raw host events
//! through [`SignaturePad::handle_input`], which applies the move throttle.

use crate::codec::{decode_image, encode_raster, parse_data_url, to_data_url};
use crate::raster::RasterSurface;
use crate::renderer::{BoxFuture, ExportColors, ExportFormat, RasterFormat, RenderResult};
use crate::svg::SvgExporter;
use autograph_core::{
    CssColor, Document, EventListeners, InputEvent, InputSample, PadOptions, PlatformCapabilities, Point,
    PointError, PointerAdapter, SessionEvent, Smoother, Stroke, StrokeCommand, StrokeRecord, StyleSnapshot,
    Throttle, replay,
};
use std::sync::mpsc::Receiver;

/// Placement of a preloaded image, in CSS pixels.
///
/// Missing sizes stretch the image over the whole surface.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ImageOptions {
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub x_offset: f64,
    pub y_offset: f64,
}

/// What happened to one raw input event.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InputOutcome {
    /// Command that was applied to the document.
    pub applied: Option<StrokeCommand>,
    /// A move was held back by the throttle; see [`SignaturePad::tick`].
    pub deferred: bool,
    /// The host should suppress default gesture handling.
    pub prevent_default: bool,
}

impl InputOutcome {
    pub fn ended_stroke(&self) -> bool {
        matches!(self.applied, Some(StrokeCommand::End(_)))
    }
}

/// A signature capture session.
#[derive(Debug)]
pub struct SignaturePad {
    options: PadOptions,
    document: Document,
    smoother: Smoother,
    surface: RasterSurface,
    adapter: PointerAdapter,
    throttle: Throttle<InputSample>,
    listeners: EventListeners,
    /// A stroke was begun and not ended (or cleared) yet.
    stroke_open: bool,
    clear_on_begin: bool,
    /// Client position of the surface's top-left corner.
    origin: kurbo::Point,
}

impl SignaturePad {
    /// A pad of `width` x `height` CSS pixels listening to pointer events.
    pub fn new(options: PadOptions, width: f64, height: f64, ratio: f64) -> Self {
        let caps = PlatformCapabilities {
            pointer_events: true,
            ..Default::default()
        };
        Self::with_capabilities(options, width, height, ratio, caps)
    }

    /// A pad whose input modality is picked from the platform capabilities.
    pub fn with_capabilities(
        options: PadOptions,
        width: f64,
        height: f64,
        ratio: f64,
        caps: PlatformCapabilities,
    ) -> Self {
        let mut pad = Self {
            smoother: Smoother::new(&options.style),
            surface: RasterSurface::new(width, height, ratio),
            adapter: PointerAdapter::for_platform(caps),
            throttle: Throttle::new(options.throttle_ms),
            listeners: EventListeners::new(),
            document: Document::new(),
            stroke_open: false,
            clear_on_begin: false,
            origin: kurbo::Point::ZERO,
            options,
        };
        pad.clear();
        pad
    }

    pub fn options(&self) -> &PadOptions {
        &self.options
    }

    /// Style captured by the next stroke.
    pub fn style(&self) -> &StyleSnapshot {
        &self.options.style
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn surface(&self) -> &RasterSurface {
        &self.surface
    }

    pub fn is_empty(&self) -> bool {
        self.surface.is_empty()
    }

    pub fn is_enabled(&self) -> bool {
        self.adapter.is_enabled()
    }

    /// Client position of the surface, subtracted from every sample.
    pub fn set_origin(&mut self, x: f64, y: f64) {
        self.origin = kurbo::Point::new(x, y);
    }

    /// Register a callback for stroke lifecycle events.
    pub fn add_listener(&mut self, listener: impl FnMut(&SessionEvent) + 'static) {
        self.listeners.add_listener(listener);
    }

    /// Receive stroke lifecycle events over a channel.
    pub fn subscribe(&mut self) -> Receiver<SessionEvent> {
        self.listeners.subscribe()
    }

    /// Start handling input.
    pub fn on(&mut self) {
        self.adapter.enable();
    }

    /// Stop handling input.
    pub fn off(&mut self) {
        self.adapter.disable();
        self.throttle.cancel();
    }

    /// Empty the document and paint the background.
    pub fn clear(&mut self) {
        self.document.clear();
        self.reset_surface();
        log::debug!("pad cleared");
    }

    /// Have the next begun stroke clear the surface first.
    pub fn clear_on_next_begin(&mut self) {
        self.clear_on_begin = true;
    }

    /// Feed one raw host event.
    pub fn handle_input(&mut self, event: &InputEvent) -> Result<InputOutcome, PointError> {
        let output = self.adapter.handle(event);
        let mut outcome = InputOutcome {
            prevent_default: output.prevent_default,
            ..Default::default()
        };

        match output.command {
            None => {}
            Some(StrokeCommand::Begin(sample)) => {
                self.begin_stroke(sample)?;
                outcome.applied = output.command;
            }
            Some(StrokeCommand::Move(sample)) => match self.throttle.call(sample.time, sample) {
                Some(sample) => {
                    self.update_stroke(sample)?;
                    outcome.applied = Some(StrokeCommand::Move(sample));
                }
                None => outcome.deferred = self.throttle.is_pending(),
            },
            Some(StrokeCommand::End(sample)) => {
                self.end_stroke(sample)?;
                outcome.applied = output.command;
            }
        }
        Ok(outcome)
    }

    /// Run a throttled move whose deadline has passed.
    pub fn tick(&mut self, now: u64) -> Result<Option<InputSample>, PointError> {
        match self.throttle.poll(now) {
            Some(sample) => {
                self.update_stroke(sample)?;
                Ok(Some(sample))
            }
            None => Ok(None),
        }
    }

    /// When [`SignaturePad::tick`] next has work to do.
    pub fn next_deadline(&self) -> Option<u64> {
        self.throttle.deadline()
    }

    /// Open a new stroke with the current style.
    pub fn begin_stroke(&mut self, sample: InputSample) -> Result<(), PointError> {
        let point = self.to_point(&sample)?;
        self.listeners.emit(SessionEvent::BeginStroke(sample));

        if std::mem::take(&mut self.clear_on_begin) {
            self.clear();
        }

        let style = self.options.style.clone();
        self.smoother.reset(&style);
        self.document.push(Stroke::new(style));
        self.stroke_open = true;
        log::debug!("stroke {} begun", self.document.len());

        self.update_open_stroke(sample, point);
        Ok(())
    }

    /// Add a sample to the open stroke, beginning one if none is open.
    pub fn update_stroke(&mut self, sample: InputSample) -> Result<(), PointError> {
        let point = self.to_point(&sample)?;
        if !self.stroke_open {
            return self.begin_stroke(sample);
        }
        self.update_open_stroke(sample, point);
        Ok(())
    }

    /// Add the final sample and close the stroke.
    pub fn end_stroke(&mut self, sample: InputSample) -> Result<(), PointError> {
        self.throttle.cancel();
        self.update_stroke(sample)?;
        self.stroke_open = false;
        self.listeners.emit(SessionEvent::EndStroke(sample));
        log::debug!("stroke {} ended", self.document.len());
        Ok(())
    }

    fn update_open_stroke(&mut self, sample: InputSample, point: Point) {
        self.listeners.emit(SessionEvent::BeforeUpdateStroke(sample));

        if let Some(stroke) = self.document.last_mut() {
            let last = stroke.last_point().copied();
            match last {
                Some(last) if point.distance_to(&last) <= self.options.min_distance => {
                    log::trace!("sample at ({}, {}) too close, dropped", point.x, point.y);
                }
                _ => {
                    let curve = self.smoother.add_point(point, &stroke.style);
                    match (last, curve) {
                        (None, _) => self.surface.draw_dot(&point, &stroke.style),
                        (Some(_), Some(curve)) => self.surface.draw_curve(&curve, &stroke.style),
                        (Some(_), None) => {}
                    }
                    stroke.points.push(point);
                }
            }
        }

        self.listeners.emit(SessionEvent::AfterUpdateStroke(sample));
    }

    fn to_point(&self, sample: &InputSample) -> Result<Point, PointError> {
        Point::new(sample.x - self.origin.x, sample.y - self.origin.y, sample.pressure, sample.time)
    }

    /// Drop the last stroke and redraw the rest. Does nothing when empty.
    pub fn undo(&mut self) -> Option<Stroke> {
        let removed = self.document.pop();
        match &removed {
            Some(_) => {
                self.redraw();
                log::debug!("undo, {} strokes left", self.document.len());
            }
            None => log::debug!("undo on empty document"),
        }
        removed
    }

    /// Replace the document with interchange records.
    ///
    /// Style fields missing from a record take the current style.
    pub fn from_data(&mut self, records: Vec<StrokeRecord>) {
        self.clear();
        let loaded = Document::from_records(records, &self.options.style);
        replay(loaded.strokes(), &mut self.surface);
        self.document.append(loaded.strokes().iter().cloned());
        log::debug!("loaded {} strokes", self.document.len());
    }

    /// The document in interchange form.
    pub fn to_data(&self) -> Vec<StrokeRecord> {
        self.document.to_records()
    }

    /// Change the colors of future strokes and of every stored stroke.
    pub fn recolor(&mut self, pen: CssColor, background: CssColor) {
        self.options.style.pen_color = pen;
        self.options.style.background_color = background;
        if self.document.is_empty() {
            return;
        }
        self.document
            .recolor(&self.options.style.pen_color, &self.options.style.background_color);
        self.redraw();
    }

    /// Resize the surface. Content is always discarded.
    pub fn resize(&mut self, width: f64, height: f64, ratio: f64) {
        self.surface
            .resize(width, height, ratio, &self.options.style.background_color);
        self.clear();
        let (w, h) = self.surface.backing_size();
        log::debug!("resized to {}x{} device pixels", w, h);
    }

    /// Encode the live surface.
    pub fn to_data_url(&self, format: RasterFormat) -> RenderResult<String> {
        let bytes = encode_raster(&self.surface.to_image(), format)?;
        Ok(to_data_url(format.mime(), &bytes))
    }

    /// Render the document with substituted colors.
    ///
    /// The export is drawn on its own surface; the live document and pixels
    /// are left as they are.
    pub fn export(&self, format: ExportFormat, colors: &ExportColors) -> RenderResult<Vec<u8>> {
        let document = self.document.with_pen_color(colors.pen.as_ref());
        let background = colors
            .background
            .as_ref()
            .unwrap_or(&self.options.style.background_color);
        log::debug!("exporting {} strokes as {}", document.len(), format.mime());

        match format {
            ExportFormat::Raster(raster) => {
                let mut surface = self.surface.blank_like();
                surface.clear(background);
                replay(document.strokes(), &mut surface);
                encode_raster(&surface.to_image(), raster)
            }
            ExportFormat::Svg { include_background } => {
                let (width, height) = self.surface.css_size();
                let mut svg = SvgExporter::new(width, height);
                if include_background {
                    svg.background(background);
                }
                replay(document.strokes(), &mut svg);
                Ok(svg.finish().into_bytes())
            }
        }
    }

    /// [`SignaturePad::export`] wrapped in a data URL.
    pub fn export_data_url(&self, format: ExportFormat, colors: &ExportColors) -> RenderResult<String> {
        let bytes = self.export(format, colors)?;
        Ok(to_data_url(format.mime(), &bytes))
    }

    /// Clear and paint an image given as a data URL.
    ///
    /// The pad counts as non-empty as soon as this is called. If decoding
    /// fails the future resolves to the error and the pad is empty again.
    pub fn from_data_url(
        &mut self,
        url: impl Into<String>,
        options: ImageOptions,
    ) -> BoxFuture<'_, RenderResult<()>> {
        let url = url.into();
        self.clear();
        self.surface.mark_not_empty();

        Box::pin(async move {
            let decoded = parse_data_url(&url).and_then(|(_, bytes)| decode_image(&bytes));
            match decoded {
                Ok(image) => {
                    let (width, height) = self.surface.css_size();
                    self.surface.blit(
                        &image,
                        options.x_offset,
                        options.y_offset,
                        options.width.unwrap_or(width),
                        options.height.unwrap_or(height),
                    );
                    log::debug!("image of {}x{} loaded", image.width(), image.height());
                    Ok(())
                }
                Err(err) => {
                    log::warn!("image could not be loaded: {}", err);
                    self.surface.set_empty();
                    Err(err)
                }
            }
        })
    }

    /// Repaint the background and replay the whole document.
    fn redraw(&mut self) {
        self.reset_surface();
        replay(self.document.strokes(), &mut self.surface);
    }

    fn reset_surface(&mut self) {
        self.throttle.cancel();
        self.stroke_open = false;
        self.smoother.reset(&self.options.style);
        self.surface.clear(&self.options.style.background_color);
    }
}
