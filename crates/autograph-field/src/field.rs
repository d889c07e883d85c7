//! A signature pad bound to a form field.
//!
//! The field keeps the value the host form submits (a PNG data URL), tracks
//! whether the drawing has uncommitted strokes, and gates the clear / undo /
//! download / done actions on the configuration.

use crate::config::{Action, ConfigError, DownloadFormat, FieldConfig, Theme};
use autograph_core::{InputEvent, PointError};
use autograph_render::{
    BoxFuture, ExportFormat, ImageOptions, InputOutcome, RasterFormat, RenderResult, RendererError, SignaturePad,
    to_data_url,
};
use thiserror::Error;

/// Field errors.
#[derive(Debug, Error)]
pub enum FieldError {
    #[error("Action {} is not available", .0.name())]
    ActionUnavailable(Action),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Point(#[from] PointError),
    #[error(transparent)]
    Render(#[from] RendererError),
}

/// Result type for field operations.
pub type FieldResult<T> = Result<T, FieldError>;

/// A file ready to hand to the browser.
#[derive(Debug, Clone, PartialEq)]
pub struct Download {
    pub filename: String,
    pub mime: &'static str,
    pub data_url: String,
}

/// Signature input with form state.
#[derive(Debug)]
pub struct SignatureField {
    config: FieldConfig,
    pad: SignaturePad,
    state: Option<String>,
    previous_state: Option<String>,
    /// Strokes were drawn since the state was last committed.
    dirty: bool,
    confirmed: bool,
    theme: Theme,
}

impl SignatureField {
    /// Build a field of `width` x `height` CSS pixels in the light theme.
    ///
    /// The configuration is validated first. With an initial value, call
    /// [`SignatureField::preload`] to paint it.
    pub fn new(config: FieldConfig, width: f64, height: f64, ratio: f64) -> FieldResult<Self> {
        config.validate()?;
        let mut pad = SignaturePad::new(config.pad_options(Theme::Light), width, height, ratio);
        if config.disabled {
            pad.off();
        }
        if config.initial_value.is_some() {
            pad.clear_on_next_begin();
        }

        let state = config.initial_value.clone();
        Ok(Self {
            previous_state: state.clone(),
            state,
            pad,
            config,
            dirty: false,
            confirmed: false,
            theme: Theme::Light,
        })
    }

    /// Paint the configured initial value, if any.
    pub fn preload(&mut self) -> Option<BoxFuture<'_, RenderResult<()>>> {
        let url = self.config.initial_value.clone()?;
        Some(self.pad.from_data_url(url, ImageOptions::default()))
    }

    pub fn config(&self) -> &FieldConfig {
        &self.config
    }

    pub fn pad(&self) -> &SignaturePad {
        &self.pad
    }

    /// The submitted value: a PNG data URL, or nothing.
    pub fn state(&self) -> Option<&str> {
        self.state.as_deref()
    }

    pub fn previous_state(&self) -> Option<&str> {
        self.previous_state.as_deref()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn is_confirmed(&self) -> bool {
        self.confirmed
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    /// Whether `action` may be triggered right now.
    pub fn can(&self, action: Action) -> bool {
        if self.config.disabled {
            return false;
        }
        match action {
            Action::Clear => self.config.clearable,
            Action::Undo => self.config.undoable,
            Action::Download => self.config.downloadable && !self.config.downloadable_formats.is_empty(),
            Action::Done => true,
        }
    }

    fn ensure(&self, action: Action) -> FieldResult<()> {
        if self.can(action) {
            Ok(())
        } else {
            log::warn!("rejected {} action", action.name());
            Err(FieldError::ActionUnavailable(action))
        }
    }

    /// Feed one raw host event. A finished stroke updates the state.
    pub fn handle_input(&mut self, event: &InputEvent) -> FieldResult<InputOutcome> {
        let outcome = self.pad.handle_input(event)?;
        if outcome.ended_stroke() {
            self.dirty = true;
            if !self.config.confirmable {
                self.commit()?;
            }
        }
        Ok(outcome)
    }

    /// Run a throttled move that has come due.
    pub fn tick(&mut self, now: u64) -> FieldResult<()> {
        self.pad.tick(now)?;
        Ok(())
    }

    pub fn next_deadline(&self) -> Option<u64> {
        self.pad.next_deadline()
    }

    /// Erase everything and reset the state.
    pub fn clear(&mut self) -> FieldResult<()> {
        self.ensure(Action::Clear)?;
        self.pad.clear();
        self.state = None;
        self.dirty = false;
        self.unconfirm();
        Ok(())
    }

    /// Remove the last stroke.
    pub fn undo(&mut self) -> FieldResult<()> {
        self.ensure(Action::Undo)?;
        self.pad.undo();
        let remaining = self.pad.document().len();
        if remaining == 0 {
            self.state = None;
        }
        self.dirty = remaining > 0;
        self.unconfirm();
        Ok(())
    }

    /// Commit the drawing to the state.
    pub fn done(&mut self) -> FieldResult<()> {
        self.ensure(Action::Done)?;
        self.commit()
    }

    /// Export the drawing as a file with the background included.
    pub fn download(&self, format: DownloadFormat) -> FieldResult<Download> {
        self.ensure(Action::Download)?;
        if !self.config.allows_format(format) {
            log::warn!("download as {} is not enabled", format.extension());
            return Err(FieldError::ActionUnavailable(Action::Download));
        }

        let bytes = self.pad.export(format.export_format(), &self.config.export_colors())?;
        Ok(Download {
            filename: format!("{}.{}", self.config.filename, format.extension()),
            mime: format.mime(),
            data_url: to_data_url(format.mime(), &bytes),
        })
    }

    /// Switch theme and recolor existing strokes.
    pub fn set_theme(&mut self, theme: Theme) {
        self.theme = theme;
        self.pad
            .recolor(self.config.pen_color_for(theme), self.config.background_color_for(theme));
    }

    /// Resize the drawing area. The drawing is cleared; the state is kept.
    pub fn resize(&mut self, width: f64, height: f64, ratio: f64) {
        self.pad.resize(width, height, ratio);
    }

    fn commit(&mut self) -> FieldResult<()> {
        let url = self.pad.export_data_url(
            ExportFormat::Raster(RasterFormat::Png),
            &self.config.export_colors(),
        )?;
        self.previous_state = self.state.replace(url);
        self.dirty = false;
        if self.config.confirmable {
            self.confirmed = true;
            self.pad.off();
        }
        log::debug!("signature committed");
        Ok(())
    }

    fn unconfirm(&mut self) {
        self.confirmed = false;
        // An unconfirmed confirmable field has no value.
        if self.config.confirmable {
            self.state = None;
        }
        self.pad.on();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use autograph_core::{Phase, PointerInput};
    use autograph_render::{decode_image, encode_raster, parse_data_url};

    fn block_on<F: std::future::Future>(f: F) -> F::Output {
        use std::task::{Context, Poll, RawWaker, RawWakerVTable, Waker};

        fn dummy_raw_waker() -> RawWaker {
            fn no_op(_: *const ()) {}
            fn clone(_: *const ()) -> RawWaker {
                dummy_raw_waker()
            }
            static VTABLE: RawWakerVTable = RawWakerVTable::new(clone, no_op, no_op, no_op);
            RawWaker::new(std::ptr::null(), &VTABLE)
        }

        let waker = unsafe { Waker::from_raw(dummy_raw_waker()) };
        let mut cx = Context::from_waker(&waker);
        let mut f = std::pin::pin!(f);

        loop {
            match f.as_mut().poll(&mut cx) {
                Poll::Ready(result) => return result,
                Poll::Pending => {}
            }
        }
    }

    fn pointer(phase: Phase, x: f64, y: f64, time: u64) -> InputEvent {
        InputEvent::Pointer(PointerInput { phase, x, y, pressure: 0.5, time })
    }

    fn draw_line(field: &mut SignatureField, y: f64, start: u64) {
        field.handle_input(&pointer(Phase::Down, 10.0, y, start)).unwrap();
        field.handle_input(&pointer(Phase::Move, 30.0, y, start + 20)).unwrap();
        field.handle_input(&pointer(Phase::Move, 50.0, y, start + 40)).unwrap();
        field.handle_input(&pointer(Phase::Up, 70.0, y, start + 60)).unwrap();
    }

    fn field(config: FieldConfig) -> SignatureField {
        SignatureField::new(config, 100.0, 60.0, 1.0).unwrap()
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = FieldConfig { min_width: 4.0, max_width: 1.0, ..Default::default() };
        let result = SignatureField::new(config, 100.0, 60.0, 1.0);
        assert!(matches!(result, Err(FieldError::Config(ConfigError::WidthRange { .. }))));

        let config = FieldConfig { velocity_filter_weight: 2.0, ..Default::default() };
        assert!(SignatureField::new(config, 100.0, 60.0, 1.0).is_err());
    }

    #[test]
    fn test_stroke_commits_state() {
        let mut field = field(FieldConfig::default());
        assert_eq!(field.state(), None);

        draw_line(&mut field, 20.0, 0);
        let state = field.state().unwrap();
        assert!(state.starts_with("data:image/png;base64,"));
        assert!(!field.is_dirty());
        assert_eq!(field.previous_state(), None);

        let first = state.to_string();
        draw_line(&mut field, 40.0, 100);
        assert_eq!(field.previous_state(), Some(first.as_str()));
    }

    #[test]
    fn test_confirmable_waits_for_done() {
        let config = FieldConfig { confirmable: true, ..Default::default() };
        let mut field = field(config);

        draw_line(&mut field, 20.0, 0);
        assert!(field.is_dirty());
        assert_eq!(field.state(), None);

        field.done().unwrap();
        assert!(field.is_confirmed());
        assert!(field.state().is_some());
        assert!(!field.pad().is_enabled());

        // Input is ignored while confirmed.
        field.handle_input(&pointer(Phase::Down, 10.0, 50.0, 500)).unwrap();
        assert_eq!(field.pad().document().len(), 1);
    }

    #[test]
    fn test_undo_after_confirm_unconfirms() {
        let config = FieldConfig { confirmable: true, ..Default::default() };
        let mut field = field(config);
        draw_line(&mut field, 20.0, 0);
        draw_line(&mut field, 40.0, 100);
        field.done().unwrap();

        field.undo().unwrap();
        assert!(!field.is_confirmed());
        assert!(field.is_dirty());
        assert_eq!(field.state(), None);
        assert!(field.pad().is_enabled());
        assert_eq!(field.pad().document().len(), 1);
    }

    #[test]
    fn test_undo_to_empty_resets_state() {
        let mut field = field(FieldConfig::default());
        draw_line(&mut field, 20.0, 0);
        assert!(field.state().is_some());

        field.undo().unwrap();
        assert_eq!(field.state(), None);
        assert!(!field.is_dirty());

        // Undo on an empty field is harmless.
        field.undo().unwrap();
        assert!(field.pad().document().is_empty());
    }

    #[test]
    fn test_clear() {
        let mut field = field(FieldConfig::default());
        draw_line(&mut field, 20.0, 0);
        field.clear().unwrap();

        assert_eq!(field.state(), None);
        assert!(!field.is_dirty());
        assert!(field.pad().is_empty());
    }

    #[test]
    fn test_actions_respect_config() {
        let config = FieldConfig { clearable: false, undoable: false, ..Default::default() };
        let mut field = field(config);
        assert!(matches!(field.clear(), Err(FieldError::ActionUnavailable(Action::Clear))));
        assert!(matches!(field.undo(), Err(FieldError::ActionUnavailable(Action::Undo))));
        assert!(matches!(
            field.download(DownloadFormat::Png),
            Err(FieldError::ActionUnavailable(Action::Download))
        ));
    }

    #[test]
    fn test_disabled_field() {
        let config = FieldConfig { disabled: true, ..Default::default() };
        let mut field = field(config);
        assert!(!field.pad().is_enabled());

        draw_line(&mut field, 20.0, 0);
        assert!(field.pad().document().is_empty());
        assert!(!field.can(Action::Done));
        assert!(field.done().is_err());
    }

    #[test]
    fn test_download() {
        let config = FieldConfig {
            downloadable: true,
            downloadable_formats: vec![DownloadFormat::Png, DownloadFormat::Svg],
            filename: "contract".to_string(),
            export_background_color: Some(autograph_core::CssColor::from_rgb8(255, 255, 255)),
            ..Default::default()
        };
        let mut field = field(config);
        draw_line(&mut field, 20.0, 0);

        let png = field.download(DownloadFormat::Png).unwrap();
        assert_eq!(png.filename, "contract.png");
        assert_eq!(png.mime, "image/png");
        let (_, bytes) = parse_data_url(&png.data_url).unwrap();
        let image = decode_image(&bytes).unwrap();
        assert_eq!(image.get_pixel(0, 0).0, [255, 255, 255, 255]);

        let svg = field.download(DownloadFormat::Svg).unwrap();
        assert_eq!(svg.filename, "contract.svg");
        let (mime, bytes) = parse_data_url(&svg.data_url).unwrap();
        assert_eq!(mime, "image/svg+xml");
        assert!(String::from_utf8(bytes).unwrap().contains(r##"fill="#ffffff""##));

        assert!(field.download(DownloadFormat::Jpg).is_err());
    }

    #[test]
    fn test_theme_recolors() {
        let mut field = field(FieldConfig::default());
        draw_line(&mut field, 20.0, 0);
        field.set_theme(Theme::Dark);

        assert_eq!(field.theme(), Theme::Dark);
        assert_eq!(field.pad().style().pen_color.as_str(), "#ffffff");
        let stroke = &field.pad().document().strokes()[0];
        assert_eq!(stroke.style.pen_color.as_str(), "#ffffff");
    }

    #[test]
    fn test_resize_keeps_state() {
        let mut field = field(FieldConfig::default());
        draw_line(&mut field, 20.0, 0);
        field.resize(200.0, 100.0, 2.0);

        assert!(field.pad().is_empty());
        assert!(field.state().is_some());
        assert_eq!(field.pad().surface().backing_size(), (400, 200));
    }

    #[test]
    fn test_initial_value_is_preloaded_and_replaced() {
        let image = autograph_render::RasterSurface::new(4.0, 4.0, 1.0);
        let bytes = encode_raster(&image.to_image(), RasterFormat::Png).unwrap();
        let url = to_data_url("image/png", &bytes);

        let config = FieldConfig { initial_value: Some(url.clone()), ..Default::default() };
        let mut field = field(config);
        assert_eq!(field.state(), Some(url.as_str()));

        let preload = field.preload().unwrap();
        block_on(preload).unwrap();
        assert!(!field.pad().is_empty());

        draw_line(&mut field, 20.0, 0);
        assert_eq!(field.pad().document().len(), 1);
        assert_eq!(field.previous_state(), Some(url.as_str()));
    }

    #[test]
    fn test_no_preload_without_initial_value() {
        let mut field = field(FieldConfig::default());
        assert!(field.preload().is_none());
    }
}
