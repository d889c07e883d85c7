//! Field configuration as supplied by the host form.

use autograph_core::{CompositeOperation, CssColor, PadOptions, StyleSnapshot};
use autograph_render::{ExportColors, ExportFormat, RasterFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid configuration: {0}")]
    Json(#[from] serde_json::Error),
    #[error("minWidth ({min}) must not exceed maxWidth ({max})")]
    WidthRange { min: f64, max: f64 },
    #[error("{field} must be a non-negative number, got {value}")]
    Negative { field: &'static str, value: f64 },
    #[error("velocityFilterWeight must be within [0, 1], got {0}")]
    FilterWeight(f64),
}

/// Light or dark host theme.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

/// Formats offered for download.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DownloadFormat {
    Png,
    Jpg,
    Svg,
}

impl DownloadFormat {
    pub const ALL: [DownloadFormat; 3] = [DownloadFormat::Png, DownloadFormat::Jpg, DownloadFormat::Svg];

    pub fn label(self) -> &'static str {
        match self {
            DownloadFormat::Png => "PNG",
            DownloadFormat::Jpg => "JPG",
            DownloadFormat::Svg => "SVG",
        }
    }

    pub fn mime(self) -> &'static str {
        match self {
            DownloadFormat::Png => "image/png",
            DownloadFormat::Jpg => "image/jpg",
            DownloadFormat::Svg => "image/svg+xml",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            DownloadFormat::Png => "png",
            DownloadFormat::Jpg => "jpg",
            DownloadFormat::Svg => "svg",
        }
    }

    /// Downloads always carry the background.
    pub fn export_format(self) -> ExportFormat {
        match self {
            DownloadFormat::Png => ExportFormat::Raster(RasterFormat::Png),
            DownloadFormat::Jpg => ExportFormat::Raster(RasterFormat::Jpeg { quality: None }),
            DownloadFormat::Svg => ExportFormat::Svg { include_background: true },
        }
    }
}

/// User-triggered field actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Clear,
    Undo,
    Download,
    Done,
}

impl Action {
    pub fn name(self) -> &'static str {
        match self {
            Action::Clear => "clear",
            Action::Undo => "undo",
            Action::Download => "download",
            Action::Done => "done",
        }
    }
}

/// Button captions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Labels {
    pub clear: String,
    pub undo: String,
    pub download: String,
    pub done: String,
    pub png: String,
    pub jpg: String,
    pub svg: String,
}

impl Default for Labels {
    fn default() -> Self {
        Self {
            clear: "Clear".to_string(),
            undo: "Undo".to_string(),
            download: "Download as".to_string(),
            done: "Done".to_string(),
            png: DownloadFormat::Png.label().to_string(),
            jpg: DownloadFormat::Jpg.label().to_string(),
            svg: DownloadFormat::Svg.label().to_string(),
        }
    }
}

impl Labels {
    pub fn action(&self, action: Action) -> &str {
        match action {
            Action::Clear => &self.clear,
            Action::Undo => &self.undo,
            Action::Download => &self.download,
            Action::Done => &self.done,
        }
    }

    pub fn format(&self, format: DownloadFormat) -> &str {
        match format {
            DownloadFormat::Png => &self.png,
            DownloadFormat::Jpg => &self.jpg,
            DownloadFormat::Svg => &self.svg,
        }
    }
}

/// Everything the host configures on a signature field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FieldConfig {
    pub pen_color: CssColor,
    pub pen_color_on_dark: Option<CssColor>,
    pub background_color: CssColor,
    pub background_color_on_dark: Option<CssColor>,
    pub export_pen_color: Option<CssColor>,
    pub export_background_color: Option<CssColor>,
    pub dot_size: f64,
    pub min_width: f64,
    pub max_width: f64,
    /// Move throttle in milliseconds; zero disables it.
    pub throttle: u64,
    pub min_distance: f64,
    pub velocity_filter_weight: f64,
    pub composite_operation: CompositeOperation,
    /// Download file name without extension.
    pub filename: String,
    /// PNG data URL shown until the first stroke.
    pub initial_value: Option<String>,
    pub disabled: bool,
    pub confirmable: bool,
    pub clearable: bool,
    pub undoable: bool,
    pub downloadable: bool,
    pub downloadable_formats: Vec<DownloadFormat>,
    pub labels: Labels,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            pen_color: CssColor::from_rgb8(0, 0, 0),
            pen_color_on_dark: Some(CssColor::from_rgb8(255, 255, 255)),
            background_color: CssColor::transparent(),
            background_color_on_dark: None,
            export_pen_color: None,
            export_background_color: None,
            dot_size: 2.0,
            min_width: 0.5,
            max_width: 2.5,
            throttle: 16,
            min_distance: 5.0,
            velocity_filter_weight: 0.7,
            composite_operation: CompositeOperation::SourceOver,
            filename: "signature".to_string(),
            initial_value: None,
            disabled: false,
            confirmable: false,
            clearable: true,
            undoable: true,
            downloadable: false,
            downloadable_formats: DownloadFormat::ALL.to_vec(),
            labels: Labels::default(),
        }
    }
}

impl FieldConfig {
    /// Parse and validate a JSON configuration.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Check numeric ranges. Colors are checked while parsing.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("dotSize", self.dot_size),
            ("minWidth", self.min_width),
            ("maxWidth", self.max_width),
            ("minDistance", self.min_distance),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Negative { field, value });
            }
        }
        if self.min_width > self.max_width {
            return Err(ConfigError::WidthRange {
                min: self.min_width,
                max: self.max_width,
            });
        }
        if !(0.0..=1.0).contains(&self.velocity_filter_weight) {
            return Err(ConfigError::FilterWeight(self.velocity_filter_weight));
        }
        Ok(())
    }

    pub fn pen_color_for(&self, theme: Theme) -> CssColor {
        match (theme, &self.pen_color_on_dark) {
            (Theme::Dark, Some(color)) => color.clone(),
            _ => self.pen_color.clone(),
        }
    }

    pub fn background_color_for(&self, theme: Theme) -> CssColor {
        match (theme, &self.background_color_on_dark) {
            (Theme::Dark, Some(color)) => color.clone(),
            _ => self.background_color.clone(),
        }
    }

    /// Engine options with the colors of `theme`.
    pub fn pad_options(&self, theme: Theme) -> PadOptions {
        PadOptions {
            style: StyleSnapshot {
                pen_color: self.pen_color_for(theme),
                background_color: self.background_color_for(theme),
                dot_size: self.dot_size,
                min_width: self.min_width,
                max_width: self.max_width,
                velocity_filter_weight: self.velocity_filter_weight,
                composite_operation: self.composite_operation,
            },
            min_distance: self.min_distance,
            throttle_ms: self.throttle,
        }
    }

    pub fn export_colors(&self) -> ExportColors {
        ExportColors {
            pen: self.export_pen_color.clone(),
            background: self.export_background_color.clone(),
        }
    }

    pub fn allows_format(&self, format: DownloadFormat) -> bool {
        self.downloadable && self.downloadable_formats.contains(&format)
    }
}
