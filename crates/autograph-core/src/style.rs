//! Stroke styles: colors, widths and blend modes.

use peniko::Color;
use peniko::color::{Srgb, parse_color};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors raised when parsing a color.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ColorError {
    #[error("Invalid color {input:?}: {reason}")]
    Invalid { input: String, reason: String },
}

/// A color given as CSS text, parsed once.
///
/// The source text is kept so vector output reproduces what the host gave.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CssColor {
    text: String,
    color: Color,
}

impl CssColor {
    pub fn parse(text: &str) -> Result<Self, ColorError> {
        let color = parse_color(text.trim()).map_err(|e| ColorError::Invalid {
            input: text.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            text: text.to_string(),
            color: color.to_alpha_color::<Srgb>(),
        })
    }

    pub fn black() -> Self {
        Self { text: "black".to_string(), color: Color::BLACK }
    }

    pub fn transparent() -> Self {
        Self { text: "rgba(0,0,0,0)".to_string(), color: Color::TRANSPARENT }
    }

    /// An opaque color written as `#rrggbb`.
    pub fn from_rgb8(r: u8, g: u8, b: u8) -> Self {
        Self {
            text: format!("#{:02x}{:02x}{:02x}", r, g, b),
            color: Color::from_rgb8(r, g, b),
        }
    }

    /// The CSS text this color was parsed from.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn color(&self) -> Color {
        self.color
    }

    /// Non-premultiplied RGBA8 components.
    pub fn to_rgba8(&self) -> [u8; 4] {
        let rgba = self.color.to_rgba8();
        [rgba.r, rgba.g, rgba.b, rgba.a]
    }
}

impl PartialEq for CssColor {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text
    }
}

impl FromStr for CssColor {
    type Err = ColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for CssColor {
    type Error = ColorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CssColor> for String {
    fn from(color: CssColor) -> Self {
        color.text
    }
}

impl fmt::Display for CssColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Raster blend mode used when a stroke is painted, in canvas naming.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CompositeOperation {
    #[default]
    SourceOver,
    SourceAtop,
    DestinationOver,
    DestinationOut,
    Lighter,
    Xor,
    Multiply,
    Screen,
}

impl CompositeOperation {
    pub fn name(self) -> &'static str {
        match self {
            CompositeOperation::SourceOver => "source-over",
            CompositeOperation::SourceAtop => "source-atop",
            CompositeOperation::DestinationOver => "destination-over",
            CompositeOperation::DestinationOut => "destination-out",
            CompositeOperation::Lighter => "lighter",
            CompositeOperation::Xor => "xor",
            CompositeOperation::Multiply => "multiply",
            CompositeOperation::Screen => "screen",
        }
    }
}

/// The style a stroke was drawn with, captured when the stroke began.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StyleSnapshot {
    pub pen_color: CssColor,
    pub background_color: CssColor,
    /// Radius of a single dot; zero means "derive from the widths".
    pub dot_size: f64,
    pub min_width: f64,
    pub max_width: f64,
    /// Weight of the newest velocity sample in the smoothing filter.
    pub velocity_filter_weight: f64,
    pub composite_operation: CompositeOperation,
}

impl Default for StyleSnapshot {
    fn default() -> Self {
        Self {
            pen_color: CssColor::black(),
            background_color: CssColor::transparent(),
            dot_size: 0.0,
            min_width: 0.5,
            max_width: 2.5,
            velocity_filter_weight: 0.7,
            composite_operation: CompositeOperation::SourceOver,
        }
    }
}

impl StyleSnapshot {
    /// Radius used for single-point strokes.
    pub fn dot_radius(&self) -> f64 {
        if self.dot_size > 0.0 {
            self.dot_size
        } else {
            self.mid_width()
        }
    }

    /// Width every stroke starts from.
    pub fn mid_width(&self) -> f64 {
        (self.min_width + self.max_width) / 2.0
    }
}

/// Per-stroke style fields that may or may not be present in stored data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pen_color: Option<CssColor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<CssColor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dot_size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub velocity_filter_weight: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub composite_operation: Option<CompositeOperation>,
}

impl StyleOverride {
    /// Fill every missing field from `defaults`.
    pub fn resolve(&self, defaults: &StyleSnapshot) -> StyleSnapshot {
        StyleSnapshot {
            pen_color: self.pen_color.clone().unwrap_or_else(|| defaults.pen_color.clone()),
            background_color: self
                .background_color
                .clone()
                .unwrap_or_else(|| defaults.background_color.clone()),
            dot_size: self.dot_size.unwrap_or(defaults.dot_size),
            min_width: self.min_width.unwrap_or(defaults.min_width),
            max_width: self.max_width.unwrap_or(defaults.max_width),
            velocity_filter_weight: self.velocity_filter_weight.unwrap_or(defaults.velocity_filter_weight),
            composite_operation: self.composite_operation.unwrap_or(defaults.composite_operation),
        }
    }
}

impl From<&StyleSnapshot> for StyleOverride {
    fn from(style: &StyleSnapshot) -> Self {
        Self {
            pen_color: Some(style.pen_color.clone()),
            background_color: Some(style.background_color.clone()),
            dot_size: Some(style.dot_size),
            min_width: Some(style.min_width),
            max_width: Some(style.max_width),
            velocity_filter_weight: Some(style.velocity_filter_weight),
            composite_operation: Some(style.composite_operation),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_css_colors() {
        assert_eq!(CssColor::parse("#000000").unwrap().to_rgba8(), [0, 0, 0, 255]);
        assert_eq!(CssColor::parse("#ffffff").unwrap().to_rgba8(), [255, 255, 255, 255]);
        assert_eq!(CssColor::parse("rgba(0,0,0,0)").unwrap().to_rgba8()[3], 0);
        assert_eq!(CssColor::parse("red").unwrap().to_rgba8(), [255, 0, 0, 255]);
    }

    #[test]
    fn test_parse_keeps_text() {
        let color = CssColor::parse("rgb(10, 20, 30)").unwrap();
        assert_eq!(color.as_str(), "rgb(10, 20, 30)");
        assert_eq!(color.to_string(), "rgb(10, 20, 30)");
    }

    #[test]
    fn test_from_rgb8() {
        let white = CssColor::from_rgb8(255, 255, 255);
        assert_eq!(white.as_str(), "#ffffff");
        assert_eq!(white, CssColor::parse("#ffffff").unwrap());
        assert_eq!(white.to_rgba8(), [255, 255, 255, 255]);
    }

    #[test]
    fn test_invalid_color() {
        assert!(CssColor::parse("not-a-color").is_err());
        assert!(serde_json::from_str::<CssColor>("\"nope\"").is_err());
    }

    #[test]
    fn test_dot_radius() {
        let mut style = StyleSnapshot::default();
        assert!((style.dot_radius() - 1.5).abs() < f64::EPSILON);
        style.dot_size = 2.0;
        assert!((style.dot_radius() - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_resolve_fills_missing_fields() {
        let defaults = StyleSnapshot::default();
        let partial = StyleOverride {
            pen_color: Some(CssColor::parse("#ff0000").unwrap()),
            max_width: Some(4.0),
            ..Default::default()
        };

        let resolved = partial.resolve(&defaults);
        assert_eq!(resolved.pen_color.as_str(), "#ff0000");
        assert!((resolved.max_width - 4.0).abs() < f64::EPSILON);
        assert!((resolved.min_width - defaults.min_width).abs() < f64::EPSILON);
        assert_eq!(resolved.composite_operation, CompositeOperation::SourceOver);
    }

    #[test]
    fn test_composite_operation_names() {
        let op: CompositeOperation = serde_json::from_str("\"destination-out\"").unwrap();
        assert_eq!(op, CompositeOperation::DestinationOut);
        assert_eq!(op.name(), "destination-out");
    }
}
