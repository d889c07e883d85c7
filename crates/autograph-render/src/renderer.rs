//! Shared renderer types: errors, output formats and export colors.

use autograph_core::CssColor;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Renderer errors.
#[derive(Debug, Error)]
pub enum RendererError {
    #[error("Encoding failed: {0}")]
    Encode(String),
    #[error("Image could not be decoded: {0}")]
    Decode(String),
    #[error("Malformed data URL: {0}")]
    DataUrl(String),
}

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RendererError>;

/// Boxed future for the asynchronous image preload.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Pixel formats a surface can be encoded to.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum RasterFormat {
    #[default]
    Png,
    /// JPEG with an optional quality in `[0, 1]`.
    Jpeg { quality: Option<f32> },
}

impl RasterFormat {
    pub fn mime(&self) -> &'static str {
        match self {
            RasterFormat::Png => "image/png",
            RasterFormat::Jpeg { .. } => "image/jpeg",
        }
    }

    /// Pick a format from a MIME type; unknown types fall back to PNG.
    pub fn from_mime(mime: &str, quality: Option<f32>) -> Self {
        match mime {
            "image/jpeg" | "image/jpg" => RasterFormat::Jpeg { quality },
            _ => RasterFormat::Png,
        }
    }
}

/// Output of an export.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ExportFormat {
    Raster(RasterFormat),
    Svg { include_background: bool },
}

impl ExportFormat {
    pub fn mime(&self) -> &'static str {
        match self {
            ExportFormat::Raster(format) => format.mime(),
            ExportFormat::Svg { .. } => "image/svg+xml",
        }
    }
}

/// Colors substituted for the duration of an export.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExportColors {
    pub pen: Option<CssColor>,
    pub background: Option<CssColor>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mime_mapping() {
        assert_eq!(RasterFormat::from_mime("image/jpg", None).mime(), "image/jpeg");
        assert_eq!(RasterFormat::from_mime("image/webp", None), RasterFormat::Png);
        assert_eq!(ExportFormat::Svg { include_background: true }.mime(), "image/svg+xml");
    }
}
