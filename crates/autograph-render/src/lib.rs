//! Autograph Render Library
//!
//! Raster and SVG realization of strokes, image codecs, and the
//! [`SignaturePad`] session that ties input, smoothing and rendering together.

pub mod codec;
pub mod pad;
pub mod raster;
mod renderer;
pub mod svg;

pub use codec::{decode_image, encode_raster, parse_data_url, to_data_url};
pub use pad::{ImageOptions, InputOutcome, SignaturePad};
pub use raster::RasterSurface;
pub use renderer::{BoxFuture, ExportColors, ExportFormat, RasterFormat, RenderResult, RendererError};
pub use svg::SvgExporter;
