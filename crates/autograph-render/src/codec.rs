//! Image encoding, decoding and data URLs.

use crate::renderer::{RasterFormat, RenderResult, RendererError};
use base64::{Engine, engine::general_purpose::STANDARD};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{DynamicImage, ExtendedColorType, ImageEncoder, RgbaImage};

/// JPEG quality used when none is requested (matches browser canvases).
const DEFAULT_JPEG_QUALITY: u8 = 92;

/// Encode pixels to PNG or JPEG bytes.
///
/// JPEG has no alpha channel; it is dropped.
pub fn encode_raster(image: &RgbaImage, format: RasterFormat) -> RenderResult<Vec<u8>> {
    let mut bytes = Vec::new();
    let (width, height) = image.dimensions();
    match format {
        RasterFormat::Png => PngEncoder::new(&mut bytes)
            .write_image(image.as_raw(), width, height, ExtendedColorType::Rgba8)
            .map_err(|e| RendererError::Encode(e.to_string()))?,
        RasterFormat::Jpeg { quality } => {
            let rgb = DynamicImage::ImageRgba8(image.clone()).to_rgb8();
            JpegEncoder::new_with_quality(&mut bytes, jpeg_quality(quality))
                .write_image(rgb.as_raw(), width, height, ExtendedColorType::Rgb8)
                .map_err(|e| RendererError::Encode(e.to_string()))?
        }
    }
    Ok(bytes)
}

fn jpeg_quality(quality: Option<f32>) -> u8 {
    match quality {
        Some(q) if (0.0..=1.0).contains(&q) => ((q * 100.0).round() as u8).max(1),
        _ => DEFAULT_JPEG_QUALITY,
    }
}

/// Decode PNG or JPEG bytes.
pub fn decode_image(bytes: &[u8]) -> RenderResult<RgbaImage> {
    image::load_from_memory(bytes)
        .map(|img| img.to_rgba8())
        .map_err(|e| RendererError::Decode(e.to_string()))
}

/// Build a base64 data URL.
pub fn to_data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}

/// Split a data URL into its MIME type and payload.
pub fn parse_data_url(url: &str) -> RenderResult<(String, Vec<u8>)> {
    let rest = url
        .strip_prefix("data:")
        .ok_or_else(|| RendererError::DataUrl("missing data: scheme".to_string()))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| RendererError::DataUrl("missing payload separator".to_string()))?;

    let mut params = header.split(';');
    let mime = params.next().filter(|m| !m.is_empty()).unwrap_or("text/plain").to_string();
    let is_base64 = params.any(|p| p.eq_ignore_ascii_case("base64"));

    let bytes = if is_base64 {
        STANDARD
            .decode(payload.trim())
            .map_err(|e| RendererError::DataUrl(e.to_string()))?
    } else {
        urlencoding::decode_binary(payload.as_bytes()).into_owned()
    };
    Ok((mime, bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn checker() -> RgbaImage {
        RgbaImage::from_fn(4, 4, |x, y| {
            if (x + y) % 2 == 0 { Rgba([255, 0, 0, 255]) } else { Rgba([0, 0, 255, 128]) }
        })
    }

    #[test]
    fn test_png_roundtrip_is_lossless() {
        let image = checker();
        let bytes = encode_raster(&image, RasterFormat::Png).unwrap();
        assert_eq!(&bytes[1..4], b"PNG");
        assert_eq!(decode_image(&bytes).unwrap(), image);
    }

    #[test]
    fn test_jpeg_encodes() {
        let bytes = encode_raster(&checker(), RasterFormat::Jpeg { quality: Some(0.8) }).unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
        assert_eq!(decode_image(&bytes).unwrap().dimensions(), (4, 4));
    }

    #[test]
    fn test_jpeg_quality_mapping() {
        assert_eq!(jpeg_quality(Some(0.5)), 50);
        assert_eq!(jpeg_quality(Some(0.0)), 1);
        assert_eq!(jpeg_quality(Some(7.0)), DEFAULT_JPEG_QUALITY);
        assert_eq!(jpeg_quality(None), DEFAULT_JPEG_QUALITY);
    }

    #[test]
    fn test_data_url_roundtrip() {
        let url = to_data_url("image/png", b"hello");
        assert_eq!(url, "data:image/png;base64,aGVsbG8=");
        let (mime, bytes) = parse_data_url(&url).unwrap();
        assert_eq!(mime, "image/png");
        assert_eq!(bytes, b"hello");
    }

    #[test]
    fn test_percent_encoded_data_url() {
        let (mime, bytes) = parse_data_url("data:image/svg+xml,%3Csvg%3E").unwrap();
        assert_eq!(mime, "image/svg+xml");
        assert_eq!(bytes, b"<svg>");

        // Stray percent signs pass through untouched.
        let (_, bytes) = parse_data_url("data:,100%25%zz").unwrap();
        assert_eq!(bytes, b"100%%zz");
    }

    #[test]
    fn test_malformed_data_url() {
        assert!(parse_data_url("http://example.com/a.png").is_err());
        assert!(parse_data_url("data:image/png;base64").is_err());
        assert!(parse_data_url("data:image/png;base64,@@@").is_err());
    }

    #[test]
    fn test_decode_garbage_fails() {
        assert!(matches!(decode_image(b"not an image"), Err(RendererError::Decode(_))));
    }
}
