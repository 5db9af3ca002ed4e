//! Pure Rust codec. Everything is statically linked into the binary.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, WebP, GIF, BMP) | `image::load_from_memory` |
//! | Probe (AVIF) | `avif-parse` container metadata, no pixel decode |
//! | Resize | `image::imageops::resize` with `Lanczos3` filter |
//! | Encode → PNG | `image::codecs::png::PngEncoder` |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` (RGB, configurable quality) |

use super::codec::{CodecError, Dimensions, ImageCodec, PixelBuffer};
use super::params::{ExportFormat, Quality};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ExtendedColorType, ImageEncoder, ImageReader};
use std::io::Cursor;

/// Pure Rust codec using the `image` crate ecosystem.
pub struct RustCodec;

impl RustCodec {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustCodec {
    fn default() -> Self {
        Self::new()
    }
}

/// ISO-BMFF files start with a `ftyp` box; AVIF declares `avif` or `avis`.
fn is_avif(bytes: &[u8]) -> bool {
    bytes.len() >= 12 && &bytes[4..8] == b"ftyp" && matches!(&bytes[8..12], b"avif" | b"avis")
}

/// Extract dimensions from an AVIF container (no AV1 decode needed).
fn identify_avif(bytes: &[u8]) -> Result<Dimensions, CodecError> {
    let avif = avif_parse::read_avif(&mut Cursor::new(bytes))
        .map_err(|e| CodecError::Decode(format!("Failed to parse AVIF: {e:?}")))?;
    let meta = avif
        .primary_item_metadata()
        .map_err(|e| CodecError::Decode(format!("Failed to read AVIF metadata: {e:?}")))?;
    Ok(Dimensions {
        width: meta.max_frame_width.get(),
        height: meta.max_frame_height.get(),
    })
}

/// Read image dimensions from encoded bytes without decoding the pixels.
///
/// Used by the downloader to apply size filters to JPEG, PNG, WebP and AVIF
/// bodies; AVIF is the one accepted format the pixel decoders don't cover.
pub fn probe_dimensions(bytes: &[u8]) -> Result<Dimensions, CodecError> {
    if is_avif(bytes) {
        return identify_avif(bytes);
    }
    let (width, height) = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| CodecError::Decode(e.to_string()))?
        .into_dimensions()
        .map_err(|e| CodecError::Decode(e.to_string()))?;
    Ok(Dimensions { width, height })
}

impl ImageCodec for RustCodec {
    fn decode(&self, bytes: &[u8]) -> Result<PixelBuffer, CodecError> {
        let img = image::load_from_memory(bytes).map_err(|e| CodecError::Decode(e.to_string()))?;
        Ok(PixelBuffer::new(img.to_rgba8()))
    }

    fn encode(
        &self,
        pixels: &PixelBuffer,
        format: ExportFormat,
        quality: Quality,
    ) -> Result<Vec<u8>, CodecError> {
        let (width, height) = (pixels.width(), pixels.height());
        let mut out = Vec::new();
        let result = match format {
            ExportFormat::Png => PngEncoder::new(&mut out).write_image(
                pixels.image().as_raw(),
                width,
                height,
                ExtendedColorType::Rgba8,
            ),
            ExportFormat::Jpeg => {
                let rgb = DynamicImage::ImageRgba8(pixels.image().clone()).to_rgb8();
                JpegEncoder::new_with_quality(&mut out, quality.value()).write_image(
                    rgb.as_raw(),
                    width,
                    height,
                    ExtendedColorType::Rgb8,
                )
            }
        };
        result.map_err(|e| CodecError::Encode {
            format,
            message: e.to_string(),
        })?;
        Ok(out)
    }

    fn resize(
        &self,
        pixels: &PixelBuffer,
        width: u32,
        height: u32,
    ) -> Result<PixelBuffer, CodecError> {
        if width == 0 || height == 0 {
            return Err(CodecError::InvalidDimensions { width, height });
        }
        let resized = image::imageops::resize(pixels.image(), width, height, FilterType::Lanczos3);
        Ok(PixelBuffer::new(resized))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{avif_bytes, jpeg_bytes, png_bytes};

    #[test]
    fn decode_synthetic_png() {
        let codec = RustCodec::new();
        let pixels = codec.decode(&png_bytes(20, 10, [0, 128, 255, 255])).unwrap();
        assert_eq!(pixels.width(), 20);
        assert_eq!(pixels.height(), 10);
        assert_eq!(pixels.pixel(3, 3), [0, 128, 255, 255]);
    }

    #[test]
    fn decode_garbage_errors() {
        let codec = RustCodec::new();
        let result = codec.decode(b"definitely not an image");
        assert!(matches!(result, Err(CodecError::Decode(_))));
    }

    #[test]
    fn resize_is_non_uniform() {
        let codec = RustCodec::new();
        let pixels = codec.decode(&png_bytes(40, 40, [9, 9, 9, 255])).unwrap();
        let resized = codec.resize(&pixels, 80, 10).unwrap();
        assert_eq!((resized.width(), resized.height()), (80, 10));
    }

    #[test]
    fn resize_to_zero_errors() {
        let codec = RustCodec::new();
        let pixels = codec.decode(&png_bytes(4, 4, [9, 9, 9, 255])).unwrap();
        assert!(matches!(
            codec.resize(&pixels, 0, 4),
            Err(CodecError::InvalidDimensions { width: 0, height: 4 })
        ));
    }

    #[test]
    fn png_encode_decodes_back_to_same_pixels() {
        let codec = RustCodec::new();
        let pixels = codec.decode(&png_bytes(6, 5, [10, 20, 30, 255])).unwrap();
        let bytes = codec
            .encode(&pixels, ExportFormat::Png, Quality::default())
            .unwrap();
        assert_eq!(codec.decode(&bytes).unwrap(), pixels);
    }

    #[test]
    fn jpeg_encode_produces_jpeg_magic() {
        let codec = RustCodec::new();
        let pixels = codec.decode(&png_bytes(16, 16, [200, 10, 10, 255])).unwrap();
        let bytes = codec
            .encode(&pixels, ExportFormat::Jpeg, Quality::new(80))
            .unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn probe_reads_png_and_jpeg_headers() {
        let png = probe_dimensions(&png_bytes(300, 120, [0, 0, 0, 255])).unwrap();
        assert_eq!(png, Dimensions { width: 300, height: 120 });
        let jpg = probe_dimensions(&jpeg_bytes(64, 48)).unwrap();
        assert_eq!(jpg, Dimensions { width: 64, height: 48 });
    }

    #[test]
    fn probe_rejects_truncated_avif() {
        let mut fake = vec![0, 0, 0, 24];
        fake.extend_from_slice(b"ftypavif");
        fake.extend_from_slice(&[0; 12]);
        assert!(is_avif(&fake));
        assert!(probe_dimensions(&fake).is_err());
    }

    #[test]
    fn avif_size_comes_from_sequence_header() {
        let bytes = avif_bytes(1920, 1080);
        assert!(is_avif(&bytes));
        assert_eq!(
            probe_dimensions(&bytes).unwrap(),
            Dimensions { width: 1920, height: 1080 }
        );
        // Pixel decoders cannot read it; only the container is measured
        assert!(RustCodec::new().decode(&bytes).is_err());
    }

    #[test]
    fn probe_rejects_garbage() {
        assert!(probe_dimensions(b"<html>nope</html>").is_err());
    }
}
