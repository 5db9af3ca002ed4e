//! Image codec trait and shared pixel types.
//!
//! The [`ImageCodec`] trait defines the three operations the editor needs
//! from the outside world: decode, encode, and resize. The production
//! implementation is [`RustCodec`](super::rust_codec::RustCodec).

use super::params::{ExportFormat, Quality};
use image::RgbaImage;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Failed to decode image: {0}")]
    Decode(String),
    #[error("Failed to encode {format} image: {message}")]
    Encode {
        format: ExportFormat,
        message: String,
    },
    #[error("Invalid image dimensions {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
}

/// Result of a dimension probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Decoded RGBA8 pixels.
///
/// The buffer is immutable once wrapped: every operation that changes pixels
/// (resize, compositing) produces a new `PixelBuffer`. Cloning is therefore
/// cheap and a clone held by an undo snapshot can never observe later edits
/// to the live layer.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelBuffer(Arc<RgbaImage>);

impl PixelBuffer {
    pub fn new(image: RgbaImage) -> Self {
        Self(Arc::new(image))
    }

    pub fn width(&self) -> u32 {
        self.0.width()
    }

    pub fn height(&self) -> u32 {
        self.0.height()
    }

    pub fn dimensions(&self) -> Dimensions {
        Dimensions {
            width: self.width(),
            height: self.height(),
        }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.0
    }

    /// RGBA sample at `(x, y)`. Panics when out of bounds, like `RgbaImage`.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        self.0.get_pixel(x, y).0
    }

    /// Whether two buffers share the same allocation.
    pub fn shares_storage(&self, other: &PixelBuffer) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl From<RgbaImage> for PixelBuffer {
    fn from(image: RgbaImage) -> Self {
        Self::new(image)
    }
}

/// Codec operations the rest of the crate is written against.
///
/// Everything that turns bytes into pixels or pixels into bytes goes through
/// this trait so the editor can be tested with a mock.
pub trait ImageCodec: Sync {
    /// Decode an encoded image (PNG, JPEG, WebP, GIF, BMP) into RGBA8.
    fn decode(&self, bytes: &[u8]) -> Result<PixelBuffer, CodecError>;

    /// Encode pixels into the given container format.
    fn encode(
        &self,
        pixels: &PixelBuffer,
        format: ExportFormat,
        quality: Quality,
    ) -> Result<Vec<u8>, CodecError>;

    /// Rescale to exactly `width` x `height` (aspect ratio is not preserved).
    fn resize(
        &self,
        pixels: &PixelBuffer,
        width: u32,
        height: u32,
    ) -> Result<PixelBuffer, CodecError>;
}
