//! Image codec: pure Rust, no system libraries.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** | `image::load_from_memory` → RGBA8 |
//! | **Probe dimensions** | `ImageReader::into_dimensions`, `avif-parse` for AVIF |
//! | **Resize** | `image::imageops::resize` with `Lanczos3` |
//! | **Encode** | PNG / JPEG encoders from the `image` crate |
//!
//! The module is split into:
//! - **Calculations**: pure dimension math (aspect ratio, icon heuristics)
//! - **Parameters**: [`Quality`] and [`ExportFormat`]
//! - **Codec**: [`ImageCodec`] trait, [`PixelBuffer`], and [`RustCodec`]
//!
//! The editor only ever talks to [`ImageCodec`]; pixel buffers are opaque to it
//! except when compositing an export.

mod calculations;
pub mod codec;
mod params;
pub mod rust_codec;

pub use calculations::{aspect_ratio, is_icon_square, pixel_area};
pub use codec::{CodecError, Dimensions, ImageCodec, PixelBuffer};
pub use params::{ExportFormat, Quality};
pub use rust_codec::{RustCodec, probe_dimensions};
