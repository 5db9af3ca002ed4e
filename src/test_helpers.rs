//! Shared test utilities for the orca test suite.
//!
//! Provides synthetic image bytes (no fixture files needed) and a scripted
//! HTTP client for the scraper.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let client = MockHttpClient::new()
//!     .with_page("https://example.com/", "<img src=\"/a.png\">")
//!     .with_image("https://example.com/a.png", "image/png", noisy_png(300, 300, 1));
//!
//! let response = client.get("https://example.com/a.png", &[], TIMEOUT).unwrap();
//! assert_eq!(response.status, 200);
//! assert_eq!(client.requested_urls(), vec!["https://example.com/a.png"]);
//! ```

use std::collections::HashMap;
use std::io::Cursor;
use std::sync::Mutex;
use std::time::Duration;

use image::{ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};

use crate::scrape::{FetchError, HttpClient, HttpResponse};

// =========================================================================
// Synthetic images
// =========================================================================

/// Solid-colour PNG of the given size.
pub fn png_bytes(width: u32, height: u32, rgba: [u8; 4]) -> Vec<u8> {
    let img = RgbaImage::from_pixel(width, height, Rgba(rgba));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png).unwrap();
    buf.into_inner()
}

/// Gradient JPEG of the given size.
pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
    });
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Jpeg).unwrap();
    buf.into_inner()
}

/// PNG filled with pseudo-random noise so it does not compress.
///
/// Different seeds produce different bytes, which keeps content-hash
/// dedup out of the way when a test needs several distinct images.
pub fn noisy_png(width: u32, height: u32, seed: u32) -> Vec<u8> {
    let mut state = seed.wrapping_mul(2_654_435_761).wrapping_add(1);
    let img = RgbaImage::from_fn(width, height, |_, _| {
        state ^= state << 13;
        state ^= state >> 17;
        state ^= state << 5;
        let [r, g, b, _] = state.to_le_bytes();
        Rgba([r, g, b, 255])
    });
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png).unwrap();
    buf.into_inner()
}

/// Smallest still AVIF that `avif-parse` accepts: `ftyp`, a `meta` box
/// locating item 1 in `mdat`, and an `mdat` holding only the AV1 sequence
/// header. There is no frame data, so it measures but never decodes.
pub fn avif_bytes(width: u32, height: u32) -> Vec<u8> {
    assert!((1..=1 << 16).contains(&width) && (1..=1 << 16).contains(&height));

    let ftyp = bmff_box(b"ftyp", &[&b"avif"[..], &[0; 4], b"mif1", b"avif"].concat());
    let obu = av1_sequence_header(width, height);
    // The iloc extent points at the mdat payload, so build meta once to learn its length
    let meta_len = avif_meta(0, obu.len() as u32).len();
    let payload_offset = (ftyp.len() + meta_len + 8) as u32;
    let meta = avif_meta(payload_offset, obu.len() as u32);

    [ftyp, meta, bmff_box(b"mdat", &obu)].concat()
}

fn bmff_box(kind: &[u8; 4], payload: &[u8]) -> Vec<u8> {
    let size = (8 + payload.len()) as u32;
    [&size.to_be_bytes()[..], kind, payload].concat()
}

fn full_box(kind: &[u8; 4], version: u8, payload: &[u8]) -> Vec<u8> {
    bmff_box(kind, &[&[version, 0, 0, 0][..], payload].concat())
}

fn avif_meta(extent_offset: u32, extent_length: u32) -> Vec<u8> {
    let hdlr = full_box(b"hdlr", 0, &[&[0; 4][..], b"pict", &[0; 12], &[0]].concat());
    let pitm = full_box(b"pitm", 0, &1u16.to_be_bytes());
    let infe = full_box(b"infe", 2, &[&1u16.to_be_bytes()[..], &[0, 0], b"av01", &[0]].concat());
    let iinf = full_box(b"iinf", 0, &[&1u16.to_be_bytes()[..], &infe].concat());
    // Version 0: 4-byte offset and length, no base offset, one item with one extent
    let iloc = full_box(
        b"iloc",
        0,
        &[
            &[0x44, 0x00][..],
            &1u16.to_be_bytes(),
            &1u16.to_be_bytes(),
            &0u16.to_be_bytes(),
            &1u16.to_be_bytes(),
            &extent_offset.to_be_bytes(),
            &extent_length.to_be_bytes(),
        ]
        .concat(),
    );
    full_box(b"meta", 0, &[hdlr, pitm, iinf, iloc].concat())
}

/// Sequence header OBU for a reduced still-picture stream with 16-bit
/// frame size fields, 8-bit 4:2:0, no colour description.
fn av1_sequence_header(width: u32, height: u32) -> Vec<u8> {
    let fields: [(u32, u32); 10] = [
        (0, 3),          // seq_profile
        (0b11, 2),       // still_picture, reduced_still_picture_header
        (0, 5),          // seq_level_idx
        (15, 4),         // frame_width_bits_minus_1
        (15, 4),         // frame_height_bits_minus_1
        (width - 1, 16), // max_frame_width_minus_1
        (height - 1, 16),
        (0, 3), // 128x128 superblock, filter intra, intra edge
        (0, 3), // superres, cdef, restoration
        (0, 8), // colour config and film grain
    ];
    let mut bits: u64 = 0;
    for (value, len) in fields {
        bits = (bits << len) | u64::from(value);
    }
    // Type 1 (sequence header) with a size field, then a one-byte leb128 size
    [&[0x0A, 8][..], &bits.to_be_bytes()].concat()
}

// =========================================================================
// Scripted HTTP client
// =========================================================================

/// One request seen by [`MockHttpClient`].
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub timeout: Duration,
}

/// HTTP client answering from a fixed route table.
///
/// Unknown URLs get a 404. Routes registered with [`with_failure`] return a
/// transport error. Uses Mutex (not RefCell) so it is Sync.
///
/// [`with_failure`]: MockHttpClient::with_failure
#[derive(Default)]
pub struct MockHttpClient {
    routes: HashMap<String, Result<HttpResponse, String>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl MockHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_response(mut self, url: &str, response: HttpResponse) -> Self {
        self.routes.insert(url.to_string(), Ok(response));
        self
    }

    pub fn with_page(self, url: &str, html: &str) -> Self {
        self.with_response(url, response(200, "text/html; charset=utf-8", html.as_bytes()))
    }

    pub fn with_image(self, url: &str, content_type: &str, body: Vec<u8>) -> Self {
        self.with_response(url, response(200, content_type, &body))
    }

    pub fn with_status(self, url: &str, status: u16) -> Self {
        self.with_response(url, response(status, "text/plain", b"error"))
    }

    pub fn with_failure(mut self, url: &str) -> Self {
        self.routes
            .insert(url.to_string(), Err("connection refused".to_string()));
        self
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requested_urls(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.url).collect()
    }
}

/// Build a response with a single `Content-Type` header.
pub fn response(status: u16, content_type: &str, body: &[u8]) -> HttpResponse {
    HttpResponse {
        status,
        headers: vec![("Content-Type".to_string(), content_type.to_string())],
        body: body.to_vec(),
    }
}

impl HttpClient for MockHttpClient {
    fn get(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        timeout: Duration,
    ) -> Result<HttpResponse, FetchError> {
        self.requests.lock().unwrap().push(RecordedRequest {
            url: url.to_string(),
            headers: headers
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            timeout,
        });
        match self.routes.get(url) {
            Some(Ok(resp)) => Ok(resp.clone()),
            Some(Err(message)) => Err(FetchError::Transport {
                url: url.to_string(),
                message: message.clone(),
            }),
            None => Ok(response(404, "text/plain", b"not found")),
        }
    }
}
