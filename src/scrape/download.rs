//! Candidate download with size filters and content dedup.
//!
//! Candidates are tried in score order, one at a time. Each body must pass
//! the current [`FilterPass`]: HTTP 200, an accepted image media type,
//! enough bytes, enough pixels, not an icon-sized square, and a sane aspect
//! ratio. Bodies are deduplicated by SHA-256 so the same picture served
//! under two URLs is saved once.
//!
//! When the strict pass saves fewer than `min(3, limit)` images, a relaxed
//! pass runs over the candidates that were not saved yet.

use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use url::Url;

use super::candidates::ImageCandidate;
use super::http::{HttpClient, HttpResponse};
use super::{ScrapeEvent, Scraper};
use crate::config::FilterPass;
use crate::imaging::{Dimensions, aspect_ratio, is_icon_square, pixel_area, probe_dimensions};
use crate::rename::split_name;

const ACCEPTED_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp", "image/avif"];

/// Why a candidate was not saved.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Rejection {
    #[error("HTTP {0}")]
    Status(u16),
    #[error("unsupported content type `{0}`")]
    ContentType(String),
    #[error("{0}")]
    Network(String),
    #[error("too small: {0}")]
    TooSmall(String),
    #[error("not a readable image: {0}")]
    Undecodable(String),
    #[error("icon-sized {0}x{0}")]
    IconSized(u32),
    #[error("aspect ratio {0:.1} out of range")]
    AspectRatio(f64),
    #[error("duplicate content")]
    Duplicate,
    #[error("write failed: {0}")]
    Write(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassKind {
    Strict,
    Relaxed,
}

impl fmt::Display for PassKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PassKind::Strict => f.write_str("strict"),
            PassKind::Relaxed => f.write_str("relaxed"),
        }
    }
}

/// Check a response against one filter pass. Returns the probed size.
pub fn evaluate(response: &HttpResponse, pass: &FilterPass) -> Result<Dimensions, Rejection> {
    if response.status != 200 {
        return Err(Rejection::Status(response.status));
    }
    let media_type = response.media_type();
    if !ACCEPTED_TYPES.contains(&media_type.as_str()) {
        return Err(Rejection::ContentType(media_type));
    }
    if response.body.len() < pass.min_bytes {
        return Err(Rejection::TooSmall(format!(
            "{} bytes < {}",
            response.body.len(),
            pass.min_bytes
        )));
    }
    let dims = probe_dimensions(&response.body).map_err(|e| Rejection::Undecodable(e.to_string()))?;
    let area = pixel_area(dims.width, dims.height);
    if area < pass.min_pixels {
        return Err(Rejection::TooSmall(format!(
            "{}x{} < {} px",
            dims.width, dims.height, pass.min_pixels
        )));
    }
    if is_icon_square(dims.width, dims.height) {
        return Err(Rejection::IconSized(dims.width));
    }
    let ratio = aspect_ratio(dims.width, dims.height);
    if ratio >= pass.max_ratio {
        return Err(Rejection::AspectRatio(ratio));
    }
    Ok(dims)
}

/// SHA-256 of a body as lowercase hex.
pub fn content_hash(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// File name for a downloaded URL: its last non-empty path segment, or
/// `image_<n>.jpg` when there is none.
pub fn file_name_for(url: &str, n: usize) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| {
            u.path_segments()?
                .rev()
                .find(|s| !s.is_empty())
                .filter(|s| *s != "." && *s != "..")
                .map(str::to_string)
        })
        .unwrap_or_else(|| format!("image_{n}.jpg"))
}

/// First free path for `name` in `folder`: `name`, then `stem_1.ext`,
/// `stem_2.ext`, … (`.jpg` when the name has no extension).
pub fn unique_path(folder: &Path, name: &str) -> PathBuf {
    let target = folder.join(name);
    if !target.exists() {
        return target;
    }
    let (stem, ext) = split_name(name);
    let ext = if ext.is_empty() { ".jpg" } else { ext };
    (1u64..)
        .map(|i| folder.join(format!("{stem}_{i}{ext}")))
        .find(|p| !p.exists())
        .unwrap_or(target)
}

/// Progress shared by both passes.
#[derive(Default)]
struct DownloadState {
    saved: usize,
    hashes: HashSet<String>,
    saved_urls: HashSet<String>,
}

impl<H: HttpClient> Scraper<H> {
    /// Download up to `limit` candidates into `folder`. Returns how many
    /// were saved. Individual failures are reported as
    /// [`ScrapeEvent::Skipped`] and never abort the run.
    pub fn download_candidates(
        &self,
        candidates: &[ImageCandidate],
        folder: &Path,
        limit: usize,
        referer: Option<&str>,
    ) -> usize {
        let mut state = DownloadState::default();
        self.run_pass(PassKind::Strict, candidates, folder, limit, referer, &mut state);
        if state.saved < limit.min(3) {
            self.run_pass(PassKind::Relaxed, candidates, folder, limit, referer, &mut state);
        }
        state.saved
    }

    fn run_pass(
        &self,
        kind: PassKind,
        candidates: &[ImageCandidate],
        folder: &Path,
        limit: usize,
        referer: Option<&str>,
        state: &mut DownloadState,
    ) {
        let pass = match kind {
            PassKind::Strict => self.config.strict,
            PassKind::Relaxed => self.config.relaxed,
        };
        self.emit(ScrapeEvent::PassStarted { pass: kind });

        for candidate in candidates {
            if state.saved >= limit {
                break;
            }
            if state.saved_urls.contains(&candidate.url) {
                continue;
            }
            self.emit(ScrapeEvent::Downloading {
                index: state.saved + 1,
                limit,
                url: candidate.url.clone(),
            });
            match self.try_save(&candidate.url, &pass, folder, referer, state) {
                Ok(path) => {
                    state.saved += 1;
                    state.saved_urls.insert(candidate.url.clone());
                    self.emit(ScrapeEvent::Saved {
                        url: candidate.url.clone(),
                        path,
                    });
                }
                Err(reason) => {
                    log::debug!("{kind} pass skipped {}: {reason}", candidate.url);
                    self.emit(ScrapeEvent::Skipped {
                        url: candidate.url.clone(),
                        reason,
                    });
                }
            }
        }
    }

    fn try_save(
        &self,
        url: &str,
        pass: &FilterPass,
        folder: &Path,
        referer: Option<&str>,
        state: &mut DownloadState,
    ) -> Result<PathBuf, Rejection> {
        let response = self
            .fetch(url, referer, self.config.image_timeout_secs)
            .map_err(|e| Rejection::Network(e.to_string()))?;
        evaluate(&response, pass)?;

        let digest = content_hash(&response.body);
        if state.hashes.contains(&digest) {
            return Err(Rejection::Duplicate);
        }

        let target = unique_path(folder, &file_name_for(url, state.saved + 1));
        fs::write(&target, &response.body).map_err(|e| Rejection::Write(e.to_string()))?;
        state.hashes.insert(digest);
        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScraperConfig;
    use crate::test_helpers::{MockHttpClient, avif_bytes, jpeg_bytes, noisy_png, png_bytes, response};
    use tempfile::TempDir;

    fn candidate(url: &str) -> ImageCandidate {
        ImageCandidate {
            url: url.to_string(),
            score: 10,
        }
    }

    fn scraper(client: MockHttpClient) -> Scraper<MockHttpClient> {
        Scraper::new(client, ScraperConfig::default())
    }

    fn saved_files(tmp: &TempDir) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(tmp.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        names.sort();
        names
    }

    // =========================================================================
    // Filters
    // =========================================================================

    #[test]
    fn evaluate_accepts_large_photo() {
        let resp = response(200, "image/png", &noisy_png(300, 200, 1));
        let dims = evaluate(&resp, &FilterPass::strict()).unwrap();
        assert_eq!(dims, Dimensions { width: 300, height: 200 });
    }

    #[test]
    fn evaluate_rejects_bad_status_and_type() {
        let body = noisy_png(300, 200, 1);
        assert_eq!(
            evaluate(&response(404, "image/png", &body), &FilterPass::strict()),
            Err(Rejection::Status(404))
        );
        assert_eq!(
            evaluate(&response(200, "image/gif", &body), &FilterPass::strict()),
            Err(Rejection::ContentType("image/gif".into()))
        );
    }

    #[test]
    fn evaluate_accepts_content_type_parameters() {
        let resp = response(200, "IMAGE/PNG; charset=binary", &noisy_png(300, 200, 1));
        assert!(evaluate(&resp, &FilterPass::strict()).is_ok());
    }

    #[test]
    fn evaluate_rejects_small_bodies() {
        let resp = response(200, "image/png", &png_bytes(300, 300, [0, 0, 0, 255]));
        assert!(matches!(
            evaluate(&resp, &FilterPass::strict()),
            Err(Rejection::TooSmall(_))
        ));
    }

    #[test]
    fn evaluate_rejects_icon_squares() {
        // 150x150 = 22500 px passes the relaxed area floor but is an icon size
        let resp = response(200, "image/png", &noisy_png(150, 150, 2));
        assert_eq!(
            evaluate(&resp, &FilterPass::relaxed()),
            Err(Rejection::IconSized(150))
        );
    }

    #[test]
    fn evaluate_rejects_banners() {
        let resp = response(200, "image/png", &noisy_png(1100, 100, 3));
        assert!(matches!(
            evaluate(&resp, &FilterPass::strict()),
            Err(Rejection::AspectRatio(_))
        ));
        // The relaxed pass allows up to 20:1
        assert!(evaluate(&resp, &FilterPass::relaxed()).is_ok());
    }

    #[test]
    fn evaluate_accepts_avif() {
        let pass = FilterPass {
            min_bytes: 0,
            ..FilterPass::strict()
        };
        let resp = response(200, "image/avif", &avif_bytes(640, 480));
        assert_eq!(
            evaluate(&resp, &pass),
            Ok(Dimensions {
                width: 640,
                height: 480
            })
        );
        // Measured size still feeds the shape filters
        let resp = response(200, "image/avif", &avif_bytes(128, 128));
        assert_eq!(evaluate(&resp, &pass), Err(Rejection::TooSmall("128x128 < 40000 px".into())));
    }

    #[test]
    fn evaluate_rejects_undecodable_body() {
        let resp = response(200, "image/jpeg", &[7u8; 8000]);
        assert!(matches!(
            evaluate(&resp, &FilterPass::strict()),
            Err(Rejection::Undecodable(_))
        ));
    }

    // =========================================================================
    // Naming
    // =========================================================================

    #[test]
    fn file_name_from_last_segment() {
        assert_eq!(file_name_for("https://x.com/a/b/photo.jpg?w=1", 1), "photo.jpg");
        assert_eq!(file_name_for("https://x.com/a/gallery/", 1), "gallery");
        assert_eq!(file_name_for("https://x.com/", 4), "image_4.jpg");
    }

    #[test]
    fn unique_path_counts_from_one() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("a.png"), b"x").unwrap();
        fs::write(tmp.path().join("a_1.png"), b"x").unwrap();
        assert_eq!(unique_path(tmp.path(), "a.png"), tmp.path().join("a_2.png"));
        assert_eq!(unique_path(tmp.path(), "b.png"), tmp.path().join("b.png"));

        fs::write(tmp.path().join("raw"), b"x").unwrap();
        assert_eq!(unique_path(tmp.path(), "raw"), tmp.path().join("raw_1.jpg"));
    }

    #[test]
    fn content_hash_is_hex_sha256() {
        assert_eq!(
            content_hash(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    // =========================================================================
    // Download passes
    // =========================================================================

    #[test]
    fn identical_bodies_are_saved_once() {
        let body = noisy_png(300, 300, 9);
        let client = MockHttpClient::new()
            .with_image("https://x.com/a.png", "image/png", body.clone())
            .with_image("https://x.com/b.png", "image/png", body);
        let tmp = TempDir::new().unwrap();
        let saved = scraper(client).download_candidates(
            &[candidate("https://x.com/a.png"), candidate("https://x.com/b.png")],
            tmp.path(),
            10,
            None,
        );
        assert_eq!(saved, 1);
        assert_eq!(saved_files(&tmp), vec!["a.png"]);
    }

    #[test]
    fn stops_at_limit() {
        let client = MockHttpClient::new()
            .with_image("https://x.com/1.png", "image/png", noisy_png(300, 300, 1))
            .with_image("https://x.com/2.png", "image/png", noisy_png(300, 300, 2))
            .with_image("https://x.com/3.png", "image/png", noisy_png(300, 300, 3));
        let tmp = TempDir::new().unwrap();
        let s = scraper(client);
        let candidates: Vec<ImageCandidate> = (1..=3)
            .map(|i| candidate(&format!("https://x.com/{i}.png")))
            .collect();
        assert_eq!(s.download_candidates(&candidates, tmp.path(), 2, None), 2);
        assert_eq!(saved_files(&tmp), vec!["1.png", "2.png"]);
        // Two saved reaches min(3, 2), so no relaxed retry
        assert_eq!(s.client.requests().len(), 2);
    }

    #[test]
    fn relaxed_pass_rescues_medium_images() {
        // 120x120 = 14400 px: below strict 40000, above relaxed 10000
        let client = MockHttpClient::new()
            .with_image("https://x.com/big.png", "image/png", noisy_png(400, 300, 1))
            .with_image("https://x.com/medium.png", "image/png", noisy_png(120, 120, 2));
        let tmp = TempDir::new().unwrap();
        let s = scraper(client);
        let saved = s.download_candidates(
            &[candidate("https://x.com/big.png"), candidate("https://x.com/medium.png")],
            tmp.path(),
            10,
            None,
        );
        assert_eq!(saved, 2);
        // Strict tries both, relaxed retries only the unsaved one
        assert_eq!(
            s.client.requested_urls(),
            vec![
                "https://x.com/big.png",
                "https://x.com/medium.png",
                "https://x.com/medium.png",
            ]
        );
    }

    #[test]
    fn failures_are_skipped_not_fatal() {
        let client = MockHttpClient::new()
            .with_failure("https://x.com/down.png")
            .with_status("https://x.com/gone.png", 410)
            .with_image("https://x.com/page.png", "text/html", noisy_png(300, 300, 1))
            .with_image("https://x.com/ok.jpg", "image/jpeg", jpeg_bytes(1024, 768));
        let tmp = TempDir::new().unwrap();
        let (tx, rx) = std::sync::mpsc::channel();
        let s = scraper(client).with_events(tx);
        let saved = s.download_candidates(
            &[
                candidate("https://x.com/down.png"),
                candidate("https://x.com/gone.png"),
                candidate("https://x.com/page.png"),
                candidate("https://x.com/ok.jpg"),
            ],
            tmp.path(),
            10,
            Some("https://x.com/"),
        );
        drop(s);
        assert_eq!(saved, 1);
        assert_eq!(saved_files(&tmp), vec!["ok.jpg"]);

        let events: Vec<ScrapeEvent> = rx.iter().collect();
        let skipped = events
            .iter()
            .filter(|e| matches!(e, ScrapeEvent::Skipped { .. }))
            .count();
        // Three failures in each of the two passes
        assert_eq!(skipped, 6);
        assert!(events.iter().any(|e| matches!(
            e,
            ScrapeEvent::Skipped { reason: Rejection::Network(_), .. }
        )));
    }

    #[test]
    fn image_requests_carry_browser_headers() {
        let client = MockHttpClient::new()
            .with_image("https://x.com/a.png", "image/png", noisy_png(300, 300, 1));
        let tmp = TempDir::new().unwrap();
        let s = scraper(client);
        s.download_candidates(&[candidate("https://x.com/a.png")], tmp.path(), 1, Some("https://x.com/p"));
        let request = &s.client.requests()[0];
        let header = |name: &str| {
            request
                .headers
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.clone())
        };
        assert_eq!(header("Referer").as_deref(), Some("https://x.com/p"));
        assert!(header("User-Agent").unwrap().starts_with("Mozilla/5.0"));
        assert_eq!(request.timeout, std::time::Duration::from_secs(20));
    }

    #[test]
    fn name_collisions_get_numbered() {
        let client = MockHttpClient::new()
            .with_image("https://x.com/a/photo.png", "image/png", noisy_png(300, 300, 1))
            .with_image("https://x.com/b/photo.png", "image/png", noisy_png(300, 300, 2));
        let tmp = TempDir::new().unwrap();
        let saved = scraper(client).download_candidates(
            &[candidate("https://x.com/a/photo.png"), candidate("https://x.com/b/photo.png")],
            tmp.path(),
            10,
            None,
        );
        assert_eq!(saved, 2);
        assert_eq!(saved_files(&tmp), vec!["photo.png", "photo_1.png"]);
    }
}
