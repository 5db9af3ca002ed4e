//! Image scraping: find the real photos on a page and save them.
//!
//! A scrape is one [`Scraper::run`] call:
//!
//! ```text
//! fetch page ──► collect_candidates ──► download_candidates ──► summary
//!                (score, upgrade,        (strict pass, then
//!                 penalize, sort)         relaxed if too few)
//! ```
//!
//! Network access goes through [`HttpClient`] so everything above the wire
//! is testable with scripted responses. Progress is streamed as
//! [`ScrapeEvent`]s over an optional channel; rendering them is the
//! caller's business (see `output::format_scrape_event`).
//!
//! ## Module map
//!
//! | Module | Contents |
//! |---|---|
//! | `http` | [`HttpClient`] trait, [`HttpResponse`], `ureq`-backed [`UreqClient`] |
//! | `candidates` | HTML scan rules, URL normalization/upgrade, scoring |
//! | `srcset` | `srcset` parsing |
//! | `download` | Filter passes, content dedup, file naming |

mod candidates;
mod download;
mod http;
mod srcset;

pub use candidates::{ImageCandidate, collect_candidates, normalize_url, upgrade_url};
pub use download::{PassKind, Rejection, content_hash, evaluate, file_name_for, unique_path};
pub use http::{FetchError, HttpClient, HttpResponse, UreqClient};
pub use srcset::{LARGE_WIDTH, best_candidate, max_width, srcset_score};

use std::fs;
use std::path::PathBuf;
use std::sync::mpsc::Sender;
use std::time::Duration;
use thiserror::Error;

use crate::config::ScraperConfig;

#[derive(Error, Debug)]
pub enum ScrapeError {
    #[error("Invalid URL `{0}`: include http:// or https://")]
    InvalidUrl(String),
    #[error("Could not download the page {url}")]
    PageFetch {
        url: String,
        #[source]
        source: FetchError,
    },
    #[error("Could not download the page {url}: HTTP {status}")]
    PageStatus { url: String, status: u16 },
    #[error("No images found on the page {url}")]
    NoCandidates { url: String },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Progress of a scrape, in the order things happen.
#[derive(Debug, Clone)]
pub enum ScrapeEvent {
    FetchingPage { url: String },
    Scanning,
    CandidatesFound { count: usize },
    PassStarted { pass: PassKind },
    /// `index` is the number the image will get if it is saved.
    Downloading { index: usize, limit: usize, url: String },
    Saved { url: String, path: PathBuf },
    Skipped { url: String, reason: Rejection },
    Finished { saved: usize },
}

#[derive(Debug, Clone)]
pub struct ScrapeRequest {
    pub url: String,
    pub folder: PathBuf,
    pub limit: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeSummary {
    pub candidates: usize,
    pub saved: usize,
}

pub struct Scraper<H: HttpClient = UreqClient> {
    client: H,
    config: ScraperConfig,
    events: Option<Sender<ScrapeEvent>>,
}

impl Scraper<UreqClient> {
    pub fn with_config(config: ScraperConfig) -> Self {
        Self::new(UreqClient::new(), config)
    }
}

impl<H: HttpClient> Scraper<H> {
    pub fn new(client: H, config: ScraperConfig) -> Self {
        Self {
            client,
            config,
            events: None,
        }
    }

    /// Stream progress events to `sender`. Send failures are ignored.
    pub fn with_events(mut self, sender: Sender<ScrapeEvent>) -> Self {
        self.events = Some(sender);
        self
    }

    pub fn config(&self) -> &ScraperConfig {
        &self.config
    }

    fn emit(&self, event: ScrapeEvent) {
        if let Some(tx) = &self.events {
            tx.send(event).ok();
        }
    }

    /// GET with the browser-like headers every request carries.
    fn fetch(
        &self,
        url: &str,
        referer: Option<&str>,
        timeout_secs: u64,
    ) -> Result<HttpResponse, FetchError> {
        let mut headers = vec![
            ("User-Agent", self.config.user_agent.as_str()),
            ("Accept", self.config.accept.as_str()),
        ];
        if let Some(referer) = referer {
            headers.push(("Referer", referer));
        }
        self.client
            .get(url, &headers, Duration::from_secs(timeout_secs))
    }

    /// Fetch `url` and return its scored image candidates, best first.
    pub fn candidates(&self, url: &str) -> Result<Vec<ImageCandidate>, ScrapeError> {
        validate_url(url)?;
        self.emit(ScrapeEvent::FetchingPage {
            url: url.to_string(),
        });
        let page = self
            .fetch(url, Some(url), self.config.page_timeout_secs)
            .map_err(|source| ScrapeError::PageFetch {
                url: url.to_string(),
                source,
            })?;
        if !page.is_success() {
            return Err(ScrapeError::PageStatus {
                url: url.to_string(),
                status: page.status,
            });
        }

        self.emit(ScrapeEvent::Scanning);
        let found = collect_candidates(&page.text(), url);
        log::debug!("{} candidates on {url}", found.len());
        Ok(found)
    }

    /// Full scrape: page, candidates, downloads.
    pub fn run(&self, request: &ScrapeRequest) -> Result<ScrapeSummary, ScrapeError> {
        let url = request.url.trim();
        let candidates = self.candidates(url)?;
        if candidates.is_empty() {
            return Err(ScrapeError::NoCandidates {
                url: url.to_string(),
            });
        }
        self.emit(ScrapeEvent::CandidatesFound {
            count: candidates.len(),
        });

        fs::create_dir_all(&request.folder)?;
        let saved = self.download_candidates(&candidates, &request.folder, request.limit, Some(url));
        self.emit(ScrapeEvent::Finished { saved });

        Ok(ScrapeSummary {
            candidates: candidates.len(),
            saved,
        })
    }
}

fn validate_url(url: &str) -> Result<(), ScrapeError> {
    let lower = url.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        Ok(())
    } else {
        Err(ScrapeError::InvalidUrl(url.to_string()))
    }
}
