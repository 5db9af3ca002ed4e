//! Image candidate discovery and scoring.
//!
//! A page is scanned by a fixed table of rules, strongest signal first:
//!
//! | Rule | Source | Score |
//! |---|---|---|
//! | Social meta | `og:image`, `og:image:secure_url`, `twitter:image`, `article:image` | 100 |
//! | Legacy link | `link[rel~=image_src]` | 90 |
//! | Picture | `<picture><source srcset>` widest entry | 50 if ≥1200w, else 30 |
//! | Img | first present of `data-srcset`, `srcset`, `data-src`, … `src` | 50/30 srcset, 30 full-size hints, 10 plain |
//! | Background | inline `background-image: url(...)` | 20 |
//! | Data attrs | `data-*` keys mentioning image/img/photo/picture | 20, srcset keys 30 |
//!
//! Every URL is resolved against the page URL, then also tried through an
//! upgrade transform that asks for a bigger rendition; an upgraded variant
//! scores +5. A URL keeps the highest score any rule gave it. Finally URLs
//! that look like thumbnails or icons are penalized and the list is sorted
//! by score, ties in discovery order.

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::LazyLock;
use url::Url;

use super::srcset::{best_candidate, srcset_score};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageCandidate {
    pub url: String,
    pub score: i32,
}

/// How a scan rule pulls URLs out of the elements its selector matches.
#[derive(Debug, Clone, Copy)]
enum Extract {
    /// Attribute of the first matching element only.
    FirstAttr(&'static str, i32),
    PictureSource,
    ImgAttributes,
    BackgroundStyle,
    DataAttributes,
}

const SCAN_RULES: &[(&str, Extract)] = &[
    (r#"meta[property="og:image"]"#, Extract::FirstAttr("content", 100)),
    (r#"meta[property="og:image:secure_url"]"#, Extract::FirstAttr("content", 100)),
    (r#"meta[name="twitter:image"]"#, Extract::FirstAttr("content", 100)),
    (r#"meta[property="article:image"]"#, Extract::FirstAttr("content", 100)),
    ("link[rel~=image_src]", Extract::FirstAttr("href", 90)),
    ("picture source", Extract::PictureSource),
    ("img", Extract::ImgAttributes),
    ("[style]", Extract::BackgroundStyle),
    ("*", Extract::DataAttributes),
];

static COMPILED_RULES: LazyLock<Vec<(Selector, Extract)>> = LazyLock::new(|| {
    SCAN_RULES
        .iter()
        .filter_map(|(css, extract)| Selector::parse(css).ok().map(|s| (s, *extract)))
        .collect()
});

/// `<img>` attributes in priority order with the score a plain URL gets.
const IMG_ATTRIBUTES: &[(&str, i32)] = &[
    ("data-srcset", 0),
    ("srcset", 0),
    ("data-src", 10),
    ("data-original", 30),
    ("data-lazy-src", 10),
    ("data-full", 30),
    ("data-large", 30),
    ("src", 10),
];

const DATA_KEY_TOKENS: &[&str] = &["image", "img", "photo", "picture"];
const PENALTY_TOKENS: &[&str] = &["thumb", "thumbnail", "icon", "avatar", "logo"];

static BACKGROUND_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)background-image\s*:\s*url\(([^)]+)\)").unwrap());
static SIZE_SEGMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"/s\d+x\d+/").unwrap());
static SMALL_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(_s|-sm|_small|-small|thumb)").unwrap());

const SIZE_PARAMS: &[&str] = &["w", "h", "width", "height"];

/// Accumulates the best score per URL, remembering discovery order.
struct ScoreBoard {
    base: Option<Url>,
    order: Vec<String>,
    scores: HashMap<String, i32>,
}

impl ScoreBoard {
    fn new(base_url: &str) -> Self {
        Self {
            base: Url::parse(base_url).ok(),
            order: Vec::new(),
            scores: HashMap::new(),
        }
    }

    fn add(&mut self, raw: &str, score: i32) {
        let Some(absolute) = normalize_url(raw, self.base.as_ref()) else {
            return;
        };
        let upgraded = upgrade_url(&absolute);
        if upgraded != absolute {
            self.record(absolute, score);
            self.record(upgraded, score + 5);
        } else {
            self.record(absolute, score);
        }
    }

    fn record(&mut self, url: String, score: i32) {
        match self.scores.get_mut(&url) {
            Some(best) => *best = (*best).max(score),
            None => {
                self.scores.insert(url.clone(), score);
                self.order.push(url);
            }
        }
    }

    fn finish(self) -> Vec<ImageCandidate> {
        let mut out: Vec<ImageCandidate> = self
            .order
            .into_iter()
            .map(|url| {
                let score = self.scores.get(&url).copied().unwrap_or_default();
                ImageCandidate {
                    score: score + penalty(&url),
                    url,
                }
            })
            .collect();
        out.sort_by(|a, b| b.score.cmp(&a.score));
        out
    }
}

/// Scan `html` for image URLs, best first.
pub fn collect_candidates(html: &str, base_url: &str) -> Vec<ImageCandidate> {
    let document = Html::parse_document(html);
    let mut board = ScoreBoard::new(base_url);

    for (selector, extract) in COMPILED_RULES.iter() {
        match *extract {
            Extract::FirstAttr(attr, score) => {
                if let Some(value) = document.select(selector).next().and_then(|e| e.attr(attr)) {
                    board.add(value, score);
                }
            }
            Extract::PictureSource => {
                for source in document.select(selector) {
                    let srcset = source.attr("srcset").or_else(|| source.attr("data-srcset"));
                    if let Some(srcset) = srcset.filter(|s| !s.trim().is_empty())
                        && let Some(best) = best_candidate(srcset)
                    {
                        board.add(best, srcset_score(srcset));
                    }
                }
            }
            Extract::ImgAttributes => {
                for img in document.select(selector) {
                    scan_img(&img, &mut board);
                }
            }
            Extract::BackgroundStyle => {
                for element in document.select(selector) {
                    let style = element.attr("style").unwrap_or("");
                    if let Some(caps) = BACKGROUND_URL.captures(style) {
                        board.add(caps[1].trim_matches([' ', '\'', '"']), 20);
                    }
                }
            }
            Extract::DataAttributes => {
                for element in document.select(selector) {
                    scan_data_attributes(&element, &mut board);
                }
            }
        }
    }

    board.finish()
}

/// First present attribute wins; an unparsable srcset falls through.
fn scan_img(img: &ElementRef, board: &mut ScoreBoard) {
    for &(attr, score) in IMG_ATTRIBUTES {
        let Some(value) = img.attr(attr).filter(|v| !v.is_empty()) else {
            continue;
        };
        if attr.contains("srcset") {
            if let Some(best) = best_candidate(value) {
                board.add(best, srcset_score(value));
                return;
            }
        } else {
            board.add(value, score);
            return;
        }
    }
}

fn scan_data_attributes(element: &ElementRef, board: &mut ScoreBoard) {
    for (key, value) in element.value().attrs() {
        let key = key.to_ascii_lowercase();
        if !key.starts_with("data-") || value.is_empty() {
            continue;
        }
        if !DATA_KEY_TOKENS.iter().any(|t| key.contains(t)) {
            continue;
        }
        if key.contains("srcset") {
            if let Some(best) = best_candidate(value) {
                board.add(best, 30);
            }
        } else {
            board.add(value, 20);
        }
    }
}

/// Resolve a raw attribute value to an absolute http(s) URL.
///
/// `data:` URIs are dropped and protocol-relative URLs become `https`.
pub fn normalize_url(raw: &str, base: Option<&Url>) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() || raw.get(..5).is_some_and(|p| p.eq_ignore_ascii_case("data:")) {
        return None;
    }
    let url = if raw.starts_with("//") {
        Url::parse(&format!("https:{raw}")).ok()?
    } else {
        match base {
            Some(base) => base.join(raw).ok()?,
            None => Url::parse(raw).ok()?,
        }
    };
    matches!(url.scheme(), "http" | "https").then(|| url.into())
}

/// Ask for a larger rendition of the same image.
///
/// Rewrites `/sNNxNN/` size segments, replaces small-size tokens with
/// `large`, and drops resize query parameters.
pub fn upgrade_url(url: &str) -> String {
    let upgraded = SIZE_SEGMENT.replace_all(url, "/s1080x1080/");
    let upgraded = SMALL_TOKEN.replace_all(&upgraded, "large");
    strip_size_params(&upgraded)
}

fn strip_size_params(url: &str) -> String {
    let Ok(mut parsed) = Url::parse(url) else {
        return url.to_string();
    };
    if parsed.query().is_none() {
        return url.to_string();
    }
    let pairs: Vec<(String, String)> = parsed.query_pairs().into_owned().collect();
    let kept: Vec<&(String, String)> = pairs
        .iter()
        .filter(|(k, _)| !SIZE_PARAMS.contains(&k.to_ascii_lowercase().as_str()))
        .collect();
    if kept.len() == pairs.len() {
        return url.to_string();
    }
    if kept.is_empty() {
        parsed.set_query(None);
    } else {
        parsed
            .query_pairs_mut()
            .clear()
            .extend_pairs(kept.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    }
    parsed.into()
}

fn penalty(url: &str) -> i32 {
    let lower = url.to_lowercase();
    let mut penalty = 0;
    if PENALTY_TOKENS.iter().any(|t| lower.contains(t)) {
        penalty -= 20;
    }
    if lower.ends_with(".svg") || lower.ends_with(".gif") {
        penalty -= 30;
    }
    penalty
}
