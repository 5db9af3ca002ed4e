//! `srcset` attribute parsing.
//!
//! Entries are comma separated; each is a URL optionally followed by a
//! descriptor. Only width descriptors (`800w`) are understood; density
//! descriptors (`2x`) and bare URLs count as width 0.

use regex::Regex;
use std::sync::LazyLock;

static WIDTH: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+)w").unwrap());

/// Declared width used to decide whether a srcset offers a large image.
pub const LARGE_WIDTH: u32 = 1200;

fn descriptor_width(token: &str) -> u32 {
    WIDTH
        .captures(token)
        .and_then(|c| c[1].parse().ok())
        .unwrap_or(0)
}

fn entries(srcset: &str) -> impl Iterator<Item = (&str, Option<&str>)> {
    srcset.split(',').filter_map(|part| {
        let mut bits = part.split_whitespace();
        let url = bits.next()?;
        Some((url, bits.next()))
    })
}

/// URL of the widest entry. Earlier entries win ties.
pub fn best_candidate(srcset: &str) -> Option<&str> {
    let mut best: Option<(&str, i64)> = None;
    for (url, descriptor) in entries(srcset) {
        let width = i64::from(descriptor.map_or(0, descriptor_width));
        if best.is_none_or(|(_, w)| width > w) {
            best = Some((url, width));
        }
    }
    best.map(|(url, _)| url)
}

/// Largest declared width, 0 when none is declared.
pub fn max_width(srcset: &str) -> u32 {
    entries(srcset)
        .filter_map(|(_, d)| d.map(descriptor_width))
        .max()
        .unwrap_or(0)
}

/// Score for a srcset-derived URL: 50 when it offers a large image, else 30.
pub fn srcset_score(srcset: &str) -> i32 {
    if max_width(srcset) >= LARGE_WIDTH { 50 } else { 30 }
}
