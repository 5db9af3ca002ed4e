//! CLI output formatting for every command.
//!
//! # Output Format
//!
//! ## Rename
//!
//! ```text
//! Rename plan (3 files, 2 changes)
//!     IMG_1.JPG → holiday_01.jpg
//!     IMG_2.JPG → holiday_02.jpg
//!     readme.txt (unchanged)
//! ```
//!
//! After `--apply`:
//!
//! ```text
//! Renamed 2 files
//!     Skipped IMG_3.JPG → holiday_03.jpg: Target exists: holiday_03.jpg
//! ```
//!
//! ## Scrape
//!
//! ```text
//! Fetching page...
//! Scanning page...
//! Found 12 candidates
//! Downloading 1/10
//!     Saved hero.jpg
//! Downloading 2/10
//!     Skipped https://cdn.example.com/logo.png: icon-sized 64x64
//! Saved 1 images.
//! ```
//!
//! ## Candidates
//!
//! ```text
//!  100 https://example.com/hero.jpg
//!   30 https://example.com/gallery/2.jpg
//! ```
//!
//! ## Compose
//!
//! ```text
//! Composed 3 layers → poster.png (1200x800)
//!     #1 base 1200x800
//!     #2 overlay 300x300 at (40, 40), 70% opacity
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use std::path::Path;

use crate::editor::Layer;
use crate::rename::{CommitReport, RenamePlan};
use crate::scrape::{ImageCandidate, ScrapeEvent};

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

// ============================================================================
// Rename
// ============================================================================

pub fn format_plan(plan: &RenamePlan) -> Vec<String> {
    let changes = plan.changes().count();
    let mut lines = vec![format!(
        "Rename plan ({} files, {} changes)",
        plan.len(),
        changes
    )];
    for entry in &plan.entries {
        if entry.is_noop() {
            lines.push(format!("    {} (unchanged)", entry.old_name));
        } else {
            lines.push(format!("    {} → {}", entry.old_name, entry.new_name));
        }
    }
    lines
}

pub fn print_plan(plan: &RenamePlan) {
    for line in format_plan(plan) {
        println!("{}", line);
    }
}

pub fn format_commit_report(report: &CommitReport) -> Vec<String> {
    let mut lines = vec![format!("Renamed {} files", report.renamed.len())];
    for failed in &report.failed {
        lines.push(format!(
            "    Skipped {} → {}: {}",
            failed.entry.old_name, failed.entry.new_name, failed.reason
        ));
    }
    lines
}

pub fn print_commit_report(report: &CommitReport) {
    for line in format_commit_report(report) {
        println!("{}", line);
    }
}

// ============================================================================
// Scrape
// ============================================================================

/// Format a single scrape progress event as display lines.
///
/// Pass boundaries have no line of their own; the download counter already
/// shows where the run is.
pub fn format_scrape_event(event: &ScrapeEvent) -> Vec<String> {
    match event {
        ScrapeEvent::FetchingPage { .. } => vec!["Fetching page...".to_string()],
        ScrapeEvent::Scanning => vec!["Scanning page...".to_string()],
        ScrapeEvent::CandidatesFound { count } => vec![format!("Found {} candidates", count)],
        ScrapeEvent::PassStarted { .. } => Vec::new(),
        ScrapeEvent::Downloading { index, limit, .. } => {
            vec![format!("Downloading {}/{}", index, limit)]
        }
        ScrapeEvent::Saved { path, .. } => vec![format!("    Saved {}", file_name(path))],
        ScrapeEvent::Skipped { url, reason } => vec![format!("    Skipped {}: {}", url, reason)],
        ScrapeEvent::Finished { saved: 0 } => vec!["No images matched the filters.".to_string()],
        ScrapeEvent::Finished { saved } => vec![format!("Saved {} images.", saved)],
    }
}

pub fn format_candidates(candidates: &[ImageCandidate]) -> Vec<String> {
    candidates
        .iter()
        .map(|c| format!("{:>4} {}", c.score, c.url))
        .collect()
}

pub fn print_candidates(candidates: &[ImageCandidate]) {
    for line in format_candidates(candidates) {
        println!("{}", line);
    }
}

// ============================================================================
// Compose
// ============================================================================

pub fn format_compose_output(layers: &[&Layer], output: &Path, size: (u32, u32)) -> Vec<String> {
    let mut lines = vec![format!(
        "Composed {} layers → {} ({}x{})",
        layers.len(),
        file_name(output),
        size.0,
        size.1
    )];
    for layer in layers {
        let bounds = layer.bounds();
        let (w, h) = (bounds.width.round() as i64, bounds.height.round() as i64);
        if layer.is_base {
            lines.push(format!("    {} base {}x{}", layer.id, w, h));
            continue;
        }
        let mut line = format!(
            "    {} overlay {}x{} at ({}, {})",
            layer.id,
            w,
            h,
            layer.position.x.round() as i64,
            layer.position.y.round() as i64
        );
        if layer.opacity < 1.0 {
            line.push_str(&format!(", {}% opacity", (layer.opacity * 100.0).round() as i64));
        }
        if !layer.visible {
            line.push_str(", hidden");
        }
        lines.push(line);
    }
    lines
}

pub fn print_compose_output(layers: &[&Layer], output: &Path, size: (u32, u32)) {
    for line in format_compose_output(layers, output, size) {
        println!("{}", line);
    }
}
