//! # Orca
//!
//! A small image toolkit with three independent parts:
//!
//! ```text
//! 1. Compose   base + overlays  →  export.png   (layer editor, undo/redo)
//! 2. Rename    folder + rule    →  plan → disk  (deterministic bulk rename)
//! 3. Scrape    page URL         →  folder       (find and save the real photos)
//! ```
//!
//! The parts share configuration, the image codec and the output formatting,
//! and nothing else. Each is usable as a library without the CLI.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`editor`] | Layer editor: placement, z order, export region, bounded history, compositing |
//! | [`rename`] | Rename rules, plan compilation, folder listing, plan commit |
//! | [`scrape`] | Candidate discovery and scoring, filtered downloads, HTTP seam |
//! | [`imaging`] | Pure-Rust codec: decode, resize, encode, dimension probing |
//! | [`config`] | `orca.toml` loading, merging over stock defaults, validation |
//! | [`output`] | CLI output formatting, one `format_*`/`print_*` pair per command |
//!
//! # Design Decisions
//!
//! ## Plan, Then Apply
//!
//! Renaming is split into a pure plan step and a commit step. A plan is a
//! list of `(old, new)` pairs computed without touching the disk, so it can
//! be previewed, serialized (`orca rename --json`) and tested exhaustively.
//! Only [`rename::commit_plan`] writes, and by default it refuses to start if
//! any target already exists.
//!
//! ## Export Region in Scene Space
//!
//! The editor has no viewport. The export region is a rectangle in scene
//! coordinates that starts as the base image's bounds and only changes when
//! the base is resized. Whatever a front end does with zoom and pan, the
//! exported pixels stay the same.
//!
//! ## Snapshots Share Pixels
//!
//! Undo history stores full snapshots, but pixel buffers are reference
//! counted and never mutated in place. A 30-step history of a 24 MP scene
//! costs 30 small layer tables, not 30 copies of the image.
//!
//! ## Seams at I/O
//!
//! The codec ([`imaging::ImageCodec`]) and the network
//! ([`scrape::HttpClient`]) are traits. Everything above them is exercised
//! in tests with a mock codec and a scripted HTTP client; no test touches
//! the network.
//!
//! ## Pure-Rust Imaging
//!
//! Decoding and encoding use the `image` crate; AVIF files found while
//! scraping are only measured (`avif-parse` reads the container header),
//! never decoded. The binary has no system dependencies.

pub mod config;
pub mod editor;
pub mod imaging;
pub mod output;
pub mod rename;
pub mod scrape;

#[cfg(test)]
pub(crate) mod test_helpers;
