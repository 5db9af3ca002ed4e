//! Toolkit configuration module.
//!
//! Handles loading, validating, and merging `orca.toml`. Stock defaults are
//! overridden by whatever the user file sets; every component receives its
//! own section as an explicit struct ([`EditorConfig`], [`ScraperConfig`],
//! [`RenameConfig`]) instead of reading global state.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [editor]
//! history_limit = 30        # Undo snapshots kept (oldest dropped first)
//! overlay_z = 5.0           # Z order given to newly added overlays
//! scene_padding = 2000.0    # Minimum padding around the export region
//! export_quality = 90       # JPEG quality for exports (1-100)
//!
//! [scraper]
//! page_timeout_secs = 15
//! image_timeout_secs = 20
//! limit = 50
//! user_agent = "Mozilla/5.0 ..."
//! accept = "image/avif,image/webp,image/apng,image/*,*/*;q=0.8"
//!
//! [scraper.strict]          # First download pass
//! min_pixels = 40000
//! min_bytes = 5120
//! max_ratio = 10.0
//!
//! [scraper.relaxed]         # Second pass, only when the first saved too few
//! min_pixels = 10000
//! min_bytes = 2048
//! max_ratio = 20.0
//!
//! [rename]
//! ignore = [".DS_Store", "Thumbs.db", "*.tmp", ...]
//!
//! [processing]
//! max_processes = 4         # Compositing threads (omit for auto = CPU cores)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Name of the config file looked up in the config directory.
pub const CONFIG_FILENAME: &str = "orca.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Toolkit configuration loaded from `orca.toml`.
///
/// All fields have defaults. User config files need only specify the values
/// they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolkitConfig {
    /// Layer editor settings (history depth, overlay placement, export).
    pub editor: EditorConfig,
    /// Image scraper settings (timeouts, headers, filter passes).
    pub scraper: ScraperConfig,
    /// Rename planner settings (folder ignore patterns).
    pub rename: RenameConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl ToolkitConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.editor.history_limit == 0 {
            return Err(ConfigError::Validation(
                "editor.history_limit must be at least 1".into(),
            ));
        }
        if !(self.editor.scene_padding.is_finite() && self.editor.scene_padding >= 0.0) {
            return Err(ConfigError::Validation(
                "editor.scene_padding must be a non-negative number".into(),
            ));
        }
        if !(1..=100).contains(&self.editor.export_quality) {
            return Err(ConfigError::Validation(
                "editor.export_quality must be 1-100".into(),
            ));
        }
        if self.scraper.page_timeout_secs == 0 || self.scraper.image_timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "scraper timeouts must be non-zero".into(),
            ));
        }
        if self.scraper.limit == 0 {
            return Err(ConfigError::Validation(
                "scraper.limit must be at least 1".into(),
            ));
        }
        for (name, pass) in [
            ("strict", &self.scraper.strict),
            ("relaxed", &self.scraper.relaxed),
        ] {
            if !(pass.max_ratio >= 1.0) {
                return Err(ConfigError::Validation(format!(
                    "scraper.{name}.max_ratio must be >= 1.0"
                )));
            }
        }
        Ok(())
    }
}

/// Layer editor settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EditorConfig {
    /// Maximum number of undo snapshots, including the current state.
    pub history_limit: usize,
    /// Z order assigned to new overlays (the base layer sits at 0).
    pub overlay_z: f64,
    /// Minimum padding between the export region and the scene bounds.
    pub scene_padding: f64,
    /// JPEG quality used when exporting without an explicit quality.
    pub export_quality: u32,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history_limit: 30,
            overlay_z: 5.0,
            scene_padding: 2000.0,
            export_quality: 90,
        }
    }
}

/// Thresholds applied to every downloaded image in one pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilterPass {
    /// Minimum decoded area in pixels.
    pub min_pixels: u64,
    /// Minimum response body size in bytes.
    pub min_bytes: usize,
    /// Long/short side ratio must stay strictly below this.
    pub max_ratio: f64,
}

impl FilterPass {
    pub fn strict() -> Self {
        Self {
            min_pixels: 40_000,
            min_bytes: 5 * 1024,
            max_ratio: 10.0,
        }
    }

    pub fn relaxed() -> Self {
        Self {
            min_pixels: 10_000,
            min_bytes: 2 * 1024,
            max_ratio: 20.0,
        }
    }
}

/// Image scraper settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScraperConfig {
    /// Timeout for the HTML page request.
    pub page_timeout_secs: u64,
    /// Timeout for each image request.
    pub image_timeout_secs: u64,
    /// Default maximum number of images saved per scrape.
    pub limit: usize,
    /// `User-Agent` sent with every request. Many sites refuse unknown agents.
    pub user_agent: String,
    /// `Accept` header sent with every request.
    pub accept: String,
    /// First download pass.
    pub strict: FilterPass,
    /// Fallback pass used when the strict pass saved too few images.
    pub relaxed: FilterPass,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            page_timeout_secs: 15,
            image_timeout_secs: 20,
            limit: 50,
            user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
                         AppleWebKit/537.36 (KHTML, like Gecko) \
                         Chrome/120.0.0.0 Safari/537.36"
                .to_string(),
            accept: "image/avif,image/webp,image/apng,image/*,*/*;q=0.8".to_string(),
            strict: FilterPass::strict(),
            relaxed: FilterPass::relaxed(),
        }
    }
}

/// Rename planner settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenameConfig {
    /// Glob patterns (`*`, `?`) for files never offered for renaming.
    pub ignore: Vec<String>,
}

impl Default for RenameConfig {
    fn default() -> Self {
        Self {
            ignore: DEFAULT_IGNORE.iter().map(|s| s.to_string()).collect(),
        }
    }
}

const DEFAULT_IGNORE: &[&str] = &[
    ".DS_Store",
    ".DS_Store?",
    "Thumbs.db",
    "ehthumbs.db",
    "desktop.ini",
    "*.swp",
    "*.swo",
    "*.bak",
    "*.tmp",
    "*.log",
    ".env",
    ".env.local",
    ".env.*.local",
    "*.out",
    "*.class",
    "*.exe",
    "*.dll",
    "*.so",
    "*.dylib",
    "*.o",
    "*.a",
    "*.pyc",
    "*.pyo",
    "*.pyd",
    "package-lock.json",
    "yarn.lock",
    "pnpm-lock.yaml",
    "*.pid",
    "*.seed",
    "*.tgz",
    "*.zip",
];

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of compositing threads.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)`, at least 1
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    toml::Value::try_from(ToolkitConfig::default())
        .map_err(|e| ConfigError::Validation(format!("default config must serialize: {e}")))
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `orca.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(dir: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = dir.join(CONFIG_FILENAME);
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<ToolkitConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: ToolkitConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `orca.toml` in the given directory.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result.
pub fn load_config(dir: &Path) -> Result<ToolkitConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = load_raw_config(dir)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `orca.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Orca Configuration
# ==================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Layer editor
# ---------------------------------------------------------------------------
[editor]
# Undo snapshots kept, including the current state. Oldest are dropped first.
history_limit = 30

# Z order given to newly added overlays. The base image sits at 0.
overlay_z = 5.0

# Minimum padding (scene units) around the export region. Overlays are
# centered in the padded scene.
scene_padding = 2000.0

# JPEG quality for exports (1 = worst, 100 = best).
export_quality = 90

# ---------------------------------------------------------------------------
# Image scraper
# ---------------------------------------------------------------------------
[scraper]
page_timeout_secs = 15
image_timeout_secs = 20

# Maximum images saved per scrape when --limit is not given.
limit = 50

user_agent = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
accept = "image/avif,image/webp,image/apng,image/*,*/*;q=0.8"

# First pass: only reasonably large photos.
[scraper.strict]
min_pixels = 40000
min_bytes = 5120
max_ratio = 10.0

# Second pass, used only when the first saved fewer than min(3, limit).
[scraper.relaxed]
min_pixels = 10000
min_bytes = 2048
max_ratio = 20.0

# ---------------------------------------------------------------------------
# Rename planner
# ---------------------------------------------------------------------------
[rename]
# Files matching these globs are never listed for renaming.
ignore = [
    ".DS_Store", ".DS_Store?", "Thumbs.db", "ehthumbs.db", "desktop.ini",
    "*.swp", "*.swo", "*.bak", "*.tmp", "*.log",
    ".env", ".env.local", ".env.*.local",
    "*.out", "*.class", "*.exe", "*.dll", "*.so", "*.dylib", "*.o", "*.a",
    "*.pyc", "*.pyo", "*.pyd",
    "package-lock.json", "yarn.lock", "pnpm-lock.yaml",
    "*.pid", "*.seed", "*.tgz", "*.zip",
]

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum compositing threads.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
