//! Declarative rename rules and their compiled form.
//!
//! A [`RenameRule`] is plain data, usually loaded from a JSON or TOML file:
//!
//! ```json
//! {
//!   "case": "lower",
//!   "replace": [{ "pattern": "\\s+", "replacement": "-" }],
//!   "skip_if_matches": ["^keep"],
//!   "numbering": { "enabled": true, "padding": 3, "prefix": "img-" }
//! }
//! ```
//!
//! [`RenameRule::compile`] validates every regex once and produces a
//! [`CompiledRule`], which is what the planner runs.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

use super::naming::normalize_extension;

#[derive(Error, Debug)]
pub enum RuleError {
    #[error("Invalid pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaseMode {
    #[default]
    None,
    Lower,
    Upper,
}

impl CaseMode {
    pub fn apply(self, text: &str) -> String {
        match self {
            CaseMode::None => text.to_string(),
            CaseMode::Lower => text.to_lowercase(),
            CaseMode::Upper => text.to_uppercase(),
        }
    }
}

/// One regex substitution applied to the stem.
///
/// The replacement uses `regex` syntax: `$1` or `${name}` for groups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReplaceRule {
    pub pattern: String,
    #[serde(default)]
    pub replacement: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Numbering {
    pub enabled: bool,
    pub start: u64,
    pub padding: usize,
    pub prefix: String,
    pub suffix: String,
    /// Leave files whose original stem already starts with digits unnumbered.
    pub skip_if_numbered: bool,
}

impl Default for Numbering {
    fn default() -> Self {
        Self {
            enabled: false,
            start: 1,
            padding: 2,
            prefix: String::new(),
            suffix: String::new(),
            skip_if_numbered: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenameRule {
    pub preserve_extensions: bool,
    /// Replacement extension when `preserve_extensions` is off.
    pub extension: String,
    pub case: CaseMode,
    pub prefix: String,
    pub suffix: String,
    pub replace: Vec<ReplaceRule>,
    /// Regexes searched in the original stem; any hit leaves the name alone.
    pub skip_if_matches: Vec<String>,
    pub numbering: Numbering,
}

impl Default for RenameRule {
    fn default() -> Self {
        Self {
            preserve_extensions: true,
            extension: String::new(),
            case: CaseMode::None,
            prefix: String::new(),
            suffix: String::new(),
            replace: Vec::new(),
            skip_if_matches: Vec::new(),
            numbering: Numbering::default(),
        }
    }
}

impl RenameRule {
    pub fn from_json(text: &str) -> Result<Self, RuleError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_toml(text: &str) -> Result<Self, RuleError> {
        Ok(toml::from_str(text)?)
    }

    /// Load a rule file. `.toml` files are read as TOML, anything else as JSON.
    pub fn load(path: &Path) -> Result<Self, RuleError> {
        let text = fs::read_to_string(path)?;
        let is_toml = path
            .extension()
            .is_some_and(|e| e.eq_ignore_ascii_case("toml"));
        if is_toml {
            Self::from_toml(&text)
        } else {
            Self::from_json(&text)
        }
    }

    /// Validate and compile every pattern.
    ///
    /// Replace entries with an empty pattern are dropped.
    pub fn compile(&self) -> Result<CompiledRule, RuleError> {
        let replace = self
            .replace
            .iter()
            .filter(|r| !r.pattern.is_empty())
            .map(|r| Ok((compile_pattern(&r.pattern)?, r.replacement.clone())))
            .collect::<Result<Vec<_>, RuleError>>()?;
        let skip = self
            .skip_if_matches
            .iter()
            .map(|p| compile_pattern(p))
            .collect::<Result<Vec<_>, RuleError>>()?;
        let extension = normalize_extension(&self.extension);

        Ok(CompiledRule {
            rule: self.clone(),
            replace,
            skip,
            extension,
        })
    }
}

fn compile_pattern(pattern: &str) -> Result<Regex, RuleError> {
    Regex::new(pattern).map_err(|source| RuleError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })
}

/// A rule whose patterns are known to be valid.
#[derive(Debug, Clone)]
pub struct CompiledRule {
    pub(super) rule: RenameRule,
    pub(super) replace: Vec<(Regex, String)>,
    pub(super) skip: Vec<Regex>,
    pub(super) extension: String,
}

impl CompiledRule {
    pub fn rule(&self) -> &RenameRule {
        &self.rule
    }

    /// Whether the original stem hits any skip pattern.
    pub fn should_skip(&self, stem: &str) -> bool {
        self.skip.iter().any(|re| re.is_match(stem))
    }

    /// Replace patterns, case, then prefix/suffix.
    pub fn transform_stem(&self, stem: &str) -> String {
        let replaced = self
            .replace
            .iter()
            .fold(stem.to_string(), |acc, (re, rep)| {
                re.replace_all(&acc, rep.as_str()).into_owned()
            });
        let cased = self.rule.case.apply(&replaced);
        format!("{}{}{}", self.rule.prefix, cased, self.rule.suffix)
    }

    /// Extension for the new name, before casing.
    pub fn target_extension<'a>(&'a self, original: &'a str) -> &'a str {
        if self.rule.preserve_extensions || self.extension.is_empty() {
            original
        } else {
            &self.extension
        }
    }
}
