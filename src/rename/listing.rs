//! Folder listing with glob ignore patterns.

use regex::RegexSet;
use std::fs;
use std::io;
use std::path::Path;

use super::rules::RuleError;

/// Compiled set of shell-style globs (`*` any run, `?` one character).
///
/// Matching is against the whole file name and is case-sensitive.
#[derive(Debug, Clone)]
pub struct IgnoreSet {
    set: RegexSet,
}

impl IgnoreSet {
    pub fn new<S: AsRef<str>>(globs: &[S]) -> Result<Self, RuleError> {
        let patterns: Vec<String> = globs.iter().map(|g| glob_to_regex(g.as_ref())).collect();
        let set = RegexSet::new(&patterns).map_err(|source| RuleError::InvalidPattern {
            pattern: globs
                .iter()
                .map(|g| g.as_ref())
                .collect::<Vec<_>>()
                .join(", "),
            source,
        })?;
        Ok(Self { set })
    }

    pub fn empty() -> Self {
        Self {
            set: RegexSet::empty(),
        }
    }

    pub fn is_ignored(&self, name: &str) -> bool {
        self.set.is_match(name)
    }
}

fn glob_to_regex(glob: &str) -> String {
    let mut out = String::with_capacity(glob.len() + 8);
    out.push('^');
    let mut buf = [0u8; 4];
    for c in glob.chars() {
        match c {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            other => out.push_str(&regex::escape(other.encode_utf8(&mut buf))),
        }
    }
    out.push('$');
    out
}

/// Regular files directly inside `folder`, sorted by name, minus ignored ones.
///
/// Names that are not valid UTF-8 are skipped.
pub fn list_files(folder: &Path, ignore: &IgnoreSet) -> io::Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(folder)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let Ok(name) = entry.file_name().into_string() else {
            log::debug!("skipping non UTF-8 file name in {}", folder.display());
            continue;
        };
        if !ignore.is_ignored(&name) {
            names.push(name);
        }
    }
    names.sort();
    Ok(names)
}
