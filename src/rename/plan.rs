//! Deterministic rename plan generation.
//!
//! For each input name, in order:
//!
//! 1. Split into stem and extension.
//! 2. If the original stem hits a skip pattern, keep the name as is.
//! 3. Otherwise replace, change case, add prefix/suffix, then number.
//! 4. Append the (cased) target extension. Path separators become `_`; a
//!    name that would still leave the folder (`..`) keeps the original.
//! 5. If an earlier entry already produced the same name, append `_2`,
//!    `_3`, … before the extension until it is unique.
//!
//! The planner is pure: same names and rule in, same plan out. It never
//! looks at the filesystem.

use serde::Serialize;
use std::collections::HashSet;

use super::naming::{has_leading_digits, is_plain_file_name, split_name, strip_separators, zero_pad};
use super::rules::{CompiledRule, RenameRule, RuleError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanEntry {
    pub old_name: String,
    pub new_name: String,
}

impl PlanEntry {
    pub fn is_noop(&self) -> bool {
        self.old_name == self.new_name
    }
}

/// Ordered `(old, new)` pairs, one per input name. New names are unique.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RenamePlan {
    pub entries: Vec<PlanEntry>,
}

impl RenamePlan {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries that actually change a name.
    pub fn changes(&self) -> impl Iterator<Item = &PlanEntry> {
        self.entries.iter().filter(|e| !e.is_noop())
    }

    pub fn pairs(&self) -> Vec<(&str, &str)> {
        self.entries
            .iter()
            .map(|e| (e.old_name.as_str(), e.new_name.as_str()))
            .collect()
    }
}

/// Compile `rule` and plan `filenames` with it.
pub fn compile_plan<S: AsRef<str>>(
    filenames: &[S],
    rule: &RenameRule,
) -> Result<RenamePlan, RuleError> {
    Ok(rule.compile()?.plan(filenames))
}

impl CompiledRule {
    pub fn plan<S: AsRef<str>>(&self, filenames: &[S]) -> RenamePlan {
        let numbering = &self.rule.numbering;
        let mut counter = numbering.start;
        let mut produced: HashSet<String> = HashSet::with_capacity(filenames.len());
        let mut entries = Vec::with_capacity(filenames.len());

        for name in filenames {
            let name = name.as_ref();
            let (stem, ext) = split_name(name);

            let candidate = if self.should_skip(stem) {
                name.to_string()
            } else {
                let mut new_stem = self.transform_stem(stem);
                if numbering.enabled && !(numbering.skip_if_numbered && has_leading_digits(stem)) {
                    new_stem = format!(
                        "{}{}{}",
                        numbering.prefix,
                        zero_pad(counter, numbering.padding),
                        numbering.suffix
                    );
                    counter = counter.saturating_add(1);
                }
                let new_ext = self.rule.case.apply(self.target_extension(ext));
                let renamed = strip_separators(&format!("{new_stem}{new_ext}"));
                if is_plain_file_name(&renamed) {
                    renamed
                } else {
                    name.to_string()
                }
            };

            let new_name = disambiguate(candidate, &produced);
            produced.insert(new_name.clone());
            entries.push(PlanEntry {
                old_name: name.to_string(),
                new_name,
            });
        }

        RenamePlan { entries }
    }
}

fn disambiguate(candidate: String, taken: &HashSet<String>) -> String {
    if !taken.contains(&candidate) {
        return candidate;
    }
    let (stem, ext) = split_name(&candidate);
    (2u64..)
        .map(|i| format!("{stem}_{i}{ext}"))
        .find(|name| !taken.contains(name))
        .unwrap_or(candidate)
}
