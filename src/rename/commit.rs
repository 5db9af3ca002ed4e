//! Apply a rename plan to a folder.
//!
//! Two policies:
//! - [`CommitPolicy::AllOrNothing`]: every target is checked before anything
//!   moves; one existing target aborts the whole batch.
//! - [`CommitPolicy::SkipExisting`]: entries whose target exists are reported
//!   as failed and the rest are applied.
//!
//! A target counts as existing only if it is not itself being renamed away
//! earlier in the same plan, and is not the source file under another
//! spelling (`a.TXT` → `a.txt` on a case-insensitive filesystem). No-op
//! entries are never touched. Names that would leave the folder are refused
//! like existing targets.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::Path;
use thiserror::Error;

use super::naming::is_plain_file_name;
use super::plan::{PlanEntry, RenamePlan};

#[derive(Error, Debug)]
pub enum CommitError {
    #[error("Target exists: {name}")]
    TargetExists { name: String },
    #[error("Not a file name inside the folder: {name}")]
    InvalidName { name: String },
    #[error("Failed to rename {from} to {to}: {source}")]
    Rename {
        from: String,
        to: String,
        #[source]
        source: io::Error,
    },
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CommitPolicy {
    #[default]
    AllOrNothing,
    SkipExisting,
}

/// Why one entry was not applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedEntry {
    pub entry: PlanEntry,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitReport {
    pub renamed: Vec<PlanEntry>,
    pub failed: Vec<FailedEntry>,
    /// Entries whose old and new names are equal.
    pub unchanged: usize,
}

/// Rename files in `folder` according to `plan`.
pub fn commit_plan(
    folder: &Path,
    plan: &RenamePlan,
    policy: CommitPolicy,
) -> Result<CommitReport, CommitError> {
    let mut report = CommitReport {
        unchanged: plan.entries.len() - plan.changes().count(),
        ..CommitReport::default()
    };

    // Names vacated by entries that run before a given entry.
    let mut vacated: HashSet<&str> = HashSet::new();
    let mut pending = Vec::new();
    for entry in plan.changes() {
        let refusal = if !is_plain_file_name(&entry.old_name) {
            Some(CommitError::InvalidName {
                name: entry.old_name.clone(),
            })
        } else if !is_plain_file_name(&entry.new_name) {
            Some(CommitError::InvalidName {
                name: entry.new_name.clone(),
            })
        } else {
            let target = folder.join(&entry.new_name);
            let taken = target.exists()
                && !vacated.contains(entry.new_name.as_str())
                && !same_file(&folder.join(&entry.old_name), &target);
            taken.then(|| CommitError::TargetExists {
                name: entry.new_name.clone(),
            })
        };
        if let Some(err) = refusal {
            match policy {
                CommitPolicy::AllOrNothing => return Err(err),
                CommitPolicy::SkipExisting => {
                    log::debug!("skipping {} -> {}: {err}", entry.old_name, entry.new_name);
                    report.failed.push(FailedEntry {
                        entry: entry.clone(),
                        reason: err.to_string(),
                    });
                    continue;
                }
            }
        }
        vacated.insert(entry.old_name.as_str());
        pending.push(entry);
    }

    for entry in pending {
        let from = folder.join(&entry.old_name);
        let to = folder.join(&entry.new_name);
        match fs::rename(&from, &to) {
            Ok(()) => report.renamed.push(entry.clone()),
            Err(source) => match policy {
                CommitPolicy::AllOrNothing => {
                    return Err(CommitError::Rename {
                        from: entry.old_name.clone(),
                        to: entry.new_name.clone(),
                        source,
                    });
                }
                CommitPolicy::SkipExisting => report.failed.push(FailedEntry {
                    entry: entry.clone(),
                    reason: source.to_string(),
                }),
            },
        }
    }
    Ok(report)
}

/// Whether two paths name one file on disk.
#[cfg(unix)]
fn same_file(a: &Path, b: &Path) -> bool {
    use std::os::unix::fs::MetadataExt;
    match (fs::metadata(a), fs::metadata(b)) {
        (Ok(a), Ok(b)) => a.dev() == b.dev() && a.ino() == b.ino(),
        _ => false,
    }
}

#[cfg(not(unix))]
fn same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
