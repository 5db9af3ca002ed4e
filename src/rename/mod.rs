//! Rule-driven bulk renaming.
//!
//! Planning and applying are separate steps. [`compile_plan`] turns a list
//! of names and a [`RenameRule`] into a [`RenamePlan`] without touching the
//! disk; [`commit_plan`] applies a plan to a folder.
//!
//! ## Module map
//!
//! | Module | Contents |
//! |---|---|
//! | `rules` | [`RenameRule`] data model, JSON/TOML loading, [`CompiledRule`] |
//! | `plan` | Name generation and collision suffixes |
//! | `naming` | Stem/extension split, digit detection, zero padding |
//! | `listing` | Folder listing with glob ignore patterns |
//! | `commit` | Applying a plan with a [`CommitPolicy`] |

mod commit;
mod listing;
mod naming;
mod plan;
mod rules;

pub use commit::{CommitError, CommitPolicy, CommitReport, FailedEntry, commit_plan};
pub use listing::{IgnoreSet, list_files};
pub use naming::split_name;
pub use plan::{PlanEntry, RenamePlan, compile_plan};
pub use rules::{CaseMode, CompiledRule, Numbering, RenameRule, ReplaceRule, RuleError};
