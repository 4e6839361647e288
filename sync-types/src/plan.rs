//! The sync plan: what a run will upload and delete.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::FileRecord;

/// Why a path was left out of the upload or delete set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkipReason {
    /// Local and remote content hashes match
    Unchanged,
    /// Local file belongs to an excluded category
    Excluded,
    /// Remote-only file matched a protection rule
    Protected,
    /// Remote-only file the platform refuses to delete
    Undeletable,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SkipReason::Unchanged => "unchanged",
            SkipReason::Excluded => "excluded",
            SkipReason::Protected => "protected",
            SkipReason::Undeletable => "undeletable",
        };
        f.write_str(label)
    }
}

/// A path the plan deliberately does nothing with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedEntry {
    /// Relative path
    pub path: String,
    /// Why it was skipped
    pub reason: SkipReason,
}

/// Uploads and deletes needed to make the remote match the local tree.
///
/// Built once per run by the planner and consumed once by the executor.
/// Every list is sorted by path, so two plans built from the same
/// inventories compare equal and print identically.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncPlan {
    to_upload: Vec<FileRecord>,
    to_delete: Vec<String>,
    skipped: Vec<SkippedEntry>,
}

impl SyncPlan {
    /// Assemble a plan. Inputs are sorted by path.
    pub fn new(
        mut to_upload: Vec<FileRecord>,
        mut to_delete: Vec<String>,
        mut skipped: Vec<SkippedEntry>,
    ) -> Self {
        to_upload.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
        to_delete.sort();
        skipped.sort_by(|a, b| a.path.cmp(&b.path));
        Self {
            to_upload,
            to_delete,
            skipped,
        }
    }

    /// Local files to upload, in path order.
    pub fn to_upload(&self) -> &[FileRecord] {
        &self.to_upload
    }

    /// Remote paths to delete, in path order.
    pub fn to_delete(&self) -> &[String] {
        &self.to_delete
    }

    /// Paths left alone and why.
    pub fn skipped(&self) -> &[SkippedEntry] {
        &self.skipped
    }

    /// Whether the plan performs no transfers.
    pub fn is_empty(&self) -> bool {
        self.to_upload.is_empty() && self.to_delete.is_empty()
    }

    /// Total bytes the upload set will send.
    pub fn upload_bytes(&self) -> u64 {
        self.to_upload.iter().map(|r| r.size_bytes).sum()
    }

    /// Drop the delete set, keeping uploads and skips.
    pub fn without_deletes(self) -> Self {
        Self {
            to_delete: Vec::new(),
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ContentHash;

    fn record(path: &str, size: u64) -> FileRecord {
        FileRecord::local(path, ContentHash::from_hex("ab").unwrap(), size).unwrap()
    }

    #[test]
    fn new_sorts_every_list() {
        let plan = SyncPlan::new(
            vec![record("b.html", 1), record("a.html", 2)],
            vec!["z.css".into(), "c.css".into()],
            vec![
                SkippedEntry {
                    path: "y".into(),
                    reason: SkipReason::Unchanged,
                },
                SkippedEntry {
                    path: "x".into(),
                    reason: SkipReason::Protected,
                },
            ],
        );

        assert_eq!(plan.to_upload()[0].relative_path, "a.html");
        assert_eq!(plan.to_delete(), &["c.css".to_string(), "z.css".to_string()]);
        assert_eq!(plan.skipped()[0].path, "x");
        assert_eq!(plan.upload_bytes(), 3);
    }

    #[test]
    fn default_plan_is_empty() {
        assert!(SyncPlan::default().is_empty());
    }

    #[test]
    fn without_deletes_keeps_uploads() {
        let plan = SyncPlan::new(vec![record("a", 1)], vec!["old".into()], vec![]);
        let trimmed = plan.without_deletes();
        assert_eq!(trimmed.to_upload().len(), 1);
        assert!(trimmed.to_delete().is_empty());
    }

    #[test]
    fn skip_reason_display() {
        assert_eq!(SkipReason::Undeletable.to_string(), "undeletable");
    }
}
