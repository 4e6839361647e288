//! Diff planner.
//!
//! Compares a local and a remote [`Inventory`] and produces the
//! [`SyncPlan`] that would make the remote match the local tree. This is
//! a pure function: the same inputs always yield an identical plan,
//! including order.
//!
//! Change detection uses content hashes only. Sizes and timestamps are
//! never consulted.

use neosync_types::{Inventory, RuleSet, SkipReason, SkippedEntry, SyncPlan};

/// Paths the remote platform refuses to delete.
pub const UNDELETABLE_PATHS: &[&str] = &["index.html"];

/// Planner configuration for one run.
#[derive(Debug, Clone)]
pub struct PlanOptions {
    /// Also delete remote files that are absent locally.
    pub full_refresh: bool,
    /// Upload every non-excluded local file, even when hashes match.
    pub force: bool,
    /// Remote-only paths that must never be deleted.
    pub protected: RuleSet,
    /// Paths left out entirely: not uploaded, not deleted.
    pub excluded: RuleSet,
    /// Fixed allow-list of paths the platform will not delete.
    pub undeletable: Vec<String>,
}

impl Default for PlanOptions {
    fn default() -> Self {
        Self {
            full_refresh: false,
            force: false,
            protected: RuleSet::new(),
            excluded: RuleSet::new(),
            undeletable: UNDELETABLE_PATHS.iter().map(|p| p.to_string()).collect(),
        }
    }
}

impl PlanOptions {
    /// Enable or disable full-refresh deletes.
    pub fn with_full_refresh(mut self, full_refresh: bool) -> Self {
        self.full_refresh = full_refresh;
        self
    }

    /// Enable or disable forced uploads.
    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Set the protection rules.
    pub fn with_protected(mut self, protected: RuleSet) -> Self {
        self.protected = protected;
        self
    }

    /// Set the exclusion rules.
    pub fn with_excluded(mut self, excluded: RuleSet) -> Self {
        self.excluded = excluded;
        self
    }

    fn is_undeletable(&self, path: &str) -> bool {
        self.undeletable.iter().any(|p| p == path)
    }
}

/// Build the plan for one run.
///
/// - Upload: local files missing remotely or whose hash differs (all
///   local files under `force`), minus excluded paths.
/// - Delete (full refresh only): remote files missing locally, minus
///   protected, excluded and undeletable paths.
pub fn plan(local: &Inventory, remote: &Inventory, options: &PlanOptions) -> SyncPlan {
    let mut to_upload = Vec::new();
    let mut to_delete = Vec::new();
    let mut skipped = Vec::new();

    for record in local.records() {
        let path = &record.relative_path;
        if options.excluded.matches(path) {
            skipped.push(SkippedEntry {
                path: path.clone(),
                reason: SkipReason::Excluded,
            });
            continue;
        }

        match remote.get(path) {
            Some(existing) if !options.force && existing.same_content(record) => {
                skipped.push(SkippedEntry {
                    path: path.clone(),
                    reason: SkipReason::Unchanged,
                });
            }
            _ => to_upload.push(record.clone()),
        }
    }

    if options.full_refresh {
        for path in remote.paths() {
            if local.contains(path) {
                continue;
            }
            let reason = if options.is_undeletable(path) {
                Some(SkipReason::Undeletable)
            } else if options.protected.matches(path) || options.excluded.matches(path) {
                Some(SkipReason::Protected)
            } else {
                None
            };
            match reason {
                Some(reason) => skipped.push(SkippedEntry {
                    path: path.to_string(),
                    reason,
                }),
                None => to_delete.push(path.to_string()),
            }
        }
    }

    SyncPlan::new(to_upload, to_delete, skipped)
}
