//! Per-unit outcomes and the end-of-run summary.
//!
//! The executor records one [`UnitOutcome`] per upload and per delete
//! batch. Failures are kept with their paths so the summary can always
//! enumerate them; nothing is dropped silently.

use std::fmt;

/// What a transfer unit does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferKind {
    /// Upload one file.
    Upload,
    /// Delete a batch of paths.
    Delete,
}

impl fmt::Display for TransferKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferKind::Upload => f.write_str("upload"),
            TransferKind::Delete => f.write_str("delete"),
        }
    }
}

/// Final status of a transfer unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitStatus {
    /// Dry run: would have been performed.
    Planned,
    /// Completed.
    Succeeded {
        /// Attempts it took.
        attempts: u32,
    },
    /// Gave up.
    Failed {
        /// Attempts made.
        attempts: u32,
        /// Last error.
        error: String,
    },
}

/// The result of one transfer unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitOutcome {
    /// Upload or delete.
    pub kind: TransferKind,
    /// Paths covered (one for uploads, the batch for deletes).
    pub paths: Vec<String>,
    /// How it ended.
    pub status: UnitStatus,
}

impl UnitOutcome {
    /// One status line per path.
    pub fn status_lines(&self) -> Vec<String> {
        self.paths
            .iter()
            .map(|path| match &self.status {
                UnitStatus::Planned => format!("[plan] {} {}", self.kind, path),
                UnitStatus::Succeeded { attempts } if *attempts > 1 => {
                    format!("[ok]   {} {} ({} attempts)", self.kind, path, attempts)
                }
                UnitStatus::Succeeded { .. } => format!("[ok]   {} {}", self.kind, path),
                UnitStatus::Failed { attempts, error } => format!(
                    "[FAIL] {} {} after {} attempt(s): {}",
                    self.kind, path, attempts, error
                ),
            })
            .collect()
    }

    fn is_failed(&self) -> bool {
        matches!(self.status, UnitStatus::Failed { .. })
    }

    fn is_succeeded(&self) -> bool {
        matches!(self.status, UnitStatus::Succeeded { .. })
    }
}

/// Aggregated result of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncSummary {
    outcomes: Vec<UnitOutcome>,
    skipped: usize,
}

impl SyncSummary {
    /// Start a summary with the number of paths the plan skipped.
    pub fn new(skipped: usize) -> Self {
        Self {
            outcomes: Vec::new(),
            skipped,
        }
    }

    /// Record a finished unit.
    pub fn record(&mut self, outcome: UnitOutcome) {
        self.outcomes.push(outcome);
    }

    /// Every unit in execution order.
    pub fn outcomes(&self) -> &[UnitOutcome] {
        &self.outcomes
    }

    /// Files uploaded successfully.
    pub fn uploaded(&self) -> usize {
        self.count_paths(|o| o.kind == TransferKind::Upload && o.is_succeeded())
    }

    /// Remote paths deleted successfully.
    pub fn deleted(&self) -> usize {
        self.count_paths(|o| o.kind == TransferKind::Delete && o.is_succeeded())
    }

    /// Paths whose unit failed (uploads and delete batches).
    pub fn failed(&self) -> usize {
        self.count_paths(UnitOutcome::is_failed)
    }

    /// Paths the plan left alone.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Paths planned but not performed (dry run).
    pub fn planned(&self) -> usize {
        self.count_paths(|o| o.status == UnitStatus::Planned)
    }

    /// Paths whose unit failed, in execution order.
    pub fn failed_paths(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|o| o.is_failed())
            .flat_map(|o| o.paths.iter().map(String::as_str))
            .collect()
    }

    /// True when no unit failed.
    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    fn count_paths(&self, pred: impl Fn(&UnitOutcome) -> bool) -> usize {
        self.outcomes
            .iter()
            .filter(|o| pred(*o))
            .map(|o| o.paths.len())
            .sum()
    }
}

impl fmt::Display for SyncSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "uploaded: {}, failed: {}, deleted: {}, skipped: {}",
            self.uploaded(),
            self.failed(),
            self.deleted(),
            self.skipped
        )?;
        let planned = self.planned();
        if planned > 0 {
            write!(f, ", planned: {}", planned)?;
        }
        Ok(())
    }
}
