//! Transfer executor.
//!
//! Interprets a [`SyncPlan`]: uploads one file at a time, then deletes in
//! batches. Each upload and each delete batch is a transfer unit driven by
//! the pure [`TransferState`] machine from sync-core; this module only
//! performs the actions it asks for.
//!
//! ```text
//! SyncPlan → TransferExecutor → Paced<RemoteApi> → service
//!                  ↓
//!        sync-core TransferState (retry decisions)
//! ```
//!
//! A unit that exhausts its retries is recorded as failed and the run
//! moves on; one bad file never aborts the deploy.

use neosync_core::{
    OptionsError, RetryPolicy, SyncOptions, SyncSummary, TransferAction, TransferEvent,
    TransferKind, TransferState, UnitOutcome, UnitStatus,
};
use neosync_types::{FileRecord, SyncPlan};
use std::collections::VecDeque;
use std::future::Future;
use std::path::Path;
use tracing::{debug, error, info, warn};

use crate::api::{Paced, RemoteApi};

/// Runs sync plans against a remote API.
#[derive(Debug)]
pub struct TransferExecutor<A> {
    api: Paced<A>,
    options: SyncOptions,
    policy: RetryPolicy,
}

impl<A: RemoteApi> TransferExecutor<A> {
    /// Create an executor. The API is paced at `options.rate_limit`.
    pub fn new(api: A, options: SyncOptions) -> Result<Self, OptionsError> {
        options.validate()?;
        Ok(Self {
            api: Paced::new(api, options.rate_limit),
            policy: options.retry_policy(),
            options,
        })
    }

    /// The paced API, for calls that should share the same pacing
    /// (such as the remote listing).
    pub fn api(&self) -> &Paced<A> {
        &self.api
    }

    /// Get the options.
    pub fn options(&self) -> &SyncOptions {
        &self.options
    }

    /// Execute a plan. Local files are read from under `root`.
    ///
    /// Uploads run first, in path order, then delete batches of at most
    /// `batch_size` paths. In dry-run mode nothing is sent and every unit
    /// is recorded as planned.
    pub async fn execute(&self, plan: &SyncPlan, root: &Path) -> SyncSummary {
        let mut summary = SyncSummary::new(plan.skipped().len());

        if self.options.dry_run {
            info!(
                uploads = plan.to_upload().len(),
                deletes = plan.to_delete().len(),
                "dry run, no changes sent"
            );
            for record in plan.to_upload() {
                summary.record(UnitOutcome {
                    kind: TransferKind::Upload,
                    paths: vec![record.relative_path.clone()],
                    status: UnitStatus::Planned,
                });
            }
            for batch in plan.to_delete().chunks(self.options.batch_size) {
                summary.record(UnitOutcome {
                    kind: TransferKind::Delete,
                    paths: batch.to_vec(),
                    status: UnitStatus::Planned,
                });
            }
            return summary;
        }

        for record in plan.to_upload() {
            let outcome = self.upload(record, root).await;
            summary.record(outcome);
        }

        for batch in plan.to_delete().chunks(self.options.batch_size) {
            let outcome = self.delete(batch).await;
            summary.record(outcome);
        }

        info!(%summary, "sync finished");
        summary
    }

    async fn upload(&self, record: &FileRecord, root: &Path) -> UnitOutcome {
        let remote = record.relative_path.as_str();
        let local = root.join(remote);
        let local = local.as_path();
        let api = &self.api;

        // Read on every attempt so a file fixed mid-run is picked up
        let status = self
            .run_unit(remote, || async move {
                let bytes = tokio::fs::read(local)
                    .await
                    .map_err(|e| format!("failed to read {}: {}", local.display(), e))?;
                api.upload(remote, bytes).await.map_err(|e| e.to_string())
            })
            .await;

        match &status {
            UnitStatus::Succeeded { attempts } => {
                info!(path = remote, attempts, bytes = record.size_bytes, "uploaded")
            }
            UnitStatus::Failed { attempts, error } => {
                error!(path = remote, attempts, %error, "upload failed")
            }
            UnitStatus::Planned => {}
        }

        UnitOutcome {
            kind: TransferKind::Upload,
            paths: vec![record.relative_path.clone()],
            status,
        }
    }

    async fn delete(&self, batch: &[String]) -> UnitOutcome {
        let api = &self.api;
        let label = format!("delete batch of {}", batch.len());

        let status = self
            .run_unit(&label, || async move {
                api.delete(batch).await.map_err(|e| e.to_string())
            })
            .await;

        match &status {
            UnitStatus::Succeeded { attempts } => {
                info!(count = batch.len(), attempts, "deleted batch")
            }
            UnitStatus::Failed { attempts, error } => {
                error!(count = batch.len(), attempts, %error, paths = ?batch, "delete failed")
            }
            UnitStatus::Planned => {}
        }

        UnitOutcome {
            kind: TransferKind::Delete,
            paths: batch.to_vec(),
            status,
        }
    }

    /// Drive one unit to a terminal state.
    async fn run_unit<F, Fut>(&self, label: &str, mut attempt: F) -> UnitStatus
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<(), String>>,
    {
        let (mut state, actions) = TransferState::new().on_event(TransferEvent::Start, &self.policy);
        let mut pending: VecDeque<TransferAction> = actions.into();

        while let Some(action) = pending.pop_front() {
            match action {
                TransferAction::Backoff { delay } => {
                    debug!(unit = label, ?delay, "backing off");
                    tokio::time::sleep(delay).await;
                }
                TransferAction::Attempt { attempt: n } => {
                    let event = match attempt().await {
                        Ok(()) => TransferEvent::AttemptSucceeded,
                        Err(error) => {
                            warn!(unit = label, attempt = n, %error, "attempt failed");
                            TransferEvent::AttemptFailed { error }
                        }
                    };
                    let (next, actions) = state.on_event(event, &self.policy);
                    state = next;
                    pending.extend(actions);
                }
            }
        }

        match state {
            TransferState::Succeeded { attempts } => UnitStatus::Succeeded { attempts },
            TransferState::Failed { attempts, error } => UnitStatus::Failed { attempts, error },
            other => UnitStatus::Failed {
                attempts: other.attempts(),
                error: "transfer stopped before completing".to_string(),
            },
        }
    }
}
