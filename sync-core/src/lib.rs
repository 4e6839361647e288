//! # sync-core
//!
//! Pure logic for neosync (no I/O, instant tests).
//!
//! This crate implements the diff planner and the transfer-unit state
//! machine without any network or disk I/O, enabling fast unit tests.
//!
//! ## Design Philosophy
//!
//! All modules in this crate are **pure** - they take input and produce output
//! without side effects. This enables:
//! - Instant unit tests (no mocks, no async)
//! - Deterministic behavior (same inventories → same plan)
//! - Easy reasoning about retry transitions
//!
//! The actual I/O (hashing files, calling the remote API) is performed by
//! `sync-client`, which interprets the plans and actions produced here.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod options;
pub mod planner;
pub mod summary;
pub mod transfer;

pub use options::{
    OptionsError, SyncOptions, DEFAULT_BATCH_SIZE, DEFAULT_MAX_RETRIES, DEFAULT_RATE_LIMIT,
};
pub use planner::{plan, PlanOptions, UNDELETABLE_PATHS};
pub use summary::{SyncSummary, TransferKind, UnitOutcome, UnitStatus};
pub use transfer::{RetryPolicy, TransferAction, TransferEvent, TransferState};
