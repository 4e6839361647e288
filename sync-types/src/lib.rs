//! # sync-types
//!
//! Data model shared by every neosync crate.
//!
//! This crate provides the foundational types used across all neosync crates:
//! - [`FileRecord`], [`ContentHash`], [`SourceKind`] - One file in a snapshot
//! - [`Inventory`] - A path-keyed snapshot of local or remote files
//! - [`SyncPlan`] - Uploads and deletes needed to make remote match local
//! - [`ProtectionRule`], [`RuleSet`] - Path predicates guarding deletes
//! - [`SyncError`] - Error types

#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
mod inventory;
mod plan;
mod record;
mod rule;

pub use error::SyncError;
pub use inventory::Inventory;
pub use plan::{SkipReason, SkippedEntry, SyncPlan};
pub use record::{normalize_path, normalize_scope, ContentHash, FileRecord, SourceKind};
pub use rule::{ProtectionRule, RuleSet};
