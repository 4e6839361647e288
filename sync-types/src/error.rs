//! Error types for neosync.

use thiserror::Error;

/// Errors raised while building inventories and rules.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Two records in one snapshot share a relative path
    #[error("duplicate path in inventory: {0}")]
    DuplicatePath(String),

    /// A record came from the wrong side of the sync
    #[error("record {path} belongs to a {found:?} inventory, expected {expected:?}")]
    WrongSource {
        /// Offending path
        path: String,
        /// Kind the inventory holds
        expected: crate::SourceKind,
        /// Kind the record carries
        found: crate::SourceKind,
    },

    /// Content hash is not a hex digest
    #[error("invalid content hash: {0:?}")]
    InvalidHash(String),

    /// Path is empty or escapes the content root
    #[error("invalid path: {0:?}")]
    InvalidPath(String),

    /// Glob pattern failed to compile
    #[error("invalid pattern {pattern:?}: {source}")]
    InvalidPattern {
        /// The pattern as written
        pattern: String,
        /// Underlying globset error
        #[source]
        source: globset::Error,
    },
}
