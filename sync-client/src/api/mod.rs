//! Remote API abstraction for neosync.
//!
//! This module provides a pluggable remote layer that abstracts the
//! hosting service (Neocities over HTTPS, mock for testing).
//!
//! # Design
//!
//! The API trait is async and mirrors the three endpoints the sync needs:
//! - `list()` reports every published path with its content hash
//! - `upload()` writes one file's bytes to a remote path
//! - `delete()` removes a batch of remote paths
//!
//! Every call is independent; there is no session to open or close.
//! Wrap an implementation in [`Paced`] to enforce a minimum gap between
//! consecutive calls.
//!
//! # Example
//!
//! ```ignore
//! let api = MockApi::new().with_file("index.html", b"<h1>hi</h1>");
//! let entries = api.list(None).await?;
//! api.upload("about.html", b"<p>about</p>".to_vec()).await?;
//! ```

mod mock;
mod neocities;
mod paced;

pub use mock::MockApi;
pub use neocities::{ApiKey, NeocitiesApi, DEFAULT_API_URL};
pub use paced::Paced;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

/// Remote API errors.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Could not reach the service.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Request failed in transit.
    #[error("request failed: {0}")]
    Request(String),

    /// Non-success HTTP status.
    #[error("HTTP {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Service message or response excerpt.
        message: String,
    },

    /// The service answered with `result: error`.
    #[error("{error_type}: {message}")]
    Rejected {
        /// Service error category.
        error_type: String,
        /// Human-readable reason.
        message: String,
    },

    /// Body could not be understood.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_connect() {
            ApiError::ConnectionFailed(e.to_string())
        } else {
            ApiError::Request(e.to_string())
        }
    }
}

/// One entry of the remote listing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RemoteEntry {
    /// Path relative to the site root.
    pub path: String,
    /// Directories are listed too; they never take part in diffing.
    #[serde(default)]
    pub is_directory: bool,
    /// Size in bytes (files only).
    #[serde(default)]
    pub size: Option<u64>,
    /// SHA-1 hex digest of the content (files only).
    #[serde(default)]
    pub sha1_hash: Option<String>,
    /// Last modification, as reported by the service.
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl RemoteEntry {
    /// A file entry.
    pub fn file(path: &str, sha1_hash: &str, size: u64) -> Self {
        Self {
            path: path.to_string(),
            is_directory: false,
            size: Some(size),
            sha1_hash: Some(sha1_hash.to_string()),
            updated_at: None,
        }
    }

    /// A directory entry.
    pub fn directory(path: &str) -> Self {
        Self {
            path: path.to_string(),
            is_directory: true,
            size: None,
            sha1_hash: None,
            updated_at: None,
        }
    }
}

/// Remote API for listing, uploading and deleting published files.
///
/// Implementations hold the credential; callers never see it.
#[async_trait]
pub trait RemoteApi: Send + Sync {
    /// List published entries, optionally only under a path prefix.
    async fn list(&self, prefix: Option<&str>) -> Result<Vec<RemoteEntry>, ApiError>;

    /// Upload bytes to a remote path, replacing any existing file.
    async fn upload(&self, remote_path: &str, bytes: Vec<u8>) -> Result<(), ApiError>;

    /// Delete a batch of remote paths in one request.
    async fn delete(&self, remote_paths: &[String]) -> Result<(), ApiError>;
}
