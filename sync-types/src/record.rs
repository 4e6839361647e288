//! File records: one entry in a local or remote snapshot.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::SyncError;

/// Which side of the sync a record was observed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Found on disk under the content root
    Local,
    /// Reported by the remote listing
    Remote,
}

/// A lowercase hex content digest.
///
/// Comparison is case-insensitive on input: digests are normalized to
/// lowercase on construction, so `ABCD` and `abcd` are the same hash.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentHash(String);

impl ContentHash {
    /// Parse a hex digest.
    pub fn from_hex(hex: &str) -> Result<Self, SyncError> {
        let trimmed = hex.trim();
        if trimmed.is_empty()
            || trimmed.len() % 2 != 0
            || !trimmed.bytes().all(|b| b.is_ascii_hexdigit())
        {
            return Err(SyncError::InvalidHash(hex.to_string()));
        }
        Ok(Self(trimmed.to_ascii_lowercase()))
    }

    /// Build from raw digest bytes.
    pub fn from_digest(bytes: &[u8]) -> Self {
        Self(hex::encode(bytes))
    }

    /// The hex string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 8 hex characters, for log lines.
    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(8)]
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({})", self.short())
    }
}

impl TryFrom<String> for ContentHash {
    type Error = SyncError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value)
    }
}

impl From<ContentHash> for String {
    fn from(hash: ContentHash) -> Self {
        hash.0
    }
}

/// One file in an inventory snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Path relative to the content root, forward slashes, no leading `/`
    pub relative_path: String,
    /// Digest of the full file content
    pub content_hash: ContentHash,
    /// Size in bytes (informational; never used for change detection)
    pub size_bytes: u64,
    /// Where this record was observed
    pub source: SourceKind,
}

impl FileRecord {
    /// Create a record for a file found on disk.
    pub fn local(path: &str, content_hash: ContentHash, size_bytes: u64) -> Result<Self, SyncError> {
        Ok(Self {
            relative_path: normalize_path(path)?,
            content_hash,
            size_bytes,
            source: SourceKind::Local,
        })
    }

    /// Create a record for a file reported by the remote listing.
    pub fn remote(
        path: &str,
        content_hash: ContentHash,
        size_bytes: u64,
    ) -> Result<Self, SyncError> {
        Ok(Self {
            relative_path: normalize_path(path)?,
            content_hash,
            size_bytes,
            source: SourceKind::Remote,
        })
    }

    /// Whether another record carries the same content.
    pub fn same_content(&self, other: &FileRecord) -> bool {
        self.content_hash == other.content_hash
    }
}

/// Normalize a relative path to the canonical inventory key.
///
/// Backslashes become `/`, empty and `.` segments are dropped, and a
/// leading `/` is removed. A `..` segment or an empty result is rejected.
pub fn normalize_path(raw: &str) -> Result<String, SyncError> {
    let unified = raw.replace('\\', "/");
    let mut segments = Vec::new();
    for segment in unified.split('/') {
        match segment {
            "" | "." => continue,
            ".." => return Err(SyncError::InvalidPath(raw.to_string())),
            s => segments.push(s),
        }
    }
    if segments.is_empty() {
        return Err(SyncError::InvalidPath(raw.to_string()));
    }
    Ok(segments.join("/"))
}

/// Normalize a scope directory to a prefix ending in `/`.
pub fn normalize_scope(raw: &str) -> Result<String, SyncError> {
    let mut scope = normalize_path(raw)?;
    scope.push('/');
    Ok(scope)
}
