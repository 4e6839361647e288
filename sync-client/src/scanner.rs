//! Local inventory scanner.
//!
//! Walks the content root and hashes every regular file into an
//! [`Inventory`] keyed by forward-slash relative path.

use neosync_types::{normalize_scope, ContentHash, FileRecord, Inventory, SourceKind, SyncError};
use sha1::{Digest, Sha1};
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

/// Read buffer for streaming hashes.
const HASH_BUF_SIZE: usize = 64 * 1024;

/// Scanner errors.
#[derive(Debug, Error)]
pub enum ScanError {
    /// The content root does not exist or is not a directory.
    #[error("content root not found: {0}")]
    RootMissing(PathBuf),

    /// The scoped subdirectory does not exist or is not a directory.
    #[error("scope directory not found: {0}")]
    ScopeMissing(PathBuf),

    /// A walked entry does not live under the content root.
    #[error("path is outside the content root: {0}")]
    OutsideRoot(PathBuf),

    /// Directory traversal failed.
    #[error("walk failed: {0}")]
    Walk(#[from] walkdir::Error),

    /// A file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// File being read.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// A path is not valid UTF-8 and cannot be published.
    #[error("path is not valid UTF-8: {0}")]
    NonUtf8Path(PathBuf),

    /// Invalid scope or record.
    #[error(transparent)]
    Record(#[from] SyncError),
}

/// What part of the content root to scan.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Only scan this subdirectory (relative to the root).
    pub scope: Option<String>,
    /// Skip files and directories whose name starts with `.`.
    pub skip_hidden: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            scope: None,
            skip_hidden: true,
        }
    }
}

impl ScanOptions {
    /// Restrict the scan to a subdirectory.
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    /// Include dotfiles.
    pub fn with_hidden(mut self) -> Self {
        self.skip_hidden = false;
        self
    }
}

/// Build the local inventory of `root`.
///
/// Paths in the result are always relative to `root`, even with a scope.
/// A missing scope directory is an error, like a missing root: an empty
/// inventory would make every remote file in the scope look stale.
pub fn scan(root: &Path, options: &ScanOptions) -> Result<Inventory, ScanError> {
    if !root.is_dir() {
        return Err(ScanError::RootMissing(root.to_path_buf()));
    }

    let mut inventory = Inventory::new(SourceKind::Local);
    let start = match &options.scope {
        Some(scope) => {
            let scope = normalize_scope(scope)?;
            let dir = root.join(scope.trim_end_matches('/'));
            if !dir.is_dir() {
                return Err(ScanError::ScopeMissing(dir));
            }
            dir
        }
        None => root.to_path_buf(),
    };

    let skip_hidden = options.skip_hidden;
    let walker = WalkDir::new(&start)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !(skip_hidden && e.depth() > 0 && is_hidden(e)));

    for entry in walker {
        let entry = entry?;
        if !is_file(&entry) {
            continue;
        }

        let rel = relative_path(root, entry.path())?;
        let (hash, size) = hash_file(entry.path())?;
        debug!(path = %rel, hash = %hash.short(), size, "scanned");
        inventory.insert(FileRecord::local(rel, hash, size)?)?;
    }

    Ok(inventory)
}

/// `path` relative to `root`, as UTF-8.
fn relative_path<'a>(root: &Path, path: &'a Path) -> Result<&'a str, ScanError> {
    path.strip_prefix(root)
        .map_err(|_| ScanError::OutsideRoot(path.to_path_buf()))?
        .to_str()
        .ok_or_else(|| ScanError::NonUtf8Path(path.to_path_buf()))
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

/// Regular files, plus symlinks whose target is a regular file.
fn is_file(entry: &DirEntry) -> bool {
    let file_type = entry.file_type();
    if file_type.is_file() {
        return true;
    }
    file_type.is_symlink()
        && std::fs::metadata(entry.path())
            .map(|m| m.is_file())
            .unwrap_or(false)
}

/// Hash a file's content, streaming. Returns the digest and the byte count.
pub fn hash_file(path: &Path) -> Result<(ContentHash, u64), ScanError> {
    let io_err = |source| ScanError::Io {
        path: path.to_path_buf(),
        source,
    };
    let mut file = File::open(path).map_err(io_err)?;
    let mut hasher = Sha1::new();
    let mut buf = vec![0u8; HASH_BUF_SIZE];
    let mut total = 0u64;
    loop {
        let n = file.read(&mut buf).map_err(io_err)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
        total += n as u64;
    }
    Ok((ContentHash::from_digest(&hasher.finalize()), total))
}

/// Hash an in-memory buffer.
pub fn hash_bytes(bytes: &[u8]) -> ContentHash {
    ContentHash::from_digest(&Sha1::digest(bytes))
}
