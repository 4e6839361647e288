//! Mock remote API for testing.
//!
//! Holds an in-memory site, records every call, and lets tests script
//! failures per path or per call.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::time::Instant;

use super::{ApiError, RemoteApi, RemoteEntry};
use crate::scanner::hash_bytes;

/// Mock remote API for testing.
///
/// Clones share state, so a test can hand one clone to the code under test
/// and inspect the other.
#[derive(Debug, Default)]
pub struct MockApi {
    inner: Arc<Mutex<MockApiInner>>,
}

#[derive(Debug, Default)]
struct MockApiInner {
    files: BTreeMap<String, RemoteEntry>,
    directories: Vec<String>,
    list_calls: usize,
    upload_attempts: Vec<String>,
    delete_attempts: Vec<Vec<String>>,
    call_times: Vec<Instant>,
    fail_next_list: Option<String>,
    upload_failures: HashMap<String, VecDeque<String>>,
    always_fail_upload: HashMap<String, String>,
    fail_next_deletes: VecDeque<String>,
    always_fail_delete: HashSet<String>,
}

impl MockApi {
    /// Create an empty mock site.
    pub fn new() -> Self {
        Self::default()
    }

    fn inner(&self) -> MutexGuard<'_, MockApiInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Publish a file with the given content.
    pub fn with_file(self, path: &str, content: &[u8]) -> Self {
        self.put_file(path, content);
        self
    }

    /// Publish a directory entry.
    pub fn with_directory(self, path: &str) -> Self {
        self.inner().directories.push(path.to_string());
        self
    }

    /// Publish a raw listing entry (for malformed-listing tests).
    pub fn with_entry(self, entry: RemoteEntry) -> Self {
        self.inner().files.insert(entry.path.clone(), entry);
        self
    }

    fn put_file(&self, path: &str, content: &[u8]) {
        let hash = hash_bytes(content);
        self.inner().files.insert(
            path.to_string(),
            RemoteEntry::file(path, hash.as_str(), content.len() as u64),
        );
    }

    /// Cause the next `list()` to fail.
    pub fn fail_next_list(&self, error: &str) {
        self.inner().fail_next_list = Some(error.to_string());
    }

    /// Fail the next `times` uploads of `path`, then succeed.
    pub fn fail_upload_times(&self, path: &str, times: usize, error: &str) {
        let mut inner = self.inner();
        let queue = inner.upload_failures.entry(path.to_string()).or_default();
        queue.extend(std::iter::repeat(error.to_string()).take(times));
    }

    /// Fail every upload of `path`.
    pub fn always_fail_upload(&self, path: &str, error: &str) {
        self.inner()
            .always_fail_upload
            .insert(path.to_string(), error.to_string());
    }

    /// Fail the next `times` delete calls, whatever they contain.
    pub fn fail_next_deletes(&self, times: usize, error: &str) {
        self.inner()
            .fail_next_deletes
            .extend(std::iter::repeat(error.to_string()).take(times));
    }

    /// Fail every delete batch that contains `path`.
    pub fn always_fail_delete(&self, path: &str) {
        self.inner().always_fail_delete.insert(path.to_string());
    }

    /// Number of `list()` calls.
    pub fn list_calls(&self) -> usize {
        self.inner().list_calls
    }

    /// Upload attempts for one path, successful or not.
    pub fn upload_attempts(&self, path: &str) -> usize {
        self.inner()
            .upload_attempts
            .iter()
            .filter(|p| p.as_str() == path)
            .count()
    }

    /// Every upload attempt in call order.
    pub fn upload_log(&self) -> Vec<String> {
        self.inner().upload_attempts.clone()
    }

    /// Every delete attempt in call order.
    pub fn delete_batches(&self) -> Vec<Vec<String>> {
        self.inner().delete_attempts.clone()
    }

    /// Upload and delete calls made, successful or not.
    pub fn mutating_calls(&self) -> usize {
        let inner = self.inner();
        inner.upload_attempts.len() + inner.delete_attempts.len()
    }

    /// When each call (of any kind) arrived.
    pub fn call_times(&self) -> Vec<Instant> {
        self.inner().call_times.clone()
    }

    /// Paths currently published.
    pub fn remote_paths(&self) -> Vec<String> {
        self.inner().files.keys().cloned().collect()
    }

    /// Hash of a published file.
    pub fn remote_hash(&self, path: &str) -> Option<String> {
        self.inner()
            .files
            .get(path)
            .and_then(|e| e.sha1_hash.clone())
    }
}

impl Clone for MockApi {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[async_trait]
impl RemoteApi for MockApi {
    async fn list(&self, prefix: Option<&str>) -> Result<Vec<RemoteEntry>, ApiError> {
        let mut inner = self.inner();
        inner.call_times.push(Instant::now());
        inner.list_calls += 1;

        // Check for forced failure
        if let Some(error) = inner.fail_next_list.take() {
            return Err(ApiError::Status {
                status: 500,
                message: error,
            });
        }

        let in_scope = |path: &str| match prefix {
            Some(p) => path.starts_with(p.trim_end_matches('/')),
            None => true,
        };
        let mut entries: Vec<RemoteEntry> = inner
            .directories
            .iter()
            .filter(|d| in_scope(d))
            .map(|d| RemoteEntry::directory(d))
            .collect();
        entries.extend(inner.files.values().filter(|e| in_scope(&e.path)).cloned());
        Ok(entries)
    }

    async fn upload(&self, remote_path: &str, bytes: Vec<u8>) -> Result<(), ApiError> {
        {
            let mut inner = self.inner();
            inner.call_times.push(Instant::now());
            inner.upload_attempts.push(remote_path.to_string());

            if let Some(error) = inner.always_fail_upload.get(remote_path).cloned() {
                return Err(ApiError::Status {
                    status: 500,
                    message: error,
                });
            }
            let scripted = inner
                .upload_failures
                .get_mut(remote_path)
                .and_then(VecDeque::pop_front);
            if let Some(error) = scripted {
                return Err(ApiError::Status {
                    status: 503,
                    message: error,
                });
            }
        }

        self.put_file(remote_path, &bytes);
        Ok(())
    }

    async fn delete(&self, remote_paths: &[String]) -> Result<(), ApiError> {
        let mut inner = self.inner();
        inner.call_times.push(Instant::now());
        inner.delete_attempts.push(remote_paths.to_vec());

        if let Some(error) = inner.fail_next_deletes.pop_front() {
            return Err(ApiError::Status {
                status: 500,
                message: error,
            });
        }
        if remote_paths
            .iter()
            .any(|p| inner.always_fail_delete.contains(p))
        {
            return Err(ApiError::Rejected {
                error_type: "cannot_delete".into(),
                message: "file is protected".into(),
            });
        }

        for path in remote_paths {
            inner.files.remove(path);
        }
        Ok(())
    }
}
