//! Minimum-gap pacing for remote API calls.
//!
//! Third-party APIs budget request rates. [`Paced`] wraps any
//! [`RemoteApi`] and holds every call until at least `interval` has
//! passed since the previous call finished, whether it succeeded or not.
//! Calls are also serialized: two paced calls never overlap.

use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

use super::{ApiError, RemoteApi, RemoteEntry};

/// A [`RemoteApi`] that enforces a fixed gap between consecutive calls.
#[derive(Debug)]
pub struct Paced<A> {
    inner: A,
    interval: Duration,
    last_finished: Mutex<Option<Instant>>,
}

impl<A: RemoteApi> Paced<A> {
    /// Wrap an API with the given minimum gap.
    pub fn new(inner: A, interval: Duration) -> Self {
        Self {
            inner,
            interval,
            last_finished: Mutex::new(None),
        }
    }

    /// The minimum gap between calls.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Get a reference to the wrapped API.
    pub fn inner(&self) -> &A {
        &self.inner
    }

    async fn paced<T, F>(&self, call: F) -> T
    where
        F: Future<Output = T> + Send,
    {
        let mut last = self.last_finished.lock().await;
        if let Some(finished) = *last {
            tokio::time::sleep_until(finished + self.interval).await;
        }
        let result = call.await;
        *last = Some(Instant::now());
        result
    }
}

#[async_trait]
impl<A: RemoteApi> RemoteApi for Paced<A> {
    async fn list(&self, prefix: Option<&str>) -> Result<Vec<RemoteEntry>, ApiError> {
        self.paced(self.inner.list(prefix)).await
    }

    async fn upload(&self, remote_path: &str, bytes: Vec<u8>) -> Result<(), ApiError> {
        self.paced(self.inner.upload(remote_path, bytes)).await
    }

    async fn delete(&self, remote_paths: &[String]) -> Result<(), ApiError> {
        self.paced(self.inner.delete(remote_paths)).await
    }
}
