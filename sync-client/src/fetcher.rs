//! Remote inventory fetcher.

use neosync_types::{normalize_scope, ContentHash, FileRecord, Inventory, SourceKind, SyncError};
use thiserror::Error;
use tracing::{debug, info};

use crate::api::{ApiError, RemoteApi};

/// Fetch errors.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The listing call failed.
    #[error("remote listing failed: {0}")]
    Api(#[from] ApiError),

    /// A file entry came back without a content hash.
    #[error("remote file has no hash: {0}")]
    MissingHash(String),

    /// The listing held an invalid path, hash or duplicate.
    #[error("invalid remote listing: {0}")]
    Record(#[from] SyncError),
}

/// Fetch the remote inventory in a single listing call.
///
/// Directories are dropped. With a scope, only files under that prefix
/// are kept, still keyed by their full site path.
pub async fn fetch_remote_inventory<A>(
    api: &A,
    scope: Option<&str>,
) -> Result<Inventory, FetchError>
where
    A: RemoteApi + ?Sized,
{
    let scope = scope.map(normalize_scope).transpose()?;
    let entries = api.list(scope.as_deref()).await?;
    debug!(entries = entries.len(), "remote listing received");

    let mut inventory = Inventory::new(SourceKind::Remote);
    for entry in entries {
        if entry.is_directory {
            continue;
        }
        let hash = entry
            .sha1_hash
            .as_deref()
            .ok_or_else(|| FetchError::MissingHash(entry.path.clone()))?;
        let record = FileRecord::remote(
            &entry.path,
            ContentHash::from_hex(hash)?,
            entry.size.unwrap_or(0),
        )?;
        if let Some(prefix) = &scope {
            if !record.relative_path.starts_with(prefix.as_str()) {
                continue;
            }
        }
        inventory.insert(record)?;
    }

    info!(
        files = inventory.len(),
        bytes = inventory.total_bytes(),
        "fetched remote inventory"
    );
    Ok(inventory)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{MockApi, RemoteEntry};
    use crate::scanner::hash_bytes;

    fn site() -> MockApi {
        MockApi::new()
            .with_directory("music")
            .with_directory("music/album")
            .with_file("index.html", b"<h1>home</h1>")
            .with_file("music/album/song.mp3", b"mp3data")
            .with_file("musicians.html", b"people")
    }

    #[tokio::test]
    async fn fetches_files_and_drops_directories() {
        let api = site();
        let inv = fetch_remote_inventory(&api, None).await.unwrap();

        assert_eq!(inv.kind(), SourceKind::Remote);
        assert_eq!(
            inv.paths().collect::<Vec<_>>(),
            vec!["index.html", "music/album/song.mp3", "musicians.html"]
        );
        let song = inv.get("music/album/song.mp3").unwrap();
        assert_eq!(song.content_hash, hash_bytes(b"mp3data"));
        assert_eq!(song.size_bytes, 7);
        assert_eq!(api.list_calls(), 1);
    }

    #[tokio::test]
    async fn scope_keeps_only_files_under_prefix() {
        let api = site();
        let inv = fetch_remote_inventory(&api, Some("music")).await.unwrap();

        // "musicians.html" shares the prefix text but is outside the directory
        assert_eq!(
            inv.paths().collect::<Vec<_>>(),
            vec!["music/album/song.mp3"]
        );
    }

    #[tokio::test]
    async fn empty_site_is_empty_inventory() {
        let inv = fetch_remote_inventory(&MockApi::new(), None).await.unwrap();
        assert!(inv.is_empty());
    }

    #[tokio::test]
    async fn listing_failure_is_reported() {
        let api = site();
        api.fail_next_list("maintenance");

        let err = fetch_remote_inventory(&api, None).await.unwrap_err();
        assert!(matches!(err, FetchError::Api(ApiError::Status { status: 500, .. })));
    }

    #[tokio::test]
    async fn file_without_hash_is_rejected() {
        let api = MockApi::new().with_entry(RemoteEntry {
            path: "odd.txt".into(),
            is_directory: false,
            size: Some(3),
            sha1_hash: None,
            updated_at: None,
        });

        let err = fetch_remote_inventory(&api, None).await.unwrap_err();
        assert!(matches!(err, FetchError::MissingHash(ref p) if p == "odd.txt"));
    }

    #[tokio::test]
    async fn missing_size_defaults_to_zero() {
        let api = MockApi::new().with_entry(RemoteEntry {
            size: None,
            ..RemoteEntry::file("a.txt", "da39a3ee5e6b4b0d3255bfef95601890afd80709", 0)
        });

        let inv = fetch_remote_inventory(&api, None).await.unwrap();
        assert_eq!(inv.get("a.txt").unwrap().size_bytes, 0);
    }

    #[tokio::test]
    async fn works_through_trait_object() {
        let api: Box<dyn RemoteApi> = Box::new(site());
        let inv = fetch_remote_inventory(api.as_ref(), None).await.unwrap();
        assert_eq!(inv.len(), 3);
    }
}
