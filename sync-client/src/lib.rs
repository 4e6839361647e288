//! # sync-client
//!
//! I/O side of neosync: everything that touches the disk or the network.
//!
//! ## Features
//!
//! - **Local Inventory Scanner**: walks the content root, SHA-1 per file
//! - **Remote Inventory Fetcher**: one listing call, directories filtered out
//! - **Transfer Executor**: sequential uploads and batched deletes with
//!   bounded retry and a fixed gap between API calls
//! - **API Abstraction**: pluggable remote layer (Neocities, mock)
//!
//! ## Example
//!
//! ```ignore
//! use neosync_client::{scan, fetch_remote_inventory, NeocitiesApi, TransferExecutor};
//! use neosync_core::{plan, PlanOptions, SyncOptions};
//!
//! let local = scan(Path::new("public"), &ScanOptions::default())?;
//! let executor = TransferExecutor::new(NeocitiesApi::new(key), SyncOptions::default())?;
//! let remote = fetch_remote_inventory(executor.api(), None).await?;
//!
//! let plan = plan(&local, &remote, &PlanOptions::default());
//! let summary = executor.execute(&plan, Path::new("public")).await;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod api;
pub mod executor;
pub mod fetcher;
pub mod scanner;

pub use api::{
    ApiError, ApiKey, MockApi, NeocitiesApi, Paced, RemoteApi, RemoteEntry, DEFAULT_API_URL,
};
pub use executor::TransferExecutor;
pub use fetcher::{fetch_remote_inventory, FetchError};
pub use scanner::{hash_bytes, hash_file, scan, ScanError, ScanOptions};
