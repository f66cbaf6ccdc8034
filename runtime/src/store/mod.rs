//! Persistent key-value storage and the snapshot kept in it.
//!
//! The browser-side notion of "local storage" is a small JSON-valued map.
//! [`SqliteStore`] keeps it on disk between `tabveil` runs; [`MemoryStore`]
//! keeps it for the life of the process.

pub mod memory;
pub mod snapshot;
pub mod sqlite;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

pub use memory::MemoryStore;
pub use snapshot::{Snapshot, SnapshotStore, SNAPSHOT_KEY};
pub use sqlite::SqliteStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
    #[error("stored value is not valid JSON")]
    Encoding(#[from] serde_json::Error),
    #[error("creating storage directory")]
    Io(#[from] std::io::Error),
}

/// Whole-value JSON storage under string keys.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;

    /// Replace any existing value.
    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError>;

    async fn remove(&self, key: &str) -> Result<(), StoreError>;
}
