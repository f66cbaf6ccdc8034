//! The "original details" snapshot.
//!
//! At most one snapshot exists. Its presence is the only state carried
//! between a disguise and the undo that follows it: there is no separate
//! "disguised" flag to drift out of sync with the data.

use super::{KeyValueStore, StoreError};
use crate::accessor::TabDetails;
use crate::tabs::TabId;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::warn;

/// Storage key holding the snapshot.
pub const SNAPSHOT_KEY: &str = "originalDetails";

/// Original details per tab, keyed by the string form of the tab id.
///
/// Keys stay strings so that a damaged entry is still visible (and skipped)
/// at restore time rather than silently dropped on load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot {
    entries: BTreeMap<String, TabDetails>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, tab: TabId, details: TabDetails) {
        self.entries.insert(tab.to_string(), details);
    }

    pub fn get(&self, tab: TabId) -> Option<&TabDetails> {
        self.entries.get(&tab.to_string())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TabDetails)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn into_entries(self) -> BTreeMap<String, TabDetails> {
        self.entries
    }

    /// Decode a stored value, dropping entries whose details are unreadable.
    ///
    /// Returns `None` for anything that is not a JSON object.
    pub fn from_value(value: Value) -> Option<Self> {
        let Value::Object(map) = value else {
            return None;
        };
        let mut entries = BTreeMap::new();
        for (key, raw) in map {
            match serde_json::from_value::<TabDetails>(raw) {
                Ok(details) => {
                    entries.insert(key, details);
                }
                Err(e) => warn!(key = %key, "dropping unreadable snapshot entry: {e}"),
            }
        }
        Some(Self { entries })
    }
}

impl FromIterator<(TabId, TabDetails)> for Snapshot {
    fn from_iter<I: IntoIterator<Item = (TabId, TabDetails)>>(iter: I) -> Self {
        let mut snapshot = Self::new();
        for (tab, details) in iter {
            snapshot.insert(tab, details);
        }
        snapshot
    }
}

/// Snapshot persistence on top of a [`KeyValueStore`].
#[derive(Clone)]
pub struct SnapshotStore {
    store: Arc<dyn KeyValueStore>,
}

impl SnapshotStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// The persisted snapshot, if a non-empty one exists.
    ///
    /// A stored value that is not JSON at all reads as no snapshot, so the
    /// next disguise overwrites it.
    pub async fn load(&self) -> Result<Option<Snapshot>, StoreError> {
        let value = match self.store.get(SNAPSHOT_KEY).await {
            Ok(Some(value)) => value,
            Ok(None) => return Ok(None),
            Err(StoreError::Encoding(e)) => {
                warn!("stored snapshot is unreadable, ignoring it: {e}");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };
        match Snapshot::from_value(value) {
            Some(snapshot) if !snapshot.is_empty() => Ok(Some(snapshot)),
            Some(_) => Ok(None),
            None => {
                warn!("stored snapshot is not an object, ignoring it");
                Ok(None)
            }
        }
    }

    pub async fn has_snapshot(&self) -> Result<bool, StoreError> {
        Ok(self.load().await?.is_some())
    }

    /// The persisted snapshot, or an empty one.
    pub async fn read_snapshot(&self) -> Result<Snapshot, StoreError> {
        Ok(self.load().await?.unwrap_or_default())
    }

    /// Overwrite whatever is stored.
    pub async fn write_snapshot(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        let value = serde_json::to_value(snapshot)?;
        self.store.set(SNAPSHOT_KEY, value).await
    }

    pub async fn clear_snapshot(&self) -> Result<(), StoreError> {
        self.store.remove(SNAPSHOT_KEY).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use assert_json_diff::assert_json_eq;
    use serde_json::json;

    fn store() -> (Arc<MemoryStore>, SnapshotStore) {
        let kv = Arc::new(MemoryStore::new());
        (kv.clone(), SnapshotStore::new(kv))
    }

    #[tokio::test]
    async fn test_absent_and_empty_mean_no_snapshot() {
        let (kv, snapshots) = store();
        assert!(!snapshots.has_snapshot().await.unwrap());

        kv.set(SNAPSHOT_KEY, json!({})).await.unwrap();
        assert!(!snapshots.has_snapshot().await.unwrap());
        assert!(snapshots.read_snapshot().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_write_read_clear() {
        let (kv, snapshots) = store();
        let snapshot: Snapshot = [(
            TabId(12),
            TabDetails::new("Docs", Some("https://d.example/f.ico".into()), "icon"),
        )]
        .into_iter()
        .collect();

        snapshots.write_snapshot(&snapshot).await.unwrap();
        assert!(snapshots.has_snapshot().await.unwrap());
        assert_eq!(snapshots.read_snapshot().await.unwrap(), snapshot);

        assert_json_eq!(
            kv.get(SNAPSHOT_KEY).await.unwrap().unwrap(),
            json!({
                "12": {
                    "title": "Docs",
                    "faviconHref": "https://d.example/f.ico",
                    "faviconRel": "icon"
                }
            })
        );

        snapshots.clear_snapshot().await.unwrap();
        assert!(!snapshots.has_snapshot().await.unwrap());
        assert_eq!(kv.get(SNAPSHOT_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_non_object_value_is_ignored() {
        let (kv, snapshots) = store();
        kv.set(SNAPSHOT_KEY, json!(["not", "a", "map"])).await.unwrap();
        assert_eq!(snapshots.load().await.unwrap(), None);
    }

    #[test]
    fn test_from_value_keeps_odd_keys_and_drops_bad_details() {
        let snapshot = Snapshot::from_value(json!({
            "3": { "title": "ok", "faviconHref": null, "faviconRel": "icon" },
            "not-a-tab": { "title": "kept for undo to reject" },
            "4": { "faviconHref": "missing title" }
        }))
        .unwrap();
        let keys: Vec<&str> = snapshot.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["3", "not-a-tab"]);
    }
}
