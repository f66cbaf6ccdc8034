//! Tab disguise engine.
//!
//! Owns the save / apply / restore cycle:
//!
//! 1. the first disguise after an undo captures every eligible tab's
//!    original title and favicon into the snapshot;
//! 2. each disguise rewrites every eligible tab according to its [`Mode`];
//! 3. undo puts the snapshot back and deletes it.
//!
//! Per-tab work fans out concurrently and is joined with `join_all`, so one
//! tab failing never stops the others.

mod apply;
mod undo;

use crate::accessor::{AccessorReply, AccessorRequest};
use crate::host::{InjectError, TabHost};
use crate::mapping::MappingLoader;
use crate::store::SnapshotStore;
use crate::tabs::TabId;
use futures::future::join_all;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::fmt;
use std::sync::{Arc, Mutex};

/// Disguise strategy applied to every eligible tab in one invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Zero-width title and transparent icon.
    PurgeAll,
    /// A random profile from the mapping per tab.
    Professional,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PurgeAll => write!(f, "purge-all"),
            Self::Professional => write!(f, "professional"),
        }
    }
}

/// Outcome of [`DisguiseEngine::apply_mode`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ApplyReport {
    /// A new snapshot was written during this call.
    pub snapshot_captured: bool,
    /// Tabs recorded in that new snapshot.
    pub captured: usize,
    /// Eligible tabs the apply phase was aimed at.
    pub targeted: usize,
    pub succeeded: usize,
    pub skipped: usize,
    pub failed: usize,
    /// Why the apply phase did not run, if it did not.
    pub aborted: Option<String>,
}

/// Outcome of [`DisguiseEngine::undo`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UndoReport {
    /// Entries found in the snapshot.
    pub entries: usize,
    pub restored: usize,
    /// Tabs closed since the snapshot was taken.
    pub missing: usize,
    pub failed: usize,
    /// Entries whose key was not a tab id.
    pub invalid: usize,
}

pub struct DisguiseEngine {
    host: Arc<dyn TabHost>,
    snapshots: SnapshotStore,
    mappings: MappingLoader,
    rng: Mutex<StdRng>,
}

impl DisguiseEngine {
    pub fn new(host: Arc<dyn TabHost>, snapshots: SnapshotStore, mappings: MappingLoader) -> Self {
        Self {
            host,
            snapshots,
            mappings,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Fix the profile draws, for reproducible runs.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Mutex::new(StdRng::seed_from_u64(seed));
        self
    }

    pub fn host(&self) -> &Arc<dyn TabHost> {
        &self.host
    }

    pub fn snapshots(&self) -> &SnapshotStore {
        &self.snapshots
    }

    /// Send every request at once and wait for all of them to settle.
    async fn fan_out(
        &self,
        jobs: Vec<(TabId, AccessorRequest)>,
    ) -> Vec<(TabId, Result<AccessorReply, InjectError>)> {
        let host = &self.host;
        join_all(jobs.into_iter().map(|(tab, request)| async move {
            let outcome = host.run(tab, &request).await;
            (tab, outcome)
        }))
        .await
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::accessor::document::PageDocument;
    use crate::host::MemoryHost;
    use crate::mapping::MappingSource;
    use crate::store::MemoryStore;
    use std::io::Write;

    pub struct Fixture {
        pub host: Arc<MemoryHost>,
        pub kv: Arc<MemoryStore>,
        pub engine: DisguiseEngine,
        _mapping: Option<tempfile::NamedTempFile>,
    }

    pub fn news_tab() -> PageDocument {
        PageDocument::new("https://news.example/", "Front page")
            .with_link("shortcut icon", "/favicon.ico")
    }

    pub fn shop_tab() -> PageDocument {
        PageDocument::new("https://shop.example/cart", "Your cart (2)")
            .with_link("icon", "https://cdn.shop.example/icon.png")
    }

    pub fn settings_tab() -> PageDocument {
        PageDocument::new("chrome://settings/", "Settings")
    }

    /// Host with two eligible tabs (1, 2) and one internal page (3).
    pub fn fixture(mapping_json: Option<&str>) -> Fixture {
        let host = Arc::new(MemoryHost::new());
        host.open_tab(TabId(1), news_tab());
        host.open_tab(TabId(2), shop_tab());
        host.open_tab(TabId(3), settings_tab());

        let (source, file) = match mapping_json {
            Some(json) => {
                let mut file = tempfile::NamedTempFile::new().unwrap();
                file.write_all(json.as_bytes()).unwrap();
                (MappingSource::File(file.path().to_path_buf()), Some(file))
            }
            None => (MappingSource::Bundled, None),
        };

        let kv = Arc::new(MemoryStore::new());
        let engine = DisguiseEngine::new(
            host.clone(),
            SnapshotStore::new(kv.clone()),
            MappingLoader::new(source),
        )
        .with_seed(7);

        Fixture {
            host,
            kv,
            engine,
            _mapping: file,
        }
    }
}
