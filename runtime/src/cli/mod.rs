//! CLI subcommand implementations for the `tabveil` binary.

pub mod apply_cmd;
pub mod mappings_cmd;
pub mod output;
pub mod status;
pub mod tabs_cmd;

use crate::config::Config;
use crate::engine::DisguiseEngine;
use crate::host::{CdpHost, MemoryHost, TabHost};
use crate::mapping::MappingLoader;
use crate::store::{SnapshotStore, SqliteStore};
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

/// Connect to the configured browser (or the simulated one).
pub async fn connect_host(config: &Config) -> Result<Arc<dyn TabHost>> {
    if config.simulate {
        info!("using simulated tabs");
        return Ok(Arc::new(MemoryHost::demo()));
    }
    let host = CdpHost::connect(&config.cdp_endpoint, config.inject_timeout)
        .await
        .context("is the browser running with --remote-debugging-port?")?;
    Ok(Arc::new(host))
}

pub fn open_snapshots(config: &Config) -> Result<SnapshotStore> {
    let path = config.storage_path();
    let store = SqliteStore::open(&path)
        .with_context(|| format!("opening storage at {}", path.display()))?;
    Ok(SnapshotStore::new(Arc::new(store)))
}

/// Everything a disguise or undo needs.
pub async fn build_engine(config: &Config) -> Result<DisguiseEngine> {
    let snapshots = open_snapshots(config)?;
    let host = connect_host(config).await?;
    Ok(DisguiseEngine::new(
        host,
        snapshots,
        MappingLoader::new(config.mapping_source.clone()),
    ))
}
