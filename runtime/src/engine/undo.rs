//! Restoring tabs from the snapshot.

use super::{DisguiseEngine, UndoReport};
use crate::accessor::AccessorRequest;
use crate::tabs::TabId;
use anyhow::{Context, Result};
use tracing::{debug, info, warn};

impl DisguiseEngine {
    /// Put every snapshotted tab back the way it was, then drop the snapshot.
    ///
    /// Best effort: closed tabs and failed restores are logged and skipped,
    /// and the snapshot is cleared whatever happened to individual tabs.
    /// Without a snapshot nothing is injected and storage is left alone.
    pub async fn undo(&self) -> Result<UndoReport> {
        let Some(snapshot) = self
            .snapshots
            .load()
            .await
            .context("reading snapshot")?
        else {
            info!("nothing to restore");
            return Ok(UndoReport::default());
        };

        let mut report = UndoReport {
            entries: snapshot.len(),
            ..Default::default()
        };

        let mut jobs = Vec::with_capacity(snapshot.len());
        for (key, details) in snapshot.into_entries() {
            match key.parse::<TabId>() {
                Ok(tab) => jobs.push((tab, AccessorRequest::Restore(details))),
                Err(e) => {
                    warn!(key = %key, "skipping snapshot entry: {e}");
                    report.invalid += 1;
                }
            }
        }

        info!("restoring {} tabs", jobs.len());
        for (tab, outcome) in self.fan_out(jobs).await {
            match outcome {
                Ok(_) => {
                    debug!(%tab, "restored");
                    report.restored += 1;
                }
                Err(e) if e.is_tab_gone() => {
                    debug!(%tab, "tab closed before it could be restored");
                    report.missing += 1;
                }
                Err(e) => {
                    warn!(%tab, "could not restore tab: {e}");
                    report.failed += 1;
                }
            }
        }

        self.snapshots
            .clear_snapshot()
            .await
            .context("clearing snapshot")?;
        Ok(report)
    }
}
