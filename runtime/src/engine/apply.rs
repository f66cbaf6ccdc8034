//! Snapshot capture and the disguise pass.

use super::{ApplyReport, DisguiseEngine, Mode};
use crate::accessor::{AccessorReply, AccessorRequest, Profile};
use crate::store::Snapshot;
use crate::tabs::{eligible_ids, TabId};
use anyhow::{Context, Result};
use rand::Rng;
use tracing::{debug, info, warn};

impl DisguiseEngine {
    /// Disguise every eligible tab.
    ///
    /// Captures the originals first unless a snapshot already exists, so a
    /// chain of disguises always restores to the state before the first.
    /// Only tab enumeration and storage failures are returned as errors;
    /// per-tab failures are logged and counted.
    pub async fn apply_mode(&self, mode: Mode) -> Result<ApplyReport> {
        let mut report = ApplyReport::default();

        if let Some(captured) = self.capture_snapshot().await? {
            report.snapshot_captured = true;
            report.captured = captured;
        }

        let tabs = self
            .host
            .query_tabs()
            .await
            .context("enumerating tabs to disguise")?;
        let targets = eligible_ids(&tabs);

        let jobs: Vec<(TabId, AccessorRequest)> = match mode {
            Mode::PurgeAll => targets
                .into_iter()
                .map(|tab| (tab, AccessorRequest::BlankWrite))
                .collect(),
            Mode::Professional => {
                let mapping = self.mappings.load().await;
                if mapping.is_empty() {
                    warn!(
                        "no disguise profiles available from {}, leaving tabs as they are",
                        self.mappings.source()
                    );
                    report.aborted = Some("no profiles available".to_string());
                    return Ok(report);
                }
                let profiles = mapping.profiles();
                let draws = self.draw_profiles(&profiles, targets.len());
                targets
                    .into_iter()
                    .zip(draws)
                    .map(|(tab, profile)| (tab, AccessorRequest::SpecificWrite(profile)))
                    .collect()
            }
        };

        report.targeted = jobs.len();
        info!("applying {mode} to {} tabs", report.targeted);

        for (tab, outcome) in self.fan_out(jobs).await {
            match outcome {
                Ok(AccessorReply::Skipped(reason)) => {
                    debug!(%tab, "tab left unchanged: {reason}");
                    report.skipped += 1;
                }
                Ok(_) => {
                    debug!(%tab, "disguised");
                    report.succeeded += 1;
                }
                Err(e) => {
                    warn!(%tab, "could not disguise tab: {e}");
                    report.failed += 1;
                }
            }
        }

        Ok(report)
    }

    /// Write a snapshot of every eligible tab unless one is already stored.
    ///
    /// Returns the number of tabs captured, or `None` when an existing
    /// snapshot was kept.
    pub(crate) async fn capture_snapshot(&self) -> Result<Option<usize>> {
        if self
            .snapshots
            .has_snapshot()
            .await
            .context("checking for an existing snapshot")?
        {
            debug!("snapshot already present, keeping the original details");
            return Ok(None);
        }

        let tabs = self
            .host
            .query_tabs()
            .await
            .context("enumerating tabs for snapshot")?;
        let jobs = eligible_ids(&tabs)
            .into_iter()
            .map(|tab| (tab, AccessorRequest::Read))
            .collect();

        let mut snapshot = Snapshot::new();
        for (tab, outcome) in self.fan_out(jobs).await {
            match outcome {
                Ok(AccessorReply::Details(details)) => snapshot.insert(tab, details),
                Ok(other) => warn!(%tab, "unexpected reply to read: {other:?}"),
                Err(e) => warn!(%tab, "could not read tab details: {e}"),
            }
        }

        self.snapshots
            .write_snapshot(&snapshot)
            .await
            .context("saving snapshot")?;
        info!("captured original details of {} tabs", snapshot.len());
        Ok(Some(snapshot.len()))
    }

    /// One uniform draw, with replacement, per tab.
    fn draw_profiles(&self, profiles: &[&Profile], count: usize) -> Vec<Profile> {
        let mut rng = self.rng.lock().unwrap_or_else(|p| p.into_inner());
        (0..count)
            .map(|_| profiles[rng.gen_range(0..profiles.len())].clone())
            .collect()
    }
}
