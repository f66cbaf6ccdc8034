//! Fetch the profile mapping from its configured source.
//!
//! Loading never fails the caller: transport, parse and shape problems are
//! logged and produce an empty mapping.

use super::DomainMapping;
use anyhow::{bail, Context, Result};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, warn};

/// Mapping shipped with the binary.
const BUNDLED_MAPPING: &str = include_str!("../../data/domain_mapping.json");

const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Where profile data comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MappingSource {
    Bundled,
    File(PathBuf),
    Url(String),
}

impl MappingSource {
    /// `bundled`, an `http(s)://` URL, or a file path.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.is_empty() || raw.eq_ignore_ascii_case("bundled") {
            Self::Bundled
        } else if raw.starts_with("http://") || raw.starts_with("https://") {
            Self::Url(raw.to_string())
        } else {
            Self::File(PathBuf::from(raw))
        }
    }
}

impl fmt::Display for MappingSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bundled => write!(f, "bundled mapping"),
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Url(url) => write!(f, "{url}"),
        }
    }
}

/// Loads [`DomainMapping`]s from one source.
#[derive(Debug, Clone)]
pub struct MappingLoader {
    source: MappingSource,
    client: reqwest::Client,
}

impl MappingLoader {
    pub fn new(source: MappingSource) -> Self {
        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self { source, client }
    }

    pub fn source(&self) -> &MappingSource {
        &self.source
    }

    /// The mapping, or an empty one if it could not be loaded.
    pub async fn load(&self) -> DomainMapping {
        match self.try_load().await {
            Ok(mapping) => {
                debug!("loaded {} profiles from {}", mapping.len(), self.source);
                mapping
            }
            Err(e) => {
                warn!("could not load profile mapping from {}: {e:#}", self.source);
                DomainMapping::default()
            }
        }
    }

    async fn try_load(&self) -> Result<DomainMapping> {
        let text = match &self.source {
            MappingSource::Bundled => BUNDLED_MAPPING.to_string(),
            MappingSource::File(path) => tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("reading {}", path.display()))?,
            MappingSource::Url(url) => {
                let resp = self
                    .client
                    .get(url)
                    .send()
                    .await
                    .with_context(|| format!("fetching {url}"))?;
                let status = resp.status();
                if !status.is_success() {
                    bail!("{url} answered {status}");
                }
                resp.text().await.context("reading mapping body")?
            }
        };

        let value: serde_json::Value =
            serde_json::from_str(&text).context("parsing mapping JSON")?;
        Ok(DomainMapping::from_value(value)?)
    }
}
