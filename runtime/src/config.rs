//! Runtime configuration: command-line flags over environment over defaults.

use crate::host::cdp::DEFAULT_CDP_ENDPOINT;
use crate::mapping::MappingSource;
use clap::Args;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Flags shared by every subcommand.
#[derive(Debug, Clone, Default, Args)]
pub struct ConfigArgs {
    /// State directory (default: $TABVEIL_HOME or ~/.tabveil)
    #[arg(long, global = true)]
    pub home: Option<PathBuf>,

    /// Browser DevTools endpoint (default: $TABVEIL_CDP_URL or http://127.0.0.1:9222)
    #[arg(long, global = true)]
    pub cdp: Option<String>,

    /// Profile mapping: "bundled", a file path, or an http(s) URL
    #[arg(long, global = true)]
    pub mappings: Option<String>,

    /// Per-tab script timeout in milliseconds
    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,

    /// Run against a built-in set of fake tabs instead of a browser
    #[arg(long, global = true)]
    pub simulate: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub home: PathBuf,
    pub cdp_endpoint: String,
    pub mapping_source: MappingSource,
    pub inject_timeout: Duration,
    pub simulate: bool,
}

impl Config {
    /// Resolve against the process environment.
    pub fn resolve(args: &ConfigArgs) -> Self {
        Self::resolve_with(args, |key| std::env::var(key).ok())
    }

    pub fn resolve_with(args: &ConfigArgs, env: impl Fn(&str) -> Option<String>) -> Self {
        let home = args
            .home
            .clone()
            .or_else(|| env("TABVEIL_HOME").map(PathBuf::from))
            .unwrap_or_else(default_home);

        let cdp_endpoint = args
            .cdp
            .clone()
            .or_else(|| env("TABVEIL_CDP_URL"))
            .unwrap_or_else(|| DEFAULT_CDP_ENDPOINT.to_string());

        let mapping_source = args
            .mappings
            .clone()
            .or_else(|| env("TABVEIL_MAPPINGS"))
            .map(|raw| MappingSource::parse(&raw))
            .unwrap_or(MappingSource::Bundled);

        let timeout_ms = args
            .timeout_ms
            .or_else(|| env("TABVEIL_TIMEOUT_MS").and_then(|s| s.trim().parse().ok()))
            .unwrap_or(DEFAULT_TIMEOUT_MS);

        Self {
            home,
            cdp_endpoint,
            mapping_source,
            inject_timeout: Duration::from_millis(timeout_ms),
            simulate: args.simulate,
        }
    }

    /// SQLite file holding the snapshot. Simulated runs keep their own.
    pub fn storage_path(&self) -> PathBuf {
        if self.simulate {
            self.home.join("simulate.db")
        } else {
            self.home.join("storage.db")
        }
    }
}

fn default_home() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join(".tabveil")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::resolve_with(&ConfigArgs::default(), env_of(&[]));
        assert_eq!(config.cdp_endpoint, DEFAULT_CDP_ENDPOINT);
        assert_eq!(config.mapping_source, MappingSource::Bundled);
        assert_eq!(config.inject_timeout, Duration::from_millis(DEFAULT_TIMEOUT_MS));
        assert!(config.home.ends_with(".tabveil"));
        assert!(!config.simulate);
    }

    #[test]
    fn test_env_overrides_defaults() {
        let config = Config::resolve_with(
            &ConfigArgs::default(),
            env_of(&[
                ("TABVEIL_HOME", "/var/lib/tabveil"),
                ("TABVEIL_CDP_URL", "ws://10.0.0.2:9333/devtools/browser/x"),
                ("TABVEIL_MAPPINGS", "https://cdn.example/map.json"),
                ("TABVEIL_TIMEOUT_MS", "2500"),
            ]),
        );
        assert_eq!(config.storage_path(), PathBuf::from("/var/lib/tabveil/storage.db"));
        assert_eq!(config.cdp_endpoint, "ws://10.0.0.2:9333/devtools/browser/x");
        assert_eq!(
            config.mapping_source,
            MappingSource::Url("https://cdn.example/map.json".into())
        );
        assert_eq!(config.inject_timeout, Duration::from_millis(2500));
    }

    #[test]
    fn test_flags_override_env() {
        let args = ConfigArgs {
            home: Some(PathBuf::from("/tmp/veil")),
            timeout_ms: Some(50),
            mappings: Some("./profiles.json".into()),
            ..Default::default()
        };
        let config = Config::resolve_with(
            &args,
            env_of(&[("TABVEIL_HOME", "/elsewhere"), ("TABVEIL_TIMEOUT_MS", "9")]),
        );
        assert_eq!(config.home, PathBuf::from("/tmp/veil"));
        assert_eq!(config.inject_timeout, Duration::from_millis(50));
        assert_eq!(
            config.mapping_source,
            MappingSource::File(PathBuf::from("./profiles.json"))
        );
    }

    #[test]
    fn test_bad_timeout_env_falls_back() {
        let config = Config::resolve_with(
            &ConfigArgs::default(),
            env_of(&[("TABVEIL_TIMEOUT_MS", "soon")]),
        );
        assert_eq!(config.inject_timeout, Duration::from_millis(DEFAULT_TIMEOUT_MS));
    }
}
