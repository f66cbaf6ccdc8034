//! `tabveil mappings` — check the profile mapping and list its profiles.

use crate::cli::output::{self, Styled};
use crate::config::Config;
use crate::mapping::MappingLoader;
use anyhow::{bail, Result};

pub async fn run(config: &Config) -> Result<()> {
    let loader = MappingLoader::new(config.mapping_source.clone());
    let mapping = loader.load().await;

    if output::is_json() {
        let profiles: serde_json::Map<String, serde_json::Value> = mapping
            .iter()
            .map(|(key, profile)| (key.to_string(), serde_json::json!(profile)))
            .collect();
        output::print_json(&serde_json::json!({
            "source": loader.source().to_string(),
            "profiles": profiles,
        }));
    } else if !output::is_quiet() {
        let s = Styled::new();
        eprintln!();
        output::print_section(&s, &format!("Profiles from {}", loader.source()));
        for (key, profile) in mapping.iter() {
            match profile.parts() {
                Some((title, favicon)) => output::print_check(
                    s.ok_sym(),
                    key,
                    &format!("{title}  {}", s.dim(&output::truncate(favicon, 60))),
                ),
                None => output::print_check(
                    s.warn_sym(),
                    key,
                    "incomplete: needs both title and favicon",
                ),
            }
        }
        eprintln!();
    }

    if mapping.is_empty() {
        bail!("no usable profiles in {}", loader.source());
    }
    Ok(())
}
