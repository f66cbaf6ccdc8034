//! `tabveil status` — is a disguise cycle in progress, and for which tabs.

use crate::cli::open_snapshots;
use crate::cli::output::{self, Styled};
use crate::config::Config;
use anyhow::Result;

pub async fn run(config: &Config) -> Result<()> {
    let snapshots = open_snapshots(config)?;
    let snapshot = snapshots.load().await?;

    if output::is_json() {
        output::print_json(&serde_json::json!({
            "disguised": snapshot.is_some(),
            "storage": config.storage_path().display().to_string(),
            "snapshot": snapshot,
        }));
        return Ok(());
    }

    let s = Styled::new();
    eprintln!();
    match snapshot {
        None => {
            eprintln!("  {} No disguise in progress.", s.info_sym());
        }
        Some(snapshot) => {
            eprintln!(
                "  {} Disguise in progress: {} tab(s) saved. Run 'tabveil undo' to restore.",
                s.warn_sym(),
                snapshot.len()
            );
            eprintln!();
            output::print_section(&s, "Saved originals");
            for (key, details) in snapshot.iter() {
                let icon = details.favicon_href.as_deref().unwrap_or("(no icon)");
                output::print_check(
                    s.info_sym(),
                    key,
                    &format!(
                        "{}  {}",
                        output::truncate(&output::visible_title(&details.title), 48),
                        s.dim(&output::truncate(icon, 60))
                    ),
                );
            }
        }
    }
    eprintln!(
        "  {}",
        s.dim(&format!("storage: {}", config.storage_path().display()))
    );
    eprintln!();
    Ok(())
}
