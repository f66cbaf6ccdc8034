//! `tabveil tabs` — list open tabs and whether they would be disguised.

use crate::cli::connect_host;
use crate::cli::output::{self, Styled};
use crate::config::Config;
use crate::host::TabHost;
use anyhow::Result;

pub async fn run(config: &Config) -> Result<()> {
    let host = connect_host(config).await?;

    if output::is_json() {
        let tabs = host.query_tabs().await?;
        let rows: Vec<serde_json::Value> = tabs
            .iter()
            .map(|t| {
                serde_json::json!({
                    "id": t.id,
                    "url": t.url,
                    "title": t.title,
                    "eligible": t.is_eligible(),
                })
            })
            .collect();
        output::print_json(&serde_json::Value::Array(rows));
        return Ok(());
    }

    print_tabs(host.as_ref()).await
}

/// One line per tab, eligible ones marked.
pub async fn print_tabs(host: &dyn TabHost) -> Result<()> {
    let s = Styled::new();
    let tabs = host.query_tabs().await?;

    eprintln!();
    output::print_section(&s, "Tabs");
    if tabs.is_empty() {
        eprintln!("    {}", s.dim("no open tabs"));
    }
    for tab in &tabs {
        let sym = if tab.is_eligible() {
            s.ok_sym()
        } else {
            s.info_sym()
        };
        let id = tab
            .id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "-".to_string());
        output::print_check(
            sym,
            &id,
            &format!(
                "{}  {}",
                output::truncate(&output::visible_title(&tab.title), 48),
                s.dim(&output::truncate(&tab.url, 60))
            ),
        );
    }
    eprintln!();
    Ok(())
}
