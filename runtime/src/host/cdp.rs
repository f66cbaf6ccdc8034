//! Tab host driving a running Chromium-family browser over CDP.
//!
//! The browser must have been started with `--remote-debugging-port`.
//! CDP identifies tabs by opaque target ids; they are folded into stable
//! integer [`TabId`]s with FNV so a snapshot written by one `tabveil`
//! invocation can be restored by the next.

use super::{InjectError, TabHost};
use crate::accessor::{AccessorReply, AccessorRequest};
use crate::tabs::{TabId, TabInfo};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chromiumoxide::browser::Browser;
use chromiumoxide::cdp::browser_protocol::target::{TargetId, TargetInfo};
use chromiumoxide::cdp::js_protocol::runtime::EvaluateParams;
use chromiumoxide::error::CdpError;
use chromiumoxide::Page;
use fnv::FnvHasher;
use futures::StreamExt;
use std::collections::HashMap;
use std::hash::Hasher;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Default endpoint of `chrome --remote-debugging-port=9222`.
pub const DEFAULT_CDP_ENDPOINT: &str = "http://127.0.0.1:9222";

const ATTACH_POLL: Duration = Duration::from_millis(50);

/// Attached browser plus the task pumping its event handler.
pub struct CdpHost {
    browser: Mutex<Browser>,
    targets: Mutex<TargetMap>,
    handler: JoinHandle<()>,
    timeout: Duration,
}

/// Page targets from the most recent listing.
#[derive(Debug, Default)]
struct TargetMap {
    by_tab: HashMap<TabId, TargetId>,
    listed: bool,
}

impl TargetMap {
    /// Replace the map with a fresh listing, keeping page targets only.
    fn record(&mut self, targets: Vec<TargetInfo>) -> Vec<TabInfo> {
        self.by_tab.clear();
        self.listed = true;
        let by_tab = &mut self.by_tab;
        targets
            .into_iter()
            .filter(|t| t.r#type == "page")
            .map(|t| {
                let id = tab_id_for(t.target_id.as_ref());
                by_tab.insert(id, t.target_id);
                TabInfo {
                    id: Some(id),
                    url: t.url,
                    title: t.title,
                }
            })
            .collect()
    }

    fn resolve(&self, tab: TabId) -> Result<TargetId, InjectError> {
        self.by_tab
            .get(&tab)
            .cloned()
            .ok_or(InjectError::TabNotFound(tab))
    }
}

impl CdpHost {
    /// Attach to the browser at `endpoint` (`http://host:port` or a
    /// `ws://` debugger URL).
    pub async fn connect(endpoint: &str, timeout: Duration) -> Result<Self> {
        let (browser, mut handler) = Browser::connect(endpoint)
            .await
            .with_context(|| format!("connecting to browser at {endpoint}"))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("cdp handler: {e}");
                }
            }
        });

        info!("attached to browser at {endpoint}");
        Ok(Self {
            browser: Mutex::new(browser),
            targets: Mutex::new(TargetMap::default()),
            handler,
            timeout,
        })
    }

    async fn list(&self, map: &mut TargetMap) -> Result<Vec<TabInfo>, CdpError> {
        let targets = self.browser.lock().await.fetch_targets().await?;
        Ok(map.record(targets))
    }

    /// Target behind `tab`, listing the browser's targets only if this host
    /// has not listed them yet.
    async fn target_for(&self, tab: TabId) -> Result<TargetId, InjectError> {
        let mut map = self.targets.lock().await;
        if !map.listed {
            self.list(&mut map).await.map_err(|e| classify(tab, e))?;
        }
        map.resolve(tab)
    }

    /// The page for `target` once the browser has attached a session to it.
    ///
    /// A listing re-registers every target, so pages only become available
    /// a round trip after the listing that found them.
    async fn attached_page(&self, target: &TargetId) -> Result<Page, CdpError> {
        loop {
            let lookup = self.browser.lock().await.get_page(target.clone()).await;
            match lookup {
                Err(CdpError::NotFound) => tokio::time::sleep(ATTACH_POLL).await,
                other => return other,
            }
        }
    }
}

impl Drop for CdpHost {
    fn drop(&mut self) {
        self.handler.abort();
    }
}

#[async_trait]
impl TabHost for CdpHost {
    async fn query_tabs(&self) -> Result<Vec<TabInfo>> {
        let mut map = self.targets.lock().await;
        self.list(&mut map).await.context("listing browser tabs")
    }

    async fn run(
        &self,
        tab: TabId,
        request: &AccessorRequest,
    ) -> Result<AccessorReply, InjectError> {
        let target = self.target_for(tab).await?;

        let page = match tokio::time::timeout(self.timeout, self.attached_page(&target)).await {
            Ok(page) => page.map_err(|e| classify(tab, e))?,
            Err(_) => {
                debug!(%tab, "no session attached within {:?}", self.timeout);
                return Err(InjectError::TabNotFound(tab));
            }
        };

        let params = EvaluateParams::builder()
            .expression(request.to_script())
            .await_promise(true)
            .return_by_value(true)
            .build()
            .map_err(InjectError::Transport)?;

        let evaluation = tokio::time::timeout(self.timeout, page.evaluate_expression(params))
            .await
            .map_err(|_| InjectError::Timeout(tab, self.timeout))?
            .map_err(|e| classify(tab, e))?;

        let value: serde_json::Value =
            evaluation
                .into_value()
                .map_err(|e| InjectError::BadReply {
                    mode: request.mode(),
                    detail: e.to_string(),
                })?;
        AccessorReply::from_value(request, value)
    }
}

/// Stable, non-negative integer id for a CDP target id.
pub fn tab_id_for(target_id: &str) -> TabId {
    let mut hasher = FnvHasher::default();
    hasher.write(target_id.as_bytes());
    TabId((hasher.finish() & 0x7fff_ffff) as i64)
}

fn classify(tab: TabId, err: CdpError) -> InjectError {
    match err {
        CdpError::NotFound => InjectError::TabNotFound(tab),
        CdpError::JavascriptException(_) => InjectError::Script {
            tab,
            message: err.to_string(),
        },
        other => classify_message(tab, other.to_string()),
    }
}

/// Sort a protocol error message into the injection taxonomy.
fn classify_message(tab: TabId, message: String) -> InjectError {
    let lower = message.to_ascii_lowercase();
    if lower.contains("no target with given id")
        || lower.contains("target closed")
        || lower.contains("no tab with")
        || lower.contains("session with given id not found")
    {
        InjectError::TabNotFound(tab)
    } else if lower.contains("cannot access") || lower.contains("cannot be scripted") {
        InjectError::Restricted {
            tab,
            reason: message,
        }
    } else {
        InjectError::Transport(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tab_id_is_stable_and_valid() {
        let a = tab_id_for("8E1C2A0F4D9B3E57A6C1D2E3F4A5B6C7");
        let b = tab_id_for("8E1C2A0F4D9B3E57A6C1D2E3F4A5B6C7");
        let c = tab_id_for("0F4D9B3E57A6C1D2E3F4A5B6C78E1C2A");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.is_valid());
        assert!(c.is_valid());
    }

    fn target(id: &str, kind: &str, url: &str) -> TargetInfo {
        serde_json::from_value(serde_json::json!({
            "targetId": id,
            "type": kind,
            "title": format!("title of {id}"),
            "url": url,
            "attached": false,
            "canAccessOpener": false
        }))
        .unwrap()
    }

    #[test]
    fn test_target_map_keeps_pages_only() {
        let mut map = TargetMap::default();
        assert!(!map.listed);

        let tabs = map.record(vec![
            target("AAAA", "page", "https://news.example/"),
            target("BBBB", "service_worker", "https://news.example/sw.js"),
            target("CCCC", "page", "chrome://settings/"),
        ]);

        assert!(map.listed);
        assert_eq!(tabs.len(), 2);
        assert_eq!(tabs[0].id, Some(tab_id_for("AAAA")));
        assert_eq!(tabs[0].url, "https://news.example/");
        assert_eq!(map.resolve(tab_id_for("AAAA")).unwrap().as_ref(), "AAAA");
        assert_eq!(
            map.resolve(tab_id_for("BBBB")),
            Err(InjectError::TabNotFound(tab_id_for("BBBB")))
        );
    }

    #[test]
    fn test_closed_tab_drops_out_of_next_listing() {
        let mut map = TargetMap::default();
        map.record(vec![
            target("AAAA", "page", "https://news.example/"),
            target("DDDD", "page", "https://shop.example/"),
        ]);
        map.record(vec![target("DDDD", "page", "https://shop.example/")]);

        let closed = tab_id_for("AAAA");
        assert_eq!(map.resolve(closed), Err(InjectError::TabNotFound(closed)));
        assert!(map.resolve(tab_id_for("DDDD")).is_ok());
    }

    #[test]
    fn test_unattached_page_counts_as_gone() {
        let err = classify(TabId(9), CdpError::NotFound);
        assert_eq!(err, InjectError::TabNotFound(TabId(9)));
        assert!(err.is_tab_gone());
    }

    #[test]
    fn test_classify_missing_target() {
        let err = classify_message(TabId(4), "No target with given id found".into());
        assert_eq!(err, InjectError::TabNotFound(TabId(4)));
    }

    #[test]
    fn test_classify_restricted_page() {
        let err = classify_message(
            TabId(4),
            "Cannot access contents of url \"chrome://settings/\"".into(),
        );
        assert!(matches!(err, InjectError::Restricted { .. }));
    }

    #[test]
    fn test_classify_other_errors_as_transport() {
        let err = classify_message(TabId(4), "websocket closed".into());
        assert!(matches!(err, InjectError::Transport(_)));
    }
}
