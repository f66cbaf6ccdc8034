//! In-process tab host backed by [`PageDocument`]s.
//!
//! Used by `--simulate` runs and throughout the test suite. Individual tabs
//! can be made to fail so partial-failure behaviour can be exercised.

use super::{InjectError, TabHost};
use crate::accessor::document::PageDocument;
use crate::accessor::{AccessorReply, AccessorRequest};
use crate::tabs::{is_web_url, TabId, TabInfo};
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Clone)]
struct MemoryTab {
    id: Option<TabId>,
    document: PageDocument,
}

/// A fake browser holding tabs in memory.
#[derive(Debug, Default)]
pub struct MemoryHost {
    tabs: Mutex<Vec<MemoryTab>>,
    failures: Mutex<HashMap<TabId, InjectError>>,
    injections: AtomicUsize,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// A handful of ordinary tabs for `--simulate` runs.
    pub fn demo() -> Self {
        let host = Self::new();
        host.open_tab(
            TabId(101),
            PageDocument::new("https://news.ycombinator.com/", "Hacker News")
                .with_link("icon", "favicon.ico"),
        );
        host.open_tab(
            TabId(102),
            PageDocument::new("https://www.youtube.com/watch?v=dQw4w9WgXcQ", "YouTube")
                .with_link("shortcut icon", "https://www.youtube.com/s/desktop/favicon.ico")
                .with_link("icon", "https://www.youtube.com/s/desktop/favicon_144x144.png"),
        );
        host.open_tab(
            TabId(103),
            PageDocument::new("https://www.reddit.com/r/rust/", "r/rust").with_default_favicon(),
        );
        host.open_tab(
            TabId(104),
            PageDocument::new("chrome://settings/", "Settings"),
        );
        host
    }

    pub fn open_tab(&self, id: TabId, document: PageDocument) {
        self.lock_tabs().push(MemoryTab {
            id: Some(id),
            document,
        });
    }

    /// A tab the browser reports without a usable id.
    pub fn open_untracked_tab(&self, document: PageDocument) {
        self.lock_tabs().push(MemoryTab { id: None, document });
    }

    pub fn close_tab(&self, id: TabId) {
        self.lock_tabs().retain(|t| t.id != Some(id));
    }

    /// Make every future request to `id` fail with `error`.
    pub fn fail_tab(&self, id: TabId, error: InjectError) {
        self.failures
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .insert(id, error);
    }

    pub fn document(&self, id: TabId) -> Option<PageDocument> {
        self.lock_tabs()
            .iter()
            .find(|t| t.id == Some(id))
            .map(|t| t.document.clone())
    }

    /// Number of requests that reached `run`, failed ones included.
    pub fn injections(&self) -> usize {
        self.injections.load(Ordering::SeqCst)
    }

    fn lock_tabs(&self) -> MutexGuard<'_, Vec<MemoryTab>> {
        self.tabs.lock().unwrap_or_else(|p| p.into_inner())
    }
}

#[async_trait]
impl TabHost for MemoryHost {
    async fn query_tabs(&self) -> Result<Vec<TabInfo>> {
        Ok(self
            .lock_tabs()
            .iter()
            .map(|t| TabInfo {
                id: t.id,
                url: t.document.url.clone(),
                title: t.document.title.clone(),
            })
            .collect())
    }

    async fn run(
        &self,
        tab: TabId,
        request: &AccessorRequest,
    ) -> Result<AccessorReply, InjectError> {
        self.injections.fetch_add(1, Ordering::SeqCst);

        if let Some(err) = self
            .failures
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .get(&tab)
        {
            return Err(err.clone());
        }

        let mut tabs = self.lock_tabs();
        let entry = tabs
            .iter_mut()
            .find(|t| t.id == Some(tab))
            .ok_or(InjectError::TabNotFound(tab))?;

        if !is_web_url(&entry.document.url) {
            return Err(InjectError::Restricted {
                tab,
                reason: format!("cannot access contents of {}", entry.document.url),
            });
        }

        Ok(entry.document.apply(request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accessor::TabDetails;

    #[tokio::test]
    async fn test_query_reports_all_tabs() {
        let host = MemoryHost::demo();
        let tabs = host.query_tabs().await.unwrap();
        assert_eq!(tabs.len(), 4);
        assert_eq!(tabs.iter().filter(|t| t.is_eligible()).count(), 3);
    }

    #[tokio::test]
    async fn test_run_on_closed_tab() {
        let host = MemoryHost::demo();
        host.close_tab(TabId(101));
        let err = host
            .run(TabId(101), &AccessorRequest::Read)
            .await
            .unwrap_err();
        assert!(err.is_tab_gone());
        assert_eq!(host.injections(), 1);
    }

    #[tokio::test]
    async fn test_run_on_internal_page_is_restricted() {
        let host = MemoryHost::demo();
        let err = host
            .run(TabId(104), &AccessorRequest::BlankWrite)
            .await
            .unwrap_err();
        assert!(matches!(err, InjectError::Restricted { .. }));
        assert_eq!(host.document(TabId(104)).unwrap().title, "Settings");
    }

    #[tokio::test]
    async fn test_run_applies_to_document() {
        let host = MemoryHost::demo();
        let reply = host.run(TabId(101), &AccessorRequest::Read).await.unwrap();
        assert_eq!(
            reply,
            AccessorReply::Details(TabDetails::new(
                "Hacker News",
                Some("https://news.ycombinator.com/favicon.ico".into()),
                "icon"
            ))
        );
    }

    #[tokio::test]
    async fn test_forced_failure() {
        let host = MemoryHost::demo();
        host.fail_tab(
            TabId(102),
            InjectError::Script {
                tab: TabId(102),
                message: "boom".into(),
            },
        );
        assert!(host.run(TabId(102), &AccessorRequest::Read).await.is_err());
        assert!(host.run(TabId(103), &AccessorRequest::Read).await.is_ok());
    }
}
