//! The browser as seen from the engine: a list of tabs and a way to run
//! accessor requests inside one of them.

pub mod cdp;
pub mod memory;

use crate::accessor::{AccessorReply, AccessorRequest};
use crate::tabs::{TabId, TabInfo};
use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

pub use cdp::CdpHost;
pub use memory::MemoryHost;

/// Why a request could not be carried out in a tab.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InjectError {
    /// The tab was closed (or never existed).
    #[error("no tab with id {0}")]
    TabNotFound(TabId),
    /// The browser refuses scripts on this page.
    #[error("tab {tab} cannot be scripted: {reason}")]
    Restricted { tab: TabId, reason: String },
    /// The page-side function threw.
    #[error("script failed in tab {tab}: {message}")]
    Script { tab: TabId, message: String },
    #[error("tab {0} did not answer within {1:?}")]
    Timeout(TabId, Duration),
    #[error("browser connection: {0}")]
    Transport(String),
    #[error("unexpected reply from {mode} script: {detail}")]
    BadReply { mode: &'static str, detail: String },
}

impl InjectError {
    /// Closed tabs are routine during restore and logged more quietly.
    pub fn is_tab_gone(&self) -> bool {
        matches!(self, Self::TabNotFound(_))
    }
}

/// Tab enumeration plus per-tab script injection.
///
/// `run` executes in the tab's top-level frame only.
#[async_trait]
pub trait TabHost: Send + Sync {
    /// Every open tab, eligible or not.
    async fn query_tabs(&self) -> Result<Vec<TabInfo>>;

    /// Carry out one accessor request inside `tab`.
    async fn run(&self, tab: TabId, request: &AccessorRequest)
        -> Result<AccessorReply, InjectError>;
}
