//! Tab identity and the eligibility predicate.
//!
//! Only tabs with a valid identifier showing an `http` or `https` page are
//! ever read, disguised, or restored. Internal browser pages (settings,
//! new-tab, extension pages) refuse script injection anyway.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Browser-assigned tab identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TabId(pub i64);

impl TabId {
    /// Negative ids are the browser's "no tab" sentinel.
    pub fn is_valid(self) -> bool {
        self.0 >= 0
    }
}

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A snapshot key that does not name a usable tab.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseTabIdError {
    #[error("'{0}' is not a numeric tab id")]
    NotNumeric(String),
    #[error("{0} is not a valid tab id")]
    Invalid(i64),
}

impl FromStr for TabId {
    type Err = ParseTabIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw: i64 = s
            .trim()
            .parse()
            .map_err(|_| ParseTabIdError::NotNumeric(s.to_string()))?;
        let id = TabId(raw);
        if id.is_valid() {
            Ok(id)
        } else {
            Err(ParseTabIdError::Invalid(raw))
        }
    }
}

/// An open tab as reported by tab enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabInfo {
    pub id: Option<TabId>,
    pub url: String,
    #[serde(default)]
    pub title: String,
}

impl TabInfo {
    /// The tab's id, if it is one we are allowed to touch.
    pub fn eligible_id(&self) -> Option<TabId> {
        let id = self.id.filter(|id| id.is_valid())?;
        is_web_url(&self.url).then_some(id)
    }

    pub fn is_eligible(&self) -> bool {
        self.eligible_id().is_some()
    }
}

/// True for absolute `http` / `https` URLs.
pub fn is_web_url(raw: &str) -> bool {
    url::Url::parse(raw)
        .map(|u| matches!(u.scheme(), "http" | "https"))
        .unwrap_or(false)
}

/// Ids of every eligible tab, in enumeration order.
pub fn eligible_ids(tabs: &[TabInfo]) -> Vec<TabId> {
    tabs.iter().filter_map(TabInfo::eligible_id).collect()
}
