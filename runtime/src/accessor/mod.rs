//! Per-tab detail accessor.
//!
//! Reading or rewriting a tab's title and favicon happens inside the tab's
//! own page, on the far side of the injection boundary. The engine never
//! touches a document directly: it sends an [`AccessorRequest`] to a tab and
//! gets back an [`AccessorReply`] or a tagged [`InjectError`].
//!
//! Two renditions of the accessor exist. [`AccessorRequest::to_script`]
//! builds the JavaScript evaluated in a real page over CDP, and
//! [`document::PageDocument::apply`] gives the same semantics to the
//! in-memory document model.

pub mod document;

use crate::host::InjectError;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Zero-width space. Empty titles are ignored by most tab strips, so a
/// "blank" tab still needs one character.
pub const BLANK_TITLE: &str = "\u{200B}";

/// 1x1 transparent GIF.
pub const BLANK_FAVICON: &str =
    "data:image/gif;base64,R0lGODlhAQABAIAAAAAAAP///yH5BAEAAAAALAAAAAABAAEAAAIBRAA7";

pub const DEFAULT_ICON_REL: &str = "icon";

/// How long the read script waits on `<origin>/favicon.ico`.
pub const FAVICON_PROBE_TIMEOUT_MS: u64 = 1500;

const PRELUDE_JS: &str = include_str!("scripts/prelude.js");
const READ_JS: &str = include_str!("scripts/read.js");
const BLANK_JS: &str = include_str!("scripts/blank.js");
const SPECIFIC_JS: &str = include_str!("scripts/specific.js");
const RESTORE_JS: &str = include_str!("scripts/restore.js");

fn default_icon_rel() -> String {
    DEFAULT_ICON_REL.to_string()
}

/// A tab's original presentation state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabDetails {
    pub title: String,
    #[serde(default)]
    pub favicon_href: Option<String>,
    #[serde(default = "default_icon_rel")]
    pub favicon_rel: String,
}

impl TabDetails {
    pub fn new(title: impl Into<String>, favicon_href: Option<String>, favicon_rel: &str) -> Self {
        Self {
            title: title.into(),
            favicon_href,
            favicon_rel: favicon_rel.to_string(),
        }
    }
}

/// A disguise profile: the title and favicon a tab pretends to have.
///
/// Both fields are optional on the wire; a profile missing either one is
/// refused by the accessor without touching the page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub favicon: Option<String>,
}

impl Profile {
    pub fn new(title: &str, favicon: &str) -> Self {
        Self {
            title: Some(title.to_string()),
            favicon: Some(favicon.to_string()),
        }
    }

    /// `(title, favicon)` when both are present and non-empty.
    pub fn parts(&self) -> Option<(&str, &str)> {
        let title = self.title.as_deref().filter(|t| !t.is_empty())?;
        let favicon = self.favicon.as_deref().filter(|f| !f.is_empty())?;
        Some((title, favicon))
    }
}

/// One call across the injection boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessorRequest {
    Read,
    BlankWrite,
    SpecificWrite(Profile),
    Restore(TabDetails),
}

/// What came back from a tab.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessorReply {
    Details(TabDetails),
    Applied,
    /// The page was left untouched (e.g. an incomplete profile).
    Skipped(String),
}

impl AccessorRequest {
    pub fn mode(&self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::BlankWrite => "blank",
            Self::SpecificWrite(_) => "specific",
            Self::Restore(_) => "restore",
        }
    }

    /// The JSON argument handed to the page-side function.
    pub fn input(&self) -> Value {
        let mut input = json!({
            "blankTitle": BLANK_TITLE,
            "blankIcon": BLANK_FAVICON,
            "defaultRel": DEFAULT_ICON_REL,
        });
        match self {
            Self::Read => {
                input["probeTimeoutMs"] = json!(FAVICON_PROBE_TIMEOUT_MS);
            }
            Self::BlankWrite => {}
            Self::SpecificWrite(profile) => {
                input["title"] = json!(profile.title);
                input["favicon"] = json!(profile.favicon);
                input["type"] = json!(profile.favicon.as_deref().map(icon_type_hint));
            }
            Self::Restore(details) => {
                input["details"] = json!(details);
            }
        }
        input
    }

    /// Self-contained expression evaluated in the tab's top-level frame.
    ///
    /// The result is a value (or a promise of one) shaped like the reply
    /// [`AccessorReply::from_value`] expects.
    pub fn to_script(&self) -> String {
        let body = match self {
            Self::Read => READ_JS,
            Self::BlankWrite => BLANK_JS,
            Self::SpecificWrite(_) => SPECIFIC_JS,
            Self::Restore(_) => RESTORE_JS,
        };
        format!(
            "(() => {{\n{PRELUDE_JS}\nreturn ({})({});\n}})()",
            body.trim().trim_end_matches(';'),
            self.input()
        )
    }
}

impl AccessorReply {
    /// Decode the page-side return value for `request`.
    pub fn from_value(request: &AccessorRequest, value: Value) -> Result<Self, InjectError> {
        let bad = |detail: String| InjectError::BadReply {
            mode: request.mode(),
            detail,
        };
        match request {
            AccessorRequest::Read => serde_json::from_value::<TabDetails>(value)
                .map(Self::Details)
                .map_err(|e| bad(e.to_string())),
            _ => {
                let applied = value
                    .get("applied")
                    .and_then(Value::as_bool)
                    .ok_or_else(|| bad(format!("missing 'applied' in {value}")))?;
                if applied {
                    Ok(Self::Applied)
                } else {
                    let reason = value
                        .get("reason")
                        .and_then(Value::as_str)
                        .unwrap_or("declined")
                        .to_string();
                    Ok(Self::Skipped(reason))
                }
            }
        }
    }
}

/// MIME type hint for an icon URL, from a data URI's media type or the
/// path's extension.
pub fn icon_type_hint(href: &str) -> String {
    if let Some(rest) = href.strip_prefix("data:") {
        let mime = rest.split([';', ',']).next().unwrap_or("");
        if !mime.is_empty() {
            return mime.to_ascii_lowercase();
        }
        return "image/x-icon".to_string();
    }

    let path = href.split(['?', '#']).next().unwrap_or(href);
    let ext = path
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "svg" => "image/svg+xml",
        "gif" => "image/gif",
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        _ => "image/x-icon",
    }
    .to_string()
}
