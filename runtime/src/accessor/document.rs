//! In-memory model of the parts of a page the accessor touches.
//!
//! Mirrors the page-side scripts: the same link preference order, the same
//! blank icon, the same restore fallback.

use super::{
    icon_type_hint, AccessorReply, AccessorRequest, Profile, TabDetails, BLANK_FAVICON,
    BLANK_TITLE, DEFAULT_ICON_REL,
};
use serde::{Deserialize, Serialize};

/// Meta tags that carry an image hint, checked in document order.
const IMAGE_META_KEYS: &[&str] = &[
    "og:image",
    "twitter:image",
    "msapplication-TileImage",
    "image",
];

/// A `<link>` element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkElement {
    pub rel: String,
    pub href: String,
    #[serde(default)]
    pub type_hint: Option<String>,
}

impl LinkElement {
    pub fn new(rel: &str, href: &str) -> Self {
        Self {
            rel: rel.to_string(),
            href: href.to_string(),
            type_hint: None,
        }
    }

    pub fn is_icon(&self) -> bool {
        self.rel.trim().to_ascii_lowercase().contains("icon")
    }

    fn rel_is(&self, wanted: &str) -> bool {
        self.rel.trim().eq_ignore_ascii_case(wanted)
    }
}

/// A `<meta>` element reduced to its key (`name`, `property` or `itemprop`)
/// and `content`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaElement {
    pub key: String,
    pub content: String,
}

/// Live state of one tab's top-level document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageDocument {
    pub url: String,
    pub title: String,
    #[serde(default)]
    pub links: Vec<LinkElement>,
    #[serde(default)]
    pub metas: Vec<MetaElement>,
    /// Whether `<origin>/favicon.ico` answers with an image.
    #[serde(default)]
    pub serves_default_favicon: bool,
}

impl PageDocument {
    pub fn new(url: &str, title: &str) -> Self {
        Self {
            url: url.to_string(),
            title: title.to_string(),
            ..Default::default()
        }
    }

    pub fn with_link(mut self, rel: &str, href: &str) -> Self {
        self.links.push(LinkElement::new(rel, href));
        self
    }

    pub fn with_meta(mut self, key: &str, content: &str) -> Self {
        self.metas.push(MetaElement {
            key: key.to_string(),
            content: content.to_string(),
        });
        self
    }

    pub fn with_default_favicon(mut self) -> Self {
        self.serves_default_favicon = true;
        self
    }

    pub fn icon_links(&self) -> impl Iterator<Item = &LinkElement> {
        self.links.iter().filter(|l| l.is_icon())
    }

    /// Run one accessor request against this document.
    pub fn apply(&mut self, request: &AccessorRequest) -> AccessorReply {
        match request {
            AccessorRequest::Read => AccessorReply::Details(self.read_details()),
            AccessorRequest::BlankWrite => {
                self.blank();
                AccessorReply::Applied
            }
            AccessorRequest::SpecificWrite(profile) => {
                if self.apply_profile(profile) {
                    AccessorReply::Applied
                } else {
                    AccessorReply::Skipped("incomplete profile".to_string())
                }
            }
            AccessorRequest::Restore(details) => {
                self.restore(details);
                AccessorReply::Applied
            }
        }
    }

    pub fn read_details(&self) -> TabDetails {
        let candidates: Vec<&LinkElement> =
            self.icon_links().filter(|l| !l.href.is_empty()).collect();
        let link = candidates
            .iter()
            .find(|l| l.rel_is("icon"))
            .or_else(|| candidates.iter().find(|l| l.rel_is("shortcut icon")))
            .or_else(|| candidates.first());

        if let Some(link) = link {
            return TabDetails::new(
                self.title.clone(),
                Some(self.resolve(&link.href)),
                link.rel.trim(),
            );
        }

        if self.serves_default_favicon {
            if let Some(origin) = self.origin() {
                return TabDetails::new(
                    self.title.clone(),
                    Some(format!("{origin}/favicon.ico")),
                    DEFAULT_ICON_REL,
                );
            }
        }

        // first image meta in document order, even when its content is empty
        let hint = self
            .metas
            .iter()
            .find(|m| IMAGE_META_KEYS.contains(&m.key.as_str()))
            .filter(|m| !m.content.is_empty());
        if let Some(meta) = hint {
            return TabDetails::new(
                self.title.clone(),
                Some(self.resolve(&meta.content)),
                DEFAULT_ICON_REL,
            );
        }

        TabDetails::new(self.title.clone(), None, DEFAULT_ICON_REL)
    }

    pub fn blank(&mut self) {
        self.title = BLANK_TITLE.to_string();
        let mut touched = false;
        for link in self.links.iter_mut().filter(|l| l.is_icon()) {
            link.rel = DEFAULT_ICON_REL.to_string();
            link.href = BLANK_FAVICON.to_string();
            touched = true;
        }
        if !touched {
            self.links
                .push(LinkElement::new(DEFAULT_ICON_REL, BLANK_FAVICON));
        }
    }

    /// Returns false, leaving the page alone, for an incomplete profile.
    pub fn apply_profile(&mut self, profile: &Profile) -> bool {
        let Some((title, favicon)) = profile.parts() else {
            return false;
        };
        self.title = title.to_string();
        self.remove_icons();
        self.links.push(LinkElement {
            rel: DEFAULT_ICON_REL.to_string(),
            href: favicon.to_string(),
            type_hint: Some(icon_type_hint(favicon)),
        });
        true
    }

    pub fn restore(&mut self, details: &TabDetails) {
        self.title = details.title.clone();
        self.remove_icons();
        match details.favicon_href.as_deref().filter(|h| !h.is_empty()) {
            Some(href) => {
                let rel = if details.favicon_rel.is_empty() {
                    DEFAULT_ICON_REL
                } else {
                    details.favicon_rel.as_str()
                };
                self.links.push(LinkElement::new(rel, href));
            }
            None => self
                .links
                .push(LinkElement::new(DEFAULT_ICON_REL, BLANK_FAVICON)),
        }
    }

    fn remove_icons(&mut self) {
        self.links.retain(|l| !l.is_icon());
    }

    fn origin(&self) -> Option<String> {
        let url = url::Url::parse(&self.url).ok()?;
        let origin = url.origin();
        origin.is_tuple().then(|| origin.ascii_serialization())
    }

    /// Absolute form of `href`, as `link.href` reports it in a browser.
    fn resolve(&self, href: &str) -> String {
        url::Url::parse(&self.url)
            .and_then(|base| base.join(href))
            .map(|u| u.to_string())
            .unwrap_or_else(|_| href.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page() -> PageDocument {
        PageDocument::new("https://news.example/story/1", "Breaking story")
    }

    #[test]
    fn test_read_prefers_exact_icon_rel() {
        let doc = page()
            .with_link("apple-touch-icon", "/touch.png")
            .with_link("shortcut icon", "/legacy.ico")
            .with_link("icon", "/modern.svg");
        let details = doc.read_details();
        assert_eq!(details.title, "Breaking story");
        assert_eq!(
            details.favicon_href.as_deref(),
            Some("https://news.example/modern.svg")
        );
        assert_eq!(details.favicon_rel, "icon");
    }

    #[test]
    fn test_read_falls_back_to_shortcut_then_any_icon() {
        let doc = page()
            .with_link("apple-touch-icon", "/touch.png")
            .with_link("Shortcut Icon", "/legacy.ico");
        assert_eq!(doc.read_details().favicon_rel, "Shortcut Icon");

        let doc = page().with_link("apple-touch-icon", "/touch.png");
        let details = doc.read_details();
        assert_eq!(details.favicon_rel, "apple-touch-icon");
        assert_eq!(
            details.favicon_href.as_deref(),
            Some("https://news.example/touch.png")
        );
    }

    #[test]
    fn test_read_probes_default_favicon_before_meta() {
        let doc = page()
            .with_meta("og:image", "/cover.jpg")
            .with_default_favicon();
        assert_eq!(
            doc.read_details().favicon_href.as_deref(),
            Some("https://news.example/favicon.ico")
        );
    }

    #[test]
    fn test_read_uses_meta_image_hint() {
        let doc = page()
            .with_meta("description", "not an image")
            .with_meta("twitter:image", "https://cdn.example/card.png");
        let details = doc.read_details();
        assert_eq!(
            details.favicon_href.as_deref(),
            Some("https://cdn.example/card.png")
        );
        assert_eq!(details.favicon_rel, "icon");
    }

    #[test]
    fn test_read_without_any_icon() {
        let details = page().read_details();
        assert_eq!(details.favicon_href, None);
        assert_eq!(details.favicon_rel, "icon");
    }

    #[test]
    fn test_blank_rewrites_every_icon_link() {
        let mut doc = page()
            .with_link("stylesheet", "/site.css")
            .with_link("shortcut icon", "/a.ico")
            .with_link("apple-touch-icon", "/b.png");
        doc.blank();

        assert_eq!(doc.title, BLANK_TITLE);
        assert_eq!(doc.title.chars().count(), 1);
        let icons: Vec<_> = doc.icon_links().collect();
        assert_eq!(icons.len(), 2);
        assert!(icons
            .iter()
            .all(|l| l.href == BLANK_FAVICON && l.rel == "icon"));
        assert!(doc.links.iter().any(|l| l.rel == "stylesheet"));
    }

    #[test]
    fn test_blank_creates_icon_when_missing() {
        let mut doc = page();
        doc.blank();
        assert_eq!(doc.links, vec![LinkElement::new("icon", BLANK_FAVICON)]);
    }

    #[test]
    fn test_specific_write_replaces_icons() {
        let mut doc = page()
            .with_link("icon", "/a.ico")
            .with_link("shortcut icon", "/b.ico");
        let applied = doc.apply_profile(&Profile::new(
            "Inbox - Mail",
            "https://mail.example/favicon.png",
        ));
        assert!(applied);
        assert_eq!(doc.title, "Inbox - Mail");
        let icons: Vec<_> = doc.icon_links().collect();
        assert_eq!(icons.len(), 1);
        assert_eq!(icons[0].href, "https://mail.example/favicon.png");
        assert_eq!(icons[0].type_hint.as_deref(), Some("image/png"));
    }

    #[test]
    fn test_specific_write_with_incomplete_profile_is_untouched() {
        let mut doc = page().with_link("icon", "/a.ico");
        let before = doc.clone();
        let reply = doc.apply(&AccessorRequest::SpecificWrite(Profile {
            title: Some("Only a title".into()),
            favicon: None,
        }));
        assert!(matches!(reply, AccessorReply::Skipped(_)));
        assert_eq!(doc, before);
    }

    #[test]
    fn test_restore_reproduces_saved_link() {
        let mut doc = page().with_link("icon", "/original.ico");
        let saved = doc.read_details();
        doc.blank();
        doc.restore(&saved);

        assert_eq!(doc.title, "Breaking story");
        let icons: Vec<_> = doc.icon_links().collect();
        assert_eq!(icons.len(), 1);
        assert_eq!(icons[0].href, "https://news.example/original.ico");
        assert_eq!(icons[0].rel, "icon");
    }

    #[test]
    fn test_restore_without_saved_icon_installs_blank() {
        let mut doc = page().with_link("icon", "/disguise.ico");
        doc.restore(&TabDetails::new("Breaking story", None, "icon"));
        let icons: Vec<_> = doc.icon_links().collect();
        assert_eq!(icons.len(), 1);
        assert_eq!(icons[0].href, BLANK_FAVICON);
    }
}
