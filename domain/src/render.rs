//! Read-only renderer: turns a title and a link list into a markup
//! description the host can serialise.
//!
//! Every URL is classified again here. A rejected navigation URL degrades to an
//! inert placeholder entry instead of disappearing, so an editor can still see
//! and fix it; a rejected image icon falls back to [`DEFAULT_ICON`].

use serde::Serialize;

use crate::validate::classify_url;
use crate::{IconType, Link, LinkId, LinkList, DEFAULT_ICON};

/// Inert href used in place of a rejected URL.
pub const PLACEHOLDER_HREF: &str = "#";

pub const NEW_TAB_REL: &str = "noopener noreferrer";

pub const OPENS_IN_NEW_TAB_SUFFIX: &str = " (opens in new tab)";

pub const NO_LINKS_MESSAGE: &str =
    "No quick links configured. Please edit the web part to add links.";

/// Rendered panel: optional heading plus either links or the empty state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelView {
    pub title: Option<String>,
    pub body: PanelBody,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PanelBody {
    Empty(EmptyState),
    Links(Vec<LinkView>),
}

/// Notice shown instead of the list, announced as a live status region.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmptyState {
    pub message: &'static str,
    pub icon: &'static str,
    pub role: &'static str,
    pub aria_live: &'static str,
}

impl Default for EmptyState {
    fn default() -> Self {
        Self {
            message: NO_LINKS_MESSAGE,
            icon: DEFAULT_ICON,
            role: "status",
            aria_live: "polite",
        }
    }
}

/// Browsing context a link opens in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Target {
    #[serde(rename = "_blank")]
    Blank,
    #[serde(rename = "_self")]
    SameTab,
}

impl Target {
    pub fn as_attr(&self) -> &'static str {
        match self {
            Target::Blank => "_blank",
            Target::SameTab => "_self",
        }
    }
}

/// One navigable tile.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkView {
    pub id: LinkId,
    pub title: String,
    /// Classified URL, or [`PLACEHOLDER_HREF`] when rejected.
    pub href: String,
    /// False when the URL was rejected; the host must suppress activation.
    pub navigable: bool,
    pub target: Target,
    pub rel: Option<&'static str>,
    pub aria_label: String,
    pub icon: IconView,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum IconView {
    /// Named icon from the Fluent icon set.
    Fluent { name: String },
    /// Classified image URL. `fallback` is shown if the image fails to load.
    Image {
        src: String,
        alt: String,
        fallback: &'static str,
    },
}

/// Render the whole panel.
pub fn render_panel(title: &str, links: &LinkList) -> PanelView {
    let title = Some(title.trim())
        .filter(|t| !t.is_empty())
        .map(str::to_string);
    let body = if links.is_empty() {
        PanelBody::Empty(EmptyState::default())
    } else {
        PanelBody::Links(links.iter().map(render_link).collect())
    };
    PanelView { title, body }
}

/// Render a single link, substituting the placeholder for a rejected URL.
pub fn render_link(link: &Link) -> LinkView {
    let icon = icon_view(link);
    match classify_url(&link.url) {
        Ok(href) => {
            let (target, rel, aria_label) = if link.open_in_new_tab {
                (
                    Target::Blank,
                    Some(NEW_TAB_REL),
                    format!("{}{}", link.title, OPENS_IN_NEW_TAB_SUFFIX),
                )
            } else {
                (Target::SameTab, None, link.title.clone())
            };
            LinkView {
                id: link.id.clone(),
                title: link.title.clone(),
                href: href.to_string(),
                navigable: true,
                target,
                rel,
                aria_label,
                icon,
            }
        }
        Err(_) => LinkView {
            id: link.id.clone(),
            title: link.title.clone(),
            href: PLACEHOLDER_HREF.to_string(),
            navigable: false,
            target: Target::SameTab,
            rel: None,
            aria_label: link.title.clone(),
            icon,
        },
    }
}

/// Icon for a link. Custom icons must pass the classifier to become an image.
pub fn icon_view(link: &Link) -> IconView {
    match link.icon_type {
        IconType::Custom => match classify_url(&link.icon) {
            Ok(src) => IconView::Image {
                src: src.to_string(),
                alt: link.title.clone(),
                fallback: DEFAULT_ICON,
            },
            Err(_) => fluent(DEFAULT_ICON),
        },
        IconType::Fluent => {
            let name = link.icon.trim();
            fluent(if name.is_empty() { DEFAULT_ICON } else { name })
        }
    }
}

fn fluent(name: &str) -> IconView {
    IconView::Fluent {
        name: name.to_string(),
    }
}
