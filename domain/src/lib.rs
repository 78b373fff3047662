//! Domain library for the Quick Links web part.
//!
//! This crate depends on `serde` only and holds the link types, ports (traits),
//! error definitions, the URL safety classifier and the two components built
//! on it: the editing form controller and the read-only renderer. Keep
//! adapters and IO concerns out of this crate.

use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::id::IdAllocator;
use crate::validate::UrlRejection;

/// Icon identifier used whenever a link has no usable icon of its own.
pub const DEFAULT_ICON: &str = "Link";

/// Stable synthetic identity of a list entry. Assigned at creation (or at
/// load time for entries persisted without one) and never reused for another
/// entry of the same list.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct LinkId(String);

impl LinkId {
    pub fn new<S: Into<String>>(s: S) -> Result<Self, CoreError> {
        let val = s.into();
        if val.is_empty() {
            return Err(CoreError::InvalidLinkId("empty".into()));
        }
        if !val
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(CoreError::InvalidLinkId("invalid characters".into()));
        }
        Ok(Self(val))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for LinkId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// How the `icon` field of a link is interpreted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IconType {
    /// `icon` names an icon from the Fluent icon set.
    #[default]
    Fluent,
    /// `icon` is an image URL and goes through the URL classifier.
    Custom,
}

impl IconType {
    pub fn as_str(&self) -> &'static str {
        match self {
            IconType::Fluent => "fluent",
            IconType::Custom => "custom",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "fluent" => Some(IconType::Fluent),
            "custom" => Some(IconType::Custom),
            _ => None,
        }
    }

    /// Value the icon field takes when switching to this type or when it is
    /// cleared.
    pub fn default_icon(&self) -> &'static str {
        match self {
            IconType::Fluent => DEFAULT_ICON,
            IconType::Custom => "",
        }
    }
}

/// A committed quick link tile.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Link {
    pub id: LinkId,
    pub title: String,
    /// Stored trimmed. Values that bypassed the editor may still be unsafe,
    /// which is why the renderer classifies again.
    pub url: String,
    pub icon: String,
    pub icon_type: IconType,
    pub open_in_new_tab: bool,
}

/// Persisted shape of a link as the property store hands it over.
///
/// Older entries predate `id` and `iconType`; both are filled in exactly once,
/// by [`LinkList::from_stored`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredLink {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_type: Option<IconType>,
    #[serde(default)]
    pub open_in_new_tab: bool,
}

impl From<&Link> for StoredLink {
    fn from(link: &Link) -> Self {
        Self {
            id: Some(link.id.as_str().to_string()),
            title: link.title.clone(),
            url: link.url.clone(),
            icon: link.icon.clone(),
            icon_type: Some(link.icon_type),
            open_in_new_tab: link.open_in_new_tab,
        }
    }
}

/// Ordered list of links. Order is insertion order; entries are addressed by
/// [`LinkId`], never by position.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct LinkList(Vec<Link>);

impl LinkList {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Bring persisted entries into the domain: a missing `iconType` becomes
    /// [`IconType::Fluent`], a missing, malformed or duplicate id is replaced
    /// with a freshly allocated one. Order is preserved.
    pub fn from_stored<G: IdGenerator>(
        stored: Vec<StoredLink>,
        ids: &mut IdAllocator<G>,
    ) -> Result<Self, CoreError> {
        // First pass: keep the first occurrence of every well-formed id so
        // that fresh ids never collide with a later persisted one.
        let mut taken: HashSet<LinkId> = HashSet::new();
        let kept: Vec<Option<LinkId>> = stored
            .iter()
            .map(|s| {
                s.id
                    .as_deref()
                    .and_then(|raw| LinkId::new(raw).ok())
                    .filter(|id| taken.insert(id.clone()))
            })
            .collect();

        let mut links = Vec::with_capacity(stored.len());
        for (entry, id) in stored.into_iter().zip(kept) {
            let id = match id {
                Some(id) => id,
                None => {
                    let fresh = ids.allocate(taken.len(), |c| taken.contains(c))?;
                    taken.insert(fresh.clone());
                    fresh
                }
            };
            links.push(Link {
                id,
                title: entry.title,
                url: entry.url,
                icon: entry.icon,
                icon_type: entry.icon_type.unwrap_or_default(),
                open_in_new_tab: entry.open_in_new_tab,
            });
        }
        Ok(Self(links))
    }

    /// Persisted form of the whole list, ids and icon types always written.
    pub fn to_stored(&self) -> Vec<StoredLink> {
        self.0.iter().map(StoredLink::from).collect()
    }

    pub fn as_slice(&self) -> &[Link] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Link> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, id: &LinkId) -> Option<&Link> {
        self.0.iter().find(|l| &l.id == id)
    }

    pub fn position(&self, id: &LinkId) -> Option<usize> {
        self.0.iter().position(|l| &l.id == id)
    }

    pub fn contains(&self, id: &LinkId) -> bool {
        self.position(id).is_some()
    }

    pub(crate) fn push(&mut self, link: Link) {
        self.0.push(link);
    }

    /// Replace the entry carrying `link.id`, keeping its position.
    pub(crate) fn replace(&mut self, link: Link) -> Result<(), CoreError> {
        let pos = self.position(&link.id).ok_or(CoreError::NotFound)?;
        self.0[pos] = link;
        Ok(())
    }

    pub(crate) fn remove(&mut self, id: &LinkId) -> Result<Link, CoreError> {
        let pos = self.position(id).ok_or(CoreError::NotFound)?;
        Ok(self.0.remove(pos))
    }
}

impl<'a> IntoIterator for &'a LinkList {
    type Item = &'a Link;
    type IntoIter = std::slice::Iter<'a, Link>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// The whole property bag of the web part as the store keeps it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebPartProperties {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub links: Vec<StoredLink>,
}

/// Which required draft field is missing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingField {
    Title,
    Url,
}

impl MissingField {
    pub fn as_str(&self) -> &'static str {
        match self {
            MissingField::Title => "title",
            MissingField::Url => "url",
        }
    }
}

/// Id generator interface; deterministic by sequence number.
pub trait IdGenerator: Send {
    fn id_for(&self, seq: u64) -> LinkId;
}

/// Receives the complete list after every committed add, update or delete.
/// Each call is a full snapshot, not a delta.
pub trait LinksObserver {
    fn links_changed(&mut self, links: &LinkList);
}

impl<F> LinksObserver for F
where
    F: FnMut(&LinkList),
{
    fn links_changed(&mut self, links: &LinkList) {
        self(links)
    }
}

/// Property store port: the external owner of persisted web part state.
pub trait PropertyStore: Send + Sync {
    fn load(&self) -> Result<WebPartProperties, CoreError>;
    /// Replace the persisted list with this snapshot.
    fn save_links(&self, links: &LinkList) -> Result<(), CoreError>;
    fn save_title(&self, title: &str) -> Result<(), CoreError>;
}

/// Core domain errors (no external error crates to keep deps minimal).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CoreError {
    /// The classifier rejected the draft URL.
    InvalidUrl(UrlRejection),
    /// A required draft field is empty.
    IncompleteDraft(MissingField),
    InvalidLinkId(String),
    NotFound,
    Repository(String),
}

impl Display for CoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CoreError::InvalidUrl(reason) => write!(f, "invalid url: {}", reason),
            CoreError::IncompleteDraft(field) => {
                write!(f, "incomplete draft: {} is required", field.as_str())
            }
            CoreError::InvalidLinkId(msg) => write!(f, "invalid link id: {}", msg),
            CoreError::NotFound => write!(f, "not found"),
            CoreError::Repository(msg) => write!(f, "repository error: {}", msg),
        }
    }
}

impl Error for CoreError {}

/// Return a short about/version line for the binary to print.
pub fn about() -> String {
    let pkg = env!("CARGO_PKG_NAME");
    let ver = env!("CARGO_PKG_VERSION");
    format!("{} v{} - quick links domain library", pkg, ver)
}

pub mod adapters;
pub mod form;
pub mod id;
pub mod render;
pub mod validate;
