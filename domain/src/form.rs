//! Editing form controller.
//!
//! Owns the editor's copy of the link list, the draft being composed or
//! edited and the live URL error. Every committed add, update or delete hands
//! the full list to the [`LinksObserver`].
//!
//! Entries are addressed by [`LinkId`]. Deleting the entry that is being
//! edited cancels the edit session; deleting any other entry leaves the
//! session on its own id.

use serde::Serialize;

use crate::id::IdAllocator;
use crate::render::{icon_view, IconView};
use crate::validate::{classify_url, UrlRejection};
use crate::{
    CoreError, IconType, IdGenerator, Link, LinkId, LinkList, LinksObserver, MissingField,
    StoredLink,
};

/// Which entry, if any, the draft will overwrite on submit.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "mode", content = "id")]
pub enum EditMode {
    /// Submitting appends a new entry.
    #[default]
    Compose,
    /// Submitting replaces the entry with this id.
    Edit(LinkId),
}

impl EditMode {
    pub fn is_editing(&self, id: &LinkId) -> bool {
        matches!(self, EditMode::Edit(current) if current == id)
    }
}

/// In-progress link values.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Draft {
    pub title: String,
    pub url: String,
    pub icon: String,
    pub icon_type: IconType,
    pub open_in_new_tab: bool,
}

impl Default for Draft {
    fn default() -> Self {
        Self {
            title: String::new(),
            url: String::new(),
            icon: IconType::Fluent.default_icon().to_string(),
            icon_type: IconType::Fluent,
            open_in_new_tab: true,
        }
    }
}

impl Draft {
    fn from_link(link: &Link) -> Self {
        Self {
            title: link.title.clone(),
            url: link.url.clone(),
            icon: link.icon.clone(),
            icon_type: link.icon_type,
            open_in_new_tab: link.open_in_new_tab,
        }
    }

    /// Check the draft for submit. Returns the trimmed URL to store.
    pub fn validate(&self) -> Result<&str, CoreError> {
        let url = match classify_url(&self.url) {
            Ok(url) => Some(url),
            Err(UrlRejection::Absent) => None,
            Err(rejection) => return Err(CoreError::InvalidUrl(rejection)),
        };
        if self.title.trim().is_empty() {
            return Err(CoreError::IncompleteDraft(MissingField::Title));
        }
        url.ok_or(CoreError::IncompleteDraft(MissingField::Url))
    }

    fn to_link(&self, id: LinkId, url: String) -> Link {
        Link {
            id,
            title: self.title.clone(),
            url,
            icon: self.icon.clone(),
            icon_type: self.icon_type,
            open_in_new_tab: self.open_in_new_tab,
        }
    }
}

/// Row of the editor's "current links" list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntrySummary {
    pub id: LinkId,
    pub title: String,
    pub url: String,
    pub icon: IconView,
    pub target_label: &'static str,
    pub custom_icon: bool,
}

impl EntrySummary {
    fn of(link: &Link) -> Self {
        Self {
            id: link.id.clone(),
            title: link.title.clone(),
            url: link.url.clone(),
            icon: icon_view(link),
            target_label: if link.open_in_new_tab {
                "Opens in new tab"
            } else {
                "Opens in same tab"
            },
            custom_icon: link.icon_type == IconType::Custom,
        }
    }
}

/// The editing form controller.
pub struct LinkEditor<G: IdGenerator, O: LinksObserver> {
    links: LinkList,
    ids: IdAllocator<G>,
    observer: O,
    mode: EditMode,
    draft: Draft,
    url_error: Option<UrlRejection>,
}

impl<G: IdGenerator, O: LinksObserver> LinkEditor<G, O> {
    /// Mount the editor on a persisted list. Starts in compose mode with an
    /// empty draft.
    pub fn new(stored: Vec<StoredLink>, generator: G, observer: O) -> Result<Self, CoreError> {
        let mut ids = IdAllocator::new(generator);
        let links = LinkList::from_stored(stored, &mut ids)?;
        Ok(Self {
            links,
            ids,
            observer,
            mode: EditMode::Compose,
            draft: Draft::default(),
            url_error: None,
        })
    }

    pub fn links(&self) -> &LinkList {
        &self.links
    }

    pub fn mode(&self) -> &EditMode {
        &self.mode
    }

    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    pub fn observer_mut(&mut self) -> &mut O {
        &mut self.observer
    }

    /// Live URL error. Never [`UrlRejection::Absent`]; absence is reported
    /// through [`LinkEditor::missing_fields`].
    pub fn url_error(&self) -> Option<UrlRejection> {
        self.url_error
    }

    /// Required fields currently empty.
    pub fn missing_fields(&self) -> Vec<MissingField> {
        let mut missing = Vec::new();
        if self.draft.title.trim().is_empty() {
            missing.push(MissingField::Title);
        }
        if self.draft.url.trim().is_empty() {
            missing.push(MissingField::Url);
        }
        missing
    }

    /// Advisory verdict on a custom image URL. Does not gate submit; the
    /// renderer falls back to the default icon for rejected values.
    pub fn icon_warning(&self) -> Option<UrlRejection> {
        match self.draft.icon_type {
            IconType::Custom => classify_url(&self.draft.icon)
                .err()
                .filter(|r| !r.is_absent()),
            IconType::Fluent => None,
        }
    }

    /// Whether the add/update action is enabled.
    pub fn can_submit(&self) -> bool {
        self.draft.validate().is_ok()
    }

    /// Summaries of the current entries, in list order.
    pub fn entries(&self) -> Vec<EntrySummary> {
        self.links.iter().map(EntrySummary::of).collect()
    }

    pub fn set_title(&mut self, title: &str) {
        self.draft.title = title.to_string();
    }

    /// Store the trimmed value and re-run the classifier.
    pub fn set_url(&mut self, url: &str) {
        let url = url.trim();
        self.draft.url = url.to_string();
        self.url_error = live_error(url);
    }

    /// Switching type resets the icon to the new type's default. Setting the
    /// current type again keeps the icon.
    pub fn set_icon_type(&mut self, icon_type: IconType) {
        if icon_type == self.draft.icon_type {
            return;
        }
        self.draft.icon_type = icon_type;
        self.draft.icon = icon_type.default_icon().to_string();
    }

    /// An empty value falls back to the current type's default.
    pub fn set_icon(&mut self, icon: &str) {
        self.draft.icon = if icon.is_empty() {
            self.draft.icon_type.default_icon().to_string()
        } else {
            icon.to_string()
        };
    }

    pub fn set_open_in_new_tab(&mut self, open_in_new_tab: bool) {
        self.draft.open_in_new_tab = open_in_new_tab;
    }

    /// Enter edit mode on `id`. Any stale error is discarded; the live error
    /// reflects the populated URL.
    pub fn start_edit(&mut self, id: &LinkId) -> Result<(), CoreError> {
        let link = self.links.get(id).ok_or(CoreError::NotFound)?;
        self.draft = Draft::from_link(link);
        self.url_error = live_error(&self.draft.url);
        self.mode = EditMode::Edit(id.clone());
        Ok(())
    }

    pub fn cancel_edit(&mut self) {
        self.reset_draft();
    }

    /// Commit the draft: append in compose mode, replace in edit mode.
    /// Returns the id of the committed entry. Nothing is changed or
    /// notified when the draft is invalid.
    pub fn submit(&mut self) -> Result<LinkId, CoreError> {
        let url = match self.draft.validate() {
            Ok(url) => url.to_string(),
            Err(err) => {
                if let CoreError::InvalidUrl(rejection) = &err {
                    self.url_error = Some(*rejection);
                }
                return Err(err);
            }
        };

        let id = match self.mode.clone() {
            EditMode::Compose => {
                let links = &self.links;
                let id = self.ids.allocate(links.len(), |c| links.contains(c))?;
                self.links.push(self.draft.to_link(id.clone(), url));
                id
            }
            EditMode::Edit(id) => {
                if let Err(err) = self.links.replace(self.draft.to_link(id.clone(), url)) {
                    // The entry went away underneath the session.
                    self.reset_draft();
                    return Err(err);
                }
                id
            }
        };

        self.reset_draft();
        self.observer.links_changed(&self.links);
        Ok(id)
    }

    /// Remove an entry. Not gated by draft validity.
    pub fn delete(&mut self, id: &LinkId) -> Result<Link, CoreError> {
        let removed = self.links.remove(id)?;
        if self.mode.is_editing(id) {
            self.reset_draft();
        }
        self.observer.links_changed(&self.links);
        Ok(removed)
    }

    /// Take a fresh snapshot from the store. An edit session whose entry is
    /// gone is cancelled. Does not notify.
    pub fn reload(&mut self, stored: Vec<StoredLink>) -> Result<(), CoreError> {
        self.links = LinkList::from_stored(stored, &mut self.ids)?;
        if let EditMode::Edit(id) = &self.mode {
            if !self.links.contains(id) {
                self.reset_draft();
            }
        }
        Ok(())
    }

    fn reset_draft(&mut self) {
        self.mode = EditMode::Compose;
        self.draft = Draft::default();
        self.url_error = None;
    }
}

fn live_error(url: &str) -> Option<UrlRejection> {
    classify_url(url).err().filter(|r| !r.is_absent())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::Base62IdGenerator;

    /// Records every notification.
    #[derive(Default)]
    struct Recorder {
        calls: Vec<Vec<Link>>,
    }

    impl LinksObserver for Recorder {
        fn links_changed(&mut self, links: &LinkList) {
            self.calls.push(links.as_slice().to_vec());
        }
    }

    type Editor = LinkEditor<Base62IdGenerator, Recorder>;

    fn editor(stored: Vec<StoredLink>) -> Editor {
        LinkEditor::new(stored, Base62IdGenerator::new(1), Recorder::default()).unwrap()
    }

    fn stored(id: &str, title: &str, url: &str) -> StoredLink {
        StoredLink {
            id: Some(id.to_string()),
            title: title.to_string(),
            url: url.to_string(),
            icon: "Link".to_string(),
            icon_type: None,
            open_in_new_tab: true,
        }
    }

    fn three() -> Vec<StoredLink> {
        vec![
            stored("a", "First", "https://one.example"),
            stored("b", "Second", "https://two.example"),
            stored("c", "Third", "https://three.example"),
        ]
    }

    fn id(s: &str) -> LinkId {
        LinkId::new(s).unwrap()
    }

    #[test]
    fn mounts_in_compose_mode_with_default_draft() {
        let ed = editor(vec![]);
        assert_eq!(ed.mode(), &EditMode::Compose);
        assert_eq!(ed.draft(), &Draft::default());
        assert_eq!(ed.draft().icon, "Link");
        assert!(ed.draft().open_in_new_tab);
        assert!(!ed.can_submit());
        assert_eq!(ed.url_error(), None);
    }

    #[test]
    fn submit_appends_and_notifies_once() {
        let mut ed = editor(vec![]);
        ed.set_title("Google");
        ed.set_url("https://www.google.com");
        assert!(ed.can_submit());
        ed.submit().unwrap();

        assert_eq!(ed.observer().calls.len(), 1);
        let committed = &ed.observer().calls[0];
        assert_eq!(committed.len(), 1);
        assert_eq!(committed[0].title, "Google");
        assert_eq!(committed[0].url, "https://www.google.com");
        assert_eq!(committed[0].icon_type, IconType::Fluent);
        assert_eq!(committed[0].icon, "Link");
        assert!(committed[0].open_in_new_tab);
        assert_eq!(ed.draft(), &Draft::default());
    }

    #[test]
    fn dangerous_url_is_flagged_live_and_blocks_submit() {
        let mut ed = editor(vec![]);
        ed.set_title("X");
        ed.set_url("javascript:alert(1)");
        assert_eq!(ed.url_error(), Some(UrlRejection::DangerousScheme));
        assert!(!ed.can_submit());

        let err = ed.submit().unwrap_err();
        assert_eq!(err, CoreError::InvalidUrl(UrlRejection::DangerousScheme));
        assert!(ed.links().is_empty());
        assert!(ed.observer().calls.is_empty());
        assert_eq!(ed.draft().url, "javascript:alert(1)");
    }

    #[test]
    fn correcting_the_url_clears_the_error() {
        let mut ed = editor(vec![]);
        ed.set_url("www.google.com");
        assert_eq!(ed.url_error(), Some(UrlRejection::InvalidFormat));
        ed.set_url("https://www.google.com");
        assert_eq!(ed.url_error(), None);
    }

    #[test]
    fn empty_url_is_missing_not_invalid() {
        let mut ed = editor(vec![]);
        ed.set_title("T");
        ed.set_url("   ");
        assert_eq!(ed.url_error(), None);
        assert_eq!(ed.missing_fields(), vec![MissingField::Url]);
        assert_eq!(
            ed.submit().unwrap_err(),
            CoreError::IncompleteDraft(MissingField::Url)
        );
    }

    #[test]
    fn missing_title_blocks_submit() {
        let mut ed = editor(vec![]);
        ed.set_url("/sites/MySite");
        assert_eq!(ed.missing_fields(), vec![MissingField::Title]);
        assert_eq!(
            ed.submit().unwrap_err(),
            CoreError::IncompleteDraft(MissingField::Title)
        );
        assert!(ed.observer().calls.is_empty());
    }

    #[test]
    fn url_is_stored_trimmed() {
        let mut ed = editor(vec![]);
        ed.set_title("Test");
        ed.set_url("  https://example.com  ");
        assert_eq!(ed.draft().url, "https://example.com");
        ed.submit().unwrap();
        assert_eq!(ed.links().as_slice()[0].url, "https://example.com");
    }

    #[test]
    fn edit_then_cancel_leaves_list_untouched() {
        let mut ed = editor(three());
        let before = ed.links().clone();
        let second = ed.links().as_slice()[1].id.clone();
        ed.start_edit(&second).unwrap();
        assert_eq!(ed.mode(), &EditMode::Edit(second.clone()));
        assert_eq!(ed.draft().title, "Second");

        ed.cancel_edit();
        assert_eq!(ed.mode(), &EditMode::Compose);
        assert_eq!(ed.draft(), &Draft::default());
        assert_eq!(ed.links(), &before);
        assert!(ed.observer().calls.is_empty());
    }

    #[test]
    fn start_edit_discards_stale_error() {
        let mut ed = editor(three());
        ed.set_url("invalid.com");
        assert!(ed.url_error().is_some());
        ed.start_edit(&id("a")).unwrap();
        assert_eq!(ed.url_error(), None);
        assert_eq!(ed.draft().url, "https://one.example");
    }

    #[test]
    fn update_replaces_in_place_and_keeps_id() {
        let mut ed = editor(three());
        ed.start_edit(&id("b")).unwrap();
        ed.set_url("  https://updated.example  ");
        let committed = ed.submit().unwrap();
        assert_eq!(committed, id("b"));

        let titles: Vec<&str> = ed.links().iter().map(|l| l.title.as_str()).collect();
        assert_eq!(titles, vec!["First", "Second", "Third"]);
        assert_eq!(ed.links().as_slice()[1].url, "https://updated.example");
        assert_eq!(ed.mode(), &EditMode::Compose);
        assert_eq!(ed.observer().calls.len(), 1);
        assert_eq!(ed.observer().calls[0].len(), 3);
    }

    #[test]
    fn invalid_update_keeps_edit_mode() {
        let mut ed = editor(three());
        ed.start_edit(&id("a")).unwrap();
        ed.set_url("invalid-url.com");
        assert!(!ed.can_submit());
        assert!(ed.submit().is_err());
        assert_eq!(ed.mode(), &EditMode::Edit(id("a")));
        assert_eq!(ed.links().as_slice()[0].url, "https://one.example");
    }

    #[test]
    fn editing_a_bad_stored_url_surfaces_the_error() {
        let mut ed = editor(vec![stored("x", "Legacy", "javascript:void(0)")]);
        ed.start_edit(&id("x")).unwrap();
        assert_eq!(ed.url_error(), Some(UrlRejection::DangerousScheme));
        assert!(!ed.can_submit());
    }

    #[test]
    fn delete_notifies_without_validation() {
        let mut ed = editor(three());
        ed.set_url("javascript:bad");
        let removed = ed.delete(&id("a")).unwrap();
        assert_eq!(removed.title, "First");
        assert_eq!(ed.links().len(), 2);
        assert_eq!(ed.observer().calls.len(), 1);
        assert_eq!(ed.observer().calls[0].len(), 2);
    }

    #[test]
    fn deleting_the_edited_entry_cancels_the_session() {
        let mut ed = editor(three());
        ed.start_edit(&id("b")).unwrap();
        ed.set_title("Changed");
        ed.delete(&id("b")).unwrap();
        assert_eq!(ed.mode(), &EditMode::Compose);
        assert_eq!(ed.draft(), &Draft::default());
    }

    #[test]
    fn deleting_an_earlier_entry_keeps_the_session_on_its_entry() {
        let mut ed = editor(three());
        ed.start_edit(&id("c")).unwrap();
        ed.set_title("Third, renamed");
        ed.delete(&id("a")).unwrap();
        assert_eq!(ed.mode(), &EditMode::Edit(id("c")));

        ed.submit().unwrap();
        let titles: Vec<&str> = ed.links().iter().map(|l| l.title.as_str()).collect();
        assert_eq!(titles, vec!["Second", "Third, renamed"]);
    }

    #[test]
    fn delete_unknown_id_is_not_found() {
        let mut ed = editor(three());
        assert_eq!(ed.delete(&id("zzz")).unwrap_err(), CoreError::NotFound);
        assert!(ed.observer().calls.is_empty());
        assert_eq!(ed.start_edit(&id("zzz")).unwrap_err(), CoreError::NotFound);
    }

    #[test]
    fn icon_type_switch_resets_icon() {
        let mut ed = editor(vec![]);
        ed.set_icon("Home");
        ed.set_icon_type(IconType::Custom);
        assert_eq!(ed.draft().icon, "");
        ed.set_icon("https://example.com/logo.png");
        ed.set_icon_type(IconType::Fluent);
        assert_eq!(ed.draft().icon, "Link");
    }

    #[test]
    fn reselecting_the_current_icon_type_keeps_the_icon() {
        let mut ed = editor(vec![]);
        ed.set_icon("Home");
        ed.set_icon_type(IconType::Fluent);
        assert_eq!(ed.draft().icon, "Home");
        ed.set_icon_type(IconType::Custom);
        ed.set_icon("https://example.com/logo.png");
        ed.set_icon_type(IconType::Custom);
        assert_eq!(ed.draft().icon, "https://example.com/logo.png");
    }

    #[test]
    fn cleared_icon_falls_back_to_type_default() {
        let mut ed = editor(vec![]);
        ed.set_icon("Home");
        ed.set_icon("");
        assert_eq!(ed.draft().icon, "Link");
    }

    #[test]
    fn icon_warning_is_advisory() {
        let mut ed = editor(vec![]);
        ed.set_title("T");
        ed.set_url("https://example.com");
        ed.set_icon_type(IconType::Custom);
        assert_eq!(ed.icon_warning(), None);
        ed.set_icon("javascript:x");
        assert_eq!(ed.icon_warning(), Some(UrlRejection::DangerousScheme));
        assert!(ed.can_submit());
    }

    #[test]
    fn new_ids_are_unique_and_stable() {
        let mut ed = editor(vec![stored("0", "Existing", "/a")]);
        ed.set_title("New");
        ed.set_url("/b");
        let new_id = ed.submit().unwrap();
        assert_ne!(new_id, id("0"));
        assert_eq!(ed.links().get(&new_id).map(|l| l.title.as_str()), Some("New"));
    }

    #[test]
    fn reload_cancels_a_session_whose_entry_vanished() {
        let mut ed = editor(three());
        ed.start_edit(&id("b")).unwrap();
        ed.reload(vec![stored("a", "First", "https://one.example")])
            .unwrap();
        assert_eq!(ed.mode(), &EditMode::Compose);
        assert_eq!(ed.links().len(), 1);
        assert!(ed.observer().calls.is_empty());
    }

    #[test]
    fn submit_after_entry_vanished_reports_not_found() {
        let mut ed = editor(three());
        ed.start_edit(&id("b")).unwrap();
        // Simulate the list changing under the session without a reload.
        ed.links.remove(&id("b")).unwrap();
        assert_eq!(ed.submit().unwrap_err(), CoreError::NotFound);
        assert_eq!(ed.mode(), &EditMode::Compose);
        assert!(ed.observer().calls.is_empty());
    }

    #[test]
    fn entry_summaries_describe_target_and_icon() {
        let mut custom = stored("x", "Logo", "https://example.com");
        custom.icon_type = Some(IconType::Custom);
        custom.icon = "javascript:alert(1)".to_string();
        custom.open_in_new_tab = false;
        let ed = editor(vec![custom]);
        let entries = ed.entries();
        assert_eq!(entries[0].target_label, "Opens in same tab");
        assert!(entries[0].custom_icon);
        assert_eq!(
            entries[0].icon,
            IconView::Fluent {
                name: "Link".to_string()
            }
        );
    }
}
