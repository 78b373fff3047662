//! The editing form and the renderer must reach the same verdict for every
//! URL. Both depend on one classifier; this pins that they keep doing so.

use domain::form::LinkEditor;
use domain::id::Base62IdGenerator;
use domain::render::{render_link, render_panel, IconView, PanelBody, PLACEHOLDER_HREF};
use domain::validate::{classify_url, UrlRejection};
use domain::{IconType, LinkList, StoredLink};

const FIXTURES: &[&str] = &[
    "https://www.google.com",
    "http://example.com",
    "HTTPS://EXAMPLE.COM",
    "  https://padded.example  ",
    "/sites/MySite",
    "./page.aspx",
    "../Documents",
    "#section",
    "?param=value",
    "www.google.com",
    "invalid-url.com",
    "ftp://files.example",
    "mailto:a@b.com",
    "javascript:alert(1)",
    "JavaScript:alert(1)",
    "  data:text/html,<script>alert(1)</script>",
    "vbscript:msgbox(1)",
    "see https://x.com",
    "",
    "   ",
];

fn noop(_: &LinkList) {}

fn stored(url: &str) -> StoredLink {
    StoredLink {
        id: None,
        title: "Fixture".to_string(),
        url: url.to_string(),
        icon: url.to_string(),
        icon_type: Some(IconType::Custom),
        open_in_new_tab: true,
    }
}

#[test]
fn form_and_renderer_agree_on_every_fixture() {
    for &value in FIXTURES {
        let mut editor =
            LinkEditor::new(Vec::new(), Base62IdGenerator::new(1), noop).expect("editor");
        editor.set_title("Fixture");
        editor.set_url(value);
        let form_accepts = editor.can_submit();

        let list = LinkList::from_stored(
            vec![stored(value)],
            &mut domain::id::IdAllocator::new(Base62IdGenerator::new(1)),
        )
        .expect("list");
        let view = render_link(&list.as_slice()[0]);
        let renderer_accepts = view.navigable;
        let image_accepted = matches!(view.icon, IconView::Image { .. });

        assert_eq!(form_accepts, renderer_accepts, "navigation verdict for {value:?}");
        assert_eq!(form_accepts, image_accepted, "icon verdict for {value:?}");
        assert_eq!(form_accepts, classify_url(value).is_ok(), "classifier for {value:?}");
        if !renderer_accepts {
            assert_eq!(view.href, PLACEHOLDER_HREF);
        }
    }
}

#[test]
fn form_error_matches_classifier_reason() {
    for &value in FIXTURES {
        let mut editor =
            LinkEditor::new(Vec::new(), Base62IdGenerator::new(1), noop).expect("editor");
        editor.set_url(value);
        let expected = match classify_url(value) {
            Err(UrlRejection::Absent) | Ok(_) => None,
            Err(reason) => Some(reason),
        };
        assert_eq!(editor.url_error(), expected, "{value:?}");
    }
}

#[test]
fn committed_links_render_navigable() {
    let mut committed: Vec<LinkList> = Vec::new();
    let mut editor = LinkEditor::new(Vec::new(), Base62IdGenerator::new(1), |l: &LinkList| {
        committed.push(l.clone())
    })
    .expect("editor");

    for &value in FIXTURES {
        editor.set_title("Fixture");
        editor.set_url(value);
        let _ = editor.submit();
    }
    let list = editor.links().clone();
    drop(editor);

    assert_eq!(committed.len(), list.len());
    let view = render_panel("Links", &list);
    match view.body {
        PanelBody::Links(links) => assert!(links.iter().all(|l| l.navigable)),
        PanelBody::Empty(_) => panic!("expected committed links"),
    }
}
