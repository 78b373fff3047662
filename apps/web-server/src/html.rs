//! HTML serialisation of the rendered panel.
//!
//! Every text and attribute value passes through `html_escape`. Inline
//! handlers are static strings; no link data is ever placed inside script.

use domain::render::{IconView, LinkView, PanelBody, PanelView};
use http_common::html_escape;

use crate::config::Theme;

// Hides the broken image and reveals the fallback icon rendered next to it.
const IMG_ONERROR: &str = "this.hidden=true;this.nextElementSibling.hidden=false;";

fn theme_vars(theme: Theme) -> &'static str {
    match theme {
        Theme::Light => "--ql-bg: #ffffff; --ql-fg: #323130; --ql-muted: #605e5c; --ql-accent: #0078d4; --ql-hover: #f3f2f1;",
        Theme::Dark => "--ql-bg: #1b1a19; --ql-fg: #f3f2f1; --ql-muted: #c8c6c4; --ql-accent: #2899f5; --ql-hover: #252423;",
    }
}

/// Full standalone page for `GET /`.
pub fn render_page(view: &PanelView, theme: Theme) -> String {
    let page_title = view.title.as_deref().unwrap_or("Quick Links");
    format!(
        r##"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{page_title}</title>
    <style>
        :root {{ {vars} }}
        * {{ margin: 0; padding: 0; box-sizing: border-box; }}
        body {{
            font-family: 'Segoe UI', -apple-system, BlinkMacSystemFont, Roboto, sans-serif;
            background: var(--ql-bg);
            color: var(--ql-fg);
            padding: 20px;
        }}
        .ql-heading {{ font-size: 1.25rem; font-weight: 600; margin-bottom: 12px; }}
        .ql-list {{ list-style: none; display: grid; grid-template-columns: repeat(auto-fill, minmax(160px, 1fr)); gap: 8px; }}
        .ql-link {{
            display: flex;
            align-items: center;
            gap: 8px;
            padding: 10px 12px;
            border-radius: 4px;
            color: var(--ql-fg);
            text-decoration: none;
        }}
        .ql-link:hover, .ql-link:focus {{ background: var(--ql-hover); color: var(--ql-accent); }}
        .ql-link[aria-disabled="true"] {{ cursor: not-allowed; opacity: 0.6; }}
        .ql-icon {{ width: 20px; height: 20px; object-fit: contain; }}
        .ql-empty {{ color: var(--ql-muted); display: flex; align-items: center; gap: 8px; }}
    </style>
</head>
<body>
{panel}
</body>
</html>"##,
        page_title = html_escape(page_title),
        vars = theme_vars(theme),
        panel = render_panel(view),
    )
}

/// The panel fragment alone.
pub fn render_panel(view: &PanelView) -> String {
    let mut out = String::from(r#"<section class="ql-panel">"#);
    if let Some(title) = &view.title {
        out.push_str(&format!(
            r#"<h2 class="ql-heading">{}</h2>"#,
            html_escape(title)
        ));
    }
    match &view.body {
        PanelBody::Empty(state) => {
            out.push_str(&format!(
                r#"<div class="ql-empty" role="{}" aria-live="{}">{}<p>{}</p></div>"#,
                state.role,
                state.aria_live,
                fluent_icon(state.icon, false),
                html_escape(state.message),
            ));
        }
        PanelBody::Links(links) => {
            out.push_str(r#"<ul class="ql-list">"#);
            for link in links {
                out.push_str(&render_link(link));
            }
            out.push_str("</ul>");
        }
    }
    out.push_str("</section>");
    out
}

fn render_link(link: &LinkView) -> String {
    let rel = link
        .rel
        .map(|r| format!(r#" rel="{}""#, html_escape(r)))
        .unwrap_or_default();
    // Suppressed links stay visible but cannot be activated.
    let inert = if link.navigable {
        ""
    } else {
        r#" aria-disabled="true" tabindex="-1" onclick="return false;""#
    };
    format!(
        r#"<li class="ql-item"><a class="ql-link" data-id="{id}" href="{href}" target="{target}"{rel}{inert} aria-label="{label}">{icon}<span class="ql-title">{title}</span></a></li>"#,
        id = html_escape(link.id.as_str()),
        href = html_escape(&link.href),
        target = link.target.as_attr(),
        label = html_escape(&link.aria_label),
        icon = render_icon(&link.icon),
        title = html_escape(&link.title),
    )
}

fn render_icon(icon: &IconView) -> String {
    match icon {
        IconView::Fluent { name } => fluent_icon(name, false),
        IconView::Image { src, alt, fallback } => format!(
            r#"<img class="ql-icon" src="{}" alt="{}" onerror="{}">{}"#,
            html_escape(src),
            html_escape(alt),
            IMG_ONERROR,
            fluent_icon(fallback, true),
        ),
    }
}

fn fluent_icon(name: &str, hidden: bool) -> String {
    format!(
        r#"<i class="ms-Icon ms-Icon--{}" aria-hidden="true"{}></i>"#,
        html_escape(name),
        if hidden { " hidden" } else { "" }
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::id::{Base62IdGenerator, IdAllocator};
    use domain::render::render_panel as view_of;
    use domain::{IconType, LinkList, StoredLink};

    fn links(entries: &[(&str, &str, &str, Option<IconType>, bool)]) -> LinkList {
        let stored = entries
            .iter()
            .map(|(title, url, icon, icon_type, new_tab)| StoredLink {
                id: None,
                title: title.to_string(),
                url: url.to_string(),
                icon: icon.to_string(),
                icon_type: *icon_type,
                open_in_new_tab: *new_tab,
            })
            .collect();
        let mut ids = IdAllocator::new(Base62IdGenerator::new(1));
        LinkList::from_stored(stored, &mut ids).unwrap()
    }

    #[test]
    fn empty_panel_is_a_live_status_region() {
        let html = render_panel(&view_of("Quick Links", &LinkList::new()));
        assert!(html.contains(r#"<h2 class="ql-heading">Quick Links</h2>"#));
        assert!(html.contains(r#"role="status" aria-live="polite""#));
        assert!(html.contains("No quick links configured."));
        assert!(!html.contains("<ul"));
    }

    #[test]
    fn new_tab_link_markup() {
        let list = links(&[("Docs", "https://example.com/?a=1&b=2", "Document", None, true)]);
        let html = render_panel(&view_of("", &list));
        assert!(!html.contains("<h2"));
        assert!(html.contains(r#"href="https://example.com/?a=1&amp;b=2""#));
        assert!(html.contains(r#"target="_blank" rel="noopener noreferrer""#));
        assert!(html.contains(r#"aria-label="Docs (opens in new tab)""#));
        assert!(html.contains("ms-Icon--Document"));
        assert!(!html.contains("aria-disabled"));
    }

    #[test]
    fn rejected_link_is_inert() {
        let list = links(&[("Bad", "javascript:alert(1)", "Link", None, true)]);
        let html = render_panel(&view_of("", &list));
        assert!(html.contains(r##"href="#""##));
        assert!(html.contains(r#"target="_self""#));
        assert!(html.contains(r#"aria-disabled="true""#));
        assert!(html.contains(r#"onclick="return false;""#));
        assert!(!html.contains("javascript:"));
        assert!(!html.contains("rel="));
    }

    #[test]
    fn text_is_escaped() {
        let list = links(&[("<b>\"x\"</b>", "/a", "Link", None, false)]);
        let html = render_page(&view_of("<script>alert(1)</script>", &list), Theme::Light);
        assert!(!html.contains("<script>"));
        assert!(!html.contains("<b>"));
        assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
        assert!(html.contains("&lt;b&gt;&quot;x&quot;&lt;/b&gt;"));
    }

    #[test]
    fn image_icon_has_static_fallback_swap() {
        let list = links(&[(
            "Logo",
            "https://example.com",
            "https://example.com/logo.png",
            Some(IconType::Custom),
            true,
        )]);
        let html = render_panel(&view_of("", &list));
        assert!(html.contains(r#"src="https://example.com/logo.png" alt="Logo""#));
        assert!(html.contains(IMG_ONERROR));
        assert!(html.contains(r#"ms-Icon--Link" aria-hidden="true" hidden"#));
    }

    #[test]
    fn theme_sets_css_variables() {
        let view = view_of("", &LinkList::new());
        assert!(render_page(&view, Theme::Light).contains("--ql-bg: #ffffff"));
        assert!(render_page(&view, Theme::Dark).contains("--ql-bg: #1b1a19"));
    }
}
