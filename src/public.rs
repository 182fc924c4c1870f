//! Reader-facing page enhancements
//!
//! Required-field validation, in-page anchor scrolling, active navigation
//! highlighting and collapsible chapter comments. Unlike the admin pass
//! nothing here is delayed; everything is attached at load.

use crate::config::Markers;
use crate::dom::{Document, NodeId, Selector};
use crate::page::{
    Behavior, Event, EventKind, Host, Page, ScrollBehavior, ScrollBlock, ScrollOptions,
};

pub const INVALID_BORDER: &str = "red";
pub const VALID_BORDER: &str = "#ddd";

/// Handles to every element the public enhancer works on
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PublicTargets {
    pub forms: Vec<NodeId>,
    pub anchor_links: Vec<NodeId>, // Links whose href starts with '#'
    pub nav_links: Vec<NodeId>,    // Links anywhere inside a nav element
    pub comment_sections: Vec<NodeId>,
}

impl PublicTargets {
    pub fn discover(doc: &Document, markers: &Markers) -> Self {
        let root = doc.root();

        let mut nav_links = Vec::new();
        for nav in doc.query_all(root, &Selector::tag("nav")) {
            for link in doc.query_all(nav, &Selector::tag("a")) {
                if !nav_links.contains(&link) {
                    nav_links.push(link);
                }
            }
        }

        Self {
            forms: doc.query_all(root, &Selector::tag("form")),
            anchor_links: doc.query_all(
                root,
                &Selector::tag("a").and(Selector::attr_prefix("href", "#")),
            ),
            nav_links,
            comment_sections: doc.query_all(root, &Selector::class(markers.comment_section.as_str())),
        }
    }
}

/// Attach every public-page behavior; `current_path` is the page's own URL path
pub fn init_public(page: &mut Page, current_path: &str) {
    let targets = PublicTargets::discover(page.document(), &page.config().markers);

    enable_form_validation(page, &targets.forms);
    enable_smooth_scroll(page, &targets.anchor_links);
    let active = highlight_active_nav(page, &targets.nav_links, current_path);
    let collapsible = make_comments_collapsible(page, &targets.comment_sections);

    tracing::info!(
        "Public enhancer: {} forms, {} anchors, {} active nav links, {} comment sections",
        targets.forms.len(),
        targets.anchor_links.len(),
        active.len(),
        collapsible
    );
}

pub fn enable_form_validation(page: &mut Page, forms: &[NodeId]) {
    for &form in forms {
        page.listen(form, EventKind::Submit, Behavior::ValidateRequired);
    }
}

/// Required inputs and textareas inside a form
pub fn required_fields(doc: &Document, form: NodeId) -> Vec<NodeId> {
    let control = Selector::Any(vec![Selector::tag("input"), Selector::tag("textarea")]);
    doc.query_all(form, &control.and(Selector::has_attr("required")))
}

pub(crate) fn validate_form(page: &mut Page, form: NodeId, event: &mut Event, host: &mut dyn Host) {
    let doc = page.document_mut();
    let mut valid = true;

    for field in required_fields(doc, form) {
        if doc.node(field).form_value().trim().is_empty() {
            valid = false;
            doc.set_style(field, "border-color", INVALID_BORDER);
        } else {
            doc.set_style(field, "border-color", VALID_BORDER);
        }
    }

    if !valid {
        event.prevent_default();
        let message = page.config().labels.validation_failed.clone();
        host.alert(&message);
    }
}

pub fn enable_smooth_scroll(page: &mut Page, links: &[NodeId]) {
    for &link in links {
        page.listen(link, EventKind::Click, Behavior::SmoothScroll);
    }
}

pub(crate) fn smooth_scroll(page: &mut Page, link: NodeId, event: &mut Event, host: &mut dyn Host) {
    // Navigation is cancelled even when the fragment matches nothing
    event.prevent_default();

    let doc = page.document();
    let fragment = doc
        .node(link)
        .attr("href")
        .and_then(|href| href.strip_prefix('#'))
        .unwrap_or_default();

    match doc.element_by_id(fragment) {
        Some(target) => host.scroll_into_view(
            target,
            ScrollOptions {
                behavior: ScrollBehavior::Smooth,
                block: ScrollBlock::Start,
            },
        ),
        None => tracing::debug!("No element for fragment #{}", fragment),
    }
}

/// Resolve a link target to a URL path relative to `base`.
///
/// `None` for links without a hierarchical path (`mailto:`, `javascript:`).
pub fn resolve_path(base: &str, href: &str) -> Option<String> {
    let end = href.find(['?', '#']).unwrap_or(href.len());
    let href = href[..end].trim();

    let path = if let Some(idx) = href.find("://") {
        let after_scheme = &href[idx + 3..];
        after_scheme.find('/').map(|p| &after_scheme[p..]).unwrap_or("/").to_string()
    } else if let Some(rest) = href.strip_prefix("//") {
        rest.find('/').map(|p| &rest[p..]).unwrap_or("/").to_string()
    } else if href.starts_with('/') {
        href.to_string()
    } else if href.is_empty() {
        base.to_string()
    } else if href.split('/').next().unwrap_or_default().contains(':') {
        return None;
    } else {
        let dir = base.rfind('/').map(|i| &base[..=i]).unwrap_or("/");
        format!("{}{}", dir, href)
    };

    Some(normalize_path(&path))
}

fn normalize_path(path: &str) -> String {
    let parts: Vec<&str> = path.split('/').collect();
    let trailing = path.ends_with('/') || matches!(parts.last(), Some(&".") | Some(&".."));

    let mut segments: Vec<&str> = Vec::new();
    for part in parts {
        match part {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            segment => segments.push(segment),
        }
    }

    let mut out = format!("/{}", segments.join("/"));
    if trailing && !segments.is_empty() {
        out.push('/');
    }
    out
}

/// Mark nav links pointing at the current page; returns the marked links
pub fn highlight_active_nav(page: &mut Page, links: &[NodeId], current_path: &str) -> Vec<NodeId> {
    let current = normalize_path(current_path);
    let doc = page.document_mut();
    let mut active = Vec::new();

    for &link in links {
        let Some(href) = doc.node(link).attr("href") else {
            continue;
        };
        if resolve_path(&current, href).as_deref() == Some(current.as_str()) {
            doc.set_style(link, "font-weight", "bold");
            doc.set_style(link, "text-decoration", "underline");
            active.push(link);
        }
    }
    active
}

/// Make heading clicks fold a section's comment list and form together.
///
/// Returns how many sections had all three parts.
pub fn make_comments_collapsible(page: &mut Page, sections: &[NodeId]) -> usize {
    let heading_tag = page.config().markers.comment_heading.clone();
    let mut count = 0;

    for &section in sections {
        let doc = page.document();
        let parts = (
            doc.query(section, &Selector::tag(heading_tag.as_str())),
            doc.query(section, &Selector::tag("ul")),
            doc.query(section, &Selector::tag("form")),
        );
        let (Some(heading), Some(list), Some(form)) = parts else {
            tracing::debug!("Comment section {} is incomplete, skipping", section.index());
            continue;
        };

        page.document_mut().set_style(heading, "cursor", "pointer");
        page.listen(heading, EventKind::Click, Behavior::ToggleComments { list, form, open: true });
        count += 1;
    }
    count
}

pub(crate) fn set_comments_open(page: &mut Page, list: NodeId, form: NodeId, open: bool) {
    let display = if open { "block" } else { "none" };
    let doc = page.document_mut();
    doc.set_style(list, "display", display);
    doc.set_style(form, "display", display);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EnhancerConfig;
    use crate::page::{ScriptedHost, SubmitSource};

    fn el(doc: &mut Document, parent: NodeId, tag: &str) -> NodeId {
        let id = doc.create_element(tag);
        doc.append_child(parent, id);
        id
    }

    fn required(doc: &mut Document, parent: NodeId, tag: &str, value: &str) -> NodeId {
        let field = el(doc, parent, tag);
        doc.node_mut(field).attrs.insert("required".to_string(), String::new());
        doc.node_mut(field).value = value.to_string();
        field
    }

    #[test]
    fn test_validation_blocks_and_marks_empty_fields() {
        let mut doc = Document::new();
        let root = doc.root();
        let form = el(&mut doc, root, "form");
        let title = required(&mut doc, form, "input", "Chapter 3");
        let body = required(&mut doc, form, "textarea", "   ");
        let author = required(&mut doc, form, "input", "");
        let optional = el(&mut doc, form, "input");

        let mut page = Page::new(doc, EnhancerConfig::default());
        enable_form_validation(&mut page, &[form]);
        let mut host = ScriptedHost::declining();

        assert!(!page.submit_by_user(form, &mut host));
        assert!(page.submissions().is_empty());
        assert_eq!(host.alerts.len(), 1);

        let doc = page.document();
        assert_eq!(doc.style(title, "border-color"), Some(VALID_BORDER));
        assert_eq!(doc.style(body, "border-color"), Some(INVALID_BORDER));
        assert_eq!(doc.style(author, "border-color"), Some(INVALID_BORDER));
        assert_eq!(doc.style(optional, "border-color"), None);
    }

    #[test]
    fn test_validation_reruns_on_each_attempt() {
        let mut doc = Document::new();
        let root = doc.root();
        let form = el(&mut doc, root, "form");
        let field = required(&mut doc, form, "input", "");

        let mut page = Page::new(doc, EnhancerConfig::default());
        enable_form_validation(&mut page, &[form]);
        let mut host = ScriptedHost::declining();

        assert!(!page.submit_by_user(form, &mut host));

        page.set_value(field, "filled in");
        assert!(page.submit_by_user(form, &mut host));
        assert_eq!(page.document().style(field, "border-color"), Some(VALID_BORDER));
        assert_eq!(host.alerts.len(), 1);

        let submission = page.submissions()[0];
        assert_eq!(submission.form, form);
        assert_eq!(submission.source, SubmitSource::User);
    }

    #[test]
    fn test_required_checkbox_reports_default_value() {
        let doc = crate::markup::parse(
            r#"{ "tag": "body", "children": [
                { "tag": "form", "children": [
                    { "tag": "input", "attrs": { "type": "checkbox", "required": "" }, "checked": true },
                    { "tag": "input", "attrs": { "type": "radio", "required": "" } }
                ] }
            ] }"#,
        )
        .unwrap();
        let form = doc.query(doc.root(), &Selector::tag("form")).unwrap();

        let mut page = Page::new(doc, EnhancerConfig::default());
        init_public(&mut page, "/");
        let mut host = ScriptedHost::declining();

        assert!(page.submit_by_user(form, &mut host));
        assert!(host.alerts.is_empty());
        assert_eq!(page.submissions().len(), 1);
    }

    #[test]
    fn test_smooth_scroll_to_fragment() {
        let mut doc = Document::new();
        let root = doc.root();
        let link = el(&mut doc, root, "a");
        doc.node_mut(link).attrs.insert("href".to_string(), "#chapter-2".to_string());
        let dangling = el(&mut doc, root, "a");
        doc.node_mut(dangling).attrs.insert("href".to_string(), "#".to_string());
        let target = el(&mut doc, root, "section");
        doc.node_mut(target).attrs.insert("id".to_string(), "chapter-2".to_string());

        let mut page = Page::new(doc, EnhancerConfig::default());
        let targets = PublicTargets::discover(page.document(), &page.config().markers);
        assert_eq!(targets.anchor_links, vec![link, dangling]);
        enable_smooth_scroll(&mut page, &targets.anchor_links);

        let mut host = ScriptedHost::declining();
        assert!(!page.click(link, &mut host));
        assert_eq!(host.scrolls.len(), 1);
        assert_eq!(host.scrolls[0].0, target);
        assert_eq!(host.scrolls[0].1.behavior, ScrollBehavior::Smooth);
        assert_eq!(host.scrolls[0].1.block, ScrollBlock::Start);

        // No target: default still cancelled, nothing scrolls
        assert!(!page.click(dangling, &mut host));
        assert_eq!(host.scrolls.len(), 1);
    }

    #[test]
    fn test_resolve_path() {
        assert_eq!(resolve_path("/stories/7", "/stories").as_deref(), Some("/stories"));
        assert_eq!(resolve_path("/stories/7", "8").as_deref(), Some("/stories/8"));
        assert_eq!(resolve_path("/stories/7", "../about").as_deref(), Some("/about"));
        assert_eq!(resolve_path("/a/b/", "./c").as_deref(), Some("/a/b/c"));
        assert_eq!(resolve_path("/a/b", "..").as_deref(), Some("/"));
        assert_eq!(resolve_path("/", "https://example.com/admin?tab=users").as_deref(), Some("/admin"));
        assert_eq!(resolve_path("/", "https://example.com").as_deref(), Some("/"));
        assert_eq!(resolve_path("/x", "//cdn.example.com/y").as_deref(), Some("/y"));
        assert_eq!(resolve_path("/stories/7", "#comments").as_deref(), Some("/stories/7"));
        assert_eq!(resolve_path("/", "mailto:team@example.com"), None);
    }

    #[test]
    fn test_highlight_active_nav() {
        let mut doc = Document::new();
        let root = doc.root();
        let nav = el(&mut doc, root, "nav");
        let hrefs = ["/", "/stories", "http://localhost:8000/stories?page=2", "/admin"];
        let links: Vec<NodeId> = hrefs
            .iter()
            .map(|href| {
                let a = el(&mut doc, nav, "a");
                doc.node_mut(a).attrs.insert("href".to_string(), href.to_string());
                a
            })
            .collect();
        let outside = el(&mut doc, root, "a");
        doc.node_mut(outside).attrs.insert("href".to_string(), "/stories".to_string());

        let mut page = Page::new(doc, EnhancerConfig::default());
        let targets = PublicTargets::discover(page.document(), &page.config().markers);
        assert_eq!(targets.nav_links, links);

        let active = highlight_active_nav(&mut page, &targets.nav_links, "/stories");
        assert_eq!(active, vec![links[1], links[2]]);
        assert_eq!(page.document().style(links[1], "font-weight"), Some("bold"));
        assert_eq!(page.document().style(links[2], "text-decoration"), Some("underline"));
        assert_eq!(page.document().style(links[0], "font-weight"), None);
        assert_eq!(page.document().style(outside, "font-weight"), None);
    }

    fn comment_section(doc: &mut Document, parent: NodeId) -> (NodeId, NodeId, NodeId, NodeId) {
        let section = el(doc, parent, "div");
        doc.node_mut(section).classes.push("chapter-comments".to_string());
        let heading = el(doc, section, "h5");
        let list = el(doc, section, "ul");
        let form = el(doc, section, "form");
        (section, heading, list, form)
    }

    #[test]
    fn test_comments_toggle_in_lockstep() {
        let mut doc = Document::new();
        let root = doc.root();
        let (section, heading, list, form) = comment_section(&mut doc, root);

        let mut page = Page::new(doc, EnhancerConfig::default());
        assert_eq!(make_comments_collapsible(&mut page, &[section]), 1);
        assert_eq!(page.document().style(heading, "cursor"), Some("pointer"));
        let before = (page.document().is_rendered(list), page.document().is_rendered(form));

        let mut host = ScriptedHost::declining();
        page.click(heading, &mut host);
        assert!(!page.document().is_rendered(list));
        assert!(!page.document().is_rendered(form));

        page.click(heading, &mut host);
        let after = (page.document().is_rendered(list), page.document().is_rendered(form));
        assert_eq!(before, after);
        assert_eq!(page.document().style(list, "display"), Some("block"));
    }

    #[test]
    fn test_sections_toggle_independently_and_incomplete_ones_are_skipped() {
        let mut doc = Document::new();
        let root = doc.root();
        let (first, first_heading, first_list, _) = comment_section(&mut doc, root);
        let (second, _, second_list, second_form) = comment_section(&mut doc, root);
        doc.remove(second_form);

        let mut page = Page::new(doc, EnhancerConfig::default());
        assert_eq!(make_comments_collapsible(&mut page, &[first, second]), 1);

        let mut host = ScriptedHost::declining();
        page.click(first_heading, &mut host);
        assert!(!page.document().is_rendered(first_list));
        assert!(page.document().is_rendered(second_list));
    }

    #[test]
    fn test_init_public_wires_everything() {
        let mut doc = Document::new();
        let root = doc.root();
        let nav = el(&mut doc, root, "nav");
        let home = el(&mut doc, nav, "a");
        doc.node_mut(home).attrs.insert("href".to_string(), "/".to_string());
        let (_, heading, list, form) = comment_section(&mut doc, root);
        let field = required(&mut doc, form, "textarea", "");

        let mut page = Page::new(doc, EnhancerConfig::default());
        init_public(&mut page, "/");

        let mut host = ScriptedHost::declining();
        assert_eq!(page.document().style(home, "font-weight"), Some("bold"));
        assert!(!page.submit_by_user(form, &mut host));
        assert_eq!(page.document().style(field, "border-color"), Some(INVALID_BORDER));

        page.click(heading, &mut host);
        assert!(!page.document().is_rendered(list));
        assert_eq!(page.pending_tasks(), 0);
    }
}
