//! Admin dashboard enhancements
//!
//! `init_admin` runs the always-on pass at page load and queues the optional
//! advanced features (search box, batch selection, keyboard shortcuts) for
//! later. Every attach function takes the nodes it works on explicitly, so
//! callers can point it at any subset of the page.

use crate::animation::{CountUp, Reveal};
use crate::config::Markers;
use crate::dom::{Document, NodeId, Selector};
use crate::page::{Behavior, Event, EventKind, Host, Page, Task};

pub const WRAPPER_CLASS: &str = "table-responsive";
pub const ROW_CHECKBOX_CLASS: &str = "row-checkbox";
pub const SELECT_ALL_CLASS: &str = "select-all-checkbox";
pub const SEARCH_CLASS: &str = "admin-search";
pub const SHORTCUTS_DIALOG_CLASS: &str = "shortcuts-dialog";
pub const SHORTCUTS_BACKDROP_CLASS: &str = "shortcuts-backdrop";

const HEADER_BACKGROUND: &str = "linear-gradient(135deg, #667eea 0%, #764ba2 100%)";
const ACCENT: &str = "#667eea";
const SEARCH_BORDER: &str = "#e2e8f0";

/// Shortcut help entries: key combination, description
pub const SHORTCUTS: [(&str, &str); 4] = [
    ("Ctrl + /", "Show keyboard shortcuts"),
    ("Ctrl + S", "Save form"),
    ("Tab", "Move between form fields"),
    ("Enter", "Submit form or press button"),
];

/// Handles to every element the admin enhancer works on
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdminTargets {
    pub tables: Vec<NodeId>,
    pub danger_buttons: Vec<NodeId>,
    pub stat_cards: Vec<NodeId>,
    pub stat_numbers: Vec<NodeId>,
    pub main: Option<NodeId>,
    pub headers: Vec<NodeId>,
}

impl AdminTargets {
    /// Find flagged elements by their configured class markers
    pub fn discover(doc: &Document, markers: &Markers) -> Self {
        let root = doc.root();
        let by_class = |class: &str| doc.query_all(root, &Selector::class(class));

        Self {
            tables: by_class(&markers.admin_table),
            danger_buttons: by_class(&markers.danger_button),
            stat_cards: by_class(&markers.stat_card),
            stat_numbers: by_class(&markers.stat_number),
            main: doc.query(root, &Selector::class(markers.admin_main.as_str())),
            headers: by_class(&markers.admin_header),
        }
    }
}

/// Page-load pass; also queues the advanced features when enabled
pub fn init_admin(page: &mut Page) {
    let targets = AdminTargets::discover(page.document(), &page.config().markers);
    tracing::info!(
        "Admin enhancer: {} tables, {} danger buttons, {} stat cards, {} stat numbers",
        targets.tables.len(),
        targets.danger_buttons.len(),
        targets.stat_cards.len(),
        targets.stat_numbers.len()
    );

    enhance_table_hover(page, &targets.tables);
    enhance_delete_confirmation(page, &targets.danger_buttons);
    animate_stat_cards(page, &targets.stat_cards, &targets.stat_numbers);
    make_tables_responsive(page, &targets.tables);
    add_page_load_animation(page, targets.main);

    if page.config().features.advanced {
        let delay = page.config().timing.advanced_features_delay();
        page.schedule(delay, Task::InitAdvanced);
    }
}

/// Delayed pass for the optional features
pub fn init_advanced(page: &mut Page) {
    let targets = AdminTargets::discover(page.document(), &page.config().markers);
    let features = page.config().features.clone();

    if features.search {
        add_search_box(page, targets.headers.first().copied());
    }
    if features.batch_selection {
        add_batch_operations(page, &targets.tables);
    }
    if features.keyboard_shortcuts {
        add_keyboard_shortcuts(page);
    }
}

/// Rows inside a table's body sections
pub fn body_rows(doc: &Document, table: NodeId) -> Vec<NodeId> {
    let mut rows = Vec::new();
    for body in doc.query_all(table, &Selector::tag("tbody")) {
        for row in doc.query_all(body, &Selector::tag("tr")) {
            if !rows.contains(&row) {
                rows.push(row);
            }
        }
    }
    rows
}

/// First row of a table's header section
pub fn header_row(doc: &Document, table: NodeId) -> Option<NodeId> {
    doc.query_all(table, &Selector::tag("thead"))
        .into_iter()
        .find_map(|head| doc.query(head, &Selector::tag("tr")))
}

pub fn enhance_table_hover(page: &mut Page, tables: &[NodeId]) {
    for &table in tables {
        for row in body_rows(page.document(), table) {
            page.listen(row, EventKind::MouseEnter, Behavior::RowHoverIn);
            page.listen(row, EventKind::MouseLeave, Behavior::RowHoverOut);
        }
    }
}

pub(crate) fn row_hover(page: &mut Page, row: NodeId, entering: bool) {
    let doc = page.document_mut();
    if entering {
        doc.set_style(row, "transform", "scale(1.01)");
        doc.set_style(row, "transition", "transform 0.2s ease");
    } else {
        doc.set_style(row, "transform", "scale(1)");
    }
}

/// Message a danger control asks the user to confirm.
///
/// Read from the marker attribute, else from the first quoted string of an
/// inline `onclick`; empty when neither exists.
pub fn confirm_message(doc: &Document, button: NodeId, attr: &str) -> String {
    let node = doc.node(button);
    if let Some(message) = node.attr(attr) {
        return message.to_string();
    }
    node.attr("onclick")
        .and_then(|handler| {
            let start = handler.find('\'')? + 1;
            let len = handler[start..].find('\'')?;
            Some(handler[start..start + len].to_string())
        })
        .unwrap_or_default()
}

pub fn enhance_delete_confirmation(page: &mut Page, buttons: &[NodeId]) {
    for &button in buttons {
        page.listen(button, EventKind::Click, Behavior::ConfirmDelete);
    }
}

pub(crate) fn confirm_delete(
    page: &mut Page,
    button: NodeId,
    event: &mut Event,
    host: &mut dyn Host,
) {
    // Submission is ours either way; never let the click navigate on its own
    event.prevent_default();

    // Read at click time so attribute edits after load take effect
    let message = confirm_message(page.document(), button, &page.config().markers.confirm_attr);
    if !host.confirm(&message) {
        tracing::debug!("Delete on node {} declined", button.index());
        return;
    }

    let busy = page.config().labels.busy.clone();
    let doc = page.document_mut();
    doc.set_style(button, "opacity", "0.5");
    doc.set_text(button, busy);
    doc.node_mut(button).disabled = true;

    match page.enclosing_form(button) {
        Some(form) => {
            let delay = page.config().timing.delete_submit_delay();
            page.schedule(delay, Task::SubmitForm(form));
        }
        None => tracing::debug!("Delete on node {} has no form to submit", button.index()),
    }
}

/// Staggered entrance for cards plus count-up for number displays
pub fn animate_stat_cards(page: &mut Page, cards: &[NodeId], numbers: &[NodeId]) {
    let timing = page.config().timing.clone();

    for (i, &card) in cards.iter().enumerate() {
        let reveal = Reveal::new(card, timing.reveal_delay(), timing.card_transition());
        page.add_reveal(reveal, timing.stagger_step() * i as u32);
    }

    for &number in numbers {
        let text = page.document().text_content(number);
        match CountUp::from_text(number, &text, timing.count_steps) {
            Some(counter) => page.add_counter(counter),
            None => tracing::debug!("Stat number {:?} is not numeric, leaving it", text),
        }
    }
}

/// Wrap each table in a horizontally scrolling container with a sticky header
pub fn make_tables_responsive(page: &mut Page, tables: &[NodeId]) {
    let guard = page.config().features.guard_double_wrap;
    let doc = page.document_mut();

    for &table in tables {
        let Some(parent) = doc.parent(table) else {
            tracing::debug!("Table {} has no parent, cannot wrap", table.index());
            continue;
        };
        if guard && doc.node(parent).has_class(WRAPPER_CLASS) {
            continue;
        }

        let wrapper = doc.create_element("div");
        doc.node_mut(wrapper).classes.push(WRAPPER_CLASS.to_string());
        doc.set_style(wrapper, "overflow-x", "auto");
        doc.set_style(wrapper, "margin-top", "1rem");
        doc.insert_before(parent, wrapper, Some(table));
        doc.append_child(wrapper, table);

        if let Some(head) = doc.query(table, &Selector::tag("thead")) {
            doc.set_style(head, "position", "sticky");
            doc.set_style(head, "top", "0");
            doc.set_style(head, "z-index", "10");
            doc.set_style(head, "background", HEADER_BACKGROUND);
        }
    }
}

pub fn add_page_load_animation(page: &mut Page, main: Option<NodeId>) {
    let Some(main) = main else {
        return;
    };
    let timing = &page.config().timing;
    let reveal = Reveal::new(main, timing.reveal_delay(), timing.main_transition());
    page.add_reveal_now(reveal);
}

/// Append a search input to `header`; nothing is created without one
pub fn add_search_box(page: &mut Page, header: Option<NodeId>) -> Option<NodeId> {
    let header = header?;
    let placeholder = page.config().labels.search_placeholder.clone();
    let doc = page.document_mut();

    let input = doc.create_element("input");
    {
        let node = doc.node_mut(input);
        node.classes.push(SEARCH_CLASS.to_string());
        node.attrs.insert("type".to_string(), "text".to_string());
        node.attrs.insert("placeholder".to_string(), placeholder);
    }
    for (prop, value) in [
        ("width", "100%"),
        ("max-width", "300px"),
        ("padding", "0.75rem 1rem"),
        ("border", "2px solid #e2e8f0"),
        ("border-radius", "8px"),
        ("font-size", "0.9rem"),
        ("margin-bottom", "1rem"),
        ("transition", "all 0.3s ease"),
    ] {
        doc.set_style(input, prop, value);
    }
    doc.append_child(header, input);

    page.listen(input, EventKind::Focus, Behavior::SearchFocus);
    page.listen(input, EventKind::Blur, Behavior::SearchBlur);
    Some(input)
}

pub(crate) fn search_focus(page: &mut Page, input: NodeId, focused: bool) {
    let doc = page.document_mut();
    if focused {
        doc.set_style(input, "border-color", ACCENT);
        doc.set_style(input, "box-shadow", "0 0 0 3px rgba(102, 126, 234, 0.1)");
    } else {
        doc.set_style(input, "border-color", SEARCH_BORDER);
        doc.set_style(input, "box-shadow", "none");
    }
}

fn checkbox(doc: &mut Document, class: &str) -> NodeId {
    let input = doc.create_element("input");
    let node = doc.node_mut(input);
    node.classes.push(class.to_string());
    node.attrs.insert("type".to_string(), "checkbox".to_string());
    doc.set_style(input, "width", "18px");
    doc.set_style(input, "height", "18px");
    doc.set_style(input, "cursor", "pointer");
    input
}

fn checkbox_cell(doc: &mut Document, tag: &str, class: &str) -> (NodeId, NodeId) {
    let cell = doc.create_element(tag);
    doc.set_style(cell, "width", "40px");
    doc.set_style(cell, "text-align", "center");
    let input = checkbox(doc, class);
    doc.append_child(cell, input);
    (cell, input)
}

/// Prepend a selection checkbox to every row and a select-all box to the header
pub fn add_batch_operations(page: &mut Page, tables: &[NodeId]) {
    for &table in tables {
        let doc = page.document_mut();
        for row in body_rows(doc, table) {
            let (cell, _) = checkbox_cell(doc, "td", ROW_CHECKBOX_CLASS);
            doc.prepend_child(row, cell);
        }

        if let Some(row) = header_row(doc, table) {
            let (cell, select_all) = checkbox_cell(doc, "th", SELECT_ALL_CLASS);
            doc.prepend_child(row, cell);
            page.listen(select_all, EventKind::Change, Behavior::SelectAll { table });
        }
    }
}

pub(crate) fn select_all(page: &mut Page, select_all: NodeId, table: NodeId) {
    let doc = page.document_mut();
    let checked = doc.node(select_all).checked;
    for checkbox in doc.query_all(table, &Selector::class(ROW_CHECKBOX_CLASS)) {
        doc.node_mut(checkbox).checked = checked;
    }
}

pub fn add_keyboard_shortcuts(page: &mut Page) {
    let root = page.document().root();
    page.listen(root, EventKind::KeyDown, Behavior::Shortcuts);
}

pub(crate) fn handle_shortcut(page: &mut Page, event: &mut Event) {
    let combo = match &event.key {
        Some(key) if key.ctrl => key.key.clone(),
        _ => return,
    };

    match combo.as_str() {
        "/" => {
            event.prevent_default();
            show_keyboard_shortcuts(page);
        }
        "s" => {
            event.prevent_default();
            let root = page.document().root();
            if let Some(form) = page.document().query(root, &Selector::tag("form")) {
                page.submit(form);
            }
        }
        _ => {}
    }
}

/// Append the shortcut help overlay; returns (dialog, backdrop)
pub fn show_keyboard_shortcuts(page: &mut Page) -> (NodeId, NodeId) {
    let title = page.config().labels.shortcuts_title.clone();
    let close_label = page.config().labels.shortcuts_close.clone();
    let doc = page.document_mut();
    let root = doc.root();

    let dialog = doc.create_element("div");
    doc.node_mut(dialog).classes.push(SHORTCUTS_DIALOG_CLASS.to_string());
    for (prop, value) in [
        ("position", "fixed"),
        ("top", "50%"),
        ("left", "50%"),
        ("transform", "translate(-50%, -50%)"),
        ("background", "white"),
        ("z-index", "1000"),
        ("max-width", "400px"),
    ] {
        doc.set_style(dialog, prop, value);
    }

    let heading = doc.create_element("h3");
    doc.node_mut(heading).text = title;
    doc.append_child(dialog, heading);

    let list = doc.create_element("div");
    for (combo, description) in SHORTCUTS {
        let entry = doc.create_element("div");
        let key = doc.create_element("span");
        doc.node_mut(key).text = combo.to_string();
        doc.set_style(key, "font-weight", "600");
        doc.set_style(key, "color", ACCENT);
        let text = doc.create_element("span");
        doc.node_mut(text).text = description.to_string();
        doc.append_child(entry, key);
        doc.append_child(entry, text);
        doc.append_child(list, entry);
    }
    doc.append_child(dialog, list);

    let close = doc.create_element("button");
    doc.node_mut(close).text = close_label;
    doc.append_child(dialog, close);

    let backdrop = doc.create_element("div");
    doc.node_mut(backdrop).classes.push(SHORTCUTS_BACKDROP_CLASS.to_string());
    doc.set_style(backdrop, "position", "fixed");
    doc.set_style(backdrop, "background", "rgba(0,0,0,0.5)");
    doc.set_style(backdrop, "z-index", "999");

    doc.append_child(root, dialog);
    doc.append_child(root, backdrop);

    let close_overlay = Behavior::CloseShortcuts { dialog, backdrop };
    page.listen(close, EventKind::Click, close_overlay.clone());
    page.listen(backdrop, EventKind::Click, close_overlay);
    (dialog, backdrop)
}

pub(crate) fn close_shortcuts(page: &mut Page, dialog: NodeId, backdrop: NodeId) {
    let doc = page.document_mut();
    doc.remove(dialog);
    doc.remove(backdrop);
}
