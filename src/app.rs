use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::time::{Duration, Instant};

use veneer::dom::NodeId;
use veneer::page::{EventKind, KeyPress};
use veneer::{Page, ScriptedHost};

/// How long a status message stays in the info line
const STATUS_TIMEOUT: Duration = Duration::from_secs(3);

/// Tags a user can land on even without a listener attached
const CONTROL_TAGS: [&str; 5] = ["a", "button", "input", "textarea", "select"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Popup {
    None,
    Confirm, // Page asked for a delete confirmation
    Alert,   // Page raised a blocking notification
    Edit,    // Typing into a text control
    Help,
}

pub struct App {
    pub page: Page,
    pub popup: Popup,

    // Cursor over interactive nodes; the mouse pointer follows it
    pub selected: usize,
    pub hovered: Option<NodeId>,

    // Confirm popup state
    pub pending_click: Option<NodeId>,
    pub confirm_message: String,

    // Alert popup
    pub alert_message: String,

    // Edit popup
    pub editing: Option<NodeId>,
    pub input_buffer: String,

    // Status message (shown in info line, auto-clears after timeout)
    pub status_message: Option<String>,
    pub status_message_time: Option<Instant>,

    // Clock
    pub paused: bool,
    last_tick: Instant,

    notifications: bool,
}

impl App {
    pub fn new(page: Page) -> Self {
        let notifications = page.config().features.notifications;
        Self {
            page,
            popup: Popup::None,
            selected: 0,
            hovered: None,
            pending_click: None,
            confirm_message: String::new(),
            alert_message: String::new(),
            editing: None,
            input_buffer: String::new(),
            status_message: None,
            status_message_time: None,
            paused: false,
            last_tick: Instant::now(),
            notifications,
        }
    }

    /// Set a status message (auto-clears after 3 seconds)
    fn set_status(&mut self, msg: impl Into<String>) {
        self.status_message = Some(msg.into());
        self.status_message_time = Some(Instant::now());
    }

    /// Rendered nodes in document order with their depth, root first
    pub fn tree_lines(&self) -> Vec<(NodeId, usize)> {
        let doc = self.page.document();
        let root = doc.root();
        std::iter::once(root)
            .chain(doc.descendants(root))
            .filter(|&id| doc.is_rendered(id))
            .map(|id| (id, doc.depth(id)))
            .collect()
    }

    /// Nodes the cursor can stop on
    pub fn interactive(&self) -> Vec<NodeId> {
        let doc = self.page.document();
        let root = doc.root();
        doc.descendants(root)
            .into_iter()
            .filter(|&id| doc.is_rendered(id))
            .filter(|&id| {
                let node = doc.node(id);
                CONTROL_TAGS.iter().any(|t| node.is(t))
                    || self
                        .page
                        .listeners_on(id)
                        .any(|l| matches!(l.kind, EventKind::Click | EventKind::MouseEnter | EventKind::Change))
            })
            .collect()
    }

    pub fn selected_node(&self) -> Option<NodeId> {
        self.interactive().get(self.selected).copied()
    }

    /// Feed elapsed wall-clock time into the page
    pub fn tick(&mut self) {
        let elapsed = self.last_tick.elapsed();
        self.last_tick = Instant::now();
        if !self.paused {
            self.page.advance(elapsed);
        }

        if let Some(since) = self.status_message_time {
            if since.elapsed() > STATUS_TIMEOUT {
                self.status_message = None;
                self.status_message_time = None;
            }
        }

        // Nodes come and go as the page changes
        let count = self.interactive().len();
        if count == 0 {
            self.selected = 0;
        } else if self.selected >= count {
            self.selected = count - 1;
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        // Handle popups first
        if self.popup != Popup::None {
            return self.handle_popup_key(key);
        }

        // Page shortcuts
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            if let KeyCode::Char(c) = key.code {
                let mut host = ScriptedHost::declining();
                if !self.page.key_down(KeyPress::ctrl(c.to_string()), &mut host) {
                    self.set_status(format!("Ctrl+{} handled by page", c));
                }
                self.apply_host(host);
            }
            return Ok(());
        }

        match key.code {
            KeyCode::Char('j') | KeyCode::Down => self.move_selection(1),
            KeyCode::Char('k') | KeyCode::Up => self.move_selection(-1),
            KeyCode::Char(' ') | KeyCode::Enter => self.activate(),
            KeyCode::Char('s') => self.submit_selected_form(),
            KeyCode::Char('p') => {
                self.paused = !self.paused;
                self.set_status(if self.paused { "Clock paused" } else { "Clock running" });
            }
            KeyCode::Char('?') | KeyCode::Char('h') => self.popup = Popup::Help,
            _ => {}
        }
        Ok(())
    }

    fn handle_popup_key(&mut self, key: KeyEvent) -> Result<()> {
        match self.popup {
            Popup::Confirm => match key.code {
                KeyCode::Char('y') | KeyCode::Enter => self.answer_confirm(true),
                KeyCode::Char('n') | KeyCode::Esc => self.answer_confirm(false),
                _ => {}
            },
            Popup::Alert | Popup::Help => {
                if matches!(key.code, KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q') | KeyCode::Char('?')) {
                    self.popup = Popup::None;
                }
            }
            Popup::Edit => match key.code {
                KeyCode::Enter => self.finish_edit(true),
                KeyCode::Esc => self.finish_edit(false),
                KeyCode::Backspace => {
                    self.input_buffer.pop();
                }
                KeyCode::Char(c) => self.input_buffer.push(c),
                _ => {}
            },
            Popup::None => {}
        }
        Ok(())
    }

    fn move_selection(&mut self, delta: isize) {
        let count = self.interactive().len();
        if count == 0 {
            return;
        }
        self.selected = (self.selected as isize + delta).rem_euclid(count as isize) as usize;
        self.update_hover();
    }

    /// Pointer leaves the old node and enters the newly selected one
    fn update_hover(&mut self) {
        let target = self.selected_node();
        if target == self.hovered {
            return;
        }
        let mut host = ScriptedHost::declining();
        if let Some(old) = self.hovered {
            self.page.hover(old, false, &mut host);
        }
        if let Some(new) = target {
            self.page.hover(new, true, &mut host);
        }
        self.hovered = target;
    }

    fn activate(&mut self) {
        let Some(node) = self.selected_node() else {
            return;
        };
        let doc = self.page.document();
        let element = doc.node(node);

        if element.is("input") && element.attr("type") == Some("checkbox") {
            let mut host = ScriptedHost::declining();
            self.page.toggle_checkbox(node, &mut host);
            self.apply_host(host);
        } else if element.is("input") || element.is("textarea") {
            self.input_buffer = element.value.clone();
            self.editing = Some(node);
            self.popup = Popup::Edit;
            let mut host = ScriptedHost::declining();
            self.page.focus(node, true, &mut host);
        } else if let Some(message) = self.page.confirmation_message(node).filter(|_| !element.disabled) {
            self.confirm_message = message;
            self.pending_click = Some(node);
            self.popup = Popup::Confirm;
        } else {
            let mut host = ScriptedHost::declining();
            self.page.click(node, &mut host);
            self.apply_host(host);
        }
    }

    fn answer_confirm(&mut self, accepted: bool) {
        self.popup = Popup::None;
        let Some(node) = self.pending_click.take() else {
            return;
        };
        // Replay the click with the user's answer scripted in
        let mut host = ScriptedHost::with_answers([accepted]);
        self.page.click(node, &mut host);
        self.apply_host(host);
        self.set_status(if accepted { "Confirmed" } else { "Cancelled" });
    }

    fn finish_edit(&mut self, commit: bool) {
        self.popup = Popup::None;
        let Some(node) = self.editing.take() else {
            return;
        };
        if commit {
            let value = std::mem::take(&mut self.input_buffer);
            self.page.set_value(node, value);
        }
        let mut host = ScriptedHost::declining();
        self.page.focus(node, false, &mut host);
    }

    fn submit_selected_form(&mut self) {
        let Some(form) = self.selected_node().and_then(|n| self.page.enclosing_form(n)) else {
            self.set_status("Selection is not inside a form");
            return;
        };
        let mut host = ScriptedHost::declining();
        if self.page.submit_by_user(form, &mut host) {
            self.set_status(format!("Form {} submitted", form.index()));
        }
        self.apply_host(host);
    }

    /// Surface what the page asked of its host
    fn apply_host(&mut self, host: ScriptedHost) {
        if let Some((target, _)) = host.scrolls.last() {
            match self.interactive().iter().position(|n| n == target) {
                Some(idx) => self.selected = idx,
                None => self.set_status(format!("Scrolled to node {}", target.index())),
            }
        }

        if let Some(message) = host.alerts.last() {
            self.alert_message = message.clone();
            self.popup = Popup::Alert;
            if self.notifications {
                if let Err(e) = notify("veneer", message) {
                    tracing::warn!("Desktop notification failed: {}", e);
                }
            }
        }
    }

    /// Whether any listener on the node reacts to hover (used to tag rows)
    pub fn is_hoverable(&self, node: NodeId) -> bool {
        self.page.has_listener(node, EventKind::MouseEnter)
    }
}

fn notify(summary: &str, body: &str) -> Result<()> {
    notify_rust::Notification::new()
        .summary(summary)
        .body(body)
        .icon("dialog-warning")
        .show()?;
    Ok(())
}
