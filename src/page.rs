//! A loaded page: document, attached listeners and the timers driving them
//!
//! Enhancers attach `Behavior`s to nodes through `Page::listen` and queue
//! `Task`s on the page scheduler. User input arrives as `Event`s through
//! `Page::dispatch`; anything that needs the outside world (confirm dialogs,
//! alerts, scrolling) goes through the `Host` passed alongside.

use std::collections::VecDeque;
use std::time::Duration;

use crate::animation::{CountStep, CountUp, Reveal};
use crate::config::EnhancerConfig;
use crate::dom::{Document, NodeId, Selector};
use crate::scheduler::Scheduler;
use crate::{admin, public};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Click,
    MouseEnter,
    MouseLeave,
    Focus,
    Blur,
    Change,
    Submit,
    KeyDown,
}

impl EventKind {
    /// Pointer enter/leave and focus changes stay on their target
    pub fn bubbles(self) -> bool {
        matches!(self, Self::Click | Self::Change | Self::Submit | Self::KeyDown)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPress {
    pub key: String,
    pub ctrl: bool,
}

impl KeyPress {
    pub fn ctrl(key: impl Into<String>) -> Self {
        Self { key: key.into(), ctrl: true }
    }

    pub fn plain(key: impl Into<String>) -> Self {
        Self { key: key.into(), ctrl: false }
    }
}

#[derive(Debug, Clone)]
pub struct Event {
    pub kind: EventKind,
    pub target: NodeId,
    pub key: Option<KeyPress>,
    default_prevented: bool,
}

impl Event {
    pub fn new(kind: EventKind, target: NodeId) -> Self {
        Self {
            kind,
            target,
            key: None,
            default_prevented: false,
        }
    }

    pub fn key_down(target: NodeId, key: KeyPress) -> Self {
        Self {
            key: Some(key),
            ..Self::new(EventKind::KeyDown, target)
        }
    }

    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn is_default_prevented(&self) -> bool {
        self.default_prevented
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollBehavior {
    Smooth,
    Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollBlock {
    Start,
    Center,
    End,
    Nearest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollOptions {
    pub behavior: ScrollBehavior,
    pub block: ScrollBlock,
}

/// Side effects that leave the document
pub trait Host {
    /// Blocking yes/no question; `true` means the user accepted
    fn confirm(&mut self, message: &str) -> bool;

    /// Blocking notification
    fn alert(&mut self, message: &str);

    fn scroll_into_view(&mut self, target: NodeId, options: ScrollOptions);
}

/// Host with pre-decided confirm answers that records everything it is asked
#[derive(Debug, Default)]
pub struct ScriptedHost {
    answers: VecDeque<bool>,
    fallback: bool, // Answer once the scripted ones run out
    pub confirms: Vec<String>,
    pub alerts: Vec<String>,
    pub scrolls: Vec<(NodeId, ScrollOptions)>,
}

impl ScriptedHost {
    pub fn accepting() -> Self {
        Self {
            fallback: true,
            ..Default::default()
        }
    }

    pub fn declining() -> Self {
        Self::default()
    }

    pub fn with_answers(answers: impl IntoIterator<Item = bool>) -> Self {
        Self {
            answers: answers.into_iter().collect(),
            ..Default::default()
        }
    }
}

impl Host for ScriptedHost {
    fn confirm(&mut self, message: &str) -> bool {
        self.confirms.push(message.to_string());
        self.answers.pop_front().unwrap_or(self.fallback)
    }

    fn alert(&mut self, message: &str) {
        self.alerts.push(message.to_string());
    }

    fn scroll_into_view(&mut self, target: NodeId, options: ScrollOptions) {
        self.scrolls.push((target, options));
    }
}

/// What a listener does when its event fires
#[derive(Debug, Clone, PartialEq)]
pub enum Behavior {
    RowHoverIn,
    RowHoverOut,
    ConfirmDelete,
    SearchFocus,
    SearchBlur,
    SelectAll { table: NodeId },
    Shortcuts,
    CloseShortcuts { dialog: NodeId, backdrop: NodeId },
    ValidateRequired,
    SmoothScroll,
    ToggleComments { list: NodeId, form: NodeId, open: bool },
}

#[derive(Debug, Clone)]
pub struct Listener {
    pub node: NodeId,
    pub kind: EventKind,
    pub behavior: Behavior,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    SubmitForm(NodeId),
    RevealStep(usize), // Index into the page's reveals
    CountTick(usize),  // Index into the page's counters
    InitAdvanced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitSource {
    User,   // Submit event fired and not cancelled
    Script, // Programmatic, bypasses submit listeners
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Submission {
    pub form: NodeId,
    pub at: Duration,
    pub source: SubmitSource,
}

pub struct Page {
    doc: Document,
    config: EnhancerConfig,
    listeners: Vec<Listener>,
    scheduler: Scheduler<Task>,
    reveals: Vec<Reveal>,
    counters: Vec<CountUp>,
    submissions: Vec<Submission>,
}

impl Page {
    pub fn new(doc: Document, config: EnhancerConfig) -> Self {
        Self {
            doc,
            config,
            listeners: Vec::new(),
            scheduler: Scheduler::new(),
            reveals: Vec::new(),
            counters: Vec::new(),
            submissions: Vec::new(),
        }
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.doc
    }

    pub fn config(&self) -> &EnhancerConfig {
        &self.config
    }

    /// Virtual time since page load
    pub fn now(&self) -> Duration {
        self.scheduler.now()
    }

    pub fn pending_tasks(&self) -> usize {
        self.scheduler.pending()
    }

    pub fn next_due(&self) -> Option<Duration> {
        self.scheduler.next_due()
    }

    pub fn submissions(&self) -> &[Submission] {
        &self.submissions
    }

    pub fn reveals(&self) -> &[Reveal] {
        &self.reveals
    }

    pub fn counters(&self) -> &[CountUp] {
        &self.counters
    }

    pub fn listen(&mut self, node: NodeId, kind: EventKind, behavior: Behavior) {
        self.listeners.push(Listener { node, kind, behavior });
    }

    pub fn listeners_on(&self, node: NodeId) -> impl Iterator<Item = &Listener> {
        self.listeners.iter().filter(move |l| l.node == node)
    }

    pub fn has_listener(&self, node: NodeId, kind: EventKind) -> bool {
        self.listeners_on(node).any(|l| l.kind == kind)
    }

    /// Message a click on `node` would ask the user to confirm, if any
    pub fn confirmation_message(&self, node: NodeId) -> Option<String> {
        self.listeners_on(node)
            .any(|l| l.kind == EventKind::Click && l.behavior == Behavior::ConfirmDelete)
            .then(|| admin::confirm_message(&self.doc, node, &self.config.markers.confirm_attr))
    }

    pub fn schedule(&mut self, delay: Duration, task: Task) {
        self.scheduler.schedule(delay, task);
    }

    /// Register a reveal whose first step runs after `start`
    pub fn add_reveal(&mut self, reveal: Reveal, start: Duration) {
        self.reveals.push(reveal);
        let idx = self.reveals.len() - 1;
        self.schedule(start, Task::RevealStep(idx));
    }

    /// Register a reveal and apply its hidden state right away
    pub fn add_reveal_now(&mut self, mut reveal: Reveal) {
        let next = reveal.step(&mut self.doc);
        self.reveals.push(reveal);
        let idx = self.reveals.len() - 1;
        if let Some(delay) = next {
            self.schedule(delay, Task::RevealStep(idx));
        }
    }

    pub fn add_counter(&mut self, counter: CountUp) {
        self.counters.push(counter);
        let idx = self.counters.len() - 1;
        let interval = self.config.timing.count_interval();
        self.schedule(interval, Task::CountTick(idx));
    }

    /// Deliver an event to listeners on the target and its ancestors.
    ///
    /// Returns `false` when a listener cancelled the default action.
    pub fn dispatch(&mut self, mut event: Event, host: &mut dyn Host) -> bool {
        if event.kind == EventKind::Click && self.doc.node(event.target).disabled {
            return true;
        }

        let mut path = Vec::new();
        let mut current = Some(event.target);
        while let Some(id) = current {
            path.push(id);
            current = if event.kind.bubbles() { self.doc.parent(id) } else { None };
        }

        for node in path {
            let matching: Vec<usize> = self
                .listeners
                .iter()
                .enumerate()
                .filter(|(_, l)| l.node == node && l.kind == event.kind)
                .map(|(idx, _)| idx)
                .collect();
            for idx in matching {
                self.run_listener(idx, &mut event, host);
            }
        }

        !event.is_default_prevented()
    }

    fn run_listener(&mut self, idx: usize, event: &mut Event, host: &mut dyn Host) {
        if let Behavior::ToggleComments { open, .. } = &mut self.listeners[idx].behavior {
            *open = !*open;
        }
        let node = self.listeners[idx].node;
        let behavior = self.listeners[idx].behavior.clone();
        tracing::debug!("{:?} on node {} -> {:?}", event.kind, node.index(), behavior);

        match behavior {
            Behavior::RowHoverIn => admin::row_hover(self, node, true),
            Behavior::RowHoverOut => admin::row_hover(self, node, false),
            Behavior::ConfirmDelete => admin::confirm_delete(self, node, event, host),
            Behavior::SearchFocus => admin::search_focus(self, node, true),
            Behavior::SearchBlur => admin::search_focus(self, node, false),
            Behavior::SelectAll { table } => admin::select_all(self, node, table),
            Behavior::Shortcuts => admin::handle_shortcut(self, event),
            Behavior::CloseShortcuts { dialog, backdrop } => admin::close_shortcuts(self, dialog, backdrop),
            Behavior::ValidateRequired => public::validate_form(self, node, event, host),
            Behavior::SmoothScroll => public::smooth_scroll(self, node, event, host),
            Behavior::ToggleComments { list, form, open } => public::set_comments_open(self, list, form, open),
        }
    }

    pub fn click(&mut self, node: NodeId, host: &mut dyn Host) -> bool {
        self.dispatch(Event::new(EventKind::Click, node), host)
    }

    pub fn hover(&mut self, node: NodeId, entering: bool, host: &mut dyn Host) {
        let kind = if entering { EventKind::MouseEnter } else { EventKind::MouseLeave };
        self.dispatch(Event::new(kind, node), host);
    }

    pub fn focus(&mut self, node: NodeId, focused: bool, host: &mut dyn Host) {
        let kind = if focused { EventKind::Focus } else { EventKind::Blur };
        self.dispatch(Event::new(kind, node), host);
    }

    /// Flip a checkbox the way a user click would, then fire `change`
    pub fn toggle_checkbox(&mut self, node: NodeId, host: &mut dyn Host) {
        if self.doc.node(node).disabled {
            return;
        }
        let checked = &mut self.doc.node_mut(node).checked;
        *checked = !*checked;
        self.dispatch(Event::new(EventKind::Change, node), host);
    }

    pub fn set_value(&mut self, node: NodeId, value: impl Into<String>) {
        self.doc.node_mut(node).value = value.into();
    }

    pub fn key_down(&mut self, key: KeyPress, host: &mut dyn Host) -> bool {
        let root = self.doc.root();
        self.dispatch(Event::key_down(root, key), host)
    }

    /// User-initiated submission: fires `submit`, records it unless cancelled
    pub fn submit_by_user(&mut self, form: NodeId, host: &mut dyn Host) -> bool {
        let proceed = self.dispatch(Event::new(EventKind::Submit, form), host);
        if proceed {
            self.record_submission(form, SubmitSource::User);
        }
        proceed
    }

    /// Script submission; no submit listeners run
    pub fn submit(&mut self, form: NodeId) {
        self.record_submission(form, SubmitSource::Script);
    }

    fn record_submission(&mut self, form: NodeId, source: SubmitSource) {
        let at = self.now();
        tracing::info!("Form {} submitted ({:?}) at {:?}", form.index(), source, at);
        self.submissions.push(Submission { form, at, source });
    }

    /// The form a control belongs to, if any
    pub fn enclosing_form(&self, node: NodeId) -> Option<NodeId> {
        self.doc.closest(node, &Selector::tag("form"))
    }

    /// Run every task falling due in the next `by` of virtual time
    pub fn advance(&mut self, by: Duration) {
        let until = self.scheduler.now() + by;
        while let Some(task) = self.scheduler.pop_due(until) {
            self.run_task(task);
        }
        self.scheduler.advance_to(until);
    }

    /// Advance until no task is queued, giving up past `cap`; returns whether idle
    pub fn run_until_idle(&mut self, cap: Duration) -> bool {
        let deadline = self.now() + cap;
        while let Some(due) = self.scheduler.next_due() {
            if due > deadline {
                return false;
            }
            let by = due.saturating_sub(self.now());
            self.advance(by);
        }
        true
    }

    fn run_task(&mut self, task: Task) {
        match task {
            Task::SubmitForm(form) => self.submit(form),
            Task::RevealStep(idx) => {
                if let Some(delay) = self.reveals[idx].step(&mut self.doc) {
                    self.schedule(delay, Task::RevealStep(idx));
                }
            }
            Task::CountTick(idx) => {
                let target = self.counters[idx].target;
                match self.counters[idx].tick() {
                    CountStep::Running(value) => {
                        self.doc.set_text(target, value.to_string());
                        let interval = self.config.timing.count_interval();
                        self.schedule(interval, Task::CountTick(idx));
                    }
                    CountStep::Finished(value) => self.doc.set_text(target, value.to_string()),
                }
            }
            Task::InitAdvanced => admin::init_advanced(self),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_dispatch_bubbles_to_ancestors() {
        let mut doc = Document::new();
        let section = doc.create_element("div");
        let heading = doc.create_element("h5");
        let list = doc.create_element("ul");
        let form = doc.create_element("form");
        for child in [heading, list, form] {
            doc.append_child(section, child);
        }
        doc.append_child(doc.root(), section);

        let mut page = Page::new(doc, EnhancerConfig::default());
        page.listen(section, EventKind::Click, Behavior::ToggleComments { list, form, open: true });

        let mut host = ScriptedHost::declining();
        page.click(heading, &mut host);
        assert_eq!(page.document().style(list, "display"), Some("none"));
    }

    #[test]
    fn test_hover_and_focus_stay_on_target() {
        let mut doc = Document::new();
        let row = doc.create_element("tr");
        let cell = doc.create_element("td");
        doc.append_child(row, cell);
        doc.append_child(doc.root(), row);

        let mut page = Page::new(doc, EnhancerConfig::default());
        page.listen(row, EventKind::MouseEnter, Behavior::RowHoverIn);
        page.listen(row, EventKind::Focus, Behavior::SearchFocus);

        let mut host = ScriptedHost::declining();
        page.hover(cell, true, &mut host);
        page.focus(cell, true, &mut host);
        assert_eq!(page.document().style(row, "transform"), None);
        assert_eq!(page.document().style(row, "border-color"), None);

        page.hover(row, true, &mut host);
        assert!(page.document().style(row, "transform").is_some());
    }

    #[test]
    fn test_disabled_target_receives_no_clicks() {
        let mut doc = Document::new();
        let button = doc.create_element("button");
        doc.append_child(doc.root(), button);
        doc.node_mut(button).disabled = true;

        let mut page = Page::new(doc, EnhancerConfig::default());
        page.listen(button, EventKind::Click, Behavior::ConfirmDelete);

        let mut host = ScriptedHost::accepting();
        assert!(page.click(button, &mut host));
        assert!(host.confirms.is_empty());
    }

    #[test]
    fn test_counter_task_rearms_until_goal() {
        let mut doc = Document::new();
        let number = doc.create_element("span");
        doc.append_child(doc.root(), number);
        doc.node_mut(number).text = "137".to_string();

        let mut page = Page::new(doc, EnhancerConfig::default());
        let counter = CountUp::from_text(number, "137", 20).unwrap();
        page.add_counter(counter);

        page.advance(ms(50));
        assert_eq!(page.document().text_content(number), "7");
        page.advance(ms(50));
        assert_eq!(page.document().text_content(number), "14");

        assert!(page.run_until_idle(ms(10_000)));
        assert_eq!(page.document().text_content(number), "137");
        assert_eq!(page.counters()[0].ticks(), 20);
        assert_eq!(page.now(), ms(1000));
    }

    #[test]
    fn test_run_until_idle_gives_up_past_cap() {
        let mut page = Page::new(Document::new(), EnhancerConfig::default());
        let form = page.document().root();
        page.schedule(ms(500), Task::SubmitForm(form));

        assert!(!page.run_until_idle(ms(100)));
        assert!(page.submissions().is_empty());
        assert!(page.run_until_idle(ms(1000)));
        assert_eq!(page.submissions()[0].at, ms(500));
    }
}
