//! In-memory document tree the enhancers operate on
//!
//! Nodes live in an arena and are addressed by `NodeId`. Removing a node only
//! detaches it; handles stay valid so listeners and timers can keep pointing
//! at it.

mod selector;

pub use selector::Selector;

use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Default)]
pub struct Node {
    pub tag: String,
    pub classes: Vec<String>,
    pub attrs: BTreeMap<String, String>,
    pub text: String,                    // Own text, rendered before children
    pub style: BTreeMap<String, String>, // Inline style properties
    pub value: String,                   // Form control value
    pub checked: bool,
    pub disabled: bool,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into().to_ascii_lowercase(),
            ..Default::default()
        }
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    pub fn id(&self) -> Option<&str> {
        self.attr("id")
    }

    pub fn style(&self, prop: &str) -> Option<&str> {
        self.style.get(prop).map(String::as_str)
    }

    /// Value as a form control reports it; checkable inputs default to "on"
    pub fn form_value(&self) -> &str {
        let checkable = self.is("input")
            && matches!(self.attr("type"), Some(t) if t.eq_ignore_ascii_case("checkbox") || t.eq_ignore_ascii_case("radio"));
        if checkable && self.value.is_empty() {
            return self.attr("value").unwrap_or("on");
        }
        &self.value
    }

    pub fn is(&self, tag: &str) -> bool {
        self.tag.eq_ignore_ascii_case(tag)
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Empty document rooted at a `body` element
    pub fn new() -> Self {
        Self::with_root("body")
    }

    pub fn with_root(tag: &str) -> Self {
        Self {
            nodes: vec![Node::new(tag)],
            root: NodeId(0),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    /// Number of nodes ever created, attached or not
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.nodes.push(Node::new(tag));
        NodeId(self.nodes.len() - 1)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).children.first().copied()
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.insert_before(parent, child, None);
    }

    pub fn prepend_child(&mut self, parent: NodeId, child: NodeId) {
        let first = self.first_child(parent);
        self.insert_before(parent, child, first);
    }

    /// Move `child` under `parent`, before `reference` (or last when `None`).
    ///
    /// Refuses moves that would put a node inside its own subtree.
    pub fn insert_before(&mut self, parent: NodeId, child: NodeId, reference: Option<NodeId>) {
        if self.contains(child, parent) {
            tracing::debug!("Refusing to insert node {} into its own subtree", child.0);
            return;
        }
        self.detach(child);

        let position = reference.and_then(|r| self.nodes[parent.0].children.iter().position(|&c| c == r));
        let siblings = &mut self.nodes[parent.0].children;
        match position {
            Some(idx) => siblings.insert(idx, child),
            None => siblings.push(child),
        }
        self.nodes[child.0].parent = Some(parent);
    }

    /// Detach a node (and its subtree) from the tree
    pub fn remove(&mut self, id: NodeId) {
        self.detach(id);
    }

    fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.0].parent.take() {
            self.nodes[parent.0].children.retain(|&c| c != id);
        }
    }

    /// Whether `node` is `ancestor` or lies inside it
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.nodes[id.0].parent;
        }
        false
    }

    pub fn is_attached(&self, id: NodeId) -> bool {
        self.contains(self.root, id)
    }

    /// Attached and not hidden by `display: none` on itself or an ancestor
    pub fn is_rendered(&self, id: NodeId) -> bool {
        if !self.is_attached(id) {
            return false;
        }
        let mut current = Some(id);
        while let Some(n) = current {
            if self.nodes[n.0].style("display") == Some("none") {
                return false;
            }
            current = self.nodes[n.0].parent;
        }
        true
    }

    /// All nodes below `scope` in document order, `scope` excluded
    pub fn descendants(&self, scope: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(scope).iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.children(id).iter().rev().copied());
        }
        out
    }

    pub fn query_all(&self, scope: NodeId, selector: &Selector) -> Vec<NodeId> {
        self.descendants(scope)
            .into_iter()
            .filter(|&id| selector.matches(self.node(id)))
            .collect()
    }

    pub fn query(&self, scope: NodeId, selector: &Selector) -> Option<NodeId> {
        self.descendants(scope)
            .into_iter()
            .find(|&id| selector.matches(self.node(id)))
    }

    /// Nearest inclusive ancestor matching `selector`
    pub fn closest(&self, id: NodeId, selector: &Selector) -> Option<NodeId> {
        let mut current = Some(id);
        while let Some(n) = current {
            if selector.matches(self.node(n)) {
                return Some(n);
            }
            current = self.nodes[n.0].parent;
        }
        None
    }

    /// First attached element carrying the given `id` attribute
    pub fn element_by_id(&self, element_id: &str) -> Option<NodeId> {
        if element_id.is_empty() {
            return None;
        }
        if self.node(self.root).id() == Some(element_id) {
            return Some(self.root);
        }
        self.query(self.root, &Selector::id(element_id))
    }

    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = self.node(id).text.clone();
        for &child in self.children(id) {
            out.push_str(&self.text_content(child));
        }
        out
    }

    /// Replace the whole content of a node with plain text
    pub fn set_text(&mut self, id: NodeId, text: impl Into<String>) {
        let children = std::mem::take(&mut self.nodes[id.0].children);
        for child in children {
            self.nodes[child.0].parent = None;
        }
        self.nodes[id.0].text = text.into();
    }

    pub fn set_style(&mut self, id: NodeId, prop: &str, value: impl Into<String>) {
        self.nodes[id.0].style.insert(prop.to_string(), value.into());
    }

    pub fn style(&self, id: NodeId, prop: &str) -> Option<&str> {
        self.node(id).style(prop)
    }

    /// Number of ancestors between a node and the root
    pub fn depth(&self, id: NodeId) -> usize {
        let mut depth = 0;
        let mut current = self.nodes[id.0].parent;
        while let Some(n) = current {
            depth += 1;
            current = self.nodes[n.0].parent;
        }
        depth
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list_doc() -> (Document, NodeId, Vec<NodeId>) {
        let mut doc = Document::new();
        let ul = doc.create_element("ul");
        doc.append_child(doc.root(), ul);
        let items: Vec<NodeId> = (0..3)
            .map(|i| {
                let li = doc.create_element("li");
                doc.node_mut(li).text = format!("item {}", i);
                doc.append_child(ul, li);
                li
            })
            .collect();
        (doc, ul, items)
    }

    #[test]
    fn test_form_value_defaults_for_checkable_inputs() {
        let mut checkbox = Node::new("input");
        checkbox.attrs.insert("type".to_string(), "checkbox".to_string());
        assert_eq!(checkbox.form_value(), "on");
        checkbox.attrs.insert("value".to_string(), "agree".to_string());
        assert_eq!(checkbox.form_value(), "agree");

        let text = Node::new("input");
        assert_eq!(text.form_value(), "");
    }

    #[test]
    fn test_insert_before_moves_node() {
        let (mut doc, ul, items) = list_doc();

        doc.insert_before(ul, items[2], Some(items[0]));
        assert_eq!(doc.children(ul), &[items[2], items[0], items[1]]);

        // Moving to a new parent detaches from the old one
        let div = doc.create_element("div");
        doc.append_child(doc.root(), div);
        doc.append_child(div, items[0]);
        assert_eq!(doc.children(ul), &[items[2], items[1]]);
        assert_eq!(doc.parent(items[0]), Some(div));
    }

    #[test]
    fn test_insert_into_own_subtree_is_refused() {
        let (mut doc, ul, items) = list_doc();
        doc.append_child(items[0], ul);
        assert_eq!(doc.parent(ul), Some(doc.root()));
    }

    #[test]
    fn test_queries_and_closest() {
        let (mut doc, ul, items) = list_doc();
        doc.node_mut(items[1]).classes.push("hot".to_string());
        doc.node_mut(items[1]).attrs.insert("id".to_string(), "second".to_string());

        assert_eq!(doc.query_all(doc.root(), &Selector::tag("li")), items);
        assert_eq!(doc.query(doc.root(), &Selector::class("hot")), Some(items[1]));
        assert_eq!(doc.closest(items[1], &Selector::tag("ul")), Some(ul));
        assert_eq!(doc.closest(items[1], &Selector::tag("form")), None);
        assert_eq!(doc.element_by_id("second"), Some(items[1]));
        assert_eq!(doc.element_by_id(""), None);

        doc.remove(ul);
        assert!(!doc.is_attached(items[1]));
        assert_eq!(doc.element_by_id("second"), None);
    }

    #[test]
    fn test_text_content_and_set_text() {
        let (mut doc, ul, _) = list_doc();
        assert_eq!(doc.text_content(ul), "item 0item 1item 2");

        doc.set_text(ul, "gone");
        assert!(doc.children(ul).is_empty());
        assert_eq!(doc.text_content(ul), "gone");
    }

    #[test]
    fn test_rendered_respects_ancestor_display() {
        let (mut doc, ul, items) = list_doc();
        assert!(doc.is_rendered(items[0]));

        doc.set_style(ul, "display", "none");
        assert!(!doc.is_rendered(items[0]));

        doc.set_style(ul, "display", "block");
        assert!(doc.is_rendered(items[0]));
    }
}
