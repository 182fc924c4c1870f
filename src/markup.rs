//! JSON description of server-rendered markup
//!
//! The rendering layer is out of scope, so pages come in as a JSON tree:
//!
//! ```json
//! { "tag": "body", "children": [
//!     { "tag": "table", "class": "admin-table", "children": [] }
//! ] }
//! ```
//!
//! `snapshot` writes the same shape back out, including inline style and
//! control state, so enhanced pages can be inspected.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::dom::{Document, NodeId};
use crate::error::{Error, Result};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarkupNode {
    pub tag: String,

    /// Space-separated class list
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub class: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attrs: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub text: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub value: String,

    #[serde(default, skip_serializing_if = "is_false")]
    pub checked: bool,

    #[serde(default, skip_serializing_if = "is_false")]
    pub disabled: bool,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub style: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<MarkupNode>,
}

fn is_false(b: &bool) -> bool {
    !*b
}

/// Parse a JSON page description into a document
pub fn parse(json: &str) -> Result<Document> {
    let root: MarkupNode = serde_json::from_str(json)?;
    build(&root)
}

pub fn load(path: &Path) -> Result<Document> {
    let content = std::fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse(&content)
}

pub fn build(root: &MarkupNode) -> Result<Document> {
    let mut doc = Document::with_root(checked_tag(root)?);
    let root_id = doc.root();
    fill(&mut doc, root_id, root);
    for child in &root.children {
        build_into(&mut doc, root_id, child)?;
    }
    Ok(doc)
}

fn checked_tag(node: &MarkupNode) -> Result<&str> {
    let tag = node.tag.trim();
    if tag.is_empty() || tag.contains(char::is_whitespace) {
        return Err(Error::Invalid(format!("invalid tag name {:?}", node.tag)));
    }
    Ok(tag)
}

fn build_into(doc: &mut Document, parent: NodeId, markup: &MarkupNode) -> Result<()> {
    let id = doc.create_element(checked_tag(markup)?);
    fill(doc, id, markup);
    doc.append_child(parent, id);
    for child in &markup.children {
        build_into(doc, id, child)?;
    }
    Ok(())
}

fn fill(doc: &mut Document, id: NodeId, markup: &MarkupNode) {
    let node = doc.node_mut(id);
    node.classes = markup.class.split_whitespace().map(str::to_string).collect();
    node.attrs = markup.attrs.clone();
    if let Some(element_id) = &markup.id {
        node.attrs.insert("id".to_string(), element_id.clone());
    }
    node.text = markup.text.clone();
    node.value = markup.value.clone();
    node.checked = markup.checked;
    node.disabled = markup.disabled;
    node.style = markup.style.clone();
}

/// Serializable copy of the attached tree as it stands now
pub fn snapshot(doc: &Document) -> MarkupNode {
    snapshot_node(doc, doc.root())
}

pub fn snapshot_node(doc: &Document, id: NodeId) -> MarkupNode {
    let node = doc.node(id);
    let mut attrs = node.attrs.clone();
    let element_id = attrs.remove("id");

    MarkupNode {
        tag: node.tag.clone(),
        class: node.classes.join(" "),
        id: element_id,
        attrs,
        text: node.text.clone(),
        value: node.value.clone(),
        checked: node.checked,
        disabled: node.disabled,
        style: node.style.clone(),
        children: doc.children(id).iter().map(|&c| snapshot_node(doc, c)).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Selector;

    const PAGE: &str = r#"{
        "tag": "body",
        "children": [
            { "tag": "main", "class": "admin-main wide", "children": [
                { "tag": "span", "class": "stat-number", "text": "42" },
                { "tag": "form", "id": "delete-7", "attrs": { "method": "post" }, "children": [
                    { "tag": "input", "attrs": { "required": "" }, "value": "x" }
                ] }
            ] }
        ]
    }"#;

    #[test]
    fn test_parse_builds_tree() {
        let doc = parse(PAGE).unwrap();
        let root = doc.root();

        let main = doc.query(root, &Selector::class("admin-main")).unwrap();
        assert!(doc.node(main).has_class("wide"));

        let form = doc.element_by_id("delete-7").unwrap();
        assert_eq!(doc.parent(form), Some(main));
        assert_eq!(doc.node(form).attr("method"), Some("post"));

        let input = doc.query(form, &Selector::tag("input")).unwrap();
        assert_eq!(doc.node(input).value, "x");
        assert_eq!(doc.text_content(main), "42");
    }

    #[test]
    fn test_snapshot_reflects_changes() {
        let mut doc = parse(PAGE).unwrap();
        let number = doc.query(doc.root(), &Selector::class("stat-number")).unwrap();
        doc.set_style(number, "opacity", "0");

        let snap = snapshot(&doc);
        let main = &snap.children[0];
        assert_eq!(main.class, "admin-main wide");
        assert_eq!(main.children[0].style.get("opacity").map(String::as_str), Some("0"));
        assert_eq!(main.children[1].id.as_deref(), Some("delete-7"));

        // Snapshots load back into an equivalent tree
        let again = build(&snap).unwrap();
        assert_eq!(snapshot(&again), snap);
    }

    #[test]
    fn test_rejects_bad_markup() {
        assert!(matches!(parse("{ \"tag\": "), Err(Error::Markup(_))));
        assert!(matches!(parse(r#"{ "tag": "" }"#), Err(Error::Invalid(_))));
        assert!(matches!(
            parse(r#"{ "tag": "body", "children": [{ "tag": "two words" }] }"#),
            Err(Error::Invalid(_))
        ));
    }
}
