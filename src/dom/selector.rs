use super::Node;

/// Typed element matcher used to hand nodes to the enhancers.
///
/// Only the handful of forms the enhancers need; structural relations such
/// as "rows inside this table's body" are expressed by scoping queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    Tag(String),
    Class(String),
    Id(String),
    HasAttr(String),
    AttrPrefix { name: String, prefix: String },
    All(Vec<Selector>),
    Any(Vec<Selector>),
}

impl Selector {
    pub fn tag(tag: impl Into<String>) -> Self {
        Selector::Tag(tag.into())
    }

    pub fn class(class: impl Into<String>) -> Self {
        Selector::Class(class.into())
    }

    pub fn id(id: impl Into<String>) -> Self {
        Selector::Id(id.into())
    }

    pub fn has_attr(name: impl Into<String>) -> Self {
        Selector::HasAttr(name.into())
    }

    pub fn attr_prefix(name: impl Into<String>, prefix: impl Into<String>) -> Self {
        Selector::AttrPrefix {
            name: name.into(),
            prefix: prefix.into(),
        }
    }

    /// Both this selector and `other` must match
    pub fn and(self, other: Selector) -> Self {
        match self {
            Selector::All(mut parts) => {
                parts.push(other);
                Selector::All(parts)
            }
            first => Selector::All(vec![first, other]),
        }
    }

    pub fn matches(&self, node: &Node) -> bool {
        match self {
            Selector::Tag(tag) => node.tag.eq_ignore_ascii_case(tag),
            Selector::Class(class) => node.has_class(class),
            Selector::Id(id) => node.id() == Some(id.as_str()),
            Selector::HasAttr(name) => node.attrs.contains_key(name),
            Selector::AttrPrefix { name, prefix } => node
                .attr(name)
                .map(|v| v.starts_with(prefix.as_str()))
                .unwrap_or(false),
            Selector::All(parts) => parts.iter().all(|s| s.matches(node)),
            Selector::Any(parts) => parts.iter().any(|s| s.matches(node)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compound_selector() {
        let mut node = Node::new("A");
        node.attrs.insert("href".to_string(), "#top".to_string());
        node.classes.push("nav-link".to_string());

        assert!(Selector::tag("a").matches(&node));
        assert!(Selector::attr_prefix("href", "#").matches(&node));
        assert!(Selector::tag("a")
            .and(Selector::class("nav-link"))
            .and(Selector::has_attr("href"))
            .matches(&node));
        assert!(!Selector::tag("a").and(Selector::class("btn")).matches(&node));
        assert!(Selector::Any(vec![Selector::tag("input"), Selector::tag("a")]).matches(&node));
    }
}
