//! The [`Document`] capability trait.

use crate::error::DomError;
use crate::selector::Selector;

/// Opaque handle to a node in a [`Document`].
///
/// Handles are only meaningful for the document that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

/// Nodes added to the connected tree since the last drain.
///
/// Only subtree roots are listed. Observers that care about nested content
/// must look inside each added node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MutationBatch {
    /// Roots of the inserted subtrees, in insertion order.
    pub added: Vec<NodeId>,
}

impl MutationBatch {
    /// Create a batch from added node roots.
    #[must_use]
    pub fn new(added: Vec<NodeId>) -> Self {
        Self { added }
    }

    /// Whether the batch carries no added nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty()
    }
}

/// Document tree with attributes, text, and structural queries.
///
/// Implementors provide the primitive accessors and mutations; selector
/// matching, class lists, inline styles, and connectivity checks are derived
/// from them.
pub trait Document {
    /// Root element of the document (`<html>`).
    fn document_element(&self) -> NodeId;

    /// Parent of a node, `None` for the root and for detached nodes.
    fn parent(&self, node: NodeId) -> Option<NodeId>;

    /// Children of a node in document order.
    fn children(&self, node: NodeId) -> Vec<NodeId>;

    /// Lowercase tag name, `None` for text and markup nodes.
    fn tag_name(&self, node: NodeId) -> Option<&str>;

    /// Character data of a text node, `None` for everything else.
    fn text(&self, node: NodeId) -> Option<&str>;

    /// Attribute value of an element.
    fn get_attribute(&self, node: NodeId, name: &str) -> Option<&str>;

    /// Set an attribute on an element, replacing any existing value.
    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> Result<(), DomError>;

    /// Remove an attribute from an element. Missing attributes are ignored.
    fn remove_attribute(&mut self, node: NodeId, name: &str) -> Result<(), DomError>;

    /// Create a detached element.
    fn create_element(&mut self, tag: &str) -> NodeId;

    /// Insert `node` into `parent` before `reference`, or at the end when
    /// `reference` is `None`. The node is detached from its previous parent.
    fn insert_before(
        &mut self,
        parent: NodeId,
        node: NodeId,
        reference: Option<NodeId>,
    ) -> Result<(), DomError>;

    /// Detach `child` from `parent`.
    fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError>;

    /// Copy a node, including its subtree when `deep` is set. The copy is detached.
    fn clone_node(&mut self, node: NodeId, deep: bool) -> Result<NodeId, DomError>;

    /// Replace all children of an element with a single text node.
    fn set_text_content(&mut self, node: NodeId, text: &str) -> Result<(), DomError>;

    /// Replace all children of an element with a markup fragment.
    fn set_inner_html(&mut self, node: NodeId, markup: &str) -> Result<(), DomError>;

    /// Serialized children of an element.
    fn inner_html(&self, node: NodeId) -> String;

    /// Whether the host environment signals a dark color scheme preference.
    fn prefers_dark_color_scheme(&self) -> bool;

    /// The `<body>` element.
    fn body(&self) -> Option<NodeId> {
        let root = self.document_element();
        self.children(root)
            .into_iter()
            .find(|&child| self.tag_name(child) == Some("body"))
    }

    /// Append `node` as the last child of `parent`.
    fn append_child(&mut self, parent: NodeId, node: NodeId) -> Result<(), DomError> {
        self.insert_before(parent, node, None)
    }

    /// Concatenated text of all descendant text nodes.
    fn text_content(&self, node: NodeId) -> String {
        let mut out = String::new();
        collect_text(self, node, &mut out);
        out
    }

    /// All descendants of a node in document (pre-)order, excluding the node.
    fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(node).into_iter().rev().collect();
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.children(current).into_iter().rev());
        }
        out
    }

    /// Whether the node is reachable from the document element.
    fn is_connected(&self, node: NodeId) -> bool {
        let root = self.document_element();
        let mut current = node;
        loop {
            if current == root {
                return true;
            }
            match self.parent(current) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    /// Whether an element matches a selector.
    fn matches(&self, node: NodeId, selector: &Selector) -> bool {
        selector.matches(self, node)
    }

    /// All connected elements matching a selector, in document order.
    fn query_selector_all(&self, selector: &Selector) -> Vec<NodeId> {
        let root = self.document_element();
        std::iter::once(root)
            .chain(self.descendants(root))
            .filter(|&node| selector.matches(self, node))
            .collect()
    }

    /// First descendant of `scope` matching a selector.
    fn query_selector(&self, scope: NodeId, selector: &Selector) -> Option<NodeId> {
        self.descendants(scope)
            .into_iter()
            .find(|&node| selector.matches(self, node))
    }

    /// Whether the element's `class` attribute lists `class`.
    fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.get_attribute(node, "class")
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
    }

    /// Add a class to the element's class list.
    fn add_class(&mut self, node: NodeId, class: &str) -> Result<(), DomError> {
        if self.has_class(node, class) {
            return Ok(());
        }
        let classes = match self.get_attribute(node, "class") {
            Some(existing) if !existing.trim().is_empty() => format!("{} {class}", existing.trim()),
            _ => class.to_owned(),
        };
        self.set_attribute(node, "class", &classes)
    }

    /// Remove a class from the element's class list.
    fn remove_class(&mut self, node: NodeId, class: &str) -> Result<(), DomError> {
        let Some(existing) = self.get_attribute(node, "class") else {
            return Ok(());
        };
        let remaining: Vec<&str> = existing.split_whitespace().filter(|c| *c != class).collect();
        let remaining = remaining.join(" ");
        self.set_attribute(node, "class", &remaining)
    }

    /// Inline style property value.
    fn style(&self, node: NodeId, property: &str) -> Option<String> {
        let style = self.get_attribute(node, "style")?;
        parse_style(style)
            .into_iter()
            .find(|(name, _)| name == property)
            .map(|(_, value)| value)
    }

    /// Set an inline style property.
    fn set_style(&mut self, node: NodeId, property: &str, value: &str) -> Result<(), DomError> {
        let mut declarations = self
            .get_attribute(node, "style")
            .map(parse_style)
            .unwrap_or_default();
        match declarations.iter_mut().find(|(name, _)| name == property) {
            Some(entry) => value.clone_into(&mut entry.1),
            None => declarations.push((property.to_owned(), value.to_owned())),
        }
        self.set_attribute(node, "style", &format_style(&declarations))
    }

    /// Remove an inline style property, dropping the attribute once empty.
    fn remove_style(&mut self, node: NodeId, property: &str) -> Result<(), DomError> {
        let Some(style) = self.get_attribute(node, "style") else {
            return Ok(());
        };
        let declarations: Vec<_> = parse_style(style)
            .into_iter()
            .filter(|(name, _)| name != property)
            .collect();
        if declarations.is_empty() {
            self.remove_attribute(node, "style")
        } else {
            self.set_attribute(node, "style", &format_style(&declarations))
        }
    }

    /// Resolved style property value.
    ///
    /// Without a style engine this is the inline value. Hosts with a real
    /// cascade override it.
    fn computed_style(&self, node: NodeId, property: &str) -> Option<String> {
        self.style(node, property)
    }
}

fn collect_text<D: Document + ?Sized>(doc: &D, node: NodeId, out: &mut String) {
    if let Some(text) = doc.text(node) {
        out.push_str(text);
        return;
    }
    for child in doc.children(node) {
        collect_text(doc, child, out);
    }
}

/// Split a `style` attribute into `(property, value)` declarations.
fn parse_style(style: &str) -> Vec<(String, String)> {
    style
        .split(';')
        .filter_map(|declaration| {
            let (name, value) = declaration.split_once(':')?;
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            Some((name.to_ascii_lowercase(), value.trim().to_owned()))
        })
        .collect()
}

fn format_style(declarations: &[(String, String)]) -> String {
    declarations
        .iter()
        .map(|(name, value)| format!("{name}: {value};"))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryDocument;

    #[test]
    fn test_parse_style() {
        let declarations = parse_style("display: none; Color:red;;");
        assert_eq!(
            declarations,
            vec![
                ("display".to_owned(), "none".to_owned()),
                ("color".to_owned(), "red".to_owned()),
            ]
        );
    }

    #[test]
    fn test_set_and_remove_style() {
        let mut doc = MemoryDocument::new();
        let div = doc.create_element("div");

        doc.set_style(div, "display", "none").unwrap();
        doc.set_style(div, "color", "red").unwrap();
        assert_eq!(doc.style(div, "display").as_deref(), Some("none"));
        assert_eq!(doc.get_attribute(div, "style"), Some("display: none; color: red;"));

        doc.remove_style(div, "display").unwrap();
        assert_eq!(doc.style(div, "display"), None);
        doc.remove_style(div, "color").unwrap();
        assert_eq!(doc.get_attribute(div, "style"), None);
    }

    #[test]
    fn test_class_list() {
        let mut doc = MemoryDocument::new();
        let div = doc.create_element("div");

        doc.add_class(div, "a").unwrap();
        doc.add_class(div, "b").unwrap();
        doc.add_class(div, "a").unwrap();
        assert_eq!(doc.get_attribute(div, "class"), Some("a b"));

        doc.remove_class(div, "a").unwrap();
        assert!(!doc.has_class(div, "a"));
        assert!(doc.has_class(div, "b"));
    }

    #[test]
    fn test_is_connected() {
        let mut doc = MemoryDocument::new();
        let body = doc.body().unwrap();
        let div = doc.create_element("div");
        assert!(!doc.is_connected(div));

        doc.append_child(body, div).unwrap();
        assert!(doc.is_connected(div));

        doc.remove_child(body, div).unwrap();
        assert!(!doc.is_connected(div));
    }

    #[test]
    fn test_text_content_concatenates_descendants() {
        let doc = MemoryDocument::from_xhtml("<p>Hello <b>big</b> world</p>").unwrap();
        let body = doc.body().unwrap();
        let p = doc.children(body)[0];
        assert_eq!(doc.text_content(p), "Hello big world");
    }
}
