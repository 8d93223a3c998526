//! In-memory document tree.
//!
//! Provides [`MemoryDocument`] for hosts without a browser DOM and for tests.

use crate::document::{Document, MutationBatch, NodeId};
use crate::error::{DomError, ParseError};
use crate::xhtml;

/// Elements serialized without a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

#[derive(Debug, Clone)]
enum NodeData {
    Element {
        tag: String,
        attributes: Vec<(String, String)>,
    },
    Text(String),
    /// Opaque markup injected through `set_inner_html`, serialized verbatim.
    Markup(String),
}

#[derive(Debug, Clone)]
struct Node {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Arena-backed document tree.
///
/// Nodes are never freed; detached nodes simply become unreachable from the
/// document element. Every insertion into the connected tree is recorded and
/// kept until drained with [`take_mutations`](Self::take_mutations), so hosts
/// that observe the page must drain after each batch of edits. Hosts that
/// never observe can ignore the log.
///
/// # Example
///
/// ```
/// use mv_dom::{Document, MemoryDocument};
///
/// let mut doc = MemoryDocument::new();
/// let body = doc.body().unwrap();
/// let pre = doc.create_element("pre");
/// doc.append_child(body, pre).unwrap();
///
/// let batch = doc.take_mutations().unwrap();
/// assert_eq!(batch.added, vec![pre]);
/// ```
#[derive(Debug, Clone)]
pub struct MemoryDocument {
    nodes: Vec<Node>,
    root: NodeId,
    prefers_dark: bool,
    pending: Vec<NodeId>,
    /// Detached element that parsed fragments land in before insertion.
    fragment_holder: Option<NodeId>,
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDocument {
    /// Create a document with an empty `<html><head/><body/></html>` skeleton.
    #[must_use]
    pub fn new() -> Self {
        let mut doc = Self {
            nodes: Vec::new(),
            root: NodeId(0),
            prefers_dark: false,
            pending: Vec::new(),
            fragment_holder: None,
        };
        let html = doc.push_element("html");
        let head = doc.push_element("head");
        let body = doc.push_element("body");
        doc.attach(html, head, None);
        doc.attach(html, body, None);
        doc.root = html;
        doc
    }

    /// Load a document from well-formed XHTML.
    ///
    /// If the input has an `<html>` root it becomes the document element.
    /// Otherwise the input is treated as a body fragment.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError`] if the input is not well-formed XML.
    pub fn from_xhtml(input: &str) -> Result<Self, ParseError> {
        let mut doc = Self::new();
        let top = doc.parse_fragment(input)?;

        let html = top
            .iter()
            .copied()
            .find(|&node| doc.tag_name(node) == Some("html"));

        if let Some(html) = html {
            doc.detach(html);
            doc.root = html;
            if doc.body().is_none() {
                let body = doc.push_element("body");
                doc.attach(html, body, None);
            }
        } else {
            let body = doc.body().ok_or(DomError::UnknownNode(doc.root))?;
            for node in top {
                doc.detach(node);
                doc.attach(body, node, None);
            }
        }

        doc.pending.clear();
        Ok(doc)
    }

    /// Parse an XHTML fragment and append it to `parent`.
    ///
    /// Simulates content streamed in after load: the appended roots are
    /// recorded as added nodes.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError`] for malformed input or an invalid parent.
    pub fn append_fragment(&mut self, parent: NodeId, input: &str) -> Result<Vec<NodeId>, ParseError> {
        self.element(parent)?;
        let top = self.parse_fragment(input)?;
        for &node in &top {
            self.insert_before(parent, node, None)?;
        }
        Ok(top)
    }

    /// Parse `input` into the shared, detached fragment holder.
    ///
    /// Leftovers from a previous parse are dropped from the holder first.
    fn parse_fragment(&mut self, input: &str) -> Result<Vec<NodeId>, ParseError> {
        let holder = match self.fragment_holder {
            Some(holder) => holder,
            None => {
                let holder = self.push_element("template");
                self.fragment_holder = Some(holder);
                holder
            }
        };
        for child in std::mem::take(&mut self.nodes[holder.0].children) {
            self.nodes[child.0].parent = None;
        }
        xhtml::parse_into(self, holder, input)
    }

    /// Set the host color scheme preference.
    pub fn set_prefers_dark_color_scheme(&mut self, prefers_dark: bool) {
        self.prefers_dark = prefers_dark;
    }

    /// Drain nodes added to the connected tree since the last call.
    ///
    /// Returns `None` if nothing was added.
    pub fn take_mutations(&mut self) -> Option<MutationBatch> {
        if self.pending.is_empty() {
            return None;
        }
        Some(MutationBatch::new(std::mem::take(&mut self.pending)))
    }

    /// Serialize the whole document.
    #[must_use]
    pub fn to_html(&self) -> String {
        let mut out = String::from("<!DOCTYPE html>\n");
        self.serialize(self.root, &mut out);
        out
    }

    /// Serialize a node including its own tag.
    #[must_use]
    pub fn outer_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.serialize(node, &mut out);
        out
    }

    /// Create a detached text node.
    pub fn create_text_node(&mut self, text: &str) -> NodeId {
        self.push(NodeData::Text(text.to_owned()))
    }

    /// Append character data to `parent`, merging with a trailing text node.
    pub(crate) fn append_text(&mut self, parent: NodeId, text: &str) {
        let last = self.nodes[parent.0].children.last().copied();
        if let Some(last) = last
            && let NodeData::Text(existing) = &mut self.nodes[last.0].data
        {
            existing.push_str(text);
            return;
        }
        let node = self.create_text_node(text);
        self.attach(parent, node, None);
    }

    /// Create a detached element with attributes.
    pub(crate) fn push_element_with(&mut self, tag: &str, attributes: Vec<(String, String)>) -> NodeId {
        self.push(NodeData::Element {
            tag: tag.to_ascii_lowercase(),
            attributes,
        })
    }

    /// Attach without validation or mutation recording. Used during tree construction.
    pub(crate) fn attach(&mut self, parent: NodeId, node: NodeId, reference: Option<NodeId>) {
        let children = &mut self.nodes[parent.0].children;
        let index = reference
            .and_then(|r| children.iter().position(|&c| c == r))
            .unwrap_or(children.len());
        children.insert(index, node);
        self.nodes[node.0].parent = Some(parent);
    }

    fn push(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            data,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    fn push_element(&mut self, tag: &str) -> NodeId {
        self.push_element_with(tag, Vec::new())
    }

    fn detach(&mut self, node: NodeId) {
        if let Some(parent) = self.nodes[node.0].parent.take() {
            self.nodes[parent.0].children.retain(|&c| c != node);
        }
    }

    fn node(&self, id: NodeId) -> Result<&Node, DomError> {
        self.nodes.get(id.0).ok_or(DomError::UnknownNode(id))
    }

    /// Validate that `id` is an element and return its attribute list.
    fn element(&self, id: NodeId) -> Result<&Vec<(String, String)>, DomError> {
        match &self.node(id)?.data {
            NodeData::Element { attributes, .. } => Ok(attributes),
            _ => Err(DomError::NotAnElement(id)),
        }
    }

    fn attributes_mut(&mut self, id: NodeId) -> Result<&mut Vec<(String, String)>, DomError> {
        match self.nodes.get_mut(id.0).map(|n| &mut n.data) {
            Some(NodeData::Element { attributes, .. }) => Ok(attributes),
            Some(_) => Err(DomError::NotAnElement(id)),
            None => Err(DomError::UnknownNode(id)),
        }
    }

    fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.nodes[id.0].parent;
        }
        false
    }

    fn replace_children(&mut self, node: NodeId, data: Option<NodeData>) -> Result<(), DomError> {
        self.element(node)?;
        for child in std::mem::take(&mut self.nodes[node.0].children) {
            self.nodes[child.0].parent = None;
        }
        if let Some(data) = data {
            let child = self.push(data);
            self.attach(node, child, None);
            if self.is_connected(node) {
                self.pending.push(child);
            }
        }
        Ok(())
    }

    fn serialize(&self, id: NodeId, out: &mut String) {
        let Some(node) = self.nodes.get(id.0) else {
            return;
        };
        match &node.data {
            NodeData::Text(text) => out.push_str(&escape_text(text)),
            NodeData::Markup(markup) => out.push_str(markup),
            NodeData::Element { tag, attributes } => {
                out.push('<');
                out.push_str(tag);
                for (name, value) in attributes {
                    out.push(' ');
                    out.push_str(name);
                    out.push_str("=\"");
                    out.push_str(&escape_attribute(value));
                    out.push('"');
                }
                out.push('>');
                if VOID_ELEMENTS.contains(&tag.as_str()) && node.children.is_empty() {
                    return;
                }
                for &child in &node.children {
                    self.serialize(child, out);
                }
                out.push_str("</");
                out.push_str(tag);
                out.push('>');
            }
        }
    }
}

impl Document for MemoryDocument {
    fn document_element(&self) -> NodeId {
        self.root
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node.0).and_then(|n| n.parent)
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.nodes
            .get(node.0)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    fn tag_name(&self, node: NodeId) -> Option<&str> {
        match &self.nodes.get(node.0)?.data {
            NodeData::Element { tag, .. } => Some(tag),
            _ => None,
        }
    }

    fn text(&self, node: NodeId) -> Option<&str> {
        match &self.nodes.get(node.0)?.data {
            NodeData::Text(text) => Some(text),
            _ => None,
        }
    }

    fn get_attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        self.element(node)
            .ok()?
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> Result<(), DomError> {
        let attributes = self.attributes_mut(node)?;
        match attributes.iter_mut().find(|(n, _)| n == name) {
            Some(entry) => value.clone_into(&mut entry.1),
            None => attributes.push((name.to_owned(), value.to_owned())),
        }
        Ok(())
    }

    fn remove_attribute(&mut self, node: NodeId, name: &str) -> Result<(), DomError> {
        self.attributes_mut(node)?.retain(|(n, _)| n != name);
        Ok(())
    }

    fn create_element(&mut self, tag: &str) -> NodeId {
        self.push_element(tag)
    }

    fn insert_before(
        &mut self,
        parent: NodeId,
        node: NodeId,
        reference: Option<NodeId>,
    ) -> Result<(), DomError> {
        self.element(parent)?;
        self.node(node)?;
        if let Some(reference) = reference
            && self.node(reference)?.parent != Some(parent)
        {
            return Err(DomError::NotAChild {
                parent,
                child: reference,
            });
        }
        if self.is_inclusive_ancestor(node, parent) {
            return Err(DomError::HierarchyRequest { parent, node });
        }
        if reference == Some(node) {
            return Ok(());
        }

        self.detach(node);
        self.attach(parent, node, reference);
        if self.is_connected(parent) {
            self.pending.push(node);
        }
        Ok(())
    }

    fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        self.node(parent)?;
        if self.node(child)?.parent != Some(parent) {
            return Err(DomError::NotAChild { parent, child });
        }
        self.detach(child);
        Ok(())
    }

    fn clone_node(&mut self, node: NodeId, deep: bool) -> Result<NodeId, DomError> {
        let source = self.node(node)?.clone();
        let copy = self.push(source.data);
        if deep {
            for child in source.children {
                let child_copy = self.clone_node(child, true)?;
                self.attach(copy, child_copy, None);
            }
        }
        Ok(copy)
    }

    fn set_text_content(&mut self, node: NodeId, text: &str) -> Result<(), DomError> {
        let data = (!text.is_empty()).then(|| NodeData::Text(text.to_owned()));
        self.replace_children(node, data)
    }

    fn set_inner_html(&mut self, node: NodeId, markup: &str) -> Result<(), DomError> {
        let data = (!markup.is_empty()).then(|| NodeData::Markup(markup.to_owned()));
        self.replace_children(node, data)
    }

    fn inner_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        for child in self.children(node) {
            self.serialize(child, &mut out);
        }
        out
    }

    fn prefers_dark_color_scheme(&self) -> bool {
        self.prefers_dark
    }
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn escape_attribute(value: &str) -> String {
    escape_text(value).replace('"', "&quot;")
}
