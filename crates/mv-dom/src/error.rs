//! Error types for document operations.

use crate::document::NodeId;

/// Error from a structural document mutation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    /// Node handle does not belong to this document.
    #[error("unknown node {0:?}")]
    UnknownNode(NodeId),

    /// Operation requires an element but got a text or markup node.
    #[error("node {0:?} is not an element")]
    NotAnElement(NodeId),

    /// Reference node is not a child of the given parent.
    #[error("node {child:?} is not a child of {parent:?}")]
    NotAChild {
        /// Expected parent.
        parent: NodeId,
        /// Node that was expected to be a child.
        child: NodeId,
    },

    /// Insertion would make a node its own ancestor.
    #[error("inserting {node:?} into {parent:?} would create a cycle")]
    HierarchyRequest {
        /// Insertion target.
        parent: NodeId,
        /// Node being inserted.
        node: NodeId,
    },
}

/// Invalid selector syntax.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid selector '{selector}': {message}")]
pub struct SelectorError {
    /// Selector source text.
    pub selector: String,
    /// What went wrong.
    pub message: String,
}

/// Error while loading a document from XHTML.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ParseError {
    /// XML parsing error.
    #[error("XML parse error: {0}")]
    XmlParse(#[from] quick_xml::Error),

    /// XML attribute error.
    #[error("XML attribute error: {0}")]
    XmlAttr(#[from] quick_xml::events::attributes::AttrError),

    /// Encoding error during XML parsing.
    #[error("encoding error: {0}")]
    Encoding(#[from] quick_xml::encoding::EncodingError),

    /// Tree construction failed.
    #[error("tree error: {0}")]
    Dom(#[from] DomError),
}
