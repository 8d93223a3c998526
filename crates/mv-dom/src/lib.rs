//! Document tree abstraction for Mermaid Viewer.
//!
//! The detection and view logic never talks to a concrete browser API. It is
//! written against the [`Document`] trait, which captures the small capability
//! set it needs:
//! - element lookup by structural [`Selector`]
//! - attribute, class, and inline style access
//! - text extraction
//! - node creation, insertion, removal, and cloning
//!
//! [`MemoryDocument`] is an arena-backed implementation used by the CLI and
//! by tests. It records the nodes added to the connected tree so the host can
//! forward them as [`MutationBatch`]es to an observer.
//!
//! # Example
//!
//! ```
//! use mv_dom::{Document, MemoryDocument, Selector};
//!
//! let doc = MemoryDocument::from_xhtml("<pre><code>graph TD\nA --> B</code></pre>").unwrap();
//! let selector = Selector::parse("pre > code").unwrap();
//! let blocks = doc.query_selector_all(&selector);
//! assert_eq!(blocks.len(), 1);
//! assert!(doc.text_content(blocks[0]).starts_with("graph TD"));
//! ```

mod document;
mod error;
mod memory;
mod selector;
mod xhtml;

pub use document::{Document, MutationBatch, NodeId};
pub use error::{DomError, ParseError, SelectorError};
pub use memory::MemoryDocument;
pub use selector::Selector;
