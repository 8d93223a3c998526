//! Events consumed by the orchestrator loop.

use std::fmt;

use mv_dom::{MutationBatch, NodeId};
use tokio::sync::oneshot;

use crate::message::{PageRequest, PageResponse};

/// Host edit applied to the document by the orchestrator loop.
///
/// Returns the nodes the edit added, as observed by the host.
pub type DocumentEdit<D> = Box<dyn FnOnce(&mut D) -> Option<MutationBatch> + Send>;

/// Input to [`PageOrchestrator::run`](crate::PageOrchestrator::run).
pub enum PageEvent<D> {
    /// Nodes were added to the document.
    Mutations(MutationBatch),
    /// Page content changed by the host, such as streamed-in markup.
    Edit(DocumentEdit<D>),
    /// A node was clicked.
    Click(NodeId),
    /// Host request awaiting a response.
    Request(PageRequest, oneshot::Sender<PageResponse>),
}

impl<D> fmt::Debug for PageEvent<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mutations(batch) => f.debug_tuple("Mutations").field(batch).finish(),
            Self::Edit(_) => f.write_str("Edit(..)"),
            Self::Click(node) => f.debug_tuple("Click").field(node).finish(),
            Self::Request(request, _) => f.debug_tuple("Request").field(request).finish(),
        }
    }
}
