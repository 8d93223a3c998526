//! Page orchestration errors.

use mv_dom::{DomError, SelectorError};

/// Error raised by a page pass.
#[derive(Debug, thiserror::Error)]
pub enum PageError {
    /// Configured selector does not parse.
    #[error(transparent)]
    Selector(#[from] SelectorError),
    /// Document rejected an edit.
    #[error("document error: {0}")]
    Dom(#[from] DomError),
}
