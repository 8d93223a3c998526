//! Markup conventions shared by the scanner, the view, and teardown.

use std::time::Duration;

/// Attribute marking a block as handled. Set to `"true"` on processing,
/// removed on teardown.
pub const PROCESSED_ATTRIBUTE: &str = "data-mermaid-processed";

/// Class of the inserted per-block wrapper.
pub const WRAPPER_CLASS: &str = "mermaid-viewer-wrapper";

/// Class of the source pane holding the cloned original block.
pub const SOURCE_PANE_CLASS: &str = "mermaid-viewer-code";

pub(crate) const TOOLBAR_CLASS: &str = "mermaid-viewer-toolbar";
pub(crate) const BUTTON_GROUP_CLASS: &str = "mermaid-viewer-btn-group";
pub(crate) const BUTTON_CLASS: &str = "mermaid-viewer-btn";
pub(crate) const BUTTON_ACTIVE_CLASS: &str = "mermaid-viewer-btn-active";
pub(crate) const DIAGRAM_PANE_CLASS: &str = "mermaid-viewer-diagram";
pub(crate) const HIDDEN_CLASS: &str = "mermaid-viewer-hidden";

/// Attribute on toggle buttons naming the view they select.
pub(crate) const VIEW_ATTRIBUTE: &str = "data-mermaid-view";

pub(crate) const CODE_LABEL: &str = "Code";
pub(crate) const DIAGRAM_LABEL: &str = "Diagram";

pub(crate) const LOADING_HTML: &str =
    r#"<div class="mermaid-viewer-loading">Rendering diagram...</div>"#;

/// Prefix for per-render diagram ids.
pub(crate) const DIAGRAM_ID_PREFIX: &str = "mermaid-diagram-";

/// Message used when a render fault carries no message.
pub(crate) const UNKNOWN_RENDER_ERROR: &str = "Unknown error rendering diagram";

/// Default HTTP timeout for Kroki requests (30 seconds).
pub(crate) const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
