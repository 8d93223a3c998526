//! Renderer adapter: one-time library setup and render-or-error calls.

use mv_dom::Document;

use crate::consts::DIAGRAM_ID_PREFIX;
use crate::library::{DiagramLibrary, LibraryError, LibraryOptions};
use crate::theme::{Theme, detect_theme};

/// Initialization state of a [`RendererAdapter`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RendererState {
    /// Whether the library has been configured.
    pub initialized: bool,
    /// Theme the library was configured with.
    pub theme: Theme,
}

/// Result of a render call. Faults never escape as errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderOutcome {
    /// Generated diagram markup.
    Markup(String),
    /// Human-readable fault message.
    Error(String),
}

/// Wraps a [`DiagramLibrary`] with initialization state and id generation.
///
/// The adapter owns its [`RendererState`] and id counter, so two adapters
/// never share configuration.
#[derive(Debug)]
pub struct RendererAdapter<L> {
    library: L,
    state: RendererState,
    next_id: u64,
}

impl<L: DiagramLibrary> RendererAdapter<L> {
    /// Create an uninitialized adapter.
    pub fn new(library: L) -> Self {
        Self {
            library,
            state: RendererState::default(),
            next_id: 0,
        }
    }

    /// Current initialization state.
    #[must_use]
    pub fn state(&self) -> RendererState {
        self.state
    }

    /// The wrapped library.
    pub fn library(&self) -> &L {
        &self.library
    }

    /// Configure the library with the host's theme. Only the first call has an effect.
    pub fn initialize<D: Document + ?Sized>(&mut self, doc: &D) {
        if self.state.initialized {
            return;
        }
        let theme = detect_theme(doc);
        self.library.initialize(&LibraryOptions::for_theme(theme));
        self.state = RendererState {
            initialized: true,
            theme,
        };
        tracing::info!(theme = theme.as_str(), "Initialized diagram library");
    }

    /// Reset and configure again, picking up a changed host theme.
    pub fn reinitialize<D: Document + ?Sized>(&mut self, doc: &D) {
        self.state.initialized = false;
        self.initialize(doc);
    }

    /// Render notation, converting faults into [`RenderOutcome::Error`].
    ///
    /// Each call uses a fresh diagram id; ids are never reused by one adapter.
    pub async fn render<D: Document + ?Sized>(&mut self, doc: &D, text: &str) -> RenderOutcome {
        self.initialize(doc);
        self.next_id += 1;
        let id = format!("{DIAGRAM_ID_PREFIX}{}", self.next_id);

        match self.library.render(&id, text).await {
            Ok(markup) => {
                tracing::debug!(%id, "Rendered diagram");
                RenderOutcome::Markup(markup)
            }
            Err(e) => {
                tracing::debug!(%id, error = %e, "Diagram render failed");
                RenderOutcome::Error(e.to_string())
            }
        }
    }

    /// Whether the notation parses.
    pub async fn validate(&self, text: &str) -> bool {
        self.parse(text).await.is_ok()
    }

    /// Parse-only pass that keeps the library's error message.
    ///
    /// # Errors
    ///
    /// Returns [`LibraryError`] for notation the library rejects.
    pub async fn parse(&self, text: &str) -> Result<(), LibraryError> {
        self.library.parse(text).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MockLibrary;
    use mv_dom::MemoryDocument;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_initialize_once() {
        let doc = MemoryDocument::new();
        let library = MockLibrary::new();
        let mut renderer = RendererAdapter::new(library.clone());

        assert!(!renderer.state().initialized);
        renderer.initialize(&doc);
        renderer.initialize(&doc);
        renderer.render(&doc, "graph TD").await;

        assert!(renderer.state().initialized);
        assert_eq!(library.initialize_count(), 1);
        let options = library.last_options().unwrap();
        assert_eq!(options.theme, Theme::Default);
        assert!(!options.start_on_load);
    }

    #[tokio::test]
    async fn test_reinitialize_picks_up_theme() {
        let mut doc = MemoryDocument::new();
        let library = MockLibrary::new();
        let mut renderer = RendererAdapter::new(library.clone());
        renderer.initialize(&doc);

        let root = doc.document_element();
        doc.add_class(root, "dark").unwrap();
        renderer.initialize(&doc);
        assert_eq!(renderer.state().theme, Theme::Default);

        renderer.reinitialize(&doc);
        assert_eq!(renderer.state().theme, Theme::Dark);
        assert_eq!(library.initialize_count(), 2);
        assert_eq!(library.last_options().unwrap().theme, Theme::Dark);
    }

    #[tokio::test]
    async fn test_render_ids_are_unique() {
        let doc = MemoryDocument::new();
        let library = MockLibrary::new();
        let mut renderer = RendererAdapter::new(library.clone());

        renderer.render(&doc, "graph TD").await;
        renderer.render(&doc, "graph TD").await;
        renderer.render(&doc, "pie\ntitle P").await;

        assert_eq!(
            library.rendered_ids(),
            vec!["mermaid-diagram-1", "mermaid-diagram-2", "mermaid-diagram-3"]
        );
    }

    #[tokio::test]
    async fn test_render_failure_becomes_error() {
        let doc = MemoryDocument::new();
        let library = MockLibrary::new().fail_on("INVALID");
        let mut renderer = RendererAdapter::new(library);

        let outcome = renderer.render(&doc, "graph TD\n INVALID").await;
        assert_eq!(
            outcome,
            RenderOutcome::Error("Parse error: unexpected INVALID".to_owned())
        );
    }

    #[tokio::test]
    async fn test_render_failure_without_message() {
        let doc = MemoryDocument::new();
        let library = MockLibrary::new().fail_without_message_on("BROKEN");
        let mut renderer = RendererAdapter::new(library);

        let outcome = renderer.render(&doc, "BROKEN").await;
        assert_eq!(
            outcome,
            RenderOutcome::Error("Unknown error rendering diagram".to_owned())
        );
    }

    #[tokio::test]
    async fn test_validate_is_independent_of_render() {
        let library = MockLibrary::new().fail_on("INVALID");
        let renderer = RendererAdapter::new(library.clone());

        assert!(renderer.validate("graph TD\n A --> B").await);
        assert!(!renderer.validate("INVALID").await);
        assert_eq!(library.parse_count(), 2);
        assert_eq!(library.render_count(), 0);
        assert!(!renderer.state().initialized);
    }

    #[tokio::test]
    async fn test_parse_keeps_error_message() {
        let renderer = RendererAdapter::new(MockLibrary::new().fail_on("INVALID"));

        assert!(renderer.parse("graph TD\n A --> B").await.is_ok());
        let err = renderer.parse("graph TD\n INVALID").await.unwrap_err();
        assert!(err.message().contains("INVALID"), "{}", err.message());
    }
}
