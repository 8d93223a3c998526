//! Scripted diagram library for testing.
//!
//! Provides [`MockLibrary`] for exercising rendering without a Kroki server.

use std::sync::{Arc, RwLock};

use crate::escape::escape_html;
use crate::library::{DiagramLibrary, LibraryError, LibraryOptions};

#[derive(Debug, Default)]
struct MockState {
    initialize_count: usize,
    parse_count: usize,
    rendered: Vec<(String, String)>,
    last_options: Option<LibraryOptions>,
}

/// Mock diagram library.
///
/// Clones share call records, so a test can keep one handle and hand the
/// other to a [`RendererAdapter`](crate::RendererAdapter).
///
/// # Example
///
/// ```ignore
/// use mv_diagrams::{MockLibrary, RendererAdapter};
///
/// let library = MockLibrary::new().fail_on("INVALID");
/// let mut renderer = RendererAdapter::new(library.clone());
/// renderer.render(&doc, "graph TD\n  A --> B").await;
/// assert_eq!(library.render_count(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockLibrary {
    state: Arc<RwLock<MockState>>,
    fail_marker: Option<String>,
    silent_fail_marker: Option<String>,
}

impl MockLibrary {
    /// Create a library that renders everything.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail render and parse for notation containing `marker`.
    #[must_use]
    pub fn fail_on(mut self, marker: impl Into<String>) -> Self {
        self.fail_marker = Some(marker.into());
        self
    }

    /// Fail without a message for notation containing `marker`.
    #[must_use]
    pub fn fail_without_message_on(mut self, marker: impl Into<String>) -> Self {
        self.silent_fail_marker = Some(marker.into());
        self
    }

    /// Number of `initialize` calls.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn initialize_count(&self) -> usize {
        self.state.read().unwrap().initialize_count
    }

    /// Number of `render` calls.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn render_count(&self) -> usize {
        self.state.read().unwrap().rendered.len()
    }

    /// Number of `parse` calls.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn parse_count(&self) -> usize {
        self.state.read().unwrap().parse_count
    }

    /// Diagram ids passed to `render`, in call order.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn rendered_ids(&self) -> Vec<String> {
        let state = self.state.read().unwrap();
        state.rendered.iter().map(|(id, _)| id.clone()).collect()
    }

    /// Notation passed to `render`, in call order.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn rendered_sources(&self) -> Vec<String> {
        let state = self.state.read().unwrap();
        state.rendered.iter().map(|(_, text)| text.clone()).collect()
    }

    /// Options from the most recent `initialize` call.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn last_options(&self) -> Option<LibraryOptions> {
        self.state.read().unwrap().last_options.clone()
    }

    fn check(&self, text: &str) -> Result<(), LibraryError> {
        if let Some(marker) = &self.silent_fail_marker
            && text.contains(marker.as_str())
        {
            return Err(LibraryError::unknown());
        }
        if let Some(marker) = &self.fail_marker
            && text.contains(marker.as_str())
        {
            return Err(LibraryError::new(format!("Parse error: unexpected {marker}")));
        }
        Ok(())
    }
}

impl DiagramLibrary for MockLibrary {
    fn initialize(&mut self, options: &LibraryOptions) {
        let mut state = self.state.write().unwrap();
        state.initialize_count += 1;
        state.last_options = Some(options.clone());
    }

    async fn render(&self, id: &str, text: &str) -> Result<String, LibraryError> {
        self.state
            .write()
            .unwrap()
            .rendered
            .push((id.to_owned(), text.to_owned()));
        self.check(text)?;
        Ok(format!(
            r#"<svg id="{id}" class="mock-diagram"><desc>{}</desc></svg>"#,
            escape_html(text)
        ))
    }

    async fn parse(&self, text: &str) -> Result<(), LibraryError> {
        self.state.write().unwrap().parse_count += 1;
        self.check(text)
    }
}
