//! Seam to the diagram rendering library.

use std::future::Future;

use crate::consts::UNKNOWN_RENDER_ERROR;
use crate::theme::Theme;

/// How strictly the library sandboxes rendered output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SecurityLevel {
    /// Markup is sanitized and interaction is disabled.
    Strict,
    /// The host page is trusted.
    #[default]
    Loose,
}

/// Options passed once to [`DiagramLibrary::initialize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryOptions {
    /// Whether the library scans the page on its own. Always off: rendering
    /// is driven explicitly per block.
    pub start_on_load: bool,
    /// Diagram theme.
    pub theme: Theme,
    /// Output sandboxing.
    pub security_level: SecurityLevel,
    /// Font family for diagram text.
    pub font_family: String,
}

impl LibraryOptions {
    /// Options for rendering under `theme`, trusting and inheriting from the host.
    #[must_use]
    pub fn for_theme(theme: Theme) -> Self {
        Self {
            start_on_load: false,
            theme,
            security_level: SecurityLevel::Loose,
            font_family: "inherit".to_owned(),
        }
    }
}

impl Default for LibraryOptions {
    fn default() -> Self {
        Self::for_theme(Theme::Default)
    }
}

/// Fault raised by the diagram library.
///
/// Faults may carry no message; they then display as a generic fallback.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}", self.message())]
pub struct LibraryError {
    message: Option<String>,
}

impl LibraryError {
    /// Fault with a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
        }
    }

    /// Fault without a message.
    #[must_use]
    pub fn unknown() -> Self {
        Self { message: None }
    }

    /// Human-readable message, falling back to a generic one.
    #[must_use]
    pub fn message(&self) -> &str {
        match self.message.as_deref() {
            Some(message) if !message.is_empty() => message,
            _ => UNKNOWN_RENDER_ERROR,
        }
    }
}

/// Opaque diagram rendering library.
///
/// Implementations turn notation into markup. They are driven by
/// [`RendererAdapter`](crate::RendererAdapter), which guarantees that
/// `initialize` runs before any `render`.
pub trait DiagramLibrary {
    /// Configure the library.
    fn initialize(&mut self, options: &LibraryOptions);

    /// Render notation to markup.
    ///
    /// # Arguments
    ///
    /// * `id` - Unique identifier namespacing ids inside the generated markup
    /// * `text` - Diagram notation
    ///
    /// # Errors
    ///
    /// Returns [`LibraryError`] for invalid notation or internal faults.
    fn render(&self, id: &str, text: &str) -> impl Future<Output = Result<String, LibraryError>>;

    /// Parse notation without rendering it.
    ///
    /// # Errors
    ///
    /// Returns [`LibraryError`] for invalid notation.
    fn parse(&self, text: &str) -> impl Future<Output = Result<(), LibraryError>>;
}
