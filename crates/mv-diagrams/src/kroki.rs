//! Diagram rendering via a Kroki server.
//!
//! Notation is posted to `{server_url}/mermaid/svg` and the SVG body is
//! returned as markup. Requests are blocking `ureq` calls moved onto the
//! runtime's blocking pool.

use std::sync::LazyLock;
use std::time::Duration;

use regex::{Captures, Regex};
use ureq::Agent;

use crate::consts::DEFAULT_TIMEOUT;
use crate::library::{DiagramLibrary, LibraryError, LibraryOptions};
use crate::theme::Theme;

/// Header carrying the Mermaid theme as a Kroki diagram option.
const THEME_HEADER: &str = "Kroki-Diagram-Options-theme";

/// Opening `<svg>` tag.
static SVG_OPEN_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<svg\b[^>]*>").expect("valid regex"));

/// `id` attribute inside a tag.
static ID_ATTRIBUTE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\sid="([^"]*)""#).expect("valid regex"));

/// Kroki-backed [`DiagramLibrary`].
#[derive(Debug, Clone)]
pub struct KrokiLibrary {
    server_url: String,
    agent: Agent,
    theme: Theme,
}

impl KrokiLibrary {
    /// Create a library using the default 30 second timeout.
    pub fn new(server_url: impl Into<String>) -> Self {
        Self::with_timeout(server_url, DEFAULT_TIMEOUT)
    }

    /// Create a library with an explicit HTTP timeout.
    pub fn with_timeout(server_url: impl Into<String>, timeout: Duration) -> Self {
        let server_url = server_url.into().trim_end_matches('/').to_owned();
        Self {
            server_url,
            agent: create_agent(timeout),
            theme: Theme::Default,
        }
    }

    /// Kroki server URL without a trailing slash.
    #[must_use]
    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    fn endpoint(&self) -> String {
        format!("{}/mermaid/svg", self.server_url)
    }

    async fn request(&self, text: &str) -> Result<String, LibraryError> {
        let agent = self.agent.clone();
        let url = self.endpoint();
        let theme = self.theme;
        let source = text.to_owned();

        tokio::task::spawn_blocking(move || send_diagram_request(&agent, &url, theme, &source))
            .await
            .map_err(|e| LibraryError::new(format!("render task failed: {e}")))?
    }
}

/// Create HTTP agent that reports error statuses as responses.
fn create_agent(timeout: Duration) -> Agent {
    Agent::config_builder()
        .timeout_global(Some(timeout))
        .http_status_as_error(false)
        .build()
        .into()
}

/// Send notation to Kroki and return the SVG body.
///
/// Error statuses carry the response body, which holds Kroki's parse error.
fn send_diagram_request(
    agent: &Agent,
    url: &str,
    theme: Theme,
    source: &str,
) -> Result<String, LibraryError> {
    let response = agent
        .post(url)
        .header("Content-Type", "text/plain")
        .header(THEME_HEADER, theme.as_str())
        .send(source.as_bytes())
        .map_err(|e| LibraryError::new(format!("HTTP error: {e}")))?;

    let status = response.status().as_u16();
    let mut body = response.into_body();

    if status >= 400 {
        let error_body = body
            .read_to_string()
            .unwrap_or_else(|_| String::from("(unable to read error body)"));
        return Err(LibraryError::new(format!(
            "HTTP {status}: {}",
            error_body.trim()
        )));
    }

    body.read_to_string()
        .map_err(|e| LibraryError::new(format!("I/O error: {e}")))
}

/// Rename the root SVG id, and every id or `#` reference derived from it, to `id`.
///
/// Scoped `<style>` rules and `url(#...)` references follow the rename. An
/// SVG without a root id gets `id` added.
fn namespace_svg(svg: &str, id: &str) -> String {
    let Some(tag) = SVG_OPEN_TAG.find(svg) else {
        return svg.to_owned();
    };
    let old = ID_ATTRIBUTE
        .captures(tag.as_str())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .filter(|old| !old.is_empty());
    let Some(old) = old else {
        let (head, tail) = svg.split_at(tag.start() + "<svg".len());
        return format!(r#"{head} id="{id}"{tail}"#);
    };
    if old == id {
        return svg.to_owned();
    }

    let Ok(references) = Regex::new(&format!(r#"(\bid="|#){}"#, regex::escape(old))) else {
        return svg.to_owned();
    };
    references
        .replace_all(svg, |caps: &Captures| format!("{}{id}", &caps[1]))
        .into_owned()
}

impl DiagramLibrary for KrokiLibrary {
    /// Kroki sanitizes on its own; only the theme carries over.
    fn initialize(&mut self, options: &LibraryOptions) {
        self.theme = options.theme;
    }

    async fn render(&self, id: &str, text: &str) -> Result<String, LibraryError> {
        tracing::debug!(%id, url = %self.endpoint(), "Requesting diagram from Kroki");
        let svg = self.request(text).await?;
        Ok(namespace_svg(&svg, id))
    }

    async fn parse(&self, text: &str) -> Result<(), LibraryError> {
        self.request(text).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_endpoint_strips_trailing_slash() {
        let library = KrokiLibrary::new("https://kroki.example.com/");
        assert_eq!(library.server_url(), "https://kroki.example.com");
        assert_eq!(library.endpoint(), "https://kroki.example.com/mermaid/svg");
    }

    #[test]
    fn test_initialize_sets_theme() {
        let mut library = KrokiLibrary::new("https://kroki.io");
        library.initialize(&LibraryOptions::for_theme(Theme::Dark));
        assert_eq!(library.theme, Theme::Dark);
    }

    const KROKI_SVG: &str = concat!(
        r#"<svg aria-roledescription="flowchart-v2" id="my-svg" width="100%" xmlns="http://www.w3.org/2000/svg">"#,
        "<style>#my-svg{fill:#333;}#my-svg .edge{stroke:#333;}</style>",
        r#"<defs><marker id="my-svg_flowchart-pointEnd"/></defs>"#,
        r#"<path marker-end="url(#my-svg_flowchart-pointEnd)"/>"#,
        "<text>my-svg</text></svg>"
    );

    #[test]
    fn test_namespace_svg_rewrites_root_id_and_references() {
        let svg = namespace_svg(KROKI_SVG, "mermaid-diagram-1");
        assert_eq!(
            svg,
            concat!(
                r#"<svg aria-roledescription="flowchart-v2" id="mermaid-diagram-1" width="100%" xmlns="http://www.w3.org/2000/svg">"#,
                "<style>#mermaid-diagram-1{fill:#333;}#mermaid-diagram-1 .edge{stroke:#333;}</style>",
                r#"<defs><marker id="mermaid-diagram-1_flowchart-pointEnd"/></defs>"#,
                r#"<path marker-end="url(#mermaid-diagram-1_flowchart-pointEnd)"/>"#,
                "<text>my-svg</text></svg>"
            )
        );
    }

    #[test]
    fn test_namespace_svg_gives_each_render_distinct_ids() {
        let first = namespace_svg(KROKI_SVG, "mermaid-diagram-1");
        let second = namespace_svg(KROKI_SVG, "mermaid-diagram-2");
        assert_ne!(first, second);
        assert!(!first.contains("mermaid-diagram-2"));
        assert!(!second.contains("mermaid-diagram-1"));
        assert!(!first.contains(r#"id="my-svg"#));
        assert!(!second.contains("#my-svg"));
    }

    #[test]
    fn test_namespace_svg_adds_missing_root_id() {
        let svg = namespace_svg(r#"<?xml version="1.0"?><svg width="10"><g/></svg>"#, "mermaid-diagram-3");
        assert_eq!(svg, r#"<?xml version="1.0"?><svg id="mermaid-diagram-3" width="10"><g/></svg>"#);
        assert_eq!(namespace_svg("not svg", "mermaid-diagram-4"), "not svg");
    }

    #[tokio::test]
    async fn test_unreachable_server_is_library_error() {
        let library = KrokiLibrary::with_timeout("http://127.0.0.1:1", Duration::from_secs(2));
        let err = library.render("mermaid-diagram-1", "graph TD").await.unwrap_err();
        assert!(err.message().starts_with("HTTP error"), "{}", err.message());
        assert!(library.parse("graph TD").await.is_err());
    }
}
