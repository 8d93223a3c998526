//! Colored terminal output for command progress and block reports.

use console::{Style, Term};

/// Terminal output formatter writing to stderr.
///
/// Stdout is reserved for the processed page.
pub(crate) struct Output {
    term: Term,
    green: Style,
    yellow: Style,
    red: Style,
    cyan_bold: Style,
}

impl Output {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self {
            term: Term::stderr(),
            green: Style::new().green(),
            yellow: Style::new().yellow(),
            red: Style::new().red(),
            cyan_bold: Style::new().cyan().bold(),
        }
    }

    pub(crate) fn info(&self, msg: &str) {
        let _ = self.term.write_line(msg);
    }

    /// Print a success message (green).
    pub(crate) fn success(&self, msg: &str) {
        self.styled(&self.green, msg);
    }

    /// Print a warning message (yellow).
    pub(crate) fn warning(&self, msg: &str) {
        self.styled(&self.yellow, msg);
    }

    /// Print an error message (red).
    pub(crate) fn error(&self, msg: &str) {
        self.styled(&self.red, msg);
    }

    /// Print a heading (cyan bold).
    pub(crate) fn heading(&self, msg: &str) {
        self.styled(&self.cyan_bold, msg);
    }

    /// Print the check result of one block, numbered from 1.
    pub(crate) fn block_result(&self, index: usize, kind: &str, error: Option<&str>) {
        let line = block_line(index, kind, error);
        match error {
            None => self.success(&line),
            Some(_) => self.error(&line),
        }
    }

    fn styled(&self, style: &Style, msg: &str) {
        let _ = self.term.write_line(&style.apply_to(msg).to_string());
    }
}

/// `1 Mermaid block`, `3 Mermaid blocks`.
pub(crate) fn block_count(count: usize) -> String {
    if count == 1 {
        "1 Mermaid block".to_owned()
    } else {
        format!("{count} Mermaid blocks")
    }
}

fn block_line(index: usize, kind: &str, error: Option<&str>) -> String {
    let kind = if kind.is_empty() { "(empty)" } else { kind };
    format!("  [{}] {kind}: {}", index + 1, error.unwrap_or("ok"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_block_count() {
        assert_eq!(block_count(0), "0 Mermaid blocks");
        assert_eq!(block_count(1), "1 Mermaid block");
        assert_eq!(block_count(3), "3 Mermaid blocks");
    }

    #[test]
    fn test_block_line() {
        assert_eq!(block_line(0, "graph", None), "  [1] graph: ok");
        assert_eq!(
            block_line(2, "pie", Some("HTTP 400: Syntax error")),
            "  [3] pie: HTTP 400: Syntax error"
        );
        assert_eq!(block_line(1, "", None), "  [2] (empty): ok");
    }
}
