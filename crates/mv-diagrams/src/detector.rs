//! Mermaid code block detection.
//!
//! Classification is purely syntactic: a block is Mermaid if its trimmed text
//! starts with a diagram-type keyword. Keywords that are also prefixes of
//! ordinary words (`graph`, `flowchart`, `pie`) only match when followed by a
//! space or a newline, so `graphics` and `piece of cake` are not diagrams.

use mv_dom::{Document, NodeId, Selector};

use crate::consts::PROCESSED_ATTRIBUTE;

/// Mermaid diagram type keywords, checked in order.
const MERMAID_KEYWORDS: &[&str] = &[
    "graph ",
    "graph\n",
    "flowchart ",
    "flowchart\n",
    "sequenceDiagram",
    "classDiagram",
    "stateDiagram",
    "erDiagram",
    "gantt",
    "pie ",
    "pie\n",
    "pieChart",
    "quadrantChart",
    "requirementDiagram",
    "journey",
    "gitGraph",
    "mindmap",
    "timeline",
    "sankey",
    "xychart",
    "block-beta",
    "architecture",
    "kanban",
    "packet-beta",
];

/// Whether `text` is Mermaid diagram notation.
///
/// # Example
///
/// ```
/// use mv_diagrams::is_diagram_notation;
///
/// assert!(is_diagram_notation("  graph TD\n  A --> B"));
/// assert!(!is_diagram_notation("graphics"));
/// assert!(!is_diagram_notation(""));
/// ```
#[must_use]
pub fn is_diagram_notation(text: &str) -> bool {
    let trimmed = text.trim();
    MERMAID_KEYWORDS
        .iter()
        .any(|keyword| trimmed.starts_with(keyword))
}

/// Notation text of a block in its normalized (trimmed) form.
#[must_use]
pub fn extract_notation<D: Document + ?Sized>(doc: &D, block: NodeId) -> String {
    doc.text_content(block).trim().to_owned()
}

/// Unhandled blocks matching `selector` whose text is Mermaid notation.
///
/// Returned in document order. Nothing is marked here; marking happens when a
/// container is built, so a block is not skipped by later scans unless it was
/// actually taken.
pub fn find_candidates<D: Document + ?Sized>(doc: &D, selector: &Selector) -> Vec<NodeId> {
    doc.query_selector_all(selector)
        .into_iter()
        .filter(|&block| {
            if doc.get_attribute(block, PROCESSED_ATTRIBUTE) == Some("true") {
                return false;
            }
            let matched = is_diagram_notation(&doc.text_content(block));
            tracing::trace!(?block, matched, "Classified candidate block");
            matched
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mv_dom::MemoryDocument;

    #[test]
    fn test_recognizes_all_diagram_keywords() {
        let samples = [
            ("graph TD\n  A --> B", "graph"),
            ("graph\nA --> B", "graph with newline"),
            ("flowchart LR\n  A --> B", "flowchart"),
            ("flowchart\nA --> B", "flowchart with newline"),
            ("sequenceDiagram\n  A->>B: Hi", "sequenceDiagram"),
            ("classDiagram\n  Class01", "classDiagram"),
            ("stateDiagram\n  [*] --> S1", "stateDiagram"),
            ("stateDiagram-v2\n  [*] --> S1", "stateDiagram-v2"),
            ("erDiagram\n  CUSTOMER", "erDiagram"),
            ("gantt\n  title A Gantt", "gantt"),
            ("pie\n  title Pets", "pie with newline"),
            ("pie \"title\"", "pie with space"),
            ("quadrantChart\n  title Chart", "quadrantChart"),
            ("requirementDiagram\n  requirement r", "requirementDiagram"),
            ("journey\n  title Journey", "journey"),
            ("gitGraph\n  commit", "gitGraph"),
            ("mindmap\n  root((mindmap))", "mindmap"),
            ("timeline\n  title Timeline", "timeline"),
            ("sankey-beta\n  a,b,1", "sankey"),
            ("xychart-beta\n  title Chart", "xychart"),
            ("block-beta\n  columns 1", "block-beta"),
            ("architecture-beta\n  group api", "architecture"),
            ("kanban\n  column", "kanban"),
            ("packet-beta\n  0-15: \"Source\"", "packet-beta"),
        ];
        for (text, name) in samples {
            assert!(is_diagram_notation(text), "expected {name} to be detected");
        }
    }

    #[test]
    fn test_leading_whitespace_is_trimmed() {
        assert!(is_diagram_notation("  graph TD\n  A --> B"));
        assert!(is_diagram_notation("\n\ngraph TD\n  A --> B"));
        assert!(is_diagram_notation("\t sequenceDiagram"));
    }

    #[test]
    fn test_rejects_ordinary_code() {
        let samples = [
            "function hello() {}",
            "def hello():\n  pass",
            "Hello World",
            "",
            "   \n  ",
            "graphics",
            "graph",
            "piece of cake",
            "flowcharts are fun",
            "SELECT * FROM users",
            "<div>HTML</div>",
        ];
        for text in samples {
            assert!(!is_diagram_notation(text), "expected {text:?} to be rejected");
        }
    }

    #[test]
    fn test_find_candidates_filters_and_orders() {
        let doc = MemoryDocument::from_xhtml(
            "<div>\
               <pre><code>graph TD\nA --> B</code></pre>\
               <pre><code>fn main() {}</code></pre>\
               <pre><code>sequenceDiagram\nA->>B: Hi</code></pre>\
               <pre><code>pie\ntitle Pets</code></pre>\
             </div>",
        )
        .unwrap();
        let selector = Selector::parse("pre > code").unwrap();

        let blocks = find_candidates(&doc, &selector);
        let texts: Vec<String> = blocks.iter().map(|&b| extract_notation(&doc, b)).collect();
        assert_eq!(
            texts,
            vec!["graph TD\nA --> B", "sequenceDiagram\nA->>B: Hi", "pie\ntitle Pets"]
        );
    }

    #[test]
    fn test_find_candidates_skips_marked_blocks() {
        let mut doc = MemoryDocument::from_xhtml(
            "<pre><code>graph TD\nA</code></pre><pre><code>gantt\ntitle G</code></pre>",
        )
        .unwrap();
        let selector = Selector::parse("pre > code").unwrap();

        let first = find_candidates(&doc, &selector)[0];
        doc.set_attribute(first, PROCESSED_ATTRIBUTE, "true").unwrap();

        let remaining = find_candidates(&doc, &selector);
        assert_eq!(remaining.len(), 1);
        assert_ne!(remaining[0], first);
    }

    #[test]
    fn test_find_candidates_does_not_mark() {
        let doc = MemoryDocument::from_xhtml("<pre><code>graph TD\nA</code></pre>").unwrap();
        let selector = Selector::parse("pre > code").unwrap();

        let first = find_candidates(&doc, &selector);
        let second = find_candidates(&doc, &selector);
        assert_eq!(first, second);
        assert_eq!(doc.get_attribute(first[0], PROCESSED_ATTRIBUTE), None);
    }

    #[test]
    fn test_find_candidates_empty_block() {
        let doc = MemoryDocument::from_xhtml("<pre><code/></pre>").unwrap();
        let selector = Selector::parse("pre > code").unwrap();
        assert!(find_candidates(&doc, &selector).is_empty());
    }

    #[test]
    fn test_extract_notation_trims() {
        let doc = MemoryDocument::from_xhtml("<pre><code>\n  graph TD\n  A --> B\n\n</code></pre>")
            .unwrap();
        let selector = Selector::parse("code").unwrap();
        let block = doc.query_selector_all(&selector)[0];
        assert_eq!(extract_notation(&doc, block), "graph TD\n  A --> B");
    }
}
