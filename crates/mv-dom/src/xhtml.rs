//! XHTML loading into a [`MemoryDocument`].

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::document::{Document, NodeId};
use crate::error::ParseError;
use crate::memory::MemoryDocument;

/// Parse `input` and attach the resulting nodes under `parent`.
///
/// Returns the top-level nodes created, in document order.
pub(crate) fn parse_into(
    doc: &mut MemoryDocument,
    parent: NodeId,
    input: &str,
) -> Result<Vec<NodeId>, ParseError> {
    let mut reader = Reader::from_str(input);
    reader.config_mut().trim_text(false);

    let mut stack = vec![parent];

    loop {
        let current = *stack.last().unwrap_or(&parent);
        match reader.read_event()? {
            Event::Start(e) => {
                let element = create_element(doc, &reader, &e)?;
                doc.attach(current, element, None);
                stack.push(element);
            }
            Event::Empty(e) => {
                let element = create_element(doc, &reader, &e)?;
                doc.attach(current, element, None);
            }
            Event::End(_) => {
                if stack.len() > 1 {
                    stack.pop();
                }
            }
            Event::Text(e) => {
                let text = reader.decoder().decode(&e)?;
                doc.append_text(current, &text);
            }
            Event::GeneralRef(e) => {
                let entity = reader.decoder().decode(&e)?;
                doc.append_text(current, &decode_entity(&entity));
            }
            Event::CData(e) => {
                let text = String::from_utf8_lossy(&e).into_owned();
                doc.append_text(current, &text);
            }
            Event::Eof => break,
            Event::Comment(_) | Event::Decl(_) | Event::PI(_) | Event::DocType(_) => {}
        }
    }

    Ok(doc.children(parent))
}

fn create_element(
    doc: &mut MemoryDocument,
    reader: &Reader<&[u8]>,
    e: &BytesStart,
) -> Result<NodeId, ParseError> {
    let tag = reader.decoder().decode(e.name().as_ref())?.into_owned();
    let mut attributes = Vec::new();
    for attr in e.attributes() {
        let attr = attr?;
        let key = reader.decoder().decode(attr.key.as_ref())?.into_owned();
        if key.starts_with("xmlns") {
            continue;
        }
        let value = attr.unescape_value()?.into_owned();
        attributes.push((key, value));
    }
    Ok(doc.push_element_with(&tag, attributes))
}

/// Decode a named or numeric entity reference (without `&` and `;`).
fn decode_entity(entity: &str) -> String {
    let named = match entity {
        "lt" => Some('<'),
        "gt" => Some('>'),
        "amp" => Some('&'),
        "apos" => Some('\''),
        "quot" => Some('"'),
        "nbsp" => Some('\u{00a0}'),
        _ => None,
    };
    if let Some(c) = named {
        return c.to_string();
    }

    let numeric = entity.strip_prefix('#').and_then(|code| {
        match code.strip_prefix('x').or_else(|| code.strip_prefix('X')) {
            Some(hex) => u32::from_str_radix(hex, 16).ok(),
            None => code.parse::<u32>().ok(),
        }
    });
    numeric
        .and_then(char::from_u32)
        .map_or_else(|| format!("&{entity};"), |c| c.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_nested_elements() {
        let doc = MemoryDocument::from_xhtml("<div><pre><code>graph TD</code></pre></div>").unwrap();
        let body = doc.body().unwrap();
        assert_eq!(
            doc.inner_html(body),
            "<div><pre><code>graph TD</code></pre></div>"
        );
    }

    #[test]
    fn test_parse_preserves_newlines_and_entities() {
        let doc = MemoryDocument::from_xhtml("<pre><code>graph TD\n  A --&gt; B&#x21;</code></pre>")
            .unwrap();
        let body = doc.body().unwrap();
        assert_eq!(doc.text_content(body), "graph TD\n  A --> B!");
    }

    #[test]
    fn test_parse_attributes() {
        let doc = MemoryDocument::from_xhtml(r#"<code class="language-mermaid" data-x="a &amp; b"/>"#)
            .unwrap();
        let body = doc.body().unwrap();
        let code = doc.children(body)[0];
        assert_eq!(doc.get_attribute(code, "class"), Some("language-mermaid"));
        assert_eq!(doc.get_attribute(code, "data-x"), Some("a & b"));
    }

    #[test]
    fn test_parse_mismatched_tags_fails() {
        assert!(MemoryDocument::from_xhtml("<pre><code>x</pre></code>").is_err());
    }

    #[test]
    fn test_decode_entity() {
        assert_eq!(decode_entity("lt"), "<");
        assert_eq!(decode_entity("#65"), "A");
        assert_eq!(decode_entity("#x41"), "A");
        assert_eq!(decode_entity("bogus"), "&bogus;");
    }
}
