//! CSS-like selector subset.
//!
//! Supported syntax:
//! - type selectors (`pre`, `code`) and the universal selector (`*`)
//! - `.class`, `#id`, `[attr]`, `[attr="value"]`, combined into compounds
//! - descendant (whitespace) and child (`>`) combinators
//! - comma-separated selector lists
//!
//! Matching runs right to left, walking ancestors for each combinator.

use std::fmt;
use std::str::FromStr;

use crate::document::{Document, NodeId};
use crate::error::SelectorError;

/// Parsed selector list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    source: String,
    alternatives: Vec<Complex>,
}

/// Compounds joined by combinators: `compounds[i]` and `compounds[i + 1]`
/// are related by `combinators[i]`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Complex {
    compounds: Vec<Compound>,
    combinators: Vec<Combinator>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attributes: Vec<AttributeMatch>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct AttributeMatch {
    name: String,
    value: Option<String>,
}

impl Selector {
    /// Parse a selector list.
    ///
    /// # Errors
    ///
    /// Returns [`SelectorError`] for empty input, dangling combinators, or
    /// unsupported syntax.
    pub fn parse(source: &str) -> Result<Self, SelectorError> {
        let mut cursor = Cursor::new(source);
        let mut alternatives = Vec::new();

        loop {
            alternatives.push(cursor.complex()?);
            cursor.skip_whitespace();
            match cursor.peek() {
                None => break,
                Some(',') => {
                    cursor.bump();
                }
                Some(c) => return Err(cursor.error(&format!("unexpected character '{c}'"))),
            }
        }

        Ok(Self {
            source: source.to_owned(),
            alternatives,
        })
    }

    /// Selector source text as given to [`parse`](Self::parse).
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Whether `node` matches any alternative of this selector list.
    pub fn matches<D: Document + ?Sized>(&self, doc: &D, node: NodeId) -> bool {
        self.alternatives
            .iter()
            .any(|complex| complex.matches(doc, node))
    }
}

impl FromStr for Selector {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl Complex {
    fn matches<D: Document + ?Sized>(&self, doc: &D, node: NodeId) -> bool {
        let last = self.compounds.len() - 1;
        self.compounds[last].matches(doc, node) && self.matches_left_of(doc, node, last)
    }

    /// `node` matched `compounds[index]`; check everything to its left.
    fn matches_left_of<D: Document + ?Sized>(&self, doc: &D, node: NodeId, index: usize) -> bool {
        if index == 0 {
            return true;
        }
        let left = &self.compounds[index - 1];
        match self.combinators[index - 1] {
            Combinator::Child => doc.parent(node).is_some_and(|parent| {
                left.matches(doc, parent) && self.matches_left_of(doc, parent, index - 1)
            }),
            Combinator::Descendant => {
                let mut current = doc.parent(node);
                while let Some(ancestor) = current {
                    if left.matches(doc, ancestor) && self.matches_left_of(doc, ancestor, index - 1)
                    {
                        return true;
                    }
                    current = doc.parent(ancestor);
                }
                false
            }
        }
    }
}

impl Compound {
    fn is_empty(&self) -> bool {
        self.tag.is_none() && self.id.is_none() && self.classes.is_empty() && self.attributes.is_empty()
    }

    fn matches<D: Document + ?Sized>(&self, doc: &D, node: NodeId) -> bool {
        let Some(tag) = doc.tag_name(node) else {
            return false;
        };
        if let Some(expected) = &self.tag
            && !expected.eq_ignore_ascii_case(tag)
        {
            return false;
        }
        if let Some(id) = &self.id
            && doc.get_attribute(node, "id") != Some(id.as_str())
        {
            return false;
        }
        if !self.classes.iter().all(|class| doc.has_class(node, class)) {
            return false;
        }
        self.attributes.iter().all(|attr| {
            match (doc.get_attribute(node, &attr.name), &attr.value) {
                (None, _) => false,
                (Some(_), None) => true,
                (Some(actual), Some(expected)) => actual == expected,
            }
        })
    }
}

struct Cursor<'a> {
    source: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.chars().collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    /// Skip whitespace, returning whether any was consumed.
    fn skip_whitespace(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
        self.pos > start
    }

    fn error(&self, message: &str) -> SelectorError {
        SelectorError {
            selector: self.source.to_owned(),
            message: message.to_owned(),
        }
    }

    fn identifier(&mut self) -> Option<String> {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_alphanumeric() || c == '-' || c == '_')
        {
            self.pos += 1;
        }
        (self.pos > start).then(|| self.chars[start..self.pos].iter().collect())
    }

    fn expect_identifier(&mut self, what: &str) -> Result<String, SelectorError> {
        self.identifier()
            .ok_or_else(|| self.error(&format!("expected {what}")))
    }

    fn complex(&mut self) -> Result<Complex, SelectorError> {
        self.skip_whitespace();
        let mut compounds = vec![self.compound()?];
        let mut combinators = Vec::new();

        loop {
            let had_whitespace = self.skip_whitespace();
            let combinator = match self.peek() {
                None | Some(',') => break,
                Some('>') => {
                    self.bump();
                    self.skip_whitespace();
                    Combinator::Child
                }
                Some(_) if had_whitespace => Combinator::Descendant,
                Some(c) => return Err(self.error(&format!("unexpected character '{c}'"))),
            };
            combinators.push(combinator);
            compounds.push(self.compound()?);
        }

        Ok(Complex {
            compounds,
            combinators,
        })
    }

    fn compound(&mut self) -> Result<Compound, SelectorError> {
        let mut compound = Compound::default();

        if self.peek() == Some('*') {
            self.bump();
            compound.tag = None;
            return self.compound_tail(compound, true);
        }
        compound.tag = self.identifier().map(|tag| tag.to_ascii_lowercase());
        self.compound_tail(compound, false)
    }

    fn compound_tail(
        &mut self,
        mut compound: Compound,
        universal: bool,
    ) -> Result<Compound, SelectorError> {
        loop {
            match self.peek() {
                Some('.') => {
                    self.bump();
                    compound.classes.push(self.expect_identifier("class name")?);
                }
                Some('#') => {
                    self.bump();
                    compound.id = Some(self.expect_identifier("id")?);
                }
                Some('[') => {
                    self.bump();
                    compound.attributes.push(self.attribute()?);
                }
                _ => break,
            }
        }

        if compound.is_empty() && !universal {
            return Err(match self.peek() {
                None => self.error("expected selector"),
                Some(c) => self.error(&format!("unexpected character '{c}'")),
            });
        }
        Ok(compound)
    }

    fn attribute(&mut self) -> Result<AttributeMatch, SelectorError> {
        self.skip_whitespace();
        let name = self.expect_identifier("attribute name")?;
        self.skip_whitespace();

        let value = if self.peek() == Some('=') {
            self.bump();
            self.skip_whitespace();
            let value = match self.peek() {
                Some(quote @ ('"' | '\'')) => {
                    self.bump();
                    let start = self.pos;
                    while self.peek().is_some_and(|c| c != quote) {
                        self.pos += 1;
                    }
                    if self.peek().is_none() {
                        return Err(self.error("unterminated attribute value"));
                    }
                    let value: String = self.chars[start..self.pos].iter().collect();
                    self.bump();
                    value
                }
                _ => self.expect_identifier("attribute value")?,
            };
            self.skip_whitespace();
            Some(value)
        } else {
            None
        };

        if self.bump() != Some(']') {
            return Err(self.error("expected ']'"));
        }
        Ok(AttributeMatch { name, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryDocument;

    fn doc() -> MemoryDocument {
        MemoryDocument::from_xhtml(
            r#"<div id="main" class="content">
                <pre class="highlight"><code data-lang="mermaid">graph TD</code></pre>
                <section><p><code>inline</code></p></section>
            </div>"#,
        )
        .unwrap()
    }

    fn count(doc: &MemoryDocument, selector: &str) -> usize {
        doc.query_selector_all(&Selector::parse(selector).unwrap())
            .len()
    }

    #[test]
    fn test_child_combinator() {
        let doc = doc();
        assert_eq!(count(&doc, "pre > code"), 1);
        assert_eq!(count(&doc, "div > code"), 0);
    }

    #[test]
    fn test_descendant_combinator() {
        let doc = doc();
        assert_eq!(count(&doc, "div code"), 2);
        assert_eq!(count(&doc, "section code"), 1);
        assert_eq!(count(&doc, "body div > pre code"), 1);
    }

    #[test]
    fn test_compound_selectors() {
        let doc = doc();
        assert_eq!(count(&doc, "pre.highlight > code"), 1);
        assert_eq!(count(&doc, "pre.other > code"), 0);
        assert_eq!(count(&doc, "#main"), 1);
        assert_eq!(count(&doc, "div#main.content"), 1);
        assert_eq!(count(&doc, "code[data-lang]"), 1);
        assert_eq!(count(&doc, r#"code[data-lang="mermaid"]"#), 1);
        assert_eq!(count(&doc, "code[data-lang='rust']"), 0);
    }

    #[test]
    fn test_selector_list() {
        let doc = doc();
        assert_eq!(count(&doc, "pre > code, section code"), 2);
    }

    #[test]
    fn test_universal_selector() {
        let doc = doc();
        assert_eq!(count(&doc, "pre > *"), 1);
    }

    #[test]
    fn test_tag_case_insensitive() {
        let doc = doc();
        assert_eq!(count(&doc, "PRE > CODE"), 1);
    }

    #[test]
    fn test_invalid_selectors() {
        for source in ["", "pre >", "> code", "pre,,code", "code[", "code[x=\"y]", ".", "pre + code"] {
            assert!(Selector::parse(source).is_err(), "expected error for {source:?}");
        }
    }

    #[test]
    fn test_source_round_trip() {
        let selector: Selector = "pre > code".parse().unwrap();
        assert_eq!(selector.source(), "pre > code");
        assert_eq!(selector.to_string(), "pre > code");
    }
}
