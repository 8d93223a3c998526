//! HTML escaping for text injected as markup.

/// Escape text for safe inclusion in HTML element content or attribute values.
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_markup() {
        assert_eq!(
            escape_html(r#"<img src=x onerror="alert('x')">"#),
            "&lt;img src=x onerror=&quot;alert(&#39;x&#39;)&quot;&gt;"
        );
    }

    #[test]
    fn test_escape_plain_text_unchanged() {
        assert_eq!(escape_html("Parse error on line 2"), "Parse error on line 2");
    }

    #[test]
    fn test_escape_ampersand_first() {
        assert_eq!(escape_html("&lt;"), "&amp;lt;");
    }
}
