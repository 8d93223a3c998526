//! Host theme detection.

use std::fmt;
use std::sync::LazyLock;

use mv_dom::Document;
use regex::Regex;

/// Matches `rgb(r, g, b)` and `rgba(r, g, b, a)` color values.
static RGB_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^rgba?\(\s*(\d{1,3})\s*,\s*(\d{1,3})\s*,\s*(\d{1,3})\s*(?:,\s*([0-9]*\.?[0-9]+)\s*)?\)$",
    )
    .expect("valid regex")
});

/// Matches `#rgb` and `#rrggbb` color values.
static HEX_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#([0-9a-fA-F]{3}|[0-9a-fA-F]{6})$").expect("valid regex"));

/// Luminance below which a background counts as dark.
const DARK_LUMINANCE_THRESHOLD: f64 = 0.5;

/// Theme passed to the diagram library.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Theme {
    /// Light host pages.
    #[default]
    Default,
    /// Dark host pages.
    Dark,
}

impl Theme {
    /// Theme name as understood by Mermaid.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Dark => "dark",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Detect whether the host page is dark.
///
/// Checks, first match wins:
/// 1. a `dark` class on the root or body element
/// 2. `data-theme="dark"` or `data-color-mode="dark"` on the root or body element
/// 3. the body background luminance (`0.299 R + 0.587 G + 0.114 B`, normalized) below 0.5
/// 4. the environment's dark color scheme preference
pub fn detect_theme<D: Document + ?Sized>(doc: &D) -> Theme {
    let root = doc.document_element();
    let body = doc.body();
    let elements: Vec<_> = std::iter::once(root).chain(body).collect();

    if elements.iter().any(|&node| doc.has_class(node, "dark")) {
        tracing::debug!("Dark theme from class");
        return Theme::Dark;
    }

    let dark_attribute = elements.iter().any(|&node| {
        ["data-theme", "data-color-mode"]
            .iter()
            .any(|name| doc.get_attribute(node, name) == Some("dark"))
    });
    if dark_attribute {
        tracing::debug!("Dark theme from data attribute");
        return Theme::Dark;
    }

    if let Some(body) = body
        && let Some(background) = doc.computed_style(body, "background-color")
        && let Some(luminance) = luminance(&background)
        && luminance < DARK_LUMINANCE_THRESHOLD
    {
        tracing::debug!(luminance, "Dark theme from background");
        return Theme::Dark;
    }

    if doc.prefers_dark_color_scheme() {
        tracing::debug!("Dark theme from color scheme preference");
        return Theme::Dark;
    }

    Theme::Default
}

/// Relative luminance of a CSS color in `[0, 1]`.
///
/// Returns `None` for unparseable and fully transparent colors.
fn luminance(color: &str) -> Option<f64> {
    let (r, g, b) = parse_color(color.trim())?;
    Some((0.299 * f64::from(r) + 0.587 * f64::from(g) + 0.114 * f64::from(b)) / 255.0)
}

fn parse_color(color: &str) -> Option<(u8, u8, u8)> {
    if let Some(caps) = RGB_PATTERN.captures(color) {
        if let Some(alpha) = caps.get(4)
            && alpha.as_str().parse::<f64>().ok()? == 0.0
        {
            return None;
        }
        let channel = |i: usize| caps[i].parse::<u8>().ok();
        return Some((channel(1)?, channel(2)?, channel(3)?));
    }

    let hex = &HEX_PATTERN.captures(color)?[1];
    let expanded: String = if hex.len() == 3 {
        hex.chars().flat_map(|c| [c, c]).collect()
    } else {
        hex.to_owned()
    };
    let channel = |i: usize| u8::from_str_radix(&expanded[i..i + 2], 16).ok();
    Some((channel(0)?, channel(2)?, channel(4)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mv_dom::MemoryDocument;
    use pretty_assertions::assert_eq;

    fn page(markup: &str) -> MemoryDocument {
        MemoryDocument::from_xhtml(markup).unwrap()
    }

    #[test]
    fn test_plain_page_is_default() {
        let doc = page("<html><head/><body><p>hello</p></body></html>");
        assert_eq!(detect_theme(&doc), Theme::Default);
    }

    #[test]
    fn test_dark_class_on_root() {
        let doc = page(r#"<html class="dark"><head/><body/></html>"#);
        assert_eq!(detect_theme(&doc), Theme::Dark);
    }

    #[test]
    fn test_dark_class_on_body() {
        let doc = page(r#"<html><head/><body class="page dark"/></html>"#);
        assert_eq!(detect_theme(&doc), Theme::Dark);
    }

    #[test]
    fn test_similar_class_is_not_dark() {
        let doc = page(r#"<html class="darkish"><head/><body/></html>"#);
        assert_eq!(detect_theme(&doc), Theme::Default);
    }

    #[test]
    fn test_data_attributes() {
        let doc = page(r#"<html data-theme="dark"><head/><body/></html>"#);
        assert_eq!(detect_theme(&doc), Theme::Dark);

        let doc = page(r#"<html><head/><body data-color-mode="dark"/></html>"#);
        assert_eq!(detect_theme(&doc), Theme::Dark);

        let doc = page(r#"<html data-theme="light"><head/><body/></html>"#);
        assert_eq!(detect_theme(&doc), Theme::Default);
    }

    #[test]
    fn test_background_luminance() {
        let doc = page(r#"<html><head/><body style="background-color: rgb(13, 17, 23)"/></html>"#);
        assert_eq!(detect_theme(&doc), Theme::Dark);

        let doc = page(r#"<html><head/><body style="background-color: rgb(255, 255, 255)"/></html>"#);
        assert_eq!(detect_theme(&doc), Theme::Default);

        let doc = page(r##"<html><head/><body style="background-color: #222"/></html>"##);
        assert_eq!(detect_theme(&doc), Theme::Dark);
    }

    #[test]
    fn test_transparent_background_is_ignored() {
        let doc = page(r#"<html><head/><body style="background-color: rgba(0, 0, 0, 0)"/></html>"#);
        assert_eq!(detect_theme(&doc), Theme::Default);
    }

    #[test]
    fn test_color_scheme_preference() {
        let mut doc = page("<html><head/><body/></html>");
        doc.set_prefers_dark_color_scheme(true);
        assert_eq!(detect_theme(&doc), Theme::Dark);
    }

    #[test]
    fn test_luminance_values() {
        assert_eq!(luminance("rgb(0, 0, 0)"), Some(0.0));
        assert_eq!(luminance("rgb(255, 255, 255)"), Some(1.0));
        assert_eq!(luminance("#ffffff"), Some(1.0));
        assert_eq!(luminance("rgba(255, 255, 255, 0.5)"), Some(1.0));
        assert_eq!(luminance("white"), None);
        assert_eq!(luminance("rgb(300, 0, 0)"), None);
    }

    #[test]
    fn test_theme_names() {
        assert_eq!(Theme::Dark.as_str(), "dark");
        assert_eq!(Theme::default().to_string(), "default");
    }
}
