//! CLI command implementations.

pub(crate) mod check;
pub(crate) mod process;

use std::path::Path;

use mv_config::Settings;
use mv_dom::MemoryDocument;

use crate::error::CliError;

pub(crate) use check::CheckArgs;
pub(crate) use process::ProcessArgs;

/// Load settings from `config`, or from a discovered `mv.toml`, applying
/// a Kroki URL override.
fn load_settings(config: Option<&Path>, kroki_url: Option<String>) -> Result<Settings, CliError> {
    let mut settings = match config {
        Some(path) => Settings::load(path)?,
        None => match Settings::discover() {
            Some(path) => {
                tracing::info!(path = %path.display(), "Using discovered settings");
                Settings::load(&path)?
            }
            None => Settings::default(),
        },
    };
    if let Some(kroki_url) = kroki_url {
        settings.renderer.kroki_url = kroki_url;
        settings.validate()?;
    }
    Ok(settings)
}

/// Read an XHTML page from disk.
fn read_page(path: &Path) -> Result<MemoryDocument, CliError> {
    let markup = std::fs::read_to_string(path)?;
    Ok(MemoryDocument::from_xhtml(&markup)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_load_settings_applies_kroki_override() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mv.toml");
        std::fs::write(&path, "[renderer]\nkroki_url = \"https://kroki.internal\"\n").unwrap();

        let settings = load_settings(Some(&path), None).unwrap();
        assert_eq!(settings.renderer.kroki_url, "https://kroki.internal");

        let settings =
            load_settings(Some(&path), Some("http://localhost:8000".to_owned())).unwrap();
        assert_eq!(settings.renderer.kroki_url, "http://localhost:8000");
    }

    #[test]
    fn test_load_settings_rejects_invalid_override() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mv.toml");
        std::fs::write(&path, "").unwrap();

        let result = load_settings(Some(&path), Some("ftp://kroki".to_owned()));
        assert!(matches!(result, Err(CliError::Config(_))));
    }

    #[test]
    fn test_read_page_reports_bad_markup() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.xhtml");
        std::fs::write(&path, "<pre><code>graph TD</pre>").unwrap();

        assert!(matches!(read_page(&path), Err(CliError::Parse(_))));
        assert!(matches!(
            read_page(&dir.path().join("missing.xhtml")),
            Err(CliError::Io(_))
        ));
    }
}
