//! Settings and configuration for Mermaid Viewer.
//!
//! Parses `mv.toml` settings files with serde and resolves per-domain
//! configuration for the page orchestrator.
//!
//! ```toml
//! global_enabled = true
//!
//! [domains._default]
//! selector = "pre > code"
//! auto_render = true
//! enabled = true
//!
//! [domains."github.com"]
//! selector = "div.highlight > pre"
//! auto_render = false
//!
//! [renderer]
//! kroki_url = "${KROKI_URL:-https://kroki.io}"
//! timeout_secs = 30
//! ```
//!
//! ## Environment Variable Expansion
//!
//! `renderer.kroki_url` supports `${VAR}` and `${VAR:-default}`.

mod domain;
mod expand;
mod provider;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub use domain::domain_from_url;
pub use provider::{ConfigProvider, FileConfigProvider, PageConfig, StaticConfigProvider};

/// Settings filename to search for.
pub const CONFIG_FILENAME: &str = "mv.toml";

/// Selector used when no domain-specific entry exists.
pub const DEFAULT_SELECTOR: &str = "pre > code";

/// Key of the fallback entry in [`Settings::domains`].
pub const DEFAULT_DOMAIN_KEY: &str = "_default";

/// Default Kroki server for diagram rendering.
pub const DEFAULT_KROKI_URL: &str = "https://kroki.io";

/// Per-domain configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DomainConfig {
    /// Selector for candidate code blocks.
    pub selector: String,
    /// Whether matched blocks switch to the diagram view immediately.
    pub auto_render: bool,
    /// Whether the viewer runs on this domain at all.
    pub enabled: bool,
}

impl Default for DomainConfig {
    fn default() -> Self {
        Self {
            selector: DEFAULT_SELECTOR.to_owned(),
            auto_render: true,
            enabled: true,
        }
    }
}

/// Renderer backend configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Kroki server URL.
    pub kroki_url: String,
    /// HTTP timeout for render requests in seconds.
    pub timeout_secs: u64,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            kroki_url: DEFAULT_KROKI_URL.to_owned(),
            timeout_secs: 30,
        }
    }
}

/// Viewer settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Master switch for every domain.
    pub global_enabled: bool,
    /// Per-domain configuration keyed by host name, plus [`DEFAULT_DOMAIN_KEY`].
    pub domains: BTreeMap<String, DomainConfig>,
    /// Renderer backend configuration.
    pub renderer: RendererConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            global_enabled: true,
            domains: BTreeMap::from([(DEFAULT_DOMAIN_KEY.to_owned(), DomainConfig::default())]),
            renderer: RendererConfig::default(),
        }
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// TOML serialization error.
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`renderer.kroki_url`").
        field: String,
        /// Error message (e.g., "${`KROKI_URL`} not set").
        message: String,
    },
    /// Settings source could not be reached.
    #[error("Configuration unavailable: {0}")]
    Unavailable(String),
}

impl Settings {
    /// Load settings from a file.
    ///
    /// # Errors
    ///
    /// Returns error if the file doesn't exist, cannot be parsed, or fails validation.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Load settings from a file, or defaults if the file doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns error if an existing file cannot be read, parsed, or validated.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!(path = %path.display(), "Settings file missing, using defaults");
            Ok(Self::default())
        }
    }

    /// Parse settings from TOML text, expanding and validating them.
    ///
    /// # Errors
    ///
    /// Returns error on invalid TOML, unset environment variables, or invalid values.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let mut settings: Self = toml::from_str(content)?;
        settings.renderer.kroki_url =
            expand::expand_env(&settings.renderer.kroki_url, "renderer.kroki_url")?;
        settings.validate()?;
        Ok(settings)
    }

    /// Write settings to a file as TOML.
    ///
    /// # Errors
    ///
    /// Returns error if serialization or writing fails.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Search for a settings file in the current directory and its parents.
    #[must_use]
    pub fn discover() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.renderer.kroki_url, "renderer.kroki_url")?;
        require_http_url(&self.renderer.kroki_url, "renderer.kroki_url")?;
        if self.renderer.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "renderer.timeout_secs must be greater than 0".to_owned(),
            ));
        }
        for (domain, config) in &self.domains {
            if config.selector.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "domains.{domain}.selector cannot be empty"
                )));
            }
        }
        Ok(())
    }

    /// Configuration for a domain, falling back to the `_default` entry and
    /// then to the built-in default.
    #[must_use]
    pub fn domain_config(&self, domain: &str) -> DomainConfig {
        self.domains
            .get(domain)
            .or_else(|| self.domains.get(DEFAULT_DOMAIN_KEY))
            .cloned()
            .unwrap_or_default()
    }

    /// Store configuration for a specific domain.
    pub fn set_domain_config(&mut self, domain: impl Into<String>, config: DomainConfig) {
        self.domains.insert(domain.into(), config);
    }

    /// Make a domain use the default configuration again.
    pub fn reset_domain_config(&mut self, domain: &str) {
        self.domains.remove(domain);
    }

    /// Toggle the master switch.
    pub fn set_global_enabled(&mut self, enabled: bool) {
        self.global_enabled = enabled;
    }
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Require a URL field to use http:// or https:// scheme.
fn require_http_url(url: &str, field: &str) -> Result<(), ConfigError> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::Validation(format!(
            "{field} must start with http:// or https://"
        )));
    }
    Ok(())
}
