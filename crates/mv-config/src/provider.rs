//! Configuration providers consumed by the page orchestrator.

use std::future::Future;
use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock};

use crate::{ConfigError, Settings};

/// Effective configuration for one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageConfig {
    /// Selector for candidate code blocks.
    pub selector: String,
    /// Whether matched blocks render immediately.
    pub auto_render: bool,
    /// Global and per-domain enablement combined.
    pub enabled: bool,
}

impl Settings {
    /// Resolve the effective page configuration for a domain.
    #[must_use]
    pub fn page_config(&self, domain: &str) -> PageConfig {
        let config = self.domain_config(domain);
        PageConfig {
            enabled: self.global_enabled && config.enabled,
            selector: config.selector,
            auto_render: config.auto_render,
        }
    }
}

/// Source of page configuration.
///
/// Retrieval is asynchronous since real providers sit behind a round trip
/// to an external settings store.
pub trait ConfigProvider {
    /// Fetch the configuration for a domain key.
    fn get_configuration(
        &self,
        domain: &str,
    ) -> impl Future<Output = Result<PageConfig, ConfigError>>;
}

/// Provider backed by in-memory settings.
///
/// Clones share the same settings, so a host can keep a handle, change the
/// settings, and trigger a refresh.
///
/// # Example
///
/// ```
/// use mv_config::{Settings, StaticConfigProvider};
///
/// let provider = StaticConfigProvider::new(Settings::default());
/// let handle = provider.clone();
/// handle.update(|settings| settings.set_global_enabled(false));
/// assert!(!provider.settings().global_enabled);
/// ```
#[derive(Debug, Clone, Default)]
pub struct StaticConfigProvider {
    settings: Arc<RwLock<Settings>>,
}

impl StaticConfigProvider {
    /// Create a provider serving `settings`.
    #[must_use]
    pub fn new(settings: Settings) -> Self {
        Self {
            settings: Arc::new(RwLock::new(settings)),
        }
    }

    /// Snapshot of the current settings.
    #[must_use]
    pub fn settings(&self) -> Settings {
        self.settings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Modify the shared settings in place.
    pub fn update(&self, f: impl FnOnce(&mut Settings)) {
        f(&mut self
            .settings
            .write()
            .unwrap_or_else(PoisonError::into_inner));
    }
}

impl ConfigProvider for StaticConfigProvider {
    async fn get_configuration(&self, domain: &str) -> Result<PageConfig, ConfigError> {
        Ok(self.settings().page_config(domain))
    }
}

/// Provider that re-reads a settings file on every request.
///
/// A refresh therefore observes edits made since the previous pass. A missing
/// file yields the default settings.
#[derive(Debug, Clone)]
pub struct FileConfigProvider {
    path: PathBuf,
}

impl FileConfigProvider {
    /// Create a provider reading `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ConfigProvider for FileConfigProvider {
    async fn get_configuration(&self, domain: &str) -> Result<PageConfig, ConfigError> {
        let settings = Settings::load_or_default(&self.path)?;
        Ok(settings.page_config(domain))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DomainConfig;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_page_config_combines_enablement() {
        let mut settings = Settings::default();
        assert!(settings.page_config("a.com").enabled);

        settings.set_global_enabled(false);
        assert!(!settings.page_config("a.com").enabled);

        settings.set_global_enabled(true);
        settings.set_domain_config(
            "a.com",
            DomainConfig {
                enabled: false,
                ..DomainConfig::default()
            },
        );
        assert!(!settings.page_config("a.com").enabled);
        assert!(settings.page_config("b.com").enabled);
    }

    #[tokio::test]
    async fn test_static_provider_sees_updates() {
        let provider = StaticConfigProvider::new(Settings::default());
        let config = provider.get_configuration("a.com").await.unwrap();
        assert!(config.auto_render);

        provider.update(|settings| {
            settings.set_domain_config(
                "a.com",
                DomainConfig {
                    auto_render: false,
                    ..DomainConfig::default()
                },
            );
        });
        let config = provider.get_configuration("a.com").await.unwrap();
        assert!(!config.auto_render);
    }

    #[tokio::test]
    async fn test_file_provider_rereads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mv.toml");
        let provider = FileConfigProvider::new(&path);

        let config = provider.get_configuration("a.com").await.unwrap();
        assert_eq!(
            config,
            PageConfig {
                selector: "pre > code".to_owned(),
                auto_render: true,
                enabled: true,
            }
        );

        std::fs::write(&path, "global_enabled = false\n").unwrap();
        let config = provider.get_configuration("a.com").await.unwrap();
        assert!(!config.enabled);
    }

    #[tokio::test]
    async fn test_file_provider_invalid_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mv.toml");
        std::fs::write(&path, "global_enabled = [").unwrap();

        let provider = FileConfigProvider::new(&path);
        assert!(provider.get_configuration("a.com").await.is_err());
    }
}
