//! CLI error types.

use mv_config::ConfigError;
use mv_dom::ParseError;
use mv_page::PageError;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("invalid page markup: {0}")]
    Parse(#[from] ParseError),

    #[error("{0}")]
    Page(#[from] PageError),

    #[error("{0}")]
    Validation(String),
}
