//! `mv check` command implementation.

use std::path::PathBuf;
use std::time::Duration;

use clap::Args;
use mv_config::domain_from_url;
use mv_diagrams::{KrokiLibrary, RendererAdapter, extract_notation, find_candidates};
use mv_dom::Selector;

use super::{load_settings, read_page};
use crate::error::CliError;
use crate::output::{Output, block_count};

/// Arguments for the check command.
#[derive(Args)]
pub(crate) struct CheckArgs {
    /// XHTML page to check.
    input: PathBuf,

    /// Address the page was loaded from, used to pick the domain configuration.
    #[arg(short, long)]
    url: Option<String>,

    /// Path to settings file (default: auto-discover mv.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Kroki server URL for diagram validation (overrides settings).
    #[arg(long, env = "MV_KROKI_URL")]
    kroki_url: Option<String>,

    /// Enable verbose output.
    #[arg(short, long)]
    pub verbose: bool,
}

impl CheckArgs {
    /// Execute the check command.
    ///
    /// # Errors
    ///
    /// Returns an error if loading fails or any block does not parse.
    pub(crate) async fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let settings = load_settings(self.config.as_deref(), self.kroki_url)?;
        let doc = read_page(&self.input)?;
        let domain = self.url.as_deref().map(domain_from_url).unwrap_or_default();
        let config = settings.domain_config(&domain);
        let selector =
            Selector::parse(&config.selector).map_err(|e| CliError::Validation(e.to_string()))?;

        let mut renderer = RendererAdapter::new(KrokiLibrary::with_timeout(
            settings.renderer.kroki_url.clone(),
            Duration::from_secs(settings.renderer.timeout_secs),
        ));
        renderer.initialize(&doc);

        let blocks = find_candidates(&doc, &selector);
        output.heading(&format!(
            "Found {} matching '{selector}'",
            block_count(blocks.len())
        ));

        let mut failed = 0;
        for (index, &block) in blocks.iter().enumerate() {
            let notation = extract_notation(&doc, block);
            let kind = notation.split_whitespace().next().unwrap_or_default();
            match renderer.parse(&notation).await {
                Ok(()) => output.block_result(index, kind, None),
                Err(e) => {
                    failed += 1;
                    output.block_result(index, kind, Some(e.message()));
                }
            }
        }

        if failed > 0 {
            return Err(CliError::Validation(format!(
                "{failed} of {} failed to parse",
                block_count(blocks.len())
            )));
        }
        Ok(())
    }
}
