//! `mv process` command implementation.

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use clap::Args;
use mv_config::{StaticConfigProvider, domain_from_url};
use mv_diagrams::KrokiLibrary;
use mv_page::PageOrchestrator;

use super::{load_settings, read_page};
use crate::error::CliError;
use crate::output::{Output, block_count};

/// Arguments for the process command.
#[derive(Args)]
pub(crate) struct ProcessArgs {
    /// XHTML page to process.
    input: PathBuf,

    /// Address the page was loaded from, used to pick the domain configuration.
    #[arg(short, long)]
    url: Option<String>,

    /// Path to settings file (default: auto-discover mv.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Kroki server URL for diagram rendering (overrides settings).
    #[arg(long, env = "MV_KROKI_URL")]
    kroki_url: Option<String>,

    /// Write the processed page here instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long)]
    pub verbose: bool,
}

impl ProcessArgs {
    /// Execute the process command.
    ///
    /// # Errors
    ///
    /// Returns an error if the page or settings cannot be loaded, or the
    /// page cannot be written.
    pub(crate) async fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let settings = load_settings(self.config.as_deref(), self.kroki_url)?;
        let doc = read_page(&self.input)?;
        let domain = self.url.as_deref().map(domain_from_url).unwrap_or_default();

        output.info(&format!("Domain: {}", display_domain(&domain)));
        output.info(&format!("Kroki URL: {}", settings.renderer.kroki_url));

        let library = KrokiLibrary::with_timeout(
            settings.renderer.kroki_url.clone(),
            Duration::from_secs(settings.renderer.timeout_secs),
        );
        let provider = StaticConfigProvider::new(settings);
        let mut page = PageOrchestrator::new(doc, library, provider, domain);

        let created = page.initialize().await?;
        let processed = page.processed_count();
        if created == 0 {
            output.warning("No Mermaid blocks processed");
        } else {
            output.success(&format!(
                "Processed {} ({created} new)",
                block_count(processed)
            ));
        }

        let html = page.into_document().to_html();
        match &self.output {
            Some(path) => {
                std::fs::write(path, html)?;
                output.info(&format!("Wrote {}", path.display()));
            }
            None => std::io::stdout().write_all(html.as_bytes())?,
        }

        Ok(())
    }
}

/// Domain key as shown to the user.
fn display_domain(domain: &str) -> &str {
    if domain.is_empty() { "(default)" } else { domain }
}
