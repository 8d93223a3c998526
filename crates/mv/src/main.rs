//! Mermaid Viewer CLI.
//!
//! Provides commands for:
//! - `process`: Add code/diagram toggles to the Mermaid blocks of a page
//! - `check`: Validate the Mermaid blocks of a page

mod commands;
mod error;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{CheckArgs, ProcessArgs};
use error::CliError;
use output::Output;

/// Mermaid Viewer - toggle Mermaid code blocks into diagrams.
#[derive(Parser)]
#[command(name = "mv", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process a page and write the augmented HTML.
    Process(ProcessArgs),
    /// Validate every Mermaid block on a page.
    Check(CheckArgs),
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    let verbose = match &cli.command {
        Commands::Process(args) => args.verbose,
        Commands::Check(args) => args.verbose,
    };

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let filter = if verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(CliError::from)
        .and_then(|rt| match cli.command {
            Commands::Process(args) => rt.block_on(args.execute()),
            Commands::Check(args) => rt.block_on(args.execute()),
        });

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}
