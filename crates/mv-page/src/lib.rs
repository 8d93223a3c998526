//! Page orchestration for Mermaid Viewer.
//!
//! [`PageOrchestrator`] owns a document and drives the per-page lifecycle:
//! an initial pass over configured blocks, debounced re-scans as content
//! is added, and refresh/status requests from the host.
//!
//! # Example
//!
//! ```ignore
//! use mv_config::{Settings, StaticConfigProvider};
//! use mv_diagrams::KrokiLibrary;
//! use mv_page::PageOrchestrator;
//!
//! let provider = StaticConfigProvider::new(Settings::default());
//! let mut page = PageOrchestrator::new(doc, KrokiLibrary::new("https://kroki.io"), provider, "docs.example.com");
//! page.initialize().await?;
//! page.run(events).await;
//! ```

mod debouncer;
mod error;
mod event;
mod message;
mod orchestrator;

pub use debouncer::{DEFAULT_DEBOUNCE, ScanDebouncer};
pub use error::PageError;
pub use event::{DocumentEdit, PageEvent};
pub use message::{PageRequest, PageResponse};
pub use orchestrator::{PageOrchestrator, Phase};
