//! Mermaid block detection, rendering, and view state.
//!
//! This crate turns Mermaid code blocks in a [`Document`](mv_dom::Document)
//! into toggleable code/diagram views:
//! - [`detector`]: keyword classifier and block scanner
//! - [`theme`]: host theme detection
//! - [`DiagramLibrary`]: seam to the opaque rendering library
//! - [`RendererAdapter`]: one-time initialization and render-or-error calls
//! - [`KrokiLibrary`]: rendering via a Kroki server
//! - [`ViewController`]: per-block containers with lazy rendering and teardown
//!
//! # Example
//!
//! ```ignore
//! use mv_diagrams::{KrokiLibrary, RendererAdapter, ViewController, find_candidates};
//!
//! let mut renderer = RendererAdapter::new(KrokiLibrary::new("https://kroki.io"));
//! let mut controller = ViewController::new();
//! for block in find_candidates(&doc, &selector) {
//!     if let Some(key) = controller.build_container(&mut doc, block)? {
//!         controller.auto_render(&mut doc, &mut renderer, key).await?;
//!     }
//! }
//! ```

mod consts;
pub mod detector;
mod escape;
mod kroki;
mod library;
#[cfg(any(test, feature = "mock"))]
mod mock;
mod renderer;
pub mod theme;
mod view;

pub use consts::{PROCESSED_ATTRIBUTE, SOURCE_PANE_CLASS, WRAPPER_CLASS};
pub use detector::{extract_notation, find_candidates, is_diagram_notation};
pub use escape::escape_html;
pub use kroki::KrokiLibrary;
pub use library::{DiagramLibrary, LibraryError, LibraryOptions, SecurityLevel};
#[cfg(any(test, feature = "mock"))]
pub use mock::MockLibrary;
pub use renderer::{RenderOutcome, RendererAdapter, RendererState};
pub use theme::{Theme, detect_theme};
pub use view::{Container, ViewController, ViewMode};
