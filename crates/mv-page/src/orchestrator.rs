//! Page lifecycle: initial pass, observation, refresh.

use std::time::Duration;

use mv_config::{ConfigProvider, PageConfig};
use mv_diagrams::{
    DiagramLibrary, PROCESSED_ATTRIBUTE, RendererAdapter, SOURCE_PANE_CLASS, ViewController,
    WRAPPER_CLASS, find_candidates,
};
use mv_dom::{Document, MutationBatch, NodeId, Selector};
use tokio::sync::mpsc;

use crate::debouncer::ScanDebouncer;
use crate::error::PageError;
use crate::event::PageEvent;
use crate::message::{PageRequest, PageResponse};

/// Lifecycle phase of a page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Phase {
    /// Nothing processed, no observation. Also the state of disabled pages.
    #[default]
    Idle,
    /// A pass is running.
    Scanning,
    /// Waiting for added content.
    Observing,
}

/// Configuration of the current page session.
#[derive(Debug, Clone)]
struct ActiveConfig {
    selector: Selector,
    auto_render: bool,
}

/// Drives detection, rendering, and teardown for one document.
///
/// All state lives on one task. Renders in a pass run one at a time in
/// document order.
pub struct PageOrchestrator<D, L, P> {
    doc: D,
    renderer: RendererAdapter<L>,
    controller: ViewController,
    provider: P,
    domain: String,
    config: Option<ActiveConfig>,
    phase: Phase,
    debouncer: ScanDebouncer,
}

impl<D, L, P> PageOrchestrator<D, L, P>
where
    D: Document,
    L: DiagramLibrary,
    P: ConfigProvider,
{
    /// Create an idle orchestrator.
    ///
    /// # Arguments
    ///
    /// * `doc` - Page document
    /// * `library` - Diagram library used for rendering
    /// * `provider` - Source of page configuration
    /// * `domain` - Domain key used for configuration lookup
    pub fn new(doc: D, library: L, provider: P, domain: impl Into<String>) -> Self {
        Self {
            doc,
            renderer: RendererAdapter::new(library),
            controller: ViewController::new(),
            provider,
            domain: domain.into(),
            config: None,
            phase: Phase::Idle,
            debouncer: ScanDebouncer::default(),
        }
    }

    /// Use a different debounce window for re-scans.
    #[must_use]
    pub fn with_debounce(mut self, window: Duration) -> Self {
        self.debouncer = ScanDebouncer::new(window);
        self
    }

    pub fn document(&self) -> &D {
        &self.doc
    }

    /// Mutable document access for hosts editing the page directly.
    ///
    /// Added nodes must still be reported through [`observe`](Self::observe).
    pub fn document_mut(&mut self) -> &mut D {
        &mut self.doc
    }

    /// Consume the orchestrator, returning the document.
    pub fn into_document(self) -> D {
        self.doc
    }

    pub fn controller(&self) -> &ViewController {
        &self.controller
    }

    pub fn renderer(&self) -> &RendererAdapter<L> {
        &self.renderer
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Whether a debounced re-scan is pending.
    #[must_use]
    pub fn scan_pending(&self) -> bool {
        self.debouncer.is_pending()
    }

    /// Load configuration and run the initial pass.
    ///
    /// A page that is disabled, or whose configuration cannot be fetched,
    /// stays idle and untouched. Returns the number of containers built.
    ///
    /// # Errors
    ///
    /// Returns [`PageError`] for an invalid selector or a rejected document edit.
    pub async fn initialize(&mut self) -> Result<usize, PageError> {
        self.phase = Phase::Idle;
        self.config = None;

        let config = match self.provider.get_configuration(&self.domain).await {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(domain = %self.domain, error = %e, "Configuration unavailable, leaving page untouched");
                return Ok(0);
            }
        };
        let PageConfig {
            selector,
            auto_render,
            enabled,
        } = config;
        if !enabled {
            tracing::info!(domain = %self.domain, "Disabled for domain");
            return Ok(0);
        }

        let selector = Selector::parse(&selector)?;
        self.config = Some(ActiveConfig {
            selector,
            auto_render,
        });
        self.renderer.initialize(&self.doc);

        self.phase = Phase::Scanning;
        let result = self.process_page().await;
        self.phase = Phase::Observing;
        result
    }

    /// Build containers for all unhandled blocks, rendering them when
    /// configured to.
    ///
    /// Returns the number of containers built. Does nothing while idle.
    ///
    /// # Errors
    ///
    /// Returns [`PageError`] if the document rejects an edit.
    pub async fn process_page(&mut self) -> Result<usize, PageError> {
        let Some(config) = &self.config else {
            return Ok(0);
        };
        let auto_render = config.auto_render;
        let blocks = find_candidates(&self.doc, &config.selector);

        let mut created = 0;
        for block in blocks {
            let Some(key) = self.controller.build_container(&mut self.doc, block)? else {
                continue;
            };
            created += 1;
            if auto_render {
                self.controller
                    .auto_render(&mut self.doc, &mut self.renderer, key)
                    .await?;
            }
        }

        if created > 0 {
            tracing::info!(created, total = self.controller.len(), "Processed page");
        }
        Ok(created)
    }

    /// React to a batch of added nodes.
    ///
    /// Schedules a debounced re-scan if an added node outside our own viewer
    /// markup matches, or contains a match for, the active selector. Returns
    /// whether the batch was relevant.
    pub fn observe(&mut self, batch: &MutationBatch) -> bool {
        if self.phase == Phase::Idle || batch.is_empty() {
            return false;
        }
        let Some(config) = &self.config else {
            return false;
        };

        let relevant = batch.added.iter().any(|&node| {
            !self.inside_viewer(node)
                && (self.doc.matches(node, &config.selector)
                    || self.doc.query_selector(node, &config.selector).is_some())
        });
        if relevant && self.debouncer.schedule() {
            tracing::debug!(added = batch.added.len(), "Scheduled re-scan");
        }
        relevant
    }

    /// Run a pass over newly added content. Failures are logged, never returned.
    pub async fn rescan(&mut self) -> usize {
        if self.phase == Phase::Idle || self.config.is_none() {
            return 0;
        }
        self.phase = Phase::Scanning;
        let created = match self.process_page().await {
            Ok(created) => created,
            Err(e) => {
                tracing::error!(error = %e, "Re-scan failed");
                0
            }
        };
        self.phase = Phase::Observing;
        created
    }

    /// Revert all changes to the document and stop observing.
    ///
    /// The page stays idle until [`initialize`](Self::initialize) or
    /// [`refresh`](Self::refresh) loads configuration again. Returns the
    /// number of containers removed.
    pub fn cleanup(&mut self) -> usize {
        self.debouncer.cancel();
        self.phase = Phase::Idle;
        self.config = None;
        self.controller.cleanup(&mut self.doc)
    }

    /// Clean up, then run the initial pass again with fresh configuration.
    ///
    /// The renderer picks up any theme change made since the last pass.
    ///
    /// # Errors
    ///
    /// Returns [`PageError`] as [`initialize`](Self::initialize) does.
    pub async fn refresh(&mut self) -> Result<usize, PageError> {
        let removed = self.cleanup();
        tracing::info!(removed, "Refreshing page");
        if self.renderer.state().initialized {
            self.renderer.reinitialize(&self.doc);
        }
        self.initialize().await
    }

    /// Answer a host request.
    pub async fn handle_request(&mut self, request: PageRequest) -> PageResponse {
        match request {
            PageRequest::Refresh => {
                let success = match self.refresh().await {
                    Ok(_) => true,
                    Err(e) => {
                        tracing::error!(error = %e, "Refresh failed");
                        false
                    }
                };
                PageResponse::Refreshed { success }
            }
            PageRequest::GetStatus => PageResponse::Status {
                domain: self.domain.clone(),
                processed_count: self.processed_count(),
            },
        }
    }

    /// Dispatch a click to the toggle under `target`.
    ///
    /// Returns whether a toggle was hit.
    pub async fn click(&mut self, target: NodeId) -> bool {
        match self
            .controller
            .handle_click(&mut self.doc, &mut self.renderer, target)
            .await
        {
            Ok(hit) => hit,
            Err(e) => {
                tracing::error!(error = %e, "Toggle failed");
                true
            }
        }
    }

    /// Number of handled blocks on the page.
    ///
    /// Copies of blocks shown inside source panes carry the marker too but
    /// are not counted.
    #[must_use]
    pub fn processed_count(&self) -> usize {
        let root = self.doc.document_element();
        std::iter::once(root)
            .chain(self.doc.descendants(root))
            .filter(|&node| self.doc.get_attribute(node, PROCESSED_ATTRIBUTE) == Some("true"))
            .filter(|&node| !self.has_ancestor_class(node, SOURCE_PANE_CLASS))
            .count()
    }

    /// Process events until the channel closes.
    ///
    /// A re-scan still pending when the channel closes runs before returning.
    pub async fn run(&mut self, mut events: mpsc::Receiver<PageEvent<D>>) {
        loop {
            let deadline = self.debouncer.deadline();
            tokio::select! {
                event = events.recv() => {
                    let Some(event) = event else {
                        break;
                    };
                    self.dispatch(event).await;
                }
                () = sleep_until(deadline), if deadline.is_some() => {
                    if self.debouncer.take_due() {
                        self.rescan().await;
                    }
                }
            }
        }

        if self.debouncer.is_pending() {
            self.debouncer.cancel();
            self.rescan().await;
        }
    }

    async fn dispatch(&mut self, event: PageEvent<D>) {
        match event {
            PageEvent::Mutations(batch) => {
                self.observe(&batch);
            }
            PageEvent::Edit(edit) => {
                if let Some(batch) = edit(&mut self.doc) {
                    self.observe(&batch);
                }
            }
            PageEvent::Click(target) => {
                self.click(target).await;
            }
            PageEvent::Request(request, responder) => {
                let response = self.handle_request(request).await;
                if responder.send(response).is_err() {
                    tracing::debug!(?request, "Requester went away before the response");
                }
            }
        }
    }

    fn inside_viewer(&self, node: NodeId) -> bool {
        self.has_ancestor_class(node, WRAPPER_CLASS)
    }

    /// Whether `node` or one of its ancestors has `class`.
    fn has_ancestor_class(&self, node: NodeId, class: &str) -> bool {
        let mut current = Some(node);
        while let Some(node) = current {
            if self.doc.has_class(node, class) {
                return true;
            }
            current = self.doc.parent(node);
        }
        false
    }
}

async fn sleep_until(deadline: Option<tokio::time::Instant>) {
    if let Some(deadline) = deadline {
        tokio::time::sleep_until(deadline).await;
    }
}
