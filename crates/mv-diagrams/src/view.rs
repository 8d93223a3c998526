//! Per-block code/diagram views.
//!
//! Each processed block gets a wrapper inserted right before its structural
//! element (the `<pre>` around a `<code>`):
//!
//! ```text
//! div.mermaid-viewer-wrapper
//! ├── div.mermaid-viewer-toolbar
//! │   └── div.mermaid-viewer-btn-group
//! │       ├── button[data-mermaid-view="code"]     "Code"
//! │       └── button[data-mermaid-view="diagram"]  "Diagram"
//! ├── div.mermaid-viewer-code      (deep clone of the original element)
//! └── div.mermaid-viewer-diagram   (hidden until rendered)
//! ```
//!
//! The original element stays in place with `display: none` so teardown can
//! restore it exactly.

use std::collections::{BTreeMap, HashMap};

use mv_dom::{Document, DomError, NodeId};

use crate::consts::{
    BUTTON_ACTIVE_CLASS, BUTTON_CLASS, BUTTON_GROUP_CLASS, CODE_LABEL, DIAGRAM_LABEL,
    DIAGRAM_PANE_CLASS, HIDDEN_CLASS, LOADING_HTML, PROCESSED_ATTRIBUTE, SOURCE_PANE_CLASS,
    TOOLBAR_CLASS, VIEW_ATTRIBUTE, WRAPPER_CLASS,
};
use crate::detector::extract_notation;
use crate::escape::escape_html;
use crate::library::DiagramLibrary;
use crate::renderer::{RenderOutcome, RendererAdapter};

/// Which pane of a container is visible.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ViewMode {
    /// Source pane.
    #[default]
    Code,
    /// Rendered diagram pane.
    Diagram,
}

impl ViewMode {
    fn as_str(self) -> &'static str {
        match self {
            Self::Code => "code",
            Self::Diagram => "diagram",
        }
    }
}

/// UI and view state for one processed block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Container {
    block: NodeId,
    wrapper: NodeId,
    code_view: NodeId,
    diagram_view: NodeId,
    code_button: NodeId,
    diagram_button: NodeId,
    original_element: NodeId,
    original_parent: NodeId,
    original_style: Option<String>,
    code: String,
    mode: ViewMode,
    rendered: bool,
}

impl Container {
    /// The marked block this container was built for.
    #[must_use]
    pub fn block(&self) -> NodeId {
        self.block
    }

    /// Inserted wrapper element.
    #[must_use]
    pub fn wrapper(&self) -> NodeId {
        self.wrapper
    }

    /// Source pane.
    #[must_use]
    pub fn code_view(&self) -> NodeId {
        self.code_view
    }

    /// Diagram pane.
    #[must_use]
    pub fn diagram_view(&self) -> NodeId {
        self.diagram_view
    }

    #[must_use]
    pub fn code_button(&self) -> NodeId {
        self.code_button
    }

    #[must_use]
    pub fn diagram_button(&self) -> NodeId {
        self.diagram_button
    }

    /// Element hidden in place of the wrapper.
    #[must_use]
    pub fn original_element(&self) -> NodeId {
        self.original_element
    }

    /// Parent the wrapper was spliced into.
    #[must_use]
    pub fn original_parent(&self) -> NodeId {
        self.original_parent
    }

    /// Notation captured when the container was built.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    #[must_use]
    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    /// Whether the diagram pane holds a successful render.
    #[must_use]
    pub fn rendered(&self) -> bool {
        self.rendered
    }

    fn button(&self, mode: ViewMode) -> NodeId {
        match mode {
            ViewMode::Code => self.code_button,
            ViewMode::Diagram => self.diagram_button,
        }
    }

    fn pane(&self, mode: ViewMode) -> NodeId {
        match mode {
            ViewMode::Code => self.code_view,
            ViewMode::Diagram => self.diagram_view,
        }
    }
}

/// Owns every container on a page, keyed by the processed block.
///
/// The container map is the teardown manifest: [`cleanup`](Self::cleanup)
/// undoes exactly what is registered here.
#[derive(Debug, Default)]
pub struct ViewController {
    containers: BTreeMap<NodeId, Container>,
    toggles: HashMap<NodeId, (NodeId, ViewMode)>,
}

impl ViewController {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered containers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.containers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.containers.is_empty()
    }

    /// Container registered for `block`.
    #[must_use]
    pub fn container(&self, block: NodeId) -> Option<&Container> {
        self.containers.get(&block)
    }

    /// All containers in node order.
    pub fn containers(&self) -> impl Iterator<Item = &Container> {
        self.containers.values()
    }

    /// Build the code/diagram UI for a detected block.
    ///
    /// The block is marked handled first. A block whose structural element
    /// has no parent to splice into is left marked and yields `Ok(None)`, so
    /// later scans skip it.
    ///
    /// Returns the container key, which is `block` itself.
    ///
    /// # Errors
    ///
    /// Returns [`DomError`] if the tree rejects one of the structural edits.
    pub fn build_container<D: Document + ?Sized>(
        &mut self,
        doc: &mut D,
        block: NodeId,
    ) -> Result<Option<NodeId>, DomError> {
        let code = extract_notation(&*doc, block);
        doc.set_attribute(block, PROCESSED_ATTRIBUTE, "true")?;

        let original_element = if doc.tag_name(block) == Some("code") {
            doc.parent(block)
        } else {
            Some(block)
        };
        let Some((original_element, original_parent)) =
            original_element.and_then(|element| Some((element, doc.parent(element)?)))
        else {
            tracing::warn!(?block, "No parent to insert viewer into, skipping block");
            return Ok(None);
        };

        let wrapper = element_with_class(doc, "div", WRAPPER_CLASS)?;
        let toolbar = element_with_class(doc, "div", TOOLBAR_CLASS)?;
        let group = element_with_class(doc, "div", BUTTON_GROUP_CLASS)?;
        let code_button = toggle_button(doc, CODE_LABEL, ViewMode::Code, true)?;
        let diagram_button = toggle_button(doc, DIAGRAM_LABEL, ViewMode::Diagram, false)?;
        doc.append_child(group, code_button)?;
        doc.append_child(group, diagram_button)?;
        doc.append_child(toolbar, group)?;

        let code_view = element_with_class(doc, "div", SOURCE_PANE_CLASS)?;
        let copy = doc.clone_node(original_element, true)?;
        doc.append_child(code_view, copy)?;

        let diagram_view = element_with_class(doc, "div", DIAGRAM_PANE_CLASS)?;
        doc.add_class(diagram_view, HIDDEN_CLASS)?;

        doc.append_child(wrapper, toolbar)?;
        doc.append_child(wrapper, code_view)?;
        doc.append_child(wrapper, diagram_view)?;

        let original_style = doc.get_attribute(original_element, "style").map(str::to_owned);
        doc.insert_before(original_parent, wrapper, Some(original_element))?;
        doc.set_style(original_element, "display", "none")?;

        self.toggles.insert(code_button, (block, ViewMode::Code));
        self.toggles.insert(diagram_button, (block, ViewMode::Diagram));
        self.containers.insert(
            block,
            Container {
                block,
                wrapper,
                code_view,
                diagram_view,
                code_button,
                diagram_button,
                original_element,
                original_parent,
                original_style,
                code,
                mode: ViewMode::Code,
                rendered: false,
            },
        );
        tracing::debug!(?block, "Built viewer container");

        Ok(Some(block))
    }

    /// Show one pane of a container, rendering the diagram on first use.
    ///
    /// Switching to the active mode does nothing, except that a diagram view
    /// whose render failed retries. A failed render leaves an escaped error
    /// message in the diagram pane and `rendered` unset.
    ///
    /// # Errors
    ///
    /// Returns [`DomError`] if the container's nodes no longer accept edits.
    pub async fn switch_view<D, L>(
        &mut self,
        doc: &mut D,
        renderer: &mut RendererAdapter<L>,
        key: NodeId,
        mode: ViewMode,
    ) -> Result<(), DomError>
    where
        D: Document + ?Sized,
        L: DiagramLibrary,
    {
        let Some(container) = self.containers.get(&key) else {
            return Ok(());
        };
        if container.mode == mode && (mode == ViewMode::Code || container.rendered) {
            return Ok(());
        }

        if mode == ViewMode::Diagram && !container.rendered {
            let diagram_view = container.diagram_view;
            let wrapper = container.wrapper;
            let code = container.code.clone();

            doc.set_inner_html(diagram_view, LOADING_HTML)?;
            let outcome = renderer.render(&*doc, &code).await;

            let Some(container) = self.containers.get_mut(&key) else {
                return Ok(());
            };
            if !doc.is_connected(wrapper) {
                tracing::debug!(block = ?key, "Viewer detached during render, discarding result");
                return Ok(());
            }
            match outcome {
                RenderOutcome::Markup(markup) => {
                    doc.set_inner_html(diagram_view, &markup)?;
                    container.rendered = true;
                }
                RenderOutcome::Error(message) => {
                    doc.set_inner_html(diagram_view, &error_markup(&message))?;
                }
            }
        }

        let Some(container) = self.containers.get_mut(&key) else {
            return Ok(());
        };
        let hidden = match mode {
            ViewMode::Code => ViewMode::Diagram,
            ViewMode::Diagram => ViewMode::Code,
        };
        doc.remove_class(container.pane(mode), HIDDEN_CLASS)?;
        doc.add_class(container.pane(hidden), HIDDEN_CLASS)?;
        doc.add_class(container.button(mode), BUTTON_ACTIVE_CLASS)?;
        doc.remove_class(container.button(hidden), BUTTON_ACTIVE_CLASS)?;
        container.mode = mode;

        Ok(())
    }

    /// Show the diagram view right away.
    ///
    /// # Errors
    ///
    /// Returns [`DomError`] if the container's nodes no longer accept edits.
    pub async fn auto_render<D, L>(
        &mut self,
        doc: &mut D,
        renderer: &mut RendererAdapter<L>,
        key: NodeId,
    ) -> Result<(), DomError>
    where
        D: Document + ?Sized,
        L: DiagramLibrary,
    {
        self.switch_view(doc, renderer, key, ViewMode::Diagram).await
    }

    /// Dispatch a click on `target` to the toggle it belongs to.
    ///
    /// Returns whether a registered toggle (or an element inside one) was hit.
    ///
    /// # Errors
    ///
    /// Returns [`DomError`] if the view switch fails.
    pub async fn handle_click<D, L>(
        &mut self,
        doc: &mut D,
        renderer: &mut RendererAdapter<L>,
        target: NodeId,
    ) -> Result<bool, DomError>
    where
        D: Document + ?Sized,
        L: DiagramLibrary,
    {
        let mut current = Some(target);
        while let Some(node) = current {
            if let Some(&(key, mode)) = self.toggles.get(&node) {
                self.switch_view(doc, renderer, key, mode).await?;
                return Ok(true);
            }
            current = doc.parent(node);
        }
        Ok(false)
    }

    /// Revert every container and forget them all.
    ///
    /// Restores each original element's inline style, removes the wrapper if
    /// it is still attached where it was inserted, and clears the handled
    /// marker. Edits the tree no longer accepts are logged and skipped.
    ///
    /// Returns the number of containers torn down.
    pub fn cleanup<D: Document + ?Sized>(&mut self, doc: &mut D) -> usize {
        let count = self.containers.len();
        for container in std::mem::take(&mut self.containers).into_values() {
            if let Err(e) = restore(doc, &container) {
                tracing::warn!(block = ?container.block, error = %e, "Failed to restore block");
            }
        }
        self.toggles.clear();
        if count > 0 {
            tracing::info!(count, "Removed viewer containers");
        }
        count
    }
}

fn restore<D: Document + ?Sized>(doc: &mut D, container: &Container) -> Result<(), DomError> {
    match &container.original_style {
        Some(style) => doc.set_attribute(container.original_element, "style", style)?,
        None => doc.remove_attribute(container.original_element, "style")?,
    }
    if doc.parent(container.wrapper) == Some(container.original_parent) {
        doc.remove_child(container.original_parent, container.wrapper)?;
    }
    doc.remove_attribute(container.block, PROCESSED_ATTRIBUTE)
}

fn element_with_class<D: Document + ?Sized>(
    doc: &mut D,
    tag: &str,
    class: &str,
) -> Result<NodeId, DomError> {
    let element = doc.create_element(tag);
    doc.set_attribute(element, "class", class)?;
    Ok(element)
}

fn toggle_button<D: Document + ?Sized>(
    doc: &mut D,
    label: &str,
    mode: ViewMode,
    active: bool,
) -> Result<NodeId, DomError> {
    let button = element_with_class(doc, "button", BUTTON_CLASS)?;
    if active {
        doc.add_class(button, BUTTON_ACTIVE_CLASS)?;
    }
    doc.set_attribute(button, "type", "button")?;
    doc.set_attribute(button, VIEW_ATTRIBUTE, mode.as_str())?;
    doc.set_text_content(button, label)?;
    Ok(button)
}

fn error_markup(message: &str) -> String {
    format!(
        r#"<div class="mermaid-viewer-error"><strong>Error rendering diagram:</strong><pre>{}</pre></div>"#,
        escape_html(message)
    )
}
