use std::path::{Path, PathBuf};

use keyboard_types::KeyboardEvent;
use snaapmap_core::settings::EditorSettings;
use snaapmap_core::{
    next_node_id, unique_edge_id, Dimensions, Edge, Graph, GraphStore, InitialSource, Node,
    NodeKind, Position, SourceAnswers,
};

use crate::changes::{self, EdgeChange, NodeChange};
use crate::derive::materialize;
use crate::export::{self, ExportError, RasterOptions, RasterStrategy};
use crate::label_edit::LabelChange;
use crate::shortcuts::{shortcut_for_event, EditorShortcut};
use crate::viewport::{FitViewOptions, Viewport, ViewportRegistry};

/// Receives user-facing messages (export failures).
pub trait Notifier: Send {
    fn notify(&self, message: &str);
}

/// Default notifier: the message only goes to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, message: &str) {
        tracing::error!("{message}");
    }
}

/// Editing front end of the mind map. Every edit reads the current graph,
/// builds the next one, and commits it to the store.
pub struct MindMapController {
    store: GraphStore,
    settings: EditorSettings,
    viewport: ViewportRegistry,
    notifier: Box<dyn Notifier>,
    strategies: Vec<Box<dyn RasterStrategy>>,
}

impl MindMapController {
    pub fn new(store: GraphStore, settings: EditorSettings) -> Self {
        Self {
            store,
            settings,
            viewport: ViewportRegistry::new(),
            notifier: Box::new(LogNotifier),
            strategies: export::default_strategies(),
        }
    }

    pub fn with_viewport(mut self, viewport: ViewportRegistry) -> Self {
        self.viewport = viewport;
        self
    }

    pub fn with_notifier(mut self, notifier: Box<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_strategies(mut self, strategies: Vec<Box<dyn RasterStrategy>>) -> Self {
        self.strategies = strategies;
        self
    }

    /// Restore the persisted map, or derive one from `answers` if there is none.
    pub fn initialize(&mut self, answers: &SourceAnswers) -> InitialSource {
        self.store.initialize(|| materialize(answers))
    }

    pub fn graph(&self) -> &Graph {
        self.store.graph()
    }

    pub fn store(&self) -> &GraphStore {
        &self.store
    }

    pub fn settings(&self) -> &EditorSettings {
        &self.settings
    }

    /// Handle shared with whatever else drives the canvas zoom.
    pub fn viewport(&self) -> ViewportRegistry {
        self.viewport.clone()
    }

    // --- Editing ---

    /// Add a selected "New Node" at `position`. Returns its id.
    pub fn add_node(&mut self, position: Position) -> String {
        let mut graph = self.graph().clone();
        let id = next_node_id(&graph);
        let mut node = Node::new(id.clone(), NodeKind::Default, "New Node", position);
        node.selected = true;
        graph.nodes.push(node);
        tracing::debug!(node = %id, "added node");
        self.store.commit(graph);
        id
    }

    pub fn add_node_at_viewport_center(&mut self, viewport: &Viewport, screen: Dimensions) -> String {
        self.add_node(viewport.center(screen))
    }

    /// Blank or unchanged labels are ignored. Returns whether the graph changed.
    pub fn rename_node(&mut self, id: &str, label: &str) -> bool {
        let label = label.trim();
        if label.is_empty() {
            return false;
        }
        let mut graph = self.graph().clone();
        let Some(node) = graph.node_mut(id) else {
            return false;
        };
        if node.data.label == label {
            return false;
        }
        node.data.label = label.to_string();
        self.store.commit(graph);
        true
    }

    pub fn apply_label_change(&mut self, change: LabelChange) -> bool {
        self.rename_node(&change.node_id, &change.label)
    }

    pub fn move_node(&mut self, id: &str, position: Position) -> bool {
        if !self.graph().contains_node(id) {
            return false;
        }
        self.apply_node_changes(&[NodeChange::Position {
            id: id.to_string(),
            position,
            dragging: false,
        }]);
        true
    }

    /// Commit the batch only if it changed the graph.
    pub fn apply_node_changes(&mut self, changes: &[NodeChange]) {
        if changes.is_empty() {
            return;
        }
        let mut graph = self.graph().clone();
        changes::apply_node_changes(&mut graph, changes);
        if graph == *self.graph() {
            return;
        }
        self.store.commit(graph);
    }

    pub fn apply_edge_changes(&mut self, changes: &[EdgeChange]) {
        if changes.is_empty() {
            return;
        }
        let mut graph = self.graph().clone();
        changes::apply_edge_changes(&mut graph, changes);
        if graph == *self.graph() {
            return;
        }
        self.store.commit(graph);
    }

    /// Draw an edge. Self-loops, unknown endpoints, and an edge that already
    /// joins the same pair in the same direction are rejected. Returns the new
    /// edge id.
    pub fn connect(&mut self, source: &str, target: &str) -> Option<String> {
        let graph = self.graph();
        if source == target
            || !graph.contains_node(source)
            || !graph.contains_node(target)
            || graph.edge_between(source, target).is_some()
        {
            tracing::debug!(%source, %target, "connection rejected");
            return None;
        }
        let mut graph = graph.clone();
        let id = unique_edge_id(&graph, source, target);
        graph.edges.push(Edge::new(id.clone(), source, target));
        self.store.commit(graph);
        Some(id)
    }

    /// Delete nodes and their edges. A request that includes the root is
    /// rejected as a whole. Returns whether anything was deleted.
    pub fn delete_nodes(&mut self, ids: &[String]) -> bool {
        let graph = self.graph();
        if ids.iter().any(|id| graph.node(id).is_some_and(Node::is_root)) {
            tracing::debug!("deletion rejected: request includes the root node");
            return false;
        }
        if !ids.iter().any(|id| graph.contains_node(id)) {
            return false;
        }
        let mut graph = graph.clone();
        graph.remove_nodes(ids);
        self.store.commit(graph);
        true
    }

    /// Rebuild the map from `answers`, discarding manual edits and history.
    pub fn resync_from_source_answers(&mut self, answers: &SourceAnswers) {
        tracing::info!("resyncing mind map from answers");
        self.store.reset(materialize(answers));
    }

    /// Forget the persisted map and start over from `answers`.
    pub fn clear(&mut self, answers: &SourceAnswers) {
        self.store.clear_persisted();
        self.resync_from_source_answers(answers);
    }

    // --- History ---

    pub fn undo(&mut self) -> bool {
        self.store.undo()
    }

    pub fn redo(&mut self) -> bool {
        self.store.redo()
    }

    /// Debounce timer callback; see [`GraphStore::tick`].
    pub fn tick(&mut self) -> bool {
        self.store.tick()
    }

    pub fn settle(&mut self) -> bool {
        self.store.settle()
    }

    pub fn handle_shortcut(&mut self, shortcut: EditorShortcut) -> bool {
        match shortcut {
            EditorShortcut::Undo => self.undo(),
            EditorShortcut::Redo => self.redo(),
        }
    }

    /// Dispatch undo/redo accelerators. Returns true when the event was a
    /// shortcut, whether or not history moved.
    pub fn handle_key_event(&mut self, event: &KeyboardEvent) -> bool {
        match shortcut_for_event(event) {
            Some(shortcut) => {
                self.handle_shortcut(shortcut);
                true
            }
            None => false,
        }
    }

    // --- Viewport ---

    pub fn zoom_in(&self) {
        self.viewport.zoom_in();
    }

    pub fn zoom_out(&self) {
        self.viewport.zoom_out();
    }

    /// Fit the whole map using the configured padding.
    pub fn fit_view(&self) {
        self.viewport.fit_view(FitViewOptions {
            padding: Some(self.settings.fit_view_padding),
        });
    }

    // --- Export ---

    /// Render the map to `<dir>/<export file name>`. On failure the user is
    /// notified once and `None` is returned.
    pub fn export_raster(&self, dir: &Path) -> Option<PathBuf> {
        match self.try_export(dir) {
            Ok(path) => {
                tracing::info!(path = %path.display(), "exported mind map");
                Some(path)
            }
            Err(e) => {
                tracing::warn!(error = %e, "mind map export failed");
                self.notifier.notify(&format!("Failed to export PNG: {e}"));
                None
            }
        }
    }

    fn try_export(&self, dir: &Path) -> Result<PathBuf, ExportError> {
        let options = RasterOptions {
            scale: self.settings.export_scale,
            background: self.settings.export_background.clone(),
        };
        let bytes = export::render_png(self.graph(), &options, &self.strategies)?;
        export::write_png(dir, &self.settings.export_file_name, &bytes)
    }
}
