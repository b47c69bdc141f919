//! The authoritative mind map: current graph, undo history, and write-through
//! persistence under a single storage key.

use crate::debounce::{Clock, Debouncer, SystemClock};
use crate::settings::EditorSettings;
use crate::storage::KeyValueStore;
use crate::{Graph, HistoryStack, StorageError};

/// Where the graph adopted by [`GraphStore::initialize`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitialSource {
    Restored,
    Materialized,
}

pub struct GraphStore {
    graph: Graph,
    history: HistoryStack,
    snapshots: Debouncer<Graph>,
    storage: Box<dyn KeyValueStore>,
    storage_key: String,
    clock: Box<dyn Clock>,
    persistence_failures: usize,
}

impl GraphStore {
    pub fn new(storage: Box<dyn KeyValueStore>, settings: &EditorSettings) -> Self {
        Self {
            graph: Graph::default(),
            history: HistoryStack::new(settings.history_capacity),
            snapshots: Debouncer::new(settings.snapshot_debounce()),
            storage,
            storage_key: settings.storage_key.clone(),
            clock: Box::new(SystemClock),
            persistence_failures: 0,
        }
    }

    pub fn with_clock(mut self, clock: Box<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Adopt the persisted graph if there is a usable one, otherwise the
    /// graph built by `fallback`. Either way history is seeded with it.
    pub fn initialize<F>(&mut self, fallback: F) -> InitialSource
    where
        F: FnOnce() -> Graph,
    {
        self.snapshots.cancel();
        match self.restore() {
            Some(graph) => {
                tracing::info!(
                    key = %self.storage_key,
                    nodes = graph.nodes.len(),
                    edges = graph.edges.len(),
                    "restored mind map"
                );
                self.history.seed(graph.clone());
                self.graph = graph;
                InitialSource::Restored
            }
            None => {
                let graph = fallback();
                tracing::info!(
                    nodes = graph.nodes.len(),
                    edges = graph.edges.len(),
                    "materialized mind map"
                );
                self.reset(graph);
                InitialSource::Materialized
            }
        }
    }

    fn restore(&self) -> Option<Graph> {
        let raw = match self.storage.get(&self.storage_key) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                tracing::debug!(key = %self.storage_key, "no persisted mind map");
                return None;
            }
            Err(e) => {
                tracing::warn!(key = %self.storage_key, error = %e, "failed to read persisted mind map");
                return None;
            }
        };
        let graph: Graph = match serde_json::from_str(&raw) {
            Ok(graph) => graph,
            Err(e) => {
                tracing::warn!(key = %self.storage_key, error = %e, "discarding malformed mind map");
                return None;
            }
        };
        if graph.is_empty() {
            tracing::debug!(key = %self.storage_key, "persisted mind map is empty");
            return None;
        }
        if let Err(e) = graph.validate() {
            tracing::warn!(key = %self.storage_key, error = %e, "discarding invalid mind map");
            return None;
        }
        Some(graph)
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn history(&self) -> &HistoryStack {
        &self.history
    }

    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }

    /// Set the current graph without touching history.
    pub fn replace(&mut self, graph: Graph) {
        self.graph = graph;
        self.persist_current();
    }

    /// Replace the graph and restart history from it, dropping any pending snapshot.
    pub fn reset(&mut self, graph: Graph) {
        self.snapshots.cancel();
        self.history.seed(graph.clone());
        self.replace(graph);
    }

    /// Set the current graph and schedule a debounced history snapshot.
    pub fn commit(&mut self, graph: Graph) {
        let now = self.clock.now();
        if self.snapshots.schedule(graph.clone(), now) {
            tracing::trace!("coalesced pending history snapshot");
        }
        self.replace(graph);
    }

    /// Timer callback: take the snapshot if the quiet period has elapsed.
    pub fn tick(&mut self) -> bool {
        let now = self.clock.now();
        match self.snapshots.poll(now) {
            Some(graph) => {
                self.snapshot(graph);
                true
            }
            None => false,
        }
    }

    /// Take the pending snapshot now, if any.
    pub fn settle(&mut self) -> bool {
        match self.snapshots.flush() {
            Some(graph) => {
                self.snapshot(graph);
                true
            }
            None => false,
        }
    }

    pub fn has_pending_snapshot(&self) -> bool {
        self.snapshots.is_pending()
    }

    fn snapshot(&mut self, graph: Graph) {
        self.history.push(graph);
        tracing::debug!(
            entries = self.history.len(),
            cursor = self.history.cursor(),
            "history snapshot"
        );
    }

    pub fn can_undo(&self) -> bool {
        self.snapshots.is_pending() || self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        !self.snapshots.is_pending() && self.history.can_redo()
    }

    /// Step back one history entry. Returns whether the graph changed.
    pub fn undo(&mut self) -> bool {
        self.settle();
        let Some(entry) = self.history.undo().cloned() else {
            return false;
        };
        tracing::debug!(cursor = self.history.cursor(), "undo");
        self.replace(entry);
        true
    }

    /// Step forward one history entry. Returns whether the graph changed.
    pub fn redo(&mut self) -> bool {
        self.settle();
        let Some(entry) = self.history.redo().cloned() else {
            return false;
        };
        tracing::debug!(cursor = self.history.cursor(), "redo");
        self.replace(entry);
        true
    }

    /// Best-effort write of `graph` under the storage key. Failures are
    /// logged and counted; the in-memory graph stays authoritative.
    pub fn persist(&mut self, graph: &Graph) -> bool {
        let result = serde_json::to_string(graph)
            .map_err(StorageError::from)
            .and_then(|raw| self.storage.set(&self.storage_key, &raw));
        match result {
            Ok(()) => true,
            Err(e) => {
                self.persistence_failures += 1;
                if self.persistence_failures == 1 {
                    tracing::warn!(key = %self.storage_key, error = %e, "mind map not persisted; keeping it in memory");
                } else {
                    tracing::debug!(
                        key = %self.storage_key,
                        error = %e,
                        failures = self.persistence_failures,
                        "mind map not persisted"
                    );
                }
                false
            }
        }
    }

    fn persist_current(&mut self) {
        let graph = std::mem::take(&mut self.graph);
        self.persist(&graph);
        self.graph = graph;
    }

    pub fn persistence_failures(&self) -> usize {
        self.persistence_failures
    }

    /// Remove the persisted record so the next `initialize` materializes again.
    pub fn clear_persisted(&mut self) {
        if let Err(e) = self.storage.remove(&self.storage_key) {
            tracing::warn!(key = %self.storage_key, error = %e, "failed to clear persisted mind map");
        }
    }
}

impl std::fmt::Debug for GraphStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphStore")
            .field("graph", &self.graph)
            .field("history", &self.history)
            .field("storage_key", &self.storage_key)
            .field("pending_snapshot", &self.snapshots.is_pending())
            .field("persistence_failures", &self.persistence_failures)
            .finish()
    }
}
