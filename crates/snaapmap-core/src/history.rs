use crate::Graph;

pub const DEFAULT_CAPACITY: usize = 50;

/// Bounded undo/redo stack of whole-graph snapshots.
///
/// Once seeded, `cursor` always indexes a valid entry. Pushing past capacity
/// evicts the oldest entry and leaves the cursor on the newest one.
#[derive(Debug, Clone)]
pub struct HistoryStack {
    entries: Vec<Graph>,
    cursor: usize,
    capacity: usize,
}

impl Default for HistoryStack {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl HistoryStack {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Vec::new(),
            cursor: 0,
            capacity: capacity.max(1),
        }
    }

    /// Drop everything and start over with `graph` as the only entry.
    pub fn seed(&mut self, graph: Graph) {
        self.entries.clear();
        self.entries.push(graph);
        self.cursor = 0;
    }

    pub fn push(&mut self, graph: Graph) {
        if self.entries.is_empty() {
            self.seed(graph);
            return;
        }
        self.entries.truncate(self.cursor + 1);
        self.entries.push(graph);
        if self.entries.len() > self.capacity {
            let overflow = self.entries.len() - self.capacity;
            self.entries.drain(..overflow);
        }
        self.cursor = self.entries.len() - 1;
    }

    pub fn undo(&mut self) -> Option<&Graph> {
        if !self.can_undo() {
            return None;
        }
        self.cursor -= 1;
        self.entries.get(self.cursor)
    }

    pub fn redo(&mut self) -> Option<&Graph> {
        if !self.can_redo() {
            return None;
        }
        self.cursor += 1;
        self.entries.get(self.cursor)
    }

    pub fn can_undo(&self) -> bool {
        !self.entries.is_empty() && self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }

    pub fn current(&self) -> Option<&Graph> {
        self.entries.get(self.cursor)
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
