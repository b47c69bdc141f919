//! In-place label editing on a node. The editing surface drives a
//! [`LabelEdit`] and hands the resulting [`LabelChange`] straight to the
//! controller.

use keyboard_types::{Key, NamedKey};
use snaapmap_core::Node;

/// A committed label edit, ready for `MindMapController::apply_label_change`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelChange {
    pub node_id: String,
    pub label: String,
}

#[derive(Debug, Clone)]
pub struct LabelEdit {
    node_id: String,
    original: String,
    draft: String,
}

pub enum LabelEditStep {
    Editing(LabelEdit),
    /// Editing ended. `None` when cancelled or the draft was blank.
    Finished(Option<LabelChange>),
}

impl LabelEdit {
    pub fn begin(node: &Node) -> Self {
        Self {
            node_id: node.id.clone(),
            original: node.label().to_string(),
            draft: node.label().to_string(),
        }
    }

    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.draft = text.into();
    }

    /// Abandon the edit; returns the label to show again.
    pub fn cancel(self) -> String {
        self.original
    }

    /// Enter or blur. A blank draft produces no change.
    pub fn finish(self) -> Option<LabelChange> {
        let label = self.draft.trim();
        if label.is_empty() {
            return None;
        }
        Some(LabelChange {
            node_id: self.node_id,
            label: label.to_string(),
        })
    }

    pub fn handle_key(self, key: &Key) -> LabelEditStep {
        match key {
            Key::Named(NamedKey::Enter) => LabelEditStep::Finished(self.finish()),
            Key::Named(NamedKey::Escape) => {
                self.cancel();
                LabelEditStep::Finished(None)
            }
            _ => LabelEditStep::Editing(self),
        }
    }
}
