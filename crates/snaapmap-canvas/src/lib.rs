//! Mind map editing on top of `snaapmap-core`: deriving the map from
//! answers, applying canvas edits, shortcuts, viewport control and PNG export.

pub mod changes;
pub mod controller;
pub mod derive;
pub mod driver;
pub mod export;
pub mod label_edit;
pub mod shortcuts;
pub mod viewport;

pub use changes::{apply_edge_changes, apply_node_changes, EdgeChange, NodeChange};
pub use controller::{LogNotifier, MindMapController, Notifier};
pub use derive::materialize;
pub use driver::{spawn_snapshot_driver, SharedController, TokioClock};
pub use export::{ExportError, RasterOptions, RasterStrategy};
pub use label_edit::{LabelChange, LabelEdit, LabelEditStep};
pub use shortcuts::{shortcut_for, shortcut_for_event, EditorShortcut};
pub use viewport::{FitViewOptions, Viewport, ViewportActions, ViewportRegistry};
