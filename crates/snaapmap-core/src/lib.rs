pub mod answers;
pub mod debounce;
pub mod error;
pub mod history;
pub mod settings;
pub mod storage;
pub mod store;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub use answers::{AnswerValue, SourceAnswers};
pub use error::{GraphError, StorageError};
pub use history::HistoryStack;
pub use store::{GraphStore, InitialSource};

/// Node id reserved for the protected root of every mind map.
pub const ROOT_ID: &str = "root";

// --- Types (matching the React Flow records the web canvas persisted) ---

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum NodeKind {
    Root,
    App,
    Feature,
    User,
    Benefit,
    #[default]
    Default,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, JsonSchema)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Size reported by the interaction surface after a node is measured or resized.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, JsonSchema)]
pub struct Dimensions {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct NodeData {
    #[serde(default)]
    pub label: String,
    #[serde(rename = "type", default)]
    pub kind: NodeKind,
}

/// A node in the mind map. Matches React Flow's Node structure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: String,
    #[serde(rename = "type", default = "default_node_type")]
    pub node_type: String,
    #[serde(default)]
    pub position: Position,
    pub data: NodeData,
    #[serde(default, skip_serializing_if = "is_false")]
    pub selected: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub measured: Option<Dimensions>,
}

fn default_node_type() -> String {
    "mindmap".to_string()
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl Node {
    pub fn new(id: impl Into<String>, kind: NodeKind, label: impl Into<String>, position: Position) -> Self {
        Self {
            id: id.into(),
            node_type: default_node_type(),
            position,
            data: NodeData {
                label: label.into(),
                kind,
            },
            selected: false,
            measured: None,
        }
    }

    pub fn kind(&self) -> NodeKind {
        self.data.kind
    }

    pub fn label(&self) -> &str {
        &self.data.label
    }

    /// Label as the canvas shows it; empty labels render as "Untitled".
    pub fn display_label(&self) -> &str {
        if self.data.label.is_empty() {
            "Untitled"
        } else {
            &self.data.label
        }
    }

    pub fn is_root(&self) -> bool {
        self.data.kind == NodeKind::Root
    }
}

/// An edge in the mind map. Matches React Flow's Edge structure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub selected: bool,
}

impl Edge {
    pub fn new(id: impl Into<String>, source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            selected: false,
        }
    }

    pub fn touches(&self, node_id: &str) -> bool {
        self.source == node_id || self.target == node_id
    }
}

/// The persisted record: `{ nodes, edges }`.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, JsonSchema)]
pub struct Graph {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
}

impl Graph {
    pub fn new(nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        Self { nodes, edges }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn node_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.node(id).is_some()
    }

    pub fn root(&self) -> Option<&Node> {
        self.nodes.iter().find(|n| n.is_root())
    }

    pub fn edge(&self, id: &str) -> Option<&Edge> {
        self.edges.iter().find(|e| e.id == id)
    }

    pub fn edge_between(&self, source: &str, target: &str) -> Option<&Edge> {
        self.edges
            .iter()
            .find(|e| e.source == source && e.target == target)
    }

    /// Remove the given nodes and every edge that references one of them.
    pub fn remove_nodes(&mut self, ids: &[String]) {
        let doomed: HashSet<&str> = ids.iter().map(String::as_str).collect();
        self.nodes.retain(|n| !doomed.contains(n.id.as_str()));
        self.edges
            .retain(|e| !doomed.contains(e.source.as_str()) && !doomed.contains(e.target.as_str()));
    }

    /// Check the structural invariants: unique ids, edges between existing
    /// nodes, exactly one root.
    pub fn validate(&self) -> Result<(), GraphError> {
        let mut node_ids = HashSet::new();
        for node in &self.nodes {
            if !node_ids.insert(node.id.as_str()) {
                return Err(GraphError::DuplicateNode(node.id.clone()));
            }
        }

        let mut edge_ids = HashSet::new();
        for edge in &self.edges {
            if !edge_ids.insert(edge.id.as_str()) {
                return Err(GraphError::DuplicateEdge(edge.id.clone()));
            }
            for endpoint in [&edge.source, &edge.target] {
                if !node_ids.contains(endpoint.as_str()) {
                    return Err(GraphError::DanglingEdge {
                        edge: edge.id.clone(),
                        node: endpoint.clone(),
                    });
                }
            }
        }

        match self.nodes.iter().filter(|n| n.is_root()).count() {
            0 => Err(GraphError::MissingRoot),
            1 => Ok(()),
            n => Err(GraphError::MultipleRoots(n)),
        }
    }
}

/// JSON Schema of the persisted `{ nodes, edges }` record.
pub fn graph_schema() -> schemars::Schema {
    schemars::schema_for!(Graph)
}

/// Generate the next node ID by scanning existing nodes: "node-{N}" with N incrementing.
/// Once the highest number is `u64::MAX`, the lowest free number is used instead.
pub fn next_node_id(graph: &Graph) -> String {
    let taken: HashSet<u64> = graph
        .nodes
        .iter()
        .filter_map(|n| n.id.strip_prefix("node-").and_then(|s| s.parse::<u64>().ok()))
        .collect();
    let max = taken.iter().copied().max().unwrap_or(0);
    let next = match max.checked_add(1) {
        Some(next) => next,
        // At most `nodes.len()` numbers are taken, so a free one exists in 1..=len+1.
        None => (1u64..)
            .find(|n| !taken.contains(n) && !graph.contains_node(&format!("node-{n}")))
            .unwrap_or(max),
    };
    format!("node-{next}")
}

/// Generate an edge ID from source and target node IDs.
pub fn make_edge_id(source: &str, target: &str) -> String {
    format!("edge-{}-{}", source, target)
}

/// Like [`make_edge_id`], but suffixed until it does not collide with an existing edge.
pub fn unique_edge_id(graph: &Graph, source: &str, target: &str) -> String {
    let base = make_edge_id(source, target);
    if graph.edge(&base).is_none() {
        return base;
    }
    (2u64..)
        .map(|n| format!("{base}-{n}"))
        .find(|candidate| graph.edge(candidate).is_none())
        .unwrap_or(base)
}
