//! Incremental changes reported by the interaction surface (drag, resize,
//! selection, removal), applied to a graph value.

use serde::{Deserialize, Serialize};
use snaapmap_core::{Dimensions, Edge, Graph, Node, Position};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum NodeChange {
    Position {
        id: String,
        position: Position,
        #[serde(default)]
        dragging: bool,
    },
    Dimensions {
        id: String,
        dimensions: Dimensions,
    },
    Select {
        id: String,
        selected: bool,
    },
    Remove {
        id: String,
    },
    Add {
        item: Node,
    },
    Replace {
        id: String,
        item: Node,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum EdgeChange {
    Select { id: String, selected: bool },
    Remove { id: String },
    Add { item: Edge },
    Replace { id: String, item: Edge },
}

/// Apply node changes in order. Changes that would break the graph's
/// invariants (removing or duplicating the root, reusing an id) are skipped.
/// Removing a node also removes its edges.
pub fn apply_node_changes(graph: &mut Graph, changes: &[NodeChange]) {
    for change in changes {
        match change {
            NodeChange::Position { id, position, .. } => {
                if let Some(node) = graph.node_mut(id) {
                    node.position = *position;
                }
            }
            NodeChange::Dimensions { id, dimensions } => {
                if let Some(node) = graph.node_mut(id) {
                    node.measured = Some(*dimensions);
                }
            }
            NodeChange::Select { id, selected } => {
                if let Some(node) = graph.node_mut(id) {
                    node.selected = *selected;
                }
            }
            NodeChange::Remove { id } => {
                if graph.node(id).is_some_and(Node::is_root) {
                    tracing::debug!(node = %id, "ignoring removal of the root node");
                    continue;
                }
                graph.remove_nodes(std::slice::from_ref(id));
            }
            NodeChange::Add { item } => {
                if graph.contains_node(&item.id) || (item.is_root() && graph.root().is_some()) {
                    tracing::debug!(node = %item.id, "ignoring conflicting node add");
                    continue;
                }
                graph.nodes.push(item.clone());
            }
            NodeChange::Replace { id, item } => {
                let Some(index) = graph.nodes.iter().position(|n| &n.id == id) else {
                    continue;
                };
                let current = &graph.nodes[index];
                let id_clash = item.id != *id && graph.contains_node(&item.id);
                if current.is_root() != item.is_root() || id_clash {
                    tracing::debug!(node = %id, "ignoring node replace that would break invariants");
                    continue;
                }
                if item.id != *id {
                    for edge in &mut graph.edges {
                        if edge.source == *id {
                            edge.source = item.id.clone();
                        }
                        if edge.target == *id {
                            edge.target = item.id.clone();
                        }
                    }
                }
                graph.nodes[index] = item.clone();
            }
        }
    }
}

/// Apply edge changes in order. Edges whose endpoints do not exist, or whose
/// id is already taken, are skipped.
pub fn apply_edge_changes(graph: &mut Graph, changes: &[EdgeChange]) {
    for change in changes {
        match change {
            EdgeChange::Select { id, selected } => {
                if let Some(edge) = graph.edges.iter_mut().find(|e| &e.id == id) {
                    edge.selected = *selected;
                }
            }
            EdgeChange::Remove { id } => graph.edges.retain(|e| &e.id != id),
            EdgeChange::Add { item } => {
                if graph.edge(&item.id).is_some() || !endpoints_exist(graph, item) {
                    continue;
                }
                graph.edges.push(item.clone());
            }
            EdgeChange::Replace { id, item } => {
                let id_clash = item.id != *id && graph.edge(&item.id).is_some();
                if id_clash || !endpoints_exist(graph, item) {
                    continue;
                }
                if let Some(edge) = graph.edges.iter_mut().find(|e| &e.id == id) {
                    *edge = item.clone();
                }
            }
        }
    }
}

fn endpoints_exist(graph: &Graph, edge: &Edge) -> bool {
    graph.contains_node(&edge.source) && graph.contains_node(&edge.target)
}
