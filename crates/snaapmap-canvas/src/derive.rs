//! Build the starting mind map from questionnaire answers.

use snaapmap_core::{Edge, Graph, Node, NodeKind, Position, SourceAnswers, ROOT_ID};

pub const APP_NAME: &str = "app_name";
pub const PRIMARY_USERS: &str = "primary_users";
pub const KEY_ACTIONS: &str = "key_actions";
pub const CORE_VALUE: &str = "core_value";

const MAX_FEATURES: usize = 5;
const MAX_BENEFITS: usize = 3;

fn split_items(answers: &SourceAnswers, question_id: &str, limit: usize) -> Vec<String> {
    answers
        .pieces(question_id)
        .into_iter()
        .flat_map(|piece| piece.split([',', ';', '\n']))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .take(limit)
        .map(str::to_string)
        .collect()
}

fn or_placeholders(items: Vec<String>, placeholders: &[&str]) -> Vec<String> {
    if items.is_empty() {
        placeholders.iter().map(|s| s.to_string()).collect()
    } else {
        items
    }
}

/// Derive a graph from the answers. Identical answers give identical graphs.
pub fn materialize(answers: &SourceAnswers) -> Graph {
    let app_name = answers.text(APP_NAME).unwrap_or_else(|| "My App".to_string());
    let primary_users = answers
        .text(PRIMARY_USERS)
        .unwrap_or_else(|| "Users".to_string());
    let features = or_placeholders(
        split_items(answers, KEY_ACTIONS, MAX_FEATURES),
        &["Feature 1", "Feature 2"],
    );
    let benefits = or_placeholders(
        split_items(answers, CORE_VALUE, MAX_BENEFITS),
        &["Benefit 1"],
    );

    let mut nodes = vec![
        Node::new(ROOT_ID, NodeKind::Root, app_name, Position::new(250.0, 50.0)),
        Node::new("users", NodeKind::User, primary_users, Position::new(50.0, 180.0)),
    ];
    let mut edges = vec![Edge::new("root-users", ROOT_ID, "users")];

    for (i, label) in features.into_iter().enumerate() {
        let id = format!("feature-{i}");
        let offset = i as f64;
        nodes.push(Node::new(
            id.clone(),
            NodeKind::Feature,
            label,
            Position::new(200.0 + offset * 100.0, 200.0 + offset * 40.0),
        ));
        edges.push(Edge::new(format!("root-{id}"), ROOT_ID, id));
    }

    for (i, label) in benefits.into_iter().enumerate() {
        let id = format!("benefit-{i}");
        nodes.push(Node::new(
            id.clone(),
            NodeKind::Benefit,
            label,
            Position::new(350.0, 320.0 + i as f64 * 60.0),
        ));
        edges.push(Edge::new(format!("root-{id}"), ROOT_ID, id));
    }

    Graph::new(nodes, edges)
}

#[cfg(test)]
mod tests {
    use super::*;
    use snaapmap_core::AnswerValue;

    fn labels_of(graph: &Graph, kind: NodeKind) -> Vec<&str> {
        graph
            .nodes
            .iter()
            .filter(|n| n.kind() == kind)
            .map(|n| n.label())
            .collect()
    }

    #[test]
    fn taskflow_answers() {
        let answers = SourceAnswers::new()
            .with_text(APP_NAME, "TaskFlow")
            .with_text(PRIMARY_USERS, "Freelancers")
            .with_text(KEY_ACTIONS, "Create tasks, Assign tasks")
            .with_text(CORE_VALUE, "Saves time");

        let graph = materialize(&answers);

        assert_eq!(labels_of(&graph, NodeKind::Root), vec!["TaskFlow"]);
        assert_eq!(labels_of(&graph, NodeKind::User), vec!["Freelancers"]);
        assert_eq!(labels_of(&graph, NodeKind::Feature), vec!["Create tasks", "Assign tasks"]);
        assert_eq!(labels_of(&graph, NodeKind::Benefit), vec!["Saves time"]);
        assert_eq!(graph.edges.len(), 4);
        assert!(graph.edges.iter().all(|e| e.source == ROOT_ID));
        assert!(graph.validate().is_ok());
    }

    #[test]
    fn empty_answers_use_placeholders() {
        let graph = materialize(&SourceAnswers::new());

        assert_eq!(labels_of(&graph, NodeKind::Root), vec!["My App"]);
        assert_eq!(labels_of(&graph, NodeKind::User), vec!["Users"]);
        assert_eq!(labels_of(&graph, NodeKind::Feature), vec!["Feature 1", "Feature 2"]);
        assert_eq!(labels_of(&graph, NodeKind::Benefit), vec!["Benefit 1"]);
        assert_eq!(graph.edges.len(), 4);
    }

    #[test]
    fn splits_on_all_separators_and_caps_counts() {
        let answers = SourceAnswers::new()
            .with_text(KEY_ACTIONS, "a; b,\n c ,, d;e;f;g")
            .with_text(CORE_VALUE, "one\ntwo\nthree\nfour");

        let graph = materialize(&answers);

        assert_eq!(labels_of(&graph, NodeKind::Feature), vec!["a", "b", "c", "d", "e"]);
        assert_eq!(labels_of(&graph, NodeKind::Benefit), vec!["one", "two", "three"]);
    }

    #[test]
    fn separator_only_answer_falls_back() {
        let answers = SourceAnswers::new().with_text(KEY_ACTIONS, " , ;\n");
        let graph = materialize(&answers);
        assert_eq!(labels_of(&graph, NodeKind::Feature), vec!["Feature 1", "Feature 2"]);
    }

    #[test]
    fn list_answers_are_split_per_item() {
        let answers = SourceAnswers::new()
            .with(
                KEY_ACTIONS,
                AnswerValue::List(vec!["Plan, Track".to_string(), "Share".to_string()]),
            )
            .with(
                PRIMARY_USERS,
                AnswerValue::List(vec!["Students".to_string(), "Parents".to_string()]),
            );

        let graph = materialize(&answers);

        assert_eq!(labels_of(&graph, NodeKind::Feature), vec!["Plan", "Track", "Share"]);
        assert_eq!(labels_of(&graph, NodeKind::User), vec!["Students, Parents"]);
    }

    #[test]
    fn materialization_is_idempotent_and_clear_of_the_root() {
        let answers = SourceAnswers::new().with_text(KEY_ACTIONS, "a,b,c,d,e");
        let first = materialize(&answers);
        assert_eq!(first, materialize(&answers));

        let root = first.root().unwrap().position;
        for node in first.nodes.iter().filter(|n| !n.is_root()) {
            let dx = (node.position.x - root.x).abs();
            let dy = (node.position.y - root.y).abs();
            assert!(dx >= 120.0 || dy >= 40.0, "{} overlaps the root", node.id);
        }
    }
}
