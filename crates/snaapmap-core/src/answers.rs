use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One questionnaire answer: free text or a list of picked options.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum AnswerValue {
    Text(String),
    List(Vec<String>),
}

/// Sparse question-id → answer map owned by the questionnaire. Read-only here.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct SourceAnswers(BTreeMap<String, AnswerValue>);

impl SourceAnswers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    pub fn with(mut self, question_id: impl Into<String>, value: AnswerValue) -> Self {
        self.0.insert(question_id.into(), value);
        self
    }

    pub fn with_text(self, question_id: impl Into<String>, text: impl Into<String>) -> Self {
        self.with(question_id, AnswerValue::Text(text.into()))
    }

    pub fn get(&self, question_id: &str) -> Option<&AnswerValue> {
        self.0.get(question_id)
    }

    /// Single-value view of an answer: lists are joined with ", ". Blank answers count as absent.
    pub fn text(&self, question_id: &str) -> Option<String> {
        let text = match self.get(question_id)? {
            AnswerValue::Text(s) => s.trim().to_string(),
            AnswerValue::List(items) => items
                .iter()
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join(", "),
        };
        (!text.is_empty()).then_some(text)
    }

    /// Raw pieces of an answer, one per list item (a text answer is a single piece).
    pub fn pieces(&self, question_id: &str) -> Vec<&str> {
        match self.get(question_id) {
            Some(AnswerValue::Text(s)) => vec![s.as_str()],
            Some(AnswerValue::List(items)) => items.iter().map(String::as_str).collect(),
            None => vec![],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_mixed_answer_shapes() {
        let answers = SourceAnswers::from_json(
            r#"{"app_name":"TaskFlow","visualStyle":["Minimal","Dark"],"why":"  "}"#,
        )
        .unwrap();

        assert_eq!(answers.text("app_name").as_deref(), Some("TaskFlow"));
        assert_eq!(answers.text("visualStyle").as_deref(), Some("Minimal, Dark"));
        assert_eq!(answers.text("why"), None);
        assert_eq!(answers.text("missing"), None);
        assert_eq!(answers.pieces("visualStyle"), vec!["Minimal", "Dark"]);
    }
}
