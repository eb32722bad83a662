//! @acp:module "LLM Types"
//! @acp:summary "Generated question pairs and their markdown renderings"
//! @acp:domain llm
//! @acp:layer types

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Answer recorded when the generation response could not be parsed
pub const PARSE_FAILED_ANSWER: &str = "Parsing failed";

/// One question/answer pair returned by the generation model
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedQuestion {
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub answer: String,
}

impl GeneratedQuestion {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }

    /// Sentinel pair carrying the unparseable model output
    pub fn parse_failed(raw: impl Into<String>) -> Self {
        Self::new(raw, PARSE_FAILED_ANSWER)
    }

    pub fn is_parse_failure(&self) -> bool {
        self.answer == PARSE_FAILED_ANSWER
    }
}

/// Markdown rendering of one generated pair
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkdownRecord {
    pub question_markdown: String,
    pub answer_markdown: String,
}

impl MarkdownRecord {
    /// Unformatted copy of `item`
    pub fn passthrough(item: &GeneratedQuestion) -> Self {
        Self {
            question_markdown: item.question.clone(),
            answer_markdown: item.answer.clone(),
        }
    }
}

/// Input to a single completion call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    pub model: String,
    pub prompt: String,
}

impl CompletionRequest {
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
        }
    }
}

/// Render a JSON scalar as plain text; objects and arrays keep their JSON form
pub(crate) fn value_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Drop a surrounding Markdown code fence (```json ... ```), if any
pub(crate) fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let Some(body) = rest.strip_suffix("```") else {
        return trimmed;
    };
    // Skip the info string on the opening line
    match body.find('\n') {
        Some(newline) => body[newline + 1..].trim(),
        None => body.trim(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence("```json\n[1, 2]\n```"), "[1, 2]");
        assert_eq!(strip_code_fence("```\n[]\n```"), "[]");
        assert_eq!(strip_code_fence("  [3]  "), "[3]");
        assert_eq!(strip_code_fence("```json\n[1]"), "```json\n[1]");
    }

    #[test]
    fn test_value_text() {
        assert_eq!(value_text(Some(&json!("x"))), Some("x".to_string()));
        assert_eq!(value_text(Some(&json!(42))), Some("42".to_string()));
        assert_eq!(value_text(Some(&Value::Null)), None);
        assert_eq!(value_text(None), None);
    }

    #[test]
    fn test_generated_question_defaults_missing_fields() {
        let q: GeneratedQuestion = serde_json::from_str(r#"{"question": "Q"}"#).unwrap();
        assert_eq!(q, GeneratedQuestion::new("Q", ""));
        assert!(!q.is_parse_failure());
        assert!(GeneratedQuestion::parse_failed("raw").is_parse_failure());
    }
}
