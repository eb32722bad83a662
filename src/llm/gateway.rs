//! @acp:module "Generation Gateway"
//! @acp:summary "Send the generation prompt and parse question/answer pairs"
//! @acp:domain llm
//! @acp:layer service

use serde_json::Value;
use tracing::{debug, warn};

use super::types::{strip_code_fence, value_text};
use super::{CompletionRequest, GeneratedQuestion, LanguageModel};
use crate::error::Result;

/// @acp:summary "First model call: prompt in, question/answer list out"
pub struct GenerationGateway<M> {
    model: M,
    model_name: String,
}

impl<M: LanguageModel> GenerationGateway<M> {
    pub fn new(model: M, model_name: impl Into<String>) -> Self {
        Self {
            model,
            model_name: model_name.into(),
        }
    }

    /// Generate questions for `prompt`.
    ///
    /// A response that is not a JSON list of objects yields a single pair
    /// holding the raw text with the answer `"Parsing failed"`. Transport
    /// failures are returned as errors.
    pub fn generate(&self, prompt: &str) -> Result<Vec<GeneratedQuestion>> {
        let request = CompletionRequest::new(&self.model_name, prompt);
        let raw = self.model.complete(&request)?;

        match parse_questions(&raw) {
            Some(items) => {
                debug!(count = items.len(), "parsed generated questions");
                Ok(items)
            }
            None => {
                warn!("generation response is not a JSON list; keeping raw text");
                Ok(vec![GeneratedQuestion::parse_failed(raw)])
            }
        }
    }
}

fn parse_questions(raw: &str) -> Option<Vec<GeneratedQuestion>> {
    let value: Value = serde_json::from_str(strip_code_fence(raw)).ok()?;
    let Value::Array(items) = value else {
        return None;
    };

    items
        .iter()
        .map(|item| {
            let object = item.as_object()?;
            Some(GeneratedQuestion {
                question: value_text(object.get("question")).unwrap_or_default(),
                answer: value_text(object.get("answer")).unwrap_or_default(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::QgenError;
    use crate::llm::testing::ScriptedModel;
    use crate::llm::PARSE_FAILED_ANSWER;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parses_json_list() {
        let model = ScriptedModel::replying(&[r#"[{"question": "2+2?", "answer": "4"}, {"question": "3*3?", "answer": 9}]"#]);
        let gateway = GenerationGateway::new(&model, "gpt-5-mini");

        let items = gateway.generate("prompt").unwrap();
        assert_eq!(
            items,
            vec![GeneratedQuestion::new("2+2?", "4"), GeneratedQuestion::new("3*3?", "9")]
        );

        let requests = model.requests.lock().unwrap();
        assert_eq!(requests[0], CompletionRequest::new("gpt-5-mini", "prompt"));
    }

    #[test]
    fn test_tolerates_code_fence() {
        let model = ScriptedModel::replying(&["```json\n[{\"question\": \"Q\", \"answer\": \"A\"}]\n```"]);
        let items = GenerationGateway::new(&model, "m").generate("p").unwrap();
        assert_eq!(items, vec![GeneratedQuestion::new("Q", "A")]);
    }

    #[test]
    fn test_malformed_output_yields_sentinel() {
        let raw = "Sure! Here are your questions: 1) ...";
        let model = ScriptedModel::replying(&[raw]);
        let items = GenerationGateway::new(&model, "m").generate("p").unwrap();

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].question, raw);
        assert_eq!(items[0].answer, PARSE_FAILED_ANSWER);
    }

    #[test]
    fn test_non_list_json_yields_sentinel() {
        let model = ScriptedModel::replying(&[r#"{"question": "Q", "answer": "A"}"#]);
        let items = GenerationGateway::new(&model, "m").generate("p").unwrap();
        assert!(items[0].is_parse_failure());

        let model = ScriptedModel::replying(&[r#"["just", "strings"]"#]);
        let items = GenerationGateway::new(&model, "m").generate("p").unwrap();
        assert!(items[0].is_parse_failure());
    }

    #[test]
    fn test_empty_list_is_valid() {
        let model = ScriptedModel::replying(&["[]"]);
        let items = GenerationGateway::new(&model, "m").generate("p").unwrap();
        assert!(items.is_empty());
    }

    #[test]
    fn test_transport_failure_propagates() {
        let model = ScriptedModel::new(vec![Err(QgenError::Llm("timed out".into()))]);
        let err = GenerationGateway::new(&model, "m").generate("p").unwrap_err();
        assert!(matches!(err, QgenError::Llm(_)));
    }
}
