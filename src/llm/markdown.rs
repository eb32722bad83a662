//! @acp:module "Markdown Formatter"
//! @acp:summary "Second model call wrapping maths in markdown, with passthrough fallback"
//! @acp:domain llm
//! @acp:layer service

use serde_json::Value;
use tracing::warn;

use super::types::{strip_code_fence, value_text};
use super::{CompletionRequest, GeneratedQuestion, LanguageModel, MarkdownRecord};
use crate::prompt::PromptBuilder;

pub struct MarkdownFormatter<'a, M> {
    model: M,
    model_name: String,
    prompts: &'a PromptBuilder,
}

impl<'a, M: LanguageModel> MarkdownFormatter<'a, M> {
    pub fn new(model: M, model_name: impl Into<String>, prompts: &'a PromptBuilder) -> Self {
        Self {
            model,
            model_name: model_name.into(),
            prompts,
        }
    }

    /// Format every pair; the result always has one record per input item.
    pub fn format(&self, items: &[GeneratedQuestion]) -> Vec<MarkdownRecord> {
        if items.is_empty() {
            return Vec::new();
        }

        let prompt = match self.prompts.markdown_prompt(items) {
            Ok(p) => p,
            Err(e) => {
                warn!("markdown prompt failed: {}; passing items through", e);
                return passthrough(items);
            }
        };

        let raw = match self.model.complete(&CompletionRequest::new(&self.model_name, prompt)) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("markdown formatting call failed: {}; passing items through", e);
                return passthrough(items);
            }
        };

        match parse_records(&raw, items) {
            Some(records) => records,
            None => {
                warn!("markdown response unusable; passing items through");
                passthrough(items)
            }
        }
    }
}

fn passthrough(items: &[GeneratedQuestion]) -> Vec<MarkdownRecord> {
    items.iter().map(MarkdownRecord::passthrough).collect()
}

/// Pair each parsed element with its input item, filling missing keys from it.
/// `None` on invalid JSON, a non-list, or a length mismatch.
fn parse_records(raw: &str, items: &[GeneratedQuestion]) -> Option<Vec<MarkdownRecord>> {
    let value: Value = serde_json::from_str(strip_code_fence(raw)).ok()?;
    let Value::Array(elements) = value else {
        return None;
    };
    if elements.len() != items.len() {
        return None;
    }

    let records = elements
        .iter()
        .zip(items)
        .map(|(element, item)| {
            let object = element.as_object();
            let field = |key: &str| object.and_then(|o| value_text(o.get(key)));
            MarkdownRecord {
                question_markdown: field("question_markdown").unwrap_or_else(|| item.question.clone()),
                answer_markdown: field("answer_markdown").unwrap_or_else(|| item.answer.clone()),
            }
        })
        .collect();
    Some(records)
}
