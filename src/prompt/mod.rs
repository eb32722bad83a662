//! @acp:module "Prompt Assembler"
//! @acp:summary "Render few-shot examples and request parameters into model prompts"
//! @acp:domain prompt
//! @acp:layer output

use handlebars::Handlebars;
use serde::Serialize;
use serde_json::json;

use crate::error::{QgenError, Result};
use crate::fewshot::ExampleRecord;
use crate::llm::GeneratedQuestion;
use crate::workbook::{Curriculum, Subject};

const MATH_TEMPLATE: &str = "math";
const SCIENCE_TEMPLATE: &str = "science";
const DEFAULT_TEMPLATE: &str = "default";
const MARKDOWN_TEMPLATE: &str = "markdown";

/// Parameters of one generation prompt
#[derive(Debug, Clone, Serialize)]
pub struct PromptRequest {
    pub subject: Subject,
    pub curriculum: Curriculum,
    pub topic: String,
    pub difficulty: String,
    pub question_type: Option<String>,
    pub num_questions: usize,
    /// Examples come from outside the requested difficulty/subtopic
    pub used_fallback: bool,
}

/// Compiled prompt templates
pub struct PromptBuilder {
    registry: Handlebars<'static>,
}

impl PromptBuilder {
    pub fn new() -> Result<Self> {
        let mut registry = Handlebars::new();
        registry.register_escape_fn(handlebars::no_escape);

        let templates = [
            (MATH_TEMPLATE, include_str!("../../templates/math.hbs")),
            (SCIENCE_TEMPLATE, include_str!("../../templates/science.hbs")),
            (DEFAULT_TEMPLATE, include_str!("../../templates/default.hbs")),
            (MARKDOWN_TEMPLATE, include_str!("../../templates/markdown.hbs")),
        ];
        for (name, source) in templates {
            registry
                .register_template_string(name, source)
                .map_err(|e| QgenError::Template(format!("{}: {}", name, e)))?;
        }

        Ok(Self { registry })
    }

    /// Question generation prompt, dispatched on subject
    pub fn generation_prompt(&self, request: &PromptRequest, examples: &[ExampleRecord]) -> Result<String> {
        let template = match &request.subject {
            Subject::Math => MATH_TEMPLATE,
            s if s.is_science() => SCIENCE_TEMPLATE,
            _ => DEFAULT_TEMPLATE,
        };

        let data = json!({
            "subject": request.subject.to_string(),
            "curriculum": request.curriculum.to_string(),
            "topic": request.topic,
            "difficulty": request.difficulty,
            "question_type": request.question_type.as_deref().unwrap_or(""),
            "num_questions": request.num_questions,
            "used_fallback": request.used_fallback,
            "examples": examples,
            "examples_json": serde_json::to_string_pretty(examples)?,
        });

        self.render(template, &data)
    }

    /// Formatting prompt carrying the generated pairs as pretty JSON
    pub fn markdown_prompt(&self, items: &[GeneratedQuestion]) -> Result<String> {
        let data = json!({ "items_json": serde_json::to_string_pretty(items)? });
        self.render(MARKDOWN_TEMPLATE, &data)
    }

    fn render(&self, template: &str, data: &serde_json::Value) -> Result<String> {
        self.registry
            .render(template, data)
            .map(|s| s.trim().to_string())
            .map_err(|e| QgenError::Template(format!("{}: {}", template, e)))
    }
}
