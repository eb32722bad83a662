//! @acp:module "LLM"
//! @acp:summary "Language model seam, HTTP client and the two model-backed steps"
//! @acp:domain llm
//! @acp:layer service
//!
//! Generation and markdown formatting both go through [`LanguageModel`], so
//! tests can swap in scripted responses for the HTTP client.

pub mod client;
pub mod gateway;
pub mod markdown;
pub mod types;

pub use client::OpenAiClient;
pub use gateway::GenerationGateway;
pub use markdown::MarkdownFormatter;
pub use types::{CompletionRequest, GeneratedQuestion, MarkdownRecord, PARSE_FAILED_ANSWER};

use crate::error::Result;

/// A text-completion backend
pub trait LanguageModel {
    /// Send one prompt and return the raw response text
    fn complete(&self, request: &CompletionRequest) -> Result<String>;
}

impl<M: LanguageModel + ?Sized> LanguageModel for &M {
    fn complete(&self, request: &CompletionRequest) -> Result<String> {
        (**self).complete(request)
    }
}

impl<M: LanguageModel + ?Sized> LanguageModel for Box<M> {
    fn complete(&self, request: &CompletionRequest) -> Result<String> {
        (**self).complete(request)
    }
}
