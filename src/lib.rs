#![forbid(unsafe_code)]

//! @acp:module "Question Generator Library"
//! @acp:summary "Curriculum-aligned exam question generation from curated spreadsheet banks"
//! @acp:domain cli
//! @acp:layer api
//! @acp:stability stable
//!
//! # qgen
//!
//! Selects few-shot examples from curated workbooks, prompts a language model
//! for new questions, formats them as markdown and exports an `.xlsx` file.
//!
//! ## Features
//!
//! - **Cached Workbooks**: sheets are read once per file modification
//! - **Tiered Matching**: exact, then substring, then off-difficulty fallback
//! - **Header Detection**: finds the real header row of messy science sheets
//! - **Pluggable Models**: anything implementing [`LanguageModel`]
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use qgen::{Config, OpenAiClient, QuestionGenerator, WorkbookCache};
//! use qgen::{Curriculum, GenerationRequest, Subject};
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = Config::load_or_default();
//!     let client = OpenAiClient::from_config(&config.llm)?;
//!     let mut generator = QuestionGenerator::new(config, Arc::new(WorkbookCache::new()), client)?;
//!
//!     let outcome = generator.run(&GenerationRequest {
//!         subject: Subject::Math,
//!         curriculum: Curriculum::Gcse,
//!         chapter: Some("1".into()),
//!         topic: "Algebra".into(),
//!         difficulty: "Easy".into(),
//!         question_type: None,
//!         num_questions: 5,
//!     })?;
//!     println!("{:?}", outcome);
//!     Ok(())
//! }
//! ```

pub mod commands;
pub mod config;
pub mod error;
pub mod export;
pub mod fewshot;
pub mod llm;
pub mod pipeline;
pub mod prompt;
pub mod topics;
pub mod workbook;

// Re-exports
pub use config::Config;
pub use error::{ErrorKind, QgenError, Result};
pub use export::{write_markdown_records, write_workbook, SheetData};
pub use fewshot::{
    ExampleBank, ExampleRecord, FewshotSelector, MatchTier, QuestionTypeQuery, Selection,
    TopicQuery,
};
pub use llm::{
    CompletionRequest, GeneratedQuestion, GenerationGateway, LanguageModel, MarkdownFormatter,
    MarkdownRecord, OpenAiClient,
};
pub use pipeline::{GenerationOutcome, GenerationReport, GenerationRequest, QuestionGenerator};
pub use prompt::{PromptBuilder, PromptRequest};
pub use workbook::{
    detect_header_row, BankRef, Curriculum, HeaderDetector, Subject, Table, WorkbookCache,
    WorkbookLocator,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
