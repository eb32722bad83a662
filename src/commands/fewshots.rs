//! @acp:module "Fewshots Command"
//! @acp:summary "Preview the few-shot examples a request would use"
//! @acp:domain cli
//! @acp:layer handler
//!
//! Runs selection only; no language model is contacted.

use std::sync::Arc;

use anyhow::Result;
use console::style;

use super::RequestArgs;
use crate::config::Config;
use crate::error::QgenError;
use crate::fewshot::{ExampleRecord, FewshotSelector};
use crate::llm::{CompletionRequest, LanguageModel};
use crate::pipeline::QuestionGenerator;
use crate::workbook::WorkbookCache;

/// Options for the fewshots command
#[derive(Debug, Clone, Default)]
pub struct FewshotsOptions {
    pub request: RequestArgs,
    /// Sampling seed overriding the configured one
    pub seed: Option<u64>,
    pub json: bool,
}

/// Stand-in model for selection-only runs
struct Offline;

impl LanguageModel for Offline {
    fn complete(&self, _request: &CompletionRequest) -> crate::Result<String> {
        Err(QgenError::Llm("no language model in preview mode".into()))
    }
}

/// Execute the fewshots command
pub fn execute_fewshots(options: FewshotsOptions, config: Config) -> Result<()> {
    let request = options.request.to_request()?;
    let mut generator = QuestionGenerator::new(config, Arc::new(WorkbookCache::new()), Offline)?;
    if let Some(seed) = options.seed {
        let fallback = generator.config().selection.science_subtopic_fallback;
        generator = generator.with_selector(FewshotSelector::seeded(seed).with_subtopic_fallback(fallback));
    }

    let selection = generator.select_examples(&request)?;

    if options.json {
        println!("{}", serde_json::to_string_pretty(&selection)?);
        return Ok(());
    }

    if selection.is_empty() {
        println!("{} No few-shot examples matched", style("⚠").yellow());
        return Ok(());
    }

    println!(
        "{} {} example(s) from a pool of {}",
        style("✓").green(),
        selection.len(),
        selection.pool_size
    );
    if selection.used_fallback {
        let off = selection.off_difficulty(&request.difficulty);
        println!(
            "{} Fallback in use ({} example(s) off the requested difficulty)",
            style("⚠").yellow(),
            off
        );
    }
    println!();

    for (i, example) in selection.examples.iter().enumerate() {
        println!("{} {}", style(format!("{}.", i + 1)).bold(), example.question());
        match example {
            ExampleRecord::Math(m) => {
                if !m.hint.is_empty() {
                    println!("   {} {}", style("Hint:").dim(), m.hint);
                }
                println!("   {} {}", style("Answer:").dim(), m.answer);
                println!("   {} {}", style("Difficulty:").dim(), m.difficulty);
            }
            ExampleRecord::Science(s) => {
                println!("   {} {}", style("Answer:").dim(), s.answer);
                println!("   {} {} / {}", style("Type:").dim(), s.question_type, s.subtopic);
            }
        }
    }

    Ok(())
}
