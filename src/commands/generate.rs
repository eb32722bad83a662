//! @acp:module "Generate Command"
//! @acp:summary "Generate exam questions and export them to a workbook"
//! @acp:domain cli
//! @acp:layer handler

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use console::style;
use indicatif::ProgressBar;

use super::RequestArgs;
use crate::config::Config;
use crate::llm::OpenAiClient;
use crate::pipeline::{GenerationOutcome, GenerationReport, QuestionGenerator};
use crate::workbook::{Subject, WorkbookCache};

/// Options for the generate command
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    pub request: RequestArgs,
    /// API key overriding the configured environment variable
    pub api_key: Option<String>,
    /// Print the report as JSON
    pub json: bool,
}

/// Execute the generate command
pub fn execute_generate(options: GenerateOptions, config: Config) -> Result<()> {
    let request = options.request.to_request()?;

    let client = match options.api_key {
        Some(key) => OpenAiClient::new(
            &config.llm.api_base,
            key,
            Duration::from_secs(config.llm.timeout_secs),
        )
        .with_max_retries(config.llm.max_retries),
        None => OpenAiClient::from_config(&config.llm)?,
    };

    let cache = Arc::new(WorkbookCache::new());
    let mut generator = QuestionGenerator::new(config, cache, client)?;

    if !options.json {
        println!(
            "{} Generating {} {} {} question(s) on '{}'",
            style("→").cyan(),
            request.num_questions,
            request.curriculum,
            request.subject,
            request.topic
        );
    }

    let spinner = if options.json {
        ProgressBar::hidden()
    } else {
        ProgressBar::new_spinner()
    };
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner.set_message("Waiting for the language model...");
    let outcome = generator.run(&request);
    spinner.finish_and_clear();

    match outcome? {
        GenerationOutcome::NoExamples { message } => {
            if options.json {
                println!("{}", serde_json::json!({ "error": message }));
            } else {
                println!("{} {}", style("⚠").yellow(), message);
            }
        }
        GenerationOutcome::Generated(report) => {
            if options.json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&report).context("Failed to serialize report")?
                );
            } else {
                print_report(&report, &request.subject);
            }
        }
    }

    Ok(())
}

fn print_report(report: &GenerationReport, subject: &Subject) {
    println!(
        "{} Used {} few-shot example(s)",
        style("✓").green(),
        report.fewshots_used
    );
    if report.used_fallback {
        println!("{} {}", style("⚠").yellow(), fallback_notice(subject));
    }
    if report.generated_questions.iter().any(|q| q.is_parse_failure()) {
        println!(
            "{} Model output was not valid JSON; raw text saved instead",
            style("⚠").yellow()
        );
    }

    println!();
    for (i, record) in report.records.iter().enumerate() {
        println!("{} {}", style(format!("{}.", i + 1)).bold(), record.question_markdown);
        println!("   {} {}", style("Answer:").dim(), record.answer_markdown);
    }

    println!();
    println!(
        "{} Wrote {}",
        style("✓").green(),
        style(report.output_file.display()).cyan()
    );
}

/// Math falls back across difficulty levels, science across subtopics
fn fallback_notice(subject: &Subject) -> &'static str {
    if subject.is_math() {
        "No examples at the requested difficulty; used other levels of the topic"
    } else {
        "No examples for the requested subtopic; used other rows of the question type"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_notice_names_the_relaxed_field() {
        assert!(fallback_notice(&Subject::Math).contains("difficulty"));
        assert!(fallback_notice(&Subject::Physics).contains("subtopic"));
        assert!(!fallback_notice(&Subject::Chemistry).contains("level"));
    }
}
