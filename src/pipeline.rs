//! @acp:module "Question Generator"
//! @acp:summary "Run one generation request from example selection to exported workbook"
//! @acp:domain pipeline
//! @acp:layer service
//!
//! Control flow: locate bank → select examples → build prompt → generate →
//! format as markdown → export.

use std::path::PathBuf;
use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde::Serialize;
use tracing::info;

use crate::config::Config;
use crate::error::{QgenError, Result};
use crate::export::write_markdown_records;
use crate::fewshot::{ExampleBank, ExampleRecord, FewshotSelector, QuestionTypeQuery, Selection, TopicQuery};
use crate::llm::{GeneratedQuestion, GenerationGateway, LanguageModel, MarkdownFormatter, MarkdownRecord};
use crate::prompt::{PromptBuilder, PromptRequest};
use crate::workbook::{BankRef, Curriculum, Subject, WorkbookCache, WorkbookLocator};

/// Characters stripped from file name components
static UNSAFE_FILENAME_CHARS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"[/\\:*?"<>|]"#).unwrap()
});

/// Examples echoed back in the report
const PREVIEW_LEN: usize = 5;

/// One question-generation request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub subject: Subject,
    pub curriculum: Curriculum,
    /// GCSE math: chapter number; A-level math: sheet name; science: chapter name
    pub chapter: Option<String>,
    /// Math topic, or the subtopic for science
    pub topic: String,
    pub difficulty: String,
    /// Required for science
    pub question_type: Option<String>,
    pub num_questions: usize,
}

/// Validated request: where the examples live and how to query them
#[derive(Debug, Clone, PartialEq, Eq)]
struct Plan {
    bank: BankRef,
    query: PlanQuery,
    k: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PlanQuery {
    Topic(TopicQuery),
    QuestionType(QuestionTypeQuery),
}

/// Result of a successful run
#[derive(Debug, Clone, Serialize)]
pub struct GenerationReport {
    pub generated_questions: Vec<GeneratedQuestion>,
    pub records: Vec<MarkdownRecord>,
    pub output_file: PathBuf,
    pub fewshots_used: usize,
    pub fewshots_preview: Vec<ExampleRecord>,
    pub used_fallback: bool,
}

#[derive(Debug, Clone)]
pub enum GenerationOutcome {
    /// Nothing in the bank matched; no model call was made
    NoExamples { message: String },
    Generated(GenerationReport),
}

/// @acp:summary "End-to-end generator over a shared workbook cache"
pub struct QuestionGenerator<M> {
    config: Config,
    bank: ExampleBank,
    selector: FewshotSelector,
    prompts: PromptBuilder,
    model: M,
}

impl<M: LanguageModel> QuestionGenerator<M> {
    pub fn new(config: Config, cache: Arc<WorkbookCache>, model: M) -> Result<Self> {
        let bank = ExampleBank::new(cache, WorkbookLocator::new(&config.data_root), config.detector());
        let selector = match config.selection.seed {
            Some(seed) => FewshotSelector::seeded(seed),
            None => FewshotSelector::new(),
        }
        .with_subtopic_fallback(config.selection.science_subtopic_fallback);

        Ok(Self {
            bank,
            selector,
            prompts: PromptBuilder::new()?,
            model,
            config,
        })
    }

    /// Replace the sampler, e.g. with a seeded one
    pub fn with_selector(mut self, selector: FewshotSelector) -> Self {
        self.selector = selector;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Validate `request` and pick its few-shot examples without calling the model
    pub fn select_examples(&mut self, request: &GenerationRequest) -> Result<Selection> {
        let plan = self.plan(request)?;
        self.select(&plan)
    }

    /// @acp:summary "Generate, format and export questions for one request"
    pub fn run(&mut self, request: &GenerationRequest) -> Result<GenerationOutcome> {
        let plan = self.plan(request)?;
        let selection = self.select(&plan)?;

        info!(
            subject = %request.subject,
            curriculum = %request.curriculum,
            bank = %plan.bank,
            topic = %request.topic,
            num_questions = request.num_questions,
            fewshots = selection.len(),
            used_fallback = selection.used_fallback,
            "selected few-shot examples"
        );

        if selection.is_empty() {
            return Ok(GenerationOutcome::NoExamples {
                message: no_examples_message(request, &plan.bank),
            });
        }

        let prompt = self.prompts.generation_prompt(
            &PromptRequest {
                subject: request.subject.clone(),
                curriculum: request.curriculum,
                topic: request.topic.trim().to_string(),
                difficulty: request.difficulty.trim().to_string(),
                question_type: request.question_type.clone(),
                num_questions: request.num_questions,
                used_fallback: selection.used_fallback,
            },
            &selection.examples,
        )?;

        let gateway = GenerationGateway::new(&self.model, &self.config.llm.generation_model);
        let generated = gateway.generate(&prompt)?;

        let formatter = MarkdownFormatter::new(&self.model, &self.config.llm.markdown_model, &self.prompts);
        let records = formatter.format(&generated);

        let output_file = self
            .config
            .output_dir
            .join(output_file_name(request, &plan.bank, records.len()));
        write_markdown_records(&output_file, &records)?;

        info!(generated = generated.len(), output = %output_file.display(), "generation complete");

        Ok(GenerationOutcome::Generated(GenerationReport {
            generated_questions: generated,
            records,
            output_file,
            fewshots_used: selection.len(),
            fewshots_preview: selection.examples.iter().take(PREVIEW_LEN).cloned().collect(),
            used_fallback: selection.used_fallback,
        }))
    }

    fn select(&mut self, plan: &Plan) -> Result<Selection> {
        let table = self.bank.table(&plan.bank)?;
        match &plan.query {
            PlanQuery::Topic(query) => self.selector.select_by_topic(&table, query, plan.k),
            PlanQuery::QuestionType(query) => self.selector.select_by_question_type(&table, query, plan.k),
        }
    }

    fn plan(&self, request: &GenerationRequest) -> Result<Plan> {
        let max = self.config.selection.max_questions;
        if request.num_questions < 1 || request.num_questions > max {
            return Err(QgenError::InvalidRequest(format!(
                "num_questions must be between 1 and {}",
                max
            )));
        }
        if request.topic.trim().is_empty() {
            return Err(QgenError::InvalidRequest("topic is required".into()));
        }

        let chapter = request
            .chapter
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty());
        let k = self.config.selection.max_fewshots.min(request.num_questions);

        if request.subject.is_math() {
            let bank = match request.curriculum {
                Curriculum::Gcse => {
                    let chapter = chapter.ok_or_else(|| {
                        QgenError::InvalidRequest("chapter number is required for GCSE".into())
                    })?;
                    let number = chapter.parse::<u32>().map_err(|_| {
                        QgenError::InvalidRequest(format!("GCSE chapter must be a number, got '{}'", chapter))
                    })?;
                    BankRef::MathChapter(number)
                }
                Curriculum::ALevel => {
                    let sheet = chapter.ok_or_else(|| {
                        QgenError::InvalidRequest("chapter name is required for A-Level".into())
                    })?;
                    BankRef::ALevelMathSheet(sheet.to_string())
                }
            };
            return Ok(Plan {
                bank,
                query: PlanQuery::Topic(TopicQuery::new(request.topic.trim(), request.difficulty.trim())),
                k,
            });
        }

        let chapter = chapter.ok_or_else(|| {
            QgenError::InvalidRequest(format!("chapter name is required for {}", request.subject))
        })?;
        let question_type = request
            .question_type
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .ok_or_else(|| {
                QgenError::InvalidRequest(format!("question type is required for {}", request.subject))
            })?;

        Ok(Plan {
            bank: BankRef::ScienceChapter {
                subject: request.subject.clone(),
                chapter: chapter.to_string(),
            },
            query: PlanQuery::QuestionType(QuestionTypeQuery::new(question_type, request.topic.trim())),
            k,
        })
    }
}

fn no_examples_message(request: &GenerationRequest, bank: &BankRef) -> String {
    match bank {
        BankRef::MathChapter(n) => format!(
            "No few-shot examples found for topic '{}' and difficulty '{}' in chapter {}",
            request.topic, request.difficulty, n
        ),
        BankRef::ALevelMathSheet(sheet) => format!(
            "No few-shot examples found for topic '{}' and difficulty '{}' in sheet '{}'",
            request.topic, request.difficulty, sheet
        ),
        BankRef::ScienceChapter { subject, chapter } => format!(
            "No few-shot examples found for subtopic '{}' and question type '{}' in {} chapter '{}'",
            request.topic,
            request.question_type.as_deref().unwrap_or(""),
            subject,
            chapter
        ),
    }
}

/// Remove characters that are invalid in file names and turn spaces into `_`
pub fn safe_filename(s: &str) -> String {
    UNSAFE_FILENAME_CHARS
        .replace_all(s, "")
        .trim()
        .replace(' ', "_")
}

/// Output workbook name for `request`, counting `count` exported records
pub fn output_file_name(request: &GenerationRequest, bank: &BankRef, count: usize) -> String {
    let topic = safe_filename(&request.topic);
    let difficulty = safe_filename(&request.difficulty);
    match bank {
        BankRef::MathChapter(n) => {
            format!("GCSE_Chapter{}_{}_{}_{}.xlsx", n, topic, difficulty, count)
        }
        BankRef::ALevelMathSheet(sheet) => format!(
            "ALevel_{}_{}_{}_{}.xlsx",
            safe_filename(sheet),
            topic,
            difficulty,
            count
        ),
        BankRef::ScienceChapter { subject, chapter } => format!(
            "{}_{}_{}_{}_{}_{}.xlsx",
            safe_filename(subject.folder()),
            request.curriculum.tag(),
            safe_filename(chapter),
            topic,
            safe_filename(request.question_type.as_deref().unwrap_or("")),
            count
        ),
    }
}
