//! @acp:module "Commands"
//! @acp:summary "CLI command implementations"
//! @acp:domain cli
//! @acp:layer handler
//!
//! Each command is in its own submodule with an options struct and an
//! `execute_*` entry point.

pub mod fewshots;
pub mod generate;
pub mod init;
pub mod topics;

pub use fewshots::{execute_fewshots, FewshotsOptions};
pub use generate::{execute_generate, GenerateOptions};
pub use init::{execute_init, InitOptions};
pub use topics::{execute_topics, TopicsOptions};

use anyhow::Result;

use crate::pipeline::GenerationRequest;
use crate::workbook::{Curriculum, Subject};

/// Request fields shared by `generate` and `fewshots`
#[derive(Debug, Clone, Default)]
pub struct RequestArgs {
    pub subject: String,
    pub curriculum: String,
    pub chapter: Option<String>,
    pub topic: String,
    pub difficulty: String,
    pub question_type: Option<String>,
    pub num_questions: usize,
}

impl RequestArgs {
    pub fn to_request(&self) -> Result<GenerationRequest> {
        Ok(GenerationRequest {
            subject: self.subject.parse::<Subject>()?,
            curriculum: self.curriculum.parse::<Curriculum>()?,
            chapter: self.chapter.clone(),
            topic: self.topic.clone(),
            difficulty: self.difficulty.clone(),
            question_type: self.question_type.clone(),
            num_questions: self.num_questions,
        })
    }
}
