//! @acp:module "Fewshot Types"
//! @acp:summary "Queries, example records and selection results"
//! @acp:domain fewshot
//! @acp:layer types

use serde::{Deserialize, Serialize};

// Column names of the curated banks (compared after header trimming)
pub const TOPIC_COLUMN: &str = "Topic Name";
pub const DIFFICULTY_COLUMN: &str = "Difficulty Level";
pub const QUESTION_COLUMN: &str = "Question";
pub const HINT_COLUMN: &str = "Hint";
pub const ANSWER_COLUMN: &str = "Answer";
pub const SUBTOPIC_COLUMN: &str = "Subtopic";
pub const QUESTION_TYPE_COLUMN: &str = "Question type";

/// Topic + difficulty lookup (math banks)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicQuery {
    pub topic: String,
    pub difficulty: String,
}

impl TopicQuery {
    pub fn new(topic: impl Into<String>, difficulty: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            difficulty: difficulty.into(),
        }
    }
}

/// Question-type + subtopic lookup (science banks)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionTypeQuery {
    pub question_type: String,
    pub subtopic: String,
}

impl QuestionTypeQuery {
    pub fn new(question_type: impl Into<String>, subtopic: impl Into<String>) -> Self {
        Self {
            question_type: question_type.into(),
            subtopic: subtopic.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MathExample {
    pub question: String,
    pub hint: String,
    pub answer: String,
    pub difficulty: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScienceExample {
    pub question: String,
    pub answer: String,
    pub question_type: String,
    pub subtopic: String,
}

/// One normalized bank row; every field is trimmed and never missing
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExampleRecord {
    Math(MathExample),
    Science(ScienceExample),
}

impl ExampleRecord {
    pub fn question(&self) -> &str {
        match self {
            ExampleRecord::Math(e) => &e.question,
            ExampleRecord::Science(e) => &e.question,
        }
    }

    /// Recorded difficulty; science rows carry none
    pub fn difficulty(&self) -> Option<&str> {
        match self {
            ExampleRecord::Math(e) => Some(&e.difficulty),
            ExampleRecord::Science(_) => None,
        }
    }
}

/// Which rule produced the rows of a filter stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchTier {
    /// Case-insensitive equality
    Exact,
    /// Case-insensitive substring, used only when nothing matched exactly
    Substring,
    /// Rows that do not match the requested value at all
    Fallback,
}

/// Result of one selection call
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Selection {
    pub examples: Vec<ExampleRecord>,
    /// Rows that survived every filter, before sampling
    pub pool_size: usize,
    /// Tier of the topic / question-type filter; `None` when nothing matched
    pub primary_tier: Option<MatchTier>,
    /// Tier of the difficulty / subtopic filter
    pub secondary_tier: Option<MatchTier>,
    /// Examples come from outside the requested difficulty (or subtopic)
    pub used_fallback: bool,
}

impl Selection {
    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }

    pub fn len(&self) -> usize {
        self.examples.len()
    }

    /// Examples whose recorded difficulty differs from `requested`
    pub fn off_difficulty(&self, requested: &str) -> usize {
        let requested = requested.trim().to_lowercase();
        self.examples
            .iter()
            .filter_map(|e| e.difficulty())
            .filter(|d| d.to_lowercase() != requested)
            .count()
    }
}
