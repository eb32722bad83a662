//! @acp:module "Fewshot Selector"
//! @acp:summary "Tiered row filtering and uniform sampling of bank examples"
//! @acp:domain fewshot
//! @acp:layer logic

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use super::types::*;
use crate::error::{QgenError, Result};
use crate::workbook::Table;

/// Select few-shot examples from a loaded bank.
///
/// Both variants filter in tiers: exact case-insensitive match first, then
/// substring match only when the exact tier is empty. Sampling draws
/// `min(k, pool)` rows uniformly without replacement from the injected RNG.
#[derive(Debug, Clone)]
pub struct FewshotSelector<R = StdRng> {
    rng: R,
    subtopic_fallback: bool,
}

impl FewshotSelector<StdRng> {
    /// Selector seeded from the operating system
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_os_rng())
    }

    /// Reproducible selector
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }
}

impl Default for FewshotSelector<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> FewshotSelector<R> {
    pub fn with_rng(rng: R) -> Self {
        Self {
            rng,
            subtopic_fallback: false,
        }
    }

    /// Keep all question-type rows when no subtopic matches (off by default)
    pub fn with_subtopic_fallback(mut self, enabled: bool) -> Self {
        self.subtopic_fallback = enabled;
        self
    }

    /// Math variant: filter by topic, then prefer the requested difficulty.
    ///
    /// When the topic has no row at the requested difficulty, the rows at
    /// other difficulties are used and the selection is flagged as fallback.
    pub fn select_by_topic(
        &mut self,
        table: &Table,
        query: &TopicQuery,
        k: usize,
    ) -> Result<Selection> {
        let topic_col = require_column(table, TOPIC_COLUMN)?;
        let all: Vec<usize> = (0..table.len()).collect();

        let (topic_rows, primary_tier) = tiered_filter(table, &all, topic_col, &query.topic);
        if topic_rows.is_empty() {
            debug!("No rows for topic '{}'", query.topic);
            return Ok(Selection::default());
        }

        let difficulty_col = require_column(table, DIFFICULTY_COLUMN)?;
        let wanted = normalize(&query.difficulty);
        let (exact, other): (Vec<usize>, Vec<usize>) = topic_rows.iter().partition(|&&row| {
            cell_lower(table, row, difficulty_col).as_deref() == Some(wanted.as_str())
        });

        let (pool, secondary_tier, used_fallback) = if !exact.is_empty() {
            (exact, MatchTier::Exact, false)
        } else {
            (other, MatchTier::Fallback, true)
        };

        debug!(
            "Topic '{}' ({:?}) difficulty '{}' ({:?}): pool of {}",
            query.topic,
            primary_tier,
            query.difficulty,
            secondary_tier,
            pool.len()
        );

        let examples = self
            .sample(&pool, k)
            .into_iter()
            .map(|row| project_math(table, row))
            .collect();

        Ok(Selection {
            examples,
            pool_size: pool.len(),
            primary_tier,
            secondary_tier: Some(secondary_tier),
            used_fallback,
        })
    }

    /// Science variant: filter by question type, then narrow by subtopic.
    ///
    /// There is no off-subtopic tier unless enabled with
    /// [`with_subtopic_fallback`](Self::with_subtopic_fallback): a subtopic
    /// that matches nothing yields an empty selection.
    pub fn select_by_question_type(
        &mut self,
        table: &Table,
        query: &QuestionTypeQuery,
        k: usize,
    ) -> Result<Selection> {
        let qtype_col = require_column(table, QUESTION_TYPE_COLUMN)?;
        let all: Vec<usize> = (0..table.len()).collect();

        let (qtype_rows, primary_tier) =
            tiered_filter(table, &all, qtype_col, &query.question_type);
        if qtype_rows.is_empty() {
            debug!("No rows for question type '{}'", query.question_type);
            return Ok(Selection::default());
        }

        let subtopic_col = table
            .column_index(SUBTOPIC_COLUMN)
            .filter(|_| !query.subtopic.trim().is_empty());

        let (pool, secondary_tier, used_fallback) = match subtopic_col {
            None => (qtype_rows, None, false),
            Some(col) => {
                let (rows, tier) = tiered_filter(table, &qtype_rows, col, &query.subtopic);
                if !rows.is_empty() {
                    (rows, tier, false)
                } else if self.subtopic_fallback {
                    (qtype_rows, Some(MatchTier::Fallback), true)
                } else {
                    debug!("No rows for subtopic '{}'", query.subtopic);
                    (Vec::new(), None, false)
                }
            }
        };

        let has_subtopic = table.has_column(SUBTOPIC_COLUMN);
        let examples = self
            .sample(&pool, k)
            .into_iter()
            .map(|row| project_science(table, row, has_subtopic))
            .collect();

        Ok(Selection {
            examples,
            pool_size: pool.len(),
            primary_tier,
            secondary_tier,
            used_fallback,
        })
    }

    fn sample(&mut self, pool: &[usize], k: usize) -> Vec<usize> {
        let amount = k.min(pool.len());
        rand::seq::index::sample(&mut self.rng, pool.len(), amount)
            .into_iter()
            .map(|i| pool[i])
            .collect()
    }
}

fn require_column(table: &Table, name: &str) -> Result<usize> {
    table
        .column_index(name)
        .ok_or_else(|| QgenError::MissingColumn {
            column: name.to_string(),
            found: table.columns().to_vec(),
        })
}

fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Lowercased trimmed cell, `None` when missing
fn cell_lower(table: &Table, row: usize, col: usize) -> Option<String> {
    table.value(row, col).map(normalize)
}

/// Exact match over `rows`, relaxed to substring match when exact is empty
fn tiered_filter(
    table: &Table,
    rows: &[usize],
    col: usize,
    needle: &str,
) -> (Vec<usize>, Option<MatchTier>) {
    let needle = normalize(needle);

    let exact: Vec<usize> = rows
        .iter()
        .copied()
        .filter(|&row| cell_lower(table, row, col).as_deref() == Some(needle.as_str()))
        .collect();
    if !exact.is_empty() {
        return (exact, Some(MatchTier::Exact));
    }

    let partial: Vec<usize> = rows
        .iter()
        .copied()
        .filter(|&row| {
            cell_lower(table, row, col)
                .map(|v| v.contains(needle.as_str()))
                .unwrap_or(false)
        })
        .collect();
    if !partial.is_empty() {
        return (partial, Some(MatchTier::Substring));
    }

    (Vec::new(), None)
}

fn project_math(table: &Table, row: usize) -> ExampleRecord {
    ExampleRecord::Math(MathExample {
        question: table.text(row, QUESTION_COLUMN),
        hint: table.text(row, HINT_COLUMN),
        answer: table.text(row, ANSWER_COLUMN),
        difficulty: table.text(row, DIFFICULTY_COLUMN),
    })
}

fn project_science(table: &Table, row: usize, has_subtopic: bool) -> ExampleRecord {
    ExampleRecord::Science(ScienceExample {
        question: table.text(row, QUESTION_COLUMN),
        answer: table.text(row, ANSWER_COLUMN),
        question_type: table.text(row, QUESTION_TYPE_COLUMN),
        subtopic: if has_subtopic {
            table.text(row, SUBTOPIC_COLUMN)
        } else {
            String::new()
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn table(columns: &[&str], rows: &[&[&str]]) -> Table {
        Table::new(
            columns.iter().map(|c| c.to_string()).collect(),
            rows.iter()
                .map(|r| {
                    r.iter()
                        .map(|v| if v.is_empty() { None } else { Some(v.to_string()) })
                        .collect()
                })
                .collect(),
        )
    }

    fn algebra_bank() -> Table {
        table(
            &["Topic Name", "Difficulty Level", "Question", "Answer"],
            &[
                &["Algebra", "Easy", "2+2?", "4"],
                &["Algebra", "Hard", "x^2=4?", "±2"],
            ],
        )
    }

    fn math(question: &str, answer: &str, difficulty: &str) -> ExampleRecord {
        ExampleRecord::Math(MathExample {
            question: question.into(),
            hint: String::new(),
            answer: answer.into(),
            difficulty: difficulty.into(),
        })
    }

    #[test]
    fn test_exact_difficulty_returns_only_matching_row() {
        let mut selector = FewshotSelector::seeded(7);
        let selection = selector
            .select_by_topic(&algebra_bank(), &TopicQuery::new("algebra", "easy"), 5)
            .unwrap();

        assert_eq!(selection.examples, vec![math("2+2?", "4", "Easy")]);
        assert!(!selection.used_fallback);
        assert_eq!(selection.primary_tier, Some(MatchTier::Exact));
        assert_eq!(selection.off_difficulty("easy"), 0);
    }

    #[test]
    fn test_missing_difficulty_falls_back_to_other_levels() {
        let mut selector = FewshotSelector::seeded(7);
        let selection = selector
            .select_by_topic(&algebra_bank(), &TopicQuery::new("algebra", "medium"), 5)
            .unwrap();

        assert_eq!(selection.len(), 2);
        assert!(selection.used_fallback);
        assert_eq!(selection.secondary_tier, Some(MatchTier::Fallback));
        assert_eq!(selection.off_difficulty("medium"), 2);
        let got: HashSet<_> = selection.examples.into_iter().collect();
        let want: HashSet<_> = [math("2+2?", "4", "Easy"), math("x^2=4?", "±2", "Hard")]
            .into_iter()
            .collect();
        assert_eq!(got, want);
    }

    #[test]
    fn test_substring_only_when_no_exact_topic() {
        let bank = table(
            &["Topic Name", "Difficulty Level", "Question"],
            &[
                &["Fractions", "Easy", "exact"],
                &["Fractions and decimals", "Easy", "partial"],
            ],
        );
        let mut selector = FewshotSelector::seeded(1);

        let exact = selector
            .select_by_topic(&bank, &TopicQuery::new("FRACTIONS", "Easy"), 10)
            .unwrap();
        assert_eq!(exact.len(), 1);
        assert_eq!(exact.examples[0].question(), "exact");

        let partial = selector
            .select_by_topic(&bank, &TopicQuery::new("decimals", "Easy"), 10)
            .unwrap();
        assert_eq!(partial.primary_tier, Some(MatchTier::Substring));
        assert_eq!(partial.examples[0].question(), "partial");
    }

    #[test]
    fn test_unknown_topic_is_empty_not_error() {
        let mut selector = FewshotSelector::seeded(1);
        let selection = selector
            .select_by_topic(&algebra_bank(), &TopicQuery::new("Geometry", "Easy"), 5)
            .unwrap();
        assert!(selection.is_empty());
        assert_eq!(selection.primary_tier, None);
        assert!(!selection.used_fallback);
    }

    #[test]
    fn test_missing_columns_are_structural_errors() {
        let no_topic = table(&["Topic", "Difficulty Level"], &[&["Algebra", "Easy"]]);
        let err = FewshotSelector::seeded(1)
            .select_by_topic(&no_topic, &TopicQuery::new("Algebra", "Easy"), 5)
            .unwrap_err();
        assert!(matches!(err, QgenError::MissingColumn { ref column, .. } if column == "Topic Name"));

        let no_difficulty = table(&["Topic Name", "Question"], &[&["Algebra", "q"]]);
        let err = FewshotSelector::seeded(1)
            .select_by_topic(&no_difficulty, &TopicQuery::new("Algebra", "Easy"), 5)
            .unwrap_err();
        assert!(matches!(err, QgenError::MissingColumn { ref column, .. } if column == "Difficulty Level"));
    }

    #[test]
    fn test_count_is_min_of_k_and_pool() {
        let rows: Vec<Vec<String>> = (0..12)
            .map(|i| vec!["Ratio".into(), "Easy".into(), format!("q{}", i)])
            .collect();
        let row_refs: Vec<Vec<&str>> = rows
            .iter()
            .map(|r| r.iter().map(String::as_str).collect())
            .collect();
        let slices: Vec<&[&str]> = row_refs.iter().map(Vec::as_slice).collect();
        let bank = table(&["Topic Name", "Difficulty Level", "Question"], &slices);

        let mut selector = FewshotSelector::seeded(3);
        for k in [0, 1, 5, 12, 40] {
            let selection = selector
                .select_by_topic(&bank, &TopicQuery::new("ratio", "easy"), k)
                .unwrap();
            assert_eq!(selection.len(), k.min(12));
            assert_eq!(selection.pool_size, 12);
            let unique: HashSet<_> = selection.examples.iter().collect();
            assert_eq!(unique.len(), selection.len());
        }
    }

    #[test]
    fn test_repeated_calls_draw_from_same_pool() {
        let bank = table(
            &["Topic Name", "Difficulty Level", "Question"],
            &[
                &["Ratio", "Easy", "a"],
                &["Ratio", "Easy", "b"],
                &["Ratio", "Easy", "c"],
                &["Ratio", "Hard", "d"],
                &["Percent", "Easy", "e"],
            ],
        );
        let pool: HashSet<&str> = ["a", "b", "c"].into_iter().collect();
        let mut selector = FewshotSelector::new();
        for _ in 0..20 {
            let selection = selector
                .select_by_topic(&bank, &TopicQuery::new("Ratio", "Easy"), 2)
                .unwrap();
            assert_eq!(selection.len(), 2);
            assert!(selection.examples.iter().all(|e| pool.contains(e.question())));
        }
    }

    #[test]
    fn test_same_seed_same_sample() {
        let bank = table(
            &["Topic Name", "Difficulty Level", "Question"],
            &[
                &["Ratio", "Easy", "a"],
                &["Ratio", "Easy", "b"],
                &["Ratio", "Easy", "c"],
                &["Ratio", "Easy", "d"],
            ],
        );
        let query = TopicQuery::new("Ratio", "Easy");
        let first = FewshotSelector::seeded(42).select_by_topic(&bank, &query, 2).unwrap();
        let second = FewshotSelector::seeded(42).select_by_topic(&bank, &query, 2).unwrap();
        assert_eq!(first.examples, second.examples);
    }

    #[test]
    fn test_missing_cells_project_to_empty_strings() {
        let bank = table(
            &["Topic Name", "Difficulty Level", "Question", "Hint", "Answer"],
            &[&["Algebra", "Easy", " Expand (x+1)^2 ", "", ""]],
        );
        let selection = FewshotSelector::seeded(1)
            .select_by_topic(&bank, &TopicQuery::new("Algebra", "Easy"), 1)
            .unwrap();
        assert_eq!(
            selection.examples,
            vec![math("Expand (x+1)^2", "", "Easy")]
        );
    }

    fn science_bank() -> Table {
        table(
            &["Subtopic", "Question type", "Question", "Answer"],
            &[
                &["Waves", "MCQ", "Speed of sound?", "340 m/s"],
                &["Waves", "Short answer", "Define amplitude.", "Max displacement"],
                &["Sound waves", "MCQ", "Unit of frequency?", "Hz"],
                &["Light", "MCQ", "Speed of light?", "3e8 m/s"],
            ],
        )
    }

    #[test]
    fn test_science_filters_question_type_then_subtopic() {
        let mut selector = FewshotSelector::seeded(5);
        let selection = selector
            .select_by_question_type(&science_bank(), &QuestionTypeQuery::new("mcq", "waves"), 10)
            .unwrap();

        assert_eq!(selection.len(), 1);
        assert_eq!(selection.examples[0].question(), "Speed of sound?");
        assert_eq!(selection.primary_tier, Some(MatchTier::Exact));
        assert_eq!(selection.secondary_tier, Some(MatchTier::Exact));
        assert!(matches!(
            &selection.examples[0],
            ExampleRecord::Science(e) if e.subtopic == "Waves" && e.question_type == "MCQ"
        ));
    }

    #[test]
    fn test_science_subtopic_substring_tier() {
        let mut selector = FewshotSelector::seeded(5);
        let selection = selector
            .select_by_question_type(&science_bank(), &QuestionTypeQuery::new("MCQ", "sound"), 10)
            .unwrap();
        assert_eq!(selection.len(), 1);
        assert_eq!(selection.secondary_tier, Some(MatchTier::Substring));
        assert_eq!(selection.examples[0].question(), "Unit of frequency?");
    }

    #[test]
    fn test_science_has_no_off_subtopic_tier_by_default() {
        let mut selector = FewshotSelector::seeded(5);
        let selection = selector
            .select_by_question_type(&science_bank(), &QuestionTypeQuery::new("MCQ", "Magnetism"), 10)
            .unwrap();
        assert!(selection.is_empty());
        assert_eq!(selection.primary_tier, Some(MatchTier::Exact));
        assert!(!selection.used_fallback);
    }

    #[test]
    fn test_science_subtopic_fallback_knob() {
        let mut selector = FewshotSelector::seeded(5).with_subtopic_fallback(true);
        let selection = selector
            .select_by_question_type(&science_bank(), &QuestionTypeQuery::new("MCQ", "Magnetism"), 10)
            .unwrap();
        assert_eq!(selection.len(), 3);
        assert!(selection.used_fallback);
        assert_eq!(selection.secondary_tier, Some(MatchTier::Fallback));
    }

    #[test]
    fn test_science_without_subtopic_column() {
        let bank = table(
            &["Question type", "Question", "Answer"],
            &[&["Long answer", "Explain refraction.", "..."]],
        );
        let selection = FewshotSelector::seeded(5)
            .select_by_question_type(&bank, &QuestionTypeQuery::new("long", "Light"), 3)
            .unwrap();
        assert_eq!(selection.len(), 1);
        assert_eq!(selection.primary_tier, Some(MatchTier::Substring));
        assert!(matches!(&selection.examples[0], ExampleRecord::Science(e) if e.subtopic.is_empty()));
    }

    #[test]
    fn test_science_requires_question_type_column() {
        let bank = table(&["Subtopic", "Question"], &[&["Waves", "q"]]);
        let err = FewshotSelector::seeded(5)
            .select_by_question_type(&bank, &QuestionTypeQuery::new("MCQ", "Waves"), 3)
            .unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Malformed);
    }
}
