//! @acp:module "Topic Index"
//! @acp:summary "Build the static topic listings offered to question requests"
//! @acp:domain topics
//! @acp:layer service
//!
//! Math banks list their `Topic Name` values per chapter (GCSE) or per sheet
//! (A-level). Science banks list subtopics and question types per chapter
//! workbook.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::Path;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{QgenError, Result};
use crate::fewshot::{QUESTION_TYPE_COLUMN, SUBTOPIC_COLUMN, TOPIC_COLUMN};
use crate::workbook::header::DEFAULT_MAX_SEARCH_ROWS;
use crate::workbook::{detect_sheets, HeaderDetector, Subject, Table, WorkbookCache, WorkbookLocator};

/// Subtopics and question types found in one science chapter
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterTopics {
    pub topics: Vec<String>,
    pub question_types: Vec<String>,
}

/// Unique topic names per GCSE math chapter, in first-seen order.
///
/// A missing or unreadable chapter workbook yields an empty list.
pub fn math_gcse_topics(
    cache: &WorkbookCache,
    root: &Path,
    chapters: &[u32],
) -> BTreeMap<u32, Vec<String>> {
    let locator = WorkbookLocator::new(root);
    chapters
        .par_iter()
        .map(|&chapter| {
            let path = locator.math_chapter(chapter);
            let topics = match cache.load(&path, None) {
                Ok(table) => unique_topics(&table, &path.display().to_string()),
                Err(QgenError::NotFound(_)) => Vec::new(),
                Err(e) => {
                    warn!("Failed to read {}: {}", path.display(), e);
                    Vec::new()
                }
            };
            (chapter, topics)
        })
        .collect()
}

/// Unique topic names per sheet of the A-level math workbook
pub fn math_alevel_topics(cache: &WorkbookCache, root: &Path) -> Result<BTreeMap<String, Vec<String>>> {
    let path = WorkbookLocator::new(root).alevel_math();
    let sheets = cache.sheet_names(&path)?;

    Ok(sheets
        .into_par_iter()
        .map(|sheet| {
            let topics = match cache.load(&path, Some(&sheet)) {
                Ok(table) => unique_topics(&table, &format!("sheet '{}'", sheet)),
                Err(e) => {
                    warn!("Failed to read sheet '{}': {}", sheet, e);
                    Vec::new()
                }
            };
            (sheet, topics)
        })
        .collect())
}

/// Subtopics and question types per chapter workbook of a science subject.
///
/// A sheet counts only when one header row names both `Subtopic` and
/// `Question type`. Chapters where either list comes out empty are omitted.
pub fn science_topics(
    cache: &WorkbookCache,
    root: &Path,
    subject: &Subject,
) -> Result<BTreeMap<String, ChapterTopics>> {
    let folder = WorkbookLocator::new(root).subject_dir(subject);
    if !folder.is_dir() {
        return Err(QgenError::NotFound(format!("Folder not found: {}", folder.display())));
    }

    let pattern = folder.join("*.xlsx");
    let workbooks: Vec<_> = glob::glob(&pattern.to_string_lossy())
        .map_err(|e| QgenError::InvalidRequest(format!("Bad folder pattern: {}", e)))?
        .filter_map(|entry| entry.ok())
        .filter(|path| {
            !path
                .file_name()
                .map(|n| n.to_string_lossy().starts_with("~$"))
                .unwrap_or(false)
        })
        .collect();

    let prefix = format!("{} Chapter ", subject.folder());
    let detector = HeaderDetector::new(["subtopic", "question type"], DEFAULT_MAX_SEARCH_ROWS).with_min_matches(2);

    Ok(workbooks
        .par_iter()
        .filter_map(|path| {
            let stem = path.file_stem()?.to_string_lossy().into_owned();
            let chapter = stem.replace(&prefix, "").trim().to_string();
            let topics = chapter_topics(cache, path, &detector)?;
            Some((chapter, topics))
        })
        .collect())
}

fn chapter_topics(cache: &WorkbookCache, path: &Path, detector: &HeaderDetector) -> Option<ChapterTopics> {
    let sheets = match detect_sheets(cache, path, detector) {
        Ok(sheets) => sheets,
        Err(e) => {
            warn!("Error reading {}: {}", path.display(), e);
            return None;
        }
    };

    let mut topics = BTreeSet::new();
    let mut question_types = BTreeSet::new();
    for sheet in sheets {
        let table = &sheet.table;
        if !table.has_column(SUBTOPIC_COLUMN) || !table.has_column(QUESTION_TYPE_COLUMN) {
            warn!("Missing required columns in sheet '{}' of {}", sheet.name, path.display());
            continue;
        }
        for row in 0..table.len() {
            topics.insert(table.text(row, SUBTOPIC_COLUMN));
            question_types.insert(table.text(row, QUESTION_TYPE_COLUMN));
        }
    }
    topics.remove("");
    question_types.remove("");

    if topics.is_empty() || question_types.is_empty() {
        debug!("No topics collected from {}", path.display());
        return None;
    }
    Some(ChapterTopics {
        topics: topics.into_iter().collect(),
        question_types: question_types.into_iter().collect(),
    })
}

/// `Topic Name` values, trimmed, without blanks or the literal `nan`
fn unique_topics(table: &Table, source: &str) -> Vec<String> {
    if !table.has_column(TOPIC_COLUMN) {
        warn!("'{}' not found in {}. Columns: {:?}", TOPIC_COLUMN, source, table.columns());
        return Vec::new();
    }

    let mut seen = HashSet::new();
    (0..table.len())
        .map(|row| table.text(row, TOPIC_COLUMN))
        .filter(|t| !t.is_empty() && !t.eq_ignore_ascii_case("nan"))
        .filter(|t| seen.insert(t.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::{write_workbook, SheetData};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn row(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_gcse_topics_unique_in_order() {
        let dir = TempDir::new().unwrap();
        let rows = vec![
            row(&["Topic Name ", "Difficulty Level"]),
            row(&["Fractions", "Easy"]),
            row(&[" Algebra", "Hard"]),
            row(&["nan", "Easy"]),
            row(&["Fractions", "Medium"]),
            row(&["", "Easy"]),
        ];
        write_workbook(&dir.path().join("Math/Math Chapter 1.xlsx"), &[SheetData::new("S", rows)]).unwrap();

        let cache = WorkbookCache::new();
        let topics = math_gcse_topics(&cache, dir.path(), &[1, 2]);
        assert_eq!(topics[&1], vec!["Fractions".to_string(), "Algebra".to_string()]);
        assert!(topics[&2].is_empty());
    }

    #[test]
    fn test_alevel_topics_per_sheet() {
        let dir = TempDir::new().unwrap();
        write_workbook(
            &dir.path().join("Math/A Level Math.xlsx"),
            &[
                SheetData::new("Pure", vec![row(&["Topic Name"]), row(&["Proof"]), row(&["Proof"])]),
                SheetData::new("Notes", vec![row(&["Remarks"]), row(&["draft"])]),
            ],
        )
        .unwrap();

        let topics = math_alevel_topics(&WorkbookCache::new(), dir.path()).unwrap();
        assert_eq!(topics["Pure"], vec!["Proof".to_string()]);
        assert!(topics["Notes"].is_empty());
    }

    #[test]
    fn test_alevel_missing_workbook() {
        let dir = TempDir::new().unwrap();
        let err = math_alevel_topics(&WorkbookCache::new(), dir.path()).unwrap_err();
        assert!(matches!(err, QgenError::NotFound(_)));
    }

    #[test]
    fn test_science_topics_require_both_headers() {
        let dir = TempDir::new().unwrap();
        let folder = dir.path().join("Physics");
        write_workbook(
            &folder.join("Physics Chapter Waves.xlsx"),
            &[
                SheetData::new(
                    "Main",
                    vec![
                        row(&["Waves worksheet"]),
                        row(&["Subtopic", "Question type", "Question", "Answer"]),
                        row(&["Sound", "MCQ", "q1", "a1"]),
                        row(&["Light", "Short", "q2", "a2"]),
                        row(&["Sound", "MCQ", "q3", "a3"]),
                    ],
                ),
                SheetData::new("Answers only", vec![row(&["Question", "Answer"]), row(&["q", "a"])]),
            ],
        )
        .unwrap();
        write_workbook(
            &folder.join("Physics Chapter Energy.xlsx"),
            &[SheetData::new("S", vec![row(&["Question"]), row(&["q"])])],
        )
        .unwrap();

        let topics = science_topics(&WorkbookCache::new(), dir.path(), &Subject::Physics).unwrap();
        assert_eq!(topics.len(), 1);
        assert_eq!(
            topics["Waves"],
            ChapterTopics {
                topics: vec!["Light".into(), "Sound".into()],
                question_types: vec!["MCQ".into(), "Short".into()],
            }
        );
    }

    #[test]
    fn test_science_missing_folder() {
        let dir = TempDir::new().unwrap();
        let err = science_topics(&WorkbookCache::new(), dir.path(), &Subject::Chemistry).unwrap_err();
        assert!(matches!(err, QgenError::NotFound(_)));
    }
}
