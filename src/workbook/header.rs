//! @acp:module "Header Detector"
//! @acp:summary "Locate the real header row in loosely formatted sheets"
//! @acp:domain workbook
//! @acp:layer logic
//!
//! Science workbooks often carry title rows, notes or blank padding above the
//! column names. Detection scans a bounded window of a raw (header-less) read
//! and returns the first row containing enough expected keywords. Matching is
//! substring based so annotated headers such as "Question type (required)"
//! still count, at the cost of occasional false positives in body text.

use super::table::Table;

/// Keywords expected in a science workbook header
pub const SCIENCE_HEADER_KEYWORDS: [&str; 4] = ["subtopic", "question", "question type", "answer"];

/// Rows scanned before giving up
pub const DEFAULT_MAX_SEARCH_ROWS: usize = 8;

#[derive(Debug, Clone)]
pub struct HeaderDetector {
    keywords: Vec<String>,
    max_search_rows: usize,
    min_matches: usize,
}

impl HeaderDetector {
    pub fn new<I, S>(keywords: I, max_search_rows: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            keywords: keywords
                .into_iter()
                .map(|k| k.as_ref().trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
            max_search_rows,
            min_matches: 1,
        }
    }

    /// Detector for science chapter workbooks
    pub fn science() -> Self {
        Self::new(SCIENCE_HEADER_KEYWORDS, DEFAULT_MAX_SEARCH_ROWS)
    }

    /// Require at least `n` distinct keywords on the header row
    pub fn with_min_matches(mut self, n: usize) -> Self {
        self.min_matches = n.max(1);
        self
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn max_search_rows(&self) -> usize {
        self.max_search_rows
    }

    pub fn min_matches(&self) -> usize {
        self.min_matches
    }

    /// First row in the search window with enough keyword hits
    pub fn detect(&self, raw: &Table) -> Option<usize> {
        let window = self.max_search_rows.min(raw.len());
        (0..window).find(|&row| self.count_matches(&raw.row_text_lower(row)) >= self.min_matches)
    }

    fn count_matches(&self, row_values: &[String]) -> usize {
        self.keywords
            .iter()
            .filter(|kw| row_values.iter().any(|v| v.contains(kw.as_str())))
            .count()
    }
}

impl Default for HeaderDetector {
    fn default() -> Self {
        Self::science()
    }
}

/// Single-keyword-threshold detection over `raw`
pub fn detect_header_row(raw: &Table, keywords: &[&str], max_search_rows: usize) -> Option<usize> {
    HeaderDetector::new(keywords.iter().copied(), max_search_rows).detect(raw)
}
