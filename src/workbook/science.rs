//! @acp:module "Science Aggregator"
//! @acp:summary "Combine every usable sheet of a multi-sheet chapter workbook"
//! @acp:domain workbook
//! @acp:layer logic

use std::path::Path;

use tracing::{debug, warn};

use super::header::HeaderDetector;
use super::loader::WorkbookCache;
use super::table::Table;
use crate::error::{QgenError, Result};

/// Lowercased column names that make a sheet usable
pub const SCIENCE_TARGET_COLUMNS: [&str; 3] = ["subtopic", "question", "question type"];

/// A sheet whose header row was located
#[derive(Debug, Clone)]
pub struct DetectedSheet {
    pub name: String,
    pub header_row: usize,
    pub table: Table,
}

/// Read every sheet raw, locate its header and re-frame it.
///
/// Sheets that are empty, fail to read, or have no detectable header are
/// skipped with a warning.
pub fn detect_sheets(
    cache: &WorkbookCache,
    path: &Path,
    detector: &HeaderDetector,
) -> Result<Vec<DetectedSheet>> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut detected = Vec::new();
    for sheet in cache.sheet_names(path)? {
        let raw = match cache.load_raw(path, Some(&sheet)) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Error reading sheet '{}' in {}: {}", sheet, file_name, e);
                continue;
            }
        };
        if raw.is_empty() {
            continue;
        }

        let Some(header_row) = detector.detect(&raw) else {
            warn!("Could not find proper header in sheet '{}' of {}", sheet, file_name);
            continue;
        };

        debug!("Sheet '{}' header at row {}", sheet, header_row);
        detected.push(DetectedSheet {
            table: raw.with_header_row(header_row),
            name: sheet,
            header_row,
        });
    }
    Ok(detected)
}

/// Concatenate the usable sheets of a science chapter workbook.
///
/// A sheet is usable when a header is detected and its columns include at
/// least one of [`SCIENCE_TARGET_COLUMNS`]. Zero usable sheets is an error.
pub fn load_science_table(
    cache: &WorkbookCache,
    path: &Path,
    chapter: &str,
    detector: &HeaderDetector,
) -> Result<Table> {
    let mut usable = Vec::new();
    for sheet in detect_sheets(cache, path, detector)? {
        let lower: Vec<String> = sheet
            .table
            .columns()
            .iter()
            .map(|c| c.to_lowercase())
            .collect();
        let has_target = SCIENCE_TARGET_COLUMNS
            .iter()
            .any(|target| lower.iter().any(|c| c == target));

        if !has_target {
            warn!(
                "Sheet '{}' in {} doesn't contain target columns; skipping.",
                sheet.name,
                path.display()
            );
            continue;
        }
        usable.push(sheet.table);
    }

    if usable.is_empty() {
        return Err(QgenError::NoUsableSheets {
            path: path.to_path_buf(),
            chapter: chapter.to_string(),
        });
    }

    debug!("Combined {} usable sheets from {}", usable.len(), path.display());
    Ok(Table::concat(&usable))
}
