//! @acp:module "Workbook Loader"
//! @acp:summary "Read sheets through calamine with an mtime-keyed table cache"
//! @acp:domain workbook
//! @acp:layer io

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::SystemTime;

use calamine::{open_workbook_auto, Data, Reader};
use tracing::debug;

use super::table::{Cell, Table};
use crate::error::{QgenError, Result};

/// How a sheet is interpreted after reading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SheetLayout {
    /// First row holds the column names
    Headed,
    /// No header interpretation; every row is data
    Raw,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    path: PathBuf,
    sheet: Option<String>,
    modified: SystemTime,
    layout: SheetLayout,
}

/// @acp:summary "Process-lifetime cache of loaded sheets"
///
/// Entries are keyed by canonical path, sheet, modification time and layout.
/// A file touched on disk produces a new key, so the old entry is simply never
/// hit again. Nothing is evicted.
///
/// The lock is released while a sheet is read: two callers missing on the
/// same key both read the file and the later insert wins.
#[derive(Debug, Default)]
pub struct WorkbookCache {
    entries: Mutex<HashMap<CacheKey, Arc<Table>>>,
    reads: AtomicUsize,
}

impl WorkbookCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a sheet with its first row as header. `None` selects the first sheet.
    pub fn load(&self, path: &Path, sheet: Option<&str>) -> Result<Arc<Table>> {
        self.fetch(path, sheet, SheetLayout::Headed)
    }

    /// Load a sheet without header interpretation
    pub fn load_raw(&self, path: &Path, sheet: Option<&str>) -> Result<Arc<Table>> {
        self.fetch(path, sheet, SheetLayout::Raw)
    }

    /// Sheet names of a workbook, in workbook order
    pub fn sheet_names(&self, path: &Path) -> Result<Vec<String>> {
        ensure_exists(path)?;
        let workbook = open_workbook_auto(path).map_err(|e| QgenError::read(path, e))?;
        Ok(workbook.sheet_names())
    }

    /// Number of physical sheet reads performed so far
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::Relaxed)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn fetch(&self, path: &Path, sheet: Option<&str>, layout: SheetLayout) -> Result<Arc<Table>> {
        ensure_exists(path)?;
        let resolved = path.canonicalize()?;
        let modified = std::fs::metadata(&resolved)?.modified()?;
        let key = CacheKey {
            path: resolved,
            sheet: sheet.map(str::to_string),
            modified,
            layout,
        };

        if let Some(table) = self.lock().get(&key) {
            debug!("Cache hit for {} [{:?}]", key.path.display(), key.sheet);
            return Ok(Arc::clone(table));
        }

        debug!("Cache miss for {} [{:?}], reading", key.path.display(), key.sheet);
        let rows = read_sheet(&key.path, sheet)?;
        self.reads.fetch_add(1, Ordering::Relaxed);

        let raw = Table::raw(rows);
        let table = Arc::new(match layout {
            SheetLayout::Raw => raw,
            SheetLayout::Headed => raw.with_header_row(0),
        });

        self.lock().insert(key, Arc::clone(&table));
        Ok(table)
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<CacheKey, Arc<Table>>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn ensure_exists(path: &Path) -> Result<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(QgenError::NotFound(format!(
            "Excel file not found: {}",
            path.display()
        )))
    }
}

/// Read every row of one sheet as cells
fn read_sheet(path: &Path, sheet: Option<&str>) -> Result<Vec<Vec<Cell>>> {
    let mut workbook = open_workbook_auto(path).map_err(|e| QgenError::read(path, e))?;
    let names = workbook.sheet_names();

    let name = match sheet {
        Some(name) => {
            if !names.iter().any(|n| n == name) {
                return Err(QgenError::read(
                    path,
                    format!("sheet '{}' not found (available: {:?})", name, names),
                ));
            }
            name.to_string()
        }
        None => names
            .first()
            .cloned()
            .ok_or_else(|| QgenError::read(path, "workbook has no sheets"))?,
    };

    let range = workbook
        .worksheet_range(&name)
        .map_err(|e| QgenError::read(path, e))?;

    Ok(range
        .rows()
        .map(|row| row.iter().map(to_cell).collect())
        .collect())
}

fn to_cell(data: &Data) -> Cell {
    match data {
        Data::Empty | Data::Error(_) => None,
        Data::String(s) if s.is_empty() => None,
        Data::Float(f) if f.is_nan() => None,
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::{write_workbook, SheetData};
    use std::fs::File;
    use std::time::Duration;
    use tempfile::TempDir;

    fn write_fixture(dir: &TempDir, name: &str) -> PathBuf {
        let path = dir.path().join(name);
        write_workbook(
            &path,
            &[
                SheetData::new(
                    "Chapter 1",
                    vec![
                        vec![" Topic Name ".into(), "Difficulty Level  ".into(), "Question".into()],
                        vec!["Algebra".into(), "Easy".into(), "2+2?".into()],
                    ],
                ),
                SheetData::new(
                    "Chapter 2",
                    vec![
                        vec!["Topic Name".into(), "Question".into()],
                        vec!["Vectors".into(), "|v|?".into()],
                    ],
                ),
            ],
        )
        .unwrap();
        path
    }

    #[test]
    fn test_load_trims_columns() {
        let dir = TempDir::new().unwrap();
        let path = write_fixture(&dir, "bank.xlsx");
        let cache = WorkbookCache::new();

        let table = cache.load(&path, None).unwrap();
        assert_eq!(table.columns(), &["Topic Name", "Difficulty Level", "Question"]);
        assert_eq!(table.text(0, "Question"), "2+2?");
    }

    #[test]
    fn test_second_load_is_served_from_cache() {
        let dir = TempDir::new().unwrap();
        let path = write_fixture(&dir, "bank.xlsx");
        let cache = WorkbookCache::new();

        let first = cache.load(&path, None).unwrap();
        let second = cache.load(&path, None).unwrap();
        assert_eq!(cache.reads(), 1);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_touching_file_forces_reread() {
        let dir = TempDir::new().unwrap();
        let path = write_fixture(&dir, "bank.xlsx");
        let cache = WorkbookCache::new();

        cache.load(&path, None).unwrap();
        let later = std::fs::metadata(&path).unwrap().modified().unwrap() + Duration::from_secs(5);
        File::options()
            .write(true)
            .open(&path)
            .unwrap()
            .set_modified(later)
            .unwrap();

        cache.load(&path, None).unwrap();
        assert_eq!(cache.reads(), 2);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_sheet_and_layout_are_separate_entries() {
        let dir = TempDir::new().unwrap();
        let path = write_fixture(&dir, "bank.xlsx");
        let cache = WorkbookCache::new();

        let named = cache.load(&path, Some("Chapter 2")).unwrap();
        assert_eq!(named.text(0, "Topic Name"), "Vectors");

        let raw = cache.load_raw(&path, Some("Chapter 2")).unwrap();
        assert_eq!(raw.len(), 2);
        assert_eq!(raw.value(0, 0), Some("Topic Name"));
        assert_eq!(cache.reads(), 2);
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let cache = WorkbookCache::new();
        let err = cache.load(Path::new("/nonexistent/Math Chapter 7.xlsx"), None).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::NotFound);
    }

    #[test]
    fn test_unknown_sheet_is_read_error() {
        let dir = TempDir::new().unwrap();
        let path = write_fixture(&dir, "bank.xlsx");
        let cache = WorkbookCache::new();

        let err = cache.load(&path, Some("Chapter 9")).unwrap_err();
        assert!(matches!(err, QgenError::Read { .. }));
        assert_eq!(cache.reads(), 0);
    }

    #[test]
    fn test_unreadable_format_is_read_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.xlsx");
        std::fs::write(&path, b"not a spreadsheet").unwrap();

        let err = WorkbookCache::new().load(&path, None).unwrap_err();
        assert!(matches!(err, QgenError::Read { .. }));
    }

    #[test]
    fn test_sheet_names_in_order() {
        let dir = TempDir::new().unwrap();
        let path = write_fixture(&dir, "bank.xlsx");
        let names = WorkbookCache::new().sheet_names(&path).unwrap();
        assert_eq!(names, vec!["Chapter 1", "Chapter 2"]);
    }
}
