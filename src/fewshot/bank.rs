//! @acp:module "Example Bank"
//! @acp:summary "Resolve a bank reference into a loaded table"
//! @acp:domain fewshot
//! @acp:layer io

use std::sync::Arc;

use crate::error::Result;
use crate::workbook::{load_science_table, BankRef, HeaderDetector, Table, WorkbookCache, WorkbookLocator};

/// Curated banks on disk, read through a shared cache
#[derive(Debug, Clone)]
pub struct ExampleBank {
    cache: Arc<WorkbookCache>,
    locator: WorkbookLocator,
    detector: HeaderDetector,
}

impl ExampleBank {
    pub fn new(cache: Arc<WorkbookCache>, locator: WorkbookLocator, detector: HeaderDetector) -> Self {
        Self {
            cache,
            locator,
            detector,
        }
    }

    pub fn cache(&self) -> &Arc<WorkbookCache> {
        &self.cache
    }

    /// Load the table behind `bank`.
    ///
    /// Math chapters and A-level sheets come straight from the cache. Science
    /// chapters are aggregated from their usable sheets on every call; the
    /// underlying raw sheet reads are cached.
    pub fn table(&self, bank: &BankRef) -> Result<Arc<Table>> {
        match bank {
            BankRef::MathChapter(chapter) => {
                self.cache.load(&self.locator.math_chapter(*chapter), None)
            }
            BankRef::ALevelMathSheet(sheet) => {
                self.cache.load(&self.locator.alevel_math(), Some(sheet))
            }
            BankRef::ScienceChapter { subject, chapter } => {
                let path = self.locator.science_chapter(subject, chapter)?;
                let table = load_science_table(&self.cache, &path, chapter, &self.detector)?;
                Ok(Arc::new(table))
            }
        }
    }
}
