//! @acp:module "Workbook Locator"
//! @acp:summary "Map subject, curriculum and chapter onto curated workbook files"
//! @acp:domain workbook
//! @acp:layer io

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{QgenError, Result};

/// Subject of a question bank
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Subject {
    Math,
    Physics,
    Chemistry,
    Other(String),
}

impl Subject {
    /// Folder name under the data root
    pub fn folder(&self) -> &str {
        match self {
            Subject::Math => "Math",
            Subject::Physics => "Physics",
            Subject::Chemistry => "Chemistry",
            Subject::Other(name) => name,
        }
    }

    /// Math banks are filtered by topic and difficulty; every other subject
    /// uses the question-type/subtopic layout
    pub fn is_math(&self) -> bool {
        matches!(self, Subject::Math)
    }

    pub fn is_science(&self) -> bool {
        matches!(self, Subject::Physics | Subject::Chemistry)
    }
}

impl FromStr for Subject {
    type Err = QgenError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        match trimmed.to_lowercase().as_str() {
            "" => Err(QgenError::InvalidRequest("subject must not be empty".into())),
            "math" | "maths" | "mathematics" => Ok(Subject::Math),
            "physics" => Ok(Subject::Physics),
            "chemistry" => Ok(Subject::Chemistry),
            _ => Ok(Subject::Other(trimmed.to_string())),
        }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.folder())
    }
}

/// Educational tier of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Curriculum {
    Gcse,
    ALevel,
}

impl Curriculum {
    /// Short tag used in output file names
    pub fn tag(self) -> &'static str {
        match self {
            Curriculum::Gcse => "GCSE",
            Curriculum::ALevel => "ALevel",
        }
    }
}

impl FromStr for Curriculum {
    type Err = QgenError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized: String = s
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '_'))
            .collect::<String>()
            .to_uppercase();
        match normalized.as_str() {
            "GCSE" => Ok(Curriculum::Gcse),
            "ALEVEL" => Ok(Curriculum::ALevel),
            _ => Err(QgenError::InvalidRequest(format!(
                "Invalid curriculum type: {}",
                s
            ))),
        }
    }
}

impl fmt::Display for Curriculum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Curriculum::Gcse => f.write_str("GCSE"),
            Curriculum::ALevel => f.write_str("A-Level"),
        }
    }
}

/// Which bank a request draws its examples from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BankRef {
    /// GCSE math: one workbook per chapter number
    MathChapter(u32),
    /// A-level math: one sheet per chapter in a shared workbook
    ALevelMathSheet(String),
    /// Science: one (possibly multi-sheet) workbook per chapter
    ScienceChapter { subject: Subject, chapter: String },
}

impl fmt::Display for BankRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BankRef::MathChapter(n) => write!(f, "chapter {}", n),
            BankRef::ALevelMathSheet(sheet) => write!(f, "sheet '{}'", sheet),
            BankRef::ScienceChapter { subject, chapter } => {
                write!(f, "{} chapter '{}'", subject, chapter)
            }
        }
    }
}

/// Resolves bank references against the curated data root
#[derive(Debug, Clone)]
pub struct WorkbookLocator {
    root: PathBuf,
}

impl WorkbookLocator {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn subject_dir(&self, subject: &Subject) -> PathBuf {
        self.root.join(subject.folder())
    }

    /// `<root>/Math/Math Chapter {n}.xlsx`
    pub fn math_chapter(&self, chapter: u32) -> PathBuf {
        self.subject_dir(&Subject::Math)
            .join(format!("Math Chapter {}.xlsx", chapter))
    }

    /// `<root>/Math/A Level Math.xlsx`
    pub fn alevel_math(&self) -> PathBuf {
        self.subject_dir(&Subject::Math).join("A Level Math.xlsx")
    }

    /// Find the workbook for a science chapter.
    ///
    /// Tries the conventional names first, then the first workbook (by file
    /// name) whose stem contains the chapter name, ignoring case.
    pub fn science_chapter(&self, subject: &Subject, chapter: &str) -> Result<PathBuf> {
        let folder = self.subject_dir(subject);
        if !folder.is_dir() {
            return Err(QgenError::NotFound(format!(
                "Folder not found: {}",
                folder.display()
            )));
        }

        let name = subject.folder();
        let candidates = [
            folder.join(format!("{} Chapter {}.xlsx", name, chapter)),
            folder.join(format!("{} Chapter {}.xls", name, chapter)),
            folder.join(format!("{}.xlsx", chapter)),
            folder.join(format!("{}.xls", chapter)),
        ];
        if let Some(found) = candidates.iter().find(|c| c.is_file()) {
            return Ok(found.clone());
        }

        let needle = chapter.to_lowercase();
        let mut workbooks = list_workbooks(&folder)?;
        workbooks.sort();
        workbooks
            .into_iter()
            .find(|p| {
                p.file_stem()
                    .map(|s| s.to_string_lossy().to_lowercase().contains(&needle))
                    .unwrap_or(false)
            })
            .ok_or_else(|| {
                QgenError::NotFound(format!(
                    "Excel not found for chapter '{}' in {}",
                    chapter,
                    folder.display()
                ))
            })
    }
}

/// Spreadsheet files directly inside `folder`, skipping office lock files
pub fn list_workbooks(folder: &Path) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    for entry in std::fs::read_dir(folder)? {
        let path = entry?.path();
        if !path.is_file() || is_lock_file(&path) {
            continue;
        }
        let is_sheet = path
            .extension()
            .map(|e| matches!(e.to_string_lossy().to_lowercase().as_str(), "xlsx" | "xls"))
            .unwrap_or(false);
        if is_sheet {
            found.push(path);
        }
    }
    Ok(found)
}

pub(crate) fn is_lock_file(path: &Path) -> bool {
    path.file_name()
        .map(|n| n.to_string_lossy().starts_with("~$"))
        .unwrap_or(false)
}
