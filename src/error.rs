//! @acp:module "Errors"
//! @acp:summary "Typed failures distinguishing missing from malformed resources"
//! @acp:domain core
//! @acp:layer types

use std::path::PathBuf;

use thiserror::Error;

/// Library result alias
pub type Result<T> = std::result::Result<T, QgenError>;

/// @acp:summary "All failures surfaced by the generator library"
#[derive(Debug, Error)]
pub enum QgenError {
    /// A workbook, folder or chapter file does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// The workbook does not carry a column the selector depends on
    #[error("Expected column '{column}'. Found: {found:?}")]
    MissingColumn { column: String, found: Vec<String> },

    /// Every sheet of a multi-sheet workbook was skipped
    #[error("No usable sheets found in {} for chapter '{chapter}'", path.display())]
    NoUsableSheets { path: PathBuf, chapter: String },

    /// The spreadsheet could not be decoded (bad format, unknown sheet)
    #[error("Failed to read {}: {message}", path.display())]
    Read { path: PathBuf, message: String },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Language model service unreachable or rejecting requests
    #[error("Language model error: {0}")]
    Llm(String),

    #[error("Export failed: {0}")]
    Export(String),

    #[error("Template error: {0}")]
    Template(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Coarse classification used by the CLI boundary to pick an exit code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Malformed,
    InvalidRequest,
    Unavailable,
    Internal,
}

impl ErrorKind {
    /// Process exit code for this kind of failure
    pub fn exit_code(self) -> i32 {
        match self {
            ErrorKind::Internal => 1,
            ErrorKind::InvalidRequest => 2,
            ErrorKind::NotFound => 3,
            ErrorKind::Malformed => 4,
            ErrorKind::Unavailable => 5,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::Malformed => "malformed",
            ErrorKind::InvalidRequest => "invalid_request",
            ErrorKind::Unavailable => "unavailable",
            ErrorKind::Internal => "internal",
        }
    }
}

impl QgenError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            QgenError::NotFound(_) => ErrorKind::NotFound,
            QgenError::MissingColumn { .. }
            | QgenError::NoUsableSheets { .. }
            | QgenError::Read { .. } => ErrorKind::Malformed,
            QgenError::InvalidRequest(_) => ErrorKind::InvalidRequest,
            QgenError::Llm(_) => ErrorKind::Unavailable,
            QgenError::Export(_)
            | QgenError::Template(_)
            | QgenError::Io(_)
            | QgenError::Json(_) => ErrorKind::Internal,
        }
    }

    pub(crate) fn read(path: impl Into<PathBuf>, message: impl std::fmt::Display) -> Self {
        QgenError::Read {
            path: path.into(),
            message: message.to_string(),
        }
    }
}
