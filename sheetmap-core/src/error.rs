use crate::rules::validation::ValidationReport;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort an extraction run.
///
/// A keyword that matches nothing is not an error: the rule's section is
/// emitted empty and the run continues.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Cannot read workbook {path}: {reason}")]
    GridAccess { path: PathBuf, reason: String },

    #[error("Malformed rules:\n{0}")]
    MalformedRules(ValidationReport),

    #[error("Cannot parse rule file {path}: {reason}")]
    RuleFile { path: PathBuf, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ExtractError {
    pub fn grid_access(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        ExtractError::GridAccess {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

pub type ExtractResult<T> = std::result::Result<T, ExtractError>;
