//! Error types for loading and rendering reports

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while fetching or decoding report content
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Failed to load {path}: {message}")]
    Fetch { path: PathBuf, message: String },

    #[error("Invalid JSON in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid {kind} block: {message}")]
    InvalidBlock { kind: &'static str, message: String },

    #[error("Table \"{caption}\": row {row} has {found} cells, expected {expected}")]
    RowArity {
        caption: String,
        row: usize,
        found: usize,
        expected: usize,
    },
}

impl ReportError {
    pub fn fetch(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        ReportError::Fetch {
            path: path.into(),
            message: message.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ReportError>;
