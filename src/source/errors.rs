//! Query source errors
//!
//! Any source error reaching the iterator aborts the run as a
//! `BATCH_RUNTIME_ERROR`; there is no retry.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::batch::BatchError;

/// Result type for query source operations
pub type SourceResult<T> = Result<T, SourceError>;

/// Query source and cursor errors
#[derive(Debug, Error)]
pub enum SourceError {
    /// The backing store rejected or failed the request
    #[error("Query backend error: {0}")]
    Backend(String),

    #[error("Cannot read collection {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid document at line {line}: {message}")]
    Parse { line: usize, message: String },

    /// Cursor method called in the wrong state, e.g. `sort` after iteration began
    #[error("Cursor misuse: {0}")]
    CursorState(String),
}

impl SourceError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        SourceError::Io {
            path: path.into(),
            source,
        }
    }

    /// Wraps the error as a run-time failure of `operation`
    pub fn into_batch_error(self, operation: &str) -> BatchError {
        BatchError::runtime(operation, self.to_string()).with_source(self)
    }
}
