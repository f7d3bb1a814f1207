//! Checkpoint store errors
//!
//! Raised by `CheckpointStore` implementations. The coordinator decides
//! whether a store error aborts the run (reads, clear-before) or is only
//! reported (writes, clear-after).

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for checkpoint store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Checkpoint store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Checkpoint store I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Checkpoint store data is corrupt: {0}")]
    Corrupt(String),

    #[error("Checkpoint value cannot be stored: {0}")]
    Unsupported(String),

    #[error("Checkpoint store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }
}
