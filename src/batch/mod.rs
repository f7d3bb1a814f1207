//! Checkpointed batch iteration
//!
//! `BatchIterator` runs one configured query to completion, calling back
//! once per document, pacing itself against the store and saving its
//! position so that a restarted run resumes after the last processed
//! document.
//!
//! # Failure boundaries
//!
//! - Configuration errors are raised by the setter or at run start
//! - A document without a usable iteration-field value aborts the run
//! - A callback error aborts the run and is returned unchanged
//! - Checkpoint write failures are logged and counted; the run continues
//!
//! A failed run never rolls back checkpoints already written.

mod errors;
mod iterator;
mod pacing;

pub use errors::{
    BatchError, BatchErrorCode, BatchResult, Phase, RunError, Severity as BatchSeverity,
};
pub use iterator::{BatchIterator, RunPhase, StopReason};
pub use pacing::PacingPolicy;
