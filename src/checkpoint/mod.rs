//! Checkpoint subsystem for docbatch
//!
//! A checkpoint is the iteration-field value of the last processed
//! document, stored under a key derived from the iteration spec. It is the
//! only state that survives a crash.
//!
//! # Timing
//!
//! - Read once, before the cursor is opened
//! - Written after every processed document (best-effort)
//! - Never rolled back: a failed run keeps the last written position
//!
//! # Stores
//!
//! - `MemoryCheckpointStore`: in process, with expiry
//! - `FileCheckpointStore`: one JSON file, atomically replaced on write
//! - `NoCheckpointStore`: no persistence

mod coordinator;
mod errors;
mod file_store;
mod key;
mod store;

pub use coordinator::{CheckpointCoordinator, PersistOutcome};
pub use errors::{StoreError, StoreResult};
pub use file_store::FileCheckpointStore;
pub use key::{Checkpoint, CheckpointKey};
pub use store::{CheckpointStore, MemoryCheckpointStore, NoCheckpointStore};
