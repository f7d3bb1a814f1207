//! docbatch - resumable, paced batch iteration over a document collection
//!
//! A `BatchIterator` walks a query ordered by one iteration field, calls
//! back once per document and stores the field value of the last processed
//! document as a checkpoint. A restarted run continues strictly after that
//! value instead of scanning from the beginning.
//!
//! ```ignore
//! use docbatch::batch::BatchIterator;
//! use docbatch::checkpoint::MemoryCheckpointStore;
//! use docbatch::config::BatchConfig;
//!
//! let config = BatchConfig::new()
//!     .with_iteration_field("_id", 1)?
//!     .with_batch_size(500)?
//!     .with_save_state(true);
//!
//! let mut iterator = BatchIterator::new(source)
//!     .with_config(config)
//!     .with_checkpoint_store(MemoryCheckpointStore::new());
//!
//! let processed = iterator.execute(|doc, ordinal, total| handle(doc, ordinal, total))?;
//! ```

pub mod batch;
pub mod checkpoint;
pub mod cli;
pub mod config;
pub mod filter;
pub mod observability;
pub mod source;
