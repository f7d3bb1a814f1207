//! Configuration of a batch run
//!
//! Everything a run needs to know before it starts: the iteration field and
//! direction, filter and projection, pacing, checkpoint policy, an optional
//! result limit and whether to precompute the total count.

mod batch_config;
mod direction;

pub use batch_config::{
    BatchConfig, IterationSpec, Projection, DEFAULT_BATCH_SIZE, DEFAULT_CHECKPOINT_PREFIX,
};
pub use direction::{Direction, IntoDirection};
