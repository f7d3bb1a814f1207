//! Query filters for batch runs
//!
//! - `ast`: the filter structure and its JSON form
//! - `matcher`: evaluating a filter against a document in process
//! - `composer`: merging a filter with the resume condition of a checkpoint

mod ast;
mod composer;
mod matcher;

pub use ast::{Constraint, Filter, FilterOp, AND_KEY};
pub use composer::RangeComposer;
pub use matcher::{compare_values, sort_order};
