//! Query source capability
//!
//! The iterator never talks to a store driver directly. It needs a
//! `QuerySource` that turns a filter and projection into a `Cursor`, and a
//! cursor that can be sorted, limited, counted and drained one document at
//! a time.
//!
//! Adapters:
//! - `MemorySource`: documents held in memory, evaluated with `Filter::matches`
//! - `JsonLinesSource`: a newline-delimited JSON file loaded into memory

mod errors;
mod jsonl;
mod memory;

pub use errors::{SourceError, SourceResult};
pub use jsonl::JsonLinesSource;
pub use memory::{MemoryCursor, MemorySource, QueryLog};

use crate::config::{Direction, Projection};
use crate::filter::Filter;

/// A record as returned by the store
pub type Document = serde_json::Value;

/// Server-side cursor over a query result.
///
/// `sort`, `limit` and `disable_timeout` shape the query and must be
/// called before the first `count` or `next_document`.
pub trait Cursor {
    fn sort(&mut self, field: &str, direction: Direction) -> SourceResult<()>;

    fn limit(&mut self, limit: u64) -> SourceResult<()>;

    /// Number of documents this cursor yields, honouring the limit
    fn count(&mut self) -> SourceResult<u64>;

    /// Keeps the server from closing the cursor while the caller is slow
    fn disable_timeout(&mut self) -> SourceResult<()>;

    /// Next document, or `None` at end of stream
    fn next_document(&mut self) -> SourceResult<Option<Document>>;
}

/// Capability to run a filtered query
pub trait QuerySource {
    type Cursor: Cursor;

    fn find(&self, filter: &Filter, projection: &Projection) -> SourceResult<Self::Cursor>;
}

impl<T: QuerySource + ?Sized> QuerySource for &T {
    type Cursor = T::Cursor;

    fn find(&self, filter: &Filter, projection: &Projection) -> SourceResult<Self::Cursor> {
        (**self).find(filter, projection)
    }
}

impl<K: Cursor + ?Sized> Cursor for Box<K> {
    fn sort(&mut self, field: &str, direction: Direction) -> SourceResult<()> {
        (**self).sort(field, direction)
    }

    fn limit(&mut self, limit: u64) -> SourceResult<()> {
        (**self).limit(limit)
    }

    fn count(&mut self) -> SourceResult<u64> {
        (**self).count()
    }

    fn disable_timeout(&mut self) -> SourceResult<()> {
        (**self).disable_timeout()
    }

    fn next_document(&mut self) -> SourceResult<Option<Document>> {
        (**self).next_document()
    }
}
