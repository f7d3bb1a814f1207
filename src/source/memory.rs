//! In-memory query source
//!
//! Matching happens in `find`; sorting, limiting and projection happen once,
//! when the cursor is first counted or read. The sort is stable, so documents
//! with equal sort keys keep collection order.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use super::errors::{SourceError, SourceResult};
use super::{Cursor, Document, QuerySource};
use crate::config::{Direction, Projection};
use crate::filter::{sort_order, Filter};

/// The last query a `MemorySource` served, as the cursor shaped it
#[derive(Debug, Clone, PartialEq)]
pub struct QueryLog {
    pub filter: Filter,
    pub projection: Projection,
    pub sort: Option<(String, Direction)>,
    pub limit: Option<u64>,
    pub timeout_disabled: bool,
}

/// Collection held in memory
#[derive(Debug, Default)]
pub struct MemorySource {
    documents: Vec<Document>,
    last_query: Arc<Mutex<Option<QueryLog>>>,
}

impl MemorySource {
    pub fn new(documents: Vec<Document>) -> Self {
        Self {
            documents,
            last_query: Arc::new(Mutex::new(None)),
        }
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    /// Query most recently passed to `find`, updated as its cursor is shaped
    pub fn last_query(&self) -> Option<QueryLog> {
        self.last_query.lock().ok().and_then(|log| log.clone())
    }
}

impl FromIterator<Document> for MemorySource {
    fn from_iter<I: IntoIterator<Item = Document>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl QuerySource for MemorySource {
    type Cursor = MemoryCursor;

    fn find(&self, filter: &Filter, projection: &Projection) -> SourceResult<MemoryCursor> {
        let matched: Vec<Document> = self
            .documents
            .iter()
            .filter(|doc| filter.matches(doc))
            .cloned()
            .collect();

        if let Ok(mut log) = self.last_query.lock() {
            *log = Some(QueryLog {
                filter: filter.clone(),
                projection: projection.clone(),
                sort: None,
                limit: None,
                timeout_disabled: false,
            });
        }

        Ok(MemoryCursor {
            pending: Some(matched),
            ready: VecDeque::new(),
            yielded: 0,
            sort: None,
            limit: None,
            projection: projection.clone(),
            log: Arc::clone(&self.last_query),
        })
    }
}

/// Cursor over a `MemorySource` query
#[derive(Debug)]
pub struct MemoryCursor {
    /// Matched documents, until the cursor is prepared
    pending: Option<Vec<Document>>,
    ready: VecDeque<Document>,
    yielded: u64,
    sort: Option<(String, Direction)>,
    limit: Option<u64>,
    projection: Projection,
    log: Arc<Mutex<Option<QueryLog>>>,
}

impl MemoryCursor {
    fn ensure_unprepared(&self, operation: &str) -> SourceResult<()> {
        if self.pending.is_none() {
            return Err(SourceError::CursorState(format!(
                "{} after iteration started",
                operation
            )));
        }
        Ok(())
    }

    fn update_log(&self, update: impl FnOnce(&mut QueryLog)) {
        if let Ok(mut log) = self.log.lock() {
            if let Some(log) = log.as_mut() {
                update(log);
            }
        }
    }

    /// Applies sort and limit once; later calls are no-ops
    fn prepare(&mut self) {
        let Some(mut documents) = self.pending.take() else {
            return;
        };

        if let Some((field, direction)) = &self.sort {
            documents.sort_by(|a, b| {
                let ordering = sort_order(a.get(field.as_str()), b.get(field.as_str()));
                match direction {
                    Direction::Ascending => ordering,
                    Direction::Descending => ordering.reverse(),
                }
            });
        }
        if let Some(limit) = self.limit {
            documents.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        }
        self.ready = documents.into();
    }
}

impl Cursor for MemoryCursor {
    fn sort(&mut self, field: &str, direction: Direction) -> SourceResult<()> {
        self.ensure_unprepared("sort")?;
        self.sort = Some((field.to_string(), direction));
        self.update_log(|log| log.sort = Some((field.to_string(), direction)));
        Ok(())
    }

    fn limit(&mut self, limit: u64) -> SourceResult<()> {
        self.ensure_unprepared("limit")?;
        self.limit = Some(limit);
        self.update_log(|log| log.limit = Some(limit));
        Ok(())
    }

    fn count(&mut self) -> SourceResult<u64> {
        self.prepare();
        Ok(self.yielded + self.ready.len() as u64)
    }

    fn disable_timeout(&mut self) -> SourceResult<()> {
        self.update_log(|log| log.timeout_disabled = true);
        Ok(())
    }

    fn next_document(&mut self) -> SourceResult<Option<Document>> {
        self.prepare();
        match self.ready.pop_front() {
            Some(document) => {
                self.yielded += 1;
                Ok(Some(self.projection.apply(&document)))
            }
            None => Ok(None),
        }
    }
}
