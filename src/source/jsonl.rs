//! Newline-delimited JSON collection
//!
//! One document per line; every document must be a JSON object. Blank lines
//! are skipped. The whole file is loaded when the source is opened.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use serde_json::Value;

use super::errors::{SourceError, SourceResult};
use super::memory::{MemoryCursor, MemorySource, QueryLog};
use super::{Document, QuerySource};
use crate::config::Projection;
use crate::filter::Filter;

/// Collection read from a `.jsonl` file
#[derive(Debug)]
pub struct JsonLinesSource {
    path: PathBuf,
    inner: MemorySource,
}

impl JsonLinesSource {
    pub fn open(path: impl AsRef<Path>) -> SourceResult<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).map_err(|e| SourceError::io(&path, e))?;
        let documents = Self::parse(BufReader::new(file), &path)?;
        Ok(Self {
            path,
            inner: MemorySource::new(documents),
        })
    }

    fn parse<R: BufRead>(reader: R, path: &Path) -> SourceResult<Vec<Document>> {
        let mut documents = Vec::new();
        for (index, line) in reader.lines().enumerate() {
            let line_no = index + 1;
            let line = line.map_err(|e| SourceError::io(path, e))?;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            let document: Value =
                serde_json::from_str(trimmed).map_err(|e| SourceError::Parse {
                    line: line_no,
                    message: e.to_string(),
                })?;
            if !document.is_object() {
                return Err(SourceError::Parse {
                    line: line_no,
                    message: "expected a JSON object".into(),
                });
            }
            documents.push(document);
        }
        Ok(documents)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn last_query(&self) -> Option<QueryLog> {
        self.inner.last_query()
    }
}

impl QuerySource for JsonLinesSource {
    type Cursor = MemoryCursor;

    fn find(&self, filter: &Filter, projection: &Projection) -> SourceResult<MemoryCursor> {
        self.inner.find(filter, projection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Direction;
    use crate::source::Cursor;
    use std::fs;
    use tempfile::TempDir;

    // =========================================================================
    // Helper Functions
    // =========================================================================

    fn write_collection(dir: &TempDir, contents: &str) -> PathBuf {
        let path = dir.path().join("users.jsonl");
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_open_skips_blank_lines() {
        let dir = TempDir::new().unwrap();
        let path = write_collection(
            &dir,
            "{\"_id\": 2}\n\n   \n{\"_id\": 1}\n",
        );

        let source = JsonLinesSource::open(&path).unwrap();
        assert_eq!(source.len(), 2);
        assert_eq!(source.path(), path.as_path());

        let mut cursor = source.find(&Filter::all(), &Projection::all()).unwrap();
        cursor.sort("_id", Direction::Ascending).unwrap();
        assert_eq!(cursor.next_document().unwrap().unwrap()["_id"], 1);
    }

    #[test]
    fn test_parse_error_reports_line() {
        let dir = TempDir::new().unwrap();
        let path = write_collection(&dir, "{\"_id\": 1}\n\n{not json}\n");

        match JsonLinesSource::open(&path) {
            Err(SourceError::Parse { line, .. }) => assert_eq!(line, 3),
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_non_object_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write_collection(&dir, "[1, 2]\n");
        assert!(matches!(
            JsonLinesSource::open(&path),
            Err(SourceError::Parse { line: 1, .. })
        ));
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            JsonLinesSource::open(dir.path().join("absent.jsonl")),
            Err(SourceError::Io { .. })
        ));
    }
}
