//! File-backed checkpoint store
//!
//! All keys live in one JSON file:
//!
//! ```json
//! {
//!   "format_version": 1,
//!   "entries": {
//!     "docbatch:_id:1": {
//!       "value": 4711,
//!       "written_at": "2026-02-04T16:30:00Z",
//!       "expires_at": null
//!     }
//!   }
//! }
//! ```
//!
//! Every write replaces the whole file: temp file, fsync, rename over the
//! target, fsync of the parent directory. A crash leaves either the old or
//! the new file, never a torn one.

use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::errors::{StoreError, StoreResult};
use super::store::CheckpointStore;

const FORMAT_VERSION: u8 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct FileEntry {
    value: Value,
    written_at: DateTime<Utc>,
    expires_at: Option<DateTime<Utc>>,
}

impl FileEntry {
    fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map(|at| now < at).unwrap_or(true)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct StateFile {
    format_version: u8,
    #[serde(default)]
    entries: BTreeMap<String, FileEntry>,
}

impl Default for StateFile {
    fn default() -> Self {
        Self {
            format_version: FORMAT_VERSION,
            entries: BTreeMap::new(),
        }
    }
}

/// Checkpoint store persisted in a single JSON file
#[derive(Debug)]
pub struct FileCheckpointStore {
    path: PathBuf,
    // Serializes read-modify-write cycles within the process
    guard: Mutex<()>,
}

impl FileCheckpointStore {
    /// Opens a store at `path`; the file is created on first write
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            guard: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, ()>> {
        self.guard
            .lock()
            .map_err(|_| StoreError::Unavailable("file store lock poisoned".into()))
    }

    fn read_state(&self) -> StoreResult<StateFile> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(StateFile::default()),
            Err(e) => return Err(StoreError::io(&self.path, e)),
        };

        let state: StateFile = serde_json::from_str(&contents).map_err(|e| {
            StoreError::Corrupt(format!("{}: {}", self.path.display(), e))
        })?;

        if state.format_version != FORMAT_VERSION {
            return Err(StoreError::Corrupt(format!(
                "{}: unsupported format_version {}",
                self.path.display(),
                state.format_version
            )));
        }
        Ok(state)
    }

    fn write_state(&self, state: &StateFile) -> StoreResult<()> {
        let json = serde_json::to_string_pretty(state)
            .map_err(|e| StoreError::Unsupported(e.to_string()))?;

        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        if !parent.exists() {
            fs::create_dir_all(&parent).map_err(|e| StoreError::io(&parent, e))?;
        }

        let tmp_path = self.temp_path();
        {
            let mut file = File::create(&tmp_path).map_err(|e| StoreError::io(&tmp_path, e))?;
            file.write_all(json.as_bytes())
                .map_err(|e| StoreError::io(&tmp_path, e))?;
            file.sync_all().map_err(|e| StoreError::io(&tmp_path, e))?;
        }

        fs::rename(&tmp_path, &self.path).map_err(|e| StoreError::io(&self.path, e))?;

        let dir = OpenOptions::new()
            .read(true)
            .open(&parent)
            .map_err(|e| StoreError::io(&parent, e))?;
        dir.sync_all().map_err(|e| StoreError::io(&parent, e))?;

        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "checkpoints.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn expiry(now: DateTime<Utc>, ttl: Option<Duration>) -> StoreResult<Option<DateTime<Utc>>> {
        match ttl {
            None => Ok(None),
            Some(ttl) => {
                let ttl = chrono::Duration::from_std(ttl)
                    .map_err(|_| StoreError::Unsupported(format!("ttl {:?} too large", ttl)))?;
                now.checked_add_signed(ttl)
                    .map(Some)
                    .ok_or_else(|| StoreError::Unsupported("ttl overflows timestamp".into()))
            }
        }
    }
}

impl CheckpointStore for FileCheckpointStore {
    fn get(&self, key: &str) -> StoreResult<Option<Value>> {
        let _guard = self.lock()?;
        let state = self.read_state()?;
        let now = Utc::now();
        Ok(state
            .entries
            .get(key)
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.value.clone()))
    }

    fn set(&self, key: &str, value: &Value, ttl: Option<Duration>) -> StoreResult<()> {
        if value.is_null() {
            return Err(StoreError::Unsupported("null checkpoint value".into()));
        }
        let _guard = self.lock()?;
        let mut state = self.read_state()?;
        let now = Utc::now();

        state.entries.retain(|_, entry| entry.is_live(now));
        state.entries.insert(
            key.to_string(),
            FileEntry {
                value: value.clone(),
                written_at: now,
                expires_at: Self::expiry(now, ttl)?,
            },
        );
        self.write_state(&state)
    }

    fn delete(&self, key: &str) -> StoreResult<bool> {
        let _guard = self.lock()?;
        let mut state = self.read_state()?;
        let now = Utc::now();

        let removed = match state.entries.remove(key) {
            Some(entry) => {
                self.write_state(&state)?;
                entry.is_live(now)
            }
            None => false,
        };
        Ok(removed)
    }

    fn set_many(&self, entries: &[(&str, Value)], ttl: Option<Duration>) -> StoreResult<()> {
        if entries.iter().any(|(_, value)| value.is_null()) {
            return Err(StoreError::Unsupported("null checkpoint value".into()));
        }
        let _guard = self.lock()?;
        let mut state = self.read_state()?;
        let now = Utc::now();
        let expires_at = Self::expiry(now, ttl)?;

        for (key, value) in entries {
            state.entries.insert(
                key.to_string(),
                FileEntry {
                    value: value.clone(),
                    written_at: now,
                    expires_at,
                },
            );
        }
        self.write_state(&state)
    }
}
