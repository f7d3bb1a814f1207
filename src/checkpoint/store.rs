//! Checkpoint store capability and in-process implementations

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use serde_json::Value;

use super::errors::{StoreError, StoreResult};

/// Key-value store that persists checkpoints between runs.
///
/// Only `get`, `set` and `delete` are required. The multi-key methods are
/// conveniences built on them; backends with native batch operations may
/// override them.
pub trait CheckpointStore {
    /// Returns the stored value, or `None` if absent or expired
    fn get(&self, key: &str) -> StoreResult<Option<Value>>;

    /// Stores `value` under `key`; `ttl` of `None` never expires
    fn set(&self, key: &str, value: &Value, ttl: Option<Duration>) -> StoreResult<()>;

    /// Removes `key`; returns whether something was removed
    fn delete(&self, key: &str) -> StoreResult<bool>;

    fn has(&self, key: &str) -> StoreResult<bool> {
        Ok(self.get(key)?.is_some())
    }

    fn get_many(&self, keys: &[&str]) -> StoreResult<Vec<Option<Value>>> {
        keys.iter().map(|key| self.get(key)).collect()
    }

    fn set_many(&self, entries: &[(&str, Value)], ttl: Option<Duration>) -> StoreResult<()> {
        for (key, value) in entries {
            self.set(key, value, ttl)?;
        }
        Ok(())
    }

    /// Returns how many keys were removed
    fn delete_many(&self, keys: &[&str]) -> StoreResult<usize> {
        let mut removed = 0;
        for key in keys {
            if self.delete(key)? {
                removed += 1;
            }
        }
        Ok(removed)
    }
}

impl<T: CheckpointStore + ?Sized> CheckpointStore for &T {
    fn get(&self, key: &str) -> StoreResult<Option<Value>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &Value, ttl: Option<Duration>) -> StoreResult<()> {
        (**self).set(key, value, ttl)
    }

    fn delete(&self, key: &str) -> StoreResult<bool> {
        (**self).delete(key)
    }
}

impl<T: CheckpointStore + ?Sized> CheckpointStore for Arc<T> {
    fn get(&self, key: &str) -> StoreResult<Option<Value>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &Value, ttl: Option<Duration>) -> StoreResult<()> {
        (**self).set(key, value, ttl)
    }

    fn delete(&self, key: &str) -> StoreResult<bool> {
        (**self).delete(key)
    }
}

impl<T: CheckpointStore + ?Sized> CheckpointStore for Box<T> {
    fn get(&self, key: &str) -> StoreResult<Option<Value>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &Value, ttl: Option<Duration>) -> StoreResult<()> {
        (**self).set(key, value, ttl)
    }

    fn delete(&self, key: &str) -> StoreResult<bool> {
        (**self).delete(key)
    }
}

/// Stand-in type for "no checkpoint store configured"
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCheckpointStore;

impl CheckpointStore for NoCheckpointStore {
    fn get(&self, _key: &str) -> StoreResult<Option<Value>> {
        Ok(None)
    }

    fn set(&self, _key: &str, _value: &Value, _ttl: Option<Duration>) -> StoreResult<()> {
        Ok(())
    }

    fn delete(&self, _key: &str) -> StoreResult<bool> {
        Ok(false)
    }
}

#[derive(Debug, Clone)]
struct MemoryEntry {
    value: Value,
    expires_at: Option<Instant>,
}

impl MemoryEntry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map(|at| now < at).unwrap_or(true)
    }
}

/// Checkpoint store held in process memory, with per-key expiry
#[derive(Debug, Default)]
pub struct MemoryCheckpointStore {
    entries: Mutex<HashMap<String, MemoryEntry>>,
}

impl MemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding one non-expiring value
    pub fn seeded(key: &str, value: Value) -> Self {
        let store = Self::new();
        if let Ok(mut entries) = store.entries.lock() {
            entries.insert(
                key.to_string(),
                MemoryEntry {
                    value,
                    expires_at: None,
                },
            );
        }
        store
    }

    /// Number of live keys
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.lock()
            .map(|entries| entries.values().filter(|e| e.is_live(now)).count())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, HashMap<String, MemoryEntry>>> {
        self.entries
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".into()))
    }
}

impl CheckpointStore for MemoryCheckpointStore {
    fn get(&self, key: &str) -> StoreResult<Option<Value>> {
        let mut entries = self.lock()?;
        let now = Instant::now();
        match entries.get(key) {
            Some(entry) if entry.is_live(now) => Ok(Some(entry.value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    fn set(&self, key: &str, value: &Value, ttl: Option<Duration>) -> StoreResult<()> {
        if value.is_null() {
            return Err(StoreError::Unsupported("null checkpoint value".into()));
        }
        let expires_at = match ttl {
            Some(ttl) => Some(
                Instant::now()
                    .checked_add(ttl)
                    .ok_or_else(|| StoreError::Unsupported(format!("ttl {:?} too large", ttl)))?,
            ),
            None => None,
        };
        self.lock()?.insert(
            key.to_string(),
            MemoryEntry {
                value: value.clone(),
                expires_at,
            },
        );
        Ok(())
    }

    fn delete(&self, key: &str) -> StoreResult<bool> {
        Ok(self.lock()?.remove(key).is_some())
    }
}
