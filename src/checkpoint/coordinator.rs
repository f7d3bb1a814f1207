//! Checkpoint coordination for one iteration spec
//!
//! Reads happen once at run start, writes after every processed document.
//! The coordinator is inert unless save-state is on and a store is present;
//! clearing only needs a store.

use std::time::Duration;

use serde_json::Value;

use super::errors::StoreError;
use super::key::{Checkpoint, CheckpointKey};
use super::store::CheckpointStore;
use crate::batch::{BatchError, BatchResult};
use crate::config::{BatchConfig, IterationSpec};
use crate::observability::{log_event_with_fields, Event};

/// Result of a checkpoint write
#[derive(Debug)]
pub enum PersistOutcome {
    Written,
    /// Save-state disabled or no store configured
    Skipped,
    /// Store rejected the write; the run may continue
    Failed(StoreError),
}

impl PersistOutcome {
    pub fn is_written(&self) -> bool {
        matches!(self, PersistOutcome::Written)
    }
}

/// Reads, writes and clears the checkpoint of one iteration spec
pub struct CheckpointCoordinator<C> {
    store: Option<C>,
    key: CheckpointKey,
    save_state: bool,
    ttl: Option<Duration>,
}

impl<C: CheckpointStore> CheckpointCoordinator<C> {
    pub fn new(
        store: Option<C>,
        key: CheckpointKey,
        save_state: bool,
        ttl: Option<Duration>,
    ) -> Self {
        Self {
            store,
            key,
            save_state,
            ttl,
        }
    }

    /// Coordinator for the checkpoint policy of `config`
    pub fn for_config(store: Option<C>, config: &BatchConfig, spec: &IterationSpec) -> Self {
        Self::new(
            store,
            CheckpointKey::derive(config.checkpoint_prefix(), spec),
            config.save_state(),
            config.checkpoint_ttl(),
        )
    }

    pub fn key(&self) -> &CheckpointKey {
        &self.key
    }

    /// Whether reads and writes reach the store
    pub fn is_active(&self) -> bool {
        self.save_state && self.store.is_some()
    }

    /// Stored resume value, if any.
    ///
    /// Returns `None` when inactive or when nothing is stored. A failing
    /// store is a run-time error; guessing a position could rescan or skip.
    pub fn load_resume_value(&self) -> BatchResult<Option<Value>> {
        let store = match (&self.store, self.save_state) {
            (Some(store), true) => store,
            _ => return Ok(None),
        };

        let value = store.get(self.key.as_str()).map_err(|e| {
            BatchError::runtime("load_checkpoint", e.to_string()).with_source(e)
        })?;

        // A stored null carries no position
        let value = value.filter(|v| !v.is_null());
        if let Some(v) = &value {
            let rendered = v.to_string();
            log_event_with_fields(
                Event::CheckpointLoaded,
                &[("key", self.key.as_str()), ("value", rendered.as_str())],
            );
        }
        Ok(value)
    }

    /// Writes `value` as the new position
    pub fn persist(&self, value: &Value) -> PersistOutcome {
        let store = match (&self.store, self.save_state) {
            (Some(store), true) => store,
            _ => return PersistOutcome::Skipped,
        };

        match store.set(self.key.as_str(), value, self.ttl) {
            Ok(()) => PersistOutcome::Written,
            Err(e) => PersistOutcome::Failed(e),
        }
    }

    /// Deletes the checkpoint key; returns whether a value was removed
    pub fn clear(&self) -> BatchResult<bool> {
        let store = match &self.store {
            Some(store) => store,
            None => return Ok(false),
        };

        let removed = store.delete(self.key.as_str()).map_err(|e| {
            BatchError::runtime("clear_checkpoint", e.to_string()).with_source(e)
        })?;
        log_event_with_fields(
            Event::CheckpointCleared,
            &[
                ("key", self.key.as_str()),
                ("removed", if removed { "true" } else { "false" }),
            ],
        );
        Ok(removed)
    }

    /// Current checkpoint as stored, ignoring the save-state flag
    pub fn current(&self) -> BatchResult<Option<Checkpoint>> {
        let store = match &self.store {
            Some(store) => store,
            None => return Ok(None),
        };

        let value = store.get(self.key.as_str()).map_err(|e| {
            BatchError::runtime("read_checkpoint", e.to_string()).with_source(e)
        })?;
        Ok(value.map(|value| Checkpoint {
            key: self.key.clone(),
            value,
            ttl: self.ttl,
        }))
    }
}
