//! Checkpoint identity
//!
//! Key format: `<prefix>:<field>:<sign>` where sign is `1` or `-1`.
//! The sign is always the last segment, so two different (field,
//! direction) pairs under one prefix never produce the same key.

use std::fmt;
use std::time::Duration;

use serde_json::Value;

use crate::config::IterationSpec;

/// Deterministic key of a checkpoint
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CheckpointKey(String);

impl CheckpointKey {
    pub fn derive(prefix: &str, spec: &IterationSpec) -> Self {
        Self(format!("{}:{}:{}", prefix, spec.field, spec.direction.sign()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CheckpointKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CheckpointKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Last confirmed position of an iteration
#[derive(Debug, Clone, PartialEq)]
pub struct Checkpoint {
    pub key: CheckpointKey,
    /// Iteration-field value of the last processed document
    pub value: Value,
    /// Lifetime in the store; `None` never expires
    pub ttl: Option<Duration>,
}
