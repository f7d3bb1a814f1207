//! Job configuration file
//!
//! ```json
//! {
//!   "source": "users.jsonl",
//!   "checkpoint_file": "state/checkpoints.json",
//!   "iteration_field": "_id",
//!   "direction": 1,
//!   "filter": {"active": true},
//!   "batch_size": 500,
//!   "pause_seconds": 0.5,
//!   "save_state": true
//! }
//! ```
//!
//! Relative paths are resolved against the directory of the config file.
//! Values are checked by the same setters a library caller uses, so a bad
//! value in the file fails with the same error.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::errors::{CliError, CliResult};
use crate::checkpoint::{CheckpointStore, FileCheckpointStore, NoCheckpointStore};
use crate::config::{BatchConfig, Projection, DEFAULT_BATCH_SIZE, DEFAULT_CHECKPOINT_PREFIX};
use crate::filter::Filter;
use crate::observability::Severity;

/// Configuration file structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Newline-delimited JSON collection (required)
    pub source: PathBuf,

    /// Checkpoint store file; without it nothing is persisted
    #[serde(default)]
    pub checkpoint_file: Option<PathBuf>,

    #[serde(default = "default_checkpoint_prefix")]
    pub checkpoint_prefix: String,

    /// Field that orders the scan (required)
    pub iteration_field: String,

    /// `1`, `-1`, `"asc"` or `"desc"`
    #[serde(default = "default_direction")]
    pub direction: Value,

    #[serde(default)]
    pub filter: Value,

    #[serde(default)]
    pub projection: Value,

    #[serde(default = "default_batch_size")]
    pub batch_size: u64,

    #[serde(default)]
    pub pause_seconds: f64,

    #[serde(default)]
    pub save_state: bool,

    /// Checkpoint lifetime; absent or 0 never expires
    #[serde(default)]
    pub save_state_seconds: Option<u64>,

    #[serde(default)]
    pub limit: Option<u64>,

    #[serde(default)]
    pub clear_before: bool,

    #[serde(default)]
    pub clear_after: bool,

    #[serde(default = "default_calc_count")]
    pub calc_count: bool,

    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_checkpoint_prefix() -> String {
    DEFAULT_CHECKPOINT_PREFIX.to_string()
}
fn default_direction() -> Value {
    Value::from(1)
}
fn default_batch_size() -> u64 {
    DEFAULT_BATCH_SIZE
}
fn default_calc_count() -> bool {
    true
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| CliError::config_error(format!("Failed to read config: {}", e)))?;

        let mut config: Config = serde_json::from_str(&content)
            .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))?;

        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        config.validate()?;

        Ok(config)
    }

    fn resolve_paths(&mut self, base: &Path) {
        if self.source.is_relative() {
            self.source = base.join(&self.source);
        }
        if let Some(file) = self.checkpoint_file.as_mut() {
            if file.is_relative() {
                *file = base.join(&*file);
            }
        }
    }

    /// Checks what the batch setters do not cover
    fn validate(&self) -> CliResult<()> {
        self.severity()?;

        if self.save_state && self.checkpoint_file.is_none() {
            return Err(CliError::config_error(
                "save_state requires checkpoint_file",
            ));
        }

        // Rejects bad values with the library's own errors
        self.to_batch_config()?;

        Ok(())
    }

    /// Minimum log severity
    pub fn severity(&self) -> CliResult<Severity> {
        self.log_level
            .parse()
            .map_err(|e: String| CliError::config_error(format!("Invalid log_level: {}", e)))
    }

    /// Builds the run configuration through the validating setters
    pub fn to_batch_config(&self) -> CliResult<BatchConfig> {
        let filter = Filter::from_json(&self.filter)?;
        let projection = Projection::from_json(&self.projection)?;

        let mut config = BatchConfig::new()
            .with_iteration_field(self.iteration_field.as_str(), &self.direction)?
            .with_filter(filter)
            .with_projection(projection)
            .with_batch_size(self.batch_size)?
            .with_pause_seconds(self.pause_seconds)?
            .with_save_state(self.save_state)
            .with_checkpoint_prefix(self.checkpoint_prefix.as_str())?
            .with_clear_before(self.clear_before)
            .with_clear_after(self.clear_after)
            .with_calc_count(self.calc_count);

        if let Some(seconds) = self.save_state_seconds {
            config = config.with_checkpoint_ttl(Duration::from_secs(seconds));
        }
        if let Some(limit) = self.limit {
            config = config.with_limit(limit)?;
        }
        Ok(config)
    }

    /// Checkpoint store named by `checkpoint_file`
    pub fn checkpoint_store(&self) -> Box<dyn CheckpointStore> {
        match &self.checkpoint_file {
            Some(path) => Box::new(FileCheckpointStore::open(path)),
            None => Box::new(NoCheckpointStore),
        }
    }

    /// Like `checkpoint_store`, but a checkpoint file must be configured
    pub fn require_checkpoint_store(&self) -> CliResult<FileCheckpointStore> {
        self.checkpoint_file
            .as_ref()
            .map(FileCheckpointStore::open)
            .ok_or_else(|| CliError::config_error("checkpoint_file is not configured"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Direction;
    use serde_json::json;
    use tempfile::TempDir;

    // =========================================================================
    // Helper Functions
    // =========================================================================

    fn write_config(dir: &TempDir, config: Value) -> PathBuf {
        let path = dir.path().join("docbatch.json");
        fs::write(&path, config.to_string()).unwrap();
        path
    }

    #[test]
    fn test_minimal_config_defaults() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            json!({"source": "users.jsonl", "iteration_field": "_id"}),
        );

        let config = Config::load(&path).unwrap();
        assert_eq!(config.source, dir.path().join("users.jsonl"));
        assert_eq!(config.batch_size, DEFAULT_BATCH_SIZE);
        assert_eq!(config.checkpoint_prefix, "docbatch");
        assert!(config.calc_count);
        assert!(!config.save_state);

        let batch = config.to_batch_config().unwrap();
        let spec = batch.iteration().unwrap();
        assert_eq!(spec.field, "_id");
        assert_eq!(spec.direction, Direction::Ascending);
    }

    #[test]
    fn test_full_config() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            json!({
                "source": "/data/users.jsonl",
                "checkpoint_file": "state/cp.json",
                "checkpoint_prefix": "nightly",
                "iteration_field": "created_at",
                "direction": "desc",
                "filter": {"active": true},
                "projection": ["email"],
                "batch_size": 50,
                "pause_seconds": 0.25,
                "save_state": true,
                "save_state_seconds": 3600,
                "limit": 1000,
                "clear_before": true,
                "calc_count": false,
                "log_level": "warn"
            }),
        );

        let config = Config::load(&path).unwrap();
        assert_eq!(config.source, PathBuf::from("/data/users.jsonl"));
        assert_eq!(
            config.checkpoint_file,
            Some(dir.path().join("state/cp.json"))
        );
        assert_eq!(config.severity().unwrap(), Severity::Warn);

        let batch = config.to_batch_config().unwrap();
        assert_eq!(batch.iteration().unwrap().direction, Direction::Descending);
        assert_eq!(batch.batch_size(), 50);
        assert_eq!(batch.pause(), Duration::from_millis(250));
        assert_eq!(batch.checkpoint_ttl(), Some(Duration::from_secs(3600)));
        assert_eq!(batch.limit(), Some(1000));
        assert_eq!(batch.checkpoint_prefix(), "nightly");
        assert!(batch.clear_before());
        assert!(!batch.calc_count());
        assert_eq!(batch.projection().field_names(), &["email".to_string()]);
    }

    #[test]
    fn test_bad_values_are_config_errors() {
        let dir = TempDir::new().unwrap();
        for bad in [
            json!({"source": "a", "iteration_field": "_id", "batch_size": 1}),
            json!({"source": "a", "iteration_field": "_id", "direction": 0}),
            json!({"source": "a", "iteration_field": "_id", "direction": "sideways"}),
            json!({"source": "a", "iteration_field": "_id", "limit": 0}),
            json!({"source": "a", "iteration_field": ""}),
            json!({"source": "a", "iteration_field": "_id", "filter": [1]}),
            json!({"source": "a", "iteration_field": "_id", "log_level": "loud"}),
            json!({"source": "a", "iteration_field": "_id", "save_state": true}),
            json!({"source": "a", "iteration_field": "_id", "unknown_key": 1}),
        ] {
            let path = write_config(&dir, bad.clone());
            let err = Config::load(&path).unwrap_err();
            assert_eq!(
                err.code_str(),
                "DOCBATCH_CLI_CONFIG_ERROR",
                "config {} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = Config::load(&dir.path().join("absent.json")).unwrap_err();
        assert_eq!(err.code_str(), "DOCBATCH_CLI_CONFIG_ERROR");
    }
}
