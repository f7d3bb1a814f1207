//! Batch run configuration
//!
//! `BatchConfig` describes one iteration job: which field orders the scan,
//! which documents to visit, how fast to go and how progress is saved.
//! It is built once through consuming `with_*` setters; every setter that
//! restricts its input validates immediately and fails with a typed error,
//! so no invalid intermediate value ever exists.

use std::time::Duration;

use serde_json::Value;

use super::direction::{Direction, IntoDirection};
use crate::batch::{BatchError, BatchResult};
use crate::filter::Filter;

/// Default number of documents between two pacing pauses
pub const DEFAULT_BATCH_SIZE: u64 = 100;

/// Default namespace of checkpoint keys
pub const DEFAULT_CHECKPOINT_PREFIX: &str = "docbatch";

/// Field that orders the scan and positions checkpoints
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IterationSpec {
    pub field: String,
    pub direction: Direction,
}

impl IterationSpec {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Ascending,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Descending,
        }
    }
}

/// Fields to return for each document. Empty means whole documents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Projection {
    fields: Vec<String>,
}

impl Projection {
    /// Projection that returns whole documents
    pub fn all() -> Self {
        Self::default()
    }

    pub fn fields<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut out: Vec<String> = Vec::new();
        for field in fields {
            let field = field.into();
            if !out.contains(&field) {
                out.push(field);
            }
        }
        Self { fields: out }
    }

    /// Parses either a list of field names or an inclusion mapping
    /// (`{"name": 1, "email": true}`).
    pub fn from_json(value: &Value) -> BatchResult<Self> {
        match value {
            Value::Null => Ok(Self::all()),
            Value::Array(items) => {
                let mut names = Vec::with_capacity(items.len());
                for item in items {
                    match item.as_str() {
                        Some(name) if !name.is_empty() => names.push(name.to_string()),
                        _ => return Err(BatchError::invalid_argument("projection", item)),
                    }
                }
                Ok(Self::fields(names))
            }
            Value::Object(map) => {
                let mut names = Vec::with_capacity(map.len());
                for (name, flag) in map {
                    let included = match flag {
                        Value::Bool(b) => *b,
                        Value::Number(n) => n.as_i64().map(|i| i != 0).unwrap_or(false),
                        other => return Err(BatchError::invalid_argument("projection", other)),
                    };
                    if included {
                        names.push(name.clone());
                    }
                }
                Ok(Self::fields(names))
            }
            other => Err(BatchError::invalid_argument("projection", other)),
        }
    }

    pub fn is_all(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn field_names(&self) -> &[String] {
        &self.fields
    }

    /// Applies the projection to a document. `_id` is always kept.
    pub fn apply(&self, document: &Value) -> Value {
        if self.is_all() {
            return document.clone();
        }
        let Some(map) = document.as_object() else {
            return document.clone();
        };
        let projected = map
            .iter()
            .filter(|(k, _)| k.as_str() == "_id" || self.fields.iter().any(|f| f == *k))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Value::Object(projected)
    }
}

/// Validated description of a batch run
#[derive(Debug, Clone)]
pub struct BatchConfig {
    iteration: Option<IterationSpec>,
    filter: Filter,
    projection: Projection,
    batch_size: u64,
    pause: Duration,
    save_state: bool,
    checkpoint_ttl: Option<Duration>,
    checkpoint_prefix: String,
    limit: Option<u64>,
    clear_before: bool,
    clear_after: bool,
    calc_count: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            iteration: None,
            filter: Filter::all(),
            projection: Projection::all(),
            batch_size: DEFAULT_BATCH_SIZE,
            pause: Duration::ZERO,
            save_state: false,
            checkpoint_ttl: None,
            checkpoint_prefix: DEFAULT_CHECKPOINT_PREFIX.to_string(),
            limit: None,
            clear_before: false,
            clear_after: false,
            calc_count: true,
        }
    }
}

impl BatchConfig {
    /// Creates a configuration with defaults and no iteration field
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the iteration field and its direction.
    ///
    /// The direction may be a [`Direction`], an integer sign or a token such
    /// as `"asc"` / `"desc"`.
    pub fn with_iteration_field(
        mut self,
        field: impl Into<String>,
        direction: impl IntoDirection,
    ) -> BatchResult<Self> {
        let field = field.into();
        if field.trim().is_empty() {
            return Err(BatchError::unexpected_value("iteration_field", "\"\""));
        }
        let direction = direction.into_direction()?;
        self.iteration = Some(IterationSpec { field, direction });
        Ok(self)
    }

    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_projection(mut self, projection: Projection) -> Self {
        self.projection = projection;
        self
    }

    /// Sets the number of documents between pacing pauses. Must be at least 2.
    pub fn with_batch_size(mut self, batch_size: u64) -> BatchResult<Self> {
        if batch_size <= 1 {
            return Err(BatchError::unexpected_value("batch_size", batch_size));
        }
        self.batch_size = batch_size;
        Ok(self)
    }

    /// Sets the pause taken after every full batch. Zero disables pacing.
    pub fn with_pause(mut self, pause: Duration) -> Self {
        self.pause = pause;
        self
    }

    /// Sets the pause in fractional seconds
    pub fn with_pause_seconds(self, seconds: f64) -> BatchResult<Self> {
        if !seconds.is_finite() || seconds < 0.0 {
            return Err(BatchError::unexpected_value("pause", seconds));
        }
        Ok(self.with_pause(Duration::from_secs_f64(seconds)))
    }

    /// Enables or disables checkpointing
    pub fn with_save_state(mut self, save_state: bool) -> Self {
        self.save_state = save_state;
        self
    }

    /// Sets how long a checkpoint lives in the store. Zero means no expiry.
    pub fn with_checkpoint_ttl(mut self, ttl: Duration) -> Self {
        self.checkpoint_ttl = if ttl.is_zero() { None } else { Some(ttl) };
        self
    }

    /// Sets the namespace prefix of the checkpoint key
    pub fn with_checkpoint_prefix(mut self, prefix: impl Into<String>) -> BatchResult<Self> {
        let prefix = prefix.into();
        if prefix.trim().is_empty() {
            return Err(BatchError::unexpected_value("checkpoint_prefix", "\"\""));
        }
        self.checkpoint_prefix = prefix;
        Ok(self)
    }

    /// Caps the number of documents the run may visit. Must be positive.
    pub fn with_limit(mut self, limit: u64) -> BatchResult<Self> {
        if limit == 0 {
            return Err(BatchError::unexpected_value("limit", limit));
        }
        self.limit = Some(limit);
        Ok(self)
    }

    /// Deletes the checkpoint before the run starts
    pub fn with_clear_before(mut self, clear: bool) -> Self {
        self.clear_before = clear;
        self
    }

    /// Deletes the checkpoint after the run completes successfully
    pub fn with_clear_after(mut self, clear: bool) -> Self {
        self.clear_after = clear;
        self
    }

    /// Enables counting matching documents before the scan (on by default).
    ///
    /// Counting runs the filter a second time. On a large collection with
    /// no index supporting the filter this is expensive and loads the
    /// store; disable it for unindexed queries.
    pub fn with_calc_count(mut self, calc_count: bool) -> Self {
        self.calc_count = calc_count;
        self
    }

    /// Checks what a run needs beyond what the setters already guarantee
    pub fn validate_for_run(&self) -> BatchResult<&IterationSpec> {
        let spec = self
            .iteration
            .as_ref()
            .ok_or_else(|| BatchError::missing_value("iteration_field"))?;
        if spec.field.trim().is_empty() {
            return Err(BatchError::missing_value("iteration_field"));
        }
        if self.batch_size <= 1 {
            return Err(BatchError::unexpected_value("batch_size", self.batch_size)
                .in_phase(crate::batch::Phase::Start));
        }
        if self.limit == Some(0) {
            return Err(
                BatchError::unexpected_value("limit", 0).in_phase(crate::batch::Phase::Start)
            );
        }
        Ok(spec)
    }

    pub fn iteration(&self) -> Option<&IterationSpec> {
        self.iteration.as_ref()
    }

    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    pub fn batch_size(&self) -> u64 {
        self.batch_size
    }

    pub fn pause(&self) -> Duration {
        self.pause
    }

    pub fn save_state(&self) -> bool {
        self.save_state
    }

    pub fn checkpoint_ttl(&self) -> Option<Duration> {
        self.checkpoint_ttl
    }

    pub fn checkpoint_prefix(&self) -> &str {
        &self.checkpoint_prefix
    }

    pub fn limit(&self) -> Option<u64> {
        self.limit
    }

    pub fn clear_before(&self) -> bool {
        self.clear_before
    }

    pub fn clear_after(&self) -> bool {
        self.clear_after
    }

    pub fn calc_count(&self) -> bool {
        self.calc_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let config = BatchConfig::new();
        assert!(config.iteration().is_none());
        assert_eq!(config.batch_size(), DEFAULT_BATCH_SIZE);
        assert_eq!(config.pause(), Duration::ZERO);
        assert!(!config.save_state());
        assert!(config.checkpoint_ttl().is_none());
        assert_eq!(config.checkpoint_prefix(), "docbatch");
        assert!(config.limit().is_none());
        assert!(!config.clear_before());
        assert!(!config.clear_after());
        assert!(config.calc_count());
        assert!(config.filter().is_empty());
        assert!(config.projection().is_all());
    }

    #[test]
    fn test_iteration_field_accepts_sign_and_token() {
        let config = BatchConfig::new().with_iteration_field("_id", -1).unwrap();
        assert_eq!(config.iteration(), Some(&IterationSpec::desc("_id")));

        let config = BatchConfig::new().with_iteration_field("ts", "asc").unwrap();
        assert_eq!(config.iteration(), Some(&IterationSpec::asc("ts")));
    }

    #[test]
    fn test_iteration_field_rejects_bad_direction() {
        let err = BatchConfig::new()
            .with_iteration_field("_id", "up")
            .unwrap_err();
        assert!(err.is_invalid_argument());
        assert_eq!(err.name(), Some("direction"));
        assert_eq!(err.value(), Some("up"));
    }

    #[test]
    fn test_iteration_field_rejects_empty_name() {
        let err = BatchConfig::new()
            .with_iteration_field("  ", Direction::Ascending)
            .unwrap_err();
        assert!(err.is_unexpected_value());
        assert_eq!(err.name(), Some("iteration_field"));
    }

    #[test]
    fn test_batch_size_must_exceed_one() {
        for bad in [0, 1] {
            let err = BatchConfig::new().with_batch_size(bad).unwrap_err();
            assert!(err.is_unexpected_value());
            assert_eq!(err.name(), Some("batch_size"));
        }
        assert_eq!(BatchConfig::new().with_batch_size(2).unwrap().batch_size(), 2);
    }

    #[test]
    fn test_limit_must_be_positive() {
        let err = BatchConfig::new().with_limit(0).unwrap_err();
        assert!(err.is_unexpected_value());
        assert_eq!(BatchConfig::new().with_limit(5).unwrap().limit(), Some(5));
    }

    #[test]
    fn test_pause_seconds() {
        let config = BatchConfig::new().with_pause_seconds(0.05).unwrap();
        assert_eq!(config.pause(), Duration::from_millis(50));

        assert!(BatchConfig::new().with_pause_seconds(-1.0).is_err());
        assert!(BatchConfig::new().with_pause_seconds(f64::NAN).is_err());
    }

    #[test]
    fn test_zero_ttl_means_no_expiry() {
        let config = BatchConfig::new().with_checkpoint_ttl(Duration::ZERO);
        assert!(config.checkpoint_ttl().is_none());

        let config = BatchConfig::new().with_checkpoint_ttl(Duration::from_secs(10_800));
        assert_eq!(config.checkpoint_ttl(), Some(Duration::from_secs(10_800)));
    }

    #[test]
    fn test_validate_for_run_requires_iteration_field() {
        let err = BatchConfig::new().validate_for_run().unwrap_err();
        assert!(err.is_unexpected_value());
        assert_eq!(err.phase(), crate::batch::Phase::Start);
        assert_eq!(err.name(), Some("iteration_field"));

        let config = BatchConfig::new().with_iteration_field("_id", 1).unwrap();
        assert_eq!(config.validate_for_run().unwrap().field, "_id");
    }

    #[test]
    fn test_projection_from_json() {
        let p = Projection::from_json(&json!(["name", "email", "name"])).unwrap();
        assert_eq!(p.field_names(), &["name".to_string(), "email".to_string()]);

        let p = Projection::from_json(&json!({"name": 1, "email": false})).unwrap();
        assert_eq!(p.field_names(), &["name".to_string()]);

        assert!(Projection::from_json(&json!(null)).unwrap().is_all());
        assert!(Projection::from_json(&json!("name")).is_err());
        assert!(Projection::from_json(&json!([1])).is_err());
    }

    #[test]
    fn test_projection_keeps_id() {
        let doc = json!({"_id": 3, "name": "Ann", "email": "a@x.org"});
        let projected = Projection::fields(["name"]).apply(&doc);
        assert_eq!(projected, json!({"_id": 3, "name": "Ann"}));

        assert_eq!(Projection::all().apply(&doc), doc);
    }
}
