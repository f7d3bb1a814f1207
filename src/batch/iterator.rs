//! Batch iterator
//!
//! Drives one query to completion, one document at a time:
//!
//! 1. Clear the checkpoint if `clear_before` is set
//! 2. Compose the effective filter from the base filter and the stored
//!    resume value
//! 3. Open the cursor: sort by the iteration field, disable the idle
//!    timeout, apply the limit
//! 4. Precompute the total if `calc_count` is set
//! 5. Per document: validate, count, call back, persist the checkpoint,
//!    pace, stop once a known total is reached
//! 6. Clear the checkpoint if `clear_after` is set and the run succeeded
//!
//! The checkpoint is written before the count check, so the position of the
//! last processed document is always stored when a run stops.

use std::thread;

use serde_json::Value;
use uuid::Uuid;

use super::errors::{BatchError, BatchResult, Phase, RunError};
use super::pacing::PacingPolicy;
use crate::checkpoint::{
    Checkpoint, CheckpointCoordinator, CheckpointStore, NoCheckpointStore, PersistOutcome,
};
use crate::config::{BatchConfig, IterationSpec};
use crate::filter::{Filter, RangeComposer};
use crate::observability::{BatchMetrics, Event, ObservationScope};
use crate::source::{Cursor, Document, QuerySource};

/// Why a run ended successfully
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Cursor returned end of stream
    Exhausted,
    /// Cursor ended after exactly `limit` documents
    LimitReached,
    /// Precomputed total was reached
    CountReached,
}

impl StopReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            StopReason::Exhausted => "exhausted",
            StopReason::LimitReached => "limit_reached",
            StopReason::CountReached => "count_reached",
        }
    }
}

/// Lifecycle of a `BatchIterator`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    /// No iteration field set yet
    Unconfigured,
    Configured,
    Running,
    Completed(StopReason),
    Failed,
}

/// State of one `execute` call
struct RunState<K> {
    filter: Filter,
    cursor: K,
    processed: u64,
    total: Option<u64>,
}

/// Checkpointed, paced iteration over a query source
pub struct BatchIterator<Q, C = NoCheckpointStore> {
    source: Q,
    store: Option<C>,
    config: BatchConfig,
    metrics: BatchMetrics,
    phase: RunPhase,
    last_filter: Option<Filter>,
}

impl<Q: QuerySource> BatchIterator<Q, NoCheckpointStore> {
    /// Iterator without configuration or checkpoint store
    pub fn new(source: Q) -> Self {
        Self {
            source,
            store: None,
            config: BatchConfig::new(),
            metrics: BatchMetrics::new(),
            phase: RunPhase::Unconfigured,
            last_filter: None,
        }
    }
}

impl<Q: QuerySource, C: CheckpointStore> BatchIterator<Q, C> {
    /// Replaces the configuration
    pub fn with_config(mut self, config: BatchConfig) -> Self {
        self.phase = if config.iteration().is_some() {
            RunPhase::Configured
        } else {
            RunPhase::Unconfigured
        };
        self.config = config;
        self
    }

    /// Attaches a checkpoint store
    pub fn with_checkpoint_store<S: CheckpointStore>(self, store: S) -> BatchIterator<Q, S> {
        BatchIterator {
            source: self.source,
            store: Some(store),
            config: self.config,
            metrics: self.metrics,
            phase: self.phase,
            last_filter: self.last_filter,
        }
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    pub fn source(&self) -> &Q {
        &self.source
    }

    pub fn checkpoint_store(&self) -> Option<&C> {
        self.store.as_ref()
    }

    pub fn metrics(&self) -> &BatchMetrics {
        &self.metrics
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    /// Effective filter of the most recent run that got that far
    pub fn last_filter(&self) -> Option<&Filter> {
        self.last_filter.as_ref()
    }

    /// Checkpoint currently stored for the configured iteration spec
    pub fn stored_checkpoint(&self) -> BatchResult<Option<Checkpoint>> {
        let spec = self.config.validate_for_run()?;
        self.coordinator(spec).current()
    }

    /// Deletes the checkpoint of the configured iteration spec
    pub fn clear_checkpoint(&self) -> BatchResult<bool> {
        let spec = self.config.validate_for_run()?;
        let removed = self.coordinator(spec).clear()?;
        if removed {
            self.metrics.increment_checkpoints_cleared();
        }
        Ok(removed)
    }

    fn coordinator(&self, spec: &IterationSpec) -> CheckpointCoordinator<&C> {
        CheckpointCoordinator::for_config(self.store.as_ref(), &self.config, spec)
    }

    /// Runs the query to completion.
    ///
    /// `callback` receives each document with its 1-based ordinal and the
    /// precomputed total (`None` when unknown). An error from the callback
    /// aborts the run and comes back unchanged as `RunError::Callback`.
    ///
    /// Returns the number of documents processed.
    pub fn execute<F, E>(&mut self, mut callback: F) -> Result<u64, RunError<E>>
    where
        F: FnMut(&Document, u64, Option<u64>) -> Result<(), E>,
    {
        let run_id = Uuid::new_v4().to_string();
        let scope = ObservationScope::with_fields("BATCH_RUN", &[("run_id", run_id.as_str())]);
        self.metrics.increment_runs_started();
        self.phase = RunPhase::Running;

        let spec = match self.config.validate_for_run() {
            Ok(spec) => spec.clone(),
            Err(err) => {
                let err = err.in_phase(Phase::Start);
                self.phase = RunPhase::Failed;
                self.metrics.increment_runs_failed();
                scope.fail_with_fields(&err.to_string(), &[("processed", "0")]);
                return Err(err.into());
            }
        };

        let mut processed = 0;
        let result = match self.prepare(&spec, &scope) {
            Ok(mut state) => {
                let outcome = self.drive(&spec, &mut state, &mut callback, &scope);
                processed = state.processed;
                self.last_filter = Some(state.filter);
                outcome
            }
            Err(err) => Err(RunError::from(err)),
        };

        let processed_str = processed.to_string();
        match result {
            Ok(reason) => {
                if self.config.clear_after() {
                    self.clear_after_run(&spec, &scope);
                }
                self.phase = RunPhase::Completed(reason);
                self.metrics.increment_runs_completed();
                scope.complete_with_fields(&[
                    ("processed", processed_str.as_str()),
                    ("stop_reason", reason.as_str()),
                ]);
                Ok(processed)
            }
            Err(err) => {
                self.phase = RunPhase::Failed;
                self.metrics.increment_runs_failed();
                let reason = match &err {
                    RunError::Batch(e) => e.to_string(),
                    RunError::Callback(_) => "callback failed".to_string(),
                };
                scope.fail_with_fields(&reason, &[("processed", processed_str.as_str())]);
                Err(err)
            }
        }
    }

    /// Steps 1 to 4: everything before the first document
    fn prepare(
        &self,
        spec: &IterationSpec,
        scope: &ObservationScope<'_>,
    ) -> BatchResult<RunState<Q::Cursor>> {
        let coordinator = self.coordinator(spec);

        if self.config.clear_before() && coordinator.clear()? {
            self.metrics.increment_checkpoints_cleared();
        }

        let resume = coordinator.load_resume_value()?;
        let filter = RangeComposer::compose(
            self.config.filter(),
            &spec.field,
            spec.direction,
            resume.as_ref(),
        );

        let filter_json = filter.to_json().to_string();
        scope.log(
            &Event::RunQueryReady,
            &[
                ("field", spec.field.as_str()),
                ("direction", spec.direction.as_str()),
                ("filter", filter_json.as_str()),
                ("resumed", if resume.is_some() { "true" } else { "false" }),
            ],
        );

        let mut cursor = self
            .source
            .find(&filter, self.config.projection())
            .map_err(|e| e.into_batch_error("find"))?;
        cursor
            .sort(&spec.field, spec.direction)
            .map_err(|e| e.into_batch_error("sort"))?;
        cursor
            .disable_timeout()
            .map_err(|e| e.into_batch_error("disable_timeout"))?;
        if let Some(limit) = self.config.limit() {
            cursor
                .limit(limit)
                .map_err(|e| e.into_batch_error("limit"))?;
        }

        let total = if self.config.calc_count() {
            scope.log(
                &Event::CountPrecomputeEnabled,
                &[
                    ("field", spec.field.as_str()),
                    (
                        "hint",
                        "counting without an index on the filter scans the collection; \
                         disable calc_count for unindexed queries",
                    ),
                ],
            );
            let total = cursor.count().map_err(|e| e.into_batch_error("count"))?;
            scope.log(&Event::CountComputed, &[("total", total.to_string().as_str())]);
            Some(total)
        } else {
            None
        };

        Ok(RunState {
            filter,
            cursor,
            processed: 0,
            total,
        })
    }

    /// Step 5: the document loop
    ///
    /// The pause is taken before the total-reached check and before the
    /// cursor is polled again, so a run whose last ordinal is a multiple of
    /// `batch_size` sleeps once more after its final document. Elapsed time
    /// is therefore never below `floor(n / batch_size) * pause`, including
    /// runs that stop on a known total.
    fn drive<F, E>(
        &self,
        spec: &IterationSpec,
        state: &mut RunState<Q::Cursor>,
        callback: &mut F,
        scope: &ObservationScope<'_>,
    ) -> Result<StopReason, RunError<E>>
    where
        F: FnMut(&Document, u64, Option<u64>) -> Result<(), E>,
    {
        let coordinator = self.coordinator(spec);
        let pacing = PacingPolicy::from_config(&self.config);

        loop {
            let document = match state.cursor.next_document() {
                Ok(Some(document)) => document,
                Ok(None) => break,
                Err(e) => {
                    return Err(e
                        .into_batch_error("next_document")
                        .with_processed(state.processed)
                        .into())
                }
            };

            let position = match document.get(spec.field.as_str()) {
                Some(value) if !is_empty_value(value) => value.clone(),
                _ => {
                    return Err(
                        BatchError::missing_iteration_value(&spec.field, state.processed).into(),
                    )
                }
            };

            state.processed += 1;
            self.metrics.increment_documents();

            callback(&document, state.processed, state.total).map_err(RunError::Callback)?;

            match coordinator.persist(&position) {
                PersistOutcome::Written => self.metrics.increment_checkpoints_written(),
                PersistOutcome::Skipped => {}
                PersistOutcome::Failed(e) => {
                    self.metrics.increment_checkpoint_write_failures();
                    let value = position.to_string();
                    let error = e.to_string();
                    scope.log(
                        &Event::CheckpointPersistFailed,
                        &[
                            ("key", coordinator.key().as_str()),
                            ("value", value.as_str()),
                            ("error", error.as_str()),
                        ],
                    );
                }
            }

            if let Some(pause) = pacing.pause_due(state.processed) {
                self.metrics.increment_pacing_pauses();
                let processed = state.processed.to_string();
                let pause_ms = pause.as_millis().to_string();
                scope.log(
                    &Event::PaceSuspend,
                    &[("processed", processed.as_str()), ("pause_ms", pause_ms.as_str())],
                );
                thread::sleep(pause);
            }

            if state.total == Some(state.processed) {
                return Ok(StopReason::CountReached);
            }
        }

        if self.config.limit() == Some(state.processed) {
            Ok(StopReason::LimitReached)
        } else {
            Ok(StopReason::Exhausted)
        }
    }

    /// Step 6; a failure here does not fail the finished run
    fn clear_after_run(&self, spec: &IterationSpec, scope: &ObservationScope<'_>) {
        let coordinator = self.coordinator(spec);
        match coordinator.clear() {
            Ok(true) => self.metrics.increment_checkpoints_cleared(),
            Ok(false) => {}
            Err(e) => {
                self.metrics.increment_checkpoint_clear_failures();
                let error = e.to_string();
                scope.log(
                    &Event::CheckpointClearFailed,
                    &[("key", coordinator.key().as_str()), ("error", error.as_str())],
                );
            }
        }
    }
}

/// Null, empty strings, empty arrays and empty objects carry no position
fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}
