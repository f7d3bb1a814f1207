//! Observability for docbatch
//!
//! - Structured logging (JSON lines on stderr)
//! - Typed lifecycle events
//! - Per-iterator counters
//!
//! # Principles
//!
//! 1. Observability is read-only: a logging failure never changes a run
//! 2. No background threads
//! 3. Deterministic output
//!
//! # Usage
//!
//! ```ignore
//! use docbatch::observability::{log_event_with_fields, Event, ObservationScope};
//!
//! log_event_with_fields(Event::CheckpointCleared, &[("key", "docbatch:_id:1")]);
//!
//! let scope = ObservationScope::with_fields("BATCH_RUN", &[("run_id", run_id.as_str())]);
//! // ... do work ...
//! scope.complete_with_fields(&[("processed", "42")]);
//! ```

mod events;
mod logger;
mod metrics;
mod scope;

pub use events::Event;
pub use logger::{Logger, Severity, DEFAULT_MIN_SEVERITY};
pub use metrics::{BatchMetrics, MetricsSnapshot};
pub use scope::ObservationScope;

/// Log a lifecycle event at its own severity
pub fn log_event(event: Event) {
    Logger::log(event.severity(), event.as_str(), &[]);
}

/// Log a lifecycle event with fields
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    Logger::log(event.severity(), event.as_str(), fields);
}
