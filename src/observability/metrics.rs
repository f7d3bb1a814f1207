//! Batch run counters
//!
//! - Counters only
//! - Monotonic increase
//! - Reset only when the owning iterator is created

use std::sync::atomic::{AtomicU64, Ordering};

/// Operational counters of one `BatchIterator`
#[derive(Debug, Default)]
pub struct BatchMetrics {
    runs_started: AtomicU64,
    runs_completed: AtomicU64,
    runs_failed: AtomicU64,
    documents_processed: AtomicU64,
    checkpoints_written: AtomicU64,
    checkpoint_write_failures: AtomicU64,
    checkpoints_cleared: AtomicU64,
    checkpoint_clear_failures: AtomicU64,
    pacing_pauses: AtomicU64,
}

impl BatchMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_runs_started(&self) {
        self.runs_started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_runs_completed(&self) {
        self.runs_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_runs_failed(&self) {
        self.runs_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_documents(&self) {
        self.documents_processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_checkpoints_written(&self) {
        self.checkpoints_written.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_checkpoint_write_failures(&self) {
        self.checkpoint_write_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_checkpoints_cleared(&self) {
        self.checkpoints_cleared.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_checkpoint_clear_failures(&self) {
        self.checkpoint_clear_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_pacing_pauses(&self) {
        self.pacing_pauses.fetch_add(1, Ordering::Relaxed);
    }

    /// Current values as JSON
    pub fn to_json(&self) -> String {
        let s = self.snapshot();
        format!(
            r#"{{"runs_started":{},"runs_completed":{},"runs_failed":{},"documents_processed":{},"checkpoints_written":{},"checkpoint_write_failures":{},"checkpoints_cleared":{},"checkpoint_clear_failures":{},"pacing_pauses":{}}}"#,
            s.runs_started,
            s.runs_completed,
            s.runs_failed,
            s.documents_processed,
            s.checkpoints_written,
            s.checkpoint_write_failures,
            s.checkpoints_cleared,
            s.checkpoint_clear_failures,
            s.pacing_pauses,
        )
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            runs_started: self.runs_started.load(Ordering::Relaxed),
            runs_completed: self.runs_completed.load(Ordering::Relaxed),
            runs_failed: self.runs_failed.load(Ordering::Relaxed),
            documents_processed: self.documents_processed.load(Ordering::Relaxed),
            checkpoints_written: self.checkpoints_written.load(Ordering::Relaxed),
            checkpoint_write_failures: self.checkpoint_write_failures.load(Ordering::Relaxed),
            checkpoints_cleared: self.checkpoints_cleared.load(Ordering::Relaxed),
            checkpoint_clear_failures: self.checkpoint_clear_failures.load(Ordering::Relaxed),
            pacing_pauses: self.pacing_pauses.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time copy of the counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub runs_started: u64,
    pub runs_completed: u64,
    pub runs_failed: u64,
    pub documents_processed: u64,
    pub checkpoints_written: u64,
    pub checkpoint_write_failures: u64,
    pub checkpoints_cleared: u64,
    pub checkpoint_clear_failures: u64,
    pub pacing_pauses: u64,
}
