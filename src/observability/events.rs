//! Observable events of a batch run
//!
//! Events are explicit and typed.

use std::fmt;

use super::logger::Severity;

/// Observable events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Configuration
    /// Configuration file loaded by the command line tool
    ConfigLoaded,

    // Run lifecycle
    /// Effective filter computed, cursor about to open
    RunQueryReady,
    /// Count precomputation requested (expensive without an index)
    CountPrecomputeEnabled,
    /// Total count known
    CountComputed,
    /// Pacing pause taken
    PaceSuspend,

    // Checkpoints
    /// Resume value read from the store
    CheckpointLoaded,
    /// Checkpoint key deleted
    CheckpointCleared,
    /// Checkpoint write failed, run continues
    CheckpointPersistFailed,
    /// Checkpoint delete after the run failed
    CheckpointClearFailed,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::RunQueryReady => "RUN_QUERY_READY",
            Event::CountPrecomputeEnabled => "COUNT_PRECOMPUTE_ENABLED",
            Event::CountComputed => "COUNT_COMPUTED",
            Event::PaceSuspend => "PACE_SUSPEND",
            Event::CheckpointLoaded => "CHECKPOINT_LOADED",
            Event::CheckpointCleared => "CHECKPOINT_CLEARED",
            Event::CheckpointPersistFailed => "CHECKPOINT_PERSIST_FAILED",
            Event::CheckpointClearFailed => "CHECKPOINT_CLEAR_FAILED",
        }
    }

    /// Severity the event is logged at
    pub fn severity(&self) -> Severity {
        match self {
            Event::PaceSuspend => Severity::Trace,
            Event::CountPrecomputeEnabled
            | Event::CheckpointPersistFailed
            | Event::CheckpointClearFailed => Severity::Warn,
            _ => Severity::Info,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Event; 9] = [
        Event::ConfigLoaded,
        Event::RunQueryReady,
        Event::CountPrecomputeEnabled,
        Event::CountComputed,
        Event::PaceSuspend,
        Event::CheckpointLoaded,
        Event::CheckpointCleared,
        Event::CheckpointPersistFailed,
        Event::CheckpointClearFailed,
    ];

    #[test]
    fn test_all_events_have_string_representation() {
        for event in ALL {
            let s = event.as_str();
            assert!(!s.is_empty());
            assert!(s.chars().all(|c| c.is_uppercase() || c == '_'));
        }
    }

    #[test]
    fn test_failures_are_warnings() {
        assert_eq!(Event::CheckpointPersistFailed.severity(), Severity::Warn);
        assert_eq!(Event::CheckpointClearFailed.severity(), Severity::Warn);
        assert_eq!(Event::CountPrecomputeEnabled.severity(), Severity::Warn);
        assert_eq!(Event::CheckpointLoaded.severity(), Severity::Info);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Event::PaceSuspend), "PACE_SUSPEND");
    }
}
