//! Pacing policy: every Kth document, suspend for D
//!
//! Coarse backpressure against the store, not a rate limiter. A pause is due
//! after documents K, 2K, 3K, ... and never when D is zero.

use std::time::Duration;

use crate::config::BatchConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacingPolicy {
    every: u64,
    pause: Duration,
}

impl PacingPolicy {
    pub fn new(every: u64, pause: Duration) -> Self {
        Self { every, pause }
    }

    pub fn disabled() -> Self {
        Self::new(0, Duration::ZERO)
    }

    pub fn from_config(config: &BatchConfig) -> Self {
        Self::new(config.batch_size(), config.pause())
    }

    pub fn is_enabled(&self) -> bool {
        self.every > 0 && !self.pause.is_zero()
    }

    /// Pause owed after the `processed`th document
    pub fn pause_due(&self, processed: u64) -> Option<Duration> {
        if self.is_enabled() && processed > 0 && processed % self.every == 0 {
            Some(self.pause)
        } else {
            None
        }
    }

    /// Total pause owed for `documents` documents
    pub fn minimum_pause_for(&self, documents: u64) -> Duration {
        if !self.is_enabled() {
            return Duration::ZERO;
        }
        let pauses = u32::try_from(documents / self.every).unwrap_or(u32::MAX);
        self.pause.saturating_mul(pauses)
    }
}
