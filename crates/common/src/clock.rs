//! Timing utilities for capture sequences.
//!
//! A capture sequence is anchored to a monotonic epoch recorded when the
//! gesture resolves. Progress reports and clip durations are expressed
//! relative to that epoch; the finished artifact carries a wall-clock
//! timestamp taken when phase 2 completes.

use std::time::Instant;

/// A clock anchored to the start of one capture sequence.
#[derive(Debug, Clone)]
pub struct SequenceClock {
    /// The instant the sequence started.
    epoch: Instant,

    /// Wall-clock time at epoch (ISO 8601 string).
    epoch_wall: String,
}

impl SequenceClock {
    /// Create a new clock anchored to now.
    pub fn start() -> Self {
        Self {
            epoch: Instant::now(),
            epoch_wall: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Milliseconds elapsed since the sequence started.
    pub fn elapsed_ms(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }

    /// Seconds elapsed since the sequence started.
    pub fn elapsed_secs(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64()
    }

    /// Wall-clock time at sequence start.
    pub fn epoch_wall(&self) -> &str {
        &self.epoch_wall
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_clock_reads_near_zero() {
        let clock = SequenceClock::start();
        assert!(clock.elapsed_secs() < 1.0);
    }

    #[test]
    fn epoch_wall_is_rfc3339() {
        let clock = SequenceClock::start();
        assert!(chrono::DateTime::parse_from_rfc3339(clock.epoch_wall()).is_ok());
    }
}
