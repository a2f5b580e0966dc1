//! Press-gesture disambiguation.
//!
//! A single press is either a tap (instant photo) or a hold (start a timed
//! recording), decided by a single-shot hold deadline armed at press start.
//! A release that lands while a recording is in flight is an early-stop
//! request instead. Each press/release pair resolves to exactly one event,
//! and the arbiter is immediately re-armable afterwards; the deadline is
//! dropped on resolution, so a stale fire cannot race a later press.

use std::pin::Pin;
use std::time::Duration;

use tokio::time::{sleep, Sleep};

/// The single classification produced for one press/release pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureEvent {
    /// Released before the hold threshold: photo sequence.
    TapDetected,
    /// Held past the threshold: video sequence, primary recording.
    HoldDetected,
    /// Released while a recording phase was active: finalize it early.
    EarlyStop,
}

/// Classifies press gestures against a fixed hold threshold.
pub struct GestureArbiter {
    threshold: Duration,
    deadline: Option<Pin<Box<Sleep>>>,
}

impl GestureArbiter {
    pub fn new(threshold: Duration) -> Self {
        Self {
            threshold,
            deadline: None,
        }
    }

    /// Arm the hold deadline for a new press. A press start while already
    /// armed restarts the window.
    pub fn on_press_start(&mut self) {
        self.deadline = Some(Box::pin(sleep(self.threshold)));
    }

    /// Whether a press is awaiting classification.
    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Handle a release. Yields `TapDetected` if the deadline had not fired
    /// yet, `EarlyStop` if a recording is active, and nothing for a stray
    /// release.
    pub fn on_press_end(&mut self, recording_active: bool) -> Option<GestureEvent> {
        let was_armed = self.deadline.take().is_some();
        if recording_active {
            return Some(GestureEvent::EarlyStop);
        }
        was_armed.then_some(GestureEvent::TapDetected)
    }

    /// Resolves with `HoldDetected` when the armed deadline fires; pends
    /// forever while unarmed.
    pub async fn hold_elapsed(&mut self) -> GestureEvent {
        match self.deadline.as_mut() {
            Some(deadline) => {
                deadline.as_mut().await;
                self.deadline = None;
                GestureEvent::HoldDetected
            }
            None => std::future::pending().await,
        }
    }

    /// Discard any armed deadline (sequence cancelled).
    pub fn reset(&mut self) {
        self.deadline = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const THRESHOLD: Duration = Duration::from_millis(300);

    #[tokio::test(start_paused = true)]
    async fn quick_release_is_a_tap() {
        let mut arbiter = GestureArbiter::new(THRESHOLD);
        arbiter.on_press_start();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(
            arbiter.on_press_end(false),
            Some(GestureEvent::TapDetected)
        );
        assert!(!arbiter.is_armed());
    }

    #[tokio::test(start_paused = true)]
    async fn held_press_resolves_to_hold() {
        let mut arbiter = GestureArbiter::new(THRESHOLD);
        arbiter.on_press_start();
        assert_eq!(arbiter.hold_elapsed().await, GestureEvent::HoldDetected);
        // The pair is resolved; the trailing release lands during the
        // recording that the hold started.
        assert_eq!(arbiter.on_press_end(true), Some(GestureEvent::EarlyStop));
    }

    #[tokio::test(start_paused = true)]
    async fn stray_release_emits_nothing() {
        let mut arbiter = GestureArbiter::new(THRESHOLD);
        assert_eq!(arbiter.on_press_end(false), None);
    }

    #[tokio::test(start_paused = true)]
    async fn exactly_one_event_per_pair() {
        let mut arbiter = GestureArbiter::new(THRESHOLD);
        arbiter.on_press_start();
        assert_eq!(
            arbiter.on_press_end(false),
            Some(GestureEvent::TapDetected)
        );
        // A second release from the same pair resolves to nothing.
        assert_eq!(arbiter.on_press_end(false), None);
    }

    #[tokio::test(start_paused = true)]
    async fn rearm_after_resolution() {
        let mut arbiter = GestureArbiter::new(THRESHOLD);
        arbiter.on_press_start();
        assert_eq!(arbiter.hold_elapsed().await, GestureEvent::HoldDetected);

        arbiter.on_press_start();
        assert!(arbiter.is_armed());
        assert_eq!(
            arbiter.on_press_end(false),
            Some(GestureEvent::TapDetected)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn reset_discards_deadline() {
        let mut arbiter = GestureArbiter::new(THRESHOLD);
        arbiter.on_press_start();
        arbiter.reset();
        assert!(!arbiter.is_armed());
        assert_eq!(arbiter.on_press_end(false), None);
    }
}
