//! Bounded recording against the active feed.
//!
//! A recording operation buffers encoded chunks from the session's feed
//! until either its own bound timer fires or an early-stop signal arrives,
//! then finalizes the buffer into a single clip. The bound is enforced
//! here, independent of how long the user holds the button; an early
//! release shortens the clip, it never extends it past the bound.

use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;

use dualshot_camera::HardwareSession;
use dualshot_common::error::CaptureResult;

use crate::artifact::ClipBuffer;

/// Early-stop signaling for one recording operation.
///
/// Requesting a stop when the operation has already finalized is a no-op.
pub struct StopHandle {
    tx: watch::Sender<bool>,
}

impl StopHandle {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx }
    }

    /// Ask the in-flight recording to finalize now.
    pub fn request_stop(&self) {
        let _ = self.tx.send(true);
    }

    fn listener(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

impl Default for StopHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs bounded recording operations. Phases are never concurrent; the
/// sequencer does not start phase 2 until phase 1 has finalized.
pub struct Recorder;

impl Recorder {
    pub fn new() -> Self {
        Self
    }

    /// Buffer encoded chunks from the session's feed until `bound` elapses
    /// or `stop` fires, then finalize them into one clip.
    pub async fn record(
        &self,
        session: &mut HardwareSession,
        bound: Duration,
        stop: &StopHandle,
    ) -> CaptureResult<ClipBuffer> {
        let started = Instant::now();
        let mut stop_rx = stop.listener();
        let mut data = Vec::new();
        let mut chunks = 0u64;

        let deadline = tokio::time::sleep(bound);
        tokio::pin!(deadline);

        let feed = session.feed_mut();
        loop {
            tokio::select! {
                () = &mut deadline => {
                    tracing::debug!(chunks, "Recording bound reached");
                    break;
                }
                changed = stop_rx.changed() => {
                    if changed.is_err() || *stop_rx.borrow() {
                        tracing::debug!(chunks, "Recording stopped early");
                        break;
                    }
                }
                chunk = feed.read_chunk() => {
                    data.extend_from_slice(&chunk?);
                    chunks += 1;
                }
            }
        }

        let duration = started.elapsed();
        tracing::info!(
            chunks,
            bytes = data.len(),
            duration_ms = duration.as_millis() as u64,
            "Recording finalized"
        );
        Ok(ClipBuffer { data, duration })
    }
}

impl Default for Recorder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dualshot_camera::synthetic::SyntheticBackend;
    use dualshot_camera::SessionManager;
    use dualshot_common::config::FeedConfig;
    use dualshot_common::facing::CameraFacing;

    /// Synthetic chunk pacing; one scheduler tick of tolerance on bounds.
    const TICK: Duration = Duration::from_millis(33);

    async fn session() -> SessionManager {
        let mut manager =
            SessionManager::new(Box::new(SyntheticBackend::new()), FeedConfig::default());
        manager.acquire(CameraFacing::Rear).await.unwrap();
        manager
    }

    #[tokio::test(start_paused = true)]
    async fn recording_is_force_stopped_at_bound() {
        let mut manager = session().await;
        let recorder = Recorder::new();
        let stop = StopHandle::new();

        let bound = Duration::from_secs(5);
        let clip = recorder
            .record(manager.active_mut().unwrap(), bound, &stop)
            .await
            .unwrap();

        assert!(clip.duration >= bound);
        assert!(clip.duration < bound + TICK);
        assert!(!clip.data.is_empty());
        assert!(clip.data.starts_with(b"Rear|"));
    }

    #[tokio::test(start_paused = true)]
    async fn early_stop_shortens_the_clip() {
        let mut manager = session().await;
        let recorder = Recorder::new();
        let stop = StopHandle::new();

        let record = recorder.record(
            manager.active_mut().unwrap(),
            Duration::from_secs(5),
            &stop,
        );
        let stopper = async {
            tokio::time::sleep(Duration::from_secs(1)).await;
            stop.request_stop();
        };
        let (clip, ()) = tokio::join!(record, stopper);
        let clip = clip.unwrap();

        assert!(clip.duration >= Duration::from_secs(1));
        assert!(clip.duration < Duration::from_secs(1) + TICK);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_after_finalize_is_a_no_op() {
        let mut manager = session().await;
        let recorder = Recorder::new();
        let stop = StopHandle::new();

        let clip = recorder
            .record(
                manager.active_mut().unwrap(),
                Duration::from_millis(200),
                &stop,
            )
            .await
            .unwrap();
        assert!(clip.duration >= Duration::from_millis(200));

        // The operation is finalized; a late stop request goes nowhere.
        stop.request_stop();
    }
}
