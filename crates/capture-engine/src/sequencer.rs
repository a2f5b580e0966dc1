//! The dual-capture state machine.
//!
//! Drives both phases of a capture sequence for either mode:
//!
//! | Stage           | Event                   | Next                     |
//! |-----------------|-------------------------|--------------------------|
//! | Idle            | TapDetected             | PrimaryCaptured (photo)  |
//! | Idle            | HoldDetected            | Idle, recording primary  |
//! | PrimaryCaptured | (auto)                  | Switching                |
//! | Switching       | settle elapsed          | Done (photo) / Idle with |
//! |                 |                         | secondary recording      |
//! | Idle (video)    | secondary finalized     | Done                     |
//! | any non-Done    | CancelRequested         | Idle, session released   |
//!
//! The facing switch between phases is mandatory and automatic: phase 1
//! uses whatever facing was active when the gesture resolved, phase 2 the
//! opposite. All hardware calls are serialized through this loop; no state
//! advances while a grab, acquire, or recording await is in flight. Every
//! exit path (success, cancel, error) leaves zero open hardware sessions.

use tokio::sync::mpsc;

use dualshot_camera::{CameraBackend, SessionManager};
use dualshot_common::clock::SequenceClock;
use dualshot_common::config::EngineConfig;
use dualshot_common::error::{CaptureError, CaptureResult};
use dualshot_common::facing::CameraFacing;

use crate::artifact::{assemble, CaptureMode, ClipBuffer, DualCaptureResult, MediaRef, MediaSlot};
use crate::gesture::{GestureArbiter, GestureEvent};
use crate::grabber::FrameGrabber;
use crate::recorder::{Recorder, StopHandle};

/// Progress of a capture sequence. Monotonic except for explicit cancel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureStage {
    Idle,
    PrimaryCaptured,
    Switching,
    Done,
}

/// Which recording operation is in flight, if any. Meaningful only in
/// video mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordingStage {
    None,
    Primary,
    Secondary,
}

/// Raw inputs from the caller: press/release gestures and cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlEvent {
    PressStart,
    PressEnd,
    Cancel,
}

/// Advisory stage notifications for UI feedback. Not part of the
/// correctness contract; a dropped receiver is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    GestureResolved(CaptureMode),
    PrimaryCaptured,
    Switching { to: CameraFacing },
    RecordingStarted(RecordingStage),
    RecordingStopped(RecordingStage),
    Done,
    Cancelled,
}

/// The dual-capture sequencer. One instance drives one sequence at a time;
/// [`Sequencer::run`] is re-invocable after completion or cancel.
pub struct Sequencer {
    config: EngineConfig,
    manager: SessionManager,
    gesture: GestureArbiter,
    grabber: FrameGrabber,
    recorder: Recorder,
    stage: CaptureStage,
    recording: RecordingStage,
    progress: Option<mpsc::UnboundedSender<Progress>>,
}

impl Sequencer {
    pub fn new(config: EngineConfig, backend: Box<dyn CameraBackend>) -> Self {
        let manager = SessionManager::new(backend, config.feed.clone());
        let gesture = GestureArbiter::new(config.hold_threshold());
        let grabber = FrameGrabber::new(config.feed.jpeg_quality);
        Self {
            config,
            manager,
            gesture,
            grabber,
            recorder: Recorder::new(),
            stage: CaptureStage::Idle,
            recording: RecordingStage::None,
            progress: None,
        }
    }

    /// Attach an advisory progress listener.
    pub fn with_progress(mut self, tx: mpsc::UnboundedSender<Progress>) -> Self {
        self.progress = Some(tx);
        self
    }

    pub fn stage(&self) -> CaptureStage {
        self.stage
    }

    pub fn recording_stage(&self) -> RecordingStage {
        self.recording
    }

    /// Whether a hardware session is currently open.
    pub fn has_session(&self) -> bool {
        self.manager.has_session()
    }

    /// Toggle the torch on the active session; a no-op when unsupported or
    /// when no session is open.
    pub fn set_torch(&mut self, on: bool) {
        self.manager.set_torch(on);
    }

    /// Run one capture sequence: bring up the feed for `initial_facing`,
    /// classify the gesture, capture phase 1, switch facing, settle,
    /// capture phase 2, assemble.
    ///
    /// Returns `Ok(Some(result))` on completion, `Ok(None)` on a clean
    /// cancel. On any outcome the hardware session is released and the
    /// sequencer is ready for a fresh run.
    pub async fn run(
        &mut self,
        initial_facing: CameraFacing,
        ctrl: &mut mpsc::Receiver<ControlEvent>,
    ) -> CaptureResult<Option<DualCaptureResult>> {
        self.stage = CaptureStage::Idle;
        self.recording = RecordingStage::None;
        self.gesture.reset();

        let outcome = self.drive(initial_facing, ctrl).await;

        // Every exit path ends with zero open sessions.
        self.manager.release();
        self.recording = RecordingStage::None;
        self.gesture.reset();

        match outcome {
            Ok(Some(result)) => {
                self.stage = CaptureStage::Done;
                self.emit(Progress::Done);
                Ok(Some(result))
            }
            Ok(None) => {
                self.stage = CaptureStage::Idle;
                self.emit(Progress::Cancelled);
                tracing::info!("Capture sequence cancelled; partial media discarded");
                Ok(None)
            }
            Err(e) => {
                self.stage = CaptureStage::Idle;
                tracing::warn!(error = %e, "Capture sequence failed; session released");
                Err(e)
            }
        }
    }

    async fn drive(
        &mut self,
        initial_facing: CameraFacing,
        ctrl: &mut mpsc::Receiver<ControlEvent>,
    ) -> CaptureResult<Option<DualCaptureResult>> {
        // Live feed first: the caller's preview is what phase 1 captures.
        self.manager.acquire(initial_facing).await?;

        let Some(mode) = self.await_gesture(ctrl).await? else {
            return Ok(None);
        };
        self.emit(Progress::GestureResolved(mode));
        let clock = SequenceClock::start();
        tracing::info!(?mode, ?initial_facing, "Capture sequence started");

        let mut slots = MediaSlot::default();
        match mode {
            CaptureMode::Photo => {
                slots.primary = Some(self.grab_current().await?);
                self.stage = CaptureStage::PrimaryCaptured;
                self.emit(Progress::PrimaryCaptured);

                if !self.switch_and_settle(ctrl).await? {
                    return Ok(None);
                }
                slots.secondary = Some(self.grab_current().await?);
            }
            CaptureMode::Video => {
                let Some(clip) = self.record_phase(RecordingStage::Primary, ctrl).await? else {
                    return Ok(None);
                };
                slots.primary = Some(MediaRef::Clip(clip));
                self.stage = CaptureStage::PrimaryCaptured;
                self.emit(Progress::PrimaryCaptured);

                if !self.switch_and_settle(ctrl).await? {
                    return Ok(None);
                }
                // Back to Idle while the second recording phase runs.
                self.stage = CaptureStage::Idle;

                let Some(clip) = self.record_phase(RecordingStage::Secondary, ctrl).await? else {
                    return Ok(None);
                };
                slots.secondary = Some(MediaRef::Clip(clip));
            }
        }

        debug_assert!(slots.is_complete() && slots.is_homogeneous());
        let (Some(primary), Some(secondary)) = (slots.primary, slots.secondary) else {
            return Err(CaptureError::assembly("capture phases left a slot empty"));
        };
        let result = assemble(primary, secondary, mode, initial_facing)?;
        tracing::info!(
            elapsed_secs = clock.elapsed_secs(),
            ?mode,
            "Dual capture complete"
        );
        Ok(Some(result))
    }

    /// Wait for a press and classify it. `Ok(None)` means cancelled.
    async fn await_gesture(
        &mut self,
        ctrl: &mut mpsc::Receiver<ControlEvent>,
    ) -> CaptureResult<Option<CaptureMode>> {
        loop {
            tokio::select! {
                // Pends forever while no press is armed.
                event = self.gesture.hold_elapsed() => {
                    debug_assert_eq!(event, GestureEvent::HoldDetected);
                    return Ok(Some(CaptureMode::Video));
                }
                event = ctrl.recv() => match event {
                    Some(ControlEvent::PressStart) => self.gesture.on_press_start(),
                    Some(ControlEvent::PressEnd) => {
                        if self.gesture.on_press_end(false) == Some(GestureEvent::TapDetected) {
                            return Ok(Some(CaptureMode::Photo));
                        }
                    }
                    Some(ControlEvent::Cancel) | None => return Ok(None),
                }
            }
        }
    }

    /// Grab a still from the active session.
    async fn grab_current(&mut self) -> CaptureResult<MediaRef> {
        let grabber = &self.grabber;
        let session = self
            .manager
            .active_mut()
            .ok_or_else(|| CaptureError::recording("no active session to grab from"))?;
        grabber.grab(session).await
    }

    /// Switch to the opposite facing and wait out the settle delay. The
    /// delay is a fixed conservative bound: facing switches report ready
    /// before exposure and focus have stabilized. Returns `false` when
    /// cancelled mid-switch.
    async fn switch_and_settle(
        &mut self,
        ctrl: &mut mpsc::Receiver<ControlEvent>,
    ) -> CaptureResult<bool> {
        let current = self
            .manager
            .active_facing()
            .ok_or_else(|| CaptureError::recording("no active session at facing switch"))?;
        let target = current.opposite();

        self.stage = CaptureStage::Switching;
        self.emit(Progress::Switching { to: target });
        self.manager.acquire(target).await?;

        let settle = tokio::time::sleep(self.config.settle_delay());
        tokio::pin!(settle);
        loop {
            tokio::select! {
                () = &mut settle => return Ok(true),
                event = ctrl.recv() => match event {
                    Some(ControlEvent::Cancel) | None => return Ok(false),
                    // Presses while switching belong to no phase; ignore.
                    Some(_) => {}
                }
            }
        }
    }

    /// Run one bounded recording phase. `Ok(None)` means cancelled.
    async fn record_phase(
        &mut self,
        stage: RecordingStage,
        ctrl: &mut mpsc::Receiver<ControlEvent>,
    ) -> CaptureResult<Option<ClipBuffer>> {
        let bound = match stage {
            RecordingStage::Primary => self.config.primary_clip_bound(),
            RecordingStage::Secondary => self.config.secondary_clip_bound(),
            RecordingStage::None => {
                return Err(CaptureError::recording("recording phase requires a stage"))
            }
        };
        self.recording = stage;
        self.emit(Progress::RecordingStarted(stage));

        let stop = StopHandle::new();
        let clip = {
            let gesture = &mut self.gesture;
            let recorder = &self.recorder;
            let session = self
                .manager
                .active_mut()
                .ok_or_else(|| CaptureError::recording("no active session to record from"))?;
            let record = recorder.record(session, bound, &stop);
            tokio::pin!(record);
            loop {
                tokio::select! {
                    clip = &mut record => break clip?,
                    event = ctrl.recv() => match event {
                        Some(ControlEvent::PressEnd) => {
                            if gesture.on_press_end(true) == Some(GestureEvent::EarlyStop) {
                                stop.request_stop();
                            }
                        }
                        // The press that started this recording already
                        // resolved; further presses are ignored until the
                        // sequence ends.
                        Some(ControlEvent::PressStart) => {}
                        Some(ControlEvent::Cancel) | None => {
                            stop.request_stop();
                            return Ok(None);
                        }
                    }
                }
            }
        };

        self.recording = RecordingStage::None;
        self.emit(Progress::RecordingStopped(stage));
        Ok(Some(clip))
    }

    fn emit(&self, event: Progress) {
        if let Some(tx) = &self.progress {
            let _ = tx.send(event);
        }
    }
}
