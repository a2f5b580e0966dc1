//! Dualshot Capture Engine
//!
//! Orchestrates a two-phase, dual-angle capture sequence: one gesture
//! captures from the active camera facing, forces a hardware facing
//! switch, and captures again from the opposite side, producing a single
//! paired artifact (two stills or two bounded clips).
//!
//! # Architecture
//!
//! ```text
//! press/release ──▶ GestureArbiter ──▶ Sequencer ──▶ DualCaptureResult
//!                                         │
//!                      ┌──────────────────┼──────────────────┐
//!                      ▼                  ▼                  ▼
//!                FrameGrabber         Recorder        SessionManager
//!                (photo phases)    (video phases)    (one live feed,
//!                                                     facing switch)
//! ```
//!
//! All hardware operations are serialized through the sequencer's state;
//! the session manager guarantees at most one live feed on every path.

pub mod artifact;
pub mod gesture;
pub mod grabber;
pub mod recorder;
pub mod sequencer;

pub use artifact::{
    assemble, CaptureMode, ClipBuffer, DualCaptureResult, MediaRef, MediaSlot, StillImage,
};
pub use gesture::{GestureArbiter, GestureEvent};
pub use grabber::FrameGrabber;
pub use recorder::{Recorder, StopHandle};
pub use sequencer::{CaptureStage, ControlEvent, Progress, RecordingStage, Sequencer};
