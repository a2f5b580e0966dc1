//! Dualshot Camera
//!
//! Hardware session management for dual-angle capture. At most one camera
//! feed is live at any time; the [`manager::SessionManager`] owns it and
//! guarantees the previous handle is released before a facing switch brings
//! up the next one. Backends are pluggable:
//!
//! - **Synthetic:** deterministic test-pattern feed (always available)
//! - **GStreamer:** V4L2 devices via appsink pipelines (`backend-gstreamer`)

pub mod manager;
pub mod synthetic;

#[cfg(feature = "backend-gstreamer")]
pub mod gst;

pub use manager::{HardwareSession, SessionManager};

use dualshot_common::config::FeedConfig;
use dualshot_common::error::HardwareError;
use dualshot_common::facing::CameraFacing;

/// One uncompressed frame presented by a live feed. Pixels are tightly
/// packed RGB8, row-major, at the feed's native resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
    /// Monotonic frame counter within the feed.
    pub sequence: u64,
}

impl RawFrame {
    /// Expected pixel buffer length for the frame dimensions.
    pub fn expected_len(&self) -> usize {
        self.width as usize * self.height as usize * 3
    }
}

/// A live hardware feed bound to one facing direction.
///
/// Feeds are operated on exclusively through the session manager's owned
/// [`HardwareSession`]; callers never hold the feed directly.
#[async_trait::async_trait]
pub trait CameraFeed: Send {
    /// The currently presented frame, or `None` if the feed has not warmed
    /// up yet.
    async fn current_frame(&mut self) -> Result<Option<RawFrame>, HardwareError>;

    /// Await the next encoded media chunk from the feed.
    async fn read_chunk(&mut self) -> Result<Vec<u8>, HardwareError>;

    /// Toggle the torch/flash on the underlying device.
    fn set_torch(&mut self, on: bool) -> Result<(), HardwareError>;

    /// Stop all underlying hardware tracks. Idempotent.
    fn stop(&mut self);
}

/// Abstract interface for camera capture backends.
#[async_trait::async_trait]
pub trait CameraBackend: Send {
    /// Open a live feed bound to the requested facing direction.
    async fn open(
        &mut self,
        facing: CameraFacing,
        config: &FeedConfig,
    ) -> Result<Box<dyn CameraFeed>, HardwareError>;

    /// Backend name for logging.
    fn name(&self) -> &str;

    /// Check if the backend is available on this system.
    fn is_available(&self) -> bool;
}

/// Get the preferred backend for this build.
pub fn default_backend() -> Box<dyn CameraBackend> {
    #[cfg(feature = "backend-gstreamer")]
    {
        let backend = gst::GstBackend::new();
        if backend.is_available() {
            return Box::new(backend);
        }
        tracing::warn!("GStreamer backend unavailable, falling back to synthetic feed");
    }
    Box::new(synthetic::SyntheticBackend::new())
}
