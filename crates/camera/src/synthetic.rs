//! Deterministic synthetic camera backend.
//!
//! Generates gradient test-pattern frames and paced fake media chunks so
//! the capture engine can be exercised end to end without hardware. Fault
//! knobs simulate the platform failures the engine has to survive: denied
//! permission, a missing facing direction, and a feed that has not warmed
//! up yet. A shared probe counts opens and releases for leak assertions.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dualshot_common::config::FeedConfig;
use dualshot_common::error::HardwareError;
use dualshot_common::facing::CameraFacing;

use crate::{CameraBackend, CameraFeed, RawFrame};

/// Pacing of fake encoded chunks (~30 chunks per second).
const CHUNK_INTERVAL: Duration = Duration::from_millis(33);

/// Generate the deterministic RGB8 test pattern for one frame: horizontal
/// red gradient, vertical green gradient, facing marker in blue.
pub fn test_pattern(width: u32, height: u32, facing: CameraFacing) -> Vec<u8> {
    let marker = match facing {
        CameraFacing::Rear => 64u8,
        CameraFacing::Front => 192u8,
    };
    let mut pixels = Vec::with_capacity((width * height * 3) as usize);
    for y in 0..height {
        for x in 0..width {
            pixels.push((x * 255 / width.max(1)) as u8);
            pixels.push((y * 255 / height.max(1)) as u8);
            pixels.push(marker);
        }
    }
    pixels
}

/// Shared counters exposed by [`SyntheticBackend::probe`].
#[derive(Debug, Clone, Default)]
pub struct SyntheticProbe {
    opens: Arc<AtomicUsize>,
    releases: Arc<AtomicUsize>,
    live: Arc<AtomicUsize>,
}

impl SyntheticProbe {
    /// Total feeds opened so far.
    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    /// Total feeds stopped so far.
    pub fn releases(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }

    /// Feeds currently live. Must never exceed 1 under the manager.
    pub fn live_feeds(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }
}

/// Test-pattern backend with configurable fault injection.
pub struct SyntheticBackend {
    deny_permission: bool,
    missing_facing: Option<CameraFacing>,
    warmup_frames: u32,
    torch_supported: bool,
    probe: SyntheticProbe,
}

impl SyntheticBackend {
    pub fn new() -> Self {
        Self {
            deny_permission: false,
            missing_facing: None,
            warmup_frames: 0,
            torch_supported: true,
            probe: SyntheticProbe::default(),
        }
    }

    /// Simulate the platform refusing camera access.
    pub fn deny_permission(mut self) -> Self {
        self.deny_permission = true;
        self
    }

    /// Simulate a device without the given facing direction.
    pub fn without_facing(mut self, facing: CameraFacing) -> Self {
        self.missing_facing = Some(facing);
        self
    }

    /// Simulate a device without torch support.
    pub fn without_torch(mut self) -> Self {
        self.torch_supported = false;
        self
    }

    /// Feeds present no frame for the first `frames` queries.
    pub fn with_warmup(mut self, frames: u32) -> Self {
        self.warmup_frames = frames;
        self
    }

    /// Handle to the open/release counters, independent of backend
    /// ownership.
    pub fn probe(&self) -> SyntheticProbe {
        self.probe.clone()
    }
}

impl Default for SyntheticBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl CameraBackend for SyntheticBackend {
    async fn open(
        &mut self,
        facing: CameraFacing,
        config: &FeedConfig,
    ) -> Result<Box<dyn CameraFeed>, HardwareError> {
        if self.deny_permission {
            return Err(HardwareError::permission_denied("synthetic denial"));
        }
        if self.missing_facing == Some(facing) {
            return Err(HardwareError::NoDevice { facing });
        }

        self.probe.opens.fetch_add(1, Ordering::SeqCst);
        self.probe.live.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(SyntheticFeed {
            facing,
            width: config.width,
            height: config.height,
            sequence: 0,
            chunk_sequence: 0,
            warmup_remaining: self.warmup_frames,
            torch_supported: self.torch_supported,
            probe: self.probe.clone(),
            stopped: false,
        }))
    }

    fn name(&self) -> &str {
        "synthetic"
    }

    fn is_available(&self) -> bool {
        true
    }
}

struct SyntheticFeed {
    facing: CameraFacing,
    width: u32,
    height: u32,
    sequence: u64,
    chunk_sequence: u64,
    warmup_remaining: u32,
    torch_supported: bool,
    probe: SyntheticProbe,
    stopped: bool,
}

#[async_trait::async_trait]
impl CameraFeed for SyntheticFeed {
    async fn current_frame(&mut self) -> Result<Option<RawFrame>, HardwareError> {
        if self.stopped {
            return Err(HardwareError::stream("feed stopped"));
        }
        if self.warmup_remaining > 0 {
            self.warmup_remaining -= 1;
            return Ok(None);
        }
        self.sequence += 1;
        Ok(Some(RawFrame {
            width: self.width,
            height: self.height,
            pixels: test_pattern(self.width, self.height, self.facing),
            sequence: self.sequence,
        }))
    }

    async fn read_chunk(&mut self) -> Result<Vec<u8>, HardwareError> {
        if self.stopped {
            return Err(HardwareError::stream("feed stopped"));
        }
        tokio::time::sleep(CHUNK_INTERVAL).await;
        self.chunk_sequence += 1;
        Ok(format!("{:?}|{:05};", self.facing, self.chunk_sequence).into_bytes())
    }

    fn set_torch(&mut self, _on: bool) -> Result<(), HardwareError> {
        if self.torch_supported {
            Ok(())
        } else {
            Err(HardwareError::TorchUnsupported)
        }
    }

    fn stop(&mut self) {
        if !self.stopped {
            self.stopped = true;
            self.probe.live.fetch_sub(1, Ordering::SeqCst);
            self.probe.releases.fetch_add(1, Ordering::SeqCst);
        }
    }
}
