//! Captured media and the assembled dual-capture artifact.

use std::time::Duration;

use chrono::{DateTime, Utc};
use dualshot_common::error::{CaptureError, CaptureResult};
use dualshot_common::facing::CameraFacing;

/// Which kind of sequence a gesture selected. Fixed for the lifetime of one
/// capture sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureMode {
    /// Two still images.
    Photo,
    /// Two bounded clips.
    Video,
}

/// An encoded still image at the feed's native resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StillImage {
    /// JPEG bytes.
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// An encoded clip finalized from buffered feed chunks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipBuffer {
    /// Encoded media bytes.
    pub data: Vec<u8>,
    /// Realized recording duration (early stop may shorten it below the
    /// configured bound, never lengthen it).
    pub duration: Duration,
}

/// One captured media buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaRef {
    Image(StillImage),
    Clip(ClipBuffer),
}

impl MediaRef {
    pub fn is_image(&self) -> bool {
        matches!(self, Self::Image(_))
    }

    pub fn is_clip(&self) -> bool {
        matches!(self, Self::Clip(_))
    }

    /// Whether two refs carry the same media variant.
    pub fn same_kind(&self, other: &Self) -> bool {
        matches!(
            (self, other),
            (Self::Image(_), Self::Image(_)) | (Self::Clip(_), Self::Clip(_))
        )
    }
}

/// Working storage for the two capture phases. Both slots must end up with
/// the same media variant; a photo sequence never mixes image and clip.
#[derive(Debug, Clone, Default)]
pub struct MediaSlot {
    pub primary: Option<MediaRef>,
    pub secondary: Option<MediaRef>,
}

impl MediaSlot {
    pub fn is_complete(&self) -> bool {
        self.primary.is_some() && self.secondary.is_some()
    }

    pub fn is_homogeneous(&self) -> bool {
        match (&self.primary, &self.secondary) {
            (Some(a), Some(b)) => a.same_kind(b),
            _ => true,
        }
    }
}

/// The finished artifact: both phases of one dual capture. Immutable after
/// assembly, consumed exactly once by the caller.
#[derive(Debug, Clone)]
pub struct DualCaptureResult {
    pub primary: MediaRef,
    pub secondary: MediaRef,
    pub mode: CaptureMode,
    /// Moment the full pair finished (phase-2 completion), the real-world
    /// "moment of last exposure".
    pub captured_at: DateTime<Utc>,
    /// Facing used by phase 1; phase 2 used the opposite.
    pub primary_facing: CameraFacing,
}

/// Combine the two captured buffers into the immutable result.
///
/// Timestamps at call time, which the sequencer guarantees is phase-2
/// completion. Rejects heterogeneous media; stale-input reuse is a caller
/// error and is not guarded here.
pub fn assemble(
    primary: MediaRef,
    secondary: MediaRef,
    mode: CaptureMode,
    primary_facing: CameraFacing,
) -> CaptureResult<DualCaptureResult> {
    if !primary.same_kind(&secondary) {
        return Err(CaptureError::assembly(
            "primary and secondary media must carry the same variant",
        ));
    }
    let expect_image = mode == CaptureMode::Photo;
    if primary.is_image() != expect_image {
        return Err(CaptureError::assembly(format!(
            "media variant does not match {mode:?} mode"
        )));
    }

    Ok(DualCaptureResult {
        primary,
        secondary,
        mode,
        captured_at: Utc::now(),
        primary_facing,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image() -> MediaRef {
        MediaRef::Image(StillImage {
            data: vec![1, 2, 3],
            width: 2,
            height: 1,
        })
    }

    fn clip() -> MediaRef {
        MediaRef::Clip(ClipBuffer {
            data: vec![4, 5],
            duration: Duration::from_secs(1),
        })
    }

    #[test]
    fn assemble_photo_pair() {
        let result = assemble(image(), image(), CaptureMode::Photo, CameraFacing::Rear).unwrap();
        assert_eq!(result.mode, CaptureMode::Photo);
        assert_eq!(result.primary_facing, CameraFacing::Rear);
        assert!(result.primary.is_image());
    }

    #[test]
    fn assemble_rejects_mixed_variants() {
        let err = assemble(image(), clip(), CaptureMode::Photo, CameraFacing::Rear).unwrap_err();
        assert!(err.to_string().contains("same variant"));
    }

    #[test]
    fn assemble_rejects_variant_mode_mismatch() {
        assert!(assemble(clip(), clip(), CaptureMode::Photo, CameraFacing::Front).is_err());
        assert!(assemble(image(), image(), CaptureMode::Video, CameraFacing::Front).is_err());
    }

    #[test]
    fn slot_homogeneity() {
        let mut slots = MediaSlot::default();
        assert!(!slots.is_complete());
        slots.primary = Some(image());
        slots.secondary = Some(clip());
        assert!(slots.is_complete());
        assert!(!slots.is_homogeneous());
        slots.secondary = Some(image());
        assert!(slots.is_homogeneous());
    }
}
