//! Still-frame extraction from a live feed.

use dualshot_camera::{HardwareSession, RawFrame};
use dualshot_common::error::{CaptureResult, GrabError};
use dualshot_common::facing::CameraFacing;
use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, ImageEncoder};

/// Mirror a tightly packed RGB8 buffer around its vertical axis, in place.
///
/// Mirroring is a pure function of facing, not of phase number: the
/// user-facing camera may serve either phase of a sequence.
pub fn mirror_rgb_in_place(pixels: &mut [u8], width: u32) {
    let row_len = width as usize * 3;
    if row_len == 0 {
        return;
    }
    for row in pixels.chunks_exact_mut(row_len) {
        let (mut left, mut right) = (0usize, width as usize - 1);
        while left < right {
            for channel in 0..3 {
                row.swap(left * 3 + channel, right * 3 + channel);
            }
            left += 1;
            right -= 1;
        }
    }
}

/// Extracts single encoded stills from the active feed.
pub struct FrameGrabber {
    jpeg_quality: u8,
}

impl FrameGrabber {
    pub fn new(jpeg_quality: u8) -> Self {
        Self {
            jpeg_quality: jpeg_quality.clamp(1, 100),
        }
    }

    /// Grab the currently presented frame of the session's feed.
    ///
    /// Front-facing grabs are mirrored before encoding so a selfie matches
    /// what the subject saw in the (self-mirrored) live preview. Fails with
    /// [`GrabError::NoFrameAvailable`] when the feed has not warmed up yet;
    /// callers treat that as a sequence abort, not a retry-in-place.
    pub async fn grab(&self, session: &mut HardwareSession) -> CaptureResult<crate::MediaRef> {
        let facing = session.facing();
        let frame = session.feed_mut().current_frame().await?;
        let mut frame = frame.ok_or(GrabError::NoFrameAvailable)?;

        if frame.pixels.len() != frame.expected_len() {
            return Err(GrabError::encode(format!(
                "frame buffer is {} bytes, expected {} for {}x{}",
                frame.pixels.len(),
                frame.expected_len(),
                frame.width,
                frame.height
            ))
            .into());
        }

        if facing == CameraFacing::Front {
            mirror_rgb_in_place(&mut frame.pixels, frame.width);
        }

        let data = encode_jpeg(&frame, self.jpeg_quality)?;
        tracing::debug!(
            ?facing,
            sequence = frame.sequence,
            bytes = data.len(),
            "Frame grabbed"
        );
        Ok(crate::MediaRef::Image(crate::StillImage {
            data,
            width: frame.width,
            height: frame.height,
        }))
    }
}

fn encode_jpeg(frame: &RawFrame, quality: u8) -> Result<Vec<u8>, GrabError> {
    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, quality)
        .write_image(
            &frame.pixels,
            frame.width,
            frame.height,
            ExtendedColorType::Rgb8,
        )
        .map_err(|e| GrabError::encode(e.to_string()))?;
    Ok(out)
}
