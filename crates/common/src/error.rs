//! Error types shared across Dualshot crates.

use crate::facing::CameraFacing;

/// Failure of a camera hardware operation.
#[derive(Debug, Clone, thiserror::Error)]
pub enum HardwareError {
    /// The platform refused camera/microphone access. Never retried
    /// automatically; the sequence does not proceed past Idle.
    #[error("Camera permission denied: {message}")]
    PermissionDenied { message: String },

    /// No device can satisfy the requested facing direction (for example a
    /// single-camera machine asked for its front camera).
    #[error("No camera device for facing {facing:?}")]
    NoDevice { facing: CameraFacing },

    /// Torch/flash is not available on the active device. Swallowed as a
    /// no-op by the session manager, never surfaced as a hard failure.
    #[error("Torch not supported on active device")]
    TorchUnsupported,

    /// The live feed failed mid-operation.
    #[error("Camera stream error: {message}")]
    Stream { message: String },
}

/// Failure to grab a still frame from a live feed.
#[derive(Debug, Clone, thiserror::Error)]
pub enum GrabError {
    /// The feed has not presented a first frame yet (acquired but not
    /// warmed up). Treated as a sequence abort, not retried in place.
    #[error("No frame available from feed yet")]
    NoFrameAvailable,

    #[error("Frame encode failed: {message}")]
    Encode { message: String },
}

/// Top-level error type for Dualshot operations.
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error(transparent)]
    Hardware(#[from] HardwareError),

    #[error(transparent)]
    Grab(#[from] GrabError),

    #[error("Recording error: {message}")]
    Recording { message: String },

    #[error("Assembly error: {message}")]
    Assembly { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using CaptureError.
pub type CaptureResult<T> = Result<T, CaptureError>;

impl CaptureError {
    pub fn recording(msg: impl Into<String>) -> Self {
        Self::Recording {
            message: msg.into(),
        }
    }

    pub fn assembly(msg: impl Into<String>) -> Self {
        Self::Assembly {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }
}

impl HardwareError {
    pub fn permission_denied(msg: impl Into<String>) -> Self {
        Self::PermissionDenied {
            message: msg.into(),
        }
    }

    pub fn stream(msg: impl Into<String>) -> Self {
        Self::Stream {
            message: msg.into(),
        }
    }
}

impl GrabError {
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode {
            message: msg.into(),
        }
    }
}
