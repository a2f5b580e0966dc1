//! Camera facing directions.

use serde::{Deserialize, Serialize};

/// Which way the active camera points. Exactly one facing is active at any
/// time; a dual capture always pairs one phase per facing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CameraFacing {
    /// World-facing camera.
    Rear,
    /// User-facing (selfie) camera. Stills from this facing are mirrored
    /// to match the self-view preview.
    Front,
}

impl CameraFacing {
    /// The facing used by the second capture phase.
    pub fn opposite(self) -> Self {
        match self {
            Self::Rear => Self::Front,
            Self::Front => Self::Rear,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opposite_alternates() {
        assert_eq!(CameraFacing::Rear.opposite(), CameraFacing::Front);
        assert_eq!(CameraFacing::Front.opposite(), CameraFacing::Rear);
        assert_eq!(CameraFacing::Rear.opposite().opposite(), CameraFacing::Rear);
    }
}
