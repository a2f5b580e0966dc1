//! Hardware session ownership.
//!
//! The single most severe bug class this module exists to prevent is a
//! leaked hardware handle: two feeds live at once after a facing switch, or
//! a feed left running on a cancel/error path. The manager therefore owns
//! the one active [`HardwareSession`] exclusively, releases it before any
//! new acquisition, and ties track shutdown to `Drop` so every exit path
//! (success, cancel, error, teardown) stops the hardware.

use std::time::Instant;

use dualshot_common::config::FeedConfig;
use dualshot_common::error::HardwareError;
use dualshot_common::facing::CameraFacing;

use crate::{CameraBackend, CameraFeed};

/// An owned, live camera feed bound to one facing direction.
pub struct HardwareSession {
    facing: CameraFacing,
    feed: Box<dyn CameraFeed>,
    acquired_at: Instant,
}

impl HardwareSession {
    fn new(facing: CameraFacing, feed: Box<dyn CameraFeed>) -> Self {
        Self {
            facing,
            feed,
            acquired_at: Instant::now(),
        }
    }

    /// The facing direction this session was acquired for.
    pub fn facing(&self) -> CameraFacing {
        self.facing
    }

    /// When the session was acquired.
    pub fn acquired_at(&self) -> Instant {
        self.acquired_at
    }

    /// Mutable access to the live feed for capture operations.
    pub fn feed_mut(&mut self) -> &mut dyn CameraFeed {
        self.feed.as_mut()
    }
}

impl Drop for HardwareSession {
    fn drop(&mut self) {
        self.feed.stop();
    }
}

impl std::fmt::Debug for HardwareSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HardwareSession")
            .field("facing", &self.facing)
            .field("acquired_at", &self.acquired_at)
            .finish_non_exhaustive()
    }
}

/// Owns at most one active hardware session at a time.
pub struct SessionManager {
    backend: Box<dyn CameraBackend>,
    feed_config: FeedConfig,
    active: Option<HardwareSession>,
}

impl SessionManager {
    /// Create a manager with fixed feed constraints. The constraints are
    /// configuration, not per-call parameters.
    pub fn new(backend: Box<dyn CameraBackend>, feed_config: FeedConfig) -> Self {
        Self {
            backend,
            feed_config,
            active: None,
        }
    }

    /// Acquire a live feed for the requested facing direction.
    ///
    /// Any previously held session is fully released before the new feed
    /// goes live. On failure the manager holds no session.
    pub async fn acquire(
        &mut self,
        facing: CameraFacing,
    ) -> Result<&mut HardwareSession, HardwareError> {
        self.release();

        let feed = self.backend.open(facing, &self.feed_config).await?;
        tracing::info!(?facing, backend = %self.backend.name(), "Camera session acquired");
        Ok(self.active.insert(HardwareSession::new(facing, feed)))
    }

    /// Release the active session, stopping all hardware tracks. No-op if
    /// no session is held.
    pub fn release(&mut self) {
        if let Some(session) = self.active.take() {
            tracing::info!(
                facing = ?session.facing(),
                held_ms = session.acquired_at().elapsed().as_millis() as u64,
                "Camera session released"
            );
        }
    }

    /// The active session, if any.
    pub fn active_mut(&mut self) -> Option<&mut HardwareSession> {
        self.active.as_mut()
    }

    /// Facing of the active session, if any.
    pub fn active_facing(&self) -> Option<CameraFacing> {
        self.active.as_ref().map(|s| s.facing())
    }

    /// Whether a session is currently open.
    pub fn has_session(&self) -> bool {
        self.active.is_some()
    }

    /// Toggle the torch on the active session's device.
    ///
    /// Unsupported hardware is a no-op, never a hard error.
    pub fn set_torch(&mut self, on: bool) {
        let Some(session) = self.active.as_mut() else {
            return;
        };
        match session.feed.set_torch(on) {
            Ok(()) => tracing::debug!(on, "Torch toggled"),
            Err(e) => tracing::debug!(on, error = %e, "Torch not honored, ignoring"),
        }
    }
}

impl Drop for SessionManager {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synthetic::SyntheticBackend;

    fn manager_with(backend: SyntheticBackend) -> SessionManager {
        SessionManager::new(Box::new(backend), FeedConfig::default())
    }

    #[tokio::test]
    async fn acquire_releases_previous_session_first() {
        let backend = SyntheticBackend::new();
        let probe = backend.probe();
        let mut manager = manager_with(backend);

        manager.acquire(CameraFacing::Rear).await.unwrap();
        assert_eq!(probe.live_feeds(), 1);

        manager.acquire(CameraFacing::Front).await.unwrap();
        assert_eq!(probe.live_feeds(), 1, "only one feed may be live");
        assert_eq!(probe.releases(), 1);
        assert_eq!(manager.active_facing(), Some(CameraFacing::Front));
    }

    #[tokio::test]
    async fn permission_denied_leaves_no_session() {
        let backend = SyntheticBackend::new().deny_permission();
        let probe = backend.probe();
        let mut manager = manager_with(backend);

        let err = manager.acquire(CameraFacing::Rear).await.unwrap_err();
        assert!(matches!(err, HardwareError::PermissionDenied { .. }));
        assert!(!manager.has_session());
        assert_eq!(probe.live_feeds(), 0);
    }

    #[tokio::test]
    async fn missing_facing_is_no_device() {
        let backend = SyntheticBackend::new().without_facing(CameraFacing::Front);
        let mut manager = manager_with(backend);

        manager.acquire(CameraFacing::Rear).await.unwrap();
        let err = manager.acquire(CameraFacing::Front).await.unwrap_err();
        assert!(matches!(
            err,
            HardwareError::NoDevice {
                facing: CameraFacing::Front
            }
        ));
        // The old session was released before the failed open.
        assert!(!manager.has_session());
    }

    #[tokio::test]
    async fn torch_unsupported_is_swallowed() {
        let backend = SyntheticBackend::new().without_torch();
        let mut manager = manager_with(backend);

        manager.acquire(CameraFacing::Rear).await.unwrap();
        manager.set_torch(true);
        assert!(manager.has_session());
    }

    #[tokio::test]
    async fn drop_releases_hardware() {
        let backend = SyntheticBackend::new();
        let probe = backend.probe();
        {
            let mut manager = manager_with(backend);
            manager.acquire(CameraFacing::Rear).await.unwrap();
            assert_eq!(probe.live_feeds(), 1);
        }
        assert_eq!(probe.live_feeds(), 0);
    }
}
