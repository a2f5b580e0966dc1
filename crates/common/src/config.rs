//! Application configuration.
//!
//! Capture timing (hold threshold, settle delay, recording bounds) is fixed
//! system configuration: the engine reads it once at construction and never
//! re-tunes it per call.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Global application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Capture engine settings.
    pub engine: EngineConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Fixed capture-engine parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Live feed constraints.
    pub feed: FeedConfig,

    /// Press duration that turns a tap into a hold (ms).
    pub hold_threshold_ms: u64,

    /// Wait after a facing switch before phase 2 starts (ms). Conservative
    /// fixed bound; facing switches report ready before exposure settles.
    pub settle_delay_ms: u64,

    /// Maximum primary recording duration (ms).
    pub primary_clip_ms: u64,

    /// Maximum secondary recording duration (ms).
    pub secondary_clip_ms: u64,
}

/// Constraints requested for every hardware feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Target feed width in pixels.
    pub width: u32,

    /// Target feed height in pixels.
    pub height: u32,

    /// Whether to request audio tracks alongside video.
    pub audio: bool,

    /// JPEG quality for still grabs (1-100).
    pub jpeg_quality: u8,

    /// Device path for the rear camera (GStreamer backend).
    pub rear_device: Option<String>,

    /// Device path for the front camera (GStreamer backend).
    pub front_device: Option<String>,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "dualshot=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,
}

impl EngineConfig {
    pub fn hold_threshold(&self) -> Duration {
        Duration::from_millis(self.hold_threshold_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn primary_clip_bound(&self) -> Duration {
        Duration::from_millis(self.primary_clip_ms)
    }

    pub fn secondary_clip_bound(&self) -> Duration {
        Duration::from_millis(self.secondary_clip_ms)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            feed: FeedConfig::default(),
            hold_threshold_ms: 300,
            settle_delay_ms: 1500,
            primary_clip_ms: 5000,
            secondary_clip_ms: 3000,
        }
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            audio: true,
            jpeg_quality: 85,
            rear_device: None,
            front_device: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        let config_path = config_file_path();
        if config_path.exists() {
            match std::fs::read_to_string(&config_path) {
                Ok(content) => match serde_json::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        tracing::warn!("Failed to parse config at {:?}: {}", config_path, e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }

    /// Save config to the standard location.
    pub fn save(&self) -> Result<(), std::io::Error> {
        let config_path = config_file_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(config_path, json)
    }
}

/// Standard config file location.
fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("dualshot").join("config.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_timings() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.hold_threshold(), Duration::from_millis(300));
        assert_eq!(cfg.settle_delay(), Duration::from_millis(1500));
        assert_eq!(cfg.primary_clip_bound(), Duration::from_secs(5));
        assert_eq!(cfg.secondary_clip_bound(), Duration::from_secs(3));
    }

    #[test]
    fn config_round_trips_through_json() {
        let cfg = AppConfig::default();
        let json = serde_json::to_string(&cfg).unwrap();
        let back: AppConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.engine.settle_delay_ms, cfg.engine.settle_delay_ms);
        assert_eq!(back.engine.feed.width, cfg.engine.feed.width);
        assert_eq!(back.logging.level, cfg.logging.level);
    }
}
