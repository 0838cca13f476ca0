// SPDX-License-Identifier: GPL-3.0-only

//! Persisted session configuration

use crate::backends::camera::{
    FlashMode, PhotoCodec, Position, SessionPreset, StabilizationMode, VideoOrientation,
};
use crate::constants::{APP_DIR_NAME, CONFIG_FILE_NAME};
use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Capture session settings
///
/// Missing fields in a stored file fall back to their defaults, so older
/// files keep loading after new settings are added.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Camera side used by `prepare` when the caller has no preference
    pub initial_position: Position,
    /// Flash mode the session starts with
    pub flash_mode: FlashMode,
    /// Quality preset requested at the end of configuration
    pub session_preset: SessionPreset,
    /// Format prepared on the still-image output
    pub photo_codec: PhotoCodec,
    /// Orientation written into recordings
    pub video_orientation: VideoOrientation,
    /// Stabilization requested for recordings
    pub stabilization: StabilizationMode,
    /// Attach the default microphone for recording sound
    pub request_microphone: bool,
    /// Photo directory (platform picture dir when unset)
    pub photos_dir: Option<PathBuf>,
    /// Video directory (platform video dir when unset)
    pub videos_dir: Option<PathBuf>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            initial_position: Position::Back,
            flash_mode: FlashMode::Off,
            session_preset: SessionPreset::Hd1280x720,
            photo_codec: PhotoCodec::Jpeg,
            video_orientation: VideoOrientation::Portrait,
            stabilization: StabilizationMode::Auto,
            request_microphone: true,
            photos_dir: None,
            videos_dir: None,
        }
    }
}

impl SessionConfig {
    /// Default location of the configuration file
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Load from the default location, falling back to defaults
    pub fn load() -> Self {
        let Some(path) = Self::default_path() else {
            debug!("No config directory on this platform, using defaults");
            return Self::default();
        };

        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Self::default();
        }

        match Self::load_from(&path) {
            Ok(config) => config,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to load config, using defaults");
                Self::default()
            }
        }
    }

    /// Load from an explicit file
    pub fn load_from(path: &Path) -> AppResult<Self> {
        let data = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&data)?;
        debug!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    /// Write to an explicit file, creating parent directories
    pub fn save_to(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_string_pretty(self)?;
        std::fs::write(path, data)?;
        debug!(path = %path.display(), "Saved config");
        Ok(())
    }

    /// Write to the default location
    pub fn save(&self) -> AppResult<()> {
        let path = Self::default_path()
            .ok_or_else(|| AppError::Config("no config directory available".to_string()))?;
        self.save_to(&path)
    }
}
