// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use std::time::Duration;

/// Application directory name, used under the platform config dir
pub const APP_DIR_NAME: &str = "capture-session";

/// Configuration file name inside [`APP_DIR_NAME`]
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Thread names
pub mod threads {
    /// Serial queue owning all session mutation
    pub const SESSION_QUEUE: &str = "capture-session-queue";
    /// Watcher for session runtime faults
    pub const FAULT_WATCHER: &str = "capture-session-faults";
}

/// Zoom limits
pub mod zoom {
    /// No zoom
    pub const MIN_FACTOR: f64 = 1.0;
}

/// Media file extension for movie recordings (without the dot)
pub const VIDEO_EXTENSION: &str = "mp4";

/// Sub-directory used by temporary storage
pub const TEMP_DIR_NAME: &str = "capture-session";

/// Timestamp format for CLI output file names
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Default length of a CLI video recording
pub const DEFAULT_RECORDING_DURATION: Duration = Duration::from_secs(3);

/// Test pattern size produced by the virtual photo output
pub const VIRTUAL_FRAME_WIDTH: u32 = 320;
pub const VIRTUAL_FRAME_HEIGHT: u32 = 240;

/// JPEG quality of virtual photos
pub const VIRTUAL_JPEG_QUALITY: u8 = 90;
