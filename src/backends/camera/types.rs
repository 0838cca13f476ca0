// SPDX-License-Identifier: GPL-3.0-only
// Shared types for camera backend abstraction

//! Shared types for camera backends

use serde::{Deserialize, Serialize};

/// Logical side of the device a camera faces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Position {
    /// Facing the user (selfie camera)
    Front,
    /// Facing away from the user
    #[default]
    Back,
    /// No preference, or a device without a fixed side (external, microphone)
    Unspecified,
}

impl Position {
    /// The camera on the other side, if this position has one
    pub fn opposite(self) -> Option<Self> {
        match self {
            Position::Front => Some(Position::Back),
            Position::Back => Some(Position::Front),
            Position::Unspecified => None,
        }
    }

    /// Whether a device at `other` satisfies a request for this position
    pub fn matches(self, other: Position) -> bool {
        self == Position::Unspecified || self == other
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Position::Front => write!(f, "front"),
            Position::Back => write!(f, "back"),
            Position::Unspecified => write!(f, "unspecified"),
        }
    }
}

/// Flash behaviour for still captures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FlashMode {
    /// Platform decides based on scene brightness
    Auto,
    /// Flash always fires
    On,
    /// Flash never fires
    #[default]
    Off,
}

impl FlashMode {
    /// All modes in cycle order
    pub const ALL: [FlashMode; 3] = [FlashMode::Auto, FlashMode::On, FlashMode::Off];

    /// Cycle to the next mode: Auto -> On -> Off -> Auto
    pub fn next(self) -> Self {
        match self {
            FlashMode::Auto => FlashMode::On,
            FlashMode::On => FlashMode::Off,
            FlashMode::Off => FlashMode::Auto,
        }
    }
}

impl std::fmt::Display for FlashMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FlashMode::Auto => write!(f, "auto"),
            FlashMode::On => write!(f, "on"),
            FlashMode::Off => write!(f, "off"),
        }
    }
}

/// Focus behaviour of a camera
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FocusMode {
    /// Lens position is fixed
    Locked,
    /// Focus once, then lock
    AutoFocus,
    /// Keep refocusing as the scene changes
    ContinuousAutoFocus,
}

/// Exposure behaviour of a camera
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExposureMode {
    Locked,
    AutoExpose,
    ContinuousAutoExposure,
    Custom,
}

/// White balance behaviour of a camera
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WhiteBalanceMode {
    Locked,
    AutoWhiteBalance,
    ContinuousAutoWhiteBalance,
}

/// Point of interest in normalized device coordinates
///
/// `(0, 0)` is the top-left and `(1, 1)` the bottom-right of the sensor in
/// its native (landscape) orientation. Coordinates are always inside that
/// range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DevicePoint {
    x: f64,
    y: f64,
}

impl DevicePoint {
    /// Centre of the frame
    pub const CENTER: DevicePoint = DevicePoint { x: 0.5, y: 0.5 };

    /// Clamp `x` and `y` into the unit square; NaN maps to the centre
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x: if x.is_nan() { 0.5 } else { x.clamp(0.0, 1.0) },
            y: if y.is_nan() { 0.5 } else { y.clamp(0.0, 1.0) },
        }
    }

    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn y(&self) -> f64 {
        self.y
    }
}

impl Default for DevicePoint {
    fn default() -> Self {
        Self::CENTER
    }
}

/// Kind of media a permission or device relates to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaType {
    Video,
    Audio,
}

impl std::fmt::Display for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaType::Video => write!(f, "video"),
            MediaType::Audio => write!(f, "audio"),
        }
    }
}

/// OS-level authorization state for a media type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthorizationStatus {
    /// The user has not been asked yet
    NotDetermined,
    /// Access is blocked by policy (parental controls, MDM)
    Restricted,
    /// The user refused access
    Denied,
    Authorized,
}

/// Quality preset of the capture session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SessionPreset {
    /// Highest still-image quality
    Photo,
    /// Platform default for high quality video
    #[default]
    High,
    Medium,
    Low,
    /// 1280x720 HD
    Hd1280x720,
    /// 1920x1080 Full HD
    Hd1920x1080,
}

impl std::fmt::Display for SessionPreset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionPreset::Photo => write!(f, "photo"),
            SessionPreset::High => write!(f, "high"),
            SessionPreset::Medium => write!(f, "medium"),
            SessionPreset::Low => write!(f, "low"),
            SessionPreset::Hd1280x720 => write!(f, "1280x720"),
            SessionPreset::Hd1920x1080 => write!(f, "1920x1080"),
        }
    }
}

/// Encoded format prepared on the still-image output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PhotoCodec {
    #[default]
    Jpeg,
    Png,
}

impl PhotoCodec {
    /// File extension without the leading dot
    pub fn extension(&self) -> &'static str {
        match self {
            PhotoCodec::Jpeg => "jpg",
            PhotoCodec::Png => "png",
        }
    }
}

/// Orientation written into recorded video
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum VideoOrientation {
    #[default]
    Portrait,
    PortraitUpsideDown,
    LandscapeLeft,
    LandscapeRight,
}

/// Video stabilization requested for a recording connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum StabilizationMode {
    Off,
    Standard,
    #[default]
    Auto,
}

/// Whether a device captures pictures or sound
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceKind {
    Camera,
    Microphone,
}

/// Identity of a capture device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    /// Backend-unique identifier
    pub id: String,
    /// Human-readable name
    pub name: String,
    pub kind: DeviceKind,
    /// Physical side for cameras, `Unspecified` for microphones
    pub position: Position,
}

/// What a device can be configured to do
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceCapabilities {
    pub focus_modes: Vec<FocusMode>,
    pub exposure_modes: Vec<ExposureMode>,
    pub white_balance_modes: Vec<WhiteBalanceMode>,
    pub focus_point_of_interest: bool,
    pub exposure_point_of_interest: bool,
    pub smooth_auto_focus: bool,
    pub has_flash: bool,
    /// Largest zoom factor of the active format (>= 1.0)
    pub max_zoom_factor: f64,
}

impl DeviceCapabilities {
    pub fn supports_focus_mode(&self, mode: FocusMode) -> bool {
        self.focus_modes.contains(&mode)
    }

    pub fn supports_exposure_mode(&self, mode: ExposureMode) -> bool {
        self.exposure_modes.contains(&mode)
    }

    pub fn supports_white_balance_mode(&self, mode: WhiteBalanceMode) -> bool {
        self.white_balance_modes.contains(&mode)
    }

    /// Capabilities of a device that exposes no controls at all
    pub fn none() -> Self {
        Self {
            focus_modes: Vec::new(),
            exposure_modes: Vec::new(),
            white_balance_modes: Vec::new(),
            focus_point_of_interest: false,
            exposure_point_of_interest: false,
            smooth_auto_focus: false,
            has_flash: false,
            max_zoom_factor: 1.0,
        }
    }
}

/// Settings for a single still capture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhotoSettings {
    pub codec: PhotoCodec,
    pub flash_mode: FlashMode,
}

/// What the video connection of a movie output supports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConnectionCapabilities {
    pub orientation: bool,
    pub stabilization: bool,
}

/// Connection settings applied when a recording starts
///
/// `None` leaves the connection default untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RecordingSettings {
    pub orientation: Option<VideoOrientation>,
    pub stabilization: Option<StabilizationMode>,
}

/// Kind of sink attached to a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputKind {
    Photo,
    Movie,
}

/// Fault reported by a running capture session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionRuntimeError {
    /// The platform media daemon restarted; the session stops and must be restarted
    MediaServicesReset,
    /// A device in the session disappeared
    DeviceUnavailable(String),
    Other(String),
}

impl std::fmt::Display for SessionRuntimeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionRuntimeError::MediaServicesReset => write!(f, "Media services were reset"),
            SessionRuntimeError::DeviceUnavailable(id) => write!(f, "Device unavailable: {}", id),
            SessionRuntimeError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

/// Result type for backend operations
pub type BackendResult<T> = Result<T, BackendError>;

/// Error types for backend operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// Backend is not available on this system
    NotAvailable(String),
    /// Device disconnected or otherwise unusable
    DeviceUnavailable(String),
    /// Device configuration lock is held elsewhere
    DeviceBusy(String),
    /// Session refused an input
    InputRejected(String),
    /// Session refused an output
    OutputRejected(String),
    /// Session mutated outside a configuration bracket
    NotConfiguring,
    /// Operation needs a running session
    SessionNotRunning,
    /// Recording already in progress
    RecordingInProgress,
    /// General I/O error
    Io(String),
    /// Other errors
    Other(String),
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendError::NotAvailable(msg) => write!(f, "Backend not available: {}", msg),
            BackendError::DeviceUnavailable(id) => write!(f, "Device unavailable: {}", id),
            BackendError::DeviceBusy(id) => write!(f, "Device is locked: {}", id),
            BackendError::InputRejected(msg) => write!(f, "Input rejected: {}", msg),
            BackendError::OutputRejected(msg) => write!(f, "Output rejected: {}", msg),
            BackendError::NotConfiguring => {
                write!(f, "Session mutated outside of a configuration bracket")
            }
            BackendError::SessionNotRunning => write!(f, "Capture session is not running"),
            BackendError::RecordingInProgress => write!(f, "Recording already in progress"),
            BackendError::Io(msg) => write!(f, "I/O error: {}", msg),
            BackendError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for BackendError {}

impl From<std::io::Error> for BackendError {
    fn from(err: std::io::Error) -> Self {
        BackendError::Io(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flash_mode_cycles_with_period_three() {
        for start in FlashMode::ALL {
            assert_eq!(start.next().next().next(), start);
            assert_ne!(start.next(), start);
        }
        assert_eq!(FlashMode::Auto.next(), FlashMode::On);
        assert_eq!(FlashMode::On.next(), FlashMode::Off);
        assert_eq!(FlashMode::Off.next(), FlashMode::Auto);
    }

    #[test]
    fn opposite_position() {
        assert_eq!(Position::Front.opposite(), Some(Position::Back));
        assert_eq!(Position::Back.opposite(), Some(Position::Front));
        assert_eq!(Position::Unspecified.opposite(), None);
    }

    #[test]
    fn unspecified_matches_any_position() {
        assert!(Position::Unspecified.matches(Position::Front));
        assert!(Position::Unspecified.matches(Position::Back));
        assert!(Position::Front.matches(Position::Front));
        assert!(!Position::Front.matches(Position::Back));
    }

    #[test]
    fn device_point_is_clamped() {
        let point = DevicePoint::new(-1.0, 2.5);
        assert_eq!((point.x(), point.y()), (0.0, 1.0));

        let point = DevicePoint::new(f64::NAN, 0.25);
        assert_eq!((point.x(), point.y()), (0.5, 0.25));
    }
}
