// SPDX-License-Identifier: GPL-3.0-only

//! Mutable session record and its published snapshot

use crate::backends::camera::{
    CaptureDevice, CaptureSession, DeviceInfo, DeviceInput, FlashMode, MovieOutput, PhotoOutput,
    Position,
};
use crate::constants::zoom;
use crate::errors::CameraError;
use std::sync::Arc;

/// Whether the session may be started
///
/// Keeps "the user said no" apart from "the hardware said no" so callers can
/// choose between pointing at the privacy settings and a generic failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionStatus {
    /// Access has not been checked yet
    #[default]
    Undetermined,
    Authorized,
    NotAuthorized,
    ConfigurationFailed,
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionStatus::Undetermined => write!(f, "undetermined"),
            SessionStatus::Authorized => write!(f, "authorized"),
            SessionStatus::NotAuthorized => write!(f, "not authorized"),
            SessionStatus::ConfigurationFailed => write!(f, "configuration failed"),
        }
    }
}

/// Progress of the one-time setup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SetupPhase {
    #[default]
    Unconfigured,
    /// Waiting for the camera authorization, possibly on the user
    CheckingAccess,
    /// Inside the configuration bracket
    Configuring,
    /// Inputs and outputs attached
    Ready,
    /// A wiring step failed; nothing is attached
    Failed,
    /// Camera access was refused
    AccessDenied,
}

/// Pinch zoom bookkeeping
///
/// `pending` follows the gesture, `committed` is the base the next gesture
/// multiplies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomState {
    pub committed: f64,
    pub pending: f64,
}

impl Default for ZoomState {
    fn default() -> Self {
        Self {
            committed: zoom::MIN_FACTOR,
            pending: zoom::MIN_FACTOR,
        }
    }
}

impl ZoomState {
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Read-only view of the session, published after every queued job
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub status: SessionStatus,
    pub phase: SetupPhase,
    /// Side of the attached camera, `None` without a camera input
    pub position: Option<Position>,
    pub flash_mode: FlashMode,
    pub running: bool,
    pub recording: bool,
    /// The attached camera
    pub device: Option<DeviceInfo>,
    pub zoom_factor: f64,
    pub has_microphone: bool,
    /// Why the last configuration attempt failed
    pub setup_error: Option<CameraError>,
}

/// Everything the session is made of
///
/// Owned by the serial queue; only code running on that queue touches it.
pub struct CaptureComponents {
    pub(crate) session: Box<dyn CaptureSession>,
    pub(crate) camera_input: Option<DeviceInput>,
    pub(crate) microphone_input: Option<DeviceInput>,
    pub(crate) photo_output: Option<Arc<dyn PhotoOutput>>,
    pub(crate) movie_output: Option<Arc<dyn MovieOutput>>,
    pub(crate) position: Position,
    pub(crate) flash_mode: FlashMode,
    pub(crate) status: SessionStatus,
    pub(crate) phase: SetupPhase,
    /// Whether the last caller request was start rather than stop
    pub(crate) wants_running: bool,
    pub(crate) zoom: ZoomState,
    pub(crate) setup_error: Option<CameraError>,
}

impl CaptureComponents {
    pub fn new(session: Box<dyn CaptureSession>, flash_mode: FlashMode) -> Self {
        Self {
            session,
            camera_input: None,
            microphone_input: None,
            photo_output: None,
            movie_output: None,
            position: Position::Unspecified,
            flash_mode,
            status: SessionStatus::Undetermined,
            phase: SetupPhase::Unconfigured,
            wants_running: false,
            zoom: ZoomState::default(),
            setup_error: None,
        }
    }

    /// The attached camera device
    pub fn active_device(&self) -> Option<&Arc<dyn CaptureDevice>> {
        self.camera_input.as_ref().map(DeviceInput::device)
    }

    /// Side of the attached camera
    pub fn position(&self) -> Option<Position> {
        self.camera_input.as_ref().map(|_| self.position)
    }

    pub fn is_running(&self) -> bool {
        self.session.is_running()
    }

    pub fn is_recording(&self) -> bool {
        self.movie_output
            .as_ref()
            .is_some_and(|movie| movie.is_recording())
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            status: self.status,
            phase: self.phase,
            position: self.position(),
            flash_mode: self.flash_mode,
            running: self.is_running(),
            recording: self.is_recording(),
            device: self.camera_input.as_ref().map(|input| input.info().clone()),
            zoom_factor: self.zoom.pending,
            has_microphone: self.microphone_input.is_some(),
            setup_error: self.setup_error.clone(),
        }
    }
}

impl std::fmt::Debug for CaptureComponents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureComponents")
            .field("camera_input", &self.camera_input)
            .field("microphone_input", &self.microphone_input)
            .field("photo_output", &self.photo_output.is_some())
            .field("movie_output", &self.movie_output.is_some())
            .field("position", &self.position)
            .field("flash_mode", &self.flash_mode)
            .field("status", &self.status)
            .field("phase", &self.phase)
            .field("setup_error", &self.setup_error)
            .finish()
    }
}
