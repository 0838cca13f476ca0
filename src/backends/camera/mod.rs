// SPDX-License-Identifier: GPL-3.0-only

//! Camera backend abstraction
//!
//! This module defines the platform boundary the capture session is built on:
//! permission queries, device discovery, the live capture pipeline and its
//! photo/movie sinks.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────┐
//! │   CaptureManager    │  ← Serial queue, single owner of session state
//! └──────────┬──────────┘
//!            │
//!            ▼
//! ┌─────────────────────┐
//! │ CameraBackend Trait │  ← Permissions, discovery, object factories
//! └──────────┬──────────┘
//!            │
//!            ▼
//!  ┌──────────────────┐
//!  │  VirtualBackend  │  ← In-memory implementation
//!  └──────────────────┘
//! ```
//!
//! Hardware callbacks (photo bytes, finished movie files, permission answers)
//! are delivered through `tokio::sync::oneshot` channels, so each one fires at
//! most once and a dropped sender is observable by the receiver.

pub mod types;
pub mod virtual_camera;

pub use types::*;
pub use virtual_camera::VirtualBackend;

use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

/// Pending answer to a permission prompt
pub type AccessRequest = oneshot::Receiver<bool>;

/// Pending still capture: encoded image bytes or an error
pub type PendingPhoto = oneshot::Receiver<BackendResult<Vec<u8>>>;

/// Pending movie file: location of the finished file or an error
pub type PendingMovie = oneshot::Receiver<BackendResult<PathBuf>>;

/// Stream of runtime faults reported by a session
pub type RuntimeErrorReceiver = mpsc::UnboundedReceiver<SessionRuntimeError>;

/// Platform entry point
///
/// Implementations answer permission queries, enumerate devices and build the
/// pipeline objects. They never attach anything to a session themselves.
pub trait CameraBackend: Send + Sync {
    // ===== Permissions =====

    /// Current authorization for a media type
    fn authorization_status(&self, media: MediaType) -> AuthorizationStatus;

    /// Prompt the user for access
    ///
    /// The receiver resolves once the user answers. Dropping the sender without
    /// an answer means the prompt was dismissed.
    fn request_access(&self, media: MediaType) -> AccessRequest;

    // ===== Enumeration =====

    /// Wide-angle cameras at `position` (`Unspecified` returns every camera)
    fn discover_cameras(&self, position: Position) -> Vec<Arc<dyn CaptureDevice>>;

    /// Default audio capture device, if any
    fn default_microphone(&self) -> Option<Arc<dyn CaptureDevice>>;

    // ===== Factories =====

    /// Create an empty, stopped capture session
    fn create_session(&self) -> Box<dyn CaptureSession>;

    /// Wrap a device so it can be attached to a session
    fn create_input(&self, device: Arc<dyn CaptureDevice>) -> BackendResult<DeviceInput>;

    fn create_photo_output(&self) -> Arc<dyn PhotoOutput>;

    fn create_movie_output(&self) -> Arc<dyn MovieOutput>;
}

/// A physical capture device (camera or microphone)
pub trait CaptureDevice: Send + Sync + std::fmt::Debug {
    fn info(&self) -> DeviceInfo;

    fn capabilities(&self) -> DeviceCapabilities;

    /// Acquire the exclusive configuration lock
    ///
    /// The lock is released when the returned guard is dropped. Fails if the
    /// device became unavailable or another holder has the lock.
    fn lock_for_configuration(&self) -> BackendResult<Box<dyn DeviceConfiguration + '_>>;
}

/// Setters available while holding a device configuration lock
///
/// Callers check [`DeviceCapabilities`] first; implementations may ignore
/// values the device does not support.
pub trait DeviceConfiguration {
    fn set_focus_mode(&mut self, mode: FocusMode);
    fn set_focus_point_of_interest(&mut self, point: DevicePoint);
    fn set_exposure_mode(&mut self, mode: ExposureMode);
    fn set_exposure_point_of_interest(&mut self, point: DevicePoint);
    fn set_white_balance_mode(&mut self, mode: WhiteBalanceMode);
    fn set_subject_area_change_monitoring(&mut self, enabled: bool);
    fn set_smooth_auto_focus(&mut self, enabled: bool);
    fn set_zoom_factor(&mut self, factor: f64);
}

/// A device wired for attachment to a session
///
/// Inputs are replaced, never mutated: switching cameras builds a new input.
#[derive(Clone)]
pub struct DeviceInput {
    device: Arc<dyn CaptureDevice>,
    info: DeviceInfo,
}

impl DeviceInput {
    pub fn new(device: Arc<dyn CaptureDevice>) -> Self {
        let info = device.info();
        Self { device, info }
    }

    pub fn device(&self) -> &Arc<dyn CaptureDevice> {
        &self.device
    }

    pub fn info(&self) -> &DeviceInfo {
        &self.info
    }

    pub fn id(&self) -> &str {
        &self.info.id
    }

    pub fn kind(&self) -> DeviceKind {
        self.info.kind
    }
}

impl std::fmt::Debug for DeviceInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceInput")
            .field("id", &self.info.id)
            .field("kind", &self.info.kind)
            .field("position", &self.info.position)
            .finish()
    }
}

/// A sink attached to a session
#[derive(Clone)]
pub enum SessionOutput {
    Photo(Arc<dyn PhotoOutput>),
    Movie(Arc<dyn MovieOutput>),
}

impl SessionOutput {
    pub fn kind(&self) -> OutputKind {
        match self {
            SessionOutput::Photo(_) => OutputKind::Photo,
            SessionOutput::Movie(_) => OutputKind::Movie,
        }
    }
}

impl std::fmt::Debug for SessionOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SessionOutput::{:?}", self.kind())
    }
}

/// The live pipeline connecting inputs to outputs
///
/// Adding or removing inputs and outputs is only valid between
/// [`begin_configuration`](Self::begin_configuration) and
/// [`commit_configuration`](Self::commit_configuration).
pub trait CaptureSession: Send {
    // ===== Configuration bracket =====

    fn begin_configuration(&mut self);
    fn commit_configuration(&mut self);

    // ===== Inputs =====

    fn can_add_input(&self, input: &DeviceInput) -> bool;
    fn add_input(&mut self, input: &DeviceInput) -> BackendResult<()>;
    fn remove_input(&mut self, input: &DeviceInput);

    // ===== Outputs =====

    fn can_add_output(&self, output: &SessionOutput) -> bool;
    fn add_output(&mut self, output: &SessionOutput) -> BackendResult<()>;
    fn remove_output(&mut self, output: &SessionOutput);

    // ===== Preset =====

    fn can_set_preset(&self, preset: SessionPreset) -> bool;
    fn set_preset(&mut self, preset: SessionPreset);
    fn preset(&self) -> SessionPreset;

    // ===== Running state =====

    fn start_running(&mut self) -> BackendResult<()>;
    fn stop_running(&mut self);
    fn is_running(&self) -> bool;

    /// Take the runtime fault stream
    ///
    /// Returns `None` after the first call.
    fn runtime_errors(&mut self) -> Option<RuntimeErrorReceiver>;
}

/// Still-image sink
pub trait PhotoOutput: Send + Sync {
    /// Format prepared in advance so the first capture is fast
    fn set_prepared_codec(&self, codec: PhotoCodec);

    fn supported_flash_modes(&self) -> Vec<FlashMode>;

    /// Issue an asynchronous capture
    fn capture_photo(&self, settings: PhotoSettings) -> PendingPhoto;
}

/// Movie-file sink
pub trait MovieOutput: Send + Sync {
    /// The video connection, present once a camera feeds this output
    fn video_connection(&self) -> Option<ConnectionCapabilities>;

    fn is_recording(&self) -> bool;

    /// Start writing to `path`
    ///
    /// The receiver resolves once the recording is finished by
    /// [`stop_recording`](Self::stop_recording) or aborted by a fault.
    fn start_recording(&self, path: PathBuf, settings: RecordingSettings) -> PendingMovie;

    fn stop_recording(&self);
}
