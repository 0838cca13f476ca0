// SPDX-License-Identifier: GPL-3.0-only

//! Virtual camera backend
//!
//! An in-memory platform that behaves like a phone camera stack: a back and a
//! front camera, a microphone, a permission prompt, and a session that
//! enforces the configuration bracket. Photos are real encoded images of a
//! generated test pattern; movie recordings create their target file.
//!
//! Every platform failure the session logic has to survive can be injected
//! through [`VirtualFaults`], and the resulting pipeline can be inspected
//! with [`VirtualBackend::probe`].
//!
//! # Architecture
//!
//! ```text
//!            VirtualBackend (Clone, shared state)
//!                      │
//!      ┌───────────────┼────────────────┐
//!      ▼               ▼                ▼
//! VirtualDevice   VirtualSession   Photo/Movie outputs
//!  (config lock)   (bracket, run)   (oneshot delivery)
//!                      │                │
//!                      └── PipelineState ┘
//! ```

mod device;
mod outputs;
mod session;

pub use device::{DeviceSettings, VirtualDevice};
pub use outputs::{VirtualMovieOutput, VirtualPhotoOutput};

use outputs::{RecordingSlot, abort_recordings};
pub use session::VirtualSession;

use super::types::*;
use super::{
    AccessRequest, CameraBackend, CaptureDevice, CaptureSession, DeviceInput, MovieOutput,
    PhotoOutput,
};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

/// Lock a mutex, recovering the data if a previous holder panicked
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// How the simulated user answers permission prompts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccessAnswer {
    /// Grant access immediately
    #[default]
    Grant,
    /// Deny access immediately
    Deny,
    /// Leave the prompt open until [`VirtualBackend::respond_to_access`]
    Hold,
}

/// Platform failures to simulate
#[derive(Debug, Clone, Default)]
pub struct VirtualFaults {
    /// Camera inputs at these positions are refused by the session
    pub rejected_camera_positions: Vec<Position>,
    /// The session refuses microphone inputs
    pub reject_microphone_input: bool,
    pub reject_photo_output: bool,
    pub reject_movie_output: bool,
    /// Wrapping any device in an input fails
    pub fail_input_creation: bool,
    /// Presets the session cannot use
    pub unsupported_presets: Vec<SessionPreset>,
    /// Still captures complete with an error
    pub fail_photo_capture: bool,
    /// Starting the session fails
    pub fail_start: bool,
}

/// Observable state of the virtual pipeline
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionProbe {
    pub running: bool,
    /// Open configuration brackets
    pub bracket_depth: u32,
    pub inputs: Vec<DeviceInfo>,
    pub outputs: Vec<OutputKind>,
    pub preset: SessionPreset,
    /// Number of stopped -> running transitions
    pub start_count: usize,
    /// Mutations attempted outside a configuration bracket
    pub unbracketed_mutations: usize,
}

impl SessionProbe {
    /// Attached camera inputs
    pub fn cameras(&self) -> Vec<&DeviceInfo> {
        self.inputs
            .iter()
            .filter(|info| info.kind == DeviceKind::Camera)
            .collect()
    }

    /// Attached microphone inputs
    pub fn microphones(&self) -> Vec<&DeviceInfo> {
        self.inputs
            .iter()
            .filter(|info| info.kind == DeviceKind::Microphone)
            .collect()
    }

    /// True when nothing is attached
    pub fn is_unconfigured(&self) -> bool {
        self.inputs.is_empty() && self.outputs.is_empty()
    }
}

/// A finished or in-flight recording request
#[derive(Debug, Clone, PartialEq)]
pub struct RecordingRecord {
    pub path: PathBuf,
    pub settings: RecordingSettings,
}

struct PermissionState {
    video: AuthorizationStatus,
    audio: AuthorizationStatus,
    answer: AccessAnswer,
    pending: Vec<(MediaType, oneshot::Sender<bool>)>,
    prompts: usize,
}

impl PermissionState {
    fn status_mut(&mut self, media: MediaType) -> &mut AuthorizationStatus {
        match media {
            MediaType::Video => &mut self.video,
            MediaType::Audio => &mut self.audio,
        }
    }
}

pub(crate) struct Shared {
    cameras: Vec<Arc<VirtualDevice>>,
    microphone: Option<Arc<VirtualDevice>>,
    faults: Mutex<VirtualFaults>,
    permissions: Mutex<PermissionState>,
    pub(crate) pipeline: Mutex<SessionProbe>,
    runtime_errors: Mutex<Option<mpsc::WeakUnboundedSender<SessionRuntimeError>>>,
    pub(crate) captures: Mutex<Vec<PhotoSettings>>,
    pub(crate) recordings: Mutex<Vec<RecordingRecord>>,
    pub(crate) movie_outputs: Mutex<Vec<Weak<RecordingSlot>>>,
}

impl Shared {
    pub(crate) fn faults(&self) -> VirtualFaults {
        lock(&self.faults).clone()
    }
}

/// Builder for [`VirtualBackend`]
#[derive(Debug, Clone)]
pub struct VirtualBackendBuilder {
    cameras: Vec<CameraEntry>,
    microphone: bool,
    video: AuthorizationStatus,
    audio: AuthorizationStatus,
    answer: AccessAnswer,
    faults: VirtualFaults,
}

#[derive(Debug, Clone)]
struct CameraEntry {
    position: Position,
    capabilities: Option<DeviceCapabilities>,
}

impl Default for VirtualBackendBuilder {
    fn default() -> Self {
        Self {
            cameras: Vec::new(),
            microphone: false,
            video: AuthorizationStatus::Authorized,
            audio: AuthorizationStatus::Authorized,
            answer: AccessAnswer::default(),
            faults: VirtualFaults::default(),
        }
    }
}

impl VirtualBackendBuilder {
    /// Add a camera with the default controls for its position
    pub fn camera(mut self, position: Position) -> Self {
        self.cameras.push(CameraEntry {
            position,
            capabilities: None,
        });
        self
    }

    /// Add a camera with explicit capabilities
    pub fn camera_with(mut self, position: Position, capabilities: DeviceCapabilities) -> Self {
        self.cameras.push(CameraEntry {
            position,
            capabilities: Some(capabilities),
        });
        self
    }

    pub fn microphone(mut self, present: bool) -> Self {
        self.microphone = present;
        self
    }

    /// Initial authorization for a media type
    pub fn authorization(mut self, media: MediaType, status: AuthorizationStatus) -> Self {
        match media {
            MediaType::Video => self.video = status,
            MediaType::Audio => self.audio = status,
        }
        self
    }

    pub fn access_answer(mut self, answer: AccessAnswer) -> Self {
        self.answer = answer;
        self
    }

    pub fn faults(mut self, faults: VirtualFaults) -> Self {
        self.faults = faults;
        self
    }

    pub fn build(self) -> VirtualBackend {
        let cameras = self
            .cameras
            .iter()
            .enumerate()
            .map(|(index, entry)| {
                let device = match &entry.capabilities {
                    Some(capabilities) => {
                        VirtualDevice::camera_with(entry.position, index, capabilities.clone())
                    }
                    None => VirtualDevice::camera(entry.position, index),
                };
                Arc::new(device)
            })
            .collect::<Vec<_>>();

        info!(
            cameras = cameras.len(),
            microphone = self.microphone,
            "Creating virtual camera backend"
        );

        VirtualBackend {
            shared: Arc::new(Shared {
                cameras,
                microphone: self.microphone.then(|| Arc::new(VirtualDevice::microphone())),
                faults: Mutex::new(self.faults),
                permissions: Mutex::new(PermissionState {
                    video: self.video,
                    audio: self.audio,
                    answer: self.answer,
                    pending: Vec::new(),
                    prompts: 0,
                }),
                pipeline: Mutex::new(SessionProbe::default()),
                runtime_errors: Mutex::new(None),
                captures: Mutex::new(Vec::new()),
                recordings: Mutex::new(Vec::new()),
                movie_outputs: Mutex::new(Vec::new()),
            }),
        }
    }
}

/// In-memory camera platform
///
/// Cloning shares the same devices, permissions and pipeline, so a test can
/// keep a handle for inspection after handing one to the session.
#[derive(Clone)]
pub struct VirtualBackend {
    shared: Arc<Shared>,
}

impl VirtualBackend {
    pub fn builder() -> VirtualBackendBuilder {
        VirtualBackendBuilder::default()
    }

    /// Back camera, front camera and microphone, all authorized
    pub fn with_default_devices() -> Self {
        Self::builder()
            .camera(Position::Back)
            .camera(Position::Front)
            .microphone(true)
            .build()
    }

    /// Current pipeline state
    pub fn probe(&self) -> SessionProbe {
        lock(&self.shared.pipeline).clone()
    }

    /// First camera at `position`
    pub fn camera(&self, position: Position) -> Option<Arc<VirtualDevice>> {
        self.shared
            .cameras
            .iter()
            .find(|camera| camera.info().position == position)
            .cloned()
    }

    pub fn cameras(&self) -> &[Arc<VirtualDevice>] {
        &self.shared.cameras
    }

    pub fn microphone(&self) -> Option<Arc<VirtualDevice>> {
        self.shared.microphone.clone()
    }

    /// Change the injected faults
    pub fn update_faults(&self, update: impl FnOnce(&mut VirtualFaults)) {
        update(&mut lock(&self.shared.faults));
    }

    /// Answer every open permission prompt
    ///
    /// Returns the number of prompts answered.
    pub fn respond_to_access(&self, granted: bool) -> usize {
        let pending = {
            let mut permissions = lock(&self.shared.permissions);
            let pending = std::mem::take(&mut permissions.pending);
            for (media, _) in &pending {
                *permissions.status_mut(*media) = if granted {
                    AuthorizationStatus::Authorized
                } else {
                    AuthorizationStatus::Denied
                };
            }
            pending
        };

        let answered = pending.len();
        for (media, sender) in pending {
            debug!(%media, granted, "Answering permission prompt");
            let _ = sender.send(granted);
        }
        answered
    }

    /// Prompts waiting for an answer
    pub fn pending_prompts(&self) -> usize {
        lock(&self.shared.permissions).pending.len()
    }

    /// Prompts shown so far
    pub fn prompt_count(&self) -> usize {
        lock(&self.shared.permissions).prompts
    }

    /// Deliver a runtime fault to the session
    ///
    /// A media-services reset stops the pipeline first, as the platform does,
    /// aborting any recording in progress. Returns false when no session is
    /// listening.
    pub fn inject_runtime_error(&self, error: SessionRuntimeError) -> bool {
        if error == SessionRuntimeError::MediaServicesReset {
            lock(&self.shared.pipeline).running = false;
            abort_recordings(&self.shared, &BackendError::SessionNotRunning);
        }

        let sender = lock(&self.shared.runtime_errors)
            .as_ref()
            .and_then(|weak| weak.upgrade());
        match sender {
            Some(sender) => sender.send(error).is_ok(),
            None => false,
        }
    }

    /// Settings of every still capture requested so far
    pub fn photo_captures(&self) -> Vec<PhotoSettings> {
        lock(&self.shared.captures).clone()
    }

    /// Every recording started so far
    pub fn recordings(&self) -> Vec<RecordingRecord> {
        lock(&self.shared.recordings).clone()
    }
}

impl CameraBackend for VirtualBackend {
    fn authorization_status(&self, media: MediaType) -> AuthorizationStatus {
        *lock(&self.shared.permissions).status_mut(media)
    }

    fn request_access(&self, media: MediaType) -> AccessRequest {
        let (sender, receiver) = oneshot::channel();
        let mut permissions = lock(&self.shared.permissions);
        permissions.prompts += 1;

        match permissions.answer {
            AccessAnswer::Grant => {
                *permissions.status_mut(media) = AuthorizationStatus::Authorized;
                let _ = sender.send(true);
            }
            AccessAnswer::Deny => {
                *permissions.status_mut(media) = AuthorizationStatus::Denied;
                let _ = sender.send(false);
            }
            AccessAnswer::Hold => {
                debug!(%media, "Holding permission prompt open");
                permissions.pending.push((media, sender));
            }
        }

        receiver
    }

    fn discover_cameras(&self, position: Position) -> Vec<Arc<dyn CaptureDevice>> {
        self.shared
            .cameras
            .iter()
            .filter(|camera| position.matches(camera.info().position))
            .map(|camera| Arc::clone(camera) as Arc<dyn CaptureDevice>)
            .collect()
    }

    fn default_microphone(&self) -> Option<Arc<dyn CaptureDevice>> {
        self.shared
            .microphone
            .as_ref()
            .map(|mic| Arc::clone(mic) as Arc<dyn CaptureDevice>)
    }

    fn create_session(&self) -> Box<dyn CaptureSession> {
        let (sender, receiver) = mpsc::unbounded_channel();
        *lock(&self.shared.runtime_errors) = Some(sender.downgrade());
        *lock(&self.shared.pipeline) = SessionProbe::default();

        Box::new(VirtualSession::new(
            Arc::clone(&self.shared),
            sender,
            receiver,
        ))
    }

    fn create_input(&self, device: Arc<dyn CaptureDevice>) -> BackendResult<DeviceInput> {
        if self.shared.faults().fail_input_creation {
            return Err(BackendError::DeviceUnavailable(device.info().id));
        }
        Ok(DeviceInput::new(device))
    }

    fn create_photo_output(&self) -> Arc<dyn PhotoOutput> {
        Arc::new(VirtualPhotoOutput::new(Arc::clone(&self.shared)))
    }

    fn create_movie_output(&self) -> Arc<dyn MovieOutput> {
        Arc::new(VirtualMovieOutput::new(Arc::clone(&self.shared)))
    }
}

impl std::fmt::Debug for VirtualBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VirtualBackend")
            .field("cameras", &self.shared.cameras.len())
            .field("microphone", &self.shared.microphone.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discovery_filters_by_position() {
        let backend = VirtualBackend::with_default_devices();

        let front = backend.discover_cameras(Position::Front);
        assert_eq!(front.len(), 1);
        assert_eq!(front[0].info().position, Position::Front);

        assert_eq!(backend.discover_cameras(Position::Unspecified).len(), 2);
        assert!(backend.default_microphone().is_some());
    }

    #[test]
    fn held_prompt_resolves_on_response() {
        let backend = VirtualBackend::builder()
            .camera(Position::Back)
            .authorization(MediaType::Video, AuthorizationStatus::NotDetermined)
            .access_answer(AccessAnswer::Hold)
            .build();

        let mut request = backend.request_access(MediaType::Video);
        assert!(request.try_recv().is_err());
        assert_eq!(backend.pending_prompts(), 1);

        assert_eq!(backend.respond_to_access(false), 1);
        assert_eq!(request.try_recv(), Ok(false));
        assert_eq!(
            backend.authorization_status(MediaType::Video),
            AuthorizationStatus::Denied
        );
    }

    #[test]
    fn immediate_grant_updates_status() {
        let backend = VirtualBackend::builder()
            .authorization(MediaType::Audio, AuthorizationStatus::NotDetermined)
            .build();

        let mut request = backend.request_access(MediaType::Audio);
        assert_eq!(request.try_recv(), Ok(true));
        assert_eq!(
            backend.authorization_status(MediaType::Audio),
            AuthorizationStatus::Authorized
        );
        assert_eq!(backend.prompt_count(), 1);
    }

    #[test]
    fn input_creation_fault() {
        let backend = VirtualBackend::with_default_devices();
        backend.update_faults(|faults| faults.fail_input_creation = true);

        let camera = backend.discover_cameras(Position::Back).remove(0);
        assert!(matches!(
            backend.create_input(camera),
            Err(BackendError::DeviceUnavailable(_))
        ));
    }
}
