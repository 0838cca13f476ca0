// SPDX-License-Identifier: GPL-3.0-only

//! Permission checks and session wiring
//!
//! # Setup
//!
//! ```text
//! Unconfigured ──► CheckingAccess ──denied──► AccessDenied
//!                        │
//!                     granted
//!                        ▼
//!                   Configuring ──step fails──► Failed (rolled back)
//!                        │
//!                        ▼
//!                      Ready
//! ```
//!
//! Configuring runs inside one begin/commit bracket:
//!
//! 1. resolve the camera
//! 2. attach the camera input
//! 3. attach the photo output
//! 4. attach the microphone input (when present and allowed)
//! 5. attach the movie output
//! 6. raise the session preset if the session accepts it

use super::components::{CaptureComponents, SessionStatus, SetupPhase};
use super::registry::DeviceRegistry;
use crate::backends::camera::{
    AuthorizationStatus, CameraBackend, DevicePoint, ExposureMode, FocusMode, MediaType,
    Position, SessionOutput, SessionRuntimeError,
};
use crate::config::SessionConfig;
use crate::errors::CameraError;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Tap-to-focus parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FocusRequest {
    pub focus_mode: FocusMode,
    pub exposure_mode: ExposureMode,
    /// Normalized point, (0,0) top-left to (1,1) bottom-right
    pub point: DevicePoint,
    /// Report when the scene under the point changes
    pub monitor_subject_area_change: bool,
}

impl FocusRequest {
    /// Auto focus and exposure once at `point`, then watch the subject area
    pub fn at(point: DevicePoint) -> Self {
        Self {
            focus_mode: FocusMode::AutoFocus,
            exposure_mode: ExposureMode::AutoExpose,
            point,
            monitor_subject_area_change: true,
        }
    }

    /// Continuous auto focus and exposure at the frame center
    pub fn reset() -> Self {
        Self {
            focus_mode: FocusMode::ContinuousAutoFocus,
            exposure_mode: ExposureMode::ContinuousAutoExposure,
            point: DevicePoint::CENTER,
            monitor_subject_area_change: false,
        }
    }
}

/// Owns access checks, device wiring and the running state
pub struct SessionConfigurator {
    backend: Arc<dyn CameraBackend>,
    registry: DeviceRegistry,
    config: SessionConfig,
}

impl SessionConfigurator {
    pub fn new(
        backend: Arc<dyn CameraBackend>,
        registry: DeviceRegistry,
        config: SessionConfig,
    ) -> Self {
        Self {
            backend,
            registry,
            config,
        }
    }

    /// Check access, then wire the session for `position`
    ///
    /// Only valid once; later calls are ignored.
    pub fn prepare(&self, components: &mut CaptureComponents, position: Position) {
        if components.phase != SetupPhase::Unconfigured {
            warn!(phase = ?components.phase, "Session already prepared, ignoring");
            return;
        }

        if self.check_access(components) == SessionStatus::Authorized {
            // Failures are kept in the components and published with the status
            if let Err(e) = self.setup(components, position) {
                debug!(error = %e, "Setup failure recorded");
            }
        }
    }

    /// Resolve the camera authorization
    ///
    /// Blocks the calling thread while a permission prompt is open.
    pub fn check_access(&self, components: &mut CaptureComponents) -> SessionStatus {
        components.phase = SetupPhase::CheckingAccess;

        if self.authorize(MediaType::Video) {
            components.status = SessionStatus::Authorized;
        } else {
            warn!("Camera access not authorized");
            components.status = SessionStatus::NotAuthorized;
            components.phase = SetupPhase::AccessDenied;
        }
        components.status
    }

    fn authorize(&self, media: MediaType) -> bool {
        match self.backend.authorization_status(media) {
            AuthorizationStatus::Authorized => true,
            AuthorizationStatus::Denied | AuthorizationStatus::Restricted => false,
            AuthorizationStatus::NotDetermined => {
                info!(%media, "Requesting access");
                match self.backend.request_access(media).blocking_recv() {
                    Ok(granted) => {
                        info!(%media, granted, "Access prompt answered");
                        granted
                    }
                    Err(_) => {
                        warn!(%media, "Access prompt dismissed");
                        false
                    }
                }
            }
        }
    }

    /// Attach inputs and outputs inside one configuration bracket
    ///
    /// On failure everything attached by this call is detached again, the
    /// status becomes `ConfigurationFailed` with the cause kept in
    /// `setup_error`, and the bracket is still committed.
    pub fn setup(
        &self,
        components: &mut CaptureComponents,
        position: Position,
    ) -> Result<(), CameraError> {
        components.phase = SetupPhase::Configuring;
        components.session.begin_configuration();

        let result = self.wire(components, position);
        match &result {
            Ok(()) => {
                components.status = SessionStatus::Authorized;
                components.phase = SetupPhase::Ready;
                components.setup_error = None;
                info!(position = %components.position, "Session configured");
            }
            Err(e) => {
                error!(error = %e, "Session configuration failed");
                Self::detach_all(components);
                components.status = SessionStatus::ConfigurationFailed;
                components.phase = SetupPhase::Failed;
                components.setup_error = Some(e.clone());
            }
        }

        components.session.commit_configuration();
        result
    }

    fn wire(
        &self,
        components: &mut CaptureComponents,
        position: Position,
    ) -> Result<(), CameraError> {
        // Camera
        let device = self.registry.resolve_device(position)?;
        let input = self.backend.create_input(device).map_err(|e| {
            warn!(error = %e, "Cannot create camera input");
            CameraError::InputsAreInvalid
        })?;
        if !components.session.can_add_input(&input) {
            return Err(CameraError::FailedToAddCameraInput);
        }
        components
            .session
            .add_input(&input)
            .map_err(|_| CameraError::FailedToAddCameraInput)?;
        components.position = input.info().position;
        components.camera_input = Some(input);

        // Still images
        let photo = self.backend.create_photo_output();
        photo.set_prepared_codec(self.config.photo_codec);
        let output = SessionOutput::Photo(Arc::clone(&photo));
        if !components.session.can_add_output(&output) {
            return Err(CameraError::FailedToAddPhotoOutput);
        }
        components
            .session
            .add_output(&output)
            .map_err(|_| CameraError::FailedToAddPhotoOutput)?;
        components.photo_output = Some(photo);

        // Movies, with sound when possible
        let movie = self.backend.create_movie_output();
        self.attach_microphone(components)?;
        let output = SessionOutput::Movie(Arc::clone(&movie));
        if !components.session.can_add_output(&output) {
            return Err(CameraError::FailedToAddMovieOutput);
        }
        components
            .session
            .add_output(&output)
            .map_err(|_| CameraError::FailedToAddMovieOutput)?;
        components.movie_output = Some(movie);

        // Quality
        let preset = self.config.session_preset;
        if components.session.can_set_preset(preset) {
            components.session.set_preset(preset);
            debug!(%preset, "Session preset applied");
        } else {
            debug!(%preset, current = %components.session.preset(), "Session preset not supported");
        }

        Ok(())
    }

    fn attach_microphone(&self, components: &mut CaptureComponents) -> Result<(), CameraError> {
        if !self.config.request_microphone {
            return Ok(());
        }
        let Some(microphone) = self.registry.microphone() else {
            debug!("No microphone, recording without sound");
            return Ok(());
        };
        if !self.authorize(MediaType::Audio) {
            warn!("Microphone access not authorized, recording without sound");
            return Ok(());
        }

        let input = self.backend.create_input(microphone).map_err(|e| {
            warn!(error = %e, "Cannot create microphone input");
            CameraError::InputsAreInvalid
        })?;
        if !components.session.can_add_input(&input) {
            return Err(CameraError::FailedToAddAudioInput);
        }
        components
            .session
            .add_input(&input)
            .map_err(|_| CameraError::FailedToAddAudioInput)?;
        components.microphone_input = Some(input);
        Ok(())
    }

    fn detach_all(components: &mut CaptureComponents) {
        if let Some(movie) = components.movie_output.take() {
            components.session.remove_output(&SessionOutput::Movie(movie));
        }
        if let Some(input) = components.microphone_input.take() {
            components.session.remove_input(&input);
        }
        if let Some(photo) = components.photo_output.take() {
            components.session.remove_output(&SessionOutput::Photo(photo));
        }
        if let Some(input) = components.camera_input.take() {
            components.session.remove_input(&input);
        }
        components.position = Position::Unspecified;
    }

    /// Start the pipeline if authorized
    ///
    /// Starting a running session does nothing. Returns the current status.
    pub fn start(&self, components: &mut CaptureComponents) -> SessionStatus {
        components.wants_running = true;

        if components.status != SessionStatus::Authorized {
            info!(status = %components.status, "Not starting session");
            return components.status;
        }
        if !components.session.is_running() {
            match components.session.start_running() {
                Ok(()) => info!("Session started"),
                Err(e) => error!(error = %e, "Failed to start session"),
            }
        }
        components.status
    }

    /// Stop the pipeline; stopping a stopped session does nothing
    ///
    /// A recording in progress is finished first so its file is complete.
    pub fn stop(&self, components: &mut CaptureComponents) {
        components.wants_running = false;

        if let Some(movie) = &components.movie_output
            && movie.is_recording()
        {
            info!("Finishing recording before stopping the session");
            movie.stop_recording();
        }
        if components.session.is_running() {
            components.session.stop_running();
            info!("Session stopped");
        }
    }

    /// React to a fault reported by the running session
    pub fn handle_runtime_error(
        &self,
        components: &mut CaptureComponents,
        runtime_error: &SessionRuntimeError,
    ) {
        error!(error = %runtime_error, "Capture session runtime error");

        if *runtime_error == SessionRuntimeError::MediaServicesReset {
            self.recover_from_reset(components);
        }
    }

    /// Restart after a media-services reset if the caller still wants frames
    fn recover_from_reset(&self, components: &mut CaptureComponents) {
        if !components.wants_running
            || components.status != SessionStatus::Authorized
            || components.session.is_running()
        {
            debug!(
                wants_running = components.wants_running,
                status = %components.status,
                "Not restarting after reset"
            );
            return;
        }

        match components.session.start_running() {
            Ok(()) => info!("Session restarted after media services reset"),
            Err(e) => error!(error = %e, "Failed to restart session after reset"),
        }
    }

    /// Set focus and exposure at a point of interest
    ///
    /// Each half is applied only when the device supports both the point of
    /// interest and the requested mode. A device that cannot be locked is left
    /// untouched.
    pub fn focus(&self, components: &CaptureComponents, request: FocusRequest) {
        let Some(device) = components.active_device() else {
            debug!("No camera attached, ignoring focus request");
            return;
        };
        let capabilities = device.capabilities();

        let mut config = match device.lock_for_configuration() {
            Ok(config) => config,
            Err(e) => {
                warn!(error = %e, "Cannot lock device for focus");
                return;
            }
        };

        if capabilities.focus_point_of_interest
            && capabilities.supports_focus_mode(request.focus_mode)
        {
            config.set_focus_point_of_interest(request.point);
            config.set_focus_mode(request.focus_mode);
        }
        if capabilities.exposure_point_of_interest
            && capabilities.supports_exposure_mode(request.exposure_mode)
        {
            config.set_exposure_point_of_interest(request.point);
            config.set_exposure_mode(request.exposure_mode);
        }
        config.set_subject_area_change_monitoring(request.monitor_subject_area_change);

        debug!(x = request.point.x(), y = request.point.y(), "Focus applied");
    }
}
