// SPDX-License-Identifier: GPL-3.0-only

//! User actions against a configured session

use super::components::CaptureComponents;
use super::registry::DeviceRegistry;
use crate::backends::camera::{
    BackendResult, CameraBackend, FlashMode, PendingMovie, PendingPhoto, PhotoOutput,
    PhotoSettings, Position, RecordingSettings,
};
use crate::config::SessionConfig;
use crate::constants::zoom;
use crate::errors::CameraError;
use crate::storage::{ContentType, MediaStorage};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};

/// A recording in progress
///
/// Resolves once the movie file is finished, or fails if the recording was
/// aborted or the session went away.
#[derive(Debug)]
pub struct Recording {
    path: PathBuf,
    finished: PendingMovie,
}

impl Recording {
    fn new(path: PathBuf, finished: PendingMovie) -> Self {
        Self { path, finished }
    }

    /// Location being written
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Wait for the finished file
    pub async fn finished(self) -> Result<PathBuf, CameraError> {
        match self.finished.await {
            Ok(result) => result.map_err(CameraError::from),
            Err(_) => Err(CameraError::Unknown),
        }
    }
}

/// Runs captures, recordings and live device changes
pub struct ActionDispatcher {
    backend: Arc<dyn CameraBackend>,
    registry: DeviceRegistry,
    storage: Arc<dyn MediaStorage>,
    config: SessionConfig,
}

impl ActionDispatcher {
    pub fn new(
        backend: Arc<dyn CameraBackend>,
        registry: DeviceRegistry,
        storage: Arc<dyn MediaStorage>,
        config: SessionConfig,
    ) -> Self {
        Self {
            backend,
            registry,
            storage,
            config,
        }
    }

    /// Issue a still capture with the current flash mode where it applies
    pub fn capture_still_image(
        &self,
        components: &CaptureComponents,
    ) -> Result<PendingPhoto, CameraError> {
        let photo = components
            .photo_output
            .as_ref()
            .ok_or_else(|| CameraError::InvalidOperation("no photo output".to_string()))?;

        let settings = PhotoSettings {
            codec: self.config.photo_codec,
            flash_mode: Self::effective_flash_mode(components, photo.as_ref()),
        };
        debug!(flash = %settings.flash_mode, codec = ?settings.codec, "Capturing still image");

        Ok(photo.capture_photo(settings))
    }

    /// Flash only fires on a camera that has one, in a mode the output supports
    fn effective_flash_mode(components: &CaptureComponents, photo: &dyn PhotoOutput) -> FlashMode {
        let has_flash = components
            .active_device()
            .is_some_and(|device| device.capabilities().has_flash);

        if has_flash && photo.supported_flash_modes().contains(&components.flash_mode) {
            components.flash_mode
        } else {
            FlashMode::Off
        }
    }

    /// Start writing a movie to a fresh file
    pub fn start_recording(
        &self,
        components: &CaptureComponents,
    ) -> Result<Recording, CameraError> {
        let movie = components
            .movie_output
            .as_ref()
            .ok_or_else(|| CameraError::InvalidOperation("no movie output".to_string()))?;
        if movie.is_recording() {
            return Err(CameraError::AlreadyRecording);
        }

        let connection = movie.video_connection().unwrap_or_default();
        let settings = RecordingSettings {
            orientation: connection
                .orientation
                .then_some(self.config.video_orientation),
            stabilization: connection
                .stabilization
                .then_some(self.config.stabilization),
        };

        // Focus hunting is less visible in video without smooth auto focus
        if let Some(device) = components.active_device()
            && device.capabilities().smooth_auto_focus
        {
            match device.lock_for_configuration() {
                Ok(mut config) => config.set_smooth_auto_focus(false),
                Err(e) => warn!(error = %e, "Cannot disable smooth auto focus"),
            }
        }

        let path = self.storage.file_url(ContentType::Video)?;
        let mut pending = movie.start_recording(path.clone(), settings);

        // Failures detected at start are reported here instead of at finish
        match pending.try_recv() {
            Err(oneshot::error::TryRecvError::Empty) => {
                info!(path = %path.display(), "Recording started");
                Ok(Recording::new(path, pending))
            }
            Ok(Err(e)) => {
                error!(error = %e, "Recording failed to start");
                Err(e.into())
            }
            Ok(Ok(done)) => Ok(Recording::new(path, Self::resolved(Ok(done)))),
            Err(oneshot::error::TryRecvError::Closed) => Err(CameraError::Unknown),
        }
    }

    fn resolved(result: BackendResult<PathBuf>) -> PendingMovie {
        let (sender, receiver) = oneshot::channel();
        let _ = sender.send(result);
        receiver
    }

    /// Stop the current recording; does nothing when idle
    pub fn stop_recording(&self, components: &CaptureComponents) {
        match &components.movie_output {
            Some(movie) if movie.is_recording() => {
                info!("Stopping recording");
                movie.stop_recording();
            }
            _ => debug!("Not recording, nothing to stop"),
        }
    }

    /// Replace the camera input with the one on the other side
    ///
    /// If the session refuses the new input the previous one is attached
    /// again, so the session never ends up without a camera.
    pub fn switch_camera(
        &self,
        components: &mut CaptureComponents,
    ) -> Result<Position, CameraError> {
        let current = components.camera_input.clone().ok_or_else(|| {
            CameraError::InvalidOperation("no camera input to switch from".to_string())
        })?;
        if components.is_recording() {
            return Err(CameraError::InvalidOperation(
                "cannot switch camera while recording".to_string(),
            ));
        }
        let target = current.info().position.opposite().ok_or_else(|| {
            CameraError::InvalidOperation("camera has no opposite side".to_string())
        })?;

        let device = self.registry.resolve_device(target)?;
        let input = self.backend.create_input(device).map_err(|e| {
            warn!(error = %e, "Cannot create camera input");
            CameraError::InputsAreInvalid
        })?;

        components.session.begin_configuration();
        components.session.remove_input(&current);

        let result = if components.session.can_add_input(&input) {
            components
                .session
                .add_input(&input)
                .map_err(|_| CameraError::FailedToAddCameraInput)
        } else {
            Err(CameraError::FailedToAddCameraInput)
        };

        match &result {
            Ok(()) => {
                // A camera seen before may still hold the zoom it was left at
                match input.device().lock_for_configuration() {
                    Ok(mut config) => config.set_zoom_factor(zoom::MIN_FACTOR),
                    Err(e) => warn!(error = %e, "Cannot reset zoom on new camera"),
                }
                components.camera_input = Some(input);
                components.position = target;
                components.zoom.reset();
                info!(position = %target, "Switched camera");
            }
            Err(e) => {
                warn!(
                    error = %e,
                    position = %target,
                    "Camera switch failed, restoring previous input"
                );
                if let Err(e) = components.session.add_input(&current) {
                    error!(error = %e, "Failed to restore previous camera input");
                    components.camera_input = None;
                }
            }
        }

        components.session.commit_configuration();
        result.map(|()| target)
    }

    /// Advance auto -> on -> off -> auto
    pub fn switch_flash_mode(&self, components: &mut CaptureComponents) -> FlashMode {
        components.flash_mode = components.flash_mode.next();
        debug!(flash = %components.flash_mode, "Flash mode changed");
        components.flash_mode
    }

    /// Apply a pinch gesture relative to the committed zoom
    ///
    /// Returns the zoom factor now applied.
    pub fn zoom(&self, components: &mut CaptureComponents, scale: f64) -> f64 {
        if !scale.is_finite() || scale <= 0.0 {
            debug!(scale, "Ignoring invalid zoom scale");
            return components.zoom.pending;
        }
        let Some(device) = components.active_device().cloned() else {
            return components.zoom.pending;
        };

        let max = device.capabilities().max_zoom_factor.max(zoom::MIN_FACTOR);
        let factor = (scale * components.zoom.committed).clamp(zoom::MIN_FACTOR, max);

        match device.lock_for_configuration() {
            Ok(mut config) => {
                config.set_zoom_factor(factor);
                components.zoom.pending = factor;
            }
            Err(e) => warn!(error = %e, "Cannot lock device for zoom"),
        }
        components.zoom.pending
    }

    /// End a pinch gesture, making its factor the base for the next one
    pub fn finish_zoom(&self, components: &mut CaptureComponents, scale: f64) -> f64 {
        let factor = self.zoom(components, scale);
        components.zoom.committed = factor;
        factor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::camera::VirtualBackend;
    use crate::backends::camera::virtual_camera::VirtualFaults;
    use crate::session::configurator::SessionConfigurator;
    use crate::storage::DirectoryStorage;

    struct Fixture {
        backend: VirtualBackend,
        components: CaptureComponents,
        dispatcher: ActionDispatcher,
    }

    fn fixture(backend: VirtualBackend) -> Fixture {
        let shared: Arc<dyn CameraBackend> = Arc::new(backend.clone());
        let registry = DeviceRegistry::new(Arc::clone(&shared));
        let config = SessionConfig::default();
        let configurator =
            SessionConfigurator::new(Arc::clone(&shared), registry.clone(), config.clone());
        let dispatcher = ActionDispatcher::new(
            shared,
            registry,
            Arc::new(DirectoryStorage::temporary()),
            config,
        );

        let mut components = CaptureComponents::new(backend.create_session(), FlashMode::Off);
        configurator.prepare(&mut components, Position::Back);
        configurator.start(&mut components);

        Fixture {
            backend,
            components,
            dispatcher,
        }
    }

    #[test]
    fn flash_applies_only_with_flash_hardware() {
        let mut f = fixture(VirtualBackend::with_default_devices());
        f.components.flash_mode = FlashMode::On;

        f.dispatcher.capture_still_image(&f.components).unwrap();
        f.dispatcher.switch_camera(&mut f.components).unwrap();
        f.dispatcher.capture_still_image(&f.components).unwrap();

        let flashes: Vec<_> = f
            .backend
            .photo_captures()
            .iter()
            .map(|settings| settings.flash_mode)
            .collect();
        assert_eq!(flashes, vec![FlashMode::On, FlashMode::Off]);
    }

    #[test]
    fn flash_cycle() {
        let mut f = fixture(VirtualBackend::with_default_devices());
        f.components.flash_mode = FlashMode::Auto;

        assert_eq!(f.dispatcher.switch_flash_mode(&mut f.components), FlashMode::On);
        assert_eq!(f.dispatcher.switch_flash_mode(&mut f.components), FlashMode::Off);
        assert_eq!(f.dispatcher.switch_flash_mode(&mut f.components), FlashMode::Auto);
    }

    #[test]
    fn switch_restores_previous_input_on_rejection() {
        let mut f = fixture(VirtualBackend::with_default_devices());
        f.backend
            .update_faults(|faults| faults.rejected_camera_positions = vec![Position::Front]);

        assert_eq!(
            f.dispatcher.switch_camera(&mut f.components),
            Err(CameraError::FailedToAddCameraInput)
        );
        assert_eq!(f.components.position(), Some(Position::Back));

        let probe = f.backend.probe();
        assert_eq!(probe.cameras().len(), 1);
        assert_eq!(probe.cameras()[0].position, Position::Back);
        assert_eq!(probe.bracket_depth, 0);
    }

    #[test]
    fn switch_without_other_side_keeps_camera() {
        let mut f = fixture(VirtualBackend::builder().camera(Position::Back).build());

        assert_eq!(
            f.dispatcher.switch_camera(&mut f.components),
            Err(CameraError::NoCamerasAvailable)
        );
        assert_eq!(f.backend.probe().cameras().len(), 1);
    }

    #[test]
    fn zoom_is_relative_and_clamped() {
        let mut f = fixture(VirtualBackend::with_default_devices());

        assert_eq!(f.dispatcher.zoom(&mut f.components, 2.0), 2.0);
        assert_eq!(f.dispatcher.finish_zoom(&mut f.components, 3.0), 3.0);
        // Relative to the committed 3.0, capped at the back camera's 8x
        assert_eq!(f.dispatcher.zoom(&mut f.components, 4.0), 8.0);
        assert_eq!(f.dispatcher.zoom(&mut f.components, 0.1), 1.0);
        assert_eq!(f.dispatcher.zoom(&mut f.components, f64::NAN), 1.0);

        let camera = f.backend.camera(Position::Back).unwrap();
        assert_eq!(camera.settings().zoom_factor, 1.0);
    }

    #[test]
    fn switch_resets_zoom() {
        let mut f = fixture(VirtualBackend::with_default_devices());
        f.dispatcher.finish_zoom(&mut f.components, 3.0);

        f.dispatcher.switch_camera(&mut f.components).unwrap();
        assert_eq!(f.components.zoom, Default::default());
    }

    #[test]
    fn capture_without_photo_output_is_invalid() {
        let backend = VirtualBackend::builder()
            .camera(Position::Back)
            .faults(VirtualFaults {
                reject_photo_output: true,
                ..Default::default()
            })
            .build();
        let f = fixture(backend);

        assert!(matches!(
            f.dispatcher.capture_still_image(&f.components),
            Err(CameraError::InvalidOperation(_))
        ));
    }

    #[test]
    fn stop_recording_when_idle_is_noop() {
        let f = fixture(VirtualBackend::with_default_devices());
        f.dispatcher.stop_recording(&f.components);
        assert!(f.backend.recordings().is_empty());
    }
}
