// SPDX-License-Identifier: GPL-3.0-only

//! Simulated photo and movie sinks

use super::{RecordingRecord, Shared, lock};
use crate::backends::camera::types::*;
use crate::backends::camera::{MovieOutput, PendingMovie, PendingPhoto, PhotoOutput};
use crate::constants::{VIRTUAL_FRAME_HEIGHT, VIRTUAL_FRAME_WIDTH, VIRTUAL_JPEG_QUALITY};
use image::{Rgb, RgbImage};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, Weak};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

/// Still-image sink that encodes a generated test pattern
pub struct VirtualPhotoOutput {
    shared: Arc<Shared>,
    prepared_codec: Mutex<PhotoCodec>,
}

impl VirtualPhotoOutput {
    pub(crate) fn new(shared: Arc<Shared>) -> Self {
        Self {
            shared,
            prepared_codec: Mutex::new(PhotoCodec::default()),
        }
    }

    /// Codec prepared by the last `set_prepared_codec` call
    pub fn prepared_codec(&self) -> PhotoCodec {
        *lock(&self.prepared_codec)
    }

    /// Check the pipeline can deliver a frame to this output
    fn ready(&self) -> BackendResult<()> {
        if self.shared.faults().fail_photo_capture {
            return Err(BackendError::Other("simulated capture failure".to_string()));
        }

        let pipeline = lock(&self.shared.pipeline);
        if !pipeline.running {
            return Err(BackendError::SessionNotRunning);
        }
        if !pipeline.outputs.contains(&OutputKind::Photo) {
            return Err(BackendError::Other("photo output is not attached".to_string()));
        }
        if !pipeline.inputs.iter().any(|info| info.kind == DeviceKind::Camera) {
            return Err(BackendError::Other("no camera feeds the session".to_string()));
        }
        Ok(())
    }
}

impl PhotoOutput for VirtualPhotoOutput {
    fn set_prepared_codec(&self, codec: PhotoCodec) {
        debug!(?codec, "Prepared photo codec");
        *lock(&self.prepared_codec) = codec;
    }

    fn supported_flash_modes(&self) -> Vec<FlashMode> {
        FlashMode::ALL.to_vec()
    }

    fn capture_photo(&self, settings: PhotoSettings) -> PendingPhoto {
        let (sender, receiver) = oneshot::channel();
        lock(&self.shared.captures).push(settings);

        if let Err(e) = self.ready() {
            warn!(error = %e, "Virtual photo capture failed");
            let _ = sender.send(Err(e));
            return receiver;
        }

        // Encoding is CPU-bound, keep it off the caller's thread
        std::thread::spawn(move || {
            let result = encode_test_pattern(settings.codec);
            if let Ok(data) = &result {
                debug!(size = data.len(), flash = %settings.flash_mode, "Virtual photo encoded");
            }
            let _ = sender.send(result);
        });

        receiver
    }
}

/// Render and encode the test pattern
fn encode_test_pattern(codec: PhotoCodec) -> BackendResult<Vec<u8>> {
    let image = RgbImage::from_fn(VIRTUAL_FRAME_WIDTH, VIRTUAL_FRAME_HEIGHT, |x, y| {
        let r = (x * 255 / VIRTUAL_FRAME_WIDTH.max(1)) as u8;
        let g = (y * 255 / VIRTUAL_FRAME_HEIGHT.max(1)) as u8;
        let b = if (x / 8 + y / 8) % 2 == 0 { 200 } else { 40 };
        Rgb([r, g, b])
    });

    let mut buffer = Vec::new();
    match codec {
        PhotoCodec::Jpeg => {
            let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(
                &mut buffer,
                VIRTUAL_JPEG_QUALITY,
            );
            encoder
                .encode(
                    image.as_raw(),
                    image.width(),
                    image.height(),
                    image::ExtendedColorType::Rgb8,
                )
                .map_err(|e| BackendError::Other(format!("JPEG encoding failed: {}", e)))?;
        }
        PhotoCodec::Png => {
            image
                .write_to(
                    &mut std::io::Cursor::new(&mut buffer),
                    image::ImageFormat::Png,
                )
                .map_err(|e| BackendError::Other(format!("PNG encoding failed: {}", e)))?;
        }
    }

    Ok(buffer)
}

pub(crate) struct ActiveRecording {
    path: PathBuf,
    sender: oneshot::Sender<BackendResult<PathBuf>>,
}

/// The in-flight recording of one movie output
pub(crate) type RecordingSlot = Mutex<Option<ActiveRecording>>;

/// Fail every in-flight recording of the outputs created from `shared`
///
/// Called when the pipeline stops underneath the recordings. Must not be
/// called with the pipeline lock held.
pub(crate) fn abort_recordings(shared: &Shared, error: &BackendError) {
    let slots: Vec<Arc<RecordingSlot>> = {
        let mut outputs = lock(&shared.movie_outputs);
        outputs.retain(|slot| slot.strong_count() > 0);
        outputs.iter().filter_map(Weak::upgrade).collect()
    };

    for slot in slots {
        if let Some(recording) = lock(&slot).take() {
            warn!(path = %recording.path.display(), error = %error, "Virtual recording aborted");
            let _ = recording.sender.send(Err(error.clone()));
        }
    }
}

/// Movie-file sink that creates its target file and finishes on stop
pub struct VirtualMovieOutput {
    shared: Arc<Shared>,
    active: Arc<RecordingSlot>,
}

impl VirtualMovieOutput {
    pub(crate) fn new(shared: Arc<Shared>) -> Self {
        let active = Arc::new(Mutex::new(None));
        lock(&shared.movie_outputs).push(Arc::downgrade(&active));
        Self { shared, active }
    }
}

impl MovieOutput for VirtualMovieOutput {
    fn video_connection(&self) -> Option<ConnectionCapabilities> {
        let pipeline = lock(&self.shared.pipeline);
        let attached = pipeline.outputs.contains(&OutputKind::Movie);
        let has_camera = pipeline
            .inputs
            .iter()
            .any(|info| info.kind == DeviceKind::Camera);

        (attached && has_camera).then_some(ConnectionCapabilities {
            orientation: true,
            stabilization: true,
        })
    }

    fn is_recording(&self) -> bool {
        lock(&self.active).is_some()
    }

    fn start_recording(&self, path: PathBuf, settings: RecordingSettings) -> PendingMovie {
        let (sender, receiver) = oneshot::channel();
        let mut active = lock(&self.active);

        if active.is_some() {
            let _ = sender.send(Err(BackendError::RecordingInProgress));
            return receiver;
        }
        if !lock(&self.shared.pipeline).running {
            let _ = sender.send(Err(BackendError::SessionNotRunning));
            return receiver;
        }
        if let Err(e) = std::fs::File::create(&path) {
            warn!(path = %path.display(), error = %e, "Cannot create movie file");
            let _ = sender.send(Err(e.into()));
            return receiver;
        }

        info!(path = %path.display(), "Virtual recording started");
        lock(&self.shared.recordings).push(RecordingRecord {
            path: path.clone(),
            settings,
        });
        *active = Some(ActiveRecording { path, sender });

        receiver
    }

    fn stop_recording(&self) {
        let Some(recording) = lock(&self.active).take() else {
            return;
        };

        info!(path = %recording.path.display(), "Virtual recording finished");
        let _ = recording.sender.send(Ok(recording.path));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::camera::{CameraBackend, CaptureSession, SessionOutput, VirtualBackend};

    #[test]
    fn jpeg_pattern_has_jpeg_magic() {
        let data = encode_test_pattern(PhotoCodec::Jpeg).unwrap();
        assert!(data.len() > 4);
        assert_eq!(&data[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn stopping_the_session_aborts_recording() {
        let backend = VirtualBackend::with_default_devices();
        let mut session = backend.create_session();
        let movie = backend.create_movie_output();
        let path = std::env::temp_dir()
            .join(format!("virtual-abort-{}.mp4", uuid::Uuid::new_v4()));

        session.begin_configuration();
        session.add_output(&SessionOutput::Movie(Arc::clone(&movie))).unwrap();
        session.commit_configuration();
        session.start_running().unwrap();

        let mut pending = movie.start_recording(path.clone(), RecordingSettings::default());
        assert!(movie.is_recording());

        session.stop_running();
        assert!(!movie.is_recording());
        assert_eq!(pending.try_recv(), Ok(Err(BackendError::SessionNotRunning)));

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn dropped_output_is_forgotten() {
        let backend = VirtualBackend::with_default_devices();
        drop(backend.create_movie_output());

        abort_recordings(&backend.shared, &BackendError::SessionNotRunning);
        assert!(lock(&backend.shared.movie_outputs).is_empty());
    }

    #[test]
    fn png_pattern_decodes_to_frame_size() {
        let data = encode_test_pattern(PhotoCodec::Png).unwrap();
        let decoded = image::load_from_memory(&data).unwrap();
        assert_eq!(decoded.width(), VIRTUAL_FRAME_WIDTH);
        assert_eq!(decoded.height(), VIRTUAL_FRAME_HEIGHT);
    }
}
