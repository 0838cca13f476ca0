// SPDX-License-Identifier: MPL-2.0

//! Integration tests for the capture session facade

use capture_session::backends::camera::virtual_camera::{AccessAnswer, VirtualFaults};
use capture_session::backends::camera::{
    AuthorizationStatus, BackendError, ExposureMode, FocusMode, MediaType, SessionPreset,
    SessionRuntimeError, StabilizationMode, VideoOrientation, VirtualBackend,
};
use capture_session::session::SetupPhase;
use capture_session::storage::DirectoryStorage;
use capture_session::{
    CameraError, CaptureManager, DevicePoint, FlashMode, FocusRequest, Position, SessionConfig,
    SessionSnapshot, SessionStatus,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

fn scratch_dir() -> PathBuf {
    std::env::temp_dir()
        .join(format!("capture-session-test-{}", uuid::Uuid::new_v4()))
}

fn manager_with(backend: &VirtualBackend, config: SessionConfig) -> CaptureManager {
    let dir = scratch_dir();
    CaptureManager::new(
        Arc::new(backend.clone()),
        Arc::new(DirectoryStorage::new(&dir, &dir)),
        config,
    )
    .unwrap()
}

fn manager(backend: &VirtualBackend) -> CaptureManager {
    manager_with(backend, SessionConfig::default())
}

/// Prepared and started on the back camera
async fn running_manager(backend: &VirtualBackend) -> CaptureManager {
    let manager = manager(backend);
    manager.prepare(Position::Back);
    assert_eq!(manager.start().await, SessionStatus::Authorized);
    manager
}

async fn wait_for(mut condition: impl FnMut() -> bool) {
    for _ in 0..300 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not met in time");
}

// ===== Lifecycle =====

#[tokio::test]
async fn test_start_and_stop_are_idempotent() {
    let backend = VirtualBackend::with_default_devices();
    let manager = running_manager(&backend).await;

    assert_eq!(manager.start().await, SessionStatus::Authorized);
    assert!(backend.probe().running);
    assert_eq!(backend.probe().start_count, 1, "Second start must not restart");

    manager.stop().await;
    manager.stop().await;
    assert!(!backend.probe().running);
    assert!(!manager.snapshot().running);
}

#[tokio::test]
async fn test_running_state_follows_last_call() {
    let backend = VirtualBackend::with_default_devices();
    let manager = manager(&backend);
    manager.prepare(Position::Back);

    // true = start, false = stop
    let calls = [true, true, false, true, false, false, true, false, true, true];
    for start in calls {
        if start {
            manager.start().await;
        } else {
            manager.stop().await;
        }
        assert_eq!(backend.probe().running, start);
        assert_eq!(manager.snapshot().running, start);
    }
}

#[tokio::test]
async fn test_start_before_prepare_reports_undetermined() {
    let backend = VirtualBackend::with_default_devices();
    let manager = manager(&backend);

    assert_eq!(manager.start().await, SessionStatus::Undetermined);
    assert!(!backend.probe().running);
}

#[tokio::test]
async fn test_prepare_only_once() {
    let backend = VirtualBackend::with_default_devices();
    let manager = manager(&backend);

    manager.prepare(Position::Back);
    manager.prepare(Position::Front);
    manager.start().await;

    assert_eq!(manager.snapshot().position, Some(Position::Back));
    assert_eq!(backend.probe().cameras().len(), 1);
}

#[tokio::test]
async fn test_snapshot_after_setup() {
    let backend = VirtualBackend::with_default_devices();
    let manager = running_manager(&backend).await;

    let snapshot = manager.snapshot();
    assert_eq!(snapshot.status, SessionStatus::Authorized);
    assert_eq!(snapshot.phase, SetupPhase::Ready);
    assert!(snapshot.running);
    assert!(snapshot.has_microphone);
    assert!(!snapshot.recording);
    assert_eq!(
        manager.current_device().map(|device| device.position),
        Some(Position::Back)
    );

    let probe = backend.probe();
    assert_eq!(probe.outputs.len(), 2);
    assert_eq!(probe.unbracketed_mutations, 0);
}

#[tokio::test]
async fn test_independent_managers() {
    let first = VirtualBackend::with_default_devices();
    let second = VirtualBackend::with_default_devices();

    let a = running_manager(&first).await;
    let b = manager(&second);
    b.prepare(Position::Front);
    b.start().await;
    a.stop().await;

    assert!(!first.probe().running);
    assert!(second.probe().running);
    assert_eq!(b.snapshot().position, Some(Position::Front));
}

// ===== Permissions =====

#[tokio::test]
async fn test_denied_access_never_runs() {
    let backend = VirtualBackend::builder()
        .camera(Position::Back)
        .authorization(MediaType::Video, AuthorizationStatus::NotDetermined)
        .access_answer(AccessAnswer::Deny)
        .build();
    let manager = manager(&backend);
    manager.prepare(Position::Back);

    assert_eq!(manager.start().await, SessionStatus::NotAuthorized);
    assert_eq!(manager.start().await, SessionStatus::NotAuthorized);

    let probe = backend.probe();
    assert!(!probe.running);
    assert_eq!(probe.start_count, 0);
    assert!(probe.is_unconfigured());
    assert_eq!(manager.snapshot().phase, SetupPhase::AccessDenied);
}

#[tokio::test]
async fn test_previously_denied_access_does_not_prompt() {
    let backend = VirtualBackend::builder()
        .camera(Position::Back)
        .authorization(MediaType::Video, AuthorizationStatus::Denied)
        .build();
    let manager = manager(&backend);
    manager.prepare(Position::Back);

    assert_eq!(manager.start().await, SessionStatus::NotAuthorized);
    assert_eq!(backend.prompt_count(), 0);
}

#[tokio::test]
async fn test_permission_prompt_suspends_queue() {
    let backend = VirtualBackend::builder()
        .camera(Position::Back)
        .authorization(MediaType::Video, AuthorizationStatus::NotDetermined)
        .access_answer(AccessAnswer::Hold)
        .build();
    let manager = manager(&backend);
    manager.prepare(Position::Back);
    wait_for(|| backend.pending_prompts() == 1).await;

    let start = manager.start();
    tokio::pin!(start);
    assert!(
        tokio::time::timeout(Duration::from_millis(100), &mut start)
            .await
            .is_err(),
        "Start must wait for the prompt"
    );
    assert!(!backend.probe().running);

    assert_eq!(backend.respond_to_access(true), 1);
    assert_eq!(start.await, SessionStatus::Authorized);
    assert!(backend.probe().running);
}

#[tokio::test]
async fn test_denied_microphone_still_configures() {
    let backend = VirtualBackend::builder()
        .camera(Position::Back)
        .microphone(true)
        .authorization(MediaType::Audio, AuthorizationStatus::NotDetermined)
        .access_answer(AccessAnswer::Deny)
        .build();
    let manager = running_manager(&backend).await;

    assert!(!manager.snapshot().has_microphone);
    assert!(backend.probe().microphones().is_empty());
    assert_eq!(backend.prompt_count(), 1);
}

#[tokio::test]
async fn test_microphone_can_be_disabled() {
    let backend = VirtualBackend::with_default_devices();
    let config = SessionConfig {
        request_microphone: false,
        ..Default::default()
    };
    let manager = manager_with(&backend, config);
    manager.prepare(Position::Back);
    manager.start().await;

    assert!(backend.probe().microphones().is_empty());
}

// ===== Configuration failures =====

#[tokio::test]
async fn test_configuration_failure_at_each_step() {
    let cases: Vec<(&str, CameraError, VirtualBackend)> = vec![
        (
            "camera",
            CameraError::NoCamerasAvailable,
            VirtualBackend::builder()
                .camera(Position::Front)
                .microphone(true)
                .build(),
        ),
        (
            "camera input",
            CameraError::FailedToAddCameraInput,
            VirtualBackend::builder()
                .camera(Position::Back)
                .microphone(true)
                .faults(VirtualFaults {
                    rejected_camera_positions: vec![Position::Back],
                    ..Default::default()
                })
                .build(),
        ),
        (
            "photo output",
            CameraError::FailedToAddPhotoOutput,
            VirtualBackend::builder()
                .camera(Position::Back)
                .microphone(true)
                .faults(VirtualFaults {
                    reject_photo_output: true,
                    ..Default::default()
                })
                .build(),
        ),
        (
            "microphone input",
            CameraError::FailedToAddAudioInput,
            VirtualBackend::builder()
                .camera(Position::Back)
                .microphone(true)
                .faults(VirtualFaults {
                    reject_microphone_input: true,
                    ..Default::default()
                })
                .build(),
        ),
        (
            "movie output",
            CameraError::FailedToAddMovieOutput,
            VirtualBackend::builder()
                .camera(Position::Back)
                .microphone(true)
                .faults(VirtualFaults {
                    reject_movie_output: true,
                    ..Default::default()
                })
                .build(),
        ),
    ];

    for (step, expected, backend) in cases {
        let manager = manager(&backend);
        manager.prepare(Position::Back);

        assert_eq!(
            manager.start().await,
            SessionStatus::ConfigurationFailed,
            "Failure at {} must be reported",
            step
        );

        let probe = backend.probe();
        assert!(!probe.running, "Session must not run after {} failure", step);
        assert!(
            probe.is_unconfigured(),
            "Nothing may stay attached after {} failure",
            step
        );
        assert_eq!(probe.bracket_depth, 0, "Bracket must be committed");
        assert_eq!(manager.snapshot().phase, SetupPhase::Failed);
        assert_eq!(manager.snapshot().setup_error, Some(expected));
        assert_eq!(manager.current_device(), None);
    }
}

#[tokio::test]
async fn test_unsupported_preset_is_not_a_failure() {
    let backend = VirtualBackend::builder()
        .camera(Position::Back)
        .faults(VirtualFaults {
            unsupported_presets: vec![SessionPreset::Hd1280x720],
            ..Default::default()
        })
        .build();
    let manager = running_manager(&backend).await;

    assert_eq!(manager.status(), SessionStatus::Authorized);
    assert_eq!(backend.probe().preset, SessionPreset::High);
}

#[tokio::test]
async fn test_failed_start_keeps_status() {
    let backend = VirtualBackend::with_default_devices();
    backend.update_faults(|faults| faults.fail_start = true);
    let manager = manager(&backend);
    manager.prepare(Position::Back);

    assert_eq!(manager.start().await, SessionStatus::Authorized);
    assert!(!backend.probe().running);
}

// ===== Flash =====

#[tokio::test]
async fn test_flash_cycle_returns_to_start() {
    let backend = VirtualBackend::with_default_devices();
    let config = SessionConfig {
        flash_mode: FlashMode::Auto,
        ..Default::default()
    };
    let manager = manager_with(&backend, config);
    assert_eq!(manager.current_flash_mode(), FlashMode::Auto);

    assert_eq!(manager.switch_flash_mode().await, FlashMode::On);
    assert_eq!(manager.switch_flash_mode().await, FlashMode::Off);
    assert_eq!(manager.switch_flash_mode().await, FlashMode::Auto);
    assert_eq!(manager.current_flash_mode(), FlashMode::Auto);
}

// ===== Camera switch =====

#[tokio::test]
async fn test_switch_camera_changes_position() {
    let backend = VirtualBackend::with_default_devices();
    let manager = running_manager(&backend).await;

    assert_eq!(manager.switch_camera().await, Ok(Position::Front));
    assert_eq!(manager.snapshot().position, Some(Position::Front));

    let probe = backend.probe();
    assert_eq!(probe.cameras().len(), 1);
    assert_eq!(probe.cameras()[0].position, Position::Front);
    assert!(probe.running);

    assert_eq!(manager.switch_camera().await, Ok(Position::Back));
}

#[tokio::test]
async fn test_switch_camera_rollback_keeps_camera() {
    let backend = VirtualBackend::with_default_devices();
    let manager = running_manager(&backend).await;
    backend.update_faults(|faults| faults.rejected_camera_positions = vec![Position::Front]);

    assert_eq!(
        manager.switch_camera().await,
        Err(CameraError::FailedToAddCameraInput)
    );

    let probe = backend.probe();
    assert_eq!(probe.cameras().len(), 1, "A camera input must remain attached");
    assert_eq!(probe.cameras()[0].position, Position::Back);
    assert_eq!(probe.bracket_depth, 0);
    assert_eq!(manager.snapshot().position, Some(Position::Back));
}

#[tokio::test]
async fn test_switch_camera_input_creation_failure() {
    let backend = VirtualBackend::with_default_devices();
    let manager = running_manager(&backend).await;
    backend.update_faults(|faults| faults.fail_input_creation = true);

    assert_eq!(
        manager.switch_camera().await,
        Err(CameraError::InputsAreInvalid)
    );
    assert_eq!(backend.probe().cameras()[0].position, Position::Back);
}

#[tokio::test]
async fn test_switch_camera_without_input_is_invalid() {
    let backend = VirtualBackend::with_default_devices();
    let manager = manager(&backend);

    assert!(matches!(
        manager.switch_camera().await,
        Err(CameraError::InvalidOperation(_))
    ));
}

// ===== Still capture =====

#[tokio::test]
async fn test_capture_delivers_once_per_call() {
    let backend = VirtualBackend::with_default_devices();
    let manager = running_manager(&backend).await;

    let first = manager.capture_image().await.unwrap();
    let second = manager.capture_image().await.unwrap();

    assert_eq!(&first[..2], &[0xFF, 0xD8], "Capture should be JPEG");
    assert!(!second.is_empty());
    assert_eq!(backend.photo_captures().len(), 2);
}

#[tokio::test]
async fn test_capture_error_is_delivered() {
    let backend = VirtualBackend::with_default_devices();
    let manager = running_manager(&backend).await;
    backend.update_faults(|faults| faults.fail_photo_capture = true);

    assert!(matches!(
        manager.capture_image().await,
        Err(CameraError::Backend(BackendError::Other(_)))
    ));
}

#[tokio::test]
async fn test_capture_requires_running_session() {
    let backend = VirtualBackend::with_default_devices();
    let manager = manager(&backend);
    manager.prepare(Position::Back);

    assert_eq!(
        manager.capture_image().await,
        Err(CameraError::Backend(BackendError::SessionNotRunning))
    );
}

#[tokio::test]
async fn test_capture_uses_flash_only_where_available() {
    let backend = VirtualBackend::with_default_devices();
    let config = SessionConfig {
        flash_mode: FlashMode::On,
        ..Default::default()
    };
    let manager = manager_with(&backend, config);
    manager.prepare(Position::Front);
    manager.start().await;

    manager.capture_image().await.unwrap();
    manager.switch_camera().await.unwrap();
    manager.capture_image().await.unwrap();

    let flashes: Vec<FlashMode> = backend
        .photo_captures()
        .iter()
        .map(|settings| settings.flash_mode)
        .collect();
    assert_eq!(flashes, vec![FlashMode::Off, FlashMode::On]);
}

// ===== Recording =====

#[tokio::test]
async fn test_recording_start_twice_is_an_error() {
    let backend = VirtualBackend::with_default_devices();
    let manager = running_manager(&backend).await;

    let recording = manager.start_recording().await.unwrap();
    assert!(recording.path().exists());
    assert!(manager.snapshot().recording);

    assert!(matches!(
        manager.start_recording().await,
        Err(CameraError::AlreadyRecording)
    ));
    assert!(manager.snapshot().recording, "Second start must not stop");

    manager.stop_recording().await;
    let path = recording.finished().await.unwrap();
    assert_eq!(path.extension().unwrap(), "mp4");
    assert!(!manager.snapshot().recording);
    assert_eq!(backend.recordings().len(), 1);

    let _ = std::fs::remove_file(path);
}

#[tokio::test]
async fn test_recording_applies_connection_settings() {
    let backend = VirtualBackend::with_default_devices();
    let manager = running_manager(&backend).await;

    let recording = manager.start_recording().await.unwrap();
    manager.stop_recording().await;
    let path = recording.finished().await.unwrap();

    let settings = backend.recordings()[0].settings;
    assert_eq!(settings.orientation, Some(VideoOrientation::Portrait));
    assert_eq!(settings.stabilization, Some(StabilizationMode::Auto));

    let camera = backend.camera(Position::Back).unwrap();
    assert!(!camera.settings().smooth_auto_focus);

    let _ = std::fs::remove_file(path);
}

#[tokio::test]
async fn test_stop_recording_when_idle() {
    let backend = VirtualBackend::with_default_devices();
    let manager = running_manager(&backend).await;

    manager.stop_recording().await;
    assert!(backend.recordings().is_empty());
    assert!(!manager.snapshot().recording);
}

#[tokio::test]
async fn test_recording_requires_running_session() {
    let backend = VirtualBackend::with_default_devices();
    let manager = running_manager(&backend).await;
    manager.stop().await;

    assert_eq!(
        manager.start_recording().await.err(),
        Some(CameraError::Backend(BackendError::SessionNotRunning))
    );
}

#[tokio::test]
async fn test_switch_camera_while_recording_is_refused() {
    let backend = VirtualBackend::with_default_devices();
    let manager = running_manager(&backend).await;
    let recording = manager.start_recording().await.unwrap();

    assert!(matches!(
        manager.switch_camera().await,
        Err(CameraError::InvalidOperation(_))
    ));
    assert_eq!(manager.snapshot().position, Some(Position::Back));

    manager.stop_recording().await;
    let _ = recording.finished().await.map(std::fs::remove_file);
}

#[tokio::test]
async fn test_dropping_manager_fails_pending_recording() {
    let backend = VirtualBackend::with_default_devices();
    let manager = running_manager(&backend).await;
    let recording = manager.start_recording().await.unwrap();
    let path = recording.path().to_path_buf();

    drop(manager);

    assert_eq!(recording.finished().await, Err(CameraError::Unknown));
    let _ = std::fs::remove_file(path);
}

#[tokio::test]
async fn test_stop_finishes_recording() {
    let backend = VirtualBackend::with_default_devices();
    let manager = running_manager(&backend).await;
    let recording = manager.start_recording().await.unwrap();

    manager.stop().await;

    let snapshot = manager.snapshot();
    assert!(!snapshot.running);
    assert!(!snapshot.recording);

    let path = tokio::time::timeout(Duration::from_secs(1), recording.finished())
        .await
        .expect("recording should finish when the session stops")
        .unwrap();
    assert!(path.exists());
    let _ = std::fs::remove_file(path);
}

#[tokio::test]
async fn test_recording_survives_unavailable_device() {
    let backend = VirtualBackend::with_default_devices();
    let manager = running_manager(&backend).await;
    let camera = backend.camera(Position::Back).unwrap();
    let before = manager.snapshot();
    camera.set_available(false);

    // Smooth auto focus cannot be disabled, the recording starts anyway
    let recording = manager.start_recording().await.unwrap();
    assert!(camera.settings().smooth_auto_focus);
    assert_eq!(
        manager.snapshot(),
        SessionSnapshot {
            recording: true,
            ..before.clone()
        }
    );

    manager.stop_recording().await;
    let path = recording.finished().await.unwrap();
    assert_eq!(manager.snapshot(), before);
    let _ = std::fs::remove_file(path);
}

// ===== Runtime faults =====

#[tokio::test]
async fn test_media_services_reset_restarts_session() {
    let backend = VirtualBackend::with_default_devices();
    let manager = running_manager(&backend).await;

    assert!(backend.inject_runtime_error(SessionRuntimeError::MediaServicesReset));
    wait_for(|| {
        let probe = backend.probe();
        probe.running && probe.start_count == 2
    })
    .await;
    wait_for(|| manager.snapshot().running).await;
}

#[tokio::test]
async fn test_reset_after_stop_does_not_restart() {
    let backend = VirtualBackend::with_default_devices();
    let manager = running_manager(&backend).await;
    manager.stop().await;

    assert!(backend.inject_runtime_error(SessionRuntimeError::MediaServicesReset));
    tokio::time::sleep(Duration::from_millis(100)).await;
    // Flush the queue behind any recovery job
    manager.switch_flash_mode().await;

    assert!(!backend.probe().running);
    assert_eq!(backend.probe().start_count, 1);
}

#[tokio::test]
async fn test_other_runtime_errors_are_not_recovered() {
    let backend = VirtualBackend::with_default_devices();
    let manager = running_manager(&backend).await;

    let fault = SessionRuntimeError::Other("thermal".to_string());
    assert!(backend.inject_runtime_error(fault));
    tokio::time::sleep(Duration::from_millis(100)).await;
    manager.switch_flash_mode().await;

    assert_eq!(backend.probe().start_count, 1);
    assert!(backend.probe().running);
}

#[tokio::test]
async fn test_reset_aborts_recording() {
    let backend = VirtualBackend::with_default_devices();
    let manager = running_manager(&backend).await;
    let recording = manager.start_recording().await.unwrap();
    let path = recording.path().to_path_buf();

    assert!(backend.inject_runtime_error(SessionRuntimeError::MediaServicesReset));

    let result = tokio::time::timeout(Duration::from_secs(1), recording.finished())
        .await
        .expect("recording should fail when the session resets");
    assert_eq!(
        result,
        Err(CameraError::Backend(BackendError::SessionNotRunning))
    );

    wait_for(|| backend.probe().start_count == 2).await;
    wait_for(|| {
        let snapshot = manager.snapshot();
        snapshot.running && !snapshot.recording
    })
    .await;

    let next = manager.start_recording().await.unwrap();
    manager.stop_recording().await;
    let next_path = next.finished().await.unwrap();

    let _ = std::fs::remove_file(path);
    let _ = std::fs::remove_file(next_path);
}

#[tokio::test]
async fn test_unavailable_device_error_is_not_recovered() {
    let backend = VirtualBackend::with_default_devices();
    let manager = running_manager(&backend).await;
    let before = manager.snapshot();

    let fault = SessionRuntimeError::DeviceUnavailable("virtual-camera-back-0".to_string());
    assert!(backend.inject_runtime_error(fault));
    tokio::time::sleep(Duration::from_millis(100)).await;
    manager.switch_flash_mode().await;
    manager.switch_flash_mode().await;
    manager.switch_flash_mode().await;

    let probe = backend.probe();
    assert!(probe.running);
    assert_eq!(probe.start_count, 1);
    assert_eq!(manager.snapshot(), before);
}

// ===== Focus and zoom =====

#[tokio::test]
async fn test_focus_on_back_camera() {
    let backend = VirtualBackend::with_default_devices();
    let manager = running_manager(&backend).await;
    let point = DevicePoint::new(0.2, 0.4);

    manager.focus(FocusRequest::at(point)).await;

    let settings = backend.camera(Position::Back).unwrap().settings();
    assert_eq!(settings.focus_point, Some(point));
    assert_eq!(settings.focus_mode, Some(FocusMode::AutoFocus));
    assert_eq!(settings.exposure_point, Some(point));
    assert_eq!(settings.exposure_mode, Some(ExposureMode::AutoExpose));
    assert!(settings.subject_area_change_monitoring);
}

#[tokio::test]
async fn test_focus_skips_unsupported_mode() {
    let backend = VirtualBackend::with_default_devices();
    let manager = running_manager(&backend).await;

    let request = FocusRequest {
        exposure_mode: ExposureMode::Custom,
        ..FocusRequest::at(DevicePoint::new(0.9, 0.1))
    };
    manager.switch_camera().await.unwrap();
    manager.focus(request).await;

    // Front camera: no focus point of interest, no custom exposure
    let settings = backend.camera(Position::Front).unwrap().settings();
    assert_eq!(settings.focus_point, None);
    assert_eq!(settings.exposure_point, None);
    assert_eq!(
        settings.exposure_mode,
        Some(ExposureMode::ContinuousAutoExposure)
    );
    assert!(settings.subject_area_change_monitoring);
}

#[tokio::test]
async fn test_focus_on_unavailable_device_is_skipped() {
    let backend = VirtualBackend::with_default_devices();
    let manager = running_manager(&backend).await;
    let camera = backend.camera(Position::Back).unwrap();
    let before = camera.settings();
    camera.set_available(false);

    manager.focus(FocusRequest::reset()).await;

    assert_eq!(camera.settings(), before);
    assert!(backend.probe().running);
}

#[tokio::test]
async fn test_zoom_is_clamped_to_device_range() {
    let backend = VirtualBackend::with_default_devices();
    let manager = running_manager(&backend).await;

    assert_eq!(manager.zoom(2.0).await, 2.0);
    assert_eq!(manager.finish_zoom(2.0).await, 2.0);
    assert_eq!(manager.zoom(10.0).await, 8.0);
    assert_eq!(manager.finish_zoom(0.01).await, 1.0);
    assert_eq!(manager.snapshot().zoom_factor, 1.0);

    let camera = backend.camera(Position::Back).unwrap();
    assert_eq!(camera.settings().zoom_factor, 1.0);
}

#[tokio::test]
async fn test_zoom_resets_after_switch() {
    let backend = VirtualBackend::with_default_devices();
    let manager = running_manager(&backend).await;

    manager.finish_zoom(3.0).await;
    manager.switch_camera().await.unwrap();
    assert_eq!(manager.snapshot().zoom_factor, 1.0);

    // Front camera tops out at 4x
    assert_eq!(manager.zoom(6.0).await, 4.0);
}

#[tokio::test]
async fn test_switch_round_trip_resets_device_zoom() {
    let backend = VirtualBackend::with_default_devices();
    let manager = running_manager(&backend).await;
    let back = backend.camera(Position::Back).unwrap();

    manager.finish_zoom(3.0).await;
    assert_eq!(back.settings().zoom_factor, 3.0);

    manager.switch_camera().await.unwrap();
    manager.switch_camera().await.unwrap();

    assert_eq!(manager.snapshot().zoom_factor, 1.0);
    assert_eq!(back.settings().zoom_factor, 1.0);
    let front = backend.camera(Position::Front).unwrap();
    assert_eq!(front.settings().zoom_factor, 1.0);
}

#[tokio::test]
async fn test_zoom_on_unavailable_device_is_skipped() {
    let backend = VirtualBackend::with_default_devices();
    let manager = running_manager(&backend).await;
    let camera = backend.camera(Position::Back).unwrap();
    assert_eq!(manager.finish_zoom(2.0).await, 2.0);
    let before = manager.snapshot();
    camera.set_available(false);

    assert_eq!(manager.zoom(2.0).await, 2.0);
    assert_eq!(manager.finish_zoom(3.0).await, 2.0);

    assert_eq!(manager.snapshot(), before);
    assert_eq!(camera.settings().zoom_factor, 2.0);
}
