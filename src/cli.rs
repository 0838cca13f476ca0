// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands for session operations
//!
//! This module provides command-line functionality for:
//! - Listing available devices
//! - Taking photos
//! - Recording videos
//! - A scripted walk through the live controls
//!
//! Commands run against the virtual backend.

use capture_session::backends::camera::{CameraBackend, FlashMode, Position, VirtualBackend};
use capture_session::constants::{DEFAULT_RECORDING_DURATION, TIMESTAMP_FORMAT};
use capture_session::errors::{AppError, AppResult};
use capture_session::storage::{ContentType, DirectoryStorage};
use capture_session::{CaptureManager, DevicePoint, FocusRequest, SessionConfig, SessionStatus};
use chrono::Local;
use clap::ValueEnum;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Camera side accepted on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CameraSide {
    Front,
    Back,
    /// Whichever camera is found first
    Any,
}

impl From<CameraSide> for Position {
    fn from(side: CameraSide) -> Self {
        match side {
            CameraSide::Front => Position::Front,
            CameraSide::Back => Position::Back,
            CameraSide::Any => Position::Unspecified,
        }
    }
}

/// Flash mode accepted on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FlashArg {
    Auto,
    On,
    Off,
}

impl From<FlashArg> for FlashMode {
    fn from(flash: FlashArg) -> Self {
        match flash {
            FlashArg::Auto => FlashMode::Auto,
            FlashArg::On => FlashMode::On,
            FlashArg::Off => FlashMode::Off,
        }
    }
}

/// List all available devices
pub fn list_devices() -> AppResult<()> {
    let backend = VirtualBackend::with_default_devices();
    let cameras = backend.discover_cameras(Position::Unspecified);

    if cameras.is_empty() {
        println!("No cameras found.");
    } else {
        println!("Available cameras:");
        println!();
        for (index, camera) in cameras.iter().enumerate() {
            let info = camera.info();
            let capabilities = camera.capabilities();
            println!("  [{}] {} ({})", index, info.name, info.position);
            println!("      Id: {}", info.id);
            println!(
                "      Flash: {}, max zoom: {:.1}x, focus point: {}",
                if capabilities.has_flash { "yes" } else { "no" },
                capabilities.max_zoom_factor,
                if capabilities.focus_point_of_interest {
                    "yes"
                } else {
                    "no"
                },
            );
            println!();
        }
    }

    match backend.default_microphone() {
        Some(microphone) => println!("Microphone: {}", microphone.info().name),
        None => println!("No microphone found."),
    }

    Ok(())
}

/// Take a photo with the camera at `side`
pub fn take_photo(
    side: CameraSide,
    flash: Option<FlashArg>,
    output: Option<PathBuf>,
) -> AppResult<()> {
    let mut config = SessionConfig::load();
    if let Some(flash) = flash {
        config.flash_mode = flash.into();
    }
    let codec = config.photo_codec;

    let (output_dir, output_file) = split_output(output, || {
        Ok(DirectoryStorage::from_config(&config)?.photos_dir().to_path_buf())
    })?;
    std::fs::create_dir_all(&output_dir)?;

    let storage = DirectoryStorage::new(&output_dir, &output_dir);
    let manager = start_manager(storage, config, side.into())?;

    println!("Capturing...");
    let rt = tokio::runtime::Runtime::new()?;
    let data = rt.block_on(async {
        let data = manager.capture_image().await;
        manager.stop().await;
        data
    })?;

    let path = match output_file {
        Some(path) => path,
        None => output_dir.join(format!(
            "photo_{}.{}",
            Local::now().format(TIMESTAMP_FORMAT),
            ContentType::Image(codec).extension()
        )),
    };
    std::fs::write(&path, &data)?;

    println!("Photo saved: {} ({} bytes)", path.display(), data.len());
    Ok(())
}

/// Record a video of `duration` seconds
pub fn record_video(side: CameraSide, duration: u64, output: Option<PathBuf>) -> AppResult<()> {
    let config = SessionConfig::load();
    let (videos_dir, output_file) = split_output(output, || {
        Ok(DirectoryStorage::from_config(&config)?.videos_dir().to_path_buf())
    })?;
    let storage = DirectoryStorage::new(&videos_dir, &videos_dir);
    let manager = start_manager(storage, config, side.into())?;

    let duration = if duration == 0 {
        DEFAULT_RECORDING_DURATION
    } else {
        Duration::from_secs(duration)
    };

    let rt = tokio::runtime::Runtime::new()?;
    let recorded = rt.block_on(async {
        let recording = manager.start_recording().await?;
        println!("Recording to {} for {:?}...", recording.path().display(), duration);

        tokio::time::sleep(duration).await;
        manager.stop_recording().await;
        let path = recording.finished().await;
        manager.stop().await;
        path
    })?;

    let path = match output_file {
        Some(path) => {
            std::fs::rename(&recorded, &path)?;
            path
        }
        None => {
            let named = videos_dir.join(format!(
                "video_{}.{}",
                Local::now().format(TIMESTAMP_FORMAT),
                ContentType::Video.extension()
            ));
            std::fs::rename(&recorded, &named)?;
            named
        }
    };

    println!("Video saved: {}", path.display());
    Ok(())
}

/// Exercise every live control once and print the resulting state
pub fn run_demo() -> AppResult<()> {
    let config = SessionConfig::default();
    let manager = start_manager(DirectoryStorage::temporary(), config, Position::Back)?;

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        print_snapshot("started", &manager);

        let position = manager.switch_camera().await?;
        println!("Switched to {} camera", position);

        for _ in 0..FlashMode::ALL.len() {
            println!("Flash: {}", manager.switch_flash_mode().await);
        }

        manager
            .focus(FocusRequest::at(DevicePoint::new(0.3, 0.6)))
            .await;
        println!("Focused at (0.3, 0.6)");

        manager.zoom(1.5).await;
        let factor = manager.finish_zoom(2.0).await;
        println!("Zoom: {:.1}x", factor);

        let data = manager.capture_image().await?;
        println!("Captured {} bytes", data.len());

        let recording = manager.start_recording().await?;
        tokio::time::sleep(Duration::from_millis(200)).await;
        manager.stop_recording().await;
        let path = recording.finished().await?;
        println!("Recorded {}", path.display());
        let _ = std::fs::remove_file(&path);

        print_snapshot("finished", &manager);
        manager.stop().await;
        Ok::<(), AppError>(())
    })
}

/// Split `--output` into a directory and an optional explicit file name
fn split_output(
    output: Option<PathBuf>,
    default_dir: impl FnOnce() -> AppResult<PathBuf>,
) -> AppResult<(PathBuf, Option<PathBuf>)> {
    match output {
        Some(path) if path.is_dir() => Ok((path, None)),
        Some(path) => {
            let dir = path
                .parent()
                .filter(|parent| !parent.as_os_str().is_empty())
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("."));
            Ok((dir, Some(path)))
        }
        None => Ok((default_dir()?, None)),
    }
}

/// Prepare and start a session, failing unless it is authorized
fn start_manager(
    storage: DirectoryStorage,
    config: SessionConfig,
    position: Position,
) -> AppResult<CaptureManager> {
    let backend: Arc<dyn CameraBackend> = Arc::new(VirtualBackend::with_default_devices());
    let manager = CaptureManager::new(backend, Arc::new(storage), config)?;
    manager.prepare(position);

    let rt = tokio::runtime::Runtime::new()?;
    match rt.block_on(manager.start()) {
        SessionStatus::Authorized => {}
        SessionStatus::NotAuthorized => {
            return Err("Camera access was denied".into());
        }
        status => {
            return Err(format!("Camera session unavailable: {}", status).into());
        }
    }

    if let Some(device) = manager.current_device() {
        println!("Using camera: {}", device.name);
    }
    Ok(manager)
}

fn print_snapshot(label: &str, manager: &CaptureManager) {
    let snapshot = manager.snapshot();
    println!(
        "[{}] status: {}, running: {}, camera: {}, flash: {}, zoom: {:.1}x",
        label,
        snapshot.status,
        snapshot.running,
        snapshot
            .position
            .map(|p| p.to_string())
            .unwrap_or_else(|| "none".to_string()),
        snapshot.flash_mode,
        snapshot.zoom_factor,
    );
}
