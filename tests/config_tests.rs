// SPDX-License-Identifier: MPL-2.0

//! Integration tests for configuration module

use capture_session::backends::camera::{PhotoCodec, SessionPreset, StabilizationMode};
use capture_session::{FlashMode, Position, SessionConfig};
use std::path::PathBuf;

fn scratch_file() -> PathBuf {
    std::env::temp_dir()
        .join(format!("capture-session-config-{}", uuid::Uuid::new_v4()))
        .join("config.json")
}

#[test]
fn test_config_default() {
    let config = SessionConfig::default();

    assert_eq!(config.initial_position, Position::Back);
    assert_eq!(config.flash_mode, FlashMode::Off);
    assert_eq!(config.session_preset, SessionPreset::Hd1280x720);
    assert_eq!(config.photo_codec, PhotoCodec::Jpeg);
    assert_eq!(config.stabilization, StabilizationMode::Auto);
    assert!(
        config.request_microphone,
        "Microphone should be requested by default"
    );
}

#[test]
fn test_config_round_trip() {
    let path = scratch_file();
    let config = SessionConfig {
        initial_position: Position::Front,
        flash_mode: FlashMode::Auto,
        photo_codec: PhotoCodec::Png,
        request_microphone: false,
        photos_dir: Some(PathBuf::from("/tmp/photos")),
        ..Default::default()
    };

    // Parent directories are created on save
    config.save_to(&path).unwrap();
    let loaded = SessionConfig::load_from(&path).unwrap();
    assert_eq!(loaded, config);

    let _ = std::fs::remove_dir_all(path.parent().unwrap());
}

#[test]
fn test_config_malformed_file_is_an_error() {
    let path = scratch_file();
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, "{ not json").unwrap();

    assert!(SessionConfig::load_from(&path).is_err());

    let _ = std::fs::remove_dir_all(path.parent().unwrap());
}

#[test]
fn test_config_missing_file_is_an_error() {
    assert!(SessionConfig::load_from(&scratch_file()).is_err());
}

#[test]
fn test_config_unknown_fields_ignored() {
    let config: SessionConfig =
        serde_json::from_str(r#"{"initial_position":"Front","legacy_option":42}"#).unwrap();
    assert_eq!(config.initial_position, Position::Front);
    assert_eq!(config.flash_mode, FlashMode::Off);
}
