// SPDX-License-Identifier: MPL-2.0

//! Error types for the capture session

use crate::backends::camera::BackendError;
use std::fmt;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Top-level error of the command-line front end
#[derive(Debug, Clone)]
pub enum AppError {
    /// Capture session errors
    Camera(CameraError),
    /// Storage/filesystem errors
    Storage(StorageError),
    /// Configuration errors
    Config(String),
    /// Generic error with message
    Other(String),
}

/// Errors surfaced by the capture session
///
/// Setup failures are reported once through the start status, while action
/// failures (capture, record, switch) come back from the call that caused them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CameraError {
    /// No camera matches the requested position
    NoCamerasAvailable,
    /// The action does not make sense in the current state
    InvalidOperation(String),
    /// The session refused the camera input
    FailedToAddCameraInput,
    /// The session refused the microphone input
    FailedToAddAudioInput,
    /// The session refused the still-image output
    FailedToAddPhotoOutput,
    /// The session refused the movie-file output
    FailedToAddMovieOutput,
    /// A device could not be wrapped in an input
    InputsAreInvalid,
    /// A recording is already being written
    AlreadyRecording,
    /// Platform error during capture or recording
    Backend(BackendError),
    /// No writable location for captured media
    Storage(StorageError),
    /// The session went away before answering
    Unknown,
}

/// Errors from the media storage collaborator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// No directory is configured and the platform has no default
    DirectoryUnavailable(String),
    /// Filesystem error
    Io(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Camera(e) => write!(f, "Camera error: {}", e),
            AppError::Storage(e) => write!(f, "Storage error: {}", e),
            AppError::Config(msg) => write!(f, "Configuration error: {}", msg),
            AppError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl fmt::Display for CameraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CameraError::NoCamerasAvailable => write!(f, "No cameras available"),
            CameraError::InvalidOperation(msg) => write!(f, "Invalid operation: {}", msg),
            CameraError::FailedToAddCameraInput => write!(f, "Failed to add camera input"),
            CameraError::FailedToAddAudioInput => write!(f, "Failed to add audio input"),
            CameraError::FailedToAddPhotoOutput => write!(f, "Failed to add photo output"),
            CameraError::FailedToAddMovieOutput => write!(f, "Failed to add movie output"),
            CameraError::InputsAreInvalid => write!(f, "Inputs are invalid"),
            CameraError::AlreadyRecording => write!(f, "Recording already in progress"),
            CameraError::Backend(e) => write!(f, "Backend error: {}", e),
            CameraError::Storage(e) => write!(f, "Storage error: {}", e),
            CameraError::Unknown => write!(f, "Unknown error"),
        }
    }
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::DirectoryUnavailable(what) => {
                write!(f, "No {} directory available", what)
            }
            StorageError::Io(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}
impl std::error::Error for CameraError {}
impl std::error::Error for StorageError {}

impl From<CameraError> for AppError {
    fn from(err: CameraError) -> Self {
        AppError::Camera(err)
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        AppError::Storage(err)
    }
}

impl From<StorageError> for CameraError {
    fn from(err: StorageError) -> Self {
        CameraError::Storage(err)
    }
}

impl From<BackendError> for CameraError {
    fn from(err: BackendError) -> Self {
        CameraError::Backend(err)
    }
}

impl From<String> for AppError {
    fn from(msg: String) -> Self {
        AppError::Other(msg)
    }
}

impl From<&str> for AppError {
    fn from(msg: &str) -> Self {
        AppError::Other(msg.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Storage(err.into())
    }
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Config(err.to_string())
    }
}
