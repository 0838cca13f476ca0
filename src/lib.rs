// SPDX-License-Identifier: MPL-2.0

//! Capture Session - camera session lifecycle and device configuration
//!
//! This library negotiates camera and microphone access, wires capture
//! devices into a live pipeline, and serializes every change to that pipeline
//! (start/stop, camera switch, focus, zoom, flash, capture, recording) on one
//! queue.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`session`]: The session facade, serial queue, configurator and dispatcher
//! - [`backends`]: Platform abstraction and the in-memory virtual backend
//! - [`config`]: Persisted session settings
//! - [`storage`]: File locations for captured media
//! - [`errors`]: Error types
//!
//! # Example
//!
//! ```no_run
//! use capture_session::backends::camera::VirtualBackend;
//! use capture_session::storage::DirectoryStorage;
//! use capture_session::{CaptureManager, Position, SessionConfig};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = CaptureManager::new(
//!     Arc::new(VirtualBackend::with_default_devices()),
//!     Arc::new(DirectoryStorage::temporary()),
//!     SessionConfig::default(),
//! )?;
//! manager.prepare(Position::Back);
//! manager.start().await;
//! let jpeg = manager.capture_image().await?;
//! println!("captured {} bytes", jpeg.len());
//! # Ok(())
//! # }
//! ```

pub mod backends;
pub mod config;
pub mod constants;
pub mod errors;
pub mod session;
pub mod storage;

// Re-export commonly used types
pub use backends::camera::{DevicePoint, FlashMode, Position};
pub use config::SessionConfig;
pub use errors::{AppError, CameraError, StorageError};
pub use session::{CaptureManager, FocusRequest, Recording, SessionSnapshot, SessionStatus};
