// SPDX-License-Identifier: GPL-3.0-only

//! Camera lookup by position

use crate::backends::camera::{
    CameraBackend, CaptureDevice, ExposureMode, FocusMode, Position, WhiteBalanceMode,
};
use crate::errors::CameraError;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Resolves logical positions to devices
#[derive(Clone)]
pub struct DeviceRegistry {
    backend: Arc<dyn CameraBackend>,
}

impl DeviceRegistry {
    pub fn new(backend: Arc<dyn CameraBackend>) -> Self {
        Self { backend }
    }

    /// First camera at `position` with continuous auto adjustments enabled
    ///
    /// `Unspecified` takes any camera. A device that cannot be locked is still
    /// returned; it just keeps its current settings.
    pub fn resolve_device(
        &self,
        position: Position,
    ) -> Result<Arc<dyn CaptureDevice>, CameraError> {
        let device = self
            .backend
            .discover_cameras(position)
            .into_iter()
            .next()
            .ok_or_else(|| {
                warn!(%position, "No camera at requested position");
                CameraError::NoCamerasAvailable
            })?;

        let info = device.info();
        info!(device = %info.name, position = %info.position, "Resolved camera");
        apply_auto_adjustments(device.as_ref());

        Ok(device)
    }

    /// Default microphone, if the platform has one
    pub fn microphone(&self) -> Option<Arc<dyn CaptureDevice>> {
        self.backend.default_microphone()
    }
}

/// Enable continuous focus, exposure and white balance where supported
fn apply_auto_adjustments(device: &dyn CaptureDevice) {
    let capabilities = device.capabilities();
    let mut config = match device.lock_for_configuration() {
        Ok(config) => config,
        Err(e) => {
            warn!(
                device = %device.info().id,
                error = %e,
                "Cannot lock device for auto adjustments"
            );
            return;
        }
    };

    if capabilities.supports_focus_mode(FocusMode::ContinuousAutoFocus) {
        config.set_focus_mode(FocusMode::ContinuousAutoFocus);
    }
    if capabilities.supports_exposure_mode(ExposureMode::ContinuousAutoExposure) {
        config.set_exposure_mode(ExposureMode::ContinuousAutoExposure);
    }
    if capabilities.supports_white_balance_mode(WhiteBalanceMode::ContinuousAutoWhiteBalance) {
        config.set_white_balance_mode(WhiteBalanceMode::ContinuousAutoWhiteBalance);
    }
    debug!(device = %device.info().id, "Applied auto adjustments");
}
