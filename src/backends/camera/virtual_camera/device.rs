// SPDX-License-Identifier: GPL-3.0-only

//! Simulated capture devices

use super::lock;
use crate::backends::camera::types::*;
use crate::backends::camera::{CaptureDevice, DeviceConfiguration};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, TryLockError};
use tracing::debug;

/// Parameters currently applied to a virtual device
///
/// `None` means the value was never written through a configuration lock.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceSettings {
    pub focus_mode: Option<FocusMode>,
    pub focus_point: Option<DevicePoint>,
    pub exposure_mode: Option<ExposureMode>,
    pub exposure_point: Option<DevicePoint>,
    pub white_balance_mode: Option<WhiteBalanceMode>,
    pub subject_area_change_monitoring: bool,
    pub smooth_auto_focus: bool,
    pub zoom_factor: f64,
    /// How many times the configuration lock was acquired
    pub lock_count: usize,
}

impl DeviceSettings {
    fn initial(capabilities: &DeviceCapabilities) -> Self {
        Self {
            focus_mode: None,
            focus_point: None,
            exposure_mode: None,
            exposure_point: None,
            white_balance_mode: None,
            subject_area_change_monitoring: false,
            smooth_auto_focus: capabilities.smooth_auto_focus,
            zoom_factor: 1.0,
            lock_count: 0,
        }
    }
}

/// An in-memory camera or microphone
#[derive(Debug)]
pub struct VirtualDevice {
    info: DeviceInfo,
    capabilities: DeviceCapabilities,
    available: AtomicBool,
    settings: Mutex<DeviceSettings>,
}

impl VirtualDevice {
    pub fn new(info: DeviceInfo, capabilities: DeviceCapabilities) -> Self {
        let settings = DeviceSettings::initial(&capabilities);
        Self {
            info,
            capabilities,
            available: AtomicBool::new(true),
            settings: Mutex::new(settings),
        }
    }

    /// A camera at `position` with the controls a typical phone sensor has
    ///
    /// Back cameras get every auto mode, both points of interest, smooth
    /// auto-focus, a flash and 8x zoom. Front cameras are fixed-focus with
    /// exposure point of interest only, no flash and 4x zoom.
    pub fn camera(position: Position, index: usize) -> Self {
        let capabilities = match position {
            Position::Front => DeviceCapabilities {
                focus_modes: vec![FocusMode::Locked],
                exposure_modes: vec![
                    ExposureMode::Locked,
                    ExposureMode::AutoExpose,
                    ExposureMode::ContinuousAutoExposure,
                ],
                white_balance_modes: vec![
                    WhiteBalanceMode::Locked,
                    WhiteBalanceMode::ContinuousAutoWhiteBalance,
                ],
                focus_point_of_interest: false,
                exposure_point_of_interest: true,
                smooth_auto_focus: false,
                has_flash: false,
                max_zoom_factor: 4.0,
            },
            Position::Back | Position::Unspecified => DeviceCapabilities {
                focus_modes: vec![
                    FocusMode::Locked,
                    FocusMode::AutoFocus,
                    FocusMode::ContinuousAutoFocus,
                ],
                exposure_modes: vec![
                    ExposureMode::Locked,
                    ExposureMode::AutoExpose,
                    ExposureMode::ContinuousAutoExposure,
                    ExposureMode::Custom,
                ],
                white_balance_modes: vec![
                    WhiteBalanceMode::Locked,
                    WhiteBalanceMode::AutoWhiteBalance,
                    WhiteBalanceMode::ContinuousAutoWhiteBalance,
                ],
                focus_point_of_interest: true,
                exposure_point_of_interest: true,
                smooth_auto_focus: true,
                has_flash: true,
                max_zoom_factor: 8.0,
            },
        };

        Self::new(Self::camera_info(position, index), capabilities)
    }

    /// A camera with explicit capabilities
    pub fn camera_with(position: Position, index: usize, capabilities: DeviceCapabilities) -> Self {
        Self::new(Self::camera_info(position, index), capabilities)
    }

    pub fn microphone() -> Self {
        Self::new(
            DeviceInfo {
                id: "virtual-microphone-0".to_string(),
                name: "Virtual Microphone".to_string(),
                kind: DeviceKind::Microphone,
                position: Position::Unspecified,
            },
            DeviceCapabilities::none(),
        )
    }

    fn camera_info(position: Position, index: usize) -> DeviceInfo {
        let side = match position {
            Position::Front => "Front",
            Position::Back => "Back",
            Position::Unspecified => "External",
        };
        DeviceInfo {
            id: format!("virtual-camera-{}-{}", position, index),
            name: format!("Virtual {} Camera", side),
            kind: DeviceKind::Camera,
            position,
        }
    }

    /// Snapshot of the applied parameters
    pub fn settings(&self) -> DeviceSettings {
        lock(&self.settings).clone()
    }

    /// Simulate the device disappearing (or coming back)
    pub fn set_available(&self, available: bool) {
        debug!(device = %self.info.id, available, "Virtual device availability changed");
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }
}

impl CaptureDevice for VirtualDevice {
    fn info(&self) -> DeviceInfo {
        self.info.clone()
    }

    fn capabilities(&self) -> DeviceCapabilities {
        self.capabilities.clone()
    }

    fn lock_for_configuration(&self) -> BackendResult<Box<dyn DeviceConfiguration + '_>> {
        if !self.is_available() {
            return Err(BackendError::DeviceUnavailable(self.info.id.clone()));
        }

        let mut settings = match self.settings.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
            Err(TryLockError::WouldBlock) => {
                return Err(BackendError::DeviceBusy(self.info.id.clone()));
            }
        };
        settings.lock_count += 1;

        Ok(Box::new(VirtualDeviceLock { settings }))
    }
}

/// Configuration lock on a [`VirtualDevice`], released on drop
struct VirtualDeviceLock<'a> {
    settings: MutexGuard<'a, DeviceSettings>,
}

impl DeviceConfiguration for VirtualDeviceLock<'_> {
    fn set_focus_mode(&mut self, mode: FocusMode) {
        self.settings.focus_mode = Some(mode);
    }

    fn set_focus_point_of_interest(&mut self, point: DevicePoint) {
        self.settings.focus_point = Some(point);
    }

    fn set_exposure_mode(&mut self, mode: ExposureMode) {
        self.settings.exposure_mode = Some(mode);
    }

    fn set_exposure_point_of_interest(&mut self, point: DevicePoint) {
        self.settings.exposure_point = Some(point);
    }

    fn set_white_balance_mode(&mut self, mode: WhiteBalanceMode) {
        self.settings.white_balance_mode = Some(mode);
    }

    fn set_subject_area_change_monitoring(&mut self, enabled: bool) {
        self.settings.subject_area_change_monitoring = enabled;
    }

    fn set_smooth_auto_focus(&mut self, enabled: bool) {
        self.settings.smooth_auto_focus = enabled;
    }

    fn set_zoom_factor(&mut self, factor: f64) {
        self.settings.zoom_factor = factor;
    }
}
