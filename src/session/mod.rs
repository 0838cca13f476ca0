// SPDX-License-Identifier: GPL-3.0-only

//! Capture session lifecycle
//!
//! [`CaptureManager`] is the single entry point. It owns the session state on
//! a serial queue and exposes async operations whose results arrive exactly
//! once.
//!
//! # Architecture
//!
//! ```text
//!                    CaptureManager (async API)
//!                          │ run / dispatch
//!                          ▼
//! ┌──────────────────── SessionQueue thread ─────────────────────┐
//! │  SessionContext                                              │
//! │   ├── CaptureComponents   (session, inputs, outputs, modes)  │
//! │   ├── SessionConfigurator (access, wiring, start/stop, focus)│
//! │   └── ActionDispatcher    (capture, record, switch, zoom)    │
//! └───────────────┬──────────────────────────────────────────────┘
//!                 │ after every job
//!                 ▼
//!        watch::Sender<SessionSnapshot> ──► current_flash_mode(), ...
//!
//! fault watcher thread ── runtime errors ──► dispatch(recovery)
//! ```
//!
//! Callers never touch the session directly; everything that mutates it or
//! locks a device runs on the queue in submission order.

pub mod components;
pub mod configurator;
pub mod dispatcher;
pub mod queue;
pub mod registry;

pub use components::{CaptureComponents, SessionSnapshot, SessionStatus, SetupPhase, ZoomState};
pub use configurator::{FocusRequest, SessionConfigurator};
pub use dispatcher::{ActionDispatcher, Recording};
pub use queue::{SessionQueue, WeakSessionQueue};
pub use registry::DeviceRegistry;

use crate::backends::camera::{CameraBackend, DeviceInfo, FlashMode, Position, RuntimeErrorReceiver};
use crate::config::SessionConfig;
use crate::constants::threads;
use crate::errors::CameraError;
use crate::storage::MediaStorage;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// State owned by the session queue
pub struct SessionContext {
    components: CaptureComponents,
    configurator: SessionConfigurator,
    dispatcher: ActionDispatcher,
    snapshots: watch::Sender<SessionSnapshot>,
}

impl SessionContext {
    fn publish(&self) {
        self.snapshots.send_replace(self.components.snapshot());
    }
}

/// Camera session facade
///
/// Each instance owns an independent session. Dropping it stops the queue
/// once queued work has run; pending results then fail with
/// [`CameraError::Unknown`].
pub struct CaptureManager {
    queue: SessionQueue<SessionContext>,
    snapshots: watch::Receiver<SessionSnapshot>,
    default_position: Position,
}

impl CaptureManager {
    /// Create an unconfigured session on `backend`
    pub fn new(
        backend: Arc<dyn CameraBackend>,
        storage: Arc<dyn MediaStorage>,
        config: SessionConfig,
    ) -> std::io::Result<Self> {
        let mut session = backend.create_session();
        let runtime_errors = session.runtime_errors();
        let components = CaptureComponents::new(session, config.flash_mode);

        let registry = DeviceRegistry::new(Arc::clone(&backend));
        let configurator =
            SessionConfigurator::new(Arc::clone(&backend), registry.clone(), config.clone());
        let default_position = config.initial_position;
        let dispatcher = ActionDispatcher::new(backend, registry, storage, config);

        let (sender, snapshots) = watch::channel(components.snapshot());
        let context = SessionContext {
            components,
            configurator,
            dispatcher,
            snapshots: sender,
        };
        let queue = SessionQueue::spawn(threads::SESSION_QUEUE, context)?;

        match runtime_errors {
            Some(errors) => Self::watch_runtime_errors(queue.downgrade(), errors)?,
            None => warn!("Session has no runtime error stream, reset recovery disabled"),
        }

        info!("Capture manager created");
        Ok(Self {
            queue,
            snapshots,
            default_position,
        })
    }

    /// Forward session faults to the queue until the session goes away
    fn watch_runtime_errors(
        queue: WeakSessionQueue<SessionContext>,
        mut errors: RuntimeErrorReceiver,
    ) -> std::io::Result<()> {
        std::thread::Builder::new()
            .name(threads::FAULT_WATCHER.to_string())
            .spawn(move || {
                while let Some(runtime_error) = errors.blocking_recv() {
                    let Some(queue) = queue.upgrade() else {
                        break;
                    };
                    queue.dispatch(move |ctx| {
                        ctx.configurator
                            .handle_runtime_error(&mut ctx.components, &runtime_error);
                        ctx.publish();
                    });
                }
                debug!("Runtime error watcher stopped");
            })?;
        Ok(())
    }

    /// Run `job` on the queue and publish the resulting state
    async fn run<R: Send + 'static>(
        &self,
        job: impl FnOnce(&mut SessionContext) -> R + Send + 'static,
    ) -> Option<R> {
        self.queue
            .run(move |ctx| {
                let result = job(ctx);
                ctx.publish();
                result
            })
            .await
    }

    // ===== Lifecycle =====

    /// Check access and wire the session for `position`
    ///
    /// Returns immediately; the work is queued ahead of anything submitted
    /// later. Only the first call has an effect.
    pub fn prepare(&self, position: Position) {
        debug!(%position, "Queueing session preparation");
        self.queue.dispatch(move |ctx| {
            ctx.configurator.prepare(&mut ctx.components, position);
            ctx.publish();
        });
    }

    /// [`prepare`](Self::prepare) with the configured initial position
    pub fn prepare_default(&self) {
        self.prepare(self.default_position);
    }

    /// Start the pipeline if access was granted and configuration succeeded
    pub async fn start(&self) -> SessionStatus {
        match self.run(|ctx| ctx.configurator.start(&mut ctx.components)).await {
            Some(status) => status,
            None => self.status(),
        }
    }

    /// Stop the pipeline
    pub async fn stop(&self) {
        self.run(|ctx| ctx.configurator.stop(&mut ctx.components))
            .await;
    }

    // ===== Capture =====

    /// Capture a still image, yielding the encoded bytes
    pub async fn capture_image(&self) -> Result<Vec<u8>, CameraError> {
        let pending = self
            .run(|ctx| ctx.dispatcher.capture_still_image(&ctx.components))
            .await
            .ok_or(CameraError::Unknown)??;

        match pending.await {
            Ok(result) => result.map_err(CameraError::from),
            Err(_) => Err(CameraError::Unknown),
        }
    }

    /// Start recording to a fresh file from storage
    ///
    /// Fails with [`CameraError::AlreadyRecording`] if a recording is running.
    pub async fn start_recording(&self) -> Result<Recording, CameraError> {
        self.run(|ctx| ctx.dispatcher.start_recording(&ctx.components))
            .await
            .ok_or(CameraError::Unknown)?
    }

    /// Finish the current recording; does nothing when idle
    pub async fn stop_recording(&self) {
        self.run(|ctx| ctx.dispatcher.stop_recording(&ctx.components))
            .await;
    }

    // ===== Device control =====

    /// Switch to the camera on the other side, returning the new position
    pub async fn switch_camera(&self) -> Result<Position, CameraError> {
        self.run(|ctx| ctx.dispatcher.switch_camera(&mut ctx.components))
            .await
            .ok_or(CameraError::Unknown)?
    }

    /// Advance the flash mode and return it
    pub async fn switch_flash_mode(&self) -> FlashMode {
        match self
            .run(|ctx| ctx.dispatcher.switch_flash_mode(&mut ctx.components))
            .await
        {
            Some(mode) => mode,
            None => self.current_flash_mode(),
        }
    }

    /// Focus and expose at a point of interest
    pub async fn focus(&self, request: FocusRequest) {
        self.run(move |ctx| ctx.configurator.focus(&ctx.components, request))
            .await;
    }

    /// Apply a pinch scale; returns the zoom factor now applied
    pub async fn zoom(&self, scale: f64) -> f64 {
        match self
            .run(move |ctx| ctx.dispatcher.zoom(&mut ctx.components, scale))
            .await
        {
            Some(factor) => factor,
            None => self.snapshot().zoom_factor,
        }
    }

    /// End a pinch gesture at `scale`
    pub async fn finish_zoom(&self, scale: f64) -> f64 {
        match self
            .run(move |ctx| ctx.dispatcher.finish_zoom(&mut ctx.components, scale))
            .await
        {
            Some(factor) => factor,
            None => self.snapshot().zoom_factor,
        }
    }

    // ===== Observation =====

    /// Latest published state
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Receiver notified after every queued job
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.clone()
    }

    pub fn status(&self) -> SessionStatus {
        self.snapshots.borrow().status
    }

    pub fn current_flash_mode(&self) -> FlashMode {
        self.snapshots.borrow().flash_mode
    }

    /// The attached camera
    pub fn current_device(&self) -> Option<DeviceInfo> {
        self.snapshots.borrow().device.clone()
    }
}

impl std::fmt::Debug for CaptureManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureManager")
            .field("snapshot", &*self.snapshots.borrow())
            .finish()
    }
}
