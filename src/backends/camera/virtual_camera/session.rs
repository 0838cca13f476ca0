// SPDX-License-Identifier: GPL-3.0-only

//! Simulated capture pipeline

use super::{Shared, abort_recordings, lock};
use crate::backends::camera::types::*;
use crate::backends::camera::{CaptureSession, DeviceInput, RuntimeErrorReceiver, SessionOutput};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// In-memory [`CaptureSession`]
///
/// Refuses input/output mutations outside a configuration bracket and counts
/// them in [`SessionProbe::unbracketed_mutations`](super::SessionProbe).
pub struct VirtualSession {
    shared: Arc<Shared>,
    // Keeps the runtime error channel open for as long as the session lives
    _runtime_sender: mpsc::UnboundedSender<SessionRuntimeError>,
    runtime_receiver: Option<RuntimeErrorReceiver>,
}

impl VirtualSession {
    pub(crate) fn new(
        shared: Arc<Shared>,
        runtime_sender: mpsc::UnboundedSender<SessionRuntimeError>,
        runtime_receiver: RuntimeErrorReceiver,
    ) -> Self {
        Self {
            shared,
            _runtime_sender: runtime_sender,
            runtime_receiver: Some(runtime_receiver),
        }
    }

    /// Record an out-of-bracket mutation; returns true if the mutation may proceed
    fn check_bracket(&self, what: &str) -> bool {
        let mut pipeline = lock(&self.shared.pipeline);
        if pipeline.bracket_depth == 0 {
            pipeline.unbracketed_mutations += 1;
            warn!(operation = what, "Session mutated outside configuration bracket");
            return false;
        }
        true
    }
}

impl CaptureSession for VirtualSession {
    fn begin_configuration(&mut self) {
        let mut pipeline = lock(&self.shared.pipeline);
        pipeline.bracket_depth += 1;
        debug!(depth = pipeline.bracket_depth, "Begin configuration");
    }

    fn commit_configuration(&mut self) {
        let mut pipeline = lock(&self.shared.pipeline);
        pipeline.bracket_depth = pipeline.bracket_depth.saturating_sub(1);
        debug!(depth = pipeline.bracket_depth, "Commit configuration");
    }

    fn can_add_input(&self, input: &DeviceInput) -> bool {
        let faults = self.shared.faults();
        let pipeline = lock(&self.shared.pipeline);

        let refused = match input.kind() {
            DeviceKind::Camera => faults
                .rejected_camera_positions
                .contains(&input.info().position),
            DeviceKind::Microphone => faults.reject_microphone_input,
        };
        // One input per device kind
        let occupied = pipeline.inputs.iter().any(|info| info.kind == input.kind());

        !refused && !occupied
    }

    fn add_input(&mut self, input: &DeviceInput) -> BackendResult<()> {
        if !self.check_bracket("add_input") {
            return Err(BackendError::NotConfiguring);
        }
        if !self.can_add_input(input) {
            return Err(BackendError::InputRejected(input.id().to_string()));
        }

        debug!(input = %input.id(), "Input attached");
        lock(&self.shared.pipeline).inputs.push(input.info().clone());
        Ok(())
    }

    fn remove_input(&mut self, input: &DeviceInput) {
        if !self.check_bracket("remove_input") {
            return;
        }

        debug!(input = %input.id(), "Input removed");
        lock(&self.shared.pipeline)
            .inputs
            .retain(|info| info.id != input.id());
    }

    fn can_add_output(&self, output: &SessionOutput) -> bool {
        let faults = self.shared.faults();
        let pipeline = lock(&self.shared.pipeline);

        let refused = match output.kind() {
            OutputKind::Photo => faults.reject_photo_output,
            OutputKind::Movie => faults.reject_movie_output,
        };

        !refused && !pipeline.outputs.contains(&output.kind())
    }

    fn add_output(&mut self, output: &SessionOutput) -> BackendResult<()> {
        if !self.check_bracket("add_output") {
            return Err(BackendError::NotConfiguring);
        }
        if !self.can_add_output(output) {
            return Err(BackendError::OutputRejected(format!("{:?}", output.kind())));
        }

        debug!(output = ?output.kind(), "Output attached");
        lock(&self.shared.pipeline).outputs.push(output.kind());
        Ok(())
    }

    fn remove_output(&mut self, output: &SessionOutput) {
        if !self.check_bracket("remove_output") {
            return;
        }

        let kind = output.kind();
        lock(&self.shared.pipeline).outputs.retain(|k| *k != kind);
    }

    fn can_set_preset(&self, preset: SessionPreset) -> bool {
        !self.shared.faults().unsupported_presets.contains(&preset)
    }

    fn set_preset(&mut self, preset: SessionPreset) {
        if self.can_set_preset(preset) {
            lock(&self.shared.pipeline).preset = preset;
        }
    }

    fn preset(&self) -> SessionPreset {
        lock(&self.shared.pipeline).preset
    }

    fn start_running(&mut self) -> BackendResult<()> {
        if self.shared.faults().fail_start {
            return Err(BackendError::Other("simulated start failure".to_string()));
        }

        let mut pipeline = lock(&self.shared.pipeline);
        if !pipeline.running {
            pipeline.running = true;
            pipeline.start_count += 1;
            info!(starts = pipeline.start_count, "Virtual session running");
        }
        Ok(())
    }

    fn stop_running(&mut self) {
        let was_running = std::mem::replace(&mut lock(&self.shared.pipeline).running, false);
        if was_running {
            info!("Virtual session stopped");
            abort_recordings(&self.shared, &BackendError::SessionNotRunning);
        }
    }

    fn is_running(&self) -> bool {
        lock(&self.shared.pipeline).running
    }

    fn runtime_errors(&mut self) -> Option<RuntimeErrorReceiver> {
        self.runtime_receiver.take()
    }
}
