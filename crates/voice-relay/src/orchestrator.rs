//! Turns a trigger into "capture for a fixed time, then send the WAV to the
//! worker", one trigger at a time.

use crate::{AppResult, RecordingState};

use std::{
    sync::{Mutex, MutexGuard},
    time::{Duration, Instant},
};

use tracing::{debug, info, instrument, warn};
use uuid::Uuid;
use voice_relay_core::{CaptureConfig, Recorder, Transport, wav};

/// How a trigger ended when it did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// The worker's reply to the captured audio.
    Completed(String),
    /// Another trigger was still being handled; nothing was queued.
    Ignored,
    /// Cancelled during capture; the audio was discarded.
    Cancelled,
    /// The capture produced no samples, so nothing was sent.
    NoAudio,
}

/// Runs fixed-length captures and forwards them to the worker.
///
/// Shared between hotkey callbacks behind an `Arc`; the transport sits behind
/// a mutex so at most one request is ever in flight.
pub struct Orchestrator<T: Transport> {
    recorder: Recorder,
    capture: CaptureConfig,
    record_for: Duration,
    transport: Mutex<T>,
    state: Mutex<RecordingState>,
}

/// Returns the orchestrator to Idle however a trigger exits.
struct IdleOnDrop<'a> {
    state: &'a Mutex<RecordingState>,
}

impl Drop for IdleOnDrop<'_> {
    fn drop(&mut self) {
        *self.state.lock().unwrap_or_else(|e| e.into_inner()) = RecordingState::Idle;
    }
}

impl<T: Transport> Orchestrator<T> {
    /// Captures `record_for` (clamped to `capture.max_duration`) per trigger.
    pub fn new(recorder: Recorder, capture: CaptureConfig, record_for: Duration, transport: T) -> Self {
        Self {
            recorder,
            capture,
            record_for,
            transport: Mutex::new(transport),
            state: Mutex::new(RecordingState::Idle),
        }
    }

    /// Captures audio, sends it as WAV, and returns the worker's reply.
    ///
    /// Blocks for the capture and the worker round trip. A trigger that
    /// arrives while another is being handled returns `Ignored` at once.
    ///
    /// # Errors
    ///
    /// Capture and worker failures, wrapped as `AppError::Core`. The
    /// orchestrator is ready for the next trigger afterwards.
    #[instrument(skip(self))]
    pub fn trigger(&self) -> AppResult<TriggerOutcome> {
        let mut session = self.recorder.session(self.capture);
        let session_id = Uuid::new_v4();
        let started_at = Instant::now();

        {
            let mut state = self.lock_state();
            if !matches!(*state, RecordingState::Idle) {
                info!(session_id = %session_id, "Trigger ignored, previous one still running");
                return Ok(TriggerOutcome::Ignored);
            }
            *state = RecordingState::Recording {
                started_at,
                session_id,
                stop: session.stop_handle(),
                cancelled: false,
            };
        }
        let _idle = IdleOnDrop { state: &self.state };

        info!(
            session_id = %session_id,
            duration_ms = self.record_for.min(self.capture.max_duration).as_millis(),
            "Recording started"
        );

        let samples = session.run_for(self.record_for)?;

        {
            let mut state = self.lock_state();
            if matches!(*state, RecordingState::Recording { cancelled: true, .. }) {
                info!(session_id = %session_id, "Recording cancelled, audio discarded");
                return Ok(TriggerOutcome::Cancelled);
            }
            *state = RecordingState::Sending { session_id };
        }

        if samples.is_empty() {
            warn!(session_id = %session_id, "No audio captured, nothing sent");
            return Ok(TriggerOutcome::NoAudio);
        }

        let payload = wav::encode(&samples, &self.capture);
        debug!(
            session_id = %session_id,
            sample_count = samples.len(),
            payload_len = payload.len(),
            "Sending audio to worker"
        );

        let reply = self.transport().send_audio(&payload)?;

        info!(
            session_id = %session_id,
            elapsed_ms = started_at.elapsed().as_millis(),
            reply_len = reply.len(),
            "Worker replied"
        );

        Ok(TriggerOutcome::Completed(reply))
    }

    /// Stops the capture in progress and discards its audio.
    ///
    /// Returns false when nothing is recording; a request already sent to
    /// the worker is not interrupted.
    #[instrument(skip(self))]
    pub fn cancel(&self) -> bool {
        let mut state = self.lock_state();
        match &mut *state {
            RecordingState::Recording {
                session_id,
                stop,
                cancelled,
                started_at,
            } => {
                *cancelled = true;
                stop.stop();
                info!(
                    session_id = %session_id,
                    recorded_ms = started_at.elapsed().as_millis(),
                    "Cancel requested"
                );
                true
            }
            _ => {
                debug!("Nothing to cancel");
                false
            }
        }
    }

    /// Whether a trigger is being handled.
    pub fn is_busy(&self) -> bool {
        !matches!(*self.lock_state(), RecordingState::Idle)
    }

    /// Exclusive access to the transport, waiting for any request in flight.
    pub fn transport(&self) -> MutexGuard<'_, T> {
        self.transport.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_state(&self) -> MutexGuard<'_, RecordingState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}
