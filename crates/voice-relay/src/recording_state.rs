use std::time::Instant;

use uuid::Uuid;
use voice_relay_core::StopHandle;

/// Where the orchestrator is in handling a trigger.
#[derive(Debug, Clone)]
pub enum RecordingState {
    /// Ready for the next trigger.
    Idle,
    /// Capturing audio.
    Recording {
        /// When recording started.
        started_at: Instant,
        /// Unique session ID for log correlation.
        session_id: Uuid,
        /// Ends the capture early.
        stop: StopHandle,
        /// Set once cancellation was requested; the audio is discarded.
        cancelled: bool,
    },
    /// Waiting for the worker's reply.
    Sending {
        /// Unique session ID for log correlation.
        session_id: Uuid,
    },
}
