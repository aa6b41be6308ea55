use std::{panic::Location, path::PathBuf, time::Duration};

use error_location::ErrorLocation;
use thiserror::Error;

/// Capture and worker-channel errors with source location tracking.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Audio device missing, busy, or unable to honor the requested format.
    #[error("Audio device unavailable: {reason} {location}")]
    DeviceUnavailable {
        /// Description of why the device could not be used.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Another capture session is already recording.
    #[error("A capture session is already recording {location}")]
    AlreadyRecording {
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The session has already stopped and cannot record again.
    #[error("Capture session already finished {location}")]
    SessionFinished {
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The worker executable could not be launched.
    #[error("Failed to spawn worker {program:?}: {source} {location}")]
    SpawnError {
        /// Program that failed to launch.
        program: PathBuf,
        /// Underlying launch error.
        #[source]
        source: std::io::Error,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Request issued while the worker is not running.
    #[error("Worker is not running {location}")]
    NotRunning {
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Framing violation on the worker channel.
    #[error("Protocol error: {reason} {location}")]
    ProtocolError {
        /// Description of the violation.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Pipe read or write failure.
    #[error("IO error: {source} {location}")]
    Io {
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The worker did not answer within the configured response timeout.
    #[error("Worker did not respond within {waited:?} {location}")]
    Timeout {
        /// How long the request waited.
        waited: Duration,
        /// Source location where error occurred.
        location: ErrorLocation,
    },
}

impl CoreError {
    /// Whether the error leaves the worker channel unusable.
    pub fn is_channel_fatal(&self) -> bool {
        matches!(
            self,
            CoreError::Io { .. } | CoreError::ProtocolError { .. } | CoreError::Timeout { .. }
        )
    }
}

impl From<std::io::Error> for CoreError {
    #[track_caller]
    fn from(source: std::io::Error) -> Self {
        CoreError::Io {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

/// Result type alias using [`CoreError`].
pub type Result<T> = std::result::Result<T, CoreError>;
