use crate::{
    AppResult,
    config::{DEFAULT_WORKER_PROGRAM, DEFAULT_WORKER_SCRIPT, positive_secs},
};

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use voice_relay_core::{DEFAULT_MAX_FRAME_LEN, WorkerConfig};

/// How to launch the worker process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerSettings {
    /// Executable to launch.
    pub program: PathBuf,
    /// Arguments passed before the pipe-mode marker.
    pub args: Vec<String>,
    /// Largest request or response frame accepted.
    pub max_frame_bytes: usize,
    /// Bound on each response wait. Absent waits forever.
    pub response_timeout_secs: Option<f64>,
}

impl WorkerSettings {
    /// Bridge configuration for `WorkerProcess`.
    ///
    /// # Errors
    ///
    /// `ConfigError` for a non-positive response timeout.
    #[track_caller]
    pub fn worker_config(&self) -> AppResult<WorkerConfig> {
        let response_timeout = self
            .response_timeout_secs
            .map(|secs| positive_secs("worker.response_timeout_secs", secs))
            .transpose()?;

        Ok(WorkerConfig {
            program: self.program.clone(),
            args: self.args.clone(),
            max_frame_len: self.max_frame_bytes,
            response_timeout,
        })
    }
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            program: PathBuf::from(DEFAULT_WORKER_PROGRAM),
            args: vec![DEFAULT_WORKER_SCRIPT.to_string()],
            max_frame_bytes: DEFAULT_MAX_FRAME_LEN,
            response_timeout_secs: None,
        }
    }
}
