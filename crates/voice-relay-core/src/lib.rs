//! Voice-relay Core Library
//!
//! Bounded audio capture through a pluggable input device, and a framed
//! request/response bridge to a long-lived worker process over its
//! standard streams.
//!
//! # Example
//!
//! ```no_run
//! use voice_relay_core::{
//!     CaptureConfig, CoreResult, CpalDevice, Recorder, Transport, WorkerConfig, WorkerProcess,
//!     wav,
//! };
//!
//! use std::{sync::Arc, time::Duration};
//!
//! fn main() -> CoreResult<()> {
//!     let mut worker = WorkerProcess::new(WorkerConfig::new("python"));
//!     worker.start()?;
//!
//!     let config = CaptureConfig::default();
//!     let recorder = Recorder::new(Arc::new(CpalDevice));
//!     let samples = recorder.session(config).run_for(Duration::from_secs(5))?;
//!
//!     let reply = worker.send_audio(&wav::encode(&samples, &config))?;
//!     println!("Worker replied: {}", reply);
//!
//!     worker.stop();
//!     Ok(())
//! }
//! ```

mod audio;
mod error;
mod ipc;

pub use {
    audio::{
        AudioDevice, CaptureConfig, CaptureSession, CpalDevice, DEFAULT_BITS_PER_SAMPLE,
        DEFAULT_CHANNELS, DEFAULT_MAX_DURATION, DEFAULT_SAMPLE_RATE, DeviceHandle, Recorder,
        SessionState, SilentDevice, StopHandle, wav,
    },
    error::{CoreError, Result as CoreResult},
    ipc::{
        DEFAULT_MAX_FRAME_LEN, FrameCodec, KillHandle, LENGTH_PREFIX_LEN, PIPE_MODE_FLAG,
        Transport, WorkerConfig, WorkerProcess, WorkerState,
    },
};

#[cfg(test)]
mod tests;
