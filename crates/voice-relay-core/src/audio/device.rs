use crate::{CoreResult, audio::CaptureConfig};

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

/// Capability to open an audio input in a given format.
///
/// Implementations are picked at startup (`cpal` hardware or the silent
/// generator) and never leak platform handles past this boundary.
pub trait AudioDevice: Send + Sync {
    /// Opens the device for `config`.
    ///
    /// # Errors
    ///
    /// Returns `DeviceUnavailable` if no device exists, it is busy, or it
    /// cannot capture at the requested rate and channel count.
    fn acquire(&self, config: &CaptureConfig) -> CoreResult<Box<dyn DeviceHandle>>;
}

/// An acquired input. Dropping the handle releases the device.
pub trait DeviceHandle: Send {
    /// Blocks until `max_samples` interleaved samples are captured or `stop`
    /// is signalled, whichever comes first.
    ///
    /// A stream error mid-capture ends the fill early; the samples gathered
    /// so far are still returned.
    fn fill(&mut self, max_samples: usize, stop: &StopHandle) -> CoreResult<Vec<i16>>;
}

/// Clonable stop signal for one capture session.
#[derive(Debug, Clone, Default)]
pub struct StopHandle {
    flag: Arc<AtomicBool>,
}

impl StopHandle {
    /// Creates an unsignalled handle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests the capture to end.
    pub fn stop(&self) {
        self.flag.store(true, Ordering::Release);
    }

    /// Whether a stop has been requested.
    pub fn is_stopped(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}
