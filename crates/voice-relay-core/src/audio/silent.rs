use crate::{
    CoreResult,
    audio::{AudioDevice, CaptureConfig, DeviceHandle, StopHandle},
};

use std::time::{Duration, Instant};

use tracing::{debug, instrument};

/// Pacing granularity for generated audio.
const CHUNK_INTERVAL: Duration = Duration::from_millis(10);

/// Headless input that produces silence in real time.
///
/// Used where no capture backend is available so the rest of the pipeline
/// (framing, worker round trip) can still be driven end to end.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentDevice;

impl AudioDevice for SilentDevice {
    #[track_caller]
    #[instrument(skip(self))]
    fn acquire(&self, config: &CaptureConfig) -> CoreResult<Box<dyn DeviceHandle>> {
        config.validate()?;

        let chunk_frames = (f64::from(config.sample_rate) * CHUNK_INTERVAL.as_secs_f64()) as usize;
        let chunk_len = chunk_frames.max(1) * usize::from(config.channels);

        debug!(chunk_len, "Silent device acquired");

        Ok(Box::new(SilentHandle { chunk_len }))
    }
}

struct SilentHandle {
    chunk_len: usize,
}

impl DeviceHandle for SilentHandle {
    fn fill(&mut self, max_samples: usize, stop: &StopHandle) -> CoreResult<Vec<i16>> {
        let mut samples = Vec::with_capacity(max_samples);
        let started = Instant::now();
        let mut chunks: u32 = 0;

        while samples.len() < max_samples && !stop.is_stopped() {
            let take = self.chunk_len.min(max_samples - samples.len());
            samples.resize(samples.len() + take, 0);
            chunks += 1;

            // Sleep to the chunk's wall-clock deadline so long fills don't drift.
            let deadline = CHUNK_INTERVAL * chunks;
            if let Some(remaining) = deadline.checked_sub(started.elapsed()) {
                std::thread::sleep(remaining);
            }
        }

        Ok(samples)
    }
}
