use crate::{
    CoreError, CoreResult,
    audio::{AudioDevice, CaptureConfig, DeviceHandle, StopHandle},
};

use std::{
    panic::Location,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use cpal::{
    Device, FromSample, Sample, SampleFormat, SizedSample, Stream, StreamConfig,
    traits::{DeviceTrait, HostTrait, StreamTrait},
};
use error_location::ErrorLocation;
use tracing::{debug, error, info, instrument, warn};

/// How often `fill` checks for stop, full buffer, or stream failure.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Formats we can convert to i16 without resampling, in preference order.
const ACCEPTED_FORMATS: [SampleFormat; 3] = [SampleFormat::I16, SampleFormat::F32, SampleFormat::U16];

/// The host's default microphone, opened through `cpal`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CpalDevice;

impl AudioDevice for CpalDevice {
    #[track_caller]
    #[instrument(skip(self))]
    fn acquire(&self, config: &CaptureConfig) -> CoreResult<Box<dyn DeviceHandle>> {
        config.validate()?;

        let host = cpal::default_host();

        let device = host
            .default_input_device()
            .ok_or(CoreError::DeviceUnavailable {
                reason: "No microphone found".to_string(),
                location: ErrorLocation::from(Location::caller()),
            })?;

        let ranges: Vec<_> = device
            .supported_input_configs()
            .map_err(|e| CoreError::DeviceUnavailable {
                reason: format!("Failed to query input configs: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?
            .filter(|range| {
                range.channels() == config.channels
                    && range.min_sample_rate() <= config.sample_rate
                    && config.sample_rate <= range.max_sample_rate()
            })
            .collect();

        // The device must natively run at the requested rate.
        let supported = ACCEPTED_FORMATS
            .iter()
            .find_map(|format| {
                ranges
                    .iter()
                    .find(|range| range.sample_format() == *format)
                    .cloned()
            })
            .ok_or_else(|| CoreError::DeviceUnavailable {
                reason: format!(
                    "Device cannot capture {} Hz with {} channel(s)",
                    config.sample_rate, config.channels
                ),
                location: ErrorLocation::from(Location::caller()),
            })?
            .with_sample_rate(config.sample_rate);

        let sample_format = supported.sample_format();

        info!(
            device_id = ?device.id(),
            sample_rate = config.sample_rate,
            channels = config.channels,
            sample_format = ?sample_format,
            "Input device acquired"
        );

        Ok(Box::new(CpalHandle {
            device,
            config: supported.config(),
            sample_format,
        }))
    }
}

struct CpalHandle {
    device: Device,
    config: StreamConfig,
    sample_format: SampleFormat,
}

/// State shared between `fill` and the cpal data callback.
struct Shared {
    samples: Mutex<Vec<i16>>,
    max_samples: usize,
    full: AtomicBool,
    failed: AtomicBool,
    /// Signals the audio callback to stop writing. Set before the stream is
    /// dropped so an in-flight callback cannot append after we take the buffer.
    shutdown: AtomicBool,
}

impl CpalHandle {
    #[track_caller]
    fn build_stream<T>(&self, shared: &Arc<Shared>) -> CoreResult<Stream>
    where
        T: SizedSample,
        i16: FromSample<T>,
    {
        let data_shared = Arc::clone(shared);
        let error_shared = Arc::clone(shared);

        self.device
            .build_input_stream(
                &self.config,
                move |data: &[T], _: &cpal::InputCallbackInfo| {
                    if data_shared.shutdown.load(Ordering::Acquire) {
                        return;
                    }
                    // A poisoned mutex still holds valid samples.
                    let mut buf = data_shared.samples.lock().unwrap_or_else(|e| {
                        error!("Sample buffer lock poisoned, recovering: {}", e);
                        e.into_inner()
                    });
                    let room = data_shared.max_samples.saturating_sub(buf.len());
                    buf.extend(data.iter().take(room).map(|&s| i16::from_sample(s)));
                    if buf.len() >= data_shared.max_samples {
                        data_shared.full.store(true, Ordering::Release);
                    }
                },
                move |err| {
                    error!("Audio stream error: {}", err);
                    error_shared.failed.store(true, Ordering::Release);
                },
                None,
            )
            .map_err(|e| CoreError::DeviceUnavailable {
                reason: format!("Failed to build stream: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })
    }
}

impl DeviceHandle for CpalHandle {
    #[instrument(skip(self, stop))]
    fn fill(&mut self, max_samples: usize, stop: &StopHandle) -> CoreResult<Vec<i16>> {
        let shared = Arc::new(Shared {
            samples: Mutex::new(Vec::with_capacity(max_samples)),
            max_samples,
            full: AtomicBool::new(max_samples == 0),
            failed: AtomicBool::new(false),
            shutdown: AtomicBool::new(false),
        });

        let stream = match self.sample_format {
            SampleFormat::I16 => self.build_stream::<i16>(&shared)?,
            SampleFormat::F32 => self.build_stream::<f32>(&shared)?,
            SampleFormat::U16 => self.build_stream::<u16>(&shared)?,
            other => {
                return Err(CoreError::DeviceUnavailable {
                    reason: format!("Unsupported sample format {:?}", other),
                    location: ErrorLocation::from(Location::caller()),
                });
            }
        };

        stream.play().map_err(|e| CoreError::DeviceUnavailable {
            reason: format!("Failed to start stream: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        debug!(max_samples, "Audio capture started");

        while !stop.is_stopped()
            && !shared.full.load(Ordering::Acquire)
            && !shared.failed.load(Ordering::Acquire)
        {
            std::thread::sleep(POLL_INTERVAL);
        }

        shared.shutdown.store(true, Ordering::Release);
        drop(stream);
        // Give a backend whose drop returns early time to finish its last callback.
        std::thread::sleep(Duration::from_millis(5));

        if shared.failed.load(Ordering::Acquire) {
            warn!("Capture ended early after a stream error");
        }

        let samples = std::mem::take(
            &mut *shared
                .samples
                .lock()
                .unwrap_or_else(|e| e.into_inner()),
        );

        info!(sample_count = samples.len(), "Audio capture stopped");

        Ok(samples)
    }
}
