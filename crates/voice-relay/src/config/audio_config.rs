use crate::{
    AppError, AppResult,
    config::{DEFAULT_RECORD_SECS, positive_secs},
};

use std::{panic::Location, sync::Arc, time::Duration};

use error_location::ErrorLocation;
use serde::{Deserialize, Serialize};
use voice_relay_core::{
    AudioDevice, CaptureConfig, CpalDevice, DEFAULT_BITS_PER_SAMPLE, DEFAULT_CHANNELS,
    DEFAULT_MAX_DURATION, DEFAULT_SAMPLE_RATE, SilentDevice,
};

/// Which input device implementation to capture from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioBackend {
    /// Default system input through cpal.
    #[default]
    Cpal,
    /// Real-time silence, for machines without a microphone.
    Silent,
}

/// Capture format and durations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Input device implementation.
    pub backend: AudioBackend,
    /// Samples per second per channel.
    pub sample_rate: u32,
    /// Interleaved channel count.
    pub channels: u16,
    /// Bits per sample; only 16 is supported.
    pub bits_per_sample: u16,
    /// Upper bound on any single capture.
    pub max_duration_secs: f64,
    /// Length of the capture started by the trigger hotkey.
    pub record_secs: f64,
}

impl AudioConfig {
    /// Capture format for new sessions.
    ///
    /// # Errors
    ///
    /// `ConfigError` if the durations or format are unusable.
    #[track_caller]
    pub fn capture_config(&self) -> AppResult<CaptureConfig> {
        let config = CaptureConfig {
            sample_rate: self.sample_rate,
            channels: self.channels,
            bits_per_sample: self.bits_per_sample,
            max_duration: positive_secs("audio.max_duration_secs", self.max_duration_secs)?,
        };

        config.validate().map_err(|e| AppError::ConfigError {
            reason: format!("Unsupported audio format: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        Ok(config)
    }

    /// Length of a triggered capture, before clamping to the maximum.
    #[track_caller]
    pub fn record_duration(&self) -> AppResult<Duration> {
        positive_secs("audio.record_secs", self.record_secs)
    }

    /// The configured input device.
    pub fn device(&self) -> Arc<dyn AudioDevice> {
        match self.backend {
            AudioBackend::Cpal => Arc::new(CpalDevice),
            AudioBackend::Silent => Arc::new(SilentDevice),
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            backend: AudioBackend::default(),
            sample_rate: DEFAULT_SAMPLE_RATE,
            channels: DEFAULT_CHANNELS,
            bits_per_sample: DEFAULT_BITS_PER_SAMPLE,
            max_duration_secs: DEFAULT_MAX_DURATION.as_secs_f64(),
            record_secs: DEFAULT_RECORD_SECS,
        }
    }
}
