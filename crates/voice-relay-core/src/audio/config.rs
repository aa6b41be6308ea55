use crate::{CoreError, CoreResult};

use std::{panic::Location, time::Duration};

use error_location::ErrorLocation;

/// Sample rate expected by the worker's speech recognizer.
pub const DEFAULT_SAMPLE_RATE: u32 = 16_000;
/// Mono capture.
pub const DEFAULT_CHANNELS: u16 = 1;
/// Signed 16-bit PCM.
pub const DEFAULT_BITS_PER_SAMPLE: u16 = 16;
/// Upper bound on a single capture session.
pub const DEFAULT_MAX_DURATION: Duration = Duration::from_secs(10);

/// Largest `data` chunk whose RIFF size (data plus 36 header bytes) fits in a u32.
const MAX_WAV_DATA_BYTES: u64 = u32::MAX as u64 - 36;

/// Format and length limits of one capture session.
///
/// Copied into the session when it starts, so later edits never affect a
/// recording in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureConfig {
    /// Samples per second per channel.
    pub sample_rate: u32,
    /// Interleaved channel count.
    pub channels: u16,
    /// Bits per sample. Only 16 is supported.
    pub bits_per_sample: u16,
    /// Hard cap on recording length.
    pub max_duration: Duration,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            channels: DEFAULT_CHANNELS,
            bits_per_sample: DEFAULT_BITS_PER_SAMPLE,
            max_duration: DEFAULT_MAX_DURATION,
        }
    }
}

impl CaptureConfig {
    /// Rejects formats the capture pipeline cannot produce.
    #[track_caller]
    pub fn validate(&self) -> CoreResult<()> {
        let reason = if self.bits_per_sample != 16 {
            Some(format!(
                "unsupported bit depth {} (only 16-bit PCM)",
                self.bits_per_sample
            ))
        } else if self.channels == 0 {
            Some("channel count must be at least 1".to_string())
        } else if self.sample_rate == 0 {
            Some("sample rate must be non-zero".to_string())
        } else if self.checked_byte_rate().is_none() {
            Some(format!(
                "{} channels at {} Hz exceeds the WAV byte-rate field",
                self.channels, self.sample_rate
            ))
        } else if self.max_data_bytes() > MAX_WAV_DATA_BYTES {
            Some(format!(
                "{:?} of audio exceeds the WAV size field",
                self.max_duration
            ))
        } else {
            None
        };

        match reason {
            Some(reason) => Err(CoreError::DeviceUnavailable {
                reason,
                location: ErrorLocation::from(Location::caller()),
            }),
            None => Ok(()),
        }
    }

    /// Interleaved sample count covering `duration`, clamped to `max_duration`.
    pub fn samples_for(&self, duration: Duration) -> usize {
        let duration = duration.min(self.max_duration);
        let frames = (duration.as_secs_f64() * f64::from(self.sample_rate)).round() as usize;
        frames * usize::from(self.channels)
    }

    /// Bytes per interleaved frame. Saturates for formats `validate` rejects.
    pub fn block_align(&self) -> u16 {
        self.channels.saturating_mul(self.bits_per_sample / 8)
    }

    /// Bytes per second of audio. Saturates for formats `validate` rejects.
    pub fn byte_rate(&self) -> u32 {
        self.checked_byte_rate().unwrap_or(u32::MAX)
    }

    fn checked_byte_rate(&self) -> Option<u32> {
        let block_align = self.channels.checked_mul(self.bits_per_sample / 8)?;
        self.sample_rate.checked_mul(u32::from(block_align))
    }

    fn max_data_bytes(&self) -> u64 {
        let frames = (self.max_duration.as_secs_f64() * f64::from(self.sample_rate)).round();
        // Float-to-int casts saturate.
        (frames as u64)
            .saturating_mul(u64::from(self.channels))
            .saturating_mul(u64::from(self.bits_per_sample / 8))
    }
}
