//! Canonical 44-byte RIFF/WAVE encoding of 16-bit PCM.

use crate::{CoreError, CoreResult, audio::CaptureConfig};

use std::panic::Location;

use error_location::ErrorLocation;

/// Size of the canonical PCM header.
pub const HEADER_LEN: usize = 44;

const PCM_FORMAT: u16 = 1;
const FMT_CHUNK_LEN: u32 = 16;
/// Header bytes counted by the RIFF size field.
const RIFF_OVERHEAD: u32 = HEADER_LEN as u32 - 8;

/// Fields of a canonical PCM WAV header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavHeader {
    /// RIFF chunk size (file size minus 8).
    pub riff_size: u32,
    /// Audio format tag; 1 for PCM.
    pub audio_format: u16,
    /// Interleaved channel count.
    pub channels: u16,
    /// Frames per second.
    pub sample_rate: u32,
    /// Bytes per second.
    pub byte_rate: u32,
    /// Bytes per frame.
    pub block_align: u16,
    /// Bits per sample.
    pub bits_per_sample: u16,
    /// Length of the PCM payload in bytes.
    pub data_size: u32,
}

impl WavHeader {
    /// Reads the header at the start of `bytes`.
    ///
    /// # Errors
    ///
    /// `ProtocolError` if the buffer is shorter than 44 bytes or the chunk
    /// tags are not the canonical `RIFF`/`WAVE`/`fmt `/`data` layout.
    #[track_caller]
    pub fn parse(bytes: &[u8]) -> CoreResult<Self> {
        let invalid = |reason: &str| CoreError::ProtocolError {
            reason: format!("Invalid WAV header: {}", reason),
            location: ErrorLocation::from(Location::caller()),
        };

        if bytes.len() < HEADER_LEN {
            return Err(invalid("shorter than 44 bytes"));
        }
        if &bytes[0..4] != b"RIFF" || &bytes[8..12] != b"WAVE" {
            return Err(invalid("missing RIFF/WAVE tags"));
        }
        if &bytes[12..16] != b"fmt " || &bytes[36..40] != b"data" {
            return Err(invalid("missing fmt/data chunks"));
        }

        let u16_at = |at: usize| u16::from_le_bytes([bytes[at], bytes[at + 1]]);
        let u32_at =
            |at: usize| u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]]);

        if u32_at(16) != FMT_CHUNK_LEN {
            return Err(invalid("fmt chunk is not 16 bytes"));
        }

        Ok(Self {
            riff_size: u32_at(4),
            audio_format: u16_at(20),
            channels: u16_at(22),
            sample_rate: u32_at(24),
            byte_rate: u32_at(28),
            block_align: u16_at(32),
            bits_per_sample: u16_at(34),
            data_size: u32_at(40),
        })
    }
}

/// Encodes interleaved samples as a complete WAV byte stream.
pub fn encode(samples: &[i16], config: &CaptureConfig) -> Vec<u8> {
    let data_size = u32::try_from(samples.len() * 2).unwrap_or(u32::MAX - RIFF_OVERHEAD);
    let mut out = Vec::with_capacity(HEADER_LEN + samples.len() * 2);

    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&data_size.saturating_add(RIFF_OVERHEAD).to_le_bytes());
    out.extend_from_slice(b"WAVE");

    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&FMT_CHUNK_LEN.to_le_bytes());
    out.extend_from_slice(&PCM_FORMAT.to_le_bytes());
    out.extend_from_slice(&config.channels.to_le_bytes());
    out.extend_from_slice(&config.sample_rate.to_le_bytes());
    out.extend_from_slice(&config.byte_rate().to_le_bytes());
    out.extend_from_slice(&config.block_align().to_le_bytes());
    out.extend_from_slice(&config.bits_per_sample.to_le_bytes());

    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_size.to_le_bytes());
    for sample in samples {
        out.extend_from_slice(&sample.to_le_bytes());
    }

    out
}
