use crate::{CoreError, CoreResult};

use std::{
    io::{ErrorKind, Read, Write},
    panic::Location,
};

use error_location::ErrorLocation;

/// Width of the little-endian length prefix.
pub const LENGTH_PREFIX_LEN: usize = 4;

/// Largest frame accepted by default (64 MiB).
///
/// Ten seconds of 16 kHz mono PCM is ~320 KB, so this only trips on a
/// misbehaving peer.
pub const DEFAULT_MAX_FRAME_LEN: usize = 64 * 1024 * 1024;

/// Length-prefixed framing shared by audio, command, and response traffic.
///
/// Frame = `[u32 little-endian length][payload]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameCodec {
    max_frame_len: usize,
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FRAME_LEN)
    }
}

impl FrameCodec {
    /// Creates a codec that rejects payloads longer than `max_frame_len`.
    ///
    /// The ceiling is clamped to what a `u32` prefix can express.
    pub fn new(max_frame_len: usize) -> Self {
        Self {
            max_frame_len: max_frame_len.min(u32::MAX as usize),
        }
    }

    /// Configured payload ceiling in bytes.
    pub fn max_frame_len(&self) -> usize {
        self.max_frame_len
    }

    /// Fails with `ProtocolError` if `len` exceeds the ceiling.
    #[track_caller]
    pub fn check_len(&self, len: usize) -> CoreResult<()> {
        if len > self.max_frame_len {
            return Err(CoreError::ProtocolError {
                reason: format!(
                    "frame of {} bytes exceeds the {} byte limit",
                    len, self.max_frame_len
                ),
                location: ErrorLocation::from(Location::caller()),
            });
        }
        Ok(())
    }

    /// Prefixes `payload` with its length.
    #[track_caller]
    pub fn encode(&self, payload: &[u8]) -> CoreResult<Vec<u8>> {
        self.check_len(payload.len())?;

        let mut frame = Vec::with_capacity(LENGTH_PREFIX_LEN + payload.len());
        frame.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        frame.extend_from_slice(payload);
        Ok(frame)
    }

    /// Encodes `payload`, writes it, and flushes.
    #[track_caller]
    pub fn write_frame<W: Write>(&self, writer: &mut W, payload: &[u8]) -> CoreResult<()> {
        let frame = self.encode(payload)?;
        writer.write_all(&frame)?;
        writer.flush()?;
        Ok(())
    }

    /// Reads exactly one frame, blocking until it is complete.
    ///
    /// # Errors
    ///
    /// - `Io` with kind `UnexpectedEof` if the stream ends before any byte of
    ///   the frame (peer closed cleanly), or on any read failure.
    /// - `ProtocolError` if the stream ends mid-frame or the declared length
    ///   exceeds the ceiling.
    #[track_caller]
    pub fn decode<R: Read>(&self, reader: &mut R) -> CoreResult<Vec<u8>> {
        let mut prefix = [0u8; LENGTH_PREFIX_LEN];
        let got = read_full(reader, &mut prefix)?;

        if got == 0 {
            return Err(CoreError::Io {
                source: std::io::Error::new(ErrorKind::UnexpectedEof, "peer closed the stream"),
                location: ErrorLocation::from(Location::caller()),
            });
        }
        if got < LENGTH_PREFIX_LEN {
            return Err(CoreError::ProtocolError {
                reason: format!(
                    "stream closed after {} of {} length bytes",
                    got, LENGTH_PREFIX_LEN
                ),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let len = u32::from_le_bytes(prefix) as usize;
        self.check_len(len)?;

        let mut payload = vec![0u8; len];
        let got = read_full(reader, &mut payload)?;
        if got < len {
            return Err(CoreError::ProtocolError {
                reason: format!("stream closed after {} of {} payload bytes", got, len),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        Ok(payload)
    }
}

/// Fills `buf` unless the stream ends first; returns the bytes read.
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
