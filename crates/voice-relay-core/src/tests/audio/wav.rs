use crate::{CaptureConfig, CoreError, wav};

/// WHAT: Encoded header reports sizes consistent with the samples
/// WHY: The worker trusts dataSize and byteRate to decode the PCM payload
#[test]
#[allow(clippy::unwrap_used)]
fn given_samples_when_encoding_wav_then_header_sizes_are_consistent() {
    // Given: 1000 samples at 16 kHz mono
    let config = CaptureConfig::default();
    let samples: Vec<i16> = (0..1000).map(|i| (i * 31) as i16).collect();

    // When: Encoding and parsing the header back
    let bytes = wav::encode(&samples, &config);
    let header = wav::WavHeader::parse(&bytes).unwrap();

    // Then: Sizes and rates follow from the format
    assert_eq!(bytes.len(), wav::HEADER_LEN + samples.len() * 2);
    assert_eq!(header.data_size as usize, samples.len() * 2);
    assert_eq!(header.riff_size as usize, bytes.len() - 8);
    assert_eq!(header.audio_format, 1);
    assert_eq!(header.channels, 1);
    assert_eq!(header.sample_rate, 16_000);
    assert_eq!(header.block_align, 2);
    assert_eq!(header.byte_rate, header.sample_rate * u32::from(header.block_align));
    assert_eq!(header.bits_per_sample, 16);
}

/// WHAT: PCM follows the header in little-endian order
/// WHY: Byte order is part of the wire format
#[test]
fn given_known_samples_when_encoding_then_payload_is_little_endian() {
    // Given: Two distinctive samples
    let samples = [0x0102i16, -2];

    // When: Encoding
    let bytes = wav::encode(&samples, &CaptureConfig::default());

    // Then: Tags sit at fixed offsets and samples are little-endian
    assert_eq!(&bytes[0..4], b"RIFF");
    assert_eq!(&bytes[8..12], b"WAVE");
    assert_eq!(&bytes[12..16], b"fmt ");
    assert_eq!(&bytes[36..40], b"data");
    assert_eq!(&bytes[44..], &[0x02, 0x01, 0xFE, 0xFF]);
}

/// WHAT: An empty capture still yields a valid 44-byte file
/// WHY: Sessions stopped immediately produce empty buffers
#[test]
#[allow(clippy::unwrap_used)]
fn given_empty_buffer_when_encoding_then_header_only() {
    // Given/When: Encoding no samples
    let bytes = wav::encode(&[], &CaptureConfig::default());

    // Then: Header only, zero data size
    assert_eq!(bytes.len(), wav::HEADER_LEN);
    assert_eq!(wav::WavHeader::parse(&bytes).unwrap().data_size, 0);
}

/// WHAT: Truncated headers are rejected
/// WHY: The reference worker must not misread arbitrary payloads as audio
#[test]
fn given_truncated_header_when_parsing_then_protocol_error() {
    // Given: Only the first 20 bytes of a WAV file
    let bytes = wav::encode(&[1, 2, 3], &CaptureConfig::default());

    // When: Parsing the truncated prefix
    let result = wav::WavHeader::parse(&bytes[..20]);

    // Then: ProtocolError
    assert!(matches!(result, Err(CoreError::ProtocolError { .. })));
}
