use crate::{CoreError, FrameCodec, LENGTH_PREFIX_LEN};

use std::io::{Cursor, ErrorKind};

const SMALL_CEILING: usize = 16;

/// WHAT: Encoded frames carry a little-endian length prefix
/// WHY: The prefix layout is the wire contract with the worker
#[test]
#[allow(clippy::unwrap_used)]
fn given_payload_when_encoding_then_prefix_is_little_endian_length() {
    // Given: A 5 byte payload
    let codec = FrameCodec::default();

    // When: Encoding
    let frame = codec.encode(b"hello").unwrap();

    // Then: [5, 0, 0, 0] followed by the payload
    assert_eq!(&frame[..LENGTH_PREFIX_LEN], &[5, 0, 0, 0]);
    assert_eq!(&frame[LENGTH_PREFIX_LEN..], b"hello");
}

/// WHAT: Decoding an encoded frame yields the payload, including empty ones
/// WHY: Audio, command, and response traffic share this envelope
#[test]
#[allow(clippy::unwrap_used)]
fn given_encoded_frames_when_decoding_back_to_back_then_payloads_returned_in_order() {
    // Given: An empty frame followed by a binary one on the same stream
    let codec = FrameCodec::default();
    let binary: Vec<u8> = (0..=255).collect();
    let mut stream = codec.encode(&[]).unwrap();
    stream.extend(codec.encode(&binary).unwrap());
    let mut reader = Cursor::new(stream);

    // When: Decoding twice
    let first = codec.decode(&mut reader).unwrap();
    let second = codec.decode(&mut reader).unwrap();

    // Then: Both payloads are intact and in order
    assert!(first.is_empty());
    assert_eq!(second, binary);
}

/// WHAT: A stream ending inside the length prefix is a protocol error
/// WHY: Partial frames mean the channel is desynchronized
#[test]
fn given_partial_length_prefix_when_decoding_then_protocol_error() {
    // Given: Only two of four prefix bytes
    let codec = FrameCodec::default();
    let mut reader = Cursor::new(vec![5u8, 0]);

    // When: Decoding
    let result = codec.decode(&mut reader);

    // Then: ProtocolError
    assert!(matches!(result, Err(CoreError::ProtocolError { .. })));
}

/// WHAT: A stream ending inside the payload is a protocol error
/// WHY: A truncated response must never be returned as complete
#[test]
fn given_truncated_payload_when_decoding_then_protocol_error() {
    // Given: A prefix announcing 10 bytes but only 3 present
    let codec = FrameCodec::default();
    let mut bytes = 10u32.to_le_bytes().to_vec();
    bytes.extend_from_slice(b"abc");
    let mut reader = Cursor::new(bytes);

    // When: Decoding
    let result = codec.decode(&mut reader);

    // Then: ProtocolError
    assert!(matches!(result, Err(CoreError::ProtocolError { .. })));
}

/// WHAT: A clean end of stream is reported as a closed channel
/// WHY: Distinguishes a peer that exited from one that sent garbage
#[test]
fn given_empty_stream_when_decoding_then_io_unexpected_eof() {
    // Given: A stream with no bytes
    let codec = FrameCodec::default();
    let mut reader = Cursor::new(Vec::<u8>::new());

    // When: Decoding
    let result = codec.decode(&mut reader);

    // Then: Io with UnexpectedEof
    assert!(matches!(
        result,
        Err(CoreError::Io { ref source, .. }) if source.kind() == ErrorKind::UnexpectedEof
    ));
}

/// WHAT: Declared lengths above the ceiling are rejected before allocating
/// WHY: A misbehaving peer must not trigger unbounded allocation
#[test]
fn given_length_over_ceiling_when_decoding_then_protocol_error() {
    // Given: A codec with a 16 byte ceiling and a prefix claiming 4 GiB
    let codec = FrameCodec::new(SMALL_CEILING);
    let mut reader = Cursor::new(u32::MAX.to_le_bytes().to_vec());

    // When: Decoding
    let result = codec.decode(&mut reader);

    // Then: ProtocolError
    assert!(matches!(result, Err(CoreError::ProtocolError { .. })));
}

/// WHAT: Payloads above the ceiling cannot be encoded
/// WHY: Both directions honor the same limit
#[test]
fn given_payload_over_ceiling_when_encoding_then_protocol_error() {
    // Given: A codec with a 16 byte ceiling
    let codec = FrameCodec::new(SMALL_CEILING);

    // When: Encoding 17 bytes, and exactly 16 bytes
    let over = codec.encode(&[0u8; SMALL_CEILING + 1]);
    let at = codec.encode(&[0u8; SMALL_CEILING]);

    // Then: Only the oversize payload is rejected
    assert!(matches!(over, Err(CoreError::ProtocolError { .. })));
    assert!(at.is_ok());
}

/// WHAT: A payload of exactly the ceiling decodes back unchanged
/// WHY: The frame limit is inclusive on both sides
#[test]
#[allow(clippy::unwrap_used)]
fn given_payload_at_ceiling_when_decoding_encoded_frame_then_payload_returned() {
    // Given: A 16 byte payload under a 16 byte ceiling
    let codec = FrameCodec::new(SMALL_CEILING);
    let payload: Vec<u8> = (0..SMALL_CEILING as u8).collect();
    let frame = codec.encode(&payload).unwrap();

    // When: Decoding
    let decoded = codec.decode(&mut Cursor::new(frame)).unwrap();

    // Then: Same bytes
    assert_eq!(decoded, payload);
}

/// WHAT: write_frame writes the same bytes as encode
/// WHY: The bridge writes frames directly to the worker pipe
#[test]
#[allow(clippy::unwrap_used)]
fn given_writer_when_writing_frame_then_bytes_match_encode() {
    // Given: An in-memory writer
    let codec = FrameCodec::default();
    let mut sink = Vec::new();

    // When: Writing a frame
    codec.write_frame(&mut sink, "명령".as_bytes()).unwrap();

    // Then: Matches encode output
    assert_eq!(sink, codec.encode("명령".as_bytes()).unwrap());
}
