use crate::{CoreError, CoreResult, Transport};

/// Replies with a fixed payload and records what it was sent.
struct CannedTransport {
    reply: Vec<u8>,
    sent: Vec<Vec<u8>>,
}

impl Transport for CannedTransport {
    fn send(&mut self, payload: &[u8]) -> CoreResult<Vec<u8>> {
        self.sent.push(payload.to_vec());
        Ok(self.reply.clone())
    }
}

/// WHAT: send_text transmits the command as raw UTF-8
/// WHY: Commands share the audio envelope with no extra encoding
#[test]
#[allow(clippy::unwrap_used)]
fn given_text_command_when_sending_then_utf8_bytes_sent_and_reply_decoded() {
    // Given: A transport answering "done"
    let mut transport = CannedTransport {
        reply: b"done".to_vec(),
        sent: Vec::new(),
    };

    // When: Sending a text command
    let reply = transport.send_text("open calendar").unwrap();

    // Then: Raw bytes went out and the reply is text
    assert_eq!(transport.sent, vec![b"open calendar".to_vec()]);
    assert_eq!(reply, "done");
}

/// WHAT: Non-UTF-8 replies are protocol errors
/// WHY: Responses are defined as UTF-8 text
#[test]
fn given_binary_reply_when_sending_audio_then_protocol_error() {
    // Given: A transport answering invalid UTF-8
    let mut transport = CannedTransport {
        reply: vec![0xFF, 0xFE],
        sent: Vec::new(),
    };

    // When: Sending audio
    let result = transport.send_audio(b"RIFF");

    // Then: ProtocolError
    assert!(matches!(result, Err(CoreError::ProtocolError { .. })));
}
