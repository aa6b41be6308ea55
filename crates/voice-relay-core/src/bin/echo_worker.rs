//! Reference worker speaking the framed protocol on stdin/stdout.
//!
//! Replies `ECHO:<text>` to UTF-8 payloads, `AUDIO:<rate>:<samples>` to WAV
//! payloads, and `BYTES:<len>` to anything else. A `sleep:<ms>` command
//! delays its reply. Logs go to stderr; stdout carries frames only.

use voice_relay_core::{CoreError, FrameCodec, PIPE_MODE_FLAG, wav::WavHeader};

use std::{
    io::{BufReader, BufWriter, ErrorKind},
    process::ExitCode,
    time::Duration,
};

use tracing::{debug, error, info};

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter("echo_worker=info")
        .with_writer(std::io::stderr)
        .init();

    if !std::env::args().any(|arg| arg == PIPE_MODE_FLAG) {
        error!("echo-worker only runs in {} mode", PIPE_MODE_FLAG);
        return ExitCode::from(2);
    }

    let codec = FrameCodec::default();
    let mut requests = BufReader::new(std::io::stdin().lock());
    let mut responses = BufWriter::new(std::io::stdout().lock());

    info!("echo-worker ready");

    loop {
        let payload = match codec.decode(&mut requests) {
            Ok(payload) => payload,
            Err(CoreError::Io { source, .. }) if source.kind() == ErrorKind::UnexpectedEof => {
                info!("Input closed, exiting");
                return ExitCode::SUCCESS;
            }
            Err(e) => {
                error!(error = ?e, "Failed to read request");
                return ExitCode::FAILURE;
            }
        };

        debug!(payload_len = payload.len(), "Request received");

        let reply = respond(&payload);
        if let Err(e) = codec.write_frame(&mut responses, reply.as_bytes()) {
            error!(error = ?e, "Failed to write response");
            return ExitCode::FAILURE;
        }
    }
}

fn respond(payload: &[u8]) -> String {
    let header = payload
        .starts_with(b"RIFF")
        .then(|| WavHeader::parse(payload).ok())
        .flatten();
    if let Some(header) = header {
        let samples = header.data_size / u32::from(header.bits_per_sample / 8).max(1);
        return format!("AUDIO:{}:{}", header.sample_rate, samples);
    }

    match std::str::from_utf8(payload) {
        Ok(text) => {
            if let Some(ms) = text.strip_prefix("sleep:").and_then(|ms| ms.parse().ok()) {
                std::thread::sleep(Duration::from_millis(ms));
            }
            format!("ECHO:{}", text)
        }
        Err(_) => format!("BYTES:{}", payload.len()),
    }
}
