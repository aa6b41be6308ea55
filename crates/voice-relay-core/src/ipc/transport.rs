use crate::{CoreError, CoreResult};

use std::panic::Location;

use error_location::ErrorLocation;

/// A request/response channel to the worker.
///
/// One request is in flight at a time; `&mut self` enforces that per
/// instance, and shared callers must wrap the transport in a mutex.
pub trait Transport: Send {
    /// Sends one payload and returns exactly one response payload.
    fn send(&mut self, payload: &[u8]) -> CoreResult<Vec<u8>>;

    /// Sends a plain-text command and decodes the UTF-8 reply.
    #[track_caller]
    fn send_text(&mut self, command: &str) -> CoreResult<String> {
        let response = self.send(command.as_bytes())?;
        into_text(response)
    }

    /// Sends a complete WAV byte stream and decodes the UTF-8 reply.
    #[track_caller]
    fn send_audio(&mut self, wav: &[u8]) -> CoreResult<String> {
        let response = self.send(wav)?;
        into_text(response)
    }
}

#[track_caller]
fn into_text(response: Vec<u8>) -> CoreResult<String> {
    String::from_utf8(response).map_err(|e| CoreError::ProtocolError {
        reason: format!("response is not valid UTF-8: {}", e),
        location: ErrorLocation::from(Location::caller()),
    })
}
