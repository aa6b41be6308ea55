//! Clipboard output for worker replies.

use crate::{AppError, AppResult};

use std::panic::Location;

use arboard::Clipboard;
use error_location::ErrorLocation;
use tracing::{debug, info, instrument};

/// Copies worker replies to the system clipboard.
pub struct OutputHandler {
    pub(crate) clipboard: Clipboard,
}

impl OutputHandler {
    /// Create a new output handler.
    #[track_caller]
    #[instrument]
    pub fn new() -> AppResult<Self> {
        let clipboard = Clipboard::new().map_err(|e| AppError::ClipboardError {
            reason: format!("Failed to initialize clipboard: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        info!("OutputHandler initialized");

        Ok(Self { clipboard })
    }

    /// Replace the clipboard contents with `text`.
    #[track_caller]
    #[instrument(skip(self, text))]
    pub fn output_text(&mut self, text: &str) -> AppResult<()> {
        self.clipboard
            .set_text(text)
            .map_err(|e| AppError::ClipboardError {
                reason: format!("Failed to set clipboard: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        debug!(text_len = text.len(), "Text copied to clipboard");

        Ok(())
    }
}
