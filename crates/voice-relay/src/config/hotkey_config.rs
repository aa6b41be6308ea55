use crate::config::{DEFAULT_CANCEL_HOTKEY, DEFAULT_TRIGGER_HOTKEY};

use serde::{Deserialize, Serialize};

/// Global hotkey bindings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HotkeyConfig {
    /// Starts a fixed-length capture and sends it to the worker.
    pub trigger: String,
    /// Cancels the capture in progress. Empty disables it.
    pub cancel: Option<String>,
}

impl HotkeyConfig {
    /// Cancel binding, if one is configured.
    pub fn cancel_spec(&self) -> Option<&str> {
        self.cancel
            .as_deref()
            .map(str::trim)
            .filter(|spec| !spec.is_empty())
    }
}

impl Default for HotkeyConfig {
    fn default() -> Self {
        Self {
            trigger: DEFAULT_TRIGGER_HOTKEY.to_string(),
            cancel: Some(DEFAULT_CANCEL_HOTKEY.to_string()),
        }
    }
}
