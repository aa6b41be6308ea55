use crate::config::DEFAULT_COPY_TO_CLIPBOARD;

use serde::{Deserialize, Serialize};

/// Application behavior configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviourConfig {
    /// Whether worker replies are copied to the clipboard.
    pub copy_to_clipboard: bool,
}

impl Default for BehaviourConfig {
    fn default() -> Self {
        Self {
            copy_to_clipboard: DEFAULT_COPY_TO_CLIPBOARD,
        }
    }
}
