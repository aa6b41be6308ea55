mod audio_config;
mod behaviour_config;
#[allow(clippy::module_inception)]
mod config;
mod hotkey_config;
mod worker_config;

pub(crate) use {
    audio_config::AudioConfig,
    behaviour_config::BehaviourConfig,
    config::Config,
    hotkey_config::HotkeyConfig,
    worker_config::WorkerSettings,
};

pub(crate) const DEFAULT_TRIGGER_HOTKEY: &str = "ctrl+shift+s";
pub(crate) const DEFAULT_CANCEL_HOTKEY: &str = "escape";
pub(crate) const DEFAULT_RECORD_SECS: f64 = 5.0;
pub(crate) const DEFAULT_WORKER_PROGRAM: &str = "python";
pub(crate) const DEFAULT_WORKER_SCRIPT: &str = "../python/main.py";
pub(crate) const DEFAULT_COPY_TO_CLIPBOARD: bool = false;

use crate::{AppError, AppResult};

use std::{panic::Location, time::Duration};

use error_location::ErrorLocation;

/// Converts a seconds field that must be positive and finite.
#[track_caller]
pub(crate) fn positive_secs(field: &str, secs: f64) -> AppResult<Duration> {
    if !secs.is_finite() || secs <= 0.0 {
        return Err(AppError::ConfigError {
            reason: format!("{} must be a positive number of seconds, got {}", field, secs),
            location: ErrorLocation::from(Location::caller()),
        });
    }

    Duration::try_from_secs_f64(secs).map_err(|e| AppError::ConfigError {
        reason: format!("{} is out of range: {}", field, e),
        location: ErrorLocation::from(Location::caller()),
    })
}
