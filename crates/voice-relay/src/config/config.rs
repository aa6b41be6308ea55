//! Configuration management for voice-relay.
//!
//! Handles loading and saving TOML configuration files with cross-platform
//! paths, validation, and atomic write operations.

use crate::{
    AppError, AppResult,
    config::{AudioConfig, BehaviourConfig, HotkeyConfig, WorkerSettings},
    hotkey::HotkeySpec,
};

use std::{fs, io::Write, panic::Location, path::PathBuf};

use directories::ProjectDirs;
use error_location::ErrorLocation;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

/// Main configuration struct.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Global hotkey bindings.
    pub hotkeys: HotkeyConfig,
    /// Capture format and durations.
    pub audio: AudioConfig,
    /// Worker process launch settings.
    pub worker: WorkerSettings,
    /// Application behavior settings.
    pub behavior: BehaviourConfig,
}

impl Config {
    /// Load and validate configuration from disk, writing defaults if absent.
    #[track_caller]
    #[instrument]
    pub fn load() -> AppResult<Self> {
        let config_path = Self::config_path()?;

        let config = if config_path.exists() {
            let contents = fs::read_to_string(&config_path).map_err(|e| AppError::ConfigError {
                reason: format!("Failed to read config: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

            let config = Self::from_toml_str(&contents)?;
            info!(config_path = ?config_path, "Configuration loaded");
            config
        } else {
            info!("No config found, creating default");
            let config = Self::default();
            config.save()?;
            config
        };

        config.validate()?;

        Ok(config)
    }

    /// Parse configuration text. Missing sections and fields take defaults.
    #[track_caller]
    pub fn from_toml_str(contents: &str) -> AppResult<Self> {
        toml::from_str(contents).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to parse config: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })
    }

    /// Check every setting that would otherwise fail later at runtime.
    ///
    /// # Errors
    ///
    /// `ConfigError` naming the first offending setting.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn validate(&self) -> AppResult<()> {
        self.audio.capture_config()?;
        self.audio.record_duration()?;
        self.worker.worker_config()?;

        if self.worker.max_frame_bytes == 0 {
            return Err(AppError::ConfigError {
                reason: "worker.max_frame_bytes must be non-zero".to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let specs = std::iter::once(("hotkeys.trigger", self.hotkeys.trigger.as_str()))
            .chain(self.hotkeys.cancel_spec().map(|spec| ("hotkeys.cancel", spec)));

        for (field, spec) in specs {
            HotkeySpec::parse(spec).map_err(|e| AppError::ConfigError {
                reason: format!("{} is not a valid hotkey: {}", field, e),
                location: ErrorLocation::from(Location::caller()),
            })?;
        }

        debug!("Configuration valid");

        Ok(())
    }

    /// Save configuration to disk using atomic write pattern.
    ///
    /// Writes to a temporary file first, then renames to prevent corruption
    /// if the process crashes during the write.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn save(&self) -> AppResult<()> {
        let config_path = Self::config_path()?;

        let contents = toml::to_string_pretty(self).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to serialize config: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        let temp_path = config_path.with_extension("toml.tmp");

        let mut temp_file = fs::File::create(&temp_path).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to create temp config file: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        temp_file
            .write_all(contents.as_bytes())
            .map_err(|e| AppError::ConfigError {
                reason: format!("Failed to write temp config file: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        temp_file.sync_all().map_err(|e| AppError::ConfigError {
            reason: format!("Failed to sync temp config file: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        fs::rename(&temp_path, &config_path).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to rename temp config to final: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        info!(config_path = ?config_path, "Configuration saved (atomic write)");

        Ok(())
    }

    #[track_caller]
    fn config_path() -> AppResult<PathBuf> {
        let proj_dirs =
            ProjectDirs::from("com", "voice-relay", "Voice-Relay").ok_or_else(|| {
                AppError::ConfigError {
                    reason: "Failed to get config directory".to_string(),
                    location: ErrorLocation::from(Location::caller()),
                }
            })?;

        let config_dir = proj_dirs.config_dir();

        if !config_dir.exists() {
            fs::create_dir_all(config_dir)?;
            debug!(config_dir = ?config_dir, "Created config directory");
        }

        Ok(config_dir.join("config.toml"))
    }
}
