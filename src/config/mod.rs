//! Configuration file support for shotgenie.
//!
//! This module handles loading and validating user settings from the configuration file
//! located at `~/.config/shotgenie/config.toml`. Settings include the remembered window
//! state, capture backend tuning, save options, and send-to destinations.
//!
//! If no config file exists, sensible defaults are used automatically.

mod store;
pub mod types;

pub use store::ConfigStore;
pub use types::{CaptureConfig, ExportConfig, GuiConfig, SaveConfig};

use anyhow::{Context, Result};
use log::{debug, info};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Highest valid `capture_mode_index`.
pub const MAX_CAPTURE_MODE_INDEX: u32 = 3;

/// Main configuration structure containing all user settings.
///
/// # Example TOML
/// ```toml
/// [gui]
/// window_position = [50, 50]
/// include_pointer = true
/// include_decorations = true
/// capture_mode_index = 0
///
/// [capture]
/// timeout_secs = 30
///
/// [save]
/// default_save_location = "~/Pictures"
/// filename_format = "Screenshot_%Y%M%D_%H%m%S"
/// image_format = "png"
///
/// [export]
/// open_with_command = "xdg-open"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default, JsonSchema)]
pub struct Config {
    /// Remembered main window state
    #[serde(default)]
    pub gui: GuiConfig,

    /// Capture backend settings
    #[serde(default)]
    pub capture: CaptureConfig,

    /// Save location and filename settings
    #[serde(default)]
    pub save: SaveConfig,

    /// Send-to destination settings
    #[serde(default)]
    pub export: ExportConfig,
}

impl Config {
    /// Validates and clamps configuration values to acceptable ranges.
    ///
    /// Validated ranges:
    /// - `gui.capture_mode_index`: 0 - 3
    /// - `capture.timeout_secs`: 1 - 600
    /// - `save.image_format`: only `png` is written
    /// - `save.filename_format`: non-empty
    pub(crate) fn validate_and_clamp(&mut self) {
        if self.gui.capture_mode_index > MAX_CAPTURE_MODE_INDEX {
            log::warn!(
                "Invalid capture_mode_index {}, falling back to 0",
                self.gui.capture_mode_index
            );
            self.gui.capture_mode_index = 0;
        }

        if !(1..=600).contains(&self.capture.timeout_secs) {
            log::warn!(
                "Invalid capture timeout_secs {}, clamping to 1-600 range",
                self.capture.timeout_secs
            );
            self.capture.timeout_secs = self.capture.timeout_secs.clamp(1, 600);
        }

        let format = self
            .save
            .image_format
            .trim()
            .trim_start_matches('.')
            .to_lowercase();
        if format != "png" {
            log::warn!(
                "Unsupported image_format '{}', screenshots are saved as png",
                self.save.image_format
            );
        }
        self.save.image_format = "png".to_string();

        if self.save.filename_format.trim().is_empty() {
            log::warn!("Empty filename_format, falling back to the default template");
            self.save.filename_format = SaveConfig::default().filename_format;
        }

        if self.export.open_with_command.trim().is_empty() {
            log::warn!("Empty open_with_command, falling back to 'xdg-open'");
            self.export.open_with_command = ExportConfig::default().open_with_command;
        }
    }

    /// Returns the directory holding shotgenie's configuration.
    ///
    /// # Errors
    /// Returns an error if the config directory cannot be determined (e.g., HOME not set).
    pub fn config_dir() -> Result<PathBuf> {
        Ok(dirs::config_dir()
            .context("Could not find config directory")?
            .join("shotgenie"))
    }

    /// Returns the path to the configuration file (`~/.config/shotgenie/config.toml`).
    pub fn get_config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Directory scanned for export plugin manifests.
    pub fn plugin_dir(&self) -> Result<PathBuf> {
        match &self.export.plugin_dir {
            Some(dir) => Ok(crate::save::expand_tilde(dir)),
            None => Ok(Self::config_dir()?.join("plugins")),
        }
    }

    /// Loads configuration from `path`, or returns defaults if the file does not exist.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or contains invalid TOML.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("Config file not found, using defaults");
            debug!("Expected config at: {}", path.display());
            return Ok(Self::default());
        }

        let config_str = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        let mut config: Config = toml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config from {}", path.display()))?;

        config.validate_and_clamp();

        info!("Loaded config from {}", path.display());
        debug!("Config: {:?}", config);

        Ok(config)
    }

    /// Serializes the config to TOML and writes it to `path`, creating parent
    /// directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let config_str = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(path, config_str)
            .with_context(|| format!("Failed to write config to {}", path.display()))?;

        debug!("Saved config to {}", path.display());
        Ok(())
    }

    /// JSON schema describing the configuration file.
    pub fn json_schema() -> schemars::Schema {
        schemars::schema_for!(Config)
    }
}
