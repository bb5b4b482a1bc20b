use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::{
    event_config::EventConfig, guests_config::GuestsConfig, paths::ProjectPaths,
    speech_config::SpeechConfig, timing_config::TimingConfig,
};
use crate::controller::ControllerOptions;

#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    #[error("Config file not found")]
    NotFound,
    #[error("IO error reading config: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Failed to write config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SoireeConfig {
    #[serde(default)]
    pub event: EventConfig,

    #[serde(default)]
    pub guests: GuestsConfig,

    #[serde(default)]
    pub timing: TimingConfig,

    #[serde(default)]
    pub speech: SpeechConfig,
}

impl SoireeConfig {
    /// Default location, or `None` without a home directory
    pub fn config_path() -> Option<PathBuf> {
        ProjectPaths::new("soiree").map(|paths| paths.config_file())
    }

    /// Load from the default location, falling back to defaults when there
    /// is no config file.
    pub fn load_or_default() -> Result<Self, ConfigLoadError> {
        match Self::config_path() {
            Some(path) => match Self::load(&path) {
                Err(ConfigLoadError::NotFound) => Ok(Self::default()),
                other => other,
            },
            None => Ok(Self::default()),
        }
    }

    pub fn load(path: &Path) -> Result<Self, ConfigLoadError> {
        if !path.exists() {
            return Err(ConfigLoadError::NotFound);
        }

        let content = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigLoadError> {
        // Create parent directories if they don't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        info!("Saved config to {}", path.display());
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        self.guests.validate().map_err(ConfigLoadError::Invalid)?;
        self.timing.validate().map_err(ConfigLoadError::Invalid)?;
        self.speech.validate().map_err(ConfigLoadError::Invalid)?;
        Ok(())
    }

    pub fn controller_options(&self, muted: bool) -> ControllerOptions {
        ControllerOptions {
            lookup: self.guests.lookup(),
            greeting_template: self.event.greeting.clone(),
            timing: self.timing.timing(),
            muted,
        }
    }
}
