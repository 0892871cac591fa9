//! Application configuration
//!
//! Re-exports the shared settings types from orderbell-types and provides
//! persistence for [`AppConfig`].

use std::path::{Path, PathBuf};

pub use orderbell_types::{AppConfig, ChimeSettings, KitchenSettings};

use super::ConfigError;

const APP_NAME: &str = "orderbell";
const CONFIG_NAME: &str = "config";
const HOURS_FILE: &str = "hours.toml";

/// Extension trait for AppConfig persistence
pub trait AppConfigExt: Sized {
    /// Load the stored config, or defaults if it is missing or unreadable.
    fn load() -> Self;
    fn load_from(path: &Path) -> Result<Self, ConfigError>;
    fn save(&self) -> Result<(), ConfigError>;
    fn save_to(&self, path: &Path) -> Result<(), ConfigError>;
    fn config_path() -> Result<PathBuf, ConfigError>;
    /// Opening hours file: `hours_file` if set, else next to the config file
    fn hours_path(&self) -> Option<PathBuf>;
}

impl AppConfigExt for AppConfig {
    fn load() -> Self {
        confy::load(APP_NAME, CONFIG_NAME).unwrap_or_else(|err| {
            tracing::warn!(error = %err, "Failed to load configuration, using defaults");
            Self::default()
        })
    }

    fn load_from(path: &Path) -> Result<Self, ConfigError> {
        confy::load_path(path).map_err(ConfigError::Load)
    }

    fn save(&self) -> Result<(), ConfigError> {
        confy::store(APP_NAME, CONFIG_NAME, self).map_err(ConfigError::Save)
    }

    fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        confy::store_path(path, self).map_err(ConfigError::Save)
    }

    fn config_path() -> Result<PathBuf, ConfigError> {
        confy::get_configuration_file_path(APP_NAME, CONFIG_NAME).map_err(ConfigError::Path)
    }

    fn hours_path(&self) -> Option<PathBuf> {
        if let Some(file) = self.hours_file.as_deref().filter(|f| !f.is_empty()) {
            return Some(PathBuf::from(file));
        }
        let config = Self::config_path().ok()?;
        Some(config.parent()?.join(HOURS_FILE))
    }
}
