//! Configuration file support for lumen.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/lumen/config.toml`.

use crate::{ConflictingDataPolicy, Error, Locale, LumenConfiguration, LumenSlot, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub locale: Locale,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub lumens: LumenConfiguration,

    #[serde(default)]
    pub policy: PolicyConfig,
}

/// Drug database location
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct DatabaseConfig {
    /// JSON database file; the built-in sample set is used when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

/// Clinical policy knobs
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct PolicyConfig {
    #[serde(default)]
    pub conflicting_data: ConflictingDataPolicy,
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!(
                "No config file found at {:?}, using defaults",
                config_path
            );
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join("lumen")
            .join("config.toml")
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }

    /// Configured lumens as slots, validated
    pub fn lumen_slots(&self) -> Result<Vec<LumenSlot>> {
        self.lumens.slots()
    }
}
