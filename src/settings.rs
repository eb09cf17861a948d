//! Settings for the configuration sync loop
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (configs.toml)
//! - Environment variables (CONFIGS_*)
//!
//! ## Example config file (configs.toml):
//! ```toml
//! [sync]
//! check_interval_secs = 60
//! auto_apply = true
//!
//! [envelope]
//! output_format = "compact"
//! ```

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

use crate::codec::OutputFormat;

/// Top-level settings for registry synchronization
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SyncSettings {
    /// Sync loop settings
    #[serde(default)]
    pub sync: SyncConfig,

    /// Envelope encoding settings
    #[serde(default)]
    pub envelope: EnvelopeConfig,
}

/// Sync loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Seconds between remote version checks
    #[serde(default = "default_check_interval")]
    pub check_interval_secs: u64,

    /// Apply a newer remote configuration as soon as it is seen
    #[serde(default = "default_true")]
    pub auto_apply: bool,
}

/// Envelope encoding configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EnvelopeConfig {
    /// JSON layout for encoded envelopes (compact or pretty)
    #[serde(default)]
    pub output_format: OutputFormat,
}

fn default_check_interval() -> u64 {
    60
}

fn default_true() -> bool {
    true
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            check_interval_secs: default_check_interval(),
            auto_apply: true,
        }
    }
}

impl SyncSettings {
    /// Load settings from default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load settings from a specific file
    pub fn load_from(config_path: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        // Load from default locations
        let config_locations = ["configs.toml", ".configs.toml", "config/configs.toml"];

        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        // Load from XDG config directory
        if let Some(config_dir) = directories::ProjectDirs::from("dev", "familiar", "configs") {
            let xdg_config = config_dir.config_dir().join("configs.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        // Load from specified path
        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // Load from environment variables (CONFIGS_*)
        builder = builder.add_source(
            Environment::with_prefix("CONFIGS")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Save settings to a file
    pub fn save(&self, path: &str) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }
}
