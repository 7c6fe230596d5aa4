//! Configuration management for Imagine.
//!
//! Configuration is loaded from a TOML file with sensible defaults. The
//! file location is `$IMAGINE_CONFIG` when set, otherwise the platform
//! config directory (see [`Config::default_path`]).

mod types;
mod validate;

pub use types::*;

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Environment variable overriding the config file location.
pub const CONFIG_ENV: &str = "IMAGINE_CONFIG";

/// Root configuration structure for Imagine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings
    pub server: ServerConfig,

    /// Resolver settings
    pub resolver: ResolverConfig,

    /// Storage adapter settings
    pub adapter: AdapterConfig,

    /// Filter aliases: new type name → registered type name
    pub filters: BTreeMap<String, String>,

    /// Named filter chains
    pub filter_sets: BTreeMap<String, FilterSetConfig>,

    /// Logging settings
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Returns default configuration if the file doesn't exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Get the config file path.
    ///
    /// `$IMAGINE_CONFIG` wins when set. Otherwise uses platform-appropriate
    /// directories:
    /// - macOS: ~/Library/Application Support/com.imagine.imagine/config.toml
    /// - Linux: ~/.config/imagine/config.toml
    /// - Windows: C:\Users\<User>\AppData\Roaming\imagine\config\config.toml
    ///
    /// Falls back to ~/.imagine/config.toml if directory detection fails.
    pub fn default_path() -> PathBuf {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            if !path.is_empty() {
                return expand(&path);
            }
        }
        directories::ProjectDirs::from("com", "imagine", "imagine")
            .map(|dirs| dirs.config_dir().to_path_buf().join("config.toml"))
            .unwrap_or_else(|| {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                PathBuf::from(home).join(".imagine").join("config.toml")
            })
    }

    /// Resolved source root (with ~ expansion).
    pub fn source_root(&self) -> PathBuf {
        expand(&self.adapter.source_root)
    }

    /// Resolved cache root (with ~ expansion).
    pub fn cache_root(&self) -> PathBuf {
        expand(&self.adapter.cache_root)
    }

    /// Serialize the config to a pretty TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ValidationError(e.to_string()))
    }
}

/// Expand a leading `~` in a configured path.
pub(crate) fn expand(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).into_owned())
}
