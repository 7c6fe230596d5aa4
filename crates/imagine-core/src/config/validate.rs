//! Configuration validation.
//!
//! Only checks what can be decided from the file alone; whether adapter and
//! filter names are registered is checked when [`crate::Imagine`] is built.

use std::net::SocketAddr;

use crate::error::ConfigError;

use super::Config;

impl Config {
    /// Validate configuration values are well-formed.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.server.bind.parse::<SocketAddr>().is_err() {
            return Err(ConfigError::ValidationError(format!(
                "server.bind must be a socket address, got '{}'",
                self.server.bind
            )));
        }
        if !self.server.url_prefix.starts_with('/') {
            return Err(ConfigError::ValidationError(
                "server.url_prefix must start with '/'".into(),
            ));
        }
        if self.adapter.name.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "adapter.name must not be empty".into(),
            ));
        }
        for name in self.filter_sets.keys() {
            if name.is_empty() || name.contains('/') {
                return Err(ConfigError::ValidationError(format!(
                    "filter set name '{name}' must be non-empty and must not contain '/'"
                )));
            }
        }
        for (name, params) in &self.filter_sets {
            for (filter, value) in &params.filters {
                if !value.is_table() {
                    return Err(ConfigError::ValidationError(format!(
                        "filter_sets.{name}.filters.{filter} must be a table of parameters"
                    )));
                }
            }
        }
        if !matches!(self.logging.format.as_str(), "pretty" | "json") {
            return Err(ConfigError::ValidationError(
                "logging.format must be \"pretty\" or \"json\"".into(),
            ));
        }
        Ok(())
    }
}
