//! Command handlers.

pub mod config;
pub mod resolve;
pub mod serve;

use anyhow::Context;
use imagine_core::Config;
use std::path::{Path, PathBuf};

/// Load the config from `path`, or from the default location when unset.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    match path {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => Config::load().context("Failed to load config"),
    }
}

/// The config file in effect: `path` when given, else the default location.
pub fn config_path(path: Option<&Path>) -> PathBuf {
    path.map(Path::to_path_buf)
        .unwrap_or_else(Config::default_path)
}
