//! Sub-configuration structs with their defaults.

use serde::{Deserialize, Serialize};

use crate::filter::FilterParams;

/// HTTP server settings (consumed by the `imagine` binary).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address to listen on
    pub bind: String,

    /// URL prefix of the resolve route: `<url_prefix>/<filter_set>/<path>`
    pub url_prefix: String,

    /// Serve the filesystem cache under the adapter's `public_url`
    pub serve_cache: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8080".to_string(),
            url_prefix: "/media/cache/resolve".to_string(),
            serve_cache: true,
        }
    }
}

/// Resolver behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Share one computation between concurrent requests for the same key
    pub deduplicate: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self { deduplicate: true }
    }
}

/// Storage adapter selection and roots.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdapterConfig {
    /// Registered adapter name ("fs", "memory", "s3")
    pub name: String,

    /// Where original images are read from (a key prefix for "s3")
    pub source_root: String,

    /// Where filtered images are written (a key prefix for "s3")
    pub cache_root: String,

    /// Public URL prefix under which cached images are reachable
    pub public_url: String,

    /// Bucket settings, used by the "s3" adapter
    pub s3: S3Config,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            name: "fs".to_string(),
            source_root: "static".to_string(),
            cache_root: "static/cache".to_string(),
            public_url: "/static/cache".to_string(),
            s3: S3Config::default(),
        }
    }
}

/// S3 (or S3-compatible) bucket settings.
///
/// Credentials are read from `AWS_ACCESS_KEY_ID` and `AWS_SECRET_ACCESS_KEY`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct S3Config {
    /// Bucket holding both sources and artifacts
    pub bucket: String,

    /// AWS region (e.g., "us-west-2")
    pub region: String,

    /// Custom endpoint for S3-compatible stores such as MinIO
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

impl Default for S3Config {
    fn default() -> Self {
        Self {
            bucket: String::new(),
            region: "us-east-1".to_string(),
            endpoint: None,
        }
    }
}

/// A named filter chain as written in the configuration file.
///
/// `filters` maps filter type names to their parameters; entries are kept
/// in file order, which is the order they are applied in.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilterSetConfig {
    /// Filter type → parameter table
    #[serde(default)]
    pub filters: FilterParams,

    /// Serve existing cached artifacts without recomputing
    #[serde(default)]
    pub cached: bool,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
