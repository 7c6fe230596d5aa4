//! Error types for the Imagine resolution pipeline.
//!
//! Errors are organized by concern so callers can tell configuration
//! mistakes (fatal at startup) from per-request failures, and absence
//! (a 404) from backend or filter failures (a 5xx).

use std::sync::Arc;
use thiserror::Error;

/// Configuration-specific errors. All of these are raised before serving.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),

    /// No storage adapter is registered under this name
    #[error("Unknown adapter: {0}")]
    UnknownAdapter(String),

    /// No filter implementation is registered under this type name
    #[error("Unknown filter type '{filter}' in filter set '{filter_set}'")]
    UnknownFilter { filter_set: String, filter: String },

    /// A filter rejected its parameters
    #[error("Wrong settings for filter set '{filter_set}': {source}")]
    Filter {
        filter_set: String,
        #[source]
        source: FilterError,
    },
}

/// Errors raised by filters, either when configured or when applied.
#[derive(Error, Debug)]
pub enum FilterError {
    /// Parameters failed validation at construction time
    #[error("Invalid parameters for filter '{filter}': {message}")]
    Config { filter: String, message: String },

    /// The input handed to `apply` is not something the filter can work on
    #[error("Unsupported input for filter '{filter}': {message}")]
    InvalidInput { filter: String, message: String },

    /// The transform itself failed
    #[error("Filter '{filter}' failed: {message}")]
    Apply { filter: String, message: String },
}

impl FilterError {
    pub(crate) fn config(filter: &str, message: impl Into<String>) -> Self {
        Self::Config {
            filter: filter.to_string(),
            message: message.into(),
        }
    }

    pub(crate) fn invalid_input(filter: &str, message: impl Into<String>) -> Self {
        Self::InvalidInput {
            filter: filter.to_string(),
            message: message.into(),
        }
    }

    pub(crate) fn apply(filter: &str, message: impl Into<String>) -> Self {
        Self::Apply {
            filter: filter.to_string(),
            message: message.into(),
        }
    }
}

/// Storage backend errors.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Nothing is stored under the key
    #[error("Resource not found: {key}")]
    NotFound { key: String },

    /// The key cannot address anything inside the backend's roots
    #[error("Invalid storage key: {key}")]
    InvalidKey { key: String },

    /// Backend I/O failure
    #[error("IO error for {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    /// Remote backend request failed
    #[error("Backend error for {key}: {message}")]
    Backend { key: String, message: String },

    /// Stored bytes are not a decodable image
    #[error("Decode error for {key}: {message}")]
    Decode { key: String, message: String },

    /// Image could not be encoded for storage
    #[error("Encode error for {key}: {message}")]
    Encode { key: String, message: String },

    /// Blocking worker failed to complete
    #[error("Task join error for {key}: {message}")]
    Task { key: String, message: String },
}

impl StorageError {
    /// Whether this error means "absent" rather than "broken".
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::InvalidKey { .. })
    }
}

/// Per-request resolution errors.
///
/// Sources are held in `Arc` so a single failed computation can be handed
/// to every request waiting on it.
#[derive(Error, Debug, Clone)]
pub enum ResolveError {
    /// No filter set is configured under the requested name
    #[error("Filter set not found: {0}")]
    FilterSetNotFound(String),

    /// The source image does not exist
    #[error("Resource not found: {0}")]
    SourceNotFound(String),

    /// The requested path cannot be addressed by the storage backend
    #[error("Invalid resource path: {0}")]
    InvalidKey(String),

    /// A filter in the chain failed
    #[error("Filter set '{filter_set}' failed: {source}")]
    Filter {
        filter_set: String,
        #[source]
        source: Arc<FilterError>,
    },

    /// The storage backend failed
    #[error("Storage backend '{backend}' failed for {key}: {source}")]
    Storage {
        key: String,
        backend: String,
        #[source]
        source: Arc<StorageError>,
    },

    /// The worker running filters or a shared computation did not complete
    #[error("Task failed for {key}: {message}")]
    Task { key: String, message: String },
}

impl ResolveError {
    /// Whether this error is an expected absence (HTTP 404) rather than an
    /// internal failure (HTTP 5xx).
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::FilterSetNotFound(_) | Self::SourceNotFound(_) | Self::InvalidKey(_)
        )
    }
}

/// Convenience type alias for resolution results.
pub type ResolveResult<T> = std::result::Result<T, ResolveError>;
