//! Storage adapters: where source images are read from and filtered
//! images are written to.
//!
//! An adapter answers four questions for a cache key: does an artifact
//! exist, what are the source image's pixels, where should a filtered image
//! go, and under which URL is it served.

mod filesystem;
mod memory;
#[cfg(feature = "s3")]
mod s3;

pub use filesystem::FilesystemAdapter;
pub use memory::MemoryAdapter;
#[cfg(feature = "s3")]
pub use s3::S3Adapter;

use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use std::collections::HashMap;
use std::path::{Component, Path};
use std::sync::Arc;

use crate::config::AdapterConfig;
use crate::error::{ConfigError, StorageError};
use crate::handle::Image;

/// Trait that all storage backends implement.
///
/// Uses `async_trait` because native async fn in trait is not object-safe
/// (the resolver holds an `Arc<dyn StorageAdapter>`).
#[async_trait]
pub trait StorageAdapter: Send + Sync {
    /// Adapter name for logging (e.g., "fs").
    fn name(&self) -> &str;

    /// Whether a filtered artifact is stored under `key`.
    async fn exists(&self, key: &str) -> Result<bool, StorageError>;

    /// Load the source image at `path`.
    ///
    /// Fails with [`StorageError::NotFound`] when nothing is stored there.
    async fn fetch(&self, path: &str) -> Result<Image, StorageError>;

    /// Persist a filtered image under `key` and return its public location.
    ///
    /// Storing the same key twice overwrites; readers never observe a
    /// partially written artifact.
    async fn store(&self, key: &str, image: Image) -> Result<String, StorageError>;

    /// Public location of the artifact under `key`. Pure, never touches
    /// the backend.
    fn location(&self, key: &str) -> String;
}

impl std::fmt::Debug for dyn StorageAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "StorageAdapter({})", self.name())
    }
}

/// Decode on the blocking pool.
pub(crate) async fn decode_blocking(bytes: Vec<u8>, key: &str) -> Result<Image, StorageError> {
    let owned = key.to_string();
    tokio::task::spawn_blocking(move || Image::decode(&bytes, &owned))
        .await
        .map_err(|e| StorageError::Task {
            key: key.to_string(),
            message: e.to_string(),
        })?
}

/// Encode on the blocking pool.
pub(crate) async fn encode_blocking(image: Image, key: &str) -> Result<Vec<u8>, StorageError> {
    let owned = key.to_string();
    tokio::task::spawn_blocking(move || image.encode(&owned))
        .await
        .map_err(|e| StorageError::Task {
            key: key.to_string(),
            message: e.to_string(),
        })?
}

/// Characters escaped in a URL path segment.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Join a public URL prefix and a key with exactly one `/` between them.
///
/// Each `/`-separated segment of the key is percent-encoded; the prefix is
/// used as written.
pub(crate) fn join_url(prefix: &str, key: &str) -> String {
    let encoded: Vec<String> = key
        .trim_start_matches('/')
        .split('/')
        .map(|segment| utf8_percent_encode(segment, SEGMENT).to_string())
        .collect();
    format!("{}/{}", prefix.trim_end_matches('/'), encoded.join("/"))
}

/// Accept only canonical relative keys: non-empty segments separated by a
/// single `/`, none of them `.` or `..`.
pub(crate) fn validate_key(key: &str) -> Result<(), StorageError> {
    let canonical = !key.is_empty()
        && key.split('/').all(|segment| {
            let mut components = Path::new(segment).components();
            matches!(
                (components.next(), components.next()),
                (Some(Component::Normal(name)), None) if name == segment
            )
        });
    if canonical {
        Ok(())
    } else {
        Err(StorageError::InvalidKey {
            key: key.to_string(),
        })
    }
}

/// Builds an adapter from the `[adapter]` config section.
pub type AdapterConstructor = fn(&AdapterConfig) -> Result<Arc<dyn StorageAdapter>, ConfigError>;

/// Registry of storage adapters, keyed by the name used in `adapter.name`.
#[derive(Clone)]
pub struct AdapterRegistry {
    constructors: HashMap<String, AdapterConstructor>,
}

impl Default for AdapterRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl AdapterRegistry {
    /// A registry holding the built-in adapters.
    pub fn with_builtins() -> Self {
        let mut registry = Self {
            constructors: HashMap::new(),
        };
        registry.register(FilesystemAdapter::NAME, |config| {
            Ok(Arc::new(FilesystemAdapter::from_config(config)))
        });
        registry.register(MemoryAdapter::NAME, |config| {
            Ok(Arc::new(MemoryAdapter::new(&config.public_url)))
        });
        #[cfg(feature = "s3")]
        registry.register(S3Adapter::NAME, |config| {
            Ok(Arc::new(S3Adapter::from_config(config)?))
        });
        registry
    }

    /// Register (or replace) an adapter.
    pub fn register(&mut self, name: &str, constructor: AdapterConstructor) -> &mut Self {
        self.constructors.insert(name.to_string(), constructor);
        self
    }

    /// Create the adapter selected by `config.name`.
    pub fn create(&self, config: &AdapterConfig) -> Result<Arc<dyn StorageAdapter>, ConfigError> {
        let construct = self
            .constructors
            .get(&config.name)
            .ok_or_else(|| ConfigError::UnknownAdapter(config.name.clone()))?;
        construct(config)
    }
}

impl std::fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&str> = self.constructors.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("AdapterRegistry")
            .field("adapters", &names)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_url() {
        assert_eq!(join_url("/static/cache", "thumb/a.jpg"), "/static/cache/thumb/a.jpg");
        assert_eq!(join_url("/static/cache/", "/thumb/a.jpg"), "/static/cache/thumb/a.jpg");
        assert_eq!(
            join_url("https://cdn.example.com", "thumb/a.jpg"),
            "https://cdn.example.com/thumb/a.jpg"
        );
    }

    #[test]
    fn test_join_url_encodes_key_segments() {
        assert_eq!(
            join_url("/static/cache", "thumb/my photo.png"),
            "/static/cache/thumb/my%20photo.png"
        );
        assert_eq!(
            join_url("/static/cache", "thumb/a#1.png?x"),
            "/static/cache/thumb/a%231.png%3Fx"
        );
        assert_eq!(
            join_url("/static/cache", "thumb/caf\u{e9}/100%.jpg"),
            "/static/cache/thumb/caf%C3%A9/100%25.jpg"
        );
    }

    #[test]
    fn test_validate_key() {
        for key in ["thumb/a.jpg", "a.jpg", "thumb/photos/my photo.png", "thumb/.hidden"] {
            assert!(validate_key(key).is_ok(), "key {key:?}");
        }
        for key in [
            "",
            "/etc/passwd",
            "../a.jpg",
            "thumb/../../a.jpg",
            "./a.jpg",
            "thumb//a.jpg",
            "thumb/a.jpg/",
            "thumb/./a.jpg",
        ] {
            let err = validate_key(key).unwrap_err();
            assert!(matches!(err, StorageError::InvalidKey { .. }), "key {key:?}");
        }
    }

    #[test]
    fn test_registry_creates_builtins() {
        let registry = AdapterRegistry::with_builtins();
        let fs = registry.create(&AdapterConfig::default()).unwrap();
        assert_eq!(fs.name(), "fs");

        let memory = registry
            .create(&AdapterConfig {
                name: "memory".into(),
                ..AdapterConfig::default()
            })
            .unwrap();
        assert_eq!(memory.name(), "memory");
    }

    #[cfg(feature = "s3")]
    #[test]
    fn test_registry_creates_s3() {
        let registry = AdapterRegistry::with_builtins();
        let mut config = AdapterConfig {
            name: "s3".into(),
            ..AdapterConfig::default()
        };
        let err = registry.create(&config).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));

        config.s3.bucket = "images".into();
        let s3 = registry.create(&config).unwrap();
        assert_eq!(s3.name(), "s3");
    }

    #[test]
    fn test_registry_unknown_adapter() {
        let registry = AdapterRegistry::with_builtins();
        let result = registry.create(&AdapterConfig {
            name: "gcs".into(),
            ..AdapterConfig::default()
        });
        assert!(matches!(result, Err(ConfigError::UnknownAdapter(name)) if name == "gcs"));
    }

    #[tokio::test]
    async fn test_blocking_codec_helpers() {
        let image = crate::test_helpers::rgb(8, 4);
        let bytes = encode_blocking(image, "a.png").await.unwrap();
        let decoded = decode_blocking(bytes, "a.png").await.unwrap();
        assert_eq!(decoded.dimensions(), (8, 4));
    }
}
