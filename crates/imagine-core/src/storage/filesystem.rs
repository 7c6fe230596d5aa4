//! Local filesystem adapter.
//!
//! Sources live under `source_root`, artifacts under `cache_root`, and
//! artifacts are served from `public_url`. Keys are canonical relative
//! paths; anything else (absolute paths, `..`, empty segments) is rejected as
//! [`StorageError::InvalidKey`], so a key names exactly one file and one URL.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use super::{decode_blocking, encode_blocking, join_url, validate_key, StorageAdapter};
use crate::config::{expand, AdapterConfig};
use crate::error::StorageError;
use crate::handle::Image;

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone)]
pub struct FilesystemAdapter {
    source_root: PathBuf,
    cache_root: PathBuf,
    public_url: String,
}

impl FilesystemAdapter {
    pub const NAME: &'static str = "fs";

    pub fn new(
        source_root: impl Into<PathBuf>,
        cache_root: impl Into<PathBuf>,
        public_url: impl Into<String>,
    ) -> Self {
        Self {
            source_root: source_root.into(),
            cache_root: cache_root.into(),
            public_url: public_url.into(),
        }
    }

    pub fn from_config(config: &AdapterConfig) -> Self {
        Self::new(
            expand(&config.source_root),
            expand(&config.cache_root),
            config.public_url.clone(),
        )
    }

    pub fn source_root(&self) -> &Path {
        &self.source_root
    }

    pub fn cache_root(&self) -> &Path {
        &self.cache_root
    }

    /// Join `key` onto `root`, refusing anything but plain path segments.
    fn resolve(root: &Path, key: &str) -> Result<PathBuf, StorageError> {
        validate_key(key)?;
        Ok(root.join(key))
    }

    fn io_error(key: &str, source: std::io::Error) -> StorageError {
        if source.kind() == std::io::ErrorKind::NotFound {
            StorageError::NotFound {
                key: key.to_string(),
            }
        } else {
            StorageError::Io {
                key: key.to_string(),
                source,
            }
        }
    }
}

#[async_trait]
impl StorageAdapter for FilesystemAdapter {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        let path = match Self::resolve(&self.cache_root, key) {
            Ok(path) => path,
            Err(_) => return Ok(false),
        };
        tokio::fs::try_exists(&path)
            .await
            .map_err(|source| StorageError::Io {
                key: key.to_string(),
                source,
            })
    }

    async fn fetch(&self, path: &str) -> Result<Image, StorageError> {
        let file = Self::resolve(&self.source_root, path)?;
        let metadata = tokio::fs::metadata(&file)
            .await
            .map_err(|e| Self::io_error(path, e))?;
        if !metadata.is_file() {
            return Err(StorageError::NotFound {
                key: path.to_string(),
            });
        }
        let bytes = tokio::fs::read(&file)
            .await
            .map_err(|e| Self::io_error(path, e))?;
        decode_blocking(bytes, path).await
    }

    async fn store(&self, key: &str, image: Image) -> Result<String, StorageError> {
        let target = Self::resolve(&self.cache_root, key)?;
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| StorageError::Io {
                    key: key.to_string(),
                    source,
                })?;
        }

        let bytes = encode_blocking(image, key).await?;

        // Write beside the target, then rename over it.
        let file_name = target
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let temp = target.with_file_name(format!(
            ".{file_name}.{}.{}.tmp",
            std::process::id(),
            TEMP_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));
        if let Err(source) = tokio::fs::write(&temp, &bytes).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(StorageError::Io {
                key: key.to_string(),
                source,
            });
        }
        if let Err(source) = tokio::fs::rename(&temp, &target).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(StorageError::Io {
                key: key.to_string(),
                source,
            });
        }

        tracing::debug!("Stored {} ({} bytes)", target.display(), bytes.len());
        Ok(self.location(key))
    }

    fn location(&self, key: &str) -> String {
        join_url(&self.public_url, key)
    }
}
