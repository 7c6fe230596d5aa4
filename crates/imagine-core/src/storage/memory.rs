//! In-process adapter holding sources and artifacts in memory.
//!
//! Useful for embedding and tests; nothing survives the process.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::{join_url, StorageAdapter};
use crate::error::StorageError;
use crate::handle::Image;

#[derive(Debug, Default)]
pub struct MemoryAdapter {
    public_url: String,
    sources: RwLock<HashMap<String, Image>>,
    cache: RwLock<HashMap<String, Image>>,
}

impl MemoryAdapter {
    pub const NAME: &'static str = "memory";

    pub fn new(public_url: &str) -> Self {
        Self {
            public_url: public_url.to_string(),
            ..Self::default()
        }
    }

    /// Add (or replace) a source image.
    pub async fn insert_source(&self, path: &str, image: Image) {
        self.sources.write().await.insert(path.to_string(), image);
    }

    /// A stored artifact, if any.
    pub async fn cached(&self, key: &str) -> Option<Image> {
        self.cache.read().await.get(key).cloned()
    }
}

#[async_trait]
impl StorageAdapter for MemoryAdapter {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        Ok(self.cache.read().await.contains_key(key))
    }

    async fn fetch(&self, path: &str) -> Result<Image, StorageError> {
        self.sources
            .read()
            .await
            .get(path)
            .cloned()
            .ok_or_else(|| StorageError::NotFound {
                key: path.to_string(),
            })
    }

    async fn store(&self, key: &str, image: Image) -> Result<String, StorageError> {
        self.cache.write().await.insert(key.to_string(), image);
        Ok(self.location(key))
    }

    fn location(&self, key: &str) -> String {
        join_url(&self.public_url, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::rgb;

    #[tokio::test]
    async fn test_fetch_and_store() {
        let adapter = MemoryAdapter::new("/cache");
        adapter.insert_source("a.jpg", rgb(10, 5)).await;

        assert_eq!(adapter.fetch("a.jpg").await.unwrap().dimensions(), (10, 5));
        assert!(adapter.fetch("b.jpg").await.unwrap_err().is_not_found());

        assert!(!adapter.exists("thumb/a.jpg").await.unwrap());
        let location = adapter.store("thumb/a.jpg", rgb(2, 1)).await.unwrap();
        assert_eq!(location, "/cache/thumb/a.jpg");
        assert!(adapter.exists("thumb/a.jpg").await.unwrap());
        assert_eq!(adapter.cached("thumb/a.jpg").await.unwrap().dimensions(), (2, 1));
    }

    #[tokio::test]
    async fn test_store_twice_returns_same_location() {
        let adapter = MemoryAdapter::new("/cache");
        let first = adapter.store("thumb/a b.jpg", rgb(2, 1)).await.unwrap();
        let second = adapter.store("thumb/a b.jpg", rgb(4, 4)).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first, "/cache/thumb/a%20b.jpg");
        assert_eq!(adapter.cached("thumb/a b.jpg").await.unwrap().dimensions(), (4, 4));
    }
}
