//! Shared fixtures for unit tests.

use async_trait::async_trait;
use image::{DynamicImage, ImageFormat, RgbImage};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::error::StorageError;
use crate::filter::FilterParams;
use crate::handle::Image;
use crate::storage::StorageAdapter;

/// Parse a TOML snippet into filter parameters.
pub fn params(toml: &str) -> FilterParams {
    toml::from_str(toml).unwrap()
}

/// A solid RGB image of the given size.
pub fn rgb(width: u32, height: u32) -> Image {
    Image::new(DynamicImage::ImageRgb8(RgbImage::from_pixel(
        width,
        height,
        image::Rgb([200, 120, 40]),
    )))
}

/// PNG-encoded bytes of a solid image.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut out = std::io::Cursor::new(Vec::new());
    rgb(width, height)
        .into_pixels()
        .write_to(&mut out, ImageFormat::Png)
        .unwrap();
    out.into_inner()
}

/// Adapter that records every call, for resolver tests.
#[derive(Default)]
pub struct MockAdapter {
    pub sources: HashMap<String, (u32, u32)>,
    pub existing: Mutex<HashSet<String>>,
    pub stored: Mutex<HashMap<String, (u32, u32)>>,
    pub exists_calls: AtomicUsize,
    pub fetch_calls: AtomicUsize,
    pub store_calls: AtomicUsize,
    pub fail_exists: bool,
    pub fail_store: bool,
    pub delay: Option<Duration>,
}

impl MockAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_source(mut self, path: &str, width: u32, height: u32) -> Self {
        self.sources.insert(path.to_string(), (width, height));
        self
    }

    pub fn with_existing(self, key: &str) -> Self {
        self.existing.lock().unwrap().insert(key.to_string());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn fetches(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub fn stores(&self) -> usize {
        self.store_calls.load(Ordering::SeqCst)
    }

    pub fn stored(&self, key: &str) -> Option<(u32, u32)> {
        self.stored.lock().unwrap().get(key).copied()
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }
}

#[async_trait]
impl StorageAdapter for MockAdapter {
    fn name(&self) -> &str {
        "mock"
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        self.exists_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_exists {
            return Err(StorageError::Io {
                key: key.to_string(),
                source: std::io::Error::other("backend unavailable"),
            });
        }
        Ok(self.existing.lock().unwrap().contains(key))
    }

    async fn fetch(&self, path: &str) -> Result<Image, StorageError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match self.sources.get(path) {
            Some(&(w, h)) => Ok(rgb(w, h)),
            None => Err(StorageError::NotFound {
                key: path.to_string(),
            }),
        }
    }

    async fn store(&self, key: &str, image: Image) -> Result<String, StorageError> {
        self.store_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_store {
            return Err(StorageError::Io {
                key: key.to_string(),
                source: std::io::Error::other("disk full"),
            });
        }
        self.stored
            .lock()
            .unwrap()
            .insert(key.to_string(), image.dimensions());
        self.existing.lock().unwrap().insert(key.to_string());
        Ok(self.location(key))
    }

    fn location(&self, key: &str) -> String {
        format!("/cache/{key}")
    }
}
