//! S3 (or S3-compatible) object storage adapter.
//!
//! Sources are read from `<source_root>/<path>` and artifacts written to
//! `<cache_root>/<key>` inside one bucket. Artifacts are expected to be
//! reachable under `public_url` (a bucket website, CDN or proxy).

use async_trait::async_trait;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use image::ImageFormat;

use super::{decode_blocking, encode_blocking, join_url, validate_key, StorageAdapter};
use crate::config::AdapterConfig;
use crate::error::{ConfigError, StorageError};
use crate::handle::Image;

pub struct S3Adapter {
    client: Client,
    bucket: String,
    source_prefix: String,
    cache_prefix: String,
    public_url: String,
}

impl S3Adapter {
    pub const NAME: &'static str = "s3";

    pub fn from_config(config: &AdapterConfig) -> Result<Self, ConfigError> {
        let s3 = &config.s3;
        if s3.bucket.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "adapter.s3.bucket is required for the s3 adapter".into(),
            ));
        }

        let credentials = Credentials::new(
            std::env::var("AWS_ACCESS_KEY_ID").unwrap_or_default(),
            std::env::var("AWS_SECRET_ACCESS_KEY").unwrap_or_default(),
            std::env::var("AWS_SESSION_TOKEN").ok(),
            None,
            "imagine",
        );
        let mut builder = aws_sdk_s3::Config::builder()
            .credentials_provider(credentials)
            .region(Region::new(s3.region.clone()))
            .behavior_version_latest();
        if let Some(endpoint) = &s3.endpoint {
            // MinIO and friends only support path-style addressing
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        Ok(Self {
            client: Client::from_conf(builder.build()),
            bucket: s3.bucket.clone(),
            source_prefix: config.source_root.clone(),
            cache_prefix: config.cache_root.clone(),
            public_url: config.public_url.clone(),
        })
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Object key for `key` under `prefix`.
    fn object_key(prefix: &str, key: &str) -> String {
        let prefix = prefix.trim_matches('/');
        if prefix.is_empty() {
            key.to_string()
        } else {
            format!("{prefix}/{key}")
        }
    }

    fn backend_error(key: &str, error: impl std::error::Error) -> StorageError {
        StorageError::Backend {
            key: key.to_string(),
            message: DisplayErrorContext(error).to_string(),
        }
    }
}

impl std::fmt::Debug for S3Adapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3Adapter")
            .field("bucket", &self.bucket)
            .field("source_prefix", &self.source_prefix)
            .field("cache_prefix", &self.cache_prefix)
            .field("public_url", &self.public_url)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl StorageAdapter for S3Adapter {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        if validate_key(key).is_err() {
            return Ok(false);
        }
        let object = Self::object_key(&self.cache_prefix, key);
        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(&object)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(e) if e.as_service_error().is_some_and(|se| se.is_not_found()) => Ok(false),
            Err(e) => Err(Self::backend_error(key, e)),
        }
    }

    async fn fetch(&self, path: &str) -> Result<Image, StorageError> {
        validate_key(path)?;
        let object = Self::object_key(&self.source_prefix, path);
        let response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(&object)
            .send()
            .await
            .map_err(|e| {
                if e.as_service_error().is_some_and(|se| se.is_no_such_key()) {
                    StorageError::NotFound {
                        key: path.to_string(),
                    }
                } else {
                    Self::backend_error(path, e)
                }
            })?;

        let bytes = response
            .body
            .collect()
            .await
            .map_err(|e| Self::backend_error(path, e))?
            .into_bytes()
            .to_vec();
        decode_blocking(bytes, path).await
    }

    async fn store(&self, key: &str, image: Image) -> Result<String, StorageError> {
        validate_key(key)?;
        let bytes = encode_blocking(image, key).await?;
        let size = bytes.len();
        let object = Self::object_key(&self.cache_prefix, key);
        let content_type = ImageFormat::from_path(key)
            .ok()
            .map(|format| format.to_mime_type().to_string());

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&object)
            .set_content_type(content_type)
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(|e| Self::backend_error(key, e))?;

        tracing::debug!("Stored s3://{}/{object} ({size} bytes)", self.bucket);
        Ok(self.location(key))
    }

    fn location(&self, key: &str) -> String {
        join_url(&self.public_url, key)
    }
}
