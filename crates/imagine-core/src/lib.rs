//! Imagine Core - on-demand image transformation with a storage-backed cache.
//!
//! A request names a filter set and a source path. The resolver either
//! points at an already-materialized artifact or fetches the source, runs it
//! through the set's filter chain, stores the result and points at that:
//!
//! ```text
//! (filter_set, path) → cache check → fetch → filters → store → location
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use imagine_core::{Config, Imagine};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load()?;
//!     let imagine = Imagine::new(config)?;
//!
//!     let location = imagine.resolve("thumb", "photos/cat.jpg").await?;
//!     println!("Redirect to {location}");
//!     Ok(())
//! }
//! ```

// Module declarations
pub mod config;
pub mod error;
pub mod filter;
pub mod filter_set;
pub mod handle;
pub mod resolver;
pub mod storage;

#[cfg(test)]
pub(crate) mod test_helpers;

// Re-exports for convenient access
pub use config::Config;
pub use error::{ConfigError, FilterError, ResolveError, ResolveResult, StorageError};
pub use filter::{Filter, FilterConstructor, FilterParams, FilterRegistry};
pub use filter_set::FilterSet;
pub use handle::Image;
pub use resolver::{cache_key, Resolver};
pub use storage::{
    AdapterConstructor, AdapterRegistry, FilesystemAdapter, MemoryAdapter, StorageAdapter,
};
#[cfg(feature = "s3")]
pub use storage::S3Adapter;

use std::sync::Arc;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Imagine - the configured entry point.
///
/// Built once from a [`Config`]; every filter set is instantiated and every
/// name checked up front, so a bad configuration never reaches a request.
#[derive(Debug)]
pub struct Imagine {
    config: Config,
    resolver: Resolver,
}

impl Imagine {
    /// Build with the built-in filters and adapters.
    pub fn new(config: Config) -> Result<Self, ConfigError> {
        Self::builder(config).build()
    }

    /// Start a builder for registering custom filters or adapters.
    pub fn builder(config: Config) -> ImagineBuilder {
        ImagineBuilder {
            config,
            filters: FilterRegistry::with_builtins(),
            adapters: AdapterRegistry::with_builtins(),
            adapter: None,
        }
    }

    /// Build with the default configuration file.
    pub fn with_defaults() -> Result<Self, ConfigError> {
        Self::new(Config::load()?)
    }

    /// Get a reference to the current configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    /// Resolve `path` through `filter_set`. See [`Resolver::resolve`].
    pub async fn resolve(&self, filter_set: &str, path: &str) -> ResolveResult<String> {
        self.resolver.resolve(filter_set, path).await
    }

    /// URL of the resolve endpoint for `path` filtered through `filter_set`.
    pub fn url_for(&self, filter_set: &str, path: &str) -> String {
        storage::join_url(
            &self.config.server.url_prefix,
            &cache_key(filter_set, path.trim_start_matches('/')),
        )
    }
}

/// Builder for [`Imagine`] with extension points for custom filters and
/// storage backends.
pub struct ImagineBuilder {
    config: Config,
    filters: FilterRegistry,
    adapters: AdapterRegistry,
    adapter: Option<Arc<dyn StorageAdapter>>,
}

impl ImagineBuilder {
    /// Register a filter type under `name`.
    pub fn filter(mut self, name: &str, constructor: FilterConstructor) -> Self {
        self.filters.register(name, constructor);
        self
    }

    /// Register a storage adapter under `name`, selectable via `adapter.name`.
    pub fn adapter_type(mut self, name: &str, constructor: AdapterConstructor) -> Self {
        self.adapters.register(name, constructor);
        self
    }

    /// Use an already-built adapter instead of the one named in the config.
    pub fn adapter(mut self, adapter: Arc<dyn StorageAdapter>) -> Self {
        self.adapter = Some(adapter);
        self
    }

    pub fn build(self) -> Result<Imagine, ConfigError> {
        let Self {
            config,
            mut filters,
            adapters,
            adapter,
        } = self;
        config.validate()?;

        for (alias, target) in &config.filters {
            if !filters.alias(alias, target) {
                return Err(ConfigError::ValidationError(format!(
                    "filter alias '{alias}' points at unknown filter type '{target}'"
                )));
            }
        }

        let sets = config
            .filter_sets
            .iter()
            .map(|(name, set)| FilterSet::from_config(name, set, &filters))
            .collect::<Result<Vec<_>, _>>()?;

        let adapter = match adapter {
            Some(adapter) => adapter,
            None => adapters.create(&config.adapter)?,
        };

        tracing::debug!(
            "Initializing Imagine v{} ({} filter sets, adapter '{}')",
            VERSION,
            sets.len(),
            adapter.name()
        );

        let resolver =
            Resolver::new(sets, adapter).with_deduplication(config.resolver.deduplicate);
        Ok(Imagine { config, resolver })
    }
}
