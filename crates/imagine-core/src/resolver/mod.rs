//! Request resolution: turn `(filter set, path)` into the public location
//! of the filtered image, computing and storing it on demand.
//!
//! ```text
//! resolve ─→ lookup set ─→ cached && exists(key)? ──yes──→ location(key)
//!                                   │ no
//!                                   ▼
//!                    fetch(path) ─→ apply(set) ─→ store(key) ─→ location
//! ```
//!
//! Filter sets that are not `cached` recompute and overwrite their artifact
//! on every request.

mod flight;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use flight::InFlight;

use crate::error::{ResolveError, ResolveResult, StorageError};
use crate::filter_set::FilterSet;
use crate::storage::StorageAdapter;

/// Cache key of the artifact for `path` filtered through `filter_set`.
pub fn cache_key(filter_set: &str, path: &str) -> String {
    format!("{filter_set}/{path}")
}

/// Resolves requests against a fixed set of filter chains and one adapter.
///
/// Immutable after construction and safe to share between requests.
#[derive(Debug)]
pub struct Resolver {
    filter_sets: HashMap<String, Arc<FilterSet>>,
    adapter: Arc<dyn StorageAdapter>,
    flights: Option<InFlight>,
}

impl Resolver {
    /// Build a resolver. Concurrent computations for one key are collapsed
    /// unless disabled with [`with_deduplication`](Self::with_deduplication).
    pub fn new(
        filter_sets: impl IntoIterator<Item = FilterSet>,
        adapter: Arc<dyn StorageAdapter>,
    ) -> Self {
        let filter_sets = filter_sets
            .into_iter()
            .map(|set| (set.name().to_string(), Arc::new(set)))
            .collect();
        Self {
            filter_sets,
            adapter,
            flights: Some(InFlight::default()),
        }
    }

    pub fn with_deduplication(mut self, enabled: bool) -> Self {
        self.flights = enabled.then(InFlight::default);
        self
    }

    pub fn filter_set(&self, name: &str) -> Option<&FilterSet> {
        self.filter_sets.get(name).map(Arc::as_ref)
    }

    /// Configured filter set names, sorted.
    pub fn filter_set_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.filter_sets.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn adapter(&self) -> &Arc<dyn StorageAdapter> {
        &self.adapter
    }

    /// Resolve `path` through `filter_set` and return the public location
    /// of the result.
    ///
    /// Absent sets and sources are reported as not-found errors (logged at
    /// warn); anything else is an internal failure (logged at error).
    pub async fn resolve(&self, filter_set: &str, path: &str) -> ResolveResult<String> {
        let start = Instant::now();
        let result = self.resolve_inner(filter_set, path).await;
        match &result {
            Ok(location) => {
                tracing::debug!(
                    "Resolved {filter_set}/{path} → {location} in {:?}",
                    start.elapsed()
                );
            }
            Err(ResolveError::FilterSetNotFound(name)) => {
                tracing::warn!("Filter not found: {name}");
            }
            Err(e @ (ResolveError::SourceNotFound(_) | ResolveError::InvalidKey(_))) => {
                tracing::warn!("File not found: {e}");
            }
            Err(e) => {
                tracing::error!(
                    key = %cache_key(filter_set, path),
                    backend = self.adapter.name(),
                    "Resolve failed: {e}"
                );
            }
        }
        result
    }

    async fn resolve_inner(&self, name: &str, path: &str) -> ResolveResult<String> {
        let set = self
            .filter_sets
            .get(name)
            .cloned()
            .ok_or_else(|| ResolveError::FilterSetNotFound(name.to_string()))?;
        let key = cache_key(name, path);

        if set.cached() {
            let hit = self
                .adapter
                .exists(&key)
                .await
                .map_err(|e| storage_error(&key, self.adapter.name(), e))?;
            if hit {
                tracing::trace!("Cache hit: {key}");
                return Ok(self.adapter.location(&key));
            }
        }

        let work = compute(set, Arc::clone(&self.adapter), path.to_string(), key.clone());
        match &self.flights {
            Some(flights) => flights.run(&key, work).await,
            None => work.await,
        }
    }
}

/// Fetch the source, run the chain on the blocking pool, store the result.
async fn compute(
    set: Arc<FilterSet>,
    adapter: Arc<dyn StorageAdapter>,
    path: String,
    key: String,
) -> ResolveResult<String> {
    let backend = adapter.name().to_string();
    let source = adapter.fetch(&path).await.map_err(|e| match e {
        StorageError::NotFound { .. } => ResolveError::SourceNotFound(path.clone()),
        StorageError::InvalidKey { .. } => ResolveError::InvalidKey(path.clone()),
        other => storage_error(&path, &backend, other),
    })?;

    let chain = Arc::clone(&set);
    let filtered = tokio::task::spawn_blocking(move || chain.apply(source))
        .await
        .map_err(|e| ResolveError::Task {
            key: key.clone(),
            message: e.to_string(),
        })?
        .map_err(|e| ResolveError::Filter {
            filter_set: set.name().to_string(),
            source: Arc::new(e),
        })?;

    adapter
        .store(&key, filtered)
        .await
        .map_err(|e| storage_error(&key, &backend, e))
}

fn storage_error(key: &str, backend: &str, error: StorageError) -> ResolveError {
    match error {
        StorageError::InvalidKey { .. } => ResolveError::InvalidKey(key.to_string()),
        other => ResolveError::Storage {
            key: key.to_string(),
            backend: backend.to_string(),
            source: Arc::new(other),
        },
    }
}
