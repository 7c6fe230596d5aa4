//! Named, ordered filter chains.

use crate::config::FilterSetConfig;
use crate::error::{ConfigError, FilterError};
use crate::filter::{Filter, FilterRegistry};
use crate::handle::Image;

/// An ordered chain of filters plus its caching policy.
///
/// Each filter consumes the previous filter's output. An empty chain is
/// legal and returns its input unchanged.
#[derive(Debug)]
pub struct FilterSet {
    name: String,
    filters: Vec<Box<dyn Filter>>,
    cached: bool,
}

impl FilterSet {
    pub fn new(name: impl Into<String>, filters: Vec<Box<dyn Filter>>, cached: bool) -> Self {
        Self {
            name: name.into(),
            filters,
            cached,
        }
    }

    /// Build a set from its configuration, instantiating every filter
    /// through `registry` in declaration order.
    pub fn from_config(
        name: &str,
        config: &FilterSetConfig,
        registry: &FilterRegistry,
    ) -> Result<Self, ConfigError> {
        let mut filters = Vec::with_capacity(config.filters.len());
        for (filter, value) in &config.filters {
            let params = match value {
                toml::Value::Table(table) => table.clone(),
                _ => {
                    return Err(ConfigError::ValidationError(format!(
                        "filter_sets.{name}.filters.{filter} must be a table of parameters"
                    )))
                }
            };
            let built = registry
                .build(filter, &params)
                .ok_or_else(|| ConfigError::UnknownFilter {
                    filter_set: name.to_string(),
                    filter: filter.clone(),
                })?
                .map_err(|source| ConfigError::Filter {
                    filter_set: name.to_string(),
                    source,
                })?;
            filters.push(built);
        }
        Ok(Self::new(name, filters, config.cached))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether an existing cached artifact may be served without recomputing.
    pub fn cached(&self) -> bool {
        self.cached
    }

    pub fn filters(&self) -> &[Box<dyn Filter>] {
        &self.filters
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Fold `image` through every filter in order.
    ///
    /// Stops at the first failing filter; no partial result is returned.
    pub fn apply(&self, image: Image) -> Result<Image, FilterError> {
        self.filters.iter().try_fold(image, |image, filter| {
            let start = std::time::Instant::now();
            let out = filter.apply(image);
            tracing::trace!("  {}/{}: {:?}", self.name, filter.name(), start.elapsed());
            out
        })
    }
}
