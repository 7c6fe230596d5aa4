//! Name → constructor lookup for filter types.

use std::collections::HashMap;

use super::{
    AutorotateFilter, CropFilter, DownscaleFilter, Filter, FilterParams, RelativeResizeFilter,
    RotateFilter, ThumbnailFilter, UpscaleFilter,
};
use crate::error::FilterError;

/// Builds a configured filter from its parameter table.
pub type FilterConstructor = fn(&FilterParams) -> Result<Box<dyn Filter>, FilterError>;

fn boxed<F, C>(construct: C, params: &FilterParams) -> Result<Box<dyn Filter>, FilterError>
where
    F: Filter + 'static,
    C: Fn(&FilterParams) -> Result<F, FilterError>,
{
    construct(params).map(|f| Box::new(f) as Box<dyn Filter>)
}

/// Registry of filter implementations, keyed by type name.
///
/// Starts with the built-in filters; applications add their own with
/// [`register`](Self::register) or expose an existing one under another
/// name with [`alias`](Self::alias) before filter sets are built.
#[derive(Clone)]
pub struct FilterRegistry {
    constructors: HashMap<String, FilterConstructor>,
}

impl Default for FilterRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl FilterRegistry {
    /// An empty registry.
    pub fn empty() -> Self {
        Self {
            constructors: HashMap::new(),
        }
    }

    /// A registry holding every built-in filter.
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        registry.register(AutorotateFilter::NAME, |p| boxed(AutorotateFilter::new, p));
        registry.register(CropFilter::NAME, |p| boxed(CropFilter::new, p));
        registry.register(DownscaleFilter::NAME, |p| boxed(DownscaleFilter::new, p));
        registry.register(RelativeResizeFilter::NAME, |p| {
            boxed(RelativeResizeFilter::new, p)
        });
        registry.register(RotateFilter::NAME, |p| boxed(RotateFilter::new, p));
        registry.register(ThumbnailFilter::NAME, |p| boxed(ThumbnailFilter::new, p));
        registry.register(UpscaleFilter::NAME, |p| boxed(UpscaleFilter::new, p));
        registry
    }

    /// Register (or replace) a filter type.
    pub fn register(&mut self, name: &str, constructor: FilterConstructor) -> &mut Self {
        self.constructors.insert(name.to_string(), constructor);
        self
    }

    /// Make `target`'s implementation available as `name`.
    ///
    /// Returns `false` when `target` is not registered.
    pub fn alias(&mut self, name: &str, target: &str) -> bool {
        match self.constructors.get(target).copied() {
            Some(constructor) => {
                self.register(name, constructor);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.constructors.contains_key(name)
    }

    /// Build a filter. Returns `None` for an unregistered type name.
    pub fn build(
        &self,
        name: &str,
        params: &FilterParams,
    ) -> Option<Result<Box<dyn Filter>, FilterError>> {
        self.constructors.get(name).map(|construct| construct(params))
    }

    /// Registered type names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.constructors.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl std::fmt::Debug for FilterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterRegistry")
            .field("filters", &self.names())
            .finish()
    }
}
