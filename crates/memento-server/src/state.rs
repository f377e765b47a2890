//! Application state.

use crate::cache::CacheService;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// The response cache.
    cache: CacheService,
}

impl AppState {
    /// Creates a new AppState around the given cache service.
    pub fn new(cache: CacheService) -> Self {
        Self { cache }
    }

    /// Returns a reference to the cache service.
    pub fn cache(&self) -> &CacheService {
        &self.cache
    }
}
