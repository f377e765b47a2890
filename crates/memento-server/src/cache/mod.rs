//! Response cache for Memento Server.
//!
//! [`CacheService`] wraps a storage provider with the caching contract:
//! encoded entries, tag indexes, single-flight locks and statistics.
//! [`ResponseCacheLayer`] plugs it into axum routes.

pub mod invalidation;
pub mod keys;
pub mod layer;
pub mod response;
pub mod route;
pub mod service;
pub mod single_flight;

use axum::http::HeaderName;

// Re-exports
pub use keys::RequestFingerprint;
pub use layer::{
    MAX_REQUEST_BODY_BYTES, ResponseCacheLayer, ResponseCacheMiddleware, RouterCacheExt,
};
pub use response::CachedResponse;
pub use route::{CacheDiscriminator, RouteCacheConfig, RoutePlan};
pub use service::{CacheService, CacheServiceOptions, SetOptions};
pub use single_flight::{FlightOutcome, FlightPlan};

/// Response header carrying `HIT` or `MISS`.
pub static CACHE_STATUS_HEADER: HeaderName = HeaderName::from_static("x-cache");
