//! # Memento Server
//!
//! HTTP side of the Memento response cache, built on axum.
//!
//! - [`cache`]: the cache service, single-flight reads, invalidation and the
//!   [`ResponseCacheLayer`](cache::ResponseCacheLayer) for GET routes
//! - [`handlers`]: health, statistics, invalidation and `/metrics` endpoints
//! - [`settings`]: file and environment configuration
//!
//! ## Example
//!
//! ```no_run
//! use axum::{Router, http::Method};
//! use memento_server::cache::{CacheService, RouteCacheConfig, RouterCacheExt};
//!
//! async fn list_users() -> &'static str {
//!     "[]"
//! }
//!
//! # fn main() -> Result<(), memento_core::CacheConfigError> {
//! let cache = CacheService::in_memory();
//! let app: Router = Router::new().cached_route(
//!     Method::GET,
//!     "/users",
//!     list_users,
//!     RouteCacheConfig::new().ttl(60).tags(["users"]),
//!     &cache,
//! )?;
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod server;
pub mod settings;
pub mod state;

// Re-exports
pub use error::AppError;
pub use server::{admin_router, create_router_with_state, run_server_with_state};
pub use settings::{ProviderKind, Settings, SettingsError};
pub use state::AppState;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
