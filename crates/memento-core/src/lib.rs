//! Memento Core - codec, cache keys and domain types
//!
//! This crate holds the pure, I/O-free part of the Memento response cache:
//!
//! - [`codec`]: stable serialization, fingerprint hashing and gzip compression
//! - [`key`]: the cache key builder plus lock and tag key companions
//! - [`policy`]: resolution of per-route include policies
//! - [`types`]: stored entries, statistics and lock behaviors
//! - [`error`]: configuration and codec errors

pub mod codec;
pub mod error;
pub mod key;
pub mod policy;
pub mod types;

pub use error::{CacheConfigError, CodecError, CodecResult};
pub use key::{CacheKeyBuilder, generate_lock_key, generate_tag_key, normalize_route};
pub use policy::{IncludePolicy, IncludeRule, IncludeSpec, Inclusion};
pub use types::{CacheEntry, CacheStats, CacheStatus, LockBehavior};

/// Smallest TTL a route may declare, in seconds.
pub const MIN_TTL_SECONDS: u64 = 1;

/// Largest TTL a route may declare, in seconds (one day).
pub const MAX_TTL_SECONDS: u64 = 86_400;

/// Checks that a declared TTL lies in `[MIN_TTL_SECONDS, MAX_TTL_SECONDS]`.
///
/// ```
/// use memento_core::validate_ttl;
///
/// assert!(validate_ttl(60).is_ok());
/// assert!(validate_ttl(0).is_err());
/// assert!(validate_ttl(86_401).is_err());
/// ```
pub fn validate_ttl(ttl: u64) -> Result<u64, CacheConfigError> {
    if (MIN_TTL_SECONDS..=MAX_TTL_SECONDS).contains(&ttl) {
        Ok(ttl)
    } else {
        Err(CacheConfigError::TtlOutOfRange {
            ttl,
            min: MIN_TTL_SECONDS,
            max: MAX_TTL_SECONDS,
        })
    }
}

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
