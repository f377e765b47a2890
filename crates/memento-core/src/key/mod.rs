//! Cache key generation.
//!
//! Keys have the shape
//! `{prefix}:global:{METHOD}:{route}[:{params}][:q:{query}][:b:{body}][:h:{headers}][:c:{custom}]`
//! where every bracketed segment is a [`hash_data`](crate::codec::hash_data)
//! fingerprint that only appears when its dimension is enabled and present.

mod builder;
mod route;

pub use builder::{CacheKeyBuilder, select_keys};
pub use route::normalize_route;

/// Prefix of single-flight lock keys.
pub const LOCK_KEY_PREFIX: &str = "lock:";

/// Returns the lock key guarding a cache key.
///
/// ```
/// use memento_core::key::generate_lock_key;
///
/// assert_eq!(generate_lock_key("cache:global:GET:/a"), "lock:cache:global:GET:/a");
/// ```
pub fn generate_lock_key(cache_key: &str) -> String {
    format!("{}{}", LOCK_KEY_PREFIX, cache_key)
}

/// Returns the key of the index set that tracks the members of a tag.
///
/// ```
/// use memento_core::key::generate_tag_key;
///
/// assert_eq!(generate_tag_key("cache", "users"), "cache:tag:users");
/// ```
pub fn generate_tag_key(prefix: &str, tag: &str) -> String {
    format!("{}:tag:{}", prefix, tag)
}
