//! Cache provider trait definition.

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::error::ProviderResult;

/// Number of keys yielded per batch by [`CacheProvider::scan`].
pub const SCAN_BATCH_SIZE: usize = 100;

/// Lazy sequence of key batches produced by a scan.
pub type KeyBatches<'a> = BoxStream<'a, ProviderResult<Vec<String>>>;

/// Raw storage primitives behind the cache service.
///
/// This trait abstracts over different storage backends (in-process memory,
/// Redis, test doubles) so the cache service never needs to know where
/// entries actually live.
///
/// # Implementors
///
/// - `MemoryProvider` - Process-local tables with lazy expiry
/// - `RedisProvider` - Redis, using its native TTLs and `SET NX`
///
/// # Contract
///
/// Errors are returned, never swallowed: degrading gracefully is the
/// caller's business. `acquire_lock` must be a single atomic
/// create-if-absent, never an exists-check followed by a set.
///
/// # Example
///
/// ```ignore
/// use memento_providers::{CacheProvider, MemoryProvider};
///
/// let provider = MemoryProvider::new();
/// provider.set("greeting", "hola", 60).await?;
/// assert_eq!(provider.get("greeting").await?, Some("hola".to_string()));
/// ```
#[async_trait]
pub trait CacheProvider: Send + Sync {
    /// Reads a string value, `None` when absent or expired.
    async fn get(&self, key: &str) -> ProviderResult<Option<String>>;

    /// Writes a string value that expires after `ttl_seconds`.
    async fn set(&self, key: &str, value: &str, ttl_seconds: u64) -> ProviderResult<()>;

    /// Deletes a key. Returns whether it existed.
    async fn del(&self, key: &str) -> ProviderResult<bool>;

    /// Deletes several keys at once. Returns how many existed.
    async fn del_many(&self, keys: &[String]) -> ProviderResult<u64>;

    /// Adds members to the set stored at `key`.
    ///
    /// With a TTL, the set lives at least `ttl_seconds` from now: an existing
    /// longer expiry is never shortened.
    async fn add_to_set(
        &self,
        key: &str,
        members: &[String],
        ttl_seconds: Option<u64>,
    ) -> ProviderResult<()>;

    /// Returns the members of the set stored at `key` (empty when absent).
    async fn get_set_members(&self, key: &str) -> ProviderResult<Vec<String>>;

    /// Creates the lock key if it does not exist. Returns true iff this call created it.
    async fn acquire_lock(&self, key: &str, ttl_ms: u64) -> ProviderResult<bool>;

    /// Removes a lock unconditionally.
    async fn release_lock(&self, key: &str) -> ProviderResult<()>;

    /// Enumerates keys matching a glob pattern, in batches of at most
    /// [`SCAN_BATCH_SIZE`].
    fn scan<'a>(&'a self, pattern: &'a str) -> KeyBatches<'a>;

    /// Releases the provider's resources. Calling it twice is harmless.
    async fn disconnect(&self) -> ProviderResult<()>;

    /// Returns the name of this provider.
    ///
    /// This is used for logging and identification purposes.
    fn name(&self) -> &str;
}
