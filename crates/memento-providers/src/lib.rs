//! # Memento Providers
//!
//! Storage backends for the Memento response cache.
//!
//! Every backend implements [`CacheProvider`], the small set of primitives
//! the cache service is built on: string get/set with TTL, deletes, tag
//! index sets, single-flight locks and pattern scans.
//!
//! ## Backends
//!
//! - [`MemoryProvider`]: process-local maps, lazy expiry on read
//! - [`RedisProvider`]: Redis over a multiplexed async connection
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use memento_providers::{CacheProvider, MemoryProvider, RedisProvider, RedisProviderConfig};
//!
//! let local: Arc<dyn CacheProvider> = Arc::new(MemoryProvider::new());
//!
//! let config = RedisProviderConfig::new("redis://localhost:6379").with_key_prefix("memento:");
//! let remote: Arc<dyn CacheProvider> = Arc::new(RedisProvider::connect(config).await?);
//! ```

pub mod error;
pub mod memory;
pub mod pattern;
pub mod provider;
pub mod remote;

// Re-exports
pub use error::{ProviderError, ProviderResult};
pub use memory::MemoryProvider;
pub use pattern::KeyPattern;
pub use provider::{CacheProvider, KeyBatches, SCAN_BATCH_SIZE};
pub use remote::{RedisProvider, RedisProviderConfig};
