//! Cache invalidation by tag, exact key and glob pattern.

use futures::StreamExt;
use memento_core::key::generate_tag_key;
use tracing::{debug, info};

use super::service::CacheService;

impl CacheService {
    /// Invalida todas las entradas registradas bajo los tags dados.
    ///
    /// Each tag's members and the tag index itself are removed in one
    /// delete. Only the members count toward the result. A tag whose lookup
    /// fails contributes zero.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use memento_server::cache::{CacheService, SetOptions};
    /// # #[tokio::main]
    /// # async fn main() {
    /// let cache = CacheService::in_memory();
    /// cache.set("a", &1, 60, SetOptions::default().tags(["users"])).await;
    ///
    /// let count = cache.invalidate(&["users".to_string()]).await;
    /// assert_eq!(count, 1);
    /// # }
    /// ```
    pub async fn invalidate(&self, tags: &[String]) -> u64 {
        let provider = self.provider();
        let mut total = 0u64;

        for tag in tags {
            let tag_key = generate_tag_key(self.key_prefix(), tag);

            let members = match provider.get_set_members(&tag_key).await {
                Ok(members) => members,
                Err(e) => {
                    self.provider_failure("invalidate", &tag_key, &e);
                    continue;
                },
            };

            let count = members.len() as u64;
            let mut keys = members;
            keys.push(tag_key.clone());

            if let Err(e) = provider.del_many(&keys).await {
                self.provider_failure("invalidate", &tag_key, &e);
                continue;
            }

            debug!(tag = %tag, entries = count, "Tag invalidated");
            total += count;
        }

        self.metrics().record_invalidations(total);
        info!(tags = ?tags, count = total, "Cache invalidated by tags");
        total
    }

    /// Invalida una entrada especifica.
    ///
    /// Returns whether the key existed. Only existing keys are counted as
    /// invalidations.
    pub async fn invalidate_key(&self, key: &str) -> bool {
        match self.provider().del(key).await {
            Ok(existed) => {
                if existed {
                    self.metrics().record_invalidations(1);
                }
                info!(key = %key, existed = existed, "Cache key invalidated");
                existed
            },
            Err(e) => {
                self.provider_failure("invalidate_key", key, &e);
                false
            },
        }
    }

    /// Invalida entradas usando un patron glob.
    ///
    /// The scan runs in batches and each batch is deleted before the next
    /// is requested. A failing batch stops the scan; keys deleted so far
    /// still count.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use memento_server::cache::CacheService;
    /// # #[tokio::main]
    /// # async fn main() {
    /// # let cache = CacheService::in_memory();
    /// // Invalida todo lo cacheado bajo /users
    /// let count = cache.invalidate_pattern("cache:GET:/users*").await;
    /// # }
    /// ```
    pub async fn invalidate_pattern(&self, pattern: &str) -> u64 {
        let provider = self.provider();
        let mut total = 0u64;

        {
            let mut batches = provider.scan(pattern);
            while let Some(batch) = batches.next().await {
                let keys = match batch {
                    Ok(keys) => keys,
                    Err(e) => {
                        self.provider_failure("invalidate_pattern", pattern, &e);
                        break;
                    },
                };

                if keys.is_empty() {
                    continue;
                }

                match provider.del_many(&keys).await {
                    Ok(deleted) => total += deleted,
                    Err(e) => {
                        self.provider_failure("invalidate_pattern", pattern, &e);
                        break;
                    },
                }
            }
        }

        self.metrics().record_invalidations(total);
        info!(pattern = %pattern, count = total, "Cache invalidated by pattern");
        total
    }
}
