//! Redis cache provider.

use async_trait::async_trait;
use futures::stream::{self, StreamExt, TryStreamExt};
use parking_lot::RwLock;
use redis::AsyncCommands;
use redis::aio::MultiplexedConnection;
use tracing::info;

use crate::error::{ProviderError, ProviderResult};
use crate::provider::{CacheProvider, KeyBatches, SCAN_BATCH_SIZE};

/// Value stored under lock keys. Presence is all that matters.
const LOCK_VALUE: &str = "1";

/// Connection settings for [`RedisProvider`].
#[derive(Debug, Clone)]
pub struct RedisProviderConfig {
    /// Redis connection URL (e.g. `redis://localhost:6379`).
    pub url: String,
    /// Namespace prepended to every key on the wire and stripped from scan results.
    pub key_prefix: String,
}

impl Default for RedisProviderConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".to_string(),
            key_prefix: String::new(),
        }
    }
}

impl RedisProviderConfig {
    /// Creates a config for the given URL with no key prefix.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            key_prefix: String::new(),
        }
    }

    /// Sets the key prefix.
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }
}

/// Cache provider backed by Redis.
///
/// - TTLs use Redis expiry (`SET .. EX`, `EXPIRE`)
/// - locks use `SET .. NX PX`, a single atomic create-if-absent
/// - scans use cursor-based `SCAN .. MATCH`, never `KEYS`
pub struct RedisProvider {
    /// Shared multiplexed connection, `None` once disconnected.
    connection: RwLock<Option<MultiplexedConnection>>,
    config: RedisProviderConfig,
}

impl RedisProvider {
    /// Connects to Redis.
    pub async fn connect(config: RedisProviderConfig) -> ProviderResult<Self> {
        let client = redis::Client::open(config.url.as_str())?;
        let connection = client.get_multiplexed_async_connection().await?;

        info!(url = %config.url, prefix = %config.key_prefix, "Redis provider connected");

        Ok(Self {
            connection: RwLock::new(Some(connection)),
            config,
        })
    }

    /// Returns the provider configuration.
    pub fn config(&self) -> &RedisProviderConfig {
        &self.config
    }

    fn connection(&self) -> ProviderResult<MultiplexedConnection> {
        self.connection
            .read()
            .clone()
            .ok_or(ProviderError::Disconnected)
    }

    fn prefixed(&self, key: &str) -> String {
        format!("{}{}", self.config.key_prefix, key)
    }

    fn strip_prefix(&self, key: String) -> String {
        match key.strip_prefix(self.config.key_prefix.as_str()) {
            Some(stripped) => stripped.to_string(),
            None => key,
        }
    }
}

#[async_trait]
impl CacheProvider for RedisProvider {
    async fn get(&self, key: &str) -> ProviderResult<Option<String>> {
        let mut conn = self.connection()?;
        let value: Option<String> = conn.get(self.prefixed(key)).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, ttl_seconds: u64) -> ProviderResult<()> {
        let mut conn = self.connection()?;
        let mut cmd = redis::cmd("SET");
        cmd.arg(self.prefixed(key)).arg(value);
        if ttl_seconds > 0 {
            cmd.arg("EX").arg(ttl_seconds);
        }

        let _: () = cmd.query_async(&mut conn).await?;
        Ok(())
    }

    async fn del(&self, key: &str) -> ProviderResult<bool> {
        let mut conn = self.connection()?;
        let removed: u64 = conn.del(self.prefixed(key)).await?;
        Ok(removed > 0)
    }

    async fn del_many(&self, keys: &[String]) -> ProviderResult<u64> {
        if keys.is_empty() {
            return Ok(0);
        }

        let mut conn = self.connection()?;
        let prefixed: Vec<String> = keys.iter().map(|k| self.prefixed(k)).collect();
        let removed: u64 = conn.del(prefixed).await?;
        Ok(removed)
    }

    async fn add_to_set(
        &self,
        key: &str,
        members: &[String],
        ttl_seconds: Option<u64>,
    ) -> ProviderResult<()> {
        let mut conn = self.connection()?;
        let key = self.prefixed(key);

        if !members.is_empty() {
            let _: u64 = conn.sadd(&key, members).await?;
        }

        if let Some(ttl) = ttl_seconds.filter(|ttl| *ttl > 0) {
            // -2: missing, -1: no expiry. Both get the new TTL.
            let remaining: i64 = redis::cmd("TTL").arg(&key).query_async(&mut conn).await?;
            if remaining < ttl as i64 {
                let _: () = redis::cmd("EXPIRE")
                    .arg(&key)
                    .arg(ttl)
                    .query_async(&mut conn)
                    .await?;
            }
        }

        Ok(())
    }

    async fn get_set_members(&self, key: &str) -> ProviderResult<Vec<String>> {
        let mut conn = self.connection()?;
        let mut members: Vec<String> = conn.smembers(self.prefixed(key)).await?;
        members.sort();
        Ok(members)
    }

    async fn acquire_lock(&self, key: &str, ttl_ms: u64) -> ProviderResult<bool> {
        let mut conn = self.connection()?;
        let reply: Option<String> = redis::cmd("SET")
            .arg(self.prefixed(key))
            .arg(LOCK_VALUE)
            .arg("NX")
            .arg("PX")
            .arg(ttl_ms.max(1))
            .query_async(&mut conn)
            .await?;
        Ok(reply.is_some())
    }

    async fn release_lock(&self, key: &str) -> ProviderResult<()> {
        let mut conn = self.connection()?;
        let _: u64 = conn.del(self.prefixed(key)).await?;
        Ok(())
    }

    fn scan<'a>(&'a self, pattern: &'a str) -> KeyBatches<'a> {
        let matcher = self.prefixed(pattern);

        // State is the next cursor; `None` once Redis reports cursor 0.
        stream::try_unfold(Some(0u64), move |cursor| {
            let matcher = matcher.clone();
            async move {
                let Some(cursor) = cursor else {
                    return Ok(None);
                };

                let mut conn = self.connection()?;
                let (next, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                    .arg(cursor)
                    .arg("MATCH")
                    .arg(&matcher)
                    .arg("COUNT")
                    .arg(SCAN_BATCH_SIZE)
                    .query_async(&mut conn)
                    .await?;

                let batch: Vec<String> = keys.into_iter().map(|k| self.strip_prefix(k)).collect();
                let state = (next != 0).then_some(next);
                Ok::<_, ProviderError>(Some((batch, state)))
            }
        })
        .try_filter(|batch| futures::future::ready(!batch.is_empty()))
        .boxed()
    }

    async fn disconnect(&self) -> ProviderResult<()> {
        if self.connection.write().take().is_some() {
            info!("Redis provider disconnected");
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "redis"
    }
}
