//! Cache service: the caller-facing contract over a provider.
//!
//! Every method here is best-effort. Provider failures are logged, counted
//! and turned into a safe default (`None`, `false`, `0`); they never reach
//! the request path as errors.

use std::sync::Arc;
use std::time::Duration;

use memento_core::codec::{
    DEFAULT_COMPRESSION_THRESHOLD, compress_to_base64, decompress_from_base64,
    stable_stringify_serialize,
};
use memento_core::key::{generate_lock_key, generate_tag_key};
use memento_core::{CacheEntry, CacheStats, CodecResult, LockBehavior};
use memento_providers::{CacheProvider, MemoryProvider, ProviderError};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::metrics::CacheMetrics;

/// Extra lifetime of a tag index over the entries it tracks, in seconds.
pub const TAG_TTL_MARGIN_SECONDS: u64 = 60;

/// Interval between two reads while waiting for another request's result.
pub const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Configuracion del servicio de cache.
#[derive(Debug, Clone)]
pub struct CacheServiceOptions {
    /// TTL por defecto en segundos (default: 300 = 5 minutos)
    pub default_ttl: u64,
    /// Tamano minimo (bytes) para comprimir payloads (default: 1024)
    pub compression_threshold: usize,
    /// Prefijo de todas las keys (default: "cache")
    pub key_prefix: String,
    /// Habilita los contadores de estadisticas
    pub enable_stats: bool,
    /// TTL del lock single-flight en milisegundos (default: 5000)
    pub lock_timeout_ms: u64,
    /// Comportamiento por defecto cuando el lock esta tomado
    pub lock_behavior: LockBehavior,
}

impl Default for CacheServiceOptions {
    fn default() -> Self {
        Self {
            default_ttl: 300,
            compression_threshold: DEFAULT_COMPRESSION_THRESHOLD,
            key_prefix: "cache".to_string(),
            enable_stats: true,
            lock_timeout_ms: 5_000,
            lock_behavior: LockBehavior::Wait,
        }
    }
}

/// Per-write options of [`CacheService::set`].
#[derive(Debug, Clone, Default)]
pub struct SetOptions {
    /// Compress the payload when it exceeds the compression threshold.
    pub compressed: bool,
    /// Tags the entry is registered under.
    pub tags: Vec<String>,
}

impl SetOptions {
    pub fn compressed(mut self, compressed: bool) -> Self {
        self.compressed = compressed;
        self
    }

    pub fn tags<I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }
}

/// Cache de respuestas sobre un [`CacheProvider`].
///
/// Cheap to clone: clones share the provider and the statistics.
///
/// # Examples
///
/// ```no_run
/// use memento_server::cache::{CacheService, SetOptions};
/// use serde_json::json;
///
/// # #[tokio::main]
/// # async fn main() {
/// let cache = CacheService::in_memory();
///
/// cache.set("k", &json!({"id": 1}), 60, SetOptions::default()).await;
/// let value: Option<serde_json::Value> = cache.get("k").await;
/// assert_eq!(value, Some(json!({"id": 1})));
/// # }
/// ```
#[derive(Clone)]
pub struct CacheService {
    provider: Arc<dyn CacheProvider>,
    options: CacheServiceOptions,
    metrics: CacheMetrics,
}

impl CacheService {
    /// Crea un servicio sobre el provider dado.
    pub fn new(provider: Arc<dyn CacheProvider>, options: CacheServiceOptions) -> Self {
        let metrics = CacheMetrics::new(options.enable_stats);
        Self {
            provider,
            options,
            metrics,
        }
    }

    /// Crea un servicio con un [`MemoryProvider`] y opciones por defecto.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryProvider::new()), CacheServiceOptions::default())
    }

    /// Obtiene un valor del cache si existe.
    ///
    /// Absent keys, provider failures and undecodable entries all count as a
    /// miss and return `None`.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let start = Instant::now();
        let result = self.read(key).await;

        match result {
            Some(_) => {
                self.metrics.record_hit();
                debug!(key = %key, "Cache hit");
            },
            None => {
                self.metrics.record_miss();
                debug!(key = %key, "Cache miss");
            },
        }

        self.metrics.record_operation_duration("get", start.elapsed());
        result
    }

    /// Reads and decodes an entry without touching the hit/miss counters.
    async fn read<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.provider.get(key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                self.provider_failure("get", key, &e);
                return None;
            },
        };

        match decode_entry(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key = %key, error = %e, "Discarding undecodable cache entry");
                None
            },
        }
    }

    /// Inserta un valor en el cache.
    ///
    /// Returns false when the value could not be encoded or stored. Tag
    /// indexes are kept `TAG_TTL_MARGIN_SECONDS` longer than the entry.
    pub async fn set<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        ttl: u64,
        options: SetOptions,
    ) -> bool {
        let start = Instant::now();

        let raw = match self.encode_entry(value, ttl, options.compressed) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(key = %key, error = %e, "Failed to encode cache entry");
                return false;
            },
        };

        if let Err(e) = self.provider.set(key, &raw, ttl).await {
            self.provider_failure("set", key, &e);
            return false;
        }

        let members = [key.to_string()];
        for tag in &options.tags {
            let tag_key = generate_tag_key(&self.options.key_prefix, tag);
            let tag_ttl = ttl.saturating_add(TAG_TTL_MARGIN_SECONDS);
            if let Err(e) = self
                .provider
                .add_to_set(&tag_key, &members, Some(tag_ttl))
                .await
            {
                self.provider_failure("tag", &tag_key, &e);
            }
        }

        self.metrics.record_operation_duration("set", start.elapsed());
        debug!(key = %key, ttl = ttl, tags = ?options.tags, "Cache entry stored");
        true
    }

    fn encode_entry<T: Serialize + ?Sized>(
        &self,
        value: &T,
        ttl: u64,
        compress: bool,
    ) -> CodecResult<String> {
        let data = stable_stringify_serialize(value)?;

        let entry = if compress && data.len() > self.options.compression_threshold {
            CacheEntry::new(compress_to_base64(&data)?, true, ttl)
        } else {
            CacheEntry::new(data, false, ttl)
        };

        Ok(serde_json::to_string(&entry)?)
    }

    /// Intenta tomar el lock single-flight de una key.
    ///
    /// Fails open: a provider error reports the lock as acquired.
    pub async fn acquire_lock(&self, key: &str) -> bool {
        let lock_key = generate_lock_key(key);

        match self
            .provider
            .acquire_lock(&lock_key, self.options.lock_timeout_ms)
            .await
        {
            Ok(true) => {
                self.metrics.record_lock("acquired");
                true
            },
            Ok(false) => {
                self.metrics.record_lock("contended");
                false
            },
            Err(e) => {
                self.provider_failure("acquire_lock", &lock_key, &e);
                self.metrics.record_lock("fail_open");
                true
            },
        }
    }

    /// Libera el lock single-flight de una key.
    pub async fn release_lock(&self, key: &str) {
        let lock_key = generate_lock_key(key);
        if let Err(e) = self.provider.release_lock(&lock_key).await {
            self.provider_failure("release_lock", &lock_key, &e);
        }
    }

    /// Espera a que otra request pueble la key.
    ///
    /// Polls every [`WAIT_POLL_INTERVAL`] until a value appears or `timeout`
    /// elapses. The whole wait counts as one hit or one miss.
    pub async fn wait_for_cache<T: DeserializeOwned>(
        &self,
        key: &str,
        timeout: Duration,
    ) -> Option<T> {
        let start = Instant::now();

        loop {
            if let Some(value) = self.read(key).await {
                self.metrics.record_hit();
                self.metrics
                    .record_operation_duration("wait_hit", start.elapsed());
                return Some(value);
            }

            let elapsed = start.elapsed();
            if elapsed >= timeout {
                self.metrics.record_miss();
                self.metrics
                    .record_operation_duration("wait_timeout", elapsed);
                debug!(key = %key, timeout_ms = timeout.as_millis() as u64, "Gave up waiting for cache");
                return None;
            }

            tokio::time::sleep(WAIT_POLL_INTERVAL.min(timeout - elapsed)).await;
        }
    }

    /// Retorna una copia de las estadisticas.
    pub fn stats(&self) -> CacheStats {
        self.metrics.snapshot()
    }

    /// Retorna el provider compartido.
    pub fn provider(&self) -> Arc<dyn CacheProvider> {
        Arc::clone(&self.provider)
    }

    /// Retorna las opciones del servicio.
    pub fn options(&self) -> &CacheServiceOptions {
        &self.options
    }

    /// Retorna el prefijo de keys.
    pub fn key_prefix(&self) -> &str {
        &self.options.key_prefix
    }

    /// TTL del lock como duracion (tambien el timeout de espera).
    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.options.lock_timeout_ms)
    }

    /// Retorna las metricas para acceso externo.
    pub fn metrics(&self) -> &CacheMetrics {
        &self.metrics
    }

    /// Cierra el provider.
    pub async fn disconnect(&self) {
        if let Err(e) = self.provider.disconnect().await {
            self.provider_failure("disconnect", "-", &e);
        }
    }

    pub(crate) fn provider_failure(&self, operation: &'static str, key: &str, error: &ProviderError) {
        self.metrics.record_provider_error(operation);
        warn!(
            provider = %self.provider.name(),
            operation = operation,
            key = %key,
            error = %error,
            transient = error.is_transient(),
            "Cache provider failure, degrading"
        );
    }
}

fn decode_entry<T: DeserializeOwned>(raw: &str) -> CodecResult<T> {
    let entry: CacheEntry = serde_json::from_str(raw)?;
    let data = if entry.compressed {
        decompress_from_base64(&entry.data)?
    } else {
        entry.data
    };
    Ok(serde_json::from_str(&data)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use memento_providers::{KeyBatches, ProviderResult};
    use serde::Deserialize;
    use serde_json::{Value, json};

    /// Provider that fails every call.
    struct BrokenProvider;

    #[async_trait]
    impl CacheProvider for BrokenProvider {
        async fn get(&self, _key: &str) -> ProviderResult<Option<String>> {
            Err(ProviderError::unavailable("down"))
        }
        async fn set(&self, _key: &str, _value: &str, _ttl: u64) -> ProviderResult<()> {
            Err(ProviderError::unavailable("down"))
        }
        async fn del(&self, _key: &str) -> ProviderResult<bool> {
            Err(ProviderError::unavailable("down"))
        }
        async fn del_many(&self, _keys: &[String]) -> ProviderResult<u64> {
            Err(ProviderError::unavailable("down"))
        }
        async fn add_to_set(
            &self,
            _key: &str,
            _members: &[String],
            _ttl: Option<u64>,
        ) -> ProviderResult<()> {
            Err(ProviderError::unavailable("down"))
        }
        async fn get_set_members(&self, _key: &str) -> ProviderResult<Vec<String>> {
            Err(ProviderError::unavailable("down"))
        }
        async fn acquire_lock(&self, _key: &str, _ttl_ms: u64) -> ProviderResult<bool> {
            Err(ProviderError::unavailable("down"))
        }
        async fn release_lock(&self, _key: &str) -> ProviderResult<()> {
            Err(ProviderError::unavailable("down"))
        }
        fn scan<'a>(&'a self, _pattern: &'a str) -> KeyBatches<'a> {
            use futures::StreamExt;
            futures::stream::once(async { Err(ProviderError::unavailable("down")) }).boxed()
        }
        async fn disconnect(&self) -> ProviderResult<()> {
            Err(ProviderError::unavailable("down"))
        }
        fn name(&self) -> &str {
            "broken"
        }
    }

    fn broken() -> CacheService {
        CacheService::new(Arc::new(BrokenProvider), CacheServiceOptions::default())
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct User {
        id: u32,
        name: String,
    }

    #[tokio::test]
    async fn test_set_then_get() {
        let cache = CacheService::in_memory();

        assert!(cache.set("k", &json!({"id": 1}), 60, SetOptions::default()).await);

        let value: Option<Value> = cache.get("k").await;
        assert_eq!(value, Some(json!({"id": 1})));
        assert_eq!(cache.stats().hits, 1);
    }

    #[tokio::test]
    async fn test_typed_round_trip() {
        let cache = CacheService::in_memory();
        let user = User {
            id: 7,
            name: "Ana".into(),
        };

        cache.set("user:7", &user, 60, SetOptions::default()).await;

        assert_eq!(cache.get::<User>("user:7").await, Some(user));
    }

    #[tokio::test]
    async fn test_set_with_huge_ttl_keeps_tag_index() {
        let cache = CacheService::in_memory();

        assert!(
            cache
                .set("k", &json!(1), u64::MAX, SetOptions::default().tags(["t"]))
                .await
        );

        assert_eq!(cache.get::<Value>("k").await, Some(json!(1)));
        assert_eq!(cache.invalidate(&["t".to_string()]).await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_expires_after_ttl() {
        let cache = CacheService::in_memory();
        cache.set("k", &json!({"id": 1}), 60, SetOptions::default()).await;

        tokio::time::advance(Duration::from_secs(61)).await;

        assert_eq!(cache.get::<Value>("k").await, None);
        assert_eq!(cache.stats().misses, 1);
    }

    #[tokio::test]
    async fn test_large_payload_is_compressed_when_opted_in() {
        let provider = Arc::new(MemoryProvider::new());
        let cache = CacheService::new(provider.clone(), CacheServiceOptions::default());
        let big = json!({"items": vec!["payload"; 500]});

        cache
            .set("big", &big, 60, SetOptions::default().compressed(true))
            .await;
        cache.set("plain", &big, 60, SetOptions::default()).await;

        let raw: CacheEntry =
            serde_json::from_str(&provider.get("big").await.unwrap().unwrap()).unwrap();
        assert!(raw.compressed);
        let raw: CacheEntry =
            serde_json::from_str(&provider.get("plain").await.unwrap().unwrap()).unwrap();
        assert!(!raw.compressed);

        assert_eq!(cache.get::<Value>("big").await, Some(big));
    }

    #[tokio::test]
    async fn test_small_payload_is_not_compressed() {
        let provider = Arc::new(MemoryProvider::new());
        let cache = CacheService::new(provider.clone(), CacheServiceOptions::default());

        cache
            .set("small", &json!({"id": 1}), 60, SetOptions::default().compressed(true))
            .await;

        let raw: CacheEntry =
            serde_json::from_str(&provider.get("small").await.unwrap().unwrap()).unwrap();
        assert!(!raw.compressed);
        assert_eq!(raw.data, r#"{"id":1}"#);
    }

    #[tokio::test]
    async fn test_corrupted_entry_is_a_miss() {
        let provider = Arc::new(MemoryProvider::new());
        let cache = CacheService::new(provider.clone(), CacheServiceOptions::default());

        provider.set("garbage", "not json at all", 60).await.unwrap();
        provider
            .set(
                "bad-gzip",
                r#"{"data":"AAAA","compressed":true,"createdAt":0,"ttl":60}"#,
                60,
            )
            .await
            .unwrap();

        assert_eq!(cache.get::<Value>("garbage").await, None);
        assert_eq!(cache.get::<Value>("bad-gzip").await, None);
        assert_eq!(cache.stats().misses, 2);
    }

    #[tokio::test]
    async fn test_broken_provider_degrades_to_defaults() {
        let cache = broken();

        assert_eq!(cache.get::<Value>("k").await, None);
        assert!(!cache.set("k", &json!(1), 60, SetOptions::default()).await);
        cache.release_lock("k").await;
        cache.disconnect().await;

        assert_eq!(cache.stats().misses, 1);
    }

    #[tokio::test]
    async fn test_acquire_lock_fails_open() {
        assert!(broken().acquire_lock("k").await);
    }

    #[tokio::test]
    async fn test_lock_is_exclusive() {
        let cache = CacheService::in_memory();

        assert!(cache.acquire_lock("k").await);
        assert!(!cache.acquire_lock("k").await);

        cache.release_lock("k").await;
        assert!(cache.acquire_lock("k").await);
    }

    #[tokio::test]
    async fn test_wait_for_cache_sees_late_write() {
        let cache = CacheService::in_memory();
        let writer = cache.clone();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(120)).await;
            writer
                .set("k", &json!("ready"), 60, SetOptions::default())
                .await;
        });

        let value: Option<Value> = cache.wait_for_cache("k", Duration::from_secs(2)).await;

        assert_eq!(value, Some(json!("ready")));
        assert_eq!(cache.stats().hits, 1);
        assert_eq!(cache.stats().misses, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_cache_times_out() {
        let cache = CacheService::in_memory();

        let value: Option<Value> = cache.wait_for_cache("k", Duration::from_millis(200)).await;

        assert_eq!(value, None);
        assert_eq!(cache.stats().misses, 1);
    }

    #[tokio::test]
    async fn test_stats_disabled() {
        let options = CacheServiceOptions {
            enable_stats: false,
            ..Default::default()
        };
        let cache = CacheService::new(Arc::new(MemoryProvider::new()), options);

        cache.get::<Value>("k").await;

        assert_eq!(cache.stats(), CacheStats::default());
    }
}
