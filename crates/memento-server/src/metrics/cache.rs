//! Cache metrics recording.

use memento_core::CacheStats;
use metrics::{counter, histogram};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

/// Registra las metricas de cache.
/// Llamar una vez al inicio para registrar las metricas.
pub fn register_cache_metrics() {
    metrics::describe_counter!("memento_cache_hits_total", "Total number of cache hits");
    metrics::describe_counter!("memento_cache_misses_total", "Total number of cache misses");
    metrics::describe_counter!(
        "memento_cache_invalidations_total",
        "Total number of cache entries invalidated"
    );
    metrics::describe_counter!(
        "memento_cache_lock_total",
        "Single-flight lock attempts by outcome"
    );
    metrics::describe_counter!(
        "memento_cache_provider_errors_total",
        "Provider failures absorbed by the cache service"
    );
    metrics::describe_histogram!(
        "memento_cache_operation_seconds",
        "Time spent on cache operations"
    );
}

/// Recorder de metricas de cache.
///
/// Keeps atomic counters for [`CacheStats`] and mirrors every event to the
/// `metrics` facade. Clones share the same counters, so one service and all
/// of its clones report a single set of statistics.
#[derive(Debug, Clone)]
pub struct CacheMetrics {
    enabled: Arc<AtomicBool>,
    hits: Arc<AtomicU64>,
    misses: Arc<AtomicU64>,
    invalidations: Arc<AtomicU64>,
}

impl CacheMetrics {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled: Arc::new(AtomicBool::new(enabled)),
            hits: Arc::new(AtomicU64::new(0)),
            misses: Arc::new(AtomicU64::new(0)),
            invalidations: Arc::new(AtomicU64::new(0)),
        }
    }

    fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /// Registra un cache hit
    pub fn record_hit(&self) {
        if self.is_enabled() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            counter!("memento_cache_hits_total").increment(1);
        }
    }

    /// Registra un cache miss
    pub fn record_miss(&self) {
        if self.is_enabled() {
            self.misses.fetch_add(1, Ordering::Relaxed);
            counter!("memento_cache_misses_total").increment(1);
        }
    }

    /// Registra entries invalidadas
    pub fn record_invalidations(&self, count: u64) {
        if self.is_enabled() && count > 0 {
            self.invalidations.fetch_add(count, Ordering::Relaxed);
            counter!("memento_cache_invalidations_total").increment(count);
        }
    }

    /// Registra el resultado de un intento de lock ("acquired", "contended", "fail_open")
    pub fn record_lock(&self, outcome: &'static str) {
        if self.is_enabled() {
            counter!("memento_cache_lock_total", "outcome" => outcome).increment(1);
        }
    }

    /// Registra un error del provider absorbido por el servicio
    pub fn record_provider_error(&self, operation: &'static str) {
        counter!("memento_cache_provider_errors_total", "operation" => operation).increment(1);
    }

    /// Registra la duracion de una operacion
    pub fn record_operation_duration(&self, operation: &'static str, duration: Duration) {
        if self.is_enabled() {
            histogram!("memento_cache_operation_seconds", "operation" => operation)
                .record(duration.as_secs_f64());
        }
    }

    /// Calcula hit rate (para logging/debugging)
    pub fn hit_rate(&self) -> f64 {
        self.snapshot().hit_rate
    }

    /// Retorna el numero de hits
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Retorna el numero de misses
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    /// Retorna el numero de invalidaciones
    pub fn invalidations(&self) -> u64 {
        self.invalidations.load(Ordering::Relaxed)
    }

    /// Copia de los contadores actuales.
    pub fn snapshot(&self) -> CacheStats {
        CacheStats::new(self.hits(), self.misses(), self.invalidations())
    }
}

impl Default for CacheMetrics {
    fn default() -> Self {
        Self::new(true)
    }
}
