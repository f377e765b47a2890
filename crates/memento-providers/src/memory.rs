//! In-process cache provider.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use futures::stream;
use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::debug;

use crate::error::ProviderResult;
use crate::pattern::KeyPattern;
use crate::provider::{CacheProvider, KeyBatches, SCAN_BATCH_SIZE};

/// A value with an optional absolute expiry.
#[derive(Debug)]
struct Record<T> {
    value: T,
    expires_at: Option<Instant>,
}

impl<T> Record<T> {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

#[derive(Debug, Default)]
struct Tables {
    values: HashMap<String, Record<String>>,
    sets: HashMap<String, Record<HashSet<String>>>,
    locks: HashMap<String, Instant>,
}

impl Tables {
    /// Removes `key` from every table. Returns whether a live entry was removed.
    fn remove(&mut self, key: &str, now: Instant) -> bool {
        let value = self.values.remove(key).is_some_and(|r| !r.is_expired(now));
        let set = self.sets.remove(key).is_some_and(|r| !r.is_expired(now));
        let lock = self.locks.remove(key).is_some_and(|at| at > now);
        value || set || lock
    }
}

/// Cache provider backed by process-local hash maps.
///
/// Expired entries are evicted lazily when read; there is no background
/// sweep. All tables sit behind one mutex, so `acquire_lock` checks and
/// inserts in a single critical section.
#[derive(Debug, Default)]
pub struct MemoryProvider {
    tables: Mutex<Tables>,
}

impl MemoryProvider {
    /// Creates an empty provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of live string entries.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.tables
            .lock()
            .values
            .values()
            .filter(|r| !r.is_expired(now))
            .count()
    }

    /// Returns true if no live string entry is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn expiry(now: Instant, ttl_seconds: u64) -> Option<Instant> {
        if ttl_seconds == 0 {
            return None;
        }
        // TTLs past the clock's range behave as no expiry.
        now.checked_add(Duration::from_secs(ttl_seconds))
    }
}

#[async_trait]
impl CacheProvider for MemoryProvider {
    async fn get(&self, key: &str) -> ProviderResult<Option<String>> {
        let now = Instant::now();
        let mut tables = self.tables.lock();

        let expired = match tables.values.get(key) {
            Some(record) if !record.is_expired(now) => return Ok(Some(record.value.clone())),
            Some(_) => true,
            None => false,
        };

        if expired {
            tables.values.remove(key);
            debug!(key = %key, "Evicted expired entry on read");
        }

        Ok(None)
    }

    async fn set(&self, key: &str, value: &str, ttl_seconds: u64) -> ProviderResult<()> {
        let now = Instant::now();
        self.tables.lock().values.insert(
            key.to_string(),
            Record {
                value: value.to_string(),
                expires_at: Self::expiry(now, ttl_seconds),
            },
        );
        Ok(())
    }

    async fn del(&self, key: &str) -> ProviderResult<bool> {
        let now = Instant::now();
        Ok(self.tables.lock().remove(key, now))
    }

    async fn del_many(&self, keys: &[String]) -> ProviderResult<u64> {
        let now = Instant::now();
        let mut tables = self.tables.lock();
        let removed = keys.iter().filter(|key| tables.remove(key, now)).count();
        Ok(removed as u64)
    }

    async fn add_to_set(
        &self,
        key: &str,
        members: &[String],
        ttl_seconds: Option<u64>,
    ) -> ProviderResult<()> {
        let now = Instant::now();
        let mut tables = self.tables.lock();

        let record = tables.sets.entry(key.to_string()).or_insert_with(|| Record {
            value: HashSet::new(),
            expires_at: None,
        });

        if record.is_expired(now) {
            record.value.clear();
            record.expires_at = None;
        }

        record.value.extend(members.iter().cloned());

        if let Some(candidate) = ttl_seconds.and_then(|ttl| Self::expiry(now, ttl)) {
            record.expires_at = Some(match record.expires_at {
                Some(current) if current > candidate => current,
                _ => candidate,
            });
        }

        Ok(())
    }

    async fn get_set_members(&self, key: &str) -> ProviderResult<Vec<String>> {
        let now = Instant::now();
        let mut tables = self.tables.lock();

        let expired = match tables.sets.get(key) {
            Some(record) if !record.is_expired(now) => {
                let mut members: Vec<String> = record.value.iter().cloned().collect();
                members.sort();
                return Ok(members);
            },
            Some(_) => true,
            None => false,
        };

        if expired {
            tables.sets.remove(key);
        }

        Ok(Vec::new())
    }

    async fn acquire_lock(&self, key: &str, ttl_ms: u64) -> ProviderResult<bool> {
        let now = Instant::now();
        let mut tables = self.tables.lock();

        if tables.locks.get(key).is_some_and(|at| *at > now) {
            return Ok(false);
        }

        tables
            .locks
            .insert(key.to_string(), now + Duration::from_millis(ttl_ms));
        Ok(true)
    }

    async fn release_lock(&self, key: &str) -> ProviderResult<()> {
        self.tables.lock().locks.remove(key);
        Ok(())
    }

    fn scan<'a>(&'a self, pattern: &'a str) -> KeyBatches<'a> {
        let pattern = match KeyPattern::new(pattern) {
            Ok(p) => p,
            Err(e) => return stream::once(async move { Err(e) }).boxed(),
        };

        let now = Instant::now();
        let matching: Vec<String> = {
            let tables = self.tables.lock();
            let values = tables
                .values
                .iter()
                .filter(|(_, r)| !r.is_expired(now))
                .map(|(k, _)| k);
            let sets = tables
                .sets
                .iter()
                .filter(|(_, r)| !r.is_expired(now))
                .map(|(k, _)| k);
            let locks = tables
                .locks
                .iter()
                .filter(|(_, at)| **at > now)
                .map(|(k, _)| k);

            values
                .chain(sets)
                .chain(locks)
                .filter(|k| pattern.matches(k))
                .cloned()
                .collect()
        };

        let batches: Vec<ProviderResult<Vec<String>>> = matching
            .chunks(SCAN_BATCH_SIZE)
            .map(|chunk| Ok(chunk.to_vec()))
            .collect();

        stream::iter(batches).boxed()
    }

    async fn disconnect(&self) -> ProviderResult<()> {
        let mut tables = self.tables.lock();
        tables.values.clear();
        tables.sets.clear();
        tables.locks.clear();
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}
