//! Common type definitions for Memento.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Stored envelope around a cached payload.
///
/// `compressed` is the only signal decoders branch on: when it is true,
/// `data` holds the base64 text of a gzip stream; otherwise `data` is the
/// stable JSON text of the value itself.
///
/// # Example
///
/// ```
/// use memento_core::CacheEntry;
///
/// let entry = CacheEntry::new(r#"{"id":1}"#, false, 60);
/// assert!(!entry.compressed);
/// assert_eq!(entry.ttl, 60);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    /// Payload text (stable JSON, or base64 of gzip bytes).
    pub data: String,
    /// Whether `data` is compressed.
    pub compressed: bool,
    /// Creation time in epoch milliseconds.
    pub created_at: u64,
    /// TTL in seconds the entry was written with.
    pub ttl: u64,
}

impl CacheEntry {
    /// Creates an entry stamped with the current wall-clock time.
    pub fn new(data: impl Into<String>, compressed: bool, ttl: u64) -> Self {
        Self {
            data: data.into(),
            compressed,
            created_at: epoch_millis(),
            ttl,
        }
    }
}

fn epoch_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Snapshot of a cache service's running counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    /// Number of reads served from the cache.
    pub hits: u64,
    /// Number of reads that found nothing usable.
    pub misses: u64,
    /// Number of entries removed by invalidation calls.
    pub invalidations: u64,
    /// hits / (hits + misses), or 0 when nothing was read yet.
    pub hit_rate: f64,
}

impl CacheStats {
    /// Builds a snapshot, deriving the hit rate from the counters.
    pub fn new(hits: u64, misses: u64, invalidations: u64) -> Self {
        let total = hits + misses;
        let hit_rate = if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        };

        Self {
            hits,
            misses,
            invalidations,
            hit_rate,
        }
    }
}

/// What a request does when another request already holds the single-flight lock.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LockBehavior {
    /// Poll the cache until the winner stores its result or the lock timeout elapses.
    #[default]
    Wait,
    /// Run the handler directly without touching the cache.
    Bypass,
    /// Answer with service-unavailable without running the handler.
    Fail,
}

impl LockBehavior {
    /// Returns the behavior as a lowercase string slice.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Wait => "wait",
            Self::Bypass => "bypass",
            Self::Fail => "fail",
        }
    }
}

impl fmt::Display for LockBehavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LockBehavior {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "wait" => Ok(Self::Wait),
            "bypass" => Ok(Self::Bypass),
            "fail" => Ok(Self::Fail),
            other => Err(format!("unknown lock behavior '{}'", other)),
        }
    }
}

/// Cache status reported back to the HTTP layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheStatus {
    /// Payload came from the cache.
    Hit,
    /// Payload was computed by the handler.
    Miss,
}

impl CacheStatus {
    /// Header value for this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hit => "HIT",
            Self::Miss => "MISS",
        }
    }
}

impl fmt::Display for CacheStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_serializes_camel_case() {
        let entry = CacheEntry {
            data: "{}".to_string(),
            compressed: true,
            created_at: 42,
            ttl: 60,
        };

        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains("\"createdAt\":42"));
        assert!(json.contains("\"compressed\":true"));
    }

    #[test]
    fn test_stats_hit_rate() {
        let stats = CacheStats::new(3, 1, 0);
        assert!((stats.hit_rate - 0.75).abs() < f64::EPSILON);

        let empty = CacheStats::new(0, 0, 5);
        assert_eq!(empty.hit_rate, 0.0);
    }

    #[test]
    fn test_lock_behavior_parsing() {
        assert_eq!("WAIT".parse::<LockBehavior>(), Ok(LockBehavior::Wait));
        assert_eq!("bypass".parse::<LockBehavior>(), Ok(LockBehavior::Bypass));
        assert_eq!("fail".parse::<LockBehavior>(), Ok(LockBehavior::Fail));
        assert!("block".parse::<LockBehavior>().is_err());
        assert_eq!(LockBehavior::default(), LockBehavior::Wait);
    }

    #[test]
    fn test_lock_behavior_deserialize() {
        let behavior: LockBehavior = serde_json::from_str("\"bypass\"").unwrap();
        assert_eq!(behavior, LockBehavior::Bypass);
    }

    #[test]
    fn test_cache_status_header_values() {
        assert_eq!(CacheStatus::Hit.to_string(), "HIT");
        assert_eq!(CacheStatus::Miss.as_str(), "MISS");
    }
}
