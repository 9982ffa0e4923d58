//! Time-to-live cache for derived analytics views
//!
//! Entries are keyed by operation name plus serialized parameters and stored
//! as JSON values so one cache can hold every result type. An entry is valid
//! while `now - stored_at < ttl`.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// A cached value with its insertion time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub key: String,
    pub data: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

/// Hit/miss counters for observability
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

/// Build a cache key from an operation name and its parameters
pub fn cache_key<P: Serialize + ?Sized>(operation: &str, params: &P) -> String {
    match serde_json::to_string(params) {
        Ok(serialized) => format!("{}:{}", operation, serialized),
        Err(_) => operation.to_string(),
    }
}

#[derive(Debug)]
pub struct TtlCache {
    ttl: chrono::Duration,
    entries: HashMap<String, CacheEntry>,
    hits: u64,
    misses: u64,
}

impl TtlCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl: chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::max_value()),
            entries: HashMap::new(),
            hits: 0,
            misses: 0,
        }
    }

    /// Cached value for `key` if it has not expired
    pub fn get<T: DeserializeOwned>(&mut self, key: &str) -> Option<T> {
        self.get_at(key, Utc::now())
    }

    /// Lookup against an explicit clock reading
    pub fn get_at<T: DeserializeOwned>(&mut self, key: &str, now: DateTime<Utc>) -> Option<T> {
        let fresh = self
            .entries
            .get(key)
            .filter(|entry| now - entry.timestamp < self.ttl)
            .map(|entry| entry.data.clone());

        let Some(data) = fresh else {
            self.misses += 1;
            return None;
        };

        match serde_json::from_value(data) {
            Ok(value) => {
                self.hits += 1;
                Some(value)
            }
            Err(e) => {
                warn!(key, error = %e, "Discarding cache entry with unexpected shape");
                self.entries.remove(key);
                self.misses += 1;
                None
            }
        }
    }

    /// Store `value`, replacing any previous entry
    pub fn set<T: Serialize>(&mut self, key: &str, value: &T) {
        self.set_at(key, value, Utc::now());
    }

    pub fn set_at<T: Serialize>(&mut self, key: &str, value: &T, now: DateTime<Utc>) {
        match serde_json::to_value(value) {
            Ok(data) => {
                self.entries.insert(
                    key.to_string(),
                    CacheEntry {
                        key: key.to_string(),
                        data,
                        timestamp: now,
                    },
                );
            }
            Err(e) => warn!(key, error = %e, "Failed to serialize value for cache"),
        }
    }

    /// Drop every entry
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Drop entries that have expired as of `now`
    pub fn purge_expired(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.entries.len();
        let ttl = self.ttl;
        self.entries.retain(|_, entry| now - entry.timestamp < ttl);
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            entries: self.entries.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_entry_expires_after_ttl() {
        let mut cache = TtlCache::new(Duration::from_secs(300));
        cache.set_at("insights", &vec![1, 2, 3], t0());

        let almost = t0() + chrono::Duration::seconds(4 * 60 + 59);
        assert_eq!(cache.get_at::<Vec<i32>>("insights", almost), Some(vec![1, 2, 3]));

        let expired = t0() + chrono::Duration::seconds(5 * 60 + 1);
        assert_eq!(cache.get_at::<Vec<i32>>("insights", expired), None);

        // Exactly at the TTL the entry is no longer valid
        let boundary = t0() + chrono::Duration::seconds(300);
        assert_eq!(cache.get_at::<Vec<i32>>("insights", boundary), None);
    }

    #[test]
    fn test_set_overwrites_and_refreshes_timestamp() {
        let mut cache = TtlCache::new(Duration::from_secs(300));
        cache.set_at("k", &"old", t0());
        let later = t0() + chrono::Duration::seconds(200);
        cache.set_at("k", &"new", later);

        let check = t0() + chrono::Duration::seconds(400);
        assert_eq!(cache.get_at::<String>("k", check).as_deref(), Some("new"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_clear_and_stats() {
        let mut cache = TtlCache::new(Duration::from_secs(300));
        cache.set_at("a", &1, t0());
        cache.set_at("b", &2, t0());

        assert_eq!(cache.get_at::<i32>("a", t0()), Some(1));
        assert_eq!(cache.get_at::<i32>("missing", t0()), None);

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.entries, 2);

        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.get_at::<i32>("a", t0()), None);
    }

    #[test]
    fn test_shape_mismatch_is_a_miss() {
        let mut cache = TtlCache::new(Duration::from_secs(300));
        cache.set_at("k", &"text", t0());
        assert_eq!(cache.get_at::<Vec<i32>>("k", t0()), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_purge_expired() {
        let mut cache = TtlCache::new(Duration::from_secs(60));
        cache.set_at("old", &1, t0());
        cache.set_at("new", &2, t0() + chrono::Duration::seconds(50));

        let removed = cache.purge_expired(t0() + chrono::Duration::seconds(70));
        assert_eq!(removed, 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_cache_key_includes_params() {
        assert_eq!(cache_key("monthly", &(6, true)), "monthly:[6,true]");
        assert_ne!(
            cache_key("spending", &("month", Some("Music"))),
            cache_key("spending", &("month", None::<&str>))
        );
    }
}
