/// In-memory cache store backed by a sharded concurrent map
use super::{CacheStore, CachedValue, KeyPattern};
use crate::config::CacheConfig;
use dashmap::DashMap;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
struct CacheEntry {
    cached: CachedValue,
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

/// Process-wide cache store.
///
/// Distinct keys live in independent shards so writers only contend on
/// their own shard. Expiry is lazy: nothing sweeps the map, reads treat
/// expired entries as misses and drop them.
#[derive(Debug, Default)]
pub struct MemoryCacheStore {
    entries: DashMap<String, CacheEntry>,
    max_ttl: Option<Duration>,
}

impl MemoryCacheStore {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            entries: DashMap::new(),
            max_ttl: config.max_ttl_minutes.map(minutes),
        }
    }

    fn effective_ttl(&self, duration_minutes: Option<u64>) -> Option<Duration> {
        match (duration_minutes.map(minutes), self.max_ttl) {
            (Some(ttl), Some(ceiling)) => Some(ttl.min(ceiling)),
            (Some(ttl), None) => Some(ttl),
            (None, ceiling) => ceiling,
        }
    }

    /// Drop `key` only if it still holds an expired entry, so a concurrent
    /// overwrite is never lost.
    fn evict_if_expired(&self, key: &str, now: Instant) {
        if self
            .entries
            .remove_if(key, |_, entry| entry.is_expired(now))
            .is_some()
        {
            debug!("Cache EXPIRED: {}", key);
        }
    }
}

fn minutes(m: u64) -> Duration {
    Duration::from_secs(m.saturating_mul(60))
}

impl CacheStore for MemoryCacheStore {
    fn get(&self, key: &str) -> Option<CachedValue> {
        let now = Instant::now();

        // The shard guard is released at the end of this statement
        let lookup = self
            .entries
            .get(key)
            .map(|entry| (!entry.is_expired(now)).then(|| entry.cached.clone()));

        match lookup {
            Some(Some(cached)) => {
                debug!("Cache HIT: {}", key);
                Some(cached)
            }
            Some(None) => {
                self.evict_if_expired(key, now);
                debug!("Cache MISS: {}", key);
                None
            }
            None => {
                debug!("Cache MISS: {}", key);
                None
            }
        }
    }

    fn add(&self, key: &str, value: CachedValue, duration_minutes: Option<u64>) {
        let ttl = self.effective_ttl(duration_minutes);
        let expires_at = ttl.and_then(|ttl| Instant::now().checked_add(ttl));

        debug!("Cache SET: {} (TTL: {:?})", key, ttl);

        self.entries.insert(
            key.to_string(),
            CacheEntry {
                cached: value,
                expires_at,
            },
        );
    }

    fn exists(&self, key: &str) -> bool {
        let now = Instant::now();
        let live = self.entries.get(key).map(|entry| !entry.is_expired(now));

        match live {
            Some(true) => true,
            Some(false) => {
                self.evict_if_expired(key, now);
                false
            }
            None => false,
        }
    }

    fn remove(&self, key: &str) {
        debug!("Cache DELETE: {}", key);
        self.entries.remove(key);
    }

    fn remove_if_unchanged(&self, key: &str, expected: &CachedValue) -> bool {
        let removed = self
            .entries
            .remove_if(key, |_, entry| entry.cached == *expected)
            .is_some();
        if removed {
            debug!("Cache DELETE: {}", key);
        }
        removed
    }

    fn remove_by_pattern(&self, pattern: &str) -> usize {
        let matcher = match KeyPattern::new(pattern) {
            Ok(matcher) => matcher,
            Err(e) => {
                warn!("Ignoring invalid cache pattern {:?}: {}", pattern, e);
                return 0;
            }
        };

        let matching: Vec<String> = self
            .entries
            .iter()
            .filter(|entry| matcher.matches(entry.key()))
            .map(|entry| entry.key().clone())
            .collect();

        let removed = matching
            .iter()
            .filter(|key| self.entries.remove(key.as_str()).is_some())
            .count();

        if removed > 0 {
            info!("Cache flushed {} keys matching {}", removed, pattern);
        }
        removed
    }

    fn keys(&self) -> Vec<String> {
        let now = Instant::now();
        let mut keys: Vec<String> = self
            .entries
            .iter()
            .filter(|entry| !entry.is_expired(now))
            .map(|entry| entry.key().clone())
            .collect();
        keys.sort();
        keys
    }

    fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .iter()
            .filter(|entry| !entry.is_expired(now))
            .count()
    }

    fn clear(&self) {
        info!("Cache CLEAR ({} entries)", self.entries.len());
        self.entries.clear();
    }
}
