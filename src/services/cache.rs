// src/services/cache.rs
// DOCUMENTATION: Generic in-memory cache with TTL expiry and LRU eviction
// PURPOSE: Shield the upstream map services from redundant outbound calls

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

/// Cache entry with expiration and access tracking
#[derive(Clone, Debug)]
struct CacheEntry<T> {
    value: T,
    expires_at: Instant,
    last_accessed_at: Instant,
}

impl<T> CacheEntry<T> {
    fn new(value: T, ttl: Duration) -> Self {
        let now = Instant::now();
        Self {
            value,
            expires_at: now + ttl,
            last_accessed_at: now,
        }
    }

    fn is_expired(&self) -> bool {
        Instant::now() > self.expires_at
    }
}

/// Thread-safe keyed store with TTL expiry and a bounded size
/// DOCUMENTATION: Expired entries are treated as absent and removed on
/// read; when the store is full, inserting a new key evicts the entry
/// with the oldest last access (true LRU, not insertion order). All
/// operations are total; there is no failure mode.
#[derive(Clone)]
pub struct TtlCache<T> {
    store: Arc<RwLock<HashMap<String, CacheEntry<T>>>>,
    ttl: Duration,
    max_size: usize,
}

/// Read-only cache snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStats {
    pub size: usize,
    pub max_size: usize,
    pub ttl_seconds: u64,
}

impl<T: Clone + Send + Sync + 'static> TtlCache<T> {
    /// Create a cache with a fixed TTL and capacity
    pub fn new(ttl: Duration, max_size: usize) -> Self {
        Self {
            store: Arc::new(RwLock::new(HashMap::new())),
            ttl,
            max_size: max_size.max(1),
        }
    }

    /// Get a value if present and unexpired
    /// DOCUMENTATION: Removes the entry as a side effect when it has
    /// expired; refreshes last_accessed_at on a hit
    pub async fn get(&self, key: &str) -> Option<T> {
        let mut store = self.store.write().await;

        let expired = match store.get(key) {
            Some(entry) => entry.is_expired(),
            None => {
                log::debug!("Cache MISS for key: {}", key);
                return None;
            }
        };

        if expired {
            store.remove(key);
            log::debug!("Cache EXPIRED for key: {}", key);
            return None;
        }

        store.get_mut(key).map(|entry| {
            entry.last_accessed_at = Instant::now();
            log::debug!("Cache HIT for key: {}", key);
            entry.value.clone()
        })
    }

    /// Insert or overwrite a value with the configured TTL
    /// DOCUMENTATION: When the store is at capacity and the key is new,
    /// exactly one entry is evicted: the one least recently accessed
    pub async fn set(&self, key: String, value: T) {
        let mut store = self.store.write().await;

        if !store.contains_key(&key) && store.len() >= self.max_size {
            let oldest = store
                .iter()
                .min_by_key(|(_, entry)| entry.last_accessed_at)
                .map(|(k, _)| k.clone());
            if let Some(evicted) = oldest {
                store.remove(&evicted);
                log::debug!("Cache EVICT (lru) for key: {}", evicted);
            }
        }

        store.insert(key.clone(), CacheEntry::new(value, self.ttl));
        log::debug!("Cache SET for key: {} (TTL: {}s)", key, self.ttl.as_secs());
    }

    /// Remove every key containing the given substring
    /// DOCUMENTATION: Used when underlying data changes; returns the
    /// number of removed entries
    pub async fn invalidate(&self, pattern: &str) -> usize {
        let mut store = self.store.write().await;
        let before = store.len();
        store.retain(|key, _| !key.contains(pattern));
        let removed = before - store.len();

        if removed > 0 {
            log::info!(
                "Cache invalidated {} entries matching '{}'",
                removed,
                pattern
            );
        }
        removed
    }

    /// Remove expired entries
    pub async fn cleanup(&self) {
        let mut store = self.store.write().await;
        let before_count = store.len();
        store.retain(|_, entry| !entry.is_expired());
        let after_count = store.len();

        if before_count > after_count {
            log::info!(
                "Cache cleanup: removed {} expired entries ({} remaining)",
                before_count - after_count,
                after_count
            );
        }
    }

    /// Get cache statistics
    pub async fn stats(&self) -> CacheStats {
        let store = self.store.read().await;
        CacheStats {
            size: store.len(),
            max_size: self.max_size,
            ttl_seconds: self.ttl.as_secs(),
        }
    }
}

/// Start background cleanup task
/// DOCUMENTATION: Periodically removes expired entries independent of
/// request traffic. The returned handle must be aborted on shutdown so
/// the process exits without a dangling timer.
pub fn start_cleanup_task<T: Clone + Send + Sync + 'static>(
    cache: TtlCache<T>,
    interval_seconds: u64,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(interval_seconds));

        loop {
            interval.tick().await;
            cache.cleanup().await;
        }
    })
}
