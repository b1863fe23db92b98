//! In-process TTL store
//!
//! Behaves like a single logical database of the networked store: values
//! expire after their TTL, lookups are counted as keyspace hits or misses,
//! and `INFO` reports the same fields. Time is read from the tokio clock so
//! tests can advance it deterministically.

use crate::backend::KvStore;
use crate::error::{StoreError, StoreResult};
use crate::stats::human_bytes;
use ahash::AHashMap;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tokio::time::Instant;

/// Entry stored in the memory store
#[derive(Debug, Clone)]
struct StoredValue {
    value: String,
    expires_at: Instant,
}

impl StoredValue {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }

    fn size_bytes(&self, key: &str) -> usize {
        key.len() + self.value.len()
    }
}

/// Expired entries are swept once every this many writes
const SWEEP_INTERVAL: u64 = 64;

/// Thread-safe in-memory TTL store.
///
/// Expired entries are dropped when read, and swept periodically on write so
/// keys that are never read again do not accumulate.
#[derive(Debug)]
pub struct MemoryStore {
    entries: RwLock<AHashMap<String, StoredValue>>,
    hits: AtomicU64,
    misses: AtomicU64,
    writes: AtomicU64,
    available: AtomicBool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(AHashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            writes: AtomicU64::new(0),
            available: AtomicBool::new(true),
        }
    }

    /// Simulate an outage: while unavailable every call fails
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    /// Number of live (unexpired) keys
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .read()
            .values()
            .filter(|entry| !entry.is_expired(now))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remaining lifetime of a key, if it is live
    pub fn ttl(&self, key: &str) -> Option<Duration> {
        let now = Instant::now();
        self.entries
            .read()
            .get(key)
            .filter(|entry| !entry.is_expired(now))
            .map(|entry| entry.expires_at - now)
    }

    /// Drop entries that have exceeded their TTL
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        before - entries.len()
    }

    /// Reset the keyspace hit/miss counters
    pub fn reset_stats(&self) {
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }

    fn check_available(&self) -> StoreResult<()> {
        if self.is_available() {
            Ok(())
        } else {
            Err(StoreError::Unavailable("memory store is offline".to_string()))
        }
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        self.check_available()
    }

    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        self.check_available()?;
        let now = Instant::now();

        let live = {
            let entries = self.entries.read();
            entries
                .get(key)
                .filter(|entry| !entry.is_expired(now))
                .map(|entry| entry.value.clone())
        };

        match live {
            Some(value) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Ok(Some(value))
            }
            None => {
                // Expired entries are removed lazily on access
                let mut entries = self.entries.write();
                if entries.get(key).map(|e| e.is_expired(now)).unwrap_or(false) {
                    entries.remove(key);
                }
                self.misses.fetch_add(1, Ordering::Relaxed);
                Ok(None)
            }
        }
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> StoreResult<()> {
        self.check_available()?;
        if ttl.as_secs() == 0 {
            return Err(StoreError::InvalidTtl(ttl));
        }
        let now = Instant::now();
        let entry = StoredValue {
            value: value.to_string(),
            expires_at: now + Duration::from_secs(ttl.as_secs()),
        };

        let mut entries = self.entries.write();
        if (self.writes.fetch_add(1, Ordering::Relaxed) + 1) % SWEEP_INTERVAL == 0 {
            entries.retain(|_, entry| !entry.is_expired(now));
        }
        entries.insert(key.to_string(), entry);
        Ok(())
    }

    async fn del(&self, key: &str) -> StoreResult<bool> {
        self.check_available()?;
        let now = Instant::now();
        let removed = self.entries.write().remove(key);
        Ok(removed.map(|entry| !entry.is_expired(now)).unwrap_or(false))
    }

    async fn flush_db(&self) -> StoreResult<()> {
        self.check_available()?;
        self.entries.write().clear();
        Ok(())
    }

    async fn info(&self) -> StoreResult<HashMap<String, String>> {
        self.check_available()?;
        let now = Instant::now();
        let (keys, memory) = {
            let entries = self.entries.read();
            entries
                .iter()
                .filter(|(_, entry)| !entry.is_expired(now))
                .fold((0usize, 0usize), |(count, bytes), (key, entry)| {
                    (count + 1, bytes + entry.size_bytes(key))
                })
        };

        let mut info = HashMap::new();
        info.insert(
            "keyspace_hits".to_string(),
            self.hits.load(Ordering::Relaxed).to_string(),
        );
        info.insert(
            "keyspace_misses".to_string(),
            self.misses.load(Ordering::Relaxed).to_string(),
        );
        info.insert("used_memory".to_string(), memory.to_string());
        info.insert("used_memory_human".to_string(), human_bytes(memory as u64));
        info.insert("connected_clients".to_string(), "1".to_string());
        if keys > 0 {
            info.insert(
                "db0".to_string(),
                format!("keys={},expires={},avg_ttl=0", keys, keys),
            );
        }
        Ok(info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::CacheStats;

    #[tokio::test]
    async fn test_set_get() {
        let store = MemoryStore::new();
        store.set_ex("k", "v", Duration::from_secs(60)).await.unwrap();

        assert_eq!(store.get("k").await.unwrap(), Some("v".to_string()));
        assert_eq!(store.get("missing").await.unwrap(), None);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ttl_expiration() {
        let store = MemoryStore::new();
        store.set_ex("k", "v", Duration::from_secs(10)).await.unwrap();

        tokio::time::advance(Duration::from_secs(9)).await;
        assert_eq!(store.get("k").await.unwrap(), Some("v".to_string()));
        assert_eq!(store.ttl("k"), Some(Duration::from_secs(1)));

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(store.get("k").await.unwrap(), None);
        assert!(store.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_purge_expired() {
        let store = MemoryStore::new();
        for i in 0..5 {
            let ttl = Duration::from_secs(if i < 3 { 5 } else { 50 });
            store.set_ex(&format!("k{}", i), "v", ttl).await.unwrap();
        }

        tokio::time::advance(Duration::from_secs(6)).await;
        assert_eq!(store.purge_expired(), 3);
        assert_eq!(store.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_writes_sweep_expired_entries() {
        let store = MemoryStore::new();
        store.set_ex("stale", "1", Duration::from_secs(1)).await.unwrap();
        tokio::time::advance(Duration::from_secs(2)).await;

        for i in 0..SWEEP_INTERVAL {
            store
                .set_ex(&format!("k{}", i), "1", Duration::from_secs(60))
                .await
                .unwrap();
        }

        // "stale" was never read again, yet it is gone from the map
        let entries = store.entries.read();
        assert!(!entries.contains_key("stale"));
        assert_eq!(entries.len() as u64, SWEEP_INTERVAL);
    }

    #[tokio::test]
    async fn test_zero_ttl_rejected() {
        let store = MemoryStore::new();
        let result = store.set_ex("k", "v", Duration::from_millis(500)).await;
        assert!(matches!(result, Err(StoreError::InvalidTtl(_))));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_del_and_flush() {
        let store = MemoryStore::new();
        store.set_ex("a", "1", Duration::from_secs(60)).await.unwrap();
        store.set_ex("b", "2", Duration::from_secs(60)).await.unwrap();

        assert!(store.del("a").await.unwrap());
        assert!(!store.del("a").await.unwrap());

        store.flush_db().await.unwrap();
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_info_counters() {
        let store = MemoryStore::new();
        store.set_ex("k", "value", Duration::from_secs(60)).await.unwrap();
        store.get("k").await.unwrap();
        store.get("k").await.unwrap();
        store.get("other").await.unwrap();

        let stats = CacheStats::from_info(&store.info().await.unwrap());
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.total_keys, 1);
        assert_eq!(stats.connected_clients, 1);
        assert_eq!(stats.used_memory_human, "6B");

        store.reset_stats();
        let stats = CacheStats::from_info(&store.info().await.unwrap());
        assert_eq!(stats.total_requests(), 0);
    }

    #[tokio::test]
    async fn test_unavailable_store_fails_every_call() {
        let store = MemoryStore::new();
        store.set_available(false);

        assert!(store.ping().await.is_err());
        assert!(store.get("k").await.is_err());
        assert!(store.set_ex("k", "v", Duration::from_secs(1)).await.is_err());
        assert!(store.info().await.is_err());

        store.set_available(true);
        assert!(store.ping().await.is_ok());
    }
}
