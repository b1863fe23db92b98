//! Typed, fault-isolated access to the TTL store

use crate::backend::KvStore;
use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::redis_store::RedisStore;
use crate::stats::CacheStats;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// JSON value cache on top of a [`KvStore`].
///
/// Only construction can fail. Every later call has a `try_*` form that
/// reports the failure and a plain form that logs it and degrades to a miss
/// (or `false`), so a store outage never reaches the caller.
#[derive(Clone)]
pub struct KeyValueCache {
    store: Arc<dyn KvStore>,
    command_timeout: Option<Duration>,
}

impl KeyValueCache {
    /// Connect to the networked store described by `config`
    pub async fn connect(config: &StoreConfig) -> StoreResult<Self> {
        let store = match RedisStore::connect(config.clone()).await {
            Ok(store) => store,
            Err(e) => {
                error!(
                    host = %config.host,
                    port = config.port,
                    error = %e,
                    "Failed to connect to Redis"
                );
                return Err(e);
            }
        };
        let cache = Self::new(Arc::new(store)).await?;
        Ok(match config.command_timeout {
            Some(timeout) => cache.with_command_timeout(timeout),
            None => cache,
        })
    }

    /// Wrap an existing store after checking it answers
    pub async fn new(store: Arc<dyn KvStore>) -> StoreResult<Self> {
        if let Err(e) = store.ping().await {
            error!(store = ?store, error = %e, "Store connectivity check failed");
            return Err(e);
        }
        Ok(Self {
            store,
            command_timeout: None,
        })
    }

    /// Bound every store call by `timeout`
    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = Some(timeout);
        self
    }

    /// The underlying store
    pub fn store(&self) -> &Arc<dyn KvStore> {
        &self.store
    }

    async fn call<T, F>(&self, fut: F) -> StoreResult<T>
    where
        F: Future<Output = StoreResult<T>>,
    {
        match self.command_timeout {
            Some(limit) => tokio::time::timeout(limit, fut)
                .await
                .map_err(|_| StoreError::Timeout(limit))?,
            None => fut.await,
        }
    }

    /// Look up `key`, distinguishing "absent" from "store failed"
    pub async fn try_get<T: DeserializeOwned>(&self, key: &str) -> StoreResult<Option<T>> {
        let raw = self.call(self.store.get(key)).await?;
        match raw {
            Some(text) => Ok(Some(serde_json::from_str(&text)?)),
            None => Ok(None),
        }
    }

    /// Look up `key`; any failure is logged and reads as absent
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let start = Instant::now();
        match self.try_get(key).await {
            Ok(Some(value)) => {
                info!(key, elapsed_ms = elapsed_ms(start), "Cache HIT");
                Some(value)
            }
            Ok(None) => {
                info!(key, elapsed_ms = elapsed_ms(start), "Cache MISS");
                None
            }
            Err(StoreError::Serialization(e)) => {
                // Undecodable entries would otherwise be served as hits until expiry
                warn!(key, error = %e, "Evicting undecodable cache entry");
                if let Err(e) = self.call(self.store.del(key)).await {
                    error!(key, error = %e, "Error evicting key");
                }
                None
            }
            Err(e) => {
                error!(key, error = %e, "Error getting key");
                None
            }
        }
    }

    /// Serialize `value` as JSON and store it for `ttl`
    pub async fn try_set<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
    ) -> StoreResult<()> {
        if ttl.as_secs() == 0 {
            return Err(StoreError::InvalidTtl(ttl));
        }
        let text = serde_json::to_string(value)?;
        self.call(self.store.set_ex(key, &text, ttl)).await
    }

    /// Store `value` for `ttl`; returns false instead of failing
    pub async fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T, ttl: Duration) -> bool {
        let start = Instant::now();
        match self.try_set(key, value, ttl).await {
            Ok(()) => {
                info!(
                    key,
                    ttl_secs = ttl.as_secs(),
                    elapsed_ms = elapsed_ms(start),
                    "Cache SET"
                );
                true
            }
            Err(e) => {
                error!(key, error = %e, "Error setting key");
                false
            }
        }
    }

    /// Remove `key`, reporting whether it was present
    pub async fn try_delete(&self, key: &str) -> StoreResult<bool> {
        self.call(self.store.del(key)).await
    }

    /// Remove `key`; false if it was absent or the store failed
    pub async fn delete(&self, key: &str) -> bool {
        match self.try_delete(key).await {
            Ok(removed) => {
                info!(key, removed, "Cache DELETE");
                removed
            }
            Err(e) => {
                error!(key, error = %e, "Error deleting key");
                false
            }
        }
    }

    /// Remove every key in the configured logical database
    pub async fn try_clear_all(&self) -> StoreResult<()> {
        self.call(self.store.flush_db()).await
    }

    /// Remove every key in the configured logical database.
    ///
    /// The store is flushed at database granularity, so point the cache at a
    /// database that nothing else writes to.
    pub async fn clear_all(&self) -> bool {
        match self.try_clear_all().await {
            Ok(()) => {
                info!("All cache entries cleared");
                true
            }
            Err(e) => {
                error!(error = %e, "Error clearing cache");
                false
            }
        }
    }

    /// Read live counters from the store
    pub async fn try_stats(&self) -> StoreResult<CacheStats> {
        let info = self.call(self.store.info()).await?;
        Ok(CacheStats::from_info(&info))
    }

    /// Read live counters; a zeroed snapshot if the store cannot be read
    pub async fn stats(&self) -> CacheStats {
        match self.try_stats().await {
            Ok(stats) => {
                debug!(
                    hits = stats.hits,
                    misses = stats.misses,
                    keys = stats.total_keys,
                    "Fetched cache stats"
                );
                stats
            }
            Err(e) => {
                warn!(error = %e, "Error getting stats");
                CacheStats::default()
            }
        }
    }

    /// Hit ratio as a percentage; 0.0 when nothing has been looked up
    pub async fn hit_ratio(&self) -> f64 {
        self.stats().await.hit_ratio()
    }
}

impl std::fmt::Debug for KeyValueCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyValueCache")
            .field("store", &self.store)
            .field("command_timeout", &self.command_timeout)
            .finish()
    }
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use async_trait::async_trait;
    use proptest::prelude::*;
    use serde::Deserialize;
    use std::collections::{BTreeMap, HashMap};

    async fn memory_cache() -> (Arc<MemoryStore>, KeyValueCache) {
        let store = Arc::new(MemoryStore::new());
        let cache = KeyValueCache::new(store.clone()).await.unwrap();
        (store, cache)
    }

    #[tokio::test]
    async fn test_construction_fails_when_store_unreachable() {
        let store = Arc::new(MemoryStore::new());
        store.set_available(false);

        let result = KeyValueCache::new(store).await;
        assert!(matches!(result, Err(StoreError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_round_trip_mapping() {
        let (_, cache) = memory_cache().await;
        let mut delays = BTreeMap::new();
        delays.insert("AA".to_string(), 15.0);
        delays.insert("B6".to_string(), -3.27);
        delays.insert("WN".to_string(), 0.1 + 0.2);

        assert!(cache.set("delays", &delays, Duration::from_secs(60)).await);
        let restored: Option<BTreeMap<String, f64>> = cache.get("delays").await;
        assert_eq!(restored, Some(delays));
    }

    #[tokio::test]
    async fn test_round_trip_nested_structure() {
        #[derive(Debug, PartialEq, Serialize, Deserialize)]
        struct Report {
            name: String,
            counts: HashMap<String, u64>,
            ratio: Option<f64>,
        }

        let (_, cache) = memory_cache().await;
        let report = Report {
            name: "origin".to_string(),
            counts: [("JFK".to_string(), 2), ("LAX".to_string(), 1)].into(),
            ratio: None,
        };

        assert!(cache.set("report", &report, Duration::from_secs(60)).await);
        assert_eq!(cache.get::<Report>("report").await, Some(report));
    }

    #[tokio::test]
    async fn test_get_missing_key() {
        let (_, cache) = memory_cache().await;
        assert_eq!(cache.get::<u64>("nonexistent").await, None);
        assert!(matches!(cache.try_get::<u64>("nonexistent").await, Ok(None)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_absent_after_ttl() {
        let (_, cache) = memory_cache().await;
        assert!(cache.set("k", &42u64, Duration::from_secs(60)).await);

        tokio::time::advance(Duration::from_secs(59)).await;
        assert_eq!(cache.get::<u64>("k").await, Some(42));

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(cache.get::<u64>("k").await, None);
    }

    #[tokio::test]
    async fn test_sub_second_ttl_rejected() {
        let (store, cache) = memory_cache().await;
        assert!(!cache.set("k", &1u64, Duration::from_millis(10)).await);
        assert!(matches!(
            cache.try_set("k", &1u64, Duration::ZERO).await,
            Err(StoreError::InvalidTtl(_))
        ));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_deserialization_failure_reads_as_absent() {
        let (store, cache) = memory_cache().await;
        store
            .set_ex("k", "not json", Duration::from_secs(60))
            .await
            .unwrap();

        assert!(matches!(
            cache.try_get::<u64>("k").await,
            Err(StoreError::Serialization(_))
        ));

        // The degrading form evicts the entry, so later reads are plain misses
        assert_eq!(cache.get::<u64>("k").await, None);
        assert!(store.is_empty());
        assert!(matches!(cache.try_get::<u64>("k").await, Ok(None)));
    }

    #[tokio::test]
    async fn test_non_finite_floats_do_not_round_trip() {
        let (store, cache) = memory_cache().await;
        let delays: BTreeMap<String, f64> = [("AA".to_string(), f64::NAN)].into();

        // JSON has no NaN; serde_json writes null, which reads back as an error
        assert!(cache.set("delays", &delays, Duration::from_secs(60)).await);
        assert!(matches!(
            cache.try_get::<BTreeMap<String, f64>>("delays").await,
            Err(StoreError::Serialization(_))
        ));
        assert_eq!(cache.get::<BTreeMap<String, f64>>("delays").await, None);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_outage_degrades_without_error() {
        let (store, cache) = memory_cache().await;
        assert!(cache.set("k", &1u64, Duration::from_secs(60)).await);

        store.set_available(false);
        assert_eq!(cache.get::<u64>("k").await, None);
        assert!(!cache.set("k", &2u64, Duration::from_secs(60)).await);
        assert!(!cache.delete("k").await);
        assert!(!cache.clear_all().await);
        assert!(cache.stats().await.is_empty());
        assert_eq!(cache.hit_ratio().await, 0.0);

        // Distinguishable through the explicit form
        assert!(matches!(
            cache.try_get::<u64>("k").await,
            Err(StoreError::Unavailable(_))
        ));

        store.set_available(true);
        assert_eq!(cache.get::<u64>("k").await, Some(1));
    }

    #[tokio::test]
    async fn test_delete_reports_presence() {
        let (_, cache) = memory_cache().await;
        cache.set("k", &1u64, Duration::from_secs(60)).await;

        assert!(cache.delete("k").await);
        assert!(!cache.delete("k").await);
    }

    #[tokio::test]
    async fn test_clear_all() {
        let (store, cache) = memory_cache().await;
        for i in 0..10u64 {
            cache.set(&format!("k{}", i), &i, Duration::from_secs(60)).await;
        }
        assert_eq!(store.len(), 10);

        assert!(cache.clear_all().await);
        assert_eq!(store.len(), 0);
    }

    #[tokio::test]
    async fn test_stats_and_hit_ratio() {
        let (_, cache) = memory_cache().await;
        assert_eq!(cache.hit_ratio().await, 0.0);

        cache.set("k", &1u64, Duration::from_secs(60)).await;
        cache.get::<u64>("k").await;
        cache.get::<u64>("k").await;
        cache.get::<u64>("k").await;
        cache.get::<u64>("missing").await;

        let stats = cache.stats().await;
        assert_eq!(stats.hits, 3);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.total_keys, 1);
        assert_eq!(cache.hit_ratio().await, 75.0);
    }

    fn block_on<F: Future>(fut: F) -> F::Output {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap()
            .block_on(fut)
    }

    fn finite_f64() -> impl Strategy<Value = f64> {
        prop::num::f64::NORMAL | prop::num::f64::SUBNORMAL | prop::num::f64::ZERO
    }

    fn round_trip<T>(value: &T) -> (Option<T>, usize)
    where
        T: Serialize + DeserializeOwned,
    {
        block_on(async {
            let (store, cache) = memory_cache().await;
            assert!(cache.set("k", value, Duration::from_secs(60)).await);
            let restored = cache.get::<T>("k").await;
            (restored, store.len())
        })
    }

    proptest! {
        #[test]
        fn prop_delay_maps_round_trip(
            delays in prop::collection::btree_map("[A-Z0-9]{2,3}", finite_f64(), 0..32),
        ) {
            let (restored, _) = round_trip(&delays);
            prop_assert_eq!(restored, Some(delays));
        }

        #[test]
        fn prop_count_maps_round_trip(
            counts in prop::collection::btree_map("[A-Z]{3}", any::<u64>(), 0..32),
        ) {
            let (restored, _) = round_trip(&counts);
            prop_assert_eq!(restored, Some(counts));
        }

        #[test]
        fn prop_non_finite_values_read_as_absent(
            value in prop::num::f64::INFINITE | prop::num::f64::QUIET_NAN,
        ) {
            let delays: BTreeMap<String, f64> = [("AA".to_string(), value)].into();
            let (restored, remaining) = round_trip(&delays);
            prop_assert_eq!(restored, None);
            prop_assert_eq!(remaining, 0);
        }
    }

    #[derive(Debug)]
    struct StalledStore;

    #[async_trait]
    impl KvStore for StalledStore {
        async fn ping(&self) -> StoreResult<()> {
            Ok(())
        }

        async fn get(&self, _key: &str) -> StoreResult<Option<String>> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(None)
        }

        async fn set_ex(&self, _key: &str, _value: &str, _ttl: Duration) -> StoreResult<()> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(())
        }

        async fn del(&self, _key: &str) -> StoreResult<bool> {
            Ok(false)
        }

        async fn flush_db(&self) -> StoreResult<()> {
            Ok(())
        }

        async fn info(&self) -> StoreResult<HashMap<String, String>> {
            Ok(HashMap::new())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_command_timeout() {
        let cache = KeyValueCache::new(Arc::new(StalledStore))
            .await
            .unwrap()
            .with_command_timeout(Duration::from_millis(100));

        assert!(matches!(
            cache.try_get::<u64>("k").await,
            Err(StoreError::Timeout(_))
        ));
        assert!(!cache.set("k", &1u64, Duration::from_secs(60)).await);
    }
}
