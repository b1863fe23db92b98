//! Cached Flight Analyzer
//!
//! Runs aggregate queries over the flight table with a cache-aside policy:
//! the analyzer looks a result up by its derived key, and only on a miss
//! loads the table (once), computes the result and stores it with a TTL.

use crate::aggregate::{avg_by_group, count_by_group, CountByKey, DelayByKey};
use crate::config::AnalyzerConfig;
use flightcache_core::{AirportRole, DelayColumn, FlightCacheError, QueryParams, Result};
use flightcache_storage::{FlightTable, TableSource};
use flightcache_store::{CacheKey, CacheStats, KeyValueCache, StoreConfig};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::OnceCell;
use tracing::{debug, info, instrument, warn};

pub const AVG_DELAY_AIRLINE: &str = "avg_delay_airline";
pub const FLIGHTS_AIRPORT: &str = "flights_airport";
pub const MONTHLY_DELAYS: &str = "monthly_delays";

/// Flight data analyzer with cache-aside result caching
pub struct FlightAnalyzer {
    /// Result cache
    cache: KeyValueCache,
    /// Where the table comes from on first miss
    source: Arc<dyn TableSource>,
    /// Loaded at most once, then shared read-only
    table: OnceCell<Arc<FlightTable>>,
    config: AnalyzerConfig,
}

impl FlightAnalyzer {
    /// Create an analyzer over an existing cache
    pub fn new(cache: KeyValueCache, source: Arc<dyn TableSource>, config: AnalyzerConfig) -> Self {
        Self {
            cache,
            source,
            table: OnceCell::new(),
            config,
        }
    }

    /// Connect to the store and create an analyzer.
    ///
    /// Fails if the store does not answer; nothing else is checked up front.
    pub async fn connect(
        store_config: &StoreConfig,
        source: Arc<dyn TableSource>,
        config: AnalyzerConfig,
    ) -> Result<Self> {
        let cache = KeyValueCache::connect(store_config)
            .await
            .map_err(|e| FlightCacheError::StoreUnavailable(e.to_string()))?;
        Ok(Self::new(cache, source, config))
    }

    /// Derive the cache key of a query
    pub fn derive_key(query_type: &str, params: &QueryParams) -> CacheKey {
        CacheKey::derive(query_type, params)
    }

    /// Load and clean the source table unless that already happened.
    ///
    /// Concurrent first callers wait for a single load. A failed load is
    /// returned to every waiting caller and retried on the next call.
    pub async fn ensure_table_loaded(&self) -> Result<Arc<FlightTable>> {
        let table = self
            .table
            .get_or_try_init(|| async {
                let source = Arc::clone(&self.source);
                info!(source = ?source, "Loading source table");
                let start = Instant::now();

                let table = tokio::task::spawn_blocking(move || source.load())
                    .await
                    .map_err(|e| {
                        FlightCacheError::LoadError(format!("table load task failed: {}", e))
                    })??;

                info!(
                    rows = table.num_rows(),
                    elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Source table ready"
                );
                Ok::<_, FlightCacheError>(Arc::new(table))
            })
            .await?;
        Ok(Arc::clone(table))
    }

    /// Whether the source table has been loaded
    pub fn is_table_loaded(&self) -> bool {
        self.table.initialized()
    }

    /// Get-or-compute for one query.
    ///
    /// # Arguments
    /// * `query_type` - Name of the query, part of the cache key
    /// * `params` - Query parameters, part of the cache key
    /// * `compute` - Produces the result from the table on a miss
    ///
    /// # Returns
    /// The cached result, or the freshly computed one. Only a table load
    /// failure (or a failing `compute`) is an error; cache trouble is not.
    #[instrument(level = "debug", skip(self, params, compute))]
    pub async fn query<T, F>(&self, query_type: &str, params: QueryParams, compute: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned + Send + 'static,
        F: FnOnce(&FlightTable) -> Result<T> + Send + 'static,
    {
        let key = Self::derive_key(query_type, &params);

        if self.config.enabled {
            if let Some(cached) = self.cache.get::<T>(key.as_str()).await {
                info!(query_type, key = %key, "Returned result from cache");
                return Ok(cached);
            }
        }

        info!(query_type, key = %key, "Computing from source table (cache miss)");
        let start = Instant::now();

        let table = self.ensure_table_loaded().await?;
        let result = tokio::task::spawn_blocking(move || compute(&table))
            .await
            .map_err(|e| FlightCacheError::ExecutionError(format!("query task failed: {}", e)))??;

        info!(
            query_type,
            elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Computed result"
        );

        if self.config.enabled {
            if self.cache.set(key.as_str(), &result, self.config.ttl).await {
                debug!(query_type, key = %key, "Result cached for future requests");
            } else {
                warn!(query_type, key = %key, "Result not cached");
            }
        }

        Ok(result)
    }

    /// Average delay per airline
    pub async fn avg_delay_by_airline(&self, delay: DelayColumn) -> Result<DelayByKey> {
        let params = QueryParams::new().with("delay_type", delay);
        self.query(AVG_DELAY_AIRLINE, params, move |table| {
            avg_by_group(table.carriers(), table.delays(delay))
        })
        .await
    }

    /// Flight counts per airport
    pub async fn flights_by_airport(&self, role: AirportRole) -> Result<CountByKey> {
        let params = QueryParams::new().with("airport_type", role);
        self.query(FLIGHTS_AIRPORT, params, move |table| {
            Ok(count_by_group(table.airports(role)))
        })
        .await
    }

    /// Average delay per `YYYY-MM` month
    pub async fn monthly_delays(&self, delay: DelayColumn) -> Result<DelayByKey> {
        let params = QueryParams::new().with("delay_type", delay);
        self.query(MONTHLY_DELAYS, params, move |table| {
            avg_by_group(table.month_labels(), table.delays(delay))
        })
        .await
    }

    /// Drop the cached result of one query
    pub async fn invalidate(&self, query_type: &str, params: &QueryParams) -> bool {
        let key = Self::derive_key(query_type, params);
        self.cache.delete(key.as_str()).await
    }

    /// Get cache statistics
    pub async fn cache_stats(&self) -> CacheStats {
        self.cache.stats().await
    }

    /// Cache hit ratio as a percentage
    pub async fn hit_ratio(&self) -> f64 {
        self.cache.hit_ratio().await
    }

    /// Clear all cached entries
    pub async fn clear_cache(&self) -> bool {
        self.cache.clear_all().await
    }

    /// Get the underlying cache
    pub fn cache(&self) -> &KeyValueCache {
        &self.cache
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }
}

impl std::fmt::Debug for FlightAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlightAnalyzer")
            .field("cache", &self.cache)
            .field("source", &self.source)
            .field("table_loaded", &self.is_table_loaded())
            .field("config", &self.config)
            .finish()
    }
}
