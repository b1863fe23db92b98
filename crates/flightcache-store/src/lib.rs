//! TTL Key-Value Cache for flightcache
//!
//! This crate wraps an external time-to-live key-value store and exposes a
//! small typed API for caching JSON-serializable query results.
//!
//! # Features
//!
//! - **Fault isolation**: after construction, store failures degrade to a miss
//!   (or `false`) and are logged instead of propagated
//! - **TTL Support**: every entry is written with an expiry
//! - **Stable keys**: [`CacheKey`] is a fixed-length digest of the query identity
//! - **Statistics**: hit/miss counters read live from the store
//! - **Backends**: Redis for real deployments, an in-memory store for tests
//!
//! # Example
//!
//! ```ignore
//! use flightcache_store::{CacheKey, KeyValueCache, StoreConfig};
//! use std::time::Duration;
//!
//! let cache = KeyValueCache::connect(&StoreConfig::default()).await?;
//! let key = CacheKey::derive("avg_delay_airline", &params);
//!
//! if let Some(result) = cache.get::<BTreeMap<String, f64>>(key.as_str()).await {
//!     return Ok(result);
//! }
//!
//! let result = compute(&table)?;
//! cache.set(key.as_str(), &result, Duration::from_secs(60)).await;
//! ```

pub mod backend;
pub mod cache;
pub mod config;
pub mod error;
pub mod key;
pub mod memory;
pub mod redis_store;
pub mod stats;

pub use backend::KvStore;
pub use cache::KeyValueCache;
pub use config::StoreConfig;
pub use error::{StoreError, StoreResult};
pub use key::CacheKey;
pub use memory::MemoryStore;
pub use redis_store::RedisStore;
pub use stats::CacheStats;
