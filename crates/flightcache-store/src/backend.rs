//! Backend abstraction over a TTL key-value store

use crate::error::StoreResult;
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt::Debug;
use std::time::Duration;

/// Raw operations of a networked TTL store.
///
/// Values are opaque UTF-8 text; serialization happens one layer up in
/// [`crate::KeyValueCache`]. Implementations must be safe to share between
/// tasks without extra locking.
#[async_trait]
pub trait KvStore: Debug + Send + Sync {
    /// Connectivity check
    async fn ping(&self) -> StoreResult<()>;

    /// Fetch a live value
    async fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Store a value that expires after `ttl`
    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> StoreResult<()>;

    /// Remove a key, returning whether it existed
    async fn del(&self, key: &str) -> StoreResult<bool>;

    /// Remove every key in the store's logical database
    async fn flush_db(&self) -> StoreResult<()>;

    /// Server counters as a field map (see [`crate::stats::parse_info`])
    async fn info(&self) -> StoreResult<HashMap<String, String>>;
}
