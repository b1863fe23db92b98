use std::time::Duration;
use thiserror::Error;

/// Failure of a single cache-layer call
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Store call timed out after {0:?}")]
    Timeout(Duration),

    #[error("Invalid TTL: {0:?} (must be at least one second)")]
    InvalidTtl(Duration),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;
