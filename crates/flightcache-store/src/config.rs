//! Store connection configuration

use std::time::Duration;

/// Connection settings for the external TTL store
#[derive(Debug, Clone, PartialEq)]
pub struct StoreConfig {
    /// Store host name
    pub host: String,
    /// Store port
    pub port: u16,
    /// Logical database index. `clear_all` only flushes this database.
    pub db: i64,
    /// Limit on establishing the initial connection
    pub connect_timeout: Duration,
    /// Optional limit applied to every individual store call
    pub command_timeout: Option<Duration>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 6379,
            db: 0,
            connect_timeout: Duration::from_secs(5),
            command_timeout: None,
        }
    }
}

impl StoreConfig {
    /// Create a configuration for the given host and port
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    /// Set the logical database index
    pub fn with_db(mut self, db: i64) -> Self {
        self.db = db;
        self
    }

    /// Set the initial connection timeout
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the per-call timeout
    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = Some(timeout);
        self
    }

    /// Connection URL understood by the redis client
    pub fn redis_url(&self) -> String {
        format!("redis://{}:{}/{}", self.host, self.port, self.db)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = StoreConfig::default();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 6379);
        assert_eq!(config.db, 0);
        assert_eq!(config.connect_timeout, Duration::from_secs(5));
        assert!(config.command_timeout.is_none());
    }

    #[test]
    fn test_builder_pattern() {
        let config = StoreConfig::new("cache.internal", 6380)
            .with_db(3)
            .with_connect_timeout(Duration::from_secs(1))
            .with_command_timeout(Duration::from_millis(250));

        assert_eq!(config.host, "cache.internal");
        assert_eq!(config.port, 6380);
        assert_eq!(config.db, 3);
        assert_eq!(config.connect_timeout, Duration::from_secs(1));
        assert_eq!(config.command_timeout, Some(Duration::from_millis(250)));
    }

    #[test]
    fn test_redis_url() {
        let config = StoreConfig::new("127.0.0.1", 6379).with_db(2);
        assert_eq!(config.redis_url(), "redis://127.0.0.1:6379/2");
    }
}
