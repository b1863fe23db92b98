//! Analyzer configuration options

use std::time::Duration;

/// Configuration for cached query execution
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzerConfig {
    /// Time-to-live for cached results
    pub ttl: Duration,
    /// Whether results are read from and written to the cache
    pub enabled: bool,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(60),
            enabled: true,
        }
    }
}

impl AnalyzerConfig {
    /// Create a configuration with the given TTL in seconds
    pub fn new(ttl_secs: u64) -> Self {
        Self {
            ttl: Duration::from_secs(ttl_secs),
            enabled: true,
        }
    }

    /// Create a configuration that always recomputes
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }

    /// Set the TTL duration
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Enable or disable the cache
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}
