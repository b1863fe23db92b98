//! Cache statistics snapshots
//!
//! Counters are owned by the store. A [`CacheStats`] value is a point-in-time
//! copy read through the store's `INFO` report and is never persisted.

use std::collections::HashMap;

/// Statistics for cache performance monitoring
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of lookups that found a live key
    pub hits: u64,
    /// Number of lookups that found nothing
    pub misses: u64,
    /// Memory used by the store, human readable (for example `1.02M`)
    pub used_memory_human: String,
    /// Number of connected clients
    pub connected_clients: u64,
    /// Number of keys across all logical databases
    pub total_keys: u64,
}

impl CacheStats {
    /// Build a snapshot from an `INFO` field map.
    ///
    /// Missing or malformed counters read as zero.
    pub fn from_info(info: &HashMap<String, String>) -> Self {
        let counter = |name: &str| -> u64 {
            info.get(name)
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(0)
        };

        let total_keys = info
            .iter()
            .filter(|(name, _)| is_keyspace_field(name))
            .map(|(_, value)| keyspace_key_count(value))
            .sum();

        Self {
            hits: counter("keyspace_hits"),
            misses: counter("keyspace_misses"),
            used_memory_human: info
                .get("used_memory_human")
                .cloned()
                .unwrap_or_else(|| "N/A".to_string()),
            connected_clients: counter("connected_clients"),
            total_keys,
        }
    }

    /// Get total requests (hits + misses)
    pub fn total_requests(&self) -> u64 {
        self.hits + self.misses
    }

    /// Hit ratio as a percentage (0.0 to 100.0); 0.0 before any access
    pub fn hit_ratio(&self) -> f64 {
        let total = self.total_requests();
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64 * 100.0
        }
    }

    /// True for the zeroed snapshot returned when the store could not be read
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Parse the text of an `INFO` reply into a field map.
///
/// Section headers (`# Server`) and blank lines are skipped.
pub fn parse_info(raw: &str) -> HashMap<String, String> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once(':'))
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect()
}

/// Render a byte count the way the store reports `used_memory_human`
pub fn human_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["K", "M", "G", "T"];
    if bytes < 1024 {
        return format!("{}B", bytes);
    }
    let mut value = bytes as f64;
    let mut unit = "B";
    for next in UNITS {
        if value < 1024.0 {
            break;
        }
        value /= 1024.0;
        unit = next;
    }
    format!("{:.2}{}", value, unit)
}

fn is_keyspace_field(name: &str) -> bool {
    name.strip_prefix("db")
        .map(|idx| !idx.is_empty() && idx.bytes().all(|b| b.is_ascii_digit()))
        .unwrap_or(false)
}

/// `keys=12,expires=12,avg_ttl=0` -> 12
fn keyspace_key_count(value: &str) -> u64 {
    value
        .split(',')
        .filter_map(|part| part.split_once('='))
        .find(|(name, _)| *name == "keys")
        .and_then(|(_, count)| count.parse().ok())
        .unwrap_or(0)
}
