//! Cache key derivation

use flightcache_core::QueryParams;
use sha2::{Digest, Sha256};
use std::fmt;

/// Length of every derived key, in characters
pub const KEY_LEN: usize = 64;

/// Key for cache lookups, derived from a query type and its parameters.
///
/// The key is the hex-encoded SHA-256 digest of the canonical form of the
/// query identity, so it has a fixed length and is independent of the order
/// in which parameters were supplied.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    /// Derive the key for `query_type` with `params`
    pub fn derive(query_type: &str, params: &QueryParams) -> Self {
        let canonical = params.canonical_form(query_type);
        let digest = Sha256::digest(canonical.as_bytes());
        Self(hex::encode(digest))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    #[test]
    fn test_cache_key_is_stable() {
        let params = QueryParams::new().with("delay_type", "ARR_DELAY");
        let key1 = CacheKey::derive("avg_delay_airline", &params);
        let key2 = CacheKey::derive("avg_delay_airline", &params.clone());

        assert_eq!(key1, key2);
        assert_eq!(key1.as_str().len(), KEY_LEN);
        assert!(key1.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_cache_key_discriminates() {
        let arr = QueryParams::new().with("delay_type", "ARR_DELAY");
        let dep = QueryParams::new().with("delay_type", "DEP_DELAY");

        let key1 = CacheKey::derive("avg_delay_airline", &arr);
        let key2 = CacheKey::derive("avg_delay_airline", &dep);
        let key3 = CacheKey::derive("monthly_delays", &arr);

        // Different parameter value should produce different key
        assert_ne!(key1, key2);
        // Different query type should produce different key
        assert_ne!(key1, key3);
    }

    #[test]
    fn test_empty_params() {
        let key = CacheKey::derive("flights_airport", &QueryParams::new());
        assert_eq!(key.to_string().len(), KEY_LEN);
        assert_ne!(key, CacheKey::derive("flights_airport_", &QueryParams::new()));
    }

    fn params_strategy() -> impl Strategy<Value = Vec<(String, i64)>> {
        prop::collection::vec(("[a-z_]{1,8}", any::<i64>()), 0..6)
    }

    proptest! {
        #[test]
        fn prop_key_ignores_parameter_order(
            query_type in "[a-z_]{1,16}",
            entries in params_strategy(),
        ) {
            // Deduplicate names so both orders describe the same parameter set
            let mut seen = HashSet::new();
            let entries: Vec<_> = entries
                .into_iter()
                .filter(|(name, _)| seen.insert(name.clone()))
                .collect();

            let forward: QueryParams = entries.clone().into_iter().collect();
            let reversed: QueryParams = entries.into_iter().rev().collect();

            prop_assert_eq!(
                CacheKey::derive(&query_type, &forward),
                CacheKey::derive(&query_type, &reversed)
            );
        }

        #[test]
        fn prop_distinct_inputs_never_collide(
            inputs in prop::collection::hash_set(
                ("[a-z]{1,6}", "[A-Z]{1,4}", any::<i32>()),
                1..256,
            ),
        ) {
            let mut keys = HashSet::new();
            for (query_type, code, value) in &inputs {
                let params = QueryParams::new()
                    .with("code", code.as_str())
                    .with("value", *value);
                keys.insert(CacheKey::derive(query_type, &params));
            }
            prop_assert_eq!(keys.len(), inputs.len());
        }
    }
}
