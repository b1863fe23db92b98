//! Grouped aggregation kernels over the flight table
//!
//! Rows whose group key or value is null are skipped, so a group only exists
//! if at least one row contributed to it.

use ahash::AHashMap;
use arrow::array::{Array, Float64Array, StringArray};
use flightcache_core::{FlightCacheError, Result};
use std::collections::BTreeMap;

/// Average delay per group, e.g. per carrier
pub type DelayByKey = BTreeMap<String, f64>;

/// Number of flights per group, e.g. per airport
pub type CountByKey = BTreeMap<String, u64>;

/// Round to two decimal places, halves away from zero
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn check_lengths(keys: &StringArray, values: &Float64Array) -> Result<()> {
    if keys.len() != values.len() {
        return Err(FlightCacheError::ExecutionError(format!(
            "group keys ({} rows) and values ({} rows) differ in length",
            keys.len(),
            values.len()
        )));
    }
    Ok(())
}

/// Mean of `values` grouped by `keys`, rounded to two decimals
pub fn avg_by_group(keys: &StringArray, values: &Float64Array) -> Result<DelayByKey> {
    check_lengths(keys, values)?;

    let mut groups: AHashMap<&str, (f64, u64)> = AHashMap::new();
    for (key, value) in keys.iter().zip(values.iter()) {
        if let (Some(key), Some(value)) = (key, value) {
            let (sum, count) = groups.entry(key).or_insert((0.0, 0));
            *sum += value;
            *count += 1;
        }
    }

    Ok(groups
        .into_iter()
        .map(|(key, (sum, count))| (key.to_string(), round2(sum / count as f64)))
        .collect())
}

/// Number of rows per distinct key
pub fn count_by_group(keys: &StringArray) -> CountByKey {
    let mut groups: AHashMap<&str, u64> = AHashMap::new();
    for key in keys.iter().flatten() {
        *groups.entry(key).or_insert(0) += 1;
    }

    groups
        .into_iter()
        .map(|(key, count)| (key.to_string(), count))
        .collect()
}
