//! Query parameters used to identify a cached query
//!
//! Parameters are kept in a sorted map so that the order in which a caller
//! supplies them never changes the canonical form fed to key derivation.

use crate::types::{AirportRole, DelayColumn};
use std::collections::BTreeMap;

/// A scalar parameter value
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl ParamValue {
    /// Type-tagged text form, so `"1"` and `1` never canonicalize the same way.
    /// Floats use the shortest round-trip representation.
    fn canonical(&self) -> String {
        match self {
            ParamValue::Str(s) => format!("s:{}", s),
            ParamValue::Int(i) => format!("i:{}", i),
            ParamValue::Float(f) => format!("f:{:?}", f),
            ParamValue::Bool(b) => format!("b:{}", b),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Str(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Str(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Int(value)
    }
}

impl From<i32> for ParamValue {
    fn from(value: i32) -> Self {
        ParamValue::Int(value as i64)
    }
}

impl From<u32> for ParamValue {
    fn from(value: u32) -> Self {
        ParamValue::Int(value as i64)
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue::Float(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Bool(value)
    }
}

impl From<DelayColumn> for ParamValue {
    fn from(value: DelayColumn) -> Self {
        ParamValue::Str(value.column_name().to_string())
    }
}

impl From<AirportRole> for ParamValue {
    fn from(value: AirportRole) -> Self {
        ParamValue::Str(value.column_name().to_string())
    }
}

/// Named parameters of a query. Inserting a name twice keeps the last value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryParams(BTreeMap<String, ParamValue>);

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parameter (builder style)
    pub fn with(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<ParamValue>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.0.get(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate parameters sorted by name
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Canonical text form of `(query_type, params)`.
    ///
    /// Encoded as a JSON array so that separators inside names or values are
    /// escaped and two different inputs cannot produce the same text.
    pub fn canonical_form(&self, query_type: &str) -> String {
        let entries: Vec<(&str, String)> = self
            .0
            .iter()
            .map(|(name, value)| (name.as_str(), value.canonical()))
            .collect();
        serde_json::json!([query_type, entries]).to_string()
    }
}

impl<K, V> FromIterator<(K, V)> for QueryParams
where
    K: Into<String>,
    V: Into<ParamValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = QueryParams::new();
        for (name, value) in iter {
            params.insert(name, value);
        }
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insertion_order_does_not_matter() {
        let a = QueryParams::new().with("delay_type", "ARR_DELAY").with("year", 2019);
        let b = QueryParams::new().with("year", 2019).with("delay_type", "ARR_DELAY");

        assert_eq!(a, b);
        assert_eq!(a.canonical_form("q"), b.canonical_form("q"));
    }

    #[test]
    fn test_canonical_form_distinguishes_types() {
        let as_str = QueryParams::new().with("n", "1");
        let as_int = QueryParams::new().with("n", 1i64);
        let as_float = QueryParams::new().with("n", 1.0f64);

        assert_ne!(as_str.canonical_form("q"), as_int.canonical_form("q"));
        assert_ne!(as_int.canonical_form("q"), as_float.canonical_form("q"));
    }

    #[test]
    fn test_canonical_form_escapes_separators() {
        let a = QueryParams::new().with("a", "x\",\"b");
        let b = QueryParams::new().with("a", "x").with("b", "");

        assert_ne!(a.canonical_form("q"), b.canonical_form("q"));
    }

    #[test]
    fn test_last_insert_wins() {
        let params: QueryParams = vec![("k", "first"), ("k", "second")].into_iter().collect();
        assert_eq!(params.len(), 1);
        assert_eq!(params.get("k"), Some(&ParamValue::from("second")));
    }

    #[test]
    fn test_column_conversions() {
        let params = QueryParams::new()
            .with("delay_type", DelayColumn::Departure)
            .with("airport_type", AirportRole::Origin);

        assert_eq!(params.get("delay_type"), Some(&ParamValue::from("DEP_DELAY")));
        assert_eq!(params.get("airport_type"), Some(&ParamValue::from("ORIGIN")));
    }
}
