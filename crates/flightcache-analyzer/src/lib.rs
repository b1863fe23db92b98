//! Cache-aside analytics over flight delay data
//!
//! [`FlightAnalyzer`] answers grouped delay queries. Results are memoized in
//! a TTL cache keyed by query name and parameters; the flight table itself is
//! loaded lazily on the first miss and shared afterwards.

pub mod aggregate;
pub mod analyzer;
pub mod config;

pub use aggregate::{avg_by_group, count_by_group, round2, CountByKey, DelayByKey};
pub use analyzer::{FlightAnalyzer, AVG_DELAY_AIRLINE, FLIGHTS_AIRPORT, MONTHLY_DELAYS};
pub use config::AnalyzerConfig;
