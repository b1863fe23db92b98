use crate::table::FlightTable;
use flightcache_core::Result;
use std::fmt::Debug;

/// Provider of the cleaned flight table.
///
/// `load` does blocking I/O and is called at most once per analyzer.
pub trait TableSource: Debug + Send + Sync {
    fn load(&self) -> Result<FlightTable>;
}
