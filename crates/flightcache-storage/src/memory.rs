//! In-memory flight source
//!
//! Holds raw rows that have not been cleaned yet, so the same cleaning rules
//! apply as for file-backed sources.

use crate::clean::clean_flights;
use crate::source::TableSource;
use crate::table::FlightTable;
use arrow::array::{ArrayRef, StringArray};
use arrow::compute::concat_batches;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use flightcache_core::{FlightCacheError, Result, SOURCE_COLUMNS};
use std::sync::Arc;

/// One raw flight row, values as they would appear in the source file
#[derive(Debug, Clone, PartialEq)]
pub struct FlightRecord {
    pub fl_date: String,
    pub carrier: String,
    pub origin: String,
    pub dest: String,
    pub dep_delay: Option<String>,
    pub arr_delay: Option<String>,
    pub cancelled: bool,
}

impl FlightRecord {
    pub fn new(
        fl_date: impl Into<String>,
        carrier: impl Into<String>,
        origin: impl Into<String>,
        dest: impl Into<String>,
    ) -> Self {
        Self {
            fl_date: fl_date.into(),
            carrier: carrier.into(),
            origin: origin.into(),
            dest: dest.into(),
            dep_delay: Some("0".to_string()),
            arr_delay: Some("0".to_string()),
            cancelled: false,
        }
    }

    pub fn with_delays(mut self, dep_delay: f64, arr_delay: f64) -> Self {
        self.dep_delay = Some(dep_delay.to_string());
        self.arr_delay = Some(arr_delay.to_string());
        self
    }

    /// Delays as raw text, possibly unparseable
    pub fn with_raw_delays(mut self, dep_delay: Option<&str>, arr_delay: Option<&str>) -> Self {
        self.dep_delay = dep_delay.map(str::to_string);
        self.arr_delay = arr_delay.map(str::to_string);
        self
    }

    pub fn cancelled(mut self) -> Self {
        self.cancelled = true;
        self
    }
}

/// Flight source backed by record batches held in memory
#[derive(Debug, Clone)]
pub struct MemoryFlightSource {
    schema: Arc<Schema>,
    batches: Vec<RecordBatch>,
}

impl MemoryFlightSource {
    /// Create a source from raw batches. All batches must share a schema
    /// that includes the source columns.
    pub fn new(batches: Vec<RecordBatch>) -> Result<Self> {
        let schema = batches
            .first()
            .map(|b| b.schema())
            .ok_or_else(|| FlightCacheError::LoadError("no batches supplied".to_string()))?;
        Ok(Self { schema, batches })
    }

    /// Create a source from individual rows
    pub fn from_records(records: &[FlightRecord]) -> Result<Self> {
        let schema = Arc::new(Schema::new(
            SOURCE_COLUMNS
                .iter()
                .map(|name| Field::new(*name, DataType::Utf8, true))
                .collect::<Vec<_>>(),
        ));

        let text = |f: fn(&FlightRecord) -> Option<&str>| -> ArrayRef {
            Arc::new(records.iter().map(f).collect::<StringArray>())
        };

        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                text(|r| Some(r.fl_date.as_str())),
                text(|r| Some(r.carrier.as_str())),
                text(|r| Some(r.origin.as_str())),
                text(|r| Some(r.dest.as_str())),
                text(|r| r.dep_delay.as_deref()),
                text(|r| r.arr_delay.as_deref()),
                text(|r| Some(if r.cancelled { "1.00" } else { "0.00" })),
            ],
        )?;

        Ok(Self {
            schema,
            batches: vec![batch],
        })
    }

    pub fn row_count(&self) -> usize {
        self.batches.iter().map(|b| b.num_rows()).sum()
    }
}

impl TableSource for MemoryFlightSource {
    fn load(&self) -> Result<FlightTable> {
        let raw = concat_batches(&self.schema, &self.batches)?;
        FlightTable::try_new(clean_flights(&raw)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flightcache_core::DelayColumn;

    #[test]
    fn test_from_records_applies_cleaning() {
        let source = MemoryFlightSource::from_records(&[
            FlightRecord::new("2019-01-01", "AA", "JFK", "LAX").with_delays(1.0, 10.0),
            FlightRecord::new("2019-01-01", "AA", "JFK", "LAX").cancelled(),
            FlightRecord::new("2019-01-01", "BB", "LAX", "JFK")
                .with_raw_delays(Some("x"), Some("1")),
            FlightRecord::new("2019-01-01", "BB", "LAX", "JFK").with_raw_delays(Some("2"), None),
        ])
        .unwrap();

        assert_eq!(source.row_count(), 4);
        let table = source.load().unwrap();
        assert_eq!(table.num_rows(), 1);
        assert_eq!(table.delays(DelayColumn::Arrival).value(0), 10.0);
    }

    #[test]
    fn test_multiple_batches() {
        let first = MemoryFlightSource::from_records(&[
            FlightRecord::new("2019-01-01", "AA", "JFK", "LAX"),
        ])
        .unwrap();
        let second = MemoryFlightSource::from_records(&[
            FlightRecord::new("2019-02-01", "BB", "LAX", "JFK"),
            FlightRecord::new("2019-03-01", "CC", "SFO", "JFK"),
        ])
        .unwrap();

        let batches = first.batches.into_iter().chain(second.batches).collect();
        let source = MemoryFlightSource::new(batches).unwrap();
        assert_eq!(source.load().unwrap().num_rows(), 3);
    }

    #[test]
    fn test_no_batches() {
        assert!(MemoryFlightSource::new(vec![]).is_err());
    }
}
