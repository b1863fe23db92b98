//! The cleaned, immutable flight table

use crate::dates::month_label;
use arrow::array::{Array, Float64Array, StringArray};
use arrow::record_batch::RecordBatch;
use flightcache_core::{
    AirportRole, DelayColumn, FlightCacheError, Result, ARR_DELAY, DEP_DELAY, DEST, FL_DATE,
    OP_CARRIER, ORIGIN,
};
use std::sync::OnceLock;
use tracing::warn;

/// Cleaned flight data shared read-only by every query.
///
/// The only addition after construction is the month label column, derived
/// from `FL_DATE` on first use and kept for the table's lifetime.
#[derive(Debug)]
pub struct FlightTable {
    batch: RecordBatch,
    fl_date: StringArray,
    carrier: StringArray,
    origin: StringArray,
    dest: StringArray,
    dep_delay: Float64Array,
    arr_delay: Float64Array,
    month_labels: OnceLock<StringArray>,
}

fn utf8(batch: &RecordBatch, name: &str) -> Result<StringArray> {
    let array = batch
        .column_by_name(name)
        .ok_or_else(|| FlightCacheError::ColumnNotFound(name.to_string()))?;
    array
        .as_any()
        .downcast_ref::<StringArray>()
        .cloned()
        .ok_or_else(|| FlightCacheError::TypeMismatch {
            expected: "Utf8".to_string(),
            found: array.data_type().to_string(),
        })
}

fn float64(batch: &RecordBatch, name: &str) -> Result<Float64Array> {
    let array = batch
        .column_by_name(name)
        .ok_or_else(|| FlightCacheError::ColumnNotFound(name.to_string()))?;
    array
        .as_any()
        .downcast_ref::<Float64Array>()
        .cloned()
        .ok_or_else(|| FlightCacheError::TypeMismatch {
            expected: "Float64".to_string(),
            found: array.data_type().to_string(),
        })
}

impl FlightTable {
    /// Wrap a batch that already went through [`crate::clean_flights`]
    pub fn try_new(batch: RecordBatch) -> Result<Self> {
        Ok(Self {
            fl_date: utf8(&batch, FL_DATE)?,
            carrier: utf8(&batch, OP_CARRIER)?,
            origin: utf8(&batch, ORIGIN)?,
            dest: utf8(&batch, DEST)?,
            dep_delay: float64(&batch, DEP_DELAY)?,
            arr_delay: float64(&batch, ARR_DELAY)?,
            batch,
            month_labels: OnceLock::new(),
        })
    }

    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    pub fn is_empty(&self) -> bool {
        self.num_rows() == 0
    }

    pub fn batch(&self) -> &RecordBatch {
        &self.batch
    }

    pub fn flight_dates(&self) -> &StringArray {
        &self.fl_date
    }

    pub fn carriers(&self) -> &StringArray {
        &self.carrier
    }

    pub fn airports(&self, role: AirportRole) -> &StringArray {
        match role {
            AirportRole::Origin => &self.origin,
            AirportRole::Destination => &self.dest,
        }
    }

    pub fn delays(&self, column: DelayColumn) -> &Float64Array {
        match column {
            DelayColumn::Arrival => &self.arr_delay,
            DelayColumn::Departure => &self.dep_delay,
        }
    }

    /// `YYYY-MM` label per row, null where the date does not parse.
    /// Computed on first call only.
    pub fn month_labels(&self) -> &StringArray {
        self.month_labels.get_or_init(|| {
            let labels: StringArray = self
                .fl_date
                .iter()
                .map(|date| date.and_then(month_label))
                .collect();
            let unparsed = labels.null_count() - self.fl_date.null_count();
            if unparsed > 0 {
                warn!(rows = unparsed, "Flight dates could not be parsed; rows have no month");
            }
            labels
        })
    }

    /// Whether the month label column has been derived yet
    pub fn has_month_labels(&self) -> bool {
        self.month_labels.get().is_some()
    }
}
