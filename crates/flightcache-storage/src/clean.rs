//! Cleaning rules applied once when the table is loaded
//!
//! - cancelled flights are removed (`CANCELLED` must read as 0)
//! - delay columns are coerced to `Float64`; unparseable values become null
//! - rows with a null or non-finite departure or arrival delay are dropped

use arrow::array::{Array, ArrayRef, BooleanArray, Float64Array};
use arrow::compute::{cast, filter_record_batch};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use flightcache_core::{
    FlightCacheError, Result, ARR_DELAY, CANCELLED, DEP_DELAY, DEST, FL_DATE, OP_CARRIER, ORIGIN,
};
use std::sync::Arc;

/// Schema of a cleaned table
pub fn cleaned_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new(FL_DATE, DataType::Utf8, true),
        Field::new(OP_CARRIER, DataType::Utf8, true),
        Field::new(ORIGIN, DataType::Utf8, true),
        Field::new(DEST, DataType::Utf8, true),
        Field::new(DEP_DELAY, DataType::Float64, true),
        Field::new(ARR_DELAY, DataType::Float64, true),
    ]))
}

fn column(batch: &RecordBatch, name: &str) -> Result<ArrayRef> {
    batch
        .column_by_name(name)
        .cloned()
        .ok_or_else(|| FlightCacheError::ColumnNotFound(name.to_string()))
}

fn as_float(array: &ArrayRef, name: &str) -> Result<Float64Array> {
    let casted = cast(array, &DataType::Float64)?;
    casted
        .as_any()
        .downcast_ref::<Float64Array>()
        .cloned()
        .ok_or_else(|| FlightCacheError::TypeMismatch {
            expected: format!("{} as Float64", name),
            found: casted.data_type().to_string(),
        })
}

/// `NaN` and `inf` parse as floats but count as missing, like an empty cell
fn is_finite(values: &Float64Array, i: usize) -> bool {
    values.is_valid(i) && values.value(i).is_finite()
}

/// Apply the cleaning rules to a raw batch holding the source columns
pub fn clean_flights(raw: &RecordBatch) -> Result<RecordBatch> {
    let text = |name: &str| -> Result<ArrayRef> { Ok(cast(&column(raw, name)?, &DataType::Utf8)?) };

    let dep_delay = as_float(&column(raw, DEP_DELAY)?, DEP_DELAY)?;
    let arr_delay = as_float(&column(raw, ARR_DELAY)?, ARR_DELAY)?;
    let cancelled = as_float(&column(raw, CANCELLED)?, CANCELLED)?;

    let keep: BooleanArray = (0..raw.num_rows())
        .map(|i| {
            let not_cancelled = cancelled.is_valid(i) && cancelled.value(i) == 0.0;
            Some(not_cancelled && is_finite(&dep_delay, i) && is_finite(&arr_delay, i))
        })
        .collect();

    let coerced = RecordBatch::try_new(
        cleaned_schema(),
        vec![
            text(FL_DATE)?,
            text(OP_CARRIER)?,
            text(ORIGIN)?,
            text(DEST)?,
            Arc::new(dep_delay),
            Arc::new(arr_delay),
        ],
    )?;

    Ok(filter_record_batch(&coerced, &keep)?)
}
