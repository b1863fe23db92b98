use crate::clean::clean_flights;
use crate::source::TableSource;
use crate::table::FlightTable;
use arrow::compute::concat_batches;
use arrow::csv::reader::Format;
use arrow::csv::ReaderBuilder;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use flightcache_core::{FlightCacheError, Result, SOURCE_COLUMNS};
use std::fs::File;
use std::io::Seek;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

const DEFAULT_BATCH_SIZE: usize = 64 * 1024;

/// Flight table read from a delimited text file with a header row.
///
/// Only the source columns are read. Every column is read as text so that
/// malformed values reach the cleaning rules instead of failing the parse.
#[derive(Debug, Clone)]
pub struct CsvFlightSource {
    path: PathBuf,
    batch_size: usize,
}

impl CsvFlightSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the source columns without cleaning them
    pub fn read_raw(&self) -> Result<RecordBatch> {
        let mut file = File::open(&self.path).map_err(|e| {
            FlightCacheError::LoadError(format!("cannot open {}: {}", self.path.display(), e))
        })?;

        let (header, _) = Format::default()
            .with_header(true)
            .infer_schema(&mut file, Some(1))?;
        file.rewind()?;

        let as_text = Schema::new(
            header
                .fields()
                .iter()
                .map(|f| Field::new(f.name(), DataType::Utf8, true))
                .collect::<Vec<_>>(),
        );
        let projection = SOURCE_COLUMNS
            .iter()
            .map(|name| {
                as_text
                    .index_of(name)
                    .map_err(|_| FlightCacheError::ColumnNotFound(name.to_string()))
            })
            .collect::<Result<Vec<_>>>()?;
        let projected = Arc::new(as_text.project(&projection)?);

        let reader = ReaderBuilder::new(Arc::new(as_text))
            .with_header(true)
            .with_batch_size(self.batch_size)
            .with_projection(projection)
            .build(file)?;

        let batches = reader.collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(concat_batches(&projected, &batches)?)
    }

    fn read_and_clean(&self) -> Result<(usize, FlightTable)> {
        let raw = self.read_raw()?;
        let table = FlightTable::try_new(clean_flights(&raw)?)?;
        Ok((raw.num_rows(), table))
    }
}

impl TableSource for CsvFlightSource {
    fn load(&self) -> Result<FlightTable> {
        info!(path = %self.path.display(), "Loading data");
        let start = Instant::now();

        match self.read_and_clean() {
            Ok((raw_rows, table)) => {
                info!(
                    path = %self.path.display(),
                    raw_rows,
                    rows = table.num_rows(),
                    elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Data loaded successfully"
                );
                Ok(table)
            }
            Err(e) => {
                error!(path = %self.path.display(), error = %e, "Error loading data");
                Err(e)
            }
        }
    }
}
