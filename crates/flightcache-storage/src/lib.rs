pub mod clean;
pub mod csv;
pub mod dates;
pub mod memory;
pub mod source;
pub mod table;

pub use clean::clean_flights;
pub use csv::CsvFlightSource;
pub use memory::{FlightRecord, MemoryFlightSource};
pub use source::TableSource;
pub use table::FlightTable;
