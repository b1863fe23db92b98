pub mod error;
pub mod params;
pub mod types;

pub use error::{FlightCacheError, Result};
pub use params::{ParamValue, QueryParams};
pub use types::*;
