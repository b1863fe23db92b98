//! Column vocabulary of the flight dataset

use crate::error::FlightCacheError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const FL_DATE: &str = "FL_DATE";
pub const OP_CARRIER: &str = "OP_CARRIER";
pub const ORIGIN: &str = "ORIGIN";
pub const DEST: &str = "DEST";
pub const DEP_DELAY: &str = "DEP_DELAY";
pub const ARR_DELAY: &str = "ARR_DELAY";
pub const CANCELLED: &str = "CANCELLED";

/// Columns read from the raw source, in load order
pub const SOURCE_COLUMNS: [&str; 7] = [
    FL_DATE, OP_CARRIER, ORIGIN, DEST, DEP_DELAY, ARR_DELAY, CANCELLED,
];

/// Which delay measurement a query averages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum DelayColumn {
    #[default]
    Arrival,
    Departure,
}

impl DelayColumn {
    pub fn column_name(&self) -> &'static str {
        match self {
            DelayColumn::Arrival => ARR_DELAY,
            DelayColumn::Departure => DEP_DELAY,
        }
    }
}

impl fmt::Display for DelayColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name())
    }
}

impl FromStr for DelayColumn {
    type Err = FlightCacheError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            ARR_DELAY | "ARRIVAL" | "ARR" => Ok(DelayColumn::Arrival),
            DEP_DELAY | "DEPARTURE" | "DEP" => Ok(DelayColumn::Departure),
            other => Err(FlightCacheError::InvalidParameter(format!(
                "unknown delay column '{}', expected {} or {}",
                other, ARR_DELAY, DEP_DELAY
            ))),
        }
    }
}

/// Which airport a flight is counted against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum AirportRole {
    #[default]
    Origin,
    Destination,
}

impl AirportRole {
    pub fn column_name(&self) -> &'static str {
        match self {
            AirportRole::Origin => ORIGIN,
            AirportRole::Destination => DEST,
        }
    }
}

impl fmt::Display for AirportRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name())
    }
}

impl FromStr for AirportRole {
    type Err = FlightCacheError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            ORIGIN => Ok(AirportRole::Origin),
            DEST | "DESTINATION" => Ok(AirportRole::Destination),
            other => Err(FlightCacheError::InvalidParameter(format!(
                "unknown airport column '{}', expected {} or {}",
                other, ORIGIN, DEST
            ))),
        }
    }
}
