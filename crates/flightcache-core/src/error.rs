use thiserror::Error;

#[derive(Error, Debug)]
pub enum FlightCacheError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Load error: {0}")]
    LoadError(String),

    #[error("Schema error: {0}")]
    SchemaError(String),

    #[error("Execution error: {0}")]
    ExecutionError(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Arrow error: {0}")]
    ArrowError(#[from] arrow::error::ArrowError),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, FlightCacheError>;
