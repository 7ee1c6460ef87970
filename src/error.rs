use thiserror::Error;

pub type Result<T> = std::result::Result<T, ProcessingError>;

/// Operational failures. Data-quality defects are reported as
/// [`crate::models::ValidationProblem`] values, never as errors.
#[derive(Error, Debug)]
pub enum ProcessingError {
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Parquet write error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Configuration load error: {0}")]
    ConfigLoad(#[from] config::ConfigError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Ambiguous column for role {role}: {candidates:?}")]
    AmbiguousColumn { role: String, candidates: Vec<String> },

    #[error("Invalid data format: {0}")]
    InvalidFormat(String),
}
