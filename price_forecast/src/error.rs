//! Error types for the price_forecast crate

use std::time::Duration;
use thiserror::Error;

/// Custom error types for the price_forecast crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// A CSV row whose date or price could not be parsed
    #[error("Parse error on line {line}: {message}")]
    ParseError { line: u64, message: String },

    /// No valid rows remained after loading
    #[error("No valid rows in input ({skipped} row(s) skipped)")]
    EmptyInput { skipped: usize },

    /// A required CSV column is absent from the header
    #[error("Missing required column '{0}'")]
    MissingColumn(String),

    /// Insufficient or invalid data for model estimation
    #[error("Fit error: {0}")]
    FitError(String),

    /// Horizon outside `1..=max`
    #[error("Invalid horizon {horizon}: must be between 1 and {max}")]
    InvalidHorizon { horizon: i64, max: usize },

    /// Error from invalid parameters
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// The fitting worker did not finish in time
    #[error("Forecast timed out after {0:?}")]
    Timeout(Duration),

    /// Invalid configuration values or files
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Error from IO operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from the CSV reader or writer
    #[error("CSV error: {0}")]
    CsvError(String),

    /// Error from JSON encoding or decoding
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;

impl From<csv::Error> for ForecastError {
    fn from(err: csv::Error) -> Self {
        ForecastError::CsvError(err.to_string())
    }
}

impl From<forecast_math::MathError> for ForecastError {
    fn from(err: forecast_math::MathError) -> Self {
        ForecastError::FitError(err.to_string())
    }
}

impl From<statrs::StatsError> for ForecastError {
    fn from(err: statrs::StatsError) -> Self {
        ForecastError::FitError(err.to_string())
    }
}
