//! # Forecast Math
//!
//! Numerical building blocks used to estimate and project ARIMA models.
//! This crate provides differencing helpers, autoregressive estimation,
//! a derivative-free minimiser and an exact state-space filter for
//! ARMA(1,1) processes.

use thiserror::Error;

pub mod autoregression;
pub mod differencing;
pub mod optimize;
pub mod state_space;

/// Errors that can occur in numerical routines
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),
}

/// Result type for numerical operations
pub type Result<T> = std::result::Result<T, MathError>;

pub use autoregression::{hannan_rissanen_arma11, yule_walker};
pub use differencing::{difference, mean, variance};
pub use optimize::{Minimum, NelderMead};
pub use state_space::{Arma11, FilterOutput, FilteredState, ForecastMoments};
