//! # Price Forecast
//!
//! A Rust library for loading daily commodity prices and forecasting them
//! with an ARIMA(1,1,1) model.
//!
//! ## Features
//!
//! - CSV loading of `data,preco` files with day-first dates and comma decimals
//! - Exact maximum-likelihood ARIMA(1,1,1) estimation
//! - Daily forecasts with 95% confidence bands and a per-day error margin
//! - Full-history or trailing-window fits
//! - Session cache keyed by input content, with optional fit deadlines
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use price_forecast::data::SeriesLoader;
//! use price_forecast::{ForecastEngine, PipelineConfig};
//!
//! // Load data
//! let report = SeriesLoader::new().load_path("brent.csv")?;
//! println!("{} rows skipped", report.skipped_total());
//!
//! // Forecast the next 30 days
//! let engine = ForecastEngine::new(&PipelineConfig::default())?;
//! let forecast = engine.forecast(&report.series, 30)?;
//!
//! for point in forecast.points() {
//!     println!(
//!         "{} {:.2} [{:.2}, {:.2}]",
//!         point.date, point.predicted, point.lower_bound, point.upper_bound
//!     );
//! }
//! # Ok::<(), price_forecast::ForecastError>(())
//! ```

pub mod cache;
pub mod config;
pub mod data;
pub mod engine;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod utils;
pub mod worker;

// Re-export commonly used types
pub use crate::cache::{CacheKey, ForecastCache};
pub use crate::config::PipelineConfig;
pub use crate::data::{LoadPolicy, LoadReport, PriceSeries, SeriesLoader};
pub use crate::engine::ForecastEngine;
pub use crate::error::{ForecastError, Result};
pub use crate::models::{
    ArimaModel, ArimaOrder, FittedModel, ForecastModel, ForecastPoint, ForecastResult, Horizon,
    TrainedForecastModel,
};
pub use crate::pipeline::{Pipeline, PipelineOutput};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Load CSV bytes leniently
pub fn load(bytes: &[u8]) -> Result<LoadReport> {
    SeriesLoader::new().load(bytes)
}

/// Forecast `horizon` days with the default configuration, fitting on the
/// last `window` observations when given
pub fn forecast(
    series: &PriceSeries,
    horizon: i64,
    window: Option<usize>,
) -> Result<ForecastResult> {
    let engine = ForecastEngine::new(&PipelineConfig::default())?;
    match window {
        Some(w) => engine.forecast_window(series, horizon, w),
        None => engine.forecast(series, horizon),
    }
}
