//! # Price Forecast Workspace
//!
//! Umbrella crate re-exporting the numerical kernels in [`forecast_math`]
//! and the loader, engine and pipeline in [`price_forecast`].
//!
//! ## Example
//!
//! ```
//! use price_forecast_workspace::price_forecast::{load, ForecastError};
//!
//! let csv = "data,preco\n01/01/2024,\"50,00\"\n02/01/2024,\"51,50\"\n";
//! let report = load(csv.as_bytes())?;
//! assert_eq!(report.series.len(), 2);
//! assert_eq!(report.series.last_price(), 51.5);
//! # Ok::<(), ForecastError>(())
//! ```

pub use forecast_math;
pub use price_forecast;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crates_are_reachable() {
        assert_eq!(price_forecast::NAME, "price_forecast");
        assert_eq!(forecast_math::difference(&[1.0, 3.0, 6.0], 1).unwrap(), vec![2.0, 3.0]);
    }
}
