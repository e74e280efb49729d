//! Deadline-bounded execution of fits
//!
//! A fit runs on a dedicated thread; the caller waits at most the given
//! duration for its result. A fit that overruns keeps running until it
//! finishes but its result is discarded.

use crate::data::PriceSeries;
use crate::engine::ForecastEngine;
use crate::error::{ForecastError, Result};
use crate::models::{FittedModel, ForecastResult, TrainedForecastModel};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;
use tracing::warn;

/// Run `f` on a worker thread, giving up after `timeout`
pub fn run_with_timeout<T, F>(f: F, timeout: Duration) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    if timeout.is_zero() {
        return Err(ForecastError::Timeout(timeout));
    }

    let (tx, rx) = mpsc::sync_channel(1);
    thread::Builder::new()
        .name("price-forecast-fit".to_string())
        .spawn(move || {
            // The receiver is gone once the caller has timed out
            let _ = tx.send(f());
        })?;

    match rx.recv_timeout(timeout) {
        Ok(result) => result,
        Err(RecvTimeoutError::Timeout) => {
            warn!(timeout_ms = timeout.as_millis() as u64, "fit exceeded its deadline");
            Err(ForecastError::Timeout(timeout))
        }
        Err(RecvTimeoutError::Disconnected) => Err(ForecastError::FitError(
            "Fit worker stopped without producing a result".to_string(),
        )),
    }
}

/// Fit `series` with `engine`, failing with `Timeout` past the deadline
pub fn fit_with_timeout(
    engine: &ForecastEngine,
    series: &PriceSeries,
    window: Option<usize>,
    timeout: Duration,
) -> Result<FittedModel> {
    let engine = engine.clone();
    let series = series.clone();
    run_with_timeout(move || engine.fit_with(&series, window), timeout)
}

/// Fit and forecast `horizon` days, failing with `Timeout` past the deadline.
///
/// The horizon is checked before any work is started.
pub fn forecast_with_timeout(
    engine: &ForecastEngine,
    series: &PriceSeries,
    horizon: i64,
    window: Option<usize>,
    timeout: Duration,
) -> Result<ForecastResult> {
    let horizon = engine.horizon(horizon)?;
    let engine = engine.clone();
    let series = series.clone();
    run_with_timeout(
        move || engine.fit_with(&series, window)?.forecast(horizon),
        timeout,
    )
}
