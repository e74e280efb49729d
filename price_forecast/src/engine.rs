//! Forecast engine: fit ARIMA(1,1,1) and project daily forecasts
//!
//! Two entry points are offered: fitting on the full history and fitting
//! on a trailing window of the most recent observations. Both produce the
//! same kind of [`ForecastResult`], dated from the day after the series'
//! last observation.

use crate::config::PipelineConfig;
use crate::data::PriceSeries;
use crate::error::Result;
use crate::models::{
    ArimaModel, ArimaOrder, FittedModel, ForecastModel, ForecastResult, Horizon,
    TrainedForecastModel,
};
use tracing::{debug, info};

/// Fits models and produces bounded-horizon forecasts
#[derive(Debug, Clone)]
pub struct ForecastEngine {
    /// Model specification shared by every fit
    model: ArimaModel,
    /// Largest accepted horizon
    max_horizon: usize,
}

impl ForecastEngine {
    /// Create an engine from configuration
    pub fn new(config: &PipelineConfig) -> Result<Self> {
        config.validate()?;
        let model = ArimaModel::new(ArimaOrder::ONE_ONE_ONE)?
            .with_min_observations(config.min_observations)?;
        Ok(Self {
            model,
            max_horizon: config.max_horizon,
        })
    }

    pub fn order(&self) -> ArimaOrder {
        self.model.order()
    }

    pub fn max_horizon(&self) -> usize {
        self.max_horizon
    }

    /// Validate a requested horizon
    pub fn horizon(&self, value: i64) -> Result<Horizon> {
        Horizon::new(value, self.max_horizon)
    }

    /// Fit on the full history
    pub fn fit(&self, series: &PriceSeries) -> Result<FittedModel> {
        debug!(observations = series.len(), "fitting on full history");
        self.model.train(series)
    }

    /// Fit on the last `window` observations
    pub fn fit_window(&self, series: &PriceSeries, window: usize) -> Result<FittedModel> {
        let trailing = series.trailing(window)?;
        debug!(
            window,
            observations = trailing.len(),
            "fitting on trailing window"
        );
        self.model.train(&trailing)
    }

    /// Fit on `window` observations when given, otherwise on the full history
    pub fn fit_with(&self, series: &PriceSeries, window: Option<usize>) -> Result<FittedModel> {
        match window {
            Some(w) => self.fit_window(series, w),
            None => self.fit(series),
        }
    }

    /// Forecast `horizon` days from a model fitted on the full history
    pub fn forecast(&self, series: &PriceSeries, horizon: i64) -> Result<ForecastResult> {
        let horizon = self.horizon(horizon)?;
        let fitted = self.fit(series)?;
        self.project(&fitted, horizon)
    }

    /// Forecast `horizon` days from a model fitted on the last `window`
    /// observations
    pub fn forecast_window(
        &self,
        series: &PriceSeries,
        horizon: i64,
        window: usize,
    ) -> Result<ForecastResult> {
        let horizon = self.horizon(horizon)?;
        let fitted = self.fit_window(series, window)?;
        self.project(&fitted, horizon)
    }

    /// Forecast from an already fitted model
    pub fn forecast_fitted(&self, fitted: &FittedModel, horizon: i64) -> Result<ForecastResult> {
        let horizon = self.horizon(horizon)?;
        self.project(fitted, horizon)
    }

    fn project(&self, fitted: &FittedModel, horizon: Horizon) -> Result<ForecastResult> {
        let result = fitted.forecast(horizon)?;
        info!(
            model = %fitted.order(),
            horizon = horizon.get(),
            observations = fitted.observations(),
            phi = fitted.ar_coefficient(),
            theta = fitted.ma_coefficient(),
            converged = fitted.converged(),
            iterations = fitted.iterations(),
            "forecast generated"
        );
        Ok(result)
    }
}
