//! Load, fit and forecast in one call, with caching across calls

use crate::cache::{digest_bytes, CacheKey, ForecastCache};
use crate::config::PipelineConfig;
use crate::data::{LoadReport, PriceSeries, SeriesLoader};
use crate::engine::ForecastEngine;
use crate::error::Result;
use crate::models::{FittedModel, ForecastResult, TrainedForecastModel};
use crate::worker::fit_with_timeout;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info};

/// Everything a front end shows for one request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineOutput {
    /// Loaded series and skipped-row accounting
    pub report: LoadReport,
    /// Recent history shown next to the forecast
    pub history: PriceSeries,
    pub forecast: ForecastResult,
    /// Whether the forecast came from the cache
    pub cache_hit: bool,
}

/// Stateful loader, engine and cache bound to one configuration
#[derive(Debug)]
pub struct Pipeline {
    config: PipelineConfig,
    loader: SeriesLoader,
    engine: ForecastEngine,
    cache: ForecastCache,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Result<Self> {
        let engine = ForecastEngine::new(&config)?;
        Ok(Self {
            loader: SeriesLoader::with_policy(config.load_policy),
            engine,
            cache: ForecastCache::new(),
            config,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn engine(&self) -> &ForecastEngine {
        &self.engine
    }

    pub fn cache(&self) -> &ForecastCache {
        &self.cache
    }

    /// Parse CSV bytes with the configured policy
    pub fn load(&self, bytes: &[u8]) -> Result<LoadReport> {
        self.loader.load(bytes)
    }

    /// Fit honouring the configured deadline
    pub fn fit(&self, series: &PriceSeries, window: Option<usize>) -> Result<FittedModel> {
        fit_bounded(&self.engine, series, window, self.config.fit_timeout())
    }

    /// Fit and forecast a loaded series without touching the cache
    pub fn forecast(
        &self,
        series: &PriceSeries,
        horizon: i64,
        window: Option<usize>,
    ) -> Result<ForecastResult> {
        let horizon = self.engine.horizon(horizon)?;
        let fitted = self.fit(series, window)?;
        fitted.forecast(horizon)
    }

    /// Load `bytes` and forecast `horizon` days.
    ///
    /// A repeated request for the same bytes, horizon and window is served
    /// from the cache; a new horizon on known bytes reuses the fitted model.
    pub fn run(
        &mut self,
        bytes: &[u8],
        horizon: i64,
        window: Option<usize>,
    ) -> Result<PipelineOutput> {
        let horizon = self.engine.horizon(horizon)?;
        let report = self.loader.load(bytes)?;
        let history = report.series.last_days(self.config.history_days)?;

        let key = CacheKey {
            input: digest_bytes(bytes),
            horizon,
            order: self.engine.order(),
            window,
        };

        let engine = &self.engine;
        let timeout = self.config.fit_timeout();
        let series = &report.series;
        let fitted = self
            .cache
            .get_or_try_insert_model_with(key.model_key(), || {
                fit_bounded(engine, series, window, timeout)
            })?
            .clone();

        let mut cache_hit = true;
        let forecast = self
            .cache
            .get_or_try_insert_with(key, || {
                cache_hit = false;
                fitted.forecast(horizon)
            })?
            .clone();

        if cache_hit {
            debug!(horizon = horizon.get(), "served forecast from cache");
        } else {
            info!(
                horizon = horizon.get(),
                observations = series.len(),
                cached_models = self.cache.stats().models,
                "pipeline run complete"
            );
        }

        Ok(PipelineOutput {
            report,
            history,
            forecast,
            cache_hit,
        })
    }

    /// Forget every cached result derived from `bytes`
    pub fn invalidate(&mut self, bytes: &[u8]) -> usize {
        self.cache.invalidate(&digest_bytes(bytes))
    }
}

fn fit_bounded(
    engine: &ForecastEngine,
    series: &PriceSeries,
    window: Option<usize>,
    timeout: Option<Duration>,
) -> Result<FittedModel> {
    match timeout {
        Some(timeout) => fit_with_timeout(engine, series, window, timeout),
        None => engine.fit_with(series, window),
    }
}
