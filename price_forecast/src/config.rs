//! Pipeline configuration
//!
//! Values come from defaults, an optional JSON file and `PRICE_FORECAST_*`
//! environment variables, applied in that order.

use crate::data::LoadPolicy;
use crate::error::{ForecastError, Result};
use crate::models::arima::MIN_OBSERVATIONS;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Settings shared by the loader, engine and cache
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Largest horizon a caller may request, in days
    pub max_horizon: usize,
    /// Horizon used when the caller gives none
    pub default_horizon: usize,
    /// Fewest observations a fit accepts
    pub min_observations: usize,
    /// Calendar days of history returned alongside a forecast
    pub history_days: u64,
    /// Deadline for a single fit, unbounded when absent
    pub fit_timeout_ms: Option<u64>,
    /// Treatment of malformed rows
    pub load_policy: LoadPolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_horizon: 365,
            default_horizon: 30,
            min_observations: MIN_OBSERVATIONS,
            history_days: 30,
            fit_timeout_ms: None,
            load_policy: LoadPolicy::Lenient,
        }
    }
}

impl PipelineConfig {
    /// Parse a JSON document; absent fields take their defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a JSON configuration file
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Apply `PRICE_FORECAST_*` environment overrides
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any key lookup, e.g. a map in tests
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("PRICE_FORECAST_MAX_HORIZON") {
            self.max_horizon = parse_var("PRICE_FORECAST_MAX_HORIZON", &v)?;
        }
        if let Some(v) = lookup("PRICE_FORECAST_DEFAULT_HORIZON") {
            self.default_horizon = parse_var("PRICE_FORECAST_DEFAULT_HORIZON", &v)?;
        }
        if let Some(v) = lookup("PRICE_FORECAST_MIN_OBSERVATIONS") {
            self.min_observations = parse_var("PRICE_FORECAST_MIN_OBSERVATIONS", &v)?;
        }
        if let Some(v) = lookup("PRICE_FORECAST_HISTORY_DAYS") {
            self.history_days = parse_var("PRICE_FORECAST_HISTORY_DAYS", &v)?;
        }
        if let Some(v) = lookup("PRICE_FORECAST_FIT_TIMEOUT_MS") {
            self.fit_timeout_ms = Some(parse_var("PRICE_FORECAST_FIT_TIMEOUT_MS", &v)?);
        }
        if let Some(v) = lookup("PRICE_FORECAST_LOAD_POLICY") {
            self.load_policy = match v.trim().to_ascii_lowercase().as_str() {
                "lenient" => LoadPolicy::Lenient,
                "strict" => LoadPolicy::Strict,
                other => {
                    return Err(ForecastError::ConfigError(format!(
                        "PRICE_FORECAST_LOAD_POLICY must be 'lenient' or 'strict', got '{}'",
                        other
                    )))
                }
            };
        }

        self.validate()?;
        Ok(self)
    }

    /// Check that every value is in range
    pub fn validate(&self) -> Result<()> {
        if self.max_horizon == 0 {
            return Err(ForecastError::ConfigError(
                "max_horizon must be at least 1".to_string(),
            ));
        }
        if self.default_horizon == 0 || self.default_horizon > self.max_horizon {
            return Err(ForecastError::ConfigError(format!(
                "default_horizon must be between 1 and {}, got {}",
                self.max_horizon, self.default_horizon
            )));
        }
        if self.min_observations < MIN_OBSERVATIONS {
            return Err(ForecastError::ConfigError(format!(
                "min_observations must be at least {}, got {}",
                MIN_OBSERVATIONS, self.min_observations
            )));
        }
        if self.history_days == 0 {
            return Err(ForecastError::ConfigError(
                "history_days must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Fit deadline as a duration
    pub fn fit_timeout(&self) -> Option<Duration> {
        self.fit_timeout_ms.map(Duration::from_millis)
    }
}

fn parse_var<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| {
        ForecastError::ConfigError(format!("{} has an invalid value '{}'", key, value))
    })
}
