//! ARIMA models for price forecasting
//!
//! Only the (1,1,1) order is estimated. The series is differenced once and
//! an ARMA(1,1) without constant is fitted to the differences by exact
//! Gaussian maximum likelihood, evaluated with a Kalman filter and
//! maximised by a fixed-start Nelder-Mead search. Forecast variances are
//! propagated through the state space augmented with the price level.

use crate::data::PriceSeries;
use crate::error::{ForecastError, Result};
use crate::models::{
    ForecastModel, ForecastPoint, ForecastResult, Horizon, TrainedForecastModel, CONFIDENCE_LEVEL,
};
use crate::utils::future_dates;
use chrono::NaiveDate;
use forecast_math::{
    difference, hannan_rissanen_arma11, variance, Arma11, FilteredState, NelderMead,
};
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};
use std::fmt;
use tracing::{debug, warn};

/// Fewest observations any fit accepts
pub const MIN_OBSERVATIONS: usize = 10;

/// `(p, d, q)` order of an ARIMA model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArimaOrder {
    pub p: usize,
    pub d: usize,
    pub q: usize,
}

impl ArimaOrder {
    /// The only supported order: one AR lag, one difference, one MA lag
    pub const ONE_ONE_ONE: ArimaOrder = ArimaOrder { p: 1, d: 1, q: 1 };

    /// Create an order, rejecting anything other than (1,1,1)
    pub fn new(p: usize, d: usize, q: usize) -> Result<Self> {
        let order = Self { p, d, q };
        if order != Self::ONE_ONE_ONE {
            return Err(ForecastError::InvalidParameter(format!(
                "Unsupported model order {}; only ARIMA(1,1,1) is available",
                order
            )));
        }
        Ok(order)
    }
}

impl Default for ArimaOrder {
    fn default() -> Self {
        Self::ONE_ONE_ONE
    }
}

impl fmt::Display for ArimaOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ARIMA({},{},{})", self.p, self.d, self.q)
    }
}

/// ARIMA(1,1,1) model specification
#[derive(Debug, Clone)]
pub struct ArimaModel {
    /// Name of the model
    name: String,
    /// Model order
    order: ArimaOrder,
    /// Fewest observations accepted by `train`
    min_observations: usize,
    /// Likelihood maximiser
    optimizer: NelderMead,
}

impl ArimaModel {
    /// Create a model of the given order
    pub fn new(order: ArimaOrder) -> Result<Self> {
        let order = ArimaOrder::new(order.p, order.d, order.q)?;
        Ok(Self {
            name: order.to_string(),
            order,
            min_observations: MIN_OBSERVATIONS,
            optimizer: NelderMead::new().with_max_iterations(1000),
        })
    }

    /// Require at least `n` observations, never fewer than [`MIN_OBSERVATIONS`]
    pub fn with_min_observations(mut self, n: usize) -> Result<Self> {
        if n < MIN_OBSERVATIONS {
            return Err(ForecastError::InvalidParameter(format!(
                "Minimum observations must be at least {}, got {}",
                MIN_OBSERVATIONS, n
            )));
        }
        self.min_observations = n;
        Ok(self)
    }

    pub fn order(&self) -> ArimaOrder {
        self.order
    }

    pub fn min_observations(&self) -> usize {
        self.min_observations
    }
}

impl ForecastModel for ArimaModel {
    type Trained = FittedModel;

    fn train(&self, series: &PriceSeries) -> Result<FittedModel> {
        let prices = series.prices();
        if prices.len() < self.min_observations {
            return Err(ForecastError::FitError(format!(
                "Insufficient data for {}. Need at least {} observations, got {}.",
                self.name,
                self.min_observations,
                prices.len()
            )));
        }

        if let Some(bad) = prices.iter().find(|p| !p.is_finite()) {
            return Err(ForecastError::FitError(format!(
                "Series contains a non-finite price ({})",
                bad
            )));
        }

        let diffs = difference(prices, self.order.d)?;
        let spread = variance(&diffs).unwrap_or(0.0);
        let scale = diffs.iter().map(|x| x * x).sum::<f64>() / diffs.len() as f64;
        if spread <= 1e-12 * (1.0 + scale) {
            return Err(ForecastError::FitError(
                "Differenced series has no variation; the likelihood is degenerate".to_string(),
            ));
        }

        let (phi0, theta0) = hannan_rissanen_arma11(&diffs)?;
        let start = [Arma11::unconstrain(phi0), Arma11::unconstrain(theta0)];
        debug!(phi0, theta0, "starting values");

        let objective = |u: &[f64]| {
            Arma11::from_unconstrained(u[0], u[1])
                .and_then(|params| params.filter(&diffs))
                .and_then(|out| out.concentrated_loglik())
                .map(|ll| -ll)
                .unwrap_or(f64::INFINITY)
        };

        let minimum = self.optimizer.minimize(objective, &start)?;
        if !minimum.converged {
            warn!(
                iterations = minimum.iterations,
                "maximum likelihood search stopped before converging"
            );
        }

        let params = Arma11::from_unconstrained(minimum.point[0], minimum.point[1])?;
        let filtered = params.filter(&diffs)?;
        let sigma2 = filtered.sigma2();
        let log_likelihood = filtered.concentrated_loglik()?;

        debug!(
            phi = params.phi(),
            theta = params.theta(),
            sigma2,
            log_likelihood,
            iterations = minimum.iterations,
            "fitted {}",
            self.name
        );

        Ok(FittedModel {
            name: self.name.clone(),
            order: self.order,
            params,
            sigma2,
            log_likelihood,
            end_state: filtered.end,
            last_date: series.last_date(),
            last_price: series.last_price(),
            observations: prices.len(),
            series_digest: series.digest(),
            iterations: minimum.iterations,
            converged: minimum.converged,
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// ARIMA(1,1,1) fitted to a specific price series
///
/// Holds everything needed to forecast any horizon without refitting.
#[derive(Debug, Clone, PartialEq)]
pub struct FittedModel {
    /// Name of the model
    name: String,
    /// Model order
    order: ArimaOrder,
    /// Estimated AR and MA coefficients
    params: Arma11,
    /// Estimated innovation variance
    sigma2: f64,
    /// Maximised log-likelihood of the differenced series
    log_likelihood: f64,
    /// Filter state after the last observation
    end_state: FilteredState,
    /// Date of the last fitted observation
    last_date: NaiveDate,
    /// Last fitted price, the level forecasts integrate from
    last_price: f64,
    /// Number of observations fitted
    observations: usize,
    /// Fingerprint of the fitted series
    series_digest: [u8; 32],
    /// Optimiser iterations used
    iterations: usize,
    /// Whether the optimiser met its tolerances
    converged: bool,
}

impl FittedModel {
    pub fn order(&self) -> ArimaOrder {
        self.order
    }

    /// Estimated AR(1) coefficient
    pub fn ar_coefficient(&self) -> f64 {
        self.params.phi()
    }

    /// Estimated MA(1) coefficient
    pub fn ma_coefficient(&self) -> f64 {
        self.params.theta()
    }

    /// Estimated innovation variance
    pub fn sigma2(&self) -> f64 {
        self.sigma2
    }

    pub fn log_likelihood(&self) -> f64 {
        self.log_likelihood
    }

    /// Akaike information criterion, counting AR, MA and variance terms
    pub fn aic(&self) -> f64 {
        -2.0 * self.log_likelihood + 2.0 * 3.0
    }

    pub fn observations(&self) -> usize {
        self.observations
    }

    pub fn last_date(&self) -> NaiveDate {
        self.last_date
    }

    pub fn converged(&self) -> bool {
        self.converged
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Whether this model was fitted to exactly `series`
    pub fn is_fitted_to(&self, series: &PriceSeries) -> bool {
        self.series_digest == series.digest()
    }
}

impl TrainedForecastModel for FittedModel {
    fn forecast(&self, horizon: Horizon) -> Result<ForecastResult> {
        let steps = horizon.get();
        let dates = future_dates(self.last_date, steps).ok_or_else(|| {
            ForecastError::InvalidParameter(format!(
                "Forecast of {} days past {} leaves the calendar range",
                steps, self.last_date
            ))
        })?;

        let moments = self.params.forecast_integrated(
            &self.end_state,
            self.last_price,
            self.sigma2,
            steps,
        );

        let z = Normal::new(0.0, 1.0)?.inverse_cdf(0.5 + CONFIDENCE_LEVEL / 2.0);

        let points = dates
            .into_iter()
            .zip(moments.means.iter().zip(&moments.variances))
            .map(|(date, (&mean, &var))| {
                let half_width = z * var.sqrt();
                ForecastPoint::new(date, mean, mean - half_width, mean + half_width)
            })
            .collect();

        ForecastResult::new(points, self.order, CONFIDENCE_LEVEL, self.observations)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
