//! Forecasting models and forecast records

use crate::data::PriceSeries;
use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::io::Write;

pub mod arima;

pub use arima::{ArimaModel, ArimaOrder, FittedModel};

/// Two-sided confidence level of every forecast band
pub const CONFIDENCE_LEVEL: f64 = 0.95;

/// Number of days to forecast, validated against a maximum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Horizon(usize);

impl Horizon {
    /// Accept `value` if it lies in `1..=max`
    pub fn new(value: i64, max: usize) -> Result<Self> {
        match usize::try_from(value) {
            Ok(h) if h >= 1 && h <= max => Ok(Self(h)),
            _ => Err(ForecastError::InvalidHorizon {
                horizon: value,
                max,
            }),
        }
    }

    pub fn get(self) -> usize {
        self.0
    }
}

/// Forecast for a single future day
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    /// Calendar date, serialised as ISO-8601
    pub date: NaiveDate,
    /// Point forecast
    pub predicted: f64,
    /// Lower bound of the confidence band
    pub lower_bound: f64,
    /// Upper bound of the confidence band
    pub upper_bound: f64,
    /// Half the band width as a percentage of the prediction; `None` when
    /// the prediction is zero
    pub error_margin_pct: Option<f64>,
}

impl ForecastPoint {
    /// Build a point, deriving the error margin from the bounds
    pub fn new(date: NaiveDate, predicted: f64, lower_bound: f64, upper_bound: f64) -> Self {
        Self {
            date,
            predicted,
            lower_bound,
            upper_bound,
            error_margin_pct: error_margin_pct(predicted, lower_bound, upper_bound),
        }
    }

    /// Width of the confidence band
    pub fn band_width(&self) -> f64 {
        self.upper_bound - self.lower_bound
    }
}

/// `(upper - lower) / 2 / predicted * 100`, undefined for a zero prediction
pub fn error_margin_pct(predicted: f64, lower: f64, upper: f64) -> Option<f64> {
    if predicted == 0.0 {
        return None;
    }
    Some((upper - lower) / 2.0 / predicted * 100.0)
}

/// Daily forecast following the last observed date
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastResult {
    /// One point per forecast day
    points: Vec<ForecastPoint>,
    /// Order of the model that produced the forecast
    order: ArimaOrder,
    /// Confidence level of the bands
    confidence_level: f64,
    /// Observations the model was fitted on
    observations: usize,
}

impl ForecastResult {
    /// Create a forecast result.
    ///
    /// Points must be on consecutive days and satisfy
    /// `lower_bound <= predicted <= upper_bound`.
    pub fn new(
        points: Vec<ForecastPoint>,
        order: ArimaOrder,
        confidence_level: f64,
        observations: usize,
    ) -> Result<Self> {
        if let Some(w) = points
            .windows(2)
            .find(|w| w[0].date.succ_opt() != Some(w[1].date))
        {
            return Err(ForecastError::InvalidParameter(format!(
                "Forecast dates must be consecutive days: {} is followed by {}",
                w[0].date, w[1].date
            )));
        }

        if let Some(p) = points
            .iter()
            .find(|p| !(p.lower_bound <= p.predicted && p.predicted <= p.upper_bound))
        {
            return Err(ForecastError::InvalidParameter(format!(
                "Forecast for {} violates lower <= predicted <= upper ({} <= {} <= {})",
                p.date, p.lower_bound, p.predicted, p.upper_bound
            )));
        }

        Ok(Self {
            points,
            order,
            confidence_level,
            observations,
        })
    }

    pub fn points(&self) -> &[ForecastPoint] {
        &self.points
    }

    /// Number of forecast days
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn order(&self) -> ArimaOrder {
        self.order
    }

    pub fn confidence_level(&self) -> f64 {
        self.confidence_level
    }

    pub fn observations(&self) -> usize {
        self.observations
    }

    /// First forecast date
    pub fn start_date(&self) -> Option<NaiveDate> {
        self.points.first().map(|p| p.date)
    }

    /// Serialise the records as a JSON array
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.points)?)
    }

    /// Write the records as CSV with a header row
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        for point in &self.points {
            csv_writer.serialize(point)?;
        }
        csv_writer.flush()?;
        Ok(())
    }
}

/// Fitted model able to project future values
pub trait TrainedForecastModel: Debug {
    /// Forecast the days following the fitted series
    fn forecast(&self, horizon: Horizon) -> Result<ForecastResult>;

    /// Name of the model
    fn name(&self) -> &str;
}

/// Forecast model that can be fitted to a price series
pub trait ForecastModel: Debug + Clone {
    /// The type of fitted model produced
    type Trained: TrainedForecastModel;

    /// Fit the model to the whole series
    fn train(&self, series: &PriceSeries) -> Result<Self::Trained>;

    /// Get the name of the model
    fn name(&self) -> &str;
}
