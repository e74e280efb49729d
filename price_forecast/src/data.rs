//! Price series handling and CSV loading

use crate::error::{ForecastError, Result};
use crate::utils::{date_parser, parse_decimal_comma};
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

/// Name of the date column in input files
pub const DATE_COLUMN: &str = "data";
/// Name of the price column in input files
pub const PRICE_COLUMN: &str = "preco";

/// Chronologically ordered daily prices with unique dates
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceSeries {
    /// Observation dates, strictly increasing
    dates: Vec<NaiveDate>,
    /// Price for each date
    prices: Vec<f64>,
}

impl PriceSeries {
    /// Create a series from observations already in date order.
    ///
    /// Fails if `points` is empty or the dates are not strictly increasing.
    pub fn new(points: Vec<(NaiveDate, f64)>) -> Result<Self> {
        if points.is_empty() {
            return Err(ForecastError::EmptyInput { skipped: 0 });
        }

        if let Some(pair) = points.windows(2).find(|w| w[1].0 <= w[0].0) {
            return Err(ForecastError::InvalidParameter(format!(
                "Dates must be strictly increasing: {} is followed by {}",
                pair[0].0, pair[1].0
            )));
        }

        let (dates, prices) = points.into_iter().unzip();
        Ok(Self { dates, prices })
    }

    /// Create a series from observations in any order.
    ///
    /// Later observations for a date replace earlier ones. Returns the series
    /// and how many observations were replaced.
    pub fn from_unordered<I>(points: I) -> Result<(Self, usize)>
    where
        I: IntoIterator<Item = (NaiveDate, f64)>,
    {
        let mut by_date = BTreeMap::new();
        let mut replaced = 0;

        for (date, price) in points {
            match by_date.entry(date) {
                Entry::Vacant(e) => {
                    e.insert(price);
                }
                Entry::Occupied(mut e) => {
                    e.insert(price);
                    replaced += 1;
                }
            }
        }

        let series = Self::new(by_date.into_iter().collect())?;
        Ok((series, replaced))
    }

    /// Number of observations
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    /// A constructed series always holds at least one observation
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn prices(&self) -> &[f64] {
        &self.prices
    }

    pub fn first_date(&self) -> NaiveDate {
        self.dates[0]
    }

    pub fn last_date(&self) -> NaiveDate {
        self.dates[self.dates.len() - 1]
    }

    pub fn last_price(&self) -> f64 {
        self.prices[self.prices.len() - 1]
    }

    /// Iterate over `(date, price)` pairs in date order
    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, f64)> + '_ {
        self.dates.iter().copied().zip(self.prices.iter().copied())
    }

    /// The last `n` observations, or the whole series if it is shorter
    pub fn trailing(&self, n: usize) -> Result<Self> {
        if n == 0 {
            return Err(ForecastError::InvalidParameter(
                "Trailing window must contain at least one observation".to_string(),
            ));
        }
        let start = self.len().saturating_sub(n);
        Ok(self.slice_from(start))
    }

    /// Observations within `days` calendar days of the last date, i.e. the
    /// interval `(last_date - days, last_date]`
    pub fn last_days(&self, days: u64) -> Result<Self> {
        if days == 0 {
            return Err(ForecastError::InvalidParameter(
                "History window must span at least one day".to_string(),
            ));
        }
        let start = match self.last_date().checked_sub_days(Days::new(days)) {
            Some(cutoff) => self.dates.partition_point(|d| *d <= cutoff),
            None => 0,
        };
        Ok(self.slice_from(start))
    }

    /// Observations with `start <= date <= end`, `None` if there are none
    pub fn between(&self, start: NaiveDate, end: NaiveDate) -> Option<Self> {
        let lo = self.dates.partition_point(|d| *d < start);
        let hi = self.dates.partition_point(|d| *d <= end);
        if lo >= hi {
            return None;
        }
        Some(Self {
            dates: self.dates[lo..hi].to_vec(),
            prices: self.prices[lo..hi].to_vec(),
        })
    }

    /// SHA-256 fingerprint of the observations
    pub fn digest(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        for (date, price) in self.iter() {
            hasher.update(date.to_string().as_bytes());
            hasher.update(price.to_bits().to_le_bytes());
        }
        hasher.finalize().into()
    }

    fn slice_from(&self, start: usize) -> Self {
        Self {
            dates: self.dates[start..].to_vec(),
            prices: self.prices[start..].to_vec(),
        }
    }
}

/// How the loader treats rows whose values cannot be parsed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadPolicy {
    /// Skip and record malformed rows
    #[default]
    Lenient,
    /// Abort on the first malformed row
    Strict,
}

/// Why a row was left out of the series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipKind {
    /// The date or price could not be parsed
    Malformed,
    /// A field was absent or empty
    Missing,
}

/// A row that did not make it into the series
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedRow {
    /// 1-based line number in the input
    pub line: u64,
    pub kind: SkipKind,
    pub reason: String,
}

/// Outcome of loading a CSV: the series plus an account of dropped rows
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadReport {
    /// Validated, date-ordered series
    pub series: PriceSeries,
    /// Data rows read, excluding the header
    pub rows_read: usize,
    /// Rows whose date or price failed to parse
    pub skipped_malformed: usize,
    /// Rows with a missing or empty field
    pub skipped_missing: usize,
    /// Earlier rows overwritten by a later row with the same date
    pub duplicates_replaced: usize,
    /// Details of every skipped row
    pub skipped: Vec<SkippedRow>,
}

impl LoadReport {
    /// Total rows excluded from the series
    pub fn skipped_total(&self) -> usize {
        self.skipped_malformed + self.skipped_missing
    }
}

/// Loader for `data,preco` price files
#[derive(Debug, Clone, Copy, Default)]
pub struct SeriesLoader {
    policy: LoadPolicy,
}

impl SeriesLoader {
    /// Create a lenient loader
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a loader with the given policy
    pub fn with_policy(policy: LoadPolicy) -> Self {
        Self { policy }
    }

    /// Load a CSV file from disk
    pub fn load_path<P: AsRef<Path>>(&self, path: P) -> Result<LoadReport> {
        let file = File::open(path)?;
        self.load_reader(file)
    }

    /// Load CSV content from any reader
    pub fn load_reader<R: Read>(&self, mut reader: R) -> Result<LoadReport> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        self.load(&bytes)
    }

    /// Parse raw CSV bytes into a series.
    ///
    /// The header must name the `data` and `preco` columns. Dates are
    /// day-first and prices use a comma as decimal separator, so decimal
    /// prices are quoted.
    pub fn load(&self, bytes: &[u8]) -> Result<LoadReport> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(bytes);

        let headers = reader.headers()?.clone();
        if headers.is_empty() {
            return Err(ForecastError::EmptyInput { skipped: 0 });
        }
        let date_idx = column_index(&headers, DATE_COLUMN)?;
        let price_idx = column_index(&headers, PRICE_COLUMN)?;

        let mut points = Vec::new();
        let mut skipped = Vec::new();
        let mut rows_read = 0;

        for (idx, result) in reader.records().enumerate() {
            rows_read += 1;
            // Header occupies line 1
            let fallback_line = idx as u64 + 2;

            let record = match result {
                Ok(record) => record,
                Err(err) => {
                    let line = err
                        .position()
                        .map(|p| p.line())
                        .unwrap_or(fallback_line);
                    self.reject(&mut skipped, line, SkipKind::Malformed, err.to_string())?;
                    continue;
                }
            };
            let line = record
                .position()
                .map(|p| p.line())
                .unwrap_or(fallback_line);

            let (raw_date, raw_price) = match (record.get(date_idx), record.get(price_idx)) {
                (Some(d), Some(p)) if !d.is_empty() && !p.is_empty() => (d, p),
                _ => {
                    self.reject(
                        &mut skipped,
                        line,
                        SkipKind::Missing,
                        "missing date or price".to_string(),
                    )?;
                    continue;
                }
            };

            let Some(date) = date_parser::parse_date(raw_date) else {
                self.reject(
                    &mut skipped,
                    line,
                    SkipKind::Malformed,
                    format!("invalid date '{}'", raw_date),
                )?;
                continue;
            };

            let Some(price) = parse_decimal_comma(raw_price) else {
                self.reject(
                    &mut skipped,
                    line,
                    SkipKind::Malformed,
                    format!("invalid price '{}'", raw_price),
                )?;
                continue;
            };

            points.push((date, price));
        }

        let skipped_malformed = skipped
            .iter()
            .filter(|s| s.kind == SkipKind::Malformed)
            .count();
        let skipped_missing = skipped.len() - skipped_malformed;

        if points.is_empty() {
            return Err(ForecastError::EmptyInput {
                skipped: skipped.len(),
            });
        }

        let (series, duplicates_replaced) = PriceSeries::from_unordered(points)?;
        if duplicates_replaced > 0 {
            debug!(duplicates_replaced, "duplicate dates resolved, last value kept");
        }

        info!(
            rows_read,
            observations = series.len(),
            skipped_malformed,
            skipped_missing,
            duplicates_replaced,
            first = %series.first_date(),
            last = %series.last_date(),
            "loaded price series"
        );

        Ok(LoadReport {
            series,
            rows_read,
            skipped_malformed,
            skipped_missing,
            duplicates_replaced,
            skipped,
        })
    }

    /// Record a skipped row, or fail if the policy is strict and the row is
    /// malformed
    fn reject(
        &self,
        skipped: &mut Vec<SkippedRow>,
        line: u64,
        kind: SkipKind,
        reason: String,
    ) -> Result<()> {
        if self.policy == LoadPolicy::Strict && kind == SkipKind::Malformed {
            return Err(ForecastError::ParseError {
                line,
                message: reason,
            });
        }
        warn!(line, ?kind, %reason, "skipping row");
        skipped.push(SkippedRow { line, kind, reason });
        Ok(())
    }
}

fn column_index(headers: &csv::StringRecord, name: &str) -> Result<usize> {
    headers
        .iter()
        .position(|h| h == name)
        .ok_or_else(|| ForecastError::MissingColumn(name.to_string()))
}
