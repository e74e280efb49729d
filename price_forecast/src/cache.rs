//! Caller-owned cache of fitted models and forecasts
//!
//! Entries are keyed by a SHA-256 digest of the raw input bytes together
//! with the model order, the fit window and, for forecasts, the horizon.
//! Nothing is shared between cache instances.

use crate::error::Result;
use crate::models::{ArimaOrder, FittedModel, ForecastResult, Horizon};
use sha2::{Digest, Sha256};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use tracing::trace;

/// SHA-256 digest of an input file
pub type InputDigest = [u8; 32];

/// Digest raw input bytes
pub fn digest_bytes(bytes: &[u8]) -> InputDigest {
    Sha256::digest(bytes).into()
}

/// Identifies a fitted model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModelKey {
    pub input: InputDigest,
    pub order: ArimaOrder,
    /// Trailing window, `None` for the full history
    pub window: Option<usize>,
}

/// Identifies a forecast
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub input: InputDigest,
    pub horizon: Horizon,
    pub order: ArimaOrder,
    /// Trailing window, `None` for the full history
    pub window: Option<usize>,
}

impl CacheKey {
    /// Key of the model this forecast is projected from
    pub fn model_key(&self) -> ModelKey {
        ModelKey {
            input: self.input,
            order: self.order,
            window: self.window,
        }
    }
}

/// Hit and miss counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub forecasts: usize,
    pub models: usize,
}

/// Memoises fits and forecasts for one session
#[derive(Debug, Default)]
pub struct ForecastCache {
    forecasts: HashMap<CacheKey, ForecastResult>,
    models: HashMap<ModelKey, FittedModel>,
    hits: u64,
    misses: u64,
}

impl ForecastCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached forecast for `key`
    pub fn get(&self, key: &CacheKey) -> Option<&ForecastResult> {
        self.forecasts.get(key)
    }

    /// Store a forecast, returning any previous entry
    pub fn insert(&mut self, key: CacheKey, result: ForecastResult) -> Option<ForecastResult> {
        self.forecasts.insert(key, result)
    }

    /// Cached forecast for `key`, computing and storing it on a miss.
    /// A failed computation leaves the cache untouched.
    pub fn get_or_try_insert_with<F>(&mut self, key: CacheKey, compute: F) -> Result<&ForecastResult>
    where
        F: FnOnce() -> Result<ForecastResult>,
    {
        match self.forecasts.entry(key) {
            Entry::Occupied(e) => {
                self.hits += 1;
                trace!(horizon = key.horizon.get(), "forecast cache hit");
                Ok(e.into_mut())
            }
            Entry::Vacant(e) => {
                self.misses += 1;
                let result = compute()?;
                Ok(e.insert(result))
            }
        }
    }

    /// Cached model for `key`
    pub fn model(&self, key: &ModelKey) -> Option<&FittedModel> {
        self.models.get(key)
    }

    /// Store a fitted model, returning any previous entry
    pub fn insert_model(&mut self, key: ModelKey, model: FittedModel) -> Option<FittedModel> {
        self.models.insert(key, model)
    }

    /// Cached model for `key`, fitting and storing it on a miss
    pub fn get_or_try_insert_model_with<F>(&mut self, key: ModelKey, fit: F) -> Result<&FittedModel>
    where
        F: FnOnce() -> Result<FittedModel>,
    {
        match self.models.entry(key) {
            Entry::Occupied(e) => {
                self.hits += 1;
                trace!("model cache hit");
                Ok(e.into_mut())
            }
            Entry::Vacant(e) => {
                self.misses += 1;
                let model = fit()?;
                Ok(e.insert(model))
            }
        }
    }

    /// Drop every entry derived from `input`, returning how many were removed
    pub fn invalidate(&mut self, input: &InputDigest) -> usize {
        let before = self.forecasts.len() + self.models.len();
        self.forecasts.retain(|k, _| &k.input != input);
        self.models.retain(|k, _| &k.input != input);
        before - (self.forecasts.len() + self.models.len())
    }

    /// Drop everything
    pub fn clear(&mut self) {
        self.forecasts.clear();
        self.models.clear();
    }

    /// Number of cached forecasts
    pub fn len(&self) -> usize {
        self.forecasts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forecasts.is_empty() && self.models.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            forecasts: self.forecasts.len(),
            models: self.models.len(),
        }
    }
}
