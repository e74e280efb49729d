mod common;

use common::{simulated_series, to_csv};
use pretty_assertions::assert_eq;
use price_forecast::cache::{digest_bytes, CacheKey, ForecastCache};
use price_forecast::{ArimaOrder, ForecastEngine, ForecastError, Horizon, PipelineConfig};

fn key(bytes: &[u8], horizon: i64, window: Option<usize>) -> CacheKey {
    CacheKey {
        input: digest_bytes(bytes),
        horizon: Horizon::new(horizon, 365).unwrap(),
        order: ArimaOrder::ONE_ONE_ONE,
        window,
    }
}

#[test]
fn test_digest_depends_on_bytes() {
    assert_eq!(digest_bytes(b"data,preco\n"), digest_bytes(b"data,preco\n"));
    assert_ne!(digest_bytes(b"data,preco\n"), digest_bytes(b"data,preco\r\n"));
}

#[test]
fn test_get_or_insert_computes_once() {
    let series = simulated_series(60, 1);
    let bytes = to_csv(&series);
    let engine = ForecastEngine::new(&PipelineConfig::default()).unwrap();
    let mut cache = ForecastCache::new();

    let mut calls = 0;
    for _ in 0..3 {
        cache
            .get_or_try_insert_with(key(&bytes, 10, None), || {
                calls += 1;
                engine.forecast(&series, 10)
            })
            .unwrap();
    }

    assert_eq!(calls, 1);
    let stats = cache.stats();
    assert_eq!(stats.hits, 2);
    assert_eq!(stats.misses, 1);
    assert_eq!(cache.len(), 1);
}

#[test]
fn test_failed_computation_is_not_cached() {
    let mut cache = ForecastCache::new();
    let result = cache.get_or_try_insert_with(key(b"x", 5, None), || {
        Err(ForecastError::FitError("no".to_string()))
    });
    assert!(result.is_err());
    assert!(cache.is_empty());
    assert!(cache.get(&key(b"x", 5, None)).is_none());
}

#[test]
fn test_keys_distinguish_horizon_and_window() {
    let series = simulated_series(60, 2);
    let bytes = to_csv(&series);
    let engine = ForecastEngine::new(&PipelineConfig::default()).unwrap();
    let mut cache = ForecastCache::new();

    let full = engine.forecast(&series, 10).unwrap();
    let windowed = engine.forecast_window(&series, 10, 30).unwrap();
    cache.insert(key(&bytes, 10, None), full.clone());
    cache.insert(key(&bytes, 10, Some(30)), windowed.clone());

    assert_eq!(cache.get(&key(&bytes, 10, None)), Some(&full));
    assert_eq!(cache.get(&key(&bytes, 10, Some(30))), Some(&windowed));
    assert!(cache.get(&key(&bytes, 11, None)).is_none());
}

#[test]
fn test_invalidate_only_touches_one_input() {
    let a = simulated_series(60, 3);
    let b = simulated_series(60, 4);
    let (bytes_a, bytes_b) = (to_csv(&a), to_csv(&b));
    let engine = ForecastEngine::new(&PipelineConfig::default()).unwrap();
    let mut cache = ForecastCache::new();

    let key_a = key(&bytes_a, 5, None);
    cache.insert_model(key_a.model_key(), engine.fit(&a).unwrap());
    cache.insert(key_a, engine.forecast(&a, 5).unwrap());
    cache.insert(key(&bytes_b, 5, None), engine.forecast(&b, 5).unwrap());

    assert_eq!(cache.invalidate(&digest_bytes(&bytes_a)), 2);
    assert!(cache.model(&key_a.model_key()).is_none());
    assert!(cache.get(&key(&bytes_b, 5, None)).is_some());

    cache.clear();
    assert!(cache.is_empty());
}

#[test]
fn test_model_entries() {
    let series = simulated_series(60, 5);
    let engine = ForecastEngine::new(&PipelineConfig::default()).unwrap();
    let mut cache = ForecastCache::new();
    let model_key = key(b"input", 1, None).model_key();

    let mut fits = 0;
    for _ in 0..2 {
        let fitted = cache
            .get_or_try_insert_model_with(model_key, || {
                fits += 1;
                engine.fit(&series)
            })
            .unwrap();
        assert!(fitted.is_fitted_to(&series));
    }
    assert_eq!(fits, 1);
    assert_eq!(cache.stats().models, 1);
    assert_eq!(cache.len(), 0);
}
