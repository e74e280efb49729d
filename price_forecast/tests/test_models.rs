mod common;

use chrono::Days;
use common::{series_from, simulated_series};
use pretty_assertions::assert_eq;
use price_forecast::models::{error_margin_pct, ForecastPoint, CONFIDENCE_LEVEL};
use price_forecast::{
    ArimaModel, ArimaOrder, ForecastError, ForecastModel, ForecastResult, Horizon,
    TrainedForecastModel,
};
use rstest::rstest;

fn model() -> ArimaModel {
    ArimaModel::new(ArimaOrder::ONE_ONE_ONE).unwrap()
}

#[test]
fn test_only_one_one_one_is_supported() {
    assert!(ArimaOrder::new(1, 1, 1).is_ok());
    assert!(matches!(
        ArimaOrder::new(2, 1, 1),
        Err(ForecastError::InvalidParameter(_))
    ));
    assert_eq!(ArimaOrder::default().to_string(), "ARIMA(1,1,1)");
}

#[test]
fn test_min_observations_floor() {
    assert!(model().with_min_observations(9).is_err());
    assert_eq!(model().with_min_observations(50).unwrap().min_observations(), 50);
}

#[test]
fn test_too_few_observations() {
    let series = series_from(&[50.0, 51.5, 52.25]);
    let err = model().train(&series).unwrap_err();
    assert!(matches!(err, ForecastError::FitError(_)));
}

#[test]
fn test_non_finite_price() {
    let mut prices = common::simulate_arima(40, 0.5, 0.3, 1.0, 3);
    prices[20] = f64::NAN;
    let err = model().train(&series_from(&prices)).unwrap_err();
    assert!(matches!(err, ForecastError::FitError(_)));
}

#[rstest]
#[case::constant(vec![70.0; 30])]
#[case::linear((0..30).map(|i| 70.0 + i as f64).collect())]
fn test_degenerate_differences(#[case] prices: Vec<f64>) {
    let err = model().train(&series_from(&prices)).unwrap_err();
    assert!(matches!(err, ForecastError::FitError(_)));
}

#[test]
fn test_fit_recovers_reasonable_parameters() {
    let series = simulated_series(400, 42);
    let fitted = model().train(&series).unwrap();

    assert!(fitted.ar_coefficient().abs() < 1.0);
    assert!(fitted.ma_coefficient().abs() < 1.0);
    assert!(fitted.sigma2() > 0.6 && fitted.sigma2() < 1.6);
    assert!(fitted.log_likelihood().is_finite());
    assert_eq!(fitted.aic(), -2.0 * fitted.log_likelihood() + 6.0);
    assert_eq!(fitted.observations(), 400);
    assert_eq!(fitted.last_date(), series.last_date());
    assert!(fitted.is_fitted_to(&series));
    assert!(!fitted.is_fitted_to(&simulated_series(400, 43)));
    assert!(fitted.converged());
    assert!(fitted.iterations() > 0);
}

#[rstest]
#[case(1)]
#[case(30)]
#[case(365)]
fn test_forecast_shape(#[case] days: i64) {
    let series = simulated_series(120, 7);
    let fitted = model().train(&series).unwrap();
    let forecast = fitted.forecast(Horizon::new(days, 365).unwrap()).unwrap();

    assert_eq!(forecast.len(), days as usize);
    assert_eq!(forecast.confidence_level(), CONFIDENCE_LEVEL);
    assert_eq!(forecast.order(), ArimaOrder::ONE_ONE_ONE);

    let first = series.last_date() + Days::new(1);
    assert_eq!(forecast.start_date(), Some(first));
    for (i, point) in forecast.points().iter().enumerate() {
        assert_eq!(point.date, first + Days::new(i as u64));
        assert!(point.lower_bound <= point.predicted);
        assert!(point.predicted <= point.upper_bound);
    }
}

#[test]
fn test_bands_widen_with_horizon() {
    let fitted = model().train(&simulated_series(200, 11)).unwrap();
    let forecast = fitted.forecast(Horizon::new(60, 365).unwrap()).unwrap();

    let widths: Vec<f64> = forecast.points().iter().map(|p| p.band_width()).collect();
    assert!(widths[0] > 0.0);
    for pair in widths.windows(2) {
        assert!(pair[1] >= pair[0] - 1e-9);
    }
    assert!(widths[59] > widths[0]);
}

#[test]
fn test_band_is_symmetric_normal_interval() {
    let fitted = model().train(&simulated_series(150, 5)).unwrap();
    let forecast = fitted.forecast(Horizon::new(1, 365).unwrap()).unwrap();
    let point = forecast.points()[0];

    let half = (point.upper_bound - point.lower_bound) / 2.0;
    assert!((point.predicted - point.lower_bound - half).abs() < 1e-9);
    // One step ahead the variance is sigma2, so the half width is 1.96 sigma
    let expected = 1.959964 * fitted.sigma2().sqrt();
    assert!((half - expected).abs() < 1e-3 * expected);
}

#[test]
fn test_fit_is_deterministic() {
    let series = simulated_series(150, 21);
    let a = model().train(&series).unwrap();
    let b = model().train(&series).unwrap();
    assert_eq!(a, b);

    let horizon = Horizon::new(30, 365).unwrap();
    assert_eq!(a.forecast(horizon).unwrap(), b.forecast(horizon).unwrap());
}

#[test]
fn test_reused_model_matches_fresh_fit() {
    let series = simulated_series(150, 8);
    let fitted = model().train(&series).unwrap();

    let short = fitted.forecast(Horizon::new(10, 365).unwrap()).unwrap();
    let long = fitted.forecast(Horizon::new(30, 365).unwrap()).unwrap();
    assert_eq!(short.points(), &long.points()[..10]);

    let fresh = model().train(&series).unwrap();
    assert_eq!(fresh.forecast(Horizon::new(30, 365).unwrap()).unwrap(), long);
}

#[test]
fn test_error_margin() {
    assert_eq!(error_margin_pct(100.0, 90.0, 110.0), Some(10.0));
    assert_eq!(error_margin_pct(0.0, -1.0, 1.0), None);

    let fitted = model().train(&simulated_series(100, 2)).unwrap();
    let forecast = fitted.forecast(Horizon::new(5, 365).unwrap()).unwrap();
    for point in forecast.points() {
        let margin = point.error_margin_pct.unwrap();
        let expected = point.band_width() / 2.0 / point.predicted * 100.0;
        assert!((margin - expected).abs() < 1e-9);
    }
}

#[test]
fn test_forecast_result_validation() {
    let d = common::date(2024, 1, 1);
    let gap = vec![
        ForecastPoint::new(d, 1.0, 0.5, 1.5),
        ForecastPoint::new(d + Days::new(2), 1.0, 0.5, 1.5),
    ];
    assert!(ForecastResult::new(gap, ArimaOrder::ONE_ONE_ONE, 0.95, 10).is_err());

    let inverted = vec![ForecastPoint::new(d, 1.0, 1.5, 0.5)];
    assert!(ForecastResult::new(inverted, ArimaOrder::ONE_ONE_ONE, 0.95, 10).is_err());
}

#[test]
fn test_forecast_serialisation() {
    let fitted = model().train(&simulated_series(60, 9)).unwrap();
    let forecast = fitted.forecast(Horizon::new(3, 365).unwrap()).unwrap();

    let json: serde_json::Value = serde_json::from_str(&forecast.to_json().unwrap()).unwrap();
    let records = json.as_array().unwrap();
    assert_eq!(records.len(), 3);
    assert_eq!(
        records[0]["date"],
        serde_json::Value::String(forecast.points()[0].date.to_string())
    );

    let mut csv = Vec::new();
    forecast.write_csv(&mut csv).unwrap();
    let text = String::from_utf8(csv).unwrap();
    let mut lines = text.lines();
    assert_eq!(
        lines.next(),
        Some("date,predicted,lower_bound,upper_bound,error_margin_pct")
    );
    assert_eq!(lines.count(), 3);
}

#[test]
fn test_trait_names() {
    let m = model();
    assert_eq!(ForecastModel::name(&m), "ARIMA(1,1,1)");
    let fitted = m.train(&simulated_series(30, 1)).unwrap();
    assert_eq!(TrainedForecastModel::name(&fitted), "ARIMA(1,1,1)");
}
