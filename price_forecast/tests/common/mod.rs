#![allow(dead_code)]

use chrono::{Days, NaiveDate};
use price_forecast::PriceSeries;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Simulate an ARIMA(1,1,1) path of `n` daily prices starting at `start`
pub fn simulate_arima(n: usize, phi: f64, theta: f64, sigma: f64, seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let noise = Normal::new(0.0, sigma).unwrap();

    let mut prices = Vec::with_capacity(n);
    let mut level = 80.0;
    let mut prev_diff = 0.0;
    let mut prev_eps = 0.0;
    for _ in 0..n {
        let eps = noise.sample(&mut rng);
        let diff = phi * prev_diff + eps + theta * prev_eps;
        level += diff;
        prices.push(level);
        prev_diff = diff;
        prev_eps = eps;
    }
    prices
}

/// Daily series starting 2024-01-01
pub fn series_from(prices: &[f64]) -> PriceSeries {
    let start = date(2024, 1, 1);
    let points = prices
        .iter()
        .enumerate()
        .map(|(i, &p)| (start + Days::new(i as u64), p))
        .collect();
    PriceSeries::new(points).unwrap()
}

pub fn simulated_series(n: usize, seed: u64) -> PriceSeries {
    series_from(&simulate_arima(n, 0.5, 0.3, 1.0, seed))
}

/// Render a series as a `data,preco` CSV with day-first dates and comma decimals
pub fn to_csv(series: &PriceSeries) -> Vec<u8> {
    let mut out = String::from("data,preco\n");
    for (d, p) in series.iter() {
        let price = format!("{:.4}", p).replace('.', ",");
        out.push_str(&format!("{},\"{}\"\n", d.format("%d/%m/%Y"), price));
    }
    out.into_bytes()
}
