//! Autoregressive estimation
//!
//! Yule-Walker estimates are solved with the Levinson-Durbin recursion.
//! They seed the Hannan-Rissanen procedure that produces starting values
//! for ARMA(1,1) maximum likelihood.

use crate::differencing::mean;
use crate::{MathError, Result};

/// Largest magnitude allowed for a starting coefficient
const START_BOUND: f64 = 0.9;

/// Sample autocovariances for lags `0..=max_lag` (biased, divided by `n`)
pub fn autocovariances(data: &[f64], max_lag: usize) -> Result<Vec<f64>> {
    let n = data.len();
    if n <= max_lag {
        return Err(MathError::InsufficientData(format!(
            "Need more than {} observations for lag {}, got {}",
            max_lag, max_lag, n
        )));
    }

    let m = mean(data).unwrap_or(0.0);
    let centered: Vec<f64> = data.iter().map(|x| x - m).collect();

    let acov = (0..=max_lag)
        .map(|k| {
            centered[k..]
                .iter()
                .zip(centered.iter())
                .map(|(a, b)| a * b)
                .sum::<f64>()
                / n as f64
        })
        .collect();

    Ok(acov)
}

/// Estimate AR(`order`) coefficients with the Yule-Walker equations.
///
/// Returns `phi_1..phi_order` for `x_t = sum phi_j x_{t-j} + e_t` on the
/// mean-centred series. A series with no variation yields all zeros.
pub fn yule_walker(data: &[f64], order: usize) -> Result<Vec<f64>> {
    if order == 0 {
        return Ok(Vec::new());
    }

    let acov = autocovariances(data, order)?;
    if acov[0].abs() < 1e-12 {
        return Ok(vec![0.0; order]);
    }

    let mut phi = vec![0.0; order];
    let mut error = acov[0];

    for k in 0..order {
        let mut acc = acov[k + 1];
        for j in 0..k {
            acc -= phi[j] * acov[k - j];
        }
        let reflection = acc / error;

        let previous = phi.clone();
        phi[k] = reflection;
        for j in 0..k {
            phi[j] = previous[j] - reflection * previous[k - 1 - j];
        }

        error *= 1.0 - reflection * reflection;
        if error <= 0.0 {
            return Err(MathError::CalculationError(
                "Levinson-Durbin recursion lost positive definiteness".to_string(),
            ));
        }
    }

    Ok(phi)
}

/// Starting values `(phi, theta)` for an ARMA(1,1) fit on `data`.
///
/// Fits a long autoregression, takes its residuals as proxies for the
/// innovations and regresses `x_t` on `x_{t-1}` and `e_{t-1}` by least
/// squares. Both values are clamped to `[-0.9, 0.9]`; a singular
/// regression falls back to `(0.0, 0.0)`.
pub fn hannan_rissanen_arma11(data: &[f64]) -> Result<(f64, f64)> {
    let n = data.len();
    if n < 6 {
        return Err(MathError::InsufficientData(format!(
            "Need at least 6 observations for ARMA(1,1) start values, got {}",
            n
        )));
    }

    let long_order = (n / 4).clamp(2, 10);
    let ar = yule_walker(data, long_order)?;

    let m = mean(data).unwrap_or(0.0);
    let x: Vec<f64> = data.iter().map(|v| v - m).collect();

    let mut residuals = vec![0.0; n];
    for t in long_order..n {
        let fitted: f64 = ar.iter().enumerate().map(|(j, a)| a * x[t - j - 1]).sum();
        residuals[t] = x[t] - fitted;
    }

    // Normal equations for x_t = phi * x_{t-1} + theta * e_{t-1}
    let (mut s_xx, mut s_xe, mut s_ee, mut s_yx, mut s_ye) = (0.0, 0.0, 0.0, 0.0, 0.0);
    for t in (long_order + 1)..n {
        let lag_x = x[t - 1];
        let lag_e = residuals[t - 1];
        s_xx += lag_x * lag_x;
        s_xe += lag_x * lag_e;
        s_ee += lag_e * lag_e;
        s_yx += x[t] * lag_x;
        s_ye += x[t] * lag_e;
    }

    let det = s_xx * s_ee - s_xe * s_xe;
    if det.abs() < 1e-12 || !det.is_finite() {
        return Ok((0.0, 0.0));
    }

    let phi = (s_ee * s_yx - s_xe * s_ye) / det;
    let theta = (s_xx * s_ye - s_xe * s_yx) / det;

    Ok((clamp_start(phi), clamp_start(theta)))
}

fn clamp_start(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(-START_BOUND, START_BOUND)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ar1_series(phi: f64, n: usize) -> Vec<f64> {
        // Deterministic pseudo-noise from a linear congruential sequence
        let mut state: u64 = 42;
        let mut x = 0.0;
        let mut out = Vec::with_capacity(n);
        for _ in 0..n {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            let noise = ((state >> 11) as f64 / (1u64 << 53) as f64) - 0.5;
            x = phi * x + noise;
            out.push(x);
        }
        out
    }

    #[test]
    fn test_autocovariances_lag_zero_is_variance() {
        let data = [1.0, 2.0, 3.0, 4.0];
        let acov = autocovariances(&data, 1).unwrap();
        assert!((acov[0] - 1.25).abs() < 1e-12);
        assert!(autocovariances(&data, 4).is_err());
    }

    #[test]
    fn test_yule_walker_recovers_ar1() {
        let data = ar1_series(0.7, 2000);
        let phi = yule_walker(&data, 1).unwrap();
        assert!((phi[0] - 0.7).abs() < 0.1, "phi = {}", phi[0]);
    }

    #[test]
    fn test_yule_walker_constant_series() {
        let phi = yule_walker(&[5.0; 20], 2).unwrap();
        assert_eq!(phi, vec![0.0, 0.0]);
    }

    #[test]
    fn test_hannan_rissanen_bounds() {
        let data = ar1_series(0.5, 300);
        let (phi, theta) = hannan_rissanen_arma11(&data).unwrap();
        assert!(phi.abs() <= 0.9);
        assert!(theta.abs() <= 0.9);
        assert!(phi > 0.0);
    }

    #[test]
    fn test_hannan_rissanen_short_input() {
        assert!(hannan_rissanen_arma11(&[1.0, 2.0, 3.0]).is_err());
    }
}
