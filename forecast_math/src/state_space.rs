//! Exact state-space filtering for ARMA(1,1) processes
//!
//! The zero-mean process `x_t = phi x_{t-1} + e_t + theta e_{t-1}` is cast in
//! Harvey form with state `[x_t, theta e_t]`:
//!
//! ```text
//! a_{t+1} = T a_t + R e_{t+1},   T = [[phi, 1], [0, 0]],   R = [1, theta]
//! x_t     = Z a_t,               Z = [1, 0]
//! ```
//!
//! The filter runs with unit innovation variance so that the variance can be
//! concentrated out of the Gaussian likelihood. Forecasts of the integrated
//! series augment the state with the level `y_t = y_{t-1} + x_t`.

use crate::{MathError, Result};
use serde::{Deserialize, Serialize};

type Mat2 = [[f64; 2]; 2];
type Mat3 = [[f64; 3]; 3];

/// Stationary, invertible ARMA(1,1) parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Arma11 {
    phi: f64,
    theta: f64,
}

/// Filtered state and covariance after the last observation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FilteredState {
    pub state: [f64; 2],
    /// Unit innovation variance scale
    pub covariance: Mat2,
}

/// Result of running the filter over a series
#[derive(Debug, Clone, PartialEq)]
pub struct FilterOutput {
    /// One-step prediction errors `v_t`
    pub innovations: Vec<f64>,
    /// Prediction error variances `F_t`, in units of the innovation variance
    pub variances: Vec<f64>,
    /// State after the last observation
    pub end: FilteredState,
}

/// Means and variances of multi-step forecasts on the integrated scale
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastMoments {
    pub means: Vec<f64>,
    pub variances: Vec<f64>,
}

impl Arma11 {
    /// Create a parameter set, requiring `|phi| < 1` and `|theta| < 1`
    pub fn new(phi: f64, theta: f64) -> Result<Self> {
        if !(phi.is_finite() && phi.abs() < 1.0) {
            return Err(MathError::InvalidInput(format!(
                "AR coefficient must lie in (-1, 1), got {}",
                phi
            )));
        }
        if !(theta.is_finite() && theta.abs() < 1.0) {
            return Err(MathError::InvalidInput(format!(
                "MA coefficient must lie in (-1, 1), got {}",
                theta
            )));
        }
        Ok(Self { phi, theta })
    }

    /// Map an unconstrained value into `(-1, 1)`
    pub fn constrain(u: f64) -> f64 {
        u / (1.0 + u * u).sqrt()
    }

    /// Inverse of [`Arma11::constrain`]
    pub fn unconstrain(c: f64) -> f64 {
        c / (1.0 - c * c).sqrt()
    }

    /// Build parameters from unconstrained optimiser coordinates
    pub fn from_unconstrained(u_phi: f64, u_theta: f64) -> Result<Self> {
        Self::new(Self::constrain(u_phi), Self::constrain(u_theta))
    }

    pub fn phi(&self) -> f64 {
        self.phi
    }

    pub fn theta(&self) -> f64 {
        self.theta
    }

    fn transition(&self) -> Mat2 {
        [[self.phi, 1.0], [0.0, 0.0]]
    }

    fn selection(&self) -> [f64; 2] {
        [1.0, self.theta]
    }

    /// Unconditional state covariance, solving `P = T P T' + R R'`
    pub fn stationary_covariance(&self) -> Mat2 {
        let (phi, theta) = (self.phi, self.theta);
        let gamma0 = (1.0 + 2.0 * phi * theta + theta * theta) / (1.0 - phi * phi);
        [[gamma0, theta], [theta, theta * theta]]
    }

    /// Run the Kalman filter over a zero-mean series
    pub fn filter(&self, data: &[f64]) -> Result<FilterOutput> {
        if data.is_empty() {
            return Err(MathError::InsufficientData(
                "Cannot filter an empty series".to_string(),
            ));
        }

        let t = self.transition();
        let rrt = outer2(self.selection());

        let mut a = [0.0, 0.0];
        let mut p = self.stationary_covariance();
        let mut innovations = Vec::with_capacity(data.len());
        let mut variances = Vec::with_capacity(data.len());
        let mut state = a;
        let mut covariance = p;

        for &y in data {
            let v = y - a[0];
            let f = p[0][0];
            if !(f.is_finite() && f > 0.0) {
                return Err(MathError::CalculationError(format!(
                    "Prediction variance became {} during filtering",
                    f
                )));
            }

            let gain = [p[0][0] / f, p[1][0] / f];
            state = [a[0] + gain[0] * v, a[1] + gain[1] * v];
            for i in 0..2 {
                for j in 0..2 {
                    covariance[i][j] = p[i][j] - gain[i] * p[0][j];
                }
            }

            innovations.push(v);
            variances.push(f);

            a = mat_vec(&t, &state);
            p = add(&sandwich(&t, &covariance), &rrt);
        }

        Ok(FilterOutput {
            innovations,
            variances,
            end: FilteredState { state, covariance },
        })
    }

    /// Project the integrated series `steps` periods past `last_level`.
    ///
    /// `filtered` must be the end state of [`Arma11::filter`] over the
    /// differences of the series ending at `last_level`; `sigma2` rescales
    /// the unit covariances.
    pub fn forecast_integrated(
        &self,
        filtered: &FilteredState,
        last_level: f64,
        sigma2: f64,
        steps: usize,
    ) -> ForecastMoments {
        let phi = self.phi;
        let t: Mat3 = [[1.0, phi, 1.0], [0.0, phi, 1.0], [0.0, 0.0, 0.0]];
        let rrt = outer3([1.0, 1.0, self.theta]);

        let mut s = [last_level, filtered.state[0], filtered.state[1]];
        let c = filtered.covariance;
        let mut p: Mat3 = [
            [0.0, 0.0, 0.0],
            [0.0, c[0][0], c[0][1]],
            [0.0, c[1][0], c[1][1]],
        ];

        let mut means = Vec::with_capacity(steps);
        let mut variances = Vec::with_capacity(steps);

        for _ in 0..steps {
            s = mat_vec(&t, &s);
            p = add(&sandwich(&t, &p), &rrt);
            means.push(s[0]);
            variances.push((sigma2 * p[0][0]).max(0.0));
        }

        ForecastMoments { means, variances }
    }
}

impl FilterOutput {
    /// Number of filtered observations
    pub fn len(&self) -> usize {
        self.innovations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.innovations.is_empty()
    }

    /// Maximum likelihood estimate of the innovation variance
    pub fn sigma2(&self) -> f64 {
        let n = self.len() as f64;
        self.innovations
            .iter()
            .zip(&self.variances)
            .map(|(v, f)| v * v / f)
            .sum::<f64>()
            / n
    }

    /// Gaussian log-likelihood with the innovation variance concentrated out
    pub fn concentrated_loglik(&self) -> Result<f64> {
        let n = self.len() as f64;
        let sigma2 = self.sigma2();
        if !(sigma2.is_finite() && sigma2 > 0.0) {
            return Err(MathError::CalculationError(format!(
                "Innovation variance estimate is {}",
                sigma2
            )));
        }
        let log_det: f64 = self.variances.iter().map(|f| f.ln()).sum();
        Ok(-0.5 * n * ((2.0 * std::f64::consts::PI).ln() + sigma2.ln() + 1.0) - 0.5 * log_det)
    }
}

fn mat_vec<const N: usize>(m: &[[f64; N]; N], v: &[f64; N]) -> [f64; N] {
    let mut out = [0.0; N];
    for i in 0..N {
        out[i] = (0..N).map(|j| m[i][j] * v[j]).sum();
    }
    out
}

/// `m p m'`
fn sandwich<const N: usize>(m: &[[f64; N]; N], p: &[[f64; N]; N]) -> [[f64; N]; N] {
    let mut mp = [[0.0; N]; N];
    for i in 0..N {
        for j in 0..N {
            mp[i][j] = (0..N).map(|k| m[i][k] * p[k][j]).sum();
        }
    }
    let mut out = [[0.0; N]; N];
    for i in 0..N {
        for j in 0..N {
            out[i][j] = (0..N).map(|k| mp[i][k] * m[j][k]).sum();
        }
    }
    out
}

fn add<const N: usize>(a: &[[f64; N]; N], b: &[[f64; N]; N]) -> [[f64; N]; N] {
    let mut out = *a;
    for i in 0..N {
        for j in 0..N {
            out[i][j] += b[i][j];
        }
    }
    out
}

fn outer2(v: [f64; 2]) -> Mat2 {
    [[v[0] * v[0], v[0] * v[1]], [v[1] * v[0], v[1] * v[1]]]
}

fn outer3(v: [f64; 3]) -> Mat3 {
    let mut out = [[0.0; 3]; 3];
    for i in 0..3 {
        for j in 0..3 {
            out[i][j] = v[i] * v[j];
        }
    }
    out
}
