//! Derivative-free minimisation
//!
//! A fixed-start Nelder-Mead simplex. Given the same objective and starting
//! point it always walks the same path, so estimates built on it are
//! reproducible.

use crate::{MathError, Result};
use serde::{Deserialize, Serialize};

/// Outcome of a minimisation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Minimum {
    /// Location of the best vertex
    pub point: Vec<f64>,
    /// Objective value at `point`
    pub value: f64,
    /// Number of simplex iterations performed
    pub iterations: usize,
    /// Whether the tolerances were met before the iteration limit
    pub converged: bool,
}

/// Nelder-Mead simplex minimiser
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NelderMead {
    /// Offset applied to each coordinate to build the initial simplex
    initial_step: f64,
    /// Iteration limit
    max_iterations: usize,
    /// Convergence tolerance on vertex spread
    x_tolerance: f64,
    /// Convergence tolerance on objective spread
    f_tolerance: f64,
}

impl Default for NelderMead {
    fn default() -> Self {
        Self {
            initial_step: 0.1,
            max_iterations: 2000,
            x_tolerance: 1e-8,
            f_tolerance: 1e-10,
        }
    }
}

impl NelderMead {
    // Standard reflection, expansion, contraction and shrink coefficients
    const ALPHA: f64 = 1.0;
    const GAMMA: f64 = 2.0;
    const RHO: f64 = 0.5;
    const SIGMA: f64 = 0.5;

    /// Create a minimiser with default tolerances
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the initial simplex step
    pub fn with_initial_step(mut self, step: f64) -> Result<Self> {
        if !(step.is_finite() && step > 0.0) {
            return Err(MathError::InvalidInput(
                "Initial step must be positive and finite".to_string(),
            ));
        }
        self.initial_step = step;
        Ok(self)
    }

    /// Set the iteration limit
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Set both convergence tolerances
    pub fn with_tolerances(mut self, x_tolerance: f64, f_tolerance: f64) -> Result<Self> {
        if !(x_tolerance > 0.0 && f_tolerance > 0.0) {
            return Err(MathError::InvalidInput(
                "Tolerances must be positive".to_string(),
            ));
        }
        self.x_tolerance = x_tolerance;
        self.f_tolerance = f_tolerance;
        Ok(self)
    }

    /// Minimise `objective` starting from `start`.
    ///
    /// Non-finite objective values are treated as `+inf`, which lets the
    /// objective reject infeasible points. Fails if the start itself is
    /// infeasible.
    pub fn minimize<F>(&self, mut objective: F, start: &[f64]) -> Result<Minimum>
    where
        F: FnMut(&[f64]) -> f64,
    {
        let dim = start.len();
        if dim == 0 {
            return Err(MathError::InvalidInput(
                "Cannot minimise over zero parameters".to_string(),
            ));
        }

        let mut eval = |x: &[f64]| {
            let v = objective(x);
            if v.is_finite() {
                v
            } else {
                f64::INFINITY
            }
        };

        let mut simplex: Vec<Vec<f64>> = Vec::with_capacity(dim + 1);
        simplex.push(start.to_vec());
        for i in 0..dim {
            let mut vertex = start.to_vec();
            vertex[i] += self.initial_step;
            simplex.push(vertex);
        }
        let mut values: Vec<f64> = simplex.iter().map(|v| eval(v)).collect();

        if !values[0].is_finite() {
            return Err(MathError::CalculationError(
                "Objective is not finite at the starting point".to_string(),
            ));
        }

        let mut iterations = 0;
        let mut converged = false;

        while iterations < self.max_iterations {
            sort_simplex(&mut simplex, &mut values);

            if self.has_converged(&simplex, &values) {
                converged = true;
                break;
            }
            iterations += 1;

            let worst = dim;
            let centroid = centroid(&simplex[..worst]);

            let reflected = affine(&centroid, &simplex[worst], -Self::ALPHA);
            let f_reflected = eval(&reflected);

            if f_reflected < values[0] {
                let expanded = affine(&centroid, &simplex[worst], -Self::GAMMA);
                let f_expanded = eval(&expanded);
                if f_expanded < f_reflected {
                    simplex[worst] = expanded;
                    values[worst] = f_expanded;
                } else {
                    simplex[worst] = reflected;
                    values[worst] = f_reflected;
                }
                continue;
            }

            if f_reflected < values[worst - 1] {
                simplex[worst] = reflected;
                values[worst] = f_reflected;
                continue;
            }

            // Outside contraction when the reflection beat the worst vertex
            let (contracted, f_contracted) = if f_reflected < values[worst] {
                let c = affine(&centroid, &reflected, Self::RHO);
                let f = eval(&c);
                (c, f)
            } else {
                let c = affine(&centroid, &simplex[worst], Self::RHO);
                let f = eval(&c);
                (c, f)
            };

            if f_contracted < values[worst].min(f_reflected) {
                simplex[worst] = contracted;
                values[worst] = f_contracted;
                continue;
            }

            let best = simplex[0].clone();
            for i in 1..=dim {
                simplex[i] = affine(&best, &simplex[i], Self::SIGMA);
                values[i] = eval(&simplex[i]);
            }
        }

        sort_simplex(&mut simplex, &mut values);

        Ok(Minimum {
            point: simplex.swap_remove(0),
            value: values[0],
            iterations,
            converged,
        })
    }

    fn has_converged(&self, simplex: &[Vec<f64>], values: &[f64]) -> bool {
        let f_spread = values
            .iter()
            .skip(1)
            .map(|v| (v - values[0]).abs())
            .fold(0.0, f64::max);
        let x_spread = simplex
            .iter()
            .skip(1)
            .flat_map(|v| v.iter().zip(simplex[0].iter()).map(|(a, b)| (a - b).abs()))
            .fold(0.0, f64::max);

        f_spread <= self.f_tolerance && x_spread <= self.x_tolerance
    }
}

/// Sort vertices by objective value, best first. Ties keep their order.
fn sort_simplex(simplex: &mut Vec<Vec<f64>>, values: &mut Vec<f64>) {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    *simplex = order.iter().map(|&i| simplex[i].clone()).collect();
    *values = order.iter().map(|&i| values[i]).collect();
}

fn centroid(vertices: &[Vec<f64>]) -> Vec<f64> {
    let dim = vertices[0].len();
    let mut c = vec![0.0; dim];
    for v in vertices {
        for (ci, vi) in c.iter_mut().zip(v) {
            *ci += vi;
        }
    }
    for ci in &mut c {
        *ci /= vertices.len() as f64;
    }
    c
}

/// `origin + t * (target - origin)`
fn affine(origin: &[f64], target: &[f64], t: f64) -> Vec<f64> {
    origin
        .iter()
        .zip(target)
        .map(|(o, x)| o + t * (x - o))
        .collect()
}
