//! Differencing and moment helpers
//!
//! Integrated models are estimated on the differenced series and projected
//! back onto the original scale by cumulative summation.

use crate::{MathError, Result};

/// Apply `order` rounds of first differencing.
///
/// Each round shortens the series by one element. Differencing a series that
/// is not longer than `order` is an error.
pub fn difference(data: &[f64], order: usize) -> Result<Vec<f64>> {
    if data.len() <= order {
        return Err(MathError::InsufficientData(format!(
            "Cannot difference {} values {} time(s)",
            data.len(),
            order
        )));
    }

    let mut result = data.to_vec();
    for _ in 0..order {
        result = result.windows(2).map(|w| w[1] - w[0]).collect();
    }

    Ok(result)
}

/// Arithmetic mean, `None` for an empty slice
pub fn mean(data: &[f64]) -> Option<f64> {
    if data.is_empty() {
        return None;
    }
    Some(data.iter().sum::<f64>() / data.len() as f64)
}

/// Population variance, `None` for an empty slice
pub fn variance(data: &[f64]) -> Option<f64> {
    let m = mean(data)?;
    Some(data.iter().map(|x| (x - m).powi(2)).sum::<f64>() / data.len() as f64)
}
