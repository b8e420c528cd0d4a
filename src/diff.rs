//! Finite-difference gradient estimates.
//!
//! The step size `h` is used as given. Too small a step is swamped by
//! rounding error, too large a step by truncation error.

use crate::traits::{GradientEstimator, ObjectiveFunction};

/// First-order forward differences, `n + 1` objective evaluations.
#[derive(Debug, Clone, Copy, Default)]
pub struct ForwardDifference;

/// Second-order central differences, `2n` objective evaluations.
#[derive(Debug, Clone, Copy, Default)]
pub struct CentralDifference;

impl GradientEstimator for ForwardDifference {
    fn gradient(&self, f: &dyn ObjectiveFunction, x: &[f64], h: f64) -> Vec<f64> {
        forward_diff(f, x, h)
    }
}

impl GradientEstimator for CentralDifference {
    fn gradient(&self, f: &dyn ObjectiveFunction, x: &[f64], h: f64) -> Vec<f64> {
        central_diff(f, x, h)
    }
}

/// Approximates `df/dx_i` by `(f(x + h*e_i) - f(x)) / h`.
pub fn forward_diff(f: &dyn ObjectiveFunction, x: &[f64], h: f64) -> Vec<f64> {
    let f0 = f.f(x);
    let mut xp = x.to_vec();
    (0..x.len())
        .map(|i| {
            xp[i] = x[i] + h;
            let fp = f.f(&xp);
            xp[i] = x[i];
            (fp - f0) / h
        })
        .collect()
}

/// Approximates `df/dx_i` by `(f(x + h*e_i) - f(x - h*e_i)) / 2h`.
pub fn central_diff(f: &dyn ObjectiveFunction, x: &[f64], h: f64) -> Vec<f64> {
    let mut xp = x.to_vec();
    (0..x.len())
        .map(|i| {
            xp[i] = x[i] + h;
            let fp = f.f(&xp);
            xp[i] = x[i] - h;
            let fm = f.f(&xp);
            xp[i] = x[i];
            (fp - fm) / (2.0 * h)
        })
        .collect()
}
