use ndarray::Array2;

use crate::error::Result;

/// Scalar objective `f(x)` to be minimized.
///
/// Must be free of side effects observable to the solver.
pub trait ObjectiveFunction {
    fn f(&self, x: &[f64]) -> f64;
}

impl<F> ObjectiveFunction for F
where
    F: Fn(&[f64]) -> f64,
{
    fn f(&self, x: &[f64]) -> f64 {
        self(x)
    }
}

pub trait NonlinearConstraint {
    /// Returns the inequality residuals `g` (feasible when `g_i <= 0`) and
    /// the equality residuals `h` (feasible when `h_j == 0`). Either may be
    /// empty.
    fn gh(&self, x: &[f64]) -> (Vec<f64>, Vec<f64>);
}

impl<F> NonlinearConstraint for F
where
    F: Fn(&[f64]) -> (Vec<f64>, Vec<f64>),
{
    fn gh(&self, x: &[f64]) -> (Vec<f64>, Vec<f64>) {
        self(x)
    }
}

/// Approximates the gradient of `f` at `x` using step size `h`.
pub trait GradientEstimator {
    fn gradient(&self, f: &dyn ObjectiveFunction, x: &[f64], h: f64) -> Vec<f64>;
}

/// Update rule for the inverse Hessian approximation `B` used by the
/// quasi-Newton method.
pub trait HessianUpdate {
    /// Returns the increment `dB` such that `B + dB` is the updated
    /// approximation, given the step `dx` and the gradient change `dg`.
    fn increment(&self, b: &Array2<f64>, dx: &[f64], dg: &[f64]) -> Result<Array2<f64>>;
}

/// Called on each iteration of a solver with the iteration number,
/// objective function value, gradient norm, step size and the line
/// search step length.
pub trait ProgressMonitor {
    fn update(&self, i: usize, obj: f64, grad_norm: f64, step_size: f64, alpha: f64);
}
