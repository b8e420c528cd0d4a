use itertools::{izip, Itertools};
use log::debug;

use crate::common::{Lambda, LagrangianOptions, Options, Solution};
use crate::error::{OptError, Result};
use crate::math::{all_finite, distance, norm, norm_inf};
use crate::penalty::AugmentedLagrangianFunction;
use crate::traits::*;
use crate::unconstrained::{checked_gradient, quasi_newton};

/// Evaluates the constraints at `x`, checking that the number of residuals
/// matches `ng` inequalities and `nh` equalities.
fn constraints(
    con: &dyn NonlinearConstraint,
    x: &[f64],
    ng: usize,
    nh: usize,
) -> Result<(Vec<f64>, Vec<f64>)> {
    let (g, h) = con.gh(x);
    if g.len() != ng {
        return Err(OptError::DimensionMismatch {
            what: "inequality constraints",
            expected: ng,
            found: g.len(),
        });
    }
    if h.len() != nh {
        return Err(OptError::DimensionMismatch {
            what: "equality constraints",
            expected: nh,
            found: h.len(),
        });
    }
    if !all_finite(&g) || !all_finite(&h) {
        return Err(OptError::NonFiniteValue {
            what: "constraints",
        });
    }
    Ok((g, h))
}

fn objective(f_fn: &dyn ObjectiveFunction, x: &[f64]) -> Result<f64> {
    let f = f_fn.f(x);
    if !f.is_finite() {
        return Err(OptError::NonFiniteValue { what: "objective" });
    }
    Ok(f)
}

/// Augmented Lagrangian method for nonlinearly constrained problems.
/// Minimize a function F(x) beginning from a starting point x0:
///
/// ```txt
///       min F(x)
///        x
/// ```
///
/// subject to
///
/// ```txt
///       g(x) <= 0           (nonlinear inequalities)
///       h(x) = 0            (nonlinear equalities)
/// ```
///
/// Each outer iteration minimizes the augmented Lagrangian for the current
/// multiplier estimates using the quasi-Newton method with `update`, then
/// moves the multipliers by `rho` times the constraint residuals, keeping
/// the inequality multipliers non-negative. The penalty parameter `rho`
/// is held fixed.
///
/// Termination uses the tolerances in `opt`: the gradient norm is that of
/// the augmented Lagrangian at the updated multipliers, and the step and
/// objective changes are measured on the original objective. The inner
/// solves use `lag_opt.inner`.
///
/// Returns the solution together with the final multiplier estimates.
pub fn augmented_lagrangian(
    f_fn: &dyn ObjectiveFunction,
    con: &dyn NonlinearConstraint,
    x0: &[f64],
    grad: &dyn GradientEstimator,
    update: &dyn HessianUpdate,
    opt: &Options,
    lag_opt: &LagrangianOptions,
    progress: Option<&dyn ProgressMonitor>,
) -> Result<(Solution, Lambda)> {
    opt.validate()?;
    lag_opt.validate()?;
    if x0.is_empty() {
        return Err(OptError::EmptyDesignVector);
    }
    let rho = lag_opt.rho;

    // Multipliers are sized from the constraints at the starting point.
    let (g0, h0) = con.gh(x0);
    if !all_finite(&g0) || !all_finite(&h0) {
        return Err(OptError::NonFiniteValue {
            what: "constraints",
        });
    }
    let (ng, nh) = (g0.len(), h0.len());
    let mut lam = Lambda::zeros(ng, nh);

    let mut x = x0.to_vec();
    let mut f = objective(f_fn, &x)?;
    let mut iterations = 0;

    loop {
        let l_fn = AugmentedLagrangianFunction::new(f_fn, con, &lam, rho);
        let inner = quasi_newton(&l_fn, &x, grad, update, &lag_opt.inner, None)
            .map_err(|err| l_fn.take_error().unwrap_or(err))?;
        let x_new = inner.x;

        let (g, h) = constraints(con, &x_new, ng, nh)?;
        lam = Lambda {
            ineq: izip!(&lam.ineq, &g)
                .map(|(mu, gi)| (mu + rho * gi).max(0.0))
                .collect_vec(),
            eq: izip!(&lam.eq, &h).map(|(l, hj)| l + rho * hj).collect_vec(),
        };

        let l_fn = AugmentedLagrangianFunction::new(f_fn, con, &lam, rho);
        let l_x = checked_gradient(&l_fn, grad, &x_new, opt.fd_step)
            .map_err(|err| l_fn.take_error().unwrap_or(err))?;
        let f_new = objective(f_fn, &x_new)?;
        iterations += 1;

        let grad_norm = norm(&l_x);
        let step_size = distance(&x_new, &x);
        let max_violation = g.iter().fold(norm_inf(&h), |max, &gi| max.max(gi));
        debug!(
            "outer {:3} f = {:e}, max violation = {:e}, |dL| = {:e}, inner: {} in {} its",
            iterations,
            f_new,
            max_violation,
            grad_norm,
            inner.exit_flag,
            inner.iterations
        );
        if let Some(progress) = progress {
            // Outer steps are always taken in full.
            progress.update(iterations, f_new, grad_norm, step_size, 1.0);
        }

        if let Some(exit_flag) =
            opt.exit_flag(iterations, grad_norm, step_size, (f_new - f).abs())
        {
            debug!("{} after {} outer iterations", exit_flag, iterations);
            let solution = Solution {
                x: x_new,
                f: f_new,
                exit_flag,
                iterations,
            };
            return Ok((solution, lam));
        }

        x = x_new;
        f = f_new;
    }
}
