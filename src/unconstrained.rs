use log::debug;
use ndarray::{Array2, ArrayView1};

use crate::common::{Options, Solution};
use crate::error::{OptError, Result};
use crate::hessian::identity;
use crate::linesearch::line_search;
use crate::math::{all_finite, axpy, distance, dot, norm, sub};
use crate::traits::{GradientEstimator, HessianUpdate, ObjectiveFunction, ProgressMonitor};

/// Loop-carried state: a design vector with its objective value and
/// gradient estimate. Replaced wholesale on every iteration.
struct Iterate {
    x: Vec<f64>,
    f: f64,
    g: Vec<f64>,
}

impl Iterate {
    fn evaluate(
        f_fn: &dyn ObjectiveFunction,
        grad: &dyn GradientEstimator,
        x: Vec<f64>,
        h: f64,
    ) -> Result<Self> {
        let f = f_fn.f(&x);
        if !f.is_finite() {
            return Err(OptError::NonFiniteValue { what: "objective" });
        }
        let g = checked_gradient(f_fn, grad, &x, h)?;
        Ok(Self { x, f, g })
    }
}

/// Gradient estimate at `x`, rejected if it has the wrong length or any
/// non-finite element.
pub(crate) fn checked_gradient(
    f_fn: &dyn ObjectiveFunction,
    grad: &dyn GradientEstimator,
    x: &[f64],
    h: f64,
) -> Result<Vec<f64>> {
    let g = grad.gradient(f_fn, x, h);
    if g.len() != x.len() {
        return Err(OptError::DimensionMismatch {
            what: "gradient",
            expected: x.len(),
            found: g.len(),
        });
    }
    if !all_finite(&g) {
        return Err(OptError::NonFiniteValue { what: "gradient" });
    }
    Ok(g)
}

/// Strategy for choosing the search direction at each iterate.
trait SearchDirection {
    /// Direction at iterate `it` on iteration `k` (zero based). Need not be
    /// normalized.
    fn direction(&mut self, k: usize, it: &Iterate) -> Vec<f64>;

    /// Called after each step that does not terminate the search.
    fn update(&mut self, _prev: &Iterate, _next: &Iterate) -> Result<()> {
        Ok(())
    }
}

struct SteepestDescent;

impl SearchDirection for SteepestDescent {
    fn direction(&mut self, _k: usize, it: &Iterate) -> Vec<f64> {
        it.g.iter().map(|v| -v).collect()
    }
}

/// Fletcher-Reeves conjugate directions, restarted every `n` iterations.
struct FletcherReeves {
    n: usize,
    /// Previous (unnormalized) direction and squared gradient norm.
    prev: Option<(Vec<f64>, f64)>,
}

impl SearchDirection for FletcherReeves {
    fn direction(&mut self, k: usize, it: &Iterate) -> Vec<f64> {
        let gg = dot(&it.g, &it.g);
        let s: Vec<f64> = match self.prev.take() {
            Some((s_prev, gg_prev)) if k % self.n != 0 && gg_prev > 0.0 => {
                let beta = gg / gg_prev;
                it.g.iter()
                    .zip(&s_prev)
                    .map(|(gi, si)| -gi + beta * si)
                    .collect()
            }
            _ => it.g.iter().map(|v| -v).collect(),
        };
        self.prev = Some((s.clone(), gg));
        s
    }
}

struct QuasiNewton<'a> {
    /// Inverse Hessian approximation.
    b: Array2<f64>,
    rule: &'a dyn HessianUpdate,
}

impl<'a> SearchDirection for QuasiNewton<'a> {
    fn direction(&mut self, _k: usize, it: &Iterate) -> Vec<f64> {
        self.b
            .dot(&ArrayView1::from(&it.g[..]))
            .iter()
            .map(|v| -v)
            .collect()
    }

    fn update(&mut self, prev: &Iterate, next: &Iterate) -> Result<()> {
        let dx = sub(&next.x, &prev.x);
        let dg = sub(&next.g, &prev.g);
        match self.rule.increment(&self.b, &dx, &dg) {
            Ok(db) => {
                self.b = &self.b + &db;
                Ok(())
            }
            Err(OptError::IllConditionedUpdate { curvature }) => {
                debug!(
                    "skipping Hessian update, curvature condition violated ({:e})",
                    curvature
                );
                Ok(())
            }
            Err(err) => Err(err),
        }
    }
}

/// Line-search iteration shared by all direction strategies.
fn minimize(
    f_fn: &dyn ObjectiveFunction,
    x0: &[f64],
    grad: &dyn GradientEstimator,
    strategy: &mut dyn SearchDirection,
    opt: &Options,
    progress: Option<&dyn ProgressMonitor>,
) -> Result<Solution> {
    opt.validate()?;
    if x0.is_empty() {
        return Err(OptError::EmptyDesignVector);
    }

    let mut it = Iterate::evaluate(f_fn, grad, x0.to_vec(), opt.fd_step)?;
    let mut iterations = 0;

    loop {
        let mut s = strategy.direction(iterations, &it);
        let s_norm = norm(&s);
        if s_norm > 0.0 {
            s.iter_mut().for_each(|v| *v /= s_norm);
        }

        let step = line_search(f_fn, &it.x, &s, it.f, opt)?;
        let next = Iterate::evaluate(f_fn, grad, axpy(step.alpha, &s, &it.x), opt.fd_step)?;
        iterations += 1;

        let grad_norm = norm(&next.g);
        let step_size = distance(&next.x, &it.x);
        debug!(
            "{:4} f = {:e}, |g| = {:e}, |dx| = {:e}",
            iterations, next.f, grad_norm, step_size
        );
        if let Some(progress) = progress {
            progress.update(iterations, next.f, grad_norm, step_size, step.alpha);
        }

        if let Some(exit_flag) =
            opt.exit_flag(iterations, grad_norm, step_size, (next.f - it.f).abs())
        {
            debug!("{} after {} iterations", exit_flag, iterations);
            return Ok(Solution {
                x: next.x,
                f: next.f,
                exit_flag,
                iterations,
            });
        }

        strategy.update(&it, &next)?;
        it = next;
    }
}

/// Minimizes `f(x)` from `x0` using the method of steepest descent.
///
/// Each iteration searches along the negative gradient with a bounded
/// line search over a unit step.
pub fn steepest_descent(
    f_fn: &dyn ObjectiveFunction,
    x0: &[f64],
    grad: &dyn GradientEstimator,
    opt: &Options,
    progress: Option<&dyn ProgressMonitor>,
) -> Result<Solution> {
    minimize(f_fn, x0, grad, &mut SteepestDescent, opt, progress)
}

/// Minimizes `f(x)` from `x0` using the Fletcher-Reeves conjugate gradient
/// method. The search is restarted along the negative gradient every
/// `x0.len()` iterations.
pub fn conjugate_gradient(
    f_fn: &dyn ObjectiveFunction,
    x0: &[f64],
    grad: &dyn GradientEstimator,
    opt: &Options,
    progress: Option<&dyn ProgressMonitor>,
) -> Result<Solution> {
    let mut strategy = FletcherReeves {
        n: x0.len().max(1),
        prev: None,
    };
    minimize(f_fn, x0, grad, &mut strategy, opt, progress)
}

/// Minimizes `f(x)` from `x0` using a quasi-Newton method.
///
/// The inverse Hessian approximation starts at the identity and is
/// corrected after every step by `update`. Updates that violate the
/// curvature condition are skipped and the previous approximation is kept.
pub fn quasi_newton(
    f_fn: &dyn ObjectiveFunction,
    x0: &[f64],
    grad: &dyn GradientEstimator,
    update: &dyn HessianUpdate,
    opt: &Options,
    progress: Option<&dyn ProgressMonitor>,
) -> Result<Solution> {
    let mut strategy = QuasiNewton {
        b: identity(x0.len()),
        rule: update,
    };
    minimize(f_fn, x0, grad, &mut strategy, opt, progress)
}
