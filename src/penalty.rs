use std::cell::RefCell;

use crate::common::Lambda;
use crate::error::OptError;
use crate::math::{all_finite, dot};
use crate::traits::{NonlinearConstraint, ObjectiveFunction};

/// Sum of squared constraint violations, `sum(max(0, g)^2) + sum(h^2)`.
pub fn violation(g: &[f64], h: &[f64]) -> f64 {
    g.iter().map(|&gi| gi.max(0.0).powi(2)).sum::<f64>() + h.iter().map(|hj| hj * hj).sum::<f64>()
}

/// Exterior penalty transform of a constrained problem:
///
/// ```txt
///     f_pen(x) = f(x) + rho * (sum(max(0, g(x))^2) + sum(h(x)^2))
/// ```
///
/// Can be minimized with any of the unconstrained solvers.
pub struct PenaltyFunction<'a> {
    pub f: &'a dyn ObjectiveFunction,
    pub con: &'a dyn NonlinearConstraint,
    pub rho: f64,
}

impl<'a> ObjectiveFunction for PenaltyFunction<'a> {
    fn f(&self, x: &[f64]) -> f64 {
        let (g, h) = self.con.gh(x);
        self.f.f(x) + self.rho * violation(&g, &h)
    }
}

/// Builds the penalty transform of `f` subject to `con` with fixed
/// penalty parameter `rho`.
pub fn penalty<'a>(
    f: &'a dyn ObjectiveFunction,
    con: &'a dyn NonlinearConstraint,
    rho: f64,
) -> PenaltyFunction<'a> {
    PenaltyFunction { f, con, rho }
}

/// Augmented Lagrangian for fixed multiplier estimates:
///
/// ```txt
///     L(x) = f(x) + lambda'*h(x) + mu'*g(x)
///                 + rho * (sum(max(0, g(x))^2) + sum(h(x)^2))
/// ```
///
/// Holds its own copy of the multipliers, so updating the estimates
/// requires building a new function.
///
/// If the constraints return a different number of residuals than there
/// are multipliers, or any residual is not finite, the value is NaN and the
/// error is kept for [`AugmentedLagrangianFunction::take_error`].
pub struct AugmentedLagrangianFunction<'a> {
    f: &'a dyn ObjectiveFunction,
    con: &'a dyn NonlinearConstraint,
    lambda: Lambda,
    rho: f64,
    error: RefCell<Option<OptError>>,
}

impl<'a> AugmentedLagrangianFunction<'a> {
    pub fn new(
        f: &'a dyn ObjectiveFunction,
        con: &'a dyn NonlinearConstraint,
        lambda: &Lambda,
        rho: f64,
    ) -> Self {
        Self {
            f,
            con,
            lambda: lambda.clone(),
            rho,
            error: RefCell::new(None),
        }
    }

    pub fn multipliers(&self) -> &Lambda {
        &self.lambda
    }

    /// Returns the first constraint error seen during evaluation.
    pub fn take_error(&self) -> Option<OptError> {
        self.error.borrow_mut().take()
    }

    /// Keeps the first error seen and returns NaN in place of a value.
    fn fail(&self, err: OptError) -> f64 {
        let mut error = self.error.borrow_mut();
        if error.is_none() {
            *error = Some(err);
        }
        f64::NAN
    }

    fn mismatch(&self, what: &'static str, expected: usize, found: usize) -> f64 {
        self.fail(OptError::DimensionMismatch {
            what,
            expected,
            found,
        })
    }
}

impl<'a> ObjectiveFunction for AugmentedLagrangianFunction<'a> {
    fn f(&self, x: &[f64]) -> f64 {
        let (g, h) = self.con.gh(x);
        if g.len() != self.lambda.ineq.len() {
            return self.mismatch("inequality constraints", self.lambda.ineq.len(), g.len());
        }
        if h.len() != self.lambda.eq.len() {
            return self.mismatch("equality constraints", self.lambda.eq.len(), h.len());
        }
        if !all_finite(&g) || !all_finite(&h) {
            return self.fail(OptError::NonFiniteValue {
                what: "constraints",
            });
        }

        self.f.f(x)
            + dot(&self.lambda.eq, &h)
            + dot(&self.lambda.ineq, &g)
            + self.rho * violation(&g, &h)
    }
}
