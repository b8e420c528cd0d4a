use std::fmt;

use crate::error::{OptError, Result};

/// Reason a solver stopped. Checks are made in declaration order and the
/// first one satisfied wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitFlag {
    /// Iteration budget exhausted.
    MaxIterations = 0,
    /// Gradient-norm tolerance met.
    GradientTolerance = 1,
    /// Step-norm tolerance met.
    StepTolerance = 2,
    /// Objective-delta tolerance met.
    ObjectiveTolerance = 3,
}

impl ExitFlag {
    pub fn code(&self) -> usize {
        *self as usize
    }

    /// True unless the iteration budget ran out.
    pub fn converged(&self) -> bool {
        *self != ExitFlag::MaxIterations
    }
}

impl fmt::Display for ExitFlag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ExitFlag::MaxIterations => write!(f, "iteration limit reached"),
            ExitFlag::GradientTolerance => write!(f, "gradient tolerance met"),
            ExitFlag::StepTolerance => write!(f, "step tolerance met"),
            ExitFlag::ObjectiveTolerance => write!(f, "objective tolerance met"),
        }
    }
}

/// Result of a solver run.
#[derive(Debug, Clone)]
pub struct Solution {
    /// Final design vector.
    pub x: Vec<f64>,
    /// Objective function value at `x`.
    pub f: f64,
    pub exit_flag: ExitFlag,
    /// Number of iterations performed.
    pub iterations: usize,
}

impl Solution {
    /// Discards the diagnostics and returns the design vector.
    pub fn into_x(self) -> Vec<f64> {
        self.x
    }
}

/// Lagrange and Kuhn-Tucker multipliers on the constraints.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Lambda {
    /// Multipliers on the inequality constraints (`mu`), always non-negative.
    pub ineq: Vec<f64>,
    /// Multipliers on the equality constraints (`lambda`).
    pub eq: Vec<f64>,
}

impl Lambda {
    /// Zero-valued multipliers for `ng` inequality and `nh` equality
    /// constraints.
    pub fn zeros(ng: usize, nh: usize) -> Self {
        Self {
            ineq: vec![0.0; ng],
            eq: vec![0.0; nh],
        }
    }
}

#[derive(Debug, Clone)]
pub struct Options {
    /// Termination tolerance on the 2-norm of the gradient.
    pub grad_tol: f64,
    /// Termination tolerance on the absolute change in objective value.
    pub delta_f_tol: f64,
    /// Termination tolerance on the 2-norm of the step.
    pub delta_x_tol: f64,

    /// Maximum number of iterations.
    pub max_it: usize,

    /// Step size used by the finite-difference gradient estimator.
    pub fd_step: f64,

    /// Absolute tolerance on the step length found by the line search.
    pub line_tol: f64,
    /// Maximum number of function evaluations per line search, counting
    /// the one at the full step. At least 2.
    pub line_max_fev: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            grad_tol: 1e-6,
            delta_f_tol: 1e-9,
            delta_x_tol: 1e-9,

            max_it: 200,

            fd_step: 1e-8,

            line_tol: 1e-10,
            line_max_fev: 500,
        }
    }
}

impl Options {
    pub fn validate(&self) -> Result<()> {
        for (name, tol) in [
            ("grad_tol", self.grad_tol),
            ("delta_f_tol", self.delta_f_tol),
            ("delta_x_tol", self.delta_x_tol),
        ] {
            if !(tol >= 0.0) {
                return Err(OptError::InvalidOptions(format!(
                    "{} ({}) must be non-negative",
                    name, tol
                )));
            }
        }
        if self.max_it == 0 {
            return Err(OptError::InvalidOptions(
                "max_it must be at least 1".to_string(),
            ));
        }
        if !(self.fd_step > 0.0) || !self.fd_step.is_finite() {
            return Err(OptError::InvalidOptions(format!(
                "fd_step ({}) must be positive and finite",
                self.fd_step
            )));
        }
        if !(self.line_tol > 0.0) {
            return Err(OptError::InvalidOptions(format!(
                "line_tol ({}) must be positive",
                self.line_tol
            )));
        }
        if self.line_max_fev < 2 {
            return Err(OptError::InvalidOptions(
                "line_max_fev must be at least 2".to_string(),
            ));
        }
        Ok(())
    }

    /// Applies the termination tests after iteration `iterations`, in
    /// priority order: iteration budget, gradient norm, step norm and
    /// objective change.
    pub fn exit_flag(
        &self,
        iterations: usize,
        grad_norm: f64,
        step_norm: f64,
        delta_f: f64,
    ) -> Option<ExitFlag> {
        if iterations >= self.max_it {
            Some(ExitFlag::MaxIterations)
        } else if grad_norm <= self.grad_tol {
            Some(ExitFlag::GradientTolerance)
        } else if step_norm <= self.delta_x_tol {
            Some(ExitFlag::StepTolerance)
        } else if delta_f <= self.delta_f_tol {
            Some(ExitFlag::ObjectiveTolerance)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone)]
pub struct LagrangianOptions {
    /// Fixed penalty parameter applied to the squared constraint violation.
    pub rho: f64,
    /// Options for each inner quasi-Newton solve.
    pub inner: Options,
}

impl Default for LagrangianOptions {
    fn default() -> Self {
        Self {
            rho: 1.0,
            inner: Options::default(),
        }
    }
}

impl LagrangianOptions {
    pub fn validate(&self) -> Result<()> {
        if !(self.rho > 0.0) || !self.rho.is_finite() {
            return Err(OptError::InvalidOptions(format!(
                "rho ({}) must be positive and finite",
                self.rho
            )));
        }
        self.inner.validate()
    }
}
