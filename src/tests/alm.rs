use float_cmp::assert_approx_eq;

use crate::{
    augmented_lagrangian, Bfgs, Dfp, ExitFlag, ForwardDifference, LagrangianOptions,
    NonlinearConstraint, ObjectiveFunction, OptError, Options,
};

/// Linear objective `-(x_0 + x_1)` on the ellipse `x_0^2 + 2x_1^2 <= 2`.
///
/// The maximum of `x_0 + x_1` over the ellipse is at `(2/sqrt(3), 1/sqrt(3))`
/// where the constraint is active with multiplier `sqrt(3)/4`.
struct Ellipse {}

impl ObjectiveFunction for Ellipse {
    fn f(&self, x: &[f64]) -> f64 {
        -(x[0] + x[1])
    }
}

impl NonlinearConstraint for Ellipse {
    fn gh(&self, x: &[f64]) -> (Vec<f64>, Vec<f64>) {
        (vec![x[0].powi(2) + 2.0 * x[1].powi(2) - 2.0], vec![])
    }
}

fn options() -> (Options, LagrangianOptions) {
    let opt = Options {
        grad_tol: 1e-6,
        delta_f_tol: 1e-10,
        delta_x_tol: 1e-10,
        max_it: 100,
        ..Default::default()
    };
    let lag_opt = LagrangianOptions {
        rho: 1.0,
        inner: Options {
            grad_tol: 1e-6,
            delta_f_tol: 1e-12,
            delta_x_tol: 1e-12,
            max_it: 200,
            ..Default::default()
        },
    };
    (opt, lag_opt)
}

#[test]
fn constrained_ellipse() {
    let p = Ellipse {};
    let (opt, lag_opt) = options();

    let (sol, lam) = augmented_lagrangian(
        &p,
        &p,
        &[0.0, 0.0],
        &ForwardDifference,
        &Bfgs,
        &opt,
        &lag_opt,
        None,
    )
    .unwrap();

    assert!(sol.exit_flag.converged());
    assert!(sol.iterations < opt.max_it);
    assert_approx_eq!(f64, sol.x[0], 2.0 / 3f64.sqrt(), epsilon = 1e-4);
    assert_approx_eq!(f64, sol.x[1], 1.0 / 3f64.sqrt(), epsilon = 1e-4);
    assert_approx_eq!(f64, sol.f, -3f64.sqrt(), epsilon = 1e-5);

    let (g, h) = p.gh(&sol.x);
    assert!(g[0].abs() < 1e-4);
    assert!(h.is_empty());

    assert_eq!(lam.ineq.len(), 1);
    assert!(lam.eq.is_empty());
    assert_approx_eq!(f64, lam.ineq[0], 3f64.sqrt() / 4.0, epsilon = 1e-3);
}

#[test]
fn constrained_ellipse_dfp() {
    let p = Ellipse {};
    let (opt, mut lag_opt) = options();
    lag_opt.rho = 10.0;

    let (sol, lam) = augmented_lagrangian(
        &p,
        &p,
        &[0.0, 0.0],
        &ForwardDifference,
        &Dfp,
        &opt,
        &lag_opt,
        None,
    )
    .unwrap();

    assert!(sol.exit_flag.converged());
    assert_approx_eq!(f64, sol.f, -3f64.sqrt(), epsilon = 1e-5);
    assert!(lam.ineq[0] >= 0.0);
}

#[test]
fn multipliers_reset_between_calls() {
    let p = Ellipse {};
    let (opt, lag_opt) = options();
    let solve = || {
        augmented_lagrangian(
            &p,
            &p,
            &[0.0, 0.0],
            &ForwardDifference,
            &Bfgs,
            &opt,
            &lag_opt,
            None,
        )
        .unwrap()
    };
    let (first, lam1) = solve();
    let (second, lam2) = solve();
    assert_eq!(first.x, second.x);
    assert_eq!(first.iterations, second.iterations);
    assert_eq!(lam1, lam2);
}

/// Minimize `(x_0 - 2)^2 + (x_1 - 3)^2` subject to `x_0 + x_1 = 1`.
fn equality_objective(x: &[f64]) -> f64 {
    (x[0] - 2.0).powi(2) + (x[1] - 3.0).powi(2)
}

fn equality_constraint(x: &[f64]) -> (Vec<f64>, Vec<f64>) {
    (vec![], vec![x[0] + x[1] - 1.0])
}

#[test]
fn equality_constrained() {
    let opt = Options {
        grad_tol: 1e-6,
        delta_f_tol: 1e-12,
        delta_x_tol: 1e-12,
        max_it: 100,
        ..Default::default()
    };
    let lag_opt = LagrangianOptions {
        rho: 1.0,
        inner: opt.clone(),
    };

    let (sol, lam) = augmented_lagrangian(
        &equality_objective,
        &equality_constraint,
        &[0.0, 0.0],
        &ForwardDifference,
        &Bfgs,
        &opt,
        &lag_opt,
        None,
    )
    .unwrap();

    assert_eq!(sol.exit_flag, ExitFlag::GradientTolerance);
    assert_approx_eq!(f64, sol.x[0], 0.0, epsilon = 1e-5);
    assert_approx_eq!(f64, sol.x[1], 1.0, epsilon = 1e-5);
    assert_approx_eq!(f64, sol.f, 8.0, epsilon = 1e-4);
    assert!(lam.ineq.is_empty());
    assert_approx_eq!(f64, lam.eq[0], 4.0, epsilon = 1e-3);
}

#[test]
fn constraint_count_must_not_change() {
    let f = |x: &[f64]| x[0] * x[0];
    let con = |x: &[f64]| {
        if x[0] == 5.0 {
            (vec![x[0] - 10.0], vec![])
        } else {
            (vec![x[0] - 10.0, -x[0]], vec![])
        }
    };
    let (opt, lag_opt) = options();
    let err = augmented_lagrangian(
        &f,
        &con,
        &[5.0],
        &ForwardDifference,
        &Bfgs,
        &opt,
        &lag_opt,
        None,
    )
    .unwrap_err();
    assert!(matches!(err, OptError::DimensionMismatch { .. }));
}

#[test]
fn invalid_penalty() {
    let p = Ellipse {};
    let (opt, mut lag_opt) = options();
    lag_opt.rho = 0.0;
    let err = augmented_lagrangian(
        &p,
        &p,
        &[0.0, 0.0],
        &ForwardDifference,
        &Bfgs,
        &opt,
        &lag_opt,
        None,
    )
    .unwrap_err();
    assert!(matches!(err, OptError::InvalidOptions(_)));
}

#[test]
fn constraint_turns_non_finite() {
    // Finite at the start, NaN once the inner search moves past 0.5.
    let f = |x: &[f64]| -x[0];
    let con = |x: &[f64]| {
        if x[0] > 0.5 {
            (vec![f64::NAN], vec![])
        } else {
            (vec![x[0] - 1.0], vec![])
        }
    };
    let (opt, lag_opt) = options();
    let err = augmented_lagrangian(
        &f,
        &con,
        &[0.0],
        &ForwardDifference,
        &Bfgs,
        &opt,
        &lag_opt,
        None,
    )
    .unwrap_err();
    assert_eq!(
        err,
        OptError::NonFiniteValue {
            what: "constraints",
        }
    );
}
