use ndarray::{arr2, Array2, ArrayView1};
use std::cell::Cell;

use crate::{
    identity, quasi_newton, Bfgs, Dfp, ExitFlag, ForwardDifference, HessianUpdate, OptError,
    Options, Result,
};

/// Returns true if `b` is symmetric and has a Cholesky factorization.
fn positive_definite(b: &Array2<f64>) -> bool {
    let n = b.nrows();
    for i in 0..n {
        for j in 0..n {
            if (b[[i, j]] - b[[j, i]]).abs() > 1e-9 * (1.0 + b[[i, j]].abs()) {
                return false;
            }
        }
    }
    let mut l = Array2::<f64>::zeros((n, n));
    for j in 0..n {
        let mut d = b[[j, j]];
        for k in 0..j {
            d -= l[[j, k]] * l[[j, k]];
        }
        if d <= 0.0 {
            return false;
        }
        l[[j, j]] = d.sqrt();
        for i in j + 1..n {
            let mut s = b[[i, j]];
            for k in 0..j {
                s -= l[[i, k]] * l[[j, k]];
            }
            l[[i, j]] = s / l[[j, j]];
        }
    }
    true
}

fn curvature_matrix() -> Array2<f64> {
    arr2(&[[4.0, 1.0, 0.0], [1.0, 3.0, 0.5], [0.0, 0.5, 2.0]])
}

fn steps() -> Vec<[f64; 3]> {
    vec![
        [1.0, 0.0, 0.0],
        [0.3, -1.2, 0.5],
        [-0.7, 0.2, 0.9],
        [0.05, 0.4, -0.1],
        [2.0, 1.0, 1.0],
        [-0.2, -0.3, 0.6],
    ]
}

fn check_sequence(rule: &dyn HessianUpdate) {
    let a = curvature_matrix();
    let mut b = identity(3);
    for dx in steps() {
        let dg = a.dot(&ArrayView1::from(&dx[..])).to_vec();
        let db = rule.increment(&b, &dx, &dg).unwrap();
        b = &b + &db;
        assert!(positive_definite(&b));

        // Secant condition of the inverse approximation: B*dg = dx.
        let bdg = b.dot(&ArrayView1::from(&dg[..]));
        for i in 0..3 {
            assert!((bdg[i] - dx[i]).abs() < 1e-9);
        }
    }
}

#[test]
fn bfgs_preserves_positive_definiteness() {
    check_sequence(&Bfgs);
}

#[test]
fn dfp_preserves_positive_definiteness() {
    check_sequence(&Dfp);
}

#[test]
fn curvature_violation() {
    let b = identity(2);
    for rule in [&Bfgs as &dyn HessianUpdate, &Dfp] {
        let err = rule.increment(&b, &[1.0, 0.0], &[-1.0, 0.0]).unwrap_err();
        assert!(matches!(err, OptError::IllConditionedUpdate { .. }));

        let err = rule.increment(&b, &[0.0, 0.0], &[0.0, 0.0]).unwrap_err();
        assert!(matches!(err, OptError::IllConditionedUpdate { .. }));
    }
}

#[test]
fn mismatched_dimensions() {
    let b = identity(3);
    let err = Bfgs.increment(&b, &[1.0, 0.0], &[1.0, 0.0]).unwrap_err();
    assert!(matches!(err, OptError::DimensionMismatch { .. }));
}

/// Rule that rejects every update, counting how often it is asked.
struct Rejecting {
    calls: Cell<usize>,
    err: OptError,
}

impl HessianUpdate for Rejecting {
    fn increment(&self, _b: &Array2<f64>, _dx: &[f64], _dg: &[f64]) -> Result<Array2<f64>> {
        self.calls.set(self.calls.get() + 1);
        Err(self.err.clone())
    }
}

fn bowl(x: &[f64]) -> f64 {
    (x[0] - 1.0).powi(2) + 2.0 * (x[1] + 0.5).powi(2)
}

#[test]
fn rejected_updates_keep_approximation() {
    let rule = Rejecting {
        calls: Cell::new(0),
        err: OptError::IllConditionedUpdate { curvature: -1.0 },
    };
    let opt = Options {
        grad_tol: 1e-5,
        delta_f_tol: 0.0,
        delta_x_tol: 0.0,
        max_it: 500,
        ..Default::default()
    };

    // With B held at the identity the search is steepest descent.
    let sol = quasi_newton(&bowl, &[0.0, 0.0], &ForwardDifference, &rule, &opt, None).unwrap();
    assert_eq!(sol.exit_flag, ExitFlag::GradientTolerance);
    assert!(rule.calls.get() > 0);
    assert_eq!(rule.calls.get(), sol.iterations - 1);
    assert!((sol.x[0] - 1.0).abs() < 1e-4);
    assert!((sol.x[1] + 0.5).abs() < 1e-4);
}

#[test]
fn other_update_errors_propagate() {
    let err = OptError::DimensionMismatch {
        what: "Hessian approximation",
        expected: 2,
        found: 3,
    };
    let rule = Rejecting {
        calls: Cell::new(0),
        err: err.clone(),
    };
    let opt = Options {
        grad_tol: 1e-12,
        ..Default::default()
    };
    let res = quasi_newton(&bowl, &[0.0, 0.0], &ForwardDifference, &rule, &opt, None);
    assert_eq!(res.unwrap_err(), err);
    assert_eq!(rule.calls.get(), 1);
}
