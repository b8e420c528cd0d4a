//! Inverse Hessian update rules for the quasi-Newton method.
//!
//! With `s = dx` and `y = dg`, both rules require the curvature condition
//! `s'*y > 0`. An update that violates it is rejected with
//! [`OptError::IllConditionedUpdate`] rather than producing a matrix that is
//! no longer positive-definite.

use ndarray::{Array2, ArrayView1};

use crate::error::{OptError, Result};
use crate::math::{dot, norm};
use crate::traits::HessianUpdate;

/// Broyden-Fletcher-Goldfarb-Shanno update.
///
/// ```txt
///     dB = (1 + y'By / s'y) ss' / s'y - (s(By)' + (By)s') / s'y
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct Bfgs;

/// Davidon-Fletcher-Powell update.
///
/// ```txt
///     dB = ss' / s'y - (By)(By)' / y'By
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct Dfp;

/// Returns the `n x n` identity, the initial approximation.
pub fn identity(n: usize) -> Array2<f64> {
    Array2::eye(n)
}

fn curvature(dx: &[f64], dg: &[f64]) -> Result<f64> {
    let sy = dot(dx, dg);
    if !(sy > f64::EPSILON * norm(dx) * norm(dg)) {
        return Err(OptError::IllConditionedUpdate { curvature: sy });
    }
    Ok(sy)
}

fn check_finite(db: Array2<f64>, curvature: f64) -> Result<Array2<f64>> {
    if db.iter().all(|v| v.is_finite()) {
        Ok(db)
    } else {
        Err(OptError::IllConditionedUpdate { curvature })
    }
}

fn check_dims(b: &Array2<f64>, dx: &[f64], dg: &[f64]) -> Result<()> {
    let n = dx.len();
    if dg.len() != n {
        return Err(OptError::DimensionMismatch {
            what: "gradient change",
            expected: n,
            found: dg.len(),
        });
    }
    if b.dim() != (n, n) {
        return Err(OptError::DimensionMismatch {
            what: "Hessian approximation",
            expected: n,
            found: b.nrows(),
        });
    }
    Ok(())
}

impl HessianUpdate for Bfgs {
    fn increment(&self, b: &Array2<f64>, dx: &[f64], dg: &[f64]) -> Result<Array2<f64>> {
        check_dims(b, dx, dg)?;
        let sy = curvature(dx, dg)?;

        let by = b.dot(&ArrayView1::from(dg));
        let yby = by.dot(&ArrayView1::from(dg));
        let c = 1.0 + yby / sy;

        let n = dx.len();
        let db = Array2::from_shape_fn((n, n), |(i, j)| {
            c * dx[i] * dx[j] / sy - (dx[i] * by[j] + by[i] * dx[j]) / sy
        });
        check_finite(db, sy)
    }
}

impl HessianUpdate for Dfp {
    fn increment(&self, b: &Array2<f64>, dx: &[f64], dg: &[f64]) -> Result<Array2<f64>> {
        check_dims(b, dx, dg)?;
        let sy = curvature(dx, dg)?;

        let by = b.dot(&ArrayView1::from(dg));
        let yby = by.dot(&ArrayView1::from(dg));
        if !(yby > 0.0) {
            return Err(OptError::IllConditionedUpdate { curvature: yby });
        }

        let n = dx.len();
        let db = Array2::from_shape_fn((n, n), |(i, j)| {
            dx[i] * dx[j] / sy - by[i] * by[j] / yby
        });
        check_finite(db, sy)
    }
}
