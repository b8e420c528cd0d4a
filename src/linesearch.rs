use log::{debug, trace};

use crate::common::Options;
use crate::error::{OptError, Result};
use crate::math::axpy;
use crate::traits::ObjectiveFunction;

/// Outcome of a line search along a unit direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Step {
    /// Step length in `[0, 1]`.
    pub alpha: f64,
    /// Objective value at `x + alpha*s`.
    pub f: f64,
    /// False if no interior point improved on the interval ends and a
    /// boundary was returned instead.
    pub bracketed: bool,
}

/// Brent's method for minimizing `phi` over the bounded interval `[a, b]`,
/// combining golden-section steps with successive parabolic interpolation.
///
/// Terminates when the bracket is resolved to `xatol` (plus a relative term
/// of `sqrt(eps)*|x|`) or after `max_fev` evaluations. Returns the best
/// abscissa found and its value. Only interior points are evaluated.
pub fn bounded_brent<F>(mut phi: F, a: f64, b: f64, xatol: f64, max_fev: usize) -> Result<(f64, f64)>
where
    F: FnMut(f64) -> Result<f64>,
{
    let sqrt_eps = f64::EPSILON.sqrt();
    let golden_mean = 0.5 * (3.0 - 5f64.sqrt());

    let (mut a, mut b) = (a, b);
    let mut fulc = a + golden_mean * (b - a);
    let mut nfc = fulc;
    let mut xf = fulc;
    let mut rat: f64 = 0.0;
    let mut e: f64 = 0.0;

    let mut fx = phi(xf)?;
    let mut fev = 1;
    let mut ffulc = fx;
    let mut fnfc = fx;

    let mut xm = 0.5 * (a + b);
    let mut tol1 = sqrt_eps * xf.abs() + xatol / 3.0;
    let mut tol2 = 2.0 * tol1;

    while (xf - xm).abs() > tol2 - 0.5 * (b - a) {
        if fev >= max_fev {
            trace!("line search stopped after {} evaluations", fev);
            break;
        }
        let mut golden = true;

        // Try a parabolic step through the three best points.
        if e.abs() > tol1 {
            let r = (xf - nfc) * (fx - ffulc);
            let q = (xf - fulc) * (fx - fnfc);
            let mut p = (xf - fulc) * q - (xf - nfc) * r;
            let mut q = 2.0 * (q - r);
            if q > 0.0 {
                p = -p;
            }
            q = q.abs();
            let r = e;
            e = rat;

            if p.abs() < (0.5 * q * r).abs() && p > q * (a - xf) && p < q * (b - xf) {
                rat = p / q;
                let x = xf + rat;
                golden = false;

                // Don't evaluate too close to the ends.
                if (x - a) < tol2 || (b - x) < tol2 {
                    rat = if xm >= xf { tol1 } else { -tol1 };
                }
            }
        }

        if golden {
            e = if xf >= xm { a - xf } else { b - xf };
            rat = golden_mean * e;
        }

        let si = if rat >= 0.0 { 1.0 } else { -1.0 };
        let x = xf + si * rat.abs().max(tol1);
        let fu = phi(x)?;
        fev += 1;

        if fu <= fx {
            if x >= xf {
                a = xf;
            } else {
                b = xf;
            }
            fulc = nfc;
            ffulc = fnfc;
            nfc = xf;
            fnfc = fx;
            xf = x;
            fx = fu;
        } else {
            if x < xf {
                a = x;
            } else {
                b = x;
            }
            if fu <= fnfc || nfc == xf {
                fulc = nfc;
                ffulc = fnfc;
                nfc = x;
                fnfc = fu;
            } else if fu <= ffulc || fulc == xf || fulc == nfc {
                fulc = x;
                ffulc = fu;
            }
        }

        xm = 0.5 * (a + b);
        tol1 = sqrt_eps * xf.abs() + xatol / 3.0;
        tol2 = 2.0 * tol1;
    }
    trace!("brent: x = {:e}, f = {:e}, {} evaluations", xf, fx, fev);

    Ok((xf, fx))
}

/// Minimizes `f(x + alpha*s)` for `alpha` in `[0, 1]`, where `f0 = f(x)`.
///
/// Makes at most `opt.line_max_fev` evaluations of `f`. The interior
/// minimizer is compared against both ends of the interval;
/// if an end is strictly better it is returned with `bracketed = false`.
pub fn line_search(
    f: &dyn ObjectiveFunction,
    x: &[f64],
    s: &[f64],
    f0: f64,
    opt: &Options,
) -> Result<Step> {
    let phi = |alpha: f64| -> Result<f64> {
        let v = f.f(&axpy(alpha, s, x));
        if v.is_finite() {
            Ok(v)
        } else {
            Err(OptError::NonFiniteValue {
                what: "objective along search direction",
            })
        }
    };

    // One evaluation is kept back for the far end of the interval.
    let (alpha, fa) = bounded_brent(&phi, 0.0, 1.0, opt.line_tol, opt.line_max_fev - 1)?;
    let f1 = phi(1.0)?;

    let mut step = Step {
        alpha,
        f: fa,
        bracketed: true,
    };
    if f0 < step.f {
        step = Step {
            alpha: 0.0,
            f: f0,
            bracketed: false,
        };
    }
    if f1 < step.f {
        step = Step {
            alpha: 1.0,
            f: f1,
            bracketed: false,
        };
    }
    if !step.bracketed {
        debug!("line search not bracketed, taking alpha = {}", step.alpha);
    }
    Ok(step)
}
