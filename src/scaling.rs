use itertools::{izip, Itertools};

use crate::error::{OptError, Result};
use crate::traits::ObjectiveFunction;

fn check_len(x: &[f64], reference: &[f64]) -> Result<()> {
    if x.len() != reference.len() {
        return Err(OptError::DimensionMismatch {
            what: "reference vector",
            expected: x.len(),
            found: reference.len(),
        });
    }
    Ok(())
}

/// Divides `x` element-wise by the non-zero `reference` values.
pub fn scale(x: &[f64], reference: &[f64]) -> Result<Vec<f64>> {
    check_len(x, reference)?;
    Ok(izip!(x, reference).map(|(xi, ri)| xi / ri).collect_vec())
}

/// Multiplies `x` element-wise by `reference`, undoing [`scale`].
pub fn descale(x: &[f64], reference: &[f64]) -> Result<Vec<f64>> {
    check_len(x, reference)?;
    Ok(izip!(x, reference).map(|(xi, ri)| xi * ri).collect_vec())
}

/// Presents an objective in scaled variables, so that a solver can work
/// with values of order one: `f_scaled(x) = f(descale(x, reference))`.
///
/// A design vector of the wrong length evaluates to NaN.
pub struct ScaledObjective<'a> {
    inner: &'a dyn ObjectiveFunction,
    reference: Vec<f64>,
}

impl<'a> ScaledObjective<'a> {
    /// Fails if any element of `reference` is zero or non-finite.
    pub fn new(inner: &'a dyn ObjectiveFunction, reference: &[f64]) -> Result<Self> {
        if reference.iter().any(|r| *r == 0.0 || !r.is_finite()) {
            return Err(OptError::InvalidOptions(
                "reference values must be non-zero and finite".to_string(),
            ));
        }
        Ok(Self {
            inner,
            reference: reference.to_vec(),
        })
    }

    pub fn reference(&self) -> &[f64] {
        &self.reference
    }
}

impl<'a> ObjectiveFunction for ScaledObjective<'a> {
    fn f(&self, x: &[f64]) -> f64 {
        match descale(x, &self.reference) {
            Ok(x) => self.inner.f(&x),
            Err(_) => f64::NAN,
        }
    }
}
