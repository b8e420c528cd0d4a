use itertools::{izip, Itertools};

/// Computes the dot-product of `a` and `b`.
pub fn dot(a: &[f64], b: &[f64]) -> f64 {
    izip!(a, b).map(|(ai, bi)| ai * bi).sum()
}

/// Computes the infinity norm: `max(abs(a))`
pub fn norm_inf(a: &[f64]) -> f64 {
    a.iter().fold(0.0, |max: f64, v| max.max(v.abs()))
}

/// Returns the 2-norm (Euclidean) of `a`.
pub fn norm(a: &[f64]) -> f64 {
    dot(a, a).sqrt()
}

/// Returns `x + alpha*s`.
pub fn axpy(alpha: f64, s: &[f64], x: &[f64]) -> Vec<f64> {
    izip!(x, s).map(|(xi, si)| xi + alpha * si).collect_vec()
}

/// Returns `norm(a - b)`.
pub fn distance(a: &[f64], b: &[f64]) -> f64 {
    izip!(a, b)
        .map(|(ai, bi)| (ai - bi) * (ai - bi))
        .sum::<f64>()
        .sqrt()
}

/// Returns `a - b`.
pub(crate) fn sub(a: &[f64], b: &[f64]) -> Vec<f64> {
    izip!(a, b).map(|(ai, bi)| ai - bi).collect_vec()
}

pub(crate) fn all_finite(a: &[f64]) -> bool {
    a.iter().all(|v| v.is_finite())
}
