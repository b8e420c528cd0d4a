mod alm;
mod common;
mod diff;
mod error;
mod hessian;
mod linesearch;
mod math;
mod penalty;
mod scaling;
#[cfg(test)]
mod tests;
mod traits;
mod unconstrained;

pub use alm::augmented_lagrangian;
pub use common::*;
pub use diff::*;
pub use error::*;
pub use hessian::*;
pub use linesearch::*;
pub use math::{axpy, distance, dot, norm, norm_inf};
pub use penalty::*;
pub use scaling::*;
pub use traits::*;
pub use unconstrained::{conjugate_gradient, quasi_newton, steepest_descent};
