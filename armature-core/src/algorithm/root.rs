// Copyright (C) 2024 Laixer Equipment B.V.
// All rights reserved.
//
// This software may be modified and distributed under the terms
// of the included license.  See the LICENSE file for details.

//! Damped least-squares (Levenberg-Marquardt) root finder.
//!
//! Drives a residual function `F: R^n -> R^m` to zero from an initial guess.
//! Each iteration takes the step
//!
//! ```text
//! dx = -J^T (J J^T + mu I)^-1 F(x)
//! ```
//!
//! which is the minimum-norm Gauss-Newton step when `mu` vanishes. This makes
//! the finder usable for square systems (`m == n`) as well as redundant ones
//! (`m < n`), where it settles on the root closest to the initial guess.
//! The damping adapts: it shrinks after every accepted step and grows after a
//! rejected one.

use nalgebra::{DMatrix, DVector};

/// Initial relative damping factor.
const DEFAULT_DAMPING: f64 = 1e-3;
/// Relative damping is never reduced below this value.
const MIN_DAMPING: f64 = 1e-12;
/// Relative damping above this value means the finder stalled.
const MAX_DAMPING: f64 = 1e8;

/// A system of nonlinear equations.
pub trait Residual {
    /// Evaluate the residual at `x`.
    fn residual(&self, x: &DVector<f64>) -> DVector<f64>;

    /// Jacobian of the residual at `x`.
    ///
    /// Defaults to a forward-difference approximation. Implementors with an
    /// analytic Jacobian should override this.
    fn jacobian(&self, x: &DVector<f64>) -> DMatrix<f64> {
        let f0 = self.residual(x);
        let mut jacobian = DMatrix::zeros(f0.len(), x.len());

        for j in 0..x.len() {
            let h = f64::EPSILON.sqrt() * x[j].abs().max(1.0);

            let mut xh = x.clone();
            xh[j] += h;

            jacobian.set_column(j, &((self.residual(&xh) - &f0) / h));
        }

        jacobian
    }
}

/// Root finder configuration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RootConfig {
    /// Iteration budget, including rejected steps.
    pub max_iterations: u32,
    /// Residual norm at which the system is considered solved.
    pub tolerance: f64,
    /// Initial damping relative to the mean diagonal of `J J^T`.
    pub damping: f64,
}

impl Default for RootConfig {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            tolerance: 1e-6,
            damping: DEFAULT_DAMPING,
        }
    }
}

/// Outcome of a root search.
#[derive(Clone, Debug)]
pub struct Root {
    /// Best estimate found.
    pub x: DVector<f64>,
    /// Residual norm at `x`.
    pub residual: f64,
    /// Iterations spent.
    pub iterations: u32,
    /// Whether the residual norm is within tolerance.
    pub converged: bool,
}

/// Find a root of `problem` starting at `x0`.
pub fn find_root<R: Residual + ?Sized>(problem: &R, x0: DVector<f64>, config: &RootConfig) -> Root {
    let mut x = x0;
    let mut f = problem.residual(&x);
    let mut error = f.norm();
    let mut lambda = config.damping.max(MIN_DAMPING);
    let mut iterations = 0;

    while iterations < config.max_iterations {
        if error <= config.tolerance || !error.is_finite() {
            break;
        }

        iterations += 1;

        let jacobian = problem.jacobian(&x);
        let m = jacobian.nrows();

        let jjt = &jacobian * jacobian.transpose();
        let scale = (jjt.trace() / m as f64).max(f64::EPSILON);
        let damped = jjt + DMatrix::identity(m, m) * (lambda * scale);

        let Some(cholesky) = damped.cholesky() else {
            log::trace!("Root finder: damped system not positive definite");
            break;
        };

        let step = -(jacobian.transpose() * cholesky.solve(&f));
        let candidate = &x + &step;
        let candidate_f = problem.residual(&candidate);
        let candidate_error = candidate_f.norm();

        if candidate_error < error {
            x = candidate;
            f = candidate_f;
            error = candidate_error;
            lambda = (lambda * 0.1).max(MIN_DAMPING);
        } else {
            lambda *= 10.0;
            if lambda > MAX_DAMPING {
                log::trace!("Root finder: stalled at residual {:.3e}", error);
                break;
            }
        }
    }

    log::trace!(
        "Root finder: residual {:.3e} after {} iteration(s)",
        error,
        iterations
    );

    Root {
        converged: error <= config.tolerance,
        x,
        residual: error,
        iterations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Circle of radius 2 intersected with the line y = x.
    struct CircleLine;

    impl Residual for CircleLine {
        fn residual(&self, x: &DVector<f64>) -> DVector<f64> {
            DVector::from_column_slice(&[x[0].powi(2) + x[1].powi(2) - 4.0, x[0] - x[1]])
        }
    }

    /// Single equation in two unknowns, x + 2y = 5.
    struct Plane;

    impl Residual for Plane {
        fn residual(&self, x: &DVector<f64>) -> DVector<f64> {
            DVector::from_column_slice(&[x[0] + 2.0 * x[1] - 5.0])
        }

        fn jacobian(&self, _x: &DVector<f64>) -> DMatrix<f64> {
            DMatrix::from_row_slice(1, 2, &[1.0, 2.0])
        }
    }

    /// x^2 + 1 = 0 has no real root.
    struct NoRoot;

    impl Residual for NoRoot {
        fn residual(&self, x: &DVector<f64>) -> DVector<f64> {
            DVector::from_column_slice(&[x[0].powi(2) + 1.0])
        }
    }

    #[test]
    fn test_square_system() {
        let root = find_root(
            &CircleLine,
            DVector::from_column_slice(&[1.0, 0.5]),
            &RootConfig::default(),
        );

        assert!(root.converged);
        assert!(root.residual <= 1e-6);
        assert!((root.x[0] - 2_f64.sqrt()).abs() < 1e-6);
        assert!((root.x[1] - 2_f64.sqrt()).abs() < 1e-6);
    }

    #[test]
    fn test_redundant_minimum_norm() {
        let root = find_root(
            &Plane,
            DVector::from_column_slice(&[0.0, 0.0]),
            &RootConfig::default(),
        );

        // The minimum-norm solution of x + 2y = 5 is (1, 2).
        assert!(root.converged);
        assert!((root.x[0] - 1.0).abs() < 1e-4);
        assert!((root.x[1] - 2.0).abs() < 1e-4);
    }

    #[test]
    fn test_already_solved() {
        let root = find_root(
            &Plane,
            DVector::from_column_slice(&[5.0, 0.0]),
            &RootConfig::default(),
        );

        assert!(root.converged);
        assert_eq!(root.iterations, 0);
        assert_eq!(root.x[0], 5.0);
    }

    #[test]
    fn test_no_root() {
        let config = RootConfig::default();
        let root = find_root(&NoRoot, DVector::from_column_slice(&[3.0]), &config);

        assert!(!root.converged);
        assert!(root.iterations <= config.max_iterations);
        assert!(root.residual >= 1.0);
        assert!(root.residual < 10.0);
    }
}
