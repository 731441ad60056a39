//! Root finding for small nonlinear systems
//!
//! The steady-state solver does not depend on a particular algorithm: it
//! hands a [`NonlinearSystem`] and an initial guess to any [`RootFinder`] and
//! receives the final iterate together with convergence [`Diagnostics`].
//! A root finder never fails; running out of iterations or stalling is
//! reported through the diagnostics so that callers sweeping over many
//! conditions are not interrupted.
//!
//! # Strategies
//!
//! - [`NewtonRaphson`] (default): Newton steps with an Armijo backtracking
//!   line search on $\frac{1}{2}\lVert F \rVert^2$.
//! - [`Broyden`]: quasi-Newton updates of the inverse Jacobian, refreshed
//!   from the true Jacobian whenever an update stops making progress.
//!
//! Systems that cannot supply an analytic Jacobian fall back to forward
//! finite differences ([`finite_difference_jacobian`]).

mod broyden;
mod newton;

pub use broyden::Broyden;
pub use newton::NewtonRaphson;

use crate::FloatValue;
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default iteration budget for the root finders
pub const DEFAULT_MAX_ITERATIONS: usize = 10_000;

/// Default tolerance on the infinity norm of the residual
pub const DEFAULT_TOLERANCE: FloatValue = 1e-9;

/// A square system of equations $F(x) = 0$
pub trait NonlinearSystem {
    /// Number of unknowns (and equations)
    fn dimension(&self) -> usize;

    /// Evaluate the residual vector at `x`
    fn residual(&self, x: &DVector<FloatValue>) -> DVector<FloatValue>;

    /// Analytic Jacobian $\partial F_i / \partial x_j$ at `x`, if available
    fn jacobian(&self, _x: &DVector<FloatValue>) -> Option<DMatrix<FloatValue>> {
        None
    }
}

/// A strategy for locating a root of a [`NonlinearSystem`]
pub trait RootFinder {
    fn find_root(&self, system: &dyn NonlinearSystem, x0: DVector<FloatValue>) -> RootReport;

    /// Residual tolerance at which a root is accepted
    fn tolerance(&self) -> FloatValue;
}

/// Why a root finder stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Termination {
    /// The residual norm fell below the tolerance
    Converged,
    /// The iteration budget was exhausted
    MaxIterations,
    /// The linear system for the step could not be solved
    SingularJacobian,
    /// No step length reduced the residual
    LineSearchFailed,
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Termination::Converged => "converged",
            Termination::MaxIterations => "iteration budget exhausted",
            Termination::SingularJacobian => "singular Jacobian",
            Termination::LineSearchFailed => "line search failed",
        };
        write!(f, "{}", text)
    }
}

/// Convergence information attached to every solve
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics {
    pub converged: bool,
    pub termination: Termination,
    /// Number of accepted (or attempted, for the last one) iterations
    pub iterations: usize,
    /// Number of residual evaluations, including finite-difference columns
    pub function_evaluations: usize,
    /// Infinity norm of the residual at the returned point, in the units the
    /// system was solved in
    pub residual_norm: FloatValue,
    /// Whether every component of the returned point is non-negative
    pub non_negative: bool,
}

/// Result of a root search
#[derive(Debug, Clone)]
pub struct RootReport {
    pub root: DVector<FloatValue>,
    pub diagnostics: Diagnostics,
}

impl RootReport {
    pub(crate) fn new(
        root: DVector<FloatValue>,
        termination: Termination,
        iterations: usize,
        function_evaluations: usize,
        residual_norm: FloatValue,
    ) -> Self {
        let non_negative = root.iter().all(|v| *v >= 0.0);
        Self {
            root,
            diagnostics: Diagnostics {
                converged: termination == Termination::Converged,
                termination,
                iterations,
                function_evaluations,
                residual_norm,
                non_negative,
            },
        }
    }
}

/// Infinity norm, treating any non-finite component as an infinite residual
pub fn residual_norm(residual: &DVector<FloatValue>) -> FloatValue {
    if residual.iter().all(|v| v.is_finite()) {
        residual.amax()
    } else {
        FloatValue::INFINITY
    }
}

/// Forward-difference approximation of the Jacobian
///
/// `fx` must be the residual already evaluated at `x`. Each column costs one
/// residual evaluation.
pub fn finite_difference_jacobian(
    system: &dyn NonlinearSystem,
    x: &DVector<FloatValue>,
    fx: &DVector<FloatValue>,
) -> DMatrix<FloatValue> {
    let n = x.len();
    let mut jacobian = DMatrix::zeros(fx.len(), n);
    let sqrt_eps = FloatValue::EPSILON.sqrt();

    for j in 0..n {
        let mut perturbed = x.clone();
        perturbed[j] += sqrt_eps * x[j].abs().max(1.0);
        // Use the representable step rather than the requested one
        let h = perturbed[j] - x[j];
        let column = (system.residual(&perturbed) - fx) / h;
        jacobian.set_column(j, &column);
    }

    jacobian
}

/// Analytic Jacobian when the system has one, otherwise finite differences
pub(crate) fn evaluate_jacobian(
    system: &dyn NonlinearSystem,
    x: &DVector<FloatValue>,
    fx: &DVector<FloatValue>,
    evaluations: &mut usize,
) -> DMatrix<FloatValue> {
    match system.jacobian(x) {
        Some(jacobian) => jacobian,
        None => {
            *evaluations += x.len();
            finite_difference_jacobian(system, x, fx)
        }
    }
}

/// Backtracking line search along `step`
///
/// Halves the step length until the Armijo condition
/// $\phi(x + \lambda s) \le (1 - 2 c \lambda)\,\phi(x)$ holds for
/// $\phi = \frac{1}{2}\lVert F \rVert^2$, or gives up below `min_step`.
/// Returns the accepted point and its residual.
pub(crate) fn backtrack(
    system: &dyn NonlinearSystem,
    x: &DVector<FloatValue>,
    fx: &DVector<FloatValue>,
    step: &DVector<FloatValue>,
    sufficient_decrease: FloatValue,
    min_step: FloatValue,
    evaluations: &mut usize,
) -> Option<(DVector<FloatValue>, DVector<FloatValue>)> {
    let merit = 0.5 * fx.norm_squared();
    let mut lambda = 1.0;

    while lambda >= min_step {
        let trial = x + step * lambda;
        let f_trial = system.residual(&trial);
        *evaluations += 1;

        let merit_trial = 0.5 * f_trial.norm_squared();
        if merit_trial.is_finite()
            && merit_trial <= (1.0 - 2.0 * sufficient_decrease * lambda) * merit
        {
            log::trace!("accepted step length {:.3e}", lambda);
            return Some((trial, f_trial));
        }
        lambda *= 0.5;
    }

    None
}
