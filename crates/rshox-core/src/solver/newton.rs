use super::{
    backtrack, evaluate_jacobian, residual_norm, NonlinearSystem, RootFinder, RootReport,
    Termination, DEFAULT_MAX_ITERATIONS, DEFAULT_TOLERANCE,
};
use crate::FloatValue;
use nalgebra::DVector;
use serde::{Deserialize, Serialize};

/// Newton-Raphson with a backtracking line search
///
/// Each iteration solves $J \Delta x = -F$ by LU decomposition and then
/// shortens the step until the squared residual decreases sufficiently.
/// No bounds are imposed on the iterates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewtonRaphson {
    /// default: 10000
    pub max_iterations: usize,
    /// Infinity norm of the residual below which the iteration stops
    /// default: 1e-9
    pub tolerance: FloatValue,
    /// Armijo constant
    /// default: 1e-4
    pub sufficient_decrease: FloatValue,
    /// Smallest step length tried by the line search
    /// default: 1e-10
    pub min_step: FloatValue,
}

impl Default for NewtonRaphson {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            tolerance: DEFAULT_TOLERANCE,
            sufficient_decrease: 1e-4,
            min_step: 1e-10,
        }
    }
}

impl NewtonRaphson {
    pub fn new(max_iterations: usize, tolerance: FloatValue) -> Self {
        Self {
            max_iterations,
            tolerance,
            ..Self::default()
        }
    }
}

impl RootFinder for NewtonRaphson {
    fn find_root(&self, system: &dyn NonlinearSystem, x0: DVector<FloatValue>) -> RootReport {
        let mut x = x0;
        let mut fx = system.residual(&x);
        let mut evaluations = 1;
        let mut norm = residual_norm(&fx);
        let mut iterations = 0;

        let termination = loop {
            if norm <= self.tolerance {
                break Termination::Converged;
            }
            if iterations >= self.max_iterations {
                break Termination::MaxIterations;
            }
            iterations += 1;

            let jacobian = evaluate_jacobian(system, &x, &fx, &mut evaluations);
            let step = match jacobian.lu().solve(&(-&fx)) {
                Some(step) if step.iter().all(|v| v.is_finite()) => step,
                _ => break Termination::SingularJacobian,
            };

            match backtrack(
                system,
                &x,
                &fx,
                &step,
                self.sufficient_decrease,
                self.min_step,
                &mut evaluations,
            ) {
                Some((x_new, f_new)) => {
                    x = x_new;
                    fx = f_new;
                    norm = residual_norm(&fx);
                    log::trace!("newton iteration {}: |F| = {:.3e}", iterations, norm);
                }
                None => break Termination::LineSearchFailed,
            }
        };

        RootReport::new(x, termination, iterations, evaluations, norm)
    }

    fn tolerance(&self) -> FloatValue {
        self.tolerance
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_systems::*;
    use super::*;
    use approx::assert_relative_eq;

    fn expected_root() -> (f64, f64) {
        let s6 = 6.0f64.sqrt();
        let s2 = 2.0f64.sqrt();
        ((s6 + s2) / 2.0, (s6 - s2) / 2.0)
    }

    #[test]
    fn test_converges_with_analytic_jacobian() {
        let report = NewtonRaphson::default().find_root(&Circle, DVector::from_vec(vec![2.0, 0.3]));
        let (x, y) = expected_root();

        assert!(report.diagnostics.converged);
        assert_eq!(report.diagnostics.termination, Termination::Converged);
        assert!(report.diagnostics.iterations < 20);
        assert_relative_eq!(report.root[0], x, epsilon = 1e-8);
        assert_relative_eq!(report.root[1], y, epsilon = 1e-8);
    }

    #[test]
    fn test_converges_with_finite_differences() {
        let report = NewtonRaphson::default()
            .find_root(&CircleNoJacobian, DVector::from_vec(vec![2.0, 0.3]));
        let (x, y) = expected_root();

        assert!(report.diagnostics.converged);
        assert_relative_eq!(report.root[0], x, epsilon = 1e-7);
        assert_relative_eq!(report.root[1], y, epsilon = 1e-7);
        // Two extra evaluations per Jacobian
        assert!(report.diagnostics.function_evaluations >= 3 * report.diagnostics.iterations);
    }

    #[test]
    fn test_converged_start_takes_no_iterations() {
        let (x, y) = expected_root();
        let report = NewtonRaphson::default().find_root(&Circle, DVector::from_vec(vec![x, y]));
        assert!(report.diagnostics.converged);
        assert_eq!(report.diagnostics.iterations, 0);
        assert_eq!(report.diagnostics.function_evaluations, 1);
    }

    #[test]
    fn test_reports_failure_without_panicking() {
        let report = NewtonRaphson::new(50, 1e-12)
            .find_root(&NoRealRoot, DVector::from_vec(vec![0.5]));
        assert!(!report.diagnostics.converged);
        assert!(report.diagnostics.residual_norm >= 1.0);
        assert!(report.diagnostics.iterations <= 50);
    }

    #[test]
    fn test_iteration_budget() {
        let report =
            NewtonRaphson::new(1, 1e-14).find_root(&Circle, DVector::from_vec(vec![3.0, 1.0]));
        assert!(!report.diagnostics.converged);
        assert_eq!(report.diagnostics.termination, Termination::MaxIterations);
        assert_eq!(report.diagnostics.iterations, 1);
    }
}
