use super::{
    backtrack, evaluate_jacobian, residual_norm, NonlinearSystem, RootFinder, RootReport,
    Termination, DEFAULT_MAX_ITERATIONS, DEFAULT_TOLERANCE,
};
use crate::FloatValue;
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

/// Broyden's method (quasi-Newton)
///
/// Starts from the inverse of the true Jacobian and afterwards updates the
/// inverse with the Sherman-Morrison form of Broyden's "good" update:
///
/// $$B^{-1} \leftarrow B^{-1} + \frac{(s - B^{-1} y)\, s^T B^{-1}}{s^T B^{-1} y}$$
///
/// where $s$ is the step and $y$ the change in residual. If a step along an
/// updated inverse cannot reduce the residual, the inverse is rebuilt from
/// the Jacobian before giving up.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Broyden {
    /// default: 10000
    pub max_iterations: usize,
    /// default: 1e-9
    pub tolerance: FloatValue,
    /// default: 1e-4
    pub sufficient_decrease: FloatValue,
    /// default: 1e-10
    pub min_step: FloatValue,
}

impl Default for Broyden {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            tolerance: DEFAULT_TOLERANCE,
            sufficient_decrease: 1e-4,
            min_step: 1e-10,
        }
    }
}

impl Broyden {
    pub fn new(max_iterations: usize, tolerance: FloatValue) -> Self {
        Self {
            max_iterations,
            tolerance,
            ..Self::default()
        }
    }
}

impl RootFinder for Broyden {
    fn find_root(&self, system: &dyn NonlinearSystem, x0: DVector<FloatValue>) -> RootReport {
        let mut x = x0;
        let mut fx = system.residual(&x);
        let mut evaluations = 1;
        let mut norm = residual_norm(&fx);
        let mut iterations = 0;
        let mut inverse: Option<DMatrix<FloatValue>> = None;

        let termination = loop {
            if norm <= self.tolerance {
                break Termination::Converged;
            }
            if iterations >= self.max_iterations {
                break Termination::MaxIterations;
            }
            iterations += 1;

            let (b_inv, fresh) = match inverse.take() {
                Some(b_inv) => (b_inv, false),
                None => {
                    let jacobian = evaluate_jacobian(system, &x, &fx, &mut evaluations);
                    match jacobian.try_inverse() {
                        Some(b_inv) => (b_inv, true),
                        None => break Termination::SingularJacobian,
                    }
                }
            };

            let step = -(&b_inv * &fx);
            if !step.iter().all(|v| v.is_finite()) {
                if fresh {
                    break Termination::SingularJacobian;
                }
                continue;
            }

            let (x_new, f_new) = match backtrack(
                system,
                &x,
                &fx,
                &step,
                self.sufficient_decrease,
                self.min_step,
                &mut evaluations,
            ) {
                Some(accepted) => accepted,
                // A stale inverse may not give a descent direction
                None if !fresh => continue,
                None => break Termination::LineSearchFailed,
            };

            let s = &x_new - &x;
            let y = &f_new - &fx;
            let b_inv_y = &b_inv * &y;
            let denominator = s.dot(&b_inv_y);

            inverse = if denominator.abs() > FloatValue::EPSILON * s.norm() * b_inv_y.norm() {
                let s_t_b_inv = s.transpose() * &b_inv;
                Some(b_inv + (&s - &b_inv_y) * s_t_b_inv / denominator)
            } else {
                None
            };

            x = x_new;
            fx = f_new;
            norm = residual_norm(&fx);
            log::trace!("broyden iteration {}: |F| = {:.3e}", iterations, norm);
        };

        RootReport::new(x, termination, iterations, evaluations, norm)
    }

    fn tolerance(&self) -> FloatValue {
        self.tolerance
    }
}
