//! Steady-state OH, HO2 and RO2
//!
//! # What This Module Does
//!
//! Solves three coupled balance equations for $x = ([HO_2], [RO_2], [OH])$:
//!
//! $$F_1 = \frac{k_{RO_2+NO} [RO_2][NO](1-\alpha)}{k_{HO_2+NO}[NO] + 2k_{HO_2+HO_2}[HO_2] + k_{RO_2+HO_2}[RO_2]} - [HO_2]$$
//!
//! $$F_2 = \frac{R\,[OH]}{k_{RO_2+NO}[NO] + k_{RO_2+HO_2}[HO_2] + 2k_{RO_2+RO_2}[RO_2]} - [RO_2]$$
//!
//! $$F_3 = k_{OH+NO_2}[OH][NO_2] + \alpha k_{RO_2+NO}[RO_2][NO] + 2k_{RO_2+HO_2}[RO_2][HO_2]
//!        + 2k_{RO_2+RO_2}[RO_2]^2 + 2k_{HO_2+HO_2}[HO_2]^2 - P$$
//!
//! i.e. the HO2 balance, the RO2 balance and the total HOx budget (all
//! radical-terminating pathways equal the production rate $P$).
//!
//! # Algorithm
//!
//! 1. Evaluate the rate constants for the configured temperature and density
//! 2. Seed OH from the closed-form estimate; RO2 from the RO2 balance with
//!    NO as the only sink; HO2 equal to RO2
//! 3. Divide every concentration (and $P$) by $s = M / 10^{12}$ and multiply
//!    every rate constant by $s$, which keeps the unknowns of order one
//! 4. Find the root with a [`RootFinder`] (Newton-Raphson by default)
//! 5. Set components within the root finder tolerance of zero to zero and
//!    multiply the solution by $s$
//!
//! Failure to converge is returned as data in [`SteadyState::diagnostics`],
//! as is a solution with a negative component. Invalid inputs are rejected
//! before any work is done.

use crate::errors::{require_fraction, require_positive, HOxError, HOxResult};
use crate::initial_guess::initial_oh_estimate;
use crate::parameters::SolverConfig;
use crate::reactions::RateTable;
use crate::solver::{Diagnostics, NewtonRaphson, NonlinearSystem, RootFinder};
use crate::FloatValue;
use log::{debug, warn};
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

/// NO2:NO ratio used to split a total NOx concentration
pub const DEFAULT_NO2_TO_NO_RATIO: FloatValue = 4.0;

/// Position of HO2 in the state vector
pub const HO2: usize = 0;
/// Position of RO2 in the state vector
pub const RO2: usize = 1;
/// Position of OH in the state vector
pub const OH: usize = 2;

/// The three balance equations for fixed NO, NO2, production and reactivity
///
/// Concentrations and rate constants may be in any consistent units; the
/// solver uses a rescaled copy (see [`SteadyStateSystem::rescaled`]), while
/// the unscaled system is convenient for checking residual closure.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SteadyStateSystem {
    pub no: FloatValue,
    pub no2: FloatValue,
    pub production_rate: FloatValue,
    pub reactivity: FloatValue,
    pub branching_ratio: FloatValue,
    pub rates: RateTable,
}

impl SteadyStateSystem {
    pub fn new(
        no: FloatValue,
        no2: FloatValue,
        production_rate: FloatValue,
        reactivity: FloatValue,
        branching_ratio: FloatValue,
        rates: RateTable,
    ) -> Self {
        Self {
            no,
            no2,
            production_rate,
            reactivity,
            branching_ratio,
            rates,
        }
    }

    /// Express the system in units where concentrations are divided by `scale`
    ///
    /// Rate constants multiply two concentrations, so they are multiplied by
    /// `scale`; the reactivity is a first-order rate and is unchanged. Each
    /// residual of the rescaled system is the unscaled residual over `scale`.
    pub fn rescaled(&self, scale: FloatValue) -> Self {
        Self {
            no: self.no / scale,
            no2: self.no2 / scale,
            production_rate: self.production_rate / scale,
            reactivity: self.reactivity,
            branching_ratio: self.branching_ratio,
            rates: self.rates.scaled(scale),
        }
    }

    /// Evaluate $(F_1, F_2, F_3)$
    pub fn evaluate(&self, ho2: FloatValue, ro2: FloatValue, oh: FloatValue) -> [FloatValue; 3] {
        let k = &self.rates;
        let alpha = self.branching_ratio;

        let ho2_sink = k.ho2_no * self.no + 2.0 * k.ho2_ho2 * ho2 + k.ro2_ho2 * ro2;
        let ro2_sink = k.ro2_no * self.no + k.ro2_ho2 * ho2 + 2.0 * k.ro2_ro2 * ro2;

        let f1 = k.ro2_no * ro2 * self.no * (1.0 - alpha) / ho2_sink - ho2;
        let f2 = self.reactivity * oh / ro2_sink - ro2;
        let f3 = k.oh_no2 * oh * self.no2
            + alpha * k.ro2_no * ro2 * self.no
            + 2.0 * k.ro2_ho2 * ro2 * ho2
            + 2.0 * k.ro2_ro2 * ro2 * ro2
            + 2.0 * k.ho2_ho2 * ho2 * ho2
            - self.production_rate;

        [f1, f2, f3]
    }
}

impl NonlinearSystem for SteadyStateSystem {
    fn dimension(&self) -> usize {
        3
    }

    fn residual(&self, x: &DVector<FloatValue>) -> DVector<FloatValue> {
        DVector::from_row_slice(&self.evaluate(x[HO2], x[RO2], x[OH]))
    }

    fn jacobian(&self, x: &DVector<FloatValue>) -> Option<DMatrix<FloatValue>> {
        let k = &self.rates;
        let alpha = self.branching_ratio;
        let (ho2, ro2, oh) = (x[HO2], x[RO2], x[OH]);

        let ho2_sink = k.ho2_no * self.no + 2.0 * k.ho2_ho2 * ho2 + k.ro2_ho2 * ro2;
        let ro2_sink = k.ro2_no * self.no + k.ro2_ho2 * ho2 + 2.0 * k.ro2_ro2 * ro2;
        let ho2_source = k.ro2_no * ro2 * self.no * (1.0 - alpha);
        let ro2_source = self.reactivity * oh;

        let mut jacobian = DMatrix::zeros(3, 3);

        // HO2 balance
        jacobian[(0, HO2)] = -ho2_source * 2.0 * k.ho2_ho2 / ho2_sink.powi(2) - 1.0;
        jacobian[(0, RO2)] = k.ro2_no * self.no * (1.0 - alpha) / ho2_sink
            - ho2_source * k.ro2_ho2 / ho2_sink.powi(2);

        // RO2 balance
        jacobian[(1, HO2)] = -ro2_source * k.ro2_ho2 / ro2_sink.powi(2);
        jacobian[(1, RO2)] = -ro2_source * 2.0 * k.ro2_ro2 / ro2_sink.powi(2) - 1.0;
        jacobian[(1, OH)] = self.reactivity / ro2_sink;

        // HOx budget
        jacobian[(2, HO2)] = 2.0 * k.ro2_ho2 * ro2 + 4.0 * k.ho2_ho2 * ho2;
        jacobian[(2, RO2)] =
            alpha * k.ro2_no * self.no + 2.0 * k.ro2_ho2 * ho2 + 4.0 * k.ro2_ro2 * ro2;
        jacobian[(2, OH)] = k.oh_no2 * self.no2;

        Some(jacobian)
    }
}

/// Solved steady state together with everything needed to interpret it
///
/// Concentrations are in molecules cm^-3, the production rate in
/// molecules cm^-3 s^-1 and the reactivity in s^-1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SteadyState {
    pub no: FloatValue,
    pub no2: FloatValue,
    pub oh: FloatValue,
    pub ho2: FloatValue,
    pub ro2: FloatValue,
    pub reactivity: FloatValue,
    pub production_rate: FloatValue,
    pub branching_ratio: FloatValue,
    pub rates: RateTable,
    pub config: SolverConfig,
    /// Diagnostics of the root finder; the residual norm is in the rescaled
    /// units the system was solved in
    pub diagnostics: Diagnostics,
}

impl SteadyState {
    pub fn nox(&self) -> FloatValue {
        self.no + self.no2
    }

    pub fn hox(&self) -> FloatValue {
        self.oh + self.ho2 + self.ro2
    }

    /// The balance equations in unscaled units
    pub fn system(&self) -> SteadyStateSystem {
        SteadyStateSystem::new(
            self.no,
            self.no2,
            self.production_rate,
            self.reactivity,
            self.branching_ratio,
            self.rates,
        )
    }

    /// Unscaled residuals $(F_1, F_2, F_3)$ at the stored solution
    pub fn residuals(&self) -> [FloatValue; 3] {
        self.system().evaluate(self.ho2, self.ro2, self.oh)
    }
}

/// Solve for the steady state with the default Newton-Raphson root finder
///
/// # Arguments
/// * `no`, `no2` - NO and NO2 (molecules cm^-3, strictly positive)
/// * `production_rate` - HOx production (molecules cm^-3 s^-1, strictly positive)
/// * `reactivity` - OH reactivity towards VOCs (s^-1, strictly positive)
/// * `branching_ratio` - alkyl nitrate yield of RO2 + NO, in [0, 1]
/// * `config` - ambient conditions and rate constants
pub fn solve(
    no: FloatValue,
    no2: FloatValue,
    production_rate: FloatValue,
    reactivity: FloatValue,
    branching_ratio: FloatValue,
    config: &SolverConfig,
) -> HOxResult<SteadyState> {
    solve_with(
        no,
        no2,
        production_rate,
        reactivity,
        branching_ratio,
        config,
        &NewtonRaphson::default(),
    )
}

/// Solve for the steady state with a caller supplied root finder
#[allow(clippy::too_many_arguments)]
pub fn solve_with(
    no: FloatValue,
    no2: FloatValue,
    production_rate: FloatValue,
    reactivity: FloatValue,
    branching_ratio: FloatValue,
    config: &SolverConfig,
    root_finder: &dyn RootFinder,
) -> HOxResult<SteadyState> {
    config.validate()?;
    require_positive("no", no)?;
    require_positive("no2", no2)?;
    require_positive("production_rate", production_rate)?;
    require_positive("reactivity", reactivity)?;
    require_fraction("branching_ratio", branching_ratio)?;

    let rates = RateTable::from_config(config);

    let oh_guess = initial_oh_estimate(
        no,
        no2,
        production_rate,
        reactivity,
        branching_ratio,
        config.k4,
        config.k2eff,
        config.k5eff,
    )?;
    let ro2_guess = oh_guess * reactivity / (rates.ro2_no * no);
    let ho2_guess = ro2_guess;

    let scale = config.unit_scale();
    if !(scale.is_finite() && scale > 0.0) || !ro2_guess.is_finite() {
        return Err(HOxError::NumericDomain(format!(
            "cannot rescale the system (scale={scale}, RO2 guess={ro2_guess})"
        )));
    }

    let system = SteadyStateSystem::new(
        no,
        no2,
        production_rate,
        reactivity,
        branching_ratio,
        rates,
    )
    .rescaled(scale);
    let x0 = DVector::from_vec(vec![ho2_guess / scale, ro2_guess / scale, oh_guess / scale]);

    debug!(
        "solving HOx steady state: scale={:.3e}, guess OH={:.3e} HO2={:.3e} RO2={:.3e}",
        scale, oh_guess, ho2_guess, ro2_guess
    );

    let report = root_finder.find_root(&system, x0);
    let mut root = report.root;
    let mut diagnostics = report.diagnostics;

    // A converged root is only known to within the tolerance, so components
    // that small are zero (HO2 when every RO2 + NO gives a nitrate)
    if diagnostics.converged {
        let tolerance = root_finder.tolerance();
        for value in root.iter_mut() {
            if value.abs() <= tolerance {
                *value = 0.0;
            }
        }
        diagnostics.non_negative = root.iter().all(|v| *v >= 0.0);
    }

    let ho2 = root[HO2] * scale;
    let ro2 = root[RO2] * scale;
    let oh = root[OH] * scale;

    debug!(
        "{} after {} iterations (|F| = {:.3e}): OH={:.3e} HO2={:.3e} RO2={:.3e}",
        diagnostics.termination, diagnostics.iterations, diagnostics.residual_norm, oh, ho2, ro2
    );
    if !diagnostics.converged {
        warn!(
            "HOx steady state did not converge: {} (|F| = {:.3e})",
            diagnostics.termination, diagnostics.residual_norm
        );
    } else if !diagnostics.non_negative {
        warn!(
            "HOx steady state converged to a negative concentration: OH={:.3e} HO2={:.3e} RO2={:.3e}",
            oh, ho2, ro2
        );
    }

    Ok(SteadyState {
        no,
        no2,
        oh,
        ho2,
        ro2,
        reactivity,
        production_rate,
        branching_ratio,
        rates,
        config: *config,
        diagnostics,
    })
}

/// Solve from a total NOx concentration split with a fixed NO2:NO ratio
pub fn solve_nox(
    nox_total: FloatValue,
    no2_to_no_ratio: FloatValue,
    production_rate: FloatValue,
    reactivity: FloatValue,
    branching_ratio: FloatValue,
    config: &SolverConfig,
) -> HOxResult<SteadyState> {
    solve_nox_with(
        nox_total,
        no2_to_no_ratio,
        production_rate,
        reactivity,
        branching_ratio,
        config,
        &NewtonRaphson::default(),
    )
}

/// [`solve_nox`] with a caller supplied root finder
#[allow(clippy::too_many_arguments)]
pub fn solve_nox_with(
    nox_total: FloatValue,
    no2_to_no_ratio: FloatValue,
    production_rate: FloatValue,
    reactivity: FloatValue,
    branching_ratio: FloatValue,
    config: &SolverConfig,
    root_finder: &dyn RootFinder,
) -> HOxResult<SteadyState> {
    let (no, no2) = split_nox(nox_total, no2_to_no_ratio)?;
    solve_with(
        no,
        no2,
        production_rate,
        reactivity,
        branching_ratio,
        config,
        root_finder,
    )
}

/// Split NOx into (NO, NO2) with NO2 = ratio * NO
pub fn split_nox(
    nox_total: FloatValue,
    no2_to_no_ratio: FloatValue,
) -> HOxResult<(FloatValue, FloatValue)> {
    require_positive("nox_total", nox_total)?;
    require_positive("no2_to_no_ratio", no2_to_no_ratio)?;
    let no = nox_total / (1.0 + no2_to_no_ratio);
    Ok((no, no * no2_to_no_ratio))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::{finite_difference_jacobian, RootReport, Termination};
    use crate::units::{number_density, ppb_per_hour_to_rate, ppb_to_concentration};
    use approx::assert_relative_eq;

    fn surface_config() -> SolverConfig {
        SolverConfig {
            air_density: number_density(298.0, 101325.0),
            ..SolverConfig::default()
        }
    }

    /// Returns a fixed point in rescaled units, as if it had converged there
    struct FixedRoot([f64; 3]);

    impl RootFinder for FixedRoot {
        fn find_root(&self, _system: &dyn NonlinearSystem, _x0: DVector<f64>) -> RootReport {
            RootReport::new(
                DVector::from_row_slice(&self.0),
                Termination::Converged,
                1,
                1,
                0.0,
            )
        }

        fn tolerance(&self) -> f64 {
            1e-9
        }
    }

    fn surface_system() -> SteadyStateSystem {
        let config = surface_config();
        let m = config.air_density;
        SteadyStateSystem::new(
            ppb_to_concentration(1.0, m),
            ppb_to_concentration(4.0, m),
            ppb_per_hour_to_rate(2.5, m),
            5.8,
            0.04,
            RateTable::from_config(&config),
        )
    }

    #[test]
    fn test_analytic_jacobian_matches_finite_differences() {
        let system = surface_system().rescaled(surface_config().unit_scale());
        let x = DVector::from_vec(vec![15.0, 17.0, 0.45]);
        let fx = system.residual(&x);

        let analytic = system.jacobian(&x).unwrap();
        let numeric = finite_difference_jacobian(&system, &x, &fx);

        for i in 0..3 {
            for j in 0..3 {
                assert_relative_eq!(
                    analytic[(i, j)],
                    numeric[(i, j)],
                    epsilon = 1e-6,
                    max_relative = 1e-5
                );
            }
        }
    }

    #[test]
    fn test_rescaled_residuals_are_unscaled_over_scale() {
        let system = surface_system();
        let scale = 2.46e7;
        let rescaled = system.rescaled(scale);

        let (ho2, ro2, oh) = (4e8, 4.5e8, 1e7);
        let unscaled = system.evaluate(ho2, ro2, oh);
        let scaled = rescaled.evaluate(ho2 / scale, ro2 / scale, oh / scale);

        for i in 0..3 {
            assert_relative_eq!(scaled[i] * scale, unscaled[i], max_relative = 1e-10);
        }
    }

    #[test]
    fn test_solve_converges_near_surface() {
        let config = surface_config();
        let m = config.air_density;
        let state = solve(
            ppb_to_concentration(1.0, m),
            ppb_to_concentration(4.0, m),
            ppb_per_hour_to_rate(2.5, m),
            5.8,
            0.04,
            &config,
        )
        .unwrap();

        assert!(state.diagnostics.converged, "{:?}", state.diagnostics);
        assert!(state.diagnostics.non_negative);
        assert!(state.oh > 0.0 && state.ho2 > 0.0 && state.ro2 > 0.0);
        assert_eq!(state.config, config);
    }

    #[test]
    fn test_inputs_are_echoed() {
        let config = SolverConfig::default();
        let state = solve(2e10, 8e10, 1.5e7, 4.0, 0.05, &config).unwrap();
        assert_eq!(state.no, 2e10);
        assert_eq!(state.no2, 8e10);
        assert_eq!(state.production_rate, 1.5e7);
        assert_eq!(state.reactivity, 4.0);
        assert_eq!(state.branching_ratio, 0.05);
        assert_eq!(state.rates, RateTable::from_config(&config));
    }

    #[test]
    fn test_rejects_branching_ratio_outside_unit_interval() {
        let config = SolverConfig::default();
        let err = solve(2e10, 8e10, 1.5e7, 4.0, 1.5, &config).unwrap_err();
        assert!(matches!(err, HOxError::PreconditionViolation(_)));
        let err = solve(2e10, 8e10, 1.5e7, 4.0, -0.1, &config).unwrap_err();
        assert!(matches!(err, HOxError::PreconditionViolation(_)));
    }

    #[test]
    fn test_rejects_non_positive_concentrations() {
        let config = SolverConfig::default();
        for (no, no2, p, r) in [
            (0.0, 8e10, 1.5e7, 4.0),
            (2e10, -8e10, 1.5e7, 4.0),
            (2e10, 8e10, 0.0, 4.0),
            (2e10, 8e10, 1.5e7, 0.0),
            (f64::NAN, 8e10, 1.5e7, 4.0),
        ] {
            let err = solve(no, no2, p, r, 0.05, &config).unwrap_err();
            assert!(
                matches!(err, HOxError::PreconditionViolation(_)),
                "expected precondition violation for {:?}",
                (no, no2, p, r)
            );
        }
    }

    #[test]
    fn test_rejects_invalid_config() {
        let config = SolverConfig {
            air_density: 0.0,
            ..SolverConfig::default()
        };
        let err = solve(2e10, 8e10, 1.5e7, 4.0, 0.05, &config).unwrap_err();
        assert!(matches!(err, HOxError::InvalidConfig(_)));
    }

    #[test]
    fn test_split_nox() {
        let (no, no2) = split_nox(5.0, DEFAULT_NO2_TO_NO_RATIO).unwrap();
        assert_relative_eq!(no, 1.0, max_relative = 1e-12);
        assert_relative_eq!(no2, 4.0, max_relative = 1e-12);
        assert!(split_nox(5.0, 0.0).is_err());
        assert!(split_nox(0.0, 4.0).is_err());
    }

    #[test]
    fn test_solve_nox_matches_explicit_split() {
        let config = SolverConfig::default();
        let from_total = solve_nox(1e11, 4.0, 1.5e7, 4.0, 0.05, &config).unwrap();
        let explicit = solve(2e10, 8e10, 1.5e7, 4.0, 0.05, &config).unwrap();
        assert_relative_eq!(from_total.oh, explicit.oh, max_relative = 1e-12);
        assert_relative_eq!(from_total.ho2, explicit.ho2, max_relative = 1e-12);
        assert_relative_eq!(from_total.ro2, explicit.ro2, max_relative = 1e-12);
    }

    #[test]
    fn test_full_nitrate_branching_gives_zero_ho2() {
        let config = surface_config();
        let m = config.air_density;
        for nox_ppb in [0.001, 1.0, 20.0] {
            let state = solve_nox(
                ppb_to_concentration(nox_ppb, m),
                4.0,
                ppb_per_hour_to_rate(1.0, m),
                1.0,
                1.0,
                &config,
            )
            .unwrap();

            assert!(state.diagnostics.converged, "{:?}", state.diagnostics);
            assert!(state.diagnostics.non_negative, "HO2 = {:e}", state.ho2);
            assert_eq!(state.ho2, 0.0);
            assert!(state.ro2 > 0.0 && state.oh > 0.0);
        }
    }

    #[test]
    fn test_components_within_tolerance_are_zeroed() {
        let config = SolverConfig::default();
        let state = solve_with(
            2e10,
            8e10,
            1.5e7,
            4.0,
            0.05,
            &config,
            &FixedRoot([-1e-15, 12.0, 0.5]),
        )
        .unwrap();

        assert_eq!(state.ho2, 0.0);
        assert!(state.diagnostics.non_negative);
        assert_relative_eq!(state.ro2, 12.0 * config.unit_scale(), max_relative = 1e-12);
    }

    #[test]
    fn test_negative_beyond_tolerance_is_flagged() {
        let config = SolverConfig::default();
        let state = solve_with(
            2e10,
            8e10,
            1.5e7,
            4.0,
            0.05,
            &config,
            &FixedRoot([-1e-3, 12.0, 0.5]),
        )
        .unwrap();

        assert!(state.ho2 < 0.0);
        assert!(!state.diagnostics.non_negative);
    }

    #[test]
    fn test_underflowing_no_is_a_numeric_domain_error() {
        // k * NO underflows to zero, leaving the RO2 guess undefined
        let err = solve(1e-320, 8e10, 1.5e7, 4.0, 0.05, &SolverConfig::default()).unwrap_err();
        assert!(matches!(err, HOxError::NumericDomain(_)), "{}", err);
    }

    #[test]
    fn test_underflowing_unit_scale_is_a_numeric_domain_error() {
        let config = SolverConfig {
            air_density: 1e-320,
            ..SolverConfig::default()
        };
        assert!(config.validate().is_ok());
        let err = solve(2e10, 8e10, 1.5e7, 4.0, 0.05, &config).unwrap_err();
        assert!(matches!(err, HOxError::NumericDomain(_)), "{}", err);
    }
}
