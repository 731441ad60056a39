//! Steady-state HOx radical chemistry
//!
//! Computes the steady-state concentrations of OH, HO2 and RO2 from fixed
//! NO, NO2, a HOx production rate, the OH reactivity towards VOCs and the
//! alkyl nitrate branching ratio.
//!
//! # Module Organisation
//!
//! - `rate_constants`: temperature and density dependent rate constants
//! - `initial_guess`: closed-form OH estimate used to seed the solver
//! - `reactions`: reaction labels and the table of rate constants in play
//! - `parameters`: the immutable [`SolverConfig`]
//! - `solver`: pluggable root finders (Newton-Raphson, Broyden)
//! - `steady_state`: the residual system and the solve entry points
//! - `derived`: NOx lifetimes and ozone production efficiency
//! - `units`: number density and mixing ratio conversions
//!
//! # Example
//!
//! ```
//! use rshox_core::{solve_nox, units, SolverConfig, DEFAULT_NO2_TO_NO_RATIO};
//!
//! let air = units::number_density(298.0, 101325.0);
//! let config = SolverConfig { air_density: air, ..SolverConfig::default() };
//!
//! let state = solve_nox(
//!     units::ppb_to_concentration(5.0, air),
//!     DEFAULT_NO2_TO_NO_RATIO,
//!     units::ppb_per_hour_to_rate(2.5, air),
//!     5.8,
//!     0.04,
//!     &config,
//! )
//! .unwrap();
//!
//! assert!(state.diagnostics.converged);
//! assert!(state.oh > 0.0);
//! ```

pub mod derived;
pub mod errors;
pub mod initial_guess;
pub mod parameters;
pub mod rate_constants;
pub mod reactions;
pub mod solver;
pub mod steady_state;
pub mod units;

/// Floating point type used for all concentrations and rates
pub type FloatValue = f64;

pub use errors::{HOxError, HOxResult};
pub use parameters::SolverConfig;
pub use reactions::{RateTable, ReactionLabel};
pub use solver::{Diagnostics, RootFinder, Termination};
pub use steady_state::{
    solve, solve_nox, solve_nox_with, solve_with, SteadyState, DEFAULT_NO2_TO_NO_RATIO,
};
