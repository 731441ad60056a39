//! Quantities derived from a solved steady state
//!
//! NOx is removed by two pathways in this system: OH + NO2 forming nitric
//! acid, and the alkyl nitrate channel of RO2 + NO. Ozone is produced by
//! every NO to NO2 conversion by HO2 and RO2.

use crate::steady_state::SteadyState;
use crate::units::SECONDS_PER_HOUR;
use crate::FloatValue;
use serde::{Deserialize, Serialize};

/// NOx lifetimes against each loss pathway
///
/// unit: hours
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoxLifetime {
    /// Lifetime against all loss, $(1/\tau_{HNO_3} + 1/\tau_{ANs})^{-1}$
    pub total: FloatValue,
    /// Lifetime against nitric acid formation
    pub hno3: FloatValue,
    /// Lifetime against alkyl nitrate formation (infinite when the branching ratio is zero)
    pub ans: FloatValue,
}

/// Terms of the HOx budget
///
/// unit: molecules cm^-3 s^-1
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RadicalTermination {
    /// OH + NO2
    pub hno3: FloatValue,
    /// RO2 + NO -> RONO2
    pub ans: FloatValue,
    /// HO2 + HO2, RO2 + HO2 and RO2 + RO2, counting two radicals per reaction
    pub peroxides: FloatValue,
}

impl RadicalTermination {
    /// Sum of all terminating pathways; equals the production rate in steady state
    pub fn total(&self) -> FloatValue {
        self.hno3 + self.ans + self.peroxides
    }
}

/// Rate of nitric acid formation, $k_{OH+NO_2}[OH][NO_2]$
pub fn hno3_formation(state: &SteadyState) -> FloatValue {
    state.rates.oh_no2 * state.oh * state.no2
}

/// Rate of alkyl nitrate formation, $\alpha k_{RO_2+NO}[RO_2][NO]$
pub fn alkyl_nitrate_formation(state: &SteadyState) -> FloatValue {
    state.branching_ratio * state.rates.ro2_no * state.ro2 * state.no
}

/// NOx lifetimes in hours
pub fn nox_lifetime(state: &SteadyState) -> NoxLifetime {
    let nox = state.nox();
    let hno3 = hno3_formation(state);
    let ans = alkyl_nitrate_formation(state);

    NoxLifetime {
        total: nox / (hno3 + ans) / SECONDS_PER_HOUR,
        hno3: nox / hno3 / SECONDS_PER_HOUR,
        ans: nox / ans / SECONDS_PER_HOUR,
    }
}

/// Gross ozone production from peroxy radical + NO reactions
///
/// $$P(O_3) = k_{HO_2+NO}[HO_2][NO] + (1-\alpha) k_{RO_2+NO}[RO_2][NO]$$
///
/// unit: molecules cm^-3 s^-1
pub fn ozone_production(state: &SteadyState) -> FloatValue {
    let k = &state.rates;
    k.ho2_no * state.ho2 * state.no
        + (1.0 - state.branching_ratio) * k.ro2_no * state.ro2 * state.no
}

/// Total NOx loss rate
///
/// unit: molecules cm^-3 s^-1
pub fn nox_loss(state: &SteadyState) -> FloatValue {
    hno3_formation(state) + alkyl_nitrate_formation(state)
}

/// Ozone molecules produced per NOx molecule lost
pub fn ozone_production_efficiency(state: &SteadyState) -> FloatValue {
    ozone_production(state) / nox_loss(state)
}

/// Break the radical loss down by pathway
pub fn radical_termination(state: &SteadyState) -> RadicalTermination {
    let k = &state.rates;
    RadicalTermination {
        hno3: hno3_formation(state),
        ans: alkyl_nitrate_formation(state),
        peroxides: 2.0 * k.ro2_ho2 * state.ro2 * state.ho2
            + 2.0 * k.ro2_ro2 * state.ro2 * state.ro2
            + 2.0 * k.ho2_ho2 * state.ho2 * state.ho2,
    }
}
