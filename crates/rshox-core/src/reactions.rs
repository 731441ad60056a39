//! Reaction labels and the rate constants used in a solve

use crate::parameters::SolverConfig;
use crate::rate_constants::{rate_ho2_ho2, rate_ho2_no, rate_oh_no2};
use crate::FloatValue;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The reactions of the reduced HOx-NOx system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReactionLabel {
    /// HO2 + NO -> OH + NO2
    Ho2No,
    /// HO2 + HO2 -> H2O2 + O2
    Ho2Ho2,
    /// OH + NO2 (+M) -> HNO3
    OhNo2,
    /// RO2 + NO -> RO + NO2, or RONO2 with the branching ratio
    Ro2No,
    /// RO2 + HO2 -> ROOH + O2
    Ro2Ho2,
    /// RO2 + RO2 -> products
    Ro2Ro2,
}

impl ReactionLabel {
    pub const ALL: [ReactionLabel; 6] = [
        ReactionLabel::Ho2No,
        ReactionLabel::Ho2Ho2,
        ReactionLabel::OhNo2,
        ReactionLabel::Ro2No,
        ReactionLabel::Ro2Ho2,
        ReactionLabel::Ro2Ro2,
    ];

    /// Reactants written as an equation fragment, e.g. `"HO2 + NO"`
    pub fn equation(&self) -> &'static str {
        match self {
            ReactionLabel::Ho2No => "HO2 + NO",
            ReactionLabel::Ho2Ho2 => "HO2 + HO2",
            ReactionLabel::OhNo2 => "OH + NO2",
            ReactionLabel::Ro2No => "RO2 + NO",
            ReactionLabel::Ro2Ho2 => "RO2 + HO2",
            ReactionLabel::Ro2Ro2 => "RO2 + RO2",
        }
    }
}

impl fmt::Display for ReactionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.equation())
    }
}

/// Rate constants in play for one solve
///
/// unit: cm^3 molecule^-1 s^-1 for every entry
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateTable {
    pub ho2_no: FloatValue,
    pub ho2_ho2: FloatValue,
    pub oh_no2: FloatValue,
    pub ro2_no: FloatValue,
    pub ro2_ho2: FloatValue,
    pub ro2_ro2: FloatValue,
}

impl RateTable {
    /// Evaluate the temperature and density dependent rates and collect them
    /// with the fixed RO2 rates of the configuration
    pub fn from_config(config: &SolverConfig) -> Self {
        let t = config.temperature;
        let m = config.air_density;
        Self {
            ho2_no: rate_ho2_no(t),
            ho2_ho2: rate_ho2_ho2(t, m, config.water_density()),
            oh_no2: rate_oh_no2(t, m),
            ro2_no: config.k_ro2_no,
            ro2_ho2: config.k_ro2_ho2,
            ro2_ro2: config.k_ro2_ro2,
        }
    }

    pub fn get(&self, label: ReactionLabel) -> FloatValue {
        match label {
            ReactionLabel::Ho2No => self.ho2_no,
            ReactionLabel::Ho2Ho2 => self.ho2_ho2,
            ReactionLabel::OhNo2 => self.oh_no2,
            ReactionLabel::Ro2No => self.ro2_no,
            ReactionLabel::Ro2Ho2 => self.ro2_ho2,
            ReactionLabel::Ro2Ro2 => self.ro2_ro2,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (ReactionLabel, FloatValue)> + '_ {
        ReactionLabel::ALL
            .into_iter()
            .map(move |label| (label, self.get(label)))
    }

    /// Multiply every rate constant by `factor`
    ///
    /// Used to move rates into the rescaled units of the solver, where
    /// concentrations are divided by the same factor.
    pub fn scaled(&self, factor: FloatValue) -> Self {
        Self {
            ho2_no: self.ho2_no * factor,
            ho2_ho2: self.ho2_ho2 * factor,
            oh_no2: self.oh_no2 * factor,
            ro2_no: self.ro2_no * factor,
            ro2_ho2: self.ro2_ho2 * factor,
            ro2_ro2: self.ro2_ro2 * factor,
        }
    }
}
