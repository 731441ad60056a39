//! Solver configuration
//!
//! Physical conditions and fixed rate constants for a steady-state solve.

use crate::errors::{HOxError, HOxResult};
use crate::units::REFERENCE_DENSITY;
use crate::FloatValue;
use serde::{Deserialize, Serialize};

/// Configuration for a steady-state HOx solve
///
/// Holds the ambient conditions used by the temperature and density dependent
/// rate constants, the fixed RO2 rate constants, and three effective rate
/// constants that only seed the analytic OH estimate.
///
/// Every field can be overridden independently, either with struct update
/// syntax or from a partial TOML/JSON document (missing fields take the
/// defaults below). The short kinetic names (`T`, `M`, `rh`, `k_RO2NO`, ...)
/// are accepted as aliases when deserializing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Temperature
    /// unit: K
    /// default: 298.0
    #[serde(alias = "T")]
    pub temperature: FloatValue,

    /// Total air number density
    /// unit: molecules cm^-3
    /// default: 2e19
    #[serde(alias = "M")]
    pub air_density: FloatValue,

    /// Water vapour mole fraction
    /// unit: dimensionless
    /// default: 0.01
    #[serde(alias = "rh")]
    pub water_mixing_ratio: FloatValue,

    /// RO2 + NO rate constant
    /// unit: cm^3 molecule^-1 s^-1
    /// default: 8e-12
    #[serde(alias = "k_RO2NO")]
    pub k_ro2_no: FloatValue,

    /// RO2 + HO2 rate constant
    /// unit: cm^3 molecule^-1 s^-1
    /// default: 8e-12
    #[serde(alias = "k_RO2HO2")]
    pub k_ro2_ho2: FloatValue,

    /// RO2 + RO2 self-reaction rate constant
    /// unit: cm^3 molecule^-1 s^-1
    /// default: 6.8e-14
    #[serde(alias = "k_RO2RO2")]
    pub k_ro2_ro2: FloatValue,

    /// Effective OH + NO2 rate constant for the initial guess
    /// unit: cm^3 molecule^-1 s^-1
    /// default: 1.1e-11
    pub k4: FloatValue,

    /// Effective RO2 + NO rate constant for the initial guess
    /// unit: cm^3 molecule^-1 s^-1
    /// default: 8e-12
    pub k2eff: FloatValue,

    /// Effective peroxy self-reaction rate constant for the initial guess
    /// unit: cm^3 molecule^-1 s^-1
    /// default: 5e-12
    pub k5eff: FloatValue,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            temperature: 298.0,
            air_density: 2e19,
            water_mixing_ratio: 0.01,
            k_ro2_no: 8e-12,
            k_ro2_ho2: 8e-12,
            k_ro2_ro2: 6.8e-14,
            k4: 1.1e-11,
            k2eff: 8e-12,
            k5eff: 5e-12,
        }
    }
}

impl SolverConfig {
    /// Parse a configuration from a TOML document
    ///
    /// Fields missing from the document take their default values. The
    /// result is validated before it is returned.
    pub fn from_toml_str(text: &str) -> HOxResult<Self> {
        let config: SolverConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every field lies in its physical domain
    pub fn validate(&self) -> HOxResult<()> {
        let positive = [
            ("temperature", self.temperature),
            ("air_density", self.air_density),
            ("k_ro2_no", self.k_ro2_no),
            ("k_ro2_ho2", self.k_ro2_ho2),
            ("k_ro2_ro2", self.k_ro2_ro2),
            ("k4", self.k4),
            ("k2eff", self.k2eff),
            ("k5eff", self.k5eff),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(HOxError::InvalidConfig(format!(
                    "{name} must be finite and strictly positive, got {value}"
                )));
            }
        }
        if !(0.0..=1.0).contains(&self.water_mixing_ratio) {
            return Err(HOxError::InvalidConfig(format!(
                "water_mixing_ratio must lie in [0, 1], got {}",
                self.water_mixing_ratio
            )));
        }
        Ok(())
    }

    /// Water vapour number density
    ///
    /// unit: molecules cm^-3
    pub fn water_density(&self) -> FloatValue {
        self.water_mixing_ratio * self.air_density
    }

    /// Factor relating concentrations to the rescaled units used while solving
    ///
    /// $$s = M / M_{ref}$$
    pub fn unit_scale(&self) -> FloatValue {
        self.air_density / REFERENCE_DENSITY
    }
}
