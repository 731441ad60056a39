//! Unit conversions for gas-phase concentrations
//!
//! Concentrations are number densities in molecules cm^-3 and rates are in
//! molecules cm^-3 s^-1 throughout the crate. These helpers convert from the
//! mixing ratios that observations are usually reported in.

use crate::FloatValue;

/// Boltzmann constant
/// unit: J/K
pub const BOLTZMANN: FloatValue = 1.380649e-23;

/// unit: s/hr
pub const SECONDS_PER_HOUR: FloatValue = 3600.0;

/// One part per billion as a mole fraction
pub const PPB: FloatValue = 1e-9;

/// Density that rescaled concentrations are expressed relative to
/// unit: molecules cm^-3
pub const REFERENCE_DENSITY: FloatValue = 1e12;

/// Air number density from the ideal gas law
///
/// $$M = \frac{P}{k_B T} \times 10^{-6}$$
///
/// # Arguments
/// * `temperature` - Temperature in K
/// * `pressure` - Pressure in Pa
///
/// # Returns
/// Number density in molecules cm^-3
pub fn number_density(temperature: FloatValue, pressure: FloatValue) -> FloatValue {
    pressure / (BOLTZMANN * temperature) * 1e-6
}

/// Convert a mixing ratio in ppb to a number density
pub fn ppb_to_concentration(ppb: FloatValue, air_density: FloatValue) -> FloatValue {
    ppb * PPB * air_density
}

/// Convert a number density to a mixing ratio in ppb
pub fn concentration_to_ppb(concentration: FloatValue, air_density: FloatValue) -> FloatValue {
    concentration / (PPB * air_density)
}

/// Convert a production rate in ppb/hr to molecules cm^-3 s^-1
pub fn ppb_per_hour_to_rate(rate: FloatValue, air_density: FloatValue) -> FloatValue {
    ppb_to_concentration(rate, air_density) / SECONDS_PER_HOUR
}
