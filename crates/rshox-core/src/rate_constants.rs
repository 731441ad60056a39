//! Temperature and density dependent rate constants
//!
//! All rate constants are bimolecular, in cm^3 molecule^-1 s^-1. The
//! functions are total over the physical domain (T > 0, M >= 0,
//! 0 <= H2O <= M) and do no validation of their own.

use crate::FloatValue;

/// Low-pressure limit coefficient for OH + NO2 (+M)
/// unit: cm^6 molecule^-2 s^-1
pub const OH_NO2_K0: FloatValue = 1.51e-30;

/// High-pressure limit for OH + NO2 (+M)
/// unit: cm^3 molecule^-1 s^-1
pub const OH_NO2_KINF: FloatValue = 2.58e-11;

/// Troe broadening factor for OH + NO2 (+M)
pub const OH_NO2_BROADENING: FloatValue = 0.6;

/// HO2 + NO -> OH + NO2
///
/// $$k = 3.5 \times 10^{-12} \exp(250/T)$$
pub fn rate_ho2_no(temperature: FloatValue) -> FloatValue {
    3.5e-12 * (250.0 / temperature).exp()
}

/// HO2 + HO2 -> H2O2 + O2, including the pressure dependent channel and
/// the enhancement by water vapour
///
/// $$k = \left(3.5 \times 10^{-13} e^{430/T} + 1.7 \times 10^{-33} (M - [H_2O]) e^{1000/T}\right)
///       \left(1 + 1.4 \times 10^{-21} [H_2O] e^{2200/T}\right)$$
pub fn rate_ho2_ho2(
    temperature: FloatValue,
    air_density: FloatValue,
    water_density: FloatValue,
) -> FloatValue {
    let bimolecular = 3.5e-13 * (430.0 / temperature).exp();
    let termolecular = 1.7e-33 * (air_density - water_density) * (1000.0 / temperature).exp();
    let water_enhancement = 1.0 + 1.4e-21 * water_density * (2200.0 / temperature).exp();
    (bimolecular + termolecular) * water_enhancement
}

/// OH + NO2 (+M) -> HNO3 in Troe falloff form
///
/// $$k = \frac{k_0}{1 + k_0/k_\infty} F_c^{1/(1 + \log_{10}(k_0/k_\infty)^2)}$$
///
/// with $k_0 = 1.51 \times 10^{-30} M$, $k_\infty = 2.58 \times 10^{-11}$ and
/// $F_c = 0.6$. The temperature argument is accepted for a uniform signature;
/// these coefficients carry no temperature dependence.
pub fn rate_oh_no2(_temperature: FloatValue, air_density: FloatValue) -> FloatValue {
    let k0 = OH_NO2_K0 * air_density;
    if k0 <= 0.0 {
        return 0.0;
    }
    let ratio = k0 / OH_NO2_KINF;
    let exponent = 1.0 / (1.0 + ratio.log10().powi(2));
    k0 / (1.0 + ratio) * OH_NO2_BROADENING.powf(exponent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use is_close::is_close;

    #[test]
    fn test_ho2_no_at_298() {
        let k = rate_ho2_no(298.0);
        assert!(is_close!(k, 3.5e-12 * (250.0f64 / 298.0).exp()));
        assert!((k - 8.10e-12).abs() < 0.01e-12, "got {}", k);
    }

    #[test]
    fn test_ho2_no_increases_when_cold() {
        assert!(rate_ho2_no(250.0) > rate_ho2_no(300.0));
    }

    #[test]
    fn test_ho2_ho2_water_enhancement() {
        let dry = rate_ho2_ho2(298.0, 2.46e19, 0.0);
        let wet = rate_ho2_ho2(298.0, 2.46e19, 2.46e17);
        assert!(dry > 0.0);
        assert!(wet > dry, "water should enhance HO2 + HO2: dry={} wet={}", dry, wet);
        // Dry value is the sum of the two channels
        let expected = 3.5e-13 * (430.0f64 / 298.0).exp()
            + 1.7e-33 * 2.46e19 * (1000.0f64 / 298.0).exp();
        assert!(is_close!(dry, expected));
    }

    #[test]
    fn test_ho2_ho2_zero_density_is_bimolecular() {
        let k = rate_ho2_ho2(298.0, 0.0, 0.0);
        assert!(is_close!(k, 3.5e-13 * (430.0f64 / 298.0).exp()));
    }

    #[test]
    fn test_oh_no2_at_surface() {
        let k = rate_oh_no2(298.0, 2.46e19);
        // Between 9 and 10 x 10^-12 near the surface
        assert!(k > 9.0e-12 && k < 1.0e-11, "got {}", k);
    }

    #[test]
    fn test_oh_no2_bounded_by_limits() {
        for exponent in 14..23 {
            for mantissa in [1.0, 2.5, 5.0] {
                let m = mantissa * 10f64.powi(exponent);
                let k = rate_oh_no2(298.0, m);
                let k0 = OH_NO2_K0 * m;
                assert!(k > 0.0);
                assert!(k <= k0, "k={} exceeds low-pressure limit {} at M={}", k, k0, m);
                assert!(
                    k <= OH_NO2_KINF,
                    "k={} exceeds high-pressure limit at M={}",
                    k,
                    m
                );
                // The broadening factor never drops below Fc
                assert!(k >= OH_NO2_BROADENING * k0 / (1.0 + k0 / OH_NO2_KINF));
            }
        }
    }

    #[test]
    fn test_oh_no2_monotonic_in_density() {
        let mut previous = 0.0;
        for i in 0..200 {
            let m = 1e15 * 1.06f64.powi(i);
            let k = rate_oh_no2(298.0, m);
            assert!(k > previous, "not increasing at M={}", m);
            previous = k;
        }
    }

    #[test]
    fn test_oh_no2_limits() {
        // Low pressure: tends to k0
        let m = 1e14;
        let k = rate_oh_no2(298.0, m);
        assert!((k / (OH_NO2_K0 * m) - 1.0).abs() < 0.05);
        // High pressure: tends to k_inf
        let k = rate_oh_no2(298.0, 1e25);
        assert!((k / OH_NO2_KINF - 1.0).abs() < 0.05);
    }
}
