//! Closed-form OH estimate
//!
//! Assuming RO2 and HO2 are equal in steady state collapses the HOx budget
//! to a quadratic in OH:
//!
//! $$a [OH]^2 + b [OH] + c = 0$$
//!
//! with $a = 6 k_{5,eff} (R / (k_{2,eff} [NO]))^2$, $b = k_4 [NO_2] + \alpha R$
//! and $c = -P$. The positive root seeds the numerical solver; it is not
//! reported as an answer.

use crate::errors::{require_fraction, require_positive, HOxError, HOxResult};
use crate::FloatValue;

/// Positive root of the OH quadratic
///
/// # Arguments
/// * `no`, `no2` - NO and NO2 concentrations (molecules cm^-3)
/// * `production_rate` - HOx production rate (molecules cm^-3 s^-1)
/// * `reactivity` - OH reactivity towards VOCs (s^-1)
/// * `branching_ratio` - alkyl nitrate yield from RO2 + NO
/// * `k4`, `k2eff`, `k5eff` - effective rate constants (cm^3 molecule^-1 s^-1)
///
/// # Errors
/// `PreconditionViolation` if `no`, `production_rate`, `k2eff` or the other
/// rate constants are not strictly positive, and `NumericDomain` if the
/// discriminant is negative or NaN, or the root is not finite.
#[allow(clippy::too_many_arguments)]
pub fn initial_oh_estimate(
    no: FloatValue,
    no2: FloatValue,
    production_rate: FloatValue,
    reactivity: FloatValue,
    branching_ratio: FloatValue,
    k4: FloatValue,
    k2eff: FloatValue,
    k5eff: FloatValue,
) -> HOxResult<FloatValue> {
    require_positive("no", no)?;
    require_positive("production_rate", production_rate)?;
    require_positive("k2eff", k2eff)?;
    require_positive("k4", k4)?;
    require_positive("k5eff", k5eff)?;
    require_fraction("branching_ratio", branching_ratio)?;
    if !(no2.is_finite() && no2 >= 0.0) || !(reactivity.is_finite() && reactivity >= 0.0) {
        return Err(HOxError::PreconditionViolation(format!(
            "no2 and reactivity must be finite and non-negative, got {no2} and {reactivity}"
        )));
    }

    let a = 6.0 * k5eff * (reactivity / (k2eff * no)).powi(2);
    let b = k4 * no2 + branching_ratio * reactivity;
    let c = -production_rate;

    let discriminant = b * b - 4.0 * a * c;
    if !(discriminant >= 0.0) {
        return Err(HOxError::NumericDomain(format!(
            "negative or undefined discriminant {discriminant} in the OH quadratic"
        )));
    }

    // Same root as (-b + sqrt(d)) / 2a, without the cancellation when 4ac << b^2
    let root = -2.0 * c / (b + discriminant.sqrt());
    if !root.is_finite() {
        return Err(HOxError::NumericDomain(format!(
            "initial OH estimate is not finite (a={a}, b={b}, c={c})"
        )));
    }
    Ok(root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const NO: f64 = 2.46e10;
    const NO2: f64 = 9.85e10;
    const P: f64 = 1.71e7;

    fn estimate(no: f64, production_rate: f64) -> HOxResult<f64> {
        initial_oh_estimate(no, NO2, production_rate, 5.8, 0.04, 1.1e-11, 8e-12, 5e-12)
    }

    #[test]
    fn test_matches_textbook_root() {
        let oh = estimate(NO, P).unwrap();

        let a = 6.0 * 5e-12 * (5.8 / (8e-12 * NO)).powi(2);
        let b = 1.1e-11 * NO2 + 0.04 * 5.8;
        let c = -P;
        let expected = (-b + (b * b - 4.0 * a * c).sqrt()) / (2.0 * a);

        assert_relative_eq!(oh, expected, max_relative = 1e-9);
        // Root of the quadratic
        assert!((a * oh * oh + b * oh + c).abs() < 1e-6 * P);
    }

    #[test]
    fn test_estimate_magnitude() {
        let oh = estimate(NO, P).unwrap();
        assert!(oh > 1e6 && oh < 1e8, "got {}", oh);
    }

    #[test]
    fn test_zero_reactivity_reduces_to_linear() {
        // a = 0: OH = P / (k4 NO2)
        let oh = initial_oh_estimate(NO, NO2, P, 0.0, 0.04, 1.1e-11, 8e-12, 5e-12).unwrap();
        assert_relative_eq!(oh, P / (1.1e-11 * NO2), max_relative = 1e-12);
    }

    #[test]
    fn test_rejects_non_positive_no() {
        assert!(matches!(
            estimate(0.0, P),
            Err(HOxError::PreconditionViolation(_))
        ));
        assert!(matches!(
            estimate(-1.0, P),
            Err(HOxError::PreconditionViolation(_))
        ));
    }

    #[test]
    fn test_rejects_non_positive_production() {
        assert!(matches!(
            estimate(NO, 0.0),
            Err(HOxError::PreconditionViolation(_))
        ));
    }

    #[test]
    fn test_more_production_more_oh() {
        let low = estimate(NO, P).unwrap();
        let high = estimate(NO, 2.0 * P).unwrap();
        assert!(high > low);
    }

    #[test]
    fn test_no_oh_sink_has_no_finite_root() {
        // Without NO2 or reactivity nothing removes OH: b = 0 and a = 0
        let err = initial_oh_estimate(NO, 0.0, P, 0.0, 0.04, 1.1e-11, 8e-12, 5e-12).unwrap_err();
        assert!(matches!(err, HOxError::NumericDomain(_)), "{}", err);
    }

    #[test]
    fn test_undefined_discriminant() {
        // k2eff * NO underflows to zero and 0 / 0 poisons the quadratic
        let err =
            initial_oh_estimate(1e-320, NO2, P, 0.0, 0.04, 1.1e-11, 8e-12, 5e-12).unwrap_err();
        assert!(matches!(err, HOxError::NumericDomain(_)), "{}", err);
    }
}
