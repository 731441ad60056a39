use thiserror::Error;

/// Error type for invalid inputs and configurations.
///
/// Failure of the root finder to converge is not an error: it is reported
/// through [`crate::Diagnostics`] on the returned steady state.
#[derive(Error, Debug)]
pub enum HOxError {
    #[error("Precondition violated: {0}")]
    PreconditionViolation(String),
    #[error("Numeric domain error: {0}")]
    NumericDomain(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Could not parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

/// Convenience type for `Result<T, HOxError>`.
pub type HOxResult<T> = Result<T, HOxError>;

/// Fail with a precondition violation unless `value` is finite and strictly positive.
pub(crate) fn require_positive(name: &str, value: f64) -> HOxResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(HOxError::PreconditionViolation(format!(
            "{name} must be finite and strictly positive, got {value}"
        )))
    }
}

/// Fail with a precondition violation unless `value` lies in the closed unit interval.
pub(crate) fn require_fraction(name: &str, value: f64) -> HOxResult<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(HOxError::PreconditionViolation(format!(
            "{name} must lie in [0, 1], got {value}"
        )))
    }
}
