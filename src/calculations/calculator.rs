use thiserror::Error;

/// Converts a depth/velocity reading into a flow rate for one pipe cross-section.
///
/// Depth is in metres, velocity in metres per second and the returned flow is
/// in litres per second. Implementations never return a negative flow.
pub trait Calculator: Send + Sync {
    fn perform_calculation(&self, depth: f64, velocity: f64) -> f64;
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CalculationError {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("Unsupported pipe type: {0}")]
    UnsupportedPipeType(String),
}

/// Fails unless every named dimension is a finite, strictly positive number.
pub(crate) fn ensure_dimensions(dimensions: &[(&str, f64)]) -> Result<(), CalculationError> {
    for (name, value) in dimensions {
        if !value.is_finite() || *value <= 0.0 {
            return Err(CalculationError::InvalidParameter(format!(
                "{} must be a finite positive number, got {}",
                name, value
            )));
        }
    }
    Ok(())
}

/// Area (m²) times velocity (m/s) expressed in L/s, clamped at zero.
pub(crate) fn flow_from_area(area: f64, velocity: f64) -> f64 {
    (area * velocity * 1000.0).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_nan_and_non_positive_dimensions() {
        assert!(ensure_dimensions(&[("width", 1.0), ("height", 2.0)]).is_ok());
        assert!(matches!(
            ensure_dimensions(&[("width", f64::NAN)]),
            Err(CalculationError::InvalidParameter(_))
        ));
        assert!(ensure_dimensions(&[("width", 0.0)]).is_err());
        assert!(ensure_dimensions(&[("width", -1.0)]).is_err());
        assert!(ensure_dimensions(&[("width", f64::INFINITY)]).is_err());
    }

    #[test]
    fn flow_is_clamped_at_zero() {
        assert_eq!(flow_from_area(0.5, -1.0), 0.0);
        assert_eq!(flow_from_area(0.5, 2.0), 1000.0);
        assert_eq!(flow_from_area(f64::NAN, 1.0), 0.0);
    }
}
