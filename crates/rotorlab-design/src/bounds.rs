//! Linear mapping from normalized values to physical ranges.
//!
//! All decoders in this crate go through [`Bounds::map`]. Inputs outside `[0, 1]` are
//! rejected with [`DesignError::OutOfRange`] instead of being clamped: a value out of range
//! means the caller (usually an optimizer) produced an invalid candidate, and clamping would
//! silently evaluate a different design than the one requested.

use serde::{Deserialize, Serialize};

use crate::DesignError;

/// A closed physical interval `[lower, upper]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    lower: f64,
    upper: f64,
}

impl Bounds {
    /// Translation component range of a rotor relative to the frame center.
    pub const TRANSLATION: Self = Self {
        lower: -1.0,
        upper: 1.0,
    };

    /// Euler angle range in degrees.
    pub const ORIENTATION_DEG: Self = Self {
        lower: 0.0,
        upper: 360.0,
    };

    /// Creates bounds after checking that both ends are finite and ordered.
    pub fn new(lower: f64, upper: f64) -> Result<Self, DesignError> {
        if !lower.is_finite() || !upper.is_finite() || lower > upper {
            return Err(DesignError::InvalidBounds { lower, upper });
        }
        Ok(Self { lower, upper })
    }

    #[must_use]
    pub fn lower(&self) -> f64 {
        self.lower
    }

    #[must_use]
    pub fn upper(&self) -> f64 {
        self.upper
    }

    /// Returns `true` if `value` lies in `[lower, upper]`.
    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        (self.lower..=self.upper).contains(&value)
    }

    /// Maps a normalized value to `lower + x * (upper - lower)`.
    ///
    /// # Examples
    ///
    /// ```
    /// use rotorlab_design::bounds::Bounds;
    ///
    /// assert_eq!(Bounds::TRANSLATION.map(0.5).unwrap(), 0.0);
    /// assert_eq!(Bounds::ORIENTATION_DEG.map(0.0).unwrap(), 0.0);
    /// assert_eq!(Bounds::ORIENTATION_DEG.map(1.0).unwrap(), 360.0);
    /// assert!(Bounds::TRANSLATION.map(1.5).is_err());
    /// ```
    pub fn map(&self, x: f64) -> Result<f64, DesignError> {
        check_normalized(0, x)?;
        Ok(self.map_unchecked(x))
    }

    /// Maps every component of `xs`, failing on the first out-of-range component.
    pub fn map_slice(&self, xs: &[f64]) -> Result<Vec<f64>, DesignError> {
        validate_normalized(xs)?;
        Ok(xs.iter().map(|&x| self.map_unchecked(x)).collect())
    }

    fn map_unchecked(&self, x: f64) -> f64 {
        self.lower + x * (self.upper - self.lower)
    }
}

/// Checks that every component of a design vector is finite and in `[0, 1]`.
pub fn validate_normalized(xs: &[f64]) -> Result<(), DesignError> {
    for (index, &value) in xs.iter().enumerate() {
        check_normalized(index, value)?;
    }
    Ok(())
}

/// Checks the length of a design vector.
pub fn validate_length(xs: &[f64], expected: usize) -> Result<(), DesignError> {
    if xs.len() != expected {
        return Err(DesignError::InvalidLength {
            expected,
            actual: xs.len(),
        });
    }
    Ok(())
}

fn check_normalized(index: usize, value: f64) -> Result<(), DesignError> {
    // NaN fails the range check as well
    if !(0.0..=1.0).contains(&value) {
        return Err(DesignError::OutOfRange { index, value });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_mappings() {
        assert_eq!(Bounds::TRANSLATION.map(0.5), Ok(0.0));
        assert_eq!(Bounds::TRANSLATION.map(0.0), Ok(-1.0));
        assert_eq!(Bounds::TRANSLATION.map(1.0), Ok(1.0));
        assert_eq!(Bounds::ORIENTATION_DEG.map(0.0), Ok(0.0));
        assert_eq!(Bounds::ORIENTATION_DEG.map(1.0), Ok(360.0));
    }

    #[test]
    fn test_custom_bounds() {
        let bounds = Bounds::new(0.0, 2000.0).unwrap();
        assert_eq!(bounds.map(0.25), Ok(500.0));
        assert_eq!(
            bounds.map_slice(&[0.0, 0.5, 1.0]),
            Ok(vec![0.0, 1000.0, 2000.0])
        );
    }

    #[test]
    fn test_degenerate_bounds_are_allowed() {
        let bounds = Bounds::new(3.0, 3.0).unwrap();
        assert_eq!(bounds.map(0.7), Ok(3.0));
    }

    #[test]
    fn test_invalid_bounds_rejected() {
        assert!(Bounds::new(1.0, -1.0).is_err());
        assert!(Bounds::new(f64::NAN, 1.0).is_err());
        assert!(Bounds::new(0.0, f64::INFINITY).is_err());
    }

    #[test]
    fn test_out_of_range_is_rejected_not_clamped() {
        assert_eq!(
            Bounds::TRANSLATION.map(-0.1),
            Err(DesignError::OutOfRange {
                index: 0,
                value: -0.1
            })
        );
        assert!(Bounds::TRANSLATION.map(1.000_001).is_err());
        assert!(Bounds::TRANSLATION.map(f64::NAN).is_err());
    }

    #[test]
    fn test_map_slice_reports_offending_index() {
        let err = Bounds::ORIENTATION_DEG
            .map_slice(&[0.1, 0.2, 2.0, 0.3])
            .unwrap_err();
        assert_eq!(
            err,
            DesignError::OutOfRange {
                index: 2,
                value: 2.0
            }
        );
    }

    #[test]
    fn test_validate_length() {
        assert!(validate_length(&[0.0; 15], 15).is_ok());
        assert_eq!(
            validate_length(&[0.0; 14], 15),
            Err(DesignError::InvalidLength {
                expected: 15,
                actual: 14
            })
        );
    }
}
