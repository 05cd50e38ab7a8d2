//! Remeshing parameters.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{RemeshError, RemeshResult};

/// Parameters for adaptive remeshing.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RemeshParams {
    /// Connections shorter than this are collapsed.
    pub min_length: f64,

    /// Connections longer than this are split.
    pub max_length: f64,

    /// Maximum number of split/collapse passes.
    ///
    /// A collapse moves the surviving node, which can stretch its other
    /// connections past `max_length`; another pass fixes those.
    pub max_passes: u32,
}

impl Default for RemeshParams {
    fn default() -> Self {
        Self {
            min_length: 0.02,
            max_length: 0.04,
            max_passes: 10,
        }
    }
}

impl RemeshParams {
    /// Create new parameters with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create parameters for the band `[min_length, max_length]`.
    #[must_use]
    pub fn with_band(min_length: f64, max_length: f64) -> Self {
        Self {
            min_length,
            max_length,
            ..Self::default()
        }
    }

    /// Create parameters centered on `target` with a factor-of-two band.
    #[must_use]
    pub fn around(target: f64) -> Self {
        Self::with_band(target * 2.0 / 3.0, target * 4.0 / 3.0)
    }

    /// Set the minimum length.
    #[must_use]
    pub const fn with_min_length(mut self, length: f64) -> Self {
        self.min_length = length;
        self
    }

    /// Set the maximum length.
    #[must_use]
    pub const fn with_max_length(mut self, length: f64) -> Self {
        self.max_length = length;
        self
    }

    /// Set the pass limit.
    #[must_use]
    pub const fn with_max_passes(mut self, passes: u32) -> Self {
        self.max_passes = passes;
        self
    }

    /// Checks the parameters.
    ///
    /// # Errors
    ///
    /// Returns [`RemeshError::InvalidLengths`] unless `0 < min < max` with
    /// both finite, or [`RemeshError::InvalidPasses`] for a zero pass limit.
    pub fn validate(&self) -> RemeshResult<()> {
        let (min, max) = (self.min_length, self.max_length);
        if !(min > 0.0 && max > min && max.is_finite()) {
            return Err(RemeshError::InvalidLengths { min, max });
        }
        if self.max_passes == 0 {
            return Err(RemeshError::InvalidPasses(0));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_params() {
        let params = RemeshParams::default();
        assert!((params.min_length - 0.02).abs() < f64::EPSILON);
        assert!((params.max_length - 0.04).abs() < f64::EPSILON);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_around() {
        let params = RemeshParams::around(0.3);
        assert!((params.max_length / params.min_length - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_validation() {
        assert!(RemeshParams::with_band(0.0, 1.0).validate().is_err());
        assert!(RemeshParams::with_band(0.5, 0.5).validate().is_err());
        assert!(RemeshParams::with_band(0.1, f64::NAN).validate().is_err());
        assert!(
            RemeshParams::default()
                .with_max_passes(0)
                .validate()
                .is_err()
        );
    }
}
