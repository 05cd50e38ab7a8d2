//! Stiffness coefficients.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Elastic coefficients of a deforming mesh.
///
/// Larger `gamma` means smaller steps: every node is held at its previous
/// position with weight `gamma`, while `alpha` pulls connected nodes together
/// and `beta` straightens chains of connections.
///
/// # Example
///
/// ```
/// use contour_solver::Coefficients;
///
/// let coefficients = Coefficients::default().with_beta(0.0).with_gamma(500.0);
/// assert_eq!(coefficients.alpha, Coefficients::default().alpha);
/// assert!(coefficients.gamma > Coefficients::default().gamma);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Coefficients {
    /// Edge-stretch stiffness.
    pub alpha: f64,

    /// Bending stiffness. Zero disables the bending term.
    pub beta: f64,

    /// Per-step regularization weight (inverse step size).
    pub gamma: f64,
}

impl Default for Coefficients {
    fn default() -> Self {
        Self {
            alpha: 1.0,
            beta: 0.0,
            gamma: 100.0,
        }
    }
}

impl Coefficients {
    /// Creates coefficients from explicit values.
    #[must_use]
    pub const fn new(alpha: f64, beta: f64, gamma: f64) -> Self {
        Self { alpha, beta, gamma }
    }

    /// Loose mesh taking large steps; follows external forces quickly.
    #[must_use]
    pub const fn soft() -> Self {
        Self {
            alpha: 0.5,
            beta: 0.0,
            gamma: 50.0,
        }
    }

    /// Smooth, bend-resistant mesh taking small steps.
    #[must_use]
    pub const fn stiff() -> Self {
        Self {
            alpha: 2.0,
            beta: 0.1,
            gamma: 1000.0,
        }
    }

    /// Set the edge-stretch stiffness.
    #[must_use]
    pub const fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    /// Set the bending stiffness.
    #[must_use]
    pub const fn with_beta(mut self, beta: f64) -> Self {
        self.beta = beta;
        self
    }

    /// Set the regularization weight.
    #[must_use]
    pub const fn with_gamma(mut self, gamma: f64) -> Self {
        self.gamma = gamma;
        self
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn presets_order_step_size() {
        assert!(Coefficients::soft().gamma < Coefficients::default().gamma);
        assert!(Coefficients::stiff().gamma > Coefficients::default().gamma);
        assert_eq!(Coefficients::default().beta, 0.0);
    }

    #[test]
    fn builders_replace_single_fields() {
        let c = Coefficients::new(1.0, 2.0, 3.0).with_alpha(4.0);
        assert_eq!(c, Coefficients::new(4.0, 2.0, 3.0));
    }
}
