//! Ray casting parameters.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Base polyhedron used to seed the template sphere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SphereTemplate {
    /// 12 nodes, 20 triangles, five-fold symmetric about the z axis.
    #[default]
    FiveFold,
    /// 14 nodes, 24 triangles, six-fold symmetric about the z axis.
    SixFold,
}

impl SphereTemplate {
    /// Triangle count of the base polyhedron.
    #[must_use]
    pub const fn base_triangles(self) -> usize {
        match self {
            Self::FiveFold => 20,
            Self::SixFold => 24,
        }
    }
}

/// Parameters for building a mesh by ray casting.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RaycastParams {
    /// Base polyhedron.
    pub template: SphereTemplate,
    /// Number of midpoint subdivisions applied to the template.
    pub divisions: u32,
    /// Upper bound on the template's triangle count.
    pub max_triangles: usize,
}

impl Default for RaycastParams {
    fn default() -> Self {
        Self {
            template: SphereTemplate::FiveFold,
            divisions: 2,
            max_triangles: 1_000_000,
        }
    }
}

impl RaycastParams {
    /// Create new parameters with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A coarse 80-triangle template.
    #[must_use]
    pub fn coarse() -> Self {
        Self {
            divisions: 1,
            ..Self::default()
        }
    }

    /// A fine 5120-triangle template.
    #[must_use]
    pub fn fine() -> Self {
        Self {
            divisions: 4,
            ..Self::default()
        }
    }

    /// Set the base polyhedron.
    #[must_use]
    pub const fn with_template(mut self, template: SphereTemplate) -> Self {
        self.template = template;
        self
    }

    /// Set the number of subdivisions.
    #[must_use]
    pub const fn with_divisions(mut self, divisions: u32) -> Self {
        self.divisions = divisions;
        self
    }

    /// Set the triangle limit.
    #[must_use]
    pub const fn with_max_triangles(mut self, max: usize) -> Self {
        self.max_triangles = max;
        self
    }

    /// Triangle count after subdivision, saturating on overflow.
    #[must_use]
    pub fn expected_triangles(&self) -> usize {
        let factor = 4usize.checked_pow(self.divisions).unwrap_or(usize::MAX);
        self.template.base_triangles().saturating_mul(factor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_params() {
        let params = RaycastParams::default();
        assert_eq!(params.template, SphereTemplate::FiveFold);
        assert_eq!(params.divisions, 2);
        assert_eq!(params.expected_triangles(), 320);
    }

    #[test]
    fn test_presets() {
        assert_eq!(RaycastParams::coarse().expected_triangles(), 80);
        assert_eq!(RaycastParams::fine().expected_triangles(), 5120);
        let six = RaycastParams::new()
            .with_template(SphereTemplate::SixFold)
            .with_divisions(1);
        assert_eq!(six.expected_triangles(), 96);
    }

    #[test]
    fn test_expected_saturates() {
        let params = RaycastParams::new().with_divisions(200);
        assert_eq!(params.expected_triangles(), usize::MAX);
    }
}
