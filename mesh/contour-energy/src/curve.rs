//! Attraction of mapped nodes to an external curve.

use contour_pathfind::{CurveMapping, map_curve};
use contour_types::{Point3, SurfaceMesh};

use crate::energy::{ExternalEnergy, add_at};
use crate::error::EnergyResult;

/// Springs mapped nodes towards their points on a curve.
///
/// Nodes are assigned curve points once, with [`map_curve`]; mapped nodes
/// receive `weight × (target − p)` and all other nodes nothing. Build a new
/// energy after remeshing, since the mapping refers to node indices.
///
/// # Example
///
/// ```
/// use contour_energy::{CurveAttraction, ExternalEnergy};
/// use contour_types::{block, Point3};
///
/// let mesh = block(1.0, 1.0, 1.0);
/// // A ring slightly above the top face.
/// let lift = contour_types::Vector3::z() * 0.1;
/// let ring: Vec<_> = (0..4).map(|i| mesh.position(i) + lift).collect();
/// let energy = CurveAttraction::new(&mesh, &ring, true, 2.0)?;
///
/// let (mut fx, mut fy, mut fz) = (vec![0.0; 8], vec![0.0; 8], vec![0.0; 8]);
/// energy.update_forces(&mesh, &mut fx, &mut fy, &mut fz);
/// assert!((fz[0] - 0.2).abs() < 1e-12);
/// assert_eq!(fz[4], 0.0);
/// # Ok::<(), contour_energy::EnergyError>(())
/// ```
#[derive(Debug, Clone)]
pub struct CurveAttraction {
    targets: Vec<(usize, Point3<f64>)>,
    weight: f64,
}

impl CurveAttraction {
    /// Maps `curve` onto `mesh` and creates the energy.
    ///
    /// # Errors
    ///
    /// Returns [`EnergyError::Path`](crate::EnergyError::Path) if the curve
    /// cannot be mapped.
    pub fn new(
        mesh: &SurfaceMesh,
        curve: &[Point3<f64>],
        closed: bool,
        weight: f64,
    ) -> EnergyResult<Self> {
        let mapping = map_curve(mesh, curve, closed)?;
        Ok(Self::from_mapping(&mapping, weight))
    }

    /// Creates the energy from an existing mapping.
    #[must_use]
    pub fn from_mapping(mapping: &CurveMapping, weight: f64) -> Self {
        Self {
            targets: mapping.targets(),
            weight,
        }
    }

    /// Mapped `(node, target)` pairs sorted by node.
    #[must_use]
    pub fn targets(&self) -> &[(usize, Point3<f64>)] {
        &self.targets
    }
}

impl ExternalEnergy for CurveAttraction {
    fn name(&self) -> &'static str {
        "curve"
    }

    fn update_forces(&self, mesh: &SurfaceMesh, fx: &mut [f64], fy: &mut [f64], fz: &mut [f64]) {
        for &(node, target) in &self.targets {
            if node < mesh.node_count() {
                let f = (target - mesh.position(node)) * self.weight;
                add_at(node, &f, fx, fy, fz);
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use contour_types::{Vector3, block};

    #[test]
    fn force_vanishes_on_curve() {
        let mesh = block(1.0, 1.0, 1.0);
        let ring: Vec<_> = (0..4).map(|i| mesh.position(i)).collect();
        let energy = CurveAttraction::new(&mesh, &ring, true, 5.0).unwrap();
        assert_eq!(energy.targets().len(), 4);
        let (mut fx, mut fy, mut fz) = (vec![0.0; 8], vec![0.0; 8], vec![0.0; 8]);
        energy.update_forces(&mesh, &mut fx, &mut fy, &mut fz);
        for i in 0..8 {
            assert_relative_eq!(Vector3::new(fx[i], fy[i], fz[i]).norm(), 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn empty_curve_is_an_error() {
        let mesh = block(1.0, 1.0, 1.0);
        assert!(CurveAttraction::new(&mesh, &[], false, 1.0).is_err());
    }
}
