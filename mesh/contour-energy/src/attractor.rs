//! Spring from a single node to a fixed point.

use contour_types::{Point3, SurfaceMesh};

use crate::energy::{ExternalEnergy, add_at};
use crate::error::{EnergyError, EnergyResult};

/// Holds one node near an anchor point.
///
/// The node receives `weight × (anchor − p)`; every other node is left
/// alone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeAttractor {
    node: usize,
    anchor: Point3<f64>,
    weight: f64,
}

impl NodeAttractor {
    /// Attracts `node` to `anchor`.
    #[must_use]
    pub const fn new(node: usize, anchor: Point3<f64>, weight: f64) -> Self {
        Self {
            node,
            anchor,
            weight,
        }
    }

    /// Pins `node` at its current position.
    ///
    /// # Errors
    ///
    /// Returns [`EnergyError::NodeOutOfRange`] if `node` is not in `mesh`.
    pub fn at_current(mesh: &SurfaceMesh, node: usize, weight: f64) -> EnergyResult<Self> {
        if node >= mesh.node_count() {
            return Err(EnergyError::NodeOutOfRange {
                node,
                node_count: mesh.node_count(),
            });
        }
        Ok(Self::new(node, mesh.position(node), weight))
    }

    /// The attracted node.
    #[must_use]
    pub const fn node(&self) -> usize {
        self.node
    }

    /// The anchor point.
    #[must_use]
    pub const fn anchor(&self) -> Point3<f64> {
        self.anchor
    }
}

impl ExternalEnergy for NodeAttractor {
    fn name(&self) -> &'static str {
        "attractor"
    }

    fn update_forces(&self, mesh: &SurfaceMesh, fx: &mut [f64], fy: &mut [f64], fz: &mut [f64]) {
        if self.node < mesh.node_count() {
            let f = (self.anchor - mesh.position(self.node)) * self.weight;
            add_at(self.node, &f, fx, fy, fz);
        }
    }

    fn energy(&self, point: &Point3<f64>) -> f64 {
        0.5 * self.weight * nalgebra::distance_squared(point, &self.anchor)
    }
}
