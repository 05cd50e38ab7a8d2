//! Mean-curvature smoothing.

use contour_curvature::mean_curvatures;
use contour_types::SurfaceMesh;

use crate::energy::{ExternalEnergy, add_at};

/// Moves nodes against their mean curvature.
///
/// Each node receives `-κ × magnitude × n̂`, where `κ` is the cotangent mean
/// curvature projected on the node normal. Bumps flatten and dents fill in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Smoothing {
    magnitude: f64,
}

impl Smoothing {
    /// Creates the energy.
    #[must_use]
    pub const fn new(magnitude: f64) -> Self {
        Self { magnitude }
    }
}

impl ExternalEnergy for Smoothing {
    fn name(&self) -> &'static str {
        "smoothing"
    }

    fn update_forces(&self, mesh: &SurfaceMesh, fx: &mut [f64], fy: &mut [f64], fz: &mut [f64]) {
        for (i, sample) in mean_curvatures(mesh).iter().enumerate() {
            let f = sample.normal * (-sample.value() * self.magnitude);
            add_at(i, &f, fx, fy, fz);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use contour_types::{Vector3, block};

    #[test]
    fn convex_corners_move_in() {
        let mesh = block(1.0, 1.0, 1.0);
        let (mut fx, mut fy, mut fz) = (vec![0.0; 8], vec![0.0; 8], vec![0.0; 8]);
        Smoothing::new(1.0).update_forces(&mesh, &mut fx, &mut fy, &mut fz);
        for i in 0..8 {
            let p = mesh.position(i);
            assert!(fx[i] * p.x + fy[i] * p.y + fz[i] * p.z < 0.0);
        }
    }

    #[test]
    fn raised_node_is_pulled_back() {
        // Hexagon fan with its center lifted.
        let mut positions = vec![0.0, 0.0, 0.2];
        for i in 0..6 {
            let t = f64::from(i) * std::f64::consts::FRAC_PI_3;
            positions.extend_from_slice(&[t.cos(), t.sin(), 0.0]);
        }
        let mut connections = Vec::new();
        let mut triangles = Vec::new();
        for i in 1..=6 {
            connections.push([0, i]);
            connections.push([i, i % 6 + 1]);
            triangles.push([0, i, i % 6 + 1]);
        }
        let Ok(mesh) = SurfaceMesh::from_arrays(positions, &connections, &triangles) else {
            panic!("fan is a valid mesh");
        };
        let (mut fx, mut fy, mut fz) = (vec![0.0; 7], vec![0.0; 7], vec![0.0; 7]);
        Smoothing::new(1.0).update_forces(&mesh, &mut fx, &mut fy, &mut fz);
        assert!(fz[0] < 0.0);
        assert_relative_eq!(Vector3::new(fx[0], fy[0], 0.0).norm(), 0.0, epsilon = 1e-12);
    }
}
