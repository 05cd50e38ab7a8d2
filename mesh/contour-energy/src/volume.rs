//! Volume conservation.

use contour_curvature::mean_curvatures;
use contour_types::SurfaceMesh;

use crate::energy::{ExternalEnergy, add_at};

/// Inflates or deflates the mesh back towards a target volume.
///
/// Each node is pushed along its normal by
/// `weight × (V0 − V) × mixed_area`, where `V0` is the target volume and
/// `V` the current enclosed volume.
///
/// # Example
///
/// ```
/// use contour_energy::{ExternalEnergy, VolumeConservation};
/// use contour_types::{block, Point3};
///
/// let mut mesh = block(1.0, 1.0, 1.0);
/// let energy = VolumeConservation::new(&mesh, 10.0);
/// mesh.scale_about(&Point3::origin(), 0.9);
///
/// let (mut fx, mut fy, mut fz) = (vec![0.0; 8], vec![0.0; 8], vec![0.0; 8]);
/// energy.update_forces(&mesh, &mut fx, &mut fy, &mut fz);
/// // The shrunken block is pushed back out.
/// let p = mesh.position(2);
/// assert!(fx[2] * p.x + fy[2] * p.y + fz[2] * p.z > 0.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolumeConservation {
    weight: f64,
    target: f64,
}

impl VolumeConservation {
    /// Captures the current volume of `mesh` as the target.
    #[must_use]
    pub fn new(mesh: &SurfaceMesh, weight: f64) -> Self {
        Self {
            weight,
            target: mesh.signed_volume(),
        }
    }

    /// Replace the target volume.
    #[must_use]
    pub const fn with_target_volume(mut self, volume: f64) -> Self {
        self.target = volume;
        self
    }

    /// Volume the mesh is held at.
    #[must_use]
    pub const fn target_volume(&self) -> f64 {
        self.target
    }
}

impl ExternalEnergy for VolumeConservation {
    fn name(&self) -> &'static str {
        "volume"
    }

    fn update_forces(&self, mesh: &SurfaceMesh, fx: &mut [f64], fy: &mut [f64], fz: &mut [f64]) {
        let factor = self.weight * (self.target - mesh.signed_volume());
        if factor == 0.0 {
            return;
        }
        for (i, sample) in mean_curvatures(mesh).iter().enumerate() {
            add_at(i, &(sample.normal * (factor * sample.mixed_area)), fx, fy, fz);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use contour_types::{Point3, block};

    fn radial(energy: &VolumeConservation, mesh: &SurfaceMesh) -> Vec<f64> {
        let n = mesh.node_count();
        let (mut fx, mut fy, mut fz) = (vec![0.0; n], vec![0.0; n], vec![0.0; n]);
        energy.update_forces(mesh, &mut fx, &mut fy, &mut fz);
        (0..n)
            .map(|i| {
                let p = mesh.position(i);
                fx[i] * p.x + fy[i] * p.y + fz[i] * p.z
            })
            .collect()
    }

    #[test]
    fn no_force_at_target_volume() {
        let mesh = block(1.0, 2.0, 1.0);
        let energy = VolumeConservation::new(&mesh, 5.0);
        assert_relative_eq!(energy.target_volume(), 2.0, epsilon = 1e-12);
        for r in radial(&energy, &mesh) {
            assert_relative_eq!(r, 0.0);
        }
    }

    #[test]
    fn grown_mesh_is_pulled_in() {
        let mut mesh = block(1.0, 1.0, 1.0);
        let energy = VolumeConservation::new(&mesh, 1.0);
        mesh.scale_about(&Point3::origin(), 1.5);
        assert!(radial(&energy, &mesh).iter().all(|&r| r < 0.0));
    }

    #[test]
    fn target_can_be_replaced() {
        let mesh = block(1.0, 1.0, 1.0);
        let energy = VolumeConservation::new(&mesh, 1.0).with_target_volume(3.0);
        assert!(radial(&energy, &mesh).iter().all(|&r| r > 0.0));
    }
}
