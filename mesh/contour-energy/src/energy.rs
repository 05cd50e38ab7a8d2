//! The external energy contract.

use std::sync::Arc;

use contour_types::{Point3, SurfaceMesh, Vector3};

/// A force field acting on the nodes of a deforming mesh.
///
/// Implementations add their contribution to the per-axis force
/// accumulators, one entry per node, and never touch the mesh topology.
/// They are shared with worker threads, hence `Send + Sync`.
///
/// # Example
///
/// ```
/// use contour_energy::ExternalEnergy;
/// use contour_types::{block, Point3, SurfaceMesh};
///
/// /// Pulls every node down.
/// struct Gravity(f64);
///
/// impl ExternalEnergy for Gravity {
///     fn name(&self) -> &'static str {
///         "gravity"
///     }
///
///     fn update_forces(&self, mesh: &SurfaceMesh, _: &mut [f64], _: &mut [f64], fz: &mut [f64]) {
///         for f in fz.iter_mut().take(mesh.node_count()) {
///             *f -= self.0;
///         }
///     }
///
///     fn energy(&self, point: &Point3<f64>) -> f64 {
///         self.0 * point.z
///     }
/// }
///
/// let mesh = block(1.0, 1.0, 1.0);
/// let (mut fx, mut fy, mut fz) = (vec![0.0; 8], vec![0.0; 8], vec![0.0; 8]);
/// Gravity(9.8).update_forces(&mesh, &mut fx, &mut fy, &mut fz);
/// assert!(fz.iter().all(|&f| f < 0.0));
/// ```
pub trait ExternalEnergy: Send + Sync {
    /// Short name used in log output.
    fn name(&self) -> &'static str;

    /// Adds this energy's force on every node to `fx`, `fy` and `fz`.
    fn update_forces(&self, mesh: &SurfaceMesh, fx: &mut [f64], fy: &mut [f64], fz: &mut [f64]);

    /// Scalar energy at an arbitrary point.
    fn energy(&self, _point: &Point3<f64>) -> f64 {
        0.0
    }
}

impl<T: ExternalEnergy + ?Sized> ExternalEnergy for Box<T> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn update_forces(&self, mesh: &SurfaceMesh, fx: &mut [f64], fy: &mut [f64], fz: &mut [f64]) {
        (**self).update_forces(mesh, fx, fy, fz);
    }

    fn energy(&self, point: &Point3<f64>) -> f64 {
        (**self).energy(point)
    }
}

impl<T: ExternalEnergy + ?Sized> ExternalEnergy for Arc<T> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn update_forces(&self, mesh: &SurfaceMesh, fx: &mut [f64], fy: &mut [f64], fz: &mut [f64]) {
        (**self).update_forces(mesh, fx, fy, fz);
    }

    fn energy(&self, point: &Point3<f64>) -> f64 {
        (**self).energy(point)
    }
}

/// Adds per-node force vectors into split accumulators.
pub(crate) fn accumulate(forces: &[Vector3<f64>], fx: &mut [f64], fy: &mut [f64], fz: &mut [f64]) {
    for (i, f) in forces.iter().enumerate().take(fx.len().min(fy.len()).min(fz.len())) {
        fx[i] += f.x;
        fy[i] += f.y;
        fz[i] += f.z;
    }
}

/// Adds one force vector to node `i`, ignoring nodes past the accumulators.
pub(crate) fn add_at(i: usize, f: &Vector3<f64>, fx: &mut [f64], fy: &mut [f64], fz: &mut [f64]) {
    if i < fx.len() && i < fy.len() && i < fz.len() {
        fx[i] += f.x;
        fy[i] += f.y;
        fz[i] += f.z;
    }
}
