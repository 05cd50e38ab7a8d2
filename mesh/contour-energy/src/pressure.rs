//! Uniform pressure with a soft area cap.

use contour_types::SurfaceMesh;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::energy::{ExternalEnergy, add_at};

/// Parameters for [`Pressure`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PressureParams {
    /// Force per triangle; positive inflates.
    pub pressure: f64,

    /// Surface area, relative to the reference area, past which the force
    /// starts to decay.
    pub cap_ratio: f64,

    /// Exponential decay rate past the cap.
    pub decay: f64,
}

impl Default for PressureParams {
    fn default() -> Self {
        Self {
            pressure: 0.0,
            cap_ratio: 2.0,
            decay: 1.0,
        }
    }
}

impl PressureParams {
    /// Parameters with the given pressure and default cap.
    #[must_use]
    pub fn new(pressure: f64) -> Self {
        Self {
            pressure,
            ..Self::default()
        }
    }

    /// Set the cap ratio.
    #[must_use]
    pub const fn with_cap_ratio(mut self, ratio: f64) -> Self {
        self.cap_ratio = ratio;
        self
    }

    /// Set the decay rate.
    #[must_use]
    pub const fn with_decay(mut self, decay: f64) -> Self {
        self.decay = decay;
        self
    }

    /// Force multiplier for a surface of `area` against `reference_area`.
    ///
    /// One up to `cap_ratio × reference_area`, then
    /// `exp(-decay × (area / reference_area - cap_ratio))`.
    #[must_use]
    pub fn scale_for(&self, area: f64, reference_area: f64) -> f64 {
        if reference_area <= 0.0 {
            return 1.0;
        }
        let ratio = area / reference_area;
        if ratio > self.cap_ratio {
            (-self.decay * (ratio - self.cap_ratio)).exp()
        } else {
            1.0
        }
    }
}

/// Pushes every triangle along its normal.
///
/// Each triangle adds `pressure / 3` along its unit normal to each of its
/// corners. The reference area is captured when the energy is created; once
/// the surface grows past the cap the force decays instead of inflating the
/// mesh without bound.
///
/// # Example
///
/// ```
/// use contour_energy::{ExternalEnergy, Pressure, PressureParams};
/// use contour_types::block;
///
/// let mesh = block(1.0, 1.0, 1.0);
/// let pressure = Pressure::new(&mesh, PressureParams::new(0.3));
/// let (mut fx, mut fy, mut fz) = (vec![0.0; 8], vec![0.0; 8], vec![0.0; 8]);
/// pressure.update_forces(&mesh, &mut fx, &mut fy, &mut fz);
///
/// // Every corner is pushed outward.
/// for i in 0..8 {
///     let p = mesh.position(i);
///     assert!(fx[i] * p.x + fy[i] * p.y + fz[i] * p.z > 0.0);
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Pressure {
    params: PressureParams,
    reference_area: f64,
}

impl Pressure {
    /// Creates a pressure energy using the current area of `mesh` as the
    /// reference.
    #[must_use]
    pub fn new(mesh: &SurfaceMesh, params: PressureParams) -> Self {
        Self {
            params,
            reference_area: mesh.surface_area(),
        }
    }

    /// Replace the reference area.
    #[must_use]
    pub const fn with_reference_area(mut self, area: f64) -> Self {
        self.reference_area = area;
        self
    }

    /// Parameters in use.
    #[must_use]
    pub const fn params(&self) -> &PressureParams {
        &self.params
    }

    /// Area the cap is measured against.
    #[must_use]
    pub const fn reference_area(&self) -> f64 {
        self.reference_area
    }
}

impl ExternalEnergy for Pressure {
    fn name(&self) -> &'static str {
        "pressure"
    }

    fn update_forces(&self, mesh: &SurfaceMesh, fx: &mut [f64], fy: &mut [f64], fz: &mut [f64]) {
        let geometries = mesh.triangle_geometries();
        let area: f64 = geometries.iter().map(|g| g.area).sum();
        let share = self.params.pressure / 3.0 * self.params.scale_for(area, self.reference_area);
        for (tri, geometry) in mesh.triangles().iter().zip(&geometries) {
            let f = geometry.normal * share;
            for node in tri.indices() {
                add_at(node, &f, fx, fy, fz);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use contour_types::{Point3, block};

    fn total_force(energy: &Pressure, mesh: &SurfaceMesh) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
        let n = mesh.node_count();
        let (mut fx, mut fy, mut fz) = (vec![0.0; n], vec![0.0; n], vec![0.0; n]);
        energy.update_forces(mesh, &mut fx, &mut fy, &mut fz);
        (fx, fy, fz)
    }

    #[test]
    fn closed_mesh_has_no_net_force() {
        let mesh = block(1.0, 2.0, 3.0);
        let (fx, fy, fz) = total_force(&Pressure::new(&mesh, PressureParams::new(1.0)), &mesh);
        assert_relative_eq!(fx.iter().sum::<f64>(), 0.0, epsilon = 1e-12);
        assert_relative_eq!(fy.iter().sum::<f64>(), 0.0, epsilon = 1e-12);
        assert_relative_eq!(fz.iter().sum::<f64>(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn cap_decays_force() {
        let params = PressureParams::new(1.0);
        assert_relative_eq!(params.scale_for(1.5, 1.0), 1.0);
        assert_relative_eq!(params.scale_for(2.0, 1.0), 1.0);
        assert_relative_eq!(params.scale_for(3.0, 1.0), (-1.0_f64).exp());
        let steep = params.with_cap_ratio(1.2).with_decay(5.0);
        assert_relative_eq!(steep.scale_for(1.4, 1.0), (-1.0_f64).exp(), epsilon = 1e-12);
    }

    #[test]
    fn grown_mesh_is_pushed_less() {
        let small = block(1.0, 1.0, 1.0);
        let energy = Pressure::new(&small, PressureParams::new(1.0));
        let mut large = small.clone();
        large.scale_about(&Point3::origin(), 2.0);

        let (fx_small, _, _) = total_force(&energy, &small);
        let (fx_large, _, _) = total_force(&energy, &large);
        // Four times the area: scaled by exp(-2).
        for (a, b) in fx_small.iter().zip(&fx_large) {
            assert_relative_eq!(a * (-2.0_f64).exp(), *b, epsilon = 1e-12);
        }
    }
}
