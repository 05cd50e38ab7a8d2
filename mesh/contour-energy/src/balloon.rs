//! Inflation inside a bounding surface.

use std::fmt;
use std::sync::Arc;

use contour_curvature::mean_curvatures;
use contour_raycast::Intersectable;
use contour_types::{Point3, SurfaceMesh};

use crate::energy::{ExternalEnergy, add_at};

/// Pushes nodes outwards while they are inside a bounding surface.
///
/// A contained node receives `weight × mixed_area × n̂`; once it reaches the
/// boundary the push stops, so the mesh inflates until it fills the shape.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
///
/// use contour_energy::{Ballooning, ExternalEnergy};
/// use contour_raycast::Sphere;
/// use contour_types::{block, Point3};
///
/// let mesh = block(0.5, 0.5, 0.5);
/// let balloon = Ballooning::new(Arc::new(Sphere::new(Point3::origin(), 2.0)?), 1.0);
///
/// let (mut fx, mut fy, mut fz) = (vec![0.0; 8], vec![0.0; 8], vec![0.0; 8]);
/// balloon.update_forces(&mesh, &mut fx, &mut fy, &mut fz);
/// let p = mesh.position(0);
/// assert!(fx[0] * p.x + fy[0] * p.y + fz[0] * p.z > 0.0);
/// # Ok::<(), contour_raycast::RaycastError>(())
/// ```
#[derive(Clone)]
pub struct Ballooning {
    boundary: Arc<dyn Intersectable>,
    weight: f64,
}

impl Ballooning {
    /// Creates the energy inside `boundary`.
    #[must_use]
    pub fn new(boundary: Arc<dyn Intersectable>, weight: f64) -> Self {
        Self { boundary, weight }
    }

    /// Push per unit area.
    #[must_use]
    pub const fn weight(&self) -> f64 {
        self.weight
    }
}

impl fmt::Debug for Ballooning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ballooning")
            .field("weight", &self.weight)
            .finish_non_exhaustive()
    }
}

impl ExternalEnergy for Ballooning {
    fn name(&self) -> &'static str {
        "balloon"
    }

    fn update_forces(&self, mesh: &SurfaceMesh, fx: &mut [f64], fy: &mut [f64], fz: &mut [f64]) {
        for (i, sample) in mean_curvatures(mesh).iter().enumerate() {
            if self.boundary.contains(&mesh.position(i)) {
                let f = sample.normal * (self.weight * sample.mixed_area);
                add_at(i, &f, fx, fy, fz);
            }
        }
    }

    fn energy(&self, point: &Point3<f64>) -> f64 {
        if self.boundary.contains(point) { 1.0 } else { 0.0 }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use contour_raycast::Sphere;
    use contour_types::block;

    #[test]
    fn only_contained_nodes_inflate() {
        // Corners sit at distance sqrt(0.75); the sphere cuts the block so
        // only the +x corners stay inside.
        let mesh = block(1.0, 1.0, 1.0);
        let sphere = Sphere::new(Point3::new(0.3, 0.0, 0.0), 0.9).unwrap();
        let balloon = Ballooning::new(Arc::new(sphere), 2.0);
        let (mut fx, mut fy, mut fz) = (vec![0.0; 8], vec![0.0; 8], vec![0.0; 8]);
        balloon.update_forces(&mesh, &mut fx, &mut fy, &mut fz);
        for i in 0..8 {
            let p = mesh.position(i);
            let outward = fx[i] * p.x + fy[i] * p.y + fz[i] * p.z;
            if p.x > 0.0 {
                assert!(outward > 0.0);
            } else {
                assert_eq!(outward, 0.0);
            }
        }
        assert_eq!(balloon.energy(&Point3::new(0.3, 0.0, 0.0)), 1.0);
        assert_eq!(balloon.energy(&Point3::new(-1.0, 0.0, 0.0)), 0.0);
    }
}
