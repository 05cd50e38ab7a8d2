//! Repulsion between neighbouring meshes.
//!
//! Both energies hold a snapshot of the neighbouring mesh and push nodes of
//! the driven mesh that have crossed into it back out along their own
//! normals. Refresh the snapshot with `set_neighbor` when the neighbour moves.

use contour_curvature::node_normals;
use contour_raycast::{InterceptingMesh, Intersectable, Ray};
use contour_types::{Point3, SurfaceMesh, Vector3};
use rayon::prelude::*;
use tracing::trace;

use crate::energy::{ExternalEnergy, accumulate};

/// Constant push on nodes inside a neighbouring mesh.
///
/// A contained node receives `-n̂ × weight`, `n̂` being its averaged surface
/// normal.
///
/// # Example
///
/// ```
/// use contour_energy::{ExternalEnergy, Steric};
/// use contour_types::{block, Vector3};
///
/// let mesh = block(1.0, 1.0, 1.0);
/// let mut neighbor = block(1.0, 1.4, 1.4);
/// neighbor.translate(&Vector3::new(0.8, 0.0, 0.0));
///
/// let steric = Steric::new(&neighbor, 2.0);
/// let (mut fx, mut fy, mut fz) = (vec![0.0; 8], vec![0.0; 8], vec![0.0; 8]);
/// steric.update_forces(&mesh, &mut fx, &mut fy, &mut fz);
///
/// // Corners on the +x side are inside the neighbour and pushed back.
/// assert!(fx[2] < 0.0);
/// assert_eq!(fx[0], 0.0);
/// ```
#[derive(Debug, Clone)]
pub struct Steric {
    neighbor: InterceptingMesh,
    weight: f64,
}

impl Steric {
    /// Creates the energy against a snapshot of `neighbor`.
    #[must_use]
    pub fn new(neighbor: &SurfaceMesh, weight: f64) -> Self {
        Self {
            neighbor: InterceptingMesh::new(neighbor),
            weight,
        }
    }

    /// Replaces the neighbour snapshot.
    pub fn set_neighbor(&mut self, neighbor: &SurfaceMesh) {
        self.neighbor = InterceptingMesh::new(neighbor);
    }
}

impl ExternalEnergy for Steric {
    fn name(&self) -> &'static str {
        "steric"
    }

    fn update_forces(&self, mesh: &SurfaceMesh, fx: &mut [f64], fy: &mut [f64], fz: &mut [f64]) {
        let normals = node_normals(mesh);
        let forces: Vec<Vector3<f64>> = normals
            .par_iter()
            .enumerate()
            .map(|(i, n)| {
                if self.neighbor.contains(&mesh.position(i)) {
                    -n * self.weight
                } else {
                    Vector3::zeros()
                }
            })
            .collect();
        accumulate(&forces, fx, fy, fz);
    }

    fn energy(&self, point: &Point3<f64>) -> f64 {
        if self.neighbor.contains(point) { self.weight } else { 0.0 }
    }
}

/// Depth-proportional push on nodes inside a neighbouring mesh.
///
/// A ray is cast along the node normal through the neighbour. Crossings
/// behind the node are walked in order from far to near, toggling between
/// outside and inside; if the node ends up inside, its depth is the distance
/// back to the crossing where it entered and it receives
/// `-n̂ × depth × weight`. Nodes whose crossings do not alternate cleanly
/// between entering and leaving are skipped.
#[derive(Debug, Clone)]
pub struct SofterSteric {
    neighbor: InterceptingMesh,
    neighbor_points: Vec<Point3<f64>>,
    neighbor_normals: Vec<Vector3<f64>>,
    weight: f64,
}

impl SofterSteric {
    /// Creates the energy against a snapshot of `neighbor`.
    #[must_use]
    pub fn new(neighbor: &SurfaceMesh, weight: f64) -> Self {
        Self {
            neighbor: InterceptingMesh::new(neighbor),
            neighbor_points: neighbor.points(),
            neighbor_normals: node_normals(neighbor),
            weight,
        }
    }

    /// Replaces the neighbour snapshot.
    pub fn set_neighbor(&mut self, neighbor: &SurfaceMesh) {
        *self = Self::new(neighbor, self.weight);
    }

    /// How far `point` lies inside the neighbour, measured back along
    /// `direction` to where a ray travelling along `direction` entered it.
    ///
    /// `None` when the point is outside or the crossings are inconsistent.
    #[must_use]
    pub fn penetration_depth(&self, point: &Point3<f64>, direction: &Vector3<f64>) -> Option<f64> {
        if !self.neighbor.bounds().is_some_and(|b| b.contains(point)) {
            return None;
        }
        let ray = Ray::new(*point, *direction);
        let mut crossings: Vec<(f64, bool)> = self
            .neighbor
            .intersections(&ray)
            .iter()
            .map(|hit| (ray.signed_distance(&hit.location), hit.normal.dot(direction) > 0.0))
            .collect();
        crossings.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut outside = true;
        let mut consistent = true;
        let mut entry = 0.0;
        for &(distance, leaving) in crossings.iter().take_while(|c| c.0 <= 0.0) {
            // A leaving crossing while outside, or an entering one while
            // inside, breaks the alternation until the next clean crossing.
            if leaving == outside {
                consistent = false;
            } else if !consistent {
                consistent = true;
            }
            if !leaving {
                entry = distance;
            }
            outside = !outside;
        }

        if !consistent {
            trace!(?point, "skipping node with inconsistent crossings");
            return None;
        }
        (!outside).then_some(-entry)
    }

    fn nearest_neighbor_normal(&self, point: &Point3<f64>) -> Option<Vector3<f64>> {
        self.neighbor_points
            .iter()
            .zip(&self.neighbor_normals)
            .min_by(|a, b| {
                nalgebra::distance_squared(a.0, point)
                    .total_cmp(&nalgebra::distance_squared(b.0, point))
            })
            .map(|(_, n)| *n)
    }
}

impl ExternalEnergy for SofterSteric {
    fn name(&self) -> &'static str {
        "softer-steric"
    }

    fn update_forces(&self, mesh: &SurfaceMesh, fx: &mut [f64], fy: &mut [f64], fz: &mut [f64]) {
        let normals = node_normals(mesh);
        let forces: Vec<Vector3<f64>> = normals
            .par_iter()
            .enumerate()
            .map(|(i, n)| match self.penetration_depth(&mesh.position(i), n) {
                Some(depth) => -n * (depth * self.weight),
                None => Vector3::zeros(),
            })
            .collect();
        accumulate(&forces, fx, fy, fz);
    }

    /// Squared depth of `point` inside the neighbour, measured against the
    /// reversed normal of the closest neighbour node.
    fn energy(&self, point: &Point3<f64>) -> f64 {
        self.nearest_neighbor_normal(point)
            .and_then(|n| self.penetration_depth(point, &(-n)))
            .map_or(0.0, |d| d * d)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use contour_types::block;

    fn forces(energy: &dyn ExternalEnergy, mesh: &SurfaceMesh) -> Vec<Vector3<f64>> {
        let n = mesh.node_count();
        let (mut fx, mut fy, mut fz) = (vec![0.0; n], vec![0.0; n], vec![0.0; n]);
        energy.update_forces(mesh, &mut fx, &mut fy, &mut fz);
        (0..n).map(|i| Vector3::new(fx[i], fy[i], fz[i])).collect()
    }

    #[test]
    fn separated_meshes_do_not_interact() {
        let mesh = block(1.0, 1.0, 1.0);
        let mut neighbor = block(1.0, 1.0, 1.0);
        neighbor.translate(&Vector3::new(3.0, 0.0, 0.0));
        for f in forces(&Steric::new(&neighbor, 1.0), &mesh) {
            assert_eq!(f, Vector3::zeros());
        }
        for f in forces(&SofterSteric::new(&neighbor, 1.0), &mesh) {
            assert_eq!(f, Vector3::zeros());
        }
    }

    #[test]
    fn steric_push_has_unit_magnitude() {
        let mesh = block(1.0, 1.0, 1.0);
        let mut neighbor = block(1.0, 1.4, 1.4);
        neighbor.translate(&Vector3::new(0.8, 0.0, 0.0));
        let pushed: Vec<_> = forces(&Steric::new(&neighbor, 3.0), &mesh)
            .into_iter()
            .filter(|f| f.norm() > 0.0)
            .collect();
        assert_eq!(pushed.len(), 4);
        for f in pushed {
            assert_relative_eq!(f.norm(), 3.0, epsilon = 1e-12);
            assert!(f.x < 0.0);
        }
    }

    #[test]
    fn penetration_depth_through_box_face() {
        let mut neighbor = block(2.0, 2.0, 2.0);
        neighbor.translate(&Vector3::new(0.05, 0.1, 0.0));
        let soft = SofterSteric::new(&neighbor, 1.0);
        // Travelling along +x the ray entered through the face at x = -0.95.
        let depth = soft.penetration_depth(&Point3::new(0.5, 0.0, 0.0), &Vector3::x()).unwrap();
        assert_relative_eq!(depth, 1.45, epsilon = 1e-12);
        assert_eq!(soft.penetration_depth(&Point3::new(1.5, 0.0, 0.0), &Vector3::x()), None);
    }

    #[test]
    fn depth_is_measured_back_to_entry() {
        let mut neighbor = block(1.0, 1.0, 1.0);
        neighbor.translate(&Vector3::new(0.0, 0.1, 0.05));
        let soft = SofterSteric::new(&neighbor, 1.0);
        let far = soft.penetration_depth(&Point3::new(0.4, 0.0, 0.0), &Vector3::x());
        let near = soft.penetration_depth(&Point3::new(-0.3, 0.0, 0.0), &Vector3::x());
        assert_relative_eq!(far.unwrap(), 0.9, epsilon = 1e-12);
        assert_relative_eq!(near.unwrap(), 0.2, epsilon = 1e-12);

        let forces = forces(&soft, &block(0.4, 0.4, 0.4));
        assert!(forces.iter().all(|f| f.norm() > 0.0));
    }

    #[test]
    fn softer_energy_is_squared_depth() {
        let neighbor = block(2.0, 2.0, 2.0);
        let soft = SofterSteric::new(&neighbor, 1.0);
        let outside = Point3::new(0.0, 0.0, 5.0);
        assert_eq!(soft.energy(&outside), 0.0);
        assert!(soft.energy(&Point3::new(0.13, -0.21, 0.6)) > 0.0);
    }
}
