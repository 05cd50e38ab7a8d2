//! Triangle meshes as ray targets.

use contour_types::{Bounds, SurfaceMesh};
use nalgebra::{Point3, Vector3};
use rayon::prelude::*;

use crate::intersectable::{Intersectable, walk_up};
use crate::ray::{Intersection, Ray};
use crate::triangle::InterceptingTriangle;

/// A snapshot of a closed mesh prepared for ray and containment queries.
///
/// The snapshot does not follow later changes to the source mesh; rebuild it
/// after the mesh moves.
///
/// # Example
///
/// ```
/// use contour_raycast::{InterceptingMesh, Intersectable};
/// use contour_types::{block, Point3};
///
/// let target = InterceptingMesh::new(&block(2.0, 2.0, 2.0));
/// assert!(target.contains(&Point3::new(0.5, -0.5, 0.9)));
/// assert!(!target.contains(&Point3::new(0.0, 0.0, 1.5)));
/// ```
#[derive(Debug, Clone)]
pub struct InterceptingMesh {
    triangles: Vec<InterceptingTriangle>,
    bounds: Option<Bounds>,
    center: Point3<f64>,
    area: f64,
}

impl InterceptingMesh {
    /// Snapshots the triangles of `mesh`.
    #[must_use]
    pub fn new(mesh: &SurfaceMesh) -> Self {
        let positions = mesh.positions();
        let triangles: Vec<InterceptingTriangle> = mesh
            .triangles()
            .iter()
            .map(|t| {
                let [a, b, c] = t.indices().map(|i| contour_types::node_position(positions, i));
                InterceptingTriangle::new(a, b, c)
            })
            .collect();

        let mut weighted = Vector3::zeros();
        let mut area = 0.0;
        for tri in &triangles {
            let a = tri.area();
            weighted += tri.center().coords * a;
            area += a;
        }
        let center = if area > 0.0 {
            Point3::from(weighted / area)
        } else {
            mesh.centroid()
        };

        Self {
            triangles,
            bounds: mesh.bounds(),
            center,
            area,
        }
    }

    /// Area-weighted center of the surface.
    #[must_use]
    pub const fn center(&self) -> Point3<f64> {
        self.center
    }

    /// Total surface area.
    #[must_use]
    pub const fn area(&self) -> f64 {
        self.area
    }

    /// Bounding box of the source nodes.
    #[must_use]
    pub const fn bounds(&self) -> Option<Bounds> {
        self.bounds
    }

    /// Number of triangles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.triangles.len()
    }

    /// Whether the snapshot has no triangles.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }
}

impl Intersectable for InterceptingMesh {
    fn intersections(&self, ray: &Ray) -> Vec<Intersection> {
        self.triangles
            .par_iter()
            .filter_map(|t| t.intersect(ray))
            .collect()
    }

    /// Rejects points outside the bounding box before walking the +z ray.
    fn contains(&self, point: &Point3<f64>) -> bool {
        if !self.bounds.is_some_and(|b| b.contains(point)) {
            return false;
        }
        walk_up(self, point)
    }
}
