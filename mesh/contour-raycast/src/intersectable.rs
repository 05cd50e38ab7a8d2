//! The surface contract used by ray casting and containment queries.

use std::sync::Arc;

use nalgebra::{Point3, Vector3};

use crate::ray::{Intersection, Ray};

/// A closed surface that can be crossed by rays and queried for containment.
///
/// Implementations report every crossing along the full line of the ray, in
/// any order, including crossings behind the origin.
pub trait Intersectable: Send + Sync {
    /// All crossings of the line through `ray`.
    fn intersections(&self, ray: &Ray) -> Vec<Intersection>;

    /// Whether `point` is strictly inside the surface.
    ///
    /// The provided method casts one ray along +z and walks the crossings at
    /// or below `point` in order of height: each crossing whose normal points
    /// up leaves the surface, any other enters it. Analytic shapes override
    /// this with a direct test.
    fn contains(&self, point: &Point3<f64>) -> bool {
        walk_up(self, point)
    }
}

/// Containment by walking the crossings of a +z ray through `point`.
pub(crate) fn walk_up<S: Intersectable + ?Sized>(surface: &S, point: &Point3<f64>) -> bool {
    let mut hits = surface.intersections(&Ray::new(*point, Vector3::z()));
    hits.sort_by(|a, b| a.location.z.total_cmp(&b.location.z));

    let mut outside = true;
    for hit in hits.iter().take_while(|h| h.location.z <= point.z) {
        outside = hit.normal.z > 0.0;
    }
    !outside
}

impl<T: Intersectable + ?Sized> Intersectable for Arc<T> {
    fn intersections(&self, ray: &Ray) -> Vec<Intersection> {
        (**self).intersections(ray)
    }

    fn contains(&self, point: &Point3<f64>) -> bool {
        (**self).contains(point)
    }
}

impl<T: Intersectable + ?Sized> Intersectable for Box<T> {
    fn intersections(&self, ray: &Ray) -> Vec<Intersection> {
        (**self).intersections(ray)
    }

    fn contains(&self, point: &Point3<f64>) -> bool {
        (**self).contains(point)
    }
}

/// A union of surfaces.
///
/// Crossings are concatenated and a point is contained if any member
/// contains it.
///
/// # Example
///
/// ```
/// use contour_raycast::{Composite, Intersectable, Sphere};
/// use nalgebra::Point3;
///
/// let composite = Composite::new()
///     .with(Sphere::new(Point3::new(-1.0, 0.0, 0.0), 0.5)?)
///     .with(Sphere::new(Point3::new(1.0, 0.0, 0.0), 0.5)?);
/// assert!(composite.contains(&Point3::new(1.2, 0.0, 0.0)));
/// assert!(!composite.contains(&Point3::origin()));
/// # Ok::<(), contour_raycast::RaycastError>(())
/// ```
#[derive(Default, Clone)]
pub struct Composite {
    members: Vec<Arc<dyn Intersectable>>,
}

impl Composite {
    /// An empty composite.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a surface.
    #[must_use]
    pub fn with(mut self, surface: impl Intersectable + 'static) -> Self {
        self.members.push(Arc::new(surface));
        self
    }

    /// Adds a shared surface.
    pub fn push(&mut self, surface: Arc<dyn Intersectable>) {
        self.members.push(surface);
    }

    /// Number of member surfaces.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether there are no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

impl std::fmt::Debug for Composite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Composite")
            .field("members", &self.members.len())
            .finish()
    }
}

impl Intersectable for Composite {
    fn intersections(&self, ray: &Ray) -> Vec<Intersection> {
        self.members
            .iter()
            .flat_map(|m| m.intersections(ray))
            .collect()
    }

    fn contains(&self, point: &Point3<f64>) -> bool {
        self.members.iter().any(|m| m.contains(point))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::shapes::Sphere;
    use nalgebra::Vector3;

    #[test]
    fn composite_concatenates_hits() {
        let composite = Composite::new()
            .with(Sphere::new(Point3::new(0.0, 0.0, -2.0), 1.0).unwrap())
            .with(Sphere::new(Point3::new(0.0, 0.0, 2.0), 1.0).unwrap());
        let hits = composite.intersections(&Ray::new(Point3::origin(), Vector3::z()));
        assert_eq!(hits.len(), 4);
        assert_eq!(composite.len(), 2);
    }

    /// Exposes only the crossings of a mesh, so containment falls back to
    /// the provided ray walk.
    struct Crossings(crate::InterceptingMesh);

    impl Intersectable for Crossings {
        fn intersections(&self, ray: &Ray) -> Vec<Intersection> {
            self.0.intersections(ray)
        }
    }

    #[test]
    fn provided_containment_walks_crossings() {
        let mut mesh = contour_types::block(1.0, 1.0, 1.0);
        mesh.translate(&Vector3::new(0.0, 0.05, 0.1));
        let surface = Crossings(crate::InterceptingMesh::new(&mesh));
        assert!(surface.contains(&Point3::origin()));
        assert!(surface.contains(&Point3::new(0.4, 0.3, -0.3)));
        assert!(!surface.contains(&Point3::new(0.0, 0.0, 2.0)));
        assert!(!surface.contains(&Point3::new(0.0, 0.0, -2.0)));
        assert!(!surface.contains(&Point3::new(2.0, 0.0, 0.0)));
    }

    #[test]
    fn empty_composite_contains_nothing() {
        let composite = Composite::new();
        assert!(composite.is_empty());
        assert!(!composite.contains(&Point3::origin()));
    }
}
