//! Analytic target surfaces.

use contour_types::Bounds;
use nalgebra::{Point3, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{RaycastError, RaycastResult};
use crate::intersectable::Intersectable;
use crate::ray::{Intersection, Ray};

/// Inset applied to box faces so face hits pass the box's own containment check.
const BOX_TOLERANCE: f64 = 1e-9;

/// A sphere target.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Sphere {
    center: Point3<f64>,
    radius: f64,
}

impl Sphere {
    /// Creates a sphere.
    ///
    /// # Errors
    ///
    /// Returns [`RaycastError::InvalidRadius`] unless `radius` is positive and finite.
    pub fn new(center: Point3<f64>, radius: f64) -> RaycastResult<Self> {
        if !(radius > 0.0 && radius.is_finite()) {
            return Err(RaycastError::InvalidRadius(radius));
        }
        Ok(Self { center, radius })
    }

    /// Center of the sphere.
    #[must_use]
    pub const fn center(&self) -> Point3<f64> {
        self.center
    }

    /// Radius of the sphere.
    #[must_use]
    pub const fn radius(&self) -> f64 {
        self.radius
    }
}

impl Intersectable for Sphere {
    fn intersections(&self, ray: &Ray) -> Vec<Intersection> {
        let ray = ray.normalized();
        let dir = ray.direction;
        if dir.norm_squared() == 0.0 {
            return Vec::new();
        }
        let r = self.center - ray.origin;
        let s = r.dot(&dir);
        let perpendicular = (r - dir * s).norm();
        if perpendicular > self.radius {
            return Vec::new();
        }
        let arm = (self.radius * self.radius - perpendicular * perpendicular).sqrt();
        [s - arm, s + arm]
            .into_iter()
            .map(|t| {
                let location = ray.point_at(t);
                Intersection::new(location, (location - self.center) / self.radius)
            })
            .collect()
    }

    fn contains(&self, point: &Point3<f64>) -> bool {
        (point - self.center).norm() < self.radius
    }
}

/// An axis-aligned box target.
///
/// # Example
///
/// ```
/// use contour_raycast::{AxisBox, Intersectable, Ray};
/// use nalgebra::{Point3, Vector3};
///
/// let target = AxisBox::new(Point3::new(-1.0, -1.0, -1.0), Point3::new(1.0, 1.0, 1.0));
/// let hits = target.intersections(&Ray::new(Point3::origin(), Vector3::x()));
/// assert_eq!(hits.len(), 2);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AxisBox {
    bounds: Bounds,
}

impl AxisBox {
    /// Creates a box from two opposite corners.
    #[must_use]
    pub fn new(a: Point3<f64>, b: Point3<f64>) -> Self {
        Self {
            bounds: Bounds::new(a, b),
        }
    }

    /// The box extent.
    #[must_use]
    pub const fn bounds(&self) -> Bounds {
        self.bounds
    }

    fn within_face(&self, p: &Point3<f64>, axis: usize) -> bool {
        (0..3).filter(|&i| i != axis).all(|i| {
            p[i] >= self.bounds.min[i] - BOX_TOLERANCE && p[i] <= self.bounds.max[i] + BOX_TOLERANCE
        })
    }
}

impl Intersectable for AxisBox {
    fn intersections(&self, ray: &Ray) -> Vec<Intersection> {
        let mut hits = Vec::with_capacity(2);
        for axis in 0..3 {
            let d = ray.direction[axis];
            if d == 0.0 {
                continue;
            }
            for (plane, sign) in [(self.bounds.min[axis], -1.0), (self.bounds.max[axis], 1.0)] {
                let t = (plane - ray.origin[axis]) / d;
                let location = ray.point_at(t);
                if self.within_face(&location, axis) {
                    let mut normal = Vector3::zeros();
                    normal[axis] = sign;
                    hits.push(Intersection::new(location, normal));
                }
            }
        }
        hits
    }

    fn contains(&self, point: &Point3<f64>) -> bool {
        self.bounds.contains(point)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn sphere_hits_both_sides() {
        let sphere = Sphere::new(Point3::new(0.0, 0.0, 0.0), 2.0).unwrap();
        let ray = Ray::new(Point3::new(0.0, 0.0, 0.0), Vector3::new(0.0, 0.0, 5.0));
        let hits = sphere.intersections(&ray);
        assert_eq!(hits.len(), 2);
        assert_relative_eq!(hits[0].location.z, -2.0, epsilon = 1e-12);
        assert_relative_eq!(hits[1].location.z, 2.0, epsilon = 1e-12);
        assert_relative_eq!(hits[1].normal, Vector3::z(), epsilon = 1e-12);
    }

    #[test]
    fn sphere_miss() {
        let sphere = Sphere::new(Point3::new(0.0, 3.0, 0.0), 1.0).unwrap();
        let ray = Ray::new(Point3::origin(), Vector3::x());
        assert!(sphere.intersections(&ray).is_empty());
        assert!(!sphere.contains(&Point3::origin()));
    }

    #[test]
    fn sphere_rejects_bad_radius() {
        assert!(Sphere::new(Point3::origin(), 0.0).is_err());
        assert!(Sphere::new(Point3::origin(), f64::NAN).is_err());
    }

    #[test]
    fn box_normals_face_outward() {
        let target = AxisBox::new(Point3::new(1.0, 1.0, 1.0), Point3::new(-1.0, -2.0, -3.0));
        let ray = Ray::new(Point3::origin(), Vector3::z());
        let mut hits = target.intersections(&ray);
        hits.sort_by(|a, b| a.location.z.total_cmp(&b.location.z));
        assert_eq!(hits.len(), 2);
        assert_relative_eq!(hits[0].location.z, -3.0);
        assert_relative_eq!(hits[0].normal.z, -1.0);
        assert_relative_eq!(hits[1].normal.z, 1.0);
        assert!(target.contains(&Point3::new(0.5, -1.5, -2.5)));
    }
}
