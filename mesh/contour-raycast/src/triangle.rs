//! Ray-triangle intersection.

use nalgebra::{Point3, Vector3};

use crate::ray::{Intersection, Ray};

/// Barycentric tolerance band around triangle edges.
pub const EDGE_TOLERANCE: f64 = 1e-10;

/// A triangle prepared for repeated ray queries.
///
/// The intersection is computed in the triangle's plane with barycentric
/// coordinates. Hits whose coordinates fall inside `[-tol, tol)` are still
/// accepted but carry a non-zero [`Intersection::dirtiness`].
///
/// # Example
///
/// ```
/// use contour_raycast::{InterceptingTriangle, Ray};
/// use nalgebra::{Point3, Vector3};
///
/// let tri = InterceptingTriangle::new(
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(0.0, 1.0, 0.0),
/// );
/// let hit = tri.intersect(&Ray::new(Point3::new(0.25, 0.25, 1.0), -Vector3::z())).unwrap();
/// assert!(hit.location.z.abs() < 1e-12);
/// assert!(!hit.is_dirty());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InterceptingTriangle {
    a: Point3<f64>,
    u: Vector3<f64>,
    v: Vector3<f64>,
    cross: Vector3<f64>,
    unit_normal: Vector3<f64>,
    inv_cross_sq: f64,
}

impl InterceptingTriangle {
    /// Prepares triangle `(a, b, c)`.
    #[must_use]
    pub fn new(a: Point3<f64>, b: Point3<f64>, c: Point3<f64>) -> Self {
        let u = b - a;
        let v = c - a;
        let cross = u.cross(&v);
        let sq = cross.norm_squared();
        let (unit_normal, inv_cross_sq) = if sq > 0.0 {
            (cross / sq.sqrt(), 1.0 / sq)
        } else {
            (Vector3::zeros(), 0.0)
        };
        Self {
            a,
            u,
            v,
            cross,
            unit_normal,
            inv_cross_sq,
        }
    }

    /// Unit normal, zero for degenerate triangles.
    #[must_use]
    pub const fn normal(&self) -> Vector3<f64> {
        self.unit_normal
    }

    /// Triangle area.
    #[must_use]
    pub fn area(&self) -> f64 {
        0.5 * self.cross.norm()
    }

    /// Centroid.
    #[must_use]
    pub fn center(&self) -> Point3<f64> {
        self.a + (self.u + self.v) / 3.0
    }

    /// Corners in winding order.
    #[must_use]
    pub fn corners(&self) -> [Point3<f64>; 3] {
        [self.a, self.a + self.u, self.a + self.v]
    }

    /// Crossing of the ray's line with the triangle, on either side of the origin.
    ///
    /// Returns `None` for rays parallel to the plane, degenerate triangles,
    /// or crossings outside the tolerance band.
    #[must_use]
    pub fn intersect(&self, ray: &Ray) -> Option<Intersection> {
        if self.inv_cross_sq == 0.0 {
            return None;
        }
        let rn = ray.direction.dot(&self.unit_normal);
        if rn == 0.0 {
            return None;
        }
        let s = self.unit_normal.dot(&(self.a - ray.origin)) / rn;
        let location = ray.point_at(s);
        let w = location - self.a;

        let b2 = self.u.cross(&w).dot(&self.cross) * self.inv_cross_sq;
        let b1 = w.cross(&self.v).dot(&self.cross) * self.inv_cross_sq;
        let b0 = 1.0 - b1 - b2;

        let coords = [b0, b1, b2];
        if coords.iter().any(|&b| b < -EDGE_TOLERANCE) {
            return None;
        }
        let dirtiness = coords
            .iter()
            .filter(|&&b| b < EDGE_TOLERANCE)
            .map(|&b| EDGE_TOLERANCE - b)
            .sum();
        Some(Intersection {
            location,
            normal: self.unit_normal,
            dirtiness,
        })
    }
}
