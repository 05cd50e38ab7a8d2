//! Rays and ray hits.

use nalgebra::{Point3, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A ray defined by an origin point and a direction vector.
///
/// Hits are reported on both sides of the origin; callers filter by the sign
/// of [`Ray::signed_distance`].
///
/// # Example
///
/// ```
/// use contour_raycast::Ray;
/// use nalgebra::{Point3, Vector3};
///
/// let ray = Ray::new(Point3::origin(), Vector3::new(0.0, 0.0, 2.0));
/// assert!((ray.point_at(1.5).z - 3.0).abs() < 1e-12);
/// assert!((ray.signed_distance(&Point3::new(0.0, 0.0, -1.0)) + 2.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Ray {
    /// Start of the ray.
    pub origin: Point3<f64>,
    /// Direction, not necessarily normalized.
    pub direction: Vector3<f64>,
}

impl Ray {
    /// Creates a ray.
    #[must_use]
    pub const fn new(origin: Point3<f64>, direction: Vector3<f64>) -> Self {
        Self { origin, direction }
    }

    /// The point `origin + t * direction`.
    #[must_use]
    pub fn point_at(&self, t: f64) -> Point3<f64> {
        self.origin + self.direction * t
    }

    /// Projection of `p - origin` onto the direction.
    #[must_use]
    pub fn signed_distance(&self, p: &Point3<f64>) -> f64 {
        (p - self.origin).dot(&self.direction)
    }

    /// Copy of the ray with a unit direction. Zero directions are left alone.
    #[must_use]
    pub fn normalized(&self) -> Self {
        let norm = self.direction.norm();
        if norm < f64::EPSILON {
            return *self;
        }
        Self {
            origin: self.origin,
            direction: self.direction / norm,
        }
    }
}

/// A surface crossing found by a ray.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Intersection {
    /// Where the ray crosses the surface.
    pub location: Point3<f64>,
    /// Outward unit normal of the surface at the crossing.
    pub normal: Vector3<f64>,
    /// Zero for clean hits; grows as the hit approaches a triangle edge.
    pub dirtiness: f64,
}

impl Intersection {
    /// A clean hit.
    #[must_use]
    pub const fn new(location: Point3<f64>, normal: Vector3<f64>) -> Self {
        Self {
            location,
            normal,
            dirtiness: 0.0,
        }
    }

    /// Placeholder for "no hit": every component is `+∞`.
    #[must_use]
    pub fn infinite() -> Self {
        let inf = f64::INFINITY;
        Self {
            location: Point3::new(inf, inf, inf),
            normal: Vector3::new(inf, inf, inf),
            dirtiness: inf,
        }
    }

    /// Whether this is a real hit rather than the placeholder.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.location.iter().all(|c| c.is_finite())
    }

    /// Whether the hit lies within the triangle edge tolerance band.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirtiness > 0.0
    }
}
