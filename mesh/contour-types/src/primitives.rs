//! Index-based mesh elements.
//!
//! Nodes are plain `usize` indices into the mesh's flat position buffer, so
//! connections and triangles are small `Copy` values that stay valid while the
//! buffer grows.

use std::hash::{Hash, Hasher};

use nalgebra::{Point3, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Reads node `index` from a flat `x, y, z` position buffer.
///
/// # Panics
///
/// Panics if `3 * index + 2` is outside the buffer.
#[inline]
#[must_use]
pub fn node_position(positions: &[f64], index: usize) -> Point3<f64> {
    let i = 3 * index;
    Point3::new(positions[i], positions[i + 1], positions[i + 2])
}

/// An undirected edge between two nodes.
///
/// Equality and hashing ignore the order of the endpoints.
///
/// # Example
///
/// ```
/// use contour_types::Connection;
///
/// assert_eq!(Connection::new(3, 7), Connection::new(7, 3));
/// assert_eq!(Connection::new(3, 7).opposite(3), 7);
/// ```
#[derive(Debug, Clone, Copy, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Connection {
    /// First endpoint.
    pub a: usize,
    /// Second endpoint.
    pub b: usize,
}

impl Connection {
    /// Creates a connection between `a` and `b`.
    #[must_use]
    pub const fn new(a: usize, b: usize) -> Self {
        Self { a, b }
    }

    /// The endpoints ordered `(min, max)`, usable as a map key.
    #[must_use]
    pub const fn key(&self) -> (usize, usize) {
        if self.a <= self.b {
            (self.a, self.b)
        } else {
            (self.b, self.a)
        }
    }

    /// Whether `node` is one of the endpoints.
    #[must_use]
    pub const fn contains(&self, node: usize) -> bool {
        self.a == node || self.b == node
    }

    /// The endpoint that is not `node`.
    ///
    /// If `node` is not an endpoint, `a` is returned.
    #[must_use]
    pub const fn opposite(&self, node: usize) -> usize {
        if self.a == node { self.b } else { self.a }
    }

    /// Euclidean length using the given position buffer.
    #[must_use]
    pub fn length(&self, positions: &[f64]) -> f64 {
        (node_position(positions, self.b) - node_position(positions, self.a)).norm()
    }

    /// Endpoints as an array, in stored order.
    #[must_use]
    pub const fn indices(&self) -> [usize; 2] {
        [self.a, self.b]
    }
}

impl PartialEq for Connection {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Hash for Connection {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl From<[usize; 2]> for Connection {
    fn from([a, b]: [usize; 2]) -> Self {
        Self::new(a, b)
    }
}

/// An oriented triangle.
///
/// The winding `a -> b -> c` is counter-clockwise when viewed from outside,
/// so the normal follows the right-hand rule. Equality treats cyclic rotations
/// as the same triangle but distinguishes the reversed winding.
#[derive(Debug, Clone, Copy, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Triangle {
    /// First corner.
    pub a: usize,
    /// Second corner.
    pub b: usize,
    /// Third corner.
    pub c: usize,
}

impl Triangle {
    /// Creates a triangle with winding `a -> b -> c`.
    #[must_use]
    pub const fn new(a: usize, b: usize, c: usize) -> Self {
        Self { a, b, c }
    }

    /// Corners in winding order.
    #[must_use]
    pub const fn indices(&self) -> [usize; 3] {
        [self.a, self.b, self.c]
    }

    /// Rotation of the corners that starts at the smallest index.
    #[must_use]
    pub const fn canonical(&self) -> [usize; 3] {
        if self.a <= self.b && self.a <= self.c {
            [self.a, self.b, self.c]
        } else if self.b <= self.a && self.b <= self.c {
            [self.b, self.c, self.a]
        } else {
            [self.c, self.a, self.b]
        }
    }

    /// Whether `node` is a corner.
    #[must_use]
    pub const fn contains(&self, node: usize) -> bool {
        self.a == node || self.b == node || self.c == node
    }

    /// The three edges `ab`, `bc`, `ca`.
    #[must_use]
    pub const fn edges(&self) -> [Connection; 3] {
        [
            Connection::new(self.a, self.b),
            Connection::new(self.b, self.c),
            Connection::new(self.c, self.a),
        ]
    }

    /// Whether `connection` is one of the three edges.
    #[must_use]
    pub const fn has_edge(&self, connection: &Connection) -> bool {
        self.contains(connection.a) && self.contains(connection.b) && connection.a != connection.b
    }

    /// The corner that is not on `connection`, if the connection is an edge.
    #[must_use]
    pub const fn opposite(&self, connection: &Connection) -> Option<usize> {
        if !self.has_edge(connection) {
            return None;
        }
        if !connection.contains(self.a) {
            Some(self.a)
        } else if !connection.contains(self.b) {
            Some(self.b)
        } else {
            Some(self.c)
        }
    }

    /// Whether `second` directly follows `first` in the cyclic winding.
    #[must_use]
    pub const fn follows(&self, first: usize, second: usize) -> bool {
        (self.a == first && self.b == second)
            || (self.b == first && self.c == second)
            || (self.c == first && self.a == second)
    }

    /// Replaces corner `from` with `to`, keeping the winding.
    #[must_use]
    pub const fn remapped(&self, from: usize, to: usize) -> Self {
        Self {
            a: if self.a == from { to } else { self.a },
            b: if self.b == from { to } else { self.b },
            c: if self.c == from { to } else { self.c },
        }
    }

    /// Area, unit normal and centroid for the given position buffer.
    #[must_use]
    pub fn geometry(&self, positions: &[f64]) -> TriangleGeometry {
        TriangleGeometry::from_points(
            &node_position(positions, self.a),
            &node_position(positions, self.b),
            &node_position(positions, self.c),
        )
    }
}

impl PartialEq for Triangle {
    fn eq(&self, other: &Self) -> bool {
        self.canonical() == other.canonical()
    }
}

impl Hash for Triangle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical().hash(state);
    }
}

impl From<[usize; 3]> for Triangle {
    fn from([a, b, c]: [usize; 3]) -> Self {
        Self::new(a, b, c)
    }
}

/// Derived geometry of a triangle.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TriangleGeometry {
    /// Triangle area.
    pub area: f64,
    /// Unit normal by the right-hand rule, zero for degenerate triangles.
    pub normal: Vector3<f64>,
    /// Centroid.
    pub center: Point3<f64>,
}

impl TriangleGeometry {
    /// Computes the geometry of triangle `(p0, p1, p2)`.
    ///
    /// # Example
    ///
    /// ```
    /// use contour_types::{Point3, TriangleGeometry};
    ///
    /// let g = TriangleGeometry::from_points(
    ///     &Point3::new(0.0, 0.0, 0.0),
    ///     &Point3::new(1.0, 0.0, 0.0),
    ///     &Point3::new(0.0, 1.0, 0.0),
    /// );
    /// assert!((g.area - 0.5).abs() < 1e-12);
    /// assert!((g.normal.z - 1.0).abs() < 1e-12);
    /// ```
    #[must_use]
    pub fn from_points(p0: &Point3<f64>, p1: &Point3<f64>, p2: &Point3<f64>) -> Self {
        let cross = (p1 - p0).cross(&(p2 - p0));
        let norm = cross.norm();
        let normal = if norm > 0.0 { cross / norm } else { Vector3::zeros() };
        let center = Point3::from((p0.coords + p1.coords + p2.coords) / 3.0);
        Self {
            area: 0.5 * norm,
            normal,
            center,
        }
    }
}
