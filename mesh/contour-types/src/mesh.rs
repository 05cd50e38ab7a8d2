//! The surface mesh container.

use hashbrown::{HashMap, HashSet};
use nalgebra::{Point3, UnitQuaternion, Vector3};
use tracing::debug;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::bounds::Bounds;
use crate::error::{MeshError, MeshResult};
use crate::primitives::{Connection, Triangle, TriangleGeometry, node_position};

/// A triangulated surface stored as a flat position buffer plus index lists.
///
/// Node `i` lives at `positions[3 * i..3 * i + 3]`. The buffer, connection
/// list and triangle list are the persistence format: they can be read back
/// with [`positions`](Self::positions), [`connection_array`](Self::connection_array)
/// and [`triangle_array`](Self::triangle_array), and fed to
/// [`from_arrays`](Self::from_arrays) to rebuild an identical mesh.
///
/// # Example
///
/// ```
/// use contour_types::SurfaceMesh;
///
/// let positions = vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
/// let mesh = SurfaceMesh::from_arrays(positions, &[[0, 1], [1, 2], [2, 0]], &[[0, 1, 2]])?;
/// assert_eq!(mesh.node_count(), 3);
/// assert!((mesh.surface_area() - 0.5).abs() < 1e-12);
/// # Ok::<(), contour_types::MeshError>(())
/// ```
///
/// With the `serde` feature, deserialization goes through [`new`](Self::new)
/// and rejects the same inputs.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "MeshParts"))]
pub struct SurfaceMesh {
    positions: Vec<f64>,
    connections: Vec<Connection>,
    triangles: Vec<Triangle>,
}

/// Unchecked serialized form of [`SurfaceMesh`].
#[cfg(feature = "serde")]
#[derive(Deserialize)]
struct MeshParts {
    positions: Vec<f64>,
    connections: Vec<Connection>,
    triangles: Vec<Triangle>,
}

#[cfg(feature = "serde")]
impl TryFrom<MeshParts> for SurfaceMesh {
    type Error = MeshError;

    fn try_from(parts: MeshParts) -> MeshResult<Self> {
        Self::new(parts.positions, parts.connections, parts.triangles)
    }
}

impl SurfaceMesh {
    /// Creates a mesh from a position buffer and element lists.
    ///
    /// # Errors
    ///
    /// Fails if the buffer length is not a multiple of three, if any element
    /// references a missing node or repeats a node, or if a connection or
    /// triangle is listed twice.
    pub fn new(
        positions: Vec<f64>,
        connections: Vec<Connection>,
        triangles: Vec<Triangle>,
    ) -> MeshResult<Self> {
        if positions.len() % 3 != 0 {
            return Err(MeshError::InvalidPositionLength(positions.len()));
        }
        let node_count = positions.len() / 3;

        let mut seen = HashSet::with_capacity(connections.len());
        for (index, con) in connections.iter().enumerate() {
            for node in con.indices() {
                if node >= node_count {
                    return Err(MeshError::IndexOutOfRange {
                        element: "connection",
                        index,
                        node,
                        node_count,
                    });
                }
            }
            if con.a == con.b {
                return Err(MeshError::DegenerateConnection { index, node: con.a });
            }
            if !seen.insert(*con) {
                return Err(MeshError::DuplicateConnection(con.a, con.b));
            }
        }

        let mut seen = HashSet::with_capacity(triangles.len());
        for (index, tri) in triangles.iter().enumerate() {
            for node in tri.indices() {
                if node >= node_count {
                    return Err(MeshError::IndexOutOfRange {
                        element: "triangle",
                        index,
                        node,
                        node_count,
                    });
                }
            }
            if tri.a == tri.b || tri.b == tri.c || tri.c == tri.a {
                return Err(MeshError::DegenerateTriangle {
                    index,
                    nodes: tri.indices(),
                });
            }
            if !seen.insert(*tri) {
                return Err(MeshError::DuplicateTriangle(tri.indices()));
            }
        }

        Ok(Self {
            positions,
            connections,
            triangles,
        })
    }

    /// Creates a mesh from the flat persistence arrays.
    ///
    /// # Errors
    ///
    /// Same conditions as [`new`](Self::new).
    pub fn from_arrays(
        positions: Vec<f64>,
        connections: &[[usize; 2]],
        triangles: &[[usize; 3]],
    ) -> MeshResult<Self> {
        Self::new(
            positions,
            connections.iter().copied().map(Connection::from).collect(),
            triangles.iter().copied().map(Triangle::from).collect(),
        )
    }

    /// Creates a mesh from points and element lists.
    ///
    /// # Errors
    ///
    /// Same conditions as [`new`](Self::new).
    pub fn from_points(
        points: &[Point3<f64>],
        connections: Vec<Connection>,
        triangles: Vec<Triangle>,
    ) -> MeshResult<Self> {
        let positions = points.iter().flat_map(|p| [p.x, p.y, p.z]).collect();
        Self::new(positions, connections, triangles)
    }

    /// Builds a mesh whose elements are known to be valid.
    pub(crate) const fn from_parts_unchecked(
        positions: Vec<f64>,
        connections: Vec<Connection>,
        triangles: Vec<Triangle>,
    ) -> Self {
        Self {
            positions,
            connections,
            triangles,
        }
    }

    /// Number of nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.positions.len() / 3
    }

    /// Number of connections.
    #[must_use]
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Number of triangles.
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Whether the mesh has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// The flat `x, y, z` position buffer.
    #[must_use]
    pub fn positions(&self) -> &[f64] {
        &self.positions
    }

    /// Mutable access to node coordinates. The node count cannot change.
    pub fn positions_mut(&mut self) -> &mut [f64] {
        &mut self.positions
    }

    /// Replaces every coordinate at once.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::InvalidPositionLength`] if `positions` does not
    /// hold exactly one triple per existing node.
    pub fn set_positions(&mut self, positions: Vec<f64>) -> MeshResult<()> {
        if positions.len() != self.positions.len() {
            return Err(MeshError::InvalidPositionLength(positions.len()));
        }
        self.positions = positions;
        Ok(())
    }

    /// Position of node `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= node_count()`.
    #[must_use]
    pub fn position(&self, index: usize) -> Point3<f64> {
        node_position(&self.positions, index)
    }

    /// Moves node `index` to `p`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= node_count()`.
    pub fn set_position(&mut self, index: usize, p: &Point3<f64>) {
        let i = 3 * index;
        self.positions[i] = p.x;
        self.positions[i + 1] = p.y;
        self.positions[i + 2] = p.z;
    }

    /// All node positions as points.
    #[must_use]
    pub fn points(&self) -> Vec<Point3<f64>> {
        self.positions
            .chunks_exact(3)
            .map(|c| Point3::new(c[0], c[1], c[2]))
            .collect()
    }

    /// The connection list.
    #[must_use]
    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    /// The triangle list.
    #[must_use]
    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    /// Connection index pairs in list order.
    #[must_use]
    pub fn connection_array(&self) -> Vec<[usize; 2]> {
        self.connections.iter().map(Connection::indices).collect()
    }

    /// Triangle index triples in list order.
    #[must_use]
    pub fn triangle_array(&self) -> Vec<[usize; 3]> {
        self.triangles.iter().map(Triangle::indices).collect()
    }

    /// Consumes the mesh and returns its position buffer and element lists.
    #[must_use]
    pub fn into_parts(self) -> (Vec<f64>, Vec<Connection>, Vec<Triangle>) {
        (self.positions, self.connections, self.triangles)
    }

    /// Geometry of every triangle, in list order.
    #[must_use]
    pub fn triangle_geometries(&self) -> Vec<TriangleGeometry> {
        self.triangles
            .iter()
            .map(|t| t.geometry(&self.positions))
            .collect()
    }

    /// Total area of all triangles.
    #[must_use]
    pub fn surface_area(&self) -> f64 {
        self.triangles
            .iter()
            .map(|t| t.geometry(&self.positions).area)
            .sum()
    }

    /// Enclosed volume measured along `direction`.
    ///
    /// Applies the divergence theorem to the field `(x · d) d`, summing
    /// `area * (n · d) * (c · d)` over triangles with unit normal `n` and
    /// centroid `c`. For a closed, consistently wound mesh the result does not
    /// depend on the unit direction `d`.
    #[must_use]
    pub fn volume_along(&self, direction: &Vector3<f64>) -> f64 {
        let norm = direction.norm();
        if norm == 0.0 {
            return 0.0;
        }
        let d = direction / norm;
        self.triangles
            .iter()
            .map(|t| {
                let g = t.geometry(&self.positions);
                g.area * g.normal.dot(&d) * g.center.coords.dot(&d)
            })
            .sum()
    }

    /// Signed volume from the tetrahedra formed with the origin.
    ///
    /// Positive when the triangles wind counter-clockwise seen from outside.
    #[must_use]
    pub fn signed_volume(&self) -> f64 {
        let mut volume = 0.0;
        for t in &self.triangles {
            let v0 = self.position(t.a).coords;
            let v1 = self.position(t.b).coords;
            let v2 = self.position(t.c).coords;
            volume += v0.dot(&v1.cross(&v2));
        }
        volume / 6.0
    }

    /// Bounding box of all nodes, or `None` for an empty mesh.
    #[must_use]
    pub fn bounds(&self) -> Option<Bounds> {
        Bounds::from_points(&self.points())
    }

    /// Mean node position, or the origin for an empty mesh.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn centroid(&self) -> Point3<f64> {
        let n = self.node_count();
        if n == 0 {
            return Point3::origin();
        }
        let sum = self
            .positions
            .chunks_exact(3)
            .fold(Vector3::zeros(), |acc, c| acc + Vector3::new(c[0], c[1], c[2]));
        Point3::from(sum / n as f64)
    }

    /// Moves every node by `offset`.
    pub fn translate(&mut self, offset: &Vector3<f64>) {
        for c in self.positions.chunks_exact_mut(3) {
            c[0] += offset.x;
            c[1] += offset.y;
            c[2] += offset.z;
        }
    }

    /// Scales every node about `center`.
    pub fn scale_about(&mut self, center: &Point3<f64>, factor: f64) {
        for c in self.positions.chunks_exact_mut(3) {
            c[0] = center.x + (c[0] - center.x) * factor;
            c[1] = center.y + (c[1] - center.y) * factor;
            c[2] = center.z + (c[2] - center.z) * factor;
        }
    }

    /// Rotates every node about `center`.
    pub fn rotate_about(&mut self, center: &Point3<f64>, rotation: &UnitQuaternion<f64>) {
        for c in self.positions.chunks_exact_mut(3) {
            let p = Point3::new(c[0], c[1], c[2]);
            let r = center + rotation * (p - center);
            c[0] = r.x;
            c[1] = r.y;
            c[2] = r.z;
        }
    }

    /// Connections bordering exactly one triangle.
    #[must_use]
    pub fn outer_edges(&self) -> Vec<Connection> {
        let counts = self.edge_triangle_counts();
        self.connections
            .iter()
            .filter(|c| counts.get(&c.key()).copied() == Some(1))
            .copied()
            .collect()
    }

    /// Whether every connection borders exactly two triangles.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        let counts = self.edge_triangle_counts();
        !self.triangles.is_empty()
            && self
                .connections
                .iter()
                .all(|c| counts.get(&c.key()).copied() == Some(2))
    }

    /// Checks the manifold invariants.
    ///
    /// Every triangle edge must be in the connection list and every connection
    /// may border at most two triangles.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::MissingEdge`] or [`MeshError::NonManifoldEdge`] for
    /// the first violation found.
    pub fn validate(&self) -> MeshResult<()> {
        let known: HashSet<(usize, usize)> = self.connections.iter().map(Connection::key).collect();
        for tri in &self.triangles {
            for edge in tri.edges() {
                if !known.contains(&edge.key()) {
                    return Err(MeshError::MissingEdge {
                        triangle: tri.indices(),
                        a: edge.a,
                        b: edge.b,
                    });
                }
            }
        }
        for ((a, b), count) in self.edge_triangle_counts() {
            if count > 2 {
                return Err(MeshError::NonManifoldEdge { a, b, count });
            }
        }
        debug!(
            nodes = self.node_count(),
            connections = self.connection_count(),
            triangles = self.triangle_count(),
            "mesh validated"
        );
        Ok(())
    }

    fn edge_triangle_counts(&self) -> HashMap<(usize, usize), usize> {
        let mut counts = HashMap::with_capacity(self.connections.len());
        for tri in &self.triangles {
            for edge in tri.edges() {
                *counts.entry(edge.key()).or_insert(0) += 1;
            }
        }
        counts
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::block;
    use approx::assert_relative_eq;

    fn single_triangle() -> SurfaceMesh {
        SurfaceMesh::from_arrays(
            vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
            &[[0, 1], [1, 2], [2, 0]],
            &[[0, 1, 2]],
        )
        .unwrap()
    }

    #[test]
    fn rejects_out_of_range_triangle() {
        let err = SurfaceMesh::from_arrays(vec![0.0; 6], &[[0, 1]], &[[0, 1, 2]]).unwrap_err();
        assert!(matches!(
            err,
            MeshError::IndexOutOfRange {
                element: "triangle",
                node: 2,
                ..
            }
        ));
    }

    #[test]
    fn rejects_out_of_range_connection() {
        let err = SurfaceMesh::from_arrays(vec![0.0; 6], &[[0, 5]], &[]).unwrap_err();
        assert!(matches!(err, MeshError::IndexOutOfRange { node: 5, .. }));
    }

    #[test]
    fn rejects_bad_buffer_length() {
        let err = SurfaceMesh::from_arrays(vec![0.0; 7], &[], &[]).unwrap_err();
        assert!(matches!(err, MeshError::InvalidPositionLength(7)));
    }

    #[test]
    fn rejects_duplicates() {
        let err = SurfaceMesh::from_arrays(vec![0.0; 9], &[[0, 1], [1, 0]], &[]).unwrap_err();
        assert!(matches!(err, MeshError::DuplicateConnection(1, 0)));

        let err = SurfaceMesh::from_arrays(
            vec![0.0; 9],
            &[[0, 1], [1, 2], [2, 0]],
            &[[0, 1, 2], [1, 2, 0]],
        )
        .unwrap_err();
        assert!(matches!(err, MeshError::DuplicateTriangle(_)));
    }

    #[test]
    fn flat_arrays_round_trip() {
        let mesh = block(1.0, 2.0, 3.0);
        let rebuilt = SurfaceMesh::from_arrays(
            mesh.positions().to_vec(),
            &mesh.connection_array(),
            &mesh.triangle_array(),
        )
        .unwrap();
        assert_eq!(rebuilt.positions(), mesh.positions());
        assert_eq!(rebuilt.connection_array(), mesh.connection_array());
        assert_eq!(rebuilt.triangle_array(), mesh.triangle_array());
    }

    #[test]
    fn block_volume_agrees_in_all_directions() {
        let mesh = block(1.0, 2.0, 3.0);
        assert_relative_eq!(mesh.signed_volume(), 6.0, epsilon = 1e-12);
        for d in [Vector3::x(), Vector3::y(), Vector3::z(), Vector3::new(1.0, 1.0, 1.0)] {
            assert_relative_eq!(mesh.volume_along(&d), 6.0, epsilon = 1e-12);
        }
        assert_relative_eq!(mesh.surface_area(), 22.0, epsilon = 1e-12);
    }

    #[test]
    fn rotation_preserves_volume() {
        let mut mesh = block(1.0, 2.0, 0.5);
        mesh.translate(&Vector3::new(3.0, -1.0, 2.0));
        let before = mesh.signed_volume();
        let rotation = UnitQuaternion::from_euler_angles(0.3, -0.7, 1.1);
        let center = mesh.centroid();
        mesh.rotate_about(&center, &rotation);
        assert_relative_eq!(mesh.signed_volume(), before, epsilon = 1e-10);
        assert_relative_eq!(mesh.volume_along(&Vector3::x()), before, epsilon = 1e-10);
    }

    #[test]
    fn scale_about_centroid() {
        let mut mesh = block(1.0, 1.0, 1.0);
        let center = mesh.centroid();
        mesh.scale_about(&center, 2.0);
        assert_relative_eq!(mesh.signed_volume(), 8.0, epsilon = 1e-12);
        let b = mesh.bounds().unwrap();
        assert_relative_eq!(b.size(), Vector3::new(2.0, 2.0, 2.0));
    }

    #[test]
    fn open_triangle_edges() {
        let mesh = single_triangle();
        assert_eq!(mesh.outer_edges().len(), 3);
        assert!(!mesh.is_closed());
        assert!(block(1.0, 1.0, 1.0).is_closed());
        assert!(mesh.validate().is_ok());
    }

    #[test]
    fn non_manifold_edge_is_reported() {
        let positions = vec![
            0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, -1.0, 0.0, 0.0, 0.0, 1.0,
        ];
        let mesh = SurfaceMesh::from_arrays(
            positions,
            &[[0, 1], [1, 2], [2, 0], [1, 3], [3, 0], [1, 4], [4, 0]],
            &[[0, 1, 2], [1, 0, 3], [0, 1, 4]],
        )
        .unwrap();
        assert!(matches!(
            mesh.validate(),
            Err(MeshError::NonManifoldEdge { count: 3, .. })
        ));
    }

    #[test]
    fn set_position_updates_buffer() {
        let mut mesh = single_triangle();
        mesh.set_position(1, &Point3::new(2.0, 0.0, 0.0));
        assert_eq!(mesh.positions()[3], 2.0);
        assert!(mesh.set_positions(vec![0.0; 6]).is_err());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn mesh_serialization() {
        let mesh = block(1.0, 2.0, 3.0);
        let json = serde_json::to_string(&mesh).unwrap();
        let parsed: SurfaceMesh = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, mesh);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn deserialization_checks_indices() {
        let json = r#"{
            "positions": [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
            "connections": [{"a": 0, "b": 1}, {"a": 1, "b": 5}],
            "triangles": []
        }"#;
        let err = serde_json::from_str::<SurfaceMesh>(json).unwrap_err();
        assert!(err.to_string().contains("references node 5"));

        let json = r#"{"positions": [0.0, 1.0], "connections": [], "triangles": []}"#;
        assert!(serde_json::from_str::<SurfaceMesh>(json).is_err());
    }
}
