//! Midpoint subdivision.

use contour_types::{Connection, MeshError, MeshTopology, SurfaceMesh, Triangle};
use tracing::debug;

use crate::error::RaycastResult;

/// Splits every triangle into four by inserting one node per connection.
///
/// Node `node_count + i` is the midpoint of connection `i`. Each connection
/// becomes two halves, and triangle `(A, B, C)` with edge midpoints `ab`,
/// `bc`, `ca` becomes `(A, ab, ca)`, `(ab, B, bc)`, `(ca, bc, C)` and
/// `(ab, bc, ca)`, all with the parent's winding.
///
/// # Errors
///
/// Returns [`MeshError::MissingEdge`] (wrapped) if a triangle edge is not in
/// the connection list.
///
/// # Example
///
/// ```
/// use contour_raycast::subdivide;
/// use contour_types::block;
///
/// let mesh = block(1.0, 1.0, 1.0);
/// let fine = subdivide(&mesh)?;
/// assert_eq!(fine.triangle_count(), 4 * mesh.triangle_count());
/// assert_eq!(fine.node_count(), mesh.node_count() + mesh.connection_count());
/// # Ok::<(), contour_raycast::RaycastError>(())
/// ```
pub fn subdivide(mesh: &SurfaceMesh) -> RaycastResult<SurfaceMesh> {
    let topology = MeshTopology::new(mesh);
    let base = mesh.node_count();
    let connection_count = mesh.connection_count();
    let triangle_count = mesh.triangle_count();

    let mut positions = Vec::with_capacity(3 * (base + connection_count));
    positions.extend_from_slice(mesh.positions());
    let mut connections = Vec::with_capacity(2 * connection_count + 3 * triangle_count);
    for (ci, con) in mesh.connections().iter().enumerate() {
        let mid = nalgebra::center(&mesh.position(con.a), &mesh.position(con.b));
        positions.extend_from_slice(&[mid.x, mid.y, mid.z]);
        connections.push(Connection::new(con.a, base + ci));
        connections.push(Connection::new(base + ci, con.b));
    }

    let midpoint = |tri: &Triangle, a: usize, b: usize| {
        topology
            .connection_index(a, b)
            .map(|ci| base + ci)
            .ok_or(MeshError::MissingEdge {
                triangle: tri.indices(),
                a,
                b,
            })
    };

    let mut triangles = Vec::with_capacity(4 * triangle_count);
    for tri in mesh.triangles() {
        let ab = midpoint(tri, tri.a, tri.b)?;
        let bc = midpoint(tri, tri.b, tri.c)?;
        let ca = midpoint(tri, tri.c, tri.a)?;

        triangles.push(Triangle::new(tri.a, ab, ca));
        triangles.push(Triangle::new(ab, tri.b, bc));
        triangles.push(Triangle::new(ca, bc, tri.c));
        triangles.push(Triangle::new(ab, bc, ca));

        connections.push(Connection::new(ab, bc));
        connections.push(Connection::new(bc, ca));
        connections.push(Connection::new(ca, ab));
    }

    debug!(
        nodes = base + connection_count,
        triangles = triangles.len(),
        "subdivided mesh"
    );
    Ok(SurfaceMesh::new(positions, connections, triangles)?)
}
