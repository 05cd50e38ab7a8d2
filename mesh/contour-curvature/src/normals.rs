//! Per-node surface normals.

use contour_types::{MeshTopology, SurfaceMesh, TriangleGeometry};
use nalgebra::Vector3;

/// Averaged surface normal at every node.
///
/// The unit normals of the triangles around a node are summed with equal
/// weight and the sum is normalized. Nodes without triangles, or whose
/// triangle normals cancel, get a zero vector.
///
/// # Example
///
/// ```
/// use contour_curvature::node_normals;
/// use contour_types::block;
///
/// let mesh = block(1.0, 1.0, 1.0);
/// let normals = node_normals(&mesh);
/// // Corner normals point away from the center.
/// let corner = mesh.position(2).coords;
/// assert!(normals[2].dot(&corner) > 0.0);
/// ```
#[must_use]
pub fn node_normals(mesh: &SurfaceMesh) -> Vec<Vector3<f64>> {
    let geometries = mesh.triangle_geometries();
    let topology = MeshTopology::new(mesh);
    node_normals_with(&topology, &geometries)
}

/// [`node_normals`] from precomputed topology and triangle geometry.
#[must_use]
pub fn node_normals_with(
    topology: &MeshTopology,
    geometries: &[TriangleGeometry],
) -> Vec<Vector3<f64>> {
    (0..topology.node_count())
        .map(|node| {
            let sum: Vector3<f64> = topology
                .node_triangles(node)
                .iter()
                .map(|&ti| geometries[ti].normal)
                .sum();
            sum.try_normalize(f64::EPSILON).unwrap_or_else(Vector3::zeros)
        })
        .collect()
}
