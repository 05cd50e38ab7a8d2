//! Procedural box mesh.

use crate::mesh::SurfaceMesh;
use crate::primitives::{Connection, Triangle};

const BLOCK_CONNECTIONS: [[usize; 2]; 18] = [
    [0, 4],
    [0, 1],
    [1, 5],
    [5, 4],
    [3, 7],
    [2, 3],
    [2, 6],
    [6, 7],
    [3, 0],
    [1, 2],
    [5, 6],
    [7, 4],
    [0, 2],
    [0, 5],
    [5, 2],
    [3, 6],
    [3, 4],
    [4, 6],
];

const BLOCK_TRIANGLES: [[usize; 3]; 12] = [
    // +z
    [0, 2, 1],
    [0, 3, 2],
    // -x
    [0, 1, 5],
    [0, 5, 4],
    // +y
    [1, 2, 5],
    [5, 2, 6],
    // +x
    [2, 3, 6],
    [6, 3, 7],
    // -y
    [3, 0, 4],
    [3, 4, 7],
    // -z
    [4, 5, 6],
    [4, 6, 7],
];

/// An axis-aligned box centered on the origin.
///
/// The box has 8 nodes, 18 connections (one diagonal per face) and 12
/// outward-wound triangles.
///
/// # Example
///
/// ```
/// use contour_types::block;
///
/// let mesh = block(2.0, 1.0, 1.0);
/// assert_eq!(mesh.triangle_count(), 12);
/// assert!((mesh.signed_volume() - 2.0).abs() < 1e-12);
/// ```
#[must_use]
pub fn block(width: f64, height: f64, depth: f64) -> SurfaceMesh {
    let (w, h, d) = (0.5 * width, 0.5 * height, 0.5 * depth);
    let positions = vec![
        -w, -h, d, //
        -w, h, d, //
        w, h, d, //
        w, -h, d, //
        -w, -h, -d, //
        -w, h, -d, //
        w, h, -d, //
        w, -h, -d,
    ];
    SurfaceMesh::from_parts_unchecked(
        positions,
        BLOCK_CONNECTIONS.iter().copied().map(Connection::from).collect(),
        BLOCK_TRIANGLES.iter().copied().map(Triangle::from).collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_is_valid_closed_mesh() {
        let mesh = block(1.0, 1.0, 1.0);
        assert_eq!(mesh.node_count(), 8);
        assert_eq!(mesh.connection_count(), 18);
        assert!(mesh.validate().is_ok());
        assert!(mesh.is_closed());
    }

    #[test]
    fn block_normals_point_outward() {
        let mesh = block(1.0, 1.0, 1.0);
        for g in mesh.triangle_geometries() {
            assert!(g.normal.dot(&g.center.coords) > 0.0);
        }
    }
}
