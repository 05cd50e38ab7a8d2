//! Pairwise triangle curvature.

use contour_types::{MeshTopology, SurfaceMesh, TriangleGeometry};
use rayon::prelude::*;
use tracing::debug;

/// Cross products of normals below this are treated as flat.
const FLAT_THRESHOLD: f64 = 1e-16;

/// Signed curvature at every node from pairs of neighbouring triangles.
///
/// For each pair of triangles around a node that also share an edge through
/// it, the magnitude is `|nA × nB|` and the sign is that of
/// `(cA - cB) · (nA - nB)`, positive where the surface bends away from its
/// normals as on a convex shape. A node's value is the average over its pairs,
/// weighted by the mean area of each pair. Nodes without such pairs get zero.
///
/// # Example
///
/// ```
/// use contour_curvature::node_curvatures;
/// use contour_types::block;
///
/// let curvature = node_curvatures(&block(1.0, 1.0, 1.0));
/// assert!(curvature.iter().all(|&k| k > 0.0));
/// ```
#[must_use]
pub fn node_curvatures(mesh: &SurfaceMesh) -> Vec<f64> {
    let geometries = mesh.triangle_geometries();
    let topology = MeshTopology::new(mesh);
    let curvatures = node_curvatures_with(mesh, &topology, &geometries);
    debug!(nodes = curvatures.len(), "computed pairwise curvature");
    curvatures
}

/// [`node_curvatures`] from precomputed topology and triangle geometry.
#[must_use]
pub fn node_curvatures_with(
    mesh: &SurfaceMesh,
    topology: &MeshTopology,
    geometries: &[TriangleGeometry],
) -> Vec<f64> {
    let triangles = mesh.triangles();
    (0..mesh.node_count())
        .into_par_iter()
        .map(|node| {
            let around = topology.node_triangles(node);
            let mut total = 0.0;
            let mut weight = 0.0;
            for (i, &ta) in around.iter().enumerate() {
                for &tb in &around[i + 1..] {
                    let shares_edge = triangles[ta]
                        .indices()
                        .iter()
                        .filter(|&&v| v != node && triangles[tb].contains(v))
                        .count()
                        == 1;
                    if !shares_edge {
                        continue;
                    }
                    let (a, b) = (&geometries[ta], &geometries[tb]);
                    let mut magnitude = a.normal.cross(&b.normal).norm();
                    if magnitude < FLAT_THRESHOLD {
                        magnitude = 0.0;
                    }
                    let dt = a.center - b.center;
                    let dn = a.normal - b.normal;
                    let value = magnitude.copysign(dt.dot(&dn));
                    let w = 0.5 * (a.area + b.area);
                    total += w * value;
                    weight += w;
                }
            }
            if weight > 0.0 { total / weight } else { 0.0 }
        })
        .collect()
}
