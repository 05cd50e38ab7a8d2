//! Cotangent-weighted mean curvature.
//!
//! Discrete mean curvature normal and mixed Voronoi area per node, after
//! Meyer, Desbrun, Schröder and Barr, "Discrete Differential-Geometry
//! Operators for Triangulated 2-Manifolds" (2003).

use contour_types::{MeshTopology, SurfaceMesh, Triangle, TriangleGeometry, node_position};
use nalgebra::Vector3;
use rayon::prelude::*;

/// Mean curvature at a single node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeanCurvature {
    /// Mean curvature normal `Σ ½(cot α + cot β)(xᵢ - xⱼ) / A`.
    ///
    /// Points outward on a convex surface with magnitude twice the mean
    /// curvature.
    pub vector: Vector3<f64>,
    /// Averaged unit normal of the surrounding triangles.
    pub normal: Vector3<f64>,
    /// Mixed Voronoi area of the node.
    pub mixed_area: f64,
}

impl MeanCurvature {
    /// Curvature normal projected onto the node normal.
    ///
    /// Close to `2 / r` on a sphere of radius `r`.
    #[must_use]
    pub fn value(&self) -> f64 {
        self.vector.dot(&self.normal)
    }
}

/// Mean curvature at every node of `mesh`.
///
/// # Example
///
/// ```
/// use contour_curvature::mean_curvatures;
/// use contour_types::block;
///
/// let samples = mean_curvatures(&block(1.0, 1.0, 1.0));
/// assert!(samples.iter().all(|s| s.value() > 0.0));
/// ```
#[must_use]
pub fn mean_curvatures(mesh: &SurfaceMesh) -> Vec<MeanCurvature> {
    let geometries = mesh.triangle_geometries();
    let topology = MeshTopology::new(mesh);
    mean_curvatures_with(mesh, &topology, &geometries)
}

/// [`mean_curvatures`] from precomputed topology and triangle geometry.
#[must_use]
pub fn mean_curvatures_with(
    mesh: &SurfaceMesh,
    topology: &MeshTopology,
    geometries: &[TriangleGeometry],
) -> Vec<MeanCurvature> {
    (0..mesh.node_count())
        .into_par_iter()
        .map(|node| node_mean_curvature(mesh, topology, geometries, node))
        .collect()
}

/// Mean curvature of one node.
///
/// Nodes without triangles, or whose mixed area vanishes, get a zero vector.
#[must_use]
pub fn node_mean_curvature(
    mesh: &SurfaceMesh,
    topology: &MeshTopology,
    geometries: &[TriangleGeometry],
    node: usize,
) -> MeanCurvature {
    let positions = mesh.positions();
    let mut kappa = Vector3::zeros();
    let mut normal = Vector3::zeros();
    let mut mixed_area = 0.0;

    for &ti in topology.node_triangles(node) {
        let [a, b, c] = rotated_to(&mesh.triangles()[ti], node);
        let pa = node_position(positions, a);
        let pb = node_position(positions, b);
        let pc = node_position(positions, c);
        let ab = pb - pa;
        let bc = pc - pb;
        let ca = pa - pc;

        let cot_b = cotangent(&(-ab), &bc);
        let cot_c = cotangent(&(-bc), &ca);
        kappa += 0.5 * cot_c * (-ab) + 0.5 * cot_b * ca;

        let geometry = &geometries[ti];
        normal += geometry.normal;
        mixed_area += mixed_area_at(&ab, &bc, &ca, cot_b, cot_c, geometry.area);
    }

    let vector = if mixed_area > 0.0 { kappa / mixed_area } else { Vector3::zeros() };
    MeanCurvature {
        vector,
        normal: normal.try_normalize(f64::EPSILON).unwrap_or_else(Vector3::zeros),
        mixed_area,
    }
}

/// Corners of `tri` in winding order starting at `node`.
fn rotated_to(tri: &Triangle, node: usize) -> [usize; 3] {
    if tri.b == node {
        [tri.b, tri.c, tri.a]
    } else if tri.c == node {
        [tri.c, tri.a, tri.b]
    } else {
        [tri.a, tri.b, tri.c]
    }
}

/// Cotangent of the angle between `u` and `v`; zero for parallel vectors.
fn cotangent(u: &Vector3<f64>, v: &Vector3<f64>) -> f64 {
    let sin = u.cross(v).norm();
    if sin > 0.0 { u.dot(v) / sin } else { 0.0 }
}

/// Share of a triangle's area assigned to its corner `a`.
fn mixed_area_at(
    ab: &Vector3<f64>,
    bc: &Vector3<f64>,
    ca: &Vector3<f64>,
    cot_b: f64,
    cot_c: f64,
    area: f64,
) -> f64 {
    let (ab2, bc2, ca2) = (ab.norm_squared(), bc.norm_squared(), ca.norm_squared());
    if bc2 > ab2 + ca2 {
        area / 2.0
    } else if ca2 > ab2 + bc2 || ab2 > bc2 + ca2 {
        area / 4.0
    } else {
        0.125 * (ab2 * cot_c + ca2 * cot_b)
    }
}
