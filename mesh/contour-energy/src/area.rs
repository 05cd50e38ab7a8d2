//! Triangle edge-length equalization.

use contour_types::{SurfaceMesh, node_position};

use crate::energy::{ExternalEnergy, add_at};

/// Side of an equilateral triangle with unit area.
fn equilateral_side_factor() -> f64 {
    (4.0 / 3.0_f64.sqrt()).sqrt()
}

/// Springs every triangle edge towards the side of an equilateral triangle
/// with the mesh's mean triangle area.
///
/// With `a0 = sqrt(4/√3) * sqrt(mean area)`, each triangle edge `(p, q)` of
/// length `r` and direction `s = (q - p) / r` applies `F = (a0 - r) * weight`
/// as `-F s` on `p` and `+F s` on `q`. Edges shared by two triangles are
/// counted once per triangle.
///
/// # Example
///
/// ```
/// use contour_energy::{ExternalEnergy, TriangleAreaDistributor};
/// use contour_types::block;
///
/// let mesh = block(1.0, 1.0, 1.0);
/// let (mut fx, mut fy, mut fz) = (vec![0.0; 8], vec![0.0; 8], vec![0.0; 8]);
/// TriangleAreaDistributor::new(1.0).update_forces(&mesh, &mut fx, &mut fy, &mut fz);
///
/// // Internal forces cancel.
/// assert!(fx.iter().sum::<f64>().abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriangleAreaDistributor {
    weight: f64,
}

impl TriangleAreaDistributor {
    /// Creates the energy with spring constant `weight`.
    #[must_use]
    pub const fn new(weight: f64) -> Self {
        Self { weight }
    }

    /// Target edge length for a mesh with this mean triangle area.
    #[must_use]
    pub fn target_length(mean_area: f64) -> f64 {
        equilateral_side_factor() * mean_area.max(0.0).sqrt()
    }
}

impl ExternalEnergy for TriangleAreaDistributor {
    fn name(&self) -> &'static str {
        "triangle-area"
    }

    fn update_forces(&self, mesh: &SurfaceMesh, fx: &mut [f64], fy: &mut [f64], fz: &mut [f64]) {
        if mesh.triangle_count() == 0 {
            return;
        }
        #[allow(clippy::cast_precision_loss)]
        let mean_area = mesh.surface_area() / mesh.triangle_count() as f64;
        let a0 = Self::target_length(mean_area);
        let positions = mesh.positions();

        for tri in mesh.triangles() {
            for edge in tri.edges() {
                let p = node_position(positions, edge.a);
                let q = node_position(positions, edge.b);
                let d = q - p;
                let r = d.norm();
                if r <= 0.0 {
                    continue;
                }
                let f = d * ((a0 - r) * self.weight / r);
                add_at(edge.a, &(-f), fx, fy, fz);
                add_at(edge.b, &f, fx, fy, fz);
            }
        }
    }
}
