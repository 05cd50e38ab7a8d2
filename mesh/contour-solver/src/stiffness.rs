//! Assembly of the stiffness matrix.
//!
//! The matrix couples every node to its neighbours:
//!
//! ```text
//! M = γ G + α L + β B
//! ```
//!
//! where `G` is the diagonal of per-node gamma factors, `L` the graph
//! Laplacian of the connection list and `B` a bending stencil built from
//! pairs of connections that do not share a triangle. `B` is not symmetric;
//! each row is assembled from the point of view of its own node only.

use contour_types::{MeshTopology, SurfaceMesh};
use nalgebra::DMatrix;

use crate::error::SolverResult;
use crate::params::Coefficients;

/// Builds the stiffness matrix of `mesh`.
///
/// `gamma_factors` scales the gamma term per node; missing entries count
/// as one.
///
/// # Errors
///
/// Returns [`SolverError::Topology`](crate::SolverError::Topology) when the
/// bending term is enabled and a triangle edge is missing from the
/// connection list.
///
/// # Example
///
/// ```
/// use contour_solver::{Coefficients, assemble_stiffness};
/// use contour_types::block;
///
/// let mesh = block(1.0, 1.0, 1.0);
/// let m = assemble_stiffness(&mesh, &Coefficients::new(1.0, 0.0, 0.0), &[])?;
/// // Graph Laplacian: rows sum to zero.
/// for row in m.row_iter() {
///     assert!(row.sum().abs() < 1e-12);
/// }
/// # Ok::<(), contour_solver::SolverError>(())
/// ```
pub fn assemble_stiffness(
    mesh: &SurfaceMesh,
    coefficients: &Coefficients,
    gamma_factors: &[f64],
) -> SolverResult<DMatrix<f64>> {
    let n = mesh.node_count();
    let mut m = DMatrix::zeros(n, n);

    if coefficients.beta > 0.0 {
        add_bending(&mut m, mesh, coefficients.beta)?;
    }

    let alpha = coefficients.alpha;
    for con in mesh.connections() {
        let (a, b) = (con.a, con.b);
        m[(a, a)] += alpha;
        m[(a, b)] -= alpha;
        m[(b, a)] -= alpha;
        m[(b, b)] += alpha;
    }

    for i in 0..n {
        m[(i, i)] += coefficients.gamma * gamma_factors.get(i).copied().unwrap_or(1.0);
    }

    Ok(m)
}

fn add_bending(m: &mut DMatrix<f64>, mesh: &SurfaceMesh, beta: f64) -> SolverResult<()> {
    let topology = MeshTopology::new(mesh);
    let adjacency = topology.connection_adjacency(mesh)?;
    let connections = mesh.connections();

    for node in 0..mesh.node_count() {
        let cons = topology.node_connections(node);
        for (i, &a) in cons.iter().enumerate() {
            let other = connections[a].opposite(node);
            let adjacent = &adjacency[a];

            // First order: pairs of connections at `node` not sharing a triangle.
            for &b in &cons[i + 1..] {
                if adjacent.contains(&b) {
                    continue;
                }
                let another = connections[b].opposite(node);
                m[(node, another)] -= beta;
                m[(node, other)] -= beta;
                m[(node, node)] += 2.0 * beta;
            }

            // Second order: continuing from `other` away from `node`.
            for &con in topology.node_connections(other) {
                if con == a || adjacent.contains(&con) {
                    continue;
                }
                let another = connections[con].opposite(other);
                m[(node, node)] += beta;
                m[(node, another)] += beta;
                m[(node, other)] -= 2.0 * beta;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::SolverError;
    use contour_types::block;

    fn chain() -> SurfaceMesh {
        SurfaceMesh::from_arrays(
            vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 2.0, 0.0, 0.0],
            &[[0, 1], [1, 2]],
            &[],
        )
        .unwrap()
    }

    #[test]
    fn alpha_term_is_graph_laplacian() {
        let mesh = block(1.0, 1.0, 1.0);
        let topology = MeshTopology::new(&mesh);
        let m = assemble_stiffness(&mesh, &Coefficients::new(2.0, 0.0, 0.0), &[]).unwrap();
        for i in 0..8 {
            #[allow(clippy::cast_precision_loss)]
            let degree = topology.degree(i) as f64;
            assert_eq!(m[(i, i)], 2.0 * degree);
        }
        assert_eq!(m[(0, 2)], -2.0);
        assert_eq!(m[(0, 6)], 0.0);
        assert_eq!(m, m.transpose());
    }

    #[test]
    fn gamma_factors_scale_the_diagonal() {
        let mesh = chain();
        let coefficients = Coefficients::new(0.0, 0.0, 10.0);
        let m = assemble_stiffness(&mesh, &coefficients, &[1.0, 0.5]).unwrap();
        assert_eq!(m[(0, 0)], 10.0);
        assert_eq!(m[(1, 1)], 5.0);
        assert_eq!(m[(2, 2)], 10.0);
    }

    #[test]
    fn bending_rows_are_assembled_per_node() {
        let m = assemble_stiffness(&chain(), &Coefficients::new(0.0, 1.0, 0.0), &[]).unwrap();
        let expected = DMatrix::from_row_slice(
            3,
            3,
            &[1.0, -2.0, 1.0, -1.0, 2.0, -1.0, 1.0, -2.0, 1.0],
        );
        assert_eq!(m, expected);
        assert_ne!(m, m.transpose());
    }

    #[test]
    fn bending_rows_sum_to_zero_on_closed_mesh() {
        let mesh = block(1.0, 2.0, 3.0);
        let m = assemble_stiffness(&mesh, &Coefficients::new(0.0, 0.7, 0.0), &[]).unwrap();
        for row in m.row_iter() {
            assert!(row.sum().abs() < 1e-12);
        }
    }

    #[test]
    fn bending_needs_triangle_edges() {
        let mesh = SurfaceMesh::from_arrays(
            vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
            &[[0, 1], [1, 2]],
            &[[0, 1, 2]],
        )
        .unwrap();
        let err = assemble_stiffness(&mesh, &Coefficients::new(1.0, 1.0, 1.0), &[]).unwrap_err();
        assert!(matches!(err, SolverError::Topology(_)));
        // Without bending the adjacency is never built.
        assert!(assemble_stiffness(&mesh, &Coefficients::new(1.0, 0.0, 1.0), &[]).is_ok());
    }
}
