//! A* search over mesh connections.
//!
//! # Example
//!
//! ```
//! use contour_pathfind::MeshPathFinder;
//! use contour_types::block;
//!
//! let mesh = block(1.0, 1.0, 1.0);
//! let finder = MeshPathFinder::new(&mesh)?;
//!
//! // Opposite corners of the box.
//! let path = finder.find_path(0, 6)?;
//! assert_eq!(path.nodes.first(), Some(&0));
//! assert_eq!(path.nodes.last(), Some(&6));
//! # Ok::<(), contour_pathfind::PathError>(())
//! ```

use contour_types::{Point3, SurfaceMesh};
use pathfinding::prelude::astar;
use tracing::{debug, warn};

use crate::error::{PathError, PathResult};

/// Fixed-point scale applied to lengths before handing them to the search.
const COST_SCALE: f64 = 1.0e6;

/// A path through the connection graph.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MeshPath {
    /// Visited nodes from start to goal, both included.
    pub nodes: Vec<usize>,
    /// Sum of Euclidean connection lengths along the path.
    pub length: f64,
}

impl MeshPath {
    /// Number of connections traversed.
    #[must_use]
    pub fn hops(&self) -> usize {
        self.nodes.len().saturating_sub(1)
    }
}

/// A* pathfinder over the undirected connection graph of a mesh.
///
/// Edge cost is the Euclidean connection length and the heuristic is the
/// straight-line distance to the goal. The finder snapshots node positions,
/// so it must be rebuilt after the mesh moves or is remeshed.
#[derive(Debug, Clone)]
pub struct MeshPathFinder {
    points: Vec<Point3<f64>>,
    neighbors: Vec<Vec<usize>>,
}

impl MeshPathFinder {
    /// Builds the neighbour lists of `mesh`.
    ///
    /// # Errors
    ///
    /// Returns [`PathError::NonFinitePosition`] if any node has a NaN or
    /// infinite coordinate, such as an unresolved ray-cast node.
    pub fn new(mesh: &SurfaceMesh) -> PathResult<Self> {
        let points = mesh.points();
        if let Some(bad) = points.iter().position(|p| !p.coords.iter().all(|c| c.is_finite())) {
            return Err(PathError::NonFinitePosition(bad));
        }
        let mut neighbors = vec![Vec::new(); points.len()];
        for con in mesh.connections() {
            neighbors[con.a].push(con.b);
            neighbors[con.b].push(con.a);
        }
        Ok(Self { points, neighbors })
    }

    /// Number of nodes in the graph.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.points.len()
    }

    /// Position of a node as captured at construction.
    #[must_use]
    pub fn point(&self, node: usize) -> Point3<f64> {
        self.points[node]
    }

    /// Nodes connected to `node`.
    #[must_use]
    pub fn neighbors(&self, node: usize) -> &[usize] {
        &self.neighbors[node]
    }

    fn check(&self, node: usize) -> PathResult<()> {
        if node < self.points.len() {
            Ok(())
        } else {
            Err(PathError::NodeOutOfRange {
                node,
                node_count: self.points.len(),
            })
        }
    }

    /// Finds a shortest path from `start` to `goal`.
    ///
    /// Lengths are rounded to a fixed-point grid for the search; edge costs
    /// round up and the heuristic rounds down so it stays admissible.
    ///
    /// # Errors
    ///
    /// Returns an error if either node is out of range or the goal is in a
    /// different connected component.
    pub fn find_path(&self, start: usize, goal: usize) -> PathResult<MeshPath> {
        self.check(start)?;
        self.check(goal)?;

        if start == goal {
            return Ok(MeshPath {
                nodes: vec![start],
                length: 0.0,
            });
        }

        let target = self.points[goal];
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let result = astar(
            &start,
            |&node| {
                let from = self.points[node];
                self.neighbors[node]
                    .iter()
                    .map(move |&next| {
                        let length = nalgebra::distance(&from, &self.points[next]);
                        let cost = (length * COST_SCALE).ceil();
                        (next, cost as u64)
                    })
                    .collect::<Vec<_>>()
            },
            |&node| (nalgebra::distance(&self.points[node], &target) * COST_SCALE).floor() as u64,
            |&node| node == goal,
        );

        match result {
            Some((nodes, _)) => {
                let length = self.path_length(&nodes);
                debug!(start, goal, hops = nodes.len() - 1, length, "found mesh path");
                Ok(MeshPath { nodes, length })
            }
            None => {
                warn!(start, goal, "goal unreachable through mesh connections");
                Err(PathError::NoPathFound { start, goal })
            }
        }
    }

    /// Euclidean length of a node sequence.
    #[must_use]
    pub fn path_length(&self, nodes: &[usize]) -> f64 {
        nodes
            .windows(2)
            .map(|w| nalgebra::distance(&self.points[w[0]], &self.points[w[1]]))
            .sum()
    }
}

/// Shortest path between two nodes of `mesh`.
///
/// Convenience wrapper building a one-off [`MeshPathFinder`].
///
/// # Errors
///
/// See [`MeshPathFinder::new`] and [`MeshPathFinder::find_path`].
pub fn find_path(mesh: &SurfaceMesh, start: usize, goal: usize) -> PathResult<MeshPath> {
    MeshPathFinder::new(mesh)?.find_path(start, goal)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use contour_types::block;

    /// A regular `n`-gon in the xy plane with one connection per side.
    fn ring(n: usize) -> SurfaceMesh {
        let mut positions = Vec::with_capacity(3 * n);
        for i in 0..n {
            #[allow(clippy::cast_precision_loss)]
            let t = std::f64::consts::TAU * i as f64 / n as f64;
            positions.extend_from_slice(&[t.cos(), t.sin(), 0.0]);
        }
        let connections: Vec<[usize; 2]> = (0..n).map(|i| [i, (i + 1) % n]).collect();
        SurfaceMesh::from_arrays(positions, &connections, &[]).unwrap()
    }

    #[test]
    fn cycle_takes_shorter_arc() {
        let mesh = ring(12);
        let path = find_path(&mesh, 1, 10).unwrap();
        assert_eq!(path.nodes, vec![1, 0, 11, 10]);

        let path = find_path(&mesh, 10, 1).unwrap();
        assert_eq!(path.nodes, vec![10, 11, 0, 1]);
    }

    #[test]
    fn path_length_matches_edges() {
        let mesh = ring(8);
        let path = find_path(&mesh, 0, 3).unwrap();
        assert_eq!(path.hops(), 3);
        let side = 2.0 * (std::f64::consts::PI / 8.0).sin();
        assert_relative_eq!(path.length, 3.0 * side, epsilon = 1e-12);
    }

    #[test]
    fn trivial_path() {
        let path = find_path(&block(1.0, 1.0, 1.0), 4, 4).unwrap();
        assert_eq!(path.nodes, vec![4]);
        assert_relative_eq!(path.length, 0.0);
    }

    #[test]
    fn block_diagonal_uses_face_diagonal() {
        let mesh = block(1.0, 1.0, 1.0);
        let path = find_path(&mesh, 0, 6).unwrap();
        // One face diagonal and one edge.
        assert_eq!(path.hops(), 2);
        assert_relative_eq!(path.length, 1.0 + 2.0_f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn disconnected_goal_fails() {
        let mesh = SurfaceMesh::from_arrays(
            vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 5.0, 0.0, 0.0, 6.0, 0.0, 0.0],
            &[[0, 1], [2, 3]],
            &[],
        )
        .unwrap();
        assert_eq!(
            find_path(&mesh, 0, 3),
            Err(PathError::NoPathFound { start: 0, goal: 3 })
        );
        assert!(matches!(
            find_path(&mesh, 0, 9),
            Err(PathError::NodeOutOfRange { node: 9, .. })
        ));
    }

    #[test]
    fn unresolved_nodes_are_rejected() {
        let mut mesh = ring(5);
        mesh.set_position(2, &Point3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY));
        assert!(matches!(
            MeshPathFinder::new(&mesh),
            Err(PathError::NonFinitePosition(2))
        ));
    }
}
