//! Read-only adjacency maps derived from a mesh.

use hashbrown::{HashMap, HashSet};
use smallvec::SmallVec;

use crate::error::{MeshError, MeshResult};
use crate::mesh::SurfaceMesh;
use crate::primitives::Connection;

/// Node, connection and triangle adjacency for a fixed topology.
///
/// Connection and triangle entries are indices into the mesh's lists. The
/// per-node lists keep the order of the mesh's connection and triangle lists.
///
/// # Example
///
/// ```
/// use contour_types::{block, MeshTopology};
///
/// let mesh = block(1.0, 1.0, 1.0);
/// let topology = MeshTopology::new(&mesh);
/// let degree: usize = (0..8).map(|n| topology.degree(n)).sum();
/// assert_eq!(degree, 2 * mesh.connection_count());
/// ```
#[derive(Debug, Clone)]
pub struct MeshTopology {
    node_connections: Vec<Vec<usize>>,
    node_triangles: Vec<Vec<usize>>,
    edge_triangles: HashMap<(usize, usize), SmallVec<[usize; 2]>>,
    connection_lookup: HashMap<(usize, usize), usize>,
}

impl MeshTopology {
    /// Builds the adjacency maps of `mesh`.
    #[must_use]
    pub fn new(mesh: &SurfaceMesh) -> Self {
        let n = mesh.node_count();
        let mut node_connections = vec![Vec::new(); n];
        let mut connection_lookup = HashMap::with_capacity(mesh.connection_count());
        for (ci, con) in mesh.connections().iter().enumerate() {
            node_connections[con.a].push(ci);
            node_connections[con.b].push(ci);
            connection_lookup.insert(con.key(), ci);
        }

        let mut node_triangles = vec![Vec::new(); n];
        let mut edge_triangles: HashMap<(usize, usize), SmallVec<[usize; 2]>> =
            HashMap::with_capacity(mesh.connection_count());
        for (ti, tri) in mesh.triangles().iter().enumerate() {
            for node in tri.indices() {
                node_triangles[node].push(ti);
            }
            for edge in tri.edges() {
                edge_triangles.entry(edge.key()).or_default().push(ti);
            }
        }

        Self {
            node_connections,
            node_triangles,
            edge_triangles,
            connection_lookup,
        }
    }

    /// Number of nodes covered by the maps.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.node_connections.len()
    }

    /// Connection indices incident to `node`.
    #[must_use]
    pub fn node_connections(&self, node: usize) -> &[usize] {
        &self.node_connections[node]
    }

    /// Triangle indices having `node` as a corner.
    #[must_use]
    pub fn node_triangles(&self, node: usize) -> &[usize] {
        &self.node_triangles[node]
    }

    /// Number of connections at `node`.
    #[must_use]
    pub fn degree(&self, node: usize) -> usize {
        self.node_connections[node].len()
    }

    /// Triangles bordering an edge. Empty when no triangle uses it.
    #[must_use]
    pub fn edge_triangles(&self, connection: &Connection) -> &[usize] {
        self.edge_triangles
            .get(&connection.key())
            .map_or(&[], SmallVec::as_slice)
    }

    /// Index of the connection joining `a` and `b`.
    #[must_use]
    pub fn connection_index(&self, a: usize, b: usize) -> Option<usize> {
        self.connection_lookup.get(&Connection::new(a, b).key()).copied()
    }

    /// Nodes joined to `node` by a connection.
    pub fn neighbors<'a>(
        &'a self,
        mesh: &'a SurfaceMesh,
        node: usize,
    ) -> impl Iterator<Item = usize> + 'a {
        self.node_connections[node]
            .iter()
            .map(move |&ci| mesh.connections()[ci].opposite(node))
    }

    /// For every connection, the other connections that share a triangle with it.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::MissingEdge`] if a triangle edge is not in the
    /// connection list.
    pub fn connection_adjacency(&self, mesh: &SurfaceMesh) -> MeshResult<Vec<HashSet<usize>>> {
        let mut adjacency = vec![HashSet::new(); mesh.connection_count()];
        for tri in mesh.triangles() {
            let mut edges = [0usize; 3];
            for (slot, edge) in edges.iter_mut().zip(tri.edges()) {
                *slot = self.connection_index(edge.a, edge.b).ok_or(MeshError::MissingEdge {
                    triangle: tri.indices(),
                    a: edge.a,
                    b: edge.b,
                })?;
            }
            for &e in &edges {
                for &other in &edges {
                    if other != e {
                        adjacency[e].insert(other);
                    }
                }
            }
        }
        Ok(adjacency)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::block;

    #[test]
    fn block_edges_border_two_triangles() {
        let mesh = block(2.0, 1.0, 1.0);
        let topology = MeshTopology::new(&mesh);
        for con in mesh.connections() {
            assert_eq!(topology.edge_triangles(con).len(), 2);
        }
    }

    #[test]
    fn connection_adjacency_pairs() {
        let mesh = block(1.0, 1.0, 1.0);
        let topology = MeshTopology::new(&mesh);
        let adjacency = topology.connection_adjacency(&mesh).unwrap();
        // Every connection borders two triangles, each contributing two edges.
        assert!(adjacency.iter().all(|set| set.len() == 4));
    }

    #[test]
    fn missing_edge_is_reported() {
        let mesh = SurfaceMesh::from_arrays(
            vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
            &[[0, 1], [1, 2]],
            &[[0, 1, 2]],
        )
        .unwrap();
        let topology = MeshTopology::new(&mesh);
        let err = topology.connection_adjacency(&mesh).unwrap_err();
        assert!(matches!(err, MeshError::MissingEdge { a: 2, b: 0, .. }));
    }

    #[test]
    fn neighbors_follow_connections() {
        let mesh = block(1.0, 1.0, 1.0);
        let topology = MeshTopology::new(&mesh);
        let mut n: Vec<usize> = topology.neighbors(&mesh, 0).collect();
        n.sort_unstable();
        assert_eq!(n, vec![1, 2, 3, 4, 5]);
    }
}
