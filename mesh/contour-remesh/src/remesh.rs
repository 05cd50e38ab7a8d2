//! Edge split and collapse surgery.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use contour_types::{Connection, SurfaceMesh, Triangle, node_position};
use hashbrown::{HashMap, HashSet};
use nalgebra::Point3;
use smallvec::SmallVec;
use tracing::{debug, info, warn};

use crate::error::{RemeshError, RemeshResult};
use crate::params::RemeshParams;
use crate::result::{EdgeStatistics, RemeshOutput};

/// Remesh so that connection lengths fall within `[min_length, max_length]`.
///
/// Each pass first splits every connection longer than `max_length`,
/// shortest first, until none remain, then collapses connections shorter
/// than `min_length`, shortest first. A collapse is skipped, and the
/// connection marked ineligible for the rest of the pass, when an opposite
/// node has degree three or less or when the endpoints share neighbours
/// other than the opposite nodes. Passes repeat while collapses leave
/// over-long connections behind, up to `max_passes`.
///
/// Nodes are renumbered densely in the output.
///
/// # Errors
///
/// Returns an error if:
/// - The parameters are invalid
/// - The mesh has no triangles
/// - A connection has a non-finite length
/// - The mesh is not a manifold (an edge with more than two triangles, a
///   triangle edge missing from the connection list, or a connection with no
///   triangle that needs surgery)
///
/// # Example
///
/// ```
/// use contour_remesh::{remesh, RemeshParams};
/// use contour_types::block;
///
/// let mesh = block(1.0, 1.0, 1.0);
/// let result = remesh(&mesh, &RemeshParams::with_band(0.3, 0.8))?;
/// assert!(result.final_edge_stats.max_length <= 0.8);
/// assert!(result.mesh.validate().is_ok());
/// # Ok::<(), contour_remesh::RemeshError>(())
/// ```
pub fn remesh(mesh: &SurfaceMesh, params: &RemeshParams) -> RemeshResult<RemeshOutput> {
    params.validate()?;
    if mesh.triangle_count() == 0 {
        return Err(RemeshError::NoTriangles);
    }

    let original_edge_stats = EdgeStatistics::of(mesh);
    let mut surgery = Surgery::new(mesh)?;
    surgery.check_lengths()?;

    debug!(
        "Remeshing: {} nodes, {} connections, band [{}, {}]",
        mesh.node_count(),
        mesh.connection_count(),
        params.min_length,
        params.max_length
    );

    let mut splits_performed = 0;
    let mut collapses_performed = 0;
    let mut passes = 0;
    let mut converged = false;
    while passes < params.max_passes {
        passes += 1;
        let splits = surgery.split_long(params.max_length)?;
        let collapses = surgery.collapse_short(params.min_length)?;
        debug!(pass = passes, splits, collapses, "remesh pass");
        splits_performed += splits;
        collapses_performed += collapses;
        if !surgery.has_long(params.max_length) {
            converged = true;
            break;
        }
    }
    if !converged {
        warn!(
            passes,
            "remesh stopped with connections above the maximum length"
        );
    }

    let (out, ineligible) = surgery.finish()?;
    let final_edge_stats = EdgeStatistics::of(&out);
    info!(
        splits = splits_performed,
        collapses = collapses_performed,
        skipped = ineligible.len(),
        nodes = out.node_count(),
        "remesh complete"
    );

    Ok(RemeshOutput {
        mesh: out,
        passes,
        splits_performed,
        collapses_performed,
        ineligible,
        converged,
        original_edge_stats,
        final_edge_stats,
    })
}

/// The child of `original` spanning `first`, `second` and the inserted node,
/// wound like the parent.
fn matched_winding(original: &Triangle, first: usize, second: usize, inserted: usize) -> Triangle {
    if original.follows(first, second) {
        Triangle::new(first, second, inserted)
    } else {
        Triangle::new(second, first, inserted)
    }
}

fn corrupted(what: String) -> RemeshError {
    RemeshError::Topology(what)
}

/// Collapse candidate ordered so the shortest connection pops first.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    length: f64,
    connection: usize,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap (BinaryHeap is max-heap by default)
        other
            .length
            .total_cmp(&self.length)
            .then_with(|| other.connection.cmp(&self.connection))
    }
}

/// Mutable mesh with the four adjacency maps kept in sync.
///
/// Connection and triangle ids are slots that are never reused; removed
/// elements leave `None` behind until [`Surgery::finish`] compacts them.
struct Surgery {
    positions: Vec<f64>,
    alive: Vec<bool>,
    connections: Vec<Option<Connection>>,
    triangles: Vec<Option<Triangle>>,
    node_connections: Vec<Vec<usize>>,
    node_triangles: Vec<Vec<usize>>,
    connection_triangles: Vec<SmallVec<[usize; 2]>>,
    triangle_edges: Vec<[usize; 3]>,
    lookup: HashMap<(usize, usize), usize>,
    ineligible: HashSet<usize>,
}

impl Surgery {
    fn new(mesh: &SurfaceMesh) -> RemeshResult<Self> {
        let n = mesh.node_count();
        let mut surgery = Self {
            positions: mesh.positions().to_vec(),
            alive: vec![true; n],
            connections: Vec::with_capacity(mesh.connection_count()),
            triangles: Vec::with_capacity(mesh.triangle_count()),
            node_connections: vec![Vec::new(); n],
            node_triangles: vec![Vec::new(); n],
            connection_triangles: Vec::with_capacity(mesh.connection_count()),
            triangle_edges: Vec::with_capacity(mesh.triangle_count()),
            lookup: HashMap::with_capacity(mesh.connection_count()),
            ineligible: HashSet::new(),
        };
        for con in mesh.connections() {
            surgery.add_connection(con.a, con.b)?;
        }
        for tri in mesh.triangles() {
            surgery.add_triangle(*tri)?;
        }
        Ok(surgery)
    }

    fn check_lengths(&self) -> RemeshResult<()> {
        for con in self.connections.iter().flatten() {
            if !self.length(con).is_finite() {
                return Err(RemeshError::NonFiniteLength { a: con.a, b: con.b });
            }
        }
        Ok(())
    }

    fn length(&self, con: &Connection) -> f64 {
        con.length(&self.positions)
    }

    fn connection(&self, ci: usize) -> RemeshResult<Connection> {
        self.connections
            .get(ci)
            .copied()
            .flatten()
            .ok_or_else(|| corrupted(format!("connection {ci} was already removed")))
    }

    fn triangle(&self, ti: usize) -> RemeshResult<Triangle> {
        self.triangles
            .get(ti)
            .copied()
            .flatten()
            .ok_or_else(|| corrupted(format!("triangle {ti} was already removed")))
    }

    fn neighbors(&self, node: usize) -> impl Iterator<Item = usize> + '_ {
        self.node_connections[node]
            .iter()
            .filter_map(move |&ci| self.connections[ci].map(|c| c.opposite(node)))
    }

    fn on_boundary(&self, node: usize) -> bool {
        self.node_connections[node]
            .iter()
            .any(|&ci| self.connection_triangles[ci].len() == 1)
    }

    fn has_long(&self, max: f64) -> bool {
        self.connections
            .iter()
            .flatten()
            .any(|c| self.length(c) > max)
    }

    fn add_node(&mut self, p: &Point3<f64>) -> usize {
        let index = self.alive.len();
        self.positions.extend_from_slice(&[p.x, p.y, p.z]);
        self.alive.push(true);
        self.node_connections.push(Vec::new());
        self.node_triangles.push(Vec::new());
        index
    }

    fn set_position(&mut self, node: usize, p: &Point3<f64>) {
        let i = 3 * node;
        self.positions[i..i + 3].copy_from_slice(&[p.x, p.y, p.z]);
    }

    fn add_connection(&mut self, a: usize, b: usize) -> RemeshResult<usize> {
        let con = Connection::new(a, b);
        let ci = self.connections.len();
        if self.lookup.insert(con.key(), ci).is_some() {
            return Err(corrupted(format!("connection ({a}, {b}) already exists")));
        }
        self.connections.push(Some(con));
        self.connection_triangles.push(SmallVec::new());
        self.node_connections[a].push(ci);
        self.node_connections[b].push(ci);
        Ok(ci)
    }

    fn remove_connection(&mut self, ci: usize) -> RemeshResult<Connection> {
        let con = self.connection(ci)?;
        if !self.connection_triangles[ci].is_empty() {
            return Err(corrupted(format!(
                "connection ({}, {}) removed while still bordering a triangle",
                con.a, con.b
            )));
        }
        self.connections[ci] = None;
        self.lookup.remove(&con.key());
        self.node_connections[con.a].retain(|&c| c != ci);
        self.node_connections[con.b].retain(|&c| c != ci);
        Ok(con)
    }

    fn add_triangle(&mut self, tri: Triangle) -> RemeshResult<usize> {
        let ti = self.triangles.len();
        let mut edges = [0usize; 3];
        for (slot, edge) in edges.iter_mut().zip(tri.edges()) {
            let ci = self.lookup.get(&edge.key()).copied().ok_or_else(|| {
                corrupted(format!(
                    "triangle {:?} is missing edge ({}, {})",
                    tri.indices(),
                    edge.a,
                    edge.b
                ))
            })?;
            if self.connection_triangles[ci].len() >= 2 {
                return Err(corrupted(format!(
                    "connection ({}, {}) would border more than two triangles",
                    edge.a, edge.b
                )));
            }
            *slot = ci;
        }
        for &ci in &edges {
            self.connection_triangles[ci].push(ti);
        }
        for node in tri.indices() {
            self.node_triangles[node].push(ti);
        }
        self.triangles.push(Some(tri));
        self.triangle_edges.push(edges);
        Ok(ti)
    }

    fn remove_triangle(&mut self, ti: usize) -> RemeshResult<Triangle> {
        let tri = self.triangle(ti)?;
        for ci in self.triangle_edges[ti] {
            self.connection_triangles[ci].retain(|t| *t != ti);
        }
        for node in tri.indices() {
            self.node_triangles[node].retain(|&t| t != ti);
        }
        self.triangles[ti] = None;
        Ok(tri)
    }

    /// Splits connections above `max` until none remain.
    fn split_long(&mut self, max: f64) -> RemeshResult<usize> {
        let mut count = 0;
        loop {
            let mut long: Vec<(f64, usize)> = self
                .connections
                .iter()
                .enumerate()
                .filter_map(|(ci, c)| {
                    let length = self.length(c.as_ref()?);
                    (length > max).then_some((length, ci))
                })
                .collect();
            if long.is_empty() {
                return Ok(count);
            }
            long.sort_by(|x, y| x.0.total_cmp(&y.0).then(x.1.cmp(&y.1)));
            for (_, ci) in long {
                if self.connections[ci].is_some() {
                    self.split(ci)?;
                    count += 1;
                }
            }
        }
    }

    /// Inserts a midpoint node on connection `ci`, replacing each bordering
    /// triangle with two.
    fn split(&mut self, ci: usize) -> RemeshResult<()> {
        let con = self.connection(ci)?;
        let bordering = self.connection_triangles[ci].clone();
        if bordering.is_empty() {
            return Err(corrupted(format!(
                "connection ({}, {}) borders no triangle",
                con.a, con.b
            )));
        }
        let mid = nalgebra::center(
            &node_position(&self.positions, con.a),
            &node_position(&self.positions, con.b),
        );

        let mut parents: SmallVec<[Triangle; 2]> = SmallVec::new();
        for ti in bordering {
            parents.push(self.remove_triangle(ti)?);
        }
        self.remove_connection(ci)?;

        let m = self.add_node(&mid);
        self.add_connection(con.a, m)?;
        self.add_connection(m, con.b)?;
        for parent in parents {
            let opposite = parent.opposite(&con).ok_or_else(|| {
                corrupted(format!(
                    "triangle {:?} does not contain ({}, {})",
                    parent.indices(),
                    con.a,
                    con.b
                ))
            })?;
            self.add_connection(m, opposite)?;
            self.add_triangle(matched_winding(&parent, con.a, opposite, m))?;
            self.add_triangle(matched_winding(&parent, con.b, opposite, m))?;
        }
        Ok(())
    }

    /// Collapses connections below `min`, shortest first.
    fn collapse_short(&mut self, min: f64) -> RemeshResult<usize> {
        self.ineligible.clear();
        let mut heap: BinaryHeap<Candidate> = self
            .connections
            .iter()
            .enumerate()
            .filter_map(|(ci, c)| {
                let length = self.length(c.as_ref()?);
                (length < min).then_some(Candidate {
                    length,
                    connection: ci,
                })
            })
            .collect();

        let mut count = 0;
        while let Some(candidate) = heap.pop() {
            let ci = candidate.connection;
            if self.ineligible.contains(&ci) {
                continue;
            }
            let Some(con) = self.connections[ci] else {
                continue;
            };
            let length = self.length(&con);
            if !length.is_finite() {
                return Err(RemeshError::NonFiniteLength { a: con.a, b: con.b });
            }
            if length >= min {
                continue;
            }
            if length.to_bits() != candidate.length.to_bits() {
                // Stale entry: an endpoint moved since it was queued.
                heap.push(Candidate {
                    length,
                    connection: ci,
                });
                continue;
            }

            if self.collapse(ci)? {
                count += 1;
                for &cj in &self.node_connections[con.a] {
                    if let Some(c) = self.connections[cj] {
                        let l = self.length(&c);
                        if l < min {
                            heap.push(Candidate {
                                length: l,
                                connection: cj,
                            });
                        }
                    }
                }
            } else {
                self.ineligible.insert(ci);
            }
        }
        Ok(count)
    }

    /// Merges the second endpoint of `ci` into the first at the midpoint.
    ///
    /// Returns `false`, changing nothing, when the collapse would degenerate
    /// the surface.
    fn collapse(&mut self, ci: usize) -> RemeshResult<bool> {
        let con = self.connection(ci)?;
        let (a, b) = (con.a, con.b);
        let bordering = self.connection_triangles[ci].clone();
        if bordering.is_empty() {
            return Err(corrupted(format!(
                "connection ({a}, {b}) borders no triangle"
            )));
        }

        let mut opposites: SmallVec<[usize; 2]> = SmallVec::new();
        for &ti in &bordering {
            let tri = self.triangle(ti)?;
            opposites.push(tri.opposite(&con).ok_or_else(|| {
                corrupted(format!(
                    "triangle {:?} does not contain ({a}, {b})",
                    tri.indices()
                ))
            })?);
        }

        if opposites.iter().any(|&o| self.node_connections[o].len() <= 3) {
            return Ok(false);
        }
        if bordering.len() == 2 && self.on_boundary(a) && self.on_boundary(b) {
            return Ok(false);
        }
        let around_a: HashSet<usize> = self.neighbors(a).collect();
        let shared = self.neighbors(b).filter(|n| around_a.contains(n)).count();
        if shared != bordering.len() {
            return Ok(false);
        }

        let mid = nalgebra::center(
            &node_position(&self.positions, a),
            &node_position(&self.positions, b),
        );

        for ti in bordering {
            self.remove_triangle(ti)?;
        }
        self.remove_connection(ci)?;

        // Each connection (b, o) folds onto (a, o); the triangle beyond it is
        // re-attached once b has been renamed.
        let mut reattach: SmallVec<[Triangle; 2]> = SmallVec::new();
        for &o in &opposites {
            let cb = self
                .lookup
                .get(&Connection::new(b, o).key())
                .copied()
                .ok_or_else(|| corrupted(format!("connection ({b}, {o}) is missing")))?;
            let beyond = self.connection_triangles[cb].clone();
            for ti in beyond {
                reattach.push(self.remove_triangle(ti)?);
            }
            self.remove_connection(cb)?;
        }

        for cj in std::mem::take(&mut self.node_connections[b]) {
            let old = self.connection(cj)?;
            let renamed = Connection::new(
                if old.a == b { a } else { old.a },
                if old.b == b { a } else { old.b },
            );
            self.lookup.remove(&old.key());
            if self.lookup.insert(renamed.key(), cj).is_some() {
                return Err(corrupted(format!(
                    "merging {b} into {a} duplicates connection ({}, {})",
                    renamed.a, renamed.b
                )));
            }
            self.connections[cj] = Some(renamed);
            self.node_connections[a].push(cj);
        }

        for ti in std::mem::take(&mut self.node_triangles[b]) {
            let tri = self.triangle(ti)?;
            self.triangles[ti] = Some(tri.remapped(b, a));
            self.node_triangles[a].push(ti);
        }

        for tri in reattach {
            self.add_triangle(tri.remapped(b, a))?;
        }

        self.set_position(a, &mid);
        self.alive[b] = false;
        Ok(true)
    }

    /// Renumbers live nodes densely and rebuilds the flat arrays.
    fn finish(self) -> RemeshResult<(SurfaceMesh, Vec<[usize; 2]>)> {
        let mut remap = vec![usize::MAX; self.alive.len()];
        let mut positions = Vec::with_capacity(self.positions.len());
        let mut next = 0;
        for (node, &alive) in self.alive.iter().enumerate() {
            if alive {
                remap[node] = next;
                next += 1;
                positions.extend_from_slice(&self.positions[3 * node..3 * node + 3]);
            }
        }

        let connections = self
            .connections
            .iter()
            .flatten()
            .map(|c| Connection::new(remap[c.a], remap[c.b]))
            .collect();
        let triangles = self
            .triangles
            .iter()
            .flatten()
            .map(|t| Triangle::new(remap[t.a], remap[t.b], remap[t.c]))
            .collect();

        let mut skipped: Vec<usize> = self.ineligible.iter().copied().collect();
        skipped.sort_unstable();
        let ineligible = skipped
            .into_iter()
            .filter_map(|ci| self.connections[ci])
            .map(|c| [remap[c.a], remap[c.b]])
            .collect();

        Ok((SurfaceMesh::new(positions, connections, triangles)?, ineligible))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use contour_types::{MeshTopology, Vector3, block};

    /// Unit square in the xy plane made of two triangles.
    fn square() -> SurfaceMesh {
        SurfaceMesh::from_arrays(
            vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 0.0],
            &[[0, 1], [1, 2], [2, 3], [3, 0], [0, 2]],
            &[[0, 1, 2], [0, 2, 3]],
        )
        .unwrap()
    }

    fn assert_manifold(mesh: &SurfaceMesh) {
        mesh.validate().expect("remeshed mesh must be manifold");
        let topology = MeshTopology::new(mesh);
        for con in mesh.connections() {
            let n = topology.edge_triangles(con).len();
            assert!((1..=2).contains(&n), "connection {con:?} borders {n} triangles");
        }
    }

    #[test]
    fn matched_winding_keeps_orientation() {
        let parent = Triangle::new(0, 1, 2);
        // Split edge (0, 1) with node 9; the opposite corner is 2.
        let first = matched_winding(&parent, 0, 2, 9);
        let second = matched_winding(&parent, 1, 2, 9);
        assert_eq!(first, Triangle::new(9, 2, 0));
        assert_eq!(second, Triangle::new(9, 1, 2));
    }

    #[test]
    fn split_single_boundary_edge() {
        let mesh = SurfaceMesh::from_arrays(
            vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.5, 0.0],
            &[[0, 1], [1, 2], [2, 0]],
            &[[0, 1, 2]],
        )
        .unwrap();
        let mut surgery = Surgery::new(&mesh).unwrap();
        surgery.split(0).unwrap();
        let (out, _) = surgery.finish().unwrap();
        assert_eq!(out.node_count(), 4);
        assert_eq!(out.triangle_count(), 2);
        assert_eq!(out.connection_count(), 5);
        for g in out.triangle_geometries() {
            assert_relative_eq!(g.normal, Vector3::z(), epsilon = 1e-12);
        }
        assert_manifold(&out);
    }

    #[test]
    fn split_interior_edge_of_square() {
        let mut surgery = Surgery::new(&square()).unwrap();
        surgery.split(4).unwrap();
        let (out, _) = surgery.finish().unwrap();
        assert_eq!(out.node_count(), 5);
        assert_eq!(out.triangle_count(), 4);
        assert_relative_eq!(out.surface_area(), 1.0, epsilon = 1e-12);
        assert_manifold(&out);
    }

    #[test]
    fn split_phase_reaches_fixed_point() {
        let result = remesh(&square(), &RemeshParams::with_band(0.01, 0.3)).unwrap();
        assert!(result.final_edge_stats.max_length <= 0.3);
        assert!(result.splits_performed > 0);
        assert_relative_eq!(result.mesh.surface_area(), 1.0, epsilon = 1e-9);
        assert_manifold(&result.mesh);
    }

    #[test]
    fn closed_block_stays_closed() {
        let result = remesh(&block(1.0, 1.0, 1.0), &RemeshParams::with_band(0.2, 0.5)).unwrap();
        assert!(result.mesh.is_closed());
        assert!(result.final_edge_stats.max_length <= 0.5);
        assert_relative_eq!(result.mesh.signed_volume(), 1.0, epsilon = 0.2);
        assert_manifold(&result.mesh);
    }

    #[test]
    fn collapse_rejects_low_degree_opposite() {
        // Both corners opposite the diagonal have degree 2.
        let mut surgery = Surgery::new(&square()).unwrap();
        assert!(!surgery.collapse(4).unwrap());
        let (out, _) = surgery.finish().unwrap();
        assert_eq!(out, square());
    }

    #[test]
    fn collapse_merges_short_edge() {
        let fine = remesh(&block(1.0, 1.0, 1.0), &RemeshParams::with_band(0.01, 0.3))
            .unwrap()
            .mesh;
        let nodes = fine.node_count();
        let mut surgery = Surgery::new(&fine).unwrap();
        // Find a connection whose collapse is permitted.
        let mut collapsed = false;
        for ci in 0..fine.connection_count() {
            if surgery.collapse(ci).unwrap() {
                collapsed = true;
                break;
            }
        }
        assert!(collapsed);
        let (out, _) = surgery.finish().unwrap();
        assert_eq!(out.node_count(), nodes - 1);
        assert_eq!(out.triangle_count(), fine.triangle_count() - 2);
        assert!(out.is_closed());
        assert_manifold(&out);
    }

    #[test]
    fn non_finite_length_is_rejected() {
        let mut mesh = square();
        mesh.set_position(2, &Point3::new(f64::NAN, 0.0, 0.0));
        assert!(matches!(
            remesh(&mesh, &RemeshParams::default()),
            Err(RemeshError::NonFiniteLength { .. })
        ));
    }

    #[test]
    fn wire_mesh_is_rejected() {
        let mesh = SurfaceMesh::from_arrays(vec![0.0; 6], &[[0, 1]], &[]).unwrap();
        assert!(matches!(
            remesh(&mesh, &RemeshParams::default()),
            Err(RemeshError::NoTriangles)
        ));
    }

    #[test]
    fn missing_edge_is_corruption() {
        let mesh = SurfaceMesh::from_arrays(
            vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
            &[[0, 1], [1, 2]],
            &[[0, 1, 2]],
        )
        .unwrap();
        assert!(matches!(
            remesh(&mesh, &RemeshParams::default()),
            Err(RemeshError::Topology(_))
        ));
    }

    #[test]
    fn candidates_pop_shortest_first() {
        let mut heap = BinaryHeap::new();
        heap.push(Candidate { length: 0.3, connection: 0 });
        heap.push(Candidate { length: 0.1, connection: 5 });
        heap.push(Candidate { length: 0.1, connection: 2 });
        assert_eq!(heap.pop().map(|c| c.connection), Some(2));
        assert_eq!(heap.pop().map(|c| c.connection), Some(5));
        assert_eq!(heap.pop().map(|c| c.connection), Some(0));
    }
}
