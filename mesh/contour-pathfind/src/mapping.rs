//! Mapping an external curve onto mesh nodes.
//!
//! A polyline, such as a traced ring on the cell surface, is laid onto the
//! mesh in three steps:
//!
//! 1. Curve points are paired with mesh nodes, nearest pairs first, using
//!    each point and each node at most once.
//! 2. Consecutive paired nodes, in curve order, are joined by A* paths over
//!    the connection graph.
//! 3. Every node on those paths is assigned the curve point found at the same
//!    fraction of arc length between the two curve points of its segment.

use contour_types::{Point3, SurfaceMesh, Vector3};
use hashbrown::HashMap;
use tracing::debug;

use crate::astar::MeshPathFinder;
use crate::error::{PathError, PathResult};

/// Arc-length parameterized polyline.
#[derive(Debug, Clone)]
struct Polyline<'a> {
    points: &'a [Point3<f64>],
    arc: Vec<f64>,
    total: f64,
    closed: bool,
}

impl<'a> Polyline<'a> {
    fn new(points: &'a [Point3<f64>], closed: bool) -> Self {
        let mut arc = Vec::with_capacity(points.len() + 1);
        let mut total = 0.0;
        arc.push(0.0);
        for w in points.windows(2) {
            total += nalgebra::distance(&w[0], &w[1]);
            arc.push(total);
        }
        if closed && points.len() > 1 {
            total += nalgebra::distance(&points[points.len() - 1], &points[0]);
            arc.push(total);
        }
        Self {
            points,
            arc,
            total,
            closed,
        }
    }

    fn segments(&self) -> usize {
        self.arc.len() - 1
    }

    /// Point at arc length `s`; wraps when closed and clamps when open.
    fn at(&self, s: f64) -> Point3<f64> {
        if self.segments() == 0 || self.total <= 0.0 {
            return self.points[0];
        }
        let s = if self.closed {
            s.rem_euclid(self.total)
        } else {
            s.clamp(0.0, self.total)
        };
        let k = self
            .arc
            .partition_point(|&a| a <= s)
            .saturating_sub(1)
            .min(self.segments() - 1);
        let span = self.arc[k + 1] - self.arc[k];
        let t = if span > 0.0 { (s - self.arc[k]) / span } else { 0.0 };
        let p = self.points[k];
        let q = self.points[(k + 1) % self.points.len()];
        p + (q - p) * t
    }
}

/// Result of laying a curve onto a mesh.
#[derive(Debug, Clone, Default)]
pub struct CurveMapping {
    targets: HashMap<usize, Point3<f64>>,
    anchors: Vec<(usize, usize)>,
    path: Vec<usize>,
}

impl CurveMapping {
    /// Curve point assigned to `node`, if any.
    #[must_use]
    pub fn target(&self, node: usize) -> Option<Point3<f64>> {
        self.targets.get(&node).copied()
    }

    /// Displacement from `position` to the target of `node`; zero for
    /// unmapped nodes.
    #[must_use]
    pub fn difference(&self, node: usize, position: &Point3<f64>) -> Vector3<f64> {
        self.target(node).map_or_else(Vector3::zeros, |t| t - position)
    }

    /// `(node, target)` pairs sorted by node.
    #[must_use]
    pub fn targets(&self) -> Vec<(usize, Point3<f64>)> {
        let mut pairs: Vec<_> = self.targets.iter().map(|(&n, &p)| (n, p)).collect();
        pairs.sort_unstable_by_key(|&(n, _)| n);
        pairs
    }

    /// `(curve point, node)` pairs in curve order.
    #[must_use]
    pub fn anchors(&self) -> &[(usize, usize)] {
        &self.anchors
    }

    /// Concatenated mesh path through all anchors.
    #[must_use]
    pub fn path(&self) -> &[usize] {
        &self.path
    }

    /// Number of mapped nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    /// True when no node is mapped.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

/// Pairs curve points with nodes, closest pairs first, without reuse.
///
/// Returns `(curve point, node)` pairs sorted by curve point.
fn nearest_unique_pairs(points: &[Point3<f64>], curve: &[Point3<f64>]) -> Vec<(usize, usize)> {
    let mut candidates = Vec::with_capacity(points.len() * curve.len());
    for (ci, c) in curve.iter().enumerate() {
        for (ni, p) in points.iter().enumerate() {
            candidates.push((nalgebra::distance_squared(c, p), ci, ni));
        }
    }
    candidates.sort_unstable_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)).then(a.2.cmp(&b.2)));

    let mut point_used = vec![false; curve.len()];
    let mut node_used = vec![false; points.len()];
    let mut pairs = Vec::new();
    for (_, ci, ni) in candidates {
        if point_used[ci] || node_used[ni] {
            continue;
        }
        point_used[ci] = true;
        node_used[ni] = true;
        pairs.push((ci, ni));
        if pairs.len() == curve.len().min(points.len()) {
            break;
        }
    }
    pairs.sort_unstable();
    pairs
}

/// Lays `curve` onto the nodes of `mesh`.
///
/// With `closed` set, the last curve point connects back to the first and a
/// path closes the loop on the mesh as well.
///
/// # Errors
///
/// Returns an error if the curve or mesh is empty, a coordinate is not
/// finite, or consecutive anchors lie in different connected components.
///
/// # Example
///
/// ```
/// use contour_pathfind::map_curve;
/// use contour_types::{block, Point3};
///
/// let mesh = block(2.0, 2.0, 2.0);
/// // A segment running along the top face.
/// let curve = [Point3::new(-1.0, -1.0, 1.0), Point3::new(1.0, 1.0, 1.0)];
/// let mapping = map_curve(&mesh, &curve, false)?;
///
/// assert_eq!(mapping.target(0), Some(curve[0]));
/// assert_eq!(mapping.target(2), Some(curve[1]));
/// # Ok::<(), contour_pathfind::PathError>(())
/// ```
pub fn map_curve(
    mesh: &SurfaceMesh,
    curve: &[Point3<f64>],
    closed: bool,
) -> PathResult<CurveMapping> {
    if curve.is_empty() {
        return Err(PathError::EmptyCurve);
    }
    if mesh.node_count() == 0 {
        return Err(PathError::EmptyMesh);
    }
    if let Some(bad) = curve.iter().position(|p| !p.coords.iter().all(|c| c.is_finite())) {
        return Err(PathError::NonFiniteCurvePoint(bad));
    }

    let finder = MeshPathFinder::new(mesh)?;
    let points: Vec<_> = (0..finder.node_count()).map(|n| finder.point(n)).collect();
    let anchors = nearest_unique_pairs(&points, curve);
    let polyline = Polyline::new(curve, closed);

    let mut segments: Vec<((usize, usize), (usize, usize), f64)> = anchors
        .windows(2)
        .map(|w| (w[0], w[1], polyline.arc[w[1].0]))
        .collect();
    if closed && anchors.len() > 1 {
        let (first, last) = (anchors[0], anchors[anchors.len() - 1]);
        segments.push((last, first, polyline.total + polyline.arc[first.0]));
    }

    let mut targets: HashMap<usize, Point3<f64>> =
        anchors.iter().map(|&(ci, ni)| (ni, curve[ci])).collect();
    let mut path = vec![anchors[0].1];

    for ((from_point, from_node), (_, to_node), end_arc) in segments {
        let start_arc = polyline.arc[from_point];
        let segment = finder.find_path(from_node, to_node)?;
        let mut walked = 0.0;
        for (i, &node) in segment.nodes.iter().enumerate() {
            if i > 0 {
                walked += nalgebra::distance(&points[segment.nodes[i - 1]], &points[node]);
                path.push(node);
            }
            let fraction = if segment.length > 0.0 {
                (walked / segment.length).clamp(0.0, 1.0)
            } else {
                0.0
            };
            targets
                .entry(node)
                .or_insert_with(|| polyline.at(start_arc + fraction * (end_arc - start_arc)));
        }
    }

    debug!(
        curve_points = curve.len(),
        anchors = anchors.len(),
        mapped = targets.len(),
        "mapped curve onto mesh"
    );
    Ok(CurveMapping {
        targets,
        anchors,
        path,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Straight chain of `n` nodes along x with unit spacing.
    fn chain(n: usize) -> SurfaceMesh {
        let mut positions = Vec::new();
        for i in 0..n {
            #[allow(clippy::cast_precision_loss)]
            positions.extend_from_slice(&[i as f64, 0.0, 0.0]);
        }
        let connections: Vec<[usize; 2]> = (1..n).map(|i| [i - 1, i]).collect();
        SurfaceMesh::from_arrays(positions, &connections, &[]).unwrap()
    }

    #[test]
    fn polyline_interpolates_by_arc_length() {
        let pts = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 2.0, 0.0),
        ];
        let open = Polyline::new(&pts, false);
        assert_relative_eq!(open.total, 3.0);
        assert_relative_eq!(open.at(0.5), Point3::new(0.5, 0.0, 0.0));
        assert_relative_eq!(open.at(2.0), Point3::new(1.0, 1.0, 0.0));
        assert_relative_eq!(open.at(10.0), pts[2]);

        let closed = Polyline::new(&pts, true);
        assert_relative_eq!(closed.total, 3.0 + 5.0_f64.sqrt());
        assert_relative_eq!(closed.at(closed.total + 0.5), Point3::new(0.5, 0.0, 0.0));
    }

    #[test]
    fn pairs_are_unique_and_nearest_first() {
        let nodes = [Point3::new(0.0, 0.0, 0.0), Point3::new(10.0, 0.0, 0.0)];
        // Both curve points are nearest node 0; the closer one wins it.
        let curve = [Point3::new(0.5, 0.0, 0.0), Point3::new(0.1, 0.0, 0.0)];
        assert_eq!(nearest_unique_pairs(&nodes, &curve), vec![(0, 1), (1, 0)]);
    }

    #[test]
    fn chain_nodes_follow_curve() {
        let mesh = chain(5);
        let curve = [Point3::new(0.0, 1.0, 0.0), Point3::new(4.0, 1.0, 0.0)];
        let mapping = map_curve(&mesh, &curve, false).unwrap();
        assert_eq!(mapping.path(), &[0, 1, 2, 3, 4]);
        assert_eq!(mapping.len(), 5);
        for (node, target) in mapping.targets() {
            #[allow(clippy::cast_precision_loss)]
            let x = node as f64;
            assert_relative_eq!(target, Point3::new(x, 1.0, 0.0), epsilon = 1e-12);
        }
        assert_relative_eq!(
            mapping.difference(2, &mesh.position(2)),
            Vector3::new(0.0, 1.0, 0.0),
            epsilon = 1e-12
        );
    }

    #[test]
    fn unmapped_nodes_have_no_target() {
        let mesh = chain(6);
        let curve = [Point3::new(1.0, 0.0, 0.0), Point3::new(2.0, 0.0, 0.0)];
        let mapping = map_curve(&mesh, &curve, false).unwrap();
        assert_eq!(mapping.target(5), None);
        assert_eq!(mapping.difference(5, &mesh.position(5)), Vector3::zeros());
    }

    #[test]
    fn closed_curve_returns_to_start() {
        let mesh = contour_types::block(1.0, 1.0, 1.0);
        let curve: Vec<_> = [0, 1, 2, 3].iter().map(|&i| mesh.position(i)).collect();
        let mapping = map_curve(&mesh, &curve, true).unwrap();
        assert_eq!(mapping.anchors().len(), 4);
        assert_eq!(mapping.path().first(), mapping.path().last());
    }

    #[test]
    fn rejects_bad_input() {
        let mesh = chain(3);
        assert_eq!(map_curve(&mesh, &[], false).unwrap_err(), PathError::EmptyCurve);
        let curve = [Point3::new(f64::NAN, 0.0, 0.0)];
        assert_eq!(
            map_curve(&mesh, &curve, false).unwrap_err(),
            PathError::NonFiniteCurvePoint(0)
        );
        assert_eq!(
            map_curve(&SurfaceMesh::default(), &curve, false).unwrap_err(),
            PathError::EmptyMesh
        );
    }
}
