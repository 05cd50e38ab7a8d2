//! Result types for remeshing operations.

// Edge counts don't overflow in practice
#![allow(clippy::cast_precision_loss)]

use contour_types::SurfaceMesh;

/// Statistics about connection lengths in a mesh.
#[derive(Debug, Clone, Copy, Default)]
pub struct EdgeStatistics {
    /// Minimum connection length.
    pub min_length: f64,
    /// Maximum connection length.
    pub max_length: f64,
    /// Average connection length.
    pub avg_length: f64,
    /// Standard deviation of connection lengths.
    pub std_dev: f64,
    /// Number of connections.
    pub edge_count: usize,
}

impl EdgeStatistics {
    /// Computes statistics over the connections of `mesh`.
    #[must_use]
    pub fn of(mesh: &SurfaceMesh) -> Self {
        let positions = mesh.positions();
        let lengths: Vec<f64> = mesh
            .connections()
            .iter()
            .map(|c| c.length(positions))
            .collect();
        if lengths.is_empty() {
            return Self::default();
        }
        let n = lengths.len() as f64;
        let avg_length = lengths.iter().sum::<f64>() / n;
        let variance = lengths.iter().map(|l| (l - avg_length).powi(2)).sum::<f64>() / n;
        Self {
            min_length: lengths.iter().copied().fold(f64::INFINITY, f64::min),
            max_length: lengths.iter().copied().fold(0.0, f64::max),
            avg_length,
            std_dev: variance.sqrt(),
            edge_count: lengths.len(),
        }
    }
}

/// Result of adaptive remeshing.
#[derive(Debug, Clone)]
pub struct RemeshOutput {
    /// The remeshed mesh, with nodes renumbered densely.
    pub mesh: SurfaceMesh,

    /// Number of split/collapse passes run.
    pub passes: u32,

    /// Number of connections split.
    pub splits_performed: usize,

    /// Number of connections collapsed.
    pub collapses_performed: usize,

    /// Short connections left in place because collapsing them would
    /// degenerate the surface, as node pairs in the output numbering.
    pub ineligible: Vec<[usize; 2]>,

    /// Whether the last pass left every connection at or below `max_length`.
    pub converged: bool,

    /// Edge statistics for the input mesh.
    pub original_edge_stats: EdgeStatistics,

    /// Edge statistics for the remeshed mesh.
    pub final_edge_stats: EdgeStatistics,
}

impl RemeshOutput {
    /// Whether any topology changed.
    #[must_use]
    pub const fn changed(&self) -> bool {
        self.splits_performed > 0 || self.collapses_performed > 0
    }

    /// Net change in node count.
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub const fn node_delta(&self) -> isize {
        self.splits_performed as isize - self.collapses_performed as isize
    }
}
