//! Error types for the stiffness solve.

use contour_types::MeshError;
use thiserror::Error;

/// Errors that can occur while assembling or solving the stiffness system.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SolverError {
    /// The assembled matrix has no LU solution.
    #[error("stiffness matrix of size {size} is singular")]
    SingularMatrix {
        /// Number of rows (nodes).
        size: usize,
    },

    /// A solved coordinate is NaN or infinite.
    #[error("solve produced a non-finite {axis} coordinate for node {node}")]
    NonFinite {
        /// Node whose coordinate diverged.
        node: usize,
        /// Axis name.
        axis: char,
    },

    /// A per-node gamma factor refers to a missing node.
    #[error("node {node} out of range (mesh has {node_count} nodes)")]
    NodeOutOfRange {
        /// The offending node.
        node: usize,
        /// Number of nodes in the mesh.
        node_count: usize,
    },

    /// The mesh topology is inconsistent.
    #[error("mesh topology error: {0}")]
    Topology(#[from] MeshError),
}

/// Result type for solver operations.
pub type SolverResult<T> = std::result::Result<T, SolverError>;
