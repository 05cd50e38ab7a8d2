//! Error types for mesh pathfinding.

use thiserror::Error;

/// Errors that can occur while searching the connection graph.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum PathError {
    /// A start or goal node does not exist.
    #[error("node {node} out of range (mesh has {node_count} nodes)")]
    NodeOutOfRange {
        /// The offending node index.
        node: usize,
        /// Number of nodes in the mesh.
        node_count: usize,
    },

    /// The goal cannot be reached from the start through connections.
    #[error("no path from node {start} to node {goal}")]
    NoPathFound {
        /// Start node.
        start: usize,
        /// Goal node.
        goal: usize,
    },

    /// A curve with no points was supplied for mapping.
    #[error("curve has no points")]
    EmptyCurve,

    /// The mesh has no nodes to map onto.
    #[error("mesh has no nodes")]
    EmptyMesh,

    /// A node coordinate is NaN or infinite.
    #[error("non-finite coordinate at node {0}")]
    NonFinitePosition(usize),

    /// A curve point coordinate is NaN or infinite.
    #[error("non-finite coordinate at curve point {0}")]
    NonFiniteCurvePoint(usize),
}

/// Result type for pathfinding operations.
pub type PathResult<T> = std::result::Result<T, PathError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PathError::NoPathFound { start: 3, goal: 17 };
        let display = format!("{err}");
        assert!(display.contains('3'));
        assert!(display.contains("17"));

        let err = PathError::NodeOutOfRange {
            node: 12,
            node_count: 8,
        };
        assert!(format!("{err}").contains("8 nodes"));
    }
}
