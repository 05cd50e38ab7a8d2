//! Error types for mesh construction and validation.

use thiserror::Error;

/// Errors that can occur while building or validating a [`SurfaceMesh`](crate::SurfaceMesh).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MeshError {
    /// The flat position buffer is not a multiple of three.
    #[error("position buffer length {0} is not a multiple of 3")]
    InvalidPositionLength(usize),

    /// A connection or triangle references a node that does not exist.
    #[error("{element} {index} references node {node}, but the mesh only has {node_count} nodes")]
    IndexOutOfRange {
        /// Kind of element holding the bad reference.
        element: &'static str,
        /// Index of the offending element.
        index: usize,
        /// The out-of-range node index.
        node: usize,
        /// Number of nodes in the mesh.
        node_count: usize,
    },

    /// A connection joins a node to itself.
    #[error("connection {index} is degenerate: both ends are node {node}")]
    DegenerateConnection {
        /// Index of the connection.
        index: usize,
        /// The repeated node.
        node: usize,
    },

    /// A triangle repeats a node.
    #[error("triangle {index} is degenerate: {nodes:?}")]
    DegenerateTriangle {
        /// Index of the triangle.
        index: usize,
        /// The triangle's node indices.
        nodes: [usize; 3],
    },

    /// The same connection appears twice.
    #[error("duplicate connection between nodes {0} and {1}")]
    DuplicateConnection(usize, usize),

    /// The same triangle appears twice (up to cyclic rotation).
    #[error("duplicate triangle {0:?}")]
    DuplicateTriangle([usize; 3]),

    /// A triangle edge is missing from the connection list.
    #[error("triangle {triangle:?} has no connection between nodes {a} and {b}")]
    MissingEdge {
        /// Triangle node indices.
        triangle: [usize; 3],
        /// First edge node.
        a: usize,
        /// Second edge node.
        b: usize,
    },

    /// A connection borders more than two triangles.
    #[error("connection ({a}, {b}) borders {count} triangles")]
    NonManifoldEdge {
        /// First node.
        a: usize,
        /// Second node.
        b: usize,
        /// Number of bordering triangles.
        count: usize,
    },
}

/// Result type for mesh operations.
pub type MeshResult<T> = std::result::Result<T, MeshError>;
