//! Error types for adaptive remeshing.

use contour_types::MeshError;
use thiserror::Error;

/// Errors that can occur during remeshing.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RemeshError {
    /// Mesh has no triangles.
    #[error("Mesh has no triangles")]
    NoTriangles,

    /// The length band is empty or not positive.
    #[error("Invalid length band: min {min}, max {max} (need 0 < min < max)")]
    InvalidLengths {
        /// Requested minimum length.
        min: f64,
        /// Requested maximum length.
        max: f64,
    },

    /// Invalid pass limit.
    #[error("Invalid pass limit: {0} (must be >= 1)")]
    InvalidPasses(u32),

    /// An edge length is NaN or infinite.
    #[error("Connection ({a}, {b}) has non-finite length")]
    NonFiniteLength {
        /// First node.
        a: usize,
        /// Second node.
        b: usize,
    },

    /// The adjacency maps became inconsistent. This is a logic defect, not an
    /// input problem.
    #[error("Remesh topology corrupted: {0}")]
    Topology(String),

    /// The remeshed arrays failed mesh validation.
    #[error("Mesh error: {0}")]
    Mesh(#[from] MeshError),
}

/// Result type for remeshing operations.
pub type RemeshResult<T> = std::result::Result<T, RemeshError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RemeshError::NoTriangles;
        assert_eq!(format!("{err}"), "Mesh has no triangles");

        let err = RemeshError::InvalidLengths { min: 0.5, max: 0.1 };
        let display = format!("{err}");
        assert!(display.contains("0.5"));
        assert!(display.contains("0.1"));

        let err = RemeshError::NonFiniteLength { a: 3, b: 9 };
        assert!(format!("{err}").contains("(3, 9)"));
    }
}
