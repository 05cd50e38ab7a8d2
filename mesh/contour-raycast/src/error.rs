//! Error types for ray casting.

use contour_types::MeshError;
use thiserror::Error;

/// Errors that can occur while building meshes by ray casting.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RaycastError {
    /// The generated or input mesh violated a mesh invariant.
    #[error("mesh error: {0}")]
    Mesh(#[from] MeshError),

    /// No target surface was supplied.
    #[error("at least one target surface is required")]
    NoTargets,

    /// The requested subdivision would produce too many triangles.
    #[error("{divisions} subdivisions would produce {projected} triangles (max {max})")]
    TooManyDivisions {
        /// Requested subdivision count.
        divisions: u32,
        /// Triangle count the template would reach.
        projected: usize,
        /// Configured limit.
        max: usize,
    },

    /// A sphere was given a non-positive or non-finite radius.
    #[error("invalid sphere radius {0}")]
    InvalidRadius(f64),
}

/// Result type for ray casting operations.
pub type RaycastResult<T> = std::result::Result<T, RaycastError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RaycastError::TooManyDivisions {
            divisions: 9,
            projected: 5_242_880,
            max: 1_000_000,
        };
        let display = format!("{err}");
        assert!(display.contains('9'));
        assert!(display.contains("5242880"));

        let err = RaycastError::from(MeshError::InvalidPositionLength(4));
        assert!(format!("{err}").starts_with("mesh error"));
    }
}
