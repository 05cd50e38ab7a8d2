//! Error types for external energies.

use contour_pathfind::PathError;
use thiserror::Error;

/// Errors that can occur while building image volumes or energies.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EnergyError {
    /// The voxel buffer does not match the volume dimensions.
    #[error("volume data length {actual} doesn't match dimensions (expected {expected})")]
    DimensionMismatch {
        /// `width * height * depth`.
        expected: usize,
        /// Length of the supplied buffer.
        actual: usize,
    },

    /// A volume dimension is zero.
    #[error("volume dimensions must be positive")]
    EmptyVolume,

    /// A pixel size is zero, negative or not finite.
    #[error("invalid pixel size {value} along {axis}")]
    InvalidCalibration {
        /// Axis name.
        axis: char,
        /// Offending pixel size.
        value: f64,
    },

    /// An energy refers to a node the mesh does not have.
    #[error("node {node} out of range (mesh has {node_count} nodes)")]
    NodeOutOfRange {
        /// The offending node.
        node: usize,
        /// Number of nodes in the mesh.
        node_count: usize,
    },

    /// Mapping a curve onto the mesh failed.
    #[error("curve mapping failed: {0}")]
    Path(#[from] PathError),
}

/// Result type for energy operations.
pub type EnergyResult<T> = std::result::Result<T, EnergyError>;
