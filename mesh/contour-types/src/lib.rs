//! Mesh primitives for active-contour deformation.
//!
//! This crate provides the data model shared by every contour crate:
//!
//! - Nodes are `usize` indices into a flat `x, y, z` position buffer
//! - [`Connection`] - An undirected edge, equal regardless of endpoint order
//! - [`Triangle`] - An oriented triangle, equal under cyclic rotation
//! - [`SurfaceMesh`] - Owns the position buffer and the element lists
//! - [`MeshTopology`] - Node, connection and triangle adjacency maps
//!
//! # Coordinate System
//!
//! Meshes normally live in normalized coordinates where the longest axis of
//! the source image volume spans one unit. Triangle winding is
//! **counter-clockwise (CCW) when viewed from outside**, so normals point
//! outward by the right-hand rule.
//!
//! # Example
//!
//! ```
//! use contour_types::{block, MeshTopology, Vector3};
//!
//! let mesh = block(1.0, 1.0, 1.0);
//! assert_eq!(mesh.node_count(), 8);
//! assert!((mesh.volume_along(&Vector3::z()) - 1.0).abs() < 1e-12);
//!
//! let topology = MeshTopology::new(&mesh);
//! assert_eq!(topology.node_triangles(0).len(), 5);
//! ```

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]

mod block;
mod bounds;
mod error;
mod mesh;
mod primitives;
mod topology;

pub use block::block;
pub use bounds::Bounds;
pub use error::{MeshError, MeshResult};
pub use mesh::SurfaceMesh;
pub use primitives::{Connection, Triangle, TriangleGeometry, node_position};
pub use topology::MeshTopology;

// Re-export nalgebra types for convenience
pub use nalgebra::{Point3, UnitQuaternion, Vector3};
