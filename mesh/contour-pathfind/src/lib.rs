//! Shortest paths over mesh connections.
//!
//! The connection graph of a [`SurfaceMesh`](contour_types::SurfaceMesh) is
//! searched with A*, using connection lengths as costs and straight-line
//! distance as the heuristic. On top of that, [`map_curve`] lays an external
//! polyline onto the mesh so that curve-following energies know which node
//! should move where.
//!
//! # Example
//!
//! ```
//! use contour_pathfind::{find_path, map_curve};
//! use contour_types::{block, Point3};
//!
//! let mesh = block(1.0, 1.0, 1.0);
//! let path = find_path(&mesh, 0, 6)?;
//! assert_eq!(path.hops(), 2);
//!
//! let curve = [mesh.position(0), mesh.position(6)];
//! let mapping = map_curve(&mesh, &curve, false)?;
//! assert_eq!(mapping.path().len(), 3);
//! # Ok::<(), contour_pathfind::PathError>(())
//! ```

// Safety: Deny unwrap/expect in library code. Tests may use them (workspace warns).
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]

mod astar;
mod error;
mod mapping;

pub use astar::{MeshPath, MeshPathFinder, find_path};
pub use error::{PathError, PathResult};
pub use mapping::{CurveMapping, map_curve};
