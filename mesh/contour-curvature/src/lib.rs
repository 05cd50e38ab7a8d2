//! Discrete curvature for triangle surfaces.
//!
//! Two estimators are provided:
//!
//! - [`node_curvatures`] - Signed scalar curvature from pairs of neighbouring
//!   triangles, weighted by triangle area. Used to report and color meshes.
//! - [`mean_curvatures`] - Cotangent mean curvature normal with mixed
//!   Voronoi areas. Used as a smoothing force.
//!
//! Both are positive on convex surfaces whose triangles wind outward.
//!
//! # Example
//!
//! ```
//! use contour_curvature::{mean_curvatures, node_curvatures, node_normals};
//! use contour_types::block;
//!
//! let mesh = block(1.0, 2.0, 3.0);
//! let normals = node_normals(&mesh);
//! let pairwise = node_curvatures(&mesh);
//! let mean = mean_curvatures(&mesh);
//!
//! assert_eq!(normals.len(), mesh.node_count());
//! assert!(pairwise.iter().all(|&k| k > 0.0));
//! assert!(mean.iter().all(|s| s.mixed_area > 0.0));
//! ```

// Safety: Deny unwrap/expect in library code. Tests may use them (workspace warns).
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]

mod cotangent;
mod normals;
mod pairwise;

pub use cotangent::{MeanCurvature, mean_curvatures, mean_curvatures_with, node_mean_curvature};
pub use normals::{node_normals, node_normals_with};
pub use pairwise::{node_curvatures, node_curvatures_with};
