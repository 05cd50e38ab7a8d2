//! Adaptive remeshing for deforming surfaces.
//!
//! As a contour mesh deforms, its triangles stretch and shrink. This crate
//! restores a target edge-length band with local surgery:
//!
//! - **Split**: connections longer than `max_length` get a midpoint node and
//!   each bordering triangle is replaced by two, keeping its winding
//! - **Collapse**: connections shorter than `min_length` merge their second
//!   endpoint into the first, unless that would pinch the surface or leave a
//!   node with too few connections
//!
//! The input must be an orientable 2-manifold, possibly with boundary.
//!
//! # Example
//!
//! ```
//! use contour_remesh::{remesh, RemeshParams};
//! use contour_types::block;
//!
//! let params = RemeshParams::with_band(0.2, 0.45);
//! let result = remesh(&block(1.0, 1.0, 1.0), &params)?;
//!
//! assert!(result.mesh.is_closed());
//! println!(
//!     "{} splits, {} collapses, {} skipped",
//!     result.splits_performed,
//!     result.collapses_performed,
//!     result.ineligible.len()
//! );
//! # Ok::<(), contour_remesh::RemeshError>(())
//! ```

// Safety: Deny unwrap/expect in library code. Tests may use them (workspace warns).
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]

mod error;
mod params;
mod remesh;
mod result;

pub use error::{RemeshError, RemeshResult};
pub use params::RemeshParams;
pub use remesh::remesh;
pub use result::{EdgeStatistics, RemeshOutput};
