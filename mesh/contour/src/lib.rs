//! Active-contour mesh deformation for volumetric microscopy.
//!
//! A closed triangle mesh is grown inside an image volume and relaxed under
//! internal elastic forces and external energies until it hugs the
//! structure of interest. This crate re-exports the `contour-*` crates under
//! one roof.
//!
//! # Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use std::sync::atomic::AtomicBool;
//!
//! use contour::prelude::*;
//!
//! // A bright ball in a 32³ volume.
//! let volume = ImageVolume::from_fn(32, 32, 32, ImageCalibration::isotropic(1.0), |p| {
//!     if p.coords.norm() < 0.3 { 1.0 } else { 0.0 }
//! })?;
//!
//! // Start from a small sphere and let the image pull it outward.
//! let mut start = contour::raycast::template_sphere(&RaycastParams::coarse())?;
//! start.scale_about(&Point3::origin(), 0.2);
//!
//! let mut deformable = DeformableMesh::new(start, Coefficients::default());
//! deformable.add_energy(Box::new(ImageEnergy::perpendicular_intensity(Arc::new(volume), 5.0)));
//!
//! let pool = rayon::ThreadPoolBuilder::new().num_threads(3).build().unwrap();
//! let stats = deformable.run_until(&pool, &AtomicBool::new(false), Some(5))?;
//! assert_eq!(stats.steps, 5);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Module Organization
//!
//! - [`types`] - Nodes, connections, triangles and the
//!   [`SurfaceMesh`](types::SurfaceMesh) container
//! - [`raycast`] - Ray intersection, containment and ray-cast mesh construction
//! - [`remesh`] - Edge-length banded split/collapse remeshing
//! - [`curvature`] - Pairwise and cotangent curvature estimates
//! - [`pathfind`] - A* over mesh connections and curve mapping
//! - [`energy`] - Image volumes and external energies
//! - [`solver`] - The implicit stiffness solve
//!
//! # Feature Flags
//!
//! - `serde` - Serialize meshes and parameter structs

// Safety: Deny unwrap/expect in library code. Tests may use them (workspace warns).
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

/// Mesh primitives and the surface mesh container.
pub use contour_types as types;

/// Ray casting, intersectable surfaces and template spheres.
pub use contour_raycast as raycast;

/// Adaptive edge-length remeshing.
pub use contour_remesh as remesh;

/// Discrete curvature and node normals.
pub use contour_curvature as curvature;

/// Mesh-graph pathfinding and curve mapping.
pub use contour_pathfind as pathfind;

/// Image volumes and external energies.
pub use contour_energy as energy;

/// Stiffness assembly and the deformation step.
pub use contour_solver as solver;

/// Common imports for building and deforming meshes.
///
/// ```
/// use contour::prelude::*;
/// ```
pub mod prelude {
    pub use contour_types::{
        Connection, MeshTopology, Point3, SurfaceMesh, Triangle, Vector3, block,
    };

    pub use contour_raycast::{Intersectable, RaycastParams, ray_cast_mesh};

    pub use contour_remesh::{RemeshParams, remesh};

    pub use contour_energy::{ExternalEnergy, ImageCalibration, ImageEnergy, ImageVolume};

    pub use contour_solver::{Coefficients, DeformableMesh};
}
