//! Ray casting and mesh construction for active contours.
//!
//! This crate answers two questions about closed surfaces: where does a ray
//! cross them, and is a point inside. On top of that it builds starting
//! meshes by casting a geodesic template sphere outward onto a target.
//!
//! # Targets
//!
//! Anything implementing [`Intersectable`]:
//!
//! - [`InterceptingMesh`] - A snapshot of a triangle mesh
//! - [`Sphere`] and [`AxisBox`] - Analytic shapes
//! - [`Composite`] - A union of other targets
//!
//! # Example
//!
//! ```
//! use contour_raycast::{ray_cast_mesh, InterceptingMesh, Intersectable, RaycastParams, Sphere};
//! use nalgebra::Point3;
//!
//! let target = Sphere::new(Point3::origin(), 1.0)?;
//! let mesh = ray_cast_mesh(&target, &Point3::origin(), &RaycastParams::default())?;
//! assert_eq!(mesh.triangle_count(), 320);
//!
//! let snapshot = InterceptingMesh::new(&mesh);
//! assert!(snapshot.contains(&Point3::origin()));
//! # Ok::<(), contour_raycast::RaycastError>(())
//! ```

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]

mod cast;
mod error;
mod intersectable;
mod mesh_target;
mod params;
mod ray;
mod shapes;
mod subdivide;
mod template;
mod triangle;

pub use cast::{furthest_exit, nearest_exit, project_nodes, ray_cast_composite, ray_cast_mesh};
pub use error::{RaycastError, RaycastResult};
pub use intersectable::{Composite, Intersectable};
pub use mesh_target::InterceptingMesh;
pub use params::{RaycastParams, SphereTemplate};
pub use ray::{Intersection, Ray};
pub use shapes::{AxisBox, Sphere};
pub use subdivide::subdivide;
pub use template::{base_polyhedron, template_sphere};
pub use triangle::{EDGE_TOLERANCE, InterceptingTriangle};
