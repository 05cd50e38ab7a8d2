//! Projecting template nodes onto target surfaces.

use contour_types::SurfaceMesh;
use nalgebra::{Point3, Vector3};
use rayon::prelude::*;
use tracing::{debug, warn};

use crate::error::{RaycastError, RaycastResult};
use crate::intersectable::Intersectable;
use crate::params::RaycastParams;
use crate::ray::{Intersection, Ray};
use crate::template::template_sphere;

/// Furthest forward-facing hit along `ray`.
///
/// A hit qualifies when it lies on or ahead of the origin and its normal
/// points along the ray, i.e. the ray is leaving the surface there. Returns
/// [`Intersection::infinite`] when no hit qualifies.
///
/// # Example
///
/// ```
/// use contour_raycast::{furthest_exit, Intersectable, Ray, Sphere};
/// use nalgebra::{Point3, Vector3};
///
/// let sphere = Sphere::new(Point3::origin(), 2.0)?;
/// let ray = Ray::new(Point3::origin(), Vector3::x());
/// let hit = furthest_exit(&sphere.intersections(&ray), &ray);
/// assert!((hit.location.x - 2.0).abs() < 1e-12);
/// # Ok::<(), contour_raycast::RaycastError>(())
/// ```
#[must_use]
pub fn furthest_exit(hits: &[Intersection], ray: &Ray) -> Intersection {
    let mut best = Intersection::infinite();
    let mut best_distance = f64::NEG_INFINITY;
    for hit in hits {
        let distance = ray.signed_distance(&hit.location);
        if distance >= 0.0 && ray.direction.dot(&hit.normal) > 0.0 && distance >= best_distance {
            best = *hit;
            best_distance = distance;
        }
    }
    best
}

/// Nearest of the per-target furthest exits.
///
/// Each target contributes its own [`furthest_exit`]; the closest of those to
/// the ray origin wins, so inner surfaces take precedence over outer ones.
#[must_use]
pub fn nearest_exit(targets: &[&dyn Intersectable], ray: &Ray) -> Intersection {
    let mut best = Intersection::infinite();
    let mut best_distance = f64::INFINITY;
    for target in targets {
        let hit = furthest_exit(&target.intersections(ray), ray);
        if !hit.is_finite() {
            continue;
        }
        let distance = (hit.location - ray.origin).norm();
        if distance < best_distance {
            best = hit;
            best_distance = distance;
        }
    }
    best
}

/// Moves every node of `mesh` onto the targets along the ray from `origin`
/// through the node.
///
/// Nodes without a qualifying hit, including nodes sitting on the origin, are
/// set to `+∞` in every coordinate. Returns the number of such nodes.
pub fn project_nodes(
    mesh: &mut SurfaceMesh,
    targets: &[&dyn Intersectable],
    origin: &Point3<f64>,
) -> usize {
    let directions: Vec<Vector3<f64>> = mesh.points().iter().map(|p| p - origin).collect();
    project_along(mesh, targets, origin, &directions)
}

/// Builds a mesh by casting the template sphere from `origin` onto `target`.
///
/// # Errors
///
/// Fails if the template cannot be built with `params`.
///
/// # Example
///
/// ```
/// use contour_raycast::{ray_cast_mesh, RaycastParams, Sphere};
/// use nalgebra::Point3;
///
/// let target = Sphere::new(Point3::new(1.0, 0.0, 0.0), 0.5)?;
/// let mesh = ray_cast_mesh(&target, &Point3::new(1.0, 0.0, 0.0), &RaycastParams::coarse())?;
/// for p in mesh.points() {
///     assert!(((p - Point3::new(1.0, 0.0, 0.0)).norm() - 0.5).abs() < 1e-9);
/// }
/// # Ok::<(), contour_raycast::RaycastError>(())
/// ```
pub fn ray_cast_mesh(
    target: &dyn Intersectable,
    origin: &Point3<f64>,
    params: &RaycastParams,
) -> RaycastResult<SurfaceMesh> {
    ray_cast_composite(&[target], origin, params)
}

/// Builds a mesh by casting the template sphere onto several targets.
///
/// For each node the nearest per-target exit wins.
///
/// # Errors
///
/// Returns [`RaycastError::NoTargets`] for an empty target list, or fails if
/// the template cannot be built with `params`.
pub fn ray_cast_composite(
    targets: &[&dyn Intersectable],
    origin: &Point3<f64>,
    params: &RaycastParams,
) -> RaycastResult<SurfaceMesh> {
    if targets.is_empty() {
        return Err(RaycastError::NoTargets);
    }
    let mut mesh = template_sphere(params)?;
    let directions: Vec<Vector3<f64>> = mesh.points().iter().map(|p| p.coords).collect();
    project_along(&mut mesh, targets, origin, &directions);
    Ok(mesh)
}

fn project_along(
    mesh: &mut SurfaceMesh,
    targets: &[&dyn Intersectable],
    origin: &Point3<f64>,
    directions: &[Vector3<f64>],
) -> usize {
    let hits: Vec<Intersection> = directions
        .par_iter()
        .map(|dir| {
            if dir.norm_squared() == 0.0 {
                return Intersection::infinite();
            }
            nearest_exit(targets, &Ray::new(*origin, dir.normalize()))
        })
        .collect();

    let mut unresolved = 0;
    for (i, hit) in hits.iter().enumerate() {
        if !hit.is_finite() {
            unresolved += 1;
        }
        mesh.set_position(i, &hit.location);
    }
    if unresolved > 0 {
        warn!(unresolved, "ray cast left nodes without a surface hit");
    } else {
        debug!(nodes = hits.len(), targets = targets.len(), "ray cast complete");
    }
    unresolved
}
