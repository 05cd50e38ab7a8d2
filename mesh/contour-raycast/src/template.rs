//! Geodesic template spheres.

#![allow(clippy::cast_precision_loss)]

use std::f64::consts::PI;

use contour_types::{Connection, SurfaceMesh, Triangle};
use tracing::debug;

use crate::error::{RaycastError, RaycastResult};
use crate::params::{RaycastParams, SphereTemplate};
use crate::subdivide::subdivide;

/// Builds the base polyhedron of a template, with nodes on the unit sphere.
///
/// The polyhedron has a pole node on each axis end and two staggered rings of
/// `k` nodes at polar angles π/3 and 2π/3, where `k` is 5 or 6.
///
/// # Errors
///
/// Only fails if the generated topology is inconsistent, which indicates a
/// logic defect.
pub fn base_polyhedron(template: SphereTemplate) -> RaycastResult<SurfaceMesh> {
    let k = match template {
        SphereTemplate::FiveFold => 5,
        SphereTemplate::SixFold => 6,
    };
    let bottom = 2 * k + 1;
    let upper = |i: usize| 1 + i % k;
    let lower = |i: usize| 1 + k + i % k;

    let mut positions = Vec::with_capacity(3 * (bottom + 1));
    positions.extend_from_slice(&[0.0, 0.0, 1.0]);
    for i in 0..k {
        positions.extend_from_slice(&spherical(PI / 3.0, 2.0 * PI * i as f64 / k as f64));
    }
    for i in 0..k {
        positions.extend_from_slice(&spherical(
            2.0 * PI / 3.0,
            2.0 * PI * (i as f64 + 0.5) / k as f64,
        ));
    }
    positions.extend_from_slice(&[0.0, 0.0, -1.0]);

    let mut connections = Vec::with_capacity(5 * k);
    let mut triangles = Vec::with_capacity(4 * k);
    for i in 0..k {
        connections.push(Connection::new(0, upper(i)));
        connections.push(Connection::new(upper(i), upper(i + 1)));
        triangles.push(Triangle::new(0, upper(i), upper(i + 1)));
    }
    for i in 0..k {
        let (cur, next) = (lower(i), lower(i + 1));
        let (behind, forward) = (upper(i), upper(i + 1));
        connections.push(Connection::new(behind, cur));
        connections.push(Connection::new(forward, cur));
        connections.push(Connection::new(cur, next));
        connections.push(Connection::new(cur, bottom));
        triangles.push(Triangle::new(cur, forward, behind));
        triangles.push(Triangle::new(cur, next, forward));
        triangles.push(Triangle::new(cur, bottom, next));
    }

    Ok(SurfaceMesh::new(positions, connections, triangles)?)
}

/// Builds the unit template sphere described by `params`.
///
/// The base polyhedron is subdivided `params.divisions` times and every node
/// is projected back onto the unit sphere.
///
/// # Errors
///
/// Returns [`RaycastError::TooManyDivisions`] if the result would exceed
/// `params.max_triangles`.
///
/// # Example
///
/// ```
/// use contour_raycast::{template_sphere, RaycastParams};
///
/// let sphere = template_sphere(&RaycastParams::default().with_divisions(1))?;
/// assert_eq!(sphere.triangle_count(), 80);
/// assert_eq!(sphere.node_count(), 42);
/// # Ok::<(), contour_raycast::RaycastError>(())
/// ```
pub fn template_sphere(params: &RaycastParams) -> RaycastResult<SurfaceMesh> {
    let projected = params.expected_triangles();
    if projected > params.max_triangles {
        return Err(RaycastError::TooManyDivisions {
            divisions: params.divisions,
            projected,
            max: params.max_triangles,
        });
    }

    let mut mesh = base_polyhedron(params.template)?;
    for _ in 0..params.divisions {
        mesh = subdivide(&mesh)?;
    }
    for c in mesh.positions_mut().chunks_exact_mut(3) {
        let norm = (c[0] * c[0] + c[1] * c[1] + c[2] * c[2]).sqrt();
        if norm > 0.0 {
            c.iter_mut().for_each(|x| *x /= norm);
        }
    }
    debug!(
        template = ?params.template,
        divisions = params.divisions,
        nodes = mesh.node_count(),
        "built template sphere"
    );
    Ok(mesh)
}

fn spherical(phi: f64, theta: f64) -> [f64; 3] {
    [phi.sin() * theta.cos(), phi.sin() * theta.sin(), phi.cos()]
}
