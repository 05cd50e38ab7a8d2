//! Property-based tests for the surface mesh container.
//!
//! Run with: cargo test -p contour-types -- proptest

#![allow(clippy::unwrap_used)]

use contour_types::{SurfaceMesh, UnitQuaternion, Vector3, block};
use proptest::prelude::*;

fn arb_dimension() -> impl Strategy<Value = f64> {
    0.1..10.0f64
}

fn arb_offset() -> impl Strategy<Value = Vector3<f64>> {
    prop::array::uniform3(-50.0..50.0f64).prop_map(|[x, y, z]| Vector3::new(x, y, z))
}

fn arb_rotation() -> impl Strategy<Value = UnitQuaternion<f64>> {
    prop::array::uniform3(-3.0..3.0f64)
        .prop_map(|[r, p, y]| UnitQuaternion::from_euler_angles(r, p, y))
}

proptest! {
    #[test]
    fn proptest_block_volume_is_rigid_invariant(
        w in arb_dimension(),
        h in arb_dimension(),
        d in arb_dimension(),
        offset in arb_offset(),
        rotation in arb_rotation(),
    ) {
        let mut mesh = block(w, h, d);
        let expected = w * h * d;
        mesh.translate(&offset);
        let center = mesh.centroid();
        mesh.rotate_about(&center, &rotation);

        let tolerance = 1e-9 * (1.0 + expected + offset.norm().powi(3));
        prop_assert!((mesh.signed_volume() - expected).abs() < tolerance);
        for axis in [Vector3::x(), Vector3::y(), Vector3::z()] {
            prop_assert!((mesh.volume_along(&axis) - expected).abs() < tolerance);
        }
    }

    #[test]
    fn proptest_arrays_round_trip(
        w in arb_dimension(),
        offset in arb_offset(),
    ) {
        let mut mesh = block(w, 1.0, 2.0);
        mesh.translate(&offset);
        let rebuilt = SurfaceMesh::from_arrays(
            mesh.positions().to_vec(),
            &mesh.connection_array(),
            &mesh.triangle_array(),
        )
        .unwrap();
        prop_assert_eq!(rebuilt, mesh);
    }
}
