//! Property-based tests for the geometric predicates.
//!
//! - Orientation flips when two face vertices are swapped
//! - Reversal flag flips both the orientation and the in-sphere answer
//! - Circumsphere center is equidistant from every vertex

use approx::assert_relative_eq;
use delaunay_history::geometry::predicates::{
    Orientation, circumsphere, face_orientation, faces_point, insphere_lifted,
};
use proptest::prelude::*;

// =============================================================================
// TEST CONFIGURATION
// =============================================================================

fn finite_coordinate() -> impl Strategy<Value = f64> {
    (-1000.0..1000.0).prop_filter("must be finite", |x: &f64| x.is_finite())
}

fn distance<const D: usize>(a: &[f64; D], b: &[f64; D]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

// =============================================================================
// ORIENTATION
// =============================================================================

proptest! {
    #[test]
    fn prop_orientation_sign_flip_2d(
        a in prop::array::uniform2(finite_coordinate()),
        b in prop::array::uniform2(finite_coordinate()),
        q in prop::array::uniform2(finite_coordinate()),
    ) {
        let forward = face_orientation(&[&a, &b], &q).unwrap();
        let backward = face_orientation(&[&b, &a], &q).unwrap();
        match forward {
            Orientation::POSITIVE => prop_assert_eq!(backward, Orientation::NEGATIVE),
            Orientation::NEGATIVE => prop_assert_eq!(backward, Orientation::POSITIVE),
            Orientation::DEGENERATE => prop_assert_eq!(backward, Orientation::DEGENERATE),
        }
    }

    #[test]
    fn prop_reversal_flips_faces_point_3d(
        a in prop::array::uniform3(finite_coordinate()),
        b in prop::array::uniform3(finite_coordinate()),
        c in prop::array::uniform3(finite_coordinate()),
        q in prop::array::uniform3(finite_coordinate()),
    ) {
        let face = [&a, &b, &c];
        prop_assume!(face_orientation(&face, &q).unwrap() != Orientation::DEGENERATE);
        let front = faces_point(&face, &q, false).unwrap();
        let back = faces_point(&face, &q, true).unwrap();
        prop_assert_ne!(front, back);
    }

    #[test]
    fn prop_vertices_are_on_their_circumsphere_3d(
        a in prop::array::uniform3(finite_coordinate()),
        b in prop::array::uniform3(finite_coordinate()),
        c in prop::array::uniform3(finite_coordinate()),
        d in prop::array::uniform3(finite_coordinate()),
    ) {
        let face = [&a, &b, &c];
        // Reject near-flat tetrahedra.
        let o = face_orientation(&face, &d).unwrap();
        prop_assume!(o != Orientation::DEGENERATE);
        let sphere = circumsphere(&[&a, &b, &c, &d]).unwrap();
        prop_assume!(sphere.radius.is_finite() && sphere.radius < 1e5);
        for v in [&a, &b, &c, &d] {
            assert_relative_eq!(distance(v, &sphere.center), sphere.radius, max_relative = 1e-6);
        }
    }

    #[test]
    fn prop_center_is_inside_own_circumsphere_2d(
        a in prop::array::uniform2(finite_coordinate()),
        b in prop::array::uniform2(finite_coordinate()),
        c in prop::array::uniform2(finite_coordinate()),
    ) {
        prop_assume!(face_orientation(&[&a, &b], &c).unwrap() == Orientation::POSITIVE);
        let sphere = circumsphere(&[&a, &b, &c]).unwrap();
        prop_assume!(sphere.radius.is_finite() && sphere.radius < 1e5);
        // The face [a, b] faces c, so the unreversed test applies.
        prop_assert!(insphere_lifted(&[&a, &b, &c], &sphere.center, false).unwrap());
        prop_assert!(!insphere_lifted(&[&a, &b, &c], &sphere.center, true).unwrap());
    }
}
