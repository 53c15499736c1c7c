//! Geometric predicates for d-dimensional geometry calculations.
//!
//! Every topological decision of the history construction routes through two
//! sign tests:
//!
//! - [`face_orientation`]: sign of the D×D determinant with rows
//!   `vertex − q` over the D vertices of a face.
//! - [`insphere_lifted`]: sign of the (D+1)×(D+1) determinant with rows
//!   `(vertex − q, |vertex − q|²)` over the D+1 vertices of a simplex.
//!
//! Both are evaluated in plain `f64` arithmetic. The circumsphere helpers are
//! only used for alpha-shape bookkeeping.

use la_stack::{DEFAULT_PIVOT_TOL, LaError, Vector as LaVector};
use serde::{Deserialize, Serialize};

use crate::core::collections::SmallBuffer;
use crate::geometry::matrix::{Matrix, MatrixError, determinant, matrix_set};

/// Row-major scratch space for predicate matrices. Inline up to a 5×5
/// lifted matrix (D = 4).
type PredicateMatrix = SmallBuffer<f64, 25>;

/// Represents the orientation of a point relative to an oriented face.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// The determinant is negative.
    NEGATIVE,
    /// The point lies on the supporting hyperplane (determinant exactly zero).
    DEGENERATE,
    /// The determinant is positive.
    POSITIVE,
}

impl Orientation {
    fn from_determinant(det: f64) -> Self {
        if det > 0.0 {
            Self::POSITIVE
        } else if det < 0.0 {
            Self::NEGATIVE
        } else {
            Self::DEGENERATE
        }
    }
}

impl std::fmt::Display for Orientation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NEGATIVE => write!(f, "NEGATIVE"),
            Self::DEGENERATE => write!(f, "DEGENERATE"),
            Self::POSITIVE => write!(f, "POSITIVE"),
        }
    }
}

/// Orientation of `q` relative to the face spanned by `face` (D vertices, in
/// stored order).
///
/// # Errors
///
/// Returns a [`MatrixError`] if the face does not have exactly D vertices or
/// the determinant size cannot be dispatched.
///
/// # Examples
///
/// ```rust
/// use delaunay_history::geometry::predicates::{face_orientation, Orientation};
///
/// let face = [[0.0, 0.0], [1.0, 0.0]];
/// let o = face_orientation(&[&face[0], &face[1]], &[0.0, 1.0]).unwrap();
/// assert_eq!(o, Orientation::POSITIVE);
/// ```
pub fn face_orientation<const D: usize>(
    face: &[&[f64; D]],
    q: &[f64; D],
) -> Result<Orientation, MatrixError> {
    let mut entries = PredicateMatrix::new();
    for vertex in face {
        for axis in 0..D {
            entries.push(vertex[axis] - q[axis]);
        }
    }
    determinant(&entries, face.len()).map(Orientation::from_determinant)
}

/// Whether an oriented face faces `q`: positive orientation XOR the reversal
/// flag of the half-face.
///
/// # Errors
///
/// See [`face_orientation`].
pub fn faces_point<const D: usize>(
    face: &[&[f64; D]],
    q: &[f64; D],
    is_reverse: bool,
) -> Result<bool, MatrixError> {
    Ok(is_reverse ^ (face_orientation(face, q)? == Orientation::POSITIVE))
}

/// Lifted in-sphere test: whether `q` lies strictly inside the circumsphere
/// of `simplex` (the D face vertices followed by the top vertex), assuming
/// the face, with the given reversal flag, faces the top vertex.
///
/// # Errors
///
/// Returns a [`MatrixError`] if `simplex` does not hold D+1 vertices or the
/// determinant size cannot be dispatched.
///
/// # Examples
///
/// ```rust
/// use delaunay_history::geometry::predicates::insphere_lifted;
///
/// let (a, b, c) = ([0.0, 0.0], [1.0, 0.0], [0.0, 1.0]);
/// assert!(insphere_lifted(&[&a, &b, &c], &[0.25, 0.25], false).unwrap());
/// assert!(!insphere_lifted(&[&a, &b, &c], &[2.0, 2.0], false).unwrap());
/// ```
pub fn insphere_lifted<const D: usize>(
    simplex: &[&[f64; D]],
    q: &[f64; D],
    is_reverse: bool,
) -> Result<bool, MatrixError> {
    let n = D + 1;
    if simplex.len() != n {
        return Err(MatrixError::ShapeMismatch {
            expected: n * n,
            actual: simplex.len() * n,
        });
    }
    let mut entries = PredicateMatrix::new();
    for vertex in simplex {
        let mut square_sum = 0.0;
        for axis in 0..D {
            let diff = vertex[axis] - q[axis];
            entries.push(diff);
            square_sum += diff * diff;
        }
        entries.push(square_sum);
    }
    Ok(is_reverse ^ (determinant(&entries, n)? > 0.0))
}

// =============================================================================
// CIRCUMSPHERE
// =============================================================================

/// Center and radius of the circumsphere of a D-simplex.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CircumsphereRepr", into = "CircumsphereRepr")]
pub struct Circumsphere<const D: usize> {
    /// Circumcenter coordinates.
    pub center: [f64; D],
    /// Distance from the center to every vertex.
    pub radius: f64,
}

#[derive(Serialize, Deserialize)]
struct CircumsphereRepr {
    center: Vec<f64>,
    radius: f64,
}

impl<const D: usize> From<Circumsphere<D>> for CircumsphereRepr {
    fn from(c: Circumsphere<D>) -> Self {
        Self {
            center: c.center.to_vec(),
            radius: c.radius,
        }
    }
}

impl<const D: usize> TryFrom<CircumsphereRepr> for Circumsphere<D> {
    type Error = String;

    fn try_from(repr: CircumsphereRepr) -> Result<Self, Self::Error> {
        let len = repr.center.len();
        let center: [f64; D] = repr
            .center
            .try_into()
            .map_err(|_| format!("expected {D} center coordinates, got {len}"))?;
        Ok(Self {
            center,
            radius: repr.radius,
        })
    }
}

/// Circumsphere of the simplex spanned by D+1 vertices.
///
/// Solves `2(vᵢ − v₀)·c' = |vᵢ − v₀|²` for the offset `c'` of the center
/// from `v₀` with a stack-allocated LU factorization.
///
/// # Errors
///
/// Returns [`MatrixError::ShapeMismatch`] if `simplex` does not hold D+1
/// vertices and [`MatrixError::La`] when the simplex is degenerate.
///
/// # Examples
///
/// ```rust
/// use delaunay_history::geometry::predicates::circumsphere;
///
/// let (a, b, c) = ([0.0, 0.0], [2.0, 0.0], [0.0, 2.0]);
/// let sphere = circumsphere(&[&a, &b, &c]).unwrap();
/// assert!((sphere.center[0] - 1.0).abs() < 1e-12);
/// assert!((sphere.radius - 2.0_f64.sqrt()).abs() < 1e-12);
/// ```
pub fn circumsphere<const D: usize>(
    simplex: &[&[f64; D]],
) -> Result<Circumsphere<D>, MatrixError> {
    if simplex.len() != D + 1 {
        return Err(MatrixError::ShapeMismatch {
            expected: D + 1,
            actual: simplex.len(),
        });
    }
    let origin = simplex[0];
    let mut a = Matrix::<D>::zero();
    let mut b = [0.0f64; D];
    for (row, vertex) in simplex[1..].iter().enumerate() {
        let mut square_sum = 0.0;
        for axis in 0..D {
            let diff = vertex[axis] - origin[axis];
            matrix_set(&mut a, row, axis, diff);
            square_sum += diff * diff;
        }
        b[row] = square_sum;
    }

    let lu = match a.lu(DEFAULT_PIVOT_TOL) {
        Ok(lu) => lu,
        Err(LaError::Singular { .. }) => a.lu(0.0)?,
        Err(e) => return Err(e.into()),
    };
    let x = lu.solve_vec(LaVector::<D>::new(b))?.into_array();

    let mut center = [0.0f64; D];
    let mut radius_sq = 0.0;
    for axis in 0..D {
        let offset = 0.5 * x[axis];
        center[axis] = origin[axis] + offset;
        radius_sq += offset * offset;
    }
    Ok(Circumsphere {
        center,
        radius: radius_sq.sqrt(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    #[test]
    fn test_orientation_sign_flips_with_vertex_order() {
        let (a, b) = ([0.0, 0.0], [1.0, 0.0]);
        let q = [0.3, 0.7];
        assert_eq!(
            face_orientation(&[&a, &b], &q).unwrap(),
            Orientation::POSITIVE
        );
        assert_eq!(
            face_orientation(&[&b, &a], &q).unwrap(),
            Orientation::NEGATIVE
        );
        assert_eq!(
            face_orientation(&[&a, &b], &[5.0, 0.0]).unwrap(),
            Orientation::DEGENERATE
        );
    }

    #[test]
    fn test_faces_point_respects_reversal() {
        let (a, b, c) = ([0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]);
        let above = [0.2, 0.2, 1.0];
        let below = [0.2, 0.2, -1.0];
        let front = faces_point(&[&a, &b, &c], &above, false).unwrap();
        assert_ne!(front, faces_point(&[&a, &b, &c], &below, false).unwrap());
        assert_ne!(front, faces_point(&[&a, &b, &c], &above, true).unwrap());
    }

    #[test]
    fn test_insphere_lifted_3d() {
        let a = [0.0, 0.0, 0.0];
        let b = [1.0, 0.0, 0.0];
        let c = [0.0, 1.0, 0.0];
        let top = [0.0, 0.0, 1.0];
        // Orient the base so that it faces the top vertex.
        let reversed = !faces_point(&[&a, &b, &c], &top, false).unwrap();
        let inside = [0.25, 0.25, 0.25];
        let outside = [2.0, 2.0, 2.0];
        assert!(insphere_lifted(&[&a, &b, &c, &top], &inside, reversed).unwrap());
        assert!(!insphere_lifted(&[&a, &b, &c, &top], &outside, reversed).unwrap());
    }

    #[test]
    fn test_insphere_lifted_rejects_wrong_vertex_count() {
        let a = [0.0, 0.0];
        let res = insphere_lifted(&[&a, &a], &[1.0, 1.0], false);
        assert!(matches!(res, Err(MatrixError::ShapeMismatch { .. })));
    }

    #[test]
    fn test_circumsphere_unit_tetrahedron() {
        let a = [0.0, 0.0, 0.0];
        let b = [1.0, 0.0, 0.0];
        let c = [0.0, 1.0, 0.0];
        let d = [0.0, 0.0, 1.0];
        let sphere = circumsphere(&[&a, &b, &c, &d]).unwrap();
        for axis in 0..3 {
            assert_relative_eq!(sphere.center[axis], 0.5, epsilon = 1e-12);
        }
        assert_relative_eq!(sphere.radius, 0.75_f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_circumsphere_degenerate_is_error() {
        let a = [0.0, 0.0];
        let b = [1.0, 1.0];
        let c = [2.0, 2.0];
        assert!(circumsphere(&[&a, &b, &c]).is_err());
    }
}
