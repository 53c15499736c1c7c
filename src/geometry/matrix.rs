//! Matrix operations.
//!
//! This module provides the small, stack-allocated determinant helpers used by
//! the orientation and lifted in-sphere predicates. Matrices are passed as
//! row-major slices of length `n * n`.

#![forbid(unsafe_code)]

use la_stack::{LaError, Matrix as LaMatrix};
use thiserror::Error;

/// Stack-matrix dispatch limit.
///
/// The predicates build matrices of size D×D (orientation) and (D+1)×(D+1)
/// (lifted in-sphere), so `MAX_STACK_MATRIX_DIM = 18` supports up to `D = 17`.
pub const MAX_STACK_MATRIX_DIM: usize = 18;

/// Largest matrix size handled by the closed-form cofactor expansion.
pub const MAX_CLOSED_FORM_DIM: usize = 4;

/// Internal linear algebra matrix type used by this crate for fixed-size operations.
pub type Matrix<const D: usize> = LaMatrix<D>;

/// Error type for stack-matrix dispatch.
///
/// # Examples
///
/// ```rust
/// use delaunay_history::geometry::matrix::MatrixError;
///
/// let err = MatrixError::UnsupportedDim { k: 20, max: 18 };
/// assert_eq!(err.to_string(), "unsupported stack matrix size: 20 (max 18)");
/// ```
#[derive(Clone, Debug, Error, PartialEq)]
pub enum MatrixError {
    /// The requested matrix size is not supported by the stack-matrix dispatcher.
    #[error("unsupported stack matrix size: {k} (max {max})")]
    UnsupportedDim {
        /// Requested matrix dimension.
        k: usize,
        /// Maximum supported matrix dimension.
        max: usize,
    },
    /// The row-major input does not hold `n * n` entries.
    #[error("expected {expected} matrix entries, got {actual}")]
    ShapeMismatch {
        /// Number of entries required.
        expected: usize,
        /// Number of entries supplied.
        actual: usize,
    },
    /// A linear algebra error originating from `la-stack`.
    #[error("linear algebra failure: {details}")]
    La {
        /// Rendered `la-stack` error.
        details: String,
    },
}

impl From<LaError> for MatrixError {
    fn from(err: LaError) -> Self {
        Self::La {
            details: err.to_string(),
        }
    }
}

/// Dispatch a runtime `k` (matrix dimension) to a stack-allocated `la_stack::Matrix<k>`.
///
/// The block must evaluate to `Result<_, E>` with `E: From<MatrixError>`. Sizes
/// above [`MAX_STACK_MATRIX_DIM`] produce [`MatrixError::UnsupportedDim`].
macro_rules! try_with_la_stack_matrix {
    ($k:expr, |$m:ident| $body:block) => {{
        let k = $k;
        match k {
            0 => {
                let mut $m = $crate::geometry::matrix::Matrix::<0>::zero();
                $body
            }
            1 => {
                let mut $m = $crate::geometry::matrix::Matrix::<1>::zero();
                $body
            }
            2 => {
                let mut $m = $crate::geometry::matrix::Matrix::<2>::zero();
                $body
            }
            3 => {
                let mut $m = $crate::geometry::matrix::Matrix::<3>::zero();
                $body
            }
            4 => {
                let mut $m = $crate::geometry::matrix::Matrix::<4>::zero();
                $body
            }
            5 => {
                let mut $m = $crate::geometry::matrix::Matrix::<5>::zero();
                $body
            }
            6 => {
                let mut $m = $crate::geometry::matrix::Matrix::<6>::zero();
                $body
            }
            7 => {
                let mut $m = $crate::geometry::matrix::Matrix::<7>::zero();
                $body
            }
            8 => {
                let mut $m = $crate::geometry::matrix::Matrix::<8>::zero();
                $body
            }
            9 => {
                let mut $m = $crate::geometry::matrix::Matrix::<9>::zero();
                $body
            }
            10 => {
                let mut $m = $crate::geometry::matrix::Matrix::<10>::zero();
                $body
            }
            11 => {
                let mut $m = $crate::geometry::matrix::Matrix::<11>::zero();
                $body
            }
            12 => {
                let mut $m = $crate::geometry::matrix::Matrix::<12>::zero();
                $body
            }
            13 => {
                let mut $m = $crate::geometry::matrix::Matrix::<13>::zero();
                $body
            }
            14 => {
                let mut $m = $crate::geometry::matrix::Matrix::<14>::zero();
                $body
            }
            15 => {
                let mut $m = $crate::geometry::matrix::Matrix::<15>::zero();
                $body
            }
            16 => {
                let mut $m = $crate::geometry::matrix::Matrix::<16>::zero();
                $body
            }
            17 => {
                let mut $m = $crate::geometry::matrix::Matrix::<17>::zero();
                $body
            }
            18 => {
                let mut $m = $crate::geometry::matrix::Matrix::<18>::zero();
                $body
            }
            _ => Err($crate::geometry::matrix::MatrixError::UnsupportedDim {
                k,
                max: $crate::geometry::matrix::MAX_STACK_MATRIX_DIM,
            }
            .into()),
        }
    }};
}

#[inline]
pub(crate) fn matrix_set<const D: usize>(m: &mut Matrix<D>, r: usize, c: usize, value: f64) {
    let ok = m.set(r, c, value);
    debug_assert!(ok, "matrix index out of bounds: ({r}, {c}) for {D}x{D}");
}

/// Compute an LU-based determinant, returning 0.0 for singular matrices.
///
/// # Examples
///
/// ```rust
/// use delaunay_history::geometry::matrix::{lu_determinant, Matrix};
///
/// let m = Matrix::<2>::zero();
/// assert_eq!(lu_determinant(&m), 0.0);
/// ```
#[inline]
#[must_use]
pub fn lu_determinant<const D: usize>(m: &Matrix<D>) -> f64 {
    match m.det(0.0) {
        Ok(det) => det,
        Err(LaError::Singular { .. }) => 0.0,
        Err(_) => f64::NAN,
    }
}

/// Determinant of an `n×n` matrix given as row-major entries.
///
/// Sizes up to [`MAX_CLOSED_FORM_DIM`] use cofactor expansion written out in
/// full; larger sizes are dispatched to a stack-allocated LU factorization.
/// A size of zero yields the empty product `1.0`.
///
/// # Errors
///
/// Returns [`MatrixError::ShapeMismatch`] when `entries.len() != n * n` and
/// [`MatrixError::UnsupportedDim`] when `n` exceeds [`MAX_STACK_MATRIX_DIM`].
///
/// # Examples
///
/// ```rust
/// use delaunay_history::geometry::matrix::determinant;
///
/// let identity = [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0];
/// assert_eq!(determinant(&identity, 3).unwrap(), 1.0);
/// assert_eq!(determinant(&[2.0, 1.0, 4.0, 3.0], 2).unwrap(), 2.0);
/// ```
pub fn determinant(entries: &[f64], n: usize) -> Result<f64, MatrixError> {
    if entries.len() != n * n {
        return Err(MatrixError::ShapeMismatch {
            expected: n * n,
            actual: entries.len(),
        });
    }
    let v = entries;
    match n {
        0 => Ok(1.0),
        1 => Ok(v[0]),
        2 => Ok(v[0].mul_add(v[3], -(v[1] * v[2]))),
        3 => Ok(det3(v[0], v[1], v[2], v[3], v[4], v[5], v[6], v[7], v[8])),
        4 => {
            let m0 = det3(v[5], v[6], v[7], v[9], v[10], v[11], v[13], v[14], v[15]);
            let m1 = det3(v[4], v[6], v[7], v[8], v[10], v[11], v[12], v[14], v[15]);
            let m2 = det3(v[4], v[5], v[7], v[8], v[9], v[11], v[12], v[13], v[15]);
            let m3 = det3(v[4], v[5], v[6], v[8], v[9], v[10], v[12], v[13], v[14]);
            Ok(v[0] * m0 - v[1] * m1 + v[2] * m2 - v[3] * m3)
        }
        _ => try_with_la_stack_matrix!(n, |m| {
            for r in 0..n {
                for c in 0..n {
                    matrix_set(&mut m, r, c, entries[r * n + c]);
                }
            }
            Ok(lu_determinant(&m))
        }),
    }
}

#[inline]
#[expect(clippy::too_many_arguments)]
fn det3(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64, g: f64, h: f64, i: f64) -> f64 {
    a * e.mul_add(i, -(f * h)) - b * d.mul_add(i, -(f * g)) + c * d.mul_add(h, -(e * g))
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    #[test]
    fn test_determinant_rejects_unsupported_dim() {
        let k = MAX_STACK_MATRIX_DIM + 1;
        let entries = vec![0.0; k * k];
        let res = determinant(&entries, k);
        assert!(matches!(res, Err(MatrixError::UnsupportedDim { .. })));
    }

    #[test]
    fn test_determinant_rejects_shape_mismatch() {
        let res = determinant(&[1.0, 2.0, 3.0], 2);
        assert_eq!(
            res,
            Err(MatrixError::ShapeMismatch {
                expected: 4,
                actual: 3
            })
        );
    }

    #[test]
    fn test_determinant_closed_form_4x4() {
        // Upper triangular: product of the diagonal.
        let m = [
            2.0, 1.0, 3.0, 4.0, //
            0.0, 3.0, 5.0, 1.0, //
            0.0, 0.0, 4.0, 2.0, //
            0.0, 0.0, 0.0, 0.5,
        ];
        assert_relative_eq!(determinant(&m, 4).unwrap(), 12.0, epsilon = 1e-12);
    }

    #[test]
    fn test_determinant_swap_rows_flips_sign() {
        let m = [1.0, 2.0, 0.0, 0.0, 1.0, 3.0, 4.0, 0.0, 1.0];
        let swapped = [0.0, 1.0, 3.0, 1.0, 2.0, 0.0, 4.0, 0.0, 1.0];
        let a = determinant(&m, 3).unwrap();
        let b = determinant(&swapped, 3).unwrap();
        assert_relative_eq!(a, -b, epsilon = 1e-12);
        assert_relative_eq!(a, 25.0, epsilon = 1e-12);
    }

    macro_rules! gen_lu_agrees_with_diagonal_tests {
        ($n:literal) => {
            pastey::paste! {
                #[test]
                fn [<determinant_of_diagonal_ $n x $n>]() {
                    let n = $n;
                    let mut entries = vec![0.0; n * n];
                    let mut expected = 1.0;
                    for i in 0..n {
                        #[expect(clippy::cast_precision_loss)]
                        let d = (i + 1) as f64 * 0.5;
                        entries[i * n + i] = d;
                        expected *= d;
                    }
                    assert_relative_eq!(
                        determinant(&entries, n).unwrap(),
                        expected,
                        max_relative = 1e-12
                    );
                }
            }
        };
    }

    gen_lu_agrees_with_diagonal_tests!(3);
    gen_lu_agrees_with_diagonal_tests!(4);
    gen_lu_agrees_with_diagonal_tests!(5);
    gen_lu_agrees_with_diagonal_tests!(6);
    gen_lu_agrees_with_diagonal_tests!(8);
}
