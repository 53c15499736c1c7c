//! Data and operations on d-dimensional input points.
//!
//! A [`Point`] couples immutable `f64` coordinates with its arrival index in
//! the insertion sequence. Indices are the time stamps used by every record
//! of the history, so the index of a point must equal its position in the
//! input.

#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// POINT STRUCT DEFINITION
// =============================================================================

/// A point in D-dimensional space together with its arrival index.
///
/// Points are intended to be immutable once created, so both fields are
/// private.
///
/// # Examples
///
/// ```rust
/// use delaunay_history::geometry::point::Point;
///
/// let p = Point::new([1.0, 2.0, 3.0], 7);
/// assert_eq!(p.coords(), &[1.0, 2.0, 3.0]);
/// assert_eq!(p.index(), 7);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PointRepr", into = "PointRepr")]
pub struct Point<const D: usize> {
    coords: [f64; D],
    index: usize,
}

impl<const D: usize> Point<D> {
    /// Create a point from its coordinates and arrival index.
    #[inline]
    #[must_use]
    pub const fn new(coords: [f64; D], index: usize) -> Self {
        Self { coords, index }
    }

    /// The coordinates of this point.
    #[inline]
    #[must_use]
    pub const fn coords(&self) -> &[f64; D] {
        &self.coords
    }

    /// The arrival index of this point.
    #[inline]
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Returns the first coordinate axis holding a NaN or infinite value.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use delaunay_history::geometry::point::Point;
    ///
    /// assert_eq!(Point::new([0.0, 1.0], 0).first_non_finite_axis(), None);
    /// assert_eq!(Point::new([0.0, f64::NAN], 0).first_non_finite_axis(), Some(1));
    /// ```
    #[must_use]
    pub fn first_non_finite_axis(&self) -> Option<usize> {
        self.coords.iter().position(|c| !c.is_finite())
    }
}

impl<const D: usize> fmt::Display for Point<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (", self.index)?;
        for (axis, c) in self.coords.iter().enumerate() {
            if axis > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{c:.3}")?;
        }
        write!(f, ")")
    }
}

/// Build a `Vec<Point<D>>` whose indices are the positions in the list.
///
/// # Examples
///
/// ```rust
/// use delaunay_history::points;
///
/// let pts = points![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]];
/// assert_eq!(pts.len(), 3);
/// assert_eq!(pts[2].index(), 2);
/// ```
#[macro_export]
macro_rules! points {
    ($($coords:expr),* $(,)?) => {{
        let coords = [$($coords),*];
        coords
            .into_iter()
            .enumerate()
            .map(|(i, c)| $crate::geometry::point::Point::new(c, i))
            .collect::<::std::vec::Vec<_>>()
    }};
}

// =============================================================================
// SERIALIZATION
// =============================================================================

/// Wire representation: coordinates are written as a plain sequence so that
/// no fixed-size array impl is needed for arbitrary `D`.
#[derive(Clone, Debug, Serialize, Deserialize)]
struct PointRepr {
    index: usize,
    coords: Vec<f64>,
}

impl<const D: usize> From<Point<D>> for PointRepr {
    fn from(p: Point<D>) -> Self {
        Self {
            index: p.index,
            coords: p.coords.to_vec(),
        }
    }
}

impl<const D: usize> TryFrom<PointRepr> for Point<D> {
    type Error = String;

    fn try_from(repr: PointRepr) -> Result<Self, Self::Error> {
        let len = repr.coords.len();
        let coords: [f64; D] = repr
            .coords
            .try_into()
            .map_err(|_| format!("expected {D} coordinates, got {len}"))?;
        Ok(Self::new(coords, repr.index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_accessors() {
        let p = Point::new([1.5, -2.0], 4);
        assert_eq!(p.coords(), &[1.5, -2.0]);
        assert_eq!(p.index(), 4);
    }

    #[test]
    fn test_points_macro_assigns_positions() {
        let pts = crate::points![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]];
        assert_eq!(pts[0].index(), 0);
        assert_eq!(pts[1].index(), 1);
        assert_eq!(pts[1].coords(), &[1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_first_non_finite_axis() {
        assert_eq!(Point::new([1.0, 2.0, 3.0], 0).first_non_finite_axis(), None);
        assert_eq!(
            Point::new([1.0, f64::INFINITY, f64::NAN], 0).first_non_finite_axis(),
            Some(1)
        );
    }

    #[test]
    fn test_display() {
        let p = Point::new([0.5, 1.0], 3);
        assert_eq!(p.to_string(), "3 (0.500, 1.000)");
    }

    #[test]
    fn test_serde_roundtrip_and_dimension_check() {
        let p = Point::new([1.0, 2.0, 3.0], 9);
        let json = serde_json::to_string(&p).unwrap();
        let back: Point<3> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, p);

        let wrong_dim: Result<Point<2>, _> = serde_json::from_str(&json);
        assert!(wrong_dim.is_err());
    }
}
