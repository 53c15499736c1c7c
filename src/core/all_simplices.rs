//! Driver computing every simplex of every historical Delaunay triangulation.
//!
//! Points are inserted in order. Each insertion locates the point through
//! the star of the point D positions earlier, inserts it into the ground
//! truth, then works off a stack of new simplices: every simplex is handed to
//! the star of its minimum vertex, which may in turn produce simplices in its
//! hole triangulation that are pushed back onto the stack.
//!
//! # Example
//!
//! ```rust
//! use delaunay_history::prelude::*;
//!
//! let points = points![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [1.0, 1.2]];
//! let history = find_all_simplices(&points, HistoryOptions::default()).unwrap();
//!
//! // The full window is the Delaunay triangulation of all four points.
//! let simplices = history
//!     .window(0, 3)
//!     .filter(|r| r.kind == RecordKind::Simplex)
//!     .count();
//! assert_eq!(simplices, 2);
//! ```

use crate::core::algorithms::hole_triangulation::HoleTriangulator;
use crate::core::algorithms::incremental_insertion::IncrementalTriangulator;
use crate::core::algorithms::locate::locate;
use crate::core::algorithms::star::Star;
use crate::core::collections::FastHashSet;
use crate::core::simplex::SimplexRecord;
use crate::core::triangulation_data_structure::{FaceKey, HistoryError, SimplexKey, Tds};
use crate::geometry::matrix::MAX_STACK_MATRIX_DIM;
use crate::geometry::point::Point;

/// Smallest supported dimension.
pub const MIN_DIMENSION: usize = 2;

/// Largest supported dimension; the lifted in-sphere matrix must fit the
/// stack LU dispatch.
pub const MAX_DIMENSION: usize = MAX_STACK_MATRIX_DIM - 1;

/// Points between two progress log lines.
const PROGRESS_INTERVAL: usize = 1000;

/// Options for [`find_all_simplices`].
///
/// # Example
///
/// ```rust
/// use delaunay_history::core::all_simplices::HistoryOptionsBuilder;
///
/// let options = HistoryOptionsBuilder::default()
///     .alpha_bookkeeping(true)
///     .build()
///     .unwrap();
/// assert!(options.alpha_bookkeeping);
/// ```
#[derive(Builder, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[builder(default)]
pub struct HistoryOptions {
    /// Record on every face the simplices ever attached to it, and store the
    /// circumsphere of every proper simplex, as needed by temporal
    /// alpha-shape extraction.
    pub alpha_bookkeeping: bool,
}

/// Incremental front end: feed points one at a time, then [`finish`].
///
/// [`finish`]: AllSimplicesFinder::finish
#[derive(Debug)]
pub struct AllSimplicesFinder<const D: usize> {
    tds: Tds<D>,
    incremental: IncrementalTriangulator,
    stars: Vec<Star>,
    holes: Vec<HoleTriangulator>,
    all: Vec<SimplexKey>,
    options: HistoryOptions,
}

impl<const D: usize> AllSimplicesFinder<D> {
    /// Empty finder.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError::UnsupportedDimension`] unless
    /// `MIN_DIMENSION <= D <= MAX_DIMENSION`.
    pub fn new(options: HistoryOptions) -> Result<Self, HistoryError> {
        if !(MIN_DIMENSION..=MAX_DIMENSION).contains(&D) {
            return Err(HistoryError::UnsupportedDimension {
                dimension: D,
                min: MIN_DIMENSION,
                max: MAX_DIMENSION,
            });
        }
        Ok(Self {
            tds: Tds::new(options.alpha_bookkeeping),
            incremental: IncrementalTriangulator::new(),
            stars: Vec::new(),
            holes: Vec::new(),
            all: Vec::new(),
            options,
        })
    }

    /// Number of points inserted so far.
    #[must_use]
    pub fn number_of_points(&self) -> usize {
        self.tds.points().len()
    }

    /// Number of simplices and facets created so far.
    #[must_use]
    pub fn number_of_simplices(&self) -> usize {
        self.all.len()
    }

    /// The arena as built so far.
    #[must_use]
    pub const fn tds(&self) -> &Tds<D> {
        &self.tds
    }

    /// Insert the next point. Its index must equal the number of points
    /// inserted before it.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError::IndexMismatch`] or
    /// [`HistoryError::NonFiniteCoordinate`] for invalid points, and
    /// propagates failures of location, insertion and the star and hole
    /// updates. [`HistoryError::StarAccounting`] is returned if a star is
    /// left waiting for a simplex once the insertion settles. The finder must not be used after an error.
    pub fn insert(&mut self, point: Point<D>) -> Result<(), HistoryError> {
        let p_new = self.tds.points().len();
        if point.index() != p_new {
            return Err(HistoryError::IndexMismatch {
                position: p_new,
                index: point.index(),
            });
        }
        if let Some(axis) = point.first_non_finite_axis() {
            return Err(HistoryError::NonFiniteCoordinate {
                index: p_new,
                axis,
            });
        }
        if p_new % PROGRESS_INTERVAL == 0 {
            tracing::debug!(point = p_new, simplices = self.all.len(), "inserting point");
        }

        self.tds.push_point(point);
        self.stars.push(Star::new(p_new));
        self.holes.push(HoleTriangulator::new(p_new));

        let location = match p_new.checked_sub(D) {
            Some(seed) => Some(locate(&self.tds, p_new, &self.stars[seed])?),
            None => None,
        };
        let mut touched = FastHashSet::default();
        let mut stack: Vec<SimplexKey> = self
            .incremental
            .add_point(&mut self.tds, p_new, location)?
            .into_vec();

        while let Some(s) = stack.pop() {
            self.all.push(s);
            if self.options.alpha_bookkeeping {
                self.tds.record_known_simplex(s);
            }
            let owner = self.tds.simplex_min_point(s);
            let (Some(star), Some(hole)) = (self.stars.get_mut(owner), self.holes.get_mut(owner))
            else {
                return Err(HistoryError::MissingSimplex {
                    message: format!("no star for point {owner}"),
                });
            };
            touched.insert(owner);
            let more = star.register_simplex(&mut self.tds, hole, s, p_new)?;
            if !more.is_empty() {
                tracing::trace!(star = owner, p_new, created = more.len(), "hole cascade");
            }
            stack.extend(more);
        }
        for owner in touched {
            self.stars[owner].check_settled(p_new)?;
        }
        Ok(())
    }

    /// Finish construction.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError::EmptyInput`] if no point was inserted.
    pub fn finish(self) -> Result<SimplexHistory<D>, HistoryError> {
        if self.tds.points().is_empty() {
            return Err(HistoryError::EmptyInput);
        }
        tracing::debug!(
            points = self.tds.points().len(),
            simplices = self.all.len(),
            "creating simplices finished"
        );
        let records = self.all.iter().map(|&s| self.tds.record(s)).collect();
        Ok(SimplexHistory {
            tds: self.tds,
            records,
        })
    }
}

/// Compute every simplex and facet of the Delaunay triangulations of all
/// contiguous windows of `points`.
///
/// # Errors
///
/// Returns [`HistoryError::EmptyInput`] for an empty sequence, the input
/// validation errors of [`AllSimplicesFinder::insert`], and any internal
/// failure of the construction.
pub fn find_all_simplices<const D: usize>(
    points: &[Point<D>],
    options: HistoryOptions,
) -> Result<SimplexHistory<D>, HistoryError> {
    if points.is_empty() {
        return Err(HistoryError::EmptyInput);
    }
    let mut finder = AllSimplicesFinder::new(options)?;
    for point in points {
        finder.insert(*point)?;
    }
    finder.finish()
}

/// Every simplex and facet ever created, in creation order.
#[derive(Debug)]
pub struct SimplexHistory<const D: usize> {
    tds: Tds<D>,
    records: Vec<SimplexRecord<D>>,
}

impl<const D: usize> SimplexHistory<D> {
    /// All records in creation order.
    #[must_use]
    pub fn records(&self) -> &[SimplexRecord<D>] {
        &self.records
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no record was created (fewer than D points).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records of the Delaunay triangulation of `points[start..=end]`.
    pub fn window(&self, start: usize, end: usize) -> impl Iterator<Item = &SimplexRecord<D>> {
        self.records
            .iter()
            .filter(move |r| r.is_delaunay_in(start, end))
    }

    /// Simplices ever attached to `face`; empty without bookkeeping.
    #[must_use]
    pub fn known_simplices(&self, face: FaceKey) -> &[SimplexKey] {
        self.tds.face(face).map_or(&[][..], |f| f.known_simplices())
    }

    /// The underlying arena.
    #[must_use]
    pub const fn tds(&self) -> &Tds<D> {
        &self.tds
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::simplex::RecordKind;
    use crate::points;

    #[test]
    fn test_options_builder_defaults() {
        let options = HistoryOptionsBuilder::default().build().unwrap();
        assert_eq!(options, HistoryOptions::default());
        assert!(!options.alpha_bookkeeping);
    }

    #[test]
    fn test_empty_input_is_rejected() {
        let points: Vec<Point<2>> = Vec::new();
        assert_eq!(
            find_all_simplices(&points, HistoryOptions::default()).unwrap_err(),
            HistoryError::EmptyInput
        );
        let finder = AllSimplicesFinder::<2>::new(HistoryOptions::default()).unwrap();
        assert_eq!(finder.finish().unwrap_err(), HistoryError::EmptyInput);
    }

    #[test]
    fn test_unsupported_dimension() {
        let err = AllSimplicesFinder::<1>::new(HistoryOptions::default()).unwrap_err();
        assert_eq!(
            err,
            HistoryError::UnsupportedDimension {
                dimension: 1,
                min: MIN_DIMENSION,
                max: MAX_DIMENSION,
            }
        );
    }

    #[test]
    fn test_index_mismatch() {
        let points = vec![Point::new([0.0, 0.0], 0), Point::new([1.0, 0.0], 2)];
        let err = find_all_simplices(&points, HistoryOptions::default()).unwrap_err();
        assert_eq!(err, HistoryError::IndexMismatch { position: 1, index: 2 });
    }

    #[test]
    fn test_non_finite_coordinate() {
        let points = points![[0.0, 0.0], [f64::NAN, 1.0]];
        let err = find_all_simplices(&points, HistoryOptions::default()).unwrap_err();
        assert_eq!(err, HistoryError::NonFiniteCoordinate { index: 1, axis: 0 });
    }

    #[test]
    fn test_single_triangle() {
        let points = points![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]];
        let history = find_all_simplices(&points, HistoryOptions::default()).unwrap();
        let full: Vec<_> = history.window(0, 2).collect();
        assert_eq!(full.iter().filter(|r| r.kind == RecordKind::Simplex).count(), 1);
        assert_eq!(full.iter().filter(|r| r.kind == RecordKind::Facet).count(), 3);
        assert!(history.tds().validate().is_ok());
    }

    #[test]
    fn test_fewer_than_d_points_yield_no_records() {
        let points = points![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]];
        let history = find_all_simplices(&points, HistoryOptions::default()).unwrap();
        assert!(history.is_empty());
    }

    #[test]
    fn test_bookkeeping_records_known_simplices() {
        let points = points![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [1.0, 1.2]];
        let options = HistoryOptionsBuilder::default()
            .alpha_bookkeeping(true)
            .build()
            .unwrap();
        let history = find_all_simplices(&points, options).unwrap();
        let with_known = history
            .tds()
            .faces()
            .filter(|(k, _)| !history.known_simplices(*k).is_empty())
            .count();
        assert!(with_known > 0);
        for record in history.records() {
            if record.kind == RecordKind::Simplex {
                assert!(record.circumsphere.is_some());
            }
        }
    }
}
