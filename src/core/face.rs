//! Oriented half-faces and their shared canonical identity.
//!
//! Every (D-1)-simplex instance is created twice, once per side of its
//! supporting hyperplane. The two [`Face`] records are each other's
//! `reverse`, share one [`UniqueFace`], and each stores the simplex attached
//! on its own side. Copies of the same face in other layers (a point's star
//! or hole triangulation) are new half-face pairs over the same
//! [`UniqueFace`].
//!
//! In star and hole triangulations the *boundary* faces are the sides of hull
//! faces that do not face the middle point.

use crate::core::triangulation_data_structure::{FaceKey, SimplexKey, UniqueFaceKey};

/// Canonical identity of a D-vertex face, shared by every temporal copy.
#[derive(Clone, Debug)]
pub struct UniqueFace<const D: usize> {
    pub(crate) points: [usize; D],
    /// The instance of this face in the star of its minimum point, stored
    /// with front orientation.
    pub(crate) star_face: Option<FaceKey>,
}

impl<const D: usize> UniqueFace<D> {
    pub(crate) const fn new(points: [usize; D]) -> Self {
        Self {
            points,
            star_face: None,
        }
    }

    /// Point indices of the face, in creation order.
    #[must_use]
    pub const fn points(&self) -> &[usize; D] {
        &self.points
    }
}

/// An oriented half-face.
///
/// Hull neighbors are indexed by the position of the opposite vertex: the
/// neighbor across the ridge opposite `points[i]` is stored at index `i`.
/// Stale hull links are never cleared; they are only overwritten.
#[derive(Clone, Debug)]
pub struct Face<const D: usize> {
    pub(crate) unique: UniqueFaceKey,
    pub(crate) is_reverse: bool,
    pub(crate) reverse: FaceKey,
    /// Simplex bounded by this side; `None` on boundary faces.
    pub(crate) simplex: Option<SimplexKey>,
    pub(crate) hull_neighbors: [Option<FaceKey>; D],
    /// Corresponding instance across a star/hole triangulation pair.
    pub(crate) boundary: Option<FaceKey>,
    pub(crate) known_simplices: Vec<SimplexKey>,
}

impl<const D: usize> Face<D> {
    pub(crate) fn new(unique: UniqueFaceKey, is_reverse: bool, reverse: FaceKey) -> Self {
        Self {
            unique,
            is_reverse,
            reverse,
            simplex: None,
            hull_neighbors: [None; D],
            boundary: None,
            known_simplices: Vec::new(),
        }
    }

    /// Key of the shared canonical face.
    #[must_use]
    pub const fn unique(&self) -> UniqueFaceKey {
        self.unique
    }

    /// Whether this is the reverse instance (flips orientation tests).
    #[must_use]
    pub const fn is_reverse(&self) -> bool {
        self.is_reverse
    }

    /// The oppositely oriented twin.
    #[must_use]
    pub const fn reverse(&self) -> FaceKey {
        self.reverse
    }

    /// The most recent simplex or facet attached on this side.
    #[must_use]
    pub const fn simplex(&self) -> Option<SimplexKey> {
        self.simplex
    }

    /// Hull neighbors indexed by opposite vertex position.
    #[must_use]
    pub const fn hull_neighbors(&self) -> &[Option<FaceKey>; D] {
        &self.hull_neighbors
    }

    /// Star/hole cross-link, if any.
    #[must_use]
    pub const fn boundary(&self) -> Option<FaceKey> {
        self.boundary
    }

    /// Every simplex ever attached on this side, when bookkeeping is enabled.
    #[must_use]
    pub fn known_simplices(&self) -> &[SimplexKey] {
        &self.known_simplices
    }
}
