//! The append-only arena holding every face and simplex of the history.
//!
//! A single [`Tds`] owns all records of the ground-truth triangulation and
//! of every star and hole triangulation. Records are never removed: dead
//! simplices stay reachable so that their stamps can be reported, and keys
//! handed out by the arena stay valid for the whole computation.
//!
//! # Orientation conventions
//!
//! - A [`Face`] faces a point `q` when the determinant with rows
//!   `vertex − q` over its stored vertex order is positive, XOR its reversal
//!   flag.
//! - A proper simplex stores its base face at index 0 and the newest vertex
//!   as `apex`; `faces[1 + j]` is the face opposite base vertex `j`.
//! - The hull neighbor across the ridge opposite `points[i]` is stored at
//!   `hull_neighbors[i]`, and hull links are kept reciprocal.
//!
//! # Validation
//!
//! [`Tds::validate`] checks the structural invariants: twin involution,
//! face/simplex back-references, simplex vertex counts and orientation, hull
//! link reciprocity on live facets, and stamp ordering.

#![forbid(unsafe_code)]

use slotmap::new_key_type;
use thiserror::Error;

use crate::core::collections::{
    FastHashSet, MAX_PRACTICAL_DIMENSION_SIZE, SimplexFaceBuffer, SimplexVertexBuffer,
    SmallBuffer, StorageMap,
};
use crate::core::face::{Face, UniqueFace};
use crate::core::simplex::{AbstractSimplex, Layer, RecordKind, SimplexKind, SimplexRecord};
use crate::geometry::matrix::MatrixError;
use crate::geometry::point::Point;
use crate::geometry::predicates::{Circumsphere, circumsphere, faces_point, insphere_lifted};

// =============================================================================
// ERRORS
// =============================================================================

/// Errors raised while building or querying a simplex history.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum HistoryError {
    /// No points were supplied.
    #[error("Cannot build a history from an empty point sequence")]
    EmptyInput,
    /// The dimension is outside the supported range.
    #[error("Unsupported dimension {dimension}: expected {min} ≤ D ≤ {max}")]
    UnsupportedDimension {
        /// Requested dimension.
        dimension: usize,
        /// Smallest supported dimension.
        min: usize,
        /// Largest supported dimension.
        max: usize,
    },
    /// A point's index does not equal its position in the sequence.
    #[error("Point at position {position} carries index {index}")]
    IndexMismatch {
        /// Position in the input.
        position: usize,
        /// Index stored on the point.
        index: usize,
    },
    /// A coordinate is NaN or infinite.
    #[error("Point {index} has a non-finite coordinate on axis {axis}")]
    NonFiniteCoordinate {
        /// Index of the offending point.
        index: usize,
        /// Offending axis.
        axis: usize,
    },
    /// The incremental triangulation needs a location after its first face.
    #[error("Point {index} inserted without a location")]
    MissingLocation {
        /// Index of the point being inserted.
        index: usize,
    },
    /// A face link (reverse, hull neighbor, boundary, star face) is absent.
    #[error("Missing face link: {message}")]
    MissingLink {
        /// Description of the missing link.
        message: String,
    },
    /// A simplex that must exist is absent.
    #[error("Missing simplex: {message}")]
    MissingSimplex {
        /// Description of where the simplex was expected.
        message: String,
    },
    /// A point expected on a face or simplex is not one of its vertices.
    #[error("Point {point} is not a vertex: {message}")]
    NotAVertex {
        /// The point that was looked up.
        point: usize,
        /// Description of the lookup.
        message: String,
    },
    /// A star's unmatched-face counter went negative.
    #[error("Star of point {star} lost track of unmatched faces while registering point {point}")]
    StarAccounting {
        /// Middle point of the star.
        star: usize,
        /// Point being inserted.
        point: usize,
    },
    /// A ridge rotation or hull walk exceeded the arena size.
    #[error("Walk did not terminate within {steps} steps")]
    WalkCycle {
        /// Number of steps taken.
        steps: usize,
    },
    /// Point location found no destroyed simplex in the next layer up.
    #[error("Point location failed for point {point}: {message}")]
    LocationFailed {
        /// Point being located.
        point: usize,
        /// Description of the failure.
        message: String,
    },
    /// A structural invariant does not hold.
    #[error("Validation failed: {message}")]
    Validation {
        /// Description of the violated invariant.
        message: String,
    },
    /// A geometric predicate could not be evaluated.
    #[error("Predicate evaluation failed: {0}")]
    Predicate(#[from] MatrixError),
}

// =============================================================================
// KEYS
// =============================================================================

new_key_type! {
    /// Key type for accessing canonical faces in the storage map.
    pub struct UniqueFaceKey;
}

new_key_type! {
    /// Key type for accessing oriented half-faces in the storage map.
    pub struct FaceKey;
}

new_key_type! {
    /// Key type for accessing simplices and facets in the storage map.
    pub struct SimplexKey;
}

// =============================================================================
// TDS
// =============================================================================

/// Arena of points, faces and simplices of every layer.
#[derive(Clone, Debug)]
pub struct Tds<const D: usize> {
    points: Vec<Point<D>>,
    unique_faces: StorageMap<UniqueFaceKey, UniqueFace<D>>,
    faces: StorageMap<FaceKey, Face<D>>,
    simplices: StorageMap<SimplexKey, AbstractSimplex<D>>,
    compute_circumspheres: bool,
}

impl<const D: usize> Default for Tds<D> {
    fn default() -> Self {
        Self::new(false)
    }
}

impl<const D: usize> Tds<D> {
    /// Create an empty arena. With `compute_circumspheres`, every proper
    /// simplex gets its circumcenter and circumradius on creation.
    #[must_use]
    pub fn new(compute_circumspheres: bool) -> Self {
        Self {
            points: Vec::new(),
            unique_faces: StorageMap::with_key(),
            faces: StorageMap::with_key(),
            simplices: StorageMap::with_key(),
            compute_circumspheres,
        }
    }

    // -------------------------------------------------------------------------
    // Points
    // -------------------------------------------------------------------------

    pub(crate) fn push_point(&mut self, point: Point<D>) {
        self.points.push(point);
    }

    /// All points added so far, in arrival order.
    #[must_use]
    pub fn points(&self) -> &[Point<D>] {
        &self.points
    }

    #[inline]
    fn coords(&self, p: usize) -> &[f64; D] {
        self.points[p].coords()
    }

    // -------------------------------------------------------------------------
    // Counts and raw access
    // -------------------------------------------------------------------------

    /// Number of simplices and facets in the arena, across all layers.
    #[must_use]
    pub fn number_of_simplices(&self) -> usize {
        self.simplices.len()
    }

    /// Upper bound on the length of any rotation or hull walk.
    pub(crate) fn walk_bound(&self) -> usize {
        self.faces.len() + self.simplices.len() + 1
    }

    /// Half-face by key.
    #[must_use]
    pub fn face(&self, key: FaceKey) -> Option<&Face<D>> {
        self.faces.get(key)
    }

    /// Simplex or facet by key.
    #[must_use]
    pub fn simplex(&self, key: SimplexKey) -> Option<&AbstractSimplex<D>> {
        self.simplices.get(key)
    }

    /// Iterate over every simplex and facet in creation order.
    pub fn simplices(&self) -> impl Iterator<Item = (SimplexKey, &AbstractSimplex<D>)> {
        self.simplices.iter()
    }

    /// Iterate over every half-face.
    pub fn faces(&self) -> impl Iterator<Item = (FaceKey, &Face<D>)> {
        self.faces.iter()
    }

    // -------------------------------------------------------------------------
    // Face queries
    // -------------------------------------------------------------------------

    /// Vertex indices of a half-face.
    #[must_use]
    pub fn face_points(&self, f: FaceKey) -> &[usize; D] {
        &self.unique_faces[self.faces[f].unique].points
    }

    /// The twin of a half-face.
    #[must_use]
    pub fn reverse(&self, f: FaceKey) -> FaceKey {
        self.faces[f].reverse
    }

    /// Simplex or facet on the side of `f`.
    #[must_use]
    pub fn simplex_of(&self, f: FaceKey) -> Option<SimplexKey> {
        self.faces[f].simplex
    }

    /// Proper simplex on the side of `f`, ignoring facets.
    #[must_use]
    pub fn proper_simplex_of(&self, f: FaceKey) -> Option<SimplexKey> {
        self.faces[f]
            .simplex
            .filter(|&s| !self.simplices[s].is_facet())
    }

    /// Whether `p` is a vertex of `f`.
    #[must_use]
    pub fn has_vertex(&self, f: FaceKey, p: usize) -> bool {
        self.face_points(f).contains(&p)
    }

    /// Position in `f` of the vertex opposite the ridge `f` shares with
    /// `neighbor`, where that ridge is the one of `neighbor` opposite
    /// `neighbor_opposite`. Falls back to `neighbor_opposite` itself when `f`
    /// and `neighbor` span the same vertices.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError::NotAVertex`] if the faces share all vertices
    /// and `neighbor_opposite` is not among them.
    pub fn point_opposite_index(
        &self,
        f: FaceKey,
        neighbor: FaceKey,
        neighbor_opposite: usize,
    ) -> Result<usize, HistoryError> {
        self.face_points(f)
            .iter()
            .position(|&p| p == neighbor_opposite || !self.has_vertex(neighbor, p))
            .ok_or_else(|| HistoryError::NotAVertex {
                point: neighbor_opposite,
                message: format!("no ridge of {f:?} matches {neighbor:?}"),
            })
    }

    /// Vertex of `f` opposite the ridge described as in
    /// [`Self::point_opposite_index`].
    ///
    /// # Errors
    ///
    /// See [`Self::point_opposite_index`].
    pub fn point_opposite(
        &self,
        f: FaceKey,
        neighbor: FaceKey,
        neighbor_opposite: usize,
    ) -> Result<usize, HistoryError> {
        Ok(self.face_points(f)[self.point_opposite_index(f, neighbor, neighbor_opposite)?])
    }

    /// Hull neighbor of `f` across the ridge opposite position `idx`.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError::MissingLink`] when the link was never set.
    pub fn hull_neighbor(&self, f: FaceKey, idx: usize) -> Result<FaceKey, HistoryError> {
        self.faces[f].hull_neighbors[idx].ok_or_else(|| HistoryError::MissingLink {
            message: format!("hull neighbor {idx} of {f:?}"),
        })
    }

    /// Hull neighbor of `f` across the ridge opposite vertex `p`.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError::NotAVertex`] if `p` is not a vertex of `f`,
    /// or [`HistoryError::MissingLink`] if the link was never set.
    pub fn hull_neighbor_opposite(&self, f: FaceKey, p: usize) -> Result<FaceKey, HistoryError> {
        let idx = self.vertex_position(f, p)?;
        self.hull_neighbor(f, idx)
    }

    fn vertex_position(&self, f: FaceKey, p: usize) -> Result<usize, HistoryError> {
        self.face_points(f)
            .iter()
            .position(|&q| q == p)
            .ok_or_else(|| HistoryError::NotAVertex {
                point: p,
                message: format!("face {f:?}"),
            })
    }

    /// Star/hole cross-link of `f`.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError::MissingLink`] if `f` has none.
    pub fn boundary(&self, f: FaceKey) -> Result<FaceKey, HistoryError> {
        self.faces[f]
            .boundary
            .ok_or_else(|| HistoryError::MissingLink {
                message: format!("boundary cross-link of {f:?}"),
            })
    }

    /// Instance of `f` in the star of its minimum point, oriented like `f`.
    #[must_use]
    pub fn face_star(&self, f: FaceKey) -> Option<FaceKey> {
        let face = &self.faces[f];
        let star = self.unique_faces[face.unique].star_face?;
        Some(if face.is_reverse {
            self.faces[star].reverse
        } else {
            star
        })
    }

    // -------------------------------------------------------------------------
    // Face creation and linking
    // -------------------------------------------------------------------------

    fn insert_face_pair(&mut self, unique: UniqueFaceKey, is_reverse: bool) -> FaceKey {
        let front = self
            .faces
            .insert(Face::new(unique, is_reverse, FaceKey::default()));
        let back = self.faces.insert(Face::new(unique, !is_reverse, front));
        self.faces[front].reverse = back;
        front
    }

    /// New half-face pair over a new canonical face; returns the front side.
    pub fn create_face(&mut self, points: [usize; D]) -> FaceKey {
        let unique = self.unique_faces.insert(UniqueFace::new(points));
        self.insert_face_pair(unique, false)
    }

    /// New half-face pair over the same canonical face, keeping the
    /// orientation of `f`.
    pub fn clone_face(&mut self, f: FaceKey) -> FaceKey {
        let (unique, is_reverse) = {
            let face = &self.faces[f];
            (face.unique, face.is_reverse)
        };
        self.insert_face_pair(unique, is_reverse)
    }

    /// New face sharing the ridge of `f` opposite position `facing_idx`,
    /// with `p_new` in place of that vertex. The returned side faces the
    /// replaced vertex. Requires `p_new` to face `f`.
    pub fn create_face_facing(&mut self, f: FaceKey, p_new: usize, facing_idx: usize) -> FaceKey {
        let mut points = *self.face_points(f);
        points[facing_idx] = p_new;
        let is_reverse = self.faces[f].is_reverse;
        let new_face = self.create_face(points);
        if is_reverse {
            new_face
        } else {
            self.faces[new_face].reverse
        }
    }

    /// Record `f` as the star instance of its canonical face.
    pub(crate) fn set_face_star(&mut self, f: FaceKey) {
        let face = &self.faces[f];
        let front = if face.is_reverse { face.reverse } else { f };
        let unique = face.unique;
        self.unique_faces[unique].star_face = Some(front);
    }

    /// Cross-link a star face and its hole triangulation instance.
    pub(crate) fn set_boundary_pair(&mut self, star: FaceKey, hole: FaceKey) {
        self.faces[star].boundary = Some(hole);
        self.faces[hole].boundary = Some(star);
    }

    pub(crate) fn set_hull_neighbor(&mut self, f: FaceKey, idx: usize, neighbor: FaceKey) {
        self.faces[f].hull_neighbors[idx] = Some(neighbor);
    }

    /// Reciprocal hull link between `f` and `neighbor` over the ridge of `f`
    /// opposite position `idx`.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError::NotAVertex`] if the two faces do not share the
    /// ridge.
    pub fn hull_link(
        &mut self,
        f: FaceKey,
        neighbor: FaceKey,
        idx: usize,
    ) -> Result<(), HistoryError> {
        let opposite = self.face_points(f)[idx];
        let back_idx = self.point_opposite_index(neighbor, f, opposite)?;
        self.faces[f].hull_neighbors[idx] = Some(neighbor);
        self.faces[neighbor].hull_neighbors[back_idx] = Some(f);
        Ok(())
    }

    /// Reciprocal hull link over the ridge of `f` opposite vertex `p`.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError::NotAVertex`] if `p` is not a vertex of `f`.
    pub fn hull_link_opposite(
        &mut self,
        f: FaceKey,
        neighbor: FaceKey,
        p: usize,
    ) -> Result<(), HistoryError> {
        let idx = self.vertex_position(f, p)?;
        self.hull_link(f, neighbor, idx)
    }

    pub(crate) fn record_known_simplex(&mut self, s: SimplexKey) {
        let faces: SimplexFaceBuffer = self.simplices[s].faces().iter().copied().collect();
        for f in faces {
            self.faces[f].known_simplices.push(s);
        }
    }

    // -------------------------------------------------------------------------
    // Simplex creation and queries
    // -------------------------------------------------------------------------

    /// New proper simplex; attaches itself to every face.
    pub fn new_simplex(
        &mut self,
        faces: SimplexFaceBuffer,
        apex: usize,
        layer: Layer,
        last_previous_killer: Option<usize>,
    ) -> SimplexKey {
        let circumsphere = if self.compute_circumspheres {
            self.circumsphere_of(faces.first().copied(), apex)
        } else {
            None
        };
        let attach: SimplexFaceBuffer = faces.clone();
        let key = self.simplices.insert(AbstractSimplex::new(
            SimplexKind::Simplex {
                faces,
                apex,
                circumsphere,
            },
            layer,
            last_previous_killer,
        ));
        for f in attach {
            self.faces[f].simplex = Some(key);
        }
        key
    }

    /// New facet on `face`.
    pub fn new_facet(
        &mut self,
        face: FaceKey,
        layer: Layer,
        last_previous_killer: Option<usize>,
    ) -> SimplexKey {
        let key = self.simplices.insert(AbstractSimplex::new(
            SimplexKind::Facet { face },
            layer,
            last_previous_killer,
        ));
        self.faces[face].simplex = Some(key);
        key
    }

    fn circumsphere_of(&self, base: Option<FaceKey>, apex: usize) -> Option<Circumsphere<D>> {
        let base = base?;
        let mut vertices: Vec<&[f64; D]> = self
            .face_points(base)
            .iter()
            .map(|&p| self.coords(p))
            .collect();
        vertices.push(self.coords(apex));
        match circumsphere(&vertices) {
            Ok(sphere) => Some(sphere),
            Err(err) => {
                tracing::debug!(apex, %err, "circumsphere of degenerate simplex skipped");
                None
            }
        }
    }

    pub(crate) fn set_original(&mut self, clone: SimplexKey, original: SimplexKey) {
        self.simplices[clone].original = Some(original);
    }

    /// Whether `s` has not been destroyed.
    #[must_use]
    pub fn is_alive(&self, s: SimplexKey) -> bool {
        self.simplices[s].is_alive()
    }

    /// Whether `s` is a facet.
    #[must_use]
    pub fn is_facet(&self, s: SimplexKey) -> bool {
        self.simplices[s].is_facet()
    }

    /// Stamp `s` as destroyed by `p`.
    pub(crate) fn kill(&mut self, s: SimplexKey, p: usize) {
        self.simplices[s].first_subsequent_killer = Some(p);
    }

    /// Bounding faces of `s`.
    #[must_use]
    pub fn simplex_faces(&self, s: SimplexKey) -> &[FaceKey] {
        self.simplices[s].faces()
    }

    /// Owning layer of `s`.
    #[must_use]
    pub fn layer(&self, s: SimplexKey) -> Layer {
        self.simplices[s].layer
    }

    /// Simplex mirrored by the star clone `s`.
    #[must_use]
    pub fn original(&self, s: SimplexKey) -> Option<SimplexKey> {
        self.simplices[s].original
    }

    /// Vertex indices of `s`: base face first, then the apex.
    #[must_use]
    pub fn vertices(&self, s: SimplexKey) -> SimplexVertexBuffer {
        let simplex = &self.simplices[s];
        let mut vertices: SimplexVertexBuffer = simplex
            .faces()
            .first()
            .map(|&f| self.face_points(f).iter().copied().collect())
            .unwrap_or_default();
        if let Some(apex) = simplex.apex() {
            vertices.push(apex);
        }
        vertices
    }

    /// Largest vertex index of `s`.
    #[must_use]
    pub fn simplex_max_point(&self, s: SimplexKey) -> usize {
        self.vertices(s).into_iter().max().unwrap_or(0)
    }

    /// Smallest vertex index of `s`.
    #[must_use]
    pub fn simplex_min_point(&self, s: SimplexKey) -> usize {
        self.vertices(s).into_iter().min().unwrap_or(0)
    }

    /// First bounding face of `s` not incident to `p`.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError::NotAVertex`] if every face contains `p`.
    pub fn face_opposite(&self, s: SimplexKey, p: usize) -> Result<FaceKey, HistoryError> {
        self.simplex_faces(s)
            .iter()
            .copied()
            .find(|&f| !self.has_vertex(f, p))
            .ok_or_else(|| HistoryError::NotAVertex {
                point: p,
                message: format!("no face of {s:?} avoids it"),
            })
    }

    /// Snapshot of `s` for reporting.
    #[must_use]
    pub fn record(&self, s: SimplexKey) -> SimplexRecord<D> {
        let simplex = &self.simplices[s];
        SimplexRecord {
            key: s,
            kind: if simplex.is_facet() {
                RecordKind::Facet
            } else {
                RecordKind::Simplex
            },
            layer: simplex.layer,
            vertices: self.vertices(s),
            last_previous_killer: simplex.last_previous_killer,
            first_subsequent_killer: simplex.first_subsequent_killer,
            circumsphere: simplex.circumsphere().copied(),
        }
    }

    // -------------------------------------------------------------------------
    // Predicates
    // -------------------------------------------------------------------------

    /// Whether the half-face `f` faces point `q`.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError::Predicate`] if the determinant cannot be
    /// evaluated for this dimension.
    pub fn faces_point(&self, f: FaceKey, q: usize) -> Result<bool, HistoryError> {
        let vertices: SmallCoords<'_, D> =
            self.face_points(f).iter().map(|&p| self.coords(p)).collect();
        Ok(faces_point(
            &vertices,
            self.coords(q),
            self.faces[f].is_reverse,
        )?)
    }

    /// Whether the simplex formed by `f` and `top` (which `f` must face)
    /// contains `q` strictly inside its circumsphere.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError::Predicate`] if the determinant cannot be
    /// evaluated for this dimension.
    pub fn simplex_contains_point_in_circumsphere(
        &self,
        f: FaceKey,
        top: usize,
        q: usize,
    ) -> Result<bool, HistoryError> {
        let mut vertices: SmallCoords<'_, D> =
            self.face_points(f).iter().map(|&p| self.coords(p)).collect();
        vertices.push(self.coords(top));
        Ok(insphere_lifted(
            &vertices,
            self.coords(q),
            self.faces[f].is_reverse,
        )?)
    }

    /// In-circumsphere test of a record; for facets this degenerates to
    /// whether the hull face faces `q`.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError::Predicate`] if the determinant cannot be
    /// evaluated for this dimension.
    pub fn contains_point_in_circumsphere(
        &self,
        s: SimplexKey,
        q: usize,
    ) -> Result<bool, HistoryError> {
        match &self.simplices[s].kind {
            SimplexKind::Simplex { faces, apex, .. } => {
                self.simplex_contains_point_in_circumsphere(faces[0], *apex, q)
            }
            SimplexKind::Facet { face } => self.faces_point(*face, q),
        }
    }

    // -------------------------------------------------------------------------
    // Validation
    // -------------------------------------------------------------------------

    /// Check the structural invariants of every record.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError::Validation`] describing the first violation,
    /// or [`HistoryError::Predicate`] if an orientation test fails.
    pub fn validate(&self) -> Result<(), HistoryError> {
        self.validate_faces()?;
        for (key, simplex) in &self.simplices {
            self.validate_simplex(key, simplex)?;
        }
        Ok(())
    }

    fn validate_faces(&self) -> Result<(), HistoryError> {
        for (key, face) in &self.faces {
            let Some(twin) = self.faces.get(face.reverse) else {
                return Err(validation(format!("{key:?} has a dangling reverse link")));
            };
            if twin.reverse != key || twin.unique != face.unique || twin.is_reverse == face.is_reverse
            {
                return Err(validation(format!(
                    "{key:?} and its reverse {:?} are not twins",
                    face.reverse
                )));
            }
            if let Some(s) = face.simplex {
                let Some(simplex) = self.simplices.get(s) else {
                    return Err(validation(format!("{key:?} points to a missing simplex")));
                };
                if !simplex.faces().contains(&key) {
                    return Err(validation(format!(
                        "{key:?} points to {s:?} which does not bound it"
                    )));
                }
            }
        }
        Ok(())
    }

    fn validate_simplex(
        &self,
        key: SimplexKey,
        simplex: &AbstractSimplex<D>,
    ) -> Result<(), HistoryError> {
        let vertices = self.vertices(key);
        let distinct: FastHashSet<usize> = vertices.iter().copied().collect();
        if let (Some(lpk), Some(&min)) = (simplex.last_previous_killer, vertices.iter().min())
            && lpk >= min
        {
            return Err(validation(format!(
                "{key:?}: last previous killer {lpk} is not below vertex {min}"
            )));
        }
        if let (Some(fsk), Some(&max)) = (simplex.first_subsequent_killer, vertices.iter().max())
            && fsk <= max
        {
            return Err(validation(format!(
                "{key:?}: first subsequent killer {fsk} is not above vertex {max}"
            )));
        }

        match &simplex.kind {
            SimplexKind::Facet { face } => {
                if distinct.len() != D {
                    return Err(validation(format!("facet {key:?} has repeated vertices")));
                }
                if simplex.is_alive() && self.faces[*face].simplex == Some(key) {
                    self.validate_hull_links(*face)?;
                }
            }
            SimplexKind::Simplex { faces, apex, .. } => {
                if faces.len() != D + 1 || distinct.len() != D + 1 {
                    return Err(validation(format!(
                        "{key:?} does not have {} distinct faces and vertices",
                        D + 1
                    )));
                }
                let face_set: FastHashSet<FaceKey> = faces.iter().copied().collect();
                if face_set.len() != D + 1 {
                    return Err(validation(format!("{key:?} repeats a face")));
                }
                if self.has_vertex(faces[0], *apex) {
                    return Err(validation(format!("{key:?}: apex lies on the base face")));
                }
                for &f in faces {
                    let Some(&opposite) = vertices.iter().find(|&&v| !self.has_vertex(f, v)) else {
                        return Err(validation(format!("{key:?}: face {f:?} spans every vertex")));
                    };
                    if self.face_points(f).iter().any(|p| !distinct.contains(p)) {
                        return Err(validation(format!(
                            "{key:?}: face {f:?} has a foreign vertex"
                        )));
                    }
                    if !self.faces_point(f, opposite)? {
                        return Err(validation(format!(
                            "{key:?}: face {f:?} does not face vertex {opposite}"
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    fn validate_hull_links(&self, f: FaceKey) -> Result<(), HistoryError> {
        for (idx, neighbor) in self.faces[f].hull_neighbors.iter().enumerate() {
            let Some(neighbor) = *neighbor else {
                return Err(validation(format!("live facet face {f:?} lacks hull link {idx}")));
            };
            let opposite = self.face_points(f)[idx];
            let back = self.point_opposite_index(neighbor, f, opposite)?;
            if self.faces[neighbor].hull_neighbors[back] != Some(f) {
                return Err(validation(format!(
                    "hull link {idx} of {f:?} to {neighbor:?} is not reciprocal"
                )));
            }
        }
        Ok(())
    }
}

/// Borrowed vertex coordinates of one face or simplex.
type SmallCoords<'a, const D: usize> = SmallBuffer<&'a [f64; D], MAX_PRACTICAL_DIMENSION_SIZE>;

fn validation(message: String) -> HistoryError {
    HistoryError::Validation { message }
}
