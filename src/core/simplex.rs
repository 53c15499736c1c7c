//! Simplices, facets and the records handed out by the history.
//!
//! An [`AbstractSimplex`] is either a proper D-simplex bounded by D+1 faces
//! or a [`SimplexKind::Facet`], which marks a hull face with nothing on its
//! side. Both carry the birth/death stamps that determine in which windows
//! of the insertion sequence they are Delaunay.

use serde::{Deserialize, Serialize};

use crate::core::collections::{SimplexFaceBuffer, SimplexVertexBuffer};
use crate::core::triangulation_data_structure::{FaceKey, SimplexKey};
use crate::geometry::predicates::Circumsphere;

/// The triangulation a simplex belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Layer {
    /// The incremental triangulation of all points inserted so far.
    Ground,
    /// The star of the point with the given index.
    Star(usize),
    /// The hole triangulation left by removing the point with the given index.
    Hole(usize),
}

/// Proper simplex or facet.
#[derive(Clone, Debug)]
pub enum SimplexKind<const D: usize> {
    /// A D-simplex. `faces[0]` is the pre-existing base face, `apex` the
    /// vertex opposite it, and `faces[1 + j]` is opposite base vertex `j`.
    Simplex {
        /// The D+1 bounding faces, each oriented towards its opposite vertex.
        faces: SimplexFaceBuffer,
        /// The newest vertex.
        apex: usize,
        /// Present when alpha bookkeeping is enabled.
        circumsphere: Option<Circumsphere<D>>,
    },
    /// Nothing on this side of `face`.
    Facet {
        /// The hull half-face.
        face: FaceKey,
    },
}

/// A simplex or facet with its lifetime stamps.
#[derive(Clone, Debug)]
pub struct AbstractSimplex<const D: usize> {
    pub(crate) kind: SimplexKind<D>,
    pub(crate) layer: Layer,
    pub(crate) last_previous_killer: Option<usize>,
    pub(crate) first_subsequent_killer: Option<usize>,
    pub(crate) original: Option<SimplexKey>,
}

impl<const D: usize> AbstractSimplex<D> {
    pub(crate) const fn new(
        kind: SimplexKind<D>,
        layer: Layer,
        last_previous_killer: Option<usize>,
    ) -> Self {
        Self {
            kind,
            layer,
            last_previous_killer,
            first_subsequent_killer: None,
            original: None,
        }
    }

    /// Proper simplex or facet payload.
    #[must_use]
    pub const fn kind(&self) -> &SimplexKind<D> {
        &self.kind
    }

    /// Owning triangulation.
    #[must_use]
    pub const fn layer(&self) -> Layer {
        self.layer
    }

    /// Whether this record is a facet.
    #[must_use]
    pub const fn is_facet(&self) -> bool {
        matches!(self.kind, SimplexKind::Facet { .. })
    }

    /// Bounding faces: D+1 for a simplex, one for a facet.
    #[must_use]
    pub fn faces(&self) -> &[FaceKey] {
        match &self.kind {
            SimplexKind::Simplex { faces, .. } => faces,
            SimplexKind::Facet { face } => std::slice::from_ref(face),
        }
    }

    /// The vertex opposite the base face, for proper simplices.
    #[must_use]
    pub const fn apex(&self) -> Option<usize> {
        match &self.kind {
            SimplexKind::Simplex { apex, .. } => Some(*apex),
            SimplexKind::Facet { .. } => None,
        }
    }

    /// Circumsphere, when it was computed.
    #[must_use]
    pub const fn circumsphere(&self) -> Option<&Circumsphere<D>> {
        match &self.kind {
            SimplexKind::Simplex { circumsphere, .. } => circumsphere.as_ref(),
            SimplexKind::Facet { .. } => None,
        }
    }

    /// Index of the last killer before the smallest vertex; `None` is −∞.
    #[must_use]
    pub const fn last_previous_killer(&self) -> Option<usize> {
        self.last_previous_killer
    }

    /// Index of the first killer after the largest vertex; `None` while alive.
    #[must_use]
    pub const fn first_subsequent_killer(&self) -> Option<usize> {
        self.first_subsequent_killer
    }

    /// Whether no point has destroyed this record yet.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.first_subsequent_killer.is_none()
    }

    /// For star clones, the simplex this one mirrors.
    #[must_use]
    pub const fn original(&self) -> Option<SimplexKey> {
        self.original
    }
}

// =============================================================================
// PUBLIC RECORDS
// =============================================================================

/// Kind tag of a [`SimplexRecord`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordKind {
    /// A proper D-simplex.
    Simplex,
    /// A hull facet.
    Facet,
}

/// Read-only snapshot of one simplex or facet of the history.
///
/// `vertices` lists the base face first; for proper simplices the apex comes
/// last.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimplexRecord<const D: usize> {
    /// Arena key of the record.
    pub key: SimplexKey,
    /// Proper simplex or facet.
    pub kind: RecordKind,
    /// Owning triangulation.
    pub layer: Layer,
    /// Vertex indices.
    pub vertices: SimplexVertexBuffer,
    /// Last killer before the smallest vertex; `None` is −∞.
    pub last_previous_killer: Option<usize>,
    /// First killer after the largest vertex; `None` is +∞.
    pub first_subsequent_killer: Option<usize>,
    /// Circumsphere, present for proper simplices with bookkeeping enabled.
    pub circumsphere: Option<Circumsphere<D>>,
}

impl<const D: usize> SimplexRecord<D> {
    /// Whether this record belongs to the Delaunay triangulation of the
    /// points with indices `start..=end`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use delaunay_history::core::simplex::{Layer, RecordKind, SimplexRecord};
    /// use delaunay_history::core::triangulation_data_structure::SimplexKey;
    ///
    /// let record: SimplexRecord<2> = SimplexRecord {
    ///     key: SimplexKey::default(),
    ///     kind: RecordKind::Simplex,
    ///     layer: Layer::Hole(1),
    ///     vertices: [2, 3, 5].into_iter().collect(),
    ///     last_previous_killer: Some(1),
    ///     first_subsequent_killer: Some(7),
    ///     circumsphere: None,
    /// };
    /// assert!(record.is_delaunay_in(2, 6));
    /// assert!(!record.is_delaunay_in(1, 6));
    /// assert!(!record.is_delaunay_in(2, 7));
    /// ```
    #[must_use]
    pub fn is_delaunay_in(&self, start: usize, end: usize) -> bool {
        self.vertices.iter().all(|&v| start <= v && v <= end)
            && self.last_previous_killer.is_none_or(|k| k < start)
            && self.first_subsequent_killer.is_none_or(|k| k > end)
    }

    /// Smallest vertex index.
    #[must_use]
    pub fn min_vertex(&self) -> Option<usize> {
        self.vertices.iter().copied().min()
    }

    /// Largest vertex index.
    #[must_use]
    pub fn max_vertex(&self) -> Option<usize> {
        self.vertices.iter().copied().max()
    }
}
