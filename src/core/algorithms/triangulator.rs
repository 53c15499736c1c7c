//! Insertion protocol shared by the ground-truth and hole triangulators.
//!
//! Inserting a point proceeds in three steps:
//! 1. excavate: starting from a known conflict, destroy every alive simplex
//!    whose circumsphere contains the new point (facets count as conflicts
//!    when their hull face is visible);
//! 2. collect the faces of the cavity that the new point attaches to;
//! 3. create one new simplex per attaching face, with the new point as apex.
//!
//! The first two steps differ per triangulator and are left to the
//! implementors of [`Triangulator`]; exploration and ridge rotation are
//! shared here.

use crate::core::collections::SimplexFaceBuffer;
use crate::core::simplex::{Layer, SimplexKind};
use crate::core::triangulation_data_structure::{FaceKey, HistoryError, SimplexKey, Tds};

/// Scratch state of one insertion.
#[derive(Clone, Debug, Default)]
pub struct CavityState {
    /// Faces the new point attaches to.
    pub(crate) attaching_faces: Vec<FaceKey>,
    /// Simplices destroyed by the new point.
    pub(crate) destroyed: Vec<SimplexKey>,
    /// Worklist for [`Triangulator::explore_and_destroy`].
    pub(crate) to_explore: Vec<SimplexKey>,
}

/// Hooks of the shared insertion protocol.
pub trait Triangulator {
    /// Scratch state of the current insertion.
    fn cavity(&mut self) -> &mut CavityState;

    /// Birth stamp given to every simplex this triangulator creates.
    fn last_previous_killer(&self) -> Option<usize>;

    /// Layer tag of the simplices this triangulator creates.
    fn layer(&self) -> Layer;

    /// Stamp `s` as destroyed by `p_new` and remember it.
    fn destroy<const D: usize>(&mut self, tds: &mut Tds<D>, s: SimplexKey, p_new: usize) {
        tds.kill(s, p_new);
        self.cavity().destroyed.push(s);
    }

    /// Queue the simplex attached to `f`, if any.
    fn queue_simplex_of<const D: usize>(&mut self, tds: &Tds<D>, f: FaceKey) {
        if let Some(s) = tds.simplex_of(f) {
            self.cavity().to_explore.push(s);
        }
    }

    /// Drain the worklist, destroying every alive simplex whose circumsphere
    /// contains `p_new` and queueing its neighbors across faces and, for
    /// facets, across hull ridges.
    ///
    /// # Errors
    ///
    /// Propagates predicate failures.
    fn explore_and_destroy<const D: usize>(
        &mut self,
        tds: &mut Tds<D>,
        p_new: usize,
    ) -> Result<(), HistoryError> {
        while let Some(s) = self.cavity().to_explore.pop() {
            if !tds.is_alive(s) || !tds.contains_point_in_circumsphere(s, p_new)? {
                continue;
            }
            self.destroy(tds, s, p_new);
            let faces: SimplexFaceBuffer = tds.simplex_faces(s).iter().copied().collect();
            for f in faces {
                self.queue_simplex_of(tds, tds.reverse(f));
            }
            if let Some(simplex) = tds.simplex(s)
                && let SimplexKind::Facet { face } = *simplex.kind()
            {
                let neighbors = tds
                    .face(face)
                    .map_or([None; D], |f| *f.hull_neighbors());
                for neighbor in neighbors.into_iter().flatten() {
                    self.queue_simplex_of(tds, neighbor);
                }
            }
        }
        Ok(())
    }
}

/// Rotate around the ridge of `face` opposite `p_opposite`, against the
/// direction `face` is facing, while the simplices behind are proper and
/// dead. Returns the last face reached.
///
/// # Errors
///
/// Returns [`HistoryError::WalkCycle`] if the rotation does not terminate
/// within the arena size.
pub fn rotate_through_dead_simplices<const D: usize>(
    tds: &Tds<D>,
    face: FaceKey,
    p_opposite: usize,
) -> Result<FaceKey, HistoryError> {
    rotate_through_simplices_general(tds, face, p_opposite, true)
}

/// Rotate around the ridge of `face` opposite `p_opposite` while proper
/// simplices are found. Returns the last face reached.
///
/// # Errors
///
/// Returns [`HistoryError::WalkCycle`] if the rotation does not terminate
/// within the arena size.
pub fn rotate_through_simplices<const D: usize>(
    tds: &Tds<D>,
    face: FaceKey,
    p_opposite: usize,
) -> Result<FaceKey, HistoryError> {
    rotate_through_simplices_general(tds, face, p_opposite, false)
}

fn rotate_through_simplices_general<const D: usize>(
    tds: &Tds<D>,
    mut face: FaceKey,
    mut p_opposite: usize,
    only_dead: bool,
) -> Result<FaceKey, HistoryError> {
    let bound = tds.walk_bound();
    for _ in 0..bound {
        let Some(next) = tds.proper_simplex_of(tds.reverse(face)) else {
            return Ok(face);
        };
        if only_dead && tds.is_alive(next) {
            return Ok(face);
        }
        let face_next = tds.face_opposite(next, p_opposite)?;
        p_opposite = tds.point_opposite(face_next, face, p_opposite)?;
        face = face_next;
    }
    Err(HistoryError::WalkCycle { steps: bound })
}
