//! Triangulation of the hole left by removing a single point.
//!
//! The hole triangulation of `p_mid` is the Delaunay triangulation of the
//! later points that lie inside the star of `p_mid`. Its boundary faces are
//! cross-linked 1:1 with the boundary faces of the star. The part of its hull
//! made of boundary faces is the *back hull*; the remaining hull faces carry
//! facets and form the *front hull*.
//!
//! Each star update hands over the old boundary faces (now destroyed) and the
//! new ones. The update then runs in three phases:
//!
//! 1. excavate from the old boundary and from front hull faces visible to the
//!    new point, and collect the faces to attach to;
//! 2. clone the new boundary into the hole and link it to its neighbors;
//! 3. create the new simplices and facets and complete the hull links.

use crate::core::collections::{FaceKeySet, SimplexFaceBuffer, SimplexKeyBuffer};
use crate::core::simplex::Layer;
use crate::core::triangulation_data_structure::{FaceKey, HistoryError, SimplexKey, Tds};

use super::triangulator::{CavityState, Triangulator, rotate_through_dead_simplices};

/// Hole triangulation of a single point.
#[derive(Clone, Debug)]
pub struct HoleTriangulator {
    p_mid: usize,
    cavity: CavityState,
}

impl Triangulator for HoleTriangulator {
    fn cavity(&mut self) -> &mut CavityState {
        &mut self.cavity
    }

    fn last_previous_killer(&self) -> Option<usize> {
        Some(self.p_mid)
    }

    fn layer(&self) -> Layer {
        Layer::Hole(self.p_mid)
    }
}

impl HoleTriangulator {
    /// Empty hole triangulation of `p_mid`.
    #[must_use]
    pub fn new(p_mid: usize) -> Self {
        Self {
            p_mid,
            cavity: CavityState::default(),
        }
    }

    /// The removed point.
    #[must_use]
    pub const fn p_mid(&self) -> usize {
        self.p_mid
    }

    /// Insert `p_new` given the star boundary faces it destroyed and the ones
    /// it created. Returns the new simplices and facets.
    ///
    /// # Errors
    ///
    /// Propagates link, walk and predicate failures.
    pub fn update<const D: usize>(
        &mut self,
        tds: &mut Tds<D>,
        p_new: usize,
        old_boundary: &[FaceKey],
        new_boundary: &[FaceKey],
    ) -> Result<SimplexKeyBuffer, HistoryError> {
        tracing::trace!(
            hole = self.p_mid,
            p_new,
            old = old_boundary.len(),
            new = new_boundary.len(),
            "updating hole triangulation"
        );
        self.destroy_and_find_attaching_faces(tds, p_new, old_boundary, new_boundary)?;
        self.create_and_link_new_boundary(tds, p_new, old_boundary, new_boundary)?;
        self.create_new_simplices(tds, p_new, new_boundary)
    }

    fn destroy_and_find_attaching_faces<const D: usize>(
        &mut self,
        tds: &mut Tds<D>,
        p_new: usize,
        old_boundary: &[FaceKey],
        new_boundary: &[FaceKey],
    ) -> Result<(), HistoryError> {
        let mut starts = Vec::with_capacity(old_boundary.len() + new_boundary.len());
        for &star_old in old_boundary {
            let hole_face = tds.boundary(star_old)?;
            starts.push(if tds.faces_point(star_old, p_new)? {
                hole_face
            } else {
                tds.reverse(hole_face)
            });
        }
        // Visible covering faces on the front hull. The back hull is reached
        // through the old boundary already.
        for &star_new in new_boundary {
            let neighbor = tds.hull_neighbor_opposite(star_new, p_new)?;
            let Some(boundary_neighbor) = tds.face(neighbor).and_then(|f| f.boundary()) else {
                continue;
            };
            let idx = tds.point_opposite_index(boundary_neighbor, star_new, p_new)?;
            let covering = tds.hull_neighbor(boundary_neighbor, idx)?;
            if tds.simplex_of(covering).is_some() && tds.faces_point(covering, p_new)? {
                starts.push(covering);
            }
        }

        // The cavity need not be connected, so excavate from every start.
        let mut marked = FaceKeySet::default();
        for face in starts {
            self.excavate(tds, p_new, face, &mut marked)?;
        }
        self.find_attaching_faces(tds, p_new)
    }

    /// Excavate from `start`. A hull face is explored along the hull, since
    /// the back hull carries no simplices.
    fn excavate<const D: usize>(
        &mut self,
        tds: &mut Tds<D>,
        p_new: usize,
        start: FaceKey,
        marked: &mut FaceKeySet,
    ) -> Result<(), HistoryError> {
        if let Some(s) = tds.proper_simplex_of(start) {
            self.cavity.to_explore.push(s);
            return self.explore_and_destroy(tds, p_new);
        }

        let mut stack = vec![start];
        while let Some(face) = stack.pop() {
            if marked.contains(&face) {
                continue;
            }
            let own = tds.simplex_of(face);
            let exposed = match own {
                // front hull
                Some(s) => tds.is_alive(s),
                // old boundary face
                None => {
                    let inside = tds.reverse(tds.boundary(face)?);
                    tds.simplex_of(inside).is_some_and(|s| !tds.is_alive(s))
                }
            };
            if !exposed || !tds.faces_point(face, p_new)? {
                continue;
            }
            marked.insert(face);
            if let Some(s) = own {
                self.destroy(tds, s, p_new);
            }
            if let Some(behind) = tds.simplex_of(tds.reverse(face)) {
                if tds.contains_point_in_circumsphere(behind, p_new)? {
                    self.cavity.to_explore.push(behind);
                } else if own.is_none() {
                    // The cavity already ends at the old boundary.
                    self.cavity.attaching_faces.push(face);
                }
            }
            let neighbors = tds.face(face).map_or([None; D], |f| *f.hull_neighbors());
            stack.extend(neighbors.into_iter().flatten());
        }
        self.explore_and_destroy(tds, p_new)
    }

    /// Attach to cavity faces whose new simplex would still have `p_mid` in
    /// its circumsphere.
    fn find_attaching_faces<const D: usize>(
        &mut self,
        tds: &Tds<D>,
        p_new: usize,
    ) -> Result<(), HistoryError> {
        let destroyed = std::mem::take(&mut self.cavity.destroyed);
        for s in destroyed {
            for &f in tds.simplex_faces(s) {
                let behind_ok = tds
                    .simplex_of(tds.reverse(f))
                    .is_none_or(|behind| tds.is_alive(behind));
                if behind_ok && tds.simplex_contains_point_in_circumsphere(f, p_new, self.p_mid)? {
                    self.cavity.attaching_faces.push(f);
                }
            }
        }
        Ok(())
    }

    /// Clone the new star boundary into the hole, cross-link both copies and
    /// set the hull links that do not depend on the new simplices.
    fn create_and_link_new_boundary<const D: usize>(
        &self,
        tds: &mut Tds<D>,
        p_new: usize,
        old_boundary: &[FaceKey],
        new_boundary: &[FaceKey],
    ) -> Result<(), HistoryError> {
        for &star_face in new_boundary {
            let hole_face = tds.clone_face(star_face);
            tds.set_boundary_pair(star_face, hole_face);

            // Ridges through p_new: link to the adjacent boundary face if it
            // already exists.
            let points = *tds.face_points(hole_face);
            for (idx, &p_opposite) in points.iter().enumerate() {
                if p_opposite == p_new
                    || tds.face(hole_face).is_some_and(|f| f.hull_neighbors()[idx].is_some())
                {
                    continue;
                }
                let star_neighbor = tds.hull_neighbor(star_face, idx)?;
                if let Some(boundary_neighbor) = tds.face(star_neighbor).and_then(|f| f.boundary())
                {
                    tds.hull_link(hole_face, boundary_neighbor, idx)?;
                }
            }

            // Ridge opposite p_new, where the boundary extends past it.
            let star_opposite = tds.hull_neighbor_opposite(star_face, p_new)?;
            let Some(boundary_opposite) = tds.face(star_opposite).and_then(|f| f.boundary())
            else {
                continue;
            };
            let idx = tds.point_opposite_index(boundary_opposite, star_face, p_new)?;
            let beyond = tds.hull_neighbor(boundary_opposite, idx)?;
            let beyond_simplex = tds.simplex_of(beyond);
            let hole_back = tds.reverse(hole_face);
            if beyond_simplex.is_some_and(|s| tds.is_facet(s)) {
                // The old boundary ended here and its facet survives.
                if beyond_simplex.is_some_and(|s| tds.is_alive(s)) {
                    tds.hull_link_opposite(hole_back, beyond, p_new)?;
                }
            } else {
                // hole_face replaces a boundary face: rotate through dead
                // simplices from there, and if a dead front hull facet is hit
                // whose neighbor survives, link to that neighbor.
                let p = tds.point_opposite(beyond, hole_face, p_new)?;
                let front = tds.reverse(rotate_through_dead_simplices(tds, beyond, p)?);
                if let Some(s) = tds.simplex_of(front)
                    && tds.is_facet(s)
                    && !tds.is_alive(s)
                {
                    let j = tds.point_opposite_index(front, hole_face, p_new)?;
                    let front_neighbor = tds.hull_neighbor(front, j)?;
                    if tds
                        .simplex_of(front_neighbor)
                        .is_some_and(|ns| tds.is_alive(ns))
                    {
                        tds.hull_link_opposite(hole_back, front_neighbor, p_new)?;
                    }
                }
            }
            tds.hull_link_opposite(hole_face, boundary_opposite, p_new)?;
        }

        // Ridges opposite p_new where the star still ends.
        for &star_old in old_boundary {
            for idx in 0..D {
                let star_neighbor = tds.hull_neighbor(star_old, idx)?;
                if !tds.has_vertex(star_neighbor, self.p_mid)
                    || tds.simplex_of(tds.reverse(star_neighbor))
                        == tds.simplex_of(tds.reverse(star_old))
                {
                    continue;
                }
                let replacing =
                    tds.boundary(tds.hull_neighbor_opposite(star_neighbor, self.p_mid)?)?;
                let j = tds.point_opposite_index(star_old, replacing, p_new)?;
                let front_old = tds.hull_neighbor(tds.boundary(star_old)?, j)?;
                let front_dead = tds.simplex_of(front_old).is_none_or(|s| !tds.is_alive(s));
                if front_dead {
                    tds.hull_link_opposite(replacing, tds.reverse(replacing), p_new)?;
                } else {
                    tds.hull_link_opposite(replacing, front_old, p_new)?;
                }
            }
        }

        // The first boundary face links to its own twin.
        if p_new == self.p_mid + D
            && let Some(&first) = new_boundary.first()
        {
            let boundary = tds.boundary(first)?;
            tds.hull_link_opposite(boundary, tds.reverse(boundary), p_new)?;
        }
        Ok(())
    }

    fn create_new_simplices<const D: usize>(
        &mut self,
        tds: &mut Tds<D>,
        p_new: usize,
        new_boundary: &[FaceKey],
    ) -> Result<SimplexKeyBuffer, HistoryError> {
        let layer = self.layer();
        let lpk = self.last_previous_killer();
        let attaching = std::mem::take(&mut self.cavity.attaching_faces);
        let marked: FaceKeySet = attaching.iter().copied().collect();
        let bound = tds.walk_bound();
        let mut created = SimplexKeyBuffer::new();

        for &base in &attaching {
            let base_points = *tds.face_points(base);
            let mut faces = SimplexFaceBuffer::new();
            faces.push(base);
            for (idx, &p_opposite) in base_points.iter().enumerate() {
                let face = self.find_or_create_side(
                    tds,
                    p_new,
                    base,
                    idx,
                    p_opposite,
                    &marked,
                    bound,
                    &mut created,
                )?;
                faces.push(face);
            }
            created.push(tds.new_simplex(faces, p_new, layer, lpk));
        }

        // Boundary faces without a simplex behind lie on the front hull.
        for &star_face in new_boundary {
            let outer = tds.reverse(tds.boundary(star_face)?);
            if tds.simplex_of(outer).is_none() {
                created.push(tds.new_facet(outer, layer, lpk));
            }
        }

        // Front hull links through p_new: rotate through the new simplices,
        // crossing the back hull where it continues.
        let facets: SimplexKeyBuffer = created
            .iter()
            .copied()
            .filter(|&s| tds.is_facet(s))
            .collect();
        for s in facets {
            let face = tds.simplex_faces(s)[0];
            let points = *tds.face_points(face);
            for (idx, &p_opposite) in points.iter().enumerate() {
                if p_opposite == p_new
                    || tds.face(face).is_some_and(|f| f.hull_neighbors()[idx].is_some())
                {
                    continue;
                }
                let target = walk_to_front_hull(tds, face, p_opposite, bound)?;
                tds.hull_link(face, target, idx)?;
            }
        }
        Ok(created)
    }

    /// Rotate around the ridge of `base` opposite `p_opposite` towards `p_new`
    /// to find the face shared with the neighboring new simplex, or create
    /// it. Each pass makes one hull step; the rotation crosses at most the
    /// front and the back hull before a last rotation through dead simplices.
    #[expect(
        clippy::too_many_arguments,
        reason = "Walk state of one side of a new simplex, threaded through a single call"
    )]
    fn find_or_create_side<const D: usize>(
        &self,
        tds: &mut Tds<D>,
        p_new: usize,
        base: FaceKey,
        idx: usize,
        p_opposite: usize,
        marked: &FaceKeySet,
        bound: usize,
        created: &mut SimplexKeyBuffer,
    ) -> Result<FaceKey, HistoryError> {
        let mut current = tds.reverse(base);
        for _ in 0..bound {
            let p = tds.point_opposite(current, base, p_opposite)?;
            current = rotate_through_dead_simplices(tds, current, p)?;

            if marked.contains(&current) {
                let q = tds.point_opposite(current, base, p_opposite)?;
                if let Some(neighbor) = tds.proper_simplex_of(current)
                    && tds.simplex_max_point(neighbor) == p_new
                {
                    // The neighboring simplex exists; share its face.
                    return Ok(tds.reverse(tds.face_opposite(neighbor, q)?));
                }
                return Ok(tds.create_face_facing(base, p_new, idx));
            }

            // A hull was hit: step over the ridge on the hull.
            let current_back = tds.reverse(current);
            let j = tds.point_opposite_index(current, base, p_opposite)?;
            let hull_neighbor = tds.hull_neighbor(current_back, j)?;
            let k = tds.point_opposite_index(hull_neighbor, base, p_opposite)?;
            let across = tds.hull_neighbor(hull_neighbor, k)?;
            if across != current_back {
                // The new boundary begins here.
                return Ok(tds.reverse(across));
            }
            if (tds.simplex_of(current_back).is_some() || tds.simplex_of(hull_neighbor).is_some())
                && !tds.faces_point(hull_neighbor, p_new)?
            {
                // Front hull not visible from p_new: a new facet starts here.
                let face_new = tds.create_face_facing(base, p_new, idx);
                let outer = tds.reverse(face_new);
                created.push(tds.new_facet(outer, self.layer(), self.last_previous_killer()));
                tds.hull_link(outer, hull_neighbor, idx)?;
                return Ok(face_new);
            }
            current = hull_neighbor;
        }
        Err(HistoryError::WalkCycle { steps: bound })
    }
}

/// From the new facet `face`, rotate around its ridge opposite `p_opposite`
/// until the next hull face: a facet, or the end of the back hull.
fn walk_to_front_hull<const D: usize>(
    tds: &Tds<D>,
    face: FaceKey,
    p_opposite: usize,
    bound: usize,
) -> Result<FaceKey, HistoryError> {
    let mut current = tds.reverse(face);
    for _ in 0..bound {
        let next: Option<SimplexKey> = tds.simplex_of(current);
        match next {
            Some(s) if tds.is_facet(s) => return Ok(current),
            Some(s) => {
                let p = tds.point_opposite(current, face, p_opposite)?;
                current = tds.reverse(tds.face_opposite(s, p)?);
            }
            None => {
                let j = tds.point_opposite_index(current, face, p_opposite)?;
                match tds.face(current).and_then(|f| f.hull_neighbors()[j]) {
                    Some(boundary_neighbor) => current = tds.reverse(boundary_neighbor),
                    None => return Ok(current),
                }
            }
        }
    }
    Err(HistoryError::WalkCycle { steps: bound })
}
