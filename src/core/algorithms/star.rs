//! Per-point star of incident simplices.
//!
//! The star of `p_mid` mirrors every simplex with minimum vertex `p_mid` as
//! it is created, in any layer. New simplices arrive one at a time; the star
//! waits until every face incident to both `p_mid` and the new point has a
//! simplex on both sides, then updates atomically:
//!
//! 1. locate the destroyed star simplices by a worklist from the latest
//!    registered simplex;
//! 2. clone the registered simplices into the star and restitch its hull;
//! 3. forward the old and new boundary faces to the hole triangulation of
//!    `p_mid`, whose new simplices are returned to the caller.

use crate::core::collections::{FaceKeyBuffer, FastHashMap, SimplexFaceBuffer, SimplexKeyBuffer};
use crate::core::simplex::{Layer, SimplexKind};
use crate::core::triangulation_data_structure::{
    FaceKey, HistoryError, SimplexKey, Tds, UniqueFaceKey,
};

use super::hole_triangulation::HoleTriangulator;
use super::triangulator::{rotate_through_dead_simplices, rotate_through_simplices};

/// Star of a single point.
#[derive(Clone, Debug)]
pub struct Star {
    p_mid: usize,
    registered: Vec<SimplexKey>,
    /// Star faces of the ongoing update that still wait for their second
    /// simplex, with the orientation of the side already seen.
    pending: FastHashMap<UniqueFaceKey, bool>,
    face_latest: Option<FaceKey>,
    simplex_latest: Option<SimplexKey>,
}

impl Star {
    /// Empty star around `p_mid`.
    #[must_use]
    pub fn new(p_mid: usize) -> Self {
        Self {
            p_mid,
            registered: Vec::new(),
            pending: FastHashMap::default(),
            face_latest: None,
            simplex_latest: None,
        }
    }

    /// The middle point.
    #[must_use]
    pub const fn p_mid(&self) -> usize {
        self.p_mid
    }

    /// The newest star face, used to seed point location.
    #[must_use]
    pub const fn face_latest(&self) -> Option<FaceKey> {
        self.face_latest
    }

    /// Number of registered faces still waiting for their second simplex.
    #[must_use]
    pub fn unmatched_faces(&self) -> usize {
        self.pending.len()
    }

    /// Check that no registered face is left without its second simplex
    /// once all simplices of the insertion of `p_new` are distributed.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError::StarAccounting`] if faces are still pending.
    pub fn check_settled(&self, p_new: usize) -> Result<(), HistoryError> {
        if self.pending.is_empty() {
            Ok(())
        } else {
            Err(self.accounting_error(p_new))
        }
    }

    const fn accounting_error(&self, p_new: usize) -> HistoryError {
        HistoryError::StarAccounting {
            star: self.p_mid,
            point: p_new,
        }
    }

    /// Register a new simplex with minimum vertex `p_mid`. Once all faces
    /// incident to `p_mid` and `p_new` are matched, update the star and the
    /// hole triangulation and return the hole triangulation's new simplices.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError::StarAccounting`] if a face is matched that
    /// is not pending on its other side, and propagates link, walk and
    /// predicate failures.
    pub fn register_simplex<const D: usize>(
        &mut self,
        tds: &mut Tds<D>,
        hole: &mut HoleTriangulator,
        new_simplex: SimplexKey,
        p_new: usize,
    ) -> Result<SimplexKeyBuffer, HistoryError> {
        self.registered.push(new_simplex);
        if !tds.is_facet(new_simplex) {
            self.simplex_latest = Some(new_simplex);
        }
        self.ensure_star_faces(tds, new_simplex, p_new)?;
        if !self.pending.is_empty() {
            return Ok(SimplexKeyBuffer::new());
        }

        let hole_simplices = if p_new + 1 == self.p_mid + D {
            self.init_with_first_face(tds)?;
            SimplexKeyBuffer::new()
        } else {
            tracing::trace!(star = self.p_mid, p_new, "updating star");
            let destroyed = self.find_destroyed_simplices(tds, p_new)?;
            let mut old_boundary = FaceKeyBuffer::new();
            for &s in &destroyed {
                if !tds.is_facet(s) {
                    old_boundary.push(tds.reverse(tds.face_opposite(s, self.p_mid)?));
                }
            }
            let new_boundary = self.update_star(tds, p_new, &destroyed)?;
            hole.update(tds, p_new, &old_boundary, &new_boundary)?
        };
        self.registered.clear();
        Ok(hole_simplices)
    }

    /// Clone every face of `s` incident to `p_mid` and `p_new` into the star
    /// on first sight; on second sight the face must be pending with the
    /// opposite orientation.
    fn ensure_star_faces<const D: usize>(
        &mut self,
        tds: &mut Tds<D>,
        s: SimplexKey,
        p_new: usize,
    ) -> Result<(), HistoryError> {
        let faces: SimplexFaceBuffer = tds.simplex_faces(s).iter().copied().collect();
        for f in faces {
            if !(tds.has_vertex(f, self.p_mid) && tds.has_vertex(f, p_new)) {
                continue;
            }
            let (unique, is_reverse) = tds
                .face(f)
                .map(|face| (face.unique(), face.is_reverse()))
                .ok_or_else(|| HistoryError::MissingLink {
                    message: format!("face {f:?} of simplex {s:?}"),
                })?;
            if tds.face_star(f).is_some() {
                match self.pending.remove(&unique) {
                    Some(seen) if seen != is_reverse => {}
                    _ => return Err(self.accounting_error(p_new)),
                }
            } else {
                let star_face = tds.clone_face(f);
                tds.set_face_star(star_face);
                self.face_latest = Some(star_face);
                self.pending.insert(unique, is_reverse);
            }
        }
        Ok(())
    }

    /// Clone the two facets of the very first face into the star.
    fn init_with_first_face<const D: usize>(
        &self,
        tds: &mut Tds<D>,
    ) -> Result<(), HistoryError> {
        let (Some(&first), Some(&second)) = (self.registered.first(), self.registered.get(1))
        else {
            return Err(HistoryError::MissingSimplex {
                message: format!("first facets of star {}", self.p_mid),
            });
        };
        let first_face = tds.simplex_faces(first)[0];
        let star_face = tds.face_star(first_face).ok_or_else(|| HistoryError::MissingLink {
            message: format!("star face of {first_face:?}"),
        })?;
        let star_back = tds.reverse(star_face);
        for idx in 0..D {
            tds.set_hull_neighbor(star_face, idx, star_back);
            tds.set_hull_neighbor(star_back, idx, star_face);
        }
        let layer = Layer::Star(self.p_mid);
        let clone = tds.new_facet(star_face, layer, None);
        tds.set_original(clone, first);
        let clone = tds.new_facet(star_back, layer, None);
        tds.set_original(clone, second);
        Ok(())
    }

    /// Destroy, by worklist from the latest registered simplex, every alive
    /// star simplex whose circumsphere contains `p_new`.
    fn find_destroyed_simplices<const D: usize>(
        &self,
        tds: &mut Tds<D>,
        p_new: usize,
    ) -> Result<Vec<SimplexKey>, HistoryError> {
        let latest = self.simplex_latest.ok_or_else(|| HistoryError::MissingSimplex {
            message: format!("no simplex registered with star {}", self.p_mid),
        })?;
        let base = tds.face_opposite(latest, p_new)?;
        let start = tds
            .face_star(base)
            .and_then(|f| tds.simplex_of(f))
            .ok_or_else(|| HistoryError::MissingSimplex {
                message: format!("star simplex behind {base:?}"),
            })?;

        let mut destroyed = Vec::new();
        let mut to_explore = vec![start];
        while let Some(s) = to_explore.pop() {
            // The death stamp doubles as the visited marker.
            if !tds.is_alive(s) || !tds.contains_point_in_circumsphere(s, p_new)? {
                continue;
            }
            tds.kill(s, p_new);
            destroyed.push(s);
            for &f in tds.simplex_faces(s) {
                if let Some(behind) = tds.simplex_of(tds.reverse(f)) {
                    to_explore.push(behind);
                }
            }
            if let Some(simplex) = tds.simplex(s)
                && let SimplexKind::Facet { face } = *simplex.kind()
            {
                let points = *tds.face_points(face);
                for (idx, &p) in points.iter().enumerate() {
                    // Nothing lies behind the star boundary.
                    if p == self.p_mid {
                        continue;
                    }
                    if let Some(behind) = tds.simplex_of(tds.hull_neighbor(face, idx)?) {
                        to_explore.push(behind);
                    }
                }
            }
        }
        Ok(destroyed)
    }

    /// Clone the registered simplices into the star, link the new boundary
    /// and restitch the star hull. Returns the new boundary faces.
    fn update_star<const D: usize>(
        &self,
        tds: &mut Tds<D>,
        p_new: usize,
        destroyed: &[SimplexKey],
    ) -> Result<FaceKeyBuffer, HistoryError> {
        let layer = Layer::Star(self.p_mid);
        let mut new_facets: Vec<FaceKey> = Vec::new();
        let mut new_boundary = FaceKeyBuffer::new();

        for &s in &self.registered {
            let faces: SimplexFaceBuffer = tds.simplex_faces(s).iter().copied().collect();
            match tds.simplex(s).and_then(|x| x.apex()) {
                Some(apex) => {
                    let mut star_faces = SimplexFaceBuffer::new();
                    for f in faces {
                        if tds.has_vertex(f, self.p_mid) {
                            star_faces.push(self.star_face_of(tds, f)?);
                        } else {
                            let inside = tds.clone_face(f);
                            star_faces.push(inside);
                            new_boundary.push(tds.reverse(inside));
                        }
                    }
                    let clone = tds.new_simplex(star_faces, apex, layer, None);
                    tds.set_original(clone, s);
                }
                None => {
                    let star_face = self.star_face_of(tds, faces[0])?;
                    let clone = tds.new_facet(star_face, layer, None);
                    tds.set_original(clone, s);
                    new_facets.push(star_face);
                }
            }
        }

        // Boundary faces: link to the neighboring boundary face, or to the
        // facet incident to p_mid where the boundary ends.
        for &face in &new_boundary {
            let points = *tds.face_points(face);
            for (idx, &p_opposite) in points.iter().enumerate() {
                if tds.face(face).is_some_and(|f| f.hull_neighbors()[idx].is_some()) {
                    continue;
                }
                let inner = tds.proper_simplex_of(tds.reverse(face)).ok_or_else(|| {
                    HistoryError::MissingSimplex {
                        message: format!("star simplex inside {face:?}"),
                    }
                })?;
                let outside = tds.reverse(tds.face_opposite(inner, p_opposite)?);
                let target = match tds.proper_simplex_of(outside) {
                    Some(neighbor) => tds.reverse(tds.face_opposite(neighbor, self.p_mid)?),
                    None => outside,
                };
                tds.hull_link(face, target, idx)?;
            }
        }

        // Ridges of new facets through p_new: rotate through new simplices.
        for &face in &new_facets {
            let points = *tds.face_points(face);
            for (idx, &p_opposite) in points.iter().enumerate() {
                if p_opposite == p_new
                    || tds.face(face).is_some_and(|f| f.hull_neighbors()[idx].is_some())
                {
                    continue;
                }
                let neighbor = tds.reverse(rotate_through_simplices(tds, face, p_opposite)?);
                tds.hull_link(face, neighbor, idx)?;
            }
        }

        // Ridges opposite p_new that stay on the hull: from each destroyed
        // facet rotate through dead simplices, then back through the new
        // ones, to find the new facet that took over the ridge.
        for &s in destroyed {
            if !tds.is_facet(s) {
                continue;
            }
            let face = tds.simplex_faces(s)[0];
            let points = *tds.face_points(face);
            for (idx, &p_opposite) in points.iter().enumerate() {
                if p_opposite == self.p_mid {
                    continue;
                }
                let neighbor = tds.hull_neighbor(face, idx)?;
                let neighbor_simplex =
                    tds.simplex_of(neighbor)
                        .ok_or_else(|| HistoryError::MissingSimplex {
                            message: format!("star facet on {neighbor:?}"),
                        })?;
                if !tds.is_alive(neighbor_simplex)
                    || tds.simplex_max_point(neighbor_simplex) == p_new
                {
                    continue;
                }
                let rotated = tds.reverse(rotate_through_dead_simplices(tds, face, p_opposite)?);
                let p = tds.point_opposite(rotated, face, p_opposite)?;
                let replacing = tds.reverse(rotate_through_simplices(tds, rotated, p)?);
                tds.hull_link_opposite(replacing, neighbor, p_new)?;
            }
        }

        Ok(new_boundary)
    }

    fn star_face_of<const D: usize>(
        &self,
        tds: &Tds<D>,
        f: FaceKey,
    ) -> Result<FaceKey, HistoryError> {
        tds.face_star(f).ok_or_else(|| HistoryError::MissingLink {
            message: format!("face {f:?} has no instance in star {}", self.p_mid),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::algorithms::incremental_insertion::IncrementalTriangulator;
    use crate::geometry::point::Point;

    #[test]
    fn test_new_star_is_empty() {
        let star = Star::new(4);
        assert_eq!(star.p_mid(), 4);
        assert_eq!(star.unmatched_faces(), 0);
        assert!(star.face_latest().is_none());
    }

    #[test]
    fn test_first_face_initializes_star() {
        let mut tds = Tds::new(false);
        for (i, c) in [[0.0, 0.0], [1.0, 0.0]].into_iter().enumerate() {
            tds.push_point(Point::new(c, i));
        }
        let mut tri = IncrementalTriangulator::new();
        let mut star = Star::new(0);
        let mut hole = HoleTriangulator::new(0);
        tri.add_point(&mut tds, 0, None).unwrap();
        let facets = tri.add_point(&mut tds, 1, None).unwrap();

        let first = star
            .register_simplex(&mut tds, &mut hole, facets[0], 1)
            .unwrap();
        assert!(first.is_empty());
        assert_eq!(star.unmatched_faces(), 1);

        let second = star
            .register_simplex(&mut tds, &mut hole, facets[1], 1)
            .unwrap();
        assert!(second.is_empty());
        assert_eq!(star.unmatched_faces(), 0);

        let clones: Vec<_> = tds
            .simplices()
            .filter(|(_, s)| s.layer() == Layer::Star(0))
            .map(|(k, _)| k)
            .collect();
        assert_eq!(clones.len(), 2);
        for k in clones {
            let original = tds.original(k).unwrap();
            assert!(facets.contains(&original));
        }
        assert!(star.face_latest().is_some());
        assert!(tds.validate().is_ok());
    }

    #[test]
    fn test_over_matching_is_an_accounting_error() {
        let mut tds = Tds::new(false);
        for (i, c) in [[0.0, 0.0], [1.0, 0.0]].into_iter().enumerate() {
            tds.push_point(Point::new(c, i));
        }
        let mut tri = IncrementalTriangulator::new();
        tri.add_point(&mut tds, 0, None).unwrap();
        let facets = tri.add_point(&mut tds, 1, None).unwrap();

        // A star that never saw the first facet cannot match the second one
        // once another star already created the shared star face.
        let mut seen = Star::new(0);
        let mut hole = HoleTriangulator::new(0);
        seen.register_simplex(&mut tds, &mut hole, facets[0], 1)
            .unwrap();
        let mut fresh = Star::new(0);
        let err = fresh
            .register_simplex(&mut tds, &mut hole, facets[1], 1)
            .unwrap_err();
        assert_eq!(err, HistoryError::StarAccounting { star: 0, point: 1 });
    }

    #[test]
    fn test_registering_the_same_side_twice_is_an_accounting_error() {
        let mut tds = Tds::new(false);
        for (i, c) in [[0.0, 0.0], [1.0, 0.0]].into_iter().enumerate() {
            tds.push_point(Point::new(c, i));
        }
        let mut tri = IncrementalTriangulator::new();
        tri.add_point(&mut tds, 0, None).unwrap();
        let facets = tri.add_point(&mut tds, 1, None).unwrap();

        let mut star = Star::new(0);
        let mut hole = HoleTriangulator::new(0);
        star.register_simplex(&mut tds, &mut hole, facets[0], 1)
            .unwrap();
        assert_eq!(star.unmatched_faces(), 1);
        let err = star
            .register_simplex(&mut tds, &mut hole, facets[0], 1)
            .unwrap_err();
        assert_eq!(err, HistoryError::StarAccounting { star: 0, point: 1 });

        // No star facet was cloned from the duplicate.
        let clones = tds
            .simplices()
            .filter(|(_, s)| s.layer() == Layer::Star(0))
            .count();
        assert_eq!(clones, 0);
    }

    #[test]
    fn test_unsettled_star_is_an_accounting_error() {
        let mut tds = Tds::new(false);
        for (i, c) in [[0.0, 0.0], [1.0, 0.0]].into_iter().enumerate() {
            tds.push_point(Point::new(c, i));
        }
        let mut tri = IncrementalTriangulator::new();
        tri.add_point(&mut tds, 0, None).unwrap();
        let facets = tri.add_point(&mut tds, 1, None).unwrap();

        let mut star = Star::new(0);
        let mut hole = HoleTriangulator::new(0);
        assert!(star.check_settled(1).is_ok());
        star.register_simplex(&mut tds, &mut hole, facets[0], 1)
            .unwrap();
        assert_eq!(
            star.check_settled(1),
            Err(HistoryError::StarAccounting { star: 0, point: 1 })
        );
        star.register_simplex(&mut tds, &mut hole, facets[1], 1)
            .unwrap();
        assert!(star.check_settled(1).is_ok());
    }
}
