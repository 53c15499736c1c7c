//! Ground-truth incremental Delaunay triangulation.
//!
//! The first D points are buffered and produce a single face with a facet on
//! each side. Every later point is inserted by excavating from a located
//! conflict, attaching to the cavity faces whose far side is still alive, and
//! creating one simplex per attaching face. Where the cavity reaches the hull
//! the new simplex gets a facet on its outer side, and hull links are
//! completed by rotating around the new ridges.

use crate::core::collections::{SimplexFaceBuffer, SimplexKeyBuffer};
use crate::core::simplex::Layer;
use crate::core::triangulation_data_structure::{FaceKey, HistoryError, SimplexKey, Tds};

use super::triangulator::{
    CavityState, Triangulator, rotate_through_dead_simplices, rotate_through_simplices,
};

/// Incremental Delaunay triangulation over all points inserted so far.
#[derive(Clone, Debug, Default)]
pub struct IncrementalTriangulator {
    cavity: CavityState,
    first_face_points: Vec<usize>,
}

impl Triangulator for IncrementalTriangulator {
    fn cavity(&mut self) -> &mut CavityState {
        &mut self.cavity
    }

    fn last_previous_killer(&self) -> Option<usize> {
        None
    }

    fn layer(&self) -> Layer {
        Layer::Ground
    }
}

impl IncrementalTriangulator {
    /// Create an empty triangulator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the initial face has been created.
    #[must_use]
    pub fn is_bootstrapped<const D: usize>(&self) -> bool {
        self.first_face_points.len() == D
    }

    /// Insert `p_new` given an alive simplex or facet whose circumsphere
    /// contains it. The first D points need no location.
    ///
    /// Returns the newly created simplices and facets.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError::MissingLocation`] if a point after the first
    /// D arrives without a location, and propagates link, walk and predicate
    /// failures.
    pub fn add_point<const D: usize>(
        &mut self,
        tds: &mut Tds<D>,
        p_new: usize,
        location: Option<SimplexKey>,
    ) -> Result<SimplexKeyBuffer, HistoryError> {
        if !self.is_bootstrapped::<D>() {
            self.first_face_points.push(p_new);
            if !self.is_bootstrapped::<D>() {
                return Ok(SimplexKeyBuffer::new());
            }
            return Ok(self.create_first_face(tds));
        }
        let location = location.ok_or(HistoryError::MissingLocation { index: p_new })?;
        self.cavity.to_explore.push(location);
        self.explore_and_destroy(tds, p_new)?;
        tracing::trace!(p_new, destroyed = self.cavity.destroyed.len(), "ground truth cavity");
        self.find_attaching_faces(tds);
        self.create_new_simplices(tds, p_new)
    }

    fn create_first_face<const D: usize>(&self, tds: &mut Tds<D>) -> SimplexKeyBuffer {
        let mut points = [0usize; D];
        points.copy_from_slice(&self.first_face_points);
        let front = tds.create_face(points);
        let back = tds.reverse(front);
        let mut created = SimplexKeyBuffer::new();
        created.push(tds.new_facet(front, self.layer(), self.last_previous_killer()));
        created.push(tds.new_facet(back, self.layer(), self.last_previous_killer()));
        for idx in 0..D {
            tds.set_hull_neighbor(front, idx, back);
            tds.set_hull_neighbor(back, idx, front);
        }
        created
    }

    /// Attach to every cavity face whose far side is alive.
    fn find_attaching_faces<const D: usize>(&mut self, tds: &Tds<D>) {
        let destroyed = std::mem::take(&mut self.cavity.destroyed);
        for s in destroyed {
            for &f in tds.simplex_faces(s) {
                if tds
                    .simplex_of(tds.reverse(f))
                    .is_some_and(|behind| tds.is_alive(behind))
                {
                    self.cavity.attaching_faces.push(f);
                }
            }
        }
    }

    fn create_new_simplices<const D: usize>(
        &mut self,
        tds: &mut Tds<D>,
        p_new: usize,
    ) -> Result<SimplexKeyBuffer, HistoryError> {
        let layer = self.layer();
        let lpk = self.last_previous_killer();
        let attaching = std::mem::take(&mut self.cavity.attaching_faces);
        let mut created = SimplexKeyBuffer::new();

        for &base in &attaching {
            let base_points = *tds.face_points(base);
            let mut faces = SimplexFaceBuffer::new();
            faces.push(base);
            for (idx, &p_opposite) in base_points.iter().enumerate() {
                if let Some(neighbor) = find_neighboring_attaching_face(tds, base, p_opposite)? {
                    let neighbor_simplex = tds.proper_simplex_of(neighbor);
                    if let Some(ns) = neighbor_simplex
                        && tds.simplex_max_point(ns) == p_new
                    {
                        // The neighboring new simplex exists; share its face.
                        let j = tds.point_opposite_index(neighbor, base, p_opposite)?;
                        let shared = tds.simplex_faces(ns).get(1 + j).copied().ok_or_else(|| {
                            HistoryError::MissingLink {
                                message: format!("face {} of new simplex {ns:?}", 1 + j),
                            }
                        })?;
                        faces.push(tds.reverse(shared));
                    } else {
                        faces.push(tds.create_face_facing(base, p_new, idx));
                    }
                } else {
                    // The new simplex meets the hull here.
                    let face_new = tds.create_face_facing(base, p_new, idx);
                    faces.push(face_new);
                    let outer = tds.reverse(face_new);
                    created.push(tds.new_facet(outer, layer, lpk));
                    let replaced = tds.reverse(rotate_through_dead_simplices(
                        tds,
                        tds.reverse(base),
                        p_opposite,
                    )?);
                    let j = tds.point_opposite_index(replaced, base, p_opposite)?;
                    let hull_neighbor = tds.hull_neighbor(replaced, j)?;
                    tds.hull_link(outer, hull_neighbor, idx)?;
                }
            }
            created.push(tds.new_simplex(faces, p_new, layer, lpk));
        }

        link_new_facets(tds, &created)?;
        Ok(created)
    }
}

/// Given an attaching face, find the attaching face sharing its ridge
/// opposite `p_opposite`, or `None` when the ridge lies on the new hull.
fn find_neighboring_attaching_face<const D: usize>(
    tds: &Tds<D>,
    face: FaceKey,
    p_opposite: usize,
) -> Result<Option<FaceKey>, HistoryError> {
    let rotated = rotate_through_dead_simplices(tds, tds.reverse(face), p_opposite)?;
    let behind = tds
        .simplex_of(tds.reverse(rotated))
        .ok_or_else(|| HistoryError::MissingSimplex {
            message: format!("behind rotated face {rotated:?}"),
        })?;
    if tds.is_alive(behind) {
        return Ok(Some(rotated));
    }

    // The rotation hit the hull: step across the ridge on the hull.
    let j = tds.point_opposite_index(rotated, face, p_opposite)?;
    let hull_neighbor = tds.hull_neighbor(tds.reverse(rotated), j)?;
    match tds.simplex_of(hull_neighbor) {
        Some(s) if !tds.is_facet(s) => Ok(Some(hull_neighbor)),
        Some(s) if !tds.is_alive(s) => {
            let p = tds.point_opposite(hull_neighbor, face, p_opposite)?;
            Ok(Some(rotate_through_dead_simplices(tds, hull_neighbor, p)?))
        }
        _ => Ok(None),
    }
}

/// Complete the hull links of new facets by rotating through the new
/// simplices around each still unlinked ridge.
fn link_new_facets<const D: usize>(
    tds: &mut Tds<D>,
    created: &[SimplexKey],
) -> Result<(), HistoryError> {
    for &s in created {
        if !tds.is_facet(s) {
            continue;
        }
        let face = tds.simplex_faces(s)[0];
        for idx in 0..D {
            if tds.face(face).is_some_and(|f| f.hull_neighbors()[idx].is_some()) {
                continue;
            }
            let p_opposite = tds.face_points(face)[idx];
            let neighbor = tds.reverse(rotate_through_simplices(tds, face, p_opposite)?);
            tds.hull_link(face, neighbor, idx)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::point::Point;

    fn tds_with<const D: usize>(coords: &[[f64; D]]) -> Tds<D> {
        let mut tds = Tds::new(false);
        for (i, &c) in coords.iter().enumerate() {
            tds.push_point(Point::new(c, i));
        }
        tds
    }

    #[test]
    fn test_bootstrap_creates_two_facets_with_twin_hull_links() {
        let mut tds = tds_with(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]);
        let mut tri = IncrementalTriangulator::new();
        assert!(tri.add_point(&mut tds, 0, None).unwrap().is_empty());
        assert!(tri.add_point(&mut tds, 1, None).unwrap().is_empty());
        let created = tri.add_point(&mut tds, 2, None).unwrap();
        assert_eq!(created.len(), 2);
        assert!(tri.is_bootstrapped::<3>());
        for &s in &created {
            assert!(tds.is_facet(s));
            let face = tds.simplex_faces(s)[0];
            let twin = tds.reverse(face);
            assert!(tds.face(face).unwrap().hull_neighbors().iter().all(|&n| n == Some(twin)));
        }
        assert!(tds.validate().is_ok());
    }

    #[test]
    fn test_missing_location_after_bootstrap() {
        let mut tds = tds_with(&[[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]]);
        let mut tri = IncrementalTriangulator::new();
        tri.add_point(&mut tds, 0, None).unwrap();
        tri.add_point(&mut tds, 1, None).unwrap();
        assert_eq!(
            tri.add_point(&mut tds, 2, None),
            Err(HistoryError::MissingLocation { index: 2 })
        );
    }

    #[test]
    fn test_third_point_in_2d_builds_triangle_and_hull() {
        let mut tds = tds_with(&[[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]]);
        let mut tri = IncrementalTriangulator::new();
        tri.add_point(&mut tds, 0, None).unwrap();
        let facets = tri.add_point(&mut tds, 1, None).unwrap();
        // Locate with the facet whose face is visible from point 2.
        let location = facets
            .iter()
            .copied()
            .find(|&s| tds.contains_point_in_circumsphere(s, 2).unwrap())
            .unwrap();
        let created = tri.add_point(&mut tds, 2, Some(location)).unwrap();

        let simplices: Vec<_> = created.iter().filter(|&&s| !tds.is_facet(s)).collect();
        let new_facets: Vec<_> = created.iter().filter(|&&s| tds.is_facet(s)).collect();
        assert_eq!(simplices.len(), 1);
        assert_eq!(new_facets.len(), 2);
        assert!(!tds.is_alive(location));
        assert!(tds.validate().is_ok());
    }
}
