//! Point location through the stack of hole triangulations.
//!
//! A new point `p` always destroys something in the star of the point D
//! positions earlier, so the newest face of that star is a good seed even
//! when the point lies far from the most recent insertions.
//!
//! # Algorithm
//!
//! 1. Take the side of the star's newest face that faces `p`; the original
//!    of its simplex is a ground-truth or hole simplex whose circumsphere
//!    contains `p`.
//! 2. While inside a hole triangulation, collect by worklist every simplex
//!    of that hole triangulation whose circumsphere contains `p`.
//! 3. Cross to the owning star: first through an old boundary face whose
//!    star simplex contains `p`, otherwise through a star facet adjacent to
//!    a boundary ridge of a collected facet.
//! 4. Follow `original` of that star simplex one level up and repeat.
//!
//! Every level moves to a triangulation of a strictly earlier point, so the
//! loop ends in the ground truth after at most `p + 1` levels.

use crate::core::algorithms::star::Star;
use crate::core::collections::SimplexKeySet;
use crate::core::simplex::{Layer, SimplexKind};
use crate::core::triangulation_data_structure::{HistoryError, SimplexKey, Tds};

/// Locate `p_new` in the ground truth, seeded by `star`.
///
/// # Arguments
///
/// * `tds` - The arena holding every layer
/// * `p_new` - Index of the point to locate
/// * `star` - Star of the point D positions before `p_new`
///
/// # Returns
///
/// A ground-truth simplex or facet whose circumsphere contains `p_new`.
///
/// # Errors
///
/// Returns [`HistoryError::LocationFailed`] if the star has no faces yet or a
/// level yields no way up, and [`HistoryError::WalkCycle`] if the level
/// count exceeds the number of earlier points.
pub fn locate<const D: usize>(
    tds: &Tds<D>,
    p_new: usize,
    star: &Star,
) -> Result<SimplexKey, HistoryError> {
    let latest = star.face_latest().ok_or_else(|| failed(p_new, "star has no faces"))?;
    let seed = if tds.faces_point(latest, p_new)? {
        latest
    } else {
        tds.reverse(latest)
    };
    let mut current = tds
        .simplex_of(seed)
        .and_then(|s| tds.original(s))
        .ok_or_else(|| failed(p_new, "newest star face has no original simplex"))?;

    for level in 0..=p_new {
        if tds.layer(current) == Layer::Ground {
            return Ok(current);
        }
        tracing::trace!(p_new, level, layer = ?tds.layer(current), "locating through hole");
        let destroyed = collect_conflicts(tds, current, p_new)?;
        let star_simplex = match via_old_boundary(tds, &destroyed, p_new)? {
            Some(s) => s,
            None => via_star_facets(tds, &destroyed, p_new)?
                .ok_or_else(|| failed(p_new, "no star simplex above hole conflicts"))?,
        };
        current = tds
            .original(star_simplex)
            .ok_or_else(|| failed(p_new, "star simplex without original"))?;
    }
    Err(HistoryError::WalkCycle { steps: p_new + 1 })
}

/// All simplices of the layer of `start` reachable through conflicts.
fn collect_conflicts<const D: usize>(
    tds: &Tds<D>,
    start: SimplexKey,
    p_new: usize,
) -> Result<Vec<SimplexKey>, HistoryError> {
    let mut visited = SimplexKeySet::default();
    let mut found = Vec::new();
    let mut to_explore = vec![start];
    while let Some(s) = to_explore.pop() {
        if visited.contains(&s) || !tds.contains_point_in_circumsphere(s, p_new)? {
            continue;
        }
        visited.insert(s);
        found.push(s);
        for &f in tds.simplex_faces(s) {
            to_explore.extend(tds.simplex_of(tds.reverse(f)));
        }
        if let Some(simplex) = tds.simplex(s)
            && let SimplexKind::Facet { face } = *simplex.kind()
            && let Some(face) = tds.face(face)
        {
            for neighbor in face.hull_neighbors().iter().flatten() {
                to_explore.extend(tds.simplex_of(*neighbor));
            }
        }
    }
    Ok(found)
}

/// A star simplex behind an old boundary face of the collected simplices.
fn via_old_boundary<const D: usize>(
    tds: &Tds<D>,
    destroyed: &[SimplexKey],
    p_new: usize,
) -> Result<Option<SimplexKey>, HistoryError> {
    for &s in destroyed {
        for &f in tds.simplex_faces(s) {
            let back = tds.reverse(f);
            if tds.simplex_of(back).is_some() {
                continue;
            }
            let Some(star_face) = tds.face(back).and_then(|face| face.boundary()) else {
                continue;
            };
            if let Some(star_simplex) = tds.simplex_of(tds.reverse(star_face))
                && tds.contains_point_in_circumsphere(star_simplex, p_new)?
            {
                return Ok(Some(star_simplex));
            }
        }
    }
    Ok(None)
}

/// A star facet next to a boundary ridge of a collected facet.
fn via_star_facets<const D: usize>(
    tds: &Tds<D>,
    destroyed: &[SimplexKey],
    p_new: usize,
) -> Result<Option<SimplexKey>, HistoryError> {
    for &s in destroyed {
        let Some(simplex) = tds.simplex(s) else {
            continue;
        };
        let SimplexKind::Facet { face } = *simplex.kind() else {
            continue;
        };
        let points = *tds.face_points(face);
        for (idx, &p_opposite) in points.iter().enumerate() {
            let neighbor = tds.hull_neighbor(face, idx)?;
            if tds.simplex_of(neighbor).is_some() {
                continue;
            }
            let star_face = tds.boundary(neighbor)?;
            let j = tds.point_opposite_index(neighbor, face, p_opposite)?;
            if let Some(star_facet) = tds.simplex_of(tds.hull_neighbor(star_face, j)?)
                && tds.contains_point_in_circumsphere(star_facet, p_new)?
            {
                return Ok(Some(star_facet));
            }
        }
    }
    Ok(None)
}

fn failed(point: usize, message: &str) -> HistoryError {
    HistoryError::LocationFailed {
        point,
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::point::Point;

    #[test]
    fn test_locate_without_star_faces_fails() {
        let mut tds: Tds<2> = Tds::new(false);
        tds.push_point(Point::new([0.0, 0.0], 0));
        let star = Star::new(0);
        let err = locate(&tds, 0, &star).unwrap_err();
        assert!(matches!(err, HistoryError::LocationFailed { point: 0, .. }));
    }
}
