//! Scenario tests for the simplex history on small hand-picked inputs.
//!
//! - D=3 single tetrahedron
//! - D=3 point inside a tetrahedron
//! - D=2 convex pentagon
//! - Replay determinism and serialization of records

use std::collections::BTreeSet;

use delaunay_history::prelude::*;

fn init_tracing() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

fn count_kind<const D: usize>(
    history: &SimplexHistory<D>,
    start: usize,
    end: usize,
    kind: RecordKind,
) -> usize {
    history.window(start, end).filter(|r| r.kind == kind).count()
}

fn sorted_vertices(vertices: &[usize]) -> Vec<usize> {
    let mut v = vertices.to_vec();
    v.sort_unstable();
    v
}

/// Vertex sets of the full-sequence window, by kind.
fn full_window_sets<const D: usize>(
    history: &SimplexHistory<D>,
    last: usize,
) -> BTreeSet<(bool, Vec<usize>)> {
    history
        .window(0, last)
        .map(|r| (r.kind == RecordKind::Simplex, sorted_vertices(&r.vertices)))
        .collect()
}

/// Vertex sets of the alive ground-truth triangulation, by kind.
fn alive_ground_sets<const D: usize>(history: &SimplexHistory<D>) -> BTreeSet<(bool, Vec<usize>)> {
    let tds = history.tds();
    tds.simplices()
        .filter(|&(k, s)| s.layer() == Layer::Ground && tds.is_alive(k))
        .map(|(k, _)| (!tds.is_facet(k), sorted_vertices(&tds.vertices(k))))
        .collect()
}

fn tetrahedron() -> Vec<Point<3>> {
    points![
        [0.0, 0.0, 0.0],
        [1.0, 0.0, 0.0],
        [0.0, 1.0, 0.0],
        [0.0, 0.0, 1.0],
    ]
}

// =============================================================================
// D=3
// =============================================================================

#[test]
fn test_single_tetrahedron() {
    init_tracing();
    let history = find_all_simplices(&tetrahedron(), HistoryOptions::default()).unwrap();

    let full: Vec<_> = history.window(0, 3).collect();
    assert_eq!(full.iter().filter(|r| r.kind == RecordKind::Simplex).count(), 1);
    assert_eq!(full.iter().filter(|r| r.kind == RecordKind::Facet).count(), 4);
    for record in &full {
        assert_eq!(record.last_previous_killer, None);
        assert_eq!(record.first_subsequent_killer, None);
        assert_eq!(record.layer, Layer::Ground);
    }

    // The tetrahedron has every point as a vertex.
    let simplex = full.iter().find(|r| r.kind == RecordKind::Simplex).unwrap();
    let mut vertices = simplex.vertices.to_vec();
    vertices.sort_unstable();
    assert_eq!(vertices, vec![0, 1, 2, 3]);

    // Dropping any point leaves a single triangle with a facet on each side.
    for (start, end) in [(0, 2), (1, 3)] {
        assert_eq!(count_kind(&history, start, end, RecordKind::Simplex), 0);
        assert_eq!(count_kind(&history, start, end, RecordKind::Facet), 2);
    }
    assert!(history.tds().validate().is_ok());
}

#[test]
fn test_point_inside_tetrahedron() {
    init_tracing();
    let mut points = tetrahedron();
    points.push(Point::new([0.2, 0.2, 0.2], 4));
    let history = find_all_simplices(&points, HistoryOptions::default()).unwrap();

    let destroyed: Vec<_> = history
        .records()
        .iter()
        .filter(|r| r.kind == RecordKind::Simplex && r.first_subsequent_killer == Some(4))
        .collect();
    assert_eq!(destroyed.len(), 1);
    assert_eq!(destroyed[0].layer, Layer::Ground);

    let full: Vec<_> = history
        .window(0, 4)
        .filter(|r| r.kind == RecordKind::Simplex)
        .collect();
    assert_eq!(full.len(), 4);
    assert!(full.iter().all(|r| r.vertices.contains(&4)));

    // The hull is untouched.
    assert_eq!(count_kind(&history, 0, 4, RecordKind::Facet), 4);
    // Without point 0, points 1..=4 form one tetrahedron.
    assert_eq!(count_kind(&history, 1, 4, RecordKind::Simplex), 1);
    assert!(history.tds().validate().is_ok());
}

// =============================================================================
// D=2
// =============================================================================

#[test]
fn test_convex_pentagon() {
    init_tracing();
    let points = points![[0.0, 0.0], [4.0, 0.0], [5.0, 3.0], [2.0, 5.0], [-1.0, 3.0]];
    let history = find_all_simplices(&points, HistoryOptions::default()).unwrap();

    // Convex position: n - 2 triangles and n hull edges.
    for end in 2..points.len() {
        let n = end + 1;
        assert_eq!(count_kind(&history, 0, end, RecordKind::Simplex), n - 2);
        assert_eq!(count_kind(&history, 0, end, RecordKind::Facet), n);
    }
    for start in 0..points.len() - 2 {
        let n = points.len() - start;
        assert_eq!(count_kind(&history, start, 4, RecordKind::Simplex), n - 2);
        assert_eq!(count_kind(&history, start, 4, RecordKind::Facet), n);
    }

    // Every hull edge of the full window is covered by exactly one triangle.
    let triangles: Vec<_> = history
        .window(0, 4)
        .filter(|r| r.kind == RecordKind::Simplex)
        .collect();
    for facet in history.window(0, 4).filter(|r| r.kind == RecordKind::Facet) {
        let covering = triangles
            .iter()
            .filter(|t| facet.vertices.iter().all(|v| t.vertices.contains(v)))
            .count();
        assert_eq!(covering, 1, "facet {:?}", facet.vertices);
    }

    // The full window is exactly the final ground-truth triangulation.
    let full = full_window_sets(&history, 4);
    assert_eq!(full.len(), 3 + 5);
    assert_eq!(full, alive_ground_sets(&history));
    assert!(history.tds().validate().is_ok());
}

#[test]
fn test_full_window_equals_final_triangulation_with_interior_points() {
    init_tracing();
    let points = points![
        [0.0, 0.0],
        [4.0, 0.0],
        [5.0, 3.0],
        [2.0, 5.0],
        [-1.0, 3.0],
        [2.0, 2.0],
        [3.1, 1.4],
    ];
    let history = find_all_simplices(&points, HistoryOptions::default()).unwrap();
    let last = points.len() - 1;
    let full = full_window_sets(&history, last);
    assert_eq!(full, alive_ground_sets(&history));

    // Euler: 2n - h - 2 triangles with h = 5 hull vertices.
    let triangles = full.iter().filter(|(is_simplex, _)| *is_simplex).count();
    assert_eq!(triangles, 2 * points.len() - 5 - 2);
    assert!(history.tds().validate().is_ok());
}

#[test]
fn test_every_record_respects_stamp_order() {
    init_tracing();
    let points = points![
        [0.0, 0.0],
        [4.0, 0.0],
        [5.0, 3.0],
        [2.0, 5.0],
        [-1.0, 3.0],
        [2.0, 2.0],
    ];
    let history = find_all_simplices(&points, HistoryOptions::default()).unwrap();
    for record in history.records() {
        let min = record.min_vertex().unwrap();
        let max = record.max_vertex().unwrap();
        assert!(record.last_previous_killer.is_none_or(|k| k < min));
        assert!(record.first_subsequent_killer.is_none_or(|k| k > max));
    }
}

// =============================================================================
// REPLAY
// =============================================================================

#[test]
fn test_replay_is_deterministic() {
    init_tracing();
    let points = points![
        [0.0, 0.0],
        [4.0, 0.0],
        [5.0, 3.0],
        [2.0, 5.0],
        [-1.0, 3.0],
        [2.0, 2.0],
        [3.1, 1.4],
    ];
    let first = find_all_simplices(&points, HistoryOptions::default()).unwrap();
    let second = find_all_simplices(&points, HistoryOptions::default()).unwrap();
    assert_eq!(first.records(), second.records());

    let json_first = serde_json::to_string(first.records()).unwrap();
    let json_second = serde_json::to_string(second.records()).unwrap();
    assert_eq!(json_first, json_second);

    let restored: Vec<SimplexRecord<2>> = serde_json::from_str(&json_first).unwrap();
    assert_eq!(restored.as_slice(), first.records());
}

#[test]
fn test_incremental_finder_matches_batch() {
    init_tracing();
    let points = points![[0.0, 0.0], [4.0, 0.0], [5.0, 3.0], [2.0, 5.0], [-1.0, 3.0]];
    let mut finder = AllSimplicesFinder::<2>::new(HistoryOptions::default()).unwrap();
    for point in &points {
        finder.insert(*point).unwrap();
    }
    assert_eq!(finder.number_of_points(), points.len());
    let incremental = finder.finish().unwrap();
    let batch = find_all_simplices(&points, HistoryOptions::default()).unwrap();
    assert_eq!(incremental.records(), batch.records());
}

#[test]
fn test_bookkeeping_circumspheres() {
    init_tracing();
    let options = HistoryOptionsBuilder::default()
        .alpha_bookkeeping(true)
        .build()
        .unwrap();
    let history = find_all_simplices(&tetrahedron(), options).unwrap();
    let simplex = history
        .window(0, 3)
        .find(|r| r.kind == RecordKind::Simplex)
        .unwrap();
    let sphere = simplex.circumsphere.unwrap();
    for c in &sphere.center {
        approx::assert_relative_eq!(*c, 0.5, epsilon = 1e-12);
    }
    approx::assert_relative_eq!(sphere.radius, 0.75_f64.sqrt(), epsilon = 1e-12);
}
