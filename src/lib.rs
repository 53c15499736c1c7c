//! # delaunay-history
//!
//! This is a library for computing the Delaunay triangulation of **every contiguous
//! subsequence** of an insertion-ordered point sequence in d dimensions, without
//! recomputing any of them from scratch.
//!
//! # Features
//!
//! - d-dimensional incremental Delaunay construction (2 ≤ D ≤ 17)
//! - Per-point *star* and *hole* shadow triangulations that stamp every simplex with the
//!   exact window of insertion indices in which it is Delaunay
//! - Range queries over the full history of simplices and facets
//! - Optional bookkeeping (known simplices per face, circumspheres) for temporal
//!   alpha-shape extraction
//! - Serialization/Deserialization of points and records with [serde](https://serde.rs)
//!
//! # Basic Usage
//!
//! ```rust
//! use delaunay_history::prelude::*;
//!
//! let points = points![
//!     [0.0, 0.0, 0.0],
//!     [1.0, 0.0, 0.0],
//!     [0.0, 1.0, 0.0],
//!     [0.0, 0.0, 1.0],
//!     [0.2, 0.2, 0.2],
//! ];
//! let history = find_all_simplices(&points, HistoryOptions::default()).unwrap();
//!
//! // The first four points form a single tetrahedron...
//! let first = history
//!     .window(0, 3)
//!     .filter(|r| r.kind == RecordKind::Simplex)
//!     .count();
//! assert_eq!(first, 1);
//!
//! // ...which the fifth point splits into four.
//! let all = history
//!     .window(0, 4)
//!     .filter(|r| r.kind == RecordKind::Simplex)
//!     .count();
//! assert_eq!(all, 4);
//! ```
//!
//! A record belongs to the triangulation of window `[s, e]` iff all of its vertices lie in
//! `[s, e]`, it was not killed by a point before `s`, and it survives every point up to `e`
//! (see [`SimplexRecord::is_delaunay_in`](core::simplex::SimplexRecord::is_delaunay_in)).
//!
//! # Degenerate input
//!
//! Predicates are evaluated in plain `f64`. Cospherical or duplicate points may produce
//! inconsistent decisions; walks are bounded by the arena size so such failures surface as
//! [`HistoryError::WalkCycle`](core::triangulation_data_structure::HistoryError::WalkCycle)
//! or another error instead of looping forever.

// Forbid unsafe code throughout the entire crate
#![forbid(unsafe_code)]

#[macro_use]
extern crate derive_builder;

/// The `core` module contains the arena of faces and simplices and the algorithms that
/// maintain the ground truth, the stars and the hole triangulations.
pub mod core {
    /// Triangulation algorithms shared by every layer
    pub mod algorithms {
        /// Per-point hole triangulations
        pub mod hole_triangulation;
        /// Ground-truth incremental insertion
        pub mod incremental_insertion;
        /// Point location through the hole triangulations
        pub mod locate;
        /// Per-point stars
        pub mod star;
        /// Shared excavation protocol and ridge rotations
        pub mod triangulator;
    }
    /// Driver and history queries
    pub mod all_simplices;
    /// High-performance collection types optimized for computational geometry
    pub mod collections;
    pub mod face;
    pub mod simplex;
    pub mod triangulation_data_structure;
    // Re-export the `core` modules.
    pub use all_simplices::*;
    pub use face::*;
    pub use simplex::*;
    pub use triangulation_data_structure::*;
    // Note: collections module not re-exported here to avoid namespace pollution
    // Import specific types via prelude or use crate::core::collections::
}

/// Contains the `Point` type, the stack matrix helpers and the geometric predicates every
/// topological decision is routed through.
pub mod geometry {
    pub mod matrix;
    pub mod point;
    pub mod predicates;
    pub use matrix::*;
    pub use point::*;
    pub use predicates::*;
}

/// A prelude module that re-exports commonly used types and macros.
/// This makes it easier to import the most commonly used items from the crate.
pub mod prelude {
    // Re-export from core
    pub use crate::core::{all_simplices::*, face::*, simplex::*, triangulation_data_structure::*};

    pub use crate::core::collections::{FastHashMap, FastHashSet, SmallBuffer};

    // Re-export from geometry
    pub use crate::geometry::{point::*, predicates::*};

    // Convenience macros
    pub use crate::points;
}

/// The function `is_normal` checks that structs implement `auto` traits.
/// Traits are checked at compile time, so this function is only used for
/// testing.
#[must_use]
pub const fn is_normal<T: Sized + Send + Sync + Unpin>() -> bool {
    true
}

// =============================================================================
// TESTS
// =============================================================================
