use crate::core::triangulation_data_structure::{FaceKey, SimplexKey};

use super::FastHashSet;

// =============================================================================
// TRAVERSAL-LOCAL VISITED SETS
// =============================================================================

/// Visited marker for faces during a single traversal.
///
/// Every search owns its own set and drops it on return, so no marking state
/// can leak from one traversal into the next.
pub type FaceKeySet = FastHashSet<FaceKey>;

/// Visited marker for simplices during a single traversal.
pub type SimplexKeySet = FastHashSet<SimplexKey>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visited_sets_compile_and_instantiate() {
        let faces = FaceKeySet::default();
        let simplices = SimplexKeySet::default();
        assert!(faces.is_empty());
        assert!(simplices.is_empty());
    }
}
