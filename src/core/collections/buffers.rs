use crate::core::triangulation_data_structure::{FaceKey, SimplexKey};

use super::{MAX_PRACTICAL_DIMENSION_SIZE, SmallBuffer};

// =============================================================================
// ALGORITHM-SPECIFIC BUFFER TYPES
// =============================================================================

/// Size constant for per-insertion buffers (attaching faces, new simplices).
pub const INSERTION_BUFFER_SIZE: usize = 16;

/// The bounding faces of one simplex (D+1 of them, or a single face for a facet).
///
/// # Optimization Rationale
///
/// - **Stack Allocation**: Up to 8 faces, which covers D ≤ 7
/// - **Use Case**: `SimplexKind::Simplex` face storage, temporary face assembly
pub type SimplexFaceBuffer = SmallBuffer<FaceKey, MAX_PRACTICAL_DIMENSION_SIZE>;

/// Point indices of one simplex, base face first and apex last.
pub type SimplexVertexBuffer = SmallBuffer<usize, MAX_PRACTICAL_DIMENSION_SIZE>;

/// Faces collected during one insertion (attaching faces, boundary faces).
pub type FaceKeyBuffer = SmallBuffer<FaceKey, INSERTION_BUFFER_SIZE>;

/// Simplices collected during one insertion (destroyed or newly created).
///
/// # Examples
///
/// ```rust
/// use delaunay_history::core::collections::SimplexKeyBuffer;
///
/// let created: SimplexKeyBuffer = SimplexKeyBuffer::new();
/// assert!(created.is_empty());
/// ```
pub type SimplexKeyBuffer = SmallBuffer<SimplexKey, INSERTION_BUFFER_SIZE>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffers_instantiate() {
        let faces: SimplexFaceBuffer = SimplexFaceBuffer::new();
        let vertices: SimplexVertexBuffer = SimplexVertexBuffer::new();
        let created: SimplexKeyBuffer = SimplexKeyBuffer::new();
        assert!(faces.is_empty() && vertices.is_empty() && created.is_empty());
        assert_eq!(faces.inline_size(), MAX_PRACTICAL_DIMENSION_SIZE);
    }
}
