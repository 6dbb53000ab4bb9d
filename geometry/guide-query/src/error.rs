//! Error types for guide geometry construction.

use thiserror::Error;

/// Errors that can occur while building guide geometry.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GuideError {
    /// Insufficient points to define the guide.
    #[error("insufficient points: need at least {required}, got {actual}")]
    InsufficientPoints {
        /// Minimum required points.
        required: usize,
        /// Actual number of points provided.
        actual: usize,
    },

    /// A vertex contains `NaN` or `Inf`.
    #[error("vertex {index} is not finite")]
    NonFiniteVertex {
        /// Index of the offending vertex.
        index: usize,
    },

    /// A face references a vertex that does not exist.
    #[error("face {face} references vertex {vertex}, but only {vertex_count} vertices exist")]
    InvalidFaceIndex {
        /// Index of the offending face.
        face: usize,
        /// The out-of-range vertex index.
        vertex: u32,
        /// Number of vertices in the mesh.
        vertex_count: usize,
    },
}

impl GuideError {
    /// Create an insufficient points error.
    #[must_use]
    pub fn insufficient_points(required: usize, actual: usize) -> Self {
        Self::InsufficientPoints { required, actual }
    }

    /// Check if this is an insufficient points error.
    #[must_use]
    pub fn is_insufficient_points(&self) -> bool {
        matches!(self, Self::InsufficientPoints { .. })
    }

    /// Check if this is a non-finite vertex error.
    #[must_use]
    pub fn is_non_finite(&self) -> bool {
        matches!(self, Self::NonFiniteVertex { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = GuideError::insufficient_points(2, 1);
        assert!(err.to_string().contains("need at least 2"));
        assert!(err.to_string().contains("got 1"));

        let err = GuideError::InvalidFaceIndex {
            face: 3,
            vertex: 17,
            vertex_count: 4,
        };
        assert!(err.to_string().contains("17"));
        assert!(err.to_string().contains("face 3"));
    }

    #[test]
    fn test_error_predicates() {
        let err = GuideError::insufficient_points(2, 0);
        assert!(err.is_insufficient_points());
        assert!(!err.is_non_finite());

        let err = GuideError::NonFiniteVertex { index: 0 };
        assert!(err.is_non_finite());
    }
}
